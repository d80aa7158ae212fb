use soroban_sdk::{Address, BytesN, Vec, contractevent};

use crate::contract::Asset;

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollectionForged {
    #[topic]
    pub collection: u32,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PacketForged {
    #[topic]
    pub blacksmith: Address,
    pub packet_id: u32,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PacketOpened {
    #[topic]
    pub opener: Address,
    pub prompts: Vec<u32>,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateImage {
    #[topic]
    pub creator: Address,
    pub card_id: BytesN<32>,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DestroyImage {
    #[topic]
    pub owner: Address,
    pub card_id: BytesN<32>,
    pub prompts: Vec<u32>,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateList {
    #[topic]
    pub seller: Address,
    pub asset: Asset,
    pub price: i128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
    #[topic]
    pub seller: Address,
    #[topic]
    pub buyer: Address,
    pub asset: Asset,
    pub price: i128,
}
