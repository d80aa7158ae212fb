#![no_std]

use soroban_sdk::{Address, BytesN, Env, Vec, contract, contractmeta};

contractmeta!(key = "Description", val = "MetaFusion President packet marketplace");

pub mod contract;

#[cfg(test)]
mod test;
pub mod errors;
pub mod events;
pub mod ids;

pub use contract::Asset;
pub use errors::MetaFusionError;

#[contract]
pub struct MetaFusionPresident;

pub trait MetaFusionContract {

    /// Sets the contract owner and the token every fee and price is paid in.
    fn __constructor(e: &Env, owner: Address, payment_token: Address);

    /// Forge a new collection.
    ///
    /// # Arguments
    ///
    /// * `e` - Access to the Soroban environment.
    /// * `caller` - Account forging the collection, must be the contract owner.
    /// * `collection` - Collection id, at most [`ids::MAX_COLLECTION`].
    ///
    /// # Events
    ///
    /// * topics - `["collection_forged", collection: u32]`
    fn forge_collection(e: &Env, caller: Address, collection: u32) -> Result<(), MetaFusionError>;

    /// Returns whether `collection` was forged.
    fn check_collection_existence(e: &Env, collection: u32) -> bool;

    /// Forge a packet of `collection` for `blacksmith`.
    ///
    /// The packet id is `(sequence << 16) | collection` where the sequence
    /// starts at 1 in every collection.
    ///
    /// # Arguments
    ///
    /// * `e` - Access to the Soroban environment.
    /// * `blacksmith` - Account paying for and receiving the packet.
    /// * `collection` - Collection of the packet.
    /// * `payment` - Amount offered, at least [`contract::PACKET_PRICE`].
    ///
    /// # Events
    ///
    /// * topics - `["packet_forged", blacksmith: Address]`
    /// * data - `[packet_id: u32]`
    fn forge_packet(e: &Env, blacksmith: Address, collection: u32, payment: i128) -> Result<u32, MetaFusionError>;

    /// Open a packet, consuming it and minting one prompt of each type.
    ///
    /// # Arguments
    ///
    /// * `e` - Access to the Soroban environment.
    /// * `opener` - Owner of the packet.
    /// * `packet_id` - Packet to open.
    /// * `payment` - Amount offered, at least [`contract::OPEN_PRICE`].
    ///
    /// # Returns
    ///
    /// The [`ids::PACKET_SIZE`] prompt ids, slot order.
    fn open_packet(e: &Env, opener: Address, packet_id: u32, payment: i128) -> Result<Vec<u32>, MetaFusionError>;

    /// List a packet for sale at `price`.
    fn list_packet(e: &Env, seller: Address, packet_id: u32, price: i128) -> Result<(), MetaFusionError>;

    /// List a prompt for sale at `price`.
    fn list_prompt(e: &Env, seller: Address, prompt_id: u32, price: i128) -> Result<(), MetaFusionError>;

    /// List a card for sale at `price`.
    fn list_card(e: &Env, seller: Address, card_id: BytesN<32>, price: i128) -> Result<(), MetaFusionError>;

    /// Buy a listed packet. The listing price is paid to the seller.
    ///
    /// # Events
    ///
    /// * topics - `["transfer", seller: Address, buyer: Address]`
    /// * data - `[asset: Asset, price: i128]`
    fn buy_packet(e: &Env, buyer: Address, packet_id: u32, payment: i128) -> Result<(), MetaFusionError>;

    /// Buy a listed prompt. The listing price is paid to the seller.
    fn buy_prompt(e: &Env, buyer: Address, prompt_id: u32, payment: i128) -> Result<(), MetaFusionError>;

    /// Buy a listed card. The listing price is paid to the seller.
    fn buy_card(e: &Env, buyer: Address, card_id: BytesN<32>, payment: i128) -> Result<(), MetaFusionError>;

    /// Create a card out of one prompt per type.
    ///
    /// # Arguments
    ///
    /// * `e` - Access to the Soroban environment.
    /// * `creator` - Owner of every prompt.
    /// * `prompts` - [`ids::PACKET_SIZE`] prompt ids indexed by prompt type,
    ///   `0` marks an empty slot and is rejected.
    /// * `payment` - Amount offered, at least [`contract::IMAGE_PRICE`].
    ///
    /// # Returns
    ///
    /// The card id, embedding a seed and the six prompts.
    fn create_image(e: &Env, creator: Address, prompts: Vec<u32>, payment: i128) -> Result<BytesN<32>, MetaFusionError>;

    /// Destroy a card and hand its prompts back to the owner.
    ///
    /// # Returns
    ///
    /// The recovered prompt ids.
    fn burn_image_and_recover_prompts(e: &Env, owner: Address, card_id: BytesN<32>) -> Result<Vec<u32>, MetaFusionError>;

    /// Returns the owner of `packet_id`.
    ///
    /// # Notes
    ///
    /// If the packet does not exist, this function is expected to panic.
    fn owner_of_packet(e: &Env, packet_id: u32) -> Address;

    /// Returns the owner of `prompt_id`.
    ///
    /// # Notes
    ///
    /// If the prompt does not exist, this function is expected to panic.
    fn owner_of_prompt(e: &Env, prompt_id: u32) -> Address;

    /// Returns the owner of `card_id`.
    ///
    /// # Notes
    ///
    /// If the card does not exist, this function is expected to panic.
    fn owner_of_card(e: &Env, card_id: BytesN<32>) -> Address;

    /// Packets held by `owner`, acquisition order.
    fn packets_of(e: &Env, owner: Address) -> Vec<u32>;

    /// Prompts held by `owner`, acquisition order.
    fn prompts_of(e: &Env, owner: Address) -> Vec<u32>;

    /// Cards held by `owner`, acquisition order.
    fn cards_of(e: &Env, owner: Address) -> Vec<BytesN<32>>;
}
