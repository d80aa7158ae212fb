//! Packets, prompts and cards: forging, opening, marketplace

use soroban_sdk::{Address, BytesN, Env, Vec, contractimpl, contracttype, panic_with_error, token};
use crate::errors::MetaFusionError;
use crate::{events, ids, MetaFusionContract, MetaFusionPresident, MetaFusionPresidentArgs, MetaFusionPresidentClient};

/// Fee for forging a packet: 0.1 unit of the payment token.
pub const PACKET_PRICE: i128 = 1_000_000;
/// Fee for opening a packet: 0.01 unit of the payment token.
pub const OPEN_PRICE: i128 = 100_000;
/// Fee for creating a card: 0.1 unit of the payment token.
pub const IMAGE_PRICE: i128 = 1_000_000;

#[contracttype]
pub enum DataKey {
    Owner,
    PaymentToken,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Asset {
    Packet(u32),
    Prompt(u32),
    Card(BytesN<32>),
}

#[contracttype]
pub enum AssetStorageKey {
    Collection(u32),
    PacketSequence(u32 /* collection */),
    Opened(u32 /* packet */),
    Owner(Asset),
    Listing(Asset),
    Holdings(Address),
}


#[contractimpl]
impl MetaFusionContract for MetaFusionPresident {

    fn __constructor(e: &Env, owner: Address, payment_token: Address) {
        e.storage().instance().set(&DataKey::Owner, &owner);
        e.storage().instance().set(&DataKey::PaymentToken, &payment_token);
    }

    fn forge_collection(e: &Env, caller: Address, collection: u32) -> Result<(), MetaFusionError> {
        caller.require_auth();

        let owner: Option<Address> = e.storage().instance().get(&DataKey::Owner);
        if owner.as_ref() != Some(&caller) {
            return Err(MetaFusionError::NotContractOwner);
        }
        if collection > ids::MAX_COLLECTION {
            return Err(MetaFusionError::InvalidCollection);
        }

        let key = AssetStorageKey::Collection(collection);
        if e.storage().persistent().has(&key) {
            return Err(MetaFusionError::CollectionAlreadyForged);
        }
        e.storage().persistent().set(&key, &true);

        events::CollectionForged { collection }.publish(e);
        Ok(())
    }

    fn check_collection_existence(e: &Env, collection: u32) -> bool {
        e.storage().persistent().has(&AssetStorageKey::Collection(collection))
    }

    fn forge_packet(e: &Env, blacksmith: Address, collection: u32, payment: i128) -> Result<u32, MetaFusionError> {
        blacksmith.require_auth();

        if payment < PACKET_PRICE {
            return Err(MetaFusionError::InsufficientPayment);
        }
        if !Self::check_collection_existence(e, collection) {
            return Err(MetaFusionError::NonExistentCollection);
        }

        let sequence_key = AssetStorageKey::PacketSequence(collection);
        let sequence = e.storage().persistent().get::<_, u32>(&sequence_key).unwrap_or(0) + 1;
        if sequence > ids::MAX_PACKET_SEQUENCE {
            return Err(MetaFusionError::PacketIdsDepleted);
        }

        charge(e, &blacksmith, PACKET_PRICE);
        e.storage().persistent().set(&sequence_key, &sequence);

        let packet_id = ids::packet_id(collection, sequence);
        grant(e, &blacksmith, &Asset::Packet(packet_id));

        events::PacketForged { blacksmith, packet_id }.publish(e);

        Ok(packet_id)
    }

    fn open_packet(e: &Env, opener: Address, packet_id: u32, payment: i128) -> Result<Vec<u32>, MetaFusionError> {
        opener.require_auth();

        if e.storage().persistent().has(&AssetStorageKey::Opened(packet_id)) {
            return Err(MetaFusionError::PacketAlreadyOpened);
        }
        let packet = Asset::Packet(packet_id);
        if holder(e, &packet).ok_or(MetaFusionError::NonExistentPacket)? != opener {
            return Err(MetaFusionError::IncorrectOwner);
        }
        let collection = ids::packet_collection(packet_id);
        if !Self::check_collection_existence(e, collection) {
            return Err(MetaFusionError::NonExistentCollection);
        }
        if payment < OPEN_PRICE {
            return Err(MetaFusionError::InsufficientPayment);
        }

        charge(e, &opener, OPEN_PRICE);
        revoke(e, &opener, &packet);
        e.storage().persistent().set(&AssetStorageKey::Opened(packet_id), &true);

        let sequence = ids::packet_sequence(packet_id);
        let mut prompts = Vec::new(e);
        for slot in 0..ids::PACKET_SIZE {
            let prompt_id = ids::prompt_id(slot, collection, slot, sequence);
            grant(e, &opener, &Asset::Prompt(prompt_id));
            prompts.push_back(prompt_id);
        }

        events::PacketOpened { opener, prompts: prompts.clone() }.publish(e);

        Ok(prompts)
    }

    fn list_packet(e: &Env, seller: Address, packet_id: u32, price: i128) -> Result<(), MetaFusionError> {
        list(e, seller, Asset::Packet(packet_id), price)
    }

    fn list_prompt(e: &Env, seller: Address, prompt_id: u32, price: i128) -> Result<(), MetaFusionError> {
        list(e, seller, Asset::Prompt(prompt_id), price)
    }

    fn list_card(e: &Env, seller: Address, card_id: BytesN<32>, price: i128) -> Result<(), MetaFusionError> {
        list(e, seller, Asset::Card(card_id), price)
    }

    fn buy_packet(e: &Env, buyer: Address, packet_id: u32, payment: i128) -> Result<(), MetaFusionError> {
        buy(e, buyer, Asset::Packet(packet_id), payment)
    }

    fn buy_prompt(e: &Env, buyer: Address, prompt_id: u32, payment: i128) -> Result<(), MetaFusionError> {
        buy(e, buyer, Asset::Prompt(prompt_id), payment)
    }

    fn buy_card(e: &Env, buyer: Address, card_id: BytesN<32>, payment: i128) -> Result<(), MetaFusionError> {
        buy(e, buyer, Asset::Card(card_id), payment)
    }

    fn create_image(e: &Env, creator: Address, prompts: Vec<u32>, payment: i128) -> Result<BytesN<32>, MetaFusionError> {
        creator.require_auth();

        if prompts.len() != ids::PACKET_SIZE {
            return Err(MetaFusionError::InvalidPromptSet);
        }
        let collection = ids::prompt_collection(prompts.get_unchecked(0));
        for (slot, prompt_id) in prompts.iter().enumerate() {
            if prompt_id == 0 {
                return Err(MetaFusionError::MissingPrompt);
            }
            if ids::prompt_type(prompt_id) != slot as u32 {
                return Err(MetaFusionError::PromptTypeMismatch);
            }
            if ids::prompt_collection(prompt_id) != collection {
                return Err(MetaFusionError::InvalidPromptSet);
            }
            if holder(e, &Asset::Prompt(prompt_id)).ok_or(MetaFusionError::NonExistentPrompt)? != creator {
                return Err(MetaFusionError::IncorrectOwner);
            }
        }
        if payment < IMAGE_PRICE {
            return Err(MetaFusionError::InsufficientPayment);
        }

        charge(e, &creator, IMAGE_PRICE);
        for prompt_id in prompts.iter() {
            revoke(e, &creator, &Asset::Prompt(prompt_id));
        }

        let seed = e.prng().gen_range::<u64>(0..=u64::MAX);
        let card_id = ids::card_id(e, seed, &prompts);
        grant(e, &creator, &Asset::Card(card_id.clone()));

        events::CreateImage { creator, card_id: card_id.clone() }.publish(e);

        Ok(card_id)
    }

    fn burn_image_and_recover_prompts(e: &Env, owner: Address, card_id: BytesN<32>) -> Result<Vec<u32>, MetaFusionError> {
        owner.require_auth();

        let card = Asset::Card(card_id.clone());
        if holder(e, &card).ok_or(MetaFusionError::NonExistentCard)? != owner {
            return Err(MetaFusionError::IncorrectOwner);
        }

        revoke(e, &owner, &card);
        let prompts = ids::card_prompts(e, &card_id);
        for prompt_id in prompts.iter() {
            grant(e, &owner, &Asset::Prompt(prompt_id));
        }

        events::DestroyImage { owner, card_id, prompts: prompts.clone() }.publish(e);

        Ok(prompts)
    }

    fn owner_of_packet(e: &Env, packet_id: u32) -> Address {
        holder(e, &Asset::Packet(packet_id))
            .unwrap_or_else(|| panic_with_error!(e, MetaFusionError::NonExistentPacket))
    }

    fn owner_of_prompt(e: &Env, prompt_id: u32) -> Address {
        holder(e, &Asset::Prompt(prompt_id))
            .unwrap_or_else(|| panic_with_error!(e, MetaFusionError::NonExistentPrompt))
    }

    fn owner_of_card(e: &Env, card_id: BytesN<32>) -> Address {
        holder(e, &Asset::Card(card_id))
            .unwrap_or_else(|| panic_with_error!(e, MetaFusionError::NonExistentCard))
    }

    fn packets_of(e: &Env, owner: Address) -> Vec<u32> {
        let mut packets = Vec::new(e);
        for asset in holdings(e, &owner).iter() {
            if let Asset::Packet(packet_id) = asset {
                packets.push_back(packet_id);
            }
        }
        packets
    }

    fn prompts_of(e: &Env, owner: Address) -> Vec<u32> {
        let mut prompts = Vec::new(e);
        for asset in holdings(e, &owner).iter() {
            if let Asset::Prompt(prompt_id) = asset {
                prompts.push_back(prompt_id);
            }
        }
        prompts
    }

    fn cards_of(e: &Env, owner: Address) -> Vec<BytesN<32>> {
        let mut cards = Vec::new(e);
        for asset in holdings(e, &owner).iter() {
            if let Asset::Card(card_id) = asset {
                cards.push_back(card_id);
            }
        }
        cards
    }

}

fn list(e: &Env, seller: Address, asset: Asset, price: i128) -> Result<(), MetaFusionError> {
    seller.require_auth();

    if price <= 0 {
        return Err(MetaFusionError::InvalidPrice);
    }
    if holder(e, &asset).ok_or_else(|| missing(&asset))? != seller {
        return Err(MetaFusionError::IncorrectOwner);
    }

    e.storage().persistent().set(&AssetStorageKey::Listing(asset.clone()), &price);

    events::UpdateList { seller, asset, price }.publish(e);
    Ok(())
}

fn buy(e: &Env, buyer: Address, asset: Asset, payment: i128) -> Result<(), MetaFusionError> {
    buyer.require_auth();

    let seller = holder(e, &asset).ok_or_else(|| missing(&asset))?;
    let price: i128 = e
        .storage()
        .persistent()
        .get(&AssetStorageKey::Listing(asset.clone()))
        .ok_or(MetaFusionError::NotListed)?;
    if seller == buyer {
        return Err(MetaFusionError::SelfPurchase);
    }
    if payment < price {
        return Err(MetaFusionError::InsufficientPayment);
    }

    payment_token(e).transfer(&buyer, &seller, &price);
    revoke(e, &seller, &asset);
    grant(e, &buyer, &asset);

    events::Transfer { seller, buyer, asset, price }.publish(e);
    Ok(())
}

fn payment_token(e: &Env) -> token::Client<'_> {
    let address: Address = e
        .storage()
        .instance()
        .get(&DataKey::PaymentToken)
        .unwrap_or_else(|| panic_with_error!(e, MetaFusionError::UnsetPaymentToken));
    token::Client::new(e, &address)
}

fn charge(e: &Env, payer: &Address, amount: i128) {
    payment_token(e).transfer(payer, &e.current_contract_address(), &amount);
}

fn missing(asset: &Asset) -> MetaFusionError {
    match asset {
        Asset::Packet(_) => MetaFusionError::NonExistentPacket,
        Asset::Prompt(_) => MetaFusionError::NonExistentPrompt,
        Asset::Card(_) => MetaFusionError::NonExistentCard,
    }
}

fn holder(e: &Env, asset: &Asset) -> Option<Address> {
    e.storage().persistent().get(&AssetStorageKey::Owner(asset.clone()))
}

fn holdings(e: &Env, owner: &Address) -> Vec<Asset> {
    e.storage()
        .persistent()
        .get(&AssetStorageKey::Holdings(owner.clone()))
        .unwrap_or_else(|| Vec::new(e))
}

fn grant(e: &Env, owner: &Address, asset: &Asset) {
    e.storage().persistent().set(&AssetStorageKey::Owner(asset.clone()), owner);

    let mut held = holdings(e, owner);
    held.push_back(asset.clone());
    e.storage().persistent().set(&AssetStorageKey::Holdings(owner.clone()), &held);
}

// Drops ownership and any open listing of `asset`.
fn revoke(e: &Env, owner: &Address, asset: &Asset) {
    e.storage().persistent().remove(&AssetStorageKey::Owner(asset.clone()));
    e.storage().persistent().remove(&AssetStorageKey::Listing(asset.clone()));

    let mut held = holdings(e, owner);
    if let Some(index) = held.first_index_of(asset) {
        held.remove(index);
    }
    e.storage().persistent().set(&AssetStorageKey::Holdings(owner.clone()), &held);
}
