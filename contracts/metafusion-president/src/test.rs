extern crate std;

use soroban_sdk::{testutils::Address as _, token, Address, BytesN, Env, Vec};
use crate::contract::{IMAGE_PRICE, OPEN_PRICE, PACKET_PRICE};
use crate::errors::MetaFusionError;
use crate::{ids, MetaFusionPresident, MetaFusionPresidentClient};

const FUNDING: i128 = 100_0000000;

struct Setup<'a> {
    owner: Address,
    other: Address,
    token: token::Client<'a>,
    client: MetaFusionPresidentClient<'a>,
}

fn create_client<'a>(e: &Env) -> Setup<'a> {
    let owner = Address::generate(e);
    let other = Address::generate(e);

    let asset = e.register_stellar_asset_contract_v2(owner.clone());
    let minter = token::StellarAssetClient::new(e, &asset.address());
    minter.mint(&owner, &FUNDING);
    minter.mint(&other, &FUNDING);

    let address = e.register(MetaFusionPresident, (&owner, &asset.address()));
    Setup {
        owner,
        other,
        token: token::Client::new(e, &asset.address()),
        client: MetaFusionPresidentClient::new(e, &address),
    }
}

fn forged_collection<'a>(e: &Env) -> Setup<'a> {
    let setup = create_client(e);
    setup.client.forge_collection(&setup.owner, &0);
    setup
}

#[test]
fn test_forge_collection() {
    let e = Env::default();
    e.mock_all_auths();
    let setup = create_client(&e);

    assert!(!setup.client.check_collection_existence(&0));

    setup.client.forge_collection(&setup.owner, &0);

    assert!(setup.client.check_collection_existence(&0));
    assert!(!setup.client.check_collection_existence(&1));

    let again = setup.client.try_forge_collection(&setup.owner, &0);
    assert_eq!(again, Err(Ok(MetaFusionError::CollectionAlreadyForged)));
}

#[test]
fn test_refuse_to_forge_collection() {
    let e = Env::default();
    e.mock_all_auths();
    let setup = create_client(&e);

    let refused = setup.client.try_forge_collection(&setup.other, &0);
    assert_eq!(refused, Err(Ok(MetaFusionError::NotContractOwner)));

    assert!(!setup.client.check_collection_existence(&0));
    assert!(!setup.client.check_collection_existence(&1));

    let too_large = setup.client.try_forge_collection(&setup.owner, &(ids::MAX_COLLECTION + 1));
    assert_eq!(too_large, Err(Ok(MetaFusionError::InvalidCollection)));
}

#[test]
fn test_forge_packet_payment_and_collection() {
    let e = Env::default();
    e.mock_all_auths();
    let setup = create_client(&e);

    // Not enough money sent.
    let cheap = setup.client.try_forge_packet(&setup.other, &0, &0);
    assert_eq!(cheap, Err(Ok(MetaFusionError::InsufficientPayment)));

    // The collection does not exist.
    let missing = setup.client.try_forge_packet(&setup.other, &0, &PACKET_PRICE);
    assert_eq!(missing, Err(Ok(MetaFusionError::NonExistentCollection)));

    setup.client.forge_collection(&setup.owner, &0);

    let balance = setup.token.balance(&setup.other);
    let packet_id = setup.client.forge_packet(&setup.other, &0, &PACKET_PRICE);

    assert_eq!(packet_id, ids::packet_id(0, 1));
    assert_eq!(packet_id, 65536);
    assert_eq!(balance - setup.token.balance(&setup.other), PACKET_PRICE);
    assert_eq!(setup.client.owner_of_packet(&packet_id), setup.other);

    let second = setup.client.forge_packet(&setup.owner, &0, &PACKET_PRICE);
    assert_eq!(ids::packet_sequence(second), 2);
    assert_eq!(ids::packet_collection(second), 0);
}

#[test]
fn test_open_packet_once() {
    let e = Env::default();
    e.mock_all_auths();
    let setup = forged_collection(&e);

    let packet_id = setup.client.forge_packet(&setup.other, &0, &PACKET_PRICE);

    let stranger = setup.client.try_open_packet(&setup.owner, &packet_id, &OPEN_PRICE);
    assert_eq!(stranger, Err(Ok(MetaFusionError::IncorrectOwner)));

    let prompts = setup.client.open_packet(&setup.other, &packet_id, &OPEN_PRICE);
    assert_eq!(prompts.len(), ids::PACKET_SIZE);

    let mut seen = [false; 8];
    for prompt_id in prompts.iter() {
        let prompt_type = ids::prompt_type(prompt_id) as usize;
        assert!(prompt_type < ids::PACKET_SIZE as usize);
        assert!(!seen[prompt_type], "duplicate prompt type {prompt_type}");
        seen[prompt_type] = true;
        assert_eq!(ids::prompt_collection(prompt_id), 0);
        assert_eq!(setup.client.owner_of_prompt(&prompt_id), setup.other);
    }

    assert_eq!(setup.client.prompts_of(&setup.other), prompts);
    assert_eq!(setup.client.packets_of(&setup.other).len(), 0);

    let reopened = setup.client.try_open_packet(&setup.other, &packet_id, &OPEN_PRICE);
    assert_eq!(reopened, Err(Ok(MetaFusionError::PacketAlreadyOpened)));

    let unknown = setup.client.try_open_packet(&setup.other, &(7 << 16), &OPEN_PRICE);
    assert_eq!(unknown, Err(Ok(MetaFusionError::NonExistentPacket)));
}

#[test]
fn test_buy_listed_packet() {
    let e = Env::default();
    e.mock_all_auths();
    let setup = forged_collection(&e);
    let price = PACKET_PRICE;

    let packet_id = setup.client.forge_packet(&setup.other, &0, &PACKET_PRICE);

    let unlisted = setup.client.try_buy_packet(&setup.owner, &packet_id, &price);
    assert_eq!(unlisted, Err(Ok(MetaFusionError::NotListed)));

    let not_owner = setup.client.try_list_packet(&setup.owner, &packet_id, &price);
    assert_eq!(not_owner, Err(Ok(MetaFusionError::IncorrectOwner)));

    setup.client.list_packet(&setup.other, &packet_id, &price);

    let cheap = setup.client.try_buy_packet(&setup.owner, &packet_id, &(price - 1));
    assert_eq!(cheap, Err(Ok(MetaFusionError::InsufficientPayment)));

    let own = setup.client.try_buy_packet(&setup.other, &packet_id, &price);
    assert_eq!(own, Err(Ok(MetaFusionError::SelfPurchase)));

    let seller_before = setup.token.balance(&setup.other);
    let buyer_before = setup.token.balance(&setup.owner);

    setup.client.buy_packet(&setup.owner, &packet_id, &(price * 2));

    assert_eq!(setup.client.owner_of_packet(&packet_id), setup.owner);
    assert_eq!(setup.token.balance(&setup.other) - seller_before, price);
    assert_eq!(buyer_before - setup.token.balance(&setup.owner), price);

    // the listing is consumed by the sale
    let relisted = setup.client.try_buy_packet(&setup.other, &packet_id, &price);
    assert_eq!(relisted, Err(Ok(MetaFusionError::NotListed)));
}

#[test]
fn test_create_and_burn_image() {
    let e = Env::default();
    e.mock_all_auths();
    let setup = forged_collection(&e);

    let packet_id = setup.client.forge_packet(&setup.other, &0, &PACKET_PRICE);
    let prompts = setup.client.open_packet(&setup.other, &packet_id, &OPEN_PRICE);

    let mut holes = prompts.clone();
    holes.set(3, 0);
    let missing = setup.client.try_create_image(&setup.other, &holes, &IMAGE_PRICE);
    assert_eq!(missing, Err(Ok(MetaFusionError::MissingPrompt)));

    let mut swapped = prompts.clone();
    swapped.set(0, prompts.get_unchecked(1));
    swapped.set(1, prompts.get_unchecked(0));
    let mismatch = setup.client.try_create_image(&setup.other, &swapped, &IMAGE_PRICE);
    assert_eq!(mismatch, Err(Ok(MetaFusionError::PromptTypeMismatch)));

    let short = Vec::from_array(&e, [prompts.get_unchecked(0)]);
    let invalid = setup.client.try_create_image(&setup.other, &short, &IMAGE_PRICE);
    assert_eq!(invalid, Err(Ok(MetaFusionError::InvalidPromptSet)));

    let stolen = setup.client.try_create_image(&setup.owner, &prompts, &IMAGE_PRICE);
    assert_eq!(stolen, Err(Ok(MetaFusionError::IncorrectOwner)));

    let card_id = setup.client.create_image(&setup.other, &prompts, &IMAGE_PRICE);

    assert_eq!(ids::card_prompts(&e, &card_id), prompts);
    assert_eq!(setup.client.owner_of_card(&card_id), setup.other);
    assert_eq!(setup.client.cards_of(&setup.other).len(), 1);
    assert_eq!(setup.client.prompts_of(&setup.other).len(), 0);

    let consumed = setup.client.try_list_prompt(&setup.other, &prompts.get_unchecked(0), &1);
    assert_eq!(consumed, Err(Ok(MetaFusionError::NonExistentPrompt)));

    let wrong_owner = setup.client.try_burn_image_and_recover_prompts(&setup.owner, &card_id);
    assert_eq!(wrong_owner, Err(Ok(MetaFusionError::IncorrectOwner)));

    let recovered = setup.client.burn_image_and_recover_prompts(&setup.other, &card_id);

    assert_eq!(recovered, prompts);
    assert_eq!(setup.client.cards_of(&setup.other).len(), 0);
    assert_eq!(setup.client.prompts_of(&setup.other), prompts);

    let gone = setup.client.try_burn_image_and_recover_prompts(&setup.other, &card_id);
    assert_eq!(gone, Err(Ok(MetaFusionError::NonExistentCard)));
}

#[test]
fn test_card_id_layout() {
    let e = Env::default();

    let prompts = Vec::from_array(&e, [0x1000_0001u32, 0x2000_0002, 0x3000_0003, 0x4000_0004, 0x5000_0005, 0x6000_0006]);
    let card_id = ids::card_id(&e, 0x0102_0304_0506_0708, &prompts);
    let bytes = card_id.to_array();

    assert_eq!(bytes[..8], [1, 2, 3, 4, 5, 6, 7, 8]);
    // slot 0 occupies the lowest 32 bits
    assert_eq!(bytes[28..], [0x10, 0x00, 0x00, 0x01]);
    assert_eq!(bytes[8..12], [0x60, 0x00, 0x00, 0x06]);
    assert_eq!(ids::card_prompts(&e, &BytesN::from_array(&e, &bytes)), prompts);
}
