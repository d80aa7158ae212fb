//! On-chain identifier layouts.
//!
//! ```text
//! packet  u32:  pppp pppp pppp pppp cccc cccc cccc cccc
//! prompt  u32:  iiic cccc cccc cccc tttp pppp pppp pppp
//! card   u256:  seed (64 bits) | slot 5 | slot 4 | ... | slot 0   (32 bits per slot)
//! ```
//!
//! `p` is the packet sequence inside its collection, `c` the collection,
//! `i` the index of the prompt inside its packet and `t` the prompt type.

use soroban_sdk::{BytesN, Env, Vec};

/// Number of prompts yielded by one packet, one per prompt type.
pub const PACKET_SIZE: u32 = 6;

/// Largest collection id a prompt id can carry.
pub const MAX_COLLECTION: u32 = 0x1fff;

/// Largest packet sequence a prompt id can carry.
pub const MAX_PACKET_SEQUENCE: u32 = 0x1fff;

pub fn packet_id(collection: u32, sequence: u32) -> u32 {
    (sequence << 16) | (collection & 0xffff)
}

pub fn packet_collection(packet_id: u32) -> u32 {
    packet_id & 0xffff
}

pub fn packet_sequence(packet_id: u32) -> u32 {
    packet_id >> 16
}

pub fn prompt_id(index: u32, collection: u32, prompt_type: u32, sequence: u32) -> u32 {
    ((index & 0x7) << 29)
        | ((collection & MAX_COLLECTION) << 16)
        | ((prompt_type & 0x7) << 13)
        | (sequence & MAX_PACKET_SEQUENCE)
}

pub fn prompt_collection(prompt_id: u32) -> u32 {
    (prompt_id >> 16) & MAX_COLLECTION
}

pub fn prompt_type(prompt_id: u32) -> u32 {
    (prompt_id >> 13) & 0x7
}

/// Packs the seed and the six slot prompts into a card id.
pub fn card_id(e: &Env, seed: u64, prompts: &Vec<u32>) -> BytesN<32> {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_be_bytes());
    for (slot, prompt) in prompts.iter().enumerate() {
        let end = 32 - 4 * slot;
        bytes[end - 4..end].copy_from_slice(&prompt.to_be_bytes());
    }
    BytesN::from_array(e, &bytes)
}

/// Slot prompts embedded in a card id, slot 0 first.
pub fn card_prompts(e: &Env, card_id: &BytesN<32>) -> Vec<u32> {
    let bytes = card_id.to_array();
    let mut prompts = Vec::new(e);
    for slot in 0..PACKET_SIZE as usize {
        let end = 32 - 4 * slot;
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[end - 4..end]);
        prompts.push_back(u32::from_be_bytes(word));
    }
    prompts
}
