//! Identifier codec for packets, prompts and images.
//!
//! The layouts must match the contract bit for bit:
//!
//! ```text
//! packet  u32:  pppp pppp pppp pppp cccc cccc cccc cccc
//! prompt  u32:  iiic cccc cccc cccc tttp pppp pppp pppp
//! image  u256:  seed (64 bits) | slot 5 | slot 4 | ... | slot 0   (32 bits per slot)
//! ```
//!
//! `p` is the packet sequence inside its collection, `c` the collection,
//! `i` the index of a prompt inside its packet and `t` the prompt type.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Prompts yielded by one packet, also the number of slots of an image.
pub const PACKET_SIZE: usize = 6;

/// Exclusive upper bound of collection ids in a packet id.
pub const COLLECTION_LIMIT: u32 = 1 << 16;

/// Exclusive upper bound of packet sequences in a packet id.
pub const SEQUENCE_LIMIT: u32 = 1 << 16;

const PROMPT_FIELD_MASK: u32 = 0x1fff;

/// Exclusive upper bound of collections that prompt ids can carry.
pub const PROMPT_COLLECTION_LIMIT: u32 = PROMPT_FIELD_MASK + 1;

/// Exclusive upper bound of packet sequences that prompt ids can carry.
pub const PROMPT_PACKET_LIMIT: u32 = PROMPT_FIELD_MASK + 1;

/// Errors raised while encoding or parsing identifiers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("collection {0} does not fit in 16 bits")]
    CollectionOutOfRange(u32),

    #[error("packet sequence {0} does not fit in 16 bits")]
    SequenceOutOfRange(u32),

    #[error("prompt type {0} is not one of the {PACKET_SIZE} image slots")]
    UnknownPromptType(u32),

    #[error("invalid image id: {0}")]
    InvalidImageId(String),
}

/// Packs `(collection, sequence)` into a packet id.
pub fn encode_packet_id(collection: u32, sequence: u32) -> Result<u32, CodecError> {
    if collection >= COLLECTION_LIMIT {
        return Err(CodecError::CollectionOutOfRange(collection));
    }
    if sequence >= SEQUENCE_LIMIT {
        return Err(CodecError::SequenceOutOfRange(sequence));
    }
    Ok((sequence << 16) | collection)
}

pub fn decode_collection(packet_id: u32) -> u32 {
    packet_id & 0xffff
}

pub fn decode_sequence(packet_id: u32) -> u32 {
    packet_id >> 16
}

/// Raw prompt type, in `[0, 8)`.
pub fn decode_prompt_type(prompt_id: u32) -> u32 {
    (prompt_id >> 13) & 0x7
}

/// Fields of a prompt id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptInfo {
    pub index: u32,
    pub collection: u32,
    pub prompt_type: u32,
    pub packet: u32,
}

pub fn decode_prompt(prompt_id: u32) -> PromptInfo {
    PromptInfo {
        index: prompt_id >> 29,
        collection: (prompt_id >> 16) & PROMPT_FIELD_MASK,
        prompt_type: decode_prompt_type(prompt_id),
        packet: prompt_id & PROMPT_FIELD_MASK,
    }
}

/// Image slot a prompt fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PromptType {
    Character = 0,
    Hat = 1,
    Tool = 2,
    Color = 3,
    Eyes = 4,
    Style = 5,
}

impl PromptType {
    pub const ALL: [PromptType; PACKET_SIZE] = [
        PromptType::Character,
        PromptType::Hat,
        PromptType::Tool,
        PromptType::Color,
        PromptType::Eyes,
        PromptType::Style,
    ];

    pub fn of(prompt_id: u32) -> Result<Self, CodecError> {
        Self::try_from(decode_prompt_type(prompt_id))
    }

    pub fn slot(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for PromptType {
    type Error = CodecError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(CodecError::UnknownPromptType(raw))
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PromptType::Character => "character",
            PromptType::Hat => "hat",
            PromptType::Tool => "tool",
            PromptType::Color => "color",
            PromptType::Eyes => "eyes",
            PromptType::Style => "style",
        };
        f.write_str(name)
    }
}

/// 256-bit image (card) id, big-endian.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(pub [u8; 32]);

/// Fields of an image id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub seed: u64,
    /// Prompt ids indexed by slot.
    pub prompts: [u32; PACKET_SIZE],
}

impl ImageId {
    pub fn encode(seed: u64, prompts: &[u32; PACKET_SIZE]) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_be_bytes());
        for (slot, prompt) in prompts.iter().enumerate() {
            let end = 32 - 4 * slot;
            bytes[end - 4..end].copy_from_slice(&prompt.to_be_bytes());
        }
        Self(bytes)
    }

    pub fn decode(&self) -> ImageInfo {
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&self.0[..8]);

        let mut prompts = [0u32; PACKET_SIZE];
        for (slot, prompt) in prompts.iter_mut().enumerate() {
            let end = 32 - 4 * slot;
            let mut word = [0u8; 4];
            word.copy_from_slice(&self.0[end - 4..end]);
            *prompt = u32::from_be_bytes(word);
        }

        ImageInfo {
            seed: u64::from_be_bytes(seed),
            prompts,
        }
    }

    pub fn prompts(&self) -> [u32; PACKET_SIZE] {
        self.decode().prompts
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({self})")
    }
}

impl FromStr for ImageId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| CodecError::InvalidImageId(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|raw: Vec<u8>| CodecError::InvalidImageId(format!("expected 32 bytes, got {}", raw.len())))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ImageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
