//! Deterministic words for minted prompts.
//!
//! Each collection maps every prompt type to a pool of words with a finite
//! supply. A prompt id selects a word by hashing its decimal form with
//! SHA-256 and reducing the digest modulo the pool size; the chosen word's
//! supply then drops by one and the word leaves the pool once exhausted.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::codec::{PACKET_SIZE, PromptType};

/// Errors raised while naming prompts
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AtlasError {
    #[error("collection {0} has no word pools")]
    UnknownCollection(u32),

    #[error("no {prompt_type} words left in collection {collection}")]
    Exhausted { collection: u32, prompt_type: PromptType },
}

/// Word pool with the remaining supply of each word, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordPool(Vec<(String, u32)>);

impl WordPool {
    pub fn new<'a>(words: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        Self(
            words
                .into_iter()
                .filter(|(_, supply)| *supply > 0)
                .map(|(word, supply)| (word.to_owned(), supply))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn supply(&self, word: &str) -> u32 {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == word)
            .map_or(0, |(_, supply)| *supply)
    }

    fn draw(&mut self, prompt_id: u32) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let index = digest_mod(prompt_id, self.0.len());
        let (word, supply) = &mut self.0[index];
        let word = word.clone();
        *supply -= 1;
        if *supply == 0 {
            self.0.remove(index);
        }
        Some(word)
    }
}

/// Word pools per collection, one per prompt type.
#[derive(Debug, Clone, Default)]
pub struct WordAtlas {
    collections: BTreeMap<u32, [WordPool; PACKET_SIZE]>,
}

impl WordAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atlas where each of `collections` gets the stock vocabulary.
    pub fn with_stock_words(collections: impl IntoIterator<Item = u32>) -> Self {
        let mut atlas = Self::new();
        for collection in collections {
            atlas.add_collection(collection, stock_pools());
        }
        atlas
    }

    pub fn add_collection(&mut self, collection: u32, pools: [WordPool; PACKET_SIZE]) {
        self.collections.insert(collection, pools);
    }

    pub fn pool(&self, collection: u32, prompt_type: PromptType) -> Option<&WordPool> {
        self.collections.get(&collection).map(|pools| &pools[prompt_type.slot()])
    }

    /// Picks the word for `prompt_id` and consumes one unit of its supply.
    pub fn name_prompt(&mut self, collection: u32, prompt_type: PromptType, prompt_id: u32) -> Result<String, AtlasError> {
        let pools = self
            .collections
            .get_mut(&collection)
            .ok_or(AtlasError::UnknownCollection(collection))?;

        pools[prompt_type.slot()]
            .draw(prompt_id)
            .ok_or(AtlasError::Exhausted { collection, prompt_type })
    }
}

// Big-endian digest reduced one byte at a time.
fn digest_mod(prompt_id: u32, modulus: usize) -> usize {
    let digest = Sha256::digest(prompt_id.to_string().as_bytes());
    let modulus = modulus as u64;
    digest
        .iter()
        .fold(0u64, |rest, byte| (rest * 256 + u64::from(*byte)) % modulus) as usize
}

fn stock_pools() -> [WordPool; PACKET_SIZE] {
    [
        WordPool::new([("dog", 100), ("cat", 200), ("fish", 300), ("bird", 400)]),
        WordPool::new([("hat", 100), ("cap", 200), ("helmet", 300), ("busby hat", 400)]),
        WordPool::new([("sword", 100), ("magic wand", 200), ("shuriken", 300), ("baseball glove", 400)]),
        WordPool::new([("blue and gold", 100), ("red and black", 200), ("purple and black", 300), ("green and red", 400)]),
        WordPool::new([("sun glasses", 100), ("red eyes", 200), ("purple eyes", 300), ("blindfold", 400)]),
        WordPool::new([("futuristic", 100), ("samurai", 200), ("anime", 300), ("steampunk", 400)]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_prompt_same_word() {
        let mut first = WordAtlas::with_stock_words([1]);
        let mut second = WordAtlas::with_stock_words([1]);

        for prompt_id in [172033, 537042945, 1073872897] {
            assert_eq!(
                first.name_prompt(1, PromptType::Hat, prompt_id),
                second.name_prompt(1, PromptType::Hat, prompt_id)
            );
        }
    }

    #[test]
    fn test_word_comes_from_pool() {
        let mut atlas = WordAtlas::with_stock_words([2]);
        let word = atlas.name_prompt(2, PromptType::Style, 42).unwrap();

        assert!(["futuristic", "samurai", "anime", "steampunk"].contains(&word.as_str()));
        let pool = atlas.pool(2, PromptType::Style).unwrap();
        let total: u32 = ["futuristic", "samurai", "anime", "steampunk"]
            .iter()
            .map(|word| pool.supply(word))
            .sum();
        assert_eq!(total, 999);
    }

    #[test]
    fn test_supply_runs_out() {
        let mut atlas = WordAtlas::new();
        let mut pools: [WordPool; PACKET_SIZE] = Default::default();
        pools[PromptType::Eyes.slot()] = WordPool::new([("monocle", 2), ("unused", 0)]);
        atlas.add_collection(0, pools);

        assert_eq!(atlas.pool(0, PromptType::Eyes).map(WordPool::len), Some(1));
        assert_eq!(atlas.name_prompt(0, PromptType::Eyes, 1).unwrap(), "monocle");
        assert_eq!(atlas.name_prompt(0, PromptType::Eyes, 2).unwrap(), "monocle");
        assert!(atlas.pool(0, PromptType::Eyes).is_some_and(WordPool::is_empty));
        assert_eq!(
            atlas.name_prompt(0, PromptType::Eyes, 3),
            Err(AtlasError::Exhausted { collection: 0, prompt_type: PromptType::Eyes })
        );
        assert_eq!(
            atlas.name_prompt(0, PromptType::Hat, 3),
            Err(AtlasError::Exhausted { collection: 0, prompt_type: PromptType::Hat })
        );
    }

    #[test]
    fn test_unknown_collection() {
        let mut atlas = WordAtlas::with_stock_words([1, 2]);
        assert_eq!(
            atlas.name_prompt(9, PromptType::Tool, 1),
            Err(AtlasError::UnknownCollection(9))
        );
    }
}
