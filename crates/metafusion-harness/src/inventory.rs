//! Local mirror of what each user owns, per collection.
//!
//! Accounts are opened explicitly with [`Inventory::open_account`]; any other
//! operation on a `(user, collection)` pair that was never opened fails with
//! [`InventoryError::Uninitialized`]. Removal is always by value, never by
//! position, and multi-item updates validate everything before mutating.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::codec::ImageId;

/// An asset tracked by the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Item {
    Packet(u32),
    Prompt(u32),
    Image(ImageId),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Packet(id) => write!(f, "packet {id}"),
            Item::Prompt(id) => write!(f, "prompt {id}"),
            Item::Image(id) => write!(f, "image {id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ItemKind {
    Packet,
    Prompt,
    Image,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Packet => "packet",
            ItemKind::Prompt => "prompt",
            ItemKind::Image => "image",
        })
    }
}

/// Errors raised by inventory bookkeeping
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("no inventory for user {user} in collection {collection}")]
    Uninitialized { user: String, collection: u32 },

    #[error("user {user} does not hold {item} in collection {collection}")]
    NotHeld { user: String, collection: u32, item: Item },
}

/// Everything one user holds in one collection, in acquisition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Holdings {
    pub packets: Vec<u32>,
    pub prompts: Vec<u32>,
    pub images: Vec<ImageId>,
}

impl Holdings {
    fn contains(&self, item: &Item) -> bool {
        match item {
            Item::Packet(id) => self.packets.contains(id),
            Item::Prompt(id) => self.prompts.contains(id),
            Item::Image(id) => self.images.contains(id),
        }
    }

    fn push(&mut self, item: Item) {
        match item {
            Item::Packet(id) => self.packets.push(id),
            Item::Prompt(id) => self.prompts.push(id),
            Item::Image(id) => self.images.push(id),
        }
    }

    fn remove(&mut self, item: &Item) -> bool {
        fn take<T: PartialEq>(items: &mut Vec<T>, value: &T) -> bool {
            match items.iter().position(|held| held == value) {
                Some(index) => {
                    items.remove(index);
                    true
                }
                None => false,
            }
        }

        match item {
            Item::Packet(id) => take(&mut self.packets, id),
            Item::Prompt(id) => take(&mut self.prompts, id),
            Item::Image(id) => take(&mut self.images, id),
        }
    }

    fn first(&self, kind: ItemKind) -> Option<Item> {
        match kind {
            ItemKind::Packet => self.packets.first().copied().map(Item::Packet),
            ItemKind::Prompt => self.prompts.first().copied().map(Item::Prompt),
            ItemKind::Image => self.images.first().copied().map(Item::Image),
        }
    }
}

/// Item counts across every account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryTotals {
    pub accounts: usize,
    pub packets: usize,
    pub prompts: usize,
    pub images: usize,
    pub listings: usize,
}

impl fmt::Display for InventoryTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packets, {} prompts, {} images, {} listings across {} accounts",
            self.packets, self.prompts, self.images, self.listings, self.accounts
        )
    }
}

/// Per `(user, collection)` record of owned packets, prompts and images.
#[derive(Debug, Clone)]
pub struct Inventory<U> {
    accounts: BTreeMap<(U, u32), Holdings>,
    listings: BTreeMap<Item, i128>,
}

impl<U> Default for Inventory<U> {
    fn default() -> Self {
        Self {
            accounts: BTreeMap::new(),
            listings: BTreeMap::new(),
        }
    }
}

impl<U: Ord + Clone + fmt::Debug> Inventory<U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty holdings for `(user, collection)`. Opening an existing
    /// account keeps its contents.
    pub fn open_account(&mut self, user: &U, collection: u32) {
        self.accounts.entry((user.clone(), collection)).or_default();
    }

    pub fn is_open(&self, user: &U, collection: u32) -> bool {
        self.accounts.contains_key(&(user.clone(), collection))
    }

    pub fn holdings(&self, user: &U, collection: u32) -> Result<&Holdings, InventoryError> {
        self.accounts
            .get(&(user.clone(), collection))
            .ok_or_else(|| uninitialized(user, collection))
    }

    fn holdings_mut(&mut self, user: &U, collection: u32) -> Result<&mut Holdings, InventoryError> {
        self.accounts
            .get_mut(&(user.clone(), collection))
            .ok_or_else(|| uninitialized(user, collection))
    }

    pub fn packets(&self, user: &U, collection: u32) -> Result<&[u32], InventoryError> {
        Ok(&self.holdings(user, collection)?.packets)
    }

    pub fn prompts(&self, user: &U, collection: u32) -> Result<&[u32], InventoryError> {
        Ok(&self.holdings(user, collection)?.prompts)
    }

    pub fn images(&self, user: &U, collection: u32) -> Result<&[ImageId], InventoryError> {
        Ok(&self.holdings(user, collection)?.images)
    }

    /// First held item of `kind`, in acquisition order.
    pub fn first(&self, user: &U, collection: u32, kind: ItemKind) -> Result<Option<Item>, InventoryError> {
        Ok(self.holdings(user, collection)?.first(kind))
    }

    pub fn record_minted(&mut self, user: &U, collection: u32, item: Item) -> Result<(), InventoryError> {
        self.holdings_mut(user, collection)?.push(item);
        Ok(())
    }

    /// Moves `item` from `from` to `to`. Both accounts are checked before
    /// anything changes; an open listing on the item is dropped.
    pub fn record_transferred(&mut self, from: &U, to: &U, collection: u32, item: Item) -> Result<(), InventoryError> {
        let source = self.holdings(from, collection)?;
        self.holdings(to, collection)?;
        if !source.contains(&item) {
            return Err(not_held(from, collection, item));
        }

        self.holdings_mut(from, collection)?.remove(&item);
        self.holdings_mut(to, collection)?.push(item);
        self.listings.remove(&item);
        Ok(())
    }

    pub fn record_opened(&mut self, user: &U, collection: u32, packet_id: u32) -> Result<(), InventoryError> {
        self.take(user, collection, Item::Packet(packet_id))
    }

    /// Removes every prompt in `prompts`, or none of them if one is missing.
    pub fn record_consumed(&mut self, user: &U, collection: u32, prompts: &[u32]) -> Result<(), InventoryError> {
        let holdings = self.holdings_mut(user, collection)?;
        let mut remaining = holdings.prompts.clone();
        for prompt_id in prompts {
            match remaining.iter().position(|held| held == prompt_id) {
                Some(index) => {
                    remaining.remove(index);
                }
                None => return Err(not_held(user, collection, Item::Prompt(*prompt_id))),
            }
        }
        holdings.prompts = remaining;

        for prompt_id in prompts {
            self.listings.remove(&Item::Prompt(*prompt_id));
        }
        Ok(())
    }

    pub fn record_produced(&mut self, user: &U, collection: u32, image: ImageId) -> Result<(), InventoryError> {
        self.record_minted(user, collection, Item::Image(image))
    }

    pub fn record_burned(&mut self, user: &U, collection: u32, image: ImageId) -> Result<(), InventoryError> {
        self.take(user, collection, Item::Image(image))
    }

    /// Mirrors an accepted listing. The seller must hold the item.
    pub fn record_listed(&mut self, user: &U, collection: u32, item: Item, price: i128) -> Result<(), InventoryError> {
        if !self.holdings(user, collection)?.contains(&item) {
            return Err(not_held(user, collection, item));
        }
        self.listings.insert(item, price);
        Ok(())
    }

    pub fn listing(&self, item: &Item) -> Option<i128> {
        self.listings.get(item).copied()
    }

    /// Everything `user` holds across collections, ordered by collection.
    pub fn user_view(&self, user: &U) -> Holdings {
        let mut view = Holdings::default();
        for ((owner, _), holdings) in &self.accounts {
            if owner == user {
                view.packets.extend_from_slice(&holdings.packets);
                view.prompts.extend_from_slice(&holdings.prompts);
                view.images.extend_from_slice(&holdings.images);
            }
        }
        view
    }

    pub fn totals(&self) -> InventoryTotals {
        self.accounts.values().fold(
            InventoryTotals {
                accounts: self.accounts.len(),
                listings: self.listings.len(),
                ..Default::default()
            },
            |mut totals, holdings| {
                totals.packets += holdings.packets.len();
                totals.prompts += holdings.prompts.len();
                totals.images += holdings.images.len();
                totals
            },
        )
    }

    fn take(&mut self, user: &U, collection: u32, item: Item) -> Result<(), InventoryError> {
        if !self.holdings_mut(user, collection)?.remove(&item) {
            return Err(not_held(user, collection, item));
        }
        self.listings.remove(&item);
        Ok(())
    }
}

fn uninitialized<U: fmt::Debug>(user: &U, collection: u32) -> InventoryError {
    InventoryError::Uninitialized {
        user: format!("{user:?}"),
        collection,
    }
}

fn not_held<U: fmt::Debug>(user: &U, collection: u32, item: Item) -> InventoryError {
    InventoryError::NotHeld {
        user: format!("{user:?}"),
        collection,
        item,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Inventory<&'static str> {
        let mut inventory = Inventory::new();
        for user in ["alice", "bob"] {
            for collection in [1, 2] {
                inventory.open_account(&user, collection);
            }
        }
        inventory
    }

    #[test]
    fn test_uninitialized_account() {
        let mut inventory = inventory();

        assert_eq!(
            inventory.packets(&"carol", 1),
            Err(InventoryError::Uninitialized { user: "\"carol\"".into(), collection: 1 })
        );
        assert!(inventory.record_minted(&"alice", 3, Item::Packet(3)).is_err());
        assert!(!inventory.is_open(&"alice", 3));

        inventory.open_account(&"alice", 3);
        inventory.record_minted(&"alice", 3, Item::Packet(3)).unwrap();
        // reopening keeps the contents
        inventory.open_account(&"alice", 3);
        assert_eq!(inventory.packets(&"alice", 3).unwrap(), &[3]);
    }

    #[test]
    fn test_transfer_removes_by_value() {
        let mut inventory = inventory();
        for sequence in 1..=3 {
            inventory.record_minted(&"alice", 1, Item::Packet(sequence << 16 | 1)).unwrap();
        }

        inventory.record_transferred(&"alice", &"bob", 1, Item::Packet(2 << 16 | 1)).unwrap();

        assert_eq!(inventory.packets(&"alice", 1).unwrap(), &[1 << 16 | 1, 3 << 16 | 1]);
        assert_eq!(inventory.packets(&"bob", 1).unwrap(), &[2 << 16 | 1]);
        assert_eq!(inventory.first(&"alice", 1, ItemKind::Packet).unwrap(), Some(Item::Packet(1 << 16 | 1)));
        assert_eq!(inventory.first(&"bob", 1, ItemKind::Prompt).unwrap(), None);
    }

    #[test]
    fn test_duplicate_ids_move_one_at_a_time() {
        let mut inventory = inventory();
        let prompt = Item::Prompt(2 << 16 | 5);
        for item in [prompt, Item::Prompt(8), prompt] {
            inventory.record_minted(&"alice", 2, item).unwrap();
        }

        inventory.record_transferred(&"alice", &"bob", 2, prompt).unwrap();
        assert_eq!(inventory.prompts(&"alice", 2).unwrap(), &[8, 2 << 16 | 5]);
        assert_eq!(inventory.prompts(&"bob", 2).unwrap(), &[2 << 16 | 5]);

        inventory.record_transferred(&"alice", &"bob", 2, prompt).unwrap();
        assert_eq!(inventory.prompts(&"alice", 2).unwrap(), &[8]);
        assert_eq!(inventory.prompts(&"bob", 2).unwrap().len(), 2);
        assert!(inventory.record_transferred(&"alice", &"bob", 2, prompt).is_err());
    }

    #[test]
    fn test_failed_transfer_changes_nothing() {
        let mut inventory = inventory();
        inventory.record_minted(&"alice", 1, Item::Prompt(7)).unwrap();

        let not_held = inventory.record_transferred(&"bob", &"alice", 1, Item::Prompt(7));
        assert!(matches!(not_held, Err(InventoryError::NotHeld { .. })));

        let unknown = inventory.record_transferred(&"alice", &"carol", 1, Item::Prompt(7));
        assert!(matches!(unknown, Err(InventoryError::Uninitialized { .. })));

        assert_eq!(inventory.prompts(&"alice", 1).unwrap(), &[7]);
        assert_eq!(inventory.totals().prompts, 1);
    }

    #[test]
    fn test_consume_is_all_or_nothing() {
        let mut inventory = inventory();
        for prompt_id in [10, 11, 12] {
            inventory.record_minted(&"alice", 2, Item::Prompt(prompt_id)).unwrap();
        }

        let missing = inventory.record_consumed(&"alice", 2, &[10, 99]);
        assert_eq!(
            missing,
            Err(InventoryError::NotHeld { user: "\"alice\"".into(), collection: 2, item: Item::Prompt(99) })
        );
        assert_eq!(inventory.prompts(&"alice", 2).unwrap(), &[10, 11, 12]);

        inventory.record_consumed(&"alice", 2, &[12, 10]).unwrap();
        assert_eq!(inventory.prompts(&"alice", 2).unwrap(), &[11]);
    }

    #[test]
    fn test_image_lifecycle() {
        let mut inventory = inventory();
        let image = ImageId::encode(1, &[1, 2, 3, 4, 5, 6]);

        inventory.record_produced(&"bob", 1, image).unwrap();
        assert_eq!(inventory.images(&"bob", 1).unwrap(), &[image]);

        inventory.record_burned(&"bob", 1, image).unwrap();
        assert!(inventory.images(&"bob", 1).unwrap().is_empty());
        assert!(inventory.record_burned(&"bob", 1, image).is_err());
    }

    #[test]
    fn test_listing_cleared_when_item_moves() {
        let mut inventory = inventory();
        let packet = Item::Packet(1 << 16 | 2);
        inventory.record_minted(&"alice", 2, packet).unwrap();

        assert!(inventory.record_listed(&"bob", 2, packet, 5).is_err());
        inventory.record_listed(&"alice", 2, packet, 5).unwrap();
        assert_eq!(inventory.listing(&packet), Some(5));
        assert_eq!(inventory.totals().listings, 1);

        inventory.record_transferred(&"alice", &"bob", 2, packet).unwrap();
        assert_eq!(inventory.listing(&packet), None);

        inventory.record_listed(&"bob", 2, packet, 7).unwrap();
        inventory.record_opened(&"bob", 2, 1 << 16 | 2).unwrap();
        assert_eq!(inventory.listing(&packet), None);
    }

    #[test]
    fn test_views_and_totals() {
        let mut inventory = inventory();
        inventory.record_minted(&"alice", 1, Item::Packet(1 << 16 | 1)).unwrap();
        inventory.record_minted(&"alice", 2, Item::Packet(1 << 16 | 2)).unwrap();
        inventory.record_minted(&"bob", 2, Item::Prompt(3)).unwrap();

        let alice = inventory.user_view(&"alice");
        assert_eq!(alice.packets, vec![1 << 16 | 1, 1 << 16 | 2]);
        assert!(alice.prompts.is_empty());

        assert_eq!(
            inventory.totals(),
            InventoryTotals { accounts: 4, packets: 2, prompts: 1, images: 0, listings: 0 }
        );
    }
}
