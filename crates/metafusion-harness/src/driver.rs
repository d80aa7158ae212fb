//! Scenario driver: forges, trades, opens, assembles and burns against the
//! marketplace while keeping the local inventory in lockstep with the chain.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use soroban_sdk::Address;
use tracing::{debug, info, warn};

use crate::atlas::WordAtlas;
use crate::chain::PresidentApi;
use crate::checkpoint::{Checkpoint, Phase};
use crate::codec::{self, ImageId, PACKET_SIZE, PromptType};
use crate::config::ScenarioConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::inventory::{Inventory, InventoryTotals, Item, ItemKind};
use crate::prompt_builder::ImagePrompt;

/// Counters of what a run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioStats {
    pub collections_forged: usize,
    pub packets_forged: usize,
    pub packets_transferred: usize,
    pub packets_opened: usize,
    pub prompts_minted: usize,
    pub prompts_transferred: usize,
    pub images_created: usize,
    pub images_transferred: usize,
    pub images_burned: usize,
    /// Prompts handed back by burns
    pub prompts_recovered: usize,
    /// Rounds or attempts that found nothing to act on
    pub skipped: usize,
}

/// An image created during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub image: ImageId,
    pub collection: u32,
    /// Index of the creating user
    pub creator: usize,
    pub description: String,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub seed: u64,
    pub users: usize,
    pub collections: Vec<u32>,
    pub phases: Vec<Phase>,
    pub stats: ScenarioStats,
    pub images: Vec<ImageRecord>,
    pub totals: InventoryTotals,
}

/// Drives one scenario against a [`PresidentApi`], signalling `K` between
/// phases.
pub struct ScenarioDriver<C, K> {
    chain: C,
    checkpoint: K,
    config: ScenarioConfig,
    owner: Address,
    users: Vec<Address>,
    inventory: Inventory<Address>,
    atlas: WordAtlas,
    words: BTreeMap<u32, String>,
    /// Last packet sequence forged per collection
    sequences: BTreeMap<u32, u32>,
    rng: StdRng,
    report: ScenarioReport,
}

impl<C: PresidentApi, K: Checkpoint> ScenarioDriver<C, K> {
    /// Creates and funds the configured users and opens their inventory
    /// accounts in every collection.
    pub fn new(chain: C, checkpoint: K, config: ScenarioConfig) -> HarnessResult<Self> {
        config.validate()?;

        let owner = chain.owner();
        let users = (0..config.users)
            .map(|_| chain.create_user(config.funding.into()))
            .collect::<HarnessResult<Vec<_>>>()?;

        let mut inventory = Inventory::new();
        for user in &users {
            for &collection in &config.collections {
                inventory.open_account(user, collection);
            }
        }

        info!(
            "Scenario initialized with {} users over collections {:?} (seed {})",
            users.len(),
            config.collections,
            config.seed
        );

        Ok(Self {
            atlas: WordAtlas::with_stock_words(config.collections.iter().copied()),
            rng: StdRng::seed_from_u64(config.seed),
            report: ScenarioReport {
                seed: config.seed,
                users: users.len(),
                collections: config.collections.clone(),
                ..Default::default()
            },
            words: BTreeMap::new(),
            sequences: BTreeMap::new(),
            chain,
            checkpoint,
            config,
            owner,
            users,
            inventory,
        })
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn checkpoint(&self) -> &K {
        &self.checkpoint
    }

    pub fn inventory(&self) -> &Inventory<Address> {
        &self.inventory
    }

    pub fn users(&self) -> &[Address] {
        &self.users
    }

    pub fn report(&self) -> &ScenarioReport {
        &self.report
    }

    /// Atlas word given to a minted prompt.
    pub fn word(&self, prompt_id: u32) -> Option<&str> {
        self.words.get(&prompt_id).map(String::as_str)
    }

    /// Runs every enabled phase in order.
    pub fn run(&mut self) -> HarnessResult<ScenarioReport> {
        let phases = self.config.phases;

        if phases.forge {
            self.forge()?;
            self.finish(Phase::Forge)?;
        }
        if phases.packet_transfer {
            self.transfer_packets()?;
            self.finish(Phase::PacketTransfer)?;
        }
        if phases.packet_opening {
            self.open_packets()?;
            self.finish(Phase::PacketOpening)?;
        }
        if phases.prompt_transfer {
            self.transfer_prompts()?;
            self.finish(Phase::PromptTransfer)?;
        }
        if phases.image_creation {
            self.create_images()?;
            self.finish(Phase::ImageCreation)?;
        }
        if phases.image_transfer {
            self.transfer_images()?;
            self.finish(Phase::ImageTransfer)?;
        }
        if phases.image_burn {
            self.burn_images()?;
            self.finish(Phase::ImageBurn)?;
        }

        self.report.totals = self.inventory.totals();
        info!("Scenario complete: {}", self.report.totals);
        debug!("Stats: {:?}", self.report.stats);
        Ok(self.report.clone())
    }

    /// Forges every configured collection, then `packets_per_user` packets
    /// per user and collection.
    pub fn forge(&mut self) -> HarnessResult<()> {
        for collection in self.config.collections.clone() {
            self.forge_collection(collection)?;
        }

        for user in 0..self.users.len() {
            for collection in self.config.collections.clone() {
                for _ in 0..self.config.packets_per_user {
                    self.forge_packet(user, collection)?;
                }
            }
        }
        Ok(())
    }

    pub fn forge_collection(&mut self, collection: u32) -> HarnessResult<()> {
        self.chain.forge_collection(&self.owner, collection)?;
        if !self.chain.collection_exists(collection)? {
            return Err(HarnessError::Diverged(format!(
                "collection {collection} missing right after it was forged"
            )));
        }

        self.report.stats.collections_forged += 1;
        info!(collection, "forged collection");
        Ok(())
    }

    /// Forges one packet for `user` and checks its id against the codec.
    pub fn forge_packet(&mut self, user: usize, collection: u32) -> HarnessResult<u32> {
        let blacksmith = self.user(user)?;
        let sequence = self.sequences.get(&collection).copied().unwrap_or(0) + 1;
        let expected = codec::encode_packet_id(collection, sequence)?;
        self.ensure_open(&blacksmith, collection)?;

        let packet_id = self
            .chain
            .forge_packet(&blacksmith, collection, self.config.prices.packet_fee.into())?;
        if packet_id != expected {
            return Err(HarnessError::IdMismatch {
                expected: expected.to_string(),
                actual: packet_id.to_string(),
            });
        }

        self.sequences.insert(collection, sequence);
        self.inventory
            .record_minted(&blacksmith, collection, Item::Packet(packet_id))?;
        self.report.stats.packets_forged += 1;
        info!(user, collection, packet_id, "forged packet");
        Ok(packet_id)
    }

    pub fn transfer_packets(&mut self) -> HarnessResult<()> {
        let price = self.config.prices.packet_listing.into();
        for round in 0..self.config.packet_transfers {
            if self.trade_round(round, ItemKind::Packet, price)? {
                self.report.stats.packets_transferred += 1;
            }
        }
        Ok(())
    }

    pub fn transfer_prompts(&mut self) -> HarnessResult<()> {
        let price = self.config.prices.prompt_listing.into();
        for round in 0..self.config.prompt_transfers {
            if self.trade_round(round, ItemKind::Prompt, price)? {
                self.report.stats.prompts_transferred += 1;
            }
        }
        Ok(())
    }

    pub fn transfer_images(&mut self) -> HarnessResult<()> {
        let price = self.config.prices.card_listing.into();
        for round in 0..self.config.image_transfers {
            if self.trade_round(round, ItemKind::Image, price)? {
                self.report.stats.images_transferred += 1;
            }
        }
        Ok(())
    }

    // Round `i`: users[i % n] sells their first item of `kind` in
    // collections[i % m] to users[(i + 1) % n].
    fn trade_round(&mut self, round: usize, kind: ItemKind, price: i128) -> HarnessResult<bool> {
        let users = self.users.len();
        let seller = round % users;
        let buyer = (round + 1) % users;
        let collection = self.config.collections[round % self.config.collections.len()];

        let Some(item) = self.inventory.first(&self.user(seller)?, collection, kind)? else {
            debug!(round, seller, collection, "no {kind} to sell, skipping round");
            self.report.stats.skipped += 1;
            return Ok(false);
        };

        self.transfer(seller, buyer, collection, item, price)?;
        Ok(true)
    }

    /// Lists `item` for `seller`, buys it as `buyer` and verifies the new
    /// owner and both balances before mirroring the transfer.
    pub fn transfer(&mut self, seller: usize, buyer: usize, collection: u32, item: Item, price: i128) -> HarnessResult<()> {
        let seller_address = self.user(seller)?;
        let buyer_address = self.user(buyer)?;
        self.ensure_open(&seller_address, collection)?;
        self.ensure_open(&buyer_address, collection)?;
        let seller_before = self.chain.balance(&seller_address)?;
        let buyer_before = self.chain.balance(&buyer_address)?;

        self.chain.list(&seller_address, &item, price)?;
        self.inventory
            .record_listed(&seller_address, collection, item, price)?;
        self.chain.buy(&buyer_address, &item, price)?;

        if self.chain.owner_of(&item)? != buyer_address {
            return Err(self.diverged(format!("{item} did not reach buyer {buyer}")));
        }
        let earned = self.chain.balance(&seller_address)? - seller_before;
        let paid = buyer_before - self.chain.balance(&buyer_address)?;
        if earned != price || paid != price {
            return Err(self.diverged(format!(
                "{item} sold for {price}, but seller earned {earned} and buyer paid {paid}"
            )));
        }

        self.inventory
            .record_transferred(&seller_address, &buyer_address, collection, item)?;
        info!(seller, buyer, collection, price, "transferred {item}");
        Ok(())
    }

    /// Opens every packet held by any user.
    pub fn open_packets(&mut self) -> HarnessResult<()> {
        for user in 0..self.users.len() {
            let address = self.user(user)?;
            for collection in self.config.collections.clone() {
                let packets = self.inventory.packets(&address, collection)?.to_vec();
                for packet_id in packets {
                    self.open_packet(user, packet_id)?;
                }
            }
        }
        Ok(())
    }

    /// Opens one packet, checks the yield and names each prompt.
    pub fn open_packet(&mut self, user: usize, packet_id: u32) -> HarnessResult<Vec<u32>> {
        let opener = self.user(user)?;
        let collection = codec::decode_collection(packet_id);
        self.ensure_open(&opener, collection)?;

        let prompts = self
            .chain
            .open_packet(&opener, packet_id, self.config.prices.open_fee.into())?;

        if prompts.len() != PACKET_SIZE {
            return Err(self.diverged(format!(
                "packet {packet_id} yielded {} prompts instead of {PACKET_SIZE}",
                prompts.len()
            )));
        }
        let mut types = Vec::with_capacity(PACKET_SIZE);
        for &prompt_id in &prompts {
            let info = codec::decode_prompt(prompt_id);
            if info.collection != collection {
                return Err(self.diverged(format!(
                    "prompt {prompt_id} of packet {packet_id} belongs to collection {}",
                    info.collection
                )));
            }
            let prompt_type = PromptType::of(prompt_id)?;
            if types.contains(&prompt_type) {
                return Err(self.diverged(format!(
                    "packet {packet_id} yielded two {prompt_type} prompts"
                )));
            }
            types.push(prompt_type);
        }

        self.inventory.record_opened(&opener, collection, packet_id)?;
        for (&prompt_id, &prompt_type) in prompts.iter().zip(&types) {
            self.inventory
                .record_minted(&opener, collection, Item::Prompt(prompt_id))?;
            let word = self.atlas.name_prompt(collection, prompt_type, prompt_id)?;
            debug!(prompt_id, %prompt_type, %word, "minted prompt");
            self.words.insert(prompt_id, word);
        }

        self.report.stats.packets_opened += 1;
        self.report.stats.prompts_minted += prompts.len();
        info!(user, packet_id, ?prompts, "opened packet");
        Ok(prompts)
    }

    /// Makes `image_attempts` attempts, each for a random user and
    /// collection drawn from the seeded RNG.
    pub fn create_images(&mut self) -> HarnessResult<()> {
        for attempt in 0..self.config.image_attempts {
            let user = self.rng.random_range(0..self.users.len());
            let collection = self.config.collections[self.rng.random_range(0..self.config.collections.len())];

            match self.assemble(user, collection)? {
                Some(slots) => {
                    self.create_image(user, collection, slots)?;
                }
                None => {
                    debug!(attempt, user, collection, "incomplete prompt set, skipping");
                    self.report.stats.skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// One held prompt per type slot, the last held prompt of a type
    /// winning. `None` while any slot stays empty.
    pub fn assemble(&self, user: usize, collection: u32) -> HarnessResult<Option<[u32; PACKET_SIZE]>> {
        let mut slots = [0u32; PACKET_SIZE];
        for &prompt_id in self.inventory.prompts(&self.user(user)?, collection)? {
            if let Ok(prompt_type) = PromptType::of(prompt_id) {
                slots[prompt_type.slot()] = prompt_id;
            }
        }
        Ok((!slots.contains(&0)).then_some(slots))
    }

    /// Creates an image from `slots` and checks that its id embeds them.
    pub fn create_image(&mut self, user: usize, collection: u32, slots: [u32; PACKET_SIZE]) -> HarnessResult<ImageId> {
        let creator = self.user(user)?;
        self.ensure_open(&creator, collection)?;
        let image = self
            .chain
            .create_image(&creator, &slots, self.config.prices.image_fee.into())?;

        if image.prompts() != slots {
            return Err(HarnessError::IdMismatch {
                expected: format!("image embedding {slots:?}"),
                actual: image.to_string(),
            });
        }

        self.inventory.record_consumed(&creator, collection, &slots)?;
        self.inventory.record_produced(&creator, collection, image)?;

        let description = self.describe(&slots);
        info!(user, collection, %image, %description, "created image");
        self.report.stats.images_created += 1;
        self.report.images.push(ImageRecord {
            image,
            collection,
            creator: user,
            description,
        });
        Ok(image)
    }

    /// Burns `image_burns` images, round `i` starting its search at
    /// users[i % n].
    pub fn burn_images(&mut self) -> HarnessResult<()> {
        for round in 0..self.config.image_burns {
            match self.find_image(round % self.users.len())? {
                Some((user, collection, image)) => {
                    self.burn_image(user, collection, image)?;
                }
                None => {
                    debug!(round, "no image left to burn, skipping");
                    self.report.stats.skipped += 1;
                }
            }
        }
        Ok(())
    }

    fn find_image(&self, start: usize) -> HarnessResult<Option<(usize, u32, ImageId)>> {
        let users = self.users.len();
        for offset in 0..users {
            let user = (start + offset) % users;
            let address = self.user(user)?;
            for &collection in &self.config.collections {
                if let Some(Item::Image(image)) = self.inventory.first(&address, collection, ItemKind::Image)? {
                    return Ok(Some((user, collection, image)));
                }
            }
        }
        Ok(None)
    }

    /// Burns `image` and records whatever prompts the contract hands back,
    /// each under the collection its id names.
    pub fn burn_image(&mut self, user: usize, collection: u32, image: ImageId) -> HarnessResult<Vec<u32>> {
        let owner = self.user(user)?;
        self.ensure_open(&owner, collection)?;
        let recovered = self.chain.burn_image(&owner, &image)?;

        let filed = recovered
            .iter()
            .map(|&prompt_id| (codec::decode_prompt(prompt_id).collection, prompt_id))
            .collect::<Vec<_>>();
        for &(prompt_collection, _) in &filed {
            self.ensure_open(&owner, prompt_collection)?;
        }

        self.inventory.record_burned(&owner, collection, image)?;
        for (prompt_collection, prompt_id) in filed {
            self.inventory
                .record_minted(&owner, prompt_collection, Item::Prompt(prompt_id))?;
        }

        self.report.stats.images_burned += 1;
        self.report.stats.prompts_recovered += recovered.len();
        info!(user, collection, %image, recovered = recovered.len(), "burned image");
        Ok(recovered)
    }

    /// Compares every user's local holdings with the chain's view, and
    /// checks that each item is filed under the collection its id names.
    pub fn reconcile(&self) -> HarnessResult<()> {
        for (index, user) in self.users.iter().enumerate() {
            for &collection in &self.config.collections {
                self.check_filing(index, user, collection)?;
            }
            let local = self.inventory.user_view(user);

            same_items(index, "packets", local.packets, self.chain.packets_of(user)?)?;
            same_items(index, "prompts", local.prompts, self.chain.prompts_of(user)?)?;
            same_items(index, "images", local.images, self.chain.cards_of(user)?)?;
        }
        Ok(())
    }

    fn check_filing(&self, index: usize, user: &Address, collection: u32) -> HarnessResult<()> {
        let holdings = self.inventory.holdings(user, collection)?;
        let packets = holdings
            .packets
            .iter()
            .map(|&packet_id| (Item::Packet(packet_id), codec::decode_collection(packet_id)));
        let prompts = holdings
            .prompts
            .iter()
            .map(|&prompt_id| (Item::Prompt(prompt_id), codec::decode_prompt(prompt_id).collection));
        let images = holdings
            .images
            .iter()
            .map(|&image| (Item::Image(image), codec::decode_prompt(image.prompts()[0]).collection));

        for (item, named) in packets.chain(prompts).chain(images) {
            if named != collection {
                return Err(self.diverged(format!(
                    "user {index} holds {item} of collection {named} under collection {collection}"
                )));
            }
        }
        Ok(())
    }

    // Fails before any chain call when the local mirror has no account.
    fn ensure_open(&self, user: &Address, collection: u32) -> HarnessResult<()> {
        self.inventory.holdings(user, collection)?;
        Ok(())
    }

    fn finish(&mut self, phase: Phase) -> HarnessResult<()> {
        self.reconcile()?;
        self.report.phases.push(phase);
        let totals = self.inventory.totals();
        self.checkpoint.reached(phase, &totals)
    }

    fn describe(&self, slots: &[u32; PACKET_SIZE]) -> String {
        slots
            .iter()
            .zip(PromptType::ALL)
            .fold(ImagePrompt::new(), |prompt, (prompt_id, prompt_type)| {
                match self.words.get(prompt_id) {
                    Some(word) => prompt.with(prompt_type, word.as_str()),
                    None => prompt,
                }
            })
            .build()
    }

    fn user(&self, index: usize) -> HarnessResult<Address> {
        self.users
            .get(index)
            .cloned()
            .ok_or_else(|| HarnessError::Config(format!("no user with index {index}")))
    }

    fn diverged(&self, detail: String) -> HarnessError {
        warn!("{detail}");
        HarnessError::Diverged(detail)
    }
}

// Order-insensitive comparison of a local list with the chain's.
fn same_items<T: Ord + std::fmt::Debug>(user: usize, what: &str, mut local: Vec<T>, mut chain: Vec<T>) -> HarnessResult<()> {
    local.sort();
    chain.sort();
    if local != chain {
        let detail = format!("user {user} {what}: local {local:?}, chain {chain:?}");
        warn!("{detail}");
        return Err(HarnessError::Diverged(detail));
    }
    Ok(())
}
