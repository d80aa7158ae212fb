//! Scenario configuration

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use metafusion_president::contract::{IMAGE_PRICE, OPEN_PRICE, PACKET_PRICE};
use serde::{Deserialize, Serialize};

use crate::codec::{PROMPT_COLLECTION_LIMIT, PROMPT_PACKET_LIMIT};
use crate::error::{HarnessError, HarnessResult};

/// Stroops in one unit of the payment token.
pub const UNIT: i64 = 10_000_000;

/// Payments and listing prices, in stroops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prices {
    pub packet_fee: i64,
    pub open_fee: i64,
    pub image_fee: i64,
    pub packet_listing: i64,
    pub prompt_listing: i64,
    pub card_listing: i64,
}

impl Default for Prices {
    fn default() -> Self {
        Self {
            packet_fee: PACKET_PRICE as i64,
            open_fee: OPEN_PRICE as i64,
            image_fee: IMAGE_PRICE as i64,
            packet_listing: UNIT / 10,
            prompt_listing: UNIT / 100,
            card_listing: 2 * UNIT,
        }
    }
}

/// Which scenario phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phases {
    pub forge: bool,
    pub packet_transfer: bool,
    pub packet_opening: bool,
    pub prompt_transfer: bool,
    pub image_creation: bool,
    pub image_transfer: bool,
    pub image_burn: bool,
}

impl Default for Phases {
    fn default() -> Self {
        Self {
            forge: true,
            packet_transfer: true,
            packet_opening: true,
            prompt_transfer: true,
            image_creation: true,
            image_transfer: true,
            image_burn: true,
        }
    }
}

/// Scenario sizes and knobs. Every field has a default, so an empty TOML
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Collections forged by the contract owner.
    pub collections: Vec<u32>,
    /// Number of simulated users.
    pub users: usize,
    /// Packets each user forges in each collection.
    pub packets_per_user: usize,
    pub packet_transfers: usize,
    pub prompt_transfers: usize,
    /// Image creation attempts; attempts without a full prompt set are skipped.
    pub image_attempts: usize,
    pub image_transfers: usize,
    pub image_burns: usize,
    /// Seed of the driver's RNG.
    pub seed: u64,
    /// Payment tokens minted to each user, in stroops.
    pub funding: i64,
    pub prices: Prices,
    pub phases: Phases,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            collections: vec![1, 2],
            users: 2,
            packets_per_user: 6,
            packet_transfers: 6,
            prompt_transfers: 12,
            image_attempts: 8,
            image_transfers: 1,
            image_burns: 1,
            seed: 0,
            funding: 1000 * UNIT,
            prices: Prices::default(),
            phases: Phases::default(),
        }
    }
}

impl ScenarioConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_collections(mut self, collections: impl Into<Vec<u32>>) -> Self {
        self.collections = collections.into();
        self
    }

    pub fn with_users(mut self, users: usize) -> Self {
        self.users = users;
        self
    }

    pub fn with_phases(mut self, phases: Phases) -> Self {
        self.phases = phases;
        self
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.collections.is_empty() {
            return Err(HarnessError::Config("at least one collection is required".into()));
        }
        let mut seen = BTreeSet::new();
        for &collection in &self.collections {
            if collection >= PROMPT_COLLECTION_LIMIT {
                return Err(HarnessError::Config(format!("collection {collection} does not fit in a prompt id")));
            }
            if !seen.insert(collection) {
                return Err(HarnessError::Config(format!("collection {collection} is listed twice")));
            }
        }
        if self.users == 0 {
            return Err(HarnessError::Config("at least one user is required".into()));
        }
        // sequences start at 1 and are shared by every user of a collection
        let packets = self.users.saturating_mul(self.packets_per_user);
        if packets >= PROMPT_PACKET_LIMIT as usize {
            return Err(HarnessError::Config(format!("{packets} packets per collection do not fit in a prompt id")));
        }

        let trades = self.packet_transfers + self.prompt_transfers + self.image_transfers;
        if self.users < 2 && trades > 0 {
            return Err(HarnessError::Config("transfers need at least two users".into()));
        }

        let prices = &self.prices;
        let listings = [prices.packet_listing, prices.prompt_listing, prices.card_listing];
        if listings.iter().any(|price| *price <= 0) {
            return Err(HarnessError::Config("listing prices must be positive".into()));
        }
        if prices.packet_fee < 0 || prices.open_fee < 0 || prices.image_fee < 0 || self.funding < 0 {
            return Err(HarnessError::Config("fees and funding cannot be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ScenarioConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScenarioConfig::default());
        assert_eq!(config.collections, vec![1, 2]);
        assert_eq!(config.prices.packet_fee, 1_000_000);
        assert_eq!(config.funding, 10_000_000_000);
    }

    #[test]
    fn test_partial_override() {
        let config = ScenarioConfig::from_toml_str(
            r#"
            collections = [0]
            users = 3
            seed = 42

            [prices]
            card_listing = 5

            [phases]
            image_burn = false
            "#,
        )
        .unwrap();

        assert_eq!(config.collections, vec![0]);
        assert_eq!(config.users, 3);
        assert_eq!(config.seed, 42);
        assert_eq!(config.prices.card_listing, 5);
        assert_eq!(config.prices.prompt_listing, 100_000);
        assert!(!config.phases.image_burn);
        assert!(config.phases.forge);
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            "collections = []",
            "collections = [1, 1]",
            "collections = [65536]",
            "collections = [8192]",
            "packets_per_user = 4096",
            "users = 0",
            "users = 1",
            "[prices]\nprompt_listing = 0",
            "users = \"two\"",
        ];
        for source in cases {
            assert!(
                matches!(ScenarioConfig::from_toml_str(source), Err(HarnessError::Config(_))),
                "accepted {source:?}"
            );
        }
    }

    #[test]
    fn test_collection_bound_follows_prompt_ids() {
        let widest = ScenarioConfig::default().with_collections([PROMPT_COLLECTION_LIMIT - 1]);
        assert!(widest.validate().is_ok());

        let too_wide = ScenarioConfig::default().with_collections([PROMPT_COLLECTION_LIMIT]);
        assert!(matches!(too_wide.validate(), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_single_user_without_trades() {
        let config = ScenarioConfig {
            packet_transfers: 0,
            prompt_transfers: 0,
            image_transfers: 0,
            ..ScenarioConfig::default().with_users(1)
        };
        assert!(config.validate().is_ok());
    }
}
