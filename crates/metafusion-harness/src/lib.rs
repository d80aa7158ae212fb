//! Scenario harness for the MetaFusion President packet marketplace.
//!
//! The harness drives the marketplace contract through a full lifecycle:
//! forging collections and packets, trading them, opening packets into typed
//! prompts, assembling prompts into images and burning images back into
//! prompts. Along the way it mirrors every user's holdings in an
//! [`Inventory`] and checks that mirror against the chain after each phase.
//!
//! - [`codec`] packs and unpacks packet, prompt and image identifiers
//! - [`inventory`] tracks holdings per `(user, collection)`
//! - [`driver`] sequences the scenario
//! - [`chain`] is the seam to the contract, with a local sandbox implementation

pub mod atlas;
pub mod chain;
pub mod checkpoint;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod inventory;
pub mod prompt_builder;

pub use chain::{LocalChain, PresidentApi};
pub use checkpoint::{Checkpoint, ConsoleCheckpoint, LogCheckpoint, Phase, RecordingCheckpoint};
pub use codec::{ImageId, PACKET_SIZE, PromptType};
pub use config::ScenarioConfig;
pub use driver::{ScenarioDriver, ScenarioReport};
pub use error::{HarnessError, HarnessResult, Rejection};
pub use inventory::{Inventory, InventoryError, Item, ItemKind};
