//! Error types for the scenario harness

use std::fmt;

use metafusion_president::MetaFusionError;
use thiserror::Error;

use crate::atlas::AtlasError;
use crate::codec::CodecError;
use crate::inventory::InventoryError;

/// Why the contract refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The marketplace contract returned one of its own errors.
    Contract(MetaFusionError),
    /// The host (or another contract, such as the payment token) failed the call.
    Host(soroban_sdk::Error),
}

impl From<MetaFusionError> for Rejection {
    fn from(error: MetaFusionError) -> Self {
        Rejection::Contract(error)
    }
}

impl From<soroban_sdk::Error> for Rejection {
    fn from(error: soroban_sdk::Error) -> Self {
        match MetaFusionError::try_from(error) {
            Ok(contract) => Rejection::Contract(contract),
            Err(_) => Rejection::Host(error),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Contract(error) => write!(f, "{error:?} ({})", *error as u32),
            Rejection::Host(error) => write!(f, "host error {error:?}"),
        }
    }
}

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Identifier encoding or parsing failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Inventory bookkeeping failed
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Word atlas lookup failed
    #[error("Atlas error: {0}")]
    Atlas(#[from] AtlasError),

    /// The contract rejected the call
    #[error("{op} rejected: {reason}")]
    Rejected { op: &'static str, reason: Rejection },

    /// The invocation aborted without a decodable error
    #[error("{op} aborted: {detail}")]
    Aborted { op: &'static str, detail: String },

    /// The call succeeded but its result could not be converted
    #[error("{op} returned an unreadable value: {detail}")]
    Conversion { op: &'static str, detail: String },

    /// The local inventory no longer matches the chain
    #[error("Inventory diverged from chain: {0}")]
    Diverged(String),

    /// The chain returned a different identifier than the codec predicts
    #[error("Identifier mismatch: expected {expected}, chain returned {actual}")]
    IdMismatch { expected: String, actual: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Contract error carried by a rejection, if any.
    pub fn contract_error(&self) -> Option<MetaFusionError> {
        match self {
            HarnessError::Rejected { reason: Rejection::Contract(error), .. } => Some(*error),
            _ => None,
        }
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
