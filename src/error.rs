//! Error types for the position ledger and strategy engine
//!
//! Every failure here is a deterministic function of the inputs. Operations
//! validate before mutating, so a rejected call leaves the ledger unchanged
//! and the engine usable.

use crate::types::Side;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    /// Non-positive quantity or out-of-range price, rejected before any
    /// state change.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Attempted to sell more shares than currently held on a side.
    #[error("insufficient {side} shares: requested {requested:.4}, holding {held:.4}")]
    InsufficientShares {
        side: Side,
        requested: f64,
        held: f64,
    },

    /// Hedge attempted while the take-profit condition is not met. The
    /// caller must re-evaluate before retrying.
    #[error(
        "take-profit not triggered: prob {current_prob:.4} below threshold {threshold:.4}"
    )]
    PreconditionFailed { current_prob: f64, threshold: f64 },
}

impl AgentError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
