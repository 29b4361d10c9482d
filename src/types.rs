//! Core types used throughout PolyHedge
//!
//! Defines the market sides, recommended actions, and the structured
//! outcomes returned by the strategy engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Side of a binary-outcome market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "YES"),
            Side::No => write!(f, "NO"),
        }
    }
}

/// Action recommended or performed by the strategy engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// No position held, nothing to do
    Wait,
    /// Keep the current position unchanged
    Hold,
    /// Take-profit condition met, rebalance into the opposite side
    Hedge,
    /// Stop-loss condition met, close everything
    StopLoss,
    /// Initial position opened
    Entry,
    /// Position cleared back to empty
    Reset,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Wait => write!(f, "WAIT"),
            Action::Hold => write!(f, "HOLD"),
            Action::Hedge => write!(f, "HEDGE"),
            Action::StopLoss => write!(f, "STOP_LOSS"),
            Action::Entry => write!(f, "ENTRY"),
            Action::Reset => write!(f, "RESET"),
        }
    }
}

/// Result of a read-only strategy evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Recommended action
    pub action: Action,
    /// Human-readable explanation of which threshold produced the action.
    /// For observability only; callers must not parse it.
    pub reason: String,
    /// Probability the evaluation was made at
    pub current_prob: f64,
    /// Mark-to-market PnL of the open position, when one is held
    pub unrealized_pnl: Option<f64>,
}

/// Result of opening an initial position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryOutcome {
    /// Shares bought
    pub shares: f64,
    /// Price paid per share
    pub price: f64,
    /// Capital invested (shares * price)
    pub cost: f64,
    /// Probability recorded at entry
    pub entry_prob: f64,
}

/// Result of a take-profit hedge: sell part of the YES side, reinvest the
/// full proceeds into NO shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeOutcome {
    /// YES shares sold
    pub yes_sold: f64,
    /// Sale price per YES share
    pub yes_price: f64,
    /// NO shares bought with the proceeds
    pub no_bought: f64,
    /// Purchase price per NO share
    pub no_price: f64,
    /// Cash received from the YES sale
    pub proceeds: f64,
    /// Realized gain on the disposed YES shares, fixed at the moment of
    /// sale regardless of what the market does afterwards
    pub locked_pnl: f64,
}

/// Result of a stop-loss exit: everything sold, position flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitOutcome {
    /// YES shares sold
    pub yes_sold: f64,
    /// NO shares sold
    pub no_sold: f64,
    /// Cash recovered from both sales
    pub total_proceeds: f64,
    /// Full realized PnL (total withdrawn minus total invested)
    pub final_pnl: f64,
}

/// Serializable snapshot of the position ledger.
///
/// The ledger is fully reconstructable from this; collaborators persist it
/// after every mutation and load it before first use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub yes_shares: f64,
    pub no_shares: f64,
    pub total_invested: f64,
    pub total_withdrawn: f64,
    pub avg_cost_yes: f64,
    pub avg_cost_no: f64,
    pub entry_prob: Option<f64>,
    pub has_position: bool,
    pub is_hedged: bool,
}

/// Order handed to an execution client.
///
/// The engine computes quantities; whether this becomes a real order is
/// entirely up to the execution collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTicket {
    /// Unique ticket ID
    pub id: String,
    /// Market side to trade
    pub side: Side,
    /// Shares to trade
    pub shares: f64,
    /// Limit price per share (0.0 - 1.0)
    pub price: f64,
}

impl OrderTicket {
    pub fn new(side: Side, shares: f64, price: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            side,
            shares,
            price,
        }
    }
}
