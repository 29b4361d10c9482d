//! Position Ledger
//!
//! Owns the share counts, cumulative capital flows, and weighted-average
//! cost basis for one binary market. Pure data and arithmetic; all decision
//! logic lives in the strategy engine.
//!
//! Accounting rules:
//! - Average cost per side is a weighted average over buy events only.
//!   A sell reduces the share count and never touches the average cost.
//! - `total_invested` grows on every buy, `total_withdrawn` on every sell.
//!   Realized PnL is derived from those flows at hedge/exit time, not
//!   tracked incrementally.

use crate::error::AgentError;
use crate::types::{PositionSnapshot, Side};

/// Mutable ledger for a single tracked market.
#[derive(Debug, Clone, Default)]
pub struct Position {
    yes_shares: f64,
    no_shares: f64,
    total_invested: f64,
    total_withdrawn: f64,
    avg_cost_yes: f64,
    avg_cost_no: f64,
    entry_prob: Option<f64>,
}

impl Position {
    /// Create an empty ledger (all zeros, no entry probability).
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from a persisted snapshot.
    ///
    /// The derived `has_position`/`is_hedged` flags in the snapshot are
    /// ignored; they are recomputed from the share counts.
    pub fn from_snapshot(snapshot: &PositionSnapshot) -> Self {
        Self {
            yes_shares: snapshot.yes_shares,
            no_shares: snapshot.no_shares,
            total_invested: snapshot.total_invested,
            total_withdrawn: snapshot.total_withdrawn,
            avg_cost_yes: snapshot.avg_cost_yes,
            avg_cost_no: snapshot.avg_cost_no,
            entry_prob: snapshot.entry_prob,
        }
    }

    /// Buy `shares` of `side` at `price`, updating that side's weighted
    /// average cost and the invested total.
    ///
    /// `entry_prob` is recorded only if no entry probability is set yet
    /// (i.e. this is the original entry, not a hedge buy).
    pub fn open_position(
        &mut self,
        shares: f64,
        price: f64,
        side: Side,
        entry_prob: f64,
    ) -> Result<(), AgentError> {
        if !(shares > 0.0) {
            return Err(AgentError::invalid_input(format!(
                "shares must be positive, got {}",
                shares
            )));
        }
        if !(price > 0.0 && price < 1.0) {
            return Err(AgentError::invalid_input(format!(
                "price must be in (0, 1), got {}",
                price
            )));
        }

        let cost = shares * price;
        match side {
            Side::Yes => {
                self.avg_cost_yes = weighted_avg(self.yes_shares, self.avg_cost_yes, shares, price);
                self.yes_shares += shares;
            }
            Side::No => {
                self.avg_cost_no = weighted_avg(self.no_shares, self.avg_cost_no, shares, price);
                self.no_shares += shares;
            }
        }
        self.total_invested += cost;

        if self.entry_prob.is_none() {
            self.entry_prob = Some(entry_prob);
        }

        Ok(())
    }

    /// Sell `shares` of `side` at `price`, returning the proceeds.
    ///
    /// Fails with `InsufficientShares` if the sell exceeds the held
    /// quantity. Selling zero shares is a no-op, not an error. Average
    /// cost of the reduced side is unchanged (it is a cost-basis measure).
    pub fn record_sell(&mut self, side: Side, shares: f64, price: f64) -> Result<f64, AgentError> {
        if shares < 0.0 || shares.is_nan() {
            return Err(AgentError::invalid_input(format!(
                "sell shares must be non-negative, got {}",
                shares
            )));
        }
        if !(price > 0.0 && price < 1.0) {
            return Err(AgentError::invalid_input(format!(
                "price must be in (0, 1), got {}",
                price
            )));
        }

        let held = self.shares(side);
        if shares > held {
            return Err(AgentError::InsufficientShares {
                side,
                requested: shares,
                held,
            });
        }

        match side {
            Side::Yes => self.yes_shares -= shares,
            Side::No => self.no_shares -= shares,
        }
        let proceeds = shares * price;
        self.total_withdrawn += proceeds;

        Ok(proceeds)
    }

    /// Zero all fields and clear the entry probability. Idempotent.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // Read accessors

    pub fn yes_shares(&self) -> f64 {
        self.yes_shares
    }

    pub fn no_shares(&self) -> f64 {
        self.no_shares
    }

    /// Shares currently held on the given side
    pub fn shares(&self, side: Side) -> f64 {
        match side {
            Side::Yes => self.yes_shares,
            Side::No => self.no_shares,
        }
    }

    pub fn total_invested(&self) -> f64 {
        self.total_invested
    }

    pub fn total_withdrawn(&self) -> f64 {
        self.total_withdrawn
    }

    /// Weighted-average buy price for YES shares. Meaningful only while
    /// `yes_shares > 0`.
    pub fn avg_cost_yes(&self) -> f64 {
        self.avg_cost_yes
    }

    /// Weighted-average buy price for NO shares. Meaningful only while
    /// `no_shares > 0`.
    pub fn avg_cost_no(&self) -> f64 {
        self.avg_cost_no
    }

    /// Weighted-average buy price for the given side
    pub fn avg_cost(&self, side: Side) -> f64 {
        match side {
            Side::Yes => self.avg_cost_yes,
            Side::No => self.avg_cost_no,
        }
    }

    pub fn entry_prob(&self) -> Option<f64> {
        self.entry_prob
    }

    pub fn has_position(&self) -> bool {
        self.yes_shares > 0.0 || self.no_shares > 0.0
    }

    pub fn is_hedged(&self) -> bool {
        self.yes_shares > 0.0 && self.no_shares > 0.0
    }

    /// Mark-to-market PnL of the remaining inventory plus cash already
    /// withdrawn, minus cash invested.
    pub fn unrealized_pnl(&self, yes_price: f64, no_price: f64) -> f64 {
        self.yes_shares * yes_price + self.no_shares * no_price - self.total_invested
            + self.total_withdrawn
    }

    /// Full serializable snapshot of the ledger state.
    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            yes_shares: self.yes_shares,
            no_shares: self.no_shares,
            total_invested: self.total_invested,
            total_withdrawn: self.total_withdrawn,
            avg_cost_yes: self.avg_cost_yes,
            avg_cost_no: self.avg_cost_no,
            entry_prob: self.entry_prob,
            has_position: self.has_position(),
            is_hedged: self.is_hedged(),
        }
    }
}

/// Weighted-average price after buying `add_shares` at `add_price` on top
/// of `held` shares with average `held_avg`.
fn weighted_avg(held: f64, held_avg: f64, add_shares: f64, add_price: f64) -> f64 {
    (held * held_avg + add_shares * add_price) / (held + add_shares)
}
