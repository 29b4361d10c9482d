//! Strategy Engine - hedge/exit decision rules for one tracked market
//!
//! The engine owns its position ledger and a fixed threshold configuration.
//! `evaluate` is a pure read that turns a live probability quote into a
//! recommendation; `book_profit_and_rebalance` and `cut_loss_and_exit` are
//! the two mutating transitions, expressed entirely through the ledger's
//! `record_sell`/`open_position` operations so the cost-basis accounting
//! stays in one place.
//!
//! State machine over the position: EMPTY -> OPEN -> (HEDGED) -> CLOSED.
//! EMPTY and CLOSED both mean "no open exposure"; `reset` returns to EMPTY.

use tracing::debug;

use crate::error::AgentError;
use crate::position::Position;
use crate::types::{Action, Evaluation, ExitOutcome, HedgeOutcome, PositionSnapshot, Side};

/// Threshold configuration, fixed at engine construction.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Probability at or above which profit-taking triggers
    pub take_profit_threshold: f64,
    /// Probability at or below which a full exit triggers
    pub stop_loss_threshold: f64,
    /// Fraction of the YES position sold when hedging, in (0, 1]
    pub hedge_sell_percent: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            take_profit_threshold: 0.85,
            stop_loss_threshold: 0.20,
            hedge_sell_percent: 0.50,
        }
    }
}

impl StrategyConfig {
    /// Reject configurations the decision rules cannot work with.
    pub fn validate(&self) -> Result<(), AgentError> {
        if !(self.take_profit_threshold > 0.0 && self.take_profit_threshold < 1.0) {
            return Err(AgentError::invalid_input(format!(
                "take_profit_threshold must be in (0, 1), got {}",
                self.take_profit_threshold
            )));
        }
        if !(self.stop_loss_threshold > 0.0 && self.stop_loss_threshold < 1.0) {
            return Err(AgentError::invalid_input(format!(
                "stop_loss_threshold must be in (0, 1), got {}",
                self.stop_loss_threshold
            )));
        }
        if self.stop_loss_threshold >= self.take_profit_threshold {
            return Err(AgentError::invalid_input(format!(
                "stop_loss_threshold {} must be below take_profit_threshold {}",
                self.stop_loss_threshold, self.take_profit_threshold
            )));
        }
        if !(self.hedge_sell_percent > 0.0 && self.hedge_sell_percent <= 1.0) {
            return Err(AgentError::invalid_input(format!(
                "hedge_sell_percent must be in (0, 1], got {}",
                self.hedge_sell_percent
            )));
        }
        Ok(())
    }
}

/// Decision engine for a single position.
#[derive(Debug)]
pub struct HedgeEngine {
    config: StrategyConfig,
    position: Position,
}

impl HedgeEngine {
    /// Create an engine with an empty ledger.
    pub fn new(config: StrategyConfig) -> Result<Self, AgentError> {
        Self::with_position(config, Position::new())
    }

    /// Create an engine over an existing ledger (e.g. restored from a
    /// persisted snapshot).
    pub fn with_position(config: StrategyConfig, position: Position) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self { config, position })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Replace the ledger wholesale (snapshot restore path).
    pub fn restore_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        self.position.snapshot()
    }

    /// Buy into the market. Delegates straight to the ledger.
    pub fn open_position(
        &mut self,
        shares: f64,
        price: f64,
        side: Side,
        entry_prob: f64,
    ) -> Result<(), AgentError> {
        self.position.open_position(shares, price, side, entry_prob)
    }

    /// Clear the position back to EMPTY. Idempotent.
    pub fn reset(&mut self) {
        self.position.reset();
    }

    /// `true` when the live probability has reached the take-profit level.
    /// Used as the precondition gate for `book_profit_and_rebalance`.
    pub fn should_take_profit(&self, current_prob: f64) -> bool {
        current_prob >= self.config.take_profit_threshold
    }

    /// Pure, read-only recommendation from a live quote. First matching
    /// rule wins:
    ///
    /// 1. no position        -> WAIT
    /// 2. prob >= take-profit threshold and not yet hedged -> HEDGE
    /// 3. prob <= stop-loss threshold                      -> STOP_LOSS
    /// 4. otherwise          -> HOLD
    pub fn evaluate(&self, current_prob: f64, yes_price: f64, no_price: f64) -> Evaluation {
        if !self.position.has_position() {
            return Evaluation {
                action: Action::Wait,
                reason: "no open position".to_string(),
                current_prob,
                unrealized_pnl: None,
            };
        }

        let unrealized_pnl = Some(self.position.unrealized_pnl(yes_price, no_price));

        let (action, reason) =
            if self.should_take_profit(current_prob) && !self.position.is_hedged() {
                (
                    Action::Hedge,
                    format!(
                        "probability {:.4} reached take-profit threshold {:.4}",
                        current_prob, self.config.take_profit_threshold
                    ),
                )
            } else if current_prob <= self.config.stop_loss_threshold {
                (
                    Action::StopLoss,
                    format!(
                        "probability {:.4} fell to stop-loss threshold {:.4}",
                        current_prob, self.config.stop_loss_threshold
                    ),
                )
            } else {
                (
                    Action::Hold,
                    format!(
                        "probability {:.4} within thresholds ({:.4} - {:.4})",
                        current_prob,
                        self.config.stop_loss_threshold,
                        self.config.take_profit_threshold
                    ),
                )
            };

        debug!(%action, current_prob, "position evaluated");

        Evaluation {
            action,
            reason,
            current_prob,
            unrealized_pnl,
        }
    }

    /// Take-profit hedge: sell `hedge_sell_percent` of the YES position at
    /// `yes_price` and reinvest the entire proceeds into NO shares at
    /// `no_price`.
    ///
    /// Re-validates the take-profit gate even though callers are expected
    /// to have checked it; fails with `PreconditionFailed` otherwise. The
    /// locked PnL is the realized gain on the disposed YES shares computed
    /// from cost basis, and is not re-derived later.
    pub fn book_profit_and_rebalance(
        &mut self,
        current_prob: f64,
        yes_price: f64,
        no_price: f64,
    ) -> Result<HedgeOutcome, AgentError> {
        if !self.should_take_profit(current_prob) {
            return Err(AgentError::PreconditionFailed {
                current_prob,
                threshold: self.config.take_profit_threshold,
            });
        }
        validate_price("yes_price", yes_price)?;
        validate_price("no_price", no_price)?;

        let yes_sold = self.position.yes_shares() * self.config.hedge_sell_percent;
        let avg_cost_yes = self.position.avg_cost_yes();

        let proceeds = self.position.record_sell(Side::Yes, yes_sold, yes_price)?;

        let no_bought = proceeds / no_price;
        if no_bought > 0.0 {
            self.position
                .open_position(no_bought, no_price, Side::No, current_prob)?;
        }

        let locked_pnl = proceeds - yes_sold * avg_cost_yes;

        Ok(HedgeOutcome {
            yes_sold,
            yes_price,
            no_bought,
            no_price,
            proceeds,
            locked_pnl,
        })
    }

    /// Stop-loss exit: sell all remaining YES and NO shares at the given
    /// prices. Idempotent in effect: on an already-flat position the sells
    /// are zero-share no-ops and the outcome reports the realized flows.
    pub fn cut_loss_and_exit(
        &mut self,
        yes_price: f64,
        no_price: f64,
    ) -> Result<ExitOutcome, AgentError> {
        validate_price("yes_price", yes_price)?;
        validate_price("no_price", no_price)?;

        let yes_sold = self.position.yes_shares();
        let no_sold = self.position.no_shares();

        let yes_proceeds = self.position.record_sell(Side::Yes, yes_sold, yes_price)?;
        let no_proceeds = self.position.record_sell(Side::No, no_sold, no_price)?;

        let total_proceeds = yes_proceeds + no_proceeds;
        let final_pnl = self.position.total_withdrawn() - self.position.total_invested();

        Ok(ExitOutcome {
            yes_sold,
            no_sold,
            total_proceeds,
            final_pnl,
        })
    }
}

fn validate_price(name: &str, price: f64) -> Result<(), AgentError> {
    if !(price > 0.0 && price < 1.0) {
        return Err(AgentError::invalid_input(format!(
            "{} must be in (0, 1), got {}",
            name, price
        )));
    }
    Ok(())
}
