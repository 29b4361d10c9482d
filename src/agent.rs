//! Hedge Agent
//!
//! Explicitly constructed wrapper around the strategy engine, handed by
//! reference to whatever serves requests. Owns the engine behind a single
//! async RwLock: mutating operations (`enter`, `hedge`, `exit`, `reset`)
//! take the write lock, so at most one in-flight mutation can read-modify
//! the ledger at a time; `evaluate` and `snapshot` take the read lock and
//! observe a consistent state.
//!
//! Collaborators are optional capabilities:
//! - `PositionStore`: snapshot loaded at startup, saved after every mutation
//! - `TradeJournal`: one CSV row per ledger mutation
//! - `ExecutionClient`: real order submission; absent = simulation mode

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AgentError;
use crate::execution::ExecutionClient;
use crate::persistence::{PositionStore, TradeEventRecord, TradeJournal};
use crate::position::Position;
use crate::strategy::{HedgeEngine, StrategyConfig};
use crate::types::{
    Action, EntryOutcome, Evaluation, ExitOutcome, HedgeOutcome, OrderTicket, PositionSnapshot,
    Side,
};

pub struct HedgeAgent {
    engine: RwLock<HedgeEngine>,
    store: Option<PositionStore>,
    journal: Option<TradeJournal>,
    executor: Option<Arc<dyn ExecutionClient>>,
}

impl HedgeAgent {
    /// Create an agent with an empty ledger and no collaborators.
    pub fn new(config: StrategyConfig) -> Result<Self, AgentError> {
        Ok(Self {
            engine: RwLock::new(HedgeEngine::new(config)?),
            store: None,
            journal: None,
            executor: None,
        })
    }

    /// Attach a snapshot store. Call `load_persisted` afterwards to pick
    /// up any previously saved position.
    pub fn with_store(mut self, store: PositionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_journal(mut self, journal: TradeJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn ExecutionClient>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Restore the ledger from the attached store, if a snapshot exists.
    /// Returns whether anything was loaded.
    pub async fn load_persisted(&self) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let Some(snapshot) = store.load()? else {
            return Ok(false);
        };

        let mut engine = self.engine.write().await;
        engine.restore_position(Position::from_snapshot(&snapshot));
        info!(
            yes_shares = snapshot.yes_shares,
            no_shares = snapshot.no_shares,
            "Position restored from snapshot"
        );
        Ok(true)
    }

    /// Open the initial position: spend `amount_usd` on YES shares at
    /// `yes_price`, recording `current_prob` as the entry probability.
    pub async fn enter(
        &self,
        amount_usd: f64,
        current_prob: f64,
        yes_price: f64,
    ) -> Result<EntryOutcome> {
        if !(amount_usd > 0.0) {
            return Err(AgentError::invalid_input(format!(
                "amount_usd must be positive, got {}",
                amount_usd
            ))
            .into());
        }

        let mut engine = self.engine.write().await;
        let shares = amount_usd / yes_price;
        engine.open_position(shares, yes_price, Side::Yes, current_prob)?;
        let snapshot = engine.snapshot();
        drop(engine);

        let cost = shares * yes_price;
        info!(
            shares,
            price = yes_price,
            cost,
            entry_prob = current_prob,
            "Position opened"
        );

        // Persist before any order submission: the on-disk snapshot must
        // reflect the ledger even when the executor rejects the order.
        self.persist(&snapshot)?;
        self.journal_event(Action::Entry, Some(Side::Yes), shares, yes_price, -cost, None)
            .await;
        self.submit_buy(Side::Yes, shares, yes_price).await?;

        Ok(EntryOutcome {
            shares,
            price: yes_price,
            cost,
            entry_prob: current_prob,
        })
    }

    /// Read-only recommendation from a live quote.
    pub async fn evaluate(
        &self,
        current_prob: f64,
        yes_price: f64,
        no_price: f64,
    ) -> Evaluation {
        let engine = self.engine.read().await;
        engine.evaluate(current_prob, yes_price, no_price)
    }

    /// Commit a take-profit hedge. The engine re-validates the gate, so a
    /// stale caller gets `PreconditionFailed` with state unchanged.
    pub async fn hedge(
        &self,
        current_prob: f64,
        yes_price: f64,
        no_price: f64,
    ) -> Result<HedgeOutcome> {
        let mut engine = self.engine.write().await;
        let outcome = engine.book_profit_and_rebalance(current_prob, yes_price, no_price)?;
        let snapshot = engine.snapshot();
        drop(engine);

        info!(
            yes_sold = outcome.yes_sold,
            no_bought = outcome.no_bought,
            locked_pnl = outcome.locked_pnl,
            "Hedge executed"
        );

        self.persist(&snapshot)?;
        self.journal_event(
            Action::Hedge,
            Some(Side::Yes),
            outcome.yes_sold,
            outcome.yes_price,
            outcome.proceeds,
            Some(outcome.locked_pnl),
        )
        .await;
        self.journal_event(
            Action::Hedge,
            Some(Side::No),
            outcome.no_bought,
            outcome.no_price,
            -outcome.proceeds,
            None,
        )
        .await;

        if outcome.yes_sold > 0.0 {
            self.submit_sell(Side::Yes, outcome.yes_sold, outcome.yes_price)
                .await?;
        }
        if outcome.no_bought > 0.0 {
            self.submit_buy(Side::No, outcome.no_bought, outcome.no_price)
                .await?;
        }

        Ok(outcome)
    }

    /// Commit a stop-loss exit, flattening both sides.
    pub async fn exit(&self, yes_price: f64, no_price: f64) -> Result<ExitOutcome> {
        let mut engine = self.engine.write().await;
        let outcome = engine.cut_loss_and_exit(yes_price, no_price)?;
        let snapshot = engine.snapshot();
        drop(engine);

        info!(
            yes_sold = outcome.yes_sold,
            no_sold = outcome.no_sold,
            total_proceeds = outcome.total_proceeds,
            final_pnl = outcome.final_pnl,
            "Position exited"
        );

        self.persist(&snapshot)?;
        if outcome.yes_sold > 0.0 {
            self.journal_event(
                Action::StopLoss,
                Some(Side::Yes),
                outcome.yes_sold,
                yes_price,
                outcome.yes_sold * yes_price,
                Some(outcome.final_pnl),
            )
            .await;
        }
        if outcome.no_sold > 0.0 {
            self.journal_event(
                Action::StopLoss,
                Some(Side::No),
                outcome.no_sold,
                no_price,
                outcome.no_sold * no_price,
                Some(outcome.final_pnl),
            )
            .await;
        }

        if outcome.yes_sold > 0.0 {
            self.submit_sell(Side::Yes, outcome.yes_sold, yes_price).await?;
        }
        if outcome.no_sold > 0.0 {
            self.submit_sell(Side::No, outcome.no_sold, no_price).await?;
        }

        Ok(outcome)
    }

    /// Clear the position back to EMPTY and persist the cleared snapshot.
    pub async fn reset(&self) -> Result<()> {
        let mut engine = self.engine.write().await;
        engine.reset();
        let snapshot = engine.snapshot();
        drop(engine);

        info!("Position reset");
        self.persist(&snapshot)?;
        self.journal_event(Action::Reset, None, 0.0, 0.0, 0.0, None).await;
        Ok(())
    }

    /// Consistent read of the full position state.
    pub async fn snapshot(&self) -> PositionSnapshot {
        let engine = self.engine.read().await;
        engine.snapshot()
    }

    async fn submit_buy(&self, side: Side, shares: f64, price: f64) -> Result<()> {
        if let Some(executor) = &self.executor {
            let ticket = OrderTicket::new(side, shares, price);
            executor
                .buy(&ticket)
                .await
                .with_context(|| format!("Buy order {} failed", ticket.id))?;
        }
        Ok(())
    }

    async fn submit_sell(&self, side: Side, shares: f64, price: f64) -> Result<()> {
        if let Some(executor) = &self.executor {
            let ticket = OrderTicket::new(side, shares, price);
            executor
                .sell(&ticket)
                .await
                .with_context(|| format!("Sell order {} failed", ticket.id))?;
        }
        Ok(())
    }

    fn persist(&self, snapshot: &PositionSnapshot) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(snapshot)?;
        }
        Ok(())
    }

    /// Journaling is best-effort: a failed append is logged, never fatal
    /// to the trade that already happened.
    async fn journal_event(
        &self,
        action: Action,
        side: Option<Side>,
        shares: f64,
        price: f64,
        cash_flow: f64,
        realized_pnl: Option<f64>,
    ) {
        let Some(journal) = &self.journal else {
            return;
        };
        let record = TradeEventRecord {
            timestamp: Utc::now().timestamp_millis(),
            event_id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            side: side.map(|s| s.to_string()).unwrap_or_default(),
            shares,
            price,
            cash_flow,
            realized_pnl,
        };
        if let Err(e) = journal.append(record).await {
            warn!("Failed to journal trade event: {}", e);
        }
    }
}
