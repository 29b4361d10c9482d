//! Execution capability
//!
//! The strategy engine only computes what should be traded. Hosts that want
//! real orders supply an `ExecutionClient`; the agent calls it only when one
//! is present. Without one the agent runs in simulation mode and never
//! touches a market.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::types::OrderTicket;

/// Collaborator that may submit real orders for the quantities the engine
/// decided to trade.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Buy `ticket.shares` of `ticket.side` at `ticket.price`.
    async fn buy(&self, ticket: &OrderTicket) -> Result<()>;

    /// Sell `ticket.shares` of `ticket.side` at `ticket.price`.
    async fn sell(&self, ticket: &OrderTicket) -> Result<()>;
}

/// Execution client that only logs the tickets it receives. Useful for
/// dry runs and for wiring checks in tests.
#[derive(Debug, Default)]
pub struct LoggingExecution;

#[async_trait]
impl ExecutionClient for LoggingExecution {
    async fn buy(&self, ticket: &OrderTicket) -> Result<()> {
        info!(
            ticket_id = %ticket.id,
            side = %ticket.side,
            shares = ticket.shares,
            price = ticket.price,
            "simulated BUY"
        );
        Ok(())
    }

    async fn sell(&self, ticket: &OrderTicket) -> Result<()> {
        info!(
            ticket_id = %ticket.id,
            side = %ticket.side,
            shares = ticket.shares,
            price = ticket.price,
            "simulated SELL"
        );
        Ok(())
    }
}
