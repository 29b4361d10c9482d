//! End-to-end tests for the hedge agent

#[cfg(test)]
mod tests {
    use polyhedge::agent::HedgeAgent;
    use polyhedge::error::AgentError;
    use polyhedge::execution::ExecutionClient;
    use polyhedge::persistence::{PositionStore, TradeJournal};
    use polyhedge::strategy::StrategyConfig;
    use polyhedge::types::{Action, OrderTicket, Side};

    use anyhow::Result;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use uuid::Uuid;

    const EPSILON: f64 = 1e-6;

    fn temp_data_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("polyhedge_it_{}_{}", test_name, Uuid::new_v4()))
    }

    fn default_agent() -> HedgeAgent {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .try_init();
        HedgeAgent::new(StrategyConfig::default()).unwrap()
    }

    /// Records every ticket instead of sending it anywhere.
    #[derive(Default)]
    struct RecordingExecution {
        tickets: Mutex<Vec<(String, Side, f64, f64)>>,
    }

    impl RecordingExecution {
        fn recorded(&self) -> Vec<(String, Side, f64, f64)> {
            self.tickets.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExecutionClient for RecordingExecution {
        async fn buy(&self, ticket: &OrderTicket) -> Result<()> {
            self.tickets.lock().unwrap().push((
                "BUY".to_string(),
                ticket.side,
                ticket.shares,
                ticket.price,
            ));
            Ok(())
        }

        async fn sell(&self, ticket: &OrderTicket) -> Result<()> {
            self.tickets.lock().unwrap().push((
                "SELL".to_string(),
                ticket.side,
                ticket.shares,
                ticket.price,
            ));
            Ok(())
        }
    }

    // ========================================================================
    // Lifecycle: enter -> evaluate -> hedge
    // ========================================================================

    #[tokio::test]
    async fn test_enter_then_hedge_lifecycle() {
        let agent = default_agent();

        // No position yet: only WAIT
        let eval = agent.evaluate(0.80, 0.80, 0.20).await;
        assert_eq!(eval.action, Action::Wait);
        assert!(eval.unrealized_pnl.is_none());

        let entry = agent.enter(800.0, 0.80, 0.80).await.unwrap();
        assert!((entry.shares - 1000.0).abs() < EPSILON);
        assert!((entry.cost - 800.0).abs() < EPSILON);

        // Below take-profit: HOLD
        let eval = agent.evaluate(0.82, 0.82, 0.18).await;
        assert_eq!(eval.action, Action::Hold);

        // At/above take-profit: HEDGE recommended
        let eval = agent.evaluate(0.86, 0.86, 0.14).await;
        assert_eq!(eval.action, Action::Hedge);

        let outcome = agent.hedge(0.86, 0.86, 0.14).await.unwrap();
        assert!((outcome.yes_sold - 500.0).abs() < EPSILON);
        assert!((outcome.proceeds - 430.0).abs() < EPSILON);
        assert!((outcome.no_bought - 3071.428571).abs() < 1e-4);
        assert!((outcome.locked_pnl - 30.0).abs() < EPSILON);

        let snap = agent.snapshot().await;
        assert!(snap.is_hedged);
        assert!((snap.yes_shares - 500.0).abs() < EPSILON);

        // Already hedged: no second hedge recommended
        let eval = agent.evaluate(0.90, 0.90, 0.10).await;
        assert_eq!(eval.action, Action::Hold);
    }

    #[tokio::test]
    async fn test_stop_loss_exit_and_reentry() {
        let agent = default_agent();
        agent.enter(800.0, 0.80, 0.80).await.unwrap();

        let eval = agent.evaluate(0.15, 0.15, 0.85).await;
        assert_eq!(eval.action, Action::StopLoss);

        let outcome = agent.exit(0.15, 0.85).await.unwrap();
        assert!((outcome.yes_sold - 1000.0).abs() < EPSILON);
        assert!((outcome.total_proceeds - 150.0).abs() < EPSILON);
        assert!((outcome.final_pnl - (-650.0)).abs() < EPSILON);

        let snap = agent.snapshot().await;
        assert!(!snap.has_position);

        // Exit again on a flat book: a no-op, not an error
        let again = agent.exit(0.15, 0.85).await.unwrap();
        assert_eq!(again.yes_sold, 0.0);
        assert_eq!(again.no_sold, 0.0);

        // Fresh entry after the exit starts a new basis
        let entry = agent.enter(500.0, 0.50, 0.50).await.unwrap();
        assert!((entry.shares - 1000.0).abs() < EPSILON);
        let snap = agent.snapshot().await;
        assert!((snap.avg_cost_yes - 0.50).abs() < EPSILON);
    }

    // ========================================================================
    // Error paths
    // ========================================================================

    #[tokio::test]
    async fn test_hedge_below_threshold_leaves_state_unchanged() {
        let agent = default_agent();
        agent.enter(800.0, 0.80, 0.80).await.unwrap();
        let before = agent.snapshot().await;

        let err = agent.hedge(0.84, 0.84, 0.16).await.unwrap_err();
        let agent_err = err.downcast::<AgentError>().unwrap();
        assert!(matches!(agent_err, AgentError::PreconditionFailed { .. }));

        assert_eq!(agent.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_enter_rejects_bad_inputs() {
        let agent = default_agent();

        let err = agent.enter(0.0, 0.80, 0.80).await.unwrap_err();
        assert!(matches!(
            err.downcast::<AgentError>().unwrap(),
            AgentError::InvalidInput { .. }
        ));

        let err = agent.enter(100.0, 0.80, 1.0).await.unwrap_err();
        assert!(matches!(
            err.downcast::<AgentError>().unwrap(),
            AgentError::InvalidInput { .. }
        ));

        assert!(!agent.snapshot().await.has_position);
    }

    /// Rejects every order, as a broken or offline venue would.
    struct FailingExecution;

    #[async_trait]
    impl ExecutionClient for FailingExecution {
        async fn buy(&self, _ticket: &OrderTicket) -> Result<()> {
            anyhow::bail!("order rejected")
        }

        async fn sell(&self, _ticket: &OrderTicket) -> Result<()> {
            anyhow::bail!("order rejected")
        }
    }

    // ========================================================================
    // Persistence round trip
    // ========================================================================

    #[tokio::test]
    async fn test_position_survives_restart() {
        let dir = temp_data_dir("restart");
        let path = dir.join("position.json");

        let agent = default_agent().with_store(PositionStore::new(&path));
        agent.enter(800.0, 0.80, 0.80).await.unwrap();
        agent.hedge(0.86, 0.86, 0.14).await.unwrap();
        let saved = agent.snapshot().await;

        // A new agent picks up where the previous one stopped
        let restarted = default_agent().with_store(PositionStore::new(&path));
        assert!(restarted.load_persisted().await.unwrap());
        assert_eq!(restarted.snapshot().await, saved);

        // And is still hedged for decision purposes
        let eval = restarted.evaluate(0.90, 0.90, 0.10).await;
        assert_eq!(eval.action, Action::Hold);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_reset_clears_persisted_position() {
        let dir = temp_data_dir("reset");
        let path = dir.join("position.json");

        let agent = default_agent().with_store(PositionStore::new(&path));
        agent.enter(800.0, 0.80, 0.80).await.unwrap();
        agent.reset().await.unwrap();

        let restarted = default_agent().with_store(PositionStore::new(&path));
        assert!(restarted.load_persisted().await.unwrap());
        let snap = restarted.snapshot().await;
        assert!(!snap.has_position);
        assert_eq!(snap.total_invested, 0.0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_snapshot_persisted_even_when_order_rejected() {
        let dir = temp_data_dir("exec_fail");
        let path = dir.join("position.json");

        let agent = default_agent()
            .with_store(PositionStore::new(&path))
            .with_executor(std::sync::Arc::new(FailingExecution));

        // The ledger mutates before the order goes out, so the error
        // surfaces but the position is already booked and saved.
        assert!(agent.enter(800.0, 0.80, 0.80).await.is_err());
        let in_memory = agent.snapshot().await;
        assert!(in_memory.has_position);

        let on_disk = PositionStore::new(&path)
            .load()
            .unwrap()
            .expect("snapshot must be on disk after the mutation");
        assert_eq!(on_disk, in_memory);

        // Same contract on the hedge and exit paths
        assert!(agent.hedge(0.86, 0.86, 0.14).await.is_err());
        assert_eq!(
            PositionStore::new(&path).load().unwrap().unwrap(),
            agent.snapshot().await
        );
        assert!(agent.snapshot().await.is_hedged);

        assert!(agent.exit(0.50, 0.50).await.is_err());
        let on_disk = PositionStore::new(&path).load().unwrap().unwrap();
        assert_eq!(on_disk, agent.snapshot().await);
        assert!(!on_disk.has_position);

        let _ = std::fs::remove_dir_all(&dir);
    }

    // ========================================================================
    // Execution wiring
    // ========================================================================

    #[tokio::test]
    async fn test_executor_receives_every_order() {
        let executor = std::sync::Arc::new(RecordingExecution::default());
        let agent = default_agent().with_executor(executor.clone());

        agent.enter(800.0, 0.80, 0.80).await.unwrap();
        agent.hedge(0.86, 0.86, 0.14).await.unwrap();
        agent.exit(0.10, 0.90).await.unwrap();

        let tickets = executor.recorded();
        // entry buy, hedge sell + buy, exit sell YES + sell NO
        assert_eq!(tickets.len(), 5);
        assert_eq!(tickets[0].0, "BUY");
        assert_eq!(tickets[0].1, Side::Yes);
        assert_eq!(tickets[1].0, "SELL");
        assert_eq!(tickets[1].1, Side::Yes);
        assert!((tickets[1].2 - 500.0).abs() < EPSILON);
        assert_eq!(tickets[2].0, "BUY");
        assert_eq!(tickets[2].1, Side::No);
        assert_eq!(tickets[3].0, "SELL");
        assert_eq!(tickets[4].0, "SELL");
        assert_eq!(tickets[4].1, Side::No);
    }

    #[tokio::test]
    async fn test_simulation_mode_journals_trades() {
        let dir = temp_data_dir("journal");
        let data_dir = dir.to_str().unwrap().to_string();
        std::fs::create_dir_all(&dir).unwrap();

        let agent = default_agent().with_journal(TradeJournal::new(&data_dir).unwrap());
        agent.enter(800.0, 0.80, 0.80).await.unwrap();
        agent.hedge(0.86, 0.86, 0.14).await.unwrap();

        let today = chrono::Utc::now().format("%Y-%m-%d");
        let path = dir.join("journal").join(format!("trades_{}.csv", today));
        let content = std::fs::read_to_string(&path).unwrap();
        // header + entry + hedge sell + hedge buy
        assert_eq!(content.lines().count(), 4);
        assert!(content.contains("ENTRY"));
        assert!(content.contains("HEDGE"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_reset_journals_a_row() {
        let dir = temp_data_dir("journal_reset");
        let data_dir = dir.to_str().unwrap().to_string();
        std::fs::create_dir_all(&dir).unwrap();

        let agent = default_agent().with_journal(TradeJournal::new(&data_dir).unwrap());
        agent.enter(800.0, 0.80, 0.80).await.unwrap();
        agent.reset().await.unwrap();

        let today = chrono::Utc::now().format("%Y-%m-%d");
        let path = dir.join("journal").join(format!("trades_{}.csv", today));
        let content = std::fs::read_to_string(&path).unwrap();
        let reset_row = content
            .lines()
            .find(|l| l.contains("RESET"))
            .expect("reset must appear in the journal");
        // No side and no cash movement on a reset
        assert!(reset_row.contains(",,0.0,0.0,0.0,"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
