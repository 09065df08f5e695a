//! Shared application state for the gateway.
//!
//! [`AppState`] wires the store pool, the credit ledger, the ranking
//! engine, the vote transaction, and the notification hub into one
//! handle every request handler can reach through Axum's `State`
//! extractor. Constructed once at startup and shared via `Arc`.

use podium_credits::CreditLedger;
use podium_hub::HubHandle;
use podium_ranking::RankingEngine;
use podium_store::{CancellationSignal, StorePool};
use podium_types::SettingsSnapshot;
use podium_voting::VoteTransaction;

use crate::settings::SettingsState;

/// Shared state for all request handlers.
pub struct AppState {
    /// Connection pool to the backing store.
    pub pool: StorePool,
    /// Credit accrual and charging.
    pub ledger: CreditLedger,
    /// On-demand standings computation.
    pub engine: RankingEngine,
    /// The vote entry point.
    pub voting: VoteTransaction,
    /// Real-time event fan-out.
    pub hub: HubHandle,
    /// The mutable global settings.
    pub settings: SettingsState,
    /// Process-wide cancellation for in-flight store retries.
    pub cancel: CancellationSignal,
}

impl AppState {
    /// Assemble the full state graph over a connected pool.
    pub fn new(pool: StorePool, initial: SettingsSnapshot) -> Self {
        let ledger = CreditLedger::new(pool.clone());
        let engine = RankingEngine::new(pool.clone());
        let hub = HubHandle::spawn();
        let voting = VoteTransaction::new(
            pool.clone(),
            ledger.clone(),
            engine.clone(),
            hub.clone(),
        );

        Self {
            pool,
            ledger,
            engine,
            voting,
            hub,
            settings: SettingsState::new(initial),
            cancel: CancellationSignal::new(),
        }
    }
}
