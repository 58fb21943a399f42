use std::sync::Arc;

use crate::auth::claims::TokenVerifier;
use crate::config::Config;
use crate::ledger::JobLedger;
use crate::queue::WorkQueue;
use crate::storage::ResumeStorage;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every handle is built once in `main` and released through [`AppState::shutdown`].
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn JobLedger>,
    pub queue: Arc<dyn WorkQueue>,
    pub storage: Arc<dyn ResumeStorage>,
    pub tokens: TokenVerifier,
    pub config: Config,
}

impl AppState {
    pub async fn shutdown(&self) {
        self.ledger.close().await;
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::ledger::memory::MemoryJobLedger;
    use crate::queue::memory::MemoryWorkQueue;
    use crate::storage::memory::MemoryResumeStorage;

    pub struct TestHarness {
        pub state: AppState,
        pub ledger: Arc<MemoryJobLedger>,
        pub queue: Arc<MemoryWorkQueue>,
        pub storage: Arc<MemoryResumeStorage>,
    }

    pub fn harness(ledger: MemoryJobLedger, queue: MemoryWorkQueue) -> TestHarness {
        let config = Config::for_tests();
        let ledger = Arc::new(ledger);
        let queue = Arc::new(queue);
        let storage = Arc::new(MemoryResumeStorage::default());
        let state = AppState {
            ledger: ledger.clone(),
            queue: queue.clone(),
            storage: storage.clone(),
            tokens: TokenVerifier::new(&config.jwt_secret),
            config,
        };
        TestHarness {
            state,
            ledger,
            queue,
            storage,
        }
    }
}
