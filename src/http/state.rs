//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::directory::{PlanProvider, StudentDirectory, TrainerDirectory};
use crate::services::{
    CommitmentLedger, OverrideStore, ScheduleMaterializer, SeriesCatalog,
};

/// Shared application state passed to all handlers.
///
/// Services are constructed once so the ledger's per-student lock map is
/// shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn FullRepository>,
    pub materializer: Arc<ScheduleMaterializer>,
    pub ledger: Arc<CommitmentLedger>,
    pub overrides: Arc<OverrideStore>,
    pub catalog: Arc<SeriesCatalog>,
    pub trainers: Arc<dyn TrainerDirectory>,
    pub students: Arc<dyn StudentDirectory>,
}

impl AppState {
    /// Create the application state over a repository and its external
    /// collaborators.
    pub fn new(
        repository: Arc<dyn FullRepository>,
        plans: Arc<dyn PlanProvider>,
        trainers: Arc<dyn TrainerDirectory>,
        students: Arc<dyn StudentDirectory>,
    ) -> Self {
        Self {
            materializer: Arc::new(ScheduleMaterializer::new(repository.clone())),
            ledger: Arc::new(CommitmentLedger::new(repository.clone(), plans)),
            overrides: Arc::new(OverrideStore::new(repository.clone())),
            catalog: Arc::new(SeriesCatalog::new(repository.clone())),
            repository,
            trainers,
            students,
        }
    }
}
