//! Service layer: the scheduling and commitment engine.
//!
//! Services orchestrate repository calls and own the engine's business
//! rules. Each service is a cheap handle over `Arc<dyn …>` collaborators and
//! is safe to share across request handlers.

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod materializer;
pub mod overrides;
pub mod quota;

pub use catalog::{SeriesCatalog, SeriesDefinition};
pub use error::{SchedulingError, SchedulingResult};
pub use ledger::CommitmentLedger;
pub use materializer::ScheduleMaterializer;
pub use overrides::OverrideStore;
pub use quota::QuotaEnforcer;
