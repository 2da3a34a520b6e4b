//! Domain records and their temporal logic.
//!
//! The engine's invariants live here: effective-version selection for
//! recurrence lineages, chain queries over append-only commitment records,
//! and closed-interval plan-assignment windows. Repository implementations
//! store these types verbatim; services call the functions in these modules
//! instead of re-deriving the rules.

pub mod commitment;
pub mod plan;
pub mod recurrence;

pub use commitment::{current_as_of, status_as_of, CommitmentRecord};
pub use plan::PlanAssignment;
pub use recurrence::{effective_version, RecurrenceSeries};
