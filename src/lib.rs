//! Democratic fair division of indivisible items among families.
//!
//! A family is a group of agents with their own valuations that must share a
//! single bundle. The crate implements the allocation protocols studied for
//! this setting (RWAV, Enhanced RWAV, line, plurality, two-thirds and the
//! exhaustive optimum) and an exhaustive search over small instances looking
//! for a family that gets less than a given fraction of satisfied members.

mod allocation;
mod config;
mod criterion;
mod decision;
mod error;
mod instance;
mod instance_enumerator;
mod partition;
pub mod protocol;
mod search;
mod types;

pub use allocation::{Allocation, Bundle, guarantee_ratio, realized_utility};
pub use config::SearchConfig;
pub use criterion::Criterion;
pub use decision::{Acceptance, Choice, DecisionRule, Plurality, WeightedApproval, decide};
pub use error::FairError;
pub use instance::{AgentSpec, Family, FamilySpec, Instance, Valuation};
pub use instance_enumerator::CanonicalInstances;
pub use partition::{Assignments, Permutations, SetPartitions};
pub use protocol::{AuditTrail, Decision, Outcome, Protocol, ProtocolKind};
pub use search::{SearchOutcome, SearchReport, Witness, count_instances, search, search_with_abort};
pub use types::*;
