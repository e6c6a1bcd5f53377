//! Contributor invitation reconciler.
//!
//! Given the contributors of a release, an invitation target, and an exclusion
//! policy, the [`Reconciler`] decides for each contributor whether an
//! invitation is needed and issues it through the injected
//! [`membership::MembershipProvider`].
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The reconciler sequences calls to the provider
//! port; it performs no I/O of its own and knows nothing about GitHub.
//!
//! ## Run semantics
//!
//! - Exclusion is checked first and wins over membership.
//! - Full members are left untouched; others get exactly one successful
//!   invite or team add.
//! - Retryable provider errors are retried per [`RetryBudget`]; permanent
//!   ones are reported immediately.
//! - One contributor's failure never stops the rest.
//! - Results are returned in input order, whatever the concurrency.
//! - When the run timeout passes, unresolved contributors are reported as
//!   transient failures.

mod config;
mod error;
mod reconcile;
mod retry;

pub use config::{ReconcilerConfig, RetryBudget};
pub use error::ReconcileError;
pub use reconcile::Reconciler;
