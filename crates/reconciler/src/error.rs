//! Run-level reconciler errors.

use membership::ConfigurationError;
use thiserror::Error;

/// Errors that abort a whole reconciliation run.
///
/// Per-contributor failures never appear here; they are recorded as
/// [`membership::InvitationOutcome::Failed`] results.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The target or credential is unusable. Raised before any contributor
    /// is processed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}
