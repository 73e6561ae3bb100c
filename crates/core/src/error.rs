//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// precondition checks). Infrastructure concerns (value transfer, event
/// publication) belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. zero amount, empty title).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The campaign id is unknown.
    #[error("campaign not found")]
    NotFound,

    /// The caller is not the campaign creator.
    #[error("unauthorized")]
    Unauthorized,

    /// The campaign has been settled and no longer accepts operations.
    #[error("campaign is inactive")]
    CampaignInactive,

    /// The funding window has closed.
    #[error("deadline has passed")]
    DeadlinePassed,

    /// The funding window is still open.
    #[error("deadline not reached")]
    DeadlineNotReached,

    /// The raised funds were already withdrawn by the creator.
    #[error("funds already withdrawn")]
    AlreadyWithdrawn,

    /// The campaign missed its funding goal; withdrawal does not apply.
    #[error("funding goal not reached")]
    GoalNotReached,

    /// The campaign met its funding goal; refunds do not apply.
    #[error("funding goal was reached")]
    GoalReached,

    /// The caller has no refundable balance on this campaign.
    #[error("no contribution to refund")]
    NoContribution,
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
