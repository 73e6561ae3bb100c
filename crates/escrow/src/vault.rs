//! Escrow vault abstraction (custody + settlement primitives).

use std::sync::Arc;

use thiserror::Error;

use fundforge_core::{AccountId, CampaignId};

/// Value-transfer failure surfaced by an escrow vault.
///
/// Transfers are the one non-deterministic step in a ledger operation; every
/// call site must check the result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The campaign's escrow holds less than the requested payout.
    #[error("insufficient escrow: held {held}, requested {requested}")]
    InsufficientEscrow { held: u64, requested: u64 },

    /// The underlying payment rail refused the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Custody of campaign funds between contribution and settlement.
///
/// - `deposit` moves a contributor's attached value into a campaign's escrow.
/// - `payout` is the atomic "debit escrow, credit recipient" primitive used by
///   both withdrawal and refund settlement.
/// - `held` is the authoritative funds-remaining figure for a campaign (the
///   campaign's `raised_amount` is a historical total and is not decremented
///   by refunds).
pub trait EscrowVault: Send + Sync {
    fn deposit(&self, campaign_id: CampaignId, amount: u64) -> Result<(), TransferError>;

    fn payout(
        &self,
        campaign_id: CampaignId,
        recipient: AccountId,
        amount: u64,
    ) -> Result<(), TransferError>;

    /// Funds currently held in escrow for a campaign.
    fn held(&self, campaign_id: CampaignId) -> u64;
}

impl<V> EscrowVault for Arc<V>
where
    V: EscrowVault + ?Sized,
{
    fn deposit(&self, campaign_id: CampaignId, amount: u64) -> Result<(), TransferError> {
        (**self).deposit(campaign_id, amount)
    }

    fn payout(
        &self,
        campaign_id: CampaignId,
        recipient: AccountId,
        amount: u64,
    ) -> Result<(), TransferError> {
        (**self).payout(campaign_id, recipient, amount)
    }

    fn held(&self, campaign_id: CampaignId) -> u64 {
        (**self).held(campaign_id)
    }
}
