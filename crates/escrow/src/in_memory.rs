//! In-memory escrow vault for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;

use fundforge_core::{AccountId, CampaignId};

use crate::vault::{EscrowVault, TransferError};

/// In-memory vault.
///
/// Tracks per-campaign held funds and per-account credited balances so that
/// settlement can be asserted end to end in tests.
#[derive(Debug, Default)]
pub struct InMemoryEscrowVault {
    inner: Mutex<VaultState>,
}

#[derive(Debug, Default)]
struct VaultState {
    held: HashMap<CampaignId, u64>,
    credited: HashMap<AccountId, u64>,
}

impl InMemoryEscrowVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value credited to an account by payouts.
    pub fn credited(&self, account: AccountId) -> u64 {
        self.inner
            .lock()
            .map(|state| state.credited.get(&account).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl EscrowVault for InMemoryEscrowVault {
    fn deposit(&self, campaign_id: CampaignId, amount: u64) -> Result<(), TransferError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| TransferError::Rejected("vault lock poisoned".into()))?;

        let held = state.held.entry(campaign_id).or_insert(0);
        *held = held
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("escrow balance overflow".into()))?;

        Ok(())
    }

    fn payout(
        &self,
        campaign_id: CampaignId,
        recipient: AccountId,
        amount: u64,
    ) -> Result<(), TransferError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| TransferError::Rejected("vault lock poisoned".into()))?;

        let held = state.held.get(&campaign_id).copied().unwrap_or(0);
        if held < amount {
            return Err(TransferError::InsufficientEscrow {
                held,
                requested: amount,
            });
        }

        // Debit escrow and credit the recipient under the same lock.
        state.held.insert(campaign_id, held - amount);
        let credited = state.credited.entry(recipient).or_insert(0);
        *credited = credited
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("recipient balance overflow".into()))?;

        Ok(())
    }

    fn held(&self, campaign_id: CampaignId) -> u64 {
        self.inner
            .lock()
            .map(|state| state.held.get(&campaign_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}
