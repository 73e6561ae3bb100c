//! The campaign ledger: sole owner of all campaign state.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use fundforge_campaigns::{
    Campaign, CampaignCommand, CampaignEvent, Contribute, CreateCampaign, RequestRefund,
    WithdrawFunds,
};
use fundforge_core::{AccountId, Aggregate, CampaignId, DomainError};
use fundforge_escrow::EscrowVault;
use fundforge_events::{EventBus, EventEnvelope};

use crate::clock::Clock;
use crate::error::{LedgerError, LedgerResult};

/// All mutable ledger state, guarded by one mutex.
///
/// The id counter and the audit sequence advance under the same lock as the
/// campaign mutations they describe, so check-then-act spans never interleave.
#[derive(Debug, Default)]
struct LedgerState {
    campaigns: BTreeMap<CampaignId, Campaign>,
    next_campaign_id: u64,
    next_sequence: u64,
}

/// The campaign ledger service.
///
/// Owns every campaign, the escrowed funds (through the vault collaborator)
/// and the audit log ordering. Settlement flags are committed before any
/// payout is initiated, so a failed or re-entered transfer can never be
/// replayed into a double spend; the cost is that a failed transfer needs
/// administrative remediation rather than an automatic retry.
pub struct CampaignLedger<V, B, C> {
    state: Mutex<LedgerState>,
    vault: V,
    bus: B,
    clock: C,
}

impl<V, B, C> CampaignLedger<V, B, C>
where
    V: EscrowVault,
    B: EventBus<EventEnvelope<CampaignEvent>>,
    C: Clock,
{
    pub fn new(vault: V, bus: B, clock: C) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            vault,
            bus,
            clock,
        }
    }

    /// Open a new campaign and return its sequential id.
    pub fn create_campaign(
        &self,
        creator: AccountId,
        title: impl Into<String>,
        description: impl Into<String>,
        goal_amount: u64,
        duration_days: u64,
    ) -> LedgerResult<CampaignId> {
        let occurred_at = self.clock.now();
        let mut state = self.lock_state()?;

        let campaign_id = CampaignId::new(state.next_campaign_id);
        let mut campaign = Campaign::empty(campaign_id);
        let cmd = CampaignCommand::CreateCampaign(CreateCampaign {
            campaign_id,
            creator,
            title: title.into(),
            description: description.into(),
            goal_amount,
            duration_days,
            occurred_at,
        });

        let events = campaign.handle(&cmd)?;
        for event in &events {
            campaign.apply(event);
        }
        state.campaigns.insert(campaign_id, campaign);
        state.next_campaign_id += 1;

        self.publish(&mut state, campaign_id, events)?;
        tracing::info!(
            campaign_id = %campaign_id,
            creator = %creator,
            goal_amount,
            "campaign created"
        );
        Ok(campaign_id)
    }

    /// Record a contribution; the attached value moves into escrow.
    pub fn contribute(
        &self,
        campaign_id: CampaignId,
        caller: AccountId,
        amount: u64,
    ) -> LedgerResult<()> {
        let occurred_at = self.clock.now();
        let mut state = self.lock_state()?;

        let campaign = state
            .campaigns
            .get_mut(&campaign_id)
            .ok_or(DomainError::NotFound)?;
        let cmd = CampaignCommand::Contribute(Contribute {
            campaign_id,
            contributor: caller,
            amount,
            occurred_at,
        });
        let events = campaign.handle(&cmd)?;

        // The attached value moves into escrow before any state is applied;
        // a failed deposit leaves the ledger untouched.
        self.vault.deposit(campaign_id, amount)?;
        for event in &events {
            campaign.apply(event);
        }

        self.publish(&mut state, campaign_id, events)?;
        tracing::info!(
            campaign_id = %campaign_id,
            contributor = %caller,
            amount,
            "contribution recorded"
        );
        Ok(())
    }

    /// Release the raised funds to the creator of a funded campaign.
    pub fn withdraw_funds(&self, campaign_id: CampaignId, caller: AccountId) -> LedgerResult<()> {
        let occurred_at = self.clock.now();
        let mut state = self.lock_state()?;

        let campaign = state
            .campaigns
            .get_mut(&campaign_id)
            .ok_or(DomainError::NotFound)?;
        let cmd = CampaignCommand::WithdrawFunds(WithdrawFunds {
            campaign_id,
            caller,
            occurred_at,
        });
        let events = campaign.handle(&cmd)?;

        // Settlement flags flip before the payout is initiated.
        for event in &events {
            campaign.apply(event);
        }
        if let Some(CampaignEvent::FundsWithdrawn(e)) = events.first() {
            if let Err(err) = self.vault.payout(campaign_id, e.creator, e.amount) {
                tracing::warn!(
                    campaign_id = %campaign_id,
                    error = %err,
                    "payout failed after settlement flags committed; escrow needs remediation"
                );
                return Err(err.into());
            }
            tracing::info!(
                campaign_id = %campaign_id,
                creator = %e.creator,
                amount = e.amount,
                "funds withdrawn"
            );
        }

        self.publish(&mut state, campaign_id, events)?;
        Ok(())
    }

    /// Return a contributor's tracked balance from the escrow of a failed
    /// campaign.
    pub fn request_refund(&self, campaign_id: CampaignId, caller: AccountId) -> LedgerResult<()> {
        let occurred_at = self.clock.now();
        let mut state = self.lock_state()?;

        let campaign = state
            .campaigns
            .get_mut(&campaign_id)
            .ok_or(DomainError::NotFound)?;
        let cmd = CampaignCommand::RequestRefund(RequestRefund {
            campaign_id,
            caller,
            occurred_at,
        });
        let events = campaign.handle(&cmd)?;

        // The balance is zeroed before the payout is initiated, so a repeated
        // or re-entered claim finds NoContribution.
        for event in &events {
            campaign.apply(event);
        }
        if let Some(CampaignEvent::RefundIssued(e)) = events.first() {
            if let Err(err) = self.vault.payout(campaign_id, e.contributor, e.amount) {
                tracing::warn!(
                    campaign_id = %campaign_id,
                    contributor = %e.contributor,
                    error = %err,
                    "refund transfer failed after balance was zeroed; escrow needs remediation"
                );
                return Err(err.into());
            }
            tracing::info!(
                campaign_id = %campaign_id,
                contributor = %e.contributor,
                amount = e.amount,
                "refund issued"
            );
        }

        self.publish(&mut state, campaign_id, events)?;
        Ok(())
    }

    /// Full snapshot of a campaign.
    pub fn campaign_details(&self, campaign_id: CampaignId) -> LedgerResult<Campaign> {
        let state = self.lock_state()?;
        state
            .campaigns
            .get(&campaign_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound.into())
    }

    /// The caller's tracked contribution balance, 0 if none.
    pub fn contribution_of(
        &self,
        campaign_id: CampaignId,
        account: AccountId,
    ) -> LedgerResult<u64> {
        let state = self.lock_state()?;
        let campaign = state
            .campaigns
            .get(&campaign_id)
            .ok_or(DomainError::NotFound)?;
        Ok(campaign.contribution_of(account))
    }

    /// Number of recorded pledges (repeat contributions count separately).
    pub fn contributor_count(&self, campaign_id: CampaignId) -> LedgerResult<usize> {
        let state = self.lock_state()?;
        let campaign = state
            .campaigns
            .get(&campaign_id)
            .ok_or(DomainError::NotFound)?;
        Ok(campaign.contributor_count())
    }

    /// Funds currently held in escrow for a campaign: the authoritative
    /// funds-remaining figure (the campaign's raised total is historical and
    /// not decremented by refunds).
    pub fn escrow_held(&self, campaign_id: CampaignId) -> LedgerResult<u64> {
        let state = self.lock_state()?;
        if !state.campaigns.contains_key(&campaign_id) {
            return Err(DomainError::NotFound.into());
        }
        Ok(self.vault.held(campaign_id))
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        self.state.lock().map_err(|_| LedgerError::Poisoned)
    }

    /// Wrap events in audit envelopes and publish them in sequence order.
    ///
    /// Runs under the state lock so the audit log totally orders all
    /// operations; a publish failure surfaces after the state is committed.
    fn publish(
        &self,
        state: &mut LedgerState,
        campaign_id: CampaignId,
        events: Vec<CampaignEvent>,
    ) -> LedgerResult<()> {
        for event in events {
            let envelope =
                EventEnvelope::new(Uuid::now_v7(), campaign_id, state.next_sequence, event);
            state.next_sequence += 1;
            self.bus
                .publish(envelope)
                .map_err(|err| LedgerError::Publish(format!("{err:?}")))?;
        }
        Ok(())
    }
}
