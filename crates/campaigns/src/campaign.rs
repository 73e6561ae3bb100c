use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use fundforge_core::{AccountId, Aggregate, AggregateRoot, CampaignId, DomainError};
use fundforge_events::Event;

/// Upper bound on campaign title length, in bytes.
pub const MAX_TITLE_LEN: usize = 80;

/// Upper bound on campaign description length, in bytes.
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Upper bound on the funding window, in days.
pub const MAX_DURATION_DAYS: u64 = 36_500;

/// One recorded contribution.
///
/// The pledge log is append-only: repeat contributions by the same account
/// produce separate entries, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pledge {
    pub contributor: AccountId,
    /// Amount in smallest currency unit.
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Campaign lifecycle as observed at a point in time.
///
/// Never stored: derived from the settlement flags, the raised/goal comparison
/// and the clock. A failed campaign has no terminal state of its own since
/// contributors refund independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Open,
    Succeeded,
    Failed,
    Settled,
}

/// Aggregate root: Campaign.
///
/// Owns the contribution accounting for one funding round: the raised total,
/// the append-only pledge log and the per-contributor balances used for refund
/// eligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    id: CampaignId,
    creator: Option<AccountId>,
    title: String,
    description: String,
    goal_amount: u64,
    raised_amount: u64,
    deadline: Option<DateTime<Utc>>,
    withdrawn: bool,
    active: bool,
    pledges: Vec<Pledge>,
    balances: BTreeMap<AccountId, u64>,
    version: u64,
    created: bool,
}

impl Campaign {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: CampaignId) -> Self {
        Self {
            id,
            creator: None,
            title: String::new(),
            description: String::new(),
            goal_amount: 0,
            raised_amount: 0,
            deadline: None,
            withdrawn: false,
            active: false,
            pledges: Vec::new(),
            balances: BTreeMap::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CampaignId {
        self.id
    }

    pub fn creator(&self) -> Option<AccountId> {
        self.creator
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn goal_amount(&self) -> u64 {
        self.goal_amount
    }

    /// Total contributed over the campaign's lifetime.
    ///
    /// Monotonically non-decreasing: refunds do not decrement it. The escrow
    /// vault's held balance is the authoritative funds-remaining figure.
    pub fn raised_amount(&self) -> u64 {
        self.raised_amount
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pledges(&self) -> &[Pledge] {
        &self.pledges
    }

    /// Number of pledge-log entries (counts repeat contributions, not unique
    /// contributors).
    pub fn contributor_count(&self) -> usize {
        self.pledges.len()
    }

    /// The account's total tracked contribution, 0 if none (or already
    /// refunded).
    pub fn contribution_of(&self, account: AccountId) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Derive the lifecycle status at `now`.
    pub fn status(&self, now: DateTime<Utc>) -> CampaignStatus {
        if self.withdrawn {
            return CampaignStatus::Settled;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                if self.raised_amount >= self.goal_amount {
                    CampaignStatus::Succeeded
                } else {
                    CampaignStatus::Failed
                }
            }
            _ => CampaignStatus::Open,
        }
    }
}

impl AggregateRoot for Campaign {
    type Id = CampaignId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateCampaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub campaign_id: CampaignId,
    pub creator: AccountId,
    pub title: String,
    pub description: String,
    /// Funding goal in smallest currency unit.
    pub goal_amount: u64,
    /// Funding window length; one day is 86 400 seconds.
    pub duration_days: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribute {
    pub campaign_id: CampaignId,
    pub contributor: AccountId,
    /// Attached value in smallest currency unit.
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: WithdrawFunds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawFunds {
    pub campaign_id: CampaignId,
    pub caller: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RequestRefund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRefund {
    pub campaign_id: CampaignId,
    pub caller: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignCommand {
    CreateCampaign(CreateCampaign),
    Contribute(Contribute),
    WithdrawFunds(WithdrawFunds),
    RequestRefund(RequestRefund),
}

/// Event: CampaignCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCreated {
    pub campaign_id: CampaignId,
    pub creator: AccountId,
    pub title: String,
    pub description: String,
    pub goal_amount: u64,
    pub deadline: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ContributionMade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionMade {
    pub campaign_id: CampaignId,
    pub contributor: AccountId,
    pub amount: u64,
    pub new_raised_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FundsWithdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsWithdrawn {
    pub campaign_id: CampaignId,
    pub creator: AccountId,
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RefundIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundIssued {
    pub campaign_id: CampaignId,
    pub contributor: AccountId,
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignEvent {
    CampaignCreated(CampaignCreated),
    ContributionMade(ContributionMade),
    FundsWithdrawn(FundsWithdrawn),
    RefundIssued(RefundIssued),
}

impl Event for CampaignEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CampaignEvent::CampaignCreated(_) => "campaigns.campaign.created",
            CampaignEvent::ContributionMade(_) => "campaigns.campaign.contribution_made",
            CampaignEvent::FundsWithdrawn(_) => "campaigns.campaign.funds_withdrawn",
            CampaignEvent::RefundIssued(_) => "campaigns.campaign.refund_issued",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CampaignEvent::CampaignCreated(e) => e.occurred_at,
            CampaignEvent::ContributionMade(e) => e.occurred_at,
            CampaignEvent::FundsWithdrawn(e) => e.occurred_at,
            CampaignEvent::RefundIssued(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Campaign {
    type Command = CampaignCommand;
    type Event = CampaignEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CampaignEvent::CampaignCreated(e) => {
                self.id = e.campaign_id;
                self.creator = Some(e.creator);
                self.title = e.title.clone();
                self.description = e.description.clone();
                self.goal_amount = e.goal_amount;
                self.raised_amount = 0;
                self.deadline = Some(e.deadline);
                self.withdrawn = false;
                self.active = true;
                self.created = true;
            }
            CampaignEvent::ContributionMade(e) => {
                self.raised_amount = e.new_raised_amount;
                let balance = self.balances.entry(e.contributor).or_insert(0);
                *balance = balance.saturating_add(e.amount);
                self.pledges.push(Pledge {
                    contributor: e.contributor,
                    amount: e.amount,
                    occurred_at: e.occurred_at,
                });
            }
            CampaignEvent::FundsWithdrawn(_) => {
                // Order matters at the ledger layer: both flags commit before
                // any payout is initiated. The raised total stays as-is.
                self.withdrawn = true;
                self.active = false;
            }
            CampaignEvent::RefundIssued(e) => {
                // Zeroed exactly once; the raised total is not decremented.
                self.balances.insert(e.contributor, 0);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CampaignCommand::CreateCampaign(cmd) => self.handle_create(cmd),
            CampaignCommand::Contribute(cmd) => self.handle_contribute(cmd),
            CampaignCommand::WithdrawFunds(cmd) => self.handle_withdraw(cmd),
            CampaignCommand::RequestRefund(cmd) => self.handle_refund(cmd),
        }
    }
}

impl Campaign {
    fn funding_deadline(&self) -> Result<DateTime<Utc>, DomainError> {
        self.deadline.ok_or(DomainError::NotFound)
    }

    fn handle_create(&self, cmd: &CreateCampaign) -> Result<Vec<CampaignEvent>, DomainError> {
        if self.created {
            return Err(DomainError::invalid_input("campaign already exists"));
        }
        if cmd.title.is_empty() {
            return Err(DomainError::invalid_input("title must not be empty"));
        }
        if cmd.title.len() > MAX_TITLE_LEN {
            return Err(DomainError::invalid_input("title too long"));
        }
        if cmd.description.is_empty() {
            return Err(DomainError::invalid_input("description must not be empty"));
        }
        if cmd.description.len() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::invalid_input("description too long"));
        }
        if cmd.goal_amount == 0 {
            return Err(DomainError::invalid_input("funding goal must be positive"));
        }
        if cmd.duration_days == 0 {
            return Err(DomainError::invalid_input("funding window must be positive"));
        }
        if cmd.duration_days > MAX_DURATION_DAYS {
            return Err(DomainError::invalid_input("funding window too long"));
        }

        let deadline = cmd
            .occurred_at
            .checked_add_signed(Duration::days(cmd.duration_days as i64))
            .ok_or_else(|| DomainError::invalid_input("deadline out of range"))?;

        Ok(vec![CampaignEvent::CampaignCreated(CampaignCreated {
            campaign_id: cmd.campaign_id,
            creator: cmd.creator,
            title: cmd.title.clone(),
            description: cmd.description.clone(),
            goal_amount: cmd.goal_amount,
            deadline,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_contribute(&self, cmd: &Contribute) -> Result<Vec<CampaignEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::NotFound);
        }
        if !self.active {
            return Err(DomainError::CampaignInactive);
        }
        if cmd.occurred_at >= self.funding_deadline()? {
            return Err(DomainError::DeadlinePassed);
        }
        if cmd.amount == 0 {
            return Err(DomainError::invalid_input(
                "contribution amount must be positive",
            ));
        }

        let new_raised_amount = self
            .raised_amount
            .checked_add(cmd.amount)
            .ok_or_else(|| DomainError::invalid_input("contribution amount overflow"))?;

        Ok(vec![CampaignEvent::ContributionMade(ContributionMade {
            campaign_id: cmd.campaign_id,
            contributor: cmd.contributor,
            amount: cmd.amount,
            new_raised_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_withdraw(&self, cmd: &WithdrawFunds) -> Result<Vec<CampaignEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::NotFound);
        }
        let creator = self.creator.ok_or(DomainError::NotFound)?;
        if cmd.caller != creator {
            return Err(DomainError::Unauthorized);
        }
        // `active` only drops on withdrawal, so the withdrawn check must run
        // first: a repeated withdrawal reports AlreadyWithdrawn.
        if self.withdrawn {
            return Err(DomainError::AlreadyWithdrawn);
        }
        if !self.active {
            return Err(DomainError::CampaignInactive);
        }
        if cmd.occurred_at < self.funding_deadline()? {
            return Err(DomainError::DeadlineNotReached);
        }
        if self.raised_amount < self.goal_amount {
            return Err(DomainError::GoalNotReached);
        }

        Ok(vec![CampaignEvent::FundsWithdrawn(FundsWithdrawn {
            campaign_id: cmd.campaign_id,
            creator,
            amount: self.raised_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_refund(&self, cmd: &RequestRefund) -> Result<Vec<CampaignEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::NotFound);
        }
        if cmd.occurred_at < self.funding_deadline()? {
            return Err(DomainError::DeadlineNotReached);
        }
        if self.raised_amount >= self.goal_amount {
            return Err(DomainError::GoalReached);
        }
        // Unreachable while the goal guard holds; kept as an explicit
        // invariant check.
        if self.withdrawn {
            return Err(DomainError::AlreadyWithdrawn);
        }

        let balance = self.contribution_of(cmd.caller);
        if balance == 0 {
            return Err(DomainError::NoContribution);
        }

        Ok(vec![CampaignEvent::RefundIssued(RefundIssued {
            campaign_id: cmd.campaign_id,
            contributor: cmd.caller,
            amount: balance,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_account() -> AccountId {
        AccountId::new()
    }

    fn test_campaign_id() -> CampaignId {
        CampaignId::new(0)
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn create_cmd(creator: AccountId, goal_amount: u64, occurred_at: DateTime<Utc>) -> CreateCampaign {
        CreateCampaign {
            campaign_id: test_campaign_id(),
            creator,
            title: "Community workshop".to_string(),
            description: "Tools and materials for the neighborhood workshop".to_string(),
            goal_amount,
            duration_days: 1,
            occurred_at,
        }
    }

    /// Campaign created at `start` with a one-day window.
    fn created_campaign(creator: AccountId, goal_amount: u64, start: DateTime<Utc>) -> Campaign {
        let mut campaign = Campaign::empty(test_campaign_id());
        let events = campaign
            .handle(&CampaignCommand::CreateCampaign(create_cmd(
                creator,
                goal_amount,
                start,
            )))
            .unwrap();
        for event in &events {
            campaign.apply(event);
        }
        campaign
    }

    fn contribute(campaign: &mut Campaign, contributor: AccountId, amount: u64, at: DateTime<Utc>) {
        let events = campaign
            .handle(&CampaignCommand::Contribute(Contribute {
                campaign_id: campaign.id_typed(),
                contributor,
                amount,
                occurred_at: at,
            }))
            .unwrap();
        for event in &events {
            campaign.apply(event);
        }
    }

    #[test]
    fn create_campaign_emits_created_event_with_computed_deadline() {
        let campaign = Campaign::empty(test_campaign_id());
        let creator = test_account();
        let start = test_time();

        let events = campaign
            .handle(&CampaignCommand::CreateCampaign(create_cmd(creator, 100, start)))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            CampaignEvent::CampaignCreated(e) => {
                assert_eq!(e.campaign_id, test_campaign_id());
                assert_eq!(e.creator, creator);
                assert_eq!(e.goal_amount, 100);
                assert_eq!(e.deadline, start + Duration::days(1));
            }
            _ => panic!("Expected CampaignCreated event"),
        }
    }

    #[test]
    fn created_campaign_starts_open_and_unfunded() {
        let creator = test_account();
        let start = test_time();
        let campaign = created_campaign(creator, 100, start);

        assert_eq!(campaign.creator(), Some(creator));
        assert_eq!(campaign.raised_amount(), 0);
        assert!(campaign.is_active());
        assert!(!campaign.is_withdrawn());
        assert_eq!(campaign.status(start), CampaignStatus::Open);
    }

    #[test]
    fn create_campaign_rejects_invalid_input() {
        let campaign = Campaign::empty(test_campaign_id());
        let creator = test_account();
        let start = test_time();

        let zero_goal = create_cmd(creator, 0, start);
        let mut zero_window = create_cmd(creator, 100, start);
        zero_window.duration_days = 0;
        let mut empty_title = create_cmd(creator, 100, start);
        empty_title.title = String::new();
        let mut empty_description = create_cmd(creator, 100, start);
        empty_description.description = String::new();
        let mut long_title = create_cmd(creator, 100, start);
        long_title.title = "x".repeat(MAX_TITLE_LEN + 1);

        for cmd in [zero_goal, zero_window, empty_title, empty_description, long_title] {
            let err = campaign
                .handle(&CampaignCommand::CreateCampaign(cmd))
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)));
        }
    }

    #[test]
    fn contributions_accumulate_raised_amount_and_balances() {
        let creator = test_account();
        let start = test_time();
        let mut campaign = created_campaign(creator, 100, start);
        let a = test_account();
        let b = test_account();

        contribute(&mut campaign, a, 60, start);
        contribute(&mut campaign, b, 50, start);
        contribute(&mut campaign, a, 10, start);

        assert_eq!(campaign.raised_amount(), 120);
        assert_eq!(campaign.contribution_of(a), 70);
        assert_eq!(campaign.contribution_of(b), 50);
        // Three pledge entries, two unique contributors.
        assert_eq!(campaign.contributor_count(), 3);
        assert_eq!(campaign.pledges()[0].amount, 60);
    }

    #[test]
    fn contribute_after_deadline_fails_with_deadline_passed() {
        let start = test_time();
        let campaign = created_campaign(test_account(), 100, start);

        let err = campaign
            .handle(&CampaignCommand::Contribute(Contribute {
                campaign_id: campaign.id_typed(),
                contributor: test_account(),
                amount: 10,
                occurred_at: start + Duration::days(2),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::DeadlinePassed);
    }

    #[test]
    fn contribute_zero_fails_with_invalid_input() {
        let start = test_time();
        let campaign = created_campaign(test_account(), 100, start);

        let err = campaign
            .handle(&CampaignCommand::Contribute(Contribute {
                campaign_id: campaign.id_typed(),
                contributor: test_account(),
                amount: 0,
                occurred_at: start,
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn withdraw_requires_goal_deadline_and_creator() {
        let creator = test_account();
        let start = test_time();
        let mut campaign = created_campaign(creator, 100, start);
        contribute(&mut campaign, test_account(), 110, start);
        let after_deadline = start + Duration::days(2);

        // Wrong caller.
        let err = campaign
            .handle(&CampaignCommand::WithdrawFunds(WithdrawFunds {
                campaign_id: campaign.id_typed(),
                caller: test_account(),
                occurred_at: after_deadline,
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);

        // Too early.
        let err = campaign
            .handle(&CampaignCommand::WithdrawFunds(WithdrawFunds {
                campaign_id: campaign.id_typed(),
                caller: creator,
                occurred_at: start,
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::DeadlineNotReached);

        // Success.
        let events = campaign
            .handle(&CampaignCommand::WithdrawFunds(WithdrawFunds {
                campaign_id: campaign.id_typed(),
                caller: creator,
                occurred_at: after_deadline,
            }))
            .unwrap();
        match &events[0] {
            CampaignEvent::FundsWithdrawn(e) => {
                assert_eq!(e.creator, creator);
                assert_eq!(e.amount, 110);
            }
            _ => panic!("Expected FundsWithdrawn event"),
        }
        for event in &events {
            campaign.apply(event);
        }
        assert!(campaign.is_withdrawn());
        assert!(!campaign.is_active());
        assert_eq!(campaign.raised_amount(), 110);
    }

    #[test]
    fn withdraw_under_goal_fails_with_goal_not_reached() {
        let creator = test_account();
        let start = test_time();
        let mut campaign = created_campaign(creator, 100, start);
        contribute(&mut campaign, test_account(), 30, start);

        let err = campaign
            .handle(&CampaignCommand::WithdrawFunds(WithdrawFunds {
                campaign_id: campaign.id_typed(),
                caller: creator,
                occurred_at: start + Duration::days(2),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::GoalNotReached);
    }

    #[test]
    fn second_withdraw_fails_with_already_withdrawn() {
        let creator = test_account();
        let start = test_time();
        let mut campaign = created_campaign(creator, 100, start);
        contribute(&mut campaign, test_account(), 100, start);
        let after_deadline = start + Duration::days(2);

        let cmd = CampaignCommand::WithdrawFunds(WithdrawFunds {
            campaign_id: campaign.id_typed(),
            caller: creator,
            occurred_at: after_deadline,
        });
        let events = campaign.handle(&cmd).unwrap();
        for event in &events {
            campaign.apply(event);
        }

        let err = campaign.handle(&cmd).unwrap_err();
        assert_eq!(err, DomainError::AlreadyWithdrawn);
    }

    #[test]
    fn refund_zeroes_balance_once() {
        let start = test_time();
        let mut campaign = created_campaign(test_account(), 100, start);
        let a = test_account();
        contribute(&mut campaign, a, 30, start);
        let after_deadline = start + Duration::days(2);

        let cmd = CampaignCommand::RequestRefund(RequestRefund {
            campaign_id: campaign.id_typed(),
            caller: a,
            occurred_at: after_deadline,
        });
        let events = campaign.handle(&cmd).unwrap();
        match &events[0] {
            CampaignEvent::RefundIssued(e) => {
                assert_eq!(e.contributor, a);
                assert_eq!(e.amount, 30);
            }
            _ => panic!("Expected RefundIssued event"),
        }
        for event in &events {
            campaign.apply(event);
        }

        assert_eq!(campaign.contribution_of(a), 0);
        // The raised total is a historical figure and keeps its value.
        assert_eq!(campaign.raised_amount(), 30);

        let err = campaign.handle(&cmd).unwrap_err();
        assert_eq!(err, DomainError::NoContribution);
    }

    #[test]
    fn refund_on_funded_campaign_fails_with_goal_reached() {
        let start = test_time();
        let mut campaign = created_campaign(test_account(), 100, start);
        let a = test_account();
        contribute(&mut campaign, a, 110, start);

        let err = campaign
            .handle(&CampaignCommand::RequestRefund(RequestRefund {
                campaign_id: campaign.id_typed(),
                caller: a,
                occurred_at: start + Duration::days(2),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::GoalReached);
    }

    #[test]
    fn refund_before_deadline_fails_with_deadline_not_reached() {
        let start = test_time();
        let mut campaign = created_campaign(test_account(), 100, start);
        let a = test_account();
        contribute(&mut campaign, a, 30, start);

        let err = campaign
            .handle(&CampaignCommand::RequestRefund(RequestRefund {
                campaign_id: campaign.id_typed(),
                caller: a,
                occurred_at: start,
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::DeadlineNotReached);
    }

    #[test]
    fn refund_without_contribution_fails_with_no_contribution() {
        let start = test_time();
        let campaign = created_campaign(test_account(), 100, start);

        let err = campaign
            .handle(&CampaignCommand::RequestRefund(RequestRefund {
                campaign_id: campaign.id_typed(),
                caller: test_account(),
                occurred_at: start + Duration::days(2),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NoContribution);
    }

    #[test]
    fn status_walks_the_funded_lifecycle() {
        let creator = test_account();
        let start = test_time();
        let mut campaign = created_campaign(creator, 100, start);
        let after_deadline = start + Duration::days(2);

        assert_eq!(campaign.status(start), CampaignStatus::Open);

        contribute(&mut campaign, test_account(), 110, start);
        assert_eq!(campaign.status(after_deadline), CampaignStatus::Succeeded);

        let events = campaign
            .handle(&CampaignCommand::WithdrawFunds(WithdrawFunds {
                campaign_id: campaign.id_typed(),
                caller: creator,
                occurred_at: after_deadline,
            }))
            .unwrap();
        for event in &events {
            campaign.apply(event);
        }
        assert_eq!(campaign.status(after_deadline), CampaignStatus::Settled);
    }

    #[test]
    fn status_of_unfunded_campaign_is_failed_after_deadline() {
        let start = test_time();
        let mut campaign = created_campaign(test_account(), 100, start);
        let a = test_account();
        contribute(&mut campaign, a, 30, start);
        let after_deadline = start + Duration::days(2);

        assert_eq!(campaign.status(after_deadline), CampaignStatus::Failed);

        // A refund leaves the derived status untouched.
        let events = campaign
            .handle(&CampaignCommand::RequestRefund(RequestRefund {
                campaign_id: campaign.id_typed(),
                caller: a,
                occurred_at: after_deadline,
            }))
            .unwrap();
        for event in &events {
            campaign.apply(event);
        }
        assert_eq!(campaign.status(after_deadline), CampaignStatus::Failed);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after N contributions the raised total equals the sum of
        /// their amounts, the pledge log has N entries, and the per-account
        /// balances partition the total.
        #[test]
        fn raised_amount_equals_sum_of_contributions(
            amounts in prop::collection::vec((1u64..1_000_000u64, prop::bool::ANY), 1..20)
        ) {
            let start = test_time();
            let mut campaign = created_campaign(test_account(), 1_000, start);
            let a = test_account();
            let b = test_account();

            for (amount, use_a) in &amounts {
                let contributor = if *use_a { a } else { b };
                contribute(&mut campaign, contributor, *amount, start);
            }

            let total: u64 = amounts.iter().map(|(amount, _)| amount).sum();
            prop_assert_eq!(campaign.raised_amount(), total);
            prop_assert_eq!(campaign.contributor_count(), amounts.len());
            prop_assert_eq!(
                campaign.contribution_of(a) + campaign.contribution_of(b),
                total
            );
        }
    }
}
