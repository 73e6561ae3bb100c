//! Campaign module (crowdfunding funding rules).
//!
//! Pure domain logic only: no IO, no clocks, no custody concerns. Commands
//! carry their own `occurred_at`; value transfer belongs to the ledger layer.

pub mod campaign;

pub use campaign::{
    Campaign, CampaignCommand, CampaignCreated, CampaignEvent, CampaignStatus, Contribute,
    ContributionMade, CreateCampaign, FundsWithdrawn, MAX_DESCRIPTION_LEN, MAX_DURATION_DAYS,
    MAX_TITLE_LEN, Pledge, RefundIssued, RequestRefund, WithdrawFunds,
};
