use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fundforge_core::CampaignId;

/// Envelope for a published event: the unit of the audit log.
///
/// Notes:
/// - `sequence_number` is monotonically increasing across the whole ledger and
///   is assigned under the same lock as the state change it records, so the
///   audit log totally orders all campaign operations.
/// - `payload` is the domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    campaign_id: CampaignId,

    /// Monotonically increasing position in the ledger's audit log.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, campaign_id: CampaignId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            campaign_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
