//! Time source for deadline comparisons.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Clock collaborator: the ledger never reads ambient time directly.
///
/// The deadline is a data comparison against `now`, not a scheduled callback,
/// so tests can drive the lifecycle with a manually advanced clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
