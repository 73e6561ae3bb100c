//! Value custody for campaign funds.
//!
//! The ledger is the custodian of contributed funds, not a pass-through; this
//! crate provides the vault it delegates custody to.

pub mod in_memory;
pub mod vault;

pub use in_memory::InMemoryEscrowVault;
pub use vault::{EscrowVault, TransferError};
