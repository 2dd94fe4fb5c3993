// Group Savings - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod tiers;     // Tier Catalog - fixed savings plans
pub mod ledger;    // Savings Ledger - pure group transitions
pub mod reconcile; // Snapshot audit - denormalized total drift detection
pub mod store;     // Snapshot store - group as one JSON document
pub mod identity;  // Identity store - demo accounts and sessions

// Re-export commonly used types
pub use tiers::{Tier, TierCatalog};
pub use ledger::{Group, GroupTotals, LedgerError, Member, SavingsLedger};
pub use reconcile::{AuditResult, SnapshotAuditor};
pub use store::{GroupDocument, SnapshotStore};
pub use identity::{AuthUser, IdentityError, IdentityStore, UserAccount};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
