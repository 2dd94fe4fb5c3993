// ⚖️ Snapshot Audit - Detect drift in the persisted denormalized total
// The on-disk document carries a legacy `totalSaved` figure that was kept
// up to date ad hoc by the original writer. In memory totals are always
// derived, so on load the stored figure is checked against the sum of
// member balances; the derived value wins either way.

use crate::ledger::Group;
use serde::{Deserialize, Serialize};

// ============================================================================
// AUDIT RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuditResult {
    /// Stored total agrees with the derived sum (within tolerance)
    Consistent { total: f64 },

    /// Stored total disagrees with the derived sum
    Drift {
        stored_total: f64,
        derived_total: f64,
        difference: f64,
    },
}

impl AuditResult {
    pub fn is_consistent(&self) -> bool {
        matches!(self, AuditResult::Consistent { .. })
    }

    pub fn difference(&self) -> f64 {
        match self {
            AuditResult::Consistent { .. } => 0.0,
            AuditResult::Drift { difference, .. } => *difference,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            AuditResult::Consistent { total } => {
                format!("snapshot total {:.2} reconciles with members", total)
            }
            AuditResult::Drift {
                stored_total,
                derived_total,
                difference,
            } => format!(
                "snapshot total {:.2} drifted from member balances {:.2} (off by {:.2})",
                stored_total, derived_total, difference
            ),
        }
    }
}

// ============================================================================
// SNAPSHOT AUDITOR
// ============================================================================

pub struct SnapshotAuditor {
    /// Tolerance for floating-point comparisons (default: 0.01)
    pub tolerance: f64,
}

impl SnapshotAuditor {
    pub fn new() -> Self {
        SnapshotAuditor { tolerance: 0.01 }
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        SnapshotAuditor { tolerance }
    }

    /// Sum of member balances, the authoritative total
    pub fn derived_total(group: &Group) -> f64 {
        group.members.iter().map(|m| m.current_balance).sum()
    }

    /// Compare a stored total against the group it claims to describe
    pub fn audit(&self, stored_total: f64, group: &Group) -> AuditResult {
        let derived_total = Self::derived_total(group);
        let difference = (stored_total - derived_total).abs();

        if difference < self.tolerance {
            AuditResult::Consistent {
                total: derived_total,
            }
        } else {
            AuditResult::Drift {
                stored_total,
                derived_total,
                difference,
            }
        }
    }
}

impl Default for SnapshotAuditor {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Group, SavingsLedger};

    fn two_member_group() -> Group {
        let ledger = SavingsLedger::new();
        let group = Group::empty();
        let (group, _) = ledger.admit(&group, "u1", "A", 1).unwrap();
        let (group, _) = ledger.admit(&group, "u2", "B", 2).unwrap();
        group
    }

    #[test]
    fn test_consistent_snapshot() {
        let group = two_member_group();
        let auditor = SnapshotAuditor::new();

        let result = auditor.audit(30_000.0, &group);
        assert!(result.is_consistent());
        assert_eq!(result.difference(), 0.0);
    }

    #[test]
    fn test_drifted_snapshot() {
        let group = two_member_group();
        let auditor = SnapshotAuditor::new();

        let result = auditor.audit(29_500.0, &group);
        assert!(!result.is_consistent());
        assert_eq!(result.difference(), 500.0);

        match result {
            AuditResult::Drift {
                stored_total,
                derived_total,
                ..
            } => {
                assert_eq!(stored_total, 29_500.0);
                assert_eq!(derived_total, 30_000.0);
            }
            _ => panic!("expected drift"),
        }
    }

    #[test]
    fn test_tolerance_absorbs_float_noise() {
        let group = two_member_group();
        let auditor = SnapshotAuditor::new();

        assert!(auditor.audit(30_000.001, &group).is_consistent());

        let strict = SnapshotAuditor::with_tolerance(1e-9);
        assert!(!strict.audit(30_000.001, &group).is_consistent());
    }

    #[test]
    fn test_empty_group_expects_zero() {
        let auditor = SnapshotAuditor::new();

        assert!(auditor.audit(0.0, &Group::empty()).is_consistent());
        assert!(!auditor.audit(100.0, &Group::empty()).is_consistent());
    }
}
