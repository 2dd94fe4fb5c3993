// 💰 Savings Ledger - Pure transition functions over group snapshots
// Every operation borrows a Group and returns a new one; the caller owns
// "current" state and commits the result. Nothing here performs I/O.
//
// The four operations:
//   admit         - add a member at a chosen tier (all-or-nothing)
//   advance_week  - one compounding step, applied uniformly
//   withdraw      - remove a member, pay out their full balance
//   aggregate     - derive group totals from the members themselves

use crate::tiers::TierCatalog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// LEDGER ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Admission referenced a tier id that does not resolve in the catalog
    InvalidTier(u32),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::InvalidTier(tier_id) => {
                write!(f, "No such tier in catalog: {}", tier_id)
            }
        }
    }
}

impl std::error::Error for LedgerError {}

// ============================================================================
// MEMBER
// ============================================================================

/// A participant's ledger entry.
///
/// Created only by admission, mutated only by the weekly advance and
/// withdrawal operations, destroyed only by withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Stable identity (UUID), assigned at admission
    pub id: String,

    /// Opaque external identity reference; never interpreted by the ledger
    pub owner_ref: String,

    /// Display label
    pub name: String,

    /// Reference into the tier catalog
    pub tier_id: u32,

    /// Admission timestamp, immutable after creation
    pub joined_at: DateTime<Utc>,

    /// Principal plus all interest accrued so far
    pub current_balance: f64,

    /// Running sum of all interest ever credited
    pub accumulated_interest: f64,

    /// Weekly-advance steps applied to this member since admission
    pub weeks_participated: u32,
}

// ============================================================================
// GROUP
// ============================================================================

/// The full set of current members plus the week counter.
///
/// Insertion order is preserved; it matters for display, not correctness.
/// Totals are always derived from the members (see `SavingsLedger::aggregate`),
/// never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub members: Vec<Member>,
    pub current_week: u32,
}

impl Group {
    /// Fresh group: zero members, week 0
    pub fn empty() -> Self {
        Group {
            members: Vec::new(),
            current_week: 0,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn find_member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn contains_member(&self, member_id: &str) -> bool {
        self.find_member(member_id).is_some()
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// GROUP TOTALS
// ============================================================================

/// Derived aggregate over a group snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotals {
    /// Sum of each member's tier principal (what was originally put in)
    pub total_contributed: f64,

    /// Sum of each member's accumulated interest
    pub total_interest: f64,

    /// Contributed plus interest; equals the sum of current balances
    pub total_withdrawable: f64,
}

impl GroupTotals {
    pub fn summary(&self) -> String {
        format!(
            "contributed {:.2}, interest {:.2}, withdrawable {:.2}",
            self.total_contributed, self.total_interest, self.total_withdrawable
        )
    }
}

// ============================================================================
// SAVINGS LEDGER
// ============================================================================

/// The ledger engine: pure transitions over `Group` values, parameterized
/// by a tier catalog.
pub struct SavingsLedger {
    catalog: TierCatalog,
}

impl SavingsLedger {
    /// Ledger over the reference catalog
    pub fn new() -> Self {
        SavingsLedger {
            catalog: TierCatalog::new(),
        }
    }

    /// Ledger over an externally configured catalog
    pub fn with_catalog(catalog: TierCatalog) -> Self {
        SavingsLedger { catalog }
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    /// Admit a new member at the chosen tier.
    ///
    /// The ledger is the authoritative guard for tier validity: an
    /// unresolvable `tier_id` fails with `InvalidTier` and the group is
    /// returned to the caller untouched (all-or-nothing). Name validation
    /// is the presentation layer's job.
    pub fn admit(
        &self,
        group: &Group,
        owner_ref: &str,
        name: &str,
        tier_id: u32,
    ) -> Result<(Group, Member), LedgerError> {
        let tier = self
            .catalog
            .lookup(tier_id)
            .ok_or(LedgerError::InvalidTier(tier_id))?;

        let member = Member {
            id: uuid::Uuid::new_v4().to_string(),
            owner_ref: owner_ref.to_string(),
            name: name.to_string(),
            tier_id,
            joined_at: Utc::now(),
            current_balance: tier.amount,
            accumulated_interest: 0.0,
            weeks_participated: 0,
        };

        let mut members = group.members.clone();
        members.push(member.clone());

        let new_group = Group {
            members,
            current_week: group.current_week,
        };

        Ok((new_group, member))
    }

    /// Apply one compounding step, independently and uniformly, to every
    /// member. Each member's tier is looked up fresh at advance time.
    ///
    /// A member whose tier id fails to resolve (unreachable under the
    /// admission guard, handled anyway) is carried unchanged for this step;
    /// one corrupt entry must not block group-wide progress. The week
    /// counter increments by exactly 1 per call, even for an empty group.
    ///
    /// NOT idempotent: each call is a distinct, cumulative compounding
    /// step. Callers must invoke at most once per intended time-step.
    pub fn advance_week(&self, group: &Group) -> Group {
        let members = group
            .members
            .iter()
            .map(|member| match self.catalog.lookup(member.tier_id) {
                Some(tier) => {
                    let interest = tier.weekly_interest(member.current_balance);
                    Member {
                        current_balance: member.current_balance + interest,
                        accumulated_interest: member.accumulated_interest + interest,
                        weeks_participated: member.weeks_participated + 1,
                        ..member.clone()
                    }
                }
                None => member.clone(),
            })
            .collect();

        Group {
            members,
            current_week: group.current_week + 1,
        }
    }

    /// Remove a member and pay out their full current balance.
    ///
    /// An unknown `member_id` is a silent no-op returning 0.0 with the
    /// group unchanged; callers needing to distinguish "not found" check
    /// membership first. The removed member's history is discarded.
    pub fn withdraw(&self, group: &Group, member_id: &str) -> (Group, f64) {
        let withdrawn_amount = match group.find_member(member_id) {
            Some(member) => member.current_balance,
            None => return (group.clone(), 0.0),
        };

        let members = group
            .members
            .iter()
            .filter(|m| m.id != member_id)
            .cloned()
            .collect();

        let new_group = Group {
            members,
            current_week: group.current_week,
        };

        (new_group, withdrawn_amount)
    }

    /// Derive group totals from the members themselves.
    ///
    /// Contributed counts tier principals, not current balances; a member
    /// whose tier no longer resolves contributes 0. Pure, safe to call at
    /// any rate; an empty group yields zeros.
    pub fn aggregate(&self, group: &Group) -> GroupTotals {
        let total_contributed = group
            .members
            .iter()
            .map(|member| {
                self.catalog
                    .lookup(member.tier_id)
                    .map(|tier| tier.amount)
                    .unwrap_or(0.0)
            })
            .sum::<f64>();

        let total_interest = group
            .members
            .iter()
            .map(|member| member.accumulated_interest)
            .sum::<f64>();

        GroupTotals {
            total_contributed,
            total_interest,
            total_withdrawable: total_contributed + total_interest,
        }
    }
}

impl Default for SavingsLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
