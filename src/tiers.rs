// 🏦 Tier Catalog - Fixed savings plan definitions
// Tiers are configuration, not business logic: the catalog ships with the
// reference plans and can be replaced wholesale from a JSON file without
// touching the ledger.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// TIER
// ============================================================================

/// A fixed savings plan: required principal plus a weekly interest rate.
///
/// Tiers are immutable and catalog-defined. They are never created or
/// destroyed at runtime; members only reference them by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    /// Unique within the catalog, small positive integer
    pub id: u32,

    /// Display label (e.g. "Tier 2")
    pub name: String,

    /// Required principal contribution, whole currency units
    pub amount: f64,

    /// Percentage points applied per weekly step (non-negative)
    pub weekly_interest_rate: f64,
}

impl Tier {
    /// Interest credited for one weekly step on the given balance
    pub fn weekly_interest(&self, balance: f64) -> f64 {
        balance * self.weekly_interest_rate / 100.0
    }

    /// Balance after one weekly step
    pub fn total_after_week(&self, balance: f64) -> f64 {
        balance + self.weekly_interest(balance)
    }
}

// ============================================================================
// TIER CATALOG
// ============================================================================

/// Registry of all offered tiers.
///
/// Lookups never panic on unknown ids; callers handle the not-found case
/// explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    /// Create the reference catalog: three fixed plans
    pub fn new() -> Self {
        TierCatalog {
            tiers: vec![
                Tier {
                    id: 1,
                    name: "Tier 1".to_string(),
                    amount: 10_000.0,
                    weekly_interest_rate: 5.0,
                },
                Tier {
                    id: 2,
                    name: "Tier 2".to_string(),
                    amount: 20_000.0,
                    weekly_interest_rate: 10.0,
                },
                Tier {
                    id: 3,
                    name: "Tier 3".to_string(),
                    amount: 30_000.0,
                    weekly_interest_rate: 20.0,
                },
            ],
        }
    }

    /// Build a catalog from explicit tier definitions (validated)
    pub fn from_tiers(tiers: Vec<Tier>) -> Result<Self> {
        if tiers.is_empty() {
            bail!("Tier catalog must contain at least one tier");
        }

        for tier in &tiers {
            if tier.id == 0 {
                bail!("Tier id must be a positive integer");
            }
            if tier.name.trim().is_empty() {
                bail!("Tier {} has an empty name", tier.id);
            }
            if tier.amount <= 0.0 {
                bail!("Tier {} has non-positive principal {}", tier.id, tier.amount);
            }
            if tier.weekly_interest_rate < 0.0 {
                bail!(
                    "Tier {} has negative weekly interest rate {}",
                    tier.id,
                    tier.weekly_interest_rate
                );
            }
            if tiers.iter().filter(|t| t.id == tier.id).count() > 1 {
                bail!("Duplicate tier id {}", tier.id);
            }
        }

        Ok(TierCatalog { tiers })
    }

    /// Load a catalog from an external JSON file
    ///
    /// The file holds a plain array of tier objects:
    /// `[{"id": 1, "name": "Tier 1", "amount": 10000, "weeklyInterestRate": 5}, ...]`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tier catalog {:?}", path))?;

        let tiers: Vec<Tier> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse tier catalog {:?}", path))?;

        Self::from_tiers(tiers)
    }

    /// Look up a tier by id. Returns None for unknown ids, never panics.
    pub fn lookup(&self, tier_id: u32) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.id == tier_id)
    }

    /// True iff `tier_id` resolves and `amount` equals that tier's required
    /// principal exactly. Tiers are fixed discrete offerings; there is no
    /// tolerance band.
    pub fn is_valid_amount(&self, amount: f64, tier_id: u32) -> bool {
        match self.lookup(tier_id) {
            Some(tier) => amount == tier.amount,
            None => false,
        }
    }

    /// All tiers in catalog order
    pub fn all_tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn count(&self) -> usize {
        self.tiers.len()
    }
}

impl Default for TierCatalog {
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

    #[test]
    fn test_reference_catalog_values() {
        let catalog = TierCatalog::new();
        assert_eq!(catalog.count(), 3);

        let tier1 = catalog.lookup(1).unwrap();
        assert_eq!(tier1.amount, 10_000.0);
        assert_eq!(tier1.weekly_interest_rate, 5.0);

        let tier2 = catalog.lookup(2).unwrap();
        assert_eq!(tier2.amount, 20_000.0);
        assert_eq!(tier2.weekly_interest_rate, 10.0);

        let tier3 = catalog.lookup(3).unwrap();
        assert_eq!(tier3.amount, 30_000.0);
        assert_eq!(tier3.weekly_interest_rate, 20.0);
    }

    #[test]
    fn test_lookup_unknown_tier_is_none() {
        let catalog = TierCatalog::new();
        assert!(catalog.lookup(0).is_none());
        assert!(catalog.lookup(99).is_none());
    }

    #[test]
    fn test_is_valid_amount_exact_match_only() {
        let catalog = TierCatalog::new();

        assert!(catalog.is_valid_amount(10_000.0, 1));
        assert!(catalog.is_valid_amount(20_000.0, 2));

        // No tolerance band
        assert!(!catalog.is_valid_amount(10_000.01, 1));
        assert!(!catalog.is_valid_amount(9_999.99, 1));

        // Unknown tier never validates
        assert!(!catalog.is_valid_amount(10_000.0, 99));
    }

    #[test]
    fn test_weekly_interest_math() {
        let catalog = TierCatalog::new();

        let tier1 = catalog.lookup(1).unwrap();
        assert_eq!(tier1.weekly_interest(10_000.0), 500.0);
        assert_eq!(tier1.total_after_week(10_000.0), 10_500.0);

        let tier2 = catalog.lookup(2).unwrap();
        assert_eq!(tier2.weekly_interest(20_000.0), 2_000.0);
        assert_eq!(tier2.total_after_week(22_000.0), 24_200.0);
    }

    #[test]
    fn test_zero_rate_tier_accrues_nothing() {
        let tier = Tier {
            id: 7,
            name: "Frozen".to_string(),
            amount: 5_000.0,
            weekly_interest_rate: 0.0,
        };

        assert_eq!(tier.weekly_interest(5_000.0), 0.0);
        assert_eq!(tier.total_after_week(5_000.0), 5_000.0);
    }

    #[test]
    fn test_from_tiers_rejects_empty_catalog() {
        assert!(TierCatalog::from_tiers(vec![]).is_err());
    }

    #[test]
    fn test_from_tiers_rejects_duplicate_ids() {
        let tiers = vec![
            Tier {
                id: 1,
                name: "A".to_string(),
                amount: 100.0,
                weekly_interest_rate: 1.0,
            },
            Tier {
                id: 1,
                name: "B".to_string(),
                amount: 200.0,
                weekly_interest_rate: 2.0,
            },
        ];

        assert!(TierCatalog::from_tiers(tiers).is_err());
    }

    #[test]
    fn test_from_tiers_rejects_bad_values() {
        let zero_id = Tier {
            id: 0,
            name: "Zero".to_string(),
            amount: 100.0,
            weekly_interest_rate: 1.0,
        };
        assert!(TierCatalog::from_tiers(vec![zero_id]).is_err());

        let negative_rate = Tier {
            id: 1,
            name: "Negative".to_string(),
            amount: 100.0,
            weekly_interest_rate: -1.0,
        };
        assert!(TierCatalog::from_tiers(vec![negative_rate]).is_err());

        let free_tier = Tier {
            id: 1,
            name: "Free".to_string(),
            amount: 0.0,
            weekly_interest_rate: 1.0,
        };
        assert!(TierCatalog::from_tiers(vec![free_tier]).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("tiers-{}.json", uuid::Uuid::new_v4()));
        let json = r#"[
            {"id": 1, "name": "Starter", "amount": 1000, "weeklyInterestRate": 2.5},
            {"id": 2, "name": "Plus", "amount": 5000, "weeklyInterestRate": 4}
        ]"#;
        std::fs::write(&path, json).unwrap();

        let catalog = TierCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.count(), 2);
        assert_eq!(catalog.lookup(1).unwrap().name, "Starter");
        assert_eq!(catalog.lookup(2).unwrap().weekly_interest_rate, 4.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_from_json_file_missing_or_malformed() {
        let missing = std::env::temp_dir().join(format!("no-such-{}.json", uuid::Uuid::new_v4()));
        assert!(TierCatalog::from_json_file(&missing).is_err());

        let path = std::env::temp_dir().join(format!("tiers-bad-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(TierCatalog::from_json_file(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
