// 💾 Snapshot Store - The group as one JSON document on disk
// The whole snapshot (members array, totalSaved, currentWeek) is written
// and read as a single document; there is no partial update or migration
// format. A missing or malformed document falls back to a fresh empty
// group so persistence problems never take the application down.

use crate::ledger::{Group, Member};
use crate::reconcile::{AuditResult, SnapshotAuditor};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

// ============================================================================
// GROUP DOCUMENT (persisted layout)
// ============================================================================

/// On-disk shape of the group snapshot.
///
/// `total_saved` is a legacy denormalized field: written as the derived sum
/// of member balances, audited and then discarded on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDocument {
    pub members: Vec<Member>,
    pub total_saved: f64,
    pub current_week: u32,
}

impl GroupDocument {
    pub fn from_group(group: &Group) -> Self {
        GroupDocument {
            members: group.members.clone(),
            total_saved: SnapshotAuditor::derived_total(group),
            current_week: group.current_week,
        }
    }

    pub fn into_group(self) -> Group {
        Group {
            members: self.members,
            current_week: self.current_week,
        }
    }
}

// ============================================================================
// SNAPSHOT STORE
// ============================================================================

pub struct SnapshotStore {
    path: PathBuf,
    auditor: SnapshotAuditor,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotStore {
            path: path.into(),
            auditor: SnapshotAuditor::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the whole snapshot.
    ///
    /// Write-rename pattern: serialize to `{path}.tmp`, flush, rename into
    /// place, so a crash mid-write cannot corrupt the previous snapshot.
    pub fn save(&self, group: &Group) -> Result<()> {
        let document = GroupDocument::from_group(group);
        let json = serde_json::to_string_pretty(&document)
            .context("Failed to serialize group snapshot")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create snapshot directory {:?}", parent))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create {:?}", tmp_path))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        file.sync_all()
            .with_context(|| format!("Failed to flush {:?}", tmp_path))?;

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace snapshot {:?}", self.path))?;

        Ok(())
    }

    /// Load the current snapshot.
    ///
    /// Missing file, unreadable file, malformed JSON: all fall back to a
    /// fresh empty group. Never fatal.
    pub fn load(&self) -> Group {
        match self.try_load() {
            Ok((group, audit)) => {
                if !audit.is_consistent() {
                    eprintln!("⚠️  {}", audit.summary());
                }
                group
            }
            Err(reason) => {
                if self.path.exists() {
                    eprintln!("⚠️  Snapshot unusable ({}), starting fresh", reason);
                }
                Group::empty()
            }
        }
    }

    fn try_load(&self) -> Result<(Group, AuditResult)> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot {:?}", self.path))?;

        let document: GroupDocument = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse snapshot {:?}", self.path))?;

        let stored_total = document.total_saved;
        let group = document.into_group();
        let audit = self.auditor.audit(stored_total, &group);

        Ok((group, audit))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SavingsLedger;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("group-savings-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let path = scratch_path();
        let store = SnapshotStore::new(&path);

        let ledger = SavingsLedger::new();
        let group = Group::empty();
        let (group, _) = ledger.admit(&group, "u1", "Ada", 2).unwrap();
        let group = ledger.advance_week(&group);

        store.save(&group).unwrap();
        let loaded = store.load();

        assert_eq!(loaded, group);
        assert_eq!(loaded.members[0].current_balance, 22_000.0);
        assert_eq!(loaded.current_week, 1);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_snapshot_falls_back_to_empty_group() {
        let store = SnapshotStore::new(scratch_path());

        let group = store.load();
        assert_eq!(group, Group::empty());
    }

    #[test]
    fn test_malformed_snapshot_falls_back_to_empty_group() {
        let path = scratch_path();
        fs::write(&path, "{ definitely not a snapshot").unwrap();

        let store = SnapshotStore::new(&path);
        let group = store.load();
        assert_eq!(group, Group::empty());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_document_writes_derived_total() {
        let ledger = SavingsLedger::new();
        let group = Group::empty();
        let (group, _) = ledger.admit(&group, "u1", "A", 1).unwrap();
        let (group, _) = ledger.admit(&group, "u2", "B", 3).unwrap();

        let document = GroupDocument::from_group(&group);
        assert_eq!(document.total_saved, 40_000.0);
        assert_eq!(document.current_week, 0);
    }

    #[test]
    fn test_drifted_total_is_ignored_on_load() {
        // A snapshot whose stored totalSaved disagrees with its members
        // still loads; the derived value wins
        let path = scratch_path();
        let json = r#"{
            "members": [{
                "id": "m-1",
                "ownerRef": "u1",
                "name": "Ada",
                "tierId": 1,
                "joinedAt": "2026-01-05T00:00:00Z",
                "currentBalance": 10500.0,
                "accumulatedInterest": 500.0,
                "weeksParticipated": 1
            }],
            "totalSaved": 99999.0,
            "currentWeek": 1
        }"#;
        fs::write(&path, json).unwrap();

        let store = SnapshotStore::new(&path);
        let group = store.load();

        assert_eq!(group.member_count(), 1);
        assert_eq!(group.members[0].current_balance, 10_500.0);
        assert_eq!(SnapshotAuditor::derived_total(&group), 10_500.0);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let path = scratch_path();
        let store = SnapshotStore::new(&path);

        let ledger = SavingsLedger::new();
        let group = Group::empty();
        let (group, member) = ledger.admit(&group, "u1", "A", 1).unwrap();
        store.save(&group).unwrap();

        let (group, _) = ledger.withdraw(&group, &member.id);
        store.save(&group).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.member_count(), 0);

        fs::remove_file(&path).ok();
    }
}
