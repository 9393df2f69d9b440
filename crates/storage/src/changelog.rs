// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only change log over a persisted `Ensemble`'s `changes[]`,
//! implementing `ens_engine::plan::ChangeLookup` so the planner can
//! compare digests without owning storage itself.

use std::collections::HashMap;

use ens_core::{Action, ChangeId, ChangeRecord};
use ens_engine::ChangeLookup;

/// Indexes a document's change log by `(target, action)`, keeping only the
/// most recent record per pair — the planner never needs more than that.
#[derive(Debug, Default)]
pub struct PersistedChangeLog {
    records: Vec<ChangeRecord>,
    latest: HashMap<(String, Action), usize>,
}

impl PersistedChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over an existing change log, e.g. loaded from an
    /// `Ensemble`'s `changes[]`.
    pub fn from_records(records: Vec<ChangeRecord>) -> Self {
        let mut log = Self { records, latest: HashMap::new() };
        log.reindex();
        log
    }

    fn reindex(&mut self) {
        self.latest.clear();
        for (i, record) in self.records.iter().enumerate() {
            let key = (record.target.clone(), record.action);
            match self.latest.get(&key) {
                Some(&existing) if self.records[existing].change_id >= record.change_id => {}
                _ => {
                    self.latest.insert(key, i);
                }
            }
        }
    }

    /// Append a new record, keeping the latest-per-target index current.
    pub fn append(&mut self, record: ChangeRecord) {
        let key = (record.target.clone(), record.action);
        self.records.push(record);
        self.latest.insert(key, self.records.len() - 1);
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn by_id(&self, id: ChangeId) -> Option<&ChangeRecord> {
        self.records.iter().find(|r| r.change_id == id)
    }

    pub fn into_records(self) -> Vec<ChangeRecord> {
        self.records
    }
}

impl ChangeLookup for PersistedChangeLog {
    fn last_change(&self, target: &str, action: Action) -> Option<&ChangeRecord> {
        let idx = *self.latest.get(&(target.to_string(), action))?;
        self.records.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ens_core::{Status, TaskResultSummary};

    fn record(job: u32, task: u32, target: &str, action: Action) -> ChangeRecord {
        ChangeRecord {
            change_id: ChangeId::new(job, task),
            parent_id: None,
            start_time_ms: 0,
            commit_id: None,
            action,
            target: target.to_string(),
            inputs_digest: "d".to_string(),
            dependencies_digest: None,
            result: TaskResultSummary { status: Status::Ok, success: true, modified: true, messages: vec![] },
            resource_changes: vec![],
        }
    }

    #[test]
    fn last_change_returns_the_highest_change_id_for_the_pair() {
        let mut log = PersistedChangeLog::new();
        log.append(record(1, 0, "db", Action::Deploy));
        log.append(record(2, 0, "db", Action::Deploy));
        log.append(record(2, 1, "web", Action::Deploy));
        let last = log.last_change("db", Action::Deploy).unwrap();
        assert_eq!(last.change_id, ChangeId::new(2, 0));
    }

    #[test]
    fn distinct_actions_on_the_same_target_do_not_collide() {
        let mut log = PersistedChangeLog::new();
        log.append(record(1, 0, "db", Action::Deploy));
        log.append(record(1, 1, "db", Action::Undeploy));
        assert!(log.last_change("db", Action::Deploy).is_some());
        assert!(log.last_change("db", Action::Undeploy).is_some());
        assert_ne!(
            log.last_change("db", Action::Deploy).unwrap().change_id,
            log.last_change("db", Action::Undeploy).unwrap().change_id
        );
    }

    #[test]
    fn from_records_reindexes_an_existing_log() {
        let log = PersistedChangeLog::from_records(vec![
            record(1, 0, "db", Action::Deploy),
            record(3, 0, "db", Action::Deploy),
        ]);
        assert_eq!(log.last_change("db", Action::Deploy).unwrap().change_id, ChangeId::new(3, 0));
    }
}
