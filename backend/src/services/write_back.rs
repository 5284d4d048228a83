//! Propagation of evaluated states to the alert store
//!
//! Triggered alerts are written with one bulk update per target state. A
//! bulk call that fails at the transport level is replayed once as
//! individual updates; nothing is retried beyond that.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use shared::AlertState;

use crate::external::{AlertStore, BulkUpdateResult, StateUpdate};

/// Aggregate outcome of a write-back; `succeeded` and `failed` are disjoint
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct WriteBackReport {
    pub succeeded: BTreeSet<String>,
    pub failed: BTreeSet<String>,
    /// A bulk call failed and its ids were written individually
    pub fallback_used: bool,
}

impl WriteBackReport {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    fn merge(mut self, other: WriteBackReport) -> Self {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
        self.failed.retain(|id| !self.succeeded.contains(id));
        self.fallback_used |= other.fallback_used;
        self
    }
}

/// Write every triggered state back to the store.
///
/// Alerts that stay `not_triggered` are never sent; when nothing triggered
/// no call is made at all.
pub async fn write_back(
    store: &dyn AlertStore,
    states: &BTreeMap<String, AlertState>,
    evaluated_by: &str,
) -> WriteBackReport {
    let mut batches: BTreeMap<AlertState, Vec<String>> = BTreeMap::new();
    for (id, state) in states {
        if *state == AlertState::Triggered {
            batches.entry(*state).or_default().push(id.clone());
        }
    }

    if batches.is_empty() {
        tracing::debug!("No state changes to write back");
        return WriteBackReport::default();
    }

    let evaluated_at = Utc::now();
    let reports = join_all(batches.into_iter().map(|(state, ids)| {
        let update = StateUpdate {
            state,
            evaluated_at,
            evaluated_by: evaluated_by.to_string(),
        };
        async move { write_batch(store, ids, update).await }
    }))
    .await;

    reports
        .into_iter()
        .fold(WriteBackReport::default(), WriteBackReport::merge)
}

async fn write_batch(store: &dyn AlertStore, ids: Vec<String>, update: StateUpdate) -> WriteBackReport {
    match store.bulk_update_state(&ids, &update).await {
        Ok(result) => attribute_bulk_result(ids, result),
        Err(e) => {
            tracing::warn!(
                state = %update.state,
                alerts = ids.len(),
                error = %e,
                "Bulk update failed, falling back to individual updates"
            );
            let mut report = write_individually(store, &ids, &update).await;
            report.fallback_used = true;
            report
        }
    }
}

/// Split a batch by the store's `modifiedCount`.
///
/// The store reports counts, not ids, so the first `modifiedCount` ids in
/// request order are taken as written.
fn attribute_bulk_result(ids: Vec<String>, result: BulkUpdateResult) -> WriteBackReport {
    let modified = usize::try_from(result.modified_count)
        .unwrap_or(usize::MAX)
        .min(ids.len());

    if modified < ids.len() {
        tracing::warn!(
            requested = ids.len(),
            matched = result.matched_count,
            modified = result.modified_count,
            "Bulk update modified fewer alerts than requested"
        );
    }

    let mut report = WriteBackReport::default();
    let mut ids = ids.into_iter();
    report.succeeded.extend(ids.by_ref().take(modified));
    report.failed.extend(ids);
    report
}

async fn write_individually(
    store: &dyn AlertStore,
    ids: &[String],
    update: &StateUpdate,
) -> WriteBackReport {
    let results = join_all(ids.iter().map(|id| async move {
        let result = store.update_state(id, update).await;
        (id, result)
    }))
    .await;

    let mut report = WriteBackReport::default();
    for (id, result) in results {
        match result {
            Ok(()) => {
                report.succeeded.insert(id.clone());
            }
            Err(e) => {
                tracing::warn!(alert_id = %id, error = %e, "Individual state update failed");
                report.failed.insert(id.clone());
            }
        }
    }
    report
}
