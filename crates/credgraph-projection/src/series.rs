use crate::rows::{GrainEvent, TimeSeriesPoint};
use chrono::{DateTime, Utc};
use credgraph_core::{datetime_from_millis, Result};
use credgraph_graph::{AccountsExport, NodeRecord};
use std::collections::BTreeMap;

/// Every allocation across every account, one row per event.
///
/// When no account carries any allocation, a zero-amount series aligned to
/// the interval ends is returned instead so charts always get a series.
pub(crate) fn build_grain_distribution(
    accounts: &AccountsExport,
    interval_ends: &[DateTime<Utc>],
) -> Result<Vec<GrainEvent>> {
    let mut events = Vec::new();
    for entry in &accounts.accounts {
        for allocation in entry.account.allocation_history.iter().flatten() {
            events.push(GrainEvent {
                timestamp: datetime_from_millis(allocation.cred_timestamp_ms)?,
                amount: allocation.grain_receipt.amount.to_f64(),
            });
        }
    }

    if events.is_empty() {
        events = interval_ends
            .iter()
            .map(|&timestamp| GrainEvent {
                timestamp,
                amount: 0.0,
            })
            .collect();
    }

    Ok(events)
}

/// Column-wise sum of every node's cred series, one point per interval.
pub(crate) fn build_cred_over_time(
    nodes: &[NodeRecord],
    interval_ends: &[DateTime<Utc>],
) -> Vec<TimeSeriesPoint> {
    let mut totals = vec![0.0; interval_ends.len()];
    for node in nodes {
        for (total, cred) in totals.iter_mut().zip(&node.cred_over_time) {
            *total += cred;
        }
    }

    interval_ends
        .iter()
        .zip(totals)
        .map(|(&timestamp, amount)| TimeSeriesPoint { timestamp, amount })
        .collect()
}

/// Grain events summed per timestamp, ascending.
pub(crate) fn group_by_timestamp(events: &[GrainEvent]) -> Vec<TimeSeriesPoint> {
    let mut grouped: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for event in events {
        *grouped.entry(event.timestamp).or_insert(0.0) += event.amount;
    }
    grouped
        .into_iter()
        .map(|(timestamp, amount)| TimeSeriesPoint { timestamp, amount })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        datetime_from_millis(ms).unwrap()
    }

    #[test]
    fn groups_simultaneous_allocations() {
        let events = vec![
            GrainEvent { timestamp: at(2000), amount: 1.0 },
            GrainEvent { timestamp: at(1000), amount: 2.0 },
            GrainEvent { timestamp: at(2000), amount: 0.5 },
        ];
        let grouped = group_by_timestamp(&events);
        assert_eq!(
            grouped,
            vec![
                TimeSeriesPoint { timestamp: at(1000), amount: 2.0 },
                TimeSeriesPoint { timestamp: at(2000), amount: 1.5 },
            ]
        );
    }

    #[test]
    fn empty_history_lists_still_zero_fill() {
        let accounts: AccountsExport = serde_json::from_value(serde_json::json!({
            "accounts": [{"account": {
                "identity": {"id": "a", "name": "a", "subtype": "USER"},
                "active": true, "balance": "0", "paid": "0", "allocationHistory": []
            }}]
        }))
        .unwrap();
        let events = build_grain_distribution(&accounts, &[at(1000), at(2000)]).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.amount == 0.0));
    }
}
