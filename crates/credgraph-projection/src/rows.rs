use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One account from the accounts export with grain amounts decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRow {
    pub id: String,
    pub name: String,
    pub subtype: String,
    pub active: bool,
    pub balance: f64,
    pub paid: f64,
}

/// An identity node joined with its account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRow {
    pub id: String,
    pub user: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub active: bool,
    pub grain_balance: f64,
    pub grain_paid: f64,
    pub total_cred: f64,
    pub cred_over_time: Vec<f64>,
    /// Percentage of the cred held by all identity nodes
    pub cred_share: f64,
}

/// A single grain allocation (or a zero placeholder on an interval end).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrainEvent {
    #[serde(rename = "credTimestampMs")]
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
}

/// One value on the interval time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(rename = "credTimestampMs")]
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
}

/// Summed node weight under one declared node-type prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFlowRow {
    pub prefix: String,
    pub weight: f64,
    pub plugin: String,
}

/// Summed edge weights under one declared edge-type prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeFlowRow {
    pub prefix: String,
    pub backward: f64,
    pub forward: f64,
    pub plugin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredFlow {
    pub nodes: Vec<NodeFlowRow>,
    pub edges: Vec<EdgeFlowRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginNodeTotal {
    pub plugin: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEdgeTotal {
    pub plugin: String,
    pub backward: f64,
    pub forward: f64,
}

/// Flow rows grouped by plugin, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginFlowTotals {
    pub nodes: Vec<PluginNodeTotal>,
    pub edges: Vec<PluginEdgeTotal>,
}

/// Headline numbers for a loaded snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_nodes: usize,
    pub distributed_cred: f64,
    pub distributed_grain: f64,
    pub ranked_participants: usize,
    pub intervals: usize,
    pub first_interval_end: Option<DateTime<Utc>>,
    pub last_interval_end: Option<DateTime<Utc>>,
}

impl fmt::Display for ProjectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<CredProjection - ({} nodes & {} distributed CRED)>",
            self.total_nodes, self.distributed_cred
        )
    }
}
