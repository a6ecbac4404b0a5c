use crate::export::{CredResult, EdgeWeight, Interval, NodeAddress, PluginDeclaration};
use chrono::{DateTime, Utc};
use credgraph_core::{datetime_from_millis, CredGraphError, Result, IDENTITY_NODE_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One graph node joined from the address list, node entries and cred data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// `owner/source`, e.g. `sourcecred/discourse`
    pub source: String,
    pub node_type: String,
    pub id: String,
    pub total_cred: f64,
    pub cred_over_time: Vec<f64>,
    pub description: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Display name, only for identity nodes
    pub user: Option<String>,
}

impl NodeRecord {
    pub fn is_identity(&self) -> bool {
        self.node_type == IDENTITY_NODE_TYPE
    }
}

/// Node-level random access over a validated graph export.
#[derive(Debug, Clone)]
pub struct GraphAccessor {
    export: CredResult,
}

impl GraphAccessor {
    pub fn new(export: CredResult) -> Self {
        debug!(
            nodes = export.cred_data.node_summaries.len(),
            intervals = export.cred_data.intervals.len(),
            plugins = export.plugins.len(),
            "indexed graph export"
        );
        Self { export }
    }

    pub fn export(&self) -> &CredResult {
        &self.export
    }

    /// Canonical node count; every node-indexed array has this length.
    pub fn total_nodes(&self) -> usize {
        self.export.cred_data.node_summaries.len()
    }

    pub fn node(&self, i: usize) -> Result<NodeRecord> {
        let total = self.total_nodes();
        let out_of_range = || CredGraphError::NodeOutOfRange { index: i, total };

        let address = self
            .export
            .graph
            .sorted_node_addresses
            .get(i)
            .ok_or_else(out_of_range)?;
        let entry = self.export.graph.nodes.get(i).ok_or_else(out_of_range)?;
        let summary = self
            .export
            .cred_data
            .node_summaries
            .get(i)
            .ok_or_else(out_of_range)?;
        let cred_over_time = match self.export.cred_data.node_over_time.get(i) {
            Some(Some(series)) => series.cred.clone(),
            Some(None) => Vec::new(),
            None => return Err(out_of_range()),
        };
        let (Some(owner), Some(source), Some(node_type), Some(id)) =
            (address.owner(), address.source(), address.node_type(), address.id())
        else {
            return Err(CredGraphError::Schema(format!(
                "node address {} has {} parts, expected at least {}",
                i,
                address.0.len(),
                NodeAddress::MIN_PARTS
            )));
        };
        let timestamp = entry.timestamp_ms.map(datetime_from_millis).transpose()?;
        let user = (node_type == IDENTITY_NODE_TYPE).then(|| entry.description.clone());

        Ok(NodeRecord {
            source: format!("{}/{}", owner, source),
            node_type: node_type.to_string(),
            id: id.to_string(),
            total_cred: summary.cred,
            cred_over_time,
            description: entry.description.clone(),
            timestamp,
            user,
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = Result<NodeRecord>> + '_ {
        (0..self.total_nodes()).map(move |i| self.node(i))
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.export.cred_data.intervals
    }

    /// One timestamp per interval: its end boundary.
    pub fn intervals_as_datetimes(&self) -> Result<Vec<DateTime<Utc>>> {
        self.intervals()
            .iter()
            .map(|interval| datetime_from_millis(interval.end_time_ms))
            .collect()
    }

    pub fn plugins(&self) -> &[PluginDeclaration] {
        &self.export.plugins
    }

    pub fn node_weights(&self) -> &BTreeMap<String, f64> {
        &self.export.weights.node_weights
    }

    pub fn edge_weights(&self) -> &BTreeMap<String, EdgeWeight> {
        &self.export.weights.edge_weights
    }
}
