// ABOUTME: Typed records for the TimelineCred graph export and the accounts export
// ABOUTME: Decoding validates array alignment up front so accessors can index freely
use credgraph_core::{CredGraphError, GrainAmount, Result, TimestampMs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `{"type": ..., "version": ...}` header carried by every versioned object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionHeader {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub version: String,
}

/// Versioned objects serialize as a two-element `[header, payload]` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioned<T>(pub VersionHeader, pub T);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCredResult(VersionHeader, RawCredResultBody);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCredResultBody {
    weighted_graph: Versioned<RawWeightedGraph>,
    cred_data: CredData,
    plugins: Versioned<Vec<PluginDeclaration>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawWeightedGraph {
    #[serde(rename = "graphJSON")]
    graph: Versioned<GraphJson>,
    #[serde(rename = "weightsJSON")]
    weights: Versioned<WeightsJson>,
}

/// Decoded graph export with the envelopes peeled off.
#[derive(Debug, Clone)]
pub struct CredResult {
    pub header: VersionHeader,
    pub graph: GraphJson,
    pub weights: WeightsJson,
    pub cred_data: CredData,
    pub plugins: Vec<PluginDeclaration>,
}

impl CredResult {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Self::from_raw(serde_json::from_value(value)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_raw(serde_json::from_slice(bytes)?)
    }

    fn from_raw(raw: RawCredResult) -> Result<Self> {
        let RawCredResult(header, body) = raw;
        let Versioned(_, weighted_graph) = body.weighted_graph;
        let result = Self {
            header,
            graph: weighted_graph.graph.1,
            weights: weighted_graph.weights.1,
            cred_data: body.cred_data,
            plugins: body.plugins.1,
        };
        result.validate()?;
        Ok(result)
    }

    /// Rejects exports whose node-indexed arrays disagree in length or whose
    /// per-node series do not cover every interval.
    pub fn validate(&self) -> Result<()> {
        let total = self.cred_data.node_summaries.len();
        check_len("graphJSON.sortedNodeAddresses", total, self.graph.sorted_node_addresses.len())?;
        check_len("graphJSON.nodes", total, self.graph.nodes.len())?;
        check_len("credData.nodeOverTime", total, self.cred_data.node_over_time.len())?;

        for (i, address) in self.graph.sorted_node_addresses.iter().enumerate() {
            if address.0.len() < NodeAddress::MIN_PARTS {
                return Err(CredGraphError::Schema(format!(
                    "node address {} has {} parts, expected at least {}",
                    i,
                    address.0.len(),
                    NodeAddress::MIN_PARTS
                )));
            }
        }

        let intervals = self.cred_data.intervals.len();
        for (i, series) in self.cred_data.node_over_time.iter().enumerate() {
            if let Some(series) = series {
                check_len(&format!("credData.nodeOverTime[{}].cred", i), intervals, series.cred.len())?;
            }
        }

        Ok(())
    }
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(CredGraphError::LengthMismatch {
            what: what.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphJson {
    pub sorted_node_addresses: Vec<NodeAddress>,
    pub nodes: Vec<NodeEntry>,
}

/// Address parts of a node: owner, source, node type, id (plus any tail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(pub Vec<String>);

impl NodeAddress {
    pub const MIN_PARTS: usize = 4;

    pub fn part(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(String::as_str)
    }

    pub fn owner(&self) -> Option<&str> {
        self.part(0)
    }

    pub fn source(&self) -> Option<&str> {
        self.part(1)
    }

    pub fn node_type(&self) -> Option<&str> {
        self.part(2)
    }

    pub fn id(&self) -> Option<&str> {
        self.part(3)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamp_ms: Option<TimestampMs>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightsJson {
    #[serde(default)]
    pub node_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub edge_weights: BTreeMap<String, EdgeWeight>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeight {
    pub backwards: f64,
    pub forwards: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredData {
    pub intervals: Vec<Interval>,
    pub node_summaries: Vec<NodeSummary>,
    pub node_over_time: Vec<Option<NodeOverTime>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub start_time_ms: TimestampMs,
    pub end_time_ms: TimestampMs,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeSummary {
    pub cred: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeOverTime {
    pub cred: Vec<f64>,
}

/// A plugin's namespace declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDeclaration {
    pub name: String,
    pub node_prefix: String,
    pub edge_prefix: String,
    pub node_types: Vec<NodeTypeDecl>,
    pub edge_types: Vec<EdgeTypeDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeDecl {
    #[serde(default)]
    pub name: String,
    pub prefix: String,
    pub default_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTypeDecl {
    #[serde(default)]
    pub forward_name: String,
    #[serde(default)]
    pub backward_name: String,
    pub prefix: String,
    pub default_weight: EdgeWeight,
}

/// The accounts export (`accounts.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsExport {
    pub accounts: Vec<AccountEntry>,
}

impl AccountsExport {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEntry {
    pub account: Account,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub identity: Identity,
    pub active: bool,
    pub balance: GrainAmount,
    pub paid: GrainAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation_history: Option<Vec<Allocation>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub subtype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub cred_timestamp_ms: TimestampMs,
    pub grain_receipt: GrainReceipt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrainReceipt {
    pub amount: GrainAmount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header(kind: &str) -> serde_json::Value {
        json!({"type": kind, "version": "0.1.0"})
    }

    fn export(over_time: serde_json::Value) -> serde_json::Value {
        json!([header("sourcecred/credResult"), {
            "weightedGraph": [header("sourcecred/weightedGraph"), {
                "graphJSON": [header("sourcecred/graph"), {
                    "sortedNodeAddresses": [["sourcecred", "discourse", "IDENTITY", "abc"]],
                    "nodes": [{"description": "alice", "timestampMs": null, "index": 0}],
                    "edges": []
                }],
                "weightsJSON": [header("sourcecred/weights"), {
                    "nodeWeights": {"N\0sourcecred\0discourse\0": 2.0},
                    "edgeWeights": {}
                }]
            }],
            "credData": {
                "intervals": [{"startTimeMs": 0, "endTimeMs": 1000}, {"startTimeMs": 1000, "endTimeMs": 2000}],
                "nodeSummaries": [{"cred": 5.0}],
                "nodeOverTime": [over_time]
            },
            "plugins": [header("sourcecred/plugins"), []]
        }])
    }

    #[test]
    fn decodes_envelopes() {
        let result = CredResult::from_value(export(json!({"cred": [2.0, 3.0]}))).unwrap();
        assert_eq!(result.header.kind, "sourcecred/credResult");
        assert_eq!(result.graph.sorted_node_addresses[0].node_type(), Some("IDENTITY"));
        assert_eq!(result.graph.nodes[0].timestamp_ms, None);
        assert_eq!(result.weights.node_weights.len(), 1);
        assert_eq!(result.cred_data.intervals[1].end_time_ms, 2000);
    }

    #[test]
    fn accepts_null_series() {
        let result = CredResult::from_value(export(serde_json::Value::Null)).unwrap();
        assert!(result.cred_data.node_over_time[0].is_none());
    }

    #[test]
    fn rejects_series_not_covering_intervals() {
        let err = CredResult::from_value(export(json!({"cred": [2.0]}))).unwrap_err();
        assert!(matches!(
            err,
            CredGraphError::LengthMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn rejects_misaligned_node_arrays() {
        let mut value = export(json!({"cred": [2.0, 3.0]}));
        value[1]["credData"]["nodeSummaries"] = json!([{"cred": 5.0}, {"cred": 1.0}]);
        let err = CredResult::from_value(value).unwrap_err();
        assert!(matches!(err, CredGraphError::LengthMismatch { .. }));
    }

    #[test]
    fn rejects_short_addresses() {
        let mut value = export(json!({"cred": [2.0, 3.0]}));
        value[1]["weightedGraph"][1]["graphJSON"][1]["sortedNodeAddresses"] =
            json!([["sourcecred", "discourse", "IDENTITY"]]);
        let err = CredResult::from_value(value).unwrap_err();
        assert!(matches!(err, CredGraphError::Schema(_)));
    }

    #[test]
    fn rejects_missing_keys() {
        let mut value = export(json!({"cred": [2.0, 3.0]}));
        value[1]
            .as_object_mut()
            .unwrap()
            .remove("credData");
        assert!(matches!(
            CredResult::from_value(value),
            Err(CredGraphError::Serialization(_))
        ));
    }

    #[test]
    fn decodes_accounts_with_optional_history() {
        let accounts = AccountsExport::from_value(json!({
            "accounts": [
                {"account": {
                    "identity": {"id": "id-1", "name": "alice", "subtype": "USER", "address": "x"},
                    "active": true,
                    "balance": "2500000000000000000",
                    "paid": "0",
                    "allocationHistory": [
                        {"credTimestampMs": 1000, "grainReceipt": {"amount": "1000000000000000000"}}
                    ]
                }, "cred": [1.0], "totalCred": 1.0},
                {"account": {
                    "identity": {"id": "id-2", "name": "org", "subtype": "ORGANIZATION"},
                    "active": false,
                    "balance": "0",
                    "paid": "0"
                }}
            ],
            "unclaimedAliases": []
        }))
        .unwrap();

        assert_eq!(accounts.accounts.len(), 2);
        let first = &accounts.accounts[0].account;
        assert_eq!(first.balance.to_f64(), 2.5);
        assert_eq!(first.allocation_history.as_ref().map(Vec::len), Some(1));
        assert!(accounts.accounts[1].account.allocation_history.is_none());
    }

    #[test]
    fn rejects_malformed_balance() {
        let result = AccountsExport::from_value(json!({
            "accounts": [{"account": {
                "identity": {"id": "id-1", "name": "alice", "subtype": "USER"},
                "active": true, "balance": "lots", "paid": "0"
            }}]
        }));
        assert!(result.is_err());
    }
}
