// ABOUTME: Cred flow breakdown: weight-map totals per declared node/edge type prefix
// ABOUTME: Each row is tagged with the owning plugin through the prefix index
use crate::rows::{
    CredFlow, EdgeFlowRow, NodeFlowRow, PluginEdgeTotal, PluginFlowTotals, PluginNodeTotal,
};
use credgraph_core::PLUGIN_NOT_FOUND;
use credgraph_graph::{
    strip_separator, sum_edge_weights, sum_node_weights, GraphAccessor, PluginPrefixIndex,
};
use std::collections::HashMap;

/// Builds the node and edge flow tables.
///
/// Every declared type prefix gets a row, even when no weight key falls under
/// it. Prefixes that collapse to the same label after stripping share one row:
/// it sits where the label first appeared and carries the sums of the last
/// declaration.
pub(crate) fn build_cred_flow(graph: &GraphAccessor) -> CredFlow {
    let index = PluginPrefixIndex::from_plugins(graph.plugins());
    let owner = |label: &str| index.lookup(label).unwrap_or(PLUGIN_NOT_FOUND).to_string();

    let mut position: HashMap<String, usize> = HashMap::new();
    let mut edges: Vec<EdgeFlowRow> = Vec::new();
    for edge_type in graph.plugins().iter().flat_map(|p| &p.edge_types) {
        let label = strip_separator(&edge_type.prefix);
        let total = sum_edge_weights(graph.edge_weights(), &edge_type.prefix);
        match position.get(&label) {
            Some(&i) => {
                edges[i].backward = total.backwards;
                edges[i].forward = total.forwards;
            }
            None => {
                position.insert(label.clone(), edges.len());
                edges.push(EdgeFlowRow {
                    plugin: owner(&label),
                    prefix: label,
                    backward: total.backwards,
                    forward: total.forwards,
                });
            }
        }
    }

    position.clear();
    let mut nodes: Vec<NodeFlowRow> = Vec::new();
    for node_type in graph.plugins().iter().flat_map(|p| &p.node_types) {
        let label = strip_separator(&node_type.prefix);
        let weight = sum_node_weights(graph.node_weights(), &node_type.prefix);
        match position.get(&label) {
            Some(&i) => nodes[i].weight = weight,
            None => {
                position.insert(label.clone(), nodes.len());
                nodes.push(NodeFlowRow {
                    plugin: owner(&label),
                    prefix: label,
                    weight,
                });
            }
        }
    }

    CredFlow { nodes, edges }
}

/// Groups flow rows by plugin and sums them.
pub(crate) fn totals_by_plugin(flow: &CredFlow) -> PluginFlowTotals {
    let mut nodes: Vec<PluginNodeTotal> = Vec::new();
    for row in &flow.nodes {
        match nodes.iter_mut().find(|t| t.plugin == row.plugin) {
            Some(total) => total.weight += row.weight,
            None => nodes.push(PluginNodeTotal {
                plugin: row.plugin.clone(),
                weight: row.weight,
            }),
        }
    }

    let mut edges: Vec<PluginEdgeTotal> = Vec::new();
    for row in &flow.edges {
        match edges.iter_mut().find(|t| t.plugin == row.plugin) {
            Some(total) => {
                total.backward += row.backward;
                total.forward += row.forward;
            }
            None => edges.push(PluginEdgeTotal {
                plugin: row.plugin.clone(),
                backward: row.backward,
                forward: row.forward,
            }),
        }
    }

    PluginFlowTotals { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credgraph_graph::CredResult;
    use serde_json::json;

    fn graph_with_colliding_prefixes() -> GraphAccessor {
        let header = || json!({"type": "t", "version": "0.1.0"});
        let export = CredResult::from_value(json!([header(), {
            "weightedGraph": [header(), {
                "graphJSON": [header(), {"sortedNodeAddresses": [], "nodes": []}],
                "weightsJSON": [header(), {
                    "nodeWeights": {"N\0a\0x\0": 1.0, "Na\0\0y\0": 4.0},
                    "edgeWeights": {
                        "E\0a\0x\0": {"backwards": 1.0, "forwards": 1.0},
                        "Ea\0\0y\0": {"backwards": 5.0, "forwards": 6.0}
                    }
                }]
            }],
            "credData": {"intervals": [], "nodeSummaries": [], "nodeOverTime": []},
            "plugins": [header(), [{
                "name": "demo",
                "nodePrefix": "N\0a\0",
                "edgePrefix": "E\0a\0",
                "nodeTypes": [
                    {"prefix": "N\0a\0", "defaultWeight": 1.0},
                    {"prefix": "N\0b\0", "defaultWeight": 1.0},
                    {"prefix": "Na\0\0", "defaultWeight": 1.0}
                ],
                "edgeTypes": [
                    {"prefix": "E\0a\0", "defaultWeight": {"backwards": 1.0, "forwards": 1.0}},
                    {"prefix": "Ea\0\0", "defaultWeight": {"backwards": 1.0, "forwards": 1.0}}
                ]
            }]]
        }]))
        .unwrap();
        GraphAccessor::new(export)
    }

    #[test]
    fn colliding_labels_keep_first_position_and_last_sums() {
        let flow = build_cred_flow(&graph_with_colliding_prefixes());

        let labels: Vec<&str> = flow.nodes.iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(labels, vec!["Na", "Nb"]);
        assert_eq!(flow.nodes[0].weight, 4.0);
        assert_eq!(flow.nodes[1].weight, 0.0);

        assert_eq!(flow.edges.len(), 1);
        assert_eq!(flow.edges[0].prefix, "Ea");
        assert_eq!((flow.edges[0].backward, flow.edges[0].forward), (5.0, 6.0));
        assert_eq!(flow.edges[0].plugin, "demo");
    }
}
