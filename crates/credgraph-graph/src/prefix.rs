// ABOUTME: Prefix routing between serialized addresses and the plugins that own them
// ABOUTME: Sorted-prefix longest-match lookup plus ordered range scans over weight maps
use crate::export::{EdgeWeight, PluginDeclaration};
use credgraph_core::ADDRESS_SEPARATOR;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Removes the NUL separators from a serialized address or prefix.
pub fn strip_separator(prefix: &str) -> String {
    prefix.replace(ADDRESS_SEPARATOR, "")
}

/// Maps stripped plugin node/edge prefixes to plugin names.
///
/// Entries are kept sorted so a lookup is a handful of binary searches
/// instead of a scan over every declared prefix. When several prefixes
/// match, the longest wins.
#[derive(Debug, Clone, Default)]
pub struct PluginPrefixIndex {
    entries: Vec<(String, String)>,
}

impl PluginPrefixIndex {
    pub fn from_plugins(plugins: &[PluginDeclaration]) -> Self {
        let mut by_prefix = BTreeMap::new();
        for plugin in plugins {
            by_prefix.insert(strip_separator(&plugin.node_prefix), plugin.name.clone());
        }
        for plugin in plugins {
            by_prefix.insert(strip_separator(&plugin.edge_prefix), plugin.name.clone());
        }
        Self {
            entries: by_prefix.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plugin owning the longest declared prefix of `label`.
    pub fn lookup(&self, label: &str) -> Option<&str> {
        let mut head = label;
        loop {
            // Largest entry that sorts at or before the head.
            let idx = self
                .entries
                .partition_point(|(prefix, _)| prefix.as_str() <= head);
            if idx == 0 {
                return None;
            }
            let (prefix, plugin) = &self.entries[idx - 1];
            if head.starts_with(prefix.as_str()) {
                return Some(plugin.as_str());
            }
            // No prefix of `head` longer than the common part can sort between
            // this entry and `head`, so retry with the common part.
            let shared = common_prefix_len(prefix, head);
            if shared >= head.len() {
                return None;
            }
            head = &head[..shared];
        }
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()))
}

/// Entries of an ordered weight map whose key starts with `prefix`.
pub fn prefix_range<'a, V>(
    map: &'a BTreeMap<String, V>,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a String, &'a V)> + 'a {
    map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(move |(key, _)| key.starts_with(prefix))
}

/// Total node weight under `prefix`; zero when nothing matches.
pub fn sum_node_weights(weights: &BTreeMap<String, f64>, prefix: &str) -> f64 {
    prefix_range(weights, prefix).map(|(_, w)| *w).sum()
}

/// Total backward and forward edge weight under `prefix`.
pub fn sum_edge_weights(weights: &BTreeMap<String, EdgeWeight>, prefix: &str) -> EdgeWeight {
    prefix_range(weights, prefix).fold(EdgeWeight::default(), |acc, (_, w)| EdgeWeight {
        backwards: acc.backwards + w.backwards,
        forwards: acc.forwards + w.forwards,
    })
}
