// ABOUTME: CredProjection owns both exports and serves memoized tabular views
// ABOUTME: Each view fills its own write-once slot on first access; failures leave other slots intact
use crate::flow::{build_cred_flow, totals_by_plugin};
use crate::ranking::{build_accounts_table, build_ranking};
use crate::rows::{
    AccountRow, CredFlow, EdgeFlowRow, GrainEvent, NodeFlowRow, PluginFlowTotals,
    ProjectionSummary, RankingRow, TimeSeriesPoint,
};
use crate::series::{build_cred_over_time, build_grain_distribution, group_by_timestamp};
use chrono::{DateTime, Utc};
use credgraph_core::Result;
use credgraph_graph::{AccountsExport, CredResult, GraphAccessor, NodeRecord};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Tabular projection engine over one graph export and one accounts export.
///
/// Views are computed lazily and cached for the lifetime of the value. A
/// cached view never changes, so a `&CredProjection` can be shared across
/// threads; concurrent first accesses to the same view block on a single
/// computation.
pub struct CredProjection {
    graph: GraphAccessor,
    accounts: AccountsExport,
    nodes: OnceCell<Vec<NodeRecord>>,
    accounts_table: OnceCell<Vec<AccountRow>>,
    ranking: OnceCell<Vec<RankingRow>>,
    grain: OnceCell<Vec<GrainEvent>>,
    cred_over_time: OnceCell<Vec<TimeSeriesPoint>>,
    flow: OnceCell<CredFlow>,
}

impl CredProjection {
    pub fn new(cred_result: CredResult, accounts: AccountsExport) -> Self {
        Self {
            graph: GraphAccessor::new(cred_result),
            accounts,
            nodes: OnceCell::new(),
            accounts_table: OnceCell::new(),
            ranking: OnceCell::new(),
            grain: OnceCell::new(),
            cred_over_time: OnceCell::new(),
            flow: OnceCell::new(),
        }
    }

    pub fn graph(&self) -> &GraphAccessor {
        &self.graph
    }

    /// Every graph node as a flat row; the base for the other views.
    pub fn all_nodes_table(&self) -> Result<&[NodeRecord]> {
        self.nodes
            .get_or_try_init(|| -> Result<Vec<NodeRecord>> {
                debug!(nodes = self.graph.total_nodes(), "building node table");
                self.graph.nodes().collect()
            })
            .map(Vec::as_slice)
    }

    pub fn user_nodes(&self) -> Result<Vec<&NodeRecord>> {
        Ok(self
            .all_nodes_table()?
            .iter()
            .filter(|node| node.is_identity())
            .collect())
    }

    /// Cred held by all nodes, identities or not.
    pub fn total_distributed_score(&self) -> Result<f64> {
        Ok(self.all_nodes_table()?.iter().map(|n| n.total_cred).sum())
    }

    pub fn accounts_table(&self) -> &[AccountRow] {
        self.accounts_table.get_or_init(|| {
            debug!(accounts = self.accounts.accounts.len(), "building accounts table");
            build_accounts_table(&self.accounts)
        })
    }

    /// Identity nodes joined with accounts, highest total cred first.
    ///
    /// This is an inner join: identities with no account are left out of the
    /// ranking without any error.
    pub fn ranking(&self) -> Result<&[RankingRow]> {
        self.ranking
            .get_or_try_init(|| -> Result<Vec<RankingRow>> {
                let rows = build_ranking(self.all_nodes_table()?, self.accounts_table());
                debug!(rows = rows.len(), "built ranking");
                Ok(rows)
            })
            .map(Vec::as_slice)
    }

    /// Grain allocation events. Zero-filled on interval ends when the accounts
    /// carry no allocation history at all.
    pub fn grain_distribution(&self) -> Result<&[GrainEvent]> {
        self.grain
            .get_or_try_init(|| -> Result<Vec<GrainEvent>> {
                let interval_ends = self.graph.intervals_as_datetimes()?;
                build_grain_distribution(&self.accounts, &interval_ends)
            })
            .map(Vec::as_slice)
    }

    /// Summed cred of all nodes per interval, keyed by interval end.
    pub fn cred_over_time(&self) -> Result<&[TimeSeriesPoint]> {
        self.cred_over_time
            .get_or_try_init(|| -> Result<Vec<TimeSeriesPoint>> {
                let interval_ends = self.graph.intervals_as_datetimes()?;
                Ok(build_cred_over_time(self.all_nodes_table()?, &interval_ends))
            })
            .map(Vec::as_slice)
    }

    fn flow(&self) -> &CredFlow {
        self.flow.get_or_init(|| {
            debug!(plugins = self.graph.plugins().len(), "building cred flow");
            build_cred_flow(&self.graph)
        })
    }

    /// Per-prefix weight totals: `(nodes, edges)`.
    pub fn cred_flow_from_graph(&self) -> (&[NodeFlowRow], &[EdgeFlowRow]) {
        let flow = self.flow();
        (&flow.nodes, &flow.edges)
    }

    /// Flow totals grouped by owning plugin.
    pub fn flow_by_plugin(&self) -> PluginFlowTotals {
        totals_by_plugin(self.flow())
    }

    pub fn distributed_grain(&self) -> Result<f64> {
        Ok(self.grain_distribution()?.iter().map(|e| e.amount).sum())
    }

    pub fn grain_over_time(&self) -> Result<Vec<TimeSeriesPoint>> {
        Ok(group_by_timestamp(self.grain_distribution()?))
    }

    pub fn top_ranked(&self, n: usize) -> Result<&[RankingRow]> {
        let ranking = self.ranking()?;
        Ok(&ranking[..n.min(ranking.len())])
    }

    /// One-based rank of the participant named `user`.
    pub fn rank_of(&self, user: &str) -> Result<Option<(usize, &RankingRow)>> {
        Ok(self
            .ranking()?
            .iter()
            .enumerate()
            .find(|(_, row)| row.user == user)
            .map(|(i, row)| (i + 1, row)))
    }

    /// Distinct identity names in node order.
    pub fn user_names(&self) -> Result<Vec<&str>> {
        let mut seen = HashSet::new();
        Ok(self
            .all_nodes_table()?
            .iter()
            .filter_map(|node| node.user.as_deref())
            .filter(|name| seen.insert(*name))
            .collect())
    }

    /// First and last interval end, if there are any intervals.
    pub fn date_range(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let ends = self.graph.intervals_as_datetimes()?;
        Ok(ends.first().copied().zip(ends.last().copied()))
    }

    pub fn summary(&self) -> Result<ProjectionSummary> {
        let range = self.date_range()?;
        Ok(ProjectionSummary {
            total_nodes: self.graph.total_nodes(),
            distributed_cred: self.total_distributed_score()?,
            distributed_grain: self.distributed_grain()?,
            ranked_participants: self.ranking()?.len(),
            intervals: self.graph.intervals().len(),
            first_interval_end: range.map(|(first, _)| first),
            last_interval_end: range.map(|(_, last)| last),
        })
    }
}

impl fmt::Debug for CredProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredProjection")
            .field("total_nodes", &self.graph.total_nodes())
            .field("accounts", &self.accounts.accounts.len())
            .field("nodes_cached", &self.nodes.get().is_some())
            .field("ranking_cached", &self.ranking.get().is_some())
            .field("grain_cached", &self.grain.get().is_some())
            .field("cred_over_time_cached", &self.cred_over_time.get().is_some())
            .field("flow_cached", &self.flow.get().is_some())
            .finish()
    }
}
