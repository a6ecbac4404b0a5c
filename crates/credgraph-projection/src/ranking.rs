// ABOUTME: Joins identity nodes with accounts and orders them by total cred
// ABOUTME: Identities without an account are dropped from the ranking on purpose
use crate::rows::{AccountRow, RankingRow};
use credgraph_graph::{AccountsExport, NodeRecord};
use std::collections::HashMap;

pub(crate) fn build_accounts_table(accounts: &AccountsExport) -> Vec<AccountRow> {
    accounts
        .accounts
        .iter()
        .map(|entry| {
            let account = &entry.account;
            AccountRow {
                id: account.identity.id.clone(),
                name: account.identity.name.clone(),
                subtype: account.identity.subtype.clone(),
                active: account.active,
                balance: account.balance.to_f64(),
                paid: account.paid.to_f64(),
            }
        })
        .collect()
}

/// Share of `score` in `total`, as a percentage. Zero when nothing was
/// distributed.
pub(crate) fn cred_share(score: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        score / total * 100.0
    }
}

/// Inner join of identity nodes and accounts on identity id.
///
/// Rows follow account order before the sort; the sort is stable so equal
/// scores keep that order. Shares are taken against the identity-only total,
/// computed before the join, so dropped identities still count toward it.
pub(crate) fn build_ranking(nodes: &[NodeRecord], accounts: &[AccountRow]) -> Vec<RankingRow> {
    let identities: Vec<&NodeRecord> = nodes.iter().filter(|n| n.is_identity()).collect();
    let identity_total: f64 = identities.iter().map(|n| n.total_cred).sum();

    let mut by_id: HashMap<&str, Vec<&NodeRecord>> = HashMap::new();
    for node in &identities {
        by_id.entry(node.id.as_str()).or_default().push(node);
    }

    let mut rows: Vec<RankingRow> = accounts
        .iter()
        .flat_map(|account| {
            by_id
                .get(account.id.as_str())
                .into_iter()
                .flatten()
                .map(move |node| RankingRow {
                    id: account.id.clone(),
                    user: account.name.clone(),
                    account_type: account.subtype.clone(),
                    active: account.active,
                    grain_balance: account.balance,
                    grain_paid: account.paid,
                    total_cred: node.total_cred,
                    cred_over_time: node.cred_over_time.clone(),
                    cred_share: cred_share(node.total_cred, identity_total),
                })
        })
        .collect();

    rows.sort_by(|a, b| b.total_cred.total_cmp(&a.total_cred));
    rows
}
