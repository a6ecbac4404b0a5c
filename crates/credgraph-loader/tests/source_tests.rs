// ABOUTME: Exercises DataSource::load against a local responder that routes by export path.
// ABOUTME: Also covers local file loading and decode of the raw documents.

use credgraph_core::SourceConfig;
use credgraph_loader::{load_local, DataSource, RawExports};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const CRED_RESULT_BODY: &str = r#"[{"type": "sourcecred/credResult", "version": "0.1.0"}, {}]"#;

struct Hits {
    cred_result: AtomicUsize,
    accounts: AtomicUsize,
}

fn response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

/// Serves the graph export with `cred_status` and answers the accounts path
/// with `accounts_status`, counting requests per path.
async fn serve(cred_status: &'static str, accounts_status: &'static str) -> (String, Arc<Hits>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(Hits {
        cred_result: AtomicUsize::new(0),
        accounts: AtomicUsize::new(0),
    });
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]);
            let reply = if request.starts_with("GET /output/credResult.json") {
                counter.cred_result.fetch_add(1, Ordering::SeqCst);
                response(cred_status, CRED_RESULT_BODY)
            } else {
                counter.accounts.fetch_add(1, Ordering::SeqCst);
                response(accounts_status, r#"{"accounts": []}"#)
            };
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), hits)
}

fn source(base_uri: String, cache_dir: &std::path::Path) -> DataSource {
    let config = SourceConfig {
        base_uri,
        cache_dir: cache_dir.to_path_buf(),
        use_cache: false,
        ..SourceConfig::default()
    };
    DataSource::with_client(Client::builder().no_proxy().build().unwrap(), &config)
}

fn header(kind: &str) -> Value {
    json!({"type": kind, "version": "0.1.0"})
}

fn cred_result_fixture() -> Value {
    json!([header("sourcecred/credResult"), {
        "weightedGraph": [header("sourcecred/weightedGraph"), {
            "graphJSON": [header("sourcecred/graph"), {
                "sortedNodeAddresses": [["sourcecred", "discourse", "IDENTITY", "alice-id"]],
                "nodes": [{"description": "alice", "timestampMs": null}]
            }],
            "weightsJSON": [header("sourcecred/weights"), {"nodeWeights": {}, "edgeWeights": {}}]
        }],
        "credData": {
            "intervals": [{"startTimeMs": 0, "endTimeMs": 1000}],
            "nodeSummaries": [{"cred": 3.0}],
            "nodeOverTime": [{"cred": [3.0]}]
        },
        "plugins": [header("sourcecred/plugins"), []]
    }])
}

fn accounts_fixture() -> Value {
    json!({"accounts": [{"account": {
        "identity": {"id": "alice-id", "name": "alice", "subtype": "USER"},
        "active": true,
        "balance": "2500000000000000000",
        "paid": "0"
    }}]})
}

#[tokio::test]
async fn missing_accounts_export_yields_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let (base, hits) = serve("200 OK", "404 Not Found").await;

    let loaded = source(base, dir.path()).load().await.unwrap();

    assert!(loaded.is_none());
    assert_eq!(hits.cred_result.load(Ordering::SeqCst), 1);
    assert_eq!(hits.accounts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_graph_export_stops_before_accounts() {
    let dir = tempfile::tempdir().unwrap();
    let (base, hits) = serve("500 Internal Server Error", "200 OK").await;

    let loaded = source(base, dir.path()).load().await.unwrap();

    assert!(loaded.is_none());
    assert_eq!(hits.accounts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn both_exports_present_are_returned_raw() {
    let dir = tempfile::tempdir().unwrap();
    let (base, _hits) = serve("200 OK", "200 OK").await;

    let loaded = source(base, dir.path()).load().await.unwrap().unwrap();

    assert_eq!(loaded.accounts, json!({"accounts": []}));
    assert!(loaded.cred_result.is_array());
}

#[tokio::test]
async fn local_files_load_and_decode() {
    let dir = tempfile::tempdir().unwrap();
    let cred_path = dir.path().join("credResult.json");
    let accounts_path = dir.path().join("accounts.json");
    std::fs::write(&cred_path, cred_result_fixture().to_string()).unwrap();
    std::fs::write(&accounts_path, accounts_fixture().to_string()).unwrap();

    let raw = load_local(&cred_path, &accounts_path).await.unwrap();
    assert_eq!(raw.accounts, accounts_fixture());

    let (cred_result, accounts) = raw.decode().unwrap();
    assert_eq!(cred_result.cred_data.node_summaries.len(), 1);
    assert_eq!(cred_result.graph.sorted_node_addresses[0].id(), Some("alice-id"));
    assert_eq!(accounts.accounts[0].account.identity.name, "alice");
    assert_eq!(accounts.accounts[0].account.balance.to_f64(), 2.5);
}

#[tokio::test]
async fn malformed_accounts_document_fails_decode() {
    let raw = RawExports {
        cred_result: cred_result_fixture(),
        accounts: json!({"accounts": [{"account": {"identity": {"id": "x"}}}]}),
    };
    assert!(raw.decode().is_err());

    let bad_balance = RawExports {
        cred_result: cred_result_fixture(),
        accounts: json!({"accounts": [{"account": {
            "identity": {"id": "x", "name": "x", "subtype": "USER"},
            "active": true, "balance": "lots", "paid": "0"
        }}]}),
    };
    assert!(bad_balance.decode().is_err());
}

#[tokio::test]
async fn missing_local_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_local(&dir.path().join("absent.json"), &dir.path().join("also.json")).await;
    assert!(result.is_err());
}
