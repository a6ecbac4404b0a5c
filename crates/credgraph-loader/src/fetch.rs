// ABOUTME: Single-attempt JSON fetch with an optional verbatim on-disk cache
// ABOUTME: Non-success HTTP status is logged and reported as "no data", not as an error
use credgraph_core::{CredGraphError, Result};
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// Fetches a JSON document, serving it from `local_path` when caching is on
/// and the file exists.
///
/// Returns `Ok(None)` when the server answers with a non-success status; the
/// caller must treat that as "no data available". Transport failures and
/// unparseable bodies are errors. One attempt per call, no retries.
pub async fn fetch(
    client: &Client,
    uri: &str,
    local_path: &Path,
    use_cache: bool,
) -> Result<Option<Value>> {
    if use_cache && tokio::fs::try_exists(local_path).await? {
        debug!(path = %local_path.display(), "serving export from cache");
        return read_json_file(local_path).await.map(Some);
    }

    info!(uri, "fetching export");
    let response = client
        .get(uri)
        .send()
        .await
        .map_err(|e| CredGraphError::Network(format!("GET {} failed: {}", uri, e)))?;

    let status = response.status();
    if !status.is_success() {
        warn!(
            uri,
            status = status.as_u16(),
            reason = status.canonical_reason().unwrap_or("unknown"),
            "error while trying to fetch data"
        );
        return Ok(None);
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| CredGraphError::Network(format!("reading body of {} failed: {}", uri, e)))?;
    let value: Value = serde_json::from_slice(&body)?;

    if use_cache {
        write_json_file(local_path, &value).await?;
        debug!(path = %local_path.display(), "cached export");
    }

    Ok(Some(value))
}

/// Reads and parses a JSON file.
pub async fn read_json_file(path: &Path) -> Result<Value> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_json_file(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, serde_json::to_vec(value)?).await?;
    Ok(())
}
