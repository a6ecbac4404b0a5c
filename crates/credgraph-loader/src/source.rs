use crate::fetch::{fetch, read_json_file};
use credgraph_core::{CredGraphError, Result, SourceConfig};
use credgraph_graph::{AccountsExport, CredResult};
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Remote location of an export and where its cached copy lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLocation {
    pub uri: String,
    pub cache_path: PathBuf,
}

impl ExportLocation {
    fn resolve(base_uri: &str, path: &str, cache_dir: &Path) -> Self {
        let uri = format!(
            "{}/{}",
            base_uri.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let file_name = Path::new(path)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(path));
        Self {
            uri,
            cache_path: cache_dir.join(file_name),
        }
    }
}

/// The two undecoded exports a dashboard session works from.
#[derive(Debug, Clone)]
pub struct RawExports {
    pub cred_result: Value,
    pub accounts: Value,
}

impl RawExports {
    /// Decodes and validates both documents.
    pub fn decode(self) -> Result<(CredResult, AccountsExport)> {
        let cred_result = CredResult::from_value(self.cred_result)?;
        let accounts = AccountsExport::from_value(self.accounts)?;
        Ok((cred_result, accounts))
    }
}

/// Where the graph export and the accounts export are loaded from.
#[derive(Debug, Clone)]
pub struct DataSource {
    client: Client,
    pub cred_result: ExportLocation,
    pub accounts: ExportLocation,
    pub use_cache: bool,
}

impl DataSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("credgraph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CredGraphError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Same as [`DataSource::from_config`] with a caller-supplied client.
    pub fn with_client(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            cred_result: ExportLocation::resolve(
                &config.base_uri,
                &config.cred_result_path,
                &config.cache_dir,
            ),
            accounts: ExportLocation::resolve(
                &config.base_uri,
                &config.accounts_path,
                &config.cache_dir,
            ),
            use_cache: config.use_cache,
        }
    }

    /// Fetches both exports. `None` when either one yielded no data, in which
    /// case nothing downstream should be rendered.
    pub async fn load(&self) -> Result<Option<RawExports>> {
        let Some(cred_result) = fetch(
            &self.client,
            &self.cred_result.uri,
            &self.cred_result.cache_path,
            self.use_cache,
        )
        .await?
        else {
            warn!(uri = %self.cred_result.uri, "graph export unavailable");
            return Ok(None);
        };

        let Some(accounts) = fetch(
            &self.client,
            &self.accounts.uri,
            &self.accounts.cache_path,
            self.use_cache,
        )
        .await?
        else {
            warn!(uri = %self.accounts.uri, "accounts export unavailable");
            return Ok(None);
        };

        info!("loaded graph and accounts exports");
        Ok(Some(RawExports {
            cred_result,
            accounts,
        }))
    }
}

/// Reads both exports from local files, bypassing the network entirely.
pub async fn load_local(cred_result: &Path, accounts: &Path) -> Result<RawExports> {
    Ok(RawExports {
        cred_result: read_json_file(cred_result).await?,
        accounts: read_json_file(accounts).await?,
    })
}
