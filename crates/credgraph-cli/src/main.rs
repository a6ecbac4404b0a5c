use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use credgraph_core::{init_tracing, ConfigManager, CredGraphConfig};
use credgraph_loader::{load_local, DataSource, RawExports};
use credgraph_projection::CredProjection;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::info;

#[derive(Parser)]
#[command(name = "credgraph")]
#[command(about = "CredGraph CLI - Cred and grain dashboards over SourceCred exports", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty, table)
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Configuration file (defaults to ./.credgraph.toml, then ~/.credgraph/config.toml)
    #[arg(short, long, global = true, env = "CREDGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Always download, ignoring and leaving the local cache untouched
    #[arg(long, global = true)]
    no_cache: bool,

    /// Read the graph export from a local file instead of the instance
    #[arg(long, global = true, requires = "accounts")]
    cred_result: Option<PathBuf>,

    /// Read the accounts export from a local file instead of the instance
    #[arg(long, global = true, requires = "cred_result")]
    accounts: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline numbers for the loaded snapshot
    Summary,

    /// Participants ordered by total cred
    Ranking {
        /// Number of rows to show (defaults to dashboard.top_n)
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Rank and cred of a single participant
    User {
        /// Participant name as shown in the ranking
        name: String,
    },

    /// Names of every identity in the graph
    Users,

    /// Accounts with decoded grain balances
    Accounts,

    /// Summed cred of all nodes per interval
    CredOverTime,

    /// Grain allocation events
    Grain {
        /// Sum simultaneous allocations into one point per timestamp
        #[arg(long)]
        by_time: bool,
    },

    /// Weight totals per declared node and edge type
    Flow {
        /// Group the totals by owning plugin
        #[arg(long)]
        by_plugin: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = ".credgraph.toml")]
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct UserResult<'a> {
    rank: usize,
    user: &'a str,
    total_cred: f64,
    cred_share: f64,
    grain_balance: f64,
    grain_paid: f64,
    active: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { path } = &cli.command {
        ConfigManager::create_default_config(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} {}", "Wrote".green().bold(), path.display());
        return Ok(());
    }

    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;
    let mut config = manager.config().clone();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.no_cache {
        config.source.use_cache = false;
    }
    init_tracing(&config.logging);
    manager.log_summary();

    let Some(exports) = load_exports(&cli, &config).await? else {
        eprintln!(
            "{} no data available from {}",
            "Error:".red().bold(),
            config.source.base_uri
        );
        std::process::exit(1);
    };
    let (cred_result, accounts) = exports.decode().context("Failed to decode exports")?;
    let projection = CredProjection::new(cred_result, accounts);

    match execute_command(&cli, &config, &projection) {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn load_exports(cli: &Cli, config: &CredGraphConfig) -> Result<Option<RawExports>> {
    if let (Some(cred_result), Some(accounts)) = (&cli.cred_result, &cli.accounts) {
        info!(cred_result = %cred_result.display(), accounts = %accounts.display(), "reading local exports");
        let exports = load_local(cred_result, accounts)
            .await
            .context("Failed to read local exports")?;
        return Ok(Some(exports));
    }

    let source = DataSource::from_config(&config.source).context("Failed to build data source")?;
    source.load().await.context("Failed to load exports")
}

fn execute_command(
    cli: &Cli,
    config: &CredGraphConfig,
    projection: &CredProjection,
) -> Result<Value> {
    let value = match &cli.command {
        Commands::Summary => serde_json::to_value(projection.summary()?)?,
        Commands::Ranking { top } => {
            let n = top.unwrap_or(config.dashboard.top_n);
            serde_json::to_value(projection.top_ranked(n)?)?
        }
        Commands::User { name } => {
            let Some((rank, row)) = projection.rank_of(name)? else {
                bail!("no ranked participant named '{}'", name);
            };
            serde_json::to_value(UserResult {
                rank,
                user: &row.user,
                total_cred: row.total_cred,
                cred_share: row.cred_share,
                grain_balance: row.grain_balance,
                grain_paid: row.grain_paid,
                active: row.active,
            })?
        }
        Commands::Users => serde_json::to_value(projection.user_names()?)?,
        Commands::Accounts => serde_json::to_value(projection.accounts_table())?,
        Commands::CredOverTime => serde_json::to_value(projection.cred_over_time()?)?,
        Commands::Grain { by_time } => {
            if *by_time {
                serde_json::to_value(projection.grain_over_time()?)?
            } else {
                serde_json::to_value(projection.grain_distribution()?)?
            }
        }
        Commands::Flow { by_plugin } => {
            if *by_plugin {
                serde_json::to_value(projection.flow_by_plugin())?
            } else {
                let (nodes, edges) = projection.cred_flow_from_graph();
                serde_json::json!({ "nodes": nodes, "edges": edges })
            }
        }
        Commands::InitConfig { .. } => bail!("init-config does not read exports"),
    };
    Ok(value)
}

fn print_output(format: &OutputFormat, value: &Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value)?;
        }
        OutputFormat::Table => {
            print_table(value)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    Value::String(s) => {
                        println!("{}: {}", key_colored, s.green());
                    }
                    Value::Number(_) => {
                        println!("{}: {}", key_colored, cell(val).yellow());
                    }
                    Value::Bool(b) => {
                        let val_colored = if *b { "true".green() } else { "false".red() };
                        println!("{}: {}", key_colored, val_colored);
                    }
                    _ => {
                        println!("{}: {}", key_colored, val);
                    }
                }
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("\n{}{}:", "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item)?;
            }
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}

fn print_table(value: &Value) -> Result<()> {
    match value {
        // Flow output: one table per section.
        Value::Object(map) if map.values().all(Value::is_array) => {
            for (section, rows) in map {
                println!("{}", section.cyan().bold());
                println!("{}", render_table(rows));
            }
        }
        Value::Array(_) => println!("{}", render_table(value)),
        Value::Object(_) => println!("{}", render_table(&Value::Array(vec![value.clone()]))),
        _ => print_pretty(value)?,
    }
    Ok(())
}

/// Renders an array of objects (or scalars) as a table, one column per key
/// of the first row.
fn render_table(rows: &Value) -> String {
    let rows = match rows {
        Value::Array(rows) => rows.as_slice(),
        other => std::slice::from_ref(other),
    };
    let mut builder = Builder::default();

    match rows.first() {
        Some(Value::Object(first)) => {
            let columns: Vec<String> = first.keys().cloned().collect();
            builder.push_record(columns.iter().cloned());
            for row in rows {
                builder.push_record(columns.iter().map(|c| cell(&row[c.as_str()])));
            }
        }
        Some(_) => {
            builder.push_record(["value"]);
            for row in rows {
                builder.push_record([cell(row)]);
            }
        }
        None => return "(no rows)".to_string(),
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(|f| format!("{:.2}", f))
            .unwrap_or_else(|| n.to_string()),
        Value::Array(items) => format!("[{} values]", items.len()),
        other => other.to_string(),
    }
}
