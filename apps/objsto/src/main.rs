//! objsto - command-line driver for the objsto provider.
//!
//! Runs the policy normalizer and single-resource lifecycle operations
//! without an orchestrator. Resource input and output are the JSON data
//! models of the resources.
//!
//! # Usage
//!
//! ```text
//! objsto normalize policy.json
//! objsto compare configured.json observed.json
//! objsto schema objsto_bucket_lifecycle_configuration
//! OBJSTO_ENDPOINT=http://localhost:9000 ... objsto create objsto_bucket bucket.json
//! objsto import objsto_object assets/logo.png
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `OBJSTO_ENDPOINT` | S3 endpoint (fallback for `--endpoint`) |
//! | `OBJSTO_REGION` | Region (fallback for `--region`) |
//! | `OBJSTO_ACCESS_KEY` | Access key (fallback for `--access-key`) |
//! | `OBJSTO_SECRET_KEY` | Secret key (fallback for `--secret-key`) |
//! | `LOG_LEVEL` | Log level filter, `warn` by default |
//! | `RUST_LOG` | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use objsto_core::ProviderSettings;
use objsto_provider::{
    AnyResource, ConfiguredProvider, Diagnostics, InMemoryStorageClient, ObjstoProvider,
    RESOURCE_TYPES,
};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Provider version reported by `objsto schema`.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Endpoint used by the in-memory client when none is configured.
const IN_MEMORY_ENDPOINT: &str = "http://localhost:9000";

/// Manage S3 compatible object storage resources
#[derive(Debug, Parser)]
#[command(name = "objsto")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    /// Log level filter
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Use an in-memory storage service instead of a real endpoint
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Command,
}

/// Provider settings; each falls back to its `OBJSTO_*` environment variable.
#[derive(Debug, Args)]
struct ProviderArgs {
    /// S3 endpoint of the object storage service
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Region of the object storage service
    #[arg(long, global = true)]
    region: Option<String>,

    /// Access key for the object storage service
    #[arg(long, global = true)]
    access_key: Option<String>,

    /// Secret key for the object storage service
    #[arg(long, global = true)]
    secret_key: Option<String>,
}

impl From<&ProviderArgs> for ProviderSettings {
    fn from(args: &ProviderArgs) -> Self {
        ProviderSettings::builder()
            .endpoint(args.endpoint.clone())
            .region(args.region.clone())
            .access_key(args.access_key.clone())
            .secret_key(args.secret_key.clone())
            .build()
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the canonical form of a policy document (stdin when FILE is omitted)
    Normalize {
        /// Policy document file, or `-` for stdin
        file: Option<PathBuf>,
    },

    /// Check that two policy documents are equivalent
    Compare {
        /// Configured policy document
        configured: PathBuf,
        /// Observed policy document
        observed: PathBuf,
    },

    /// Print the provider schema, or the schema of one resource type
    Schema {
        /// Resource type, e.g. `objsto_bucket`
        resource_type: Option<String>,
    },

    /// Import an existing object and print its state
    Import {
        /// Resource type
        resource_type: String,
        /// Bucket name, or `{bucket}/{key}` for objects
        id: String,
    },

    /// Create a resource from a JSON plan and print its state
    Create {
        /// Resource type
        resource_type: String,
        /// JSON plan, or `-` for stdin
        file: PathBuf,
    },

    /// Refresh a resource from its JSON state and print the new state
    Read {
        /// Resource type
        resource_type: String,
        /// JSON state, or `-` for stdin
        file: PathBuf,
    },

    /// Delete a resource described by its JSON state
    Delete {
        /// Resource type
        resource_type: String,
        /// JSON state, or `-` for stdin
        file: PathBuf,
    },
}

/// Lifecycle operation on a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceOp {
    Create,
    Read,
    Delete,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `--log-level` value.
/// Logs go to stderr so that stdout stays machine-readable.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Print every diagnostic to stderr and fail if any of them is an error.
fn report(diagnostics: &Diagnostics) -> Result<()> {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
    if diagnostics.has_error() {
        bail!("operation failed with {} diagnostic(s)", diagnostics.len());
    }
    Ok(())
}

fn in_memory_provider(endpoint: Option<&str>) -> ConfiguredProvider {
    let endpoint = endpoint.unwrap_or(IN_MEMORY_ENDPOINT);
    ConfiguredProvider::new(Arc::new(InMemoryStorageClient::new(endpoint)))
}

fn configure(cli: &Cli) -> Result<ConfiguredProvider> {
    if cli.in_memory {
        debug!("using in-memory storage");
        return Ok(in_memory_provider(cli.provider.endpoint.as_deref()));
    }
    let settings = ProviderSettings::from(&cli.provider);
    match ObjstoProvider::new(VERSION).configure(&settings) {
        Ok(provider) => Ok(provider),
        Err(diagnostics) => {
            report(&diagnostics)?;
            bail!("provider configuration failed")
        }
    }
}

fn lookup(provider: &ConfiguredProvider, resource_type: &str) -> Result<Arc<dyn AnyResource>> {
    provider.resource(resource_type).with_context(|| {
        format!(
            "unknown resource type {resource_type}, expected one of: {}",
            RESOURCE_TYPES.join(", ")
        )
    })
}

/// Run one lifecycle operation; `Null` is returned when no state remains.
async fn run_resource(resource: &dyn AnyResource, op: ResourceOp, input: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(input).context("resource input is not valid JSON")?;
    let response = match op {
        ResourceOp::Create => resource.create_json(value).await,
        ResourceOp::Read => resource.read_json(value).await,
        ResourceOp::Delete => {
            report(&resource.delete_json(value).await)?;
            return Ok(Value::Null);
        }
    };
    report(&response.diagnostics)?;
    Ok(response.state.unwrap_or(Value::Null))
}

async fn run_import(resource: &dyn AnyResource, id: &str) -> Result<Value> {
    let partial = resource.import_state_json(id);
    report(&partial.diagnostics)?;
    let Some(partial) = partial.state else {
        return Ok(Value::Null);
    };
    let response = resource.read_json(partial).await;
    report(&response.diagnostics)?;
    match response.state {
        Some(state) => Ok(state),
        None => bail!("cannot import non-existent remote object {id}"),
    }
}

fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Normalize { file } => {
            let text = read_input(file.as_deref())?;
            let canonical = objsto_policy::normalize_policy_document(&text)?;
            println!("{canonical}");
        }
        Command::Compare {
            configured,
            observed,
        } => {
            let configured = read_input(Some(configured))?;
            let observed = read_input(Some(observed))?;
            if let Err(errors) = objsto_policy::ensure_consistent(&configured, &observed) {
                report(&Diagnostics::from(errors))?;
            }
            println!("policy documents are equivalent");
        }
        Command::Schema { resource_type } => {
            let schema = match resource_type {
                Some(t) => lookup(&in_memory_provider(None), t)?.schema(),
                None => ObjstoProvider::new(VERSION).schema(),
            };
            print_json(&serde_json::to_value(schema)?)?;
        }
        Command::Import { resource_type, id } => {
            let provider = configure(&cli)?;
            let state = run_import(lookup(&provider, resource_type)?.as_ref(), id).await?;
            print_json(&state)?;
        }
        Command::Create {
            resource_type,
            file,
        }
        | Command::Read {
            resource_type,
            file,
        }
        | Command::Delete {
            resource_type,
            file,
        } => {
            let op = match &cli.command {
                Command::Create { .. } => ResourceOp::Create,
                Command::Read { .. } => ResourceOp::Read,
                _ => ResourceOp::Delete,
            };
            let input = read_input(Some(file))?;
            let provider = configure(&cli)?;
            let resource = lookup(&provider, resource_type)?;
            let state = run_resource(resource.as_ref(), op, &input).await?;
            info!(resource_type = %resource_type, ?op, "resource operation completed");
            print_json(&state)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;
    run(cli).await
}
