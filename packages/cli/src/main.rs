//! `rmaker`: command-line client for cloud-managed nodes.
//!
//! Subcommands map one-to-one onto [`rmaker::NodeClient`] operations:
//!
//! - **`status`**, **`config`**: print the node's status or configuration.
//! - **`params get`** / **`params set`**: read or update node parameters.
//! - **`mapping add`** / **`mapping remove`** / **`mapping status`**: drive
//!   the user–node mapping protocol, optionally waiting for the outcome.
//!
//! Connection settings and credentials come from flags or the matching
//! `RMAKER_*` environment variables.

mod poll;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rmaker::{ClientConfig, IdentityStore, NodeClient, NodeError, StaticIdentity, TokenSession};
use serde_json::Value;
use tracing::warn;

use poll::{poll_until_terminal, PollOutcome, CONFIRMED};

/// rmaker: manage cloud-connected nodes
///
/// Query node status, configuration and parameters, update parameters, and
/// add or remove the mapping between your user account and a node.
#[derive(Parser)]
#[command(name = "rmaker", version, about, long_about = None)]
struct Cli {
    /// Service base URL.
    #[arg(
        long,
        env = "RMAKER_HOST",
        default_value = ClientConfig::DEFAULT_HOST,
        global = true
    )]
    host: String,

    /// PEM bundle of additional trusted root certificates.
    #[arg(long, env = "RMAKER_CERT_FILE", value_name = "PEM", global = true)]
    cert_file: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(
        long,
        env = "RMAKER_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = ClientConfig::DEFAULT_TIMEOUT_SECS,
        global = true
    )]
    timeout: u64,

    /// Identity token from a previous login.
    #[arg(long, env = "RMAKER_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// User id sent with mapping requests.
    #[arg(long, env = "RMAKER_USER_ID", global = true)]
    user_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the online/offline status of a node.
    Status {
        /// Node id.
        node_id: String,
    },

    /// Print the configuration of a node.
    Config {
        /// Node id.
        node_id: String,
    },

    /// Read or update node parameters.
    Params {
        #[command(subcommand)]
        action: ParamsCommand,
    },

    /// Add or remove the user–node mapping, or check a mapping request.
    Mapping {
        #[command(subcommand)]
        action: MappingCommand,
    },
}

#[derive(Subcommand)]
enum ParamsCommand {
    /// Print the current parameters of a node.
    ///
    /// Exits 1 if the service reports that the node has no parameters.
    Get {
        /// Node id.
        node_id: String,
    },

    /// Update parameters of a node.
    ///
    /// The new values are a JSON object given inline with --data, or read
    /// from FILE. Pass `-` as FILE to read from stdin.
    ///
    /// Examples:
    ///   rmaker params set abcd1234 --data '{"Light":{"power":true}}'
    ///   rmaker params set abcd1234 params.json
    Set {
        /// Node id.
        node_id: String,

        /// Path to a JSON file, or `-` for stdin.
        #[arg(conflicts_with = "data", required_unless_present = "data")]
        file: Option<PathBuf>,

        /// Inline JSON object.
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },
}

#[derive(Subcommand)]
enum MappingCommand {
    /// Request that your user account be mapped to a node.
    ///
    /// Prints the request id. The node must confirm the request with the same
    /// secret key it was provisioned with.
    Add {
        /// Node id.
        node_id: String,

        /// Secret key generated during provisioning.
        #[arg(long, value_name = "KEY")]
        secret_key: String,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Request that your user account be unmapped from a node.
    Remove {
        /// Node id.
        node_id: String,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Print the status of a mapping request.
    Status {
        /// Node id the request was made for.
        node_id: String,

        /// Request id printed by `mapping add` or `mapping remove`.
        request_id: String,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Args)]
struct WaitArgs {
    /// Poll until the request reaches a final status.
    #[arg(long)]
    wait: bool,

    /// Seconds between polls when waiting.
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    interval: u64,

    /// Give up waiting after this many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    wait_timeout: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rmaker=info,rmaker_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = ClientConfig {
        host: cli.host,
        cert_file: cli.cert_file,
        timeout_secs: cli.timeout,
    };
    let session = cli
        .token
        .map(TokenSession::new)
        .unwrap_or_else(TokenSession::anonymous);
    let identity: Arc<dyn IdentityStore> = Arc::new(
        cli.user_id
            .map(StaticIdentity::new)
            .unwrap_or_else(StaticIdentity::unset),
    );

    let code = match run(cli.command, &session, &config, identity) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("rmaker: {}", e);
            if let Some(description) = e.description() {
                eprintln!("rmaker: service says: {}", description);
            }
            1
        }
    };
    process::exit(code);
}

/// Execute one subcommand and return the process exit code.
fn run(
    command: Command,
    session: &TokenSession,
    config: &ClientConfig,
    identity: Arc<dyn IdentityStore>,
) -> Result<i32, NodeError> {
    let node = |node_id: String| NodeClient::connect(node_id, session, config, identity.clone());

    match command {
        Command::Status { node_id } => {
            print_json(&node(node_id)?.get_node_status()?);
            Ok(0)
        }

        Command::Config { node_id } => {
            print_json(&node(node_id)?.get_node_config()?);
            Ok(0)
        }

        Command::Params { action } => match action {
            ParamsCommand::Get { node_id } => match node(node_id.clone())?.get_node_params()? {
                Some(params) => {
                    print_json(&params);
                    Ok(0)
                }
                None => {
                    eprintln!("rmaker: node {} reported no parameters", node_id);
                    Ok(1)
                }
            },

            ParamsCommand::Set {
                node_id,
                file,
                data,
            } => {
                let params = parse_params(file, data);
                node(node_id)?.set_node_params(&params)?;
                println!("node params updated");
                Ok(0)
            }
        },

        Command::Mapping { action } => match action {
            MappingCommand::Add {
                node_id,
                secret_key,
                wait,
            } => {
                let node = node(node_id)?;
                let request_id = node.add_user_node_mapping(&secret_key)?;
                follow_request(&node, request_id, &wait)
            }

            MappingCommand::Remove { node_id, wait } => {
                let node = node(node_id)?;
                let request_id = node.remove_user_node_mapping()?;
                follow_request(&node, request_id, &wait)
            }

            MappingCommand::Status {
                node_id,
                request_id,
                wait,
            } => {
                let node = node(node_id)?;
                if wait.wait {
                    return wait_for_mapping(&node, &request_id, &wait);
                }
                match node.get_mapping_status(&request_id)? {
                    Some(status) => {
                        println!("{}", status);
                        Ok(0)
                    }
                    None => {
                        eprintln!("rmaker: service reported no status for {}", request_id);
                        Ok(1)
                    }
                }
            }
        },
    }
}

/// Print the request id of a freshly submitted mapping request and, with
/// `--wait`, poll it to completion.
fn follow_request(
    node: &NodeClient,
    request_id: Option<String>,
    wait: &WaitArgs,
) -> Result<i32, NodeError> {
    let Some(request_id) = request_id else {
        eprintln!("rmaker: service did not return a request id");
        return Ok(1);
    };
    println!("{}", request_id);
    if wait.wait {
        wait_for_mapping(node, &request_id, wait)
    } else {
        Ok(0)
    }
}

fn wait_for_mapping(
    node: &NodeClient,
    request_id: &str,
    wait: &WaitArgs,
) -> Result<i32, NodeError> {
    let outcome = poll_until_terminal(
        || node.get_mapping_status(request_id),
        Duration::from_secs(wait.interval),
        Duration::from_secs(wait.wait_timeout),
        std::thread::sleep,
    )?;
    match outcome {
        PollOutcome::Terminal(status) => {
            println!("{}", status);
            Ok(if status == CONFIRMED { 0 } else { 1 })
        }
        PollOutcome::TimedOut(last) => {
            warn!(
                "mapping: gave up on request {} after {}s (last status: {})",
                request_id,
                wait.wait_timeout,
                last.as_deref().unwrap_or("unknown")
            );
            eprintln!("rmaker: timed out waiting for request {}", request_id);
            Ok(1)
        }
    }
}

/// Resolve the `params set` input to a JSON object, exiting on bad input.
fn parse_params(file: Option<PathBuf>, data: Option<String>) -> Value {
    let json = match (data, file) {
        (Some(inline), _) => inline,
        (None, Some(path)) => read_input(&path),
        (None, None) => fatal("either FILE or --data is required"),
    };
    match serde_json::from_str::<Value>(&json) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => fatal("params must be a JSON object"),
        Err(e) => fatal(&format!("failed to parse params as JSON: {}", e)),
    }
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            fatal(&format!("failed to read {}: {}", path.display(), e))
        })
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => fatal(&format!("failed to render response: {}", e)),
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("rmaker: {}", msg);
    process::exit(2);
}
