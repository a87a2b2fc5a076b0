//! Warden CLI binary: evaluate policies, inspect governance, watch runs, decide approvals.
//!
//! Subcommands: `evaluate`, `governance`, `watch`, `decide`.

mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::{CliError, DEFAULT_MAX_LEN};
use warden::{ApiClient, Console, HttpRunBackend, Resolution, StreamEnd};

#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Warden: approval and risk governance for supervised coding agents")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Backend base URL (default: WARDEN_API_URL or http://127.0.0.1:8787)
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Verbose: debug logs from warden on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a role and capability against a local policy file (TOML or JSON)
    Evaluate {
        #[arg(long, value_name = "FILE")]
        policies: PathBuf,
        #[arg(long)]
        role: String,
        /// e.g. shell_exec, mcp_call, docs_read
        #[arg(long)]
        capability: String,
        /// low | medium | high (default: the capability's registered risk, else high)
        #[arg(long)]
        risk: Option<String>,
    },
    /// Fetch roles, capabilities, policies and MCP servers and print them as JSON
    Governance,
    /// Stream a run's events until it ends (Ctrl-C to stop)
    Watch {
        run_id: String,
        /// Max chars of payload shown per line
        #[arg(long, default_value_t = DEFAULT_MAX_LEN)]
        max_len: usize,
    },
    /// Approve or reject a pending approval
    Decide {
        approval_id: String,
        #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
        approve: bool,
        #[arg(long)]
        reject: bool,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: Args) -> Result<(), CliError> {
    let mut settings = config::Settings::from_env()?;
    if let Some(url) = args.api_url {
        settings.api_url = url.trim_end_matches('/').to_string();
    }

    match args.cmd {
        Command::Evaluate {
            policies,
            role,
            capability,
            risk,
        } => {
            let report = cli::evaluate(&policies, &role, &capability, risk.as_deref())?;
            if args.json {
                print_json(&report)?;
            } else {
                println!("{}", report);
            }
        }
        Command::Governance => {
            let console = Console::from_settings(&settings)?;
            let snapshot = cli::governance(&console).await?;
            print_json(&snapshot)?;
        }
        Command::Watch { run_id, max_len } => {
            let console = Console::from_settings(&settings)?;
            let mut subscription = console.start_run(warden::Run::new(run_id)).await?;
            let handle = subscription.handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    handle.cancel();
                }
            });
            let mut stdout = std::io::stdout();
            let end =
                cli::watch_subscription(&console, &mut subscription, &mut stdout, max_len).await?;
            match end {
                StreamEnd::Completed(kind) => eprintln!("run ended: {}", kind),
                StreamEnd::Closed => eprintln!("feed closed before the run ended"),
                StreamEnd::Cancelled => eprintln!("stopped"),
            }
        }
        Command::Decide {
            approval_id,
            approve,
            ..
        } => {
            let resolution = if approve {
                Resolution::Approved
            } else {
                Resolution::Rejected
            };
            let backend = HttpRunBackend::new(ApiClient::from_settings(&settings)?);
            cli::decide(&backend, &approval_id, resolution).await?;
            println!("{} {}", approval_id, resolution);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    config::load_and_apply("warden", None).ok();
    let args = Args::parse();
    if let Err(e) = logging::init(args.verbose) {
        eprintln!("warden: logging: {}", e);
    }
    if let Err(e) = run(args).await {
        eprintln!("warden: {}", e);
        std::process::exit(1);
    }
}
