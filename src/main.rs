#![forbid(unsafe_code)]

//! `bytesmith` — headless console front-end for the ACP client runtime.
//!
//! Without a prompt it lists the configured and well-known agents with
//! their install status. With a prompt it connects to an agent, opens a
//! session, streams the agent's updates to stdout, and exits when the
//! prompt completes.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use bytesmith::events::AppEvent;
use bytesmith::workbench::Workbench;
use bytesmith::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "bytesmith", about = "ACP client runtime console", version, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file.
    ///
    /// Defaults to `bytesmith/config.json` under the platform user-config
    /// directory; a missing file is created with the well-known agent
    /// catalog.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Agent to connect to. Defaults to the configured default agent.
    #[arg(long)]
    agent: Option<String>,

    /// Working directory for the session. Defaults to the current
    /// directory.
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Prompt to send. With no prompt, lists available agents and exits.
    prompt: Vec<String>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let (workbench, mut events) = match args.config.clone() {
        Some(path) => Workbench::with_config_path(path)?,
        None => Workbench::new()?,
    };

    if args.prompt.is_empty() {
        for agent in workbench.list_available_agents().await {
            let marker = if agent.installed { "*" } else { " " };
            println!(
                "{marker} {:<18} {:<14} {}",
                agent.name, agent.command, agent.description
            );
        }
        println!("\n(* = binary found in PATH)");
        return Ok(());
    }

    let agent_name = match args.agent {
        Some(name) => name,
        None => workbench.get_settings().await.default_agent,
    };
    let cwd = match args.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|err| AppError::Io(format!("cannot determine cwd: {err}")))?,
    };
    let cwd = cwd.to_string_lossy().into_owned();
    let prompt = args.prompt.join(" ");

    info!(agent = %agent_name, %cwd, "connecting");
    let connection_id = workbench.connect_agent(&agent_name, &cwd).await?;
    let session_id = workbench.new_session(&connection_id, &cwd).await?;
    let auto_approve = workbench.get_settings().await.auto_approve;

    workbench
        .send_prompt(&connection_id, &session_id, &prompt)
        .await?;

    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if signal.is_err() {
                    break Err(AppError::Cancelled("signal handler failed".to_owned()));
                }
                info!("interrupt received, cancelling prompt");
                workbench.cancel_prompt(&connection_id, &session_id).await.ok();
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break Err(AppError::Cancelled("event stream closed".to_owned()));
                };
                match event {
                    AppEvent::Message(msg) => print!("{}", msg.text),
                    AppEvent::ToolCall(tc) => {
                        eprintln!("[tool {} {}] {}", tc.kind, tc.status, tc.title);
                    }
                    AppEvent::Plan(plan) => {
                        for entry in &plan.entries {
                            eprintln!("[plan {}] {}", entry.status, entry.content);
                        }
                    }
                    AppEvent::Permission(req) => {
                        let choice = if auto_approve {
                            req.options.first().map(|o| o.option_id.clone())
                        } else {
                            None
                        };
                        match choice {
                            Some(option_id) => {
                                eprintln!("[permission auto-approved] {}", req.title);
                                workbench
                                    .respond_permission(&req.connection_id, &option_id)
                                    .await;
                            }
                            None => {
                                eprintln!("[permission denied] {} (set autoApprove)", req.title);
                                workbench.respond_permission(&req.connection_id, "").await;
                            }
                        }
                    }
                    AppEvent::Stderr(line) => eprintln!("[agent] {}", line.line),
                    AppEvent::PromptDone(done) => {
                        println!();
                        info!(stop_reason = %done.stop_reason, "prompt complete");
                        break Ok(());
                    }
                    AppEvent::Error(err) => {
                        println!();
                        error!(error = %err.error, "prompt failed");
                        break Err(AppError::Acp(err.error));
                    }
                    AppEvent::Commands(_)
                    | AppEvent::FileChanged(_)
                    | AppEvent::TerminalOutput(_) => {}
                }
            }
        }
    };

    workbench.shutdown().await;
    outcome
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
