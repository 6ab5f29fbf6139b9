//! echoflow command-line entry point

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

use echoflow::cli::{Cli, Commands};
use echoflow::orchestrator::disconnect_and_wait;
use echoflow::transfer::{probe_mode, transfer_text, TimeoutAction};
use echoflow::{
    BatchOrchestrator, CommandSpec, Config, ConfigLoader, FileSink, PtyTransport, RemoteTarget,
    Transport,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    info!("Starting {} v{}", echoflow::NAME, echoflow::VERSION);
    match execute(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(debug: bool) {
    let debug = debug || env::var("ECHOFLOW_DEBUG").is_ok_and(|v| v == "1" || v == "true");
    let log_level = if debug { "debug" } else { "info" };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_configuration(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::with_search_paths(Vec::new())
            .load_from_path(path)
            .with_context(|| format!("Cannot use configuration {}", path.display())),
        None => ConfigLoader::load().context("Cannot load configuration"),
    }
}

async fn execute(cli: Cli) -> Result<i32> {
    let mut config = load_configuration(cli.config.as_ref())?;
    if let Some(auth) = cli.auth {
        config.connection.auth = auth;
    }

    match cli.command {
        Commands::Run {
            targets,
            commands,
            output,
            ignore_escapes,
        } => {
            if let Some(targets) = targets {
                config.output.target_list = targets;
            }
            if let Some(output) = output {
                config.output.directory = output;
            }
            if ignore_escapes {
                config.transfer.ignore_escapes = true;
            }
            let commands = if commands.is_empty() {
                config.command_spec()
            } else {
                CommandSpec::new(commands)
            };
            run_batch(&config, &commands).await
        }
        Commands::Paste {
            target,
            file,
            on_timeout,
            ack_pattern,
            check_mode,
        } => {
            if let Some(action) = on_timeout {
                config.transfer.on_timeout = action;
            }
            if ack_pattern.is_some() {
                config.transfer.ack_pattern = ack_pattern;
            }
            if let Some(marker) = check_mode {
                config.transfer.check_mode = true;
                config.transfer.mode_marker = Some(marker);
            }
            paste(&config, RemoteTarget::new(target), file).await
        }
    }
}

async fn run_batch(config: &Config, commands: &CommandSpec) -> Result<i32> {
    let list = &config.output.target_list;
    let targets = RemoteTarget::load_list(list)?;
    if targets.is_empty() {
        bail!("No targets listed in {}", list.display());
    }
    if commands.is_empty() {
        bail!("No commands to run");
    }

    let mut transport = PtyTransport::new(config.connect_settings());
    let sink = FileSink::new(&config.output.directory);
    let mut orchestrator = BatchOrchestrator::new(config.orchestrator_settings(), sink);

    let report = orchestrator
        .run(&mut transport, &targets, commands)
        .await
        .context("Run stopped")?;

    println!("{}", report.summary());
    println!("Results saved in {}", config.output.directory.display());
    Ok(if report.is_success() { 0 } else { 1 })
}

async fn paste(config: &Config, target: RemoteTarget, file: Option<PathBuf>) -> Result<i32> {
    let text = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?,
        None => {
            if config.transfer.on_timeout == TimeoutAction::Ask {
                bail!("--on-timeout ask needs --file; standard input is the paste text");
            }
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Cannot read standard input")?;
            text
        }
    };

    let mut transport = PtyTransport::new(config.connect_settings());
    transport
        .connect(&target, config.connection.auth)
        .await
        .context("Connect failed")?;

    let outcome = paste_into(&mut transport, config, &text).await;

    disconnect_and_wait(
        &mut transport,
        &target,
        config.orchestrator_settings().disconnect_poll,
        config.orchestrator_settings().disconnect_timeout,
    )
    .await?;
    outcome
}

async fn paste_into(transport: &mut dyn Transport, config: &Config, text: &str) -> Result<i32> {
    let prompt = config.prompt_detector().capture(transport).await?;
    debug!("Session prompt is '{}'", prompt);

    if config.transfer.check_mode {
        probe_mode(
            transport,
            &config.transfer.terminator,
            config.transfer.mode_marker.as_deref(),
            config.probe_timeout(),
        )
        .await
        .context("Mode check failed")?;
    }

    let mut policy = config.transfer.on_timeout.into_policy();
    let report = transfer_text(transport, text, &config.transfer_options(), policy.as_mut()).await?;

    println!(
        "{} of {} lines sent in {:.3} seconds",
        report.confirmed,
        report.total_lines,
        report.elapsed.as_secs_f64()
    );
    if !report.timed_out.is_empty() {
        warn!("Lines not echoed back: {:?}", report.timed_out);
    }
    match report.abort_error() {
        Some(err) => {
            println!("{}", err);
            if let Some(line) = &report.failing_line {
                println!("Stopped at: {}", line);
            }
            Ok(1)
        }
        None => Ok(0),
    }
}
