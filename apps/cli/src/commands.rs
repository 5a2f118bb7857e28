//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use guidecraft_core::{EventSink, Pipeline, RunStatus};
use guidecraft_shared::{
    AppConfig, GenerateRequest, MAX_PER_TYPE, MIN_PER_TYPE, PipelineEvent, init_config,
    load_config, load_config_from,
};

use crate::progress::CliProgress;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Guidecraft: turn a topic into a technical guide.
#[derive(Parser)]
#[command(
    name = "guidecraft",
    version,
    about = "Research a topic with a browser agent and synthesize a technical guide.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.guidecraft/guidecraft.toml.
    #[arg(long, global = true, env = "GUIDECRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a guide for a topic.
    Generate {
        /// The topic to research.
        topic: String,

        /// Sources per category (1-3). Defaults to the configured value.
        #[arg(short = 'n', long)]
        max_per_type: Option<i64>,

        /// Write the guide to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print raw NDJSON events to stdout instead of a progress spinner.
        #[arg(long)]
        events: bool,
    },

    /// Serve the pipeline over HTTP.
    Serve {
        /// Address to bind (overrides `[server].bind`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// free for the guide or the event stream.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "guidecraft=info",
        1 => "guidecraft=debug",
        _ => "guidecraft=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Generate {
            topic,
            max_per_type,
            out,
            events,
        } => {
            let config = resolve_config(config_path)?;
            cmd_generate(&config, &topic, max_per_type, out.as_deref(), events).await
        }
        Command::Serve { bind } => {
            let config = resolve_config(config_path)?;
            cmd_serve(&config, bind).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config: &AppConfig,
    topic: &str,
    max_per_type: Option<i64>,
    out: Option<&Path>,
    raw_events: bool,
) -> Result<()> {
    if let Some(n) = max_per_type {
        if !(i64::from(MIN_PER_TYPE)..=i64::from(MAX_PER_TYPE)).contains(&n) {
            warn!(requested = n, "max-per-type is clamped to {MIN_PER_TYPE}..={MAX_PER_TYPE}");
        }
    }

    let pipeline = Pipeline::from_config(config)?;
    let request = GenerateRequest::new(topic, max_per_type);
    let (sink, mut rx) = EventSink::channel();
    let cancel = CancellationToken::new();

    let run = tokio::spawn({
        let cancel = cancel.clone();
        async move { pipeline.run(request, sink, cancel).await }
    });
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    info!(topic, "generating guide");
    let mut progress = (!raw_events).then(CliProgress::new);
    let mut guide = None;
    while let Some(event) = rx.recv().await {
        match &mut progress {
            Some(progress) => progress.apply(&event),
            None => print!("{}", event.to_line()),
        }
        if let PipelineEvent::Complete { guide: text, .. } = event {
            guide = Some(text);
        }
    }

    let status = run.await?;
    if let Some(progress) = &progress {
        progress.finish();
    }

    match status {
        RunStatus::Completed(stats) => {
            let guide = guide.ok_or_else(|| eyre!("run completed without a guide"))?;
            match out {
                Some(path) => {
                    std::fs::write(path, format!("{guide}\n"))
                        .map_err(|e| eyre!("failed to write {}: {e}", path.display()))?;
                    eprintln!("  Guide written to {}", path.display());
                }
                None if !raw_events => println!("{guide}"),
                None => {}
            }
            eprintln!(
                "  {} of {} sources used, {} words",
                stats.success_count, stats.source_count, stats.generated_words
            );
            Ok(())
        }
        RunStatus::Failed(message) => Err(eyre!(message)),
        RunStatus::Cancelled => {
            eprintln!("  Cancelled.");
            Ok(())
        }
    }
}

async fn cmd_serve(config: &AppConfig, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let pipeline = Pipeline::from_config(config)?;
    println!("Guide server listening on http://{bind}");
    guidecraft_server::serve(&bind, pipeline).await?;
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "guidecraft",
            "-vv",
            "generate",
            "Docker Compose",
            "-n",
            "3",
            "--out",
            "guide.md",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Generate {
            topic,
            max_per_type,
            out,
            events,
        } = cli.command
        else {
            panic!("expected generate");
        };
        assert_eq!(topic, "Docker Compose");
        assert_eq!(max_per_type, Some(3));
        assert_eq!(out, Some(PathBuf::from("guide.md")));
        assert!(!events);
    }

    #[test]
    fn parses_serve_and_config() {
        let cli = Cli::try_parse_from(["guidecraft", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:9000"));

        let cli = Cli::try_parse_from(["guidecraft", "--log-format", "json", "config", "show"])
            .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
