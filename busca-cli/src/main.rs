//! Busca CLI - web search assistant for local Ollama models
//!
//! A command-line chat that answers questions by searching the web with a
//! reason-act agent.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod config;
mod error;

use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use busca::agent::AgentExecutor;
use busca::conversation::{ConversationLoop, welcome};
use busca::llms::Ollama;
use busca::tool::ToolBox;
use busca::tools::{SearchEngine, WebSearchTool};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{BuscaConfig, ensure_valid, init_config_at, load_effective};
use crate::error::Result;

/// Busca - ask questions, get answers from the web
#[derive(Parser)]
#[command(name = "busca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "BUSCA_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    chat: ChatArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat(ChatArgs),

    /// Write the default configuration file
    Init(InitArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the chat command
#[derive(Args, Default)]
struct ChatArgs {
    /// Ollama model to use
    #[arg(short, long, env = "BUSCA_MODEL")]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum reasoning steps per question
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Search backend
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,
}

impl ChatArgs {
    /// Fill options missing here from `outer` (flags given before `chat`).
    fn or(self, outer: Self) -> Self {
        Self {
            model: self.model.or(outer.model),
            base_url: self.base_url.or(outer.base_url),
            max_iterations: self.max_iterations.or(outer.max_iterations),
            engine: self.engine.or(outer.engine),
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut BuscaConfig) {
        if let Some(model) = &self.model {
            config.ollama.model.clone_from(model);
        }
        if let Some(url) = &self.base_url {
            config.ollama.base_url.clone_from(url);
        }
        if let Some(max) = self.max_iterations {
            config.agent.max_iterations = max;
        }
        if let Some(engine) = self.engine {
            config.search.engine = engine.into();
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineArg {
    /// DuckDuckGo Lite
    #[value(name = "duckduckgo")]
    DuckDuckGo,
    /// Bing RSS
    Bing,
}

impl From<EngineArg> for SearchEngine {
    fn from(engine: EngineArg) -> Self {
        match engine {
            EngineArg::DuckDuckGo => Self::DuckDuckGo,
            EngineArg::Bing => Self::Bing,
        }
    }
}

/// Arguments for the init command
#[derive(Args)]
struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging on stderr with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "busca={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let config_file = cli.config.unwrap_or_else(config::config_path);

    match cli.command {
        None => cmd_chat(&cli.chat, &config_file).await,
        Some(Commands::Chat(args)) => cmd_chat(&args.or(cli.chat), &config_file).await,
        Some(Commands::Init(args)) => cmd_init(&args, &config_file).await,
        Some(Commands::Config(args)) => cmd_config(&args, &config_file).await,
    }
}

/// Build the assistant and run the chat loop on stdin/stdout.
async fn cmd_chat(args: &ChatArgs, config_file: &Path) -> Result<()> {
    let mut config = load_effective(config_file).await?;
    args.apply(&mut config);

    for issue in ensure_valid(&config)? {
        warn!("{issue}");
    }

    let template = config.prompt_template()?;
    let provider = Ollama::new(config.ollama_config())?;
    let search = WebSearchTool::with_timeout(config.search.timeout_secs)?
        .with_engine(config.search.engine)
        .with_max_results(config.search.max_results);

    let mut executor = AgentExecutor::new(Arc::new(provider), ToolBox::new().with(search))
        .template(template)
        .model(config.ollama.model.clone())
        .max_iterations(config.agent.max_iterations)
        .handle_parsing_errors(config.agent.handle_parsing_errors)
        .verbose(config.agent.verbose);
    if let Some(temperature) = config.ollama.temperature {
        executor = executor.temperature(temperature);
    }

    info!(
        model = %config.ollama.model,
        base_url = %config.ollama.base_url,
        engine = ?config.search.engine,
        "starting chat"
    );

    println!("{}", welcome(&config.ollama.model));

    let mut chat =
        ConversationLoop::new(executor).with_history_capacity(config.agent.history_capacity);
    chat.run(BufReader::new(io::stdin()), io::stdout()).await?;

    Ok(())
}

/// Initialize configuration.
async fn cmd_init(args: &InitArgs, config_file: &Path) -> Result<()> {
    if init_config_at(config_file, args.force).await? {
        println!("Configuration created: {}", config_file.display());
        println!();
        println!("Next steps:");
        println!("  1. ollama pull {}", BuscaConfig::default().ollama.model);
        println!("  2. busca");
    } else {
        println!("Configuration already exists at: {}", config_file.display());
        println!("Use --force to overwrite.");
    }
    Ok(())
}

/// Configuration management.
async fn cmd_config(args: &ConfigArgs, config_file: &Path) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            let config = load_effective(config_file).await?;
            let content = toml::to_string_pretty(&config).map_err(config::ConfigError::from)?;
            println!("# {}", config_file.display());
            println!("{content}");
        }
        ConfigCommands::Validate => {
            let config = load_effective(config_file).await?;
            let issues = ensure_valid(&config)?;
            for issue in &issues {
                println!("{issue}");
            }
            println!("Configuration is valid");
        }
    }

    Ok(())
}
