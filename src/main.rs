use clap::{Args, Parser, Subcommand};
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use stitch::error::{ErrorKind, Result};
use stitch::{ScriptManager, logging};
use stitch_cache::{FsWatcher, InvalidationListener};
use stitch_config::Config;
use stitch_library::LibraryId;
use stitch_script::ScriptType;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a library from source and print the result
    Compile(Target),
    /// Print a library's artifact from cache, compiling and caching it on a miss
    Serve(Target),
    /// Rebuild a library's cached artifacts
    Cache {
        #[arg(value_name = "LIBRARY", value_parser = parse_library)]
        library: LibraryId,

        /// Also cache minified artifacts
        #[arg(long)]
        minified: bool,
    },
    /// Delete every cached artifact
    Purge,
    /// Purge the cache whenever library sources change, until interrupted
    Watch,
}

#[derive(Args)]
struct Target {
    /// Library identifier, e.g. /libs/base
    #[arg(value_name = "LIBRARY", value_parser = parse_library)]
    library: LibraryId,

    /// Artifact type: a name, extension or MIME type
    #[arg(short = 't', long = "type", default_value = "css", value_parser = parse_script_type)]
    script_type: ScriptType,

    /// Minify the output; defaults to the configured `minify` setting
    #[arg(short, long, num_args = 0..=1, default_missing_value = "true")]
    minify: Option<bool>,
}

fn parse_library(s: &str) -> std::result::Result<LibraryId, String> {
    LibraryId::new(s).map_err(|err| (*err).to_string())
}

fn parse_script_type(s: &str) -> std::result::Result<ScriptType, String> {
    s.parse().map_err(|err: stitch_script::error::Error| (*err).to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let (manager, dispatcher) = ScriptManager::from_config(&config)?;
    match cli.command {
        Command::Compile(target) => {
            let minify = target.minify.unwrap_or(config.minify);
            let text = manager.get_output(&target.library, target.script_type, minify).await?;
            print!("{text}");
        },
        Command::Serve(target) => {
            let minify = target.minify.unwrap_or(config.minify);
            let served = manager.serve(&target.library, target.script_type, minify).await?;
            print!("{}", served.text);
            if let Some(rebuild) = served.rebuild {
                rebuild.wait().await?;
            }
        },
        Command::Cache { library, minified } => {
            for key in manager.cache_library_scripts(&library, minified)?.wait().await? {
                println!("{}", key.path(manager.cache().root()).display());
            }
        },
        Command::Purge => {
            let deleted = manager.purge().await?;
            println!("{deleted}");
        },
        Command::Watch => watch(&config, &manager).await?,
    }
    // Let queued rebuilds finish before exiting.
    drop(manager);
    dispatcher.await.or_raise(|| ErrorKind::Queue)
}

async fn watch(config: &Config, manager: &ScriptManager) -> Result<()> {
    let (invalidator, listener) = InvalidationListener::new(manager.cache().clone())
        .with_watched(config.watch.iter().cloned())
        .with_interval(config.cache.purge_interval())
        .spawn();
    let content_root = std::path::absolute(&config.content).or_raise(|| ErrorKind::Config)?;
    let watcher = FsWatcher::new(content_root, invalidator).or_raise(|| ErrorKind::Cache)?;
    tokio::signal::ctrl_c().await.or_raise(|| ErrorKind::Cache)?;
    tracing::info!("Shutting down watcher");
    // The watcher owns the last invalidator; dropping it stops the listener.
    drop(watcher);
    listener.await.or_raise(|| ErrorKind::Cache)
}
