use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use il_core::ports::LoadTarget;
use il_core::{Bitmap, ImageSource, LoadError, LoadEvent, LoadRequest, LoaderConfig, RequestState};
use imageloader_lib::bootstrap::tracing::init_tracing_subscriber;
use imageloader_lib::bootstrap::{build_loader, load_config, resolve_paths};

const DEFAULT_CONFIG_FILE: &str = "imageloader.toml";

#[derive(Parser)]
#[command(name = "imageloader", version, about = "Fetch, decode and cache images")]
struct Cli {
    /// TOML config file; defaults to ./imageloader.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load one image and print what happened.
    Fetch {
        /// File path, or a file://, content://, http:// or https:// URL.
        source: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Revalidate remote images by ETag.
        #[arg(long)]
        etag: bool,
        #[arg(long)]
        no_memory_cache: bool,
        #[arg(long)]
        force: bool,
    },
    /// Delete every cached file and registry entry.
    ClearCache,
}

/// Prints the outcome of a fetch.
struct StdoutTarget;

impl LoadTarget for StdoutTarget {
    fn on_loading_succeeded(&self, source: &ImageSource, _request: &LoadRequest, bitmap: &Bitmap) {
        println!("loaded {source}: {}x{}", bitmap.width(), bitmap.height());
    }

    fn on_loading_failed(&self, error: &LoadError, _request: &LoadRequest) {
        eprintln!("failed: {error}");
    }
}

fn print_event(event: &LoadEvent) {
    match event {
        LoadEvent::Progress(fraction) => println!("progress {:.0}%", fraction * 100.0),
        LoadEvent::SizeDetected(size) => println!("size {}x{}", size.width, size.height),
        LoadEvent::AlreadyLoaded => println!("already loaded"),
        _ => {}
    }
}

fn parse_source(raw: &str) -> ImageSource {
    if raw.contains("://") {
        ImageSource::from(raw)
    } else {
        ImageSource::File(PathBuf::from(raw))
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<LoaderConfig> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            load_config(Path::new(DEFAULT_CONFIG_FILE))
        }
        None => Ok(LoaderConfig::empty()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = read_config(cli.config.as_deref())?;
    let paths = resolve_paths(&config)?;
    init_tracing_subscriber(Some(&paths.logs_dir))
        .context("Failed to initialize tracing")?;

    let runtime = build_loader(&config, &paths)?;

    match cli.command {
        Command::Fetch {
            source,
            width,
            height,
            etag,
            no_memory_cache,
            force,
        } => {
            let mut request = runtime
                .loader
                .load(parse_source(&source))
                .use_memory_cache(!no_memory_cache)
                .with_etag(etag)
                .force(force)
                .listener(print_event);
            if width.is_some() || height.is_some() {
                request = request.target_size(width.unwrap_or(0), height.unwrap_or(0));
            }

            let handle = request.into_target(Arc::new(StdoutTarget));
            let state = handle.wait().await;
            runtime.callbacks.flush().await;
            if state != RequestState::Succeeded {
                anyhow::bail!("load finished as {state:?}");
            }
        }
        Command::ClearCache => {
            let removed = runtime.loader.engine().clear_disk_cache().await?;
            runtime.loader.engine().clear_memory_cache().await;
            println!("removed {removed} cached files");
        }
    }

    Ok(())
}
