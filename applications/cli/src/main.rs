/// Tapedeck - console player for the playback queue controller
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tapedeck_cli::{
    config::CliConfig, console::render_queue, playlist::Playlist, session::Session,
    simulated::SimulatedEngine,
};
use tapedeck_playback::{PlayerService, Queue};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tapedeck")]
#[command(about = "Play a playlist through the Tapedeck queue controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a playlist with the simulated engine
    Play {
        /// Playlist file (.json, .toml, .m3u)
        playlist: PathBuf,

        /// Configuration file path
        #[arg(short, long, env = "TAPEDECK_CONFIG")]
        config: Option<PathBuf>,

        /// Zero-based index of the first item to play
        #[arg(short, long, default_value_t = 0)]
        start: usize,

        /// Hide position updates
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print a playlist as the controller would queue it
    Inspect {
        /// Playlist file (.json, .toml, .m3u)
        playlist: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tapedeck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            playlist,
            config,
            start,
            quiet,
        } => {
            play(&playlist, config.as_deref(), start, quiet).await?;
        }
        Commands::Inspect { playlist } => {
            inspect(&playlist)?;
        }
    }

    Ok(())
}

async fn play(
    playlist_path: &Path,
    config_path: Option<&Path>,
    start: usize,
    quiet: bool,
) -> anyhow::Result<()> {
    // Load configuration
    let config = CliConfig::load(config_path)?;
    config.validate()?;

    let playlist = Playlist::load(playlist_path)
        .with_context(|| format!("failed to read {}", playlist_path.display()))?;
    if playlist.items.is_empty() {
        anyhow::bail!("playlist {} has no items", playlist_path.display());
    }

    tracing::info!(
        playlist = playlist.name.as_deref().unwrap_or("untitled"),
        items = playlist.items.len(),
        repeat = ?config.playback.repeat,
        shuffle = config.playback.shuffle,
        "Starting playback"
    );

    let engine = SimulatedEngine::new(config.engine.clone());
    let (player, task) = PlayerService::spawn(engine, config.playback.clone());

    let session = Session::attach(player.clone()).await?.show_progress(!quiet);
    player.initialize_playlist(playlist.items).await?;

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let summary = session.run(start, interrupt).await?;

    player.shutdown().await?;
    task.await?;

    println!(
        "Played {} item(s), skipped {}{}",
        summary.started,
        summary.skipped.len(),
        if summary.interrupted { " (interrupted)" } else { "" }
    );
    Ok(())
}

fn inspect(playlist_path: &Path) -> anyhow::Result<()> {
    let playlist = Playlist::load(playlist_path)
        .with_context(|| format!("failed to read {}", playlist_path.display()))?;

    let already_sorted = Queue::is_presorted(&playlist.items);
    let mut queue = Queue::new();
    queue.initialize(playlist.items, already_sorted);

    println!(
        "{} ({} items{})",
        playlist.name.as_deref().unwrap_or("untitled"),
        queue.len(),
        if already_sorted { ", saved order" } else { "" }
    );
    print!("{}", render_queue(queue.items(), None));
    Ok(())
}
