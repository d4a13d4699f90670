//! hymnal - command-line driver for the session core
//!
//! Runs one session against the configured backend with a silent playback
//! resource, performs a single command and prints the result.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hymnal_common::events::{PlaybackContext, SessionEvent};
use hymnal_common::human_time::{format_days_ago, format_track_duration};
use hymnal_common::{TrackId, UserId};
use hymnal_session::api::HttpApi;
use hymnal_session::config::SessionConfig;
use hymnal_session::favorites::LoadOutcome;
use hymnal_session::playback::SilentResource;
use hymnal_session::storage::FileStore;
use hymnal_session::Session;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long `favorite` waits for the server to confirm
const SETTLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Command-line arguments for hymnal
#[derive(Parser, Debug)]
#[command(name = "hymnal")]
#[command(about = "Hymnal playback and favorites session")]
#[command(version)]
struct Args {
    /// Configuration file (overrides HYMNAL_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long, env = "HYMNAL_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the home feed
    Feed,
    /// List the hymn catalog
    Catalog,
    /// Remember a user and load their favorites
    Login { user: String },
    /// Forget the remembered user
    Logout,
    /// List favorites of the remembered (or given) user
    Favorites {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Toggle a hymn in the remembered user's favorites
    Favorite { track_id: String },
    /// Play a hymn from the catalog and show what is queued after it
    Play { track_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = SessionConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = args.api_url {
        config.api.base_url = url;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hymnal_session={}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Backend: {}", config.api.base_url);

    let api = Arc::new(HttpApi::new(&config.api).context("Failed to create API client")?);
    let store = Arc::new(FileStore::open(config.storage_path()));
    info!("Session file: {}", store.path().display());

    let session = Session::new(config, api, Box::new(SilentResource), store);

    match args.command {
        Command::Feed => show_feed(&session).await,
        Command::Catalog => show_catalog(&session).await,
        Command::Login { user } => {
            let outcome = session.login(UserId::new(user)).await;
            report_load(outcome);
            Ok(())
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
            Ok(())
        }
        Command::Favorites { user } => {
            let outcome = match user {
                Some(user) => session.load_favorites(&UserId::new(user)).await,
                None => session
                    .refresh_favorites()
                    .await
                    .context("Not logged in; run `hymnal login <user>` or pass --user")?,
            };
            report_load(outcome);
            session.update_favorites_days_ago();
            for entry in session.favorites() {
                println!("{}\t{}", entry.track_id, format_days_ago(entry.added_days_ago));
            }
            Ok(())
        }
        Command::Favorite { track_id } => toggle_favorite(&session, TrackId::new(track_id)).await,
        Command::Play { track_id } => play(&session, TrackId::new(track_id)).await,
    }
}

async fn show_feed(session: &Session) -> Result<()> {
    let Some(feed) = session.load_home_feed().await else {
        bail!("Home feed load was superseded");
    };
    if feed.is_fallback {
        println!("(home feed unavailable)");
        return Ok(());
    }

    println!("Recently added:");
    for track in &feed.recent {
        println!("  {}\t{}", track.id, track.title);
    }
    println!("Popular:");
    for track in &feed.popular {
        println!("  {}\t{}", track.id, track.title);
    }
    println!("Categories: {}", feed.categories.join(", "));
    println!("Composers: {}", feed.composers.join(", "));
    Ok(())
}

async fn show_catalog(session: &Session) -> Result<()> {
    for track in session.fetch_catalog().await {
        let duration = track
            .duration()
            .map(format_track_duration)
            .unwrap_or_else(|| "--:--".to_string());
        println!("{}\t{}\t{}", track.id, duration, track.title);
    }
    Ok(())
}

fn report_load(outcome: LoadOutcome) {
    match outcome {
        LoadOutcome::Applied { count } => println!("{} favorites", count),
        LoadOutcome::Stale => println!("Favorites unavailable, showing cached list"),
        LoadOutcome::Superseded => println!("Favorites load superseded"),
    }
}

async fn toggle_favorite(session: &Session, track_id: TrackId) -> Result<()> {
    let mut events = session.subscribe();
    let mut login_required = false;
    session.toggle_favorite(&track_id, || login_required = true);
    if login_required {
        bail!("Not logged in; run `hymnal login <user>` first");
    }

    let settled = tokio::time::timeout(SETTLE_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(SessionEvent::FavoriteChanged { track_id: id, state, .. })
                    if id == track_id && !state.is_pending() =>
                {
                    return Some(state);
                }
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .context("Timed out waiting for the server")?;

    if let Some(notice) = session.notice() {
        bail!("{}", notice.message);
    }
    match settled {
        Some(state) => println!("{}\t{}", track_id, state),
        None => bail!("Session closed before the favorite settled"),
    }
    Ok(())
}

async fn play(session: &Session, track_id: TrackId) -> Result<()> {
    let catalog = session.fetch_catalog().await;
    let Some(track) = catalog.iter().find(|t| t.id == track_id).cloned() else {
        bail!("No hymn with id {} in the catalog", track_id);
    };

    session.play_from_collection(track, &catalog, PlaybackContext::none());

    // Let the resource report its start outcome
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = session.snapshot();
    if let Some(notice) = session.notice() {
        bail!("{}", notice.message);
    }
    if let Some(current) = &snapshot.current_track {
        println!("Now playing: {} ({})", current.title, current.id);
    }
    for (position, track) in snapshot.queue.iter().enumerate() {
        println!("  {:>2}. {}\t{}", position + 1, track.id, track.title);
    }
    Ok(())
}
