mod config;
mod database;
mod entities;
mod library;
mod logging;
mod ports;
mod reconcile;
mod report;
mod services;
mod spotify_rs;
mod sync_result;
#[cfg(test)]
mod test_utils;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config,
    database::Database,
    library::{Category, Side},
    logging::setup_logging,
    report::{render_follow_report, render_sync_report},
    services::{spotify::client::SpotifyAccountPair, sync::LibrarySyncService},
    spotify_rs::auth::{authorize_url, request_refresh_token},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "SPOTIFY_SYNC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level (default: off)
    #[arg(long, default_value = "off", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "SPOTIFY_SYNC_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synchronize the library of the two configured accounts
    #[command(subcommand)]
    Sync(SyncCommands),
    /// Exchange an authorization code for a refresh token
    RefreshToken {
        /// The `code` query parameter Spotify redirected to
        code: String,
    },
    /// Print the URL to open to authorize an account
    AuthorizeUrl,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum SyncCommands {
    /// Sync saved albums
    Albums,
    /// Sync followed playlists
    Playlists,
    /// Sync saved shows
    Shows,
    /// Sync followed artists
    Artists,
    /// Follow the artists of the albums saved on one side
    ArtistsFromAlbums {
        /// The side to update: `left` or `right`
        side: Side,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    };
    config.with_context(|| "Failed to load spotify-account-sync config")
}

async fn sync_category(
    service: &LibrarySyncService<SpotifyAccountPair, Database>,
    category: Category,
) -> Result<()> {
    let result = service.sync_category(category).await?;
    log::info!(
        "{} sync completed with {} change(s)",
        category.label(),
        result.change_count()
    );
    print!("{}", render_sync_report(category, &result));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Spotify account sync starting");

    match args.command {
        Commands::Sync(sync_command) => {
            let config = load_config(args.config.as_deref())?;

            let database_path = config.database_path()?;
            let database = Database::open(&database_path).await?;
            let accounts = SpotifyAccountPair::connect(&config).await?;
            let service = LibrarySyncService::new(accounts, database);

            match sync_command {
                SyncCommands::Albums => sync_category(&service, Category::Album).await?,
                SyncCommands::Playlists => sync_category(&service, Category::Playlist).await?,
                SyncCommands::Shows => sync_category(&service, Category::Show).await?,
                SyncCommands::Artists => sync_category(&service, Category::Artist).await?,
                SyncCommands::ArtistsFromAlbums { side } => {
                    let result = service.sync_artists_from_albums(side).await?;
                    if result.is_empty() {
                        log::info!("No artists to follow or unfollow on the {} side", side);
                    }
                    print!("{}", render_follow_report(&result));
                }
            }
        }
        Commands::RefreshToken { code } => {
            let config = load_config(args.config.as_deref())?;
            let api = config.api();

            let refresh_token = request_refresh_token(
                &api.client_id,
                &api.client_secret,
                &code,
                &api.redirect_uri,
            )
            .await
            .wrap_err("Failed to exchange authorization code")?;
            println!("Refresh Token: {}", refresh_token);
        }
        Commands::AuthorizeUrl => {
            let config = load_config(args.config.as_deref())?;
            let api = config.api();
            println!("{}", authorize_url(&api.client_id, &api.redirect_uri));
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}
