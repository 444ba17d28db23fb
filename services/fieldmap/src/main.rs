//! Headless field map.
//!
//! Signs in against the field management backend, selects a field and
//! season, drives the overlay controllers and exports what the map shows.

mod app;
mod cache;
mod config;
mod export;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use backend_client::{BackendClient, ClientConfig, Session};
use clap::{Parser, Subcommand};
use field_common::{FieldId, SeasonId};
use futures::StreamExt;
use overlay::{DrawEvent, LatLng, LogNotifier, OverlayConfig};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use app::MapSession;
use config::MapConfig;

#[derive(Parser, Debug)]
#[command(name = "fieldmap")]
#[command(about = "Field map overlays from the field management backend")]
struct Args {
    /// Map configuration file (YAML)
    #[arg(short, long, env = "FIELDMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides FIELDMAP_SERVER_URL)
    #[arg(long)]
    server_url: Option<String>,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and print the session token
    SignIn {
        email: String,
        #[arg(long, env = "FIELDMAP_PASSWORD")]
        password: String,
    },
    /// List registered fields
    Fields,
    /// List the seasons of a field
    Seasons { field_id: FieldId },
    /// Select a field and season, then export the map
    Show {
        field_id: FieldId,
        /// Season id (YYYYMMDD); defaults to the newest season
        season: Option<SeasonId>,
        /// Also show the NDVI raster
        #[arg(long)]
        ndvi: bool,
        /// Output directory (defaults to the configured export dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Ask the backend to place measurements for a season
    DeterminePositions { field_id: FieldId, season: SeasonId },
    /// Register a field from a drawn outline given as "lat,lng" vertices
    Register {
        name: String,
        #[arg(required = true, num_args = 3..)]
        vertices: Vec<String>,
    },
    /// Follow the event stream and keep the selection current
    Watch { field_id: FieldId, season: SeasonId },
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn parse_vertex(vertex: &str) -> Result<LatLng> {
    let (lat, lng) = vertex
        .split_once(',')
        .with_context(|| format!("vertex '{}' is not 'lat,lng'", vertex))?;
    Ok(LatLng::new(
        lat.trim().parse().with_context(|| format!("bad latitude in '{}'", vertex))?,
        lng.trim().parse().with_context(|| format!("bad longitude in '{}'", vertex))?,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let map_config = MapConfig::load(args.config.as_deref())?;
    let mut client_config = ClientConfig::from_env();
    if let Some(url) = &args.server_url {
        client_config = ClientConfig {
            server_url: url.trim_end_matches('/').to_string(),
            ..client_config
        };
    }
    let overlay_config = OverlayConfig::from_env();

    let auth = Arc::new(Session::default());
    let client = Arc::new(BackendClient::new(&client_config, auth.clone())?);
    info!(server = %client_config.server_url, "Starting field map");

    match args.command {
        Command::SignIn { email, password } => {
            client.sign_in(&email, &password).await?;
            println!("{}", auth.token().unwrap_or_default());
        }
        Command::Fields => {
            for field in client.fields().await? {
                println!("{}\t{}", field.id, field.name);
            }
        }
        Command::Seasons { field_id } => {
            for season in client.season_options(field_id).await? {
                println!("{}\t{}", season.id, season.label);
            }
        }
        Command::DeterminePositions { field_id, season } => {
            println!("{}", client.determine_positions(field_id, season).await?);
        }
        Command::Show {
            field_id,
            season,
            ndvi,
            out,
        } => {
            let season = match season {
                Some(season) => season,
                None => client
                    .season_options(field_id)
                    .await?
                    .first()
                    .map(|option| option.id)
                    .context("field has no seasons")?,
            };
            let mut session = MapSession::new(client, &map_config, overlay_config, Arc::new(LogNotifier))?;
            session.load_metadata().await;
            session.select(field_id, season).await?;
            if let Some(record) = session.selection().and_then(|selection| selection.season.as_ref()) {
                info!(
                    season = %season.label(),
                    variety = record.variety.as_deref().unwrap_or("-"),
                    "Season record loaded"
                );
            }
            if ndvi {
                let shown = session.show_ndvi().await?;
                info!(raster = %shown.key, range = ?shown.range, "NDVI shown");
            }

            let mut legends = vec![("subfields", session.subfield_legend().to_svg())];
            if let Some(legend) = session.ndvi_legend() {
                legends.push(("ndvi", legend.to_svg()));
            }
            let dir = out.unwrap_or_else(|| map_config.export_dir.clone());
            for path in export::write_all(session.map(), &legends, &dir)? {
                println!("{}", path.display());
            }
        }
        Command::Register { name, vertices } => {
            let shape = vertices.iter().map(|v| parse_vertex(v)).collect::<Result<Vec<_>>>()?;
            let mut session = MapSession::new(client, &map_config, overlay_config, Arc::new(LogNotifier))?;
            session.handle_draw(DrawEvent::Created(vec![shape]))?;
            let field = session.register_drawn(&name).await?;
            println!("{}\t{}", field.id, field.name);
        }
        Command::Watch { field_id, season } => {
            let mut session = MapSession::new(client.clone(), &map_config, overlay_config, Arc::new(LogNotifier))?;
            session.load_metadata().await;
            session.select(field_id, season).await?;

            let mut events = client.events().await?;
            let mut signed_in = auth.subscribe();
            loop {
                tokio::select! {
                    event = events.next() => match event {
                        Some(Ok(event)) => match session.handle_event(&event) {
                            Ok(true) => info!(overlays = session.map().len(), "Map updated"),
                            Ok(false) => {}
                            Err(err) => warn!(error = %err, "Failed to apply event"),
                        },
                        Some(Err(err)) => warn!(error = %err, "Event stream error"),
                        None => {
                            warn!("Event stream closed");
                            break;
                        }
                    },
                    changed = signed_in.changed() => {
                        if changed.is_err() || signed_in.borrow().is_none() {
                            error!("Signed out, stopping");
                            session.signed_out();
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
