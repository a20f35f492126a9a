//! Binary entrypoint for the Moonshine client CLI.
//!
//! Commands:
//! - `init` - write a starter `moonshine.toml`
//! - `fight [--bot <slug>] [--attack <point> --defense <point>]` - show the current duel and
//!   optionally play one round
//! - `travel --location <slug> --cell <slug>` - move on a location map and follow the countdown
//! - `online [--rounds <n>]` - print the online roster
//!
//! See the library crate docs for module-level details: `moonshine_client::`.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{debug, info, warn};

use moonshine_client::api::credentials::Credentials;
use moonshine_client::api::http::HttpGameApi;
use moonshine_client::api::FightApi;
use moonshine_client::combat::{CombatPhase, CombatScreen, CombatSession};
use moonshine_client::config::Config;
use moonshine_client::metrics;
use moonshine_client::roster::OnlineRoster;
use moonshine_client::travel::{MapScreen, MoveOutcome, TravelPhase, TravelSettings};

#[derive(Parser)]
#[command(name = "moonshine-client")]
#[command(about = "Command-line client for the Moonshine browser RPG")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "moonshine.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show the current fight and optionally resolve one round
    Fight {
        /// Attack a bot in the current location first
        #[arg(short, long)]
        bot: Option<String>,
        /// Body point to attack
        #[arg(short, long, requires = "defense")]
        attack: Option<String>,
        /// Body point to defend
        #[arg(short, long, requires = "attack")]
        defense: Option<String>,
    },
    /// Move to a cell and follow the travel countdown until arrival
    Travel {
        /// Location slug (e.g., wayward_pines)
        #[arg(short, long)]
        location: String,
        /// Target cell slug (e.g., 12cell)
        #[arg(short = 'C', long)]
        cell: String,
    },
    /// Print who is online
    Online {
        /// Number of refreshes to print before exiting
        #[arg(short, long, default_value_t = 1)]
        rounds: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        info!("Initializing new client configuration");
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = match Config::load(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            init_logging(&None, cli.verbose);
            warn!("{} (using defaults)", e);
            Config::default()
        }
    };
    init_logging(&Some(config.clone()), cli.verbose);

    let credentials = Credentials::load(config.api.token_file.as_deref()).await;
    if !credentials.is_present() {
        warn!("No bearer token found; requests will be refused until you sign in");
    }
    let api = Arc::new(HttpGameApi::new(&config.api, credentials));

    match cli.command {
        Commands::Init => {}
        Commands::Fight {
            bot,
            attack,
            defense,
        } => {
            if let Some(bot) = bot {
                if let Err(e) = api.engage_bot(&bot).await {
                    println!("Error: {}", e.user_message());
                    return Ok(());
                }
            }
            let mut screen = CombatScreen::new(api);
            if let Err(e) = screen.load().await {
                println!("Error: {e}");
                return Ok(());
            }
            if let (Some(attack), Some(defense)) = (attack, defense) {
                match screen.submit_attack(&attack, &defense).await {
                    Ok(CombatPhase::Terminal) => info!("Fight finished"),
                    Ok(_) => {}
                    Err(e) => println!("Error: {e}"),
                }
            }
            if let Some(session) = screen.session() {
                print_fight(&session);
            }
        }
        Commands::Travel { location, cell } => {
            let settings = TravelSettings::from_config(&config);
            let tick = settings.countdown_tick;
            let map = MapScreen::open(api.clone(), &location, settings).await?;
            let images: Vec<String> = map
                .snapshot()
                .grid
                .image_names()
                .map(|name| format!("images/locations/{name}"))
                .collect();
            api.prefetch_images(images);

            match map.click_cell(&cell).await {
                Ok(MoveOutcome::Started(movement)) => {
                    println!(
                        "Travelling to {} ({}s)",
                        movement.target_cell, movement.total_time_seconds
                    );
                    let observer = map.observer();
                    loop {
                        tokio::time::sleep(tick).await;
                        let state = observer.snapshot();
                        if state.phase == TravelPhase::Idle {
                            break;
                        }
                        println!("  {}s remaining", state.remaining_time_seconds);
                    }
                    // the arrival refetch follows the last tick
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
                Ok(MoveOutcome::Arrived) => println!("Arrived"),
                Ok(MoveOutcome::Ignored(reason)) => println!("Nothing to do ({reason:?})"),
                Err(e) => println!("Error: {}", e.user_message()),
            }
            if let Some(here) = map.snapshot().player_cell_slug {
                println!("Player is at {here}");
            }
            map.close().await;
        }
        Commands::Online { rounds } => {
            let interval = Duration::from_millis(config.polling.roster_interval_ms);
            let roster = OnlineRoster::start(api, interval, None);
            for round in 0..rounds.max(1) {
                let wait = if round == 0 {
                    Duration::from_secs(2)
                } else {
                    interval
                };
                tokio::time::sleep(wait).await;
                let players = roster.players();
                println!("{} online", players.len());
                for player in players.iter() {
                    println!("  {} (lvl {})", player.name, player.level);
                }
            }
            roster.stop().await;
        }
    }

    log_metrics_summary();
    Ok(())
}

/// Session counters at exit; visible with `-v`.
fn log_metrics_summary() {
    let snap = metrics::snapshot();
    debug!(
        "attacks: {} submitted, {} failed, {} refused locally",
        snap.attacks_submitted, snap.attacks_failed, snap.attacks_refused_locally
    );
    debug!(
        "moves: {} started, {} rejected, {} ignored; countdowns: {} expired, {} corrected",
        snap.moves_started,
        snap.moves_rejected,
        snap.moves_ignored,
        snap.countdowns_expired,
        snap.countdowns_corrected
    );
    let mut polls: Vec<_> = metrics::poll_counters_snapshot().into_iter().collect();
    polls.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, counter) in polls {
        debug!(
            "poll '{}': {} ok, {} failed",
            name, counter.successes, counter.failures
        );
    }
}

fn print_fight(session: &CombatSession) {
    println!(
        "{} [{}%]  vs  {} [{}%]",
        session.player.name,
        session.player_hp_percent(),
        session.bot.name,
        session.bot_hp_percent()
    );
    for line in session.log_lines() {
        println!("  {line}");
    }
    match &session.winner {
        Some(winner) => {
            println!("Winner: {}", winner.name);
            if let Some(gold) = session.dropped_gold {
                println!("Dropped gold: {gold}");
            }
            if let Some(name) = session.dropped_item.as_ref().and_then(|i| i.name.as_deref()) {
                println!("Dropped item: {name}");
            }
        }
        None => println!("Points: {}", session.available_points.join(", ")),
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides config
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only when someone is watching
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
