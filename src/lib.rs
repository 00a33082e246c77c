pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod models;
pub mod services;
pub mod state;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{
    Cli, Commands, ConfigCommands, cmd_config_init, cmd_config_show, cmd_details, cmd_genres,
    cmd_interactive, cmd_search, cmd_top,
};
pub use config::Config;
use state::AppState;

pub async fn run() -> anyhow::Result<()> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };

    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Init => cmd_config_init(),
            ConfigCommands::Show => cmd_config_show(&config),
        },
        command => {
            let state = AppState::new(config)?;
            debug!("Application state initialized");
            dispatch(&state, command).await
        }
    }
}

async fn dispatch(state: &AppState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Top {
            refresh,
            genre,
            limit,
        } => cmd_top(state, refresh, genre.as_deref(), limit).await,

        Commands::Genres { refresh } => cmd_genres(state, refresh).await,

        Commands::Search { query, sort, order } => {
            cmd_search(state, &query.join(" "), sort, order).await
        }

        Commands::Details { id } => cmd_details(state, id).await,

        Commands::Interactive => cmd_interactive(state).await,

        Commands::Config { command } => match command {
            ConfigCommands::Init => cmd_config_init(),
            ConfigCommands::Show => cmd_config_show(&state.config),
        },
    }
}

fn print_help() {
    println!("Cinelist - Top-rated movie catalogue");
    println!();
    println!("Usage: cinelist <command> [args]");
    println!();
    println!("Commands:");
    println!("  top [--refresh] [--genre <name>] [--limit <n>]   List the top-rated catalogue");
    println!("  genres [--refresh]                               List movie genres");
    println!("  search <query> [--sort title|rank] [--order asc|desc]");
    println!("                                                   Search the catalogue by title");
    println!("  details <id>                                     Show details for a movie");
    println!("  interactive                                      Live search from stdin");
    println!("  config init|show                                 Manage the config file");
    println!();
    println!("The API key is read from TMDB_API_KEY (or tmdb.api_key in config.toml).");
}
