use std::{fs::File, net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use foodgram::{
    actions::load_ingredients,
    api::{routes, AppState},
    config::Config,
    ingest::read_ingredients_csv,
    jwt::SessionKey,
    logger,
};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

#[derive(Parser, Debug)]
#[command(name = "foodgram", version, about = "Recipe sharing backend")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Import reference ingredients from a header-less `name,measurement_unit` CSV
    LoadIngredients { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    let config = Config::load()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, pool).await,
        Command::LoadIngredients { path } => load(path, pool).await,
    }
}

async fn serve(config: Config, pool: Pool<Postgres>) -> anyhow::Result<()> {
    let key = SessionKey::new(&config.secret_key)?;
    let state = AppState::new(pool, key, config.body_limit);

    let (addr, server) = warp::serve(routes(state)).bind_with_graceful_shutdown(
        SocketAddr::from(([0, 0, 0, 0], config.port)),
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
        },
    );

    log::info!("Listening on {addr}");
    server.await;
    log::info!("Server stopped");

    Ok(())
}

async fn load(path: PathBuf, pool: Pool<Postgres>) -> anyhow::Result<()> {
    let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    let rows = read_ingredients_csv(file)?;
    let summary = load_ingredients(&rows, &pool).await?;

    log::info!(
        "Loaded {}: {} inserted, {} skipped",
        path.display(),
        summary.inserted,
        summary.skipped
    );
    println!(
        "Ingredients inserted: {}, already present: {}",
        summary.inserted, summary.skipped
    );

    Ok(())
}
