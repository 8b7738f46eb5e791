use anyhow::Result;
use baconpath::graph::{Explorer, LevelPolicy, SearchOutcome};
use baconpath::report::{render_json, render_text};
use baconpath::{Actor, Config, SparqlClient};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FOUND: u8 = 0;
const EXIT_NOT_FOUND: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "baconpath", version)]
#[command(about = "Find the shortest co-star routes from an actor to Kevin Bacon via DBpedia")]
struct Args {
    /// DBpedia resource name of the starting actor (e.g. Gillian_Anderson)
    actor: String,

    /// Target actor instead of the configured one
    #[arg(long)]
    target: Option<String>,

    /// Maximum number of hops to search
    #[arg(long)]
    max_hops: Option<usize>,

    /// Stop a level at the first route found (may miss equal-length routes)
    #[arg(long)]
    early_exit: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Config file (default: $BACONPATH_CONFIG or ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let result = run(args).await;
    if let Err(e) = &result {
        log::error!("Search failed: {:#}", e);
        eprintln!("Error: {:#}", e);
    }
    ExitCode::from(exit_code(&result))
}

/// 0 when a route was found, 1 when the search finished without one,
/// 2 when it could not finish.
fn exit_code(result: &Result<SearchOutcome>) -> u8 {
    match result {
        Ok(outcome) if outcome.is_found() => EXIT_FOUND,
        Ok(_) => EXIT_NOT_FOUND,
        Err(_) => EXIT_ERROR,
    }
}

async fn run(args: Args) -> Result<SearchOutcome> {
    let mut config = Config::load(args.config.as_deref())?;

    // Logs go to stderr; stdout carries the report
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.logging.log_level.as_str())
    ).init();

    if let Some(target) = args.target {
        config.search.target = target;
    }
    if let Some(max_hops) = args.max_hops {
        config.search.max_hops = max_hops;
    }
    if args.early_exit {
        config.search.early_exit = true;
    }
    config.validate()?;

    let source = Actor::parse(&args.actor)?;
    let target = Actor::parse(&config.search.target)?;
    let policy = if config.search.early_exit {
        LevelPolicy::EarlyExit
    } else {
        LevelPolicy::CompleteLevel
    };

    log::info!("Starting baconpath v{}", env!("CARGO_PKG_VERSION"));
    log::info!("SPARQL endpoint: {}", config.sparql.endpoint);

    let client = SparqlClient::new(&config.sparql)?;
    let explorer = Explorer::new(client, target)
        .with_max_hops(config.search.max_hops)
        .with_policy(policy)
        .with_search_timeout(config.search_timeout());

    let outcome = explorer.search(&source).await?;

    if args.json {
        println!("{}", render_json(&source, explorer.target(), &outcome)?);
    } else {
        print!("{}", render_text(&outcome, explorer.target()));
    }

    let stats = outcome.stats();
    log::info!(
        "{} queries, {} actors and {} films visited",
        stats.queries,
        stats.actors_visited,
        stats.films_visited
    );

    Ok(outcome)
}
