use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cfrec::{Config, RecommendationError, RecommendationService, RequestParams, UserIdPolicy};

/// Recommend items from a folder of CSV ratings.
#[derive(Parser, Debug)]
#[command(name = "cfrec", version)]
struct Cli {
    /// Folder holding movies.csv and ratings.csv.
    #[arg(long, env = "CFREC_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Only create profiles for users that appear in the ratings.
    #[arg(long)]
    observed_users: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every user.
    Users,
    /// Rank the users most similar to USER.
    Similar {
        #[arg(long)]
        user: String,
        #[arg(long)]
        results: Option<String>,
    },
    /// Recommend items USER has not rated.
    Recommend {
        #[arg(long)]
        user: String,
        #[arg(long)]
        results: Option<String>,
        #[arg(long)]
        min_ratings: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), failure::Error> {
    let stdout = io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value)?;
    println!();

    Ok(())
}

fn run(cli: Cli) -> Result<(), failure::Error> {
    let policy = if cli.observed_users {
        UserIdPolicy::Observed
    } else {
        UserIdPolicy::Contiguous
    };
    let config = Config::default()
        .with_data_dir(cli.data_dir)
        .with_user_id_policy(policy);

    let start = Instant::now();
    let service = RecommendationService::new(config.load_store()?);
    info!(elapsed = ?start.elapsed(), "store ready");

    let default_results = config.default_results().to_string();
    let default_min_ratings = config.default_min_ratings().to_string();

    match cli.command {
        Command::Users => print_json(&service.users()),
        Command::Similar { user, results } => {
            let results = results.unwrap_or(default_results);
            let params = RequestParams::parse(&user, &results, None)?;

            print_json(&service.similar_users(&params)?)
        }
        Command::Recommend {
            user,
            results,
            min_ratings,
        } => {
            let results = results.unwrap_or(default_results);
            let min_ratings = min_ratings.unwrap_or(default_min_ratings);
            let params = RequestParams::parse(&user, &results, Some(&min_ratings))?;

            print_json(&service.recommended_items(&params)?)
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("{}", err);

        // Bad requests exit with 2, everything else with 1.
        let client_error = err
            .downcast_ref::<RecommendationError>()
            .map(|x| x.is_client_error())
            .unwrap_or(false);
        process::exit(if client_error { 2 } else { 1 });
    }
}
