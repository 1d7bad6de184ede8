use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use price_dash_core::dataset::Dataset;
use price_dash_core::ingest::loader::{CsvFileLoader, DatasetLoader};
use price_dash_core::query::{QueryError, YearQuery};
use price_dash_core::response::{ErrorResponse, YearResponse};

#[derive(Debug, Parser)]
#[command(name = "price_dash_cli")]
struct Args {
    /// Price CSV to load. Defaults to PRICE_DATA_PATH, then TSLA.csv.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the year query and print the JSON payload.
    Query {
        /// Calendar year, e.g. 2020.
        #[arg(long)]
        year: String,

        /// Row cap override. Defaults to QUERY_ROW_LIMIT, then 15.
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        pretty: bool,
    },
    /// Print record count, date range and years present.
    Summary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = price_dash_core::config::Settings::from_env();
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let data_path = args.data.unwrap_or_else(|| settings.data_path.clone());
    let loader = CsvFileLoader::new(data_path);
    let dataset = loader.load().await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        e
    })?;

    match args.command {
        Command::Query {
            year,
            limit,
            pretty,
        } => {
            let mut query = YearQuery::new(Arc::new(dataset))
                .with_percent_change_policy(settings.require_percent_change_policy()?);
            if let Some(limit) = limit.or(settings.row_limit) {
                query = query.with_row_limit(limit);
            }

            let (out, failure) = render_query(&query, &year, pretty)?;
            println!("{out}");
            if let Some(err) = failure {
                // Returned rather than exiting so the sentry guard still flushes.
                return Err(anyhow::Error::new(err).context("year query failed"));
            }
        }
        Command::Summary => {
            println!("{}", summarize(&loader.source_name(), &dataset));
        }
    }

    Ok(())
}

/// JSON for stdout, plus the query error when the payload is an error body.
fn render_query(
    query: &YearQuery,
    year: &str,
    pretty: bool,
) -> anyhow::Result<(String, Option<QueryError>)> {
    match query.run(year) {
        Ok(result) => Ok((to_json(&YearResponse::from(result), pretty)?, None)),
        Err(err) => {
            tracing::warn!(kind = err.kind(), input = %year, "year query rejected");
            Ok((to_json(&ErrorResponse::from(&err), pretty)?, Some(err)))
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize output")
}

fn summarize(source: &str, dataset: &Dataset) -> String {
    let range = match (dataset.first_date(), dataset.last_date()) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => "-".to_string(),
    };
    let years: Vec<String> = dataset.years().iter().map(|y| y.to_string()).collect();

    format!(
        "source:  {source}\nrecords: {}\nrange:   {range}\nyears:   {}",
        dataset.len(),
        if years.is_empty() {
            "-".to_string()
        } else {
            years.join(", ")
        }
    )
}

fn init_sentry(settings: &price_dash_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
