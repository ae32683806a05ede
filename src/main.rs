use alumni_search::{
    config::Config,
    models::{PopularityPeriod, SessionContext},
    search::{ExportConfig, ExportField, ExportFormat, SearchFilters, SearchQuery, SortDirection, SortField},
    session::SearchSession,
    state::InMemoryContentStore,
    SearchPlatform,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "alumni-search")]
#[command(about = "Alumni platform search CLI", version, long_about = None)]
struct Cli {
    /// JSON seed file of content collections (overrides `data.seed_path`)
    #[arg(short, long, env = "ALUMNI_SEARCH_SEED")]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query; an empty query browses everything
    Search {
        #[arg(default_value = "")]
        query: String,

        /// Restrict to content types (repeatable)
        #[arg(short = 't', long = "type")]
        content_types: Vec<String>,

        /// Require tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(short, long, default_value = "0")]
        page: usize,

        #[arg(short, long, default_value = "20")]
        limit: usize,

        #[arg(long, default_value = "relevance")]
        sort: SortField,

        #[arg(long, default_value = "desc")]
        direction: SortDirection,

        /// Exact matching only
        #[arg(long)]
        exact: bool,
    },

    /// Suggest completions for a partial query
    Suggest {
        #[arg(value_name = "PARTIAL")]
        partial: String,
    },

    /// Build the index and print its status
    Status,

    /// Export results as csv or json
    Export {
        #[arg(default_value = "")]
        query: String,

        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// Columns to export (comma separated)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<ExportField>,

        #[arg(long)]
        include_metadata: bool,

        #[arg(short, long, default_value = "1000")]
        max_results: usize,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay queries through a session and print the popular searches
    Popular {
        /// Queries to run before aggregating (repeatable)
        #[arg(short, long = "replay")]
        replay: Vec<String>,

        #[arg(short, long, default_value = "week")]
        period: PopularityPeriod,

        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });
    if let Some(seed) = cli.seed {
        config.data.seed_path = Some(seed);
    }
    config
        .analytics
        .validate()
        .context("invalid analytics configuration")?;

    init_tracing(&config);

    if config.observability.metrics_enabled {
        if let Err(e) = alumni_search::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
    }

    let store = match &config.data.seed_path {
        Some(path) => InMemoryContentStore::from_json_file(path)
            .await
            .with_context(|| format!("failed to load seed file {}", path.display()))?,
        None => {
            tracing::warn!("No seed file configured; the index will be empty");
            InMemoryContentStore::new()
        }
    };
    tracing::info!(records = store.len(), "Content store loaded");

    let platform = Arc::new(SearchPlatform::in_memory(config, Arc::new(store)));
    let report = platform.index_all_content().await;
    for error in &report.errors {
        tracing::warn!(content_type = %error.content_type, "{}", error.message);
    }

    match cli.command {
        Commands::Search {
            query,
            content_types,
            tags,
            page,
            limit,
            sort,
            direction,
            exact,
        } => {
            let mut filters = SearchFilters::default();
            if !content_types.is_empty() {
                filters = filters.with_content_types(content_types);
            }
            if !tags.is_empty() {
                filters = filters.with_tags(tags);
            }
            let query = SearchQuery::new(query)
                .with_filters(filters)
                .with_sort(sort, direction)
                .with_page(page)
                .with_limit(limit)
                .with_fuzzy(!exact);

            print_json(&platform.search(&query).await?)?;
        }

        Commands::Suggest { partial } => {
            print_json(&platform.get_suggestions(&partial).await?)?;
        }

        Commands::Status => {
            print_json(&platform.get_indexing_status())?;
        }

        Commands::Export {
            query,
            format,
            fields,
            include_metadata,
            max_results,
            output,
        } => {
            let export = ExportConfig {
                query,
                fields,
                include_metadata,
                max_results,
                ..ExportConfig::new(format)
            };
            let payload = platform.export_results(&export).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &payload)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), bytes = payload.len(), "Export written");
                }
                None => println!("{}", String::from_utf8_lossy(&payload)),
            }
        }

        Commands::Popular {
            replay,
            period,
            limit,
        } => {
            let session = SearchSession::new(platform.clone(), SessionContext::new("cli"));
            session.mount().await;
            for query in &replay {
                if let Err(e) = session.search(query, None).await {
                    tracing::warn!(query = %query, "{}", e);
                }
            }
            print_json(&platform.analytics().get_popular_searches(period, limit).await?)?;
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("alumni_search={}", config.observability.log_level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays machine-readable
    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
