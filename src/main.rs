use analytics::{AccuracyEngine, PerformanceSummary, PredictionFilter, PredictionPage};
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{Config, LogFormat};
use core_types::{Metrics, Prediction};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

mod logging;

/// The main entry point for the ViewTrends accuracy tooling.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; it only supplies VIEWTRENDS__* overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _log_guard = logging::init(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Metrics(args) => handle_metrics(args),
        Commands::Summarize(args) => handle_summarize(args),
        Commands::Query(args) => handle_query(args, config.analytics.default_page_limit),
        Commands::Serve(args) => {
            if let Some(addr) = args.addr {
                override_addr(&mut config, addr)?;
            }
            web_server::run_server(&config).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Measures how accurate view-count predictions turned out to be.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. A missing file means defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the configured log line format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute accuracy and error for a single predicted/actual pair.
    Metrics(MetricsArgs),
    /// Summarize the performance of a JSON file of predictions.
    Summarize(SummarizeArgs),
    /// List the predictions in a JSON file that match a filter.
    Query(QueryArgs),
    /// Run the HTTP API.
    Serve(ServeArgs),
}

#[derive(Parser)]
struct MetricsArgs {
    /// The forecast view count.
    #[arg(long, allow_negative_numbers = true)]
    predicted: f64,

    /// The view count that actually happened.
    #[arg(long, allow_negative_numbers = true)]
    actual: f64,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct SummarizeArgs {
    /// A JSON file holding an array of prediction records.
    #[arg(long)]
    input: PathBuf,

    /// Produce one summary per user_id.
    #[arg(long)]
    by_user: bool,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct QueryArgs {
    /// A JSON file holding an array of prediction records.
    #[arg(long)]
    input: PathBuf,

    /// Only predictions in this state: pending, completed or failed.
    #[arg(long)]
    status: Option<String>,

    #[arg(long)]
    user_id: Option<i64>,

    #[arg(long)]
    channel_id: Option<i64>,

    #[arg(long)]
    video_id: Option<i64>,

    /// Number of matches to skip.
    #[arg(long, default_value_t = 0)]
    skip: usize,

    /// Page size. Defaults to the configured one.
    #[arg(long)]
    limit: Option<usize>,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to listen on (e.g., "127.0.0.1:8080"). Defaults to the configured one.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_metrics(args: MetricsArgs) -> anyhow::Result<()> {
    let metrics = AccuracyEngine::new().compute_metrics(args.predicted, args.actual)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!("{}", metrics_table(&metrics));
    }
    Ok(())
}

fn handle_summarize(args: SummarizeArgs) -> anyhow::Result<()> {
    let predictions = load_predictions(&args.input)?;
    tracing::info!(count = predictions.len(), path = %args.input.display(), "Loaded predictions.");

    let engine = AccuracyEngine::new();

    if args.by_user {
        let summaries = engine.summarize_by_user(&predictions)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        } else {
            println!("{}", user_summary_table(&summaries));
        }
    } else {
        let summary = engine.summarize(&predictions)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{}", summary_table(&summary));
        }
    }
    Ok(())
}

fn handle_query(args: QueryArgs, default_page_limit: usize) -> anyhow::Result<()> {
    let predictions = load_predictions(&args.input)?;
    let filter = build_filter(&args, default_page_limit)?;
    let page = AccuracyEngine::new().query(&predictions, &filter);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("{}", page_table(&page));
        println!("Showing {} of {} matching predictions.", page.items.len(), page.total);
    }
    Ok(())
}

fn build_filter(args: &QueryArgs, default_page_limit: usize) -> anyhow::Result<PredictionFilter> {
    let mut filter = PredictionFilter {
        user_id: args.user_id,
        channel_id: args.channel_id,
        video_id: args.video_id,
        status: None,
        skip: args.skip,
        limit: Some(args.limit.unwrap_or(default_page_limit)),
    };
    if let Some(status) = &args.status {
        filter = filter.with_status_name(status)?;
    }
    Ok(filter)
}

/// Points the server at `addr`, keeping the config's validation rules.
fn override_addr(config: &mut Config, addr: SocketAddr) -> anyhow::Result<()> {
    config.server.host = addr.ip().to_string();
    config.server.port = addr.port();
    config.validate()?;
    Ok(())
}

/// Reads a JSON array of prediction records from disk.
fn load_predictions(path: &Path) -> anyhow::Result<Vec<Prediction>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of predictions", path.display()))
}

// ==============================================================================
// Rendering
// ==============================================================================

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn fmt_id(id: Option<i64>) -> String {
    id.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn metrics_table(metrics: &Metrics) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Accuracy score".to_string(), fmt_value(Some(metrics.accuracy_score))]);
    table.add_row(vec!["Absolute error".to_string(), fmt_value(Some(metrics.absolute_error))]);
    table.add_row(vec!["Percentage error".to_string(), fmt_value(Some(metrics.percentage_error))]);
    table
}

fn summary_table(summary: &PerformanceSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total predictions".to_string(), summary.total_predictions.to_string()]);
    table.add_row(vec!["Completed".to_string(), summary.completed_predictions.to_string()]);
    table.add_row(vec!["Pending".to_string(), summary.pending_predictions.to_string()]);
    table.add_row(vec!["Failed".to_string(), summary.failed_predictions().to_string()]);
    table.add_row(vec!["Average accuracy".to_string(), fmt_value(summary.average_accuracy)]);
    table.add_row(vec!["Average absolute error".to_string(), fmt_value(summary.average_absolute_error)]);
    table.add_row(vec!["Average percentage error".to_string(), fmt_value(summary.average_percentage_error)]);
    table.add_row(vec!["Best prediction".to_string(), fmt_id(summary.best_prediction_id)]);
    table.add_row(vec!["Worst prediction".to_string(), fmt_id(summary.worst_prediction_id)]);
    table.add_row(vec!["Calculated at".to_string(), summary.last_calculated_at.to_rfc3339()]);
    table
}

fn page_table(page: &PredictionPage) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "User", "Status", "Predicted", "Actual", "Accuracy"]);
    for p in &page.items {
        table.add_row(vec![
            p.id.to_string(),
            fmt_id(p.user_id),
            p.status.to_string(),
            p.predicted_views.to_string(),
            p.actual_views.map_or_else(|| "n/a".to_string(), |v| v.to_string()),
            fmt_value(p.accuracy_score),
        ]);
    }
    table
}

fn user_summary_table(summaries: &BTreeMap<i64, PerformanceSummary>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "User", "Total", "Completed", "Pending", "Avg accuracy", "Avg abs error", "Avg % error", "Best", "Worst",
    ]);
    for (user_id, s) in summaries {
        table.add_row(vec![
            user_id.to_string(),
            s.total_predictions.to_string(),
            s.completed_predictions.to_string(),
            s.pending_predictions.to_string(),
            fmt_value(s.average_accuracy),
            fmt_value(s.average_absolute_error),
            fmt_value(s.average_percentage_error),
            fmt_id(s.best_prediction_id),
            fmt_id(s.worst_prediction_id),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_with_address() {
        let cli = Cli::try_parse_from(["viewtrends", "serve", "--addr", "127.0.0.1:9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.addr, Some("127.0.0.1:9000".parse().unwrap())),
            _ => panic!("expected serve"),
        }
        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn ipv6_serve_address_overrides_config() {
        let cli = Cli::try_parse_from(["viewtrends", "serve", "--addr", "[::1]:8080"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let addr = args.addr.unwrap();

        let mut config = Config::default();
        override_addr(&mut config, addr).unwrap();
        assert_eq!(config.server.socket_addr().unwrap(), addr);
    }

    #[test]
    fn query_filter_parses_status_names() {
        let cli = Cli::try_parse_from([
            "viewtrends", "query", "--input", "p.json", "--status", "Completed", "--user-id", "4",
        ])
        .unwrap();
        let Commands::Query(args) = cli.command else {
            panic!("expected query");
        };

        let filter = build_filter(&args, 50).unwrap();
        assert_eq!(filter.status, Some(core_types::PredictionStatus::Completed));
        assert_eq!(filter.user_id, Some(4));
        assert_eq!(filter.limit, Some(50));
    }

    #[test]
    fn query_filter_rejects_unknown_status() {
        let cli = Cli::try_parse_from(["viewtrends", "query", "--input", "p.json", "--status", "archived"]).unwrap();
        let Commands::Query(args) = cli.command else {
            panic!("expected query");
        };

        let err = build_filter(&args, 50).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<analytics::AnalyticsError>(),
            Some(analytics::AnalyticsError::Core(_))
        ));
    }

    #[test]
    fn page_table_lists_matches() {
        let predictions = vec![Prediction::pending(1, 5), Prediction::pending(2, 7)];
        let page = AccuracyEngine::new().query(&predictions, &PredictionFilter::default());
        let rendered = page_table(&page).to_string();
        assert!(rendered.contains("pending"));
        assert!(rendered.contains("7"));
    }

    #[test]
    fn parses_negative_metrics_input_for_engine_validation() {
        let cli = Cli::try_parse_from(["viewtrends", "metrics", "--predicted", "-1", "--actual", "10"]).unwrap();
        let Commands::Metrics(args) = cli.command else {
            panic!("expected metrics");
        };
        assert!(handle_metrics(args).is_err());
    }

    #[test]
    fn loads_predictions_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 1, "predicted_views": 10, "status": "pending"}},
                {{"id": 2, "predicted_views": 20, "actual_views": 20, "status": "completed",
                  "accuracy_score": 100.0, "absolute_error": 0.0, "percentage_error": 0.0}}]"#
        )
        .unwrap();

        let predictions = load_predictions(file.path()).unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(predictions[1].is_completed());
    }

    #[test]
    fn malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"not\": \"an array\"}}").unwrap();
        let err = load_predictions(file.path()).unwrap_err();
        assert!(err.to_string().contains("not a JSON array"));
    }

    #[test]
    fn summary_table_shows_missing_values() {
        let summary = AccuracyEngine::new().summarize(&[Prediction::pending(1, 5)]).unwrap();
        let rendered = summary_table(&summary).to_string();
        assert!(rendered.contains("Average accuracy"));
        assert!(rendered.contains("n/a"));
    }

    #[test]
    fn user_table_has_a_row_per_user() {
        let predictions = vec![
            Prediction::pending(1, 5).with_user(10),
            Prediction::pending(2, 5).with_user(20),
        ];
        let summaries = AccuracyEngine::new().summarize_by_user(&predictions).unwrap();
        let rendered = user_summary_table(&summaries).to_string();
        assert!(rendered.contains("10"));
        assert!(rendered.contains("20"));
    }
}
