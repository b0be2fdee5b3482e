//! Trackwise CLI - Command-line interface for the Trackwise insight engine
//!
//! Commands:
//! - report: Run pattern detection and print the insight report
//! - trend: Moving-average trend of one metric
//! - correlate: Correlation between two metrics
//! - period: Insights over a time range
//! - validate: Check entries against metric definitions

use chrono::{DateTime, FixedOffset};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use trackwise::analysis::{metric_trend, Correlation, MetricTrend, TimeBucket};
use trackwise::period::{period_insights, PeriodInsights, TimeSlot};
use trackwise::store::{MemoryMetricRegistry, MetricRegistry};
use trackwise::types::{parse_entries, Entry, MetricId};
use trackwise::{InsightConfig, InsightEngine, InsightError, InsightReport, Severity};
use trackwise::{PRODUCER_NAME, TRACKWISE_VERSION};

/// Trackwise - On-device pattern detection for self-tracking data
#[derive(Parser)]
#[command(name = "trackwise")]
#[command(version = TRACKWISE_VERSION)]
#[command(about = "Detect patterns and concerns in self-tracking entries", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Entries file, JSON array or NDJSON (use - for stdin)
    #[arg(short, long, default_value = "-")]
    entries: PathBuf,

    /// Metric definitions file (JSON array); built-in defaults when omitted
    #[arg(short, long)]
    metrics: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "json-pretty")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every analyzer and print the insight report
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rapid-logging window in minutes
        #[arg(long)]
        rapid_window: Option<u32>,

        /// Minimum entries before pattern detection runs
        #[arg(long)]
        min_entries: Option<usize>,

        /// Skip correlation discovery
        #[arg(long)]
        no_correlations: bool,
    },

    /// Moving-average trend of one metric
    Trend {
        #[command(flatten)]
        input: InputArgs,

        /// Metric id
        #[arg(long)]
        metric: String,

        /// Window size in values
        #[arg(long)]
        window: Option<usize>,
    },

    /// Correlation between two metrics
    Correlate {
        #[command(flatten)]
        input: InputArgs,

        /// First metric id
        #[arg(long)]
        metric_a: String,

        /// Second metric id
        #[arg(long)]
        metric_b: String,
    },

    /// Insights over a time range (defaults to the full history)
    Period {
        #[command(flatten)]
        input: InputArgs,

        /// Range start, RFC 3339 (inclusive)
        #[arg(long)]
        from: Option<DateTime<FixedOffset>>,

        /// Range end, RFC 3339 (inclusive)
        #[arg(long)]
        to: Option<DateTime<FixedOffset>>,
    },

    /// Check entries against metric definitions
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable summary
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logging is best effort; a failed init must not stop the command
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), TrackwiseCliError> {
    debug!(producer = PRODUCER_NAME, version = TRACKWISE_VERSION, "starting");

    match cli.command {
        Commands::Report {
            input,
            config,
            rapid_window,
            min_entries,
            no_correlations,
        } => cmd_report(
            &input,
            config.as_deref(),
            rapid_window,
            min_entries,
            no_correlations,
        ),

        Commands::Trend {
            input,
            metric,
            window,
        } => cmd_trend(&input, &metric, window),

        Commands::Correlate {
            input,
            metric_a,
            metric_b,
        } => cmd_correlate(&input, &metric_a, &metric_b),

        Commands::Period { input, from, to } => cmd_period(&input, from, to),

        Commands::Validate { input } => cmd_validate(&input),
    }
}

fn cmd_report(
    input: &InputArgs,
    config_path: Option<&Path>,
    rapid_window: Option<u32>,
    min_entries: Option<usize>,
    no_correlations: bool,
) -> Result<(), TrackwiseCliError> {
    let mut config = match config_path {
        Some(path) => InsightConfig::from_json(&fs::read_to_string(path)?)?,
        None => InsightConfig::default(),
    };

    if let Some(window) = rapid_window {
        config.rapid_logging_window_minutes = window;
    }
    if let Some(min) = min_entries {
        config.min_entries_for_report = min;
    }
    if no_correlations {
        config.surface_correlations = false;
    }

    let engine = InsightEngine::new(config)?;
    let entries = read_entries(&input.entries)?;
    let registry = read_registry(input.metrics.as_deref())?;

    let report = engine.report(&entries, &registry.list_metrics());
    write_output(&report, &input.format, render_report)
}

fn cmd_trend(
    input: &InputArgs,
    metric: &str,
    window: Option<usize>,
) -> Result<(), TrackwiseCliError> {
    let entries = read_entries(&input.entries)?;
    let registry = read_registry(input.metrics.as_deref())?;
    let metric_id = resolve_metric(&registry, metric)?;

    let window = window.unwrap_or(InsightConfig::default().trend_window);
    if window == 0 {
        return Err(InsightError::InvalidConfig("trend window must be at least 1".to_string()).into());
    }

    let trend = metric_trend(&entries, &metric_id, window)
        .ok_or_else(|| TrackwiseCliError::InsufficientData(metric_id.to_string()))?;
    write_output(&trend, &input.format, render_trend)
}

fn cmd_correlate(
    input: &InputArgs,
    metric_a: &str,
    metric_b: &str,
) -> Result<(), TrackwiseCliError> {
    let entries = read_entries(&input.entries)?;
    let registry = read_registry(input.metrics.as_deref())?;
    let a = resolve_metric(&registry, metric_a)?;
    let b = resolve_metric(&registry, metric_b)?;

    let correlation = InsightEngine::default()
        .correlate(&entries, &a, &b)
        .ok_or_else(|| TrackwiseCliError::InsufficientData(format!("{} / {}", a, b)))?;
    write_output(&correlation, &input.format, render_correlation)
}

fn cmd_period(
    input: &InputArgs,
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
) -> Result<(), TrackwiseCliError> {
    let entries: Vec<Entry> = read_entries(&input.entries)?
        .into_iter()
        .filter(|e| from.map_or(true, |start| e.timestamp >= start))
        .filter(|e| to.map_or(true, |end| e.timestamp <= end))
        .collect();
    let registry = read_registry(input.metrics.as_deref())?;

    info!(entries = entries.len(), "computing period insights");
    let insights = period_insights(&entries, &registry.list_metrics());
    write_output(&insights, &input.format, render_period)
}

fn cmd_validate(input: &InputArgs) -> Result<(), TrackwiseCliError> {
    let entries = read_entries(&input.entries)?;
    let registry = read_registry(input.metrics.as_deref())?;

    let mut errors = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        for (metric_id, value) in &entry.values {
            let result = match registry.metric(metric_id) {
                Some(metric) => metric.validate_value(value),
                None => Err(InsightError::UnknownMetric(metric_id.to_string())),
            };
            if let Err(e) = result {
                errors.push(ValidationErrorDetail {
                    index,
                    entry_id: entry.id.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    let invalid_entries = {
        let mut indices: Vec<usize> = errors.iter().map(|e| e.index).collect();
        indices.dedup();
        indices.len()
    };

    let report = ValidationReport {
        total_entries: entries.len(),
        valid_entries: entries.len() - invalid_entries,
        invalid_entries,
        errors,
    };

    write_output(&report, &input.format, render_validation)?;

    if report.invalid_entries > 0 {
        Err(TrackwiseCliError::ValidationFailed(report.invalid_entries))
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, TrackwiseCliError> {
    if path.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(TrackwiseCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_entries(path: &Path) -> Result<Vec<Entry>, TrackwiseCliError> {
    let entries = parse_entries(&read_input(path)?)?;
    debug!(count = entries.len(), "entries loaded");
    Ok(entries)
}

fn read_registry(path: Option<&Path>) -> Result<MemoryMetricRegistry, TrackwiseCliError> {
    match path {
        Some(path) => Ok(MemoryMetricRegistry::from_json(&fs::read_to_string(path)?)?),
        None => Ok(MemoryMetricRegistry::with_defaults()),
    }
}

/// Accept either a metric id or a metric name
fn resolve_metric(
    registry: &MemoryMetricRegistry,
    key: &str,
) -> Result<MetricId, TrackwiseCliError> {
    let id = MetricId::from(key);
    if registry.metric(&id).is_some() {
        return Ok(id);
    }
    registry
        .by_name(key)
        .map(|m| m.id.clone())
        .ok_or_else(|| InsightError::UnknownMetric(key.to_string()).into())
}

fn write_output<T: Serialize>(
    value: &T,
    format: &OutputFormat,
    render: fn(&T) -> String,
) -> Result<(), TrackwiseCliError> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Text => render(value),
    };
    println!("{}", output);
    Ok(())
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "[HIGH]",
        Severity::Medium => "[MED]",
        Severity::Low => "[LOW]",
    }
}

fn render_report(report: &InsightReport) -> String {
    let mut out = vec![
        "Insight Report".to_string(),
        "==============".to_string(),
        format!("Entries: {}", report.entry_count),
    ];

    if !report.sufficient_data {
        out.push("Not enough entries for pattern detection yet.".to_string());
        return out.join("\n");
    }

    out.push(String::new());
    if report.concerns.is_empty() {
        out.push("No concerns detected.".to_string());
    } else {
        out.push("Concerns:".to_string());
        for concern in &report.concerns {
            out.push(format!("  {} {}", severity_tag(concern.severity), concern.message));
            if let Some(details) = &concern.details {
                out.push(format!("         {}", details));
            }
        }
    }

    out.push(String::new());
    out.push("Time of day:".to_string());
    for bucket in TimeBucket::ALL {
        out.push(format!(
            "  {:<26} {}",
            bucket.label(),
            report.time_of_day.count(bucket)
        ));
    }
    if let Some(bucket) = report.time_of_day.most_active {
        out.push(format!("  Most active: {}", bucket.label()));
    }

    out.push(String::new());
    out.push("Completion:".to_string());
    for rate in &report.completion.rates {
        out.push(format!("  {:<20} {:>5.1}% ({})", rate.name, rate.rate, rate.count));
    }

    if let Some(gap) = &report.avoidance.longest {
        out.push(String::new());
        out.push(format!("Longest gap: {:.1} days", gap.duration_days()));
    }

    if !report.correlations.is_empty() {
        out.push(String::new());
        out.push("Correlations:".to_string());
        for c in &report.correlations {
            out.push(format!(
                "  {} / {}: {} (r = {:.2})",
                c.names[0], c.names[1], c.description, c.correlation.coefficient
            ));
        }
    }

    out.join("\n")
}

fn render_trend(trend: &MetricTrend) -> String {
    format!(
        "{}: {:?} (recent {:.2}, older {:.2}, change {:+.2}, {} values, window {})",
        trend.metric_id,
        trend.direction,
        trend.recent_average,
        trend.older_average,
        trend.change,
        trend.sample_size,
        trend.window_size
    )
}

fn render_correlation(correlation: &Correlation) -> String {
    format!(
        "{} (r = {:.2}, n = {})",
        correlation.description(),
        correlation.coefficient,
        correlation.sample_size
    )
}

fn render_period(insights: &PeriodInsights) -> String {
    if !insights.has_data {
        return insights.message.clone().unwrap_or_default();
    }

    let mut out = vec![format!(
        "{} entries over {} days",
        insights.total_entries, insights.days_tracked
    )];

    if let Some(patterns) = &insights.patterns {
        out.push("Time of day:".to_string());
        for slot in TimeSlot::ALL {
            let count = patterns.time_of_day.get(&slot).copied().unwrap_or(0);
            out.push(format!("  {:<10} {}", format!("{:?}", slot), count));
        }
        out.push("Day of week:".to_string());
        for day in &patterns.day_of_week {
            out.push(format!("  {:<10} {}", day.weekday, day.count));
        }
    }

    if !insights.trends.is_empty() {
        out.push("Trends:".to_string());
        for (name, trend) in &insights.trends {
            let change = trend
                .change_percent
                .map(|p| format!("{:+.1}%", p))
                .unwrap_or_else(|| "n/a".to_string());
            out.push(format!("  {:<20} {:?} ({})", name, trend.direction, change));
        }
    }

    for c in &insights.correlations {
        out.push(format!("  {} / {}: {}", c.names[0], c.names[1], c.description));
    }

    for rec in &insights.recommendations {
        out.push(format!("Tip: {}", rec.message));
    }

    out.join("\n")
}

fn render_validation(report: &ValidationReport) -> String {
    let mut out = vec![
        "Validation Report".to_string(),
        "=================".to_string(),
        format!("Total entries:   {}", report.total_entries),
        format!("Valid entries:   {}", report.valid_entries),
        format!("Invalid entries: {}", report.invalid_entries),
    ];

    if !report.errors.is_empty() {
        out.push("\nErrors:".to_string());
        for err in &report.errors {
            out.push(format!(
                "  - Entry {} (index {}): {}",
                err.entry_id, err.index, err.error
            ));
        }
    }

    out.join("\n")
}

// Error types

#[derive(Debug)]
enum TrackwiseCliError {
    Io(io::Error),
    Insight(InsightError),
    Json(serde_json::Error),
    NoInput,
    InsufficientData(String),
    ValidationFailed(usize),
}

impl From<io::Error> for TrackwiseCliError {
    fn from(e: io::Error) -> Self {
        TrackwiseCliError::Io(e)
    }
}

impl From<InsightError> for TrackwiseCliError {
    fn from(e: InsightError) -> Self {
        TrackwiseCliError::Insight(e)
    }
}

impl From<serde_json::Error> for TrackwiseCliError {
    fn from(e: serde_json::Error) -> Self {
        TrackwiseCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TrackwiseCliError> for CliError {
    fn from(e: TrackwiseCliError) -> Self {
        match e {
            TrackwiseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TrackwiseCliError::Insight(e) => {
                let (code, hint) = match &e {
                    InsightError::ParseError(_) | InsightError::JsonError(_) => {
                        ("PARSE_ERROR", "Entries must be a JSON array or NDJSON")
                    }
                    InsightError::DuplicateMetric(_) => {
                        ("DUPLICATE_METRIC", "Metric names must be unique")
                    }
                    InsightError::UnknownMetric(_) => {
                        ("UNKNOWN_METRIC", "Pass a metric id or name from the metrics file")
                    }
                    InsightError::InvalidValue { .. } => {
                        ("INVALID_VALUE", "Run 'trackwise validate' for details")
                    }
                    InsightError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Check the configuration file and flags")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TrackwiseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TrackwiseCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No entries on stdin".to_string(),
                hint: Some("Pipe entries on stdin or pass --entries <file>".to_string()),
            },
            TrackwiseCliError::InsufficientData(subject) => CliError {
                code: "INSUFFICIENT_DATA".to_string(),
                message: format!("Not enough numeric values for {}", subject),
                hint: Some("Log more entries with this metric".to_string()),
            },
            TrackwiseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} entries failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    total_entries: usize,
    valid_entries: usize,
    invalid_entries: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    entry_id: String,
    error: String,
}
