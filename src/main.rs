// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

use page_localizer::app_config::{Config, LogLevel};
use page_localizer::localization::{LocalizationMode, LocalizationPipeline, LocalizationRequest};
use page_localizer::providers::openrouter::OpenRouter;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for LocalizationMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliMode {
    Units,
    Document,
    Auto,
}

impl From<CliMode> for LocalizationMode {
    fn from(cli_mode: CliMode) -> Self {
        match cli_mode {
            CliMode::Units => LocalizationMode::Units,
            CliMode::Document => LocalizationMode::Document,
            CliMode::Auto => LocalizationMode::Auto,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Localize an HTML page
    Localize(LocalizeArgs),

    /// Generate shell completions for page-localizer
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct LocalizeArgs {
    /// HTML file to localize
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Target language, as an ISO 639 code or an English name (e.g. 'es', 'Spanish')
    #[arg(short = 'l', long)]
    language: String,

    /// Target country or market (e.g. 'Mexico')
    #[arg(short = 'c', long)]
    country: String,

    /// Writing style for the localized copy
    #[arg(long)]
    style: Option<String>,

    /// Intended audience
    #[arg(long)]
    audience: Option<String>,

    /// Extra instructions passed to the model
    #[arg(long)]
    instructions: Option<String>,

    /// Localization mode
    #[arg(long, value_enum)]
    mode: Option<CliMode>,

    /// Preferred model, tried before the configured list
    #[arg(short, long)]
    model: Option<String>,

    /// URL the page was crawled from; relative references are resolved against it
    #[arg(long)]
    base_url: Option<String>,

    /// Output file (defaults to INPUT with the language appended)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the completion report and metadata as JSON next to the output
    #[arg(long)]
    report_json: bool,

    /// Configuration file path
    #[arg(long, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Page Localizer - localize HTML pages with AI
#[derive(Parser, Debug)]
#[command(name = "page-localizer")]
#[command(version)]
#[command(about = "AI-powered HTML page localization tool")]
#[command(long_about = "page-localizer extracts the text of an HTML page, localizes it with a chat model and writes it back without touching the markup.

EXAMPLES:
    page-localizer localize index.html -l es -c Mexico
    page-localizer localize index.html -l ar -c Egypt --mode document
    page-localizer localize index.html -l fr -c France --base-url https://example.com/ -o fr.html
    page-localizer completions bash > page-localizer.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. The API key is read from the config file or from
    the OPENROUTER_API_KEY environment variable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => "",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let _ = writeln!(
            std::io::stderr(),
            "{}{} {} {}\x1B[0m",
            Self::get_color_for_level(record.level()),
            now,
            Self::get_emoji_for_level(record.level()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is lowered once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "page-localizer", &mut std::io::stdout());
            Ok(())
        }
        Commands::Localize(args) => {
            if let Err(e) = run_localize(args).await {
                error!("{:#}", e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn run_localize(args: LocalizeArgs) -> Result<()> {
    if let Some(level) = &args.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let mut config = Config::load_or_create(&args.config)?;
    match &args.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }
    if let Some(mode) = &args.mode {
        config.mode = mode.clone().into();
    }
    config.validate()?;

    let html = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input file: {}", args.input.display()))?;

    let mut request = LocalizationRequest::new(&args.language, &args.country);
    if let Some(style) = &args.style {
        request = request.with_writing_style(style);
    }
    if let Some(audience) = &args.audience {
        request = request.with_audience(audience);
    }
    if let Some(instructions) = &args.instructions {
        request = request.with_instructions(instructions);
    }

    let api_key = config.generation.require_api_key()?;
    let provider = OpenRouter::new(api_key, &config.generation.endpoint)
        .with_attribution(&config.generation.referer, &config.generation.app_title);

    let mut pipeline = LocalizationPipeline::from_config(provider, &config);
    if let Some(model) = &args.model {
        pipeline = pipeline.with_model(model);
    }
    if let Some(base_url) = &args.base_url {
        let base = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
        pipeline = pipeline.with_base_url(base);
    }

    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let outcome = pipeline.localize_until(&html, &request, cancel).await?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, &args.language));
    std::fs::write(&output_path, &outcome.localized_html)
        .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;
    info!(
        "Wrote {} ({:.0}% of units localized)",
        output_path.display(),
        outcome.report.completeness() * 100.0
    );

    if args.report_json {
        let report_path = output_path.with_extension("report.json");
        let json = serde_json::json!({
            "report": outcome.report,
            "metadata": outcome.metadata,
        });
        std::fs::write(&report_path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("Failed to write report file: {}", report_path.display()))?;
        info!("Wrote report to {}", report_path.display());
    }

    if outcome.report.units_unresolved > 0 {
        warn!(
            "{} unit(s) were left untranslated: {}",
            outcome.report.units_unresolved,
            outcome.report.unresolved_ids.join(", ")
        );
    }
    Ok(())
}

/// `page.html` localized to `es` becomes `page.es.html`
fn default_output_path(input: &Path, language: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let suffix = language.trim().to_lowercase().replace(char::is_whitespace, "-");
    input.with_file_name(format!("{}.{}.html", stem, suffix))
}
