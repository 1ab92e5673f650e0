//! Binary entry point for the Shelfmate recommendation CLI.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;
use shelfmate::{
    ingest::{load_books, load_ratings, BooksImportConfig, RatingsImportConfig},
    logging::init_logging_or_env,
    BuildOptions, Catalog, DuplicatePolicy, RatingMatrix, RecommendError, Recommendation,
    Recommender, StatsReport,
};
use tracing::debug;

use config::{CliConfig, ColumnKey};
use ui::{format_duration, Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "shelfmate",
    version,
    about = "Recommend books similar to a title from collaborative ratings",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "SHELFMATE_CONFIG",
        value_name = "FILE",
        help = "Path to the CLI config file"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "FILE", help = "Ratings CSV (title,userId,rating)")]
    ratings: Option<PathBuf>,

    #[arg(long, global = true, value_name = "FILE", help = "Book metadata CSV")]
    books: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        help = "How repeated (title, user) ratings are combined"
    )]
    duplicates: Option<DuplicatesArg>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto)]
    theme: Theme,

    #[arg(long, short, global = true, help = "Suppress decorations and progress")]
    quiet: bool,

    #[arg(
        long,
        global = true,
        env = "SHELFMATE_LOG",
        help = "Log filter directive (e.g. shelfmate=debug); falls back to RUST_LOG, then warn"
    )]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "List books similar to TITLE")]
    Recommend {
        #[arg(value_name = "TITLE")]
        title: String,

        #[arg(
            long,
            short = 'n',
            allow_negative_numbers = true,
            help = "Number of recommendations (defaults to the config value or 10)"
        )]
        count: Option<i64>,
    },

    #[command(about = "Find rated titles containing a substring")]
    Search {
        #[arg(value_name = "TEXT")]
        text: String,

        #[arg(long, help = "Maximum number of matches to print")]
        limit: Option<usize>,
    },

    #[command(about = "Summarize the loaded data set")]
    Stats,

    #[command(about = "Inspect or update the CLI config file")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    #[command(about = "Print shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    #[command(about = "Print the effective config")]
    Show,

    #[command(about = "Store default dataset paths")]
    SetDataset {
        #[arg(long = "ratings-path", value_name = "FILE")]
        ratings: Option<PathBuf>,

        #[arg(long = "books-path", value_name = "FILE")]
        books: Option<PathBuf>,
    },

    #[command(about = "Store the default recommendation count")]
    SetCount {
        #[arg(value_name = "N", allow_negative_numbers = true)]
        count: i64,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum DuplicatesArg {
    LastWins,
    Mean,
    Reject,
}

impl From<DuplicatesArg> for DuplicatePolicy {
    fn from(arg: DuplicatesArg) -> Self {
        match arg {
            DuplicatesArg::LastWins => DuplicatePolicy::LastWins,
            DuplicatesArg::Mean => DuplicatePolicy::Mean,
            DuplicatesArg::Reject => DuplicatePolicy::Reject,
        }
    }
}

/// Exit status when the requested title is not in the data set.
const EXIT_NOT_FOUND: u8 = 3;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging_or_env(cli.log_level.as_deref(), "warn")?;
    let ui = Ui::new(cli.theme, cli.quiet);
    let mut cfg = CliConfig::load(cli.config.clone())?;
    debug!(path = ?cfg.path(), "config loaded");

    match &cli.command {
        Command::Recommend { title, count } => {
            let rec = load_recommender(&cli, &cfg, &ui)?;
            let count = count.unwrap_or_else(|| cfg.default_count());
            return print_recommendations(&cli, &ui, &rec, title, count);
        }
        Command::Search { text, limit } => {
            let rec = load_recommender(&cli, &cfg, &ui)?;
            let mut matches = rec.autocomplete(text);
            if let Some(limit) = limit {
                matches.truncate(*limit);
            }
            emit(cli.format, &matches, || {
                if matches.is_empty() {
                    ui.warn(&format!("no titles contain '{text}'"));
                } else {
                    ui.bullets(matches.iter().cloned());
                }
            })?;
        }
        Command::Stats => {
            let rec = load_recommender(&cli, &cfg, &ui)?;
            let report = rec.stats();
            emit(cli.format, &report, || print_stats_text(&ui, &report))?;
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                let path = cfg
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<none>".into());
                ui.info(&format!("config file: {path}"));
                print!("{}", cfg.to_toml()?);
            }
            ConfigAction::SetDataset { ratings, books } => {
                cfg.set_dataset(ratings.clone(), books.clone());
                let path = cfg.persist()?;
                ui.success(&format!("dataset paths saved to {}", path.display()));
            }
            ConfigAction::SetCount { count } => {
                cfg.set_default_count(*count)?;
                let path = cfg.persist()?;
                ui.success(&format!("default count saved to {}", path.display()));
            }
        },
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "shelfmate", &mut io::stdout());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_recommender(cli: &Cli, cfg: &CliConfig, ui: &Ui) -> Result<Recommender, Box<dyn Error>> {
    let ratings_path = cli
        .ratings
        .clone()
        .or_else(|| cfg.ratings_path().cloned())
        .ok_or("no ratings file; pass --ratings or run `config set-dataset`")?;

    let mut ratings_cfg = RatingsImportConfig::new(ratings_path);
    if let Some(col) = cfg.column(ColumnKey::Title) {
        ratings_cfg.title_column = col.to_string();
    }
    if let Some(col) = cfg.column(ColumnKey::User) {
        ratings_cfg.user_column = col.to_string();
    }
    if let Some(col) = cfg.column(ColumnKey::Rating) {
        ratings_cfg.rating_column = col.to_string();
    }

    let opts = BuildOptions {
        duplicates: match cli.duplicates {
            Some(arg) => arg.into(),
            None => cfg.duplicate_policy()?.unwrap_or_default(),
        },
    };

    let task = ui.task("Loading ratings");
    let ratings = load_ratings(&ratings_cfg)?;
    let matrix = RatingMatrix::build_with(ratings.observations, &opts)?;
    task.finish();

    let catalog = match cli.books.clone().or_else(|| cfg.books_path().cloned()) {
        Some(path) => load_books(&BooksImportConfig::new(path), &cfg.override_table())?.catalog,
        None => Catalog::new(),
    };

    let task = ui.task("Precomputing similarity table");
    let rec = Recommender::new(matrix, catalog);
    let elapsed = task.finish();

    if cli.format == OutputFormat::Text {
        if ratings.skipped_rows > 0 {
            ui.warn(&format!(
                "dropped {} rating rows without a title",
                ratings.skipped_rows
            ));
        }
        ui.info(&format!(
            "{} titles x {} users indexed in {}",
            rec.matrix().rows(),
            rec.matrix().columns(),
            format_duration(elapsed)
        ));
    }
    Ok(rec)
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum RecommendOutput<'a> {
    Ok {
        title: &'a str,
        recommendations: &'a [Recommendation],
    },
    NotFound {
        title: &'a str,
    },
}

fn print_recommendations(
    cli: &Cli,
    ui: &Ui,
    rec: &Recommender,
    title: &str,
    count: i64,
) -> Result<ExitCode, Box<dyn Error>> {
    match rec.recommend(title, count) {
        Ok(recs) => {
            let output = RecommendOutput::Ok {
                title,
                recommendations: &recs,
            };
            emit(cli.format, &output, || {
                ui.heading(&format!("Top {count} recommendations for '{title}'"));
                ui.ranked(recs.iter().map(describe));
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Err(RecommendError::NotFound { .. }) => {
            emit(cli.format, &RecommendOutput::NotFound { title }, || {
                println!("Book not found in the database.");
            })?;
            Ok(ExitCode::from(EXIT_NOT_FOUND))
        }
        Err(err @ RecommendError::InvalidCount { .. }) => Err(Box::new(err)),
    }
}

fn describe(rec: &Recommendation) -> String {
    let mut line = rec.title.clone();
    if let Some(author) = &rec.author {
        line.push_str(&format!(" by {author}"));
    }
    if let Some(year) = rec.year {
        line.push_str(&format!(" ({year})"));
    }
    line.push_str(&format!("  score={:.4}", rec.score));
    if let Some(url) = &rec.image_url {
        line.push_str(&format!("\n      {url}"));
    }
    line
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_stats_text(ui: &Ui, report: &StatsReport) {
    ui.section(
        "Ratings",
        [
            ("titles", report.titles.to_string()),
            ("users", report.users.to_string()),
            ("rated cells", report.rated_cells.to_string()),
            ("density", format!("{:.4}%", report.density * 100.0)),
            ("metadata", report.metadata_records.to_string()),
        ],
    );
    if !report.zero_vector_titles.is_empty() {
        ui.heading("Titles without ratings");
        ui.bullets(report.zero_vector_titles.iter().cloned());
    }
    if !report.warnings.is_empty() {
        ui.heading(&format!("Integrity warnings ({})", report.warnings.len()));
        if !ui.is_quiet() {
            ui.bullets(report.warnings.iter().map(|w| w.to_string()));
        }
    }
}
