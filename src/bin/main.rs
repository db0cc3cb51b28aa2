//! campfire-reports CLI - Scoped reports over Campfire enrollment data
//!
//! Usage:
//!   campfire-reports serve
//!   campfire-reports init
//!   campfire-reports seed <fixture.json>
//!   campfire-reports builtin list --user <username>
//!   campfire-reports builtin export <slug> --user <username> [--format excel]
//!   campfire-reports generate <template-id> --user <username> [--format pdf]
//!
//! Examples:
//!   campfire-reports seed fixtures/camp.json
//!   campfire-reports builtin export faction-enrollments --user director --start 2024-06-01
//!   campfire-reports generate 3 --user leader --filters '{"rows": [{"name": "X", "value": 1}]}'

use campfire_reports::artifacts::ArtifactStore;
use campfire_reports::config::Settings;
use campfire_reports::export::ExportFormat;
use campfire_reports::filters::FilterParams;
use campfire_reports::logging;
use campfire_reports::registry::ReportRegistry;
use campfire_reports::service::{FilterPayload, GenerateRequest, ReportService};
use campfire_reports::store::{Fixture, ReportStore};
#[cfg(feature = "server")]
use campfire_reports::web;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "campfire-reports")]
#[command(about = "Campfire reports - scoped, permissioned reports and exports")]
#[command(version)]
struct Cli {
    /// Path to a config file (overrides the default search)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    #[cfg(feature = "server")]
    Serve,

    /// Create the database and media directory
    Init,

    /// Load a JSON fixture into the database
    Seed {
        /// Path to the fixture file
        fixture: PathBuf,
    },

    /// Work with built-in reports
    Builtin {
        #[command(subcommand)]
        command: BuiltinCommand,
    },

    /// Generate an output file from a report template
    Generate {
        /// Template id
        template: i64,

        /// Username to generate as
        #[arg(short, long)]
        user: String,

        /// Output format: csv, excel or pdf
        #[arg(short, long)]
        format: Option<String>,

        /// Filters as a JSON document
        #[arg(long)]
        filters: Option<String>,
    },
}

#[derive(Subcommand)]
enum BuiltinCommand {
    /// List the reports available to a user
    List {
        #[arg(short, long)]
        user: String,
    },

    /// Export a built-in report
    Export {
        /// Report slug
        slug: String,

        #[arg(short, long)]
        user: String,

        #[arg(short, long, default_value = "csv")]
        format: ExportArg,

        #[command(flatten)]
        filters: FilterArgs,

        /// Write to this file instead of the download name
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    facility: Option<String>,

    #[arg(long)]
    faction: Option<String>,

    /// Earliest start date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Latest end date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Skip scoping where the report and the user allow it
    #[arg(long)]
    unscoped: bool,
}

impl From<FilterArgs> for FilterParams {
    fn from(args: FilterArgs) -> Self {
        FilterParams {
            facility_slug: args.facility,
            faction_slug: args.faction,
            start: args.start,
            end: args.end,
            unscoped: args.unscoped.then(|| "1".to_string()),
        }
    }
}

#[derive(Clone, ValueEnum)]
enum ExportArg {
    Csv,
    Excel,
}

impl From<ExportArg> for ExportFormat {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Csv => ExportFormat::Csv,
            ExportArg::Excel => ExportFormat::Excel,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.logging.filter);

    let result = match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve => cmd_serve(&settings),
        Commands::Init => cmd_init(&settings),
        Commands::Seed { fixture } => cmd_seed(&settings, fixture),
        Commands::Builtin { command } => match command {
            BuiltinCommand::List { user } => cmd_builtin_list(&settings, &user),
            BuiltinCommand::Export {
                slug,
                user,
                format,
                filters,
                out,
            } => cmd_builtin_export(&settings, &slug, &user, format, filters, out),
        },
        Commands::Generate {
            template,
            user,
            format,
            filters,
        } => cmd_generate(&settings, template, &user, format, filters),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_service(settings: &Settings) -> Result<ReportService, Box<dyn std::error::Error>> {
    let store = ReportStore::open(settings.database_path()?)?;
    let artifacts = ArtifactStore::new(settings.media_root()?, &settings.media.url);
    Ok(ReportService::new(
        Arc::new(store),
        ReportRegistry::builtin(),
        artifacts,
    ))
}

#[cfg(feature = "server")]
fn cmd_serve(settings: &Settings) -> CliResult {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(settings))
}

fn cmd_init(settings: &Settings) -> CliResult {
    let path = settings.database_path()?;
    ReportStore::open(&path)?;
    let media = settings.media_root()?;
    fs::create_dir_all(&media)?;

    println!("Database: {}", path.display());
    println!("Media:    {}", media.display());
    Ok(())
}

fn cmd_seed(settings: &Settings, fixture: PathBuf) -> CliResult {
    let store = ReportStore::open(settings.database_path()?)?;
    let fixture = Fixture::from_file(&fixture)?;
    let count = store.load_fixture(&fixture)?;

    println!("Loaded {} records", count);
    Ok(())
}

fn cmd_builtin_list(settings: &Settings, username: &str) -> CliResult {
    let service = open_service(settings)?;
    let user = service.authenticate(Some(username))?;

    for report in service.builtin_index(&user) {
        let unscoped = if report.allow_unscoped { " (unscopable)" } else { "" };
        println!("{:<24} {}{}", report.slug, report.name, unscoped);
        println!("{:<24} {}", "", report.description);
    }
    Ok(())
}

fn cmd_builtin_export(
    settings: &Settings,
    slug: &str,
    username: &str,
    format: ExportArg,
    filters: FilterArgs,
    out: Option<PathBuf>,
) -> CliResult {
    let service = open_service(settings)?;
    let user = service.authenticate(Some(username))?;
    let filters = FilterParams::from(filters).parse()?;

    let export = service.builtin_export(&user, slug, &filters, format.into())?;
    let path = out.unwrap_or_else(|| PathBuf::from(&export.filename));
    fs::write(&path, &export.body)?;

    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_generate(
    settings: &Settings,
    template: i64,
    username: &str,
    format: Option<String>,
    filters: Option<String>,
) -> CliResult {
    let service = open_service(settings)?;
    let user = service.authenticate(Some(username))?;
    let request = GenerateRequest {
        filters: filters.map(FilterPayload::from),
        output_format: format,
    };

    let response = service.generate_from_template(&user, template, &request)?;
    println!("{}", response.message);
    println!("{}", response.file_url);
    Ok(())
}
