use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ds000228_fetch::app::App;
use ds000228_fetch::config::FetchConfig;
use ds000228_fetch::error::FetchError;
use ds000228_fetch::fetcher::HttpFetcher;
use ds000228_fetch::output::JsonOutput;

#[derive(Parser)]
#[command(name = "ds000228")]
#[command(about = "Download the OpenNeuro ds000228 (pixar) fMRI dataset into a local cache")]
#[command(version, author)]
struct Cli {
    /// Number of subjects to fetch (default: all 155)
    #[arg(long)]
    n_subjects: Option<usize>,

    /// Parent directory of the dataset cache
    #[arg(long)]
    data_dir: Option<Utf8PathBuf>,

    /// Base URL of a mirror serving the snapshot files
    #[arg(long)]
    url: Option<String>,

    /// Restart partial downloads instead of resuming them
    #[arg(long)]
    no_resume: bool,

    #[arg(short, long, default_value_t = 1)]
    verbose: u8,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<FetchError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::InvalidSubjectCount(_) | FetchError::InvalidSubjectId(_) => 2,
        FetchError::Http(_) | FetchError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = FetchConfig {
        n_subjects: cli.n_subjects,
        data_dir: cli.data_dir,
        url: cli.url,
        resume: !cli.no_resume,
        verbose: cli.verbose,
    };

    let app = App::new(HttpFetcher::new()?);
    let result = app.fetch(&config)?;
    JsonOutput::print_fetch(&result).into_diagnostic()?;
    Ok(())
}
