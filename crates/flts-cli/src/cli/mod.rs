mod commands;
mod dispatch;
mod helpers;

use clap::Parser;
use flts_core::domain::FltsError;
use tracing_subscriber::EnvFilter;

const PROGRAM_NAME: &str = "flts-edit";
const LOG_ENV: &str = "FLTS_LOG";

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_flts_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            eprintln!("{}", diagnostic.fatal_exit_line());
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// `FLTS_LOG` takes precedence; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    // A subscriber may already be installed when `run` is called more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "flts-edit",
    version,
    about = "Inspect and edit FAULTS control files without disturbing their layout"
)]
struct Cli {
    /// Log core activity at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print the sections, subsections and parameters of a control file
    Show(commands::ShowArgs),
    /// Print one value
    Get(commands::GetArgs),
    /// Change one value and save
    Set(commands::SetArgs),
    /// Apply a JSON batch of edits and save
    Apply(commands::ApplyArgs),
    /// Set the FW row of every transition block
    Widths(commands::WidthsArgs),
    /// Run the simulator on a control file
    Run(commands::RunArgs),
    /// Print a simulated powder pattern
    Pattern(commands::PatternArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Show(args) => commands::run_show_command(args),
        CliCommand::Get(args) => commands::run_get_command(args),
        CliCommand::Set(args) => commands::run_set_command(args),
        CliCommand::Apply(args) => commands::run_apply_command(args),
        CliCommand::Widths(args) => commands::run_widths_command(args),
        CliCommand::Run(args) => commands::run_simulation_command(args),
        CliCommand::Pattern(args) => commands::run_pattern_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Core(FltsError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_flts_error(&self) -> FltsError {
        match self {
            Self::Usage(message) => FltsError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Core(error) => error.clone(),
            Self::Internal(error) => FltsError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
