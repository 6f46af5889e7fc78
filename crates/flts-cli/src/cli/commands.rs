use super::CliError;
use super::dispatch::parse_section_tag;
use super::helpers::*;
use anyhow::Context;
use flts_core::domain::FieldAddress;
use flts_core::pattern::read_pattern;
use flts_core::runner::run_simulation;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct ShowArgs {
    /// Control file
    file: PathBuf,

    /// Emit the model as JSON
    #[arg(long)]
    json: bool,
}

/// Where a value lives, beyond its section and key.
#[derive(clap::Args)]
pub(super) struct SlotArgs {
    /// LAYER or transition block name
    #[arg(long)]
    subsection: Option<String>,

    /// Position among the parameter's values; 1 may address a continuation line
    #[arg(long, default_value_t = 0)]
    index: usize,
}

#[derive(clap::Args)]
pub(super) struct OutputArgs {
    /// Write the edited file here instead of overwriting the input
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct GetArgs {
    /// Control file
    file: PathBuf,
    /// Section keyword or alias (title, instrumental, structural, ...)
    section: String,
    /// Parameter key
    key: String,

    #[command(flatten)]
    slot: SlotArgs,
}

#[derive(clap::Args)]
pub(super) struct SetArgs {
    /// Control file
    file: PathBuf,
    /// Section keyword or alias (title, instrumental, structural, ...)
    section: String,
    /// Parameter key
    key: String,
    /// New value
    #[arg(allow_negative_numbers = true)]
    value: String,

    #[command(flatten)]
    slot: SlotArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
pub(super) struct ApplyArgs {
    /// Control file
    file: PathBuf,
    /// JSON array of {section, subsection?, key, index?, value}
    edits: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
pub(super) struct WidthsArgs {
    /// Control file
    file: PathBuf,
    /// FW values written to every transition block
    #[arg(required = true, allow_negative_numbers = true)]
    values: Vec<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Control file
    file: PathBuf,

    /// Runner settings (JSON: executable, stdin, output_glob)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulator executable, overriding the config file
    #[arg(long)]
    executable: Option<String>,
}

#[derive(clap::Args)]
pub(super) struct PatternArgs {
    /// Simulator output file
    file: PathBuf,

    /// Emit the pattern as JSON
    #[arg(long)]
    json: bool,
}

impl SlotArgs {
    fn address(&self, section: &str, key: &str) -> Result<FieldAddress, CliError> {
        let section = parse_section_tag(section)?;
        Ok(FieldAddress {
            section,
            subsection: self.subsection.clone(),
            key: key.to_string(),
            value_index: self.index,
        })
    }
}

pub(super) fn run_show_command(args: ShowArgs) -> Result<i32, CliError> {
    let file = open_control_file(&args.file)?;
    if args.json {
        let json = serde_json::to_string_pretty(file.model())
            .context("failed to encode model as JSON")?;
        println!("{json}");
    } else {
        print!("{}", render_model(file.model()));
    }
    Ok(0)
}

pub(super) fn run_get_command(args: GetArgs) -> Result<i32, CliError> {
    let address = args.slot.address(&args.section, &args.key)?;
    let file = open_control_file(&args.file)?;
    let value = file.value(&address).map_err(CliError::Core)?;
    println!("{value}");
    Ok(0)
}

pub(super) fn run_set_command(args: SetArgs) -> Result<i32, CliError> {
    let address = args.slot.address(&args.section, &args.key)?;
    let mut file = open_control_file(&args.file)?;
    file.update(&address, &args.value).map_err(CliError::Core)?;
    let written = save_control_file(&mut file, args.output.output)?;
    println!("{address} = {} -> {}", args.value, written.display());
    Ok(0)
}

pub(super) fn run_apply_command(args: ApplyArgs) -> Result<i32, CliError> {
    let requests = load_edit_requests(&args.edits)?;
    let mut file = open_control_file(&args.file)?;
    let applied = file.apply(&requests).map_err(CliError::Core)?;
    let written = save_control_file(&mut file, args.output.output)?;
    println!("applied {applied} edit(s) -> {}", written.display());
    Ok(0)
}

pub(super) fn run_widths_command(args: WidthsArgs) -> Result<i32, CliError> {
    let mut file = open_control_file(&args.file)?;
    let rewritten = file
        .apply_transition_widths(&args.values)
        .map_err(CliError::Core)?;
    let written = save_control_file(&mut file, args.output.output)?;
    println!("rewrote {rewritten} FW row(s) -> {}", written.display());
    Ok(0)
}

pub(super) fn run_simulation_command(args: RunArgs) -> Result<i32, CliError> {
    let config = load_runner_config(args.config.as_deref(), args.executable)?;
    let outcome = run_simulation(&args.file, &config).map_err(CliError::Core)?;

    match outcome.output {
        Some(path) => {
            let pattern = read_pattern(&path).map_err(CliError::Core)?;
            println!("{} ({} points)", path.display(), pattern.len());
        }
        None => println!(
            "no output matching '{}' in {}",
            config.output_glob,
            outcome.working_dir.display()
        ),
    }
    Ok(0)
}

pub(super) fn run_pattern_command(args: PatternArgs) -> Result<i32, CliError> {
    let pattern = read_pattern(&args.file).map_err(CliError::Core)?;
    if args.json {
        let json =
            serde_json::to_string(&pattern).context("failed to encode pattern as JSON")?;
        println!("{json}");
    } else {
        for (two_theta, intensity) in pattern.points() {
            println!("{two_theta} {intensity}");
        }
    }
    Ok(0)
}
