use super::CliError;
use anyhow::Context;
use flts_core::config::RunnerConfig;
use flts_core::domain::EditRequest;
use flts_core::model::{Model, Parameter};
use flts_core::session::ControlFile;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub(super) fn open_control_file(path: &Path) -> Result<ControlFile, CliError> {
    ControlFile::open(path).map_err(CliError::Core)
}

/// Saves in place, or to `output` when given. Returns the path written.
pub(super) fn save_control_file(
    file: &mut ControlFile,
    output: Option<PathBuf>,
) -> Result<PathBuf, CliError> {
    let written = match output {
        Some(path) => {
            file.save_as(&path).map_err(CliError::Core)?;
            path
        }
        None => {
            file.save().map_err(CliError::Core)?;
            file.path().map(Path::to_path_buf).unwrap_or_default()
        }
    };
    tracing::debug!(path = %written.display(), "control file written");
    Ok(written)
}

pub(super) fn load_edit_requests(path: &Path) -> anyhow::Result<Vec<EditRequest>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read edits file '{}'", path.display()))?;
    serde_json::from_str::<Vec<EditRequest>>(&content)
        .with_context(|| format!("failed to parse edits file '{}'", path.display()))
}

pub(super) fn load_runner_config(
    config_path: Option<&Path>,
    executable: Option<String>,
) -> Result<RunnerConfig, CliError> {
    let config = match config_path {
        Some(path) => RunnerConfig::load(path).map_err(CliError::Core)?,
        None => RunnerConfig::default(),
    };
    Ok(match executable {
        Some(executable) => config.with_executable(executable),
        None => config,
    })
}

/// Human-readable outline of the model. Line numbers are 1-based.
pub(super) fn render_model(model: &Model) -> String {
    let mut out = String::new();
    for section in &model.sections {
        let _ = writeln!(out, "{} (line {})", section.tag, section.start + 1);
        for param in section.params.iter() {
            render_parameter(&mut out, param, "  ");
        }
        for subsection in &section.subsections {
            let _ = writeln!(
                out,
                "  [{}] (line {})",
                subsection.name(),
                subsection.start() + 1
            );
            for param in subsection.params() {
                render_parameter(&mut out, param, "    ");
            }
        }
    }
    out
}

fn render_parameter(out: &mut String, param: &Parameter, indent: &str) {
    let _ = writeln!(
        out,
        "{indent}{} = {} (line {})",
        param.key,
        param.values.join(" ").trim_end(),
        param.line + 1
    );
    if let Some(continuation) = &param.continuation {
        let _ = writeln!(
            out,
            "{indent}  | {} (line {})",
            continuation.text.trim(),
            continuation.line + 1
        );
    }
}

#[cfg(test)]
mod tests {
    use super::render_model;
    use flts_core::document::Document;
    use flts_core::parser::parse_document;

    #[test]
    fn outline_lists_parameters_with_one_based_lines() {
        let model = parse_document(&Document::from_text(
            "STRUCTURAL\nLwidth\n  INFINITE\nLAYER 1\nLSYM -1\nTRANSITIONS\n!a\nLT 1 0\n",
        ));

        assert_eq!(
            render_model(&model),
            "STRUCTURAL (line 1)\n\
             \x20 Lwidth =  (line 2)\n\
             \x20   | INFINITE (line 3)\n\
             \x20 [LAYER 1] (line 4)\n\
             \x20   LSYM = -1 (line 5)\n\
             TRANSITIONS (line 6)\n\
             \x20 [a] (line 7)\n\
             \x20   LT = 1 0 (line 8)\n"
        );
    }
}
