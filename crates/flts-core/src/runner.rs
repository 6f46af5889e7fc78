//! Launching the external simulator against a saved control file.

use crate::config::RunnerConfig;
use crate::domain::{FltsError, FltsResult};
use globset::Glob;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub working_dir: PathBuf,
    pub stdout: String,
    /// Newest file in `working_dir` matching the configured output glob.
    pub output: Option<PathBuf>,
}

/// Runs the simulator with the control file's name as its only argument and
/// the file's directory as the working directory, then waits for it to exit.
pub fn run_simulation(control_file: &Path, config: &RunnerConfig) -> FltsResult<RunOutcome> {
    let file_name = control_file.file_name().ok_or_else(|| {
        FltsError::input_validation(
            "INPUT.CONTROL_PATH",
            format!("'{}' does not name a file", control_file.display()),
        )
    })?;
    let working_dir = match control_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    tracing::info!(
        executable = %config.executable,
        file = %control_file.display(),
        "launching simulator"
    );

    let mut child = Command::new(&config.executable)
        .arg(file_name)
        .current_dir(&working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            FltsError::io_system(
                "IO.RUNNER_SPAWN",
                format!("failed to start '{}': {}", config.executable, source),
            )
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(config.stdin.as_bytes()) {
            Ok(()) => {}
            // The simulator may exit without reading its input.
            Err(error) if error.kind() == ErrorKind::BrokenPipe => {}
            Err(source) => {
                return Err(FltsError::io_system(
                    "IO.RUNNER_STDIN",
                    format!("failed to write simulator input: {source}"),
                ));
            }
        }
    }

    let output = child.wait_with_output().map_err(|source| {
        FltsError::io_system(
            "IO.RUNNER_WAIT",
            format!("failed waiting for '{}': {}", config.executable, source),
        )
    })?;

    if !output.status.success() {
        let status_text = output.status.code().map_or_else(
            || "terminated by signal".to_string(),
            |code| format!("exit code {code}"),
        );
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FltsError::computation(
            "RUN.SIMULATOR_EXIT",
            format!(
                "'{}' failed with {}: {}",
                config.executable,
                status_text,
                stderr.trim()
            ),
        ));
    }

    let newest = latest_output(&working_dir, &config.output_glob)?;
    tracing::info!(
        output = ?newest.as_deref().map(Path::display),
        "simulator finished"
    );

    Ok(RunOutcome {
        working_dir,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        output: newest,
    })
}

/// Most recently modified regular file in `dir` whose name matches `pattern`.
/// Equal timestamps are broken by file name.
pub fn latest_output(dir: &Path, pattern: &str) -> FltsResult<Option<PathBuf>> {
    let matcher = Glob::new(pattern)
        .map_err(|source| {
            FltsError::input_validation(
                "INPUT.OUTPUT_GLOB",
                format!("invalid output pattern '{pattern}': {source}"),
            )
        })?
        .compile_matcher();

    let entries = fs::read_dir(dir).map_err(|source| {
        FltsError::io_system(
            "IO.OUTPUT_SCAN",
            format!("failed to list '{}': {}", dir.display(), source),
        )
    })?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() || !matcher.is_match(entry.file_name()) {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let candidate = (modified, entry.path());
        if newest.as_ref().is_none_or(|current| candidate > *current) {
            newest = Some(candidate);
        }
    }

    Ok(newest.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use super::{latest_output, run_simulation};
    use crate::config::RunnerConfig;
    use std::fs;
    use std::path::Path;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, seconds: u64) {
        fs::write(path, "0\n").expect("file should be written");
        fs::File::options()
            .write(true)
            .open(path)
            .expect("file should open")
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds))
            .expect("mtime should be set");
    }

    #[test]
    fn latest_output_picks_newest_matching_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        touch(&temp.path().join("old.dat"), 1_000);
        touch(&temp.path().join("new.dat"), 2_000);
        touch(&temp.path().join("newest.txt"), 3_000);
        fs::create_dir(temp.path().join("dir.dat")).expect("dir should be created");

        let newest = latest_output(temp.path(), "*.dat").expect("scan should succeed");
        assert_eq!(newest, Some(temp.path().join("new.dat")));
    }

    #[test]
    fn latest_output_is_none_without_matches() {
        let temp = TempDir::new().expect("tempdir should be created");
        touch(&temp.path().join("model.flts"), 1_000);

        assert_eq!(latest_output(temp.path(), "*.dat"), Ok(None));
    }

    #[test]
    fn invalid_glob_is_input_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = latest_output(temp.path(), "[").expect_err("glob should be rejected");
        assert_eq!(error.placeholder(), "INPUT.OUTPUT_GLOB");
    }

    #[test]
    fn missing_executable_is_spawn_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let control = temp.path().join("model.flts");
        fs::write(&control, "TITLE\nx\n").expect("control file should be written");
        let config = RunnerConfig::default().with_executable("flts-no-such-simulator");

        let error = run_simulation(&control, &config).expect_err("spawn should fail");
        assert_eq!(error.placeholder(), "IO.RUNNER_SPAWN");
        assert_eq!(error.exit_code(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn simulator_runs_in_control_file_directory() {
        let temp = TempDir::new().expect("tempdir should be created");
        let control = temp.path().join("model.flts");
        fs::write(&control, "echo 'pattern' > model.dat\necho done\n")
            .expect("control file should be written");
        let config = RunnerConfig::default().with_executable("sh");

        let outcome = run_simulation(&control, &config).expect("run should succeed");
        assert_eq!(outcome.output, Some(temp.path().join("model.dat")));
        assert_eq!(outcome.stdout.trim(), "done");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_computation_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let control = temp.path().join("model.flts");
        fs::write(&control, "echo broken >&2\nexit 3\n").expect("control file should be written");
        let config = RunnerConfig::default().with_executable("sh");

        let error = run_simulation(&control, &config).expect_err("run should fail");
        assert_eq!(error.placeholder(), "RUN.SIMULATOR_EXIT");
        assert!(error.message().contains("exit code 3"));
        assert!(error.message().contains("broken"));
    }
}
