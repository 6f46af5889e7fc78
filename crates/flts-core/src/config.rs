//! Settings for launching the external simulator.

use crate::domain::{FltsError, FltsResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_EXECUTABLE: &str = "Faults";
pub const DEFAULT_STDIN: &str = "\n";
pub const DEFAULT_OUTPUT_GLOB: &str = "*.dat";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program name or path. Bare names are resolved through `PATH`.
    pub executable: String,
    /// Bytes written to the simulator's stdin once it has started. The
    /// simulator waits for a keystroke before exiting.
    pub stdin: String,
    /// Pattern matched against file names in the control file's directory.
    pub output_glob: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            stdin: DEFAULT_STDIN.to_string(),
            output_glob: DEFAULT_OUTPUT_GLOB.to_string(),
        }
    }
}

impl RunnerConfig {
    pub fn load(path: &Path) -> FltsResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| {
            FltsError::io_system(
                "IO.CONFIG_READ",
                format!("failed to read config '{}': {}", path.display(), source),
            )
        })?;
        Self::from_json(&text).map_err(|error| {
            FltsError::input_validation(
                error.placeholder(),
                format!("{} ({})", error.message(), path.display()),
            )
        })
    }

    pub fn from_json(text: &str) -> FltsResult<Self> {
        serde_json::from_str(text).map_err(|source| {
            FltsError::input_validation(
                "INPUT.CONFIG_FORMAT",
                format!("invalid runner config: {source}"),
            )
        })
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }
}
