//! Line-preserving editor for FAULTS stacking-fault control files.
//!
//! A control file is loaded into a [`document::Document`] (raw lines) and a
//! [`model::Model`] (sections, subsections and parameters that point back at
//! line indices). Edits rewrite only the lines they address, so every other
//! byte of the file survives a load/edit/save cycle unchanged.

pub mod config;
pub mod document;
pub mod domain;
pub mod model;
pub mod parser;
pub mod pattern;
pub mod runner;
pub mod serialization;
pub mod session;
pub mod updater;

pub use config::RunnerConfig;
pub use document::Document;
pub use domain::{EditRequest, FieldAddress, FltsError, FltsErrorCategory, FltsResult, SectionTag};
pub use model::Model;
pub use parser::parse_document;
pub use pattern::{DiffractionPattern, parse_pattern, read_pattern};
pub use runner::{RunOutcome, latest_output, run_simulation};
pub use serialization::write_document;
pub use session::ControlFile;
pub use updater::{RewritePolicy, apply_transition_widths, apply_update};
