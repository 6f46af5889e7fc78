//! Editing session over one control file.

use crate::document::Document;
use crate::domain::{EditRequest, FieldAddress, FltsError, FltsResult};
use crate::model::Model;
use crate::parser::parse_document;
use crate::serialization::write_document;
use crate::updater::{RewritePolicy, apply_transition_widths, apply_update};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ControlFile {
    path: Option<PathBuf>,
    document: Document,
    model: Model,
}

impl ControlFile {
    pub fn open(path: impl Into<PathBuf>) -> FltsResult<Self> {
        let path = path.into();
        let document = Document::read(&path)?;
        tracing::debug!(path = %path.display(), lines = document.len(), "opened control file");
        Ok(Self {
            model: parse_document(&document),
            document,
            path: Some(path),
        })
    }

    pub fn from_text(text: &str) -> Self {
        let document = Document::from_text(text);
        Self {
            model: parse_document(&document),
            document,
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Current text at `address`. Indices past the end read as empty; index 1
    /// of a field whose second slot lives on a continuation line reads that
    /// line.
    pub fn value(&self, address: &FieldAddress) -> FltsResult<String> {
        let param = self.model.resolve(address)?;
        let policy = RewritePolicy::select(address.section, &address.key, address.value_index);
        if policy == RewritePolicy::Continuation {
            return Ok(param
                .continuation
                .as_ref()
                .map(|continuation| continuation.text.trim().to_string())
                .unwrap_or_default());
        }
        Ok(param
            .values
            .get(address.value_index)
            .cloned()
            .unwrap_or_default())
    }

    pub fn update(&mut self, address: &FieldAddress, value: &str) -> FltsResult<()> {
        apply_update(&mut self.document, &mut self.model, address, value)
    }

    /// Applies edits in order and stops at the first failure; edits before it
    /// stay applied. Returns how many edits were applied.
    pub fn apply(&mut self, requests: &[EditRequest]) -> FltsResult<usize> {
        for (applied, request) in requests.iter().enumerate() {
            let address = request.address()?;
            self.update(&address, &request.value).map_err(|error| {
                FltsError::new(
                    error.category(),
                    error.placeholder(),
                    format!("edit {} of {}: {}", applied + 1, requests.len(), error.message()),
                )
            })?;
        }
        Ok(requests.len())
    }

    pub fn apply_transition_widths(&mut self, values: &[String]) -> FltsResult<usize> {
        apply_transition_widths(&mut self.document, &mut self.model, values)
    }

    pub fn render(&self) -> String {
        self.document.render()
    }

    pub fn save(&self) -> FltsResult<()> {
        let path = self.path.as_deref().ok_or_else(|| {
            FltsError::input_validation(
                "INPUT.NO_PATH",
                "control file was not opened from disk; use save_as",
            )
        })?;
        write_document(path, &self.document)
    }

    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> FltsResult<()> {
        let path = path.into();
        write_document(&path, &self.document)?;
        tracing::debug!(path = %path.display(), "saved control file");
        self.path = Some(path);
        Ok(())
    }
}
