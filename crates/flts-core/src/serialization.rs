use crate::document::Document;
use crate::domain::{FltsError, FltsResult};
use std::fs;
use std::path::Path;

/// Writes the document's lines exactly as stored, in the encoding they were
/// read with. No line-ending normalisation.
pub fn write_document(path: &Path, document: &Document) -> FltsResult<()> {
    let bytes = document.to_bytes()?;
    fs::write(path, bytes).map_err(|source| {
        FltsError::io_system(
            "IO.DOCUMENT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}
