//! Raw line storage for a control file.
//!
//! Every stored line keeps its own terminator (`\n`, `\r\n`, or nothing for a
//! final unterminated line), so concatenating the lines reproduces the source
//! byte for byte.
//!
//! Files that are not valid UTF-8 are read as Latin-1, one byte per `char`,
//! and encoded back the same way on write.

use crate::domain::{FltsError, FltsResult};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    lines: Vec<String>,
    encoding: TextEncoding,
}

impl Document {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(ToOwned::to_owned).collect(),
            encoding: TextEncoding::Utf8,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::from_text(&text),
            Err(error) => {
                let text: String = error.into_bytes().into_iter().map(char::from).collect();
                Self {
                    encoding: TextEncoding::Latin1,
                    ..Self::from_text(&text)
                }
            }
        }
    }

    pub fn read(path: &Path) -> FltsResult<Self> {
        let bytes = fs::read(path).map_err(|source| {
            FltsError::io_system(
                "IO.DOCUMENT_READ",
                format!("failed to read '{}': {}", path.display(), source),
            )
        })?;
        let document = Self::from_bytes(bytes);
        if document.encoding == TextEncoding::Latin1 {
            tracing::debug!(path = %path.display(), "not UTF-8, reading as Latin-1");
        }
        Ok(document)
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Full stored line, terminator included.
    pub fn raw_line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Line text without its terminator.
    pub fn content(&self, index: usize) -> Option<&str> {
        self.raw_line(index).map(|line| split_terminator(line).0)
    }

    pub fn trimmed(&self, index: usize) -> Option<&str> {
        self.content(index).map(str::trim)
    }

    pub fn is_blank(&self, index: usize) -> bool {
        self.trimmed(index).is_some_and(str::is_empty)
    }

    /// Leading whitespace of the line, exactly as stored.
    pub fn indentation(&self, index: usize) -> &str {
        self.content(index).map(leading_whitespace).unwrap_or("")
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Replaces the text of a line, keeping its terminator.
    pub fn set_content(&mut self, index: usize, content: &str) {
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };
        let terminator = split_terminator(line).1.to_owned();
        *line = format!("{content}{terminator}");
    }

    /// Inserts a new line directly below `index` and returns its position.
    ///
    /// The new line borrows the terminator of the line above. When that line is
    /// the unterminated last line it gains a `\n` and the new line becomes the
    /// unterminated one.
    pub fn insert_below(&mut self, index: usize, content: &str) -> usize {
        let at = index + 1;
        let terminator = match self.lines.get_mut(index) {
            Some(above) => {
                let terminator = split_terminator(above).1.to_owned();
                if terminator.is_empty() {
                    above.push('\n');
                }
                terminator
            }
            None => String::from("\n"),
        };
        let at = at.min(self.lines.len());
        self.lines.insert(at, format!("{content}{terminator}"));
        at
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn render(&self) -> String {
        self.lines.concat()
    }

    /// The rendered text in the document's source encoding. Fails when an
    /// edit introduced a character a Latin-1 file cannot hold.
    pub fn to_bytes(&self) -> FltsResult<Vec<u8>> {
        let text = self.render();
        match self.encoding {
            TextEncoding::Utf8 => Ok(text.into_bytes()),
            TextEncoding::Latin1 => text
                .chars()
                .map(|ch| {
                    u8::try_from(u32::from(ch)).map_err(|_| {
                        FltsError::input_validation(
                            "INPUT.FIELD_VALUE",
                            format!("character {ch:?} cannot be written to a Latin-1 file"),
                        )
                    })
                })
                .collect(),
        }
    }
}

pub(crate) fn leading_whitespace(text: &str) -> &str {
    &text[..text.len() - text.trim_start().len()]
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(stripped) = line.strip_suffix("\r\n") {
        (stripped, "\r\n")
    } else if let Some(stripped) = line.strip_suffix('\n') {
        (stripped, "\n")
    } else {
        (line, "")
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, TextEncoding};

    #[test]
    fn render_reproduces_mixed_line_endings() {
        let source = "TITLE\r\n  My model\nSTRUCTURAL\n\nCell 1 2 3";
        let document = Document::from_text(source);

        assert_eq!(document.len(), 5);
        assert_eq!(document.render(), source);
        assert_eq!(document.content(0), Some("TITLE"));
        assert_eq!(document.indentation(1), "  ");
        assert!(document.is_blank(3));
        assert_eq!(document.content(4), Some("Cell 1 2 3"));
    }

    #[test]
    fn set_content_keeps_terminator() {
        let mut document = Document::from_text("a\r\nb\n");
        document.set_content(0, "  x y");
        assert_eq!(document.render(), "  x y\r\nb\n");
    }

    #[test]
    fn insert_below_last_unterminated_line_moves_terminator() {
        let mut document = Document::from_text("RECURSIVE\nINFINITE");
        let at = document.insert_below(1, "1000");

        assert_eq!(at, 2);
        assert_eq!(document.render(), "RECURSIVE\nINFINITE\n1000");
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut document = Document::from_text("LT 1.0\n0\n");
        assert_eq!(document.remove(5), None);
        assert_eq!(document.remove(1).as_deref(), Some("0\n"));
        assert_eq!(document.render(), "LT 1.0\n");
    }

    #[test]
    fn latin1_bytes_round_trip_unchanged() {
        let source = b"TITLE\n! \xc5ngstr\xf6m units\r\nCell 1 2 3".to_vec();
        let document = Document::from_bytes(source.clone());

        assert_eq!(document.encoding(), TextEncoding::Latin1);
        assert_eq!(document.len(), 3);
        assert_eq!(document.content(1), Some("! \u{c5}ngstr\u{f6}m units"));
        assert_eq!(document.to_bytes().expect("latin-1 should encode"), source);
    }

    #[test]
    fn latin1_document_rejects_wide_characters_on_encode() {
        let mut document = Document::from_bytes(b"! \xe9\nCell 1\n".to_vec());
        document.set_content(1, "Cell \u{3b1}");

        let error = document.to_bytes().expect_err("alpha is outside Latin-1");
        assert_eq!(error.placeholder(), "INPUT.FIELD_VALUE");
    }

    #[test]
    fn utf8_source_stays_utf8() {
        let document = Document::from_bytes("! \u{c5}\n".as_bytes().to_vec());
        assert_eq!(document.encoding(), TextEncoding::Utf8);
        assert_eq!(document.to_bytes().ok(), Some("! \u{c5}\n".as_bytes().to_vec()));
    }
}
