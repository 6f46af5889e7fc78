//! Reader for the simulator's powder-pattern output.
//!
//! Layout: a free-text title line, a header line `start step placeholder`,
//! then intensity samples spread over any number of lines. Sample `i` sits at
//! `start + i * step` degrees two-theta.

use crate::domain::{FltsError, FltsResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

const HEADER_LINE: usize = 1;
const HEADER_FIELDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiffractionPattern {
    pub two_theta: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl DiffractionPattern {
    pub fn len(&self) -> usize {
        self.intensity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensity.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.two_theta
            .iter()
            .copied()
            .zip(self.intensity.iter().copied())
    }
}

pub fn parse_pattern(text: &str) -> FltsResult<DiffractionPattern> {
    let lines: Vec<&str> = text.lines().collect();
    let Some(header) = lines.get(HEADER_LINE) else {
        return Err(format_error(
            lines.len() + 1,
            "expected a title line followed by a 'start step placeholder' header",
        ));
    };

    let fields = parse_floats(header, HEADER_LINE)?;
    if fields.len() != HEADER_FIELDS {
        return Err(format_error(
            HEADER_LINE + 1,
            format!("header holds {} numbers, expected {}", fields.len(), HEADER_FIELDS),
        ));
    }
    let (start, step) = (fields[0], fields[1]);

    let mut intensity = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(HEADER_LINE + 1) {
        intensity.extend(parse_floats(line, index)?);
    }

    let two_theta = (0..intensity.len())
        .map(|sample| start + sample as f64 * step)
        .collect();
    Ok(DiffractionPattern {
        two_theta,
        intensity,
    })
}

pub fn read_pattern(path: &Path) -> FltsResult<DiffractionPattern> {
    let text = fs::read_to_string(path).map_err(|source| {
        FltsError::io_system(
            "IO.PATTERN_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    parse_pattern(&text)
}

fn parse_floats(line: &str, index: usize) -> FltsResult<Vec<f64>> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| format_error(index + 1, format!("'{token}' is not a number")))
        })
        .collect()
}

fn format_error(line_number: usize, detail: impl AsRef<str>) -> FltsError {
    FltsError::input_validation(
        "INPUT.PATTERN_FORMAT",
        format!("pattern line {}: {}", line_number, detail.as_ref()),
    )
}
