use crate::document::Document;
use crate::domain::SectionTag;
use crate::model::{Continuation, Parameter};

pub const TITLE_TEXT_KEY: &str = "Title_Text";
pub(crate) const LAYER_PREFIX: &str = "LAYER";
pub const ATOM_KEYWORD: &str = "Atom";

const STRUCTURAL_KEYS: [&str; 6] = ["Avercell", "SPGR", "Cell", "Symm", "NLAYERS", "Lwidth"];
const INSTRUMENTAL_KEYS: [&str; 4] = ["Radiation", "Wavelength", "Aberrations", "Pseudo-Voigt"];
const STACKING_SOLO_KEYS: [&str; 2] = ["RECURSIVE", "INFINITE"];
const TRANSITION_KEYS: [&str; 2] = ["LT", "FW"];
const CALCULATION_KEYS: [&str; 1] = ["POWDER"];
const DEGENERATE_ROW_TOKEN: &str = "0.00";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    NoSection,
    InSection(SectionTag),
    InSubsection(SectionTag, String),
}

impl ScanState {
    pub fn section(&self) -> Option<SectionTag> {
        match self {
            Self::NoSection => None,
            Self::InSection(tag) | Self::InSubsection(tag, _) => Some(*tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Section {
        tag: SectionTag,
        start: usize,
        title: Option<Parameter>,
    },
    Layer {
        name: String,
        start: usize,
    },
    Transition {
        name: String,
        start: usize,
    },
    /// Belongs to whatever the resulting state points at.
    Parameter(Parameter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: ScanState,
    pub record: Option<Record>,
    pub consumed: usize,
}

impl Step {
    fn pass(state: &ScanState) -> Self {
        Self::emit(state.clone(), None, 1)
    }

    fn emit(state: ScanState, record: Option<Record>, consumed: usize) -> Self {
        Self {
            state,
            record,
            consumed,
        }
    }
}

/// One transition of the scanner: classifies line `index` under `state` and
/// returns the next state, at most one record, and how many lines were read.
///
/// Lookahead past `index` is limited to the title line, the skipped degenerate
/// `0.00` row after `LT`/`FW`, and the continuation peek; none of these change
/// which line is scanned next except the first two.
pub fn step(state: &ScanState, document: &Document, index: usize) -> Step {
    let Some(line) = document.trimmed(index) else {
        return Step::emit(state.clone(), None, 1);
    };

    if let Some(tag) = SectionTag::from_keyword(line) {
        return section_step(tag, document, index);
    }

    match state {
        ScanState::NoSection => Step::pass(state),
        ScanState::InSection(SectionTag::Structural)
        | ScanState::InSubsection(SectionTag::Structural, _) => {
            structural_step(state, line, document, index)
        }
        ScanState::InSection(SectionTag::Instrumental) => {
            keyed_step(state, line, &INSTRUMENTAL_KEYS, index)
        }
        ScanState::InSection(SectionTag::Transitions)
        | ScanState::InSubsection(SectionTag::Transitions, _) => {
            transitions_step(state, line, document, index)
        }
        ScanState::InSection(SectionTag::Stacking) => stacking_step(state, line, document, index),
        ScanState::InSection(tag) if tag.is_calculation() => {
            keyed_step(state, line, &CALCULATION_KEYS, index)
        }
        _ => Step::pass(state),
    }
}

fn section_step(tag: SectionTag, document: &Document, index: usize) -> Step {
    let state = ScanState::InSection(tag);
    if tag != SectionTag::Title {
        let record = Record::Section {
            tag,
            start: index,
            title: None,
        };
        return Step::emit(state, Some(record), 1);
    }

    let title_line = index + 1;
    let title = document.trimmed(title_line).map(|text| {
        Parameter::solo(TITLE_TEXT_KEY, vec![text.to_string()], title_line)
    });
    let consumed = if title.is_some() { 2 } else { 1 };
    let record = Record::Section {
        tag,
        start: index,
        title,
    };
    Step::emit(state, Some(record), consumed)
}

fn structural_step(state: &ScanState, line: &str, document: &Document, index: usize) -> Step {
    if line.starts_with(LAYER_PREFIX) {
        let name = line.to_string();
        let record = Record::Layer {
            name: name.clone(),
            start: index,
        };
        return Step::emit(
            ScanState::InSubsection(SectionTag::Structural, name),
            Some(record),
            1,
        );
    }

    let tokens = tokenize(line);
    let Some((first, rest)) = tokens.split_first() else {
        return Step::pass(state);
    };

    let param = match state {
        ScanState::InSubsection(..) => match *first {
            ATOM_KEYWORD if rest.len() >= 2 => Some(atom_parameter(rest, index)),
            crate::model::LAYER_SYMMETRY_KEY => {
                Some(Parameter::keyed(*first, owned(rest), index))
            }
            _ => None,
        },
        _ if STRUCTURAL_KEYS.contains(first) => Some(
            Parameter::keyed(*first, owned(rest), index)
                .with_continuation(find_continuation(document, index)),
        ),
        _ => None,
    };
    Step::emit(state.clone(), param.map(Record::Parameter), 1)
}

fn atom_parameter(rest: &[&str], index: usize) -> Parameter {
    let key = format!("{ATOM_KEYWORD}_{}_{}", rest[0], rest[1]);
    Parameter {
        keyword: ATOM_KEYWORD.to_string(),
        ..Parameter::keyed(key, owned(rest), index)
    }
}

fn keyed_step(state: &ScanState, line: &str, keys: &[&str], index: usize) -> Step {
    let tokens = tokenize(line);
    let record = match tokens.split_first() {
        Some((first, rest)) if keys.contains(first) => {
            Some(Record::Parameter(Parameter::keyed(*first, owned(rest), index)))
        }
        _ => None,
    };
    Step::emit(state.clone(), record, 1)
}

fn transitions_step(state: &ScanState, line: &str, document: &Document, index: usize) -> Step {
    if let Some(name) = line.strip_prefix('!') {
        let name = name.trim().to_string();
        let record = Record::Transition {
            name: name.clone(),
            start: index,
        };
        return Step::emit(
            ScanState::InSubsection(SectionTag::Transitions, name),
            Some(record),
            1,
        );
    }

    if !matches!(state, ScanState::InSubsection(..)) {
        return Step::pass(state);
    }

    let tokens = tokenize(line);
    match tokens.split_first() {
        Some((first, rest)) if TRANSITION_KEYS.contains(first) => {
            let param = Parameter::keyed(*first, owned(rest), index);
            let consumed = if is_degenerate_row(document, index + 1) {
                2
            } else {
                1
            };
            Step::emit(state.clone(), Some(Record::Parameter(param)), consumed)
        }
        _ => Step::pass(state),
    }
}

fn stacking_step(state: &ScanState, line: &str, document: &Document, index: usize) -> Step {
    let tokens = tokenize(line);
    let Some((first, rest)) = tokens.split_first() else {
        return Step::pass(state);
    };

    let param = if STACKING_SOLO_KEYS.contains(first) {
        let values = if rest.is_empty() {
            vec![String::new()]
        } else {
            owned(rest)
        };
        Parameter::solo(*first, values, index).with_continuation(find_continuation(document, index))
    } else {
        Parameter::keyed(*first, owned(rest), index)
    };
    Step::emit(state.clone(), Some(Record::Parameter(param)), 1)
}

/// Next non-blank line after `index`, unless it opens a layer, a section, or
/// is a `!` comment. The line is only recorded, never consumed.
pub(crate) fn find_continuation(document: &Document, index: usize) -> Option<Continuation> {
    let next = (index + 1..document.len()).find(|candidate| !document.is_blank(*candidate))?;
    let text = document.trimmed(next)?;
    if text.starts_with(LAYER_PREFIX)
        || SectionTag::from_keyword(text).is_some()
        || text.starts_with('!')
    {
        return None;
    }
    Some(Continuation {
        line: next,
        text: document.content(next)?.to_string(),
    })
}

fn is_degenerate_row(document: &Document, index: usize) -> bool {
    document.trimmed(index).is_some_and(|line| {
        !line.is_empty()
            && line
                .split_whitespace()
                .all(|token| token == DEGENERATE_ROW_TOKEN)
    })
}

fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|token| (*token).to_string()).collect()
}
