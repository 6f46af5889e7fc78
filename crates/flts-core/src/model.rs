//! Addressable view over a [`Document`](crate::document::Document).
//!
//! Nothing in here owns text that gets written back; every record points at
//! document lines by index. Whenever the updater inserts or removes a line it
//! calls [`Model::shift_lines`] before anything reads the model again.

use crate::domain::{FieldAddress, FltsError, FltsResult, SectionTag};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Continuation {
    pub line: usize,
    /// Line text without terminator, indentation included.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Address key. Differs from `keyword` only for atom records.
    pub key: String,
    /// Token written in front of the values on rewrite.
    pub keyword: String,
    pub values: Vec<String>,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continuation>,
    pub solo: bool,
}

impl Parameter {
    pub fn keyed(key: impl Into<String>, values: Vec<String>, line: usize) -> Self {
        let key = key.into();
        Self {
            keyword: key.clone(),
            key,
            values,
            line,
            continuation: None,
            solo: false,
        }
    }

    pub fn solo(key: impl Into<String>, values: Vec<String>, line: usize) -> Self {
        Self {
            solo: true,
            ..Self::keyed(key, values, line)
        }
    }

    pub fn with_continuation(mut self, continuation: Option<Continuation>) -> Self {
        self.continuation = continuation;
        self
    }

    /// Text of the primary line, without indentation.
    pub fn render(&self) -> String {
        let joined = self.values.join(" ");
        if self.solo || self.keyword.is_empty() {
            joined
        } else {
            format!("{} {}", self.keyword, joined)
        }
    }

    fn line_indices(&self) -> impl Iterator<Item = usize> {
        std::iter::once(self.line).chain(
            self.continuation
                .as_ref()
                .map(|continuation| continuation.line),
        )
    }

    fn line_refs_mut(&mut self) -> impl Iterator<Item = &mut usize> {
        std::iter::once(&mut self.line).chain(
            self.continuation
                .as_mut()
                .map(|continuation| &mut continuation.line),
        )
    }
}

/// Key-ordered table of parameters; a repeated key replaces the earlier record
/// in place, like a dictionary keyed on the first token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ParameterTable {
    entries: Vec<Parameter>,
}

impl ParameterTable {
    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.entries.iter().find(|param| param.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Parameter> {
        self.entries.iter_mut().find(|param| param.key == key)
    }

    pub fn upsert(&mut self, param: Parameter) {
        match self.get_mut(&param.key) {
            Some(existing) => *existing = param,
            None => self.entries.push(param),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `LAYER ...` block of the STRUCTURAL section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerBlock {
    pub name: String,
    pub start: usize,
    pub atoms: ParameterTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symmetry: Option<Parameter>,
}

/// `!name` block of the TRANSITIONS section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionBlock {
    pub name: String,
    pub start: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widths: Option<Parameter>,
}

pub const LAYER_SYMMETRY_KEY: &str = "LSYM";
pub const TRANSITION_PROBABILITY_KEY: &str = "LT";
pub const TRANSITION_WIDTHS_KEY: &str = "FW";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subsection {
    Layer(LayerBlock),
    Transition(TransitionBlock),
}

impl Subsection {
    pub fn name(&self) -> &str {
        match self {
            Self::Layer(layer) => &layer.name,
            Self::Transition(transition) => &transition.name,
        }
    }

    pub fn start(&self) -> usize {
        match self {
            Self::Layer(layer) => layer.start,
            Self::Transition(transition) => transition.start,
        }
    }

    pub fn param(&self, key: &str) -> Option<&Parameter> {
        match self {
            Self::Layer(layer) => {
                if key == LAYER_SYMMETRY_KEY {
                    layer.symmetry.as_ref()
                } else {
                    layer.atoms.get(key)
                }
            }
            Self::Transition(transition) => match key {
                TRANSITION_PROBABILITY_KEY => transition.probability.as_ref(),
                TRANSITION_WIDTHS_KEY => transition.widths.as_ref(),
                _ => None,
            },
        }
    }

    pub fn param_mut(&mut self, key: &str) -> Option<&mut Parameter> {
        match self {
            Self::Layer(layer) => {
                if key == LAYER_SYMMETRY_KEY {
                    layer.symmetry.as_mut()
                } else {
                    layer.atoms.get_mut(key)
                }
            }
            Self::Transition(transition) => match key {
                TRANSITION_PROBABILITY_KEY => transition.probability.as_mut(),
                TRANSITION_WIDTHS_KEY => transition.widths.as_mut(),
                _ => None,
            },
        }
    }

    /// Stores a parameter in the slot its key belongs to. Keys that have no
    /// slot in this flavour of block are dropped.
    pub fn insert_param(&mut self, param: Parameter) {
        match self {
            Self::Layer(layer) if param.key == LAYER_SYMMETRY_KEY => layer.symmetry = Some(param),
            Self::Layer(layer) => layer.atoms.upsert(param),
            Self::Transition(transition) => match param.key.as_str() {
                TRANSITION_PROBABILITY_KEY => transition.probability = Some(param),
                TRANSITION_WIDTHS_KEY => transition.widths = Some(param),
                _ => {}
            },
        }
    }

    pub fn params(&self) -> Vec<&Parameter> {
        match self {
            Self::Layer(layer) => layer.symmetry.iter().chain(layer.atoms.iter()).collect(),
            Self::Transition(transition) => transition
                .probability
                .iter()
                .chain(transition.widths.iter())
                .collect(),
        }
    }

    fn line_refs_mut(&mut self) -> Vec<&mut usize> {
        match self {
            Self::Layer(layer) => std::iter::once(&mut layer.start)
                .chain(layer.symmetry.iter_mut().flat_map(|param| param.line_refs_mut()))
                .chain(layer.atoms.iter_mut().flat_map(|param| param.line_refs_mut()))
                .collect(),
            Self::Transition(transition) => std::iter::once(&mut transition.start)
                .chain(
                    transition
                        .probability
                        .iter_mut()
                        .flat_map(|param| param.line_refs_mut()),
                )
                .chain(
                    transition
                        .widths
                        .iter_mut()
                        .flat_map(|param| param.line_refs_mut()),
                )
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub tag: SectionTag,
    pub start: usize,
    pub params: ParameterTable,
    pub subsections: Vec<Subsection>,
}

impl Section {
    pub fn new(tag: SectionTag, start: usize) -> Self {
        Self {
            tag,
            start,
            params: ParameterTable::default(),
            subsections: Vec::new(),
        }
    }

    pub fn subsection(&self, name: &str) -> Option<&Subsection> {
        self.subsections
            .iter()
            .find(|subsection| subsection.name() == name)
    }

    pub fn subsection_mut(&mut self, name: &str) -> Option<&mut Subsection> {
        self.subsections
            .iter_mut()
            .find(|subsection| subsection.name() == name)
    }

    pub fn insert_subsection(&mut self, subsection: Subsection) {
        match self.subsection_mut(subsection.name()) {
            Some(existing) => *existing = subsection,
            None => self.subsections.push(subsection),
        }
    }

    fn line_refs_mut(&mut self) -> Vec<&mut usize> {
        let mut refs = vec![&mut self.start];
        refs.extend(self.params.iter_mut().flat_map(|param| param.line_refs_mut()));
        for subsection in &mut self.subsections {
            refs.extend(subsection.line_refs_mut());
        }
        refs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Model {
    pub sections: Vec<Section>,
}

impl Model {
    pub fn section(&self, tag: SectionTag) -> Option<&Section> {
        self.sections.iter().find(|section| section.tag == tag)
    }

    pub fn section_mut(&mut self, tag: SectionTag) -> Option<&mut Section> {
        self.sections.iter_mut().find(|section| section.tag == tag)
    }

    /// Sections appear at most once; a repeated keyword starts over.
    pub fn insert_section(&mut self, section: Section) {
        match self.section_mut(section.tag) {
            Some(existing) => {
                tracing::warn!(
                    section = %section.tag,
                    line = section.start + 1,
                    "section repeated, earlier occurrence dropped from the model"
                );
                *existing = section;
            }
            None => self.sections.push(section),
        }
    }

    pub fn resolve(&self, address: &FieldAddress) -> FltsResult<&Parameter> {
        let section = self
            .section(address.section)
            .ok_or_else(|| missing_section(address))?;
        let param = match &address.subsection {
            Some(name) => section
                .subsection(name)
                .ok_or_else(|| missing_subsection(address, name))?
                .param(&address.key),
            None => section.params.get(&address.key),
        };
        param.ok_or_else(|| missing_key(address))
    }

    pub fn resolve_mut(&mut self, address: &FieldAddress) -> FltsResult<&mut Parameter> {
        let section = self
            .sections
            .iter_mut()
            .find(|section| section.tag == address.section)
            .ok_or_else(|| missing_section(address))?;
        let param = match &address.subsection {
            Some(name) => section
                .subsection_mut(name)
                .ok_or_else(|| missing_subsection(address, name))?
                .param_mut(&address.key),
            None => section.params.get_mut(&address.key),
        };
        param.ok_or_else(|| missing_key(address))
    }

    /// Adds `delta` to every stored line index that is `>= at`.
    pub fn shift_lines(&mut self, at: usize, delta: isize) {
        let mut shifted = 0_usize;
        for index in self.line_refs_mut() {
            if *index >= at {
                *index = index.saturating_add_signed(delta);
                shifted += 1;
            }
        }
        tracing::trace!(at, delta, shifted, "shifted model line indices");
    }

    /// Checks that every stored index still points inside a document of
    /// `line_count` lines.
    pub fn validate_lines(&self, line_count: usize) -> FltsResult<()> {
        match self.line_indices().into_iter().find(|index| *index >= line_count) {
            Some(index) => Err(FltsError::internal(
                "INTERNAL.LINE_INDEX",
                format!(
                    "model references line {} but the document has {} lines",
                    index + 1,
                    line_count
                ),
            )),
            None => Ok(()),
        }
    }

    /// Every line index stored anywhere in the model.
    pub fn line_indices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for section in &self.sections {
            indices.push(section.start);
            indices.extend(section.params.iter().flat_map(Parameter::line_indices));
            for subsection in &section.subsections {
                indices.push(subsection.start());
                indices.extend(subsection.params().into_iter().flat_map(Parameter::line_indices));
            }
        }
        indices
    }

    fn line_refs_mut(&mut self) -> Vec<&mut usize> {
        self.sections
            .iter_mut()
            .flat_map(|section| section.line_refs_mut())
            .collect()
    }
}

fn missing_section(address: &FieldAddress) -> FltsError {
    FltsError::unknown_field(format!(
        "{address}: section {} is not present",
        address.section
    ))
}

fn missing_subsection(address: &FieldAddress, name: &str) -> FltsError {
    FltsError::unknown_field(format!(
        "{address}: section {} has no subsection '{name}'",
        address.section
    ))
}

fn missing_key(address: &FieldAddress) -> FltsError {
    FltsError::unknown_field(format!("{address}: no parameter '{}'", address.key))
}
