pub mod errors;

pub use errors::{FltsError, FltsErrorCategory, FltsResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Top-level block keywords, in the order the simulator expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SectionTag {
    #[serde(rename = "TITLE")]
    Title,
    #[serde(rename = "INSTRUMENTAL AND SIZE BROADENING")]
    Instrumental,
    #[serde(rename = "STRUCTURAL")]
    Structural,
    #[serde(rename = "STACKING")]
    Stacking,
    #[serde(rename = "TRANSITIONS")]
    Transitions,
    #[serde(rename = "CALCULATION")]
    Calculation,
    #[serde(rename = "SIMULATION")]
    Simulation,
}

impl SectionTag {
    pub const ALL: [SectionTag; 7] = [
        Self::Title,
        Self::Instrumental,
        Self::Structural,
        Self::Stacking,
        Self::Transitions,
        Self::Calculation,
        Self::Simulation,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Instrumental => "INSTRUMENTAL AND SIZE BROADENING",
            Self::Structural => "STRUCTURAL",
            Self::Stacking => "STACKING",
            Self::Transitions => "TRANSITIONS",
            Self::Calculation => "CALCULATION",
            Self::Simulation => "SIMULATION",
        }
    }

    /// Matches an already trimmed line against the section keywords.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == keyword)
    }

    /// CALCULATION and SIMULATION are two spellings of the same block.
    pub const fn is_calculation(self) -> bool {
        matches!(self, Self::Calculation | Self::Simulation)
    }
}

impl Display for SectionTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAddress {
    pub section: SectionTag,
    pub subsection: Option<String>,
    pub key: String,
    pub value_index: usize,
}

impl FieldAddress {
    pub fn new(section: SectionTag, key: impl Into<String>, value_index: usize) -> Self {
        Self {
            section,
            subsection: None,
            key: key.into(),
            value_index,
        }
    }

    pub fn in_subsection(
        section: SectionTag,
        subsection: impl Into<String>,
        key: impl Into<String>,
        value_index: usize,
    ) -> Self {
        Self {
            section,
            subsection: Some(subsection.into()),
            key: key.into(),
            value_index,
        }
    }
}

impl Display for FieldAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.subsection {
            Some(subsection) => write!(
                f,
                "{} / {} / {}[{}]",
                self.section, subsection, self.key, self.value_index
            ),
            None => write!(f, "{} / {}[{}]", self.section, self.key, self.value_index),
        }
    }
}

/// Wire form of a single edit coming from an editor front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub section: String,
    #[serde(default)]
    pub subsection: Option<String>,
    pub key: String,
    #[serde(default)]
    pub index: usize,
    pub value: String,
}

impl EditRequest {
    pub fn address(&self) -> FltsResult<FieldAddress> {
        let section = SectionTag::from_keyword(self.section.trim()).ok_or_else(|| {
            FltsError::unknown_field(format!("unknown section '{}'", self.section))
        })?;
        Ok(FieldAddress {
            section,
            subsection: self.subsection.clone(),
            key: self.key.clone(),
            value_index: self.index,
        })
    }
}
