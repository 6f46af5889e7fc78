use crate::domain::SectionTag;
use crate::model::{TRANSITION_PROBABILITY_KEY, TRANSITION_WIDTHS_KEY};

pub(crate) const ABERRATIONS_KEY: &str = "Aberrations";
pub(crate) const PSEUDO_VOIGT_KEY: &str = "Pseudo-Voigt";
pub(crate) const ABERRATIONS_WIDTH: usize = 3;
pub(crate) const PSEUDO_VOIGT_WIDTH: usize = 7;
pub(crate) const TRIM_MARKER: &str = "TRIM";
pub(crate) const CONTINUATION_INDEX: usize = 1;

/// How an edit is written back. Variants are listed in selection priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewritePolicy {
    /// Exactly three values on the primary line.
    Aberrations,
    /// The parsed values cut to seven, then the `TRIM` marker. A marker read
    /// from the source counts as one of the seven.
    PseudoVoigt,
    /// `LT`/`FW` primary line, plus removal of a stray `0` line below it.
    TransitionRow,
    /// Index 1 addresses the line below the primary line.
    Continuation,
    Primary,
}

impl RewritePolicy {
    pub fn select(section: SectionTag, key: &str, value_index: usize) -> Self {
        match (section, key) {
            (SectionTag::Instrumental, ABERRATIONS_KEY) => Self::Aberrations,
            (SectionTag::Instrumental, PSEUDO_VOIGT_KEY) => Self::PseudoVoigt,
            (SectionTag::Transitions, TRANSITION_PROBABILITY_KEY | TRANSITION_WIDTHS_KEY) => {
                Self::TransitionRow
            }
            _ if value_index == CONTINUATION_INDEX => Self::Continuation,
            _ => Self::Primary,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aberrations => "aberrations",
            Self::PseudoVoigt => "pseudo-voigt",
            Self::TransitionRow => "transition-row",
            Self::Continuation => "continuation",
            Self::Primary => "primary",
        }
    }
}

/// Writes `value` at `index`, padding with empty strings as needed.
pub(crate) fn set_value(values: &mut Vec<String>, index: usize, value: &str) {
    if values.len() <= index {
        values.resize(index + 1, String::new());
    }
    values[index] = value.to_string();
}

pub(crate) fn fix_width(values: &mut Vec<String>, width: usize) {
    values.resize(width, String::new());
}

#[cfg(test)]
mod tests {
    use super::{RewritePolicy, fix_width, set_value};
    use crate::domain::SectionTag;

    #[test]
    fn selection_follows_override_priority() {
        let cases = [
            (SectionTag::Instrumental, "Aberrations", 1, RewritePolicy::Aberrations),
            (SectionTag::Instrumental, "Pseudo-Voigt", 1, RewritePolicy::PseudoVoigt),
            (SectionTag::Transitions, "LT", 1, RewritePolicy::TransitionRow),
            (SectionTag::Transitions, "FW", 0, RewritePolicy::TransitionRow),
            (SectionTag::Stacking, "INFINITE", 1, RewritePolicy::Continuation),
            (SectionTag::Instrumental, "Wavelength", 1, RewritePolicy::Continuation),
            (SectionTag::Structural, "Aberrations", 0, RewritePolicy::Primary),
            (SectionTag::Structural, "Cell", 2, RewritePolicy::Primary),
        ];

        for (section, key, index, expected) in cases {
            assert_eq!(
                RewritePolicy::select(section, key, index),
                expected,
                "{section} {key}[{index}]"
            );
        }
    }

    #[test]
    fn value_helpers_pad_and_truncate() {
        let mut values = vec!["a".to_string()];
        set_value(&mut values, 3, "d");
        assert_eq!(values, vec!["a", "", "", "d"]);

        fix_width(&mut values, 2);
        assert_eq!(values, vec!["a", ""]);
    }
}
