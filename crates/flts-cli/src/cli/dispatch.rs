use super::CliError;
use flts_core::domain::SectionTag;

/// Short names accepted on the command line in place of the full keyword.
pub(super) const SECTION_ALIASES: [(&str, SectionTag); 7] = [
    ("title", SectionTag::Title),
    ("instrumental", SectionTag::Instrumental),
    ("structural", SectionTag::Structural),
    ("stacking", SectionTag::Stacking),
    ("transitions", SectionTag::Transitions),
    ("calculation", SectionTag::Calculation),
    ("simulation", SectionTag::Simulation),
];

pub(super) fn parse_section_tag(name: &str) -> Result<SectionTag, CliError> {
    let name = name.trim();
    if let Some(tag) = SectionTag::from_keyword(name) {
        return Ok(tag);
    }

    SECTION_ALIASES
        .iter()
        .find(|(alias, tag)| alias.eq_ignore_ascii_case(name) || tag.as_str().eq_ignore_ascii_case(name))
        .map(|(_, tag)| *tag)
        .ok_or_else(|| {
            let known = SECTION_ALIASES
                .iter()
                .map(|(alias, _)| *alias)
                .collect::<Vec<_>>()
                .join(", ");
            CliError::Usage(format!("unknown section '{name}' (expected one of: {known})"))
        })
}
