mod state;

pub use state::{Record, ScanState, Step, step};

pub use state::{ATOM_KEYWORD, TITLE_TEXT_KEY};

use crate::document::Document;
use crate::model::{LayerBlock, Model, ParameterTable, Section, Subsection, TransitionBlock};

/// Builds the model with a single forward scan. Lines that match no rule are
/// left out of the model; parsing never fails.
pub fn parse_document(document: &Document) -> Model {
    let mut model = Model::default();
    let mut state = ScanState::NoSection;
    let mut index = 0;

    while index < document.len() {
        let Step {
            state: next_state,
            record,
            consumed,
        } = step(&state, document, index);
        if let Some(record) = record {
            apply_record(&mut model, &next_state, record);
        }
        state = next_state;
        index += consumed.max(1);
    }

    tracing::debug!(
        lines = document.len(),
        sections = model.sections.len(),
        "parsed control file"
    );
    model
}

fn apply_record(model: &mut Model, state: &ScanState, record: Record) {
    match record {
        Record::Section { tag, start, title } => {
            let mut section = Section::new(tag, start);
            if let Some(title) = title {
                section.params.upsert(title);
            }
            model.insert_section(section);
        }
        Record::Layer { name, start } => {
            insert_subsection(
                model,
                state,
                Subsection::Layer(LayerBlock {
                    name,
                    start,
                    atoms: ParameterTable::default(),
                    symmetry: None,
                }),
            );
        }
        Record::Transition { name, start } => {
            insert_subsection(
                model,
                state,
                Subsection::Transition(TransitionBlock {
                    name,
                    start,
                    probability: None,
                    widths: None,
                }),
            );
        }
        Record::Parameter(param) => {
            let Some(section) = state.section().and_then(|tag| model.section_mut(tag)) else {
                return;
            };
            match state {
                ScanState::InSubsection(_, name) => {
                    if let Some(subsection) = section.subsection_mut(name) {
                        subsection.insert_param(param);
                    }
                }
                _ => section.params.upsert(param),
            }
        }
    }
}

fn insert_subsection(model: &mut Model, state: &ScanState, subsection: Subsection) {
    if let Some(section) = state.section().and_then(|tag| model.section_mut(tag)) {
        section.insert_subsection(subsection);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_document;
    use crate::document::Document;
    use crate::domain::SectionTag;
    use crate::model::Subsection;

    const SAMPLE: &str = "\
TITLE
Li3YCl6 8 layers
INSTRUMENTAL AND SIZE BROADENING
!  type of radiation
Radiation X-RAY
Wavelength 1.540560 1.544390 0.5
Aberrations 0.0 0.0 0.0
Pseudo-Voigt 0.01 -0.01 0.01 0.0 5000 5000 TRIM
STRUCTURAL
Cell 6.46 11.19 6.03 90.0 90.0 120.0
Symm -3
NLAYERS 2
Lwidth
  INFINITE
LAYER 1
LSYM -1
Atom Li 1 0.0 0.0 0.0 1.0 1.0
Atom Y 2 0.333 0.667 0.0 1.0 1.0
LAYER 2
Atom Cl 1 0.25 0.0 0.25 1.0 1.0
STACKING
RECURSIVE
INFINITE
TRANSITIONS
!layer 1 to layer 1
LT 0.5 0.0 0.0 0.0
FW 0.0 0.0 0.0 0.0 0.0 0.0
0.00 0.00
!layer 1 to layer 2
LT 0.5 0.333 0.667 0.5
SIMULATION
POWDER 5.0 80.0 0.02 0 0
";

    #[test]
    fn parser_builds_all_sections_in_file_order() {
        let model = parse_document(&Document::from_text(SAMPLE));

        let tags: Vec<SectionTag> = model.sections.iter().map(|section| section.tag).collect();
        assert_eq!(
            tags,
            vec![
                SectionTag::Title,
                SectionTag::Instrumental,
                SectionTag::Structural,
                SectionTag::Stacking,
                SectionTag::Transitions,
                SectionTag::Simulation,
            ]
        );

        let title = model.section(SectionTag::Title).expect("title");
        let text = title.params.get("Title_Text").expect("title text");
        assert_eq!(text.values, vec!["Li3YCl6 8 layers"]);
        assert_eq!(text.line, 1);
    }

    #[test]
    fn parser_reads_instrumental_keys_and_ignores_comments() {
        let model = parse_document(&Document::from_text(SAMPLE));
        let instrumental = model.section(SectionTag::Instrumental).expect("instrumental");

        assert_eq!(instrumental.params.len(), 4);
        let voigt = instrumental.params.get("Pseudo-Voigt").expect("Pseudo-Voigt");
        assert_eq!(voigt.values.len(), 7);
        assert_eq!(voigt.values.last().map(String::as_str), Some("TRIM"));
        assert_eq!(voigt.line, 7);
    }

    #[test]
    fn parser_records_structural_continuations_and_layers() {
        let model = parse_document(&Document::from_text(SAMPLE));
        let structural = model.section(SectionTag::Structural).expect("structural");

        let cell = structural.params.get("Cell").expect("Cell");
        assert_eq!(cell.continuation.as_ref().map(|c| c.line), Some(10));

        let lwidth = structural.params.get("Lwidth").expect("Lwidth");
        assert!(lwidth.values.is_empty());
        let continuation = lwidth.continuation.as_ref().expect("Lwidth continuation");
        assert_eq!(continuation.line, 13);
        assert_eq!(continuation.text, "  INFINITE");

        assert_eq!(structural.subsections.len(), 2);
        let Subsection::Layer(first) = &structural.subsections[0] else {
            panic!("layer subsection expected");
        };
        assert_eq!(first.name, "LAYER 1");
        assert_eq!(first.start, 14);
        assert_eq!(first.symmetry.as_ref().map(|p| p.values.clone()), Some(vec!["-1".to_string()]));
        assert!(first.atoms.get("Atom_Li_1").is_some());
        assert!(first.atoms.get("Atom_Y_2").is_some());
        assert!(structural.subsections[1].param("Atom_Cl_1").is_some());
    }

    #[test]
    fn parser_marks_stacking_descriptors_as_solo() {
        let model = parse_document(&Document::from_text(SAMPLE));
        let stacking = model.section(SectionTag::Stacking).expect("stacking");

        let recursive = stacking.params.get("RECURSIVE").expect("RECURSIVE");
        assert!(recursive.solo);
        assert_eq!(recursive.values, vec![String::new()]);
        assert_eq!(recursive.continuation.as_ref().map(|c| c.line), Some(22));

        let infinite = stacking.params.get("INFINITE").expect("INFINITE");
        assert_eq!(infinite.continuation, None);
    }

    #[test]
    fn parser_opens_named_transition_blocks() {
        let model = parse_document(&Document::from_text(SAMPLE));
        let transitions = model.section(SectionTag::Transitions).expect("transitions");

        let names: Vec<&str> = transitions
            .subsections
            .iter()
            .map(|subsection| subsection.name())
            .collect();
        assert_eq!(names, vec!["layer 1 to layer 1", "layer 1 to layer 2"]);

        let first = &transitions.subsections[0];
        assert_eq!(first.param("LT").map(|p| p.line), Some(25));
        assert_eq!(first.param("FW").map(|p| p.values.len()), Some(6));
        assert_eq!(transitions.subsections[1].start(), 28);

        let simulation = model.section(SectionTag::Simulation).expect("simulation");
        let powder = simulation.params.get("POWDER").expect("POWDER");
        assert_eq!(powder.values, vec!["5.0", "80.0", "0.02", "0", "0"]);
    }

    #[test]
    fn unrecognized_lines_are_skipped_without_error() {
        let model = parse_document(&Document::from_text(
            "preamble junk\nINSTRUMENTAL AND SIZE BROADENING\nBogus 1 2\nRadiation X-RAY\n",
        ));
        let instrumental = model.section(SectionTag::Instrumental).expect("instrumental");

        assert_eq!(instrumental.params.len(), 1);
        assert!(instrumental.params.get("Bogus").is_none());
    }

    #[test]
    fn stacking_solo_keys_keep_same_line_values() {
        let model = parse_document(&Document::from_text(
            "STACKING\nRECURSIVE\nINFINITE 1000\nTRANSITIONS\n",
        ));
        let stacking = model.section(SectionTag::Stacking).expect("stacking");

        let infinite = stacking.params.get("INFINITE").expect("INFINITE");
        assert!(infinite.solo);
        assert_eq!(infinite.values, vec!["1000"]);
        assert_eq!(infinite.continuation, None);
        assert_eq!(infinite.render(), "1000");

        let recursive = stacking.params.get("RECURSIVE").expect("RECURSIVE");
        assert_eq!(
            recursive.continuation.as_ref().map(|c| c.text.as_str()),
            Some("INFINITE 1000")
        );
    }

    #[test]
    fn calculation_spelling_reads_powder() {
        let model = parse_document(&Document::from_text(
            "CALCULATION\nPOWDER 5.0 80.0 0.02 0 0\n",
        ));

        assert!(model.section(SectionTag::Simulation).is_none());
        let calculation = model.section(SectionTag::Calculation).expect("calculation");
        let powder = calculation.params.get("POWDER").expect("POWDER");
        assert_eq!(powder.values, vec!["5.0", "80.0", "0.02", "0", "0"]);
        assert_eq!(powder.line, 1);
    }

    #[test]
    fn structural_reads_avercell_and_spgr() {
        let model = parse_document(&Document::from_text(
            "STRUCTURAL\nAvercell 6.46 11.19 6.03\nSPGR P-3m1\nNLAYERS 2\nLAYER 1\n",
        ));
        let structural = model.section(SectionTag::Structural).expect("structural");

        let avercell = structural.params.get("Avercell").expect("Avercell");
        assert_eq!(avercell.values, vec!["6.46", "11.19", "6.03"]);
        assert_eq!(avercell.continuation.as_ref().map(|c| c.line), Some(2));

        let spgr = structural.params.get("SPGR").expect("SPGR");
        assert_eq!(spgr.values, vec!["P-3m1"]);
        assert_eq!(spgr.line, 2);

        let nlayers = structural.params.get("NLAYERS").expect("NLAYERS");
        assert_eq!(nlayers.continuation, None);
    }
}
