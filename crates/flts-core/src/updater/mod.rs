//! Targeted field edits.
//!
//! An edit touches the addressed parameter's primary line and, for the
//! continuation and transition-row policies, at most one neighbouring line.
//! Line insertions and removals are followed immediately by
//! [`Model::shift_lines`] so the model never observes a stale index.

mod policy;

pub use policy::RewritePolicy;

use crate::document::Document;
use crate::domain::{FieldAddress, FltsError, FltsResult, SectionTag};
use crate::model::{Continuation, Model, Parameter, Subsection};
use policy::{ABERRATIONS_WIDTH, PSEUDO_VOIGT_WIDTH, TRIM_MARKER, fix_width, set_value};

const PLACEHOLDER_ROW: &str = "0";

pub fn apply_update(
    document: &mut Document,
    model: &mut Model,
    address: &FieldAddress,
    value: &str,
) -> FltsResult<()> {
    check_single_line(value)?;
    let policy = RewritePolicy::select(address.section, &address.key, address.value_index);
    tracing::debug!(%address, policy = policy.as_str(), value, "applying edit");

    match policy {
        RewritePolicy::Aberrations => {
            rewrite_fixed_width(document, model, address, value, ABERRATIONS_WIDTH, None)?
        }
        RewritePolicy::PseudoVoigt => rewrite_fixed_width(
            document,
            model,
            address,
            value,
            PSEUDO_VOIGT_WIDTH,
            Some(TRIM_MARKER),
        )?,
        RewritePolicy::TransitionRow => rewrite_transition_row(document, model, address, value)?,
        RewritePolicy::Continuation => write_continuation(document, model, address, value)?,
        RewritePolicy::Primary => {
            let param = model.resolve_mut(address)?;
            set_value(&mut param.values, address.value_index, value);
            write_primary(document, param);
        }
    }

    model.validate_lines(document.len())
}

/// Sets the `FW` row of every transition block to `values`. Returns how many
/// rows were rewritten.
pub fn apply_transition_widths(
    document: &mut Document,
    model: &mut Model,
    values: &[String],
) -> FltsResult<usize> {
    for value in values {
        check_single_line(value)?;
    }
    let Some(section) = model.section_mut(SectionTag::Transitions) else {
        return Ok(0);
    };

    let mut rewritten = 0;
    for subsection in &mut section.subsections {
        let Subsection::Transition(block) = subsection else {
            continue;
        };
        if let Some(widths) = block.widths.as_mut() {
            widths.values = values.to_vec();
            write_primary(document, widths);
            rewritten += 1;
        }
    }
    tracing::debug!(rewritten, "applied transition widths to all blocks");

    model.validate_lines(document.len())?;
    Ok(rewritten)
}

/// A value must not split its line; the model indexes physical lines.
fn check_single_line(value: &str) -> FltsResult<()> {
    if value.contains(['\n', '\r']) {
        return Err(FltsError::input_validation(
            "INPUT.FIELD_VALUE",
            format!("value {value:?} contains a line break"),
        ));
    }
    Ok(())
}

fn write_primary(document: &mut Document, param: &Parameter) {
    let indentation = document.indentation(param.line).to_string();
    document.set_content(param.line, &format!("{indentation}{}", param.render()));
}

fn rewrite_fixed_width(
    document: &mut Document,
    model: &mut Model,
    address: &FieldAddress,
    value: &str,
    width: usize,
    marker: Option<&str>,
) -> FltsResult<()> {
    let param = model.resolve_mut(address)?;
    set_value(&mut param.values, address.value_index, value);
    fix_width(&mut param.values, width);
    if let Some(marker) = marker {
        param.values.push(marker.to_string());
    }
    write_primary(document, param);
    Ok(())
}

fn rewrite_transition_row(
    document: &mut Document,
    model: &mut Model,
    address: &FieldAddress,
    value: &str,
) -> FltsResult<()> {
    let param = model.resolve_mut(address)?;
    set_value(&mut param.values, address.value_index, value);
    write_primary(document, param);

    let below = param.line + 1;
    if document.trimmed(below) == Some(PLACEHOLDER_ROW) {
        document.remove(below);
        model.shift_lines(below, -1);
        tracing::debug!(line = below + 1, "removed placeholder row below transition");
    }
    Ok(())
}

fn write_continuation(
    document: &mut Document,
    model: &mut Model,
    address: &FieldAddress,
    value: &str,
) -> FltsResult<()> {
    let param = model.resolve_mut(address)?;
    if let Some(continuation) = param.continuation.as_mut() {
        let text = format!("{}{value}", document.indentation(continuation.line));
        document.set_content(continuation.line, &text);
        continuation.text = text;
        return Ok(());
    }

    let primary = param.line;
    let text = format!("{}{value}", document.indentation(primary));
    let line = document.insert_below(primary, &text);
    model.shift_lines(line, 1);
    model.resolve_mut(address)?.continuation = Some(Continuation { line, text });
    tracing::debug!(line = line + 1, "inserted continuation line");
    Ok(())
}
