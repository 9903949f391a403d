//! String encoding of form field values.
//!
//! Callers see every form value as a string; the engine sees typed state.
//! This module is the single place where the two meet. The encoding is:
//!
//! * text fields: the raw text, absent text reads as `""`
//! * button fields: the literal tokens `selected` / `deselected`
//! * choice fields: zero-based indexes joined with commas (`"1,3,5"`),
//!   no trailing separator
//! * signature fields: refused in both directions
//!
//! Fields of any other type fail with an invalid-field-type error naming
//! the field.

use bridge_types::{BridgeError, FormField, FormFieldKind, FormFieldState};

/// Button token for a selected state.
pub const SELECTED: &str = "selected";
/// Button token for a deselected state.
pub const DESELECTED: &str = "deselected";

/// Encode a field's current state as its string form.
pub fn read_form_value(field: &FormField) -> Result<String, BridgeError> {
    match (field.kind, &field.state) {
        (FormFieldKind::Text, FormFieldState::Text(value)) => Ok(value.clone()),
        (FormFieldKind::Button, FormFieldState::Button { selected }) => Ok(if *selected {
            SELECTED.to_string()
        } else {
            DESELECTED.to_string()
        }),
        (FormFieldKind::Choice, FormFieldState::Choice { selected_indexes }) => Ok(selected_indexes
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",")),
        (FormFieldKind::Signature, _) => Err(BridgeError::UnsupportedOperation(format!(
            "signature form fields cannot be read over the bridge: {}",
            field.fully_qualified_name
        ))),
        _ => Err(BridgeError::InvalidFieldType(
            field.fully_qualified_name.clone(),
        )),
    }
}

/// Decode a caller-provided string into the typed state to write back.
///
/// The returned state matches the field's kind; the caller is expected
/// to hand it to the engine unchanged.
pub fn write_form_value(field: &FormField, value: &str) -> Result<FormFieldState, BridgeError> {
    match field.kind {
        FormFieldKind::Text => Ok(FormFieldState::Text(value.to_string())),
        FormFieldKind::Button => match value {
            SELECTED => Ok(FormFieldState::Button { selected: true }),
            DESELECTED => Ok(FormFieldState::Button { selected: false }),
            other => Err(BridgeError::invalid_argument(
                "invalid button form field value",
                format!(
                    "expected \"{SELECTED}\" or \"{DESELECTED}\" for field {}, got \"{other}\"",
                    field.fully_qualified_name
                ),
            )),
        },
        FormFieldKind::Choice => {
            let mut selected_indexes = Vec::new();
            for token in value.split(',') {
                let token = token.trim();
                let index: u32 = token.parse().map_err(|_| {
                    BridgeError::invalid_argument(
                        "invalid choice form field value",
                        format!(
                            "expected comma-separated indexes for field {}, got token \"{token}\"",
                            field.fully_qualified_name
                        ),
                    )
                })?;
                selected_indexes.push(index);
            }
            Ok(FormFieldState::Choice { selected_indexes })
        }
        FormFieldKind::Signature => Err(BridgeError::UnsupportedOperation(format!(
            "signature form fields cannot be written over the bridge: {}",
            field.fully_qualified_name
        ))),
        FormFieldKind::Unknown => Err(BridgeError::InvalidFieldType(
            field.fully_qualified_name.clone(),
        )),
    }
}
