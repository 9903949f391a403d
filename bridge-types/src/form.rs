//! Form element model.
//!
//! The engine exposes form elements as typed fields; the bridge maps their
//! state to and from the string encoding callers see. The encoding itself
//! lives in `pdfbridge-core`.

use serde::{Deserialize, Serialize};

/// The type of a form element, as classified by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFieldKind {
    /// Free-text entry field.
    Text,
    /// Editable button (checkbox/radio).
    Button,
    /// Choice field (list or combo box).
    Choice,
    /// Digital signature field. Not readable or writable over the bridge.
    Signature,
    /// Any other field type the bridge does not handle.
    Unknown,
}

/// The typed state of a form element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormFieldState {
    /// Text content; absent text is the empty string.
    Text(String),
    /// Button selection state.
    Button {
        /// Whether the button is currently selected.
        selected: bool,
    },
    /// Ordered zero-based indexes of the selected options.
    Choice {
        /// Selected option indexes, in selection order.
        selected_indexes: Vec<u32>,
    },
    /// State the bridge cannot interpret (signature/unknown fields).
    Opaque,
}

/// A form element looked up by fully qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// Fully qualified field name (e.g. `address.street`).
    pub fully_qualified_name: String,
    /// Field classification.
    pub kind: FormFieldKind,
    /// Current typed state.
    pub state: FormFieldState,
}

impl FormField {
    /// A text field holding the given value.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            fully_qualified_name: name.into(),
            kind: FormFieldKind::Text,
            state: FormFieldState::Text(value.into()),
        }
    }

    /// A button field with the given selection state.
    pub fn button(name: impl Into<String>, selected: bool) -> Self {
        Self {
            fully_qualified_name: name.into(),
            kind: FormFieldKind::Button,
            state: FormFieldState::Button { selected },
        }
    }

    /// A choice field with the given selected indexes.
    pub fn choice(name: impl Into<String>, selected_indexes: Vec<u32>) -> Self {
        Self {
            fully_qualified_name: name.into(),
            kind: FormFieldKind::Choice,
            state: FormFieldState::Choice { selected_indexes },
        }
    }

    /// A signature field. Always opaque to the bridge.
    pub fn signature(name: impl Into<String>) -> Self {
        Self {
            fully_qualified_name: name.into(),
            kind: FormFieldKind::Signature,
            state: FormFieldState::Opaque,
        }
    }

    /// A field of a type the bridge does not handle.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            fully_qualified_name: name.into(),
            kind: FormFieldKind::Unknown,
            state: FormFieldState::Opaque,
        }
    }
}
