//! Argument shapes shared across bridge operations.

use serde::{Deserialize, Serialize};

/// An annotation type selector.
///
/// `All` selects every annotation; `None` selects nothing. The string
/// tokens match the lowercase names used on the bridge call surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// Every annotation type.
    All,
    /// No annotation type.
    None,
    /// Ink (freehand drawing).
    Ink,
    /// Text highlight markup.
    Highlight,
    /// Underline markup.
    Underline,
    /// Squiggly underline markup.
    Squiggly,
    /// Strikeout markup.
    Strikeout,
    /// Note (sticky note).
    Note,
    /// Square shape.
    Square,
    /// Circle shape.
    Circle,
    /// Line shape.
    Line,
    /// Free text.
    Freetext,
    /// Stamp.
    Stamp,
    /// Embedded image.
    Image,
    /// Link.
    Link,
    /// Form widget.
    Widget,
}

impl AnnotationType {
    /// Parse the lowercase bridge token for an annotation type.
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "all" => Self::All,
            "none" => Self::None,
            "ink" => Self::Ink,
            "highlight" => Self::Highlight,
            "underline" => Self::Underline,
            "squiggly" => Self::Squiggly,
            "strikeout" => Self::Strikeout,
            "note" => Self::Note,
            "square" => Self::Square,
            "circle" => Self::Circle,
            "line" => Self::Line,
            "freetext" => Self::Freetext,
            "stamp" => Self::Stamp,
            "image" => Self::Image,
            "link" => Self::Link,
            "widget" => Self::Widget,
            _ => return None,
        };
        Some(ty)
    }

    /// The lowercase bridge token for this annotation type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::None => "none",
            Self::Ink => "ink",
            Self::Highlight => "highlight",
            Self::Underline => "underline",
            Self::Squiggly => "squiggly",
            Self::Strikeout => "strikeout",
            Self::Note => "note",
            Self::Square => "square",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::Freetext => "freetext",
            Self::Stamp => "stamp",
            Self::Image => "image",
            Self::Link => "link",
            Self::Widget => "widget",
        }
    }

    /// Whether this selector matches the given concrete type.
    pub fn matches(&self, concrete: AnnotationType) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            other => *other == concrete,
        }
    }
}

/// How `processAnnotations` transforms annotations into the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationProcessingMode {
    /// Render annotations into the page content and drop the annotation.
    Flatten,
    /// Remove annotations entirely.
    Remove,
    /// Keep annotations embedded and editable.
    Embed,
    /// Keep annotations visible for printing only.
    Print,
}

impl AnnotationProcessingMode {
    /// Parse the lowercase bridge token for a processing mode.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "flatten" => Some(Self::Flatten),
            "remove" => Some(Self::Remove),
            "embed" => Some(Self::Embed),
            "print" => Some(Self::Print),
            _ => None,
        }
    }

    /// The lowercase bridge token for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flatten => "flatten",
            Self::Remove => "remove",
            Self::Embed => "embed",
            Self::Print => "print",
        }
    }
}

/// A rectangle in PDF page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl PdfRect {
    /// Create a rectangle from origin and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Options for generating a PDF from HTML content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlConversionOptions {
    /// Title for the generated document. Empty title when unset.
    pub document_title: Option<String>,
    /// Page count hint for pagination. Engine default applies when unset.
    pub number_of_pages: Option<u32>,
}
