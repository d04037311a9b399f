//! Diagnostic codes with stage prefixes for structured message identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The pipeline stage a diagnostic code belongs to, determining its prefix.
///
/// Each category maps to a single-character prefix used in diagnostic code
/// display (e.g., `P102` for a placement message, `S201` for a shape-engine
/// message).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Input parsing and validation, prefixed with `I`.
    Input,
    /// Shape-engine (macro tiling) messages, prefixed with `S`.
    Shape,
    /// Block placement messages, prefixed with `P`.
    Placement,
    /// Pin alignment messages, prefixed with `A`.
    Alignment,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Input => 'I',
            Category::Shape => 'S',
            Category::Placement => 'P',
            Category::Alignment => 'A',
        }
    }
}

/// A structured diagnostic code combining a stage prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `I101`, `P203`, `A305`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The stage category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
