//! Parsed G-Code command types

use serde::{Deserialize, Serialize};

/// A single parameter word of a command (e.g. `X10.5`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommandParameter {
    /// Upper-cased parameter letter
    pub name: char,
    /// Numeric value
    pub value: f64,
}

/// Represents one parsed G-Code source line
///
/// Immutable once produced by the parser:
/// - Normalized command word (`G01` becomes `G1`)
/// - Parameter words in source order
/// - Free text for text commands such as `M117`
/// - Trailing comment
/// - Source line number and the raw text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// Normalized command word, empty for blank or comment-only lines
    pub command: String,
    /// Parameter words
    pub parameters: Vec<CommandParameter>,
    /// Free text argument of text commands (M117 and friends)
    pub text: Option<String>,
    /// Comment text without the leading `;`
    pub comment: Option<String>,
    /// 1-based source line number
    pub line_number: u32,
    /// Raw source text, without the line terminator
    pub gcode: String,
}

impl ParsedCommand {
    /// Create an empty command for the given raw line
    pub fn new(gcode: impl Into<String>, line_number: u32) -> Self {
        Self {
            command: String::new(),
            parameters: Vec::new(),
            text: None,
            comment: None,
            line_number,
            gcode: gcode.into(),
        }
    }

    /// Get a parameter value by letter
    pub fn get(&self, name: char) -> Option<f64> {
        let name = name.to_ascii_uppercase();
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }

    /// Check if a parameter letter is present
    pub fn has(&self, name: char) -> bool {
        self.get(name).is_some()
    }

    /// Whether the line carries no command word (blank or comment only)
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }

    /// G0 or G1
    pub fn is_linear_move(&self) -> bool {
        self.command == "G0" || self.command == "G1"
    }

    /// G2 or G3
    pub fn is_arc_move(&self) -> bool {
        self.command == "G2" || self.command == "G3"
    }

    /// Any motion command
    pub fn is_motion(&self) -> bool {
        self.is_linear_move() || self.is_arc_move()
    }
}

impl std::fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.line_number, self.gcode)
    }
}
