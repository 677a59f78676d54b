//! G-Code line parser

use arcweld_core::GcodeError;
use regex::Regex;

use super::{CommandParameter, ParsedCommand};

/// Commands whose remaining text is a free-form argument rather than words
const TEXT_COMMANDS: &[&str] = &["M23", "M28", "M30", "M32", "M117", "M118", "M928"];

/// G-Code line parser
///
/// Turns one raw source line into a [`ParsedCommand`]. The parser is
/// stateless; modal state is resolved separately by
/// [`PositionTracker`](super::PositionTracker).
#[derive(Debug, Clone, Default)]
pub struct GcodeParser;

impl GcodeParser {
    /// Create a new G-Code parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a G-Code line
    ///
    /// Blank and comment-only lines parse into a command with an empty
    /// command word. Malformed words are reported as [`GcodeError`]s
    /// carrying `line_number`.
    pub fn parse(&self, line: &str, line_number: u32) -> Result<ParsedCommand, GcodeError> {
        let raw = line.trim_end_matches(['\r', '\n']);
        let mut parsed = ParsedCommand::new(raw, line_number);

        let (code, comment) = match raw.find(';') {
            Some(pos) => (&raw[..pos], Some(raw[pos + 1..].trim().to_string())),
            None => (raw, None),
        };
        parsed.comment = comment;

        let code = Self::remove_inline_comments(code, line_number)?;
        let code = Self::strip_line_decorations(&code);
        if code.is_empty() {
            return Ok(parsed);
        }

        let mut chars = code.chars().peekable();
        let letter = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
            Some(c) => {
                return Err(GcodeError::InvalidSyntax {
                    line_number,
                    reason: format!("expected a command letter, found '{}'", c),
                })
            }
            None => return Ok(parsed),
        };

        if !chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            return Self::parse_extended(parsed, &code, line_number);
        }

        let mut number = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                number.push(c);
                chars.next();
            } else {
                break;
            }
        }
        parsed.command = format!("{}{}", letter, Self::normalize_number(&number));

        let rest: String = chars.collect();
        if TEXT_COMMANDS.contains(&parsed.command.as_str()) {
            let text = rest.trim();
            if !text.is_empty() {
                parsed.text = Some(text.to_string());
            }
            return Ok(parsed);
        }

        let allow_flags = !matches!(parsed.command.as_str(), "G0" | "G1" | "G2" | "G3");
        parsed.parameters = Self::parse_words(&rest, line_number, allow_flags)?;
        Ok(parsed)
    }

    /// Remove `( ... )` comments
    fn remove_inline_comments(code: &str, line_number: u32) -> Result<String, GcodeError> {
        let mut result = String::with_capacity(code.len());
        let mut depth = 0usize;
        for c in code.chars() {
            match c {
                '(' => depth += 1,
                ')' if depth > 0 => depth -= 1,
                _ if depth == 0 => result.push(c),
                _ => {}
            }
        }
        if depth > 0 {
            return Err(GcodeError::InvalidSyntax {
                line_number,
                reason: "unterminated inline comment".to_string(),
            });
        }
        Ok(result)
    }

    /// Strip a leading `N` line number and a trailing `*NN` checksum
    fn strip_line_decorations(code: &str) -> String {
        static LINE_NUMBER_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
        static CHECKSUM_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
        let line_number = LINE_NUMBER_REGEX
            .get_or_init(|| Regex::new(r"^\s*[Nn]\d+\s*").expect("invalid regex pattern"));
        let checksum = CHECKSUM_REGEX
            .get_or_init(|| Regex::new(r"\*\d+\s*$").expect("invalid regex pattern"));

        let code = checksum.replace(code, "");
        line_number.replace(&code, "").trim().to_string()
    }

    /// Drop leading zeros of the integer part (`01` becomes `1`, `00` becomes `0`)
    fn normalize_number(number: &str) -> String {
        let (int_part, frac_part) = match number.find('.') {
            Some(pos) => (&number[..pos], Some(&number[pos..])),
            None => (number, None),
        };
        let trimmed = int_part.trim_start_matches('0');
        let int_part = if trimmed.is_empty() { "0" } else { trimmed };
        match frac_part {
            Some(frac) => format!("{}{}", int_part, frac),
            None => int_part.to_string(),
        }
    }

    /// Klipper-style extended commands such as `SET_FAN_SPEED FAN=1 SPEED=0.5`
    fn parse_extended(
        mut parsed: ParsedCommand,
        code: &str,
        line_number: u32,
    ) -> Result<ParsedCommand, GcodeError> {
        let (word, rest) = match code.find(char::is_whitespace) {
            Some(pos) => (&code[..pos], code[pos..].trim()),
            None => (code, ""),
        };
        if word.len() < 2 || !word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GcodeError::InvalidSyntax {
                line_number,
                reason: format!("unrecognized command '{}'", word),
            });
        }
        parsed.command = word.to_ascii_uppercase();
        if !rest.is_empty() {
            parsed.text = Some(rest.to_string());
        }
        Ok(parsed)
    }

    /// Parse the parameter words following the command word
    fn parse_words(
        rest: &str,
        line_number: u32,
        allow_flags: bool,
    ) -> Result<Vec<CommandParameter>, GcodeError> {
        let mut parameters = Vec::new();
        let mut chars = rest.chars().peekable();

        loop {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let name = match chars.next() {
                None => break,
                Some(c) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
                Some(c) => {
                    return Err(GcodeError::InvalidSyntax {
                        line_number,
                        reason: format!("unexpected character '{}'", c),
                    })
                }
            };
            while chars.peek().is_some_and(|c| *c == ' ' || *c == '\t') {
                chars.next();
            }

            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() || matches!(c, '.' | '-' | '+') {
                    token.push(c);
                    chars.next();
                } else {
                    break;
                }
            }

            if token.is_empty() {
                if !allow_flags {
                    return Err(GcodeError::MissingParameter {
                        line_number,
                        param: name,
                    });
                }
                parameters.push(CommandParameter { name, value: 0.0 });
                continue;
            }

            let value = token
                .parse::<f64>()
                .map_err(|_| GcodeError::InvalidParameter {
                    line_number,
                    param: name,
                    reason: format!("'{}' is not a number", token),
                })?;
            parameters.push(CommandParameter { name, value });
        }

        Ok(parameters)
    }
}
