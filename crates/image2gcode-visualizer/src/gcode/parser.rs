//! Line tokenizer for raster G-Code

use image2gcode_core::GcodeError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One address word, e.g. `X12.5` or `S300`
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// Upper-case address letter
    pub letter: char,
    /// Numeric value
    pub value: f64,
    /// Value as written
    pub raw: String,
}

impl Word {
    /// Integer value, if the word carries one
    pub fn as_integer(&self) -> Option<i64> {
        self.raw.parse().ok()
    }
}

/// A tokenized, non-empty program line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub line_number: u32,
    pub words: Vec<Word>,
}

impl ParsedLine {
    /// First word with `letter`
    pub fn word(&self, letter: char) -> Option<&Word> {
        self.words.iter().find(|w| w.letter == letter)
    }
}

/// Strip `;` and `(...)` comments
pub fn remove_comments(line: &str) -> String {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COMMENT_REGEX.get_or_init(|| Regex::new(r"[;(].*").expect("invalid regex pattern"));
    regex.replace(line, "").to_string()
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"^([A-Za-z])([-+]?(?:\d+\.?\d*|\.\d+))$").expect("invalid regex pattern")
    })
}

/// Parse a single word token
pub fn parse_word(line_number: u32, token: &str) -> Result<Word, GcodeError> {
    let captures = word_regex()
        .captures(token)
        .ok_or_else(|| GcodeError::InvalidSyntax {
            line_number,
            reason: format!("malformed word '{}'", token),
        })?;
    let letter = captures[1]
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('?');
    let raw = captures[2].to_string();
    let value = raw.parse::<f64>().map_err(|e| GcodeError::InvalidParameter {
        line_number,
        param: letter.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Word { letter, value, raw })
}

/// Tokenize one line; `None` when it holds only whitespace or comments
pub fn parse_line(line_number: u32, line: &str) -> Result<Option<ParsedLine>, GcodeError> {
    let code = remove_comments(line);
    let words = code
        .split_whitespace()
        .map(|token| parse_word(line_number, token))
        .collect::<Result<Vec<_>, _>>()?;
    if words.is_empty() {
        return Ok(None);
    }
    Ok(Some(ParsedLine { line_number, words }))
}

/// `key: value` pairs from the leading `;` comment block
///
/// The first occurrence of a key wins.
pub fn header_fields(program: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in program.lines() {
        let Some(comment) = line.trim_start().strip_prefix(';') else {
            if line.trim().is_empty() {
                continue;
            }
            break;
        };
        if let Some((key, value)) = comment.split_once(':') {
            fields
                .entry(key.trim().to_string())
                .or_insert_with(|| value.trim().to_string());
        }
    }
    fields
}
