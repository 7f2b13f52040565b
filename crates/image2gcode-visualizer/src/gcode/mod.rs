//! G-Code reading

pub mod parser;

pub use parser::{header_fields, parse_line, parse_word, remove_comments, ParsedLine, Word};
