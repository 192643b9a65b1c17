//! Reader error types.

use std::fmt;
use std::io;

/// Error type for read operations.
///
/// Each variant is one way a read can fail. A failed read never yields a
/// partially built value; the messages match the diagnostics printed by the
/// `sky` binary after `Error: `.
#[derive(Debug)]
pub enum ReadError {
    /// End of stream inside a list, string, `#symbol` form or escape
    UnexpectedEof,
    /// A `)` where an expression was expected
    UnmatchedDelimiter(char),
    /// A bare or `#`-prefixed token longer than the configured limit
    TokenTooLong,
    /// A `#\` character name longer than the configured limit (prefix kept)
    CharacterTooLong(String),
    /// A string literal longer than the configured limit
    StringTooLong,
    /// `#\` followed directly by end of stream
    IncompleteCharacter,
    /// A `#\` spelling that names no character
    InvalidCharacter(String),
    /// A `\x` string escape not followed by two hex digits
    InvalidEscape(String),
    /// An integer literal outside the representable range
    IntegerOverflow(String),
    /// `#symbol` followed by something other than a string
    SymbolNameNotString,
    /// An unknown `#` form
    InvalidSyntax(String),
    /// Lists or `#symbol` operands nested past the configured limit
    NestingTooDeep(usize),
    /// The underlying stream failed
    Io(io::Error),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::UnexpectedEof => write!(f, "EOF while reading"),
            ReadError::UnmatchedDelimiter(c) => {
                write!(f, "Unmatched delimiter while reading: {}", c)
            }
            ReadError::TokenTooLong => write!(f, "Token too long"),
            ReadError::CharacterTooLong(prefix) => {
                write!(f, "Character literal token too long: #\\{}...", prefix)
            }
            ReadError::StringTooLong => write!(f, "String literal too long"),
            ReadError::IncompleteCharacter => write!(f, "Incomplete character literal"),
            ReadError::InvalidCharacter(name) => {
                write!(f, "Invalid character literal: #\\{}", name)
            }
            ReadError::InvalidEscape(esc) => write!(f, "Invalid escape sequence: \\{}", esc),
            ReadError::IntegerOverflow(token) => write!(f, "Integer overflow reading: {}", token),
            ReadError::SymbolNameNotString => {
                write!(f, "Expression following #symbol must be a string")
            }
            ReadError::InvalidSyntax(token) => write!(f, "Invalid read syntax: #{}", token),
            ReadError::NestingTooDeep(limit) => {
                write!(f, "Nesting too deep: more than {} levels", limit)
            }
            ReadError::Io(e) => write!(f, "I/O error while reading: {}", e),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ReadError {
    fn from(e: io::Error) -> Self {
        ReadError::Io(e)
    }
}
