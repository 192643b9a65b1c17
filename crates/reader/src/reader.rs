//! Recursive-descent reader for Sky s-expressions
//!
//! Grammar:
//! ```text
//! sexp    := atom | list | string | sharp
//! list    := '(' sexp* ')'
//! sharp   := '#' ( '\' char-name | 'symbol' sexp )
//! string  := '"' ( escape | byte )* '"'
//! atom    := token     -- "nil", an integer, or a symbol name
//! ```
//!
//! The reader pulls one byte at a time from a `BufRead` and can push back a
//! single byte. Whitespace and `;` comments separate tokens; a bare token
//! ends at whitespace, `(`, `)`, `"`, `;` or end of stream.
//!
//! Every internal read returns a [`Sexp`] outcome so a closing `)` or the end
//! of the stream seen deep inside a list is told apart from a clean end of
//! input at top level.

use std::io::BufRead;

use sky_core::{SymbolTable, Value};
use tracing::{debug, trace};

use crate::config::ReaderConfig;
use crate::error::ReadError;

/// Outcome of reading one expression
enum Sexp {
    /// A complete expression
    Value(Value),
    /// The `)` closing the enclosing list
    Close,
    /// End of stream before any expression started
    Eof,
}

/// A token read up to the next delimiter
enum Token {
    Complete(Vec<u8>),
    /// The limit was hit; holds the bytes read so far
    TooLong(Vec<u8>),
}

/// Reads values from a byte stream, one top-level expression at a time.
///
/// With [`Reader::with_symbols`], symbols are interned in a
/// [`SymbolTable`] so equal names produce the identical symbol.
pub struct Reader<'s, R> {
    input: R,
    pushback: Option<u8>,
    config: ReaderConfig,
    symbols: Option<&'s mut SymbolTable>,
    /// Lists and `#symbol` operands currently open
    depth: usize,
}

impl<R: BufRead> Reader<'static, R> {
    /// Create a reader with the default limits
    pub fn new(input: R) -> Self {
        Self::with_config(input, ReaderConfig::default())
    }

    /// Create a reader with custom limits.
    ///
    /// Configs built with the `with_*` methods are not validated on the way
    /// in; debug builds panic here if [`ReaderConfig::validate`] rejects
    /// `config`.
    pub fn with_config(input: R, config: ReaderConfig) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "invalid reader config: {:?}",
            config.validate()
        );
        Reader {
            input,
            pushback: None,
            config,
            symbols: None,
            depth: 0,
        }
    }

    /// Intern every symbol this reader produces in `symbols`
    pub fn with_symbols<'t>(self, symbols: &'t mut SymbolTable) -> Reader<'t, R> {
        Reader {
            input: self.input,
            pushback: self.pushback,
            config: self.config,
            symbols: Some(symbols),
            depth: self.depth,
        }
    }
}

impl<R: BufRead> Reader<'_, R> {
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read one top-level expression.
    ///
    /// Returns `Ok(None)` when the stream ends before an expression starts.
    /// `()` and `nil` both read as `Ok(Some(Value::NIL))`.
    pub fn read(&mut self) -> Result<Option<Value>, ReadError> {
        let result = match self.read_sexp(false) {
            Ok(Sexp::Value(value)) => Ok(Some(value)),
            Ok(Sexp::Eof) => Ok(None),
            Ok(Sexp::Close) => unreachable!("closing delimiter accepted outside a list"),
            Err(e) => Err(e),
        };
        match &result {
            Ok(Some(value)) => trace!(%value, "read expression"),
            Ok(None) => trace!("end of stream"),
            Err(e) => debug!(error = %e, "read failed"),
        }
        result
    }

    // =========================================================================
    // Byte Stream
    // =========================================================================

    fn getc(&mut self) -> Result<Option<u8>, ReadError> {
        if let Some(c) = self.pushback.take() {
            return Ok(Some(c));
        }
        let c = match self.input.fill_buf()?.first() {
            Some(&c) => c,
            None => return Ok(None),
        };
        self.input.consume(1);
        Ok(Some(c))
    }

    fn unread(&mut self, c: u8) {
        debug_assert!(self.pushback.is_none(), "only one byte of push-back");
        self.pushback = Some(c);
    }

    /// Next byte that is not whitespace or part of a comment
    fn next_significant(&mut self) -> Result<Option<u8>, ReadError> {
        loop {
            match self.getc()? {
                Some(b';') => loop {
                    match self.getc()? {
                        Some(b'\n') => break,
                        Some(_) => {}
                        None => return Ok(None),
                    }
                },
                Some(c) if is_space(c) => {}
                other => return Ok(other),
            }
        }
    }

    /// Read bytes up to the next delimiter, which is left unread.
    ///
    /// When `escaped`, the first byte is taken even if it is a delimiter.
    fn read_token(&mut self, limit: usize, escaped: bool) -> Result<Token, ReadError> {
        let mut buf = Vec::new();

        if escaped {
            match self.getc()? {
                Some(c) => buf.push(c),
                None => return Ok(Token::Complete(buf)),
            }
        }

        while let Some(c) = self.getc()? {
            if is_delimiter(c) {
                self.unread(c);
                break;
            }
            if buf.len() >= limit {
                self.unread(c);
                return Ok(Token::TooLong(buf));
            }
            buf.push(c);
        }

        Ok(Token::Complete(buf))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn read_sexp(&mut self, in_list: bool) -> Result<Sexp, ReadError> {
        let Some(c) = self.next_significant()? else {
            return Ok(Sexp::Eof);
        };

        let value = match c {
            b')' if in_list => return Ok(Sexp::Close),
            b')' => return Err(ReadError::UnmatchedDelimiter(')')),
            b'(' => self.read_list()?,
            b'"' => self.read_string()?,
            b'#' => self.read_sharp()?,
            _ => {
                self.unread(c);
                self.read_atom()?
            }
        };
        Ok(Sexp::Value(value))
    }

    /// Run `read` one nesting level deeper, failing past `max_depth`
    fn nested<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, ReadError>,
    ) -> Result<T, ReadError> {
        if self.depth >= self.config.max_depth {
            return Err(ReadError::NestingTooDeep(self.config.max_depth));
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn read_list(&mut self) -> Result<Value, ReadError> {
        self.nested(Self::read_list_items)
    }

    fn read_list_items(&mut self) -> Result<Value, ReadError> {
        let mut items = Vec::new();
        loop {
            match self.read_sexp(true)? {
                Sexp::Value(value) => items.push(value),
                Sexp::Close => break,
                Sexp::Eof => return Err(ReadError::UnexpectedEof),
            }
        }
        Ok(Value::list(items))
    }

    fn read_atom(&mut self) -> Result<Value, ReadError> {
        let token = match self.read_token(self.config.max_token_len, false)? {
            Token::Complete(token) => token,
            Token::TooLong(_) => return Err(ReadError::TokenTooLong),
        };

        if token == b"nil" {
            return Ok(Value::NIL);
        }
        if let Some(n) = parse_integer(&token)? {
            return Ok(Value::integer(n));
        }
        Ok(self.make_symbol(token))
    }

    fn read_string(&mut self) -> Result<Value, ReadError> {
        let mut buf = Vec::new();

        loop {
            let c = self.getc()?.ok_or(ReadError::UnexpectedEof)?;
            if c == b'"' {
                break;
            }
            if buf.len() >= self.config.max_string_len {
                return Err(ReadError::StringTooLong);
            }

            let byte = if c == b'\\' {
                match self.getc()?.ok_or(ReadError::UnexpectedEof)? {
                    // Line continuation
                    b'\n' => continue,
                    b'b' => 0x08,
                    b't' => b'\t',
                    b'n' => b'\n',
                    b'v' => 0x0B,
                    b'f' => 0x0C,
                    b'r' => b'\r',
                    b'x' => self.read_hex_escape()?,
                    other => other,
                }
            } else {
                c
            };
            buf.push(byte);
        }

        Ok(Value::string_from_vec(buf))
    }

    fn read_hex_escape(&mut self) -> Result<u8, ReadError> {
        let hi = self.getc()?.ok_or(ReadError::UnexpectedEof)?;
        let lo = self.getc()?.ok_or(ReadError::UnexpectedEof)?;
        match (hex_digit(hi), hex_digit(lo)) {
            (Some(h), Some(l)) => Ok(h * 16 + l),
            _ => Err(ReadError::InvalidEscape(format!("x{}", lossy(&[hi, lo])))),
        }
    }

    fn read_sharp(&mut self) -> Result<Value, ReadError> {
        match self.getc()? {
            Some(b'\\') => return self.read_character(),
            Some(c) => self.unread(c),
            None => {}
        }

        let token = match self.read_token(self.config.max_token_len, false)? {
            Token::Complete(token) => token,
            Token::TooLong(_) => return Err(ReadError::TokenTooLong),
        };
        if token != b"symbol" {
            return Err(ReadError::InvalidSyntax(lossy(&token)));
        }

        match self.nested(|reader| reader.read_sexp(false))? {
            Sexp::Value(name) if name.is_string() => Ok(self.symbol_named(name)),
            Sexp::Value(_) => Err(ReadError::SymbolNameNotString),
            Sexp::Eof => Err(ReadError::UnexpectedEof),
            Sexp::Close => unreachable!("closing delimiter accepted outside a list"),
        }
    }

    fn read_character(&mut self) -> Result<Value, ReadError> {
        match self.read_token(self.config.max_character_len, true)? {
            Token::Complete(name) => parse_character_name(&name).map(Value::character),
            Token::TooLong(prefix) => Err(ReadError::CharacterTooLong(lossy(&prefix))),
        }
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    fn make_symbol(&mut self, name: Vec<u8>) -> Value {
        match self.symbols.as_deref_mut() {
            Some(table) => table.intern(&name),
            None => Value::symbol(Value::string_from_vec(name)),
        }
    }

    fn symbol_named(&mut self, name: Value) -> Value {
        match self.symbols.as_deref_mut() {
            Some(table) => table.intern(name.string_bytes()),
            None => Value::symbol(name),
        }
    }
}

impl<R: BufRead> Iterator for Reader<'_, R> {
    type Item = Result<Value, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

/// Read the first expression in `source`
pub fn read_str(source: &str) -> Result<Option<Value>, ReadError> {
    Reader::new(source.as_bytes()).read()
}

/// Read every expression in `source`, stopping at the first error
pub fn read_all(source: &str) -> Result<Vec<Value>, ReadError> {
    Reader::new(source.as_bytes()).collect()
}

// =============================================================================
// Lexical Helpers
// =============================================================================

/// C `isspace`: space, tab, newline, vertical tab, form feed, return
fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

fn is_delimiter(c: u8) -> bool {
    is_space(c) || matches!(c, b'(' | b')' | b'"' | b';')
}

fn hex_digit(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parse `[+-]digits` in the integer range.
///
/// Returns `Ok(None)` for anything that is not integer syntax, and
/// `IntegerOverflow` for integer syntax outside the range.
fn parse_integer(token: &[u8]) -> Result<Option<i64>, ReadError> {
    let (negative, digits) = match token.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, token),
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Ok(None);
    }

    let overflow = || ReadError::IntegerOverflow(lossy(token));

    let mut magnitude: i64 = 0;
    for &d in digits {
        magnitude = magnitude
            .checked_mul(10)
            .and_then(|m| m.checked_add(i64::from(d - b'0')))
            .ok_or_else(overflow)?;
    }

    let value = if negative { -magnitude } else { magnitude };
    if !Value::integer_in_range(value) {
        return Err(overflow());
    }
    Ok(Some(value))
}

fn parse_character_name(name: &[u8]) -> Result<u32, ReadError> {
    match name {
        [] => Err(ReadError::IncompleteCharacter),
        [c] if c.is_ascii_graphic() => Ok(u32::from(*c)),
        b"space" => Ok(0x20),
        b"tab" => Ok(0x09),
        b"vtab" => Ok(0x0B),
        b"newline" => Ok(0x0A),
        b"return" => Ok(0x0D),
        b"formfeed" => Ok(0x0C),
        b"backspace" => Ok(0x08),
        [b'x', hi, lo] => match (hex_digit(*hi), hex_digit(*lo)) {
            (Some(h), Some(l)) => Ok(u32::from(h * 16 + l)),
            _ => Err(ReadError::InvalidCharacter(lossy(name))),
        },
        _ => Err(ReadError::InvalidCharacter(lossy(name))),
    }
}
