//! Printer: the textual form of values
//!
//! Output is re-readable by `sky-reader` and always pure ASCII.
//!
//! # Format Examples
//!
//! - Integer: `-42`
//! - Character: `#\a`, `#\newline`, `#\x00`
//! - String: `"a\tb"` (escapes for control bytes, `\xHH` for the rest)
//! - Symbol: `foo`, or `#symbol "needs quoting"` when the bare name would
//!   not read back as the same symbol
//! - List: `(1 2 3)`, Nil: `()`

use std::fmt::{self, Write as _};
use std::io;

use crate::value::{Tag, Value};

/// Write the textual form of `value` to `stream`
pub fn print<W: io::Write + ?Sized>(stream: &mut W, value: &Value) -> io::Result<()> {
    write!(stream, "{}", value)
}

/// Write the textual form of `value` followed by a newline
pub fn println<W: io::Write + ?Sized>(stream: &mut W, value: &Value) -> io::Result<()> {
    writeln!(stream, "{}", value)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Tag::Int => write!(f, "{}", self.as_integer()),
            Tag::Char => format_character(self.as_character(), f),
            Tag::String => format_string(self.string_bytes(), f),
            Tag::Symbol => format_symbol(self.symbol_name().string_bytes(), f),
            Tag::List => format_list(self, f),
        }
    }
}

/// Graphic ASCII: printable and not a space
fn is_graphic(c: u32) -> bool {
    (0x21..=0x7E).contains(&c)
}

fn format_character(c: u32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("#\\")?;

    if is_graphic(c) {
        // Graphic characters are ASCII, so the cast is lossless
        return f.write_char(c as u8 as char);
    }

    match c {
        0x08 => f.write_str("backspace"),
        0x09 => f.write_str("tab"),
        0x0A => f.write_str("newline"),
        0x0B => f.write_str("vtab"),
        0x0C => f.write_str("formfeed"),
        0x0D => f.write_str("return"),
        0x20 => f.write_str("space"),
        _ => write!(f, "x{:02X}", c),
    }
}

fn format_string(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_char('"')?;
    write_escaped(bytes, f)?;
    f.write_char('"')
}

fn format_symbol(name: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if needs_quoting(name) {
        f.write_str("#symbol ")?;
        format_string(name, f)
    } else {
        // Only graphic ASCII reaches here
        name.iter().try_for_each(|&b| f.write_char(b as char))
    }
}

fn format_list(list: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // Open lists are kept on an explicit stack so depth never recurses
    let mut open = vec![list.iter()];
    let mut at_start = true;
    f.write_char('(')?;

    while let Some(iter) = open.last_mut() {
        match iter.next() {
            Some(elt) => {
                if !at_start {
                    f.write_char(' ')?;
                }
                if elt.is_pair() {
                    f.write_char('(')?;
                    open.push(elt.iter());
                    at_start = true;
                } else {
                    write!(f, "{}", elt)?;
                    at_start = false;
                }
            }
            None => {
                f.write_char(')')?;
                open.pop();
                at_start = false;
            }
        }
    }
    Ok(())
}

fn write_escaped(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for &b in bytes {
        match b {
            0x08 => f.write_str("\\b")?,
            b'\t' => f.write_str("\\t")?,
            b'\n' => f.write_str("\\n")?,
            0x0B => f.write_str("\\v")?,
            0x0C => f.write_str("\\f")?,
            b'\r' => f.write_str("\\r")?,
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            0x20..=0x7E => f.write_char(b as char)?,
            _ => write!(f, "\\x{:02X}", b)?,
        }
    }
    Ok(())
}

/// Decide whether a symbol name must be printed as `#symbol "..."`.
///
/// A bare name is only safe when it is non-empty, made of graphic ASCII
/// without delimiters or backslashes, does not start with `#`, and would not
/// read back as an integer or as Nil. Symbol names follow the string
/// escaping rules, which double a backslash, but bare tokens are read
/// without escape processing: an escaped bare `a\\b` would read back as a
/// different name, so backslashes force the quoted form.
fn needs_quoting(name: &[u8]) -> bool {
    if name.is_empty() || name == b"nil" {
        return true;
    }

    let mut int_like = true;
    for (i, &c) in name.iter().enumerate() {
        if !(b'!'..=b'~').contains(&c)
            || matches!(c, b'(' | b')' | b'"' | b';' | b'\\')
            || (i == 0 && c == b'#')
        {
            return true;
        }
        if int_like && !((i == 0 && (c == b'-' || c == b'+')) || c.is_ascii_digit()) {
            int_like = false;
        }
    }
    int_like
}
