//! Sky REPL: the read-print loop behind the `sky` binary
//!
//! Reads every expression from a stream and prints it back, one per line.
//! There is no evaluation step; the loop exists to exercise the reader and
//! printer end to end.

use std::io::{self, BufRead, Write};

use sky_core::{SymbolTable, println};
use sky_reader::{ReadError, Reader, ReaderConfig};
use tracing::{debug, warn};

/// What to do with the rest of a stream after a read error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    /// Report the error and keep reading (interactive input)
    Continue,
    /// Report the error and stop reading this stream (files)
    SkipRest,
}

/// Counts from one pass over a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EchoSummary {
    pub values: usize,
    pub errors: usize,
}

impl EchoSummary {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// Settings shared by every stream a session reads
pub struct Session {
    config: ReaderConfig,
    symbols: Option<SymbolTable>,
}

impl Session {
    pub fn new(config: ReaderConfig) -> Self {
        Session {
            config,
            symbols: None,
        }
    }

    /// Intern symbols across every stream read by this session
    pub fn with_interning(mut self) -> Self {
        self.symbols = Some(SymbolTable::new());
        self
    }

    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.as_ref()
    }

    /// Read each expression from `input` and print it to `out`.
    ///
    /// Read errors go to `err` as `Error: <message>`. An I/O failure of the
    /// input always ends the stream. Failures writing `out` or `err` are
    /// returned.
    pub fn echo<R, W, E>(
        &mut self,
        input: R,
        out: &mut W,
        err: &mut E,
        on_error: OnError,
    ) -> io::Result<EchoSummary>
    where
        R: BufRead,
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        let reader = Reader::with_config(input, self.config);
        let mut reader = match self.symbols.as_mut() {
            Some(table) => reader.with_symbols(table),
            None => reader,
        };

        let mut summary = EchoSummary::default();
        loop {
            match reader.read() {
                Ok(Some(value)) => {
                    println(out, &value)?;
                    out.flush()?;
                    summary.values += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    summary.errors += 1;
                    writeln!(err, "Error: {}", e)?;
                    if matches!(e, ReadError::Io(_)) {
                        warn!(error = %e, "input failed, abandoning stream");
                        break;
                    }
                    if on_error == OnError::SkipRest {
                        debug!("skipping rest of stream");
                        break;
                    }
                }
            }
        }

        debug!(values = summary.values, errors = summary.errors, "stream done");
        Ok(summary)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ReaderConfig::default())
    }
}
