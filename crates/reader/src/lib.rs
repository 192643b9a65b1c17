//! Sky Reader: text to values
//!
//! Parses the textual Sky syntax into [`sky_core::Value`]s. Output of the
//! `sky_core` printer reads back into an equal value.
//!
//! ```rust,ignore
//! use sky_reader::{Reader, read_str};
//!
//! let v = read_str("(1 \"two\" #\\3)")?.unwrap();
//!
//! let mut reader = Reader::new(std::io::stdin().lock());
//! while let Some(value) = reader.read()? {
//!     println!("{}", value);
//! }
//! ```
//!
//! # Modules
//!
//! - `reader`: The recursive-descent reader
//! - `config`: Token length limits, loadable from TOML
//! - `error`: `ReadError`

pub mod config;
pub mod error;
pub mod reader;

pub use config::ReaderConfig;
pub use error::ReadError;
pub use reader::{Reader, read_all, read_str};
