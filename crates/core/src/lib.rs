//! Sky Core: the data layer of the Sky s-expression language
//!
//! This crate provides the language-agnostic pieces every other Sky crate
//! builds on: the value representation, equality and hashing over values,
//! the printer, and the open-addressing symbol table.
//!
//! Key design principles:
//! - Value: one 64-bit word; integers and characters are packed inline,
//!   strings, symbols and pairs live in reference-counted heap cells
//! - Nil is the all-zero word and is never allocated
//! - Equality and hashing agree: `equal(a, b)` implies `hash(a) == hash(b)`
//!
//! # Modules
//!
//! - `value`: Tagged `Value` word, constructors and accessors
//! - `equal`: Structural equality
//! - `hash`: Polynomial hashing matching `equal`
//! - `printer`: Textual form of values (re-readable by `sky-reader`)
//! - `symtbl`: Linear-probing table keyed by values, symbol interning
//! - `memory_stats`: Per-thread heap cell accounting

pub mod equal;
pub mod hash;
pub mod memory_stats;
pub mod printer;
pub mod symtbl;
pub mod value;

// Re-export key types and functions
pub use equal::equal;
pub use hash::hash;
pub use memory_stats::{HeapStats, heap_stats};
pub use printer::{print, println};
pub use symtbl::SymbolTable;
pub use value::{ListIter, MOST_NEGATIVE_INT, MOST_POSITIVE_INT, Tag, Value};
