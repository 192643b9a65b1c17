//! Reader configuration
//!
//! Token buffers are bounded: a token longer than its limit is an error,
//! never silently truncated. The defaults are the classic Sky buffer sizes
//! (one byte of each buffer was reserved for a terminator).
//!
//! # Example
//!
//! ```rust,ignore
//! use sky_reader::ReaderConfig;
//!
//! let config = ReaderConfig::default().with_max_string_len(64 * 1024);
//!
//! // Or from TOML; missing fields keep their defaults
//! let config = ReaderConfig::from_toml("max_token_len = 255")?;
//! ```

use serde::Deserialize;
use std::path::Path;

/// Default limit for bare tokens and `#` forms
pub const DEFAULT_MAX_TOKEN_LEN: usize = 127;

/// Default limit for `#\` character names
pub const DEFAULT_MAX_CHARACTER_LEN: usize = 15;

/// Default limit for decoded string literal bytes
pub const DEFAULT_MAX_STRING_LEN: usize = 1023;

/// Default limit for nested lists and `#symbol` operands
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Limits applied while reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Longest bare token (atom) or `#`-prefixed token, in bytes
    pub max_token_len: usize,
    /// Longest character name after `#\`, in bytes
    pub max_character_len: usize,
    /// Longest string literal after escape processing, in bytes
    pub max_string_len: usize,
    /// Deepest nesting of lists and `#symbol` operands
    pub max_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            max_character_len: DEFAULT_MAX_CHARACTER_LEN,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_token_len(mut self, len: usize) -> Self {
        self.max_token_len = len;
        self
    }

    pub fn with_max_character_len(mut self, len: usize) -> Self {
        self.max_character_len = len;
        self
    }

    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Reject limits that would make ordinary input unreadable
    pub fn validate(&self) -> Result<(), String> {
        if self.max_token_len == 0 {
            return Err("max_token_len must be at least 1".to_string());
        }
        if self.max_string_len == 0 {
            return Err("max_string_len must be at least 1".to_string());
        }
        if self.max_depth == 0 {
            return Err("max_depth must be at least 1".to_string());
        }
        // "backspace" and "formfeed" must fit
        if self.max_character_len < 9 {
            return Err(format!(
                "max_character_len must be at least 9 to hold every named character, got {}",
                self.max_character_len
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: ReaderConfig = toml::from_str(toml_str)
            .map_err(|e| format!("Failed to parse reader config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }
}
