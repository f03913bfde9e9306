//! Configuration types
//!
//! Board-agnostic configuration structures and the TOML reader that fills
//! them.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError, ParseErrorKind};
pub use types::*;
