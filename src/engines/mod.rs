//! Language-specific normalization grammars.
//!
//! # Available Languages
//!
//! Enable languages via Cargo features:
//! - `en` - English (enabled by default)

#[cfg(feature = "en")]
pub mod en;
