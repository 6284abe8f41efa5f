//! # tn-rs
//!
//! A Rust library for rule-based text normalization with weighted
//! finite-state transducers. It rewrites written text into its spoken form
//! for text-to-speech front ends: `"$12.05"` becomes
//! `"twelve dollars and five cents"`, `"IV"` becomes `"four"`.
//!
//! ## Features
//!
//! - **Two-stage pipeline**: a classify grammar tags each span with its
//!   semiotic class, a verbalizer grammar per class reads the fields aloud
//! - **Deterministic and n-best modes**: one rendering, or a ranked set of
//!   candidates for downstream disambiguation
//! - **Grammar cache**: compiled grammars persist to disk and are shared
//!   in-process
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tn-rs = { version = "2026.2", features = ["en"] }
//! ```
//!
//! ```no_run
//! use tn_rs::{engines::en::EnglishNormalizer, NormalizationEngine};
//!
//! let mut normalizer = EnglishNormalizer::new();
//! normalizer.load_grammars()?;
//!
//! let best = normalizer.normalize("It costs $12.05.", None)?;
//! assert_eq!(best[0].text, "It costs twelve dollars and five cents.");
//! # Ok::<(), tn_rs::NormalizeError>(())
//! ```

pub mod cache;
pub mod engines;
mod error;
pub mod fst;
pub mod grammar;
pub mod tagged;

pub use error::NormalizeError;

use serde::{Deserialize, Serialize};

/// How the grammars treat letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePolicy {
    /// Case is significant (roman numerals, upper-case serials).
    #[default]
    Cased,
    /// Input is lower-cased before classification.
    LowerCased,
}

impl CasePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasePolicy::Cased => "cased",
            CasePolicy::LowerCased => "lower_cased",
        }
    }
}

/// One spoken-form rendering of a whole input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalization {
    /// The spoken-form text.
    pub text: String,
    /// Total path weight; lower is preferred.
    pub weight: f32,
    /// Source spans that could not be verbalized and were emitted as written.
    pub verbatim: Vec<String>,
}

impl Normalization {
    /// `true` when every token was verbalized.
    pub fn is_complete(&self) -> bool {
        self.verbatim.is_empty()
    }
}

/// Common interface for text normalization engines.
///
/// Each engine has its own parameter types for grammar construction and for
/// individual normalization requests.
pub trait NormalizationEngine {
    /// Parameters for a single request (n-best size, etc.)
    type NormalizeParams;
    /// Parameters for grammar construction (case policy, determinism, tables)
    type GrammarParams: Default;

    /// Build or load the grammars with default parameters.
    fn load_grammars(&mut self) -> Result<(), NormalizeError> {
        self.load_grammars_with_params(Self::GrammarParams::default())
    }

    /// Build or load the grammars with custom parameters.
    fn load_grammars_with_params(&mut self, params: Self::GrammarParams)
        -> Result<(), NormalizeError>;

    /// Release the loaded grammars.
    fn unload_grammars(&mut self);

    /// Normalize `text`, returning candidates ranked by ascending weight.
    fn normalize(
        &self,
        text: &str,
        params: Option<Self::NormalizeParams>,
    ) -> Result<Vec<Normalization>, NormalizeError>;

    /// Normalize `text` and return only the best rendering.
    ///
    /// Default implementation calls `normalize()` and takes the first candidate.
    fn normalize_best(&self, text: &str) -> Result<String, NormalizeError> {
        self.normalize(text, None)?
            .into_iter()
            .next()
            .map(|n| n.text)
            .ok_or_else(|| NormalizeError::NoMatch(text.to_string()))
    }
}
