//! English text normalization grammars.
//!
//! Text goes through two transducer stages:
//!
//! 1. **Classify**: a weighted union of per-class taggers, closed over the
//!    whole sentence, rewrites the input into tagged blocks.
//! 2. **Verbalize**: each parsed block is read aloud by its class's
//!    verbalizer, and the pieces are joined back into a sentence.
//!
//! ```text
//! "$12.05"
//!   -> tokens { money { integer_part: "twelve" currency: "dollars" cents: "five" minor_currency: "cents" } }
//!   -> "twelve dollars and five cents"
//! ```
//!
//! # Semiotic Classes
//!
//! | Class | Example | Spoken form |
//! |---|---|---|
//! | `cardinal` | `123,454` | one two three four five four |
//! | `decimal` | `1 billion` | one billion |
//! | `fraction` | `23 4/5` | twenty three and four slash five |
//! | `measure` | `5 km` | five kilometers |
//! | `money` | `$12.05` | twelve dollars and five cents |
//! | `electronic` | `cdf1@abc.edu` | c d f one at a b c dot e d u |
//! | `whitelist` | `Dr.` | doctor |
//! | `word` / `punct` | `hello,` | hello, |
//!
//! # Data Tables
//!
//! Number names, units, currencies and the whitelist come from the `.tsv`
//! files under `data/`, embedded at compile time. Point
//! [`EnglishGrammarParams::tables_dir`] at a directory with the same layout to
//! replace individual tables.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tn_rs::engines::en::EnglishNormalizer;
//! use tn_rs::{CasePolicy, NormalizationEngine};
//!
//! let mut normalizer = EnglishNormalizer::new();
//! normalizer.load_grammars()?;
//! assert_eq!(normalizer.normalize_best("IV")?, "four");
//!
//! // Ranked alternatives
//! for candidate in normalizer.normalize_text("$0.05", CasePolicy::Cased, false, 3)? {
//!     println!("{:.2} {}", candidate.weight, candidate.text);
//! }
//! # Ok::<(), tn_rs::NormalizeError>(())
//! ```

pub mod classify;
pub mod engine;
pub mod tables;
pub mod taggers;
pub mod verbalize;
pub mod verbalizers;

pub use classify::{Classification, ClassifyGrammar};
pub use engine::{
    EnglishGrammarParams, EnglishGrammarParamsBuilder, EnglishNormalizeParams, EnglishNormalizer,
};
pub use tables::Tables;
pub use verbalize::VerbalizerSet;
