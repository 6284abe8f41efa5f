use std::path::PathBuf;
use std::sync::Arc;

use derive_builder::Builder;

use crate::cache::{GrammarArtifact, GrammarCache, GrammarKey, Stage};
use crate::tagged;
use crate::{CasePolicy, NormalizationEngine, Normalization, NormalizeError};

use super::classify::{Classification, ClassifyGrammar};
use super::tables::Tables;
use super::verbalize::{rank, VerbalizerSet};

/// Most classify readings fetched for one n-best request.
const MAX_READINGS: usize = 256;

/// Parameters for building the English grammars.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct EnglishGrammarParams {
    /// Whether case is significant. `LowerCased` lowercases input first.
    pub case_policy: CasePolicy,
    /// Keep only the single best rendering.
    pub deterministic: bool,
    /// Directory whose `.tsv` files replace the embedded tables.
    ///
    /// The grammar cache key does not include this directory; use a separate
    /// cache directory (or `overwrite`) when switching table sets.
    #[builder(setter(into, strip_option))]
    pub tables_dir: Option<PathBuf>,
}

impl Default for EnglishGrammarParams {
    fn default() -> Self {
        Self {
            case_policy: CasePolicy::Cased,
            deterministic: true,
            tables_dir: None,
        }
    }
}

/// Parameters for a single normalization request.
#[derive(Debug, Clone)]
pub struct EnglishNormalizeParams {
    /// Number of candidates to return in non-deterministic mode.
    pub n_best: usize,
}

impl Default for EnglishNormalizeParams {
    fn default() -> Self {
        Self { n_best: 1 }
    }
}

/// English text normalizer.
///
/// Grammars are built on first use and shared through a [`GrammarCache`];
/// with a cache directory they survive across processes.
///
/// ```rust,no_run
/// use tn_rs::engines::en::{EnglishGrammarParamsBuilder, EnglishNormalizer, EnglishNormalizeParams};
/// use tn_rs::NormalizationEngine;
///
/// let mut normalizer = EnglishNormalizer::with_cache("/tmp/tn-cache", false);
/// let params = EnglishGrammarParamsBuilder::default()
///     .deterministic(false)
///     .build()
///     .unwrap();
/// normalizer.load_grammars_with_params(params)?;
///
/// for candidate in normalizer.normalize("$0.05", Some(EnglishNormalizeParams { n_best: 3 }))? {
///     println!("{:.2} {}", candidate.weight, candidate.text);
/// }
/// # Ok::<(), tn_rs::NormalizeError>(())
/// ```
pub struct EnglishNormalizer {
    cache: GrammarCache,
    tables_dir: Option<PathBuf>,
    loaded: Option<EnglishGrammarParams>,
}

impl Default for EnglishNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EnglishNormalizer {
    /// Create a normalizer that keeps compiled grammars in memory only.
    pub fn new() -> Self {
        Self {
            cache: GrammarCache::in_memory(),
            tables_dir: None,
            loaded: None,
        }
    }

    /// Create a normalizer that persists compiled grammars under `dir`.
    ///
    /// With `overwrite`, artifacts already on disk are rebuilt once.
    pub fn with_cache(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            cache: GrammarCache::on_disk(dir, overwrite),
            tables_dir: None,
            loaded: None,
        }
    }

    /// Normalize `text` with explicit settings, independent of
    /// [`NormalizationEngine::load_grammars`].
    ///
    /// Returns candidates ranked by ascending weight; exactly one when
    /// `deterministic`, otherwise the `n_best` lowest-weight candidates.
    pub fn normalize_text(
        &self,
        text: &str,
        case_policy: CasePolicy,
        deterministic: bool,
        n_best: usize,
    ) -> Result<Vec<Normalization>, NormalizeError> {
        if text.trim().is_empty() {
            return Ok(vec![Normalization {
                text: String::new(),
                weight: 0.0,
                verbatim: Vec::new(),
            }]);
        }

        let (classify, verbalizers) = self.grammars(case_policy, deterministic)?;
        let n = if deterministic { 1 } else { n_best.max(1) };

        let input = apply_case(text, case_policy);
        let source: Vec<char> = text.chars().collect();
        let floor = if deterministic {
            0.0
        } else {
            verbalizers.weight_floor(&input)
        };

        // Verbalizer weights can reorder readings, so widen the classify
        // n-best until no unseen reading can still reach the top `n`.
        let mut k = n;
        loop {
            let readings = classify.classify(&input, k)?;
            let mut candidates = Vec::new();
            for reading in &readings {
                candidates.extend(verbalize_reading(&verbalizers, reading, &source, n)?);
            }
            let ranked = rank(candidates, n);

            let exhausted = deterministic || readings.len() < k || k >= MAX_READINGS;
            let settled = match (readings.last(), ranked.get(n - 1)) {
                (Some(last), Some(nth)) => last.weight + floor >= nth.weight,
                _ => false,
            };
            if exhausted || settled {
                return Ok(ranked);
            }
            log::debug!("{} readings leave the top {} open, widening", k, n);
            k = (k * 2).min(MAX_READINGS);
        }
    }

    /// Tagged readings of `text` before verbalization, ascending by weight.
    ///
    /// Fails with [`NormalizeError::NoMatch`] on empty input.
    pub fn classify_text(
        &self,
        text: &str,
        case_policy: CasePolicy,
        deterministic: bool,
        n_best: usize,
    ) -> Result<Vec<Classification>, NormalizeError> {
        let (classify, _) = self.grammars(case_policy, deterministic)?;
        let n = if deterministic { 1 } else { n_best.max(1) };
        classify.classify(&apply_case(text, case_policy), n)
    }

    fn grammars(
        &self,
        case_policy: CasePolicy,
        deterministic: bool,
    ) -> Result<(ClassifyGrammar, VerbalizerSet), NormalizeError> {
        let tables = || -> Result<Tables, NormalizeError> {
            let tables = Tables::load(self.tables_dir.as_deref())?;
            Ok(match case_policy {
                CasePolicy::Cased => tables,
                CasePolicy::LowerCased => tables.lower_cased(),
            })
        };
        let key = |stage| GrammarKey {
            stage,
            case_policy,
            deterministic,
        };

        let classify_key = key(Stage::Classify);
        let classify = match &*self.cache.load_or_build(classify_key, || {
            let grammar = ClassifyGrammar::build(&tables()?, case_policy, deterministic)?;
            Ok(GrammarArtifact::Classify(Arc::clone(grammar.compiled())))
        })? {
            GrammarArtifact::Classify(fst) => ClassifyGrammar::from_compiled(Arc::clone(fst)),
            GrammarArtifact::Verbalize { .. } => return Err(mismatched(&classify_key)),
        };

        let verbalize_key = key(Stage::Verbalize);
        let verbalizers = match &*self.cache.load_or_build(verbalize_key, || {
            let set = VerbalizerSet::build(&tables()?, deterministic)?;
            Ok(GrammarArtifact::Verbalize {
                fsts: set.compiled().clone(),
                floor: Arc::clone(set.floor_fst()),
            })
        })? {
            GrammarArtifact::Verbalize { fsts, floor } => {
                VerbalizerSet::from_compiled(fsts.clone(), Arc::clone(floor))
            }
            GrammarArtifact::Classify(_) => return Err(mismatched(&verbalize_key)),
        };

        Ok((classify, verbalizers))
    }
}

/// Every rendering of one classify reading, weighted by the reading too.
fn verbalize_reading(
    verbalizers: &VerbalizerSet,
    reading: &Classification,
    source: &[char],
    n: usize,
) -> Result<Vec<Normalization>, NormalizeError> {
    let tokens = tagged::parse(&reading.tagged)?;
    let sources: Vec<String> = tokens
        .iter()
        .map(|token| {
            source
                .get(reading.source_span(&token.tag_span))
                .map(|span| span.iter().collect())
                .unwrap_or_default()
        })
        .collect();
    log::debug!("{:.2} {}", reading.weight, reading.tagged);

    Ok(verbalizers
        .verbalize_all(&tokens, &sources, n)
        .into_iter()
        .map(|mut candidate| {
            candidate.weight += reading.weight;
            candidate
        })
        .collect())
}

fn mismatched(key: &GrammarKey) -> NormalizeError {
    NormalizeError::GrammarBuild(format!(
        "cache entry {} holds the wrong grammar stage",
        key.file_name()
    ))
}

/// Lowercase char by char under `LowerCased`, keeping the char count so
/// alignments still index the original text.
fn apply_case(text: &str, case_policy: CasePolicy) -> String {
    if case_policy == CasePolicy::Cased {
        return text.to_string();
    }
    text.chars()
        .map(|ch| {
            let mut lower = ch.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(single), None) => single,
                _ => ch,
            }
        })
        .collect()
}

impl NormalizationEngine for EnglishNormalizer {
    type NormalizeParams = EnglishNormalizeParams;
    type GrammarParams = EnglishGrammarParams;

    fn load_grammars_with_params(
        &mut self,
        params: Self::GrammarParams,
    ) -> Result<(), NormalizeError> {
        self.tables_dir = params.tables_dir.clone();
        self.grammars(params.case_policy, params.deterministic)?;
        log::info!(
            "English grammars ready ({}, deterministic={})",
            params.case_policy.as_str(),
            params.deterministic
        );
        self.loaded = Some(params);
        Ok(())
    }

    fn unload_grammars(&mut self) {
        self.loaded = None;
        self.cache.clear();
    }

    fn normalize(
        &self,
        text: &str,
        params: Option<Self::NormalizeParams>,
    ) -> Result<Vec<Normalization>, NormalizeError> {
        let loaded = self
            .loaded
            .as_ref()
            .ok_or(NormalizeError::GrammarsNotLoaded)?;
        let p = params.unwrap_or_default();
        self.normalize_text(text, loaded.case_policy, loaded.deterministic, p.n_best)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;

    /// Grammar builds are slow; share one loaded normalizer per mode.
    fn deterministic() -> &'static EnglishNormalizer {
        static NORMALIZER: OnceLock<EnglishNormalizer> = OnceLock::new();
        NORMALIZER.get_or_init(|| {
            let mut normalizer = EnglishNormalizer::new();
            normalizer.load_grammars().unwrap();
            normalizer
        })
    }

    fn n_best() -> &'static EnglishNormalizer {
        static NORMALIZER: OnceLock<EnglishNormalizer> = OnceLock::new();
        NORMALIZER.get_or_init(|| {
            let mut normalizer = EnglishNormalizer::new();
            let params = EnglishGrammarParamsBuilder::default()
                .deterministic(false)
                .build()
                .unwrap();
            normalizer.load_grammars_with_params(params).unwrap();
            normalizer
        })
    }

    fn say(text: &str) -> String {
        deterministic().normalize_best(text).unwrap()
    }

    #[test]
    fn example_scenarios() {
        assert_eq!(say("1 billion"), "one billion");
        assert_eq!(say("$12.05"), "twelve dollars and five cents");
        assert_eq!(say("cdf1@abc.edu"), "c d f one at a b c dot e d u");
        assert_eq!(say("IV"), "four");
        assert_eq!(say("23 4/5"), "twenty three and four slash five");
        assert_eq!(say("123,454"), "one two three four five four");
        assert_eq!(say("-23"), "minus twenty three");
    }

    #[test]
    fn sentences_keep_punctuation() {
        assert_eq!(
            say("It costs $12.05."),
            "It costs twelve dollars and five cents."
        );
        assert_eq!(say("Dr. Smith ran 5 km"), "doctor Smith ran five kilometers");
        assert_eq!(say("(IV)"), "(four)");
    }

    #[test]
    fn deterministic_mode_returns_one_stable_result() {
        let first = deterministic()
            .normalize("I paid $3 for 2.5 kg", Some(EnglishNormalizeParams { n_best: 5 }))
            .unwrap();
        assert_eq!(first.len(), 1);
        let second = deterministic()
            .normalize("I paid $3 for 2.5 kg", Some(EnglishNormalizeParams { n_best: 5 }))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn n_best_is_ranked_and_distinct() {
        let results = n_best()
            .normalize("$0.05", Some(EnglishNormalizeParams { n_best: 4 }))
            .unwrap();
        assert!(results.len() >= 2);
        assert_eq!(results[0].text, "five cents");
        assert!(results.windows(2).all(|w| w[0].weight <= w[1].weight));
        let mut texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        texts.dedup();
        assert_eq!(texts.len(), results.len());
    }

    #[test]
    fn arbitrary_text_always_normalizes() {
        for text in ["hello world", "naïve café!", "\"quoted\"", "a\\b", "?!", "x-y_z"] {
            let results = deterministic().normalize(text, None).unwrap();
            assert_eq!(results.len(), 1, "{text}");
        }
        assert_eq!(say("hello   world"), "hello world");
    }

    #[test]
    fn empty_input() {
        assert_eq!(say(""), "");
        assert_eq!(say(" \t "), "");
    }

    #[test]
    fn requires_loaded_grammars() {
        let normalizer = EnglishNormalizer::new();
        assert!(matches!(
            normalizer.normalize("hi", None),
            Err(NormalizeError::GrammarsNotLoaded)
        ));
    }

    #[test]
    fn lower_cased_policy() {
        let results = deterministic()
            .normalize_text("Hello IV", CasePolicy::LowerCased, true, 1)
            .unwrap();
        assert_eq!(results[0].text, "hello iv");
    }

    #[test]
    fn grammars_persist_to_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = EnglishNormalizer::with_cache(dir.path(), false);
        let text = normalizer
            .normalize_text("7", CasePolicy::Cased, true, 1)
            .unwrap()
            .remove(0)
            .text;
        assert_eq!(text, "seven");
        assert!(dir
            .path()
            .join("_cased_en_tn_classify_true_deterministic.bin")
            .exists());
        assert!(dir
            .path()
            .join("_cased_en_tn_verbalize_true_deterministic.bin")
            .exists());

        let reloaded = EnglishNormalizer::with_cache(dir.path(), false);
        assert_eq!(
            reloaded.normalize_text("7", CasePolicy::Cased, true, 1).unwrap()[0].text,
            "seven"
        );
    }

    #[test]
    fn classify_text_exposes_tags() {
        let readings = deterministic()
            .classify_text("-23", CasePolicy::Cased, true, 3)
            .unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(
            readings[0].tagged,
            "tokens { cardinal { negative: \"true\" integer: \"twenty three\" } }"
        );
    }

    #[test]
    fn tagger_edge_cases_read_end_to_end() {
        assert_eq!(say("B12-C"), "B one two C");
        assert_eq!(say("2¾"), "two and three slash four");
        assert_eq!(say("£1.5 million"), "one point five million pounds");
        assert_eq!(
            say("https://www.abc.com"),
            "h t t p s colon slash slash w w w dot a b c dot com"
        );
        assert_eq!(say("5km/h"), "five kilometers per hour");
        assert_eq!(say(".5kg"), "point five kilograms");
    }

    #[test]
    fn n_best_lists_are_prefixes_of_longer_lists() {
        let text = "$0.05 vs $1.01";
        let top = |n| {
            n_best()
                .normalize(text, Some(EnglishNormalizeParams { n_best: n }))
                .unwrap()
        };
        let wide = top(12);
        assert!(wide.len() >= 5);
        for k in [1, 2, 3, 5] {
            let narrow = top(k);
            assert_eq!(narrow.len(), k);
            for (short, long) in narrow.iter().zip(&wide) {
                assert!(
                    (short.weight - long.weight).abs() < 1e-4,
                    "n={k}: {short:?} vs {long:?}"
                );
            }
        }

        let two = top(2);
        assert_eq!(two[0].text, "five cents vs one dollar and one cent");
        assert_eq!(two[1].text, "five cents vs one point zero one dollars");
    }

    #[test]
    fn whitelist_alternatives_in_n_best() {
        let results = n_best()
            .normalize("Dr. Smith", Some(EnglishNormalizeParams { n_best: 3 }))
            .unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts[0], "doctor Smith");
        assert!(texts.contains(&"drive Smith"), "{texts:?}");
        assert_eq!(say("Dr. Smith"), "doctor Smith");
    }

    #[test]
    fn long_input_reads_every_sentence() {
        let sentence = "Dr. Smith paid $12.05 for 2.5 kg on 23 4/5.";
        let spoken = "doctor Smith paid twelve dollars and five cents for two point five \
                      kilograms on twenty three and four slash five.";
        let text = vec![sentence; 40].join(" ");
        let expected = vec![spoken; 40].join(" ");
        assert!(text.chars().count() > 1500);
        assert_eq!(say(&text), expected);
    }

    #[test]
    fn normalizer_is_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EnglishNormalizer>();

        let normalizer = deterministic();
        let inputs = ["$12.05", "IV", "-23", "cdf1@abc.edu", "5 km", "1 billion"];
        std::thread::scope(|scope| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|text| scope.spawn(move || normalizer.normalize_best(text).unwrap()))
                .collect();
            let spoken: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(
                spoken,
                vec![
                    "twelve dollars and five cents",
                    "four",
                    "minus twenty three",
                    "c d f one at a b c dot e d u",
                    "five kilometers",
                    "one billion",
                ]
            );
        });
    }

    #[test]
    fn override_tables_with_quotes_still_parse() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("measurements.tsv"), "in\t\"inch\"\n").unwrap();
        let mut normalizer = EnglishNormalizer::new();
        let params = EnglishGrammarParamsBuilder::default()
            .tables_dir(dir.path())
            .build()
            .unwrap();
        normalizer.load_grammars_with_params(params).unwrap();
        assert_eq!(normalizer.normalize_best("1 in").unwrap(), "one \"inch\"");
    }

    #[test]
    fn builder_defaults() {
        let params = EnglishGrammarParamsBuilder::default().build().unwrap();
        assert_eq!(params, EnglishGrammarParams::default());
        let params = EnglishGrammarParamsBuilder::default()
            .case_policy(CasePolicy::LowerCased)
            .tables_dir("data")
            .build()
            .unwrap();
        assert_eq!(params.tables_dir, Some(PathBuf::from("data")));
    }
}
