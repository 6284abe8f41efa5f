use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::engines::en::tables::{Table, Tables};
use crate::engines::en::verbalizers::{
    cardinal, decimal, electronic, fraction, measure, money, plain,
};
use crate::fst::{CharClass, CompiledFst, Fst, Weight};
use crate::grammar::SubGrammar;
use crate::tagged::{SemioticClass, TaggedToken};
use crate::{Normalization, NormalizeError};

const CLOSING: &[&str] = &[
    ",", ".", "!", "?", ";", ":", ")", "]", "}", "…", "»", "’", "”", "%",
];
const OPENING: &[&str] = &["(", "[", "{", "¿", "¡", "«", "‘", "“"];

/// One compiled verbalizer per semiotic class.
#[derive(Debug, Clone)]
pub struct VerbalizerSet {
    fsts: BTreeMap<SemioticClass, Arc<CompiledFst>>,
    floor: Arc<CompiledFst>,
}

impl VerbalizerSet {
    pub fn build(tables: &Tables, deterministic: bool) -> Result<Self, NormalizeError> {
        let grammars: Vec<(SemioticClass, SubGrammar)> = vec![
            (SemioticClass::Cardinal, cardinal::build(deterministic)),
            (SemioticClass::Decimal, decimal::build(deterministic)),
            (SemioticClass::Fraction, fraction::build(deterministic)),
            (SemioticClass::Measure, measure::build(deterministic)),
            (SemioticClass::Money, money::build(deterministic)),
            (SemioticClass::Electronic, electronic::build(tables, deterministic)),
            (SemioticClass::Whitelist, plain::build("whitelist", deterministic)),
            (SemioticClass::Word, plain::build("word", deterministic)),
            (SemioticClass::Punct, plain::build("punct", deterministic)),
        ];

        let mut fsts = BTreeMap::new();
        for (class, grammar) in grammars {
            let compiled = grammar.fst.compile()?;
            log::debug!(
                "{} verbalizer: {} states, {} edges",
                class,
                compiled.fst().num_states(),
                compiled.fst().num_edges()
            );
            fsts.insert(class, Arc::new(compiled));
        }
        log::info!(
            "Compiled {} verbalizers (deterministic={})",
            fsts.len(),
            deterministic
        );
        let floor = Arc::new(negative_weights(tables).compile()?);
        Ok(Self::from_compiled(fsts, floor))
    }

    pub fn from_compiled(
        fsts: BTreeMap<SemioticClass, Arc<CompiledFst>>,
        floor: Arc<CompiledFst>,
    ) -> Self {
        Self { fsts, floor }
    }

    pub fn compiled(&self) -> &BTreeMap<SemioticClass, Arc<CompiledFst>> {
        &self.fsts
    }

    /// The scanner behind [`VerbalizerSet::weight_floor`].
    pub fn floor_fst(&self) -> &Arc<CompiledFst> {
        &self.floor
    }

    /// Lower bound on the verbalizer weight any reading of `input` can add.
    ///
    /// Never positive. A reading whose classify weight plus this floor is
    /// already above the n-th best total cannot enter the n best.
    pub fn weight_floor(&self, input: &str) -> Weight {
        self.floor
            .shortest_path(input)
            .map_or(0.0, |path| path.weight.min(0.0))
    }

    /// Up to `n` spoken forms of one token, ascending by weight.
    pub fn verbalize(
        &self,
        token: &TaggedToken,
        n: usize,
    ) -> Result<Vec<(String, f32)>, NormalizeError> {
        let unverbalizable = || NormalizeError::UnverbalizableToken {
            class: token.class.to_string(),
            fields: token.fields.clone(),
        };
        let fst = self.fsts.get(&token.class).ok_or_else(unverbalizable)?;
        let paths = fst.n_shortest_paths(&token.render_fields(), n);
        if paths.is_empty() {
            return Err(unverbalizable());
        }
        Ok(paths.into_iter().map(|p| (p.output, p.weight)).collect())
    }

    /// Verbalize a token sequence and join the pieces into sentences.
    ///
    /// `sources[i]` is the input text `tokens[i]` was tagged from; it is
    /// emitted as written when the token cannot be verbalized.
    pub fn verbalize_all(
        &self,
        tokens: &[TaggedToken],
        sources: &[String],
        n: usize,
    ) -> Vec<Normalization> {
        let n = n.max(1);
        let spaced = spacing(tokens);

        let mut beam = vec![Normalization {
            text: String::new(),
            weight: 0.0,
            verbatim: Vec::new(),
        }];

        for (i, token) in tokens.iter().enumerate() {
            let source = sources.get(i).map(String::as_str).unwrap_or_default();
            let (candidates, verbatim) = match self.verbalize(token, n) {
                Ok(candidates) => (candidates, None),
                Err(e) => {
                    log::warn!("{e}; keeping {source:?} as written");
                    (vec![(source.to_string(), 0.0)], Some(source.to_string()))
                }
            };

            let mut next = Vec::with_capacity(beam.len() * candidates.len());
            for prefix in &beam {
                for (text, weight) in &candidates {
                    let mut joined = prefix.clone();
                    if spaced[i] && !joined.text.is_empty() && !text.is_empty() {
                        joined.text.push(' ');
                    }
                    joined.text.push_str(text);
                    joined.weight += weight;
                    if let Some(span) = &verbatim {
                        joined.verbatim.push(span.clone());
                    }
                    next.push(joined);
                }
            }
            beam = rank(next, n);
        }
        beam
    }
}

/// Deletes any input, collecting every negative verbalizer weight its
/// substrings could earn: known server names and domain suffixes, and a
/// currency symbol before a zero amount.
fn negative_weights(tables: &Tables) -> Fst {
    let keys = |table: &Table| Fst::string_map(table.iter().map(|(key, _)| (key.as_str(), "")));
    let zero_amount = keys(&tables.currency) + Fst::delete(" ").optional() + Fst::delete("0");
    Fst::union_all([
        Fst::class_delete(CharClass::any()),
        keys(&tables.server_names).add_weight(electronic::WHOLE_WORD_WEIGHT),
        keys(&tables.domains).add_weight(electronic::WHOLE_WORD_WEIGHT),
        zero_amount.add_weight(money::ELISION_WEIGHT),
    ])
    .closure()
}

/// Whether each token is preceded by a space.
fn spacing(tokens: &[TaggedToken]) -> Vec<bool> {
    let mut quote_open = false;
    let mut attach_next = false;
    let mut spaced = Vec::with_capacity(tokens.len());

    for token in tokens {
        let punct = match token.class {
            SemioticClass::Punct => token.get("name"),
            _ => None,
        };
        let (closing, opening) = match punct {
            Some("\"") => {
                quote_open = !quote_open;
                (!quote_open, quote_open)
            }
            Some(p) => (CLOSING.contains(&p), OPENING.contains(&p)),
            None => (false, false),
        };
        spaced.push(!closing && !attach_next);
        attach_next = opening;
    }
    spaced
}

/// Sort ascending by weight, keep the first of equal texts, keep `n`.
pub(crate) fn rank(mut candidates: Vec<Normalization>, n: usize) -> Vec<Normalization> {
    candidates.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.text.clone()));
    candidates.truncate(n);
    candidates
}
