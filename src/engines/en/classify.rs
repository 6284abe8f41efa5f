use std::ops::Range;
use std::sync::Arc;

use crate::engines::en::tables::Tables;
use crate::engines::en::taggers::{
    electronic, fraction, measure, money, whitelist, word, CardinalTagger, DecimalTagger,
};
use crate::fst::{CompiledFst, Fst};
use crate::grammar::{delete_extra_space, delete_space, insert_space, SubGrammar};
use crate::{CasePolicy, NormalizeError};

pub const WHITELIST_WEIGHT: f32 = 1.01;
pub const CLASS_WEIGHT: f32 = 1.1;
pub const PUNCT_WEIGHT: f32 = 1.1;
pub const WORD_WEIGHT: f32 = 100.0;

/// One tagged reading of a whole input.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tagged: String,
    pub weight: f32,
    /// Input char offset for each char of `tagged`, then the input length.
    pub alignment: Vec<usize>,
}

impl Classification {
    /// Input char range a tagged block was produced from.
    pub fn source_span(&self, tag_span: &Range<usize>) -> Range<usize> {
        let start = self.alignment.get(tag_span.start).copied().unwrap_or(0);
        let end = tag_span
            .end
            .checked_sub(1)
            .and_then(|last| self.alignment.get(last))
            .copied()
            .unwrap_or(start);
        start..end.max(start)
    }
}

/// The sentence-level classify grammar.
#[derive(Debug, Clone)]
pub struct ClassifyGrammar {
    fst: Arc<CompiledFst>,
}

impl ClassifyGrammar {
    pub fn from_compiled(fst: Arc<CompiledFst>) -> Self {
        Self { fst }
    }

    pub fn compiled(&self) -> &Arc<CompiledFst> {
        &self.fst
    }

    /// Build every tagger and combine them into the sentence grammar.
    pub fn build(
        tables: &Tables,
        case_policy: CasePolicy,
        deterministic: bool,
    ) -> Result<Self, NormalizeError> {
        let cardinal = CardinalTagger::new(tables, case_policy, deterministic);
        let decimal = DecimalTagger::new(tables, &cardinal, deterministic);

        let weighted: Vec<(SubGrammar, f32)> = vec![
            (whitelist::build(tables, deterministic), WHITELIST_WEIGHT),
            (cardinal.grammar.clone(), CLASS_WEIGHT),
            (decimal.grammar.clone(), CLASS_WEIGHT),
            (fraction::build(tables, &cardinal, deterministic), CLASS_WEIGHT),
            (measure::build(tables, &cardinal, &decimal, deterministic), CLASS_WEIGHT),
            (money::build(tables, &cardinal, &decimal, deterministic), CLASS_WEIGHT),
            (electronic::build(tables, deterministic), CLASS_WEIGHT),
            (word::word(deterministic), WORD_WEIGHT),
        ];
        for (grammar, _) in &weighted {
            log::debug!(
                "{} tagger: {} states, {} edges",
                grammar.name,
                grammar.fst.num_states(),
                grammar.fst.num_edges()
            );
        }
        let classify = Fst::union_all(
            weighted
                .iter()
                .map(|(grammar, weight)| grammar.tokenized().add_weight(*weight)),
        );

        let token = Fst::insert("tokens { ") + classify + Fst::insert(" }");
        let punct = Fst::insert("tokens { ")
            + word::punctuation(deterministic)
                .tokenized()
                .add_weight(PUNCT_WEIGHT)
            + Fst::insert(" }");

        let unit = (punct.clone() + insert_space()).closure()
            + token
            + (insert_space() + punct.clone()).closure()
            | punct.clone() + (insert_space() + punct).closure();

        let sentence = delete_space() + unit.plus_separated(delete_extra_space()) + delete_space();
        let fst = sentence.compile()?;
        log::info!(
            "Compiled classify grammar ({}, deterministic={}): {} states, {} edges",
            case_policy.as_str(),
            deterministic,
            fst.fst().num_states(),
            fst.fst().num_edges()
        );
        Ok(Self::from_compiled(Arc::new(fst)))
    }

    /// Up to `n` tagged readings of `text`, ascending by weight.
    pub fn classify(&self, text: &str, n: usize) -> Result<Vec<Classification>, NormalizeError> {
        let paths = self.fst.n_shortest_paths(text, n);
        if paths.is_empty() {
            return Err(NormalizeError::NoMatch(text.to_string()));
        }
        Ok(paths
            .into_iter()
            .map(|path| Classification {
                tagged: path.output,
                weight: path.weight,
                alignment: path.alignment,
            })
            .collect())
    }
}
