//! Weighted finite-state transducers over the tropical semiring.
//!
//! An [`Fst`] is an explicit graph: states, labeled weighted edges, a start
//! state and final states carrying a final weight. Weights add along a path
//! and the minimum wins between paths, so a lower total means a preferred
//! rewrite.
//!
//! Grammars are assembled with the combinators on [`Fst`] (`+` concatenates,
//! `|` unions), restricted with [`Fst::compose`], and finally turned into a
//! [`CompiledFst`] which can be searched for the best or the n best rewrites
//! of an input string.
//!
//! ```
//! use tn_rs::fst::{CharClass, Fst};
//!
//! let digit = Fst::string_map([("1", "one"), ("2", "two")]);
//! let digits = digit.clone() + (Fst::insert(" ") + digit).closure();
//! let compiled = digits.compile()?;
//! assert_eq!(compiled.shortest_path("21").unwrap().output, "two one");
//! # Ok::<(), tn_rs::NormalizeError>(())
//! ```

mod class;
mod compose;
mod search;

pub use class::{category, CharClass, DIGIT, LOWER, OTHER, PUNCT, PUNCTUATION, SPACE, UPPER};
pub use search::{CompiledFst, Path};

use std::collections::HashMap;
use std::ops::{Add, BitOr};

use serde::{Deserialize, Serialize};

pub type StateId = u32;

/// Tropical weight: `+` along a path, `min` across paths.
pub type Weight = f32;

/// What an edge consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Input {
    Eps,
    Char(char),
    Class(CharClass),
}

impl Input {
    pub fn accepts(&self, ch: char) -> bool {
        match self {
            Input::Eps => false,
            Input::Char(c) => *c == ch,
            Input::Class(class) => class.contains(ch),
        }
    }

    pub fn is_eps(&self) -> bool {
        matches!(self, Input::Eps)
    }
}

/// What an edge emits. `Copy` re-emits the character the edge consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Output {
    Eps,
    Char(char),
    Copy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub input: Input,
    pub output: Output,
    pub weight: Weight,
    pub next: StateId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub edges: Vec<Edge>,
    pub final_weight: Option<Weight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fst {
    states: Vec<State>,
    start: StateId,
}

impl Default for Fst {
    fn default() -> Self {
        Self::empty()
    }
}

impl Fst {
    /// The transducer with no accepting path.
    pub fn empty() -> Self {
        Self {
            states: vec![State::default()],
            start: 0,
        }
    }

    /// Accepts only the empty string, emitting nothing.
    pub fn epsilon() -> Self {
        let mut fst = Self::empty();
        fst.states[0].final_weight = Some(0.0);
        fst
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_edges(&self) -> usize {
        self.states.iter().map(|s| s.edges.len()).sum()
    }

    pub fn edges(&self, state: StateId) -> &[Edge] {
        &self.states[state as usize].edges
    }

    pub fn final_weight(&self, state: StateId) -> Option<Weight> {
        self.states[state as usize].final_weight
    }

    pub(crate) fn add_state(&mut self) -> StateId {
        self.states.push(State::default());
        (self.states.len() - 1) as StateId
    }

    pub(crate) fn add_edge(
        &mut self,
        from: StateId,
        input: Input,
        output: Output,
        weight: Weight,
        next: StateId,
    ) {
        // Copy after a literal is just that literal; Copy after epsilon emits nothing.
        let output = match (&input, output) {
            (Input::Char(c), Output::Copy) => Output::Char(*c),
            (Input::Eps, Output::Copy) => Output::Eps,
            (_, output) => output,
        };
        self.states[from as usize].edges.push(Edge {
            input,
            output,
            weight,
            next,
        });
    }

    pub(crate) fn set_final(&mut self, state: StateId, weight: Option<Weight>) {
        self.states[state as usize].final_weight = weight;
    }

    pub(crate) fn set_start(&mut self, state: StateId) {
        self.start = state;
    }

    fn finals(&self) -> Vec<(StateId, Weight)> {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.final_weight.map(|w| (i as StateId, w)))
            .collect()
    }

    fn take_finals(&mut self) -> Vec<(StateId, Weight)> {
        let finals = self.finals();
        for &(state, _) in &finals {
            self.states[state as usize].final_weight = None;
        }
        finals
    }

    /// Copy `other`'s states into `self`, returning where its start landed.
    fn append(&mut self, other: Fst) -> StateId {
        let offset = self.states.len() as StateId;
        for mut state in other.states {
            for edge in &mut state.edges {
                edge.next += offset;
            }
            self.states.push(state);
        }
        other.start + offset
    }

    fn chain(labels: Vec<(Input, Output)>) -> Self {
        let mut fst = Self::empty();
        let mut state = fst.start;
        for (input, output) in labels {
            let next = fst.add_state();
            fst.add_edge(state, input, output, 0.0, next);
            state = next;
        }
        fst.set_final(state, Some(0.0));
        fst
    }

    /// Identity on a literal string.
    pub fn accep(text: &str) -> Self {
        Self::chain(
            text.chars()
                .map(|c| (Input::Char(c), Output::Char(c)))
                .collect(),
        )
    }

    /// Rewrite exactly `input` to `output`.
    pub fn cross(input: &str, output: &str) -> Self {
        let mut ins = input.chars();
        let mut outs = output.chars();
        let mut labels = Vec::new();
        loop {
            match (ins.next(), outs.next()) {
                (None, None) => break,
                (i, o) => labels.push((
                    i.map_or(Input::Eps, Input::Char),
                    o.map_or(Output::Eps, Output::Char),
                )),
            }
        }
        Self::chain(labels)
    }

    pub fn insert(text: &str) -> Self {
        Self::cross("", text)
    }

    pub fn delete(text: &str) -> Self {
        Self::cross(text, "")
    }

    /// Any single character of `class`, copied through.
    pub fn class(class: CharClass) -> Self {
        Self::chain(vec![(Input::Class(class), Output::Copy)])
    }

    /// Any single character of `class`, deleted.
    pub fn class_delete(class: CharClass) -> Self {
        Self::chain(vec![(Input::Class(class), Output::Eps)])
    }

    /// Union of `key -> value` rewrites, sharing key prefixes.
    ///
    /// Pairs keep their table order, which is also the tie-break order.
    pub fn string_map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fst = Self::empty();
        let accept = fst.add_state();
        fst.set_final(accept, Some(0.0));
        let mut trie: HashMap<(StateId, char), StateId> = HashMap::new();

        for (key, value) in pairs {
            let mut state = fst.start;
            for ch in key.as_ref().chars() {
                state = match trie.get(&(state, ch)) {
                    Some(&next) => next,
                    None => {
                        let next = fst.add_state();
                        fst.add_edge(state, Input::Char(ch), Output::Eps, 0.0, next);
                        trie.insert((state, ch), next);
                        next
                    }
                };
            }

            let value: Vec<char> = value.as_ref().chars().collect();
            if value.is_empty() {
                fst.add_edge(state, Input::Eps, Output::Eps, 0.0, accept);
                continue;
            }
            for (i, &ch) in value.iter().enumerate() {
                let next = if i + 1 == value.len() {
                    accept
                } else {
                    fst.add_state()
                };
                fst.add_edge(state, Input::Eps, Output::Char(ch), 0.0, next);
                state = next;
            }
        }
        fst
    }

    pub fn concat(mut self, other: Fst) -> Self {
        let finals = self.take_finals();
        let other_start = self.append(other);
        for (state, weight) in finals {
            self.add_edge(state, Input::Eps, Output::Eps, weight, other_start);
        }
        self
    }

    pub fn union(self, other: Fst) -> Self {
        Self::union_all([self, other])
    }

    /// Weighted union; earlier members win ties.
    pub fn union_all<I: IntoIterator<Item = Fst>>(fsts: I) -> Self {
        let mut out = Self::empty();
        let start = out.start;
        for fst in fsts {
            let member = out.append(fst);
            out.add_edge(start, Input::Eps, Output::Eps, 0.0, member);
        }
        out
    }

    /// One or more repetitions.
    pub fn plus(mut self) -> Self {
        let start = self.start;
        for (state, weight) in self.finals() {
            self.add_edge(state, Input::Eps, Output::Eps, weight, start);
        }
        self
    }

    /// One or more repetitions with `sep` between them, sharing one copy of
    /// `self`. `sep` must consume input.
    pub fn plus_separated(mut self, sep: Fst) -> Self {
        let start = self.start;
        let finals = self.finals();
        let mut sep = sep;
        let sep_finals = sep.take_finals();
        let offset = self.states.len() as StateId;
        let sep_start = self.append(sep);
        for (state, weight) in finals {
            self.add_edge(state, Input::Eps, Output::Eps, weight, sep_start);
        }
        for (state, weight) in sep_finals {
            self.add_edge(state + offset, Input::Eps, Output::Eps, weight, start);
        }
        self
    }

    /// Zero or more repetitions (Kleene star).
    pub fn closure(self) -> Self {
        self.plus().optional()
    }

    pub fn optional(self) -> Self {
        Self::union_all([self, Self::epsilon()])
    }

    /// Between `min` and `max` repetitions; `None` means unbounded.
    pub fn repeat(self, min: usize, max: Option<usize>) -> Self {
        let mut out = Self::epsilon();
        for _ in 0..min {
            out = out.concat(self.clone());
        }
        match max {
            None => out.concat(self.closure()),
            Some(max) => {
                let mut tail = Self::epsilon();
                for _ in min..max {
                    tail = self.clone().concat(tail).optional();
                }
                out.concat(tail)
            }
        }
    }

    /// Add `weight` to every accepting path.
    pub fn add_weight(mut self, weight: Weight) -> Self {
        for state in &mut self.states {
            if let Some(w) = state.final_weight.as_mut() {
                *w += weight;
            }
        }
        self
    }
}

impl Add for Fst {
    type Output = Fst;

    fn add(self, rhs: Fst) -> Fst {
        self.concat(rhs)
    }
}

impl BitOr for Fst {
    type Output = Fst;

    fn bitor(self, rhs: Fst) -> Fst {
        self.union(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn best(fst: Fst, input: &str) -> Option<String> {
        fst.compile()
            .expect("acyclic epsilons")
            .shortest_path(input)
            .map(|p| p.output)
    }

    #[test]
    fn cross_and_concat() {
        let fst = Fst::cross("-", "minus ") + Fst::accep("5");
        assert_eq!(best(fst, "-5").as_deref(), Some("minus 5"));
    }

    #[test]
    fn union_prefers_lower_weight() {
        let fst = Fst::cross("a", "x").add_weight(2.0) | Fst::cross("a", "y").add_weight(1.0);
        assert_eq!(best(fst, "a").as_deref(), Some("y"));
    }

    #[test]
    fn equal_weights_keep_union_order() {
        let fst = Fst::cross("a", "first") | Fst::cross("a", "second");
        assert_eq!(best(fst, "a").as_deref(), Some("first"));
    }

    #[test]
    fn string_map_shares_prefixes() {
        let fst = Fst::string_map([("km", "kilometer"), ("kg", "kilogram")]);
        assert_eq!(best(fst.clone(), "kg").as_deref(), Some("kilogram"));
        assert_eq!(best(fst, "k"), None);
    }

    #[test]
    fn repeat_bounds_are_inclusive() {
        let digits = Fst::class(CharClass::digit()).repeat(2, Some(3));
        assert_eq!(best(digits.clone(), "1"), None);
        assert_eq!(best(digits.clone(), "12").as_deref(), Some("12"));
        assert_eq!(best(digits.clone(), "123").as_deref(), Some("123"));
        assert_eq!(best(digits, "1234"), None);
    }

    #[test]
    fn closure_accepts_empty() {
        let fst = Fst::accep("ab").closure();
        assert_eq!(best(fst.clone(), "").as_deref(), Some(""));
        assert_eq!(best(fst, "abab").as_deref(), Some("abab"));
    }

    #[test]
    fn plus_separated_joins_items() {
        let item = Fst::class(CharClass::digit()).plus();
        let list = item.plus_separated(Fst::cross(",", ";"));
        assert_eq!(best(list.clone(), "1,22,3").as_deref(), Some("1;22;3"));
        assert_eq!(best(list.clone(), "7").as_deref(), Some("7"));
        assert_eq!(best(list, "1,"), None);
    }

    #[test]
    fn class_copy_emits_matched_char() {
        let fst = Fst::class(CharClass::alpha()).plus();
        assert_eq!(best(fst, "Zed").as_deref(), Some("Zed"));
    }
}
