use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::{Edge, Fst, Input, Output, StateId, Weight};
use crate::NormalizeError;

/// One complete rewrite of an input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    pub output: String,
    pub weight: Weight,
    /// Input char offset for each output char, followed by the input length.
    pub alignment: Vec<usize>,
}

/// A searchable transducer: no epsilon-input cycles, states ranked in
/// topological order over epsilon-input edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFst {
    fst: Fst,
    eps_rank: Vec<u32>,
}

const ROOT: u32 = 0;

/// A lattice entry. `output` and `trace` index into the search [`Arena`].
#[derive(Debug, Clone, Copy)]
struct Hypothesis {
    weight: Weight,
    output: u32,
    trace: u32,
}

/// Backpointers shared by every hypothesis of one search.
///
/// Outputs are interned as a trie, so two hypotheses emit the same string
/// exactly when their output ids are equal. Traces record the input offset
/// of each emitted char and are only walked for the final paths.
struct Arena {
    outputs: Vec<(u32, char)>,
    interned: HashMap<(u32, char), u32>,
    traces: Vec<(u32, usize)>,
}

impl Arena {
    fn new() -> Self {
        Self {
            outputs: vec![(ROOT, '\0')],
            interned: HashMap::new(),
            traces: vec![(ROOT, 0)],
        }
    }

    fn advance(
        &mut self,
        hyp: Hypothesis,
        edge: &Edge,
        matched: Option<char>,
        pos: usize,
    ) -> Hypothesis {
        let emitted = match edge.output {
            Output::Eps => None,
            Output::Char(c) => Some(c),
            Output::Copy => matched,
        };
        let Some(c) = emitted else {
            return Hypothesis {
                weight: hyp.weight + edge.weight,
                ..hyp
            };
        };

        let next_id = self.outputs.len() as u32;
        let output = *self.interned.entry((hyp.output, c)).or_insert(next_id);
        if output == next_id {
            self.outputs.push((hyp.output, c));
        }
        self.traces.push((hyp.trace, pos));
        Hypothesis {
            weight: hyp.weight + edge.weight,
            output,
            trace: (self.traces.len() - 1) as u32,
        }
    }

    fn path(&self, hyp: Hypothesis, input_len: usize) -> Path {
        let mut output = Vec::new();
        let mut id = hyp.output;
        while id != ROOT {
            let (parent, c) = self.outputs[id as usize];
            output.push(c);
            id = parent;
        }
        let mut alignment = Vec::with_capacity(output.len() + 1);
        let mut id = hyp.trace;
        while id != ROOT {
            let (parent, pos) = self.traces[id as usize];
            alignment.push(pos);
            id = parent;
        }
        alignment.reverse();
        alignment.push(input_len);
        Path {
            output: output.into_iter().rev().collect(),
            weight: hyp.weight,
            alignment,
        }
    }
}

/// Keep at most `n` hypotheses with distinct outputs, ascending by weight.
/// Equal weights keep arrival order.
fn push_hypothesis(list: &mut Vec<Hypothesis>, hyp: Hypothesis, n: usize) {
    if let Some(i) = list.iter().position(|h| h.output == hyp.output) {
        if hyp.weight < list[i].weight {
            list.remove(i);
        } else {
            return;
        }
    }
    let at = list.partition_point(|h| h.weight <= hyp.weight);
    if at >= n {
        return;
    }
    list.insert(at, hyp);
    list.truncate(n);
}

impl Fst {
    /// Rank states over epsilon-input edges, failing on an epsilon cycle.
    pub fn compile(self) -> Result<CompiledFst, NormalizeError> {
        let fst = self.connect();
        let n = fst.states.len();

        let mut indegree = vec![0u32; n];
        for state in &fst.states {
            for edge in state.edges.iter().filter(|e| e.input.is_eps()) {
                indegree[edge.next as usize] += 1;
            }
        }

        let mut queue: VecDeque<StateId> = (0..n)
            .filter(|&s| indegree[s] == 0)
            .map(|s| s as StateId)
            .collect();
        let mut eps_rank = vec![u32::MAX; n];
        let mut next_rank = 0u32;
        while let Some(s) = queue.pop_front() {
            eps_rank[s as usize] = next_rank;
            next_rank += 1;
            for edge in fst.edges(s).iter().filter(|e| e.input.is_eps()) {
                let d = &mut indegree[edge.next as usize];
                *d -= 1;
                if *d == 0 {
                    queue.push_back(edge.next);
                }
            }
        }

        if next_rank as usize != n {
            return Err(NormalizeError::GrammarBuild(format!(
                "epsilon cycle through {} of {} states",
                n - next_rank as usize,
                n
            )));
        }

        Ok(CompiledFst { fst, eps_rank })
    }
}

impl CompiledFst {
    pub fn fst(&self) -> &Fst {
        &self.fst
    }

    fn key(&self, state: StateId) -> (u32, StateId) {
        (self.eps_rank[state as usize], state)
    }

    /// Lowest-weight rewrite of `input`, or `None` when nothing accepts it.
    pub fn shortest_path(&self, input: &str) -> Option<Path> {
        self.n_shortest_paths(input, 1).into_iter().next()
    }

    /// Up to `n` rewrites with distinct outputs, ascending by weight.
    ///
    /// Viterbi over the (input position, state) lattice. Within one position
    /// states are expanded in epsilon-topological order, so every node is
    /// final before it is expanded and negative weights need no special care.
    pub fn n_shortest_paths(&self, input: &str, n: usize) -> Vec<Path> {
        let n = n.max(1);
        let chars: Vec<char> = input.chars().collect();
        let mut arena = Arena::new();
        let mut results: Vec<Hypothesis> = Vec::new();

        let root = Hypothesis {
            weight: 0.0,
            output: ROOT,
            trace: ROOT,
        };
        let mut current: BTreeMap<(u32, StateId), Vec<Hypothesis>> = BTreeMap::new();
        current.insert(self.key(self.fst.start), vec![root]);
        let mut expanded = 0usize;

        for pos in 0..=chars.len() {
            let symbol = chars.get(pos).copied();
            let mut next: BTreeMap<(u32, StateId), Vec<Hypothesis>> = BTreeMap::new();

            while let Some(((_, state), hyps)) = current.pop_first() {
                expanded += 1;
                if symbol.is_none() {
                    if let Some(final_weight) = self.fst.final_weight(state) {
                        for hyp in &hyps {
                            let done = Hypothesis {
                                weight: hyp.weight + final_weight,
                                ..*hyp
                            };
                            push_hypothesis(&mut results, done, n);
                        }
                    }
                }

                for edge in self.fst.edges(state) {
                    match (&edge.input, symbol) {
                        (Input::Eps, _) => {
                            let target = current.entry(self.key(edge.next)).or_default();
                            for hyp in &hyps {
                                push_hypothesis(target, arena.advance(*hyp, edge, None, pos), n);
                            }
                        }
                        (input, Some(ch)) if input.accepts(ch) => {
                            let target = next.entry(self.key(edge.next)).or_default();
                            for hyp in &hyps {
                                push_hypothesis(target, arena.advance(*hyp, edge, Some(ch), pos), n);
                            }
                        }
                        _ => {}
                    }
                }
            }

            if next.is_empty() {
                break;
            }
            current = next;
        }

        log::debug!(
            "searched {} lattice nodes over {} chars, {} paths",
            expanded,
            chars.len(),
            results.len()
        );

        results
            .into_iter()
            .map(|hyp| arena.path(hyp, chars.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::fst::{CharClass, Fst};

    #[test]
    fn n_best_is_sorted_and_distinct() {
        let fst = Fst::cross("a", "x").add_weight(3.0)
            | Fst::cross("a", "y").add_weight(1.0)
            | Fst::cross("a", "y").add_weight(2.0)
            | Fst::cross("a", "z").add_weight(2.0);
        let paths = fst.compile().unwrap().n_shortest_paths("a", 5);
        let outputs: Vec<&str> = paths.iter().map(|p| p.output.as_str()).collect();
        assert_eq!(outputs, vec!["y", "z", "x"]);
        assert!(paths.windows(2).all(|w| w[0].weight <= w[1].weight));
    }

    #[test]
    fn negative_weights_are_exact() {
        let cheap = Fst::cross("ab", "cheap").add_weight(-0.5);
        let plain = Fst::accep("ab");
        let path = (plain | cheap).compile().unwrap().shortest_path("ab").unwrap();
        assert_eq!(path.output, "cheap");
        assert!((path.weight + 0.5).abs() < 1e-6);
    }

    #[test]
    fn epsilon_cycle_is_rejected() {
        let loop_of_inserts = Fst::insert("x").plus();
        assert!(loop_of_inserts.compile().is_err());
    }

    #[test]
    fn alignment_tracks_input_offsets() {
        let fst = Fst::class(CharClass::alpha()) + Fst::delete(" ") + Fst::insert("-")
            + Fst::class(CharClass::alpha());
        let path = fst.compile().unwrap().shortest_path("a b").unwrap();
        assert_eq!(path.output, "a-b");
        assert_eq!(path.alignment, vec![0, 2, 2, 3]);
    }

    #[test]
    fn same_output_from_different_routes_is_merged() {
        let fst = (Fst::cross("a", "x") + Fst::accep("b")).add_weight(2.0)
            | Fst::cross("ab", "xb").add_weight(1.0)
            | Fst::cross("ab", "xc").add_weight(3.0);
        let paths = fst.compile().unwrap().n_shortest_paths("ab", 5);
        let outputs: Vec<&str> = paths.iter().map(|p| p.output.as_str()).collect();
        assert_eq!(outputs, vec!["xb", "xc"]);
        assert!((paths[0].weight - 1.0).abs() < 1e-6);
    }

    #[test]
    fn long_inputs_search_in_linear_time() {
        let word = Fst::class(CharClass::alpha()).plus();
        let sentence = word.clone() + (Fst::cross(" ", "_") + word).closure();
        let fst = sentence.compile().unwrap();
        let input = "lorem ipsum dolor sit amet ".repeat(150);
        let input = input.trim_end();

        let started = Instant::now();
        let paths = fst.n_shortest_paths(input, 3);
        assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].output, input.replace(' ', "_"));
        assert_eq!(paths[0].alignment.len(), input.chars().count() + 1);
        assert_eq!(paths[0].alignment[5], 5);
    }

    #[test]
    fn rejects_unaccepted_input() {
        let fst = Fst::accep("abc").compile().unwrap();
        assert!(fst.shortest_path("abd").is_none());
        assert!(fst.n_shortest_paths("ab", 3).is_empty());
    }
}
