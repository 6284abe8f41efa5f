use std::collections::{HashMap, VecDeque};

use super::{Fst, Input, Output, StateId};

/// Label produced when `upper`'s output meets `lower`'s input, if they agree.
fn matched(upper_in: &Input, upper_out: Output, lower_in: &Input, lower_out: Output) -> Option<(Input, Output)> {
    match upper_out {
        Output::Eps => None,
        Output::Char(c) => {
            if !lower_in.accepts(c) {
                return None;
            }
            let out = match lower_out {
                Output::Copy => Output::Char(c),
                other => other,
            };
            Some((upper_in.clone(), out))
        }
        // `upper` copies a class character through; `lower` must accept it too.
        Output::Copy => {
            let Input::Class(upper_class) = upper_in else {
                return None;
            };
            match lower_in {
                Input::Eps => None,
                Input::Char(c) => {
                    if !upper_class.contains(*c) {
                        return None;
                    }
                    let out = match lower_out {
                        Output::Copy => Output::Char(*c),
                        other => other,
                    };
                    Some((Input::Char(*c), out))
                }
                Input::Class(lower_class) => upper_class
                    .intersect(lower_class)
                    .map(|class| (Input::Class(class), lower_out)),
            }
        }
    }
}

impl Fst {
    /// Relational composition: feed this transducer's output into `lower`.
    ///
    /// Used both to restrict a domain (compose an acceptor with a transducer)
    /// and to chain rewrites. The result is trimmed with [`Fst::connect`].
    pub fn compose(&self, lower: &Fst) -> Fst {
        let mut out = Fst::empty();
        let mut ids: HashMap<(StateId, StateId), StateId> = HashMap::new();
        let mut queue = VecDeque::new();

        let start = (self.start, lower.start);
        ids.insert(start, out.start);
        queue.push_back(start);

        let mut intern = |pair: (StateId, StateId), out: &mut Fst, queue: &mut VecDeque<_>| {
            *ids.entry(pair).or_insert_with(|| {
                queue.push_back(pair);
                out.add_state()
            })
        };

        while let Some((a, b)) = queue.pop_front() {
            let from = intern((a, b), &mut out, &mut queue);

            if let (Some(wa), Some(wb)) = (self.final_weight(a), lower.final_weight(b)) {
                out.set_final(from, Some(wa + wb));
            }

            for edge in self.edges(a) {
                // Upper moves alone when it emits nothing.
                if edge.output == Output::Eps {
                    let to = intern((edge.next, b), &mut out, &mut queue);
                    out.add_edge(from, edge.input.clone(), Output::Eps, edge.weight, to);
                    continue;
                }
                for lower_edge in lower.edges(b) {
                    if let Some((input, output)) =
                        matched(&edge.input, edge.output, &lower_edge.input, lower_edge.output)
                    {
                        let to = intern((edge.next, lower_edge.next), &mut out, &mut queue);
                        out.add_edge(from, input, output, edge.weight + lower_edge.weight, to);
                    }
                }
            }

            // Lower moves alone on its epsilon-input edges.
            for lower_edge in lower.edges(b) {
                if lower_edge.input.is_eps() {
                    let to = intern((a, lower_edge.next), &mut out, &mut queue);
                    out.add_edge(from, Input::Eps, lower_edge.output, lower_edge.weight, to);
                }
            }
        }

        out.connect()
    }

    /// Drop states that are unreachable from the start or cannot reach a final state.
    pub fn connect(self) -> Fst {
        let n = self.states.len();

        let mut reachable = vec![false; n];
        let mut stack = vec![self.start];
        reachable[self.start as usize] = true;
        while let Some(s) = stack.pop() {
            for edge in self.edges(s) {
                if !reachable[edge.next as usize] {
                    reachable[edge.next as usize] = true;
                    stack.push(edge.next);
                }
            }
        }

        let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); n];
        for (s, state) in self.states.iter().enumerate() {
            for edge in &state.edges {
                reverse[edge.next as usize].push(s as StateId);
            }
        }
        let mut coaccessible = vec![false; n];
        let mut stack: Vec<StateId> = (0..n)
            .filter(|&s| self.states[s].final_weight.is_some())
            .map(|s| s as StateId)
            .collect();
        for &s in &stack {
            coaccessible[s as usize] = true;
        }
        while let Some(s) = stack.pop() {
            for &prev in &reverse[s as usize] {
                if !coaccessible[prev as usize] {
                    coaccessible[prev as usize] = true;
                    stack.push(prev);
                }
            }
        }

        if !coaccessible[self.start as usize] {
            return Fst::empty();
        }

        let mut remap: Vec<Option<StateId>> = vec![None; n];
        let mut next_id = 0;
        for s in 0..n {
            if reachable[s] && coaccessible[s] {
                remap[s] = Some(next_id);
                next_id += 1;
            }
        }

        let mut out = Fst {
            states: Vec::with_capacity(next_id as usize),
            start: 0,
        };
        for (s, state) in self.states.into_iter().enumerate() {
            if remap[s].is_none() {
                continue;
            }
            let mut state = state;
            state
                .edges
                .retain(|edge| remap[edge.next as usize].is_some());
            for edge in &mut state.edges {
                if let Some(next) = remap[edge.next as usize] {
                    edge.next = next;
                }
            }
            out.states.push(state);
        }
        if let Some(start) = remap[self.start as usize] {
            out.set_start(start);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::fst::{CharClass, Fst};

    #[test]
    fn filter_restricts_domain() {
        let spell = Fst::string_map([("1", "one"), ("2", "two"), ("3", "three")]).plus();
        let only_two_digits = Fst::class(CharClass::digit()).repeat(2, Some(2));
        let restricted = only_two_digits.compose(&spell).compile().unwrap();

        assert_eq!(restricted.shortest_path("12").unwrap().output, "onetwo");
        assert!(restricted.shortest_path("1").is_none());
        assert!(restricted.shortest_path("123").is_none());
    }

    #[test]
    fn chained_rewrites() {
        let strip_commas = (Fst::class(CharClass::digit()) | Fst::delete(",")).plus();
        let spell = Fst::string_map([("1", "one "), ("2", "two "), ("3", "three ")]).plus();
        let both = strip_commas.compose(&spell).compile().unwrap();
        assert_eq!(both.shortest_path("1,23").unwrap().output, "one two three ");
    }

    #[test]
    fn weights_add_across_composition() {
        let upper = Fst::cross("a", "b").add_weight(1.5);
        let lower = Fst::cross("b", "c").add_weight(2.0);
        let path = upper.compose(&lower).compile().unwrap().shortest_path("a").unwrap();
        assert_eq!(path.output, "c");
        assert!((path.weight - 3.5).abs() < 1e-6);
    }

    #[test]
    fn disjoint_composition_is_empty() {
        let upper = Fst::class(CharClass::digit());
        let lower = Fst::class(CharClass::alpha());
        let composed = upper.compose(&lower);
        assert_eq!(composed.num_edges(), 0);
        assert!(composed.compile().unwrap().shortest_path("1").is_none());
    }
}
