use std::collections::{HashMap, HashSet};

use crate::engines::en::tables::Tables;
use crate::fst::Fst;
use crate::grammar::{field, SubGrammar};
use crate::tagged::escape;

/// Each later reading of a repeated key adds this much per rank.
const ALTERNATIVE_WEIGHT: f32 = 0.1;

/// Literal substitutions, e.g. `Dr.` -> `whitelist { name: "doctor" }`.
///
/// Keys that are also measurement units or currency symbols are dropped so
/// measure and money keep those spans. A key listed more than once has
/// alternative readings: the first row wins, and the later rows are only
/// offered in n-best mode.
pub fn build(tables: &Tables, deterministic: bool) -> SubGrammar {
    let reserved: HashSet<&str> = tables
        .measurements
        .iter()
        .chain(&tables.currency)
        .map(|(key, _)| key.as_str())
        .collect();

    let (kept, dropped): (Vec<_>, Vec<_>) = tables
        .whitelist
        .iter()
        .partition(|(key, _)| !reserved.contains(key.as_str()));
    if !dropped.is_empty() {
        log::debug!(
            "Whitelist entries shadowed by units or currencies: {:?}",
            dropped.iter().map(|(key, _)| key).collect::<Vec<_>>()
        );
    }

    let mut readings: Vec<(&str, Vec<&str>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (key, value) in kept {
        let (key, value) = (key.as_str(), value.as_str());
        match index.get(key) {
            Some(&i) => readings[i].1.push(value),
            None => {
                index.insert(key, readings.len());
                readings.push((key, vec![value]));
            }
        }
    }

    let preferred =
        Fst::string_map(readings.iter().map(|(key, values)| (*key, escape(values[0]))));
    let map = if deterministic {
        preferred
    } else {
        let alternatives = readings.iter().flat_map(|(key, values)| {
            values.iter().enumerate().skip(1).map(move |(rank, value)| {
                Fst::cross(key, &escape(value)).add_weight(ALTERNATIVE_WEIGHT * rank as f32)
            })
        });
        Fst::union_all(std::iter::once(preferred).chain(alternatives))
    };
    SubGrammar::classify("whitelist", deterministic, field("name", map))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(tables: &Tables, input: &str) -> Option<String> {
        build(tables, true)
            .fst
            .compile()
            .unwrap()
            .shortest_path(input)
            .map(|p| p.output)
    }

    fn readings(tables: &Tables, input: &str) -> Vec<(String, f32)> {
        build(tables, false)
            .fst
            .compile()
            .unwrap()
            .n_shortest_paths(input, 5)
            .into_iter()
            .map(|p| (p.output, p.weight))
            .collect()
    }

    #[test]
    fn substitutes_literals() {
        let tables = Tables::default();
        assert_eq!(tag(&tables, "Dr.").as_deref(), Some("name: \"doctor\""));
        assert_eq!(tag(&tables, "Dr"), None);
    }

    #[test]
    fn unit_and_currency_keys_are_dropped() {
        let mut tables = Tables::default();
        tables.whitelist.push(("kg".into(), "keg".into()));
        tables.whitelist.push(("$".into(), "bucks".into()));
        assert_eq!(tag(&tables, "kg"), None);
        assert_eq!(tag(&tables, "$"), None);
    }

    #[test]
    fn repeated_keys_are_alternatives() {
        let tables = Tables::default();
        assert_eq!(tag(&tables, "Dr.").as_deref(), Some("name: \"doctor\""));

        let found = readings(&tables, "Dr.");
        let names: Vec<&str> = found.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["name: \"doctor\"", "name: \"drive\""]);
        assert!((found[1].1 - ALTERNATIVE_WEIGHT).abs() < 1e-6);
    }

    #[test]
    fn values_are_escaped() {
        let mut tables = Tables::default();
        tables.whitelist = vec![("Ave.".into(), "\"avenue\"".into())];
        assert_eq!(
            tag(&tables, "Ave.").as_deref(),
            Some("name: \"\\\"avenue\\\"\"")
        );
    }
}
