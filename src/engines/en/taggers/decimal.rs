use crate::engines::en::tables::{escaped, Tables};
use crate::fst::Fst;
use crate::grammar::{field, insert_space, optional_minus_graph, SubGrammar};

use super::cardinal::CardinalTagger;

/// Decimal numbers and quantities, e.g.
///
/// ```text
/// -3.14      -> decimal { negative: "true" integer_part: "three" fractional_part: "one four" }
/// .5         -> decimal { fractional_part: "five" }
/// 1 billion  -> decimal { integer_part: "one" quantity: "billion" }
/// ```
pub struct DecimalTagger {
    /// `[integer_part] fractional_part` without sign or quantity.
    pub magnitude: Fst,
    /// An optional space, then `quantity: "<word>"`.
    pub quantity: Fst,
    pub grammar: SubGrammar,
}

impl DecimalTagger {
    pub fn new(tables: &Tables, cardinal: &CardinalTagger, deterministic: bool) -> Self {
        let integer_part = field("integer_part", (*cardinal.integer).clone());
        let fractional_part =
            Fst::delete(".") + field("fractional_part", (*cardinal.single_digits).clone());
        let magnitude = (integer_part.clone() + insert_space()).optional() + fractional_part;

        let quantity = Fst::delete(" ").optional()
            + field("quantity", Fst::string_map(escaped(&tables.magnitudes)));

        let fst = optional_minus_graph()
            + ((magnitude.clone() + (insert_space() + quantity.clone()).optional())
                | integer_part + insert_space() + quantity.clone());

        Self {
            magnitude,
            quantity,
            grammar: SubGrammar::classify("decimal", deterministic, fst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CasePolicy;

    fn tag(input: &str) -> Option<String> {
        let tables = Tables::default();
        let cardinal = CardinalTagger::new(&tables, CasePolicy::Cased, true);
        DecimalTagger::new(&tables, &cardinal, true)
            .grammar
            .fst
            .compile()
            .unwrap()
            .shortest_path(input)
            .map(|p| p.output)
    }

    #[test]
    fn fractional_digits_are_spelled() {
        assert_eq!(
            tag("-3.14").as_deref(),
            Some("negative: \"true\" integer_part: \"three\" fractional_part: \"one four\"")
        );
        assert_eq!(tag(".5").as_deref(), Some("fractional_part: \"five\""));
    }

    #[test]
    fn quantities() {
        assert_eq!(
            tag("1 billion").as_deref(),
            Some("integer_part: \"one\" quantity: \"billion\"")
        );
        assert_eq!(
            tag("2.5million").as_deref(),
            Some("integer_part: \"two\" fractional_part: \"five\" quantity: \"million\"")
        );
    }

    #[test]
    fn plain_integers_are_not_decimals() {
        assert_eq!(tag("12"), None);
        assert_eq!(tag("12."), None);
    }
}
