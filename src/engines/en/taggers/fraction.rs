use crate::engines::en::tables::Tables;
use crate::fst::Fst;
use crate::grammar::{digit, field, insert_space, optional_minus_graph, SubGrammar};

use super::cardinal::CardinalTagger;

/// The unconverted `numerator: "4/5" denominator: "NONE"` reading.
const RAW_WEIGHT: f32 = 0.1;

/// Fractions, e.g.
///
/// ```text
/// 23 4/5 -> fraction { integer_part: "twenty three" numerator: "four" denominator: "five" }
/// 2¾     -> fraction { integer_part: "two" numerator: "three" denominator: "four" }
/// ```
pub fn build(tables: &Tables, cardinal: &CardinalTagger, deterministic: bool) -> SubGrammar {
    let number = (*cardinal.integer).clone();
    let slash = Fst::delete("/") | Fst::delete(" / ");
    let integer_part = (field("integer_part", number.clone()) + Fst::accep(" ")).optional();

    let converted = field("numerator", number.clone())
        + slash
        + insert_space()
        + field("denominator", number);

    let digits = digit().plus();
    let raw = field(
        "numerator",
        digits.clone() + (Fst::accep("/") | Fst::accep(" / ")) + digits,
    ) + Fst::insert(" denominator: \"NONE\"");

    let body = optional_minus_graph() + integer_part + (converted | raw.add_weight(RAW_WEIGHT));

    // "2¾" and "2 ¾" are read as "2 3/4".
    let glyph = Fst::string_map(tables.fractions.iter().cloned());
    let lead = (digit().plus() + (Fst::accep(" ") | Fst::insert(" "))).optional();
    let glyphs = (lead + glyph).compose(&body);

    SubGrammar::classify("fraction", deterministic, body | glyphs)
}
