use crate::engines::en::tables::{escaped, Tables};
use crate::fst::Fst;
use crate::grammar::{delete_space, field, insert_space, optional_minus_graph, SubGrammar};
use crate::tagged::escape;

use super::cardinal::CardinalTagger;
use super::decimal::DecimalTagger;

/// Measurements, e.g.
///
/// ```text
/// 1kg    -> measure { integer: "one" units: "kilogram" }
/// -12 km -> measure { negative: "true" integer: "twelve" units: "kilometers" }
/// .5kg   -> measure { fractional_part: "five" units: "kilograms" }
/// 5km/h  -> measure { integer: "five" units: "kilometers per hour" }
/// ```
pub fn build(
    tables: &Tables,
    cardinal: &CardinalTagger,
    decimal: &DecimalTagger,
    deterministic: bool,
) -> SubGrammar {
    let singular = Fst::string_map(escaped(&tables.measurements));
    let plural = Fst::string_map(
        tables
            .measurements
            .iter()
            .map(|(unit, name)| (unit.as_str(), escape(&tables.pluralize(name)))),
    );

    let per = Fst::cross("/", "per ") + delete_space() + singular.clone();
    let optional_per = (delete_space() + insert_space() + per.clone()).optional();
    let units_singular = field("units", singular + optional_per.clone() | per.clone());
    let units_plural = field("units", plural + optional_per | per.clone());

    let gap = Fst::delete(" ").optional() + insert_space();

    let one = field("integer", Fst::cross("1", "one")) + gap.clone() + units_singular;
    let other = field("integer", (*cardinal.integer_not_one).clone()) + gap.clone() + units_plural.clone();
    let fractional = decimal.magnitude.clone() + gap + units_plural;

    let fst = optional_minus_graph() + Fst::union_all([one, other, fractional])
        | field("units", per);

    SubGrammar::classify("measure", deterministic, fst)
}
