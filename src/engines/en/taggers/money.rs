use crate::engines::en::tables::Tables;
use crate::fst::{CharClass, Fst};
use crate::grammar::{digit, field, insert_space, not_exactly, optional_minus_graph, SubGrammar};
use crate::tagged::escape;

use super::cardinal::CardinalTagger;
use super::decimal::DecimalTagger;

/// Reading the minor part as a decimal fraction, when cents would also do.
const DECIMAL_FORM_WEIGHT: f32 = 0.1;

/// Money amounts, one branch per currency symbol, e.g.
///
/// ```text
/// $12.05   -> money { integer_part: "twelve" currency: "dollars" cents: "five" minor_currency: "cents" }
/// $1       -> money { integer_part: "one" currency: "dollar" }
/// £1.5 million -> money { integer_part: "one" fractional_part: "five" quantity: "million" currency: "pounds" }
/// ```
pub fn build(
    tables: &Tables,
    cardinal: &CardinalTagger,
    decimal: &DecimalTagger,
    deterministic: bool,
) -> SubGrammar {
    let one = field("integer_part", Fst::cross("1", "one"));
    let other = field("integer_part", (*cardinal.integer_not_one).clone());
    let any = one.clone() | other.clone();
    let fractional =
        Fst::delete(".") + field("fractional_part", (*cardinal.single_digits).clone());
    let drop_zero_cents = Fst::delete(".00").optional();

    // Two-digit minor amounts other than 00; 01 is singular.
    let cents_digits = digit().repeat(2, Some(2));
    let cents_names = (Fst::delete("0") | Fst::epsilon()) + (*cardinal.names).clone();
    let cents_other = cents_digits
        .compose(&not_exactly(CharClass::digit(), "00"))
        .compose(&not_exactly(CharClass::digit(), "01"))
        .compose(&cents_names);

    let mut branches = Vec::new();
    for (symbol, name) in &tables.currency {
        let prefix = Fst::delete(symbol) + Fst::delete(" ").optional();
        let singular = insert_space() + field("currency", Fst::insert(&escape(name)));
        let plural =
            insert_space() + field("currency", Fst::insert(&escape(&tables.pluralize(name))));

        let mut forms = vec![
            one.clone() + drop_zero_cents.clone() + singular.clone(),
            other.clone() + drop_zero_cents.clone() + plural.clone(),
            any.clone() + insert_space() + decimal.quantity.clone() + plural.clone(),
        ];

        let decimal_form = any.clone()
            + insert_space()
            + fractional.clone()
            + (insert_space() + decimal.quantity.clone()).optional()
            + plural.clone();

        match tables.minor_currency(symbol) {
            Some(minor) => {
                let minor_singular = field("minor_currency", Fst::insert(&escape(minor)));
                let minor_plural =
                    field("minor_currency", Fst::insert(&escape(&tables.pluralize(minor))));
                let cents = Fst::delete(".")
                    + insert_space()
                    + (field("cents", Fst::cross("01", "one")) + insert_space() + minor_singular
                        | field("cents", cents_other.clone()) + insert_space() + minor_plural);

                forms.push(one.clone() + singular.clone() + cents.clone());
                forms.push(other.clone() + plural.clone() + cents);
                forms.push(decimal_form.add_weight(DECIMAL_FORM_WEIGHT));
            }
            None => forms.push(decimal_form),
        }

        branches.push(prefix + Fst::union_all(forms));
    }

    let fst = optional_minus_graph() + Fst::union_all(branches);
    SubGrammar::classify("money", deterministic, fst)
}
