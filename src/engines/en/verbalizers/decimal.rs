use crate::fst::Fst;
use crate::grammar::{delete_field, optional_sign, separator, unescaped_value, SubGrammar};

/// `integer_part: "three" fractional_part: "one four"` -> `three point one four`
/// `integer_part: "one" quantity: "billion"` -> `one billion`
pub fn build(deterministic: bool) -> SubGrammar {
    let integer = delete_field("integer_part", unescaped_value());
    let fractional = delete_field("fractional_part", Fst::insert("point ") + unescaped_value());
    let quantity = (separator() + delete_field("quantity", unescaped_value())).optional();

    let fst = optional_sign()
        + (integer + (separator() + fractional.clone()).optional() + quantity.clone()
            | fractional + quantity);
    SubGrammar::verbalize("decimal", deterministic, fst)
}
