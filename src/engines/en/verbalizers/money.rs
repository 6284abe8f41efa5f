use crate::fst::Fst;
use crate::grammar::{
    delete_field, optional_sign, separator, skip_field, unescaped_value, SubGrammar,
};

/// "zero dollars and five cents" is read as just "five cents".
pub(crate) const ELISION_WEIGHT: f32 = -0.5;
/// "twelve dollars five cents", offered in n-best mode.
const NO_AND_WEIGHT: f32 = 0.5;

/// `integer_part: "twelve" currency: "dollars" cents: "five" minor_currency: "cents"`
/// -> `twelve dollars and five cents`
pub fn build(deterministic: bool) -> SubGrammar {
    let integer = delete_field("integer_part", unescaped_value());
    let fractional = (separator()
        + delete_field("fractional_part", Fst::insert("point ") + unescaped_value()))
    .optional();
    let quantity = (separator() + delete_field("quantity", unescaped_value())).optional();
    let currency = separator() + delete_field("currency", unescaped_value());
    let minor = delete_field("cents", unescaped_value())
        + separator()
        + delete_field("minor_currency", unescaped_value());
    let cents = (separator() + Fst::insert("and ") + minor.clone()).optional();

    let mut forms = vec![
        optional_sign() + integer.clone() + fractional + quantity + currency.clone() + cents,
        (optional_sign()
            + Fst::delete("integer_part: \"zero\" ")
            + skip_field("currency")
            + Fst::delete(" ")
            + minor.clone())
        .add_weight(ELISION_WEIGHT),
    ];
    if !deterministic {
        forms.push(
            (optional_sign() + integer + currency + separator() + minor).add_weight(NO_AND_WEIGHT),
        );
    }

    SubGrammar::verbalize("money", deterministic, Fst::union_all(forms))
}
