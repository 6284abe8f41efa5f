use crate::fst::{CharClass, Fst};
use crate::grammar::{
    delete_field, not_exactly, optional_sign, separator, unescaped_value, SubGrammar,
};

/// `integer_part: "twenty three" numerator: "four" denominator: "five"`
/// -> `twenty three and four slash five`
///
/// A `NONE` denominator means the numerator already holds the whole fraction;
/// it reads as nothing and drops the `slash`.
pub fn build(deterministic: bool) -> SubGrammar {
    let integer = delete_field("integer_part", unescaped_value()) + separator() + Fst::insert("and ");
    let numerator = delete_field("numerator", unescaped_value());

    let value = not_exactly(CharClass::any().without(&['"', '\\']), "NONE");
    let denominator = Fst::delete(" ")
        + (Fst::insert(" slash ") + delete_field("denominator", value)
            | delete_field("denominator", Fst::delete("NONE")));

    let fst = optional_sign() + integer.optional() + numerator + denominator;
    SubGrammar::verbalize("fraction", deterministic, fst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> Option<String> {
        build(true)
            .fst
            .compile()
            .unwrap()
            .shortest_path(input)
            .map(|p| p.output)
    }

    #[test]
    fn mixed_number() {
        assert_eq!(
            read("integer_part: \"twenty three\" numerator: \"four\" denominator: \"five\"")
                .as_deref(),
            Some("twenty three and four slash five")
        );
    }

    #[test]
    fn none_denominator_collapses() {
        assert_eq!(
            read("numerator: \"4/5\" denominator: \"NONE\"").as_deref(),
            Some("4/5")
        );
    }

    #[test]
    fn fixed_field_order() {
        assert_eq!(
            read("numerator: \"four\" integer_part: \"one\" denominator: \"five\""),
            None
        );
    }
}
