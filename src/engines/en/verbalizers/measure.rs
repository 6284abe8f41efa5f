use crate::fst::Fst;
use crate::grammar::{delete_field, optional_sign, separator, unescaped_value, SubGrammar};

/// `negative: "true" integer: "twelve" units: "kilometers"` -> `minus twelve kilometers`
/// `integer_part: "one" fractional_part: "five" units: "meters"` -> `one point five meters`
pub fn build(deterministic: bool) -> SubGrammar {
    let decimal = (delete_field("integer_part", unescaped_value()) + separator()).optional()
        + delete_field("fractional_part", Fst::insert("point ") + unescaped_value());
    let magnitude = delete_field("integer", unescaped_value()) | decimal;
    let units = delete_field("units", unescaped_value());

    let fst = optional_sign() + magnitude + separator() + units.clone() | units;
    SubGrammar::verbalize("measure", deterministic, fst)
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
    fn magnitudes_and_units() {
        assert_eq!(
            read("negative: \"true\" integer: \"twelve\" units: \"kilometers\"").as_deref(),
            Some("minus twelve kilometers")
        );
        assert_eq!(
            read("integer_part: \"one\" fractional_part: \"five\" units: \"meters\"").as_deref(),
            Some("one point five meters")
        );
        assert_eq!(read("units: \"per kilogram\"").as_deref(), Some("per kilogram"));
    }
}
