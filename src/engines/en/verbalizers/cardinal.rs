use crate::grammar::{delete_field, optional_sign, unescaped_value, SubGrammar};

/// `negative: "true" integer: "twenty three"` -> `minus twenty three`
pub fn build(deterministic: bool) -> SubGrammar {
    let fst = optional_sign() + delete_field("integer", unescaped_value());
    SubGrammar::verbalize("cardinal", deterministic, fst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_sign_and_integer() {
        let fst = build(true).fst.compile().unwrap();
        let read = |input: &str| fst.shortest_path(input).map(|p| p.output);
        assert_eq!(
            read("negative: \"true\" integer: \"twenty three\"").as_deref(),
            Some("minus twenty three")
        );
        assert_eq!(read("integer: \"four\"").as_deref(), Some("four"));
        assert_eq!(read("numerator: \"four\""), None);
    }
}
