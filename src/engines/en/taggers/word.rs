use crate::fst::{CharClass, Fst, DIGIT, LOWER, OTHER, UPPER};
use crate::grammar::{field, SubGrammar};

fn escaped(chars: CharClass) -> Fst {
    Fst::class(chars.without(&['"', '\\'])) | Fst::cross("\"", "\\\"") | Fst::cross("\\", "\\\\")
}

/// Catch-all for a run of non-space characters that neither starts nor ends
/// with punctuation, e.g. `hello` -> `word { name: "hello" }`.
pub fn word(deterministic: bool) -> SubGrammar {
    let edge = Fst::class(CharClass::of(DIGIT | UPPER | LOWER | OTHER));
    let inner = escaped(CharClass::not_space());
    let fst = edge.clone() + (inner.closure() + edge).optional();
    SubGrammar::classify("word", deterministic, field("name", fst))
}

/// A single punctuation character, e.g. `,` -> `punct { name: "," }`.
pub fn punctuation(deterministic: bool) -> SubGrammar {
    SubGrammar::classify("punct", deterministic, field("name", escaped(CharClass::punct())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(grammar: SubGrammar, input: &str) -> Option<String> {
        grammar
            .fst
            .compile()
            .unwrap()
            .shortest_path(input)
            .map(|p| p.output)
    }

    #[test]
    fn words_exclude_edge_punctuation() {
        assert_eq!(run(word(true), "hello").as_deref(), Some("name: \"hello\""));
        assert_eq!(run(word(true), "don't").as_deref(), Some("name: \"don't\""));
        assert_eq!(run(word(true), "x").as_deref(), Some("name: \"x\""));
        assert_eq!(run(word(true), "hello,"), None);
        assert_eq!(run(word(true), "(hi"), None);
        assert_eq!(run(word(true), "two words"), None);
    }

    #[test]
    fn inner_quotes_are_escaped() {
        assert_eq!(
            run(word(true), r#"a"b\c"#).as_deref(),
            Some(r#"name: "a\"b\\c""#)
        );
    }

    #[test]
    fn punctuation_is_single_char() {
        assert_eq!(run(punctuation(true), "\"").as_deref(), Some(r#"name: "\"""#));
        assert_eq!(run(punctuation(true), ",").as_deref(), Some("name: \",\""));
        assert_eq!(run(punctuation(true), ",,"), None);
        assert_eq!(run(punctuation(true), "a"), None);
    }
}
