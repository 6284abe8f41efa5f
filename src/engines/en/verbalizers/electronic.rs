use crate::engines::en::tables::Tables;
use crate::fst::{CharClass, Fst, OTHER, PUNCT};
use crate::grammar::{delete_field, insert_space, separator, SubGrammar};

/// Known server names and domain suffixes read as words.
pub(crate) const WHOLE_WORD_WEIGHT: f32 = -0.1;

/// `username: "cdf1" domain: "abc.edu"` -> `c d f one at a b c dot e d u`
///
/// Every character is spelled: letters as themselves, digits as words and
/// symbols by name.
pub fn build(tables: &Tables, deterministic: bool) -> SubGrammar {
    let symbol_chars: Vec<char> = tables
        .symbols
        .iter()
        .filter_map(|(symbol, _)| {
            let mut chars = symbol.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        })
        .chain(['"', '\\'])
        .collect();

    let letter = Fst::class(CharClass::alpha());
    let digit = Fst::string_map(tables.digit.iter().chain(&tables.zero).cloned());
    let symbol = Fst::string_map(tables.symbols.iter().cloned());
    let other = Fst::class(CharClass::of(PUNCT | OTHER).without(&symbol_chars));
    let ch = Fst::union_all([letter, digit, symbol, other]);
    let spelled = ch.clone() + (insert_space() + ch.clone()).closure();

    let item = Fst::union_all([
        ch,
        Fst::string_map(tables.server_names.iter().cloned()).add_weight(WHOLE_WORD_WEIGHT),
        Fst::string_map(tables.domains.iter().cloned()).add_weight(WHOLE_WORD_WEIGHT),
    ]);
    let domain = item.clone() + (insert_space() + item).closure();

    let protocol = delete_field("protocol", spelled.clone()) + separator();
    let username = delete_field("username", spelled) + separator() + Fst::insert("at ");
    let fst = protocol.optional() + username.optional() + delete_field("domain", domain);

    SubGrammar::verbalize("electronic", deterministic, fst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> Option<String> {
        build(&Tables::default(), true)
            .fst
            .compile()
            .unwrap()
            .shortest_path(input)
            .map(|p| p.output)
    }

    #[test]
    fn email_is_spelled() {
        assert_eq!(
            read("username: \"cdf1\" domain: \"abc.edu\"").as_deref(),
            Some("c d f one at a b c dot e d u")
        );
    }

    #[test]
    fn known_names_read_whole() {
        assert_eq!(
            read("username: \"jo\" domain: \"gmail.com\"").as_deref(),
            Some("j o at gmail dot com")
        );
    }

    #[test]
    fn protocol_and_ids() {
        assert_eq!(
            read("protocol: \"http://\" domain: \"x.org\"").as_deref(),
            Some("h t t p colon slash slash x dot org")
        );
        assert_eq!(
            read("domain: \"10.0.0.1\"").as_deref(),
            Some("one zero dot zero dot zero dot one")
        );
    }
}
