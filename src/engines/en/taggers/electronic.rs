use crate::engines::en::tables::Tables;
use crate::fst::{CharClass, Fst};
use crate::grammar::{digit, field, insert_space, SubGrammar};

const PROTOCOL_WEIGHT: f32 = -0.1;

/// Emails, URLs and dotted numeric ids. Values are kept as written; the
/// verbalizer does the spelling.
///
/// ```text
/// cdf1@abc.edu         -> electronic { username: "cdf1" domain: "abc.edu" }
/// https://www.abc.com  -> electronic { protocol: "https://www." domain: "abc.com" }
/// 192.168.0.1          -> electronic { domain: "192.168.0.1" }
/// ```
pub fn build(tables: &Tables, deterministic: bool) -> SubGrammar {
    let symbol_chars: Vec<char> = tables
        .symbols
        .iter()
        .filter_map(|(symbol, _)| {
            let mut chars = symbol.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !matches!(c, '"' | '\\' | '@') => Some(c),
                _ => None,
            }
        })
        .collect();
    let symbol = Fst::union_all(symbol_chars.iter().map(|c| Fst::accep(&c.to_string())));

    // Starts with a letter and ends with a letter or digit, so trailing
    // sentence punctuation stays outside.
    let alpha = Fst::class(CharClass::alpha());
    let alnum = alpha.clone() | digit();
    let name = alpha.clone()
        + (Fst::union_all([alnum.clone(), symbol]).closure() + alnum).optional();

    let dotted = name.clone() + Fst::accep(".") + name.clone();
    let common = name.clone()
        + Fst::union_all(tables.domains.iter().map(|(domain, _)| Fst::accep(domain)));

    let email = field("username", name) + Fst::cross("@", " ") + field("domain", dotted.clone());

    // Each recognized protocol part is preferred over leaving it in the domain.
    let protocol_start =
        (Fst::accep("https://") | Fst::accep("http://")).add_weight(PROTOCOL_WEIGHT);
    let www = Fst::accep("www.").add_weight(PROTOCOL_WEIGHT);
    let protocol = protocol_start + www.clone().optional() | www;
    let url = (field("protocol", protocol) + insert_space()).optional()
        + field("domain", dotted | common);

    let group = digit().repeat(1, Some(3));
    let id = group.clone()
        + Fst::accep(".")
        + group.clone()
        + Fst::accep(".")
        + group.clone()
        + Fst::accep(".")
        + group;

    let fst = Fst::union_all([email, url, field("domain", id)]);
    SubGrammar::classify("electronic", deterministic, fst)
}
