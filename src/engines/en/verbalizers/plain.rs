use crate::grammar::{delete_field, unescaped_value, SubGrammar};

/// Whitelist, word and punct tokens read back their `name` unescaped.
pub fn build(name: &'static str, deterministic: bool) -> SubGrammar {
    SubGrammar::verbalize(name, deterministic, delete_field("name", unescaped_value()))
}
