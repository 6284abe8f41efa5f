//! Shared building blocks for classify and verbalize grammars.
//!
//! Taggers emit fields as `name: "value"` separated by single spaces and wrap
//! them as `class { ... }`. Verbalizers read back exactly that rendering, so
//! the field helpers here come in matching pairs: [`field`] / [`delete_field`].

use serde::{Deserialize, Serialize};

use crate::fst::{CharClass, Fst, Input, Output};

/// Which side of the pipeline a grammar belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarKind {
    Classify,
    Verbalize,
}

/// A named transducer for one semiotic class. Immutable once built.
#[derive(Debug, Clone)]
pub struct SubGrammar {
    pub name: &'static str,
    pub kind: GrammarKind,
    pub deterministic: bool,
    pub fst: Fst,
}

impl SubGrammar {
    pub fn classify(name: &'static str, deterministic: bool, fst: Fst) -> Self {
        Self {
            name,
            kind: GrammarKind::Classify,
            deterministic,
            fst,
        }
    }

    pub fn verbalize(name: &'static str, deterministic: bool, fst: Fst) -> Self {
        Self {
            name,
            kind: GrammarKind::Verbalize,
            deterministic,
            fst,
        }
    }

    /// The tagger wrapped as `name { ... }`.
    pub fn tokenized(&self) -> Fst {
        add_tokens(self.name, self.fst.clone())
    }
}

pub fn digit() -> Fst {
    Fst::class(CharClass::digit())
}

pub fn insert_space() -> Fst {
    Fst::insert(" ")
}

/// Zero or more whitespace characters, deleted.
pub fn delete_space() -> Fst {
    Fst::class_delete(CharClass::space()).closure()
}

/// One or more whitespace characters, collapsed to a single space.
pub fn delete_extra_space() -> Fst {
    Fst::class_delete(CharClass::space()).plus() + insert_space()
}

/// Optional leading `-`, tagged `negative: "true" `.
pub fn optional_minus_graph() -> Fst {
    (Fst::insert("negative: ") + Fst::cross("-", "\"true\" ")).optional()
}

/// Tagger side: `name: "<g>"`.
pub fn field(name: &str, g: Fst) -> Fst {
    Fst::insert(&format!("{name}: \"")) + g + Fst::insert("\"")
}

/// Wrap tagged fields as `class { <fields> }`.
pub fn add_tokens(class: &str, g: Fst) -> Fst {
    Fst::insert(&format!("{class} {{ ")) + g + Fst::insert(" }")
}

/// Verbalizer side: consume `name: "`, apply `g` to the value, consume `"`.
pub fn delete_field(name: &str, g: Fst) -> Fst {
    Fst::delete(&format!("{name}: \"")) + g + Fst::delete("\"")
}

/// Verbalizer side: the single space between two fields, kept as the space
/// between the words they read as.
pub fn separator() -> Fst {
    Fst::accep(" ")
}

/// Verbalizer side: consume a whole field without reading it.
pub fn skip_field(name: &str) -> Fst {
    let value = Fst::class_delete(CharClass::any().without(&['"', '\\']))
        | Fst::delete("\\\"")
        | Fst::delete("\\\\");
    delete_field(name, value.closure())
}

/// Verbalizer side: `negative: "true" ` read as `minus `.
pub fn optional_sign() -> Fst {
    Fst::cross("negative: \"true\" ", "minus ").optional()
}

/// Any escaped field value, unescaped.
pub fn unescaped_value() -> Fst {
    let plain = Fst::class(CharClass::any().without(&['"', '\\']));
    let quote = Fst::cross("\\\"", "\"");
    let backslash = Fst::cross("\\\\", "\\");
    Fst::union_all([plain, quote, backslash]).closure()
}

/// One or more characters of `class`, copied, except exactly `literal`.
pub fn not_exactly(class: CharClass, literal: &str) -> Fst {
    let literal: Vec<char> = literal.chars().collect();
    let mut fst = Fst::empty();

    // States 0..=len track a matching prefix of `literal`; `other` has diverged.
    let mut prefix = vec![fst.start()];
    for _ in 0..literal.len() {
        prefix.push(fst.add_state());
    }
    let other = fst.add_state();

    for (i, &ch) in literal.iter().enumerate() {
        if class.contains(ch) {
            fst.add_edge(prefix[i], Input::Char(ch), Output::Copy, 0.0, prefix[i + 1]);
        }
        let rest = class.clone().without(&[ch]);
        fst.add_edge(prefix[i], Input::Class(rest), Output::Copy, 0.0, other);
    }
    fst.add_edge(
        prefix[literal.len()],
        Input::Class(class.clone()),
        Output::Copy,
        0.0,
        other,
    );
    fst.add_edge(other, Input::Class(class), Output::Copy, 0.0, other);

    for &state in prefix.iter().skip(1).take(literal.len().saturating_sub(1)) {
        fst.set_final(state, Some(0.0));
    }
    fst.set_final(other, Some(0.0));
    fst
}
