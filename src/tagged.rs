//! The tagged intermediate representation between classify and verbalize.
//!
//! The classifier emits space-joined blocks:
//!
//! ```text
//! tokens { money { integer_part: "twelve" currency: "dollars" cents: "five" minor_currency: "cents" } }
//! ```
//!
//! Values escape `"` as `\"` and `\` as `\\`. [`parse`] turns such a string
//! into [`TaggedToken`]s and checks every block against its class schema.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::NormalizeError;

/// The fixed set of classes a span can be tagged with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SemioticClass {
    Cardinal,
    Decimal,
    Fraction,
    Measure,
    Money,
    Electronic,
    Whitelist,
    Word,
    Punct,
}

/// One entry of a class schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn opt(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        required: false,
    }
}

const fn req(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        required: true,
    }
}

const CARDINAL: &[FieldSpec] = &[opt("negative"), req("integer")];
const DECIMAL: &[FieldSpec] = &[
    opt("negative"),
    opt("integer_part"),
    opt("fractional_part"),
    opt("quantity"),
];
const FRACTION: &[FieldSpec] = &[
    opt("negative"),
    opt("integer_part"),
    req("numerator"),
    req("denominator"),
];
const MEASURE: &[FieldSpec] = &[
    opt("negative"),
    opt("integer"),
    opt("integer_part"),
    opt("fractional_part"),
    req("units"),
];
const MONEY: &[FieldSpec] = &[
    opt("negative"),
    req("integer_part"),
    opt("fractional_part"),
    opt("quantity"),
    req("currency"),
    opt("cents"),
    opt("minor_currency"),
];
const ELECTRONIC: &[FieldSpec] = &[opt("protocol"), opt("username"), req("domain")];
const NAME_ONLY: &[FieldSpec] = &[req("name")];

impl SemioticClass {
    pub const ALL: [SemioticClass; 9] = [
        SemioticClass::Cardinal,
        SemioticClass::Decimal,
        SemioticClass::Fraction,
        SemioticClass::Measure,
        SemioticClass::Money,
        SemioticClass::Electronic,
        SemioticClass::Whitelist,
        SemioticClass::Word,
        SemioticClass::Punct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemioticClass::Cardinal => "cardinal",
            SemioticClass::Decimal => "decimal",
            SemioticClass::Fraction => "fraction",
            SemioticClass::Measure => "measure",
            SemioticClass::Money => "money",
            SemioticClass::Electronic => "electronic",
            SemioticClass::Whitelist => "whitelist",
            SemioticClass::Word => "word",
            SemioticClass::Punct => "punct",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Fields in the order they must appear.
    pub fn schema(&self) -> &'static [FieldSpec] {
        match self {
            SemioticClass::Cardinal => CARDINAL,
            SemioticClass::Decimal => DECIMAL,
            SemioticClass::Fraction => FRACTION,
            SemioticClass::Measure => MEASURE,
            SemioticClass::Money => MONEY,
            SemioticClass::Electronic => ELECTRONIC,
            SemioticClass::Whitelist | SemioticClass::Word | SemioticClass::Punct => NAME_ONLY,
        }
    }
}

impl fmt::Display for SemioticClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `tokens { ... }` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedToken {
    pub class: SemioticClass,
    /// Unescaped values, in schema order.
    pub fields: Vec<(String, String)>,
    /// Char range of the whole block within the tagged string.
    pub tag_span: Range<usize>,
}

impl TaggedToken {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// The canonical `field: "value" field: "value"` rendering verbalizers read.
    pub fn render_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| format!("{name}: \"{}\"", escape(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Parse a tagged string into tokens. Offsets in errors are char offsets.
pub fn parse(tagged: &str) -> Result<Vec<TaggedToken>, NormalizeError> {
    let mut parser = Parser {
        chars: tagged.chars().collect(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    parser.skip_space();
    while !parser.at_end() {
        tokens.push(parser.token()?);
        parser.skip_space();
    }
    Ok(tokens)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_space(&mut self) {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
    }

    fn error_at(&self, offset: usize, reason: impl Into<String>) -> NormalizeError {
        NormalizeError::MalformedTag {
            offset,
            reason: reason.into(),
        }
    }

    fn expect(&mut self, want: char) -> Result<(), NormalizeError> {
        match self.peek() {
            Some(ch) if ch == want => {
                self.pos += 1;
                Ok(())
            }
            Some(ch) => Err(self.error_at(self.pos, format!("expected {want:?}, found {ch:?}"))),
            None if want == '}' => Err(self.error_at(self.pos, "unbalanced braces: missing '}'")),
            None => Err(self.error_at(self.pos, format!("expected {want:?}, found end of input"))),
        }
    }

    fn ident(&mut self) -> Result<String, NormalizeError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some('}') => self.error_at(start, "unbalanced braces: unexpected '}'"),
                Some(ch) => self.error_at(start, format!("expected a name, found {ch:?}")),
                None => self.error_at(start, "expected a name, found end of input"),
            });
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn quoted(&mut self) -> Result<String, NormalizeError> {
        let open = self.pos;
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at(open, "unterminated quote")),
                Some('"') => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('\\') => {
                    match self.chars.get(self.pos + 1) {
                        Some(&c) if c == '"' || c == '\\' => value.push(c),
                        Some(&c) => {
                            return Err(self.error_at(self.pos, format!("invalid escape \\{c}")))
                        }
                        None => return Err(self.error_at(open, "unterminated quote")),
                    }
                    self.pos += 2;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn token(&mut self) -> Result<TaggedToken, NormalizeError> {
        let start = self.pos;
        let keyword = self.ident()?;
        if keyword != "tokens" {
            return Err(self.error_at(start, format!("expected `tokens`, found {keyword:?}")));
        }
        self.skip_space();
        self.expect('{')?;
        self.skip_space();

        let class_at = self.pos;
        let name = self.ident()?;
        let class = SemioticClass::from_name(&name)
            .ok_or_else(|| self.error_at(class_at, format!("unknown class {name:?}")))?;
        self.skip_space();
        self.expect('{')?;

        let schema = class.schema();
        let mut fields = Vec::new();
        let mut next_slot = 0;
        loop {
            self.skip_space();
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.error_at(self.pos, "unbalanced braces: missing '}'")),
                _ => {}
            }

            let field_at = self.pos;
            let field = self.ident()?;
            let slot = schema
                .iter()
                .position(|spec| spec.name == field)
                .ok_or_else(|| {
                    self.error_at(field_at, format!("unknown field {field:?} for {class}"))
                })?;
            if slot + 1 == next_slot {
                return Err(self.error_at(field_at, format!("duplicate field {field:?}")));
            }
            if slot < next_slot {
                return Err(self.error_at(
                    field_at,
                    format!("field {field:?} out of order for {class}"),
                ));
            }
            next_slot = slot + 1;

            self.expect(':')?;
            self.skip_space();
            let value = self.quoted()?;
            fields.push((field, value));
        }

        self.skip_space();
        self.expect('}')?;

        for spec in schema.iter().filter(|spec| spec.required) {
            if !fields.iter().any(|(name, _)| name == spec.name) {
                return Err(self.error_at(
                    start,
                    format!("{class} is missing required field {:?}", spec.name),
                ));
            }
        }

        Ok(TaggedToken {
            class,
            fields,
            tag_span: start..self.pos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, SemioticClass};
    use crate::NormalizeError;

    fn reason(tagged: &str) -> String {
        match parse(tagged) {
            Err(NormalizeError::MalformedTag { reason, .. }) => reason,
            other => panic!("expected MalformedTag, got {other:?}"),
        }
    }

    #[test]
    fn parses_blocks_in_order() {
        let tokens = parse(
            r#"tokens { cardinal { negative: "true" integer: "twenty three" } } tokens { punct { name: "." } }"#,
        )
        .unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].class, SemioticClass::Cardinal);
        assert_eq!(tokens[0].get("negative"), Some("true"));
        assert_eq!(tokens[0].get("integer"), Some("twenty three"));
        assert_eq!(tokens[1].class, SemioticClass::Punct);
        assert_eq!(tokens[1].tag_span.start, tokens[0].tag_span.end + 1);
    }

    #[test]
    fn unescapes_and_re_renders() {
        let tokens = parse(r#"tokens { word { name: "a\"b\\" } }"#).unwrap();
        assert_eq!(tokens[0].get("name"), Some(r#"a"b\"#));
        assert_eq!(tokens[0].render_fields(), r#"name: "a\"b\\""#);
    }

    #[test]
    fn rejects_out_of_order_fraction_fields() {
        let tagged = r#"tokens { fraction { numerator: "four" integer_part: "one" denominator: "five" } }"#;
        assert!(reason(tagged).contains("out of order"));
    }

    #[test]
    fn rejects_duplicates_and_missing_fields() {
        assert!(reason(r#"tokens { cardinal { integer: "one" integer: "two" } }"#)
            .contains("duplicate"));
        assert!(reason(r#"tokens { fraction { numerator: "one" } }"#).contains("missing"));
    }

    #[test]
    fn rejects_structural_errors() {
        assert!(reason(r#"tokens { word { name: "x" }"#).contains("unbalanced"));
        assert!(reason(r#"tokens { word { name: "x } }"#).contains("unterminated"));
        assert!(reason(r#"tokens { verb { name: "x" } }"#).contains("unknown class"));
        assert!(reason(r#"tokens { word { label: "x" } }"#).contains("unknown field"));
        assert!(reason(r#"tokens { word { name: "x" } } }"#).contains("unbalanced"));
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   ").unwrap().is_empty());
    }
}
