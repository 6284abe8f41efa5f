use std::sync::Arc;

use crate::engines::en::tables::{escaped, Tables};
use crate::fst::{CharClass, Fst, DIGIT, PUNCT, SPACE};
use crate::grammar::{digit, field, insert_space, not_exactly, optional_minus_graph, SubGrammar};
use crate::CasePolicy;

/// Serial numbers only win when nothing more specific matches.
const SERIAL_WEIGHT: f32 = 10.0;
/// Digit-by-digit reading of a short number, offered in n-best mode.
const SPELLED_SHORT_WEIGHT: f32 = 1.0;

/// Cardinal numbers, e.g.
///
/// ```text
/// 123,454 -> cardinal { integer: "one two three four five four" }
/// -23     -> cardinal { negative: "true" integer: "twenty three" }
/// IV      -> cardinal { integer: "four" }
/// B12-C   -> cardinal { integer: "B one two C" }
/// ```
///
/// The pieces other taggers need are kept as shared graphs so every consumer
/// spells digits the same way.
pub struct CardinalTagger {
    /// One or more digits, each spelled, space separated.
    pub single_digits: Arc<Fst>,
    /// 0 and 1 to 9999 without leading zeros, as number names.
    pub names: Arc<Fst>,
    /// Any unsigned integer: long numbers spelled, short ones named.
    pub integer: Arc<Fst>,
    /// [`CardinalTagger::integer`] restricted to inputs other than `1`.
    pub integer_not_one: Arc<Fst>,
    pub grammar: SubGrammar,
}

impl CardinalTagger {
    pub fn new(tables: &Tables, case_policy: CasePolicy, deterministic: bool) -> Self {
        let single_digit = Fst::string_map(escaped(&tables.digit).chain(escaped(&tables.zero)));
        let single_digits =
            Arc::new(single_digit.clone() + (insert_space() + single_digit).closure());

        let names = Arc::new(number_names(tables));

        // 5+ digits, or 1-3 digits followed by comma- or space-separated groups of 3.
        let separator = Fst::delete(",") | Fst::delete(" ");
        let long_filter = digit().repeat(5, None)
            | digit().repeat(1, Some(3)) + (separator + digit().repeat(3, Some(3))).plus();
        let long = long_filter.compose(&single_digits);

        let zero_led = (Fst::accep("0") + digit().repeat(1, Some(3))).compose(&single_digits);

        let mut integer = Fst::union_all([long, (*names).clone(), zero_led]);
        if !deterministic {
            let spelled = digit().repeat(1, Some(4)).compose(&single_digits);
            integer = integer | spelled.add_weight(SPELLED_SHORT_WEIGHT);
        }
        let integer = Arc::new(integer);
        let integer_not_one = Arc::new(
            not_exactly(CharClass::of(DIGIT | PUNCT | SPACE), "1").compose(&integer),
        );

        let mut body = (*integer).clone() | serial(&single_digits, case_policy);
        if case_policy == CasePolicy::Cased {
            body = body | roman(tables, &names);
        }
        let fst = optional_minus_graph() + field("integer", body);

        Self {
            single_digits,
            names,
            integer,
            integer_not_one,
            grammar: SubGrammar::classify("cardinal", deterministic, fst),
        }
    }
}

/// Number names for 0 and 1..=9999.
fn number_names(tables: &Tables) -> Fst {
    let digit = Fst::string_map(escaped(&tables.digit));
    let zero = Fst::string_map(escaped(&tables.zero));
    let teen = Fst::string_map(escaped(&tables.teen));
    let ties = Fst::string_map(escaped(&tables.ties));

    let two_digits = Fst::union_all([
        teen,
        ties.clone() + Fst::delete("0"),
        ties + insert_space() + digit.clone(),
    ]);
    // "05" inside a larger number reads as "five".
    let below_hundred = two_digits.clone() | Fst::delete("0") + digit.clone();

    let hundreds = digit.clone()
        + Fst::insert(" hundred")
        + (Fst::delete("00") | insert_space() + below_hundred);

    let thousands = digit.clone()
        + Fst::insert(" thousand")
        + Fst::union_all([
            Fst::delete("000"),
            insert_space() + hundreds.clone(),
            Fst::delete("0") + insert_space() + two_digits.clone(),
            Fst::delete("00") + insert_space() + digit.clone(),
        ]);

    Fst::union_all([zero, digit, two_digits, hundreds, thousands])
}

/// Letters, digits and dashes spelled out; needs at least one letter and one digit.
fn serial(single_digits: &Fst, case_policy: CasePolicy) -> Fst {
    let alpha = match case_policy {
        CasePolicy::Cased => Fst::class(CharClass::upper()),
        CasePolicy::LowerCased => Fst::class(CharClass::lower()),
    };
    let num = single_digits.clone();
    let delimiter = insert_space() | Fst::cross("-", " ");
    let either = alpha.clone() | num.clone();

    let letter_num = (alpha.clone() + delimiter.clone()).plus() + num.clone();
    let num_letter = (num + delimiter.clone()).plus() + alpha;
    let rest = (delimiter + either).closure();

    ((letter_num | num_letter) + rest).add_weight(SERIAL_WEIGHT)
}

/// Upper-case roman numerals up to 999, except a bare `I`, with an optional trailing dot.
fn roman(tables: &Tables, names: &Fst) -> Fst {
    let part = |table: &Vec<(String, String)>| {
        Fst::string_map(table.iter().map(|(k, v)| (k.to_uppercase(), v.clone()))).compose(names)
    };
    let digit_teen = part(&tables.roman_digit_teen);
    let ties = part(&tables.roman_ties);
    let hundreds = part(&tables.roman_hundreds);

    let core = Fst::union_all([
        hundreds
            + (insert_space() + ties.clone()).optional()
            + (insert_space() + digit_teen.clone()).optional(),
        ties + (insert_space() + digit_teen.clone()).optional(),
        digit_teen,
    ]);

    not_exactly(CharClass::upper(), "I").compose(&core) + Fst::delete(".").optional()
}
