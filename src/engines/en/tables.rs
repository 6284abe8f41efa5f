use std::path::{Path, PathBuf};

use crate::tagged::escape;
use crate::NormalizeError;

/// `input -> output` pairs in file order.
pub type Table = Vec<(String, String)>;

/// Rows of `table` with each value escaped for a tag field.
pub fn escaped(table: &Table) -> impl Iterator<Item = (&str, String)> + '_ {
    table.iter().map(|(key, value)| (key.as_str(), escape(value)))
}

/// Every data table the English grammars read.
///
/// Defaults are compiled in from `data/`. [`Tables::load`] replaces any
/// table whose file exists under an override directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    pub digit: Table,
    pub zero: Table,
    pub teen: Table,
    pub ties: Table,
    pub roman_digit_teen: Table,
    pub roman_ties: Table,
    pub roman_hundreds: Table,
    pub measurements: Table,
    pub plurals: Table,
    pub currency: Table,
    pub currency_minor: Table,
    pub magnitudes: Table,
    pub fractions: Table,
    pub symbols: Table,
    pub domains: Table,
    pub server_names: Table,
    pub whitelist: Table,
}

impl Default for Tables {
    fn default() -> Self {
        // Embedded tables are checked by the tests below.
        Self::load(None).unwrap_or_else(|e| {
            log::warn!("Embedded tables failed to parse: {e}");
            Self::empty()
        })
    }
}

impl Tables {
    fn empty() -> Self {
        Self {
            digit: Vec::new(),
            zero: Vec::new(),
            teen: Vec::new(),
            ties: Vec::new(),
            roman_digit_teen: Vec::new(),
            roman_ties: Vec::new(),
            roman_hundreds: Vec::new(),
            measurements: Vec::new(),
            plurals: Vec::new(),
            currency: Vec::new(),
            currency_minor: Vec::new(),
            magnitudes: Vec::new(),
            fractions: Vec::new(),
            symbols: Vec::new(),
            domains: Vec::new(),
            server_names: Vec::new(),
            whitelist: Vec::new(),
        }
    }

    /// Load all tables, preferring files under `overrides` when present.
    pub fn load(overrides: Option<&Path>) -> Result<Self, NormalizeError> {
        let read = |name: &str, embedded: &str| -> Result<Table, NormalizeError> {
            if let Some(dir) = overrides {
                let path = dir.join(name);
                if path.exists() {
                    log::debug!("Loading table override {}", path.display());
                    let content = std::fs::read_to_string(&path)?;
                    return parse_table(&path, &content);
                }
            }
            parse_table(Path::new(name), embedded)
        };

        Ok(Self {
            digit: read("numbers/digit.tsv", include_str!("../../../data/numbers/digit.tsv"))?,
            zero: read("numbers/zero.tsv", include_str!("../../../data/numbers/zero.tsv"))?,
            teen: read("numbers/teen.tsv", include_str!("../../../data/numbers/teen.tsv"))?,
            ties: read("numbers/ties.tsv", include_str!("../../../data/numbers/ties.tsv"))?,
            roman_digit_teen: read(
                "roman/digit_teen.tsv",
                include_str!("../../../data/roman/digit_teen.tsv"),
            )?,
            roman_ties: read("roman/ties.tsv", include_str!("../../../data/roman/ties.tsv"))?,
            roman_hundreds: read(
                "roman/hundreds.tsv",
                include_str!("../../../data/roman/hundreds.tsv"),
            )?,
            measurements: read(
                "measurements.tsv",
                include_str!("../../../data/measurements.tsv"),
            )?,
            plurals: read("plurals.tsv", include_str!("../../../data/plurals.tsv"))?,
            currency: read(
                "currency/currency.tsv",
                include_str!("../../../data/currency/currency.tsv"),
            )?,
            currency_minor: read(
                "currency/currency_minor.tsv",
                include_str!("../../../data/currency/currency_minor.tsv"),
            )?,
            magnitudes: read("magnitudes.tsv", include_str!("../../../data/magnitudes.tsv"))?,
            fractions: read("fractions.tsv", include_str!("../../../data/fractions.tsv"))?,
            symbols: read(
                "electronic/symbols.tsv",
                include_str!("../../../data/electronic/symbols.tsv"),
            )?,
            domains: read(
                "electronic/domain.tsv",
                include_str!("../../../data/electronic/domain.tsv"),
            )?,
            server_names: read(
                "electronic/server_name.tsv",
                include_str!("../../../data/electronic/server_name.tsv"),
            )?,
            whitelist: read("whitelist.tsv", include_str!("../../../data/whitelist.tsv"))?,
        })
    }

    /// Lower-case every key, keeping the first entry when two keys collide.
    ///
    /// Whitelist keys may repeat with different readings, so there only
    /// identical rows collapse.
    pub fn lower_cased(&self) -> Self {
        let lower_by = |table: &Table, same_row: bool| -> Table {
            let mut out: Table = Vec::with_capacity(table.len());
            for (key, value) in table {
                let key = key.to_lowercase();
                if !out
                    .iter()
                    .any(|(k, v)| *k == key && (!same_row || v == value))
                {
                    out.push((key, value.clone()));
                }
            }
            out
        };
        let lower = |table: &Table| lower_by(table, false);
        Self {
            digit: lower(&self.digit),
            zero: lower(&self.zero),
            teen: lower(&self.teen),
            ties: lower(&self.ties),
            roman_digit_teen: lower(&self.roman_digit_teen),
            roman_ties: lower(&self.roman_ties),
            roman_hundreds: lower(&self.roman_hundreds),
            measurements: lower(&self.measurements),
            plurals: self.plurals.clone(),
            currency: lower(&self.currency),
            currency_minor: lower(&self.currency_minor),
            magnitudes: lower(&self.magnitudes),
            fractions: self.fractions.clone(),
            symbols: self.symbols.clone(),
            domains: lower(&self.domains),
            server_names: lower(&self.server_names),
            whitelist: lower_by(&self.whitelist, true),
        }
    }

    /// English plural of a unit or currency name.
    ///
    /// The irregular table wins; otherwise the usual suffix rules apply.
    pub fn pluralize(&self, singular: &str) -> String {
        if let Some((_, plural)) = self.plurals.iter().find(|(s, _)| s == singular) {
            return plural.clone();
        }
        let vowel = |c: char| "aeiou".contains(c);
        let mut chars = singular.chars().rev();
        match (chars.next(), chars.next()) {
            (Some('y'), Some(prev)) if !vowel(prev) => {
                format!("{}ies", &singular[..singular.len() - 1])
            }
            (Some('s' | 'x' | 'z'), _) | (Some('h'), Some('c' | 's')) => format!("{singular}es"),
            _ => format!("{singular}s"),
        }
    }

    /// Minor unit name for a currency symbol, if it has one.
    pub fn minor_currency(&self, symbol: &str) -> Option<&str> {
        self.currency_minor
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, minor)| minor.as_str())
    }
}

/// Parse `input<TAB>output` lines. Blank lines are skipped.
pub fn parse_table(file: &Path, content: &str) -> Result<Table, NormalizeError> {
    let mut table = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let malformed = |reason: &str| NormalizeError::TableLoad {
            file: PathBuf::from(file),
            line: i + 1,
            reason: reason.to_string(),
        };
        let mut parts = line.split('\t');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(""), Some(_), None) => return Err(malformed("empty input column")),
            (Some(input), Some(output), None) => {
                table.push((input.to_string(), output.to_string()))
            }
            (_, None, _) => return Err(malformed("missing tab separator")),
            _ => return Err(malformed("more than one tab separator")),
        }
    }
    Ok(table)
}
