//! Verbalize grammars, one per semiotic class. Each reads the canonical
//! `field: "value" field: "value"` rendering of a token and emits spoken text.

pub mod cardinal;
pub mod decimal;
pub mod electronic;
pub mod fraction;
pub mod measure;
pub mod money;
pub mod plain;
