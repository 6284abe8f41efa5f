//! Classify grammars, one per semiotic class. Each accepts only its own
//! domain and emits the class's fields in schema order.

pub mod cardinal;
pub mod decimal;
pub mod electronic;
pub mod fraction;
pub mod measure;
pub mod money;
pub mod whitelist;
pub mod word;

pub use cardinal::CardinalTagger;
pub use decimal::DecimalTagger;
