use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed table {}:{line}: {reason}", file.display())]
    TableLoad {
        file: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("grammar construction failed: {0}")]
    GrammarBuild(String),
    #[error("no classification path accepts {0:?}")]
    NoMatch(String),
    #[error("malformed tagged string at offset {offset}: {reason}")]
    MalformedTag { offset: usize, reason: String },
    #[error("no {class} verbalization for fields {fields:?}")]
    UnverbalizableToken {
        class: String,
        fields: Vec<(String, String)>,
    },
    #[error("grammar cache error: {0}")]
    Cache(#[from] bincode::Error),
    #[error("grammars not loaded. Call load_grammars() first.")]
    GrammarsNotLoaded,
}
