/// Errors raised while loading reference data or talking to a classifier.
///
/// Scoring and aggregation never fail: unknown symptoms, empty profiles and
/// lookup misses all degrade to empty results. Only the data-loading seams and
/// the classifier collaborator produce errors.

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("missing column '{column}' in {path}")]
    MissingColumn { path: String, column: String },

    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid override rules: {0}")]
    Overrides(String),

    #[error("classifier error: {0}")]
    Classifier(String),

    #[error("classifier schema mismatch: classifier expects {expected}, vocabulary is {actual}")]
    SchemaMismatch { expected: String, actual: String },
}
