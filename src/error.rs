use thiserror::Error;

/// Everything that can abort report generation.
///
/// Field-level parse failures are deliberately NOT in here: the `*_safe`
/// parsers in `util` coerce bad values to `None` and the aggregations skip
/// them. Only structural problems (unreadable file, missing column, a case
/// id that survives sentinel filtering but is not numeric) surface as errors.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{file} is missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("cannot parse {field} value '{value}'")]
    DataFormat { field: &'static str, value: String },

    #[error("no rows match role '{role}' and clinician '{clinician}'")]
    EmptySelection { role: String, clinician: String },
}
