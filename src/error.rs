#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("transaction record has no account key table")]
    MissingAccountKeys,

    #[error("invalid error rule pattern `{pattern}`: {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid program id: {address}")]
    InvalidProgramId { address: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
