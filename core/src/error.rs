use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store read failed with status {status}: {body}")]
    StoreRead { status: u16, body: String },

    #[error("malformed page from {source_name}: {details}")]
    Decode { source_name: String, details: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Raised only when the error policy is `abort`; under `continue` the same
    /// conditions are logged and the run degrades instead.
    pub fn is_policy_abort(&self) -> bool {
        matches!(self, Error::StoreRead { .. } | Error::Decode { .. })
    }
}
