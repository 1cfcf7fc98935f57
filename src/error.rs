use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing credential: set the {0} environment variable")]
    MissingCredential(String),

    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("completion error: {0}")]
    Completion(String),

    #[error("prompt error: {0}")]
    Prompt(String),

    #[error("guidelines error: {0}")]
    Guidelines(String),
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::Spreadsheet(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
