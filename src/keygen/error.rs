use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("Key generation failed: {0}")]
    GenerationFailure(String),

    #[error("Key format error: {0}")]
    FormatError(String),

    #[error("Key parse error: {0}")]
    ParseError(String),
}

impl From<std::io::Error> for KeyError {
    fn from(e: std::io::Error) -> Self {
        KeyError::FormatError(e.to_string())
    }
}
