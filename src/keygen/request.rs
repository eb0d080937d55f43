use std::collections::HashMap;
use crate::keygen::config::{DEFAULT_KEY_TYPE, DEFAULT_USERNAME, KEY_KEYLEN, KEY_TYPE_NAME, KEY_USERNAME};
use crate::keygen::error::KeyError;
use crate::keygen::keys::KeyAlgorithm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRequest {
    pub algorithm: KeyAlgorithm,
    /// `<= 0` selects the algorithm default.
    pub bits: i64,
    pub comment: String,
}

impl Default for KeyRequest {
    fn default() -> Self {
        Self {
            algorithm: KeyAlgorithm::Dsa,
            bits: 0,
            comment: DEFAULT_USERNAME.clone(),
        }
    }
}

impl KeyRequest {
    pub fn new(algorithm: KeyAlgorithm, bits: i64, comment: &str) -> Self {
        Self { algorithm, bits, comment: comment.to_string() }
    }

    /// Reads `key-type`, `key-bits` and `key-username`; missing entries take
    /// their defaults.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, KeyError> {
        let algorithm = options
            .get(KEY_TYPE_NAME)
            .map(String::as_str)
            .unwrap_or(DEFAULT_KEY_TYPE)
            .parse::<KeyAlgorithm>()?;
        let bits = match options.get(KEY_KEYLEN) {
            Some(s) => s.trim().parse::<i64>()
                .map_err(|_| KeyError::GenerationFailure(format!(
                    "invalid request: {} value {:?} is not an integer", KEY_KEYLEN, s)))?,
            None => 0,
        };
        let comment = options.get(KEY_USERNAME).cloned().unwrap_or_else(|| DEFAULT_USERNAME.clone());
        Ok(Self { algorithm, bits, comment })
    }
}
