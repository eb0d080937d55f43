use std::collections::BTreeMap;
use std::fs;
use std::io;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use crate::keygen::config::KEYFILE_URI;
use crate::keygen::error::KeyError;
use crate::keygen::keys::pem::format_pem;

/// Everything but `[A-Za-z0-9-_.~]` is escaped.
const URI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedBundle {
    #[serde(rename = "privkey")]
    pub private_key_base64: String,
    #[serde(rename = "privkeyfile")]
    pub private_key_pem: String,
    #[serde(rename = "privkeyuri")]
    pub private_key_uri: String,
    #[serde(rename = "pubkey")]
    pub public_key_line: String,
}

/// Percent-encodes `value`, spaces become `+`.
pub fn url_encode(value: &str) -> String {
    utf8_percent_encode(value, URI_ESCAPE).to_string().replace("%20", "+")
}

pub fn public_key_line(algorithm_label: &str, ssh_public: &[u8], comment: &str) -> String {
    format!("{} {} {}", algorithm_label, base64::encode(ssh_public), comment)
}

impl EncodedBundle {
    pub fn assemble(der: &[u8], ssh_public: &[u8], pem_template: &str, algorithm_label: &str, comment: &str)
                    -> Result<Self, KeyError> {
        let private_key_pem = format_pem(der, pem_template)?;
        Ok(Self {
            private_key_base64: base64::encode(der).trim().to_string(),
            private_key_uri: format!("{}{}", KEYFILE_URI, url_encode(&private_key_pem)),
            private_key_pem,
            public_key_line: public_key_line(algorithm_label, ssh_public, comment),
        })
    }

    pub fn to_options(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("privkey".to_string(), self.private_key_base64.clone()),
            ("privkeyfile".to_string(), self.private_key_pem.clone()),
            ("privkeyuri".to_string(), self.private_key_uri.clone()),
            ("pubkey".to_string(), self.public_key_line.clone()),
        ])
    }

    /// Writes the PEM private key to `path` and the public key line to `path.pub`.
    pub fn save(&self, path: &str) -> io::Result<()> {
        let path_public = path.to_string() + ".pub";
        fs::write(path, &self.private_key_pem)?;
        fs::write(path_public, format!("{}\n", self.public_key_line))?;
        Ok(())
    }
}
