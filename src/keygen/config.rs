use clap::Parser;
use gethostname::gethostname;
use lazy_static::lazy_static;
use crate::keygen::KeyGen;

pub const KEY_TYPE_NAME: &str = "key-type";
pub const KEY_USERNAME: &str = "key-username";
pub const KEY_KEYLEN: &str = "key-bits";

pub const DEFAULT_KEY_TYPE: &str = "dsa";
pub const DEFAULT_KEY_BITS: u32 = 1024;
pub const DEFAULT_ROUNDS: u32 = 20;

/// Scheme prefix of `privkeyuri`, the key file download handle.
pub const KEYFILE_URI: &str = "sshkey://";

lazy_static! {
    pub static ref DEFAULT_USERNAME: String =
        format!("backup-user@{}", gethostname().to_string_lossy());
    pub static ref CONFIG_DEF: KeyGen = KeyGen::parse_from(["sshkey"]);
}
