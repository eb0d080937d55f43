use std::error::Error;
use std::fs;
use std::io;
use std::time::Duration;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

pub mod config;
pub mod error;
pub mod keys;
pub mod prime_gen;
pub mod request;

use config::*;
pub use error::KeyError;
pub use keys::*;
pub use request::KeyRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Generate,
    Check,
}

#[derive(Debug, Clone, Parser)]
#[clap(name = "sshkey", version, about = "Generate SSH key pairs as PEM private key, key file URI and public key line")]
pub struct KeyGen {
    #[clap(short, long, value_parser, default_value = "generate", help = "Run mode: generate, check")]
    pub mode: String,
    #[clap(short = 't', long, value_parser, default_value = DEFAULT_KEY_TYPE, help = "Key type: dsa, rsa")]
    pub key_type: String,
    #[clap(short = 'b', long, value_parser, allow_negative_numbers = true, default_value_t = DEFAULT_KEY_BITS as i64, help = "Key length in bits, 0 or less for the default")]
    pub key_bits: i64,
    #[clap(short = 'C', long, value_parser, default_value = DEFAULT_USERNAME.as_str(), help = "Comment attached to the public key")]
    pub key_username: String,
    #[clap(short, long, value_parser, help = "Key path, generate writes `path' and `path.pub', check reads them")]
    pub key: Option<String>,
    #[clap(short, long, value_parser, default_value_t = false, help = "Print privkey, privkeyfile, privkeyuri and pubkey as JSON")]
    pub json: bool,
    #[clap(short, long, value_parser, default_value_t = DEFAULT_ROUNDS, help = "Miller Rabin rounds")]
    pub rounds: u32,
    #[clap(long, value_parser, default_value_t = num_cpus::get(), help = "Search primes in <THREADS> threads")]
    pub threads: usize,
    #[clap(short, long, value_parser, default_value_t = false, help = "Disable log output")]
    pub silent: bool,
}

/// Encodes `material` into the four output forms.
pub fn bundle_from_material(material: &KeyMaterial, comment: &str) -> Result<EncodedBundle, KeyError> {
    let algorithm = material.algorithm();
    let der = encode_der_sequence(&material.private_fields())?;
    let ssh = encode_ssh_fields(&material.public_fields())?;
    EncodedBundle::assemble(&der, &ssh, algorithm.pem_template(), algorithm.ssh_name(), comment)
}

/// Generates a fresh key pair for `request` and encodes it.
pub fn generate_bundle<S: KeySource>(generator: &KeyPairGenerator<S>, request: &KeyRequest) -> Result<EncodedBundle, KeyError> {
    let material = generator.generate(request.algorithm, request.bits)?;
    bundle_from_material(&material, &request.comment)
}

/// Verifies the private key read by `reader` and returns its public key
/// line. When `public_line` is given, its blob must match the private key.
pub fn check_key(reader: &KeyReader, public_line: Option<&str>, comment: &str) -> Result<String, KeyError> {
    let material = reader.read_material()?;
    material.verify()?;
    let algorithm = material.algorithm();
    if let Some(line) = public_line {
        let public = parse_public_key_line(line)?;
        if public.algorithm_label != algorithm.ssh_name() || decode_ssh_fields(&public.blob)? != material.public_fields() {
            return Err(KeyError::FormatError("public key does not match the private key".to_string()));
        }
    }
    let blob = encode_ssh_fields(&material.public_fields())?;
    Ok(public_key_line(algorithm.ssh_name(), &blob, comment))
}

/// Contents of `path.pub`, `None` only when that file does not exist.
pub fn read_public_line(path: &str) -> io::Result<Option<String>> {
    match fs::read_to_string(path.to_string() + ".pub") {
        Ok(line) => Ok(Some(line)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

impl KeyGen {
    pub fn get(&self) -> &KeyGen {
        self
    }

    fn run_mode(&self) -> Result<RunMode, Box<dyn Error>> {
        match self.mode.as_str() {
            "generate" => Ok(RunMode::Generate),
            "check" => Ok(RunMode::Check),
            m => Err(format!("Unknown run mode {}! available: generate(default), check", m).into())
        }
    }

    pub fn request(&self) -> Result<KeyRequest, KeyError> {
        Ok(KeyRequest::new(self.key_type.parse()?, self.key_bits, &self.key_username))
    }

    fn spinner(&self, message: String) -> Result<Option<ProgressBar>, Box<dyn Error>> {
        if self.silent { return Ok(None); }
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        Ok(Some(pb))
    }

    fn output(&self, bundle: &EncodedBundle) -> Result<(), Box<dyn Error>> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(bundle)?);
        }
        match &self.key {
            Some(path) => {
                bundle.save(path)?;
                info!("Generated key files: {}, {}.pub", path, path);
            }
            None if !self.json => {
                print!("{}", bundle.private_key_pem);
                println!("{}", bundle.public_key_line);
            }
            None => {}
        }
        Ok(())
    }

    pub fn run(&self) -> Result<(), Box<dyn Error>> {
        match self.run_mode()? {
            RunMode::Generate => {
                let request = self.request()?;
                let generator = KeyPairGenerator::new(SystemKeySource::new(self.rounds, self.threads));
                let pb = self.spinner(format!("generating {} key", request.algorithm))?;
                let res = generate_bundle(&generator, &request);
                if let Some(pb) = &pb { pb.finish_and_clear(); }
                self.output(&res?)?;
            }
            RunMode::Check => {
                let reader = match &self.key {
                    Some(path) => KeyReader::open(path)?,
                    None => KeyReader::new(Box::new(io::stdin()))?,
                };
                let public_line = match &self.key {
                    Some(path) => read_public_line(path)?,
                    None => None,
                };
                if public_line.is_some() { info!("checking public key file against the private key"); }
                println!("{}", check_key(&reader, public_line.as_deref(), &self.key_username)?);
                info!("key ok");
            }
        }
        Ok(())
    }
}
