use std::error::Error;
use clap::Parser;
use sshkey::KeyGen;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), Box<dyn Error>> {
    let keygen = KeyGen::parse();
    let default_filter = if keygen.silent { "warn" } else { "sshkey=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    keygen.run()?;
    Ok(())
}
