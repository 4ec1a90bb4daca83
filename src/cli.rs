use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "dicom-adapter",
    version,
    about = "Forward DICOM C-STORE traffic to DICOMweb services"
)]
pub struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Push a Part-10 file through the C-STORE path as if a peer had sent it
    Store {
        #[arg(short, long)]
        file: PathBuf,
        /// Calling AE title presented to the router
        #[arg(short = 'a', long, default_value = "STORESCU")]
        calling_aet: String,
    },
    /// Copy objects from the relay source to the relay sink
    Relay {
        /// Paths relative to the source service prefix
        #[arg(required = true)]
        locators: Vec<String>,
    },
    /// Run a QIDO-RS query against the default destination
    Query { path: String },
    /// Validate the configuration and exit
    Check,
}
