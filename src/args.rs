use clap::Parser;

/// Downloads the Base Adresse Nationale and builds the local address store
#[derive(Debug, Parser)]
#[command(name = "ban-import", version)]
pub struct CliArgs {
    /// Department codes to import (default: 67)
    pub regions: Vec<String>,
}
