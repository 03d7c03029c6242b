//! Command-line argument definitions

use clap::{Args, Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;

use crate::install::{DEFAULT_UNIT_DIR, DEFAULT_UNIT_NAME, DEFAULT_TTL};

/// Keep Route 53 address records pointed at this host's public IPv4 address
///
/// Reconciliation settings are read from the environment
/// (ROUTE53_HOSTED_ZONE_DNS_NAME, ROUTE53_MY_DNS_NAMES, ROUTE53_TTL, ...).
#[derive(Parser, Debug)]
#[command(name = "ddnsd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile every configured host once and exit
    Run(RunArgs),

    /// Write systemd service, timer and environment units
    Install(InstallArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Resolve and compare, but submit no changes (overrides DDNS_MODE)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Clone)]
pub struct InstallArgs {
    /// Directory receiving the unit files
    #[arg(long, default_value = DEFAULT_UNIT_DIR)]
    pub unit_dir: PathBuf,

    /// Base name of the service and timer units
    #[arg(long, default_value = DEFAULT_UNIT_NAME)]
    pub name: String,

    /// AWS access key ID written to the unit environment
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: String,

    /// AWS secret access key written to the unit environment
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: String,

    /// Hosted zone DNS name (e.g. example.net)
    #[arg(long = "zone", env = "ROUTE53_HOSTED_ZONE_DNS_NAME")]
    pub zone_dns_name: String,

    /// Comma-separated host names (e.g. unifi.example.net,camera.example.net)
    #[arg(long = "hosts", env = "ROUTE53_MY_DNS_NAMES")]
    pub host_names: String,

    /// TTL for upserted records, in seconds
    #[arg(long, env = "ROUTE53_TTL", default_value_t = DEFAULT_TTL)]
    pub ttl: u32,

    /// Install even when systemctl cannot be found on PATH
    #[arg(long)]
    pub skip_systemctl_check: bool,
}

impl fmt::Debug for InstallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallArgs")
            .field("unit_dir", &self.unit_dir)
            .field("name", &self.name)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .field("zone_dns_name", &self.zone_dns_name)
            .field("host_names", &self.host_names)
            .field("ttl", &self.ttl)
            .field("skip_systemctl_check", &self.skip_systemctl_check)
            .finish()
    }
}
