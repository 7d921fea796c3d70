use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// A tool to keep a Cloudflare A record pointed at this machine, using Cloudflare as a dynamic DNS system.
///
/// Performs a single update attempt and exits. Schedule it with cron or a systemd timer to keep the
/// record current.
#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None, name = "cloudflare-ddns")]
pub struct Opts {
    /// The path to the configuration file.
    pub config: PathBuf,
    /// The service used to find out the public IPv4 address.
    #[clap(long, value_enum, default_value_t = IPSourceName::DnsOMatic)]
    pub ip_source: IPSourceName,
    /// Look up the record and report what would change, without updating it.
    #[clap(action, long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IPSourceName {
    #[default]
    #[value(name = "dnsomatic")]
    DnsOMatic,
    Ipify,
    Icanhazip,
    #[value(name = "seeip")]
    SeeIP,
}
