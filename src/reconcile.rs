use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    UpToDate,
    Update,
}

/// Compares the public IP against what the record currently holds.
///
/// Only an exact address match counts as up to date. A record value that isn't an IPv4 address
/// at all always needs updating.
pub fn decide(public_ip: Ipv4Addr, record_value: &str) -> Decision {
    match record_value.parse::<Ipv4Addr>() {
        Ok(current) if current == public_ip => Decision::UpToDate,
        _ => Decision::Update,
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unchanged {
        domain: String,
        ip: Ipv4Addr,
    },
    Updated {
        domain: String,
        from: String,
        to: Ipv4Addr,
    },
    DryRun {
        domain: String,
        from: String,
        to: Ipv4Addr,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unchanged { domain, ip } => {
                write!(f, "DNS for {} already up to date: {}", domain, ip)
            }
            Outcome::Updated { domain, from, to } => {
                write!(f, "Updated DNS for {}: {} -> {}", domain, from, to)
            }
            Outcome::DryRun { domain, from, to } => {
                write!(f, "Would update DNS for {}: {} -> {} (dry run)", domain, from, to)
            }
        }
    }
}
