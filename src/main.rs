use crate::cloudflare::{api_client, find_record, update_record, CloudflareAPI, RecordLookup};
use crate::config::Config;
use crate::ip_source::ip_source::IPSource;
use crate::reconcile::{decide, Decision, Outcome};
use clap::Parser;
use cloudflare::{ApiError, CLOUDFLARE_API_BASE};
use config::ConfigError;
use ip_source::{
    dnsomatic::IPSourceDnsOMatic, icanhazip::IPSourceIcanhazip, ipify::IPSourceIpify,
    seeip::IPSourceSeeIP, NetworkError,
};
use log::info;
use opts::{IPSourceName, Opts};
use reqwest::header::InvalidHeaderValue;
use std::process::ExitCode;
mod cloudflare;
mod config;
mod ip_source;
mod opts;
mod reconcile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Error occurred while reading config: {0}")]
    Config(#[from] ConfigError),
    #[error("Error while finding out the public IP address: {0}")]
    Network(#[from] NetworkError),
    #[error("Error while looking up the DNS record: {0}")]
    Lookup(ApiError),
    #[error("Error while updating the DNS record: {0}")]
    Update(ApiError),
    #[error("No A record for '{domain}' exists in zone '{zone_id}'. Create it once in Cloudflare, then run again")]
    NotFound { domain: String, zone_id: String },
    #[error("Found {count} A records for '{domain}', not sure which one to update")]
    Ambiguous { domain: String, count: usize },
    #[error("Error while converting the API token to a header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
    #[error("Error while building the HTTP client: {0}")]
    Request(#[from] reqwest::Error),
}

impl ClientError {
    /// A missing record gets its own code so a scheduler can tell setup problems apart.
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::NotFound { .. } => 3,
            _ => 1,
        }
    }
}

async fn run(
    base_url: &str,
    ip_source: &dyn IPSource,
    conf: &Config,
    opts: &Opts,
) -> Result<Outcome, ClientError> {
    info!("Finding out the IP address...");
    let ip = ip_source.get_ipv4().await?;
    info!("Public IPv4: {}", ip);

    let client = api_client(&conf.api_token)?;
    let api = CloudflareAPI {
        base_url,
        zone_id: &conf.zone_id,
    };
    info!("Looking up the A record for {}", conf.domain);
    let record = match find_record(&client, &api, &conf.domain)
        .await
        .map_err(ClientError::Lookup)?
    {
        RecordLookup::Found(record) => record,
        RecordLookup::NotFound => {
            return Err(ClientError::NotFound {
                domain: conf.domain.clone(),
                zone_id: conf.zone_id.clone(),
            })
        }
        RecordLookup::Ambiguous(count) => {
            return Err(ClientError::Ambiguous {
                domain: conf.domain.clone(),
                count,
            })
        }
    };
    info!("Record currently points to {}", record.content);

    if decide(ip, &record.content) == Decision::UpToDate {
        return Ok(Outcome::Unchanged {
            domain: conf.domain.clone(),
            ip,
        });
    }

    if opts.dry_run {
        return Ok(Outcome::DryRun {
            domain: conf.domain.clone(),
            from: record.content,
            to: ip,
        });
    }

    info!("Updating the A record for {} to {}", conf.domain, ip);
    update_record(&client, &api, &record, ip)
        .await
        .map_err(ClientError::Update)?;
    Ok(Outcome::Updated {
        domain: conf.domain.clone(),
        from: record.content,
        to: ip,
    })
}

async fn load_and_run(
    base_url: &str,
    ip_source: &dyn IPSource,
    opts: &Opts,
) -> Result<Outcome, ClientError> {
    let conf = config::load_config(&opts.config)?;
    run(base_url, ip_source, &conf, opts).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = opts::Opts::parse();

    let ip_source: Box<dyn IPSource> = match opts.ip_source {
        IPSourceName::DnsOMatic => Box::new(IPSourceDnsOMatic),
        IPSourceName::Ipify => Box::new(IPSourceIpify),
        IPSourceName::Icanhazip => Box::new(IPSourceIcanhazip),
        IPSourceName::SeeIP => Box::new(IPSourceSeeIP),
    };

    match load_and_run(CLOUDFLARE_API_BASE, ip_source.as_ref(), &opts).await {
        Ok(outcome) => {
            println!("{}", outcome);
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::from(error.exit_code())
        }
    }
}
