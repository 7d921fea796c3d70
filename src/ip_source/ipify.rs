use std::net::Ipv4Addr;

use async_trait::async_trait;

use super::{get_ip, ip_source::IPSource, NetworkError};

pub(crate) struct IPSourceIpify;

#[async_trait]
impl IPSource for IPSourceIpify {
    async fn get_ipv4(&self) -> Result<Ipv4Addr, NetworkError> {
        get_ip("https://api.ipify.org").await
    }
}
