use std::net::Ipv4Addr;

use async_trait::async_trait;

use super::{get_ip, ip_source::IPSource, NetworkError};

pub(crate) struct IPSourceIcanhazip;

#[async_trait]
impl IPSource for IPSourceIcanhazip {
    async fn get_ipv4(&self) -> Result<Ipv4Addr, NetworkError> {
        // The ipv4 subdomain only answers over IPv4, so the reply can't be an IPv6 address
        get_ip("https://ipv4.icanhazip.com").await
    }
}

#[cfg(test)]
mod tests {
    use super::IPSource;
    use super::IPSourceIcanhazip;

    #[tokio::test]
    #[ignore]
    async fn ipv4_test() {
        IPSourceIcanhazip
            .get_ipv4()
            .await
            .expect("Failed to get the IP address");
    }
}
