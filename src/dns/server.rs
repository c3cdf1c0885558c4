use crate::config::SharedConfig;
use crate::dns::handlers::Handler;
use crate::dns::resolver::Resolver;
use tokio::net::{TcpListener, UdpSocket};
use trust_dns_server::ServerFuture;

pub async fn new(
    config: SharedConfig,
    resolver: Resolver,
) -> anyhow::Result<ServerFuture<Handler>> {
    let bind_addr = config.dns_bind_addr;
    let dns_handler = Handler::new(resolver);
    let mut dns_server = ServerFuture::new(dns_handler);
    dns_server.register_socket(UdpSocket::bind(bind_addr).await?);
    dns_server.register_listener(TcpListener::bind(bind_addr).await?, config.dns_tcp_timeout);
    Ok(dns_server)
}
