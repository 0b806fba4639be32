pub mod exchange;
pub mod source;
pub mod tcp;
pub mod transport;
pub mod udp;

use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use phantom_common::network::target::Target;
use tracing::debug;

/// Turns a target into an address, preferring IPv4 when a name has both.
pub async fn resolve_target(target: &Target) -> anyhow::Result<IpAddr> {
    let name: &str = match target {
        Target::Ip(ip) => return Ok(*ip),
        Target::Hostname(name) => name,
    };

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((name, 0))
        .await
        .with_context(|| format!("failed to resolve {name}"))?
        .collect();

    let chosen: IpAddr = addrs
        .iter()
        .map(SocketAddr::ip)
        .find(IpAddr::is_ipv4)
        .or_else(|| addrs.first().map(SocketAddr::ip))
        .with_context(|| format!("{name} has no addresses"))?;

    debug!("Resolved {name} to {chosen}");
    Ok(chosen)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
