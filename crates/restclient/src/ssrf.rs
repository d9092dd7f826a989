//! SSRF protection for caller-supplied webhook URLs (§7).
//!
//! Resolve-then-connect: the hostname is resolved to concrete IP(s) here,
//! checked against the mode's blocklist, and the *resolved* address is
//! pinned into the request (see [`crate::webhook`]) so a second DNS lookup
//! performed by the HTTP stack can't rebind to a different, disallowed
//! address after this check passes.

use n8n_mcp_domain::config::WebhookSecurityMode;
use n8n_mcp_domain::Error;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

const METADATA_HOSTS: &[&str] = &["metadata.google.internal", "metadata.goog"];
const METADATA_V4: Ipv4Addr = Ipv4Addr::new(169, 254, 169, 254);

fn is_loopback(ip: IpAddr) -> bool {
    ip.is_loopback()
}

fn is_link_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

fn is_rfc1918(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private(),
        IpAddr::V6(_) => false,
    }
}

fn is_ipv6_unique_local(ip: IpAddr) -> bool {
    matches!(ip, IpAddr::V6(v6) if (v6.segments()[0] & 0xfe00) == 0xfc00)
}

fn is_cloud_metadata(host: &str, ip: IpAddr) -> bool {
    if METADATA_HOSTS.iter().any(|h| host.eq_ignore_ascii_case(h)) {
        return true;
    }
    matches!(ip, IpAddr::V4(v4) if v4 == METADATA_V4)
}

/// Whether `ip` (resolved for `host`) is disallowed under `mode`.
fn is_blocked(mode: WebhookSecurityMode, host: &str, ip: IpAddr) -> bool {
    if is_cloud_metadata(host, ip) {
        return true;
    }
    match mode {
        WebhookSecurityMode::Strict => {
            is_loopback(ip) || is_rfc1918(ip) || is_link_local(ip) || is_ipv6_unique_local(ip)
        }
        WebhookSecurityMode::Moderate => {
            is_rfc1918(ip) || is_link_local(ip) || is_ipv6_unique_local(ip)
        }
        WebhookSecurityMode::Permissive => false,
    }
}

/// Resolves `host` and returns the first address that passes `mode`'s
/// blocklist, or an error naming the offending address otherwise. All
/// resolved addresses are checked — one acceptable address does not
/// excuse another that resolves to a blocked range.
pub async fn resolve_and_check(
    mode: WebhookSecurityMode,
    host: &str,
    port: u16,
) -> Result<SocketAddr, Error> {
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| Error::Transport(format!("DNS resolution failed for {host}: {e}")))?
        .collect::<Vec<_>>();

    if addrs.is_empty() {
        return Err(Error::Transport(format!("no addresses resolved for {host}")));
    }

    for addr in &addrs {
        if is_blocked(mode, host, addr.ip()) {
            return Err(Error::InputInvalid(format!(
                "webhook target resolves to a disallowed address ({})",
                addr.ip()
            )));
        }
    }

    Ok(addrs[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_blocked_in_strict_only() {
        let ip = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
        assert!(is_blocked(WebhookSecurityMode::Strict, "localhost", ip));
        assert!(!is_blocked(WebhookSecurityMode::Moderate, "localhost", ip));
        assert!(!is_blocked(WebhookSecurityMode::Permissive, "localhost", ip));
    }

    #[test]
    fn rfc1918_blocked_in_strict_and_moderate() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
        assert!(is_blocked(WebhookSecurityMode::Strict, "h", ip));
        assert!(is_blocked(WebhookSecurityMode::Moderate, "h", ip));
        assert!(!is_blocked(WebhookSecurityMode::Permissive, "h", ip));
    }

    #[test]
    fn metadata_blocked_in_every_mode() {
        let ip = IpAddr::V4(METADATA_V4);
        assert!(is_blocked(WebhookSecurityMode::Strict, "h", ip));
        assert!(is_blocked(WebhookSecurityMode::Moderate, "h", ip));
        assert!(is_blocked(WebhookSecurityMode::Permissive, "h", ip));
    }

    #[test]
    fn metadata_hostname_blocked_regardless_of_ip() {
        let ip = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));
        assert!(is_blocked(
            WebhookSecurityMode::Permissive,
            "metadata.google.internal",
            ip
        ));
    }

    #[test]
    fn public_address_allowed_in_every_mode() {
        let ip = IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34));
        assert!(!is_blocked(WebhookSecurityMode::Strict, "example.com", ip));
    }

    #[test]
    fn ipv6_unique_local_blocked_in_strict_and_moderate() {
        let ip = IpAddr::V6(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 1));
        assert!(is_blocked(WebhookSecurityMode::Strict, "h", ip));
        assert!(is_blocked(WebhookSecurityMode::Moderate, "h", ip));
        assert!(!is_blocked(WebhookSecurityMode::Permissive, "h", ip));
    }
}
