//! 客户端 IP 提取
//!
//! 供公开接口限流使用。只有当直连对端命中 `rate_limit.trusted_proxies`
//! 时才信任 `X-Forwarded-For` / `X-Real-IP`，否则一律使用连接 IP，
//! 防止客户端伪造请求头绕过限流。

use std::net::{IpAddr, SocketAddr};

use actix_web::http::header::HeaderMap;
use tracing::trace;

/// 把 `ip` 或 `ip:port` 解析为 IpAddr
fn parse_peer(peer: &str) -> Option<IpAddr> {
    peer.parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .or_else(|_| peer.parse::<IpAddr>())
        .ok()
}

/// 检查 IP 是否在可信代理列表中（支持单 IP 与 CIDR）
pub fn is_trusted_proxy(peer: &str, trusted_proxies: &[String]) -> bool {
    let Some(ip_addr) = parse_peer(peer) else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip_addr, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|addr| addr == ip_addr)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(prefix_len) = prefix_len.parse::<u32>() else {
        return false;
    };
    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix_len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix_len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 从请求头提取转发的 IP（优先 X-Forwarded-For 的第一个，其次 X-Real-IP）
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

/// 计算用于限流的客户端 IP
///
/// `peer` 为连接对端地址（`ConnectionInfo::peer_addr`）。
pub fn client_ip(
    peer: Option<&str>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> Option<String> {
    let peer = peer?;

    if !trusted_proxies.is_empty()
        && is_trusted_proxy(peer, trusted_proxies)
        && let Some(real_ip) = forwarded_ip(headers)
    {
        trace!("Trusted proxy {} forwarded for {}", peer, real_ip);
        return Some(real_ip);
    }

    Some(
        parse_peer(peer)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| peer.to_string()),
    )
}
