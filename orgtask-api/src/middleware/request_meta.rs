/// Client metadata for audit entries
///
/// [`ClientMeta`] extracts the client IP and user agent from a request.
///
/// When `TRUST_PROXY_HEADERS` is enabled the IP is taken from the first of:
///
/// 1. `X-Forwarded-For` (first address in the chain)
/// 2. `X-Real-IP`
/// 3. The socket address, when the server was started with connect info
///
/// Otherwise only the socket address is used. Header values that do not parse
/// as an IP address are ignored, and the stored value is the canonical form of
/// the parsed address.
///
/// Extraction never fails; missing values are `None`.

use crate::app::AppState;
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use orgtask_shared::services::audit::RequestMetadata;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Request metadata extractor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta(pub RequestMetadata);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    header_str(headers, "x-forwarded-for")
        .and_then(|chain| chain.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        .and_then(parse_ip)
        .or_else(|| header_str(headers, "x-real-ip").and_then(parse_ip))
}

fn client_ip(
    headers: &HeaderMap,
    remote_addr: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<String> {
    let forwarded = if trust_proxy_headers {
        forwarded_ip(headers)
    } else {
        None
    };

    forwarded
        .or_else(|| remote_addr.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
}

impl ClientMeta {
    pub fn from_parts(
        headers: &HeaderMap,
        remote_addr: Option<SocketAddr>,
        trust_proxy_headers: bool,
    ) -> Self {
        Self(RequestMetadata {
            ip_address: client_ip(headers, remote_addr, trust_proxy_headers),
            user_agent: header_str(headers, header::USER_AGENT.as_str()).map(str::to_string),
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self::from_parts(
            &parts.headers,
            remote_addr,
            state.config.api.trust_proxy_headers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn peer() -> SocketAddr {
        "192.0.2.1:443".parse().unwrap()
    }

    #[test]
    fn test_forwarded_for_wins_behind_trusted_proxy() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.2"),
            ("x-real-ip", "10.0.0.3"),
            ("user-agent", "curl/8.4.0"),
        ]);

        let ClientMeta(meta) = ClientMeta::from_parts(&h, Some(peer()), true);
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.4.0"));
    }

    #[test]
    fn test_real_ip_then_socket() {
        let ClientMeta(meta) =
            ClientMeta::from_parts(&headers(&[("x-real-ip", "10.0.0.3")]), Some(peer()), true);
        assert_eq!(meta.ip_address.as_deref(), Some("10.0.0.3"));

        let ClientMeta(meta) = ClientMeta::from_parts(&HeaderMap::new(), Some(peer()), true);
        assert_eq!(meta.ip_address.as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn test_forwarded_headers_ignored_without_trust() {
        let h = headers(&[("x-forwarded-for", "1.2.3.4"), ("x-real-ip", "5.6.7.8")]);

        let ClientMeta(meta) = ClientMeta::from_parts(&h, Some(peer()), false);
        assert_eq!(meta.ip_address.as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn test_non_ip_values_fall_back_to_socket() {
        let long = "x".repeat(200);
        let h = headers(&[("x-forwarded-for", long.as_str())]);

        let ClientMeta(meta) = ClientMeta::from_parts(&h, Some(peer()), true);
        assert_eq!(meta.ip_address.as_deref(), Some("192.0.2.1"));

        let h = headers(&[("x-forwarded-for", "not-an-ip"), ("x-real-ip", "10.0.0.3")]);
        let ClientMeta(meta) = ClientMeta::from_parts(&h, Some(peer()), true);
        assert_eq!(meta.ip_address.as_deref(), Some("10.0.0.3"));
    }

    #[test]
    fn test_ipv6_is_canonicalized() {
        let h = headers(&[("x-forwarded-for", "2001:0db8:0000:0000:0000:0000:0000:0001")]);

        let ClientMeta(meta) = ClientMeta::from_parts(&h, None, true);
        assert_eq!(meta.ip_address.as_deref(), Some("2001:db8::1"));
    }

    #[test]
    fn test_nothing_available() {
        let ClientMeta(meta) =
            ClientMeta::from_parts(&headers(&[("x-forwarded-for", " , ")]), None, true);
        assert_eq!(meta, RequestMetadata::default());
    }
}
