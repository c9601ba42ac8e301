use axum::http::HeaderMap;
use dashmap::DashMap;
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;

pub type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-client request budget for the AI endpoint.
pub struct IpRateLimiter {
    quota: Quota,
    limiters: DashMap<String, KeyedLimiter>,
}

impl IpRateLimiter {
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self {
            quota: Quota::per_minute(requests),
            limiters: DashMap::new(),
        }
    }

    /// Records one request for `ip`. `false` once the budget is spent.
    pub fn check(&self, ip: &str) -> bool {
        let key = ip.to_string();
        let entry = self
            .limiters
            .entry(key.clone())
            .or_insert_with(|| RateLimiter::keyed(self.quota));
        entry.value().check_key(&key).is_ok()
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiters.len()
    }

    /// Drops clients whose budget has fully refilled.
    pub fn prune(&self) -> usize {
        let before = self.limiters.len();
        self.limiters.retain(|_, limiter| {
            limiter.retain_recent();
            !limiter.is_empty()
        });
        before - self.limiters.len()
    }
}

/// First `x-forwarded-for` entry, else the socket peer, else `anon`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "anon".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn eleventh_request_is_rejected() {
        let limiter = IpRateLimiter::per_minute(nonzero_ext::nonzero!(10u32));
        for i in 0..10 {
            assert!(limiter.check("203.0.113.9"), "request {} should pass", i + 1);
        }
        assert!(!limiter.check("203.0.113.9"));
        assert!(limiter.check("198.51.100.1"));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let peer: SocketAddr = "10.0.0.5:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.5");
        assert_eq!(client_ip(&headers, None), "anon");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 70.41.3.18"));
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.5");
    }
}
