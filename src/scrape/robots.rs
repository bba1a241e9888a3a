//! robots.txt compliance gate with a per-origin policy cache

use std::collections::HashMap;

use reqwest::Client;
use texting_robots::Robot;
use tracing::{debug, warn};
use url::Url;

/// Decides whether a URL may be fetched according to its site's robots.txt.
///
/// Policies are keyed by origin (scheme, host and port), not by host alone: a
/// robots.txt only governs the protocol, host and port it was served from, so
/// `http://example.com` and `https://example.com`, or the same host on two
/// ports, each get their own fetch and their own policy. Each origin is
/// fetched once and cached for the lifetime of the gate. The cache only grows.
#[derive(Default)]
pub struct RobotsGate {
    enabled: bool,
    agent: String,
    /// `None` records an origin whose policy could not be retrieved
    policies: HashMap<String, Option<Robot>>,
}

impl RobotsGate {
    /// Create a gate matching robots.txt groups against `agent`
    pub fn new(enabled: bool, agent: impl Into<String>) -> Self {
        Self {
            enabled,
            agent: agent.into(),
            policies: HashMap::new(),
        }
    }

    /// Whether robots.txt is consulted at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of origins with a cached decision
    pub fn cached_origins(&self) -> usize {
        self.policies.len()
    }

    /// Check whether `url` may be fetched, fetching the origin's policy on
    /// first use.
    pub async fn is_allowed(&mut self, client: &Client, url: &Url) -> bool {
        if !self.enabled {
            return true;
        }

        let origin = url.origin().ascii_serialization();
        if !self.policies.contains_key(&origin) {
            let policy = self.fetch_policy(client, url).await;
            self.policies.insert(origin.clone(), policy);
        }

        match self.policies.get(&origin) {
            Some(Some(robot)) => robot.allowed(url.as_str()),
            _ => true,
        }
    }

    /// Fetch and parse the robots.txt for `url`'s origin.
    ///
    /// Any failure (network error, non-2xx status, unreadable or unparsable
    /// body) yields `None`, which the gate treats as "permit everything":
    /// a missing policy never blocks a fetch.
    async fn fetch_policy(&self, client: &Client, url: &Url) -> Option<Robot> {
        let robots_url = url.join("/robots.txt").ok()?;
        debug!("Fetching {}", robots_url);

        let response = match client.get(robots_url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Could not fetch {}: {}; allowing", robots_url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "{} returned {}; allowing",
                robots_url,
                response.status()
            );
            return None;
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Could not read {}: {}; allowing", robots_url, e);
                return None;
            }
        };

        match Robot::new(&self.agent, &body) {
            Ok(robot) => Some(robot),
            Err(e) => {
                warn!("Could not parse {}: {}; allowing", robots_url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_disabled_gate_never_fetches() {
        let mut server = Server::new_async().await;
        let robots = server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow: /\n")
            .expect(0)
            .create_async()
            .await;

        let mut gate = RobotsGate::new(false, "scrapekit");
        let url = Url::parse(&format!("{}/anything", server.url())).unwrap();
        assert!(gate.is_allowed(&Client::new(), &url).await);

        robots.assert_async().await;
    }

    #[tokio::test]
    async fn test_policy_is_cached_per_origin() {
        let mut server = Server::new_async().await;
        let robots = server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow: /private/\n")
            .expect(1)
            .create_async()
            .await;

        let client = Client::new();
        let mut gate = RobotsGate::new(true, "scrapekit");
        let public = Url::parse(&format!("{}/public/page", server.url())).unwrap();
        let private = Url::parse(&format!("{}/private/page", server.url())).unwrap();

        assert!(gate.is_allowed(&client, &public).await);
        assert!(!gate.is_allowed(&client, &private).await);
        assert!(gate.is_allowed(&client, &public).await);
        assert_eq!(gate.cached_origins(), 1);

        robots.assert_async().await;
    }

    #[tokio::test]
    async fn test_same_host_on_other_port_has_own_policy() {
        let mut open = Server::new_async().await;
        let open_robots = open
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nAllow: /\n")
            .expect(1)
            .create_async()
            .await;
        let mut closed = Server::new_async().await;
        let closed_robots = closed
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow: /\n")
            .expect(1)
            .create_async()
            .await;

        let client = Client::new();
        let mut gate = RobotsGate::new(true, "scrapekit");
        let on_open = Url::parse(&format!("{}/page", open.url())).unwrap();
        let on_closed = Url::parse(&format!("{}/page", closed.url())).unwrap();
        assert_eq!(on_open.host_str(), on_closed.host_str());

        assert!(gate.is_allowed(&client, &on_open).await);
        assert!(!gate.is_allowed(&client, &on_closed).await);
        assert!(gate.is_allowed(&client, &on_open).await);
        assert_eq!(gate.cached_origins(), 2);

        open_robots.assert_async().await;
        closed_robots.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_permits() {
        let mut server = Server::new_async().await;
        let robots = server
            .mock("GET", "/robots.txt")
            .with_status(500)
            .create_async()
            .await;

        let mut gate = RobotsGate::new(true, "scrapekit");
        let url = Url::parse(&format!("{}/private/page", server.url())).unwrap();
        assert!(gate.is_allowed(&Client::new(), &url).await);

        robots.assert_async().await;
    }

    #[tokio::test]
    async fn test_agent_specific_group() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: scrapekit\nDisallow: /\n\nUser-agent: *\nAllow: /\n")
            .create_async()
            .await;

        let client = Client::new();
        let url = Url::parse(&format!("{}/page", server.url())).unwrap();

        let mut ours = RobotsGate::new(true, "scrapekit");
        assert!(!ours.is_allowed(&client, &url).await);

        let mut other = RobotsGate::new(true, "otherbot");
        assert!(other.is_allowed(&client, &url).await);
    }
}
