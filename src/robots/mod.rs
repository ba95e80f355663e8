//! Robots.txt handling
//!
//! The crawl targets a single site, so robots.txt is fetched once at startup
//! and consulted for every listing and detail URL. A fetch failure degrades
//! to allow-all with a warning rather than blocking the run; explicitly
//! configuring `robots-policy = "ignore"` skips the check entirely.

use robotstxt::DefaultMatcher;
use serde::Deserialize;
use url::Url;

/// Whether robots.txt directives are honored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotsPolicy {
    /// Fetch robots.txt and skip disallowed URLs
    #[default]
    Obey,
    /// Do not fetch or consult robots.txt
    Ignore,
}

/// Parsed robots.txt rules for the target site
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty means allow all)
    content: String,
    allow_all: bool,
}

impl RobotsRules {
    /// Creates rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates permissive rules that allow everything
    ///
    /// Used for `robots-policy = "ignore"` and as the fallback when
    /// robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks whether a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}

/// Fetches and parses robots.txt for the site containing `start_url`
///
/// Respects the configured policy: with [`RobotsPolicy::Ignore`] no request
/// is made at all. Any fetch failure (network, non-2xx) logs a warning and
/// returns allow-all; an unreachable robots.txt must not abort the crawl.
pub async fn fetch_robots(
    client: &reqwest::Client,
    start_url: &Url,
    policy: RobotsPolicy,
) -> RobotsRules {
    if policy == RobotsPolicy::Ignore {
        tracing::debug!("robots-policy is ignore, skipping robots.txt");
        return RobotsRules::allow_all();
    }

    let mut robots_url = start_url.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);

    match client.get(robots_url.as_str()).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(content) => {
                tracing::debug!("fetched robots.txt ({} bytes)", content.len());
                RobotsRules::from_content(&content)
            }
            Err(e) => {
                tracing::warn!("failed to read robots.txt body, allowing all: {}", e);
                RobotsRules::allow_all()
            }
        },
        Ok(response) => {
            tracing::warn!(
                "robots.txt returned HTTP {}, allowing all",
                response.status()
            );
            RobotsRules::allow_all()
        }
        Err(e) => {
            tracing::warn!("failed to fetch robots.txt, allowing all: {}", e);
            RobotsRules::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_permits_everything() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allowed("https://example.com/admin", "Catwalk"));
    }

    #[test]
    fn empty_content_permits_everything() {
        let rules = RobotsRules::from_content("");
        assert!(rules.is_allowed("https://example.com/anything", "Catwalk"));
    }

    #[test]
    fn disallow_rule_blocks_matching_path() {
        let rules = RobotsRules::from_content("User-agent: *\nDisallow: /admin");
        assert!(!rules.is_allowed("https://example.com/admin/panel", "Catwalk"));
        assert!(rules.is_allowed("https://example.com/products/tee", "Catwalk"));
    }

    #[test]
    fn policy_default_is_obey() {
        assert_eq!(RobotsPolicy::default(), RobotsPolicy::Obey);
    }

    #[test]
    fn policy_parses_from_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: RobotsPolicy,
        }
        let w: Wrapper = toml::from_str(r#"policy = "ignore""#).unwrap();
        assert_eq!(w.policy, RobotsPolicy::Ignore);
    }
}
