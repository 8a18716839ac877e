//! Page context — the runtime signals a visited page exposes.
//!
//! Conditions and variable interpolation both read from here: device
//! classification, language, query parameters, referrer, and the
//! traffic-source classification.

use serde::{Deserialize, Serialize};
use url::Url;

/// Mobile vs desktop classification from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mobile => f.write_str("mobile"),
            Self::Desktop => f.write_str("desktop"),
        }
    }
}

/// Where the visit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficSource {
    Direct,
    Organic,
    Social,
    Paid,
    Referral,
}

impl std::fmt::Display for TrafficSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Direct => "direct",
            Self::Organic => "organic",
            Self::Social => "social",
            Self::Paid => "paid",
            Self::Referral => "referral",
        };
        f.write_str(name)
    }
}

const MOBILE_MARKERS: &[&str] = &[
    "Mobile",
    "Android",
    "iPhone",
    "iPad",
    "iPod",
    "webOS",
    "BlackBerry",
    "Opera Mini",
    "IEMobile",
];

const SEARCH_DOMAINS: &[&str] = &[
    "google.",
    "bing.com",
    "yahoo.",
    "duckduckgo.com",
    "baidu.com",
    "yandex.",
    "ecosia.org",
];

const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "t.co",
    "x.com",
    "instagram.com",
    "linkedin.com",
    "tiktok.com",
    "pinterest.com",
    "reddit.com",
    "youtube.com",
];

const PAID_MEDIUMS: &[&str] = &["cpc", "ppc", "paid", "cpm"];
const AD_CLICK_IDS: &[&str] = &["gclid", "fbclid", "msclkid", "ttclid"];

/// Snapshot of the page the engine is embedded in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub url: Url,
    #[serde(default)]
    pub title: String,
    /// Raw referring-document URL; empty for direct navigation.
    #[serde(default)]
    pub referrer: String,
    /// BCP 47 locale, e.g. `en-US`.
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub screen_width: u32,
    #[serde(default)]
    pub screen_height: u32,
}

impl PageContext {
    /// Current path component of the page URL.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Value of a named query-string parameter on the current URL.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Classify the device from the user agent.
    #[must_use]
    pub fn device_class(&self) -> DeviceClass {
        if MOBILE_MARKERS
            .iter()
            .any(|marker| self.user_agent.contains(marker))
        {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    /// First two characters of the locale, lower-cased.
    #[must_use]
    pub fn language(&self) -> String {
        self.locale.chars().take(2).collect::<String>().to_lowercase()
    }

    /// Classify the traffic source from the referrer domain, with UTM and
    /// ad-click-id query parameters as tie-breakers.
    #[must_use]
    pub fn traffic_source(&self) -> TrafficSource {
        if let Some(host) = self.referrer_host() {
            if SEARCH_DOMAINS.iter().any(|domain| host.contains(domain)) {
                return TrafficSource::Organic;
            }
            if SOCIAL_DOMAINS.iter().any(|domain| host.contains(domain)) {
                return TrafficSource::Social;
            }
        }

        let paid_medium = self
            .query_param("utm_medium")
            .is_some_and(|medium| PAID_MEDIUMS.contains(&medium.to_lowercase().as_str()));
        let click_id = AD_CLICK_IDS
            .iter()
            .any(|param| self.query_param(param).is_some());
        if paid_medium || click_id {
            return TrafficSource::Paid;
        }

        if self.referrer.is_empty() {
            TrafficSource::Direct
        } else {
            TrafficSource::Referral
        }
    }

    fn referrer_host(&self) -> Option<String> {
        let parsed = Url::parse(&self.referrer).ok()?;
        parsed.host_str().map(|host| {
            let host = host.to_lowercase();
            host.strip_prefix("www.").map_or(host.clone(), String::from)
        })
    }
}
