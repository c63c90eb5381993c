//! Contact extraction from rendered pages.
//!
//! Emails are matched in visible text and `<meta content>` values, including
//! the usual human obfuscations (`[at]`, `(dot)`, ` at `, ...). Social profile
//! links come from anchors, either by href domain or by an `@handle` anchor
//! whose accessible label names the platform.

use harvest_browser::{Anchor, FetchedPage};
use harvest_core::{Platform, SiteResult};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, BTreeSet};

/// Compiled patterns (initialized once on first use)
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b[a-z0-9._%+-]+",
        r"\s*(?:@|\[at\]|\(at\)|\s+at\s+)\s*",
        r"[a-z0-9.-]+",
        r"\s*(?:\.|\[dot\]|\(dot\)|\s+dot\s+)\s*",
        r"[a-z]{2,}\b",
    ))
    .expect("Email regex is hardcoded and valid")
});

static SPACED_AT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+at\s+").expect("At regex is hardcoded and valid"));

static SPACED_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+dot\s+").expect("Dot regex is hardcoded and valid"));

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[content]").expect("Meta selector is hardcoded and valid"));

/// Contacts found so far, kept as canonical sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSet {
    /// Canonical email addresses
    pub emails: BTreeSet<String>,
    /// Canonical profile URLs per platform
    pub socials: BTreeMap<Platform, BTreeSet<String>>,
}

impl ContactSet {
    /// Profile URLs collected for `platform`.
    #[must_use]
    pub fn social(&self, platform: Platform) -> Vec<&str> {
        self.socials
            .get(&platform)
            .map(|urls| urls.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Union `other` into this set.
    pub fn merge(&mut self, other: ContactSet) {
        self.emails.extend(other.emails);
        for (platform, urls) in other.socials {
            self.socials.entry(platform).or_default().extend(urls);
        }
    }

    /// Materialize as a site result with sorted lists.
    #[must_use]
    pub fn into_site_result(mut self, screenshots: BTreeMap<String, String>) -> SiteResult {
        let mut take = |platform: Platform| -> Vec<String> {
            self.socials
                .remove(&platform)
                .map(|urls| urls.into_iter().collect())
                .unwrap_or_default()
        };

        SiteResult {
            facebook: take(Platform::Facebook),
            instagram: take(Platform::Instagram),
            tiktok: take(Platform::Tiktok),
            emails: self.emails.into_iter().collect(),
            screenshots,
        }
    }
}

/// Extract every contact signal from a fetched page.
#[must_use]
pub fn extract(page: &FetchedPage) -> ContactSet {
    let mut emails = extract_emails(&page.text);
    if page.text.trim().is_empty() {
        emails.extend(extract_emails(&FetchedPage::from_markup(&page.url, &page.markup).text));
    }

    let document = Html::parse_document(&page.markup);
    for meta in document.select(&META_SELECTOR) {
        if let Some(content) = meta.value().attr("content") {
            emails.extend(extract_emails(content));
        }
    }

    ContactSet {
        emails,
        socials: extract_social_links(&page.anchors),
    }
}

/// Find email addresses in free text and return them in canonical form.
#[must_use]
pub fn extract_emails(text: &str) -> BTreeSet<String> {
    EMAIL_PATTERN
        .find_iter(text)
        .map(|m| canonical_email(m.as_str()))
        .collect()
}

fn canonical_email(raw: &str) -> String {
    let lower = raw
        .to_lowercase()
        .replace("[at]", "@")
        .replace("(at)", "@")
        .replace("[dot]", ".")
        .replace("(dot)", ".");
    let lower = SPACED_AT.replace_all(&lower, "@");
    let lower = SPACED_DOT.replace_all(&lower, ".");
    lower.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Collect canonical social profile URLs from anchors.
#[must_use]
pub fn extract_social_links(anchors: &[Anchor]) -> BTreeMap<Platform, BTreeSet<String>> {
    let mut socials: BTreeMap<Platform, BTreeSet<String>> = BTreeMap::new();

    for anchor in anchors {
        let href = anchor.href.trim().to_lowercase();
        let text = anchor.text.trim();
        let label = anchor.aria_label.as_deref().unwrap_or_default().to_lowercase();

        for platform in Platform::ALL {
            let url = if href.contains(platform.domain()) {
                normalize_social_url(&href, platform)
            } else if text.starts_with('@') && label.contains(platform.name()) {
                normalize_social_url(text, platform)
            } else {
                continue;
            };
            socials.entry(platform).or_default().insert(url);
        }
    }

    socials
}

/// Canonical form of a social profile reference.
///
/// `@handle` and bare handles become the platform's profile URL; anything
/// starting with `http` is kept as is. Applying this twice changes nothing.
#[must_use]
pub fn normalize_social_url(raw: &str, platform: Platform) -> String {
    let value = raw.trim().to_lowercase();

    if let Some(handle) = value.strip_prefix('@') {
        return platform.profile_url(handle);
    }
    if !value.starts_with("http") {
        return platform.profile_url(&value);
    }
    value
}
