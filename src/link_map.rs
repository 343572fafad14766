//! Caller-owned anchor-text → URL mapping and heuristic href recovery.
//!
//! Editing layers occasionally corrupt link targets: a copy/paste through a
//! dev environment leaves `http://localhost:3000/...` placeholders, or an
//! href collapses to `"#"`. The mapping context lets the host register the
//! anchor→URL associations it knows about (from prior document metadata) so
//! markdown serialization can repair such links. Recovery is best effort;
//! conversion never fails because of a broken link.

use regex::Regex;
use std::sync::LazyLock;

/// Hosts that only ever appear as dev/placeholder targets. An href pointing
/// at one of these is treated as corrupted at serialization time.
static LOCAL_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0|\[::1\])(?::\d+)?(?:[/?#]|$)")
        .unwrap()
});

/// Insertion-ordered mapping from literal anchor text to a canonical URL.
///
/// Owned by the caller and passed explicitly into serialization; it has no
/// lifecycle of its own and is never mutated by the conversion functions.
/// Insertion order matters: substring recovery returns the first match.
#[derive(Debug, Clone, Default)]
pub struct LinkMap {
    entries: Vec<(String, String)>,
}

impl LinkMap {
    pub fn new() -> LinkMap {
        LinkMap::default()
    }

    /// Registers an anchor-text → URL association, replacing any existing
    /// entry for the same text.
    pub fn add(&mut self, text: impl Into<String>, url: impl Into<String>) {
        let text = text.into();
        let url = url.into();
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| *t == text) {
            entry.1 = url;
        } else {
            self.entries.push((text, url));
        }
    }

    pub fn add_many<I, S, U>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (S, U)>,
        S: Into<String>,
        U: Into<String>,
    {
        for (text, url) in pairs {
            self.add(text, url);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Exact-text lookup.
    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == text)
            .map(|(_, url)| url.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, u)| (t.as_str(), u.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True for absolute `http(s)` URLs not pointing at a local/dev host.
pub fn is_clean_absolute_url(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://")) && !LOCAL_HOST.is_match(url)
}

/// True when an href should go through recovery before serialization.
pub fn looks_corrupted(href: &str) -> bool {
    href == "#" || LOCAL_HOST.is_match(href)
}

/// Best-effort recovery of a corrupted link target.
///
/// Policy, in order: a clean absolute href wins unchanged; then an exact
/// anchor-text match in the mapping; then a case-insensitive substring match
/// in either direction (first insertion-order hit); then the anchor text
/// itself if it is an absolute URL; otherwise the incoming href is returned
/// unchanged, possibly still broken.
pub fn recover_href(anchor_text: &str, current_href: &str, links: &LinkMap) -> String {
    if is_clean_absolute_url(current_href) {
        return current_href.to_string();
    }

    if let Some(url) = links.get(anchor_text) {
        return url.to_string();
    }

    let anchor_lower = anchor_text.to_lowercase();
    if !anchor_lower.trim().is_empty() {
        for (text, url) in links.iter() {
            let known_lower = text.to_lowercase();
            if anchor_lower.contains(&known_lower) || known_lower.contains(&anchor_lower) {
                return url.to_string();
            }
        }
    }

    if anchor_text.starts_with("http://") || anchor_text.starts_with("https://") {
        return anchor_text.to_string();
    }

    log::debug!("could not recover link target for anchor {anchor_text:?} (href {current_href:?})");
    current_href.to_string()
}
