use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::AppError;

const PLATFORM_LINK_PATTERNS: &[&str] = &[
    r"(?:www\.)?(?:facebook|fb)\.com",
    r"(?:www\.)?twitter\.com",
    r"(?:www\.)?linkedin\.com",
    r"(?:www\.)?instagram\.com",
    r"(?:www\.)?tiktok\.com",
    r"(?:www\.)?pinterest\.com",
    r"(?:www\.)?reddit\.com",
    r"(?:www\.)?youtube\.com",
    r"t\.me",
    r"(?:www\.)?weibo\.com",
    r"(?:www\.)?vk\.com",
];

const BUTTON_CLASS_FRAGMENTS: &[&str] = &[
    "share-button",
    "social-share",
    "share-icon",
    "follow-button",
    "social-icon",
    "social-media",
];

const ELEMENT_TERMS: &[&str] = &["social", "share", "follow", "network", "connect"];

const META_MARKERS: &[&str] = &["og:social", "twitter:card", "fb:app_id", "instagram:"];

const TEXT_PHRASES: &[&str] = &[
    "follow us",
    "share this",
    "connect with us",
    "find us on",
    "join us on",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialTier {
    PlatformLink,
    ButtonClass,
    ElementClass,
    MetaMarker,
    TextPhrase,
}

#[derive(Debug, Clone)]
pub enum SocialSignal {
    PlatformLink(Regex),
    ButtonClass(&'static str),
    ElementClass(&'static str),
    MetaMarker(&'static str),
    TextPhrase(&'static str),
}

impl SocialSignal {
    pub fn tier(&self) -> SocialTier {
        match self {
            SocialSignal::PlatformLink(_) => SocialTier::PlatformLink,
            SocialSignal::ButtonClass(_) => SocialTier::ButtonClass,
            SocialSignal::ElementClass(_) => SocialTier::ElementClass,
            SocialSignal::MetaMarker(_) => SocialTier::MetaMarker,
            SocialSignal::TextPhrase(_) => SocialTier::TextPhrase,
        }
    }

    fn matches(&self, page: &SocialView<'_>) -> bool {
        match self {
            SocialSignal::PlatformLink(pattern) => pattern.is_match(page.lowered),
            SocialSignal::ButtonClass(fragment) | SocialSignal::ElementClass(fragment) => {
                page.class_and_id.iter().any(|value| value.contains(fragment))
            }
            SocialSignal::MetaMarker(marker) => {
                page.meta_keys.iter().any(|value| value.contains(marker))
            }
            SocialSignal::TextPhrase(phrase) => page.lowered.contains(phrase),
        }
    }
}

struct SocialView<'a> {
    lowered: &'a str,
    class_and_id: Vec<String>,
    meta_keys: Vec<String>,
}

pub struct SocialDetector {
    signals: Vec<SocialSignal>,
    class_or_id: Selector,
    meta: Selector,
}

impl SocialDetector {
    pub fn new() -> Result<Self, AppError> {
        let mut signals = Vec::new();
        for pattern in PLATFORM_LINK_PATTERNS {
            let regex = Regex::new(pattern)
                .map_err(|e| AppError::Internal(format!("Invalid social pattern {}: {}", pattern, e)))?;
            signals.push(SocialSignal::PlatformLink(regex));
        }
        signals.extend(BUTTON_CLASS_FRAGMENTS.iter().copied().map(SocialSignal::ButtonClass));
        signals.extend(ELEMENT_TERMS.iter().copied().map(SocialSignal::ElementClass));
        signals.extend(META_MARKERS.iter().copied().map(SocialSignal::MetaMarker));
        signals.extend(TEXT_PHRASES.iter().copied().map(SocialSignal::TextPhrase));

        Ok(Self {
            signals,
            class_or_id: parse_selector("[class], [id]")?,
            meta: parse_selector("meta")?,
        })
    }

    #[cfg(test)]
    pub(crate) fn signals(&self) -> &[SocialSignal] {
        &self.signals
    }

    // `lowered` is the lower-cased raw HTML of `document`.
    pub fn detect(&self, document: &Html, lowered: &str) -> Option<&SocialSignal> {
        let class_and_id = document
            .select(&self.class_or_id)
            .flat_map(|el| {
                let value = el.value();
                [value.attr("class"), value.attr("id")]
            })
            .flatten()
            .map(str::to_lowercase)
            .collect();

        let meta_keys = document
            .select(&self.meta)
            .flat_map(|el| {
                let value = el.value();
                [value.attr("property"), value.attr("name")]
            })
            .flatten()
            .map(str::to_lowercase)
            .collect();

        let view = SocialView {
            lowered,
            class_and_id,
            meta_keys,
        };

        let hit = self.signals.iter().find(|signal| signal.matches(&view));
        if let Some(signal) = hit {
            debug!("Social signal matched in tier {:?}: {:?}", signal.tier(), signal);
        }
        hit
    }
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css)
        .map_err(|e| AppError::FeatureExtraction(format!("Invalid selector {}: {}", css, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(html: &str) -> Option<SocialTier> {
        let detector = SocialDetector::new().unwrap();
        let document = Html::parse_document(html);
        detector
            .detect(&document, &html.to_lowercase())
            .map(SocialSignal::tier)
    }

    #[test]
    fn platform_link_alone_is_enough() {
        let html = r#"<html><body><p>https://www.facebook.com/page</p></body></html>"#;
        assert_eq!(detect(html), Some(SocialTier::PlatformLink));
    }

    #[test]
    fn platform_link_is_case_insensitive() {
        let html = r#"<a href="HTTPS://T.ME/channel">chat</a>"#;
        assert_eq!(detect(html), Some(SocialTier::PlatformLink));
    }

    #[test]
    fn button_class_matches_before_generic_terms() {
        let html = r#"<div class="Header Social-Share-Bar">x</div>"#;
        assert_eq!(detect(html), Some(SocialTier::ButtonClass));
    }

    #[test]
    fn generic_term_in_id() {
        let html = r#"<section id="partnerNetwork">x</section>"#;
        assert_eq!(detect(html), Some(SocialTier::ElementClass));
    }

    #[test]
    fn meta_marker_on_name_attribute() {
        let html = r#"<html><head><meta name="Twitter:Card" content="summary"></head></html>"#;
        assert_eq!(detect(html), Some(SocialTier::MetaMarker));
    }

    #[test]
    fn plain_phrase_matches_last() {
        let html = r#"<p>Please Follow Us for updates</p>"#;
        assert_eq!(detect(html), Some(SocialTier::TextPhrase));
    }

    #[test]
    fn quiet_page_has_no_social_signal() {
        let html = r#"<html><head><title>Invoice</title></head>
            <body><div class="content" id="main"><p>Pay your invoice.</p></div></body></html>"#;
        assert_eq!(detect(html), None);
    }

    #[test]
    fn signals_are_ordered_by_tier() {
        let detector = SocialDetector::new().unwrap();
        let tiers: Vec<SocialTier> = detector.signals().iter().map(SocialSignal::tier).collect();

        assert_eq!(tiers.first(), Some(&SocialTier::PlatformLink));
        assert_eq!(tiers.last(), Some(&SocialTier::TextPhrase));
        assert!(tiers.windows(2).all(|w| w[0] as u8 <= w[1] as u8));
    }
}
