use scraper::{Html, Selector};
use tracing::debug;

use crate::{
    error::AppError,
    similarity::domain_title_match,
    social::{parse_selector, SocialDetector},
    types::{ContentFeatures, UrlReference},
};

const BANK_KEYWORDS: &[&str] = &["bank", "secure", "login"];
const PAY_KEYWORDS: &[&str] = &["pay", "payment", "checkout"];

pub struct PageContent {
    pub raw: String,
    pub lowered: String,
    pub document: Html,
}

impl PageContent {
    pub fn parse(raw: String) -> Self {
        let lowered = raw.to_lowercase();
        let document = Html::parse_document(&raw);
        Self {
            raw,
            lowered,
            document,
        }
    }

    fn count(&self, selector: &Selector) -> usize {
        self.document.select(selector).count()
    }

    fn has(&self, selector: &Selector) -> bool {
        self.document.select(selector).next().is_some()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkCounts {
    pub self_refs: usize,
    pub empty_refs: usize,
    pub external_refs: usize,
}

pub struct StructuralAnalyzer {
    social: SocialDetector,
    title: Selector,
    favicon: Selector,
    viewport: Selector,
    description: Selector,
    iframe: Selector,
    image: Selector,
    stylesheet: Selector,
    script: Selector,
    form: Selector,
    submit: Selector,
    hidden: Selector,
    anchor: Selector,
}

impl StructuralAnalyzer {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            social: SocialDetector::new()?,
            title: parse_selector("title")?,
            favicon: parse_selector(r#"link[rel~="icon"]"#)?,
            viewport: parse_selector(r#"meta[name="viewport"]"#)?,
            description: parse_selector(r#"meta[name="description"]"#)?,
            iframe: parse_selector("iframe")?,
            image: parse_selector("img")?,
            stylesheet: parse_selector(r#"link[rel~="stylesheet"]"#)?,
            script: parse_selector("script")?,
            form: parse_selector("form")?,
            submit: parse_selector(r#"input[type="submit"]"#)?,
            hidden: parse_selector(r#"input[type="hidden"]"#)?,
            anchor: parse_selector("a[href]")?,
        })
    }

    pub fn analyze(&self, html: String, url: &UrlReference, robots: bool) -> ContentFeatures {
        let page = PageContent::parse(html);
        let domain = url.domain.to_lowercase();

        let (has_title, domain_title_match_score) = self.title_match(&page, &domain);
        let links = self.classify_links(&page, &domain);

        let features = ContentFeatures {
            line_of_code: page.raw.matches('\n').count(),
            largest_line_length: largest_line_length(&page.raw),
            has_title,
            domain_title_match_score,
            has_favicon: page.has(&self.favicon),
            robots,
            is_responsive: page.has(&self.viewport),
            has_description: page.has(&self.description),
            no_of_popup: page.lowered.matches("window.open").count(),
            no_of_iframe: page.count(&self.iframe),
            has_external_form_submit: self.has_external_form_submit(&page, &domain),
            has_social_net: self.social.detect(&page.document, &page.lowered).is_some(),
            has_submit_button: page.has(&self.submit),
            has_hidden_fields: page.has(&self.hidden),
            bank: contains_any(&page.lowered, BANK_KEYWORDS),
            pay: contains_any(&page.lowered, PAY_KEYWORDS),
            has_copyright_info: page.raw.contains('©') || page.lowered.contains("copyright"),
            no_of_image: page.count(&self.image),
            no_of_css: page.count(&self.stylesheet),
            no_of_js: page.count(&self.script),
            no_of_self_ref: links.self_refs,
            no_of_empty_ref: links.empty_refs,
            no_of_external_ref: links.external_refs,
        };

        debug!("Content features for {}: {:?}", url.raw, features);
        features
    }

    fn title_match(&self, page: &PageContent, domain: &str) -> (bool, f64) {
        let Some(title) = page.document.select(&self.title).next() else {
            return (false, 0.0);
        };

        let title_text = title.text().collect::<String>().to_lowercase();
        let matched = domain_title_match(domain, &title_text);
        debug!(
            "Title {:?} vs domain {:?}: score {:.1}, exact {}",
            title_text, domain, matched.score, matched.domain_in_title
        );
        (true, matched.score)
    }

    fn has_external_form_submit(&self, page: &PageContent, domain: &str) -> bool {
        page.document.select(&self.form).any(|form| {
            form.value()
                .attr("action")
                .is_some_and(|action| !action.is_empty() && !action.contains(domain))
        })
    }

    // Categories overlap and need not add up to the anchor count.
    pub fn classify_links(&self, page: &PageContent, domain: &str) -> LinkCounts {
        let mut counts = LinkCounts::default();
        for anchor in page.document.select(&self.anchor) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let is_self = href.contains(domain);
            if is_self {
                counts.self_refs += 1;
            }
            if href.is_empty() || href == "#" {
                counts.empty_refs += 1;
            }
            if !is_self && href.starts_with("http") {
                counts.external_refs += 1;
            }
        }
        counts
    }
}

pub fn largest_line_length(html: &str) -> usize {
    html.split('\n')
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
