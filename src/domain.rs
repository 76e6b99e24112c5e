use publicsuffix::{List, Psl};
use std::path::Path;
use tracing::{debug, info};
use url::{Host, Url};

use crate::{error::AppError, types::UrlReference};

const BUNDLED_SUFFIX_LIST: &str = include_str!("../data/public_suffix_list.dat");

const ICANN_BEGIN: &str = "// ===BEGIN ICANN DOMAINS===";
const ICANN_END: &str = "// ===END ICANN DOMAINS===";

pub struct DomainParser {
    psl: List,
}

impl DomainParser {
    pub fn bundled() -> Result<Self, AppError> {
        Self::from_rules(BUNDLED_SUFFIX_LIST)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let parser = Self::from_rules(&content)?;
        info!("Loaded public suffix list from {}", path.display());
        Ok(parser)
    }

    /// Only the ICANN section is kept; private registrations such as
    /// `github.io` are treated as ordinary domains.
    pub fn from_rules(content: &str) -> Result<Self, AppError> {
        let psl: List = icann_section(content).parse()?;
        Ok(Self { psl })
    }

    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }

    pub fn parse_url(&self, raw: &str) -> Result<UrlReference, AppError> {
        let url = Url::parse(raw)
            .map_err(|e| AppError::InvalidInput(format!("Invalid URL: {}", e)))?;

        let (host, (subdomain, domain, suffix)) = match url.host() {
            Some(Host::Domain(name)) => {
                let host = name.to_lowercase();
                let parts = self.split_host(&host);
                (host, parts)
            }
            Some(Host::Ipv4(ip)) => (ip.to_string(), (String::new(), ip.to_string(), String::new())),
            Some(Host::Ipv6(ip)) => (ip.to_string(), (String::new(), ip.to_string(), String::new())),
            None => (String::new(), (String::new(), String::new(), String::new())),
        };

        let reference = UrlReference {
            raw: raw.to_string(),
            scheme: url.scheme().to_string(),
            netloc: netloc(raw).to_string(),
            host,
            path: url.path().to_string(),
            subdomain,
            domain,
            suffix,
        };
        debug!("Parsed URL reference: {:?}", reference);
        Ok(reference)
    }

    /// Returns `(subdomain, domain, suffix)`. Hosts under an unlisted
    /// suffix get an empty suffix and keep their last label as the domain.
    pub fn split_host(&self, host: &str) -> (String, String, String) {
        let host = host.trim_end_matches('.');

        let suffix = self
            .psl
            .suffix(host.as_bytes())
            .filter(|suffix| suffix.is_known())
            .and_then(|suffix| std::str::from_utf8(suffix.as_bytes()).ok())
            .filter(|suffix| suffix.len() <= host.len())
            .unwrap_or("");

        let rest = host[..host.len() - suffix.len()].trim_end_matches('.');
        let (subdomain, domain) = match rest.rsplit_once('.') {
            Some((subdomain, domain)) => (subdomain, domain),
            None => ("", rest),
        };

        (subdomain.to_string(), domain.to_string(), suffix.to_string())
    }
}

// Whole input when the section markers are missing.
fn icann_section(content: &str) -> &str {
    let Some(start) = content.find(ICANN_BEGIN) else {
        return content;
    };
    match content[start..].find(ICANN_END) {
        Some(end) => &content[start..start + end + ICANN_END.len()],
        None => &content[start..],
    }
}

/// Authority as written in the URL, the way a generic URL splitter reports
/// it: everything between `scheme://` and the next `/`, `?` or `#`.
fn netloc(raw: &str) -> &str {
    let Some((_, rest)) = raw.split_once(':') else {
        return "";
    };
    let Some(rest) = rest.strip_prefix("//") else {
        return "";
    };
    let end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> DomainParser {
        DomainParser::bundled().unwrap()
    }

    #[test]
    fn splits_multi_label_suffix() {
        let (subdomain, domain, suffix) = parser().split_host("www.example.co.uk");
        assert_eq!(subdomain, "www");
        assert_eq!(domain, "example");
        assert_eq!(suffix, "co.uk");
    }

    #[test]
    fn splits_nested_subdomains() {
        let (subdomain, domain, suffix) = parser().split_host("a.b.login.example.com");
        assert_eq!(subdomain, "a.b.login");
        assert_eq!(domain, "example");
        assert_eq!(suffix, "com");
    }

    #[test]
    fn unknown_suffix_is_left_empty() {
        let (subdomain, domain, suffix) = parser().split_host("intranet.corp.invalidtld");
        assert_eq!(subdomain, "intranet.corp");
        assert_eq!(domain, "invalidtld");
        assert_eq!(suffix, "");
    }

    #[test]
    fn short_link_suffixes_are_listed() {
        let url = parser().parse_url("https://bit.ly/3abc").unwrap();
        assert_eq!(url.subdomain, "");
        assert_eq!(url.domain, "bit");
        assert_eq!(url.suffix, "ly");

        for (host, domain, suffix) in [
            ("discord.gg", "discord", "gg"),
            ("paypal-login.to", "paypal-login", "to"),
            ("secure.bank.ir", "bank", "ir"),
        ] {
            let (_, d, s) = parser().split_host(host);
            assert_eq!((d.as_str(), s.as_str()), (domain, suffix));
        }
    }

    #[test]
    fn private_rules_are_ignored() {
        let rules = "// ===BEGIN ICANN DOMAINS===\nio\ncom\n// ===END ICANN DOMAINS===\n\
                     // ===BEGIN PRIVATE DOMAINS===\ngithub.io\n// ===END PRIVATE DOMAINS===\n";
        let parser = DomainParser::from_rules(rules).unwrap();

        let (subdomain, domain, suffix) = parser.split_host("phish.github.io");
        assert_eq!(subdomain, "phish");
        assert_eq!(domain, "github");
        assert_eq!(suffix, "io");
    }

    #[test]
    fn bundled_list_has_no_private_section() {
        let (subdomain, domain, suffix) = parser().split_host("phish.github.io");
        assert_eq!((subdomain.as_str(), domain.as_str(), suffix.as_str()), ("phish", "github", "io"));
    }

    #[test]
    fn parses_url_reference() {
        let url = parser()
            .parse_url("https://User@Shop.Example.com:8443/login?next=/#top")
            .unwrap();

        assert_eq!(url.scheme, "https");
        assert_eq!(url.netloc, "User@Shop.Example.com:8443");
        assert_eq!(url.host, "shop.example.com");
        assert_eq!(url.path, "/login");
        assert_eq!(url.subdomain, "shop");
        assert_eq!(url.domain, "example");
        assert_eq!(url.suffix, "com");
    }

    #[test]
    fn ip_hosts_have_no_suffix() {
        let url = parser().parse_url("http://192.168.1.10/admin").unwrap();
        assert_eq!(url.domain, "192.168.1.10");
        assert_eq!(url.suffix, "");
        assert_eq!(url.subdomain, "");
    }

    #[test]
    fn rejects_unparseable_url() {
        let err = parser().parse_url("not a url").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn netloc_matches_raw_authority() {
        assert_eq!(netloc("http://example.com"), "example.com");
        assert_eq!(netloc("http://example.com?q=1"), "example.com");
        assert_eq!(netloc("mailto:someone@example.com"), "");
    }
}
