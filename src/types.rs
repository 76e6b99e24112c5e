use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use uuid::Uuid;

// Scaling and the classifier are positional; this order must never change.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "URLLength",
    "DomainLength",
    "TLD",
    "CharContinuationRate",
    "TLDLegitimateProb",
    "TLDLength",
    "NoOfSubDomain",
    "LetterRatioInURL",
    "NoOfDegitsInURL",
    "DegitRatioInURL",
    "NoOfOtherSpecialCharsInURL",
    "SpacialCharRatioInURL",
    "IsHTTPS",
    "LineOfCode",
    "LargestLineLength",
    "HasTitle",
    "DomainTitleMatchScore",
    "HasFavicon",
    "Robots",
    "IsResponsive",
    "HasDescription",
    "NoOfPopup",
    "NoOfiFrame",
    "HasExternalFormSubmit",
    "HasSocialNet",
    "HasSubmitButton",
    "HasHiddenFields",
    "Bank",
    "Pay",
    "HasCopyrightInfo",
    "NoOfImage",
    "NoOfCSS",
    "NoOfJS",
    "NoOfSelfRef",
    "NoOfEmptyRef",
    "NoOfExternalRef",
];

pub const FEATURE_COUNT: usize = 36;

pub const CONTENT_FEATURE_COUNT: usize = 23;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub is_phishing: bool,
    pub probability: f64,
    pub decision_id: Uuid,
    pub content_available: bool,
    pub features: FeatureRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlReference {
    pub raw: String,
    pub scheme: String,
    // Raw authority: userinfo and port included.
    pub netloc: String,
    pub host: String,
    pub path: String,
    pub subdomain: String,
    pub domain: String,
    pub suffix: String,
}

impl UrlReference {
    pub fn robots_url(&self) -> String {
        format!("{}://{}/robots.txt", self.scheme, self.netloc)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexicalFeatures {
    pub url_length: usize,
    pub domain_length: usize,
    pub tld: String,
    pub char_continuation_rate: f64,
    pub tld_length: usize,
    pub no_of_sub_domain: usize,
    pub letter_ratio: f64,
    pub no_of_digits: usize,
    pub digit_ratio: f64,
    pub no_of_other_special_chars: usize,
    pub special_char_ratio: f64,
    pub is_https: bool,
}

// `Default` is the zero-fill used when the page could not be fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentFeatures {
    pub line_of_code: usize,
    pub largest_line_length: usize,
    pub has_title: bool,
    pub domain_title_match_score: f64,
    pub has_favicon: bool,
    pub robots: bool,
    pub is_responsive: bool,
    pub has_description: bool,
    pub no_of_popup: usize,
    pub no_of_iframe: usize,
    pub has_external_form_submit: bool,
    pub has_social_net: bool,
    pub has_submit_button: bool,
    pub has_hidden_fields: bool,
    pub bank: bool,
    pub pay: bool,
    pub has_copyright_info: bool,
    pub no_of_image: usize,
    pub no_of_css: usize,
    pub no_of_js: usize,
    pub no_of_self_ref: usize,
    pub no_of_empty_ref: usize,
    pub no_of_external_ref: usize,
}

impl ContentFeatures {
    pub fn values(&self) -> [f64; CONTENT_FEATURE_COUNT] {
        [
            self.line_of_code as f64,
            self.largest_line_length as f64,
            flag(self.has_title),
            self.domain_title_match_score,
            flag(self.has_favicon),
            flag(self.robots),
            flag(self.is_responsive),
            flag(self.has_description),
            self.no_of_popup as f64,
            self.no_of_iframe as f64,
            flag(self.has_external_form_submit),
            flag(self.has_social_net),
            flag(self.has_submit_button),
            flag(self.has_hidden_fields),
            flag(self.bank),
            flag(self.pay),
            flag(self.has_copyright_info),
            self.no_of_image as f64,
            self.no_of_css as f64,
            self.no_of_js as f64,
            self.no_of_self_ref as f64,
            self.no_of_empty_ref as f64,
            self.no_of_external_ref as f64,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Category(&'a str),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub lexical: LexicalFeatures,
    pub tld_legitimate_prob: f64,
    pub content: ContentFeatures,
}

impl FeatureRecord {
    pub fn entries(&self) -> [(&'static str, FeatureValue<'_>); FEATURE_COUNT] {
        let l = &self.lexical;
        let lexical = [
            FeatureValue::Number(l.url_length as f64),
            FeatureValue::Number(l.domain_length as f64),
            FeatureValue::Category(&l.tld),
            FeatureValue::Number(l.char_continuation_rate),
            FeatureValue::Number(self.tld_legitimate_prob),
            FeatureValue::Number(l.tld_length as f64),
            FeatureValue::Number(l.no_of_sub_domain as f64),
            FeatureValue::Number(l.letter_ratio),
            FeatureValue::Number(l.no_of_digits as f64),
            FeatureValue::Number(l.digit_ratio),
            FeatureValue::Number(l.no_of_other_special_chars as f64),
            FeatureValue::Number(l.special_char_ratio),
            FeatureValue::Number(flag(l.is_https)),
        ];
        let content = self.content.values();

        std::array::from_fn(|i| {
            let value = if i < lexical.len() {
                lexical[i]
            } else {
                FeatureValue::Number(content[i - lexical.len()])
            };
            (FEATURE_NAMES[i], value)
        })
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.entries() {
            match value {
                FeatureValue::Category(text) => map.serialize_entry(name, text)?,
                FeatureValue::Number(number) => map.serialize_entry(name, &number)?,
            }
        }
        map.end()
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> FeatureRecord {
        FeatureRecord {
            lexical: LexicalFeatures {
                url_length: 18,
                domain_length: 11,
                tld: "com".to_string(),
                char_continuation_rate: 0.8,
                tld_length: 3,
                no_of_sub_domain: 0,
                letter_ratio: 0.8,
                no_of_digits: 0,
                digit_ratio: 0.0,
                no_of_other_special_chars: 0,
                special_char_ratio: 0.0,
                is_https: false,
            },
            tld_legitimate_prob: 0.5,
            content: ContentFeatures {
                robots: true,
                no_of_external_ref: 4,
                ..ContentFeatures::default()
            },
        }
    }

    #[test]
    fn entries_follow_column_order() {
        let record = sample_record();
        let entries = record.entries();

        assert_eq!(entries.len(), FEATURE_COUNT);
        for (i, (name, _)) in entries.iter().enumerate() {
            assert_eq!(*name, FEATURE_NAMES[i]);
        }
        assert_eq!(entries[2].1, FeatureValue::Category("com"));
        assert_eq!(entries[4].1, FeatureValue::Number(0.5));
        assert_eq!(entries[18].1, FeatureValue::Number(1.0));
        assert_eq!(entries[35].1, FeatureValue::Number(4.0));
    }

    #[test]
    fn content_block_has_expected_width() {
        let lexical_and_reputation = FEATURE_COUNT - CONTENT_FEATURE_COUNT;
        assert_eq!(FEATURE_NAMES[lexical_and_reputation], "LineOfCode");
        assert!(ContentFeatures::default().values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.starts_with("{\"URLLength\":18.0,\"DomainLength\":11.0,\"TLD\":\"com\""));
        assert!(json.ends_with("\"NoOfExternalRef\":4.0}"));
    }

    #[test]
    fn robots_url_keeps_netloc() {
        let url = UrlReference {
            raw: "http://user@example.com:8080/a".to_string(),
            scheme: "http".to_string(),
            netloc: "user@example.com:8080".to_string(),
            host: "example.com".to_string(),
            path: "/a".to_string(),
            subdomain: String::new(),
            domain: "example".to_string(),
            suffix: "com".to_string(),
        };
        assert_eq!(url.robots_url(), "http://user@example.com:8080/robots.txt");
    }
}
