use crate::{
    error::AppError,
    types::{LexicalFeatures, UrlReference},
};

const OTHER_SPECIAL_CHARS: [char; 10] = ['=', '?', '@', '#', '^', '&', '*', '<', '>', '~'];

pub fn extract_lexical_features(url: &UrlReference) -> Result<LexicalFeatures, AppError> {
    let chars: Vec<char> = url.raw.chars().collect();
    let url_length = chars.len();
    if url_length == 0 {
        return Err(AppError::InvalidInput("URL must not be empty".to_string()));
    }
    let total = url_length as f64;

    let letters = chars.iter().filter(|c| c.is_alphabetic()).count();
    let no_of_digits = chars.iter().filter(|c| c.is_ascii_digit()).count();
    let no_of_other_special_chars = chars
        .iter()
        .filter(|c| OTHER_SPECIAL_CHARS.contains(c))
        .count();

    let no_of_sub_domain = if url.subdomain.is_empty() {
        0
    } else {
        url.subdomain.split('.').count()
    };

    Ok(LexicalFeatures {
        url_length,
        domain_length: url.netloc.chars().count(),
        tld: url.suffix.clone(),
        char_continuation_rate: char_continuation_rate(&chars),
        tld_length: url.suffix.chars().count(),
        no_of_sub_domain,
        letter_ratio: letters as f64 / total,
        no_of_digits,
        digit_ratio: no_of_digits as f64 / total,
        no_of_other_special_chars,
        special_char_ratio: no_of_other_special_chars as f64 / total,
        is_https: url.scheme == "https",
    })
}

/// Share of adjacent pairs whose characters are both alphabetic or both
/// not. Zero when there are no pairs.
pub fn char_continuation_rate(chars: &[char]) -> f64 {
    let pairs = chars.len().saturating_sub(1);
    if pairs == 0 {
        return 0.0;
    }

    let continued = chars
        .windows(2)
        .filter(|pair| pair[0].is_alphabetic() == pair[1].is_alphabetic())
        .count();

    continued as f64 / pairs as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainParser;

    fn features(raw: &str) -> LexicalFeatures {
        let url = DomainParser::bundled().unwrap().parse_url(raw).unwrap();
        extract_lexical_features(&url).unwrap()
    }

    fn rate(text: &str) -> f64 {
        let chars: Vec<char> = text.chars().collect();
        char_continuation_rate(&chars)
    }

    #[test]
    fn continuation_rate_bounds() {
        assert_eq!(rate("1234567"), 1.0);
        assert_eq!(rate("abcdef"), 1.0);
        assert_eq!(rate("a1a1a1"), 0.0);
        assert_eq!(rate("x"), 0.0);
        assert_eq!(rate("aa11"), 2.0 / 3.0);
    }

    #[test]
    fn counts_url_characters() {
        let f = features("https://login.secure.paypal.com/a?b=1&c=2#x");

        assert_eq!(f.url_length, 43);
        assert_eq!(f.domain_length, "login.secure.paypal.com".len());
        assert_eq!(f.tld, "com");
        assert_eq!(f.tld_length, 3);
        assert_eq!(f.no_of_sub_domain, 2);
        assert_eq!(f.no_of_digits, 2);
        // '?', '=', '&', '=', '#'
        assert_eq!(f.no_of_other_special_chars, 5);
        assert!(f.is_https);
    }

    #[test]
    fn ratios_stay_in_unit_interval() {
        for raw in [
            "http://example.com",
            "http://192.168.0.1:8080/~user/index.php?id=1&x=<y>",
            "https://a.b.c.d.example.co.uk/@@@@###",
        ] {
            let f = features(raw);
            for ratio in [
                f.letter_ratio,
                f.digit_ratio,
                f.special_char_ratio,
                f.char_continuation_rate,
            ] {
                assert!((0.0..=1.0).contains(&ratio), "{} gave {}", raw, ratio);
            }
        }
    }

    #[test]
    fn tilde_counts_as_special() {
        let f = features("http://example.com/~a");
        assert_eq!(f.no_of_other_special_chars, 1);
    }

    #[test]
    fn https_flag_requires_exact_scheme() {
        assert!(!features("http://example.com").is_https);
        assert!(!features("ftp://example.com").is_https);
    }

    #[test]
    fn no_subdomain_counts_zero() {
        let f = features("http://example.com");
        assert_eq!(f.no_of_sub_domain, 0);
        assert_eq!(f.url_length, 18);
        assert_eq!(f.domain_length, 11);
    }
}
