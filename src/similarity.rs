/// Length of the longest common substring of `a` and `b`, counted in
/// characters. Classic dynamic-programming table, kept one row at a time.
pub fn longest_common_substring(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    let mut longest = 0;

    for x in 1..=a.len() {
        for y in 1..=b.len() {
            current[y] = if a[x - 1] == b[y - 1] {
                previous[y - 1] + 1
            } else {
                0
            };
            longest = longest.max(current[y]);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    longest
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleMatch {
    /// `100 * lcs / domain_length`, zero for an empty domain.
    pub score: f64,
    /// Whether the whole domain occurs in the title. Diagnostic only.
    pub domain_in_title: bool,
}

/// Compares an already lower-cased domain label against a lower-cased title.
pub fn domain_title_match(domain: &str, title: &str) -> TitleMatch {
    let domain_len = domain.chars().count();
    let score = if domain_len > 0 {
        longest_common_substring(domain, title) as f64 / domain_len as f64 * 100.0
    } else {
        0.0
    };

    TitleMatch {
        score,
        domain_in_title: title.contains(domain),
    }
}
