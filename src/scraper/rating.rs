//! Parsing of the review summary block ("4,5 (1.234)" and friends).

/// Average rating and review count; either may be unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReviewSummary {
    pub average: Option<f64>,
    pub count: Option<u32>,
}

/// Parse the visible text of the review block.
///
/// The first whitespace token is the average (comma or dot decimal). The
/// count is taken from a parenthesized token after it, or failing that from
/// the second token when it is purely numeric.
pub fn parse_review_block(text: &str) -> ReviewSummary {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some((first, rest)) = tokens.split_first() else {
        return ReviewSummary::default();
    };

    let average = parse_average(first);

    let count = rest
        .iter()
        .filter(|t| t.starts_with('('))
        .find_map(|t| parse_count(t.trim_start_matches('(').trim_end_matches(')')))
        .or_else(|| rest.first().and_then(|t| parse_count(t)));

    ReviewSummary { average, count }
}

/// Leading number of an accessibility label such as "1.234 avaliações".
pub fn parse_count_label(label: &str) -> Option<u32> {
    label.split_whitespace().next().and_then(parse_count)
}

fn parse_average(token: &str) -> Option<f64> {
    token
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Digits with optional `.`/`,` thousands separators.
fn parse_count(token: &str) -> Option<u32> {
    let digits: String = token.chars().filter(|c| *c != '.' && *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_decimal_with_parenthesized_count() {
        let s = parse_review_block("4,5 (123)");
        assert_eq!(s.average, Some(4.5));
        assert_eq!(s.count, Some(123));
    }

    #[test]
    fn test_average_only() {
        let s = parse_review_block("4.5");
        assert_eq!(s.average, Some(4.5));
        assert_eq!(s.count, None);
    }

    #[test]
    fn test_garbled() {
        assert_eq!(parse_review_block("garbled"), ReviewSummary::default());
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_review_block("   "), ReviewSummary::default());
    }

    #[test]
    fn test_thousands_separator_in_count() {
        let s = parse_review_block("4,7\n(1.234)");
        assert_eq!(s.average, Some(4.7));
        assert_eq!(s.count, Some(1234));

        let s = parse_review_block("3.9 (12,345)");
        assert_eq!(s.count, Some(12345));
    }

    #[test]
    fn test_bare_second_token_count() {
        let s = parse_review_block("4.1 87");
        assert_eq!(s.average, Some(4.1));
        assert_eq!(s.count, Some(87));
    }

    #[test]
    fn test_non_numeric_second_token() {
        let s = parse_review_block("4.1 stars");
        assert_eq!(s.average, Some(4.1));
        assert_eq!(s.count, None);
    }

    #[test]
    fn test_bad_average_keeps_count() {
        let s = parse_review_block("New (5)");
        assert_eq!(s.average, None);
        assert_eq!(s.count, Some(5));
    }

    #[test]
    fn test_unparseable_parenthesized_falls_through() {
        // "(reviews)" is not a count; the second token is not numeric either
        let s = parse_review_block("4.0 (reviews)");
        assert_eq!(s.count, None);
    }

    #[test]
    fn test_count_label() {
        assert_eq!(parse_count_label("1.234 avaliações"), Some(1234));
        assert_eq!(parse_count_label("87 reviews"), Some(87));
        assert_eq!(parse_count_label("reviews"), None);
        assert_eq!(parse_count_label(""), None);
    }
}
