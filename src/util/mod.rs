use chrono::{DateTime, Datelike, TimeZone};
use reqwest::Url;

pub(crate) const CURRENCY_SUFFIX: &str = "DKK";

const MONTHS_SHORT: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sept", "oct", "nov", "dec",
];

pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

pub(crate) fn now_secs() -> i64 {
    now_ms() / 1000
}

/// Dashboard "Avg. price" column: `0 DKK` for an empty wishlist, otherwise
/// the mean with exactly two decimals.
pub(crate) fn format_average_price(avg: Option<f64>) -> String {
    match avg {
        None => format!("0 {CURRENCY_SUFFIX}"),
        Some(v) => format!("{:.2} {CURRENCY_SUFFIX}", v),
    }
}

/// Danish currency display, e.g. `1.234,50 kr.`.
pub(crate) fn format_dkk(price: f64) -> String {
    let cents = (price.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if price < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped},{frac:02} kr.")
}

/// `DD. mon YYYY`, with British short month names lower-cased (`sept`).
pub(crate) fn format_created_at<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let month = MONTHS_SHORT[dt.month0() as usize];
    format!("{:02}. {} {}", dt.day(), month, dt.year())
}

/// Host shown on a wish card: parsed host with a leading `www.` removed.
///
/// Links saved without a scheme are parsed as `https://`; anything that still
/// does not parse is shown as entered.
pub(crate) fn display_host(link: &str) -> String {
    let link = link.trim();
    let parsed = Url::parse(link).or_else(|_| Url::parse(&format!("https://{link}")));

    match parsed.ok().and_then(|u| u.host_str().map(|h| h.to_string())) {
        Some(host) => host.strip_prefix("www.").unwrap_or(&host).to_string(),
        None => link.to_string(),
    }
}

/// Link as opened in a new tab; scheme-less links get `https://`.
pub(crate) fn absolute_link(link: &str) -> String {
    let link = link.trim();
    let lower = link.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        link.to_string()
    } else {
        format!("https://{link}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_average_price_empty_wishlist() {
        assert_eq!(format_average_price(None), "0 DKK");
    }

    #[test]
    fn test_average_price_two_decimals() {
        assert_eq!(format_average_price(Some(100.0)), "100.00 DKK");
        assert_eq!(format_average_price(Some(10.0 / 3.0)), "3.33 DKK");
        assert_eq!(format_average_price(Some(0.5)), "0.50 DKK");
    }

    #[test]
    fn test_format_dkk() {
        assert_eq!(format_dkk(0.0), "0,00 kr.");
        assert_eq!(format_dkk(99.0), "99,00 kr.");
        assert_eq!(format_dkk(1234.5), "1.234,50 kr.");
        assert_eq!(format_dkk(1234567.891), "1.234.567,89 kr.");
        assert_eq!(format_dkk(-12.3), "-12,30 kr.");
    }

    #[test]
    fn test_format_created_at() {
        let dt = Utc.with_ymd_and_hms(2023, 9, 5, 10, 0, 0).unwrap();
        assert_eq!(format_created_at(&dt), "05. sept 2023");

        let dt = Utc.with_ymd_and_hms(2024, 12, 24, 0, 0, 0).unwrap();
        assert_eq!(format_created_at(&dt), "24. dec 2024");
    }

    #[test]
    fn test_format_created_at_uses_given_offset() {
        // 23:30 UTC on Dec 31 is already Jan 1 in Copenhagen (UTC+1).
        let utc = Utc.with_ymd_and_hms(2023, 12, 31, 23, 30, 0).unwrap();
        let cph = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(format_created_at(&utc.with_timezone(&cph)), "01. jan 2024");
    }

    #[test]
    fn test_display_host_strips_www() {
        assert_eq!(display_host("https://www.example.com/x"), "example.com");
        assert_eq!(display_host("http://shop.example.dk/a?b=1"), "shop.example.dk");
    }

    #[test]
    fn test_display_host_without_scheme() {
        assert_eq!(display_host("www.example.com/path"), "example.com");
    }

    #[test]
    fn test_display_host_unparsable_falls_back_to_raw() {
        assert_eq!(display_host("not a url"), "not a url");
    }

    #[test]
    fn test_absolute_link() {
        assert_eq!(absolute_link("example.com/x"), "https://example.com/x");
        assert_eq!(absolute_link(" http://example.com "), "http://example.com");
        assert_eq!(absolute_link("HTTPS://Example.com"), "HTTPS://Example.com");
    }
}
