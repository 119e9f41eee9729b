use crate::models::{NewWish, NewWishlist};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Permissive URL shape check shared by the link and image fields: optional
/// http(s) scheme, a domain or IPv4 literal, then optional port, path, query
/// and fragment.
///
/// ASCII only: `(?-u)` keeps `[a-z]` from case-folding to non-ASCII letters
/// and digits are spelled `[0-9]`.
const URL_PATTERN: &str = concat!(
    r"(?i-u)^(https?://)?",
    r"((([a-z0-9]([a-z0-9-]*[a-z0-9])*)\.)+[a-z]{2,}|",
    r"(([0-9]{1,3}\.){3}[0-9]{1,3}))",
    r"(:[0-9]+)?",
    r"(/[-a-z0-9%_.~+]*)*",
    r"(\?[;&a-z0-9%_.~+=-]*)?",
    r"(#[-a-z0-9_]*)?$",
);

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(URL_PATTERN).expect("URL_PATTERN is a valid regex"))
}

pub(crate) fn is_valid_url(input: &str) -> bool {
    url_regex().is_match(input)
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FieldError {
    #[error("{0} is required.")]
    Required(&'static str),

    #[error("Price must be a non-negative number.")]
    InvalidPrice,

    #[error("Link URL is invalid.")]
    InvalidLink,

    #[error("Image URL is invalid.")]
    InvalidImage,
}

fn required(value: &str, label: &'static str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::Required(label))
    } else {
        None
    }
}

pub(crate) fn parse_price(input: &str) -> Result<f64, FieldError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FieldError::Required("Price"));
    }
    match input.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(FieldError::InvalidPrice),
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WishlistForm {
    pub name: String,
}

impl WishlistForm {
    pub fn validate(&self) -> Option<FieldError> {
        required(&self.name, "Name")
    }

    pub fn into_new_wishlist(self, user_id: &str) -> Result<NewWishlist, FieldError> {
        if let Some(e) = self.validate() {
            return Err(e);
        }
        Ok(NewWishlist {
            name: self.name.trim().to_string(),
            user_id: user_id.to_string(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WishForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub link_url: String,
    pub img_url: String,
}

/// Per-field validation outcome; each field is judged independently.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct WishFormErrors {
    pub name: Option<FieldError>,
    pub description: Option<FieldError>,
    pub price: Option<FieldError>,
    pub link_url: Option<FieldError>,
    pub img_url: Option<FieldError>,
}

impl WishFormErrors {
    pub fn is_valid(&self) -> bool {
        self.first().is_none()
    }

    /// The error reported in the blocking notification.
    pub fn first(&self) -> Option<FieldError> {
        self.name
            .or(self.description)
            .or(self.price)
            .or(self.link_url)
            .or(self.img_url)
    }
}

impl WishForm {
    pub fn validate(&self) -> WishFormErrors {
        WishFormErrors {
            name: required(&self.name, "Name"),
            description: required(&self.description, "Description"),
            price: parse_price(&self.price).err(),
            link_url: (!is_valid_url(self.link_url.trim())).then_some(FieldError::InvalidLink),
            img_url: (!is_valid_url(self.img_url.trim())).then_some(FieldError::InvalidImage),
        }
    }

    pub fn to_new_wish(&self, wishlist_id: &str) -> Result<NewWish, FieldError> {
        if let Some(e) = self.validate().first() {
            return Err(e);
        }
        Ok(NewWish {
            wishlist_id: wishlist_id.to_string(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price: parse_price(&self.price)?,
            img_url: self.img_url.trim().to_string(),
            link_url: self.link_url.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> WishForm {
        WishForm {
            name: "MacBook Air M1".to_string(),
            description: "16GB RAM, 512GB storage".to_string(),
            price: "7999.95".to_string(),
            link_url: "https://www.apple.com/dk/macbook-air/".to_string(),
            img_url: "https://example.com/images/mba.jpg".to_string(),
        }
    }

    #[test]
    fn test_url_pattern_accepts_common_urls() {
        for ok in [
            "https://example.com/a?b=1",
            "http://example.com",
            "example.com",
            "sub.domain.example.co.uk/path/to/page.html",
            "HTTPS://EXAMPLE.COM/UPPER",
            "http://192.168.1.10:8080/img.png",
            "https://example.com/a#section-2",
            "https://shop.example.dk/p/123?ref=abc&utm_source=x",
        ] {
            assert!(is_valid_url(ok), "expected valid: {ok}");
        }
    }

    #[test]
    fn test_url_pattern_rejects_non_urls() {
        for bad in [
            "not a url",
            "",
            "https://",
            "ftp://example.com",
            "example",
            "https://exa mple.com",
            "https://-example.com",
        ] {
            assert!(!is_valid_url(bad), "expected invalid: {bad}");
        }
    }

    #[test]
    fn test_url_pattern_is_ascii_only() {
        for bad in [
            "https://\u{0661}\u{0662}\u{0663}.\u{0661}.\u{0661}.\u{0661}",
            "https://\u{212A}elvin.com",
            "https://example.co\u{212A}",
            "http://192.168.1.\u{0661}0",
        ] {
            assert!(!is_valid_url(bad), "expected invalid: {bad}");
        }
        assert!(is_valid_url("https://KELVIN.com"));
    }

    #[test]
    fn test_valid_form_builds_insert_row() {
        let row = filled().to_new_wish("wl-1").expect("form should be valid");
        assert_eq!(row.wishlist_id, "wl-1");
        assert_eq!(row.price, 7999.95);
        assert_eq!(row.link_url, "https://www.apple.com/dk/macbook-air/");
    }

    #[test]
    fn test_invalid_urls_reported_independently() {
        let form = WishForm {
            link_url: "not a url".to_string(),
            img_url: "not a url".to_string(),
            ..filled()
        };
        let errors = form.validate();
        assert_eq!(errors.link_url, Some(FieldError::InvalidLink));
        assert_eq!(errors.img_url, Some(FieldError::InvalidImage));
        assert_eq!(errors.name, None);
        assert!(!errors.is_valid());

        // The link error is the one surfaced first.
        assert_eq!(form.to_new_wish("wl-1"), Err(FieldError::InvalidLink));
        assert_eq!(FieldError::InvalidLink.to_string(), "Link URL is invalid.");
    }

    #[test]
    fn test_only_image_invalid() {
        let form = WishForm {
            img_url: "nope".to_string(),
            ..filled()
        };
        let errors = form.validate();
        assert_eq!(errors.link_url, None);
        assert_eq!(errors.first(), Some(FieldError::InvalidImage));
    }

    #[test]
    fn test_price_parsing() {
        assert_eq!(parse_price(" 12.5 "), Ok(12.5));
        assert_eq!(parse_price("0"), Ok(0.0));
        assert_eq!(parse_price(""), Err(FieldError::Required("Price")));
        assert_eq!(parse_price("-1"), Err(FieldError::InvalidPrice));
        assert_eq!(parse_price("abc"), Err(FieldError::InvalidPrice));
        assert_eq!(parse_price("NaN"), Err(FieldError::InvalidPrice));
        assert_eq!(parse_price("inf"), Err(FieldError::InvalidPrice));
    }

    #[test]
    fn test_blank_required_fields() {
        let form = WishForm {
            name: "   ".to_string(),
            description: String::new(),
            ..filled()
        };
        let errors = form.validate();
        assert_eq!(errors.name, Some(FieldError::Required("Name")));
        assert_eq!(errors.description, Some(FieldError::Required("Description")));
        assert_eq!(errors.first(), Some(FieldError::Required("Name")));
    }

    #[test]
    fn test_wishlist_form() {
        let empty = WishlistForm::default();
        assert_eq!(empty.validate(), Some(FieldError::Required("Name")));

        let row = WishlistForm {
            name: " Christmas 2023 ".to_string(),
        }
        .into_new_wishlist("u1")
        .expect("should be valid");
        assert_eq!(row.name, "Christmas 2023");
        assert_eq!(row.user_id, "u1");
    }
}
