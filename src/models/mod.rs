use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user as returned by `GET /auth/v1/user`.
///
/// Only `id` and `email` are read by the client; everything else the auth
/// server sends is kept opaque.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// True when the access token is expired or will be within `leeway_secs`.
    pub fn is_expired(&self, now_secs: i64, leeway_secs: i64) -> bool {
        match self.expires_at {
            Some(at) => at - leeway_secs <= now_secs,
            None => false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Wishlist {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Wish {
    pub id: String,
    pub wishlist_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub link_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct NewWishlist {
    pub name: String,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct NewWish {
    pub wishlist_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub img_url: String,
    pub link_url: String,
}

/// A wishlist joined with its wishes, assembled client-side for rendering.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct WishlistWithWishes {
    pub wishlist: Wishlist,
    pub wishes: Vec<Wish>,
}

impl WishlistWithWishes {
    pub fn average_price(&self) -> Option<f64> {
        if self.wishes.is_empty() {
            return None;
        }
        let total: f64 = self.wishes.iter().map(|w| w.price).sum();
        Some(total / self.wishes.len() as f64)
    }
}
