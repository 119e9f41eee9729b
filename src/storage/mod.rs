use crate::models::Session;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub(crate) const SESSION_KEY: &str = "wishlist_session";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = local_storage()?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum StorageError {
    #[error("localStorage is unavailable")]
    Unavailable,

    #[error("could not encode value: {0}")]
    Encode(String),

    #[error("localStorage rejected the change: {0}")]
    Rejected(String),
}

fn rejected(e: JsValue) -> StorageError {
    StorageError::Rejected(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| StorageError::Encode(e.to_string()))?;
    let storage = local_storage().ok_or(StorageError::Unavailable)?;
    storage.set_item(key, &json).map_err(rejected)
}

pub(crate) fn remove_from_storage(key: &str) -> Result<(), StorageError> {
    let storage = local_storage().ok_or(StorageError::Unavailable)?;
    storage.remove_item(key).map_err(rejected)
}

pub(crate) fn load_session_from_storage() -> Option<Session> {
    load_json_from_storage::<Session>(SESSION_KEY)
}

pub(crate) fn save_session_to_storage(session: &Session) {
    if let Err(e) = save_json_to_storage(SESSION_KEY, session) {
        log::warn!("could not persist session: {e}");
    }
}

pub(crate) fn clear_session_storage() {
    if let Err(e) = remove_from_storage(SESSION_KEY) {
        log::warn!("could not clear stored session: {e}");
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::models::User;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_session_storage_roundtrip() {
        clear_session_storage();
        assert!(load_session_from_storage().is_none());

        let session = Session {
            access_token: "t1".to_string(),
            refresh_token: Some("r1".to_string()),
            token_type: "bearer".to_string(),
            expires_at: Some(1_700_000_000),
            user: User {
                id: "u1".to_string(),
                email: Some("u@example.com".to_string()),
                user_metadata: serde_json::json!({}),
            },
        };
        save_session_to_storage(&session);

        let loaded = load_session_from_storage().expect("should load session from localStorage");
        assert_eq!(loaded.user_id(), "u1");
        assert_eq!(loaded.refresh_token.as_deref(), Some("r1"));

        clear_session_storage();
        assert!(load_session_from_storage().is_none());
    }

    #[wasm_bindgen_test]
    fn test_corrupt_session_is_ignored() {
        save_json_to_storage(SESSION_KEY, &"not a session").expect("write should succeed");
        assert!(load_session_from_storage().is_none());
        clear_session_storage();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_unencodable_value_is_reported_not_dropped() {
        // JSON object keys must be strings; the write fails before storage is touched.
        let mut value = BTreeMap::new();
        value.insert((1u8, 2u8), "x");
        let err = save_json_to_storage("k", &value).unwrap_err();
        assert!(matches!(err, StorageError::Encode(_)));
        assert!(err.to_string().starts_with("could not encode value"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(StorageError::Unavailable.to_string(), "localStorage is unavailable");
        assert_eq!(
            StorageError::Rejected("QuotaExceededError".to_string()).to_string(),
            "localStorage rejected the change: QuotaExceededError"
        );
    }
}
