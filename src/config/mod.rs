use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_SUPABASE_URL: &str = "http://localhost:54321";

/// Runtime backend configuration.
///
/// Read from `window.ENV` so the same wasm bundle can be deployed against
/// different backends without a rebuild.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub supabase_url: String,
    pub anon_key: String,
}

impl EnvConfig {
    pub fn new(supabase_url: &str, anon_key: &str) -> Self {
        Self {
            supabase_url: normalize_base_url(supabase_url),
            anon_key: anon_key.trim().to_string(),
        }
    }

    pub fn load() -> Self {
        let url = read_env_string(&["SUPABASE_URL", "supabase_url"])
            .unwrap_or_else(|| DEFAULT_SUPABASE_URL.to_string());
        let key = read_env_string(&["SUPABASE_ANON_KEY", "supabase_anon_key"]).unwrap_or_default();

        if key.is_empty() {
            log::warn!("window.ENV.SUPABASE_ANON_KEY is not set; backend requests will be rejected");
        }

        Self::new(&url, &key)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.supabase_url, path)
    }

    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1{}", self.supabase_url, path)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::load()
    }
}

/// Reads the first string-valued key found on `window.ENV`.
///
/// Upper-case keys are the documented form; lower-case ones are accepted for
/// older deployments.
fn read_env_string(keys: &[&str]) -> Option<String> {
    let window = web_sys::window()?;
    let env = window.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }

    keys.iter().find_map(|k| {
        js_sys::Reflect::get(&env, &(*k).into())
            .ok()
            .and_then(|v| v.as_string())
            .filter(|s| !s.trim().is_empty())
    })
}

pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slashes_are_trimmed() {
        let c = EnvConfig::new("https://abc.supabase.co//", " key ");
        assert_eq!(c.supabase_url, "https://abc.supabase.co");
        assert_eq!(c.anon_key, "key");
    }

    #[test]
    fn test_endpoint_urls() {
        let c = EnvConfig::new("https://abc.supabase.co", "k");
        assert_eq!(c.auth_url("/user"), "https://abc.supabase.co/auth/v1/user");
        assert_eq!(
            c.rest_url("/wishlists"),
            "https://abc.supabase.co/rest/v1/wishlists"
        );
    }
}
