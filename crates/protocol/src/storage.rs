//! Cookie and storage state types for the authentication state snapshot.
//!
//! A [`StorageState`] is everything a fresh browser needs to appear logged in
//! to the admin panel: the session cookies plus localStorage per origin.

use serde::{Deserialize, Serialize};

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
	/// Sent with same-site and cross-site requests
	#[serde(rename = "None")]
	None,
	/// Sent with same-site requests and cross-site top-level navigations
	#[default]
	#[serde(rename = "Lax")]
	Lax,
	/// Only sent with same-site requests
	#[serde(rename = "Strict")]
	Strict,
}

/// A browser cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,
	pub value: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,

	/// Unix timestamp in seconds (-1 means session cookie)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
}

impl Cookie {
	/// Creates a cookie scoped to `domain`.
	pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: Some(domain.into()),
			path: None,
			expires: None,
			http_only: None,
			secure: None,
			same_site: None,
		}
	}

	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	pub fn expires(mut self, expires: f64) -> Self {
		self.expires = Some(expires);
		self
	}

	pub fn http_only(mut self, http_only: bool) -> Self {
		self.http_only = Some(http_only);
		self
	}

	pub fn secure(mut self, secure: bool) -> Self {
		self.secure = Some(secure);
		self
	}

	pub fn same_site(mut self, same_site: SameSite) -> Self {
		self.same_site = Some(same_site);
		self
	}

	/// Returns true for cookies without a positive expiry timestamp.
	pub fn is_session(&self) -> bool {
		self.expires.is_none_or(|ts| ts < 0.0)
	}
}

/// A localStorage entry within an origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalStorageEntry {
	pub name: String,
	pub value: String,
}

/// Storage state for a single origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
	/// Origin such as `https://ewallet.example.io`
	pub origin: String,
	#[serde(default)]
	pub local_storage: Vec<LocalStorageEntry>,
}

/// Complete browser storage state.
///
/// Serialized as `{"cookies": [...], "origins": [...]}`, which is the layout
/// Playwright writes for `storageState`, so snapshots stay interchangeable
/// with files produced by other tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
	#[serde(default)]
	pub cookies: Vec<Cookie>,
	#[serde(default)]
	pub origins: Vec<OriginState>,
}

impl StorageState {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true when the snapshot carries neither cookies nor storage.
	pub fn is_empty(&self) -> bool {
		self.cookies.is_empty() && self.origins.iter().all(|o| o.local_storage.is_empty())
	}

	/// Looks up the localStorage entries recorded for `origin`.
	pub fn origin(&self, origin: &str) -> Option<&OriginState> {
		let origin = origin.trim_end_matches('/');
		self.origins.iter().find(|o| o.origin.trim_end_matches('/') == origin)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cookie_serializes_camel_case() {
		let cookie = Cookie::new("session", "abc", ".example.com")
			.http_only(true)
			.same_site(SameSite::Lax);

		let json = serde_json::to_string(&cookie).unwrap();
		assert!(json.contains("\"name\":\"session\""));
		assert!(json.contains("\"httpOnly\":true"));
		assert!(json.contains("\"sameSite\":\"Lax\""));
		assert!(!json.contains("expires"));
	}

	#[test]
	fn parses_playwright_storage_state_file() {
		let raw = r#"{
			"cookies": [{
				"name": "laravel_session",
				"value": "eyJpdiI6",
				"domain": "ewallet.example.io",
				"path": "/",
				"expires": 1767225600.5,
				"httpOnly": true,
				"secure": true,
				"sameSite": "Lax"
			}],
			"origins": [{
				"origin": "https://ewallet.example.io",
				"localStorage": [{ "name": "theme", "value": "dark" }]
			}]
		}"#;

		let state: StorageState = serde_json::from_str(raw).unwrap();
		assert_eq!(state.cookies.len(), 1);
		assert!(!state.cookies[0].is_session());
		let origin = state.origin("https://ewallet.example.io/").unwrap();
		assert_eq!(origin.local_storage[0].value, "dark");
	}

	#[test]
	fn empty_state_detection() {
		assert!(StorageState::new().is_empty());

		let state = StorageState {
			cookies: vec![],
			origins: vec![OriginState {
				origin: "https://a.test".into(),
				local_storage: vec![],
			}],
		};
		assert!(state.is_empty());

		let state = StorageState {
			cookies: vec![Cookie::new("a", "b", "a.test").expires(-1.0)],
			origins: vec![],
		};
		assert!(!state.is_empty());
		assert!(state.cookies[0].is_session());
	}
}
