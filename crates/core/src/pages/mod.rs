//! Page objects for the admin panel.
//!
//! Each page object borrows a [`Page`](crate::page::Page) and the
//! [`Config`](crate::config::Config) and exposes the operations the scenarios
//! use. Locators live in a `targets` submodule per page so tests can script a
//! fake page against exactly the same candidates.

pub mod dashboard;
pub mod import_orders;
pub mod login;
pub mod orders;
pub mod two_factor;

use std::sync::LazyLock;

use regex::Regex;

pub use dashboard::{DashboardPage, StatCard};
pub use import_orders::ImportOrdersPage;
pub use login::LoginPage;
pub use orders::OrderPage;
pub use two_factor::TwoFactorPage;

/// Admin panel routes, relative to the base URL.
pub mod paths {
	pub const LOGIN: &str = "/admin/login";
	pub const TWO_FACTOR: &str = "/admin/2fa";
	pub const ADMIN: &str = "/admin";
	pub const LOGOUT: &str = "/admin/logout";
	pub const CREATE_ORDER: &str = "/admin/orders/create";
	pub const SUB_ORDERS: &str = "/admin/sub-orders";
	pub const MISMATCH_TRANSACTIONS: &str = "/admin/mismatch-transactions";
	pub const PASSWORD_RESET: &str = "/admin/password-reset/request";
}

/// Login form.
pub static LOGIN_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/admin/login(?:[/?#]|$)").unwrap());

/// Two-factor challenge.
pub static TWO_FACTOR_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/admin/2fa(?:[/?#]|$)").unwrap());

/// Authenticated landing page: `/admin` or `/admin/dashboard`.
pub static LANDING_URL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"/admin(?:/dashboard)?/?(?:[?#].*)?$").unwrap());

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn landing_pattern() {
		for url in [
			"https://e.test/admin",
			"https://e.test/admin/",
			"https://e.test/admin/dashboard",
			"https://e.test/admin?tab=1",
		] {
			assert!(LANDING_URL.is_match(url), "{url}");
		}
		for url in [
			"https://e.test/admin/login",
			"https://e.test/admin/2fa",
			"https://e.test/admin/orders/create",
		] {
			assert!(!LANDING_URL.is_match(url), "{url}");
		}
	}

	#[test]
	fn login_and_two_factor_patterns() {
		assert!(LOGIN_URL.is_match("https://e.test/admin/login"));
		assert!(LOGIN_URL.is_match("https://e.test/admin/login?redirect=%2Fadmin"));
		assert!(!LOGIN_URL.is_match("https://e.test/admin/logins"));
		assert!(TWO_FACTOR_URL.is_match("https://e.test/admin/2fa"));
		assert!(!TWO_FACTOR_URL.is_match("https://e.test/admin/2fa-setup"));
	}
}
