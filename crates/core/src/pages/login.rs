use std::time::Duration;

use tracing::info;

use super::{TWO_FACTOR_URL, paths};
use crate::config::Config;
use crate::error::Result;
use crate::locator::Target;
use crate::page::{Page, wait_for_url};

pub mod targets {
	use ew_protocol::{Strategy, TextMatch};

	use crate::locator::{Target, pat};

	pub fn email() -> Target {
		Target::new("email")
			.or(Strategy::label(pat("email address")))
			.or(Strategy::css("input[type=email]"))
			.or(Strategy::placeholder(pat("email")))
	}

	pub fn password() -> Target {
		Target::new("password")
			.or(Strategy::label(pat("^password")))
			.or(Strategy::css("input[type=password]"))
	}

	pub fn sign_in() -> Target {
		Target::new("sign in")
			.or(Strategy::role("button", pat("sign in")))
			.or(Strategy::has_text("button", pat("sign in|log in")))
			.or(Strategy::css("form button[type=submit]"))
	}

	pub fn remember_me() -> Target {
		Target::new("remember me")
			.or(Strategy::label(pat("remember me")))
			.or(Strategy::css("input[type=checkbox][id*=remember]"))
	}

	pub fn forgot_password() -> Target {
		Target::new("forgot password")
			.or(Strategy::role("link", pat("forgot (your )?password")))
			.or(Strategy::text(pat("forgot (your )?password")))
	}

	pub fn validation_error() -> Target {
		Target::new("login validation")
			.or(Strategy::css(".fi-fo-field-wrp-error-message"))
			.or(Strategy::any_role("alert"))
			.or(Strategy::text(TextMatch::pattern("these credentials do not match")))
	}
}

/// The `/admin/login` form.
pub struct LoginPage<'a, P: Page + ?Sized> {
	page: &'a P,
	config: &'a Config,
	email: Target,
	password: Target,
	sign_in: Target,
	remember_me: Target,
	forgot_password: Target,
	validation_error: Target,
}

impl<'a, P: Page + ?Sized> LoginPage<'a, P> {
	pub fn new(page: &'a P, config: &'a Config) -> Self {
		Self {
			page,
			config,
			email: targets::email(),
			password: targets::password(),
			sign_in: targets::sign_in(),
			remember_me: targets::remember_me(),
			forgot_password: targets::forgot_password(),
			validation_error: targets::validation_error(),
		}
	}

	pub async fn open(&self) -> Result<()> {
		self.page.goto(&self.config.url(paths::LOGIN)).await?;
		info!(target = "ew", "reached login page");
		Ok(())
	}

	pub async fn is_open(&self) -> Result<bool> {
		self.email.is_visible(self.page).await
	}

	pub async fn fill_email(&self, email: &str) -> Result<()> {
		self.email.fill(self.page, email).await
	}

	pub async fn fill_password(&self, password: &str) -> Result<()> {
		self.password.fill(self.page, password).await
	}

	pub async fn fill_credentials(&self, email: &str, password: &str) -> Result<()> {
		self.fill_email(email).await?;
		self.fill_password(password).await
	}

	pub async fn click_sign_in(&self) -> Result<()> {
		self.sign_in.click(self.page).await
	}

	pub async fn login(&self, email: &str, password: &str) -> Result<()> {
		self.fill_credentials(email, password).await?;
		self.click_sign_in().await
	}

	/// Waits for the redirect to the two-factor challenge.
	pub async fn wait_for_two_factor(&self, timeout: Duration) -> Result<String> {
		wait_for_url(self.page, &TWO_FACTOR_URL, timeout).await
	}

	pub async fn select_remember_me(&self) -> Result<()> {
		self.remember_me.check(self.page).await
	}

	pub async fn is_remember_me_selected(&self) -> Result<bool> {
		self.remember_me.is_checked(self.page).await
	}

	pub async fn click_forgot_password(&self) -> Result<()> {
		self.forgot_password.click(self.page).await
	}

	pub async fn email_value(&self) -> Result<String> {
		self.email.input_value(self.page).await
	}

	pub async fn password_value(&self) -> Result<String> {
		self.password.input_value(self.page).await
	}

	/// True when the password field renders as `type=password`.
	pub async fn is_password_masked(&self) -> Result<bool> {
		Ok(self.password.attribute(self.page, "type").await?.as_deref() == Some("password"))
	}

	/// Visible validation message, if the form shows one.
	pub async fn validation_message(&self) -> Result<Option<String>> {
		match self.validation_error.find(self.page).await? {
			Some(strategy) => Ok(self
				.page
				.text_content(strategy)
				.await?
				.map(|t| t.trim().to_string())
				.filter(|t| !t.is_empty())),
			None => Ok(None),
		}
	}
}
