use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info};

use super::LANDING_URL;
use crate::error::{Error, Result};
use crate::locator::Target;
use crate::page::{Page, poll_until};
use crate::totp::{self, Totp};

static OTPAUTH_URI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"otpauth://totp/[^"'<>\s]+"#).unwrap());

pub mod targets {
	use ew_protocol::Strategy;

	use crate::locator::{Target, pat};

	pub fn code_input() -> Target {
		Target::new("one-time code")
			.or(Strategy::css("input[autocomplete=one-time-code]"))
			.or(Strategy::css("input[type=tel]"))
			.or(Strategy::css("input[type=text]").nth(0))
	}

	pub fn verify() -> Target {
		Target::new("verify")
			.or(Strategy::role("button", pat("verify")))
			.or(Strategy::has_text("button", pat("verify|confirm")))
			.or(Strategy::css("form button[type=submit]"))
	}

	/// Message shown when the code is wrong or expired.
	///
	/// Alerts only count when they say so; the challenge also renders
	/// informational banners with the same role.
	pub fn rejection() -> Target {
		Target::new("otp rejection")
			.or(Strategy::css(".fi-fo-field-wrp-error-message"))
			.or(Strategy::has_text("[role=alert]", pat("invalid|incorrect|expired")))
			.or(Strategy::text(pat("invalid (authentication )?code|code is (invalid|incorrect|expired)")))
	}

	/// Heading of the setup screen shown to accounts without a second factor.
	pub fn enrollment_prompt() -> Target {
		Target::new("two-factor setup")
			.or(Strategy::text(pat("secure your account with (google )?2fa")))
			.or(Strategy::role("heading", pat("(set ?up|enable) (two[- ]factor|2fa)")))
	}

	pub fn enable() -> Target {
		Target::new("enable two-factor")
			.or(Strategy::role("button", pat("^enable (two[- ]factor|2fa)")))
			.or(Strategy::has_text("button", pat("^\\s*enable")))
	}

	/// Submits the first code of a fresh enrollment.
	pub fn confirm_enrollment() -> Target {
		Target::new("verify and enable")
			.or(Strategy::role("button", pat("verify.*enable (two[- ]factor|2fa)")))
			.or(Strategy::css("form button[type=submit]"))
	}

	pub fn qr_code() -> Target {
		Target::new("qr code")
			.or(Strategy::css("[data-otpauth]"))
			.or(Strategy::css("img[src^='otpauth']"))
			.or(Strategy::css("img[alt*='QR']"))
	}

	/// Setup key printed next to the QR code.
	pub fn setup_key() -> Target {
		Target::new("setup key")
			.or(Strategy::css("[data-secret]"))
			.or(Strategy::css("code"))
	}
}

/// The `/admin/2fa` challenge, plus the enrollment screen that precedes it
/// for accounts without a second factor.
pub struct TwoFactorPage<'a, P: Page + ?Sized> {
	page: &'a P,
	code_input: Target,
	verify: Target,
	rejection: Target,
	enrollment_prompt: Target,
	enable: Target,
	confirm_enrollment: Target,
	qr_code: Target,
	setup_key: Target,
}

impl<'a, P: Page + ?Sized> TwoFactorPage<'a, P> {
	pub fn new(page: &'a P) -> Self {
		Self {
			page,
			code_input: targets::code_input(),
			verify: targets::verify(),
			rejection: targets::rejection(),
			enrollment_prompt: targets::enrollment_prompt(),
			enable: targets::enable(),
			confirm_enrollment: targets::confirm_enrollment(),
			qr_code: targets::qr_code(),
			setup_key: targets::setup_key(),
		}
	}

	pub async fn is_open(&self) -> Result<bool> {
		self.code_input.is_visible(self.page).await
	}

	pub async fn enter_code(&self, code: &str) -> Result<()> {
		self.code_input.fill(self.page, code).await
	}

	pub async fn click_verify(&self) -> Result<()> {
		self.verify.click(self.page).await
	}

	pub async fn submit_code(&self, code: &str) -> Result<()> {
		self.enter_code(code).await?;
		self.click_verify().await
	}

	/// Generates the current code for `secret` and submits it.
	pub async fn submit_current(&self, secret: &str) -> Result<()> {
		let totp = Totp::from_base32(secret)?;
		let now = totp::unix_secs(std::time::SystemTime::now());
		debug!(target = "ew", valid_for = Totp::seconds_remaining(now), "submitting one-time code");
		self.submit_code(&totp.generate_at(now)).await
	}

	/// Rejection message currently displayed, if any.
	pub async fn rejection_message(&self) -> Result<Option<String>> {
		let Some(strategy) = self.rejection.find(self.page).await? else {
			return Ok(None);
		};
		let text = self.page.text_content(strategy).await?.unwrap_or_default();
		let text = text.trim();
		Ok(Some(if text.is_empty() {
			"code rejected".to_string()
		} else {
			text.to_string()
		}))
	}

	/// Waits for the authenticated landing page.
	///
	/// Ends early with [`Error::OtpRejected`] when the challenge shows a
	/// rejection message instead of redirecting.
	pub async fn wait_for_landing(&self, timeout: Duration) -> Result<String> {
		let url = poll_until(timeout, "authenticated landing page", move || async move {
			let url = self.page.current_url().await?;
			if LANDING_URL.is_match(&url) {
				return Ok(Some(url));
			}
			if let Some(message) = self.rejection_message().await? {
				return Err(Error::OtpRejected { message });
			}
			Ok(None)
		})
		.await?;
		info!(target = "ew", %url, "two-factor accepted");
		Ok(url)
	}

	/// Whether this is the setup screen rather than the code challenge.
	pub async fn is_enrollment(&self) -> Result<bool> {
		Ok(self.enrollment_prompt.is_visible(self.page).await? || self.enable.is_visible(self.page).await?)
	}

	/// Enables two-factor for the signed-in account and confirms it with the
	/// first code. Returns the new base32 secret.
	///
	/// Leaves the page on the authenticated landing page.
	pub async fn enroll(&self, timeout: Duration) -> Result<String> {
		self.enable.click(self.page).await?;
		let secret = poll_until(timeout, "two-factor setup secret", move || async move {
			self.enrollment_secret().await
		})
		.await?;
		info!(target = "ew", "two-factor secret issued");

		let totp = Totp::from_base32(&secret)?;
		self.enter_code(&totp.generate_now()).await?;
		self.confirm_enrollment.click(self.page).await?;
		self.wait_for_landing(timeout).await?;
		Ok(secret)
	}

	/// Shared secret exposed by the enrollment screen.
	///
	/// Looks at the QR code's `otpauth://` URI first, then at any such URI in
	/// the page source, then at a printed setup key.
	pub async fn enrollment_secret(&self) -> Result<Option<String>> {
		if let Some(strategy) = self.qr_code.find(self.page).await? {
			for attr in ["data-otpauth", "src"] {
				if let Some(uri) = self.page.attribute(strategy, attr).await? {
					if uri.starts_with("otpauth://") {
						return totp::secret_from_otpauth_uri(&uri).map(Some);
					}
				}
			}
		}

		let html = self.page.content().await?;
		if let Some(found) = OTPAUTH_URI.find(&html) {
			let uri = found.as_str().replace("&amp;", "&");
			return totp::secret_from_otpauth_uri(&uri).map(Some);
		}

		if let Some(strategy) = self.setup_key.find(self.page).await? {
			let key = match self.page.attribute(strategy, "data-secret").await? {
				Some(key) => key,
				None => self.page.text_content(strategy).await?.unwrap_or_default(),
			};
			let key: String = key.chars().filter(|c| !c.is_whitespace()).collect();
			if Totp::from_base32(&key).is_ok() {
				return Ok(Some(key.to_ascii_uppercase()));
			}
		}

		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{FakePage, Screen};

	const CHALLENGE: &str = "https://e.test/admin/2fa";
	const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

	fn challenge(accept: bool) -> Screen {
		Screen::new()
			.show(targets::code_input().candidates()[1].clone())
			.on_click(targets::verify().candidates()[0].clone(), move |state| {
				if accept {
					state.authenticated = true;
					state.navigate("https://e.test/admin");
				} else {
					state.reveal(targets::rejection().candidates()[0].clone());
				}
			})
	}

	#[tokio::test(start_paused = true)]
	async fn accepted_code_reaches_landing() {
		let page = FakePage::new();
		page.add_screen(CHALLENGE, challenge(true));
		page.goto(CHALLENGE).await.unwrap();

		let two_factor = TwoFactorPage::new(&page);
		two_factor.submit_current(SECRET).await.unwrap();
		let url = two_factor.wait_for_landing(Duration::from_secs(5)).await.unwrap();
		assert_eq!(url, "https://e.test/admin");

		let typed = page.with_state(|s| s.filled(&targets::code_input().candidates()[1]).map(str::to_string));
		let typed = typed.unwrap();
		assert_eq!(typed.len(), 6);
		assert!(typed.chars().all(|c| c.is_ascii_digit()));
	}

	#[tokio::test(start_paused = true)]
	async fn rejection_ends_wait_early() {
		let page = FakePage::new();
		page.add_screen(
			CHALLENGE,
			challenge(false).hidden_text(targets::rejection().candidates()[0].clone(), " The code is invalid. "),
		);
		page.goto(CHALLENGE).await.unwrap();

		let two_factor = TwoFactorPage::new(&page);
		assert_eq!(two_factor.rejection_message().await.unwrap(), None);
		two_factor.submit_code("000000").await.unwrap();
		let err = two_factor.wait_for_landing(Duration::from_secs(60)).await.unwrap_err();
		match err {
			Error::OtpRejected { message } => assert_eq!(message, "The code is invalid."),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn informational_alert_does_not_reject_code() {
		let banner = ew_protocol::Strategy::any_role("alert");
		assert!(!targets::rejection().candidates().contains(&banner));

		let page = FakePage::new();
		page.add_screen(
			CHALLENGE,
			Screen::new()
				.show(targets::code_input().candidates()[1].clone())
				.show(targets::verify().candidates()[0].clone())
				.text(banner, "Enter the code from your authenticator app"),
		);
		page.goto(CHALLENGE).await.unwrap();

		let two_factor = TwoFactorPage::new(&page);
		two_factor.submit_current(SECRET).await.unwrap();
		assert_eq!(two_factor.rejection_message().await.unwrap(), None);

		let server = page.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(500)).await;
			server.with_state(|state| state.navigate("https://e.test/admin"));
		});
		let url = two_factor.wait_for_landing(Duration::from_secs(5)).await.unwrap();
		assert_eq!(url, "https://e.test/admin");
	}

	#[tokio::test(start_paused = true)]
	async fn enrollment_secret_from_qr_uri() {
		let qr = targets::qr_code().candidates()[1].clone();
		let page = FakePage::new();
		page.add_screen(
			"https://e.test/admin/2fa/setup",
			Screen::new().show(qr.clone()).attribute(
				&qr,
				"src",
				"otpauth://totp/EWallet:admin%40example.com?secret=MGNA5HIZKTHIFEYZ&issuer=EWallet",
			),
		);
		page.goto("https://e.test/admin/2fa/setup").await.unwrap();

		let secret = TwoFactorPage::new(&page).enrollment_secret().await.unwrap();
		assert_eq!(secret.as_deref(), Some("MGNA5HIZKTHIFEYZ"));
	}

	#[tokio::test(start_paused = true)]
	async fn enrollment_secret_from_setup_key() {
		let key = targets::setup_key().candidates()[1].clone();
		let page = FakePage::new();
		page.add_screen(
			"https://e.test/admin/2fa/setup",
			Screen::new().text(key, "mgna 5hiz kthi feyz"),
		);
		page.goto("https://e.test/admin/2fa/setup").await.unwrap();

		let secret = TwoFactorPage::new(&page).enrollment_secret().await.unwrap();
		assert_eq!(secret.as_deref(), Some("MGNA5HIZKTHIFEYZ"));
	}
}
