//! Login orchestration and session bootstrap.
//!
//! A cold start drives the browser through credentials and the TOTP
//! challenge, then snapshots storage into the [`AuthStore`]. A warm start
//! injects the cached snapshot instead. The snapshot is only written once
//! the dashboard is confirmed, so a failed login never leaves a half-valid
//! cache behind.

use std::time::Duration;

use ew_protocol::StorageState;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth_store::AuthStore;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::page::{Page, poll_until};
use crate::pages::{DashboardPage, LOGIN_URL, LoginPage, TWO_FACTOR_URL, TwoFactorPage, paths};

/// Waits used by the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
	/// Login form to two-factor challenge.
	pub two_factor: Duration,
	/// Code submission to dashboard.
	pub landing: Duration,
}

impl Default for Timeouts {
	fn default() -> Self {
		Self {
			two_factor: Duration::from_secs(30),
			landing: Duration::from_secs(15),
		}
	}
}

impl Timeouts {
	/// Caps the defaults at the configured test timeout.
	pub fn from_config(config: &Config) -> Self {
		let defaults = Self::default();
		Self {
			two_factor: defaults.two_factor.min(config.timeout),
			landing: defaults.landing.min(config.timeout),
		}
	}
}

/// How [`SessionBootstrap::establish`] got the page authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Established {
	/// The cached snapshot was accepted.
	Restored,
	/// A full login ran and the snapshot was refreshed.
	SignedIn,
}

/// Full login: credentials, TOTP challenge, dashboard.
///
/// Credentials are checked before the browser is touched, so a missing
/// variable fails fast with [`Error::MissingEnv`](crate::Error::MissingEnv).
pub async fn sign_in<P: Page + ?Sized>(page: &P, config: &Config, timeouts: &Timeouts) -> Result<()> {
	let email = config.email()?;
	let password = config.password()?;
	let secret = config.totp_secret()?;

	let login = LoginPage::new(page, config);
	login.open().await?;
	login.login(email, password).await?;
	login.wait_for_two_factor(timeouts.two_factor).await?;
	info!(target = "ew", "reached two-factor challenge");

	let two_factor = TwoFactorPage::new(page);
	two_factor.submit_current(secret).await?;
	two_factor.wait_for_landing(timeouts.landing).await?;

	DashboardPage::new(page, config).wait_loaded(timeouts.landing).await?;
	info!(target = "ew", "signed in");
	Ok(())
}

/// Enables two-factor on an account that has none yet, then lands on the
/// dashboard. Returns the new base32 secret for `TOTP_SECRET`.
///
/// Fails with [`Error::AlreadyEnrolled`] when the login leads to the code
/// challenge instead of the setup screen.
pub async fn enroll<P: Page + ?Sized>(page: &P, config: &Config, timeouts: &Timeouts) -> Result<String> {
	let email = config.email()?;
	let password = config.password()?;

	let login = LoginPage::new(page, config);
	login.open().await?;
	login.login(email, password).await?;

	let two_factor = TwoFactorPage::new(page);
	let screen = &two_factor;
	let needs_setup = poll_until(timeouts.two_factor, "two-factor screen", move || async move {
		if screen.is_enrollment().await? {
			return Ok(Some(true));
		}
		let url = page.current_url().await?;
		if TWO_FACTOR_URL.is_match(&url) && screen.is_open().await? {
			return Ok(Some(false));
		}
		Ok(None)
	})
	.await?;
	if !needs_setup {
		return Err(Error::AlreadyEnrolled);
	}
	info!(target = "ew", "reached two-factor setup");

	let secret = two_factor.enroll(timeouts.landing).await?;
	DashboardPage::new(page, config).wait_loaded(timeouts.landing).await?;
	info!(target = "ew", "two-factor enabled");
	Ok(secret)
}

/// Gets a page authenticated, reusing the cached session when possible.
pub struct SessionBootstrap<'a> {
	store: AuthStore,
	config: &'a Config,
	timeouts: Timeouts,
}

impl<'a> SessionBootstrap<'a> {
	pub fn new(store: AuthStore, config: &'a Config) -> Self {
		Self {
			store,
			config,
			timeouts: Timeouts::from_config(config),
		}
	}

	pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
		self.timeouts = timeouts;
		self
	}

	pub fn store(&self) -> &AuthStore {
		&self.store
	}

	/// Warm start when a usable snapshot is cached, cold start otherwise.
	pub async fn establish<P: Page + ?Sized>(&self, page: &P) -> Result<Established> {
		match self.store.load() {
			Ok(Some(state)) => {
				if let Ok(freshness) = self.store.check_freshness() {
					if freshness.is_stale {
						warn!(
							target = "ew",
							path = %self.store.path().display(),
							age_secs = freshness.age_secs,
							"cached session is stale, trying it anyway"
						);
					}
				}
				if self.restore(page, &state).await? {
					info!(target = "ew", "restored cached session");
					return Ok(Established::Restored);
				}
				warn!(target = "ew", "cached session was rejected, signing in again");
			}
			Ok(None) => info!(target = "ew", "no cached session, signing in"),
			Err(err) if err.is_recoverable() => {
				warn!(target = "ew", error = %err, "ignoring unreadable cached session");
			}
			Err(err) => return Err(err),
		}

		self.refresh(page).await?;
		Ok(Established::SignedIn)
	}

	/// Always signs in, then replaces the cached snapshot.
	pub async fn refresh<P: Page + ?Sized>(&self, page: &P) -> Result<StorageState> {
		sign_in(page, self.config, &self.timeouts).await?;
		let state = page.storage_state().await?;
		self.store.save(&state)?;
		Ok(state)
	}

	/// Injects `state` and checks that the admin panel accepts it.
	async fn restore<P: Page + ?Sized>(&self, page: &P, state: &StorageState) -> Result<bool> {
		page.apply_storage_state(state).await?;
		page.goto(&self.config.url(paths::ADMIN)).await?;
		page.wait_for_load().await?;

		let url = page.current_url().await?;
		if LOGIN_URL.is_match(&url) || TWO_FACTOR_URL.is_match(&url) {
			return Ok(false);
		}
		DashboardPage::new(page, self.config)
			.wait_loaded(self.timeouts.landing)
			.await?;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::time::SystemTime;

	use ew_protocol::Cookie;
	use secrecy::SecretString;
	use tempfile::TempDir;

	use super::*;
	use crate::pages::{dashboard, login, two_factor};
	use crate::testing::{FakePage, Screen};
	use crate::totp::{self, STEP_SECS};

	const BASE: &str = "https://e.test";
	const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

	fn config(secret: Option<&str>) -> Config {
		Config {
			email: Some("admin@example.com".into()),
			password: Some(SecretString::from("hunter2".to_string())),
			totp_secret: secret.map(|s| SecretString::from(s.to_string())),
			base_url: BASE.into(),
			..Config::default()
		}
	}

	fn session(value: &str) -> StorageState {
		StorageState {
			cookies: vec![Cookie::new("laravel_session", value, "e.test").path("/")],
			origins: vec![],
		}
	}

	fn fast() -> Timeouts {
		Timeouts {
			two_factor: Duration::from_secs(2),
			landing: Duration::from_secs(2),
		}
	}

	/// Accepts codes from the current or previous step, like the server's drift window.
	fn code_is_valid(secret: &str, code: &str) -> bool {
		let now = SystemTime::now();
		let previous = now - Duration::from_secs(STEP_SECS);
		[now, previous]
			.into_iter()
			.any(|at| totp::generate(secret, Some(at)).is_ok_and(|expected| expected == code))
	}

	/// Login, challenge and dashboard screens wired like the admin panel.
	fn admin_panel(server_session: &str) -> FakePage {
		let page = FakePage::new();
		let login_url = format!("{BASE}{}", paths::LOGIN);
		let challenge_url = format!("{BASE}{}", paths::TWO_FACTOR);
		let admin_url = format!("{BASE}{}", paths::ADMIN);

		let challenge = challenge_url.clone();
		page.add_screen(
			&login_url,
			Screen::new()
				.show(login::targets::email().candidates()[0].clone())
				.show(login::targets::password().candidates()[1].clone())
				.on_click(login::targets::sign_in().candidates()[0].clone(), move |state| {
					state.navigate(&challenge)
				}),
		);

		let code_input = two_factor::targets::code_input().candidates()[1].clone();
		let admin = admin_url.clone();
		page.add_screen(
			&challenge_url,
			Screen::new()
				.show(code_input.clone())
				.hidden_text(two_factor::targets::rejection().candidates()[0].clone(), "Invalid code.")
				.on_click(two_factor::targets::verify().candidates()[0].clone(), move |state| {
					let code = state.filled(&code_input).unwrap_or_default().to_string();
					if code_is_valid(SECRET, &code) {
						state.authenticated = true;
						state.navigate(&admin);
					} else {
						state.reveal(two_factor::targets::rejection().candidates()[0].clone());
					}
				}),
		);

		page.add_screen(
			&admin_url,
			Screen::new().show(dashboard::targets::heading().candidates()[0].clone()),
		);

		let server_session = session(server_session);
		page.with_state(|state| {
			state.protected = Some(admin_url.clone());
			state.login_url = Some(login_url.clone());
			state.public = vec![challenge_url.clone()];
			state.session = server_session;
		});
		page
	}

	fn store(tmp: &TempDir) -> AuthStore {
		AuthStore::in_dir(tmp.path().join("playwright").join(".auth"))
	}

	#[tokio::test(start_paused = true)]
	async fn cold_start_signs_in_and_saves() {
		let tmp = TempDir::new().unwrap();
		let config = config(Some(SECRET));
		let page = admin_panel("fresh");
		let bootstrap = SessionBootstrap::new(store(&tmp), &config).timeouts(fast());

		assert_eq!(bootstrap.establish(&page).await.unwrap(), Established::SignedIn);
		assert_eq!(bootstrap.store().load().unwrap(), Some(session("fresh")));
		assert_eq!(
			page.visits(),
			vec![
				"https://e.test/admin/login".to_string(),
				"https://e.test/admin/2fa".to_string(),
				"https://e.test/admin".to_string(),
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn rejected_code_leaves_cache_untouched() {
		let tmp = TempDir::new().unwrap();
		let config = config(Some("MGNA5HIZKTHIFEYZ"));
		let page = admin_panel("fresh");
		let bootstrap = SessionBootstrap::new(store(&tmp), &config).timeouts(fast());

		let err = bootstrap.establish(&page).await.unwrap_err();
		match err {
			Error::OtpRejected { message } => assert_eq!(message, "Invalid code."),
			other => panic!("unexpected error: {other}"),
		}
		assert_eq!(bootstrap.store().load().unwrap(), None);
		assert!(!bootstrap.store().path().exists());
	}

	#[tokio::test(start_paused = true)]
	async fn warm_start_skips_login() {
		let tmp = TempDir::new().unwrap();
		let config = config(Some(SECRET));
		let page = admin_panel("fresh");
		let bootstrap = SessionBootstrap::new(store(&tmp), &config).timeouts(fast());
		bootstrap.store().save(&session("cached")).unwrap();

		assert_eq!(bootstrap.establish(&page).await.unwrap(), Established::Restored);
		assert_eq!(page.visits(), vec!["https://e.test/admin".to_string()]);
		page.with_state(|state| {
			assert_eq!(state.applied, vec![session("cached")]);
			assert!(state.fills.is_empty());
		});
		assert_eq!(bootstrap.store().load().unwrap(), Some(session("cached")));
	}

	#[tokio::test(start_paused = true)]
	async fn expired_session_falls_back_to_login() {
		let tmp = TempDir::new().unwrap();
		let config = config(Some(SECRET));
		let page = admin_panel("fresh");
		page.with_state(|state| state.accepts_restored = false);
		let bootstrap = SessionBootstrap::new(store(&tmp), &config).timeouts(fast());
		bootstrap.store().save(&session("expired")).unwrap();

		assert_eq!(bootstrap.establish(&page).await.unwrap(), Established::SignedIn);
		assert_eq!(bootstrap.store().load().unwrap(), Some(session("fresh")));
		assert_eq!(page.visits()[0], "https://e.test/admin/login");
	}

	#[tokio::test(start_paused = true)]
	async fn corrupt_cache_triggers_login() {
		let tmp = TempDir::new().unwrap();
		let config = config(Some(SECRET));
		let page = admin_panel("fresh");
		let bootstrap = SessionBootstrap::new(store(&tmp), &config).timeouts(fast());
		fs::create_dir_all(bootstrap.store().path().parent().unwrap()).unwrap();
		fs::write(bootstrap.store().path(), "{\"cookies\": [").unwrap();

		assert_eq!(bootstrap.establish(&page).await.unwrap(), Established::SignedIn);
		assert_eq!(bootstrap.store().load().unwrap(), Some(session("fresh")));
	}

	#[tokio::test(start_paused = true)]
	async fn missing_secret_fails_before_navigation() {
		let config = config(None);
		let page = admin_panel("fresh");

		let err = sign_in(&page, &config, &fast()).await.unwrap_err();
		assert!(matches!(err, Error::MissingEnv("TOTP_SECRET")));
		assert!(page.visits().is_empty());
	}

	const ENROLLED: &str = "MGNA5HIZKTHIFEYZ";

	/// Login leading to the setup screen of an account without a second factor.
	fn unenrolled_panel() -> FakePage {
		let page = admin_panel("fresh");
		let setup_url = format!("{BASE}{}", paths::TWO_FACTOR);
		let admin = format!("{BASE}{}", paths::ADMIN);
		let qr = two_factor::targets::qr_code().candidates()[1].clone();
		let code_input = two_factor::targets::code_input().candidates()[1].clone();

		let revealed_qr = qr.clone();
		page.add_screen(
			&setup_url,
			Screen::new()
				.show(two_factor::targets::enrollment_prompt().candidates()[0].clone())
				.show(code_input.clone())
				.attribute(&qr, "src", &format!("otpauth://totp/EWallet:admin?secret={ENROLLED}&issuer=EWallet"))
				.on_click(two_factor::targets::enable().candidates()[0].clone(), move |state| {
					state.reveal(revealed_qr.clone())
				})
				.on_click(two_factor::targets::confirm_enrollment().candidates()[0].clone(), move |state| {
					let code = state.filled(&code_input).unwrap_or_default().to_string();
					if code_is_valid(ENROLLED, &code) {
						state.authenticated = true;
						state.navigate(&admin);
					}
				}),
		);
		page
	}

	#[tokio::test(start_paused = true)]
	async fn enroll_returns_the_issued_secret() {
		let config = config(None);
		let page = unenrolled_panel();

		let secret = enroll(&page, &config, &fast()).await.unwrap();
		assert_eq!(secret, ENROLLED);
		assert_eq!(page.current_url().await.unwrap(), "https://e.test/admin");
		let clicks = page.clicks();
		assert!(clicks.contains(&two_factor::targets::enable().candidates()[0].to_string()));
		assert!(!clicks.contains(&two_factor::targets::verify().candidates()[0].to_string()));
	}

	#[tokio::test(start_paused = true)]
	async fn enroll_refuses_an_enrolled_account() {
		let config = config(Some(SECRET));
		let page = admin_panel("fresh");

		let err = enroll(&page, &config, &fast()).await.unwrap_err();
		assert!(matches!(err, Error::AlreadyEnrolled), "unexpected error: {err}");
		page.with_state(|state| {
			assert!(!state.authenticated);
			assert_eq!(state.filled(&two_factor::targets::code_input().candidates()[1]), None);
		});
	}

	#[test]
	fn timeouts_respect_config() {
		let config = Config {
			timeout: Duration::from_secs(10),
			..Config::default()
		};
		let timeouts = Timeouts::from_config(&config);
		assert_eq!(timeouts.two_factor, Duration::from_secs(10));
		assert_eq!(timeouts.landing, Duration::from_secs(10));
		assert_eq!(Timeouts::from_config(&Config::default()), Timeouts::default());
	}
}
