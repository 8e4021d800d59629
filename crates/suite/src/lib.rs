//! Fixtures for the live admin panel scenarios in `tests/`.
//!
//! The scenarios drive a real deployment, so they are `#[ignore]`d and run
//! with `cargo test -p ew-suite -- --ignored`. Credentials come from `.env`
//! at the project root; set `HEADED=1` to watch the browser.

pub mod files;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use anyhow::Context as _;
use ew::page::wait_for_url;
use ew::{Config, Established, Page, Project, SessionBootstrap};
use ew_runtime::{BrowserSession, ChromiumPage, LaunchOptions};
use regex::Regex;
use tempfile::TempDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use files::{ImportFiles, Sheet};

/// Non-empty and not `0`/`false` shows the browser window.
pub const HEADED_ENV: &str = "HEADED";

/// Routes `tracing` output through the test harness once per binary.
pub fn init_tracing() {
	static INIT: Once = Once::new();
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ew=info,chromiumoxide=warn"));
		let _ = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_test_writer()
			.compact()
			.try_init();
	});
}

pub fn headed_from_env() -> bool {
	env::var(HEADED_ENV).is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
	!matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "no")
}

/// One browser, one tab, and the configuration it runs against.
pub struct Harness {
	pub config: Config,
	pub project: Project,
	pub page: ChromiumPage,
	session: BrowserSession,
	downloads: TempDir,
}

impl Harness {
	/// Launches a browser on a blank tab with no session.
	pub async fn anonymous() -> anyhow::Result<Self> {
		init_tracing();
		let project = Project::current().context("failed to resolve project root")?;
		let config = Config::load(project.root())?;
		let downloads = tempfile::Builder::new().prefix("ew-downloads-").tempdir()?;

		let options = LaunchOptions::default()
			.headed(headed_from_env())
			.download_dir(downloads.path());
		let session = BrowserSession::launch(&options).await?;
		let page = session.new_page().await?;
		info!(target = "ew", base_url = %config.base_url, "browser ready");

		Ok(Self {
			config,
			project,
			page,
			session,
			downloads,
		})
	}

	/// Launches a browser and authenticates it, reusing the cached session when it is accepted.
	pub async fn signed_in() -> anyhow::Result<Self> {
		let harness = Self::anonymous().await?;
		let how = harness.bootstrap().establish(&harness.page).await?;
		if how == Established::SignedIn {
			info!(target = "ew", "session cache refreshed");
		}
		Ok(harness)
	}

	pub fn bootstrap(&self) -> SessionBootstrap<'_> {
		SessionBootstrap::new(self.project.paths.auth_store(), &self.config)
	}

	pub fn url(&self, path: &str) -> String {
		self.config.url(path)
	}

	pub fn timeout(&self) -> Duration {
		self.config.timeout
	}

	pub async fn current_url(&self) -> anyhow::Result<String> {
		Ok(self.page.current_url().await?)
	}

	/// Waits for the tab to reach a URL matching `pattern`.
	pub async fn expect_url(&self, pattern: &str) -> anyhow::Result<String> {
		let pattern = Regex::new(pattern)?;
		Ok(wait_for_url(&self.page, &pattern, self.timeout()).await?)
	}

	pub fn download_dir(&self) -> &Path {
		self.downloads.path()
	}

	/// Waits for a finished download whose name ends with `extension`.
	pub async fn wait_for_download(&self, extension: &str, timeout: Duration) -> anyhow::Result<PathBuf> {
		let dir = self.download_dir();
		let condition = format!("download ending in .{extension}");
		let found = ew::page::poll_until(timeout, &condition, move || async move {
			let entries = std::fs::read_dir(dir)?;
			for entry in entries {
				let path = entry?.path();
				if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(extension)) {
					return Ok(Some(path));
				}
			}
			Ok(None)
		})
		.await?;
		Ok(found)
	}

	pub async fn close(self) -> anyhow::Result<()> {
		self.session.close().await?;
		Ok(())
	}
}
