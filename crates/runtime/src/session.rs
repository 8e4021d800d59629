//! Browser lifecycle.

use std::path::PathBuf;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{SetDownloadBehaviorBehavior, SetDownloadBehaviorParams};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chrome;
use crate::error::{Error, Result};
use crate::page::ChromiumPage;

/// Desktop window the admin panel is laid out for.
pub const DEFAULT_WINDOW: (u32, u32) = (1440, 900);

/// Where the fetcher keeps downloaded Chromium builds between runs.
pub fn default_fetch_dir() -> PathBuf {
	std::env::temp_dir().join("ew-chromium")
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
	pub headless: bool,
	/// Window size in pixels; the page viewport follows it.
	pub window: (u32, u32),
	/// Chrome to run; discovered (or downloaded) when `None`.
	pub executable: Option<PathBuf>,
	/// Directory downloads are saved to; Chrome's default when `None`.
	pub download_dir: Option<PathBuf>,
	pub fetch_dir: PathBuf,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			headless: true,
			window: DEFAULT_WINDOW,
			executable: None,
			download_dir: None,
			fetch_dir: default_fetch_dir(),
		}
	}
}

impl LaunchOptions {
	pub fn headed(mut self, headed: bool) -> Self {
		self.headless = !headed;
		self
	}

	pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
		self.executable = Some(path.into());
		self
	}

	pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.download_dir = Some(dir.into());
		self
	}
}

/// A running Chromium and the task driving its CDP connection.
///
/// The profile directory is private to the session and removed with it.
pub struct BrowserSession {
	browser: Browser,
	handler: JoinHandle<()>,
	_profile: TempDir,
}

impl BrowserSession {
	pub async fn launch(options: &LaunchOptions) -> Result<Self> {
		let executable = match chrome::find_chrome(options.executable.as_deref())? {
			Some(path) => path,
			None => fetch_chromium(options).await?,
		};
		let profile = TempDir::with_prefix("ew-profile-")?;
		let (width, height) = options.window;

		let mut builder = BrowserConfig::builder()
			.chrome_executable(&executable)
			.user_data_dir(profile.path())
			.window_size(width, height)
			.viewport(None)
			.arg("--disable-gpu")
			.arg("--no-sandbox");
		if !options.headless {
			builder = builder.with_head();
		}
		let config = builder.build().map_err(Error::LaunchFailed)?;

		let (browser, mut handler) = Browser::launch(config).await?;
		let handler = tokio::spawn(async move {
			while let Some(event) = handler.next().await {
				if let Err(err) = event {
					debug!(target = "ew", error = %err, "CDP handler error");
				}
			}
		});

		if let Some(dir) = &options.download_dir {
			tokio::fs::create_dir_all(dir).await?;
			let params = SetDownloadBehaviorParams::builder()
				.behavior(SetDownloadBehaviorBehavior::Allow)
				.download_path(dir.to_string_lossy())
				.build()
				.map_err(Error::Params)?;
			browser.execute(params).await?;
		}

		info!(
			target = "ew",
			chrome = %executable.display(),
			headless = options.headless,
			width,
			height,
			"browser launched"
		);
		Ok(Self {
			browser,
			handler,
			_profile: profile,
		})
	}

	/// Opens a blank tab.
	pub async fn new_page(&self) -> Result<ChromiumPage> {
		let page = self.browser.new_page("about:blank").await?;
		Ok(ChromiumPage::new(page))
	}

	pub async fn close(mut self) -> Result<()> {
		self.browser.close().await?;
		if let Err(err) = self.browser.wait().await {
			warn!(target = "ew", error = %err, "browser process did not exit cleanly");
		}
		self.handler.abort();
		debug!(target = "ew", "browser closed");
		Ok(())
	}
}

async fn fetch_chromium(options: &LaunchOptions) -> Result<PathBuf> {
	info!(
		target = "ew",
		dir = %options.fetch_dir.display(),
		"no local Chrome found, fetching Chromium"
	);
	tokio::fs::create_dir_all(&options.fetch_dir).await?;
	let fetcher_options = BrowserFetcherOptions::builder()
		.with_path(&options.fetch_dir)
		.build()
		.map_err(|err| Error::Fetch(err.to_string()))?;
	let info = BrowserFetcher::new(fetcher_options)
		.fetch()
		.await
		.map_err(|err| Error::Fetch(err.to_string()))?;
	Ok(info.executable_path)
}
