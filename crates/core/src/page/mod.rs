//! [`Page`] abstraction over one browser tab.
//!
//! Everything above this trait (locator chains, page objects, the login
//! flow) is backend agnostic. `ew-runtime` implements it over Chromium; the
//! tests in this crate implement it in memory.

mod wait;

use std::path::PathBuf;

use async_trait::async_trait;
use ew_protocol::{StorageState, Strategy};

use crate::error::Result;

pub use wait::{POLL_INTERVAL, poll_until, wait_for_url};

/// A browser tab the suite can drive.
///
/// Element methods act on the first element matched by the strategy and fail
/// with a driver error when nothing matches. Use [`Page::count`] or
/// [`Page::is_visible`] to probe without failing.
#[async_trait]
pub trait Page: Send + Sync {
	/// Navigates and waits for the load event.
	async fn goto(&self, url: &str) -> Result<()>;

	async fn current_url(&self) -> Result<String>;

	async fn title(&self) -> Result<String>;

	/// Serialized HTML of the whole document.
	async fn content(&self) -> Result<String>;

	/// Number of elements the strategy matches.
	async fn count(&self, strategy: &Strategy) -> Result<usize>;

	/// True when the first match exists and is rendered.
	async fn is_visible(&self, strategy: &Strategy) -> Result<bool>;

	async fn is_enabled(&self, strategy: &Strategy) -> Result<bool>;

	async fn is_checked(&self, strategy: &Strategy) -> Result<bool>;

	/// Clears the field and types `value` into it.
	async fn fill(&self, strategy: &Strategy, value: &str) -> Result<()>;

	async fn click(&self, strategy: &Strategy) -> Result<()>;

	/// Ticks a checkbox unless it already is.
	async fn check(&self, strategy: &Strategy) -> Result<()>;

	async fn input_value(&self, strategy: &Strategy) -> Result<String>;

	async fn attribute(&self, strategy: &Strategy, name: &str) -> Result<Option<String>>;

	async fn text_content(&self, strategy: &Strategy) -> Result<Option<String>>;

	async fn set_input_files(&self, strategy: &Strategy, files: &[PathBuf]) -> Result<()>;

	/// Waits until `document.readyState` is `complete`.
	async fn wait_for_load(&self) -> Result<()>;

	/// Every cookie of the browsing session, plus localStorage of the
	/// current document's origin only.
	///
	/// Callers capture it while the tab is on the admin panel.
	async fn storage_state(&self) -> Result<StorageState>;

	/// Injects cookies and localStorage from a snapshot.
	async fn apply_storage_state(&self, state: &StorageState) -> Result<()>;
}
