//! Logical UI targets with ordered locator fallbacks.
//!
//! The admin panel renders the same control differently across releases
//! (Filament classes, ARIA roles, plain text). A [`Target`] lists every known
//! way of finding a control and uses the first one that currently shows a
//! visible element.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use ew_protocol::{Strategy, TextMatch};
use tracing::debug;

use crate::error::{Error, Result};
use crate::page::{Page, poll_until};

/// How long actions wait for a target to become visible.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A named UI element with its candidate strategies, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
	name: String,
	candidates: Vec<Strategy>,
	timeout: Duration,
}

impl Target {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			candidates: Vec::new(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	/// Appends a fallback candidate.
	pub fn or(mut self, strategy: Strategy) -> Self {
		self.candidates.push(strategy);
		self
	}

	/// Sets how long actions wait for the target.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn candidates(&self) -> &[Strategy] {
		&self.candidates
	}

	/// First candidate with a visible match right now.
	pub async fn find<P: Page + ?Sized>(&self, page: &P) -> Result<Option<&Strategy>> {
		Ok(self.find_index(page).await?.map(|i| &self.candidates[i]))
	}

	/// Backend errors on a single candidate (for example a selector the page
	/// rejects) skip to the next one.
	async fn find_index<P: Page + ?Sized>(&self, page: &P) -> Result<Option<usize>> {
		for (index, strategy) in self.candidates.iter().enumerate() {
			match page.is_visible(strategy).await {
				Ok(true) => {
					debug!(target = "ew", target_name = %self.name, candidate = index, %strategy, "resolved target");
					return Ok(Some(index));
				}
				Ok(false) => {}
				Err(err @ Error::Driver(_)) => {
					debug!(target = "ew", target_name = %self.name, %strategy, error = %err, "candidate failed");
				}
				Err(err) => return Err(err),
			}
		}
		Ok(None)
	}

	/// Like [`Target::find`] but fails when nothing matches.
	pub async fn resolve<P: Page + ?Sized>(&self, page: &P) -> Result<&Strategy> {
		self.find(page).await?.ok_or_else(|| self.not_found())
	}

	pub async fn is_visible<P: Page + ?Sized>(&self, page: &P) -> Result<bool> {
		Ok(self.find(page).await?.is_some())
	}

	/// Polls until some candidate is visible.
	pub async fn wait_visible<P: Page + ?Sized>(&self, page: &P, timeout: Duration) -> Result<&Strategy> {
		let found = poll_until(timeout, &self.name, move || async move { self.find_index(page).await }).await;

		match found {
			Ok(index) => Ok(&self.candidates[index]),
			Err(Error::Timeout { .. }) => Err(self.not_found()),
			Err(err) => Err(err),
		}
	}

	/// Polls until no candidate is visible.
	pub async fn wait_hidden<P: Page + ?Sized>(&self, page: &P, timeout: Duration) -> Result<()> {
		poll_until(timeout, &format!("{} hidden", self.name), move || async move {
			Ok((!self.is_visible(page).await?).then_some(()))
		})
		.await
	}

	async fn ready<P: Page + ?Sized>(&self, page: &P) -> Result<&Strategy> {
		self.wait_visible(page, self.timeout).await
	}

	pub async fn click<P: Page + ?Sized>(&self, page: &P) -> Result<()> {
		let strategy = self.ready(page).await?;
		page.click(strategy).await
	}

	pub async fn fill<P: Page + ?Sized>(&self, page: &P, value: &str) -> Result<()> {
		let strategy = self.ready(page).await?;
		page.fill(strategy, value).await
	}

	pub async fn check<P: Page + ?Sized>(&self, page: &P) -> Result<()> {
		let strategy = self.ready(page).await?;
		page.check(strategy).await
	}

	pub async fn is_checked<P: Page + ?Sized>(&self, page: &P) -> Result<bool> {
		let strategy = self.ready(page).await?;
		page.is_checked(strategy).await
	}

	pub async fn is_enabled<P: Page + ?Sized>(&self, page: &P) -> Result<bool> {
		match self.find(page).await? {
			Some(strategy) => page.is_enabled(strategy).await,
			None => Ok(false),
		}
	}

	pub async fn input_value<P: Page + ?Sized>(&self, page: &P) -> Result<String> {
		let strategy = self.ready(page).await?;
		page.input_value(strategy).await
	}

	pub async fn attribute<P: Page + ?Sized>(&self, page: &P, name: &str) -> Result<Option<String>> {
		let strategy = self.ready(page).await?;
		page.attribute(strategy, name).await
	}

	/// Trimmed text content of the visible match.
	pub async fn text<P: Page + ?Sized>(&self, page: &P) -> Result<String> {
		let strategy = self.ready(page).await?;
		Ok(page.text_content(strategy).await?.unwrap_or_default().trim().to_string())
	}

	/// Sets files on a file input. File inputs are often visually hidden, so
	/// the first candidate with any match is used.
	pub async fn set_input_files<P: Page + ?Sized>(&self, page: &P, files: &[PathBuf]) -> Result<()> {
		let attached = poll_until(self.timeout, &self.name, move || async move {
			for (index, strategy) in self.candidates.iter().enumerate() {
				if page.count(strategy).await.unwrap_or(0) > 0 {
					return Ok(Some(index));
				}
			}
			Ok(None)
		})
		.await
		.map_err(|err| match err {
			Error::Timeout { .. } => self.not_found(),
			other => other,
		})?;
		page.set_input_files(&self.candidates[attached], files).await
	}

	fn not_found(&self) -> Error {
		Error::TargetNotFound {
			target: self.to_string(),
		}
	}
}

impl fmt::Display for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} [", self.name)?;
		for (i, candidate) in self.candidates.iter().enumerate() {
			if i > 0 {
				f.write_str(" | ")?;
			}
			write!(f, "{candidate}")?;
		}
		f.write_str("]")
	}
}

/// Case-insensitive pattern shorthand.
pub fn pat(pattern: &str) -> TextMatch {
	TextMatch::pattern(pattern)
}
