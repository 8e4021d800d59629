use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use ew_protocol::Strategy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::Result;
use crate::locator::{Target, pat};
use crate::page::Page;

/// Upload limit advertised by the import modal.
pub const MAX_FILE_SIZE_MB: f64 = 5.0;

/// Columns the import accepts, with whether each is required.
pub const IMPORT_COLUMNS: [(&str, bool); 8] = [
	("order_name", true),
	("amount", true),
	("platform", true),
	("username", true),
	("minimum_send_amount", false),
	("telegram_handle", true),
	("receiving_agent_id", true),
	("discount_tier_id", true),
];

static SIZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(kb|mb|gb|b)?\b").unwrap());

pub mod targets {
	use ew_protocol::{Strategy, TextMatch};

	use crate::locator::{Target, pat};

	pub fn add_new_order() -> Target {
		crate::pages::dashboard::targets::add_new_order()
	}

	pub fn open_import() -> Target {
		Target::new("import orders")
			.or(Strategy::has_text("button.fi-btn", pat("import orders")).nth(0))
			.or(Strategy::role("button", pat("import orders")).nth(0))
	}

	pub fn modal() -> Target {
		Target::new("import orders modal")
			.or(Strategy::css("[x-data*='import-orders-form'].fi-modal-open"))
			.or(Strategy::css("[data-testid=import-orders-form]"))
			.or(Strategy::has_text("[role=dialog]", pat("import orders")).nth(1))
	}

	pub fn title() -> Target {
		Target::new("import modal title")
			.or(Strategy::role("heading", TextMatch::exact("Import Orders")).nth(0))
			.or(Strategy::has_text("h1, h2, h3", pat("import orders")))
	}

	pub fn close() -> Target {
		Target::new("close modal")
			.or(Strategy::role("button", TextMatch::exact("Close")).nth(0))
			.or(Strategy::css("[aria-label=Close]").nth(0))
			.or(Strategy::css(".close, .btn-close").nth(0))
	}

	pub fn file_input() -> Target {
		Target::new("file input")
			.or(Strategy::css("input[type=file]"))
			.or(Strategy::css("[data-testid=file-upload]"))
			.or(Strategy::css(".file-input"))
	}

	pub fn upload_section() -> Target {
		Target::new("upload section")
			.or(Strategy::has_text("section.fi-section", pat("file|upload|browse|drag|drop")))
			.or(Strategy::css(".file-upload-section, [data-testid=file-upload-section], .upload-section"))
	}

	pub fn instructions() -> Target {
		Target::new("import instructions")
			.or(Strategy::has_text("p.fi-section-header-description", pat("import orders|excel|csv")).nth(0))
			.or(Strategy::has_text("p.mb-2.font-semibold", pat("import file|columns")).nth(0))
			.or(Strategy::has_text("div.fi-fo-field-wrp-helper-text", pat("excel|csv|file size")).nth(0))
	}

	pub fn download_template() -> Target {
		Target::new("download template")
			.or(Strategy::role("link", pat("download template")))
			.or(Strategy::role("button", pat("download template")))
			.or(Strategy::css("[data-testid=download-template]"))
			.or(Strategy::text(pat("download template")))
	}

	pub fn submit() -> Target {
		Target::new("submit import")
			.or(Strategy::has_text("button[type=submit]", pat("import orders")).nth(0))
			.or(Strategy::role("button", pat("import orders")).nth(1))
	}

	pub fn file_preview() -> Target {
		Target::new("file preview")
			.or(Strategy::css(".file-preview, [data-testid=file-preview]"))
			.or(Strategy::css(".filepond--file"))
			.or(Strategy::css(".preview, .file-info"))
	}

	pub fn file_size() -> Target {
		Target::new("file size")
			.or(Strategy::css(".file-size, [data-testid=file-size]"))
			.or(Strategy::css(".filepond--file-info-sub"))
			.or(Strategy::css(".size-indicator"))
	}

	pub fn file_type() -> Target {
		Target::new("file type")
			.or(Strategy::css(".file-type, [data-testid=file-type]"))
			.or(Strategy::css(".type-indicator"))
	}

	pub fn confirmation() -> Target {
		Target::new("import confirmation")
			.or(Strategy::css(".fi-no-notification.fi-color-success"))
			.or(Strategy::css(".success-message, [data-testid=success-message]"))
			.or(Strategy::css(".alert-success, .message-success"))
	}

	pub fn error() -> Target {
		Target::new("import error")
			.or(Strategy::css(".fi-no-notification.fi-color-danger"))
			.or(Strategy::css(".fi-fo-field-wrp-error-message"))
			.or(Strategy::css(".error-message, [data-testid=error-message]"))
			.or(Strategy::css(".alert-danger, .message-error"))
	}
}

/// Whether a size indicator such as `"2.5 MB"` is within `max_mb`.
///
/// Text without a recognizable size passes; a bare number is read as
/// megabytes.
pub fn size_within_limit(indicator: &str, max_mb: f64) -> bool {
	let Some(caps) = SIZE.captures(indicator) else {
		return true;
	};
	let Ok(value) = caps[1].parse::<f64>() else {
		return true;
	};
	let unit = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
	let mb = match unit.as_deref() {
		Some("b") => value / (1024.0 * 1024.0),
		Some("kb") => value / 1024.0,
		Some("gb") => value * 1024.0,
		_ => value,
	};
	mb <= max_mb
}

/// The "Import Orders" modal on the create order page.
pub struct ImportOrdersPage<'a, P: Page + ?Sized> {
	page: &'a P,
}

impl<'a, P: Page + ?Sized> ImportOrdersPage<'a, P> {
	pub fn new(page: &'a P) -> Self {
		Self { page }
	}

	/// From the dashboard: Add New Order, then Import Orders.
	pub async fn open_from_dashboard(&self, timeout: Duration) -> Result<()> {
		self.page.wait_for_load().await?;
		targets::add_new_order().timeout(timeout).click(self.page).await?;
		self.page.wait_for_load().await?;
		self.open_modal(timeout).await
	}

	/// Clicks Import Orders on the create order page and waits for the modal.
	pub async fn open_modal(&self, timeout: Duration) -> Result<()> {
		targets::open_import().timeout(timeout).click(self.page).await?;
		self.wait_modal(timeout).await?;
		info!(target = "ew", "import orders modal open");
		Ok(())
	}

	pub async fn wait_modal(&self, timeout: Duration) -> Result<()> {
		match targets::modal().wait_visible(self.page, timeout).await {
			Ok(_) => Ok(()),
			Err(err) => {
				debug!(target = "ew", error = %err, "modal container not found, checking title");
				targets::title().wait_visible(self.page, timeout).await.map(|_| ())
			}
		}
	}

	pub async fn is_modal_visible(&self) -> Result<bool> {
		Ok(targets::modal().is_visible(self.page).await? || targets::title().is_visible(self.page).await?)
	}

	/// Closes the modal when a close control is visible.
	pub async fn close(&self) -> Result<bool> {
		match targets::close().find(self.page).await? {
			Some(close) => {
				self.page.click(close).await?;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	pub async fn upload(&self, file: &Path) -> Result<()> {
		debug!(target = "ew", file = %file.display(), "uploading import file");
		targets::file_input()
			.set_input_files(self.page, &[PathBuf::from(file)])
			.await?;
		self.page.wait_for_load().await
	}

	pub async fn is_file_uploaded(&self) -> Result<bool> {
		targets::file_preview().is_visible(self.page).await
	}

	pub async fn submit(&self) -> Result<()> {
		targets::submit().click(self.page).await?;
		self.page.wait_for_load().await
	}

	/// Uploads `file` and submits the import.
	pub async fn import(&self, file: &Path) -> Result<()> {
		self.upload(file).await?;
		self.submit().await
	}

	pub async fn is_submit_visible(&self) -> Result<bool> {
		targets::submit().is_visible(self.page).await
	}

	pub async fn is_submit_enabled(&self) -> Result<bool> {
		targets::submit().is_enabled(self.page).await
	}

	pub async fn click_download_template(&self) -> Result<()> {
		targets::download_template().click(self.page).await
	}

	pub async fn is_download_template_visible(&self) -> Result<bool> {
		targets::download_template().is_visible(self.page).await
	}

	pub async fn is_upload_section_visible(&self) -> Result<bool> {
		targets::upload_section().is_visible(self.page).await
	}

	pub async fn instructions(&self) -> Result<Option<String>> {
		self.optional_text(&targets::instructions()).await
	}

	/// Column names whose description is not shown in the modal.
	pub async fn missing_column_docs(&self) -> Result<Vec<&'static str>> {
		let mut missing = Vec::new();
		for (column, required) in IMPORT_COLUMNS {
			let kind = if required { "required" } else { "optional" };
			let doc = Strategy::text(pat(&format!("{column}.*{kind}")));
			if !self.page.is_visible(&doc).await? {
				missing.push(column);
			}
		}
		Ok(missing)
	}

	pub async fn confirmation_message(&self) -> Result<Option<String>> {
		self.optional_text(&targets::confirmation()).await
	}

	pub async fn error_message(&self) -> Result<Option<String>> {
		self.optional_text(&targets::error()).await
	}

	/// Waits for any message matching `pattern` (case-insensitive).
	pub async fn wait_for_message(&self, pattern: &str, timeout: Duration) -> Result<String> {
		let target = Target::new(format!("message /{pattern}/"))
			.or(Strategy::text(pat(pattern)).nth(0))
			.timeout(timeout);
		target.text(self.page).await
	}

	/// Waits for the success notification; `false` when none shows up.
	pub async fn wait_for_completion(&self, timeout: Duration) -> Result<bool> {
		self.page.wait_for_load().await?;
		Ok(targets::confirmation().wait_visible(self.page, timeout).await.is_ok())
	}

	pub async fn file_size(&self) -> Result<Option<String>> {
		self.optional_text(&targets::file_size()).await
	}

	pub async fn file_type(&self) -> Result<Option<String>> {
		self.optional_text(&targets::file_type()).await
	}

	/// Checks the size shown for the uploaded file against `max_mb`.
	pub async fn file_size_within(&self, max_mb: f64) -> Result<bool> {
		Ok(match self.file_size().await? {
			Some(size) => size_within_limit(&size, max_mb),
			None => true,
		})
	}

	async fn optional_text(&self, target: &Target) -> Result<Option<String>> {
		let Some(strategy) = target.find(self.page).await? else {
			return Ok(None);
		};
		Ok(self
			.page
			.text_content(strategy)
			.await?
			.map(|t| t.trim().to_string())
			.filter(|t| !t.is_empty()))
	}
}
