//! `ew auth`: the cached authentication state.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use colored::Colorize;
use ew::auth_store::Freshness;
use ew::{AuthStore, Config, Invalidation, Page, SessionBootstrap, Timeouts};
use ew_protocol::{Cookie, StorageState};
use ew_runtime::{BrowserSession, LaunchOptions};
use serde::Serialize;
use tracing::{info, warn};

use super::Context;
use crate::cli::{EnrollArgs, SetupArgs};
use crate::error::{CliError, Result};
use crate::output::ResultBuilder;

pub fn check(ctx: &Context) -> Result<()> {
	let freshness = ctx.store().check_freshness()?;
	let mut result = ResultBuilder::new("auth.check")
		.line(format!("Auth state: {}", freshness.path.display()))
		.line(format!("Status:     {}", status_label(&freshness)));
	if let Some(age) = freshness.age_secs {
		result = result.line(format!(
			"Age:        {} (stale after {}h)",
			format_age(age),
			freshness.stale_after_hours
		));
	}
	ctx.emit(&result.data(freshness).build());
	Ok(())
}

fn status_label(freshness: &Freshness) -> colored::ColoredString {
	if !freshness.exists {
		"missing".yellow()
	} else if freshness.is_stale {
		"stale".yellow()
	} else {
		"fresh".green()
	}
}

fn format_age(secs: u64) -> String {
	match secs {
		s if s < 60 => format!("{s}s"),
		s if s < 3600 => format!("{}m", s / 60),
		s => format!("{}h {}m", s / 3600, (s % 3600) / 60),
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupData {
	path: PathBuf,
	#[serde(flatten)]
	removed: Invalidation,
}

pub fn cleanup(ctx: &Context) -> Result<()> {
	let store = ctx.store();
	let removed = store.invalidate()?;

	let mut result = ResultBuilder::new("auth.cleanup");
	result = if removed.removed_file {
		result.line(format!("{} {}", "Removed".green(), store.path().display()))
	} else {
		result.line(format!("No auth state at {}", store.path().display()))
	};
	if removed.removed_dir {
		if let Some(dir) = store.path().parent() {
			result = result.line(format!("{} empty directory {}", "Removed".green(), dir.display()));
		}
	}

	ctx.emit(
		&result
			.data(CleanupData {
				path: store.path().to_path_buf(),
				removed,
			})
			.build(),
	);
	Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CookieSummary {
	name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	domain: Option<String>,
	expires: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OriginSummary {
	origin: String,
	keys: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowData {
	file: PathBuf,
	cookies: Vec<CookieSummary>,
	cookie_count: usize,
	origins: Vec<OriginSummary>,
	origin_count: usize,
}

pub fn show(ctx: &Context, file: Option<PathBuf>) -> Result<()> {
	let store = match file {
		Some(file) => AuthStore::new(file),
		None => ctx.store(),
	};
	let state = store
		.load()?
		.ok_or_else(|| CliError::AuthFileMissing(store.path().to_path_buf()))?;
	let data = summarize(store.path(), &state, ew::totp::unix_secs(SystemTime::now()));

	let mut result = ResultBuilder::new("auth.show").line(format!(
		"{}: {} cookies, {} origins",
		data.file.display(),
		data.cookie_count,
		data.origin_count
	));
	for cookie in &data.cookies {
		result = result.line(format!(
			"  {:<32} {:<28} {}",
			cookie.name,
			cookie.domain.as_deref().unwrap_or("-"),
			cookie.expires.dimmed()
		));
	}
	for origin in &data.origins {
		result = result.line(format!("  {} localStorage: {}", origin.origin, origin.keys.join(", ")));
	}
	ctx.emit(&result.data(data).build());
	Ok(())
}

/// Cookie and localStorage names only; values stay in the file.
fn summarize(file: &Path, state: &StorageState, now: u64) -> ShowData {
	ShowData {
		file: file.to_path_buf(),
		cookies: state
			.cookies
			.iter()
			.map(|cookie| CookieSummary {
				name: cookie.name.clone(),
				domain: cookie.domain.clone(),
				expires: format_expiry(cookie, now),
			})
			.collect(),
		cookie_count: state.cookies.len(),
		origins: state
			.origins
			.iter()
			.map(|origin| OriginSummary {
				origin: origin.origin.clone(),
				keys: origin.local_storage.iter().map(|entry| entry.name.clone()).collect(),
			})
			.collect(),
		origin_count: state.origins.len(),
	}
}

fn format_expiry(cookie: &Cookie, now: u64) -> String {
	let ts = match cookie.expires {
		_ if cookie.is_session() => return "session".into(),
		Some(ts) => ts as u64,
		None => return "session".into(),
	};
	if ts < now {
		return "expired".into();
	}
	match ts - now {
		d if d < 3600 => format!("{}m", d / 60),
		d if d < 86400 => format!("{}h", d / 3600),
		d => format!("{}d", d / 86400),
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetupData {
	path: PathBuf,
	reused: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	cookie_count: Option<usize>,
}

pub async fn setup(ctx: &Context, args: &SetupArgs) -> Result<()> {
	let store = ctx.store();
	if args.reuse {
		let freshness = store.check_freshness()?;
		if freshness.exists && !freshness.is_stale {
			info!(target = "ew", path = %store.path().display(), "cached auth state is fresh, keeping it");
			ctx.emit(
				&ResultBuilder::new("auth.setup")
					.line(format!("Auth state is fresh, kept {}", store.path().display()))
					.data(SetupData {
						path: store.path().to_path_buf(),
						reused: true,
						cookie_count: None,
					})
					.build(),
			);
			return Ok(());
		}
	}

	let config = ctx.config()?;
	config.email()?;
	config.password()?;
	config.totp_secret()?;

	let session = BrowserSession::launch(&launch_options(args.headed, args.chrome.as_deref())).await?;
	let outcome = sign_in_and_save(&session, store.clone(), &config).await;
	if let Err(err) = session.close().await {
		warn!(target = "ew", error = %err, "failed to close browser");
	}
	let state = outcome?;

	ctx.emit(
		&ResultBuilder::new("auth.setup")
			.line(format!("{} {}", "Saved".green(), store.path().display()))
			.line(format!("{} cookies, {} origins", state.cookies.len(), state.origins.len()))
			.data(SetupData {
				path: store.path().to_path_buf(),
				reused: false,
				cookie_count: Some(state.cookies.len()),
			})
			.build(),
	);
	Ok(())
}

async fn sign_in_and_save(session: &BrowserSession, store: AuthStore, config: &Config) -> Result<StorageState> {
	let page = session.new_page().await?;
	let state = SessionBootstrap::new(store, config)
		.timeouts(Timeouts::from_config(config))
		.refresh(&page)
		.await?;
	Ok(state)
}

fn launch_options(headed: bool, chrome: Option<&Path>) -> LaunchOptions {
	let options = LaunchOptions::default().headed(headed);
	match chrome {
		Some(chrome) => options.executable(chrome),
		None => options,
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnrollData {
	secret: String,
	path: PathBuf,
}

/// Enables two-factor through a real browser. The secret is printed, never
/// logged, and the signed-in state is cached like `auth setup` does.
pub async fn enroll(ctx: &Context, args: &EnrollArgs) -> Result<()> {
	let store = ctx.store();
	let config = ctx.config()?;
	let email = config.email()?.to_string();
	config.password()?;

	let session = BrowserSession::launch(&launch_options(args.headed, args.chrome.as_deref())).await?;
	let outcome = enroll_and_save(&session, &store, &config).await;
	if let Err(err) = session.close().await {
		warn!(target = "ew", error = %err, "failed to close browser");
	}
	let secret = outcome?;

	ctx.emit(
		&ResultBuilder::new("auth.enroll")
			.line(format!("{} two-factor for {email}", "Enabled".green()))
			.line(format!("TOTP_SECRET={secret}"))
			.line("Add it to .env before the next sign in.")
			.line(format!("{} {}", "Saved".green(), store.path().display()))
			.data(EnrollData {
				secret,
				path: store.path().to_path_buf(),
			})
			.build(),
	);
	Ok(())
}

async fn enroll_and_save(session: &BrowserSession, store: &AuthStore, config: &Config) -> Result<String> {
	let page = session.new_page().await?;
	let secret = ew::enroll(&page, config, &Timeouts::from_config(config)).await?;
	store.save(&page.storage_state().await?)?;
	Ok(secret)
}
