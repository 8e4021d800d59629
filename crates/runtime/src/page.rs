//! [`ew::Page`] over a Chromium tab.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::network::{
	Cookie as CdpCookie, CookieParam, CookieSameSite, SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::element::Element;
use ew_protocol::{Cookie, OriginState, SameSite, StorageState, Strategy};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::script::{self, Probe};

/// How long `wait_for_load` waits for `document.readyState == "complete"`.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// One Chromium tab driven over CDP.
pub struct ChromiumPage {
	inner: chromiumoxide::Page,
	next_tag: AtomicU64,
}

impl ChromiumPage {
	pub fn new(inner: chromiumoxide::Page) -> Self {
		Self {
			inner,
			next_tag: AtomicU64::new(1),
		}
	}

	/// The underlying chromiumoxide page, for CDP calls the suite does not wrap.
	pub fn inner(&self) -> &chromiumoxide::Page {
		&self.inner
	}

	async fn eval<T: DeserializeOwned>(&self, expression: String) -> Result<T> {
		let result = self.inner.evaluate_expression(EvaluateParams::new(expression)).await?;
		Ok(result.into_value()?)
	}

	async fn probe<T: DeserializeOwned>(&self, strategy: &Strategy, expression: String) -> Result<Option<T>> {
		let probe: Probe<T> = self.eval(expression).await?;
		if !probe.found {
			return Err(Error::NoMatch(strategy.to_string()));
		}
		Ok(probe.value)
	}

	/// Resolves the first match and fetches it as a CDP element.
	async fn element(&self, strategy: &Strategy, clear: bool) -> Result<Element> {
		let token = self.next_tag.fetch_add(1, Ordering::Relaxed);
		let tagged: bool = self.eval(script::tag(strategy, token, clear)?).await?;
		if !tagged {
			return Err(Error::NoMatch(strategy.to_string()));
		}
		trace!(target = "ew", %strategy, token, "resolved element");
		Ok(self.inner.find_element(script::tagged_selector(token)).await?)
	}

	async fn local_storage(&self) -> Result<Option<OriginState>> {
		let probe: Probe<OriginState> = self.eval(script::LOCAL_STORAGE.to_string()).await?;
		Ok(if probe.found { probe.value } else { None })
	}
}

#[async_trait]
impl ew::Page for ChromiumPage {
	async fn goto(&self, url: &str) -> ew::Result<()> {
		debug!(target = "ew", url, "navigate");
		self.inner.goto(url).await.map_err(Error::from)?;
		self.wait_for_load().await
	}

	async fn current_url(&self) -> ew::Result<String> {
		Ok(self.inner.url().await.map_err(Error::from)?.unwrap_or_default())
	}

	async fn title(&self) -> ew::Result<String> {
		Ok(self.inner.get_title().await.map_err(Error::from)?.unwrap_or_default())
	}

	async fn content(&self) -> ew::Result<String> {
		Ok(self.inner.content().await.map_err(Error::from)?)
	}

	async fn count(&self, strategy: &Strategy) -> ew::Result<usize> {
		Ok(self.eval(script::count(strategy)?).await?)
	}

	async fn is_visible(&self, strategy: &Strategy) -> ew::Result<bool> {
		Ok(self.eval(script::is_visible(strategy)?).await?)
	}

	async fn is_enabled(&self, strategy: &Strategy) -> ew::Result<bool> {
		let enabled = self.probe(strategy, script::is_enabled(strategy)?).await?;
		Ok(enabled.unwrap_or(false))
	}

	async fn is_checked(&self, strategy: &Strategy) -> ew::Result<bool> {
		let checked = self.probe(strategy, script::is_checked(strategy)?).await?;
		Ok(checked.unwrap_or(false))
	}

	async fn fill(&self, strategy: &Strategy, value: &str) -> ew::Result<()> {
		let element = self.element(strategy, true).await?;
		element.click().await.map_err(Error::from)?;
		if !value.is_empty() {
			element.type_str(value).await.map_err(Error::from)?;
		}
		Ok(())
	}

	async fn click(&self, strategy: &Strategy) -> ew::Result<()> {
		let element = self.element(strategy, false).await?;
		element.click().await.map_err(Error::from)?;
		Ok(())
	}

	async fn check(&self, strategy: &Strategy) -> ew::Result<()> {
		if self.is_checked(strategy).await? {
			return Ok(());
		}
		self.click(strategy).await
	}

	async fn input_value(&self, strategy: &Strategy) -> ew::Result<String> {
		let value = self.probe(strategy, script::input_value(strategy)?).await?;
		Ok(value.unwrap_or_default())
	}

	async fn attribute(&self, strategy: &Strategy, name: &str) -> ew::Result<Option<String>> {
		Ok(self.probe(strategy, script::attribute(strategy, name)?).await?)
	}

	async fn text_content(&self, strategy: &Strategy) -> ew::Result<Option<String>> {
		Ok(self.probe(strategy, script::text_content(strategy)?).await?)
	}

	async fn set_input_files(&self, strategy: &Strategy, files: &[PathBuf]) -> ew::Result<()> {
		let files = files
			.iter()
			.map(|file| std::path::absolute(file).map(|path| path.to_string_lossy().into_owned()))
			.collect::<std::io::Result<Vec<_>>>()?;
		let element = self.element(strategy, false).await?;
		let mut params = SetFileInputFilesParams::new(files);
		params.backend_node_id = Some(element.backend_node_id);
		self.inner.execute(params).await.map_err(Error::from)?;
		Ok(())
	}

	async fn wait_for_load(&self) -> ew::Result<()> {
		ew::page::poll_until(LOAD_TIMEOUT, "document to finish loading", move || async move {
			let state: String = self.eval(script::READY_STATE.to_string()).await?;
			Ok((state == "complete").then_some(()))
		})
		.await
	}

	/// localStorage is read through the current document, so only its
	/// origin is captured.
	async fn storage_state(&self) -> ew::Result<StorageState> {
		let cookies = self.inner.get_cookies().await.map_err(Error::from)?;
		let mut state = StorageState::new();
		state.cookies = cookies.into_iter().map(from_cdp_cookie).collect();
		if let Some(origin) = self.local_storage().await? {
			state.origins.push(origin);
		}
		debug!(
			target = "ew",
			cookies = state.cookies.len(),
			origins = state.origins.len(),
			"captured storage state"
		);
		Ok(state)
	}

	async fn apply_storage_state(&self, state: &StorageState) -> ew::Result<()> {
		if !state.cookies.is_empty() {
			let cookies = state.cookies.iter().map(to_cdp_cookie).collect::<Result<Vec<_>>>()?;
			self.inner
				.execute(SetCookiesParams::new(cookies))
				.await
				.map_err(Error::from)?;
		}
		if !state.origins.is_empty() {
			let restore = script::restore_local_storage(&state.origins)?;
			self.inner
				.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(restore.clone()))
				.await
				.map_err(Error::from)?;
			let _: bool = self.eval(restore).await?;
		}
		debug!(
			target = "ew",
			cookies = state.cookies.len(),
			origins = state.origins.len(),
			"applied storage state"
		);
		Ok(())
	}
}

fn from_cdp_cookie(cookie: CdpCookie) -> Cookie {
	let expires = if cookie.session { -1.0 } else { cookie.expires };
	let mut out = Cookie::new(cookie.name, cookie.value, cookie.domain)
		.path(cookie.path)
		.expires(expires)
		.http_only(cookie.http_only)
		.secure(cookie.secure);
	if let Some(same_site) = cookie.same_site {
		out = out.same_site(match same_site.as_ref() {
			"Strict" => SameSite::Strict,
			"None" => SameSite::None,
			_ => SameSite::Lax,
		});
	}
	out
}

fn to_cdp_cookie(cookie: &Cookie) -> Result<CookieParam> {
	let mut builder = CookieParam::builder()
		.name(cookie.name.clone())
		.value(cookie.value.clone());
	if let Some(domain) = &cookie.domain {
		builder = builder.domain(domain.clone());
	}
	if let Some(path) = &cookie.path {
		builder = builder.path(path.clone());
	}
	if let Some(secure) = cookie.secure {
		builder = builder.secure(secure);
	}
	if let Some(http_only) = cookie.http_only {
		builder = builder.http_only(http_only);
	}
	if let Some(same_site) = cookie.same_site {
		builder = builder.same_site(match same_site {
			SameSite::Strict => CookieSameSite::Strict,
			SameSite::Lax => CookieSameSite::Lax,
			SameSite::None => CookieSameSite::None,
		});
	}
	if let Some(expires) = cookie.expires.filter(|_| !cookie.is_session()) {
		builder = builder.expires(TimeSinceEpoch::new(expires));
	}
	builder.build().map_err(Error::Params)
}
