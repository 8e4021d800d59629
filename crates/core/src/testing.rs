//! In-memory [`Page`] for unit tests.
//!
//! Screens are keyed by URL. Each screen lists the strategies that are
//! visible on it plus optional text, attributes and click hooks. The fake
//! models just enough of the admin panel's session handling to exercise the
//! login flow: URLs under `protected` redirect to `login_url` unless the
//! page is authenticated or the URL is listed in `public`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use ew_protocol::{StorageState, Strategy};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::page::Page;

pub type Hook = Arc<dyn Fn(&mut FakeState) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Screen {
	title: String,
	visible: Vec<Strategy>,
	hidden: Vec<Strategy>,
	disabled: HashSet<String>,
	texts: HashMap<String, String>,
	attributes: HashMap<(String, String), String>,
	on_click: HashMap<String, Hook>,
}

impl Screen {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn title(mut self, title: &str) -> Self {
		self.title = title.to_string();
		self
	}

	pub fn show(mut self, strategy: Strategy) -> Self {
		self.visible.push(strategy);
		self
	}

	/// Attached to the DOM but not rendered.
	pub fn attach_hidden(mut self, strategy: Strategy) -> Self {
		self.hidden.push(strategy);
		self
	}

	pub fn disable(mut self, strategy: &Strategy) -> Self {
		self.disabled.insert(strategy.to_string());
		self
	}

	pub fn text(mut self, strategy: Strategy, text: &str) -> Self {
		self.texts.insert(strategy.to_string(), text.to_string());
		self.show(strategy)
	}

	/// Text for an element that only appears once revealed.
	pub fn hidden_text(mut self, strategy: Strategy, text: &str) -> Self {
		self.texts.insert(strategy.to_string(), text.to_string());
		self
	}

	pub fn attribute(mut self, strategy: &Strategy, name: &str, value: &str) -> Self {
		self.attributes
			.insert((strategy.to_string(), name.to_string()), value.to_string());
		self
	}

	pub fn on_click(mut self, strategy: Strategy, hook: impl Fn(&mut FakeState) + Send + Sync + 'static) -> Self {
		self.on_click.insert(strategy.to_string(), Arc::new(hook));
		self.show(strategy)
	}
}

#[derive(Default)]
pub struct FakeState {
	pub url: String,
	screens: HashMap<String, Screen>,
	revealed: Vec<Strategy>,
	pub visits: Vec<String>,
	pub clicks: Vec<String>,
	pub fills: HashMap<String, String>,
	pub checked: HashSet<String>,
	pub uploads: Vec<(String, Vec<PathBuf>)>,
	pub authenticated: bool,
	pub login_url: Option<String>,
	pub protected: Option<String>,
	pub public: Vec<String>,
	/// Storage reported while authenticated.
	pub session: StorageState,
	/// Whether injected snapshots are honoured by the "server".
	pub accepts_restored: bool,
	pub applied: Vec<StorageState>,
}

impl FakeState {
	pub fn navigate(&mut self, url: &str) {
		let mut url = url.to_string();
		if let (Some(protected), Some(login)) = (&self.protected, &self.login_url) {
			if !self.authenticated && url.starts_with(protected.as_str()) && url != *login && !self.public.contains(&url) {
				url = login.clone();
			}
		}
		self.revealed.clear();
		self.visits.push(url.clone());
		self.url = url;
	}

	pub fn reveal(&mut self, strategy: Strategy) {
		self.revealed.push(strategy);
	}

	/// Value last typed into `strategy`.
	pub fn filled(&self, strategy: &Strategy) -> Option<&str> {
		self.fills.get(&strategy.to_string()).map(String::as_str)
	}

	fn screen(&self) -> Option<&Screen> {
		self.screens.get(&self.url)
	}

	fn visible(&self, strategy: &Strategy) -> bool {
		self.revealed.contains(strategy) || self.screen().is_some_and(|s| s.visible.contains(strategy))
	}

	fn attached(&self, strategy: &Strategy) -> bool {
		self.visible(strategy) || self.screen().is_some_and(|s| s.hidden.contains(strategy))
	}

	fn require(&self, strategy: &Strategy) -> Result<()> {
		if self.attached(strategy) {
			Ok(())
		} else {
			Err(Error::Driver(format!("no element matches {strategy} on {}", self.url)))
		}
	}
}

#[derive(Clone)]
pub struct FakePage {
	state: Arc<Mutex<FakeState>>,
}

impl FakePage {
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(FakeState {
				accepts_restored: true,
				..FakeState::default()
			})),
		}
	}

	pub fn add_screen(&self, url: &str, screen: Screen) {
		self.state.lock().screens.insert(url.to_string(), screen);
	}

	pub fn reveal(&self, strategy: Strategy) {
		self.state.lock().reveal(strategy);
	}

	pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
		f(&mut *self.state.lock())
	}

	pub fn clicks(&self) -> Vec<String> {
		self.state.lock().clicks.clone()
	}

	pub fn visits(&self) -> Vec<String> {
		self.state.lock().visits.clone()
	}
}

#[async_trait]
impl Page for FakePage {
	async fn goto(&self, url: &str) -> Result<()> {
		self.state.lock().navigate(url);
		Ok(())
	}

	async fn current_url(&self) -> Result<String> {
		Ok(self.state.lock().url.clone())
	}

	async fn title(&self) -> Result<String> {
		Ok(self.state.lock().screen().map(|s| s.title.clone()).unwrap_or_default())
	}

	async fn content(&self) -> Result<String> {
		let state = self.state.lock();
		let texts = state.screen().map(|s| s.texts.values().cloned().collect::<Vec<_>>());
		Ok(format!("<html><body>{}</body></html>", texts.unwrap_or_default().join("\n")))
	}

	async fn count(&self, strategy: &Strategy) -> Result<usize> {
		Ok(usize::from(self.state.lock().attached(strategy)))
	}

	async fn is_visible(&self, strategy: &Strategy) -> Result<bool> {
		Ok(self.state.lock().visible(strategy))
	}

	async fn is_enabled(&self, strategy: &Strategy) -> Result<bool> {
		let state = self.state.lock();
		state.require(strategy)?;
		Ok(!state.screen().is_some_and(|s| s.disabled.contains(&strategy.to_string())))
	}

	async fn is_checked(&self, strategy: &Strategy) -> Result<bool> {
		let state = self.state.lock();
		state.require(strategy)?;
		Ok(state.checked.contains(&strategy.to_string()))
	}

	async fn fill(&self, strategy: &Strategy, value: &str) -> Result<()> {
		let mut state = self.state.lock();
		state.require(strategy)?;
		state.fills.insert(strategy.to_string(), value.to_string());
		Ok(())
	}

	async fn click(&self, strategy: &Strategy) -> Result<()> {
		let mut state = self.state.lock();
		state.require(strategy)?;
		state.clicks.push(strategy.to_string());
		let hook = state.screen().and_then(|s| s.on_click.get(&strategy.to_string()).cloned());
		if let Some(hook) = hook {
			hook(&mut *state);
		}
		Ok(())
	}

	async fn check(&self, strategy: &Strategy) -> Result<()> {
		let mut state = self.state.lock();
		state.require(strategy)?;
		state.checked.insert(strategy.to_string());
		Ok(())
	}

	async fn input_value(&self, strategy: &Strategy) -> Result<String> {
		let state = self.state.lock();
		state.require(strategy)?;
		Ok(state.filled(strategy).unwrap_or_default().to_string())
	}

	async fn attribute(&self, strategy: &Strategy, name: &str) -> Result<Option<String>> {
		let state = self.state.lock();
		state.require(strategy)?;
		let key = (strategy.to_string(), name.to_string());
		Ok(state.screen().and_then(|s| s.attributes.get(&key).cloned()))
	}

	async fn text_content(&self, strategy: &Strategy) -> Result<Option<String>> {
		let state = self.state.lock();
		state.require(strategy)?;
		Ok(state.screen().and_then(|s| s.texts.get(&strategy.to_string()).cloned()))
	}

	async fn set_input_files(&self, strategy: &Strategy, files: &[PathBuf]) -> Result<()> {
		let mut state = self.state.lock();
		state.require(strategy)?;
		state.uploads.push((strategy.to_string(), files.to_vec()));
		Ok(())
	}

	async fn wait_for_load(&self) -> Result<()> {
		Ok(())
	}

	async fn storage_state(&self) -> Result<StorageState> {
		let state = self.state.lock();
		Ok(if state.authenticated {
			state.session.clone()
		} else {
			StorageState::default()
		})
	}

	async fn apply_storage_state(&self, snapshot: &StorageState) -> Result<()> {
		let mut state = self.state.lock();
		state.applied.push(snapshot.clone());
		state.authenticated = state.accepts_restored && !snapshot.is_empty();
		Ok(())
	}
}
