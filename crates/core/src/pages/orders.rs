use std::time::Duration;

use ew_protocol::{Strategy, TextMatch};
use tracing::debug;

use super::paths;
use crate::config::Config;
use crate::error::Result;
use crate::locator::{Target, pat};
use crate::page::{Page, poll_until};

pub mod targets {
	use ew_protocol::{Strategy, TextMatch};

	use crate::locator::{Target, pat};

	fn labelled(name: &str, label: &str) -> Target {
		Target::new(name).or(Strategy::label(pat(label)).nth(0))
	}

	pub fn heading() -> Target {
		Target::new("create order heading")
			.or(Strategy::role("heading", TextMatch::exact("Create New Order")))
			.or(Strategy::role("heading", pat("add new order")))
	}

	pub fn breadcrumb() -> Target {
		Target::new("orders breadcrumb").or(Strategy::role("link", TextMatch::exact("Orders")))
	}

	pub fn import_orders() -> Target {
		Target::new("import orders")
			.or(Strategy::has_text("button.fi-btn", pat("import orders")).nth(0))
			.or(Strategy::role("button", pat("import orders")))
	}

	pub fn recalculate() -> Target {
		Target::new("recalculate order summary").or(Strategy::role("button", pat("recalculate order summary")))
	}

	pub fn create() -> Target {
		Target::new("create")
			.or(Strategy::role("button", pat("^create$")).nth(3))
			.or(Strategy::css("form button[type=submit].fi-btn").nth(0))
			.or(Strategy::role("button", pat("^create$")))
	}

	pub fn create_another() -> Target {
		Target::new("create & create another").or(Strategy::role("button", pat("create & create another")))
	}

	pub fn order_name() -> Target {
		labelled("order name", "order name")
	}

	pub fn receiving_agent() -> Target {
		labelled("receiving agent", "receiving agent")
	}

	pub fn telegram_handle() -> Target {
		labelled("telegram handle", "telegram handle of person receiving notifications")
	}

	pub fn telegram_group_id() -> Target {
		labelled("telegram group id", "telegram group id")
	}

	pub fn discount_heading() -> Target {
		Target::new("discount settings heading")
			.or(Strategy::role("heading", pat("discount tier and premium charge settings")))
	}

	pub fn discount_tier() -> Target {
		labelled("agent discount tier", "agent discount tier")
	}

	pub fn override_default() -> Target {
		labelled("override default behavior", "override default behavior")
	}

	pub fn summary_heading() -> Target {
		Target::new("order summary heading").or(Strategy::role("heading", pat("order summary")))
	}

	pub fn total_amount() -> Target {
		Target::new("total amount summary").or(Strategy::css("#total-amount-summary"))
	}

	pub fn order_amount() -> Target {
		labelled("order amount", "order amount")
	}

	pub fn minimum_send_amount() -> Target {
		labelled("minimum send amount", "set default minimum amount")
	}

	pub fn wallet_platforms_heading() -> Target {
		Target::new("wallet platforms heading").or(Strategy::role("heading", pat("wallet platforms")))
	}

	pub fn add_wallet_platform() -> Target {
		Target::new("add wallet platform").or(Strategy::role("button", pat("add wallet platform")))
	}

	pub fn platform() -> Target {
		labelled("platform", "^platform")
	}

	pub fn platform_account() -> Target {
		labelled("username/phone/email", r"username/phone/email")
	}

	pub fn wallet_platform_rows() -> Strategy {
		Strategy::css("[data-testid=wallet-platform], .wallet-platform-section")
	}

	pub fn validation_error() -> Target {
		Target::new("order validation")
			.or(Strategy::css(".fi-fo-field-wrp-error-message"))
			.or(Strategy::css(".text-red-500, .error-message"))
			.or(Strategy::css("[class*=error]"))
	}
}

/// Fields of the create order form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewOrder {
	pub name: String,
	pub receiving_agent: Option<String>,
	pub discount_tier: Option<String>,
	pub telegram_handle: Option<String>,
	pub amount: Option<String>,
	pub minimum_send_amount: Option<String>,
	pub platform: Option<String>,
	pub platform_account: Option<String>,
}

/// The create order form reached through "Add New Order".
pub struct OrderPage<'a, P: Page + ?Sized> {
	page: &'a P,
	config: &'a Config,
}

impl<'a, P: Page + ?Sized> OrderPage<'a, P> {
	pub fn new(page: &'a P, config: &'a Config) -> Self {
		Self { page, config }
	}

	pub async fn open(&self) -> Result<()> {
		self.page.goto(&self.config.url(paths::CREATE_ORDER)).await?;
		self.page.wait_for_load().await
	}

	pub async fn wait_loaded(&self, timeout: Duration) -> Result<()> {
		targets::heading().wait_visible(self.page, timeout).await?;
		Ok(())
	}

	pub async fn heading_text(&self) -> Result<String> {
		targets::heading().text(self.page).await
	}

	/// Names of form controls that are not visible.
	pub async fn missing_elements(&self) -> Result<Vec<String>> {
		let expected = [
			targets::breadcrumb(),
			targets::import_orders(),
			targets::recalculate(),
			targets::order_name(),
			targets::receiving_agent(),
			targets::telegram_handle(),
			targets::telegram_group_id(),
			targets::discount_heading(),
			targets::discount_tier(),
			targets::summary_heading(),
			targets::total_amount(),
			targets::order_amount(),
			targets::minimum_send_amount(),
			targets::wallet_platforms_heading(),
			targets::add_wallet_platform(),
			targets::platform(),
			targets::platform_account(),
			targets::create(),
			targets::create_another(),
		];
		let mut missing = Vec::new();
		for target in &expected {
			if !target.is_visible(self.page).await? {
				missing.push(target.name().to_string());
			}
		}
		Ok(missing)
	}

	pub async fn enter_order_name(&self, name: &str) -> Result<()> {
		targets::order_name().fill(self.page, name).await
	}

	pub async fn order_name_value(&self) -> Result<String> {
		targets::order_name().input_value(self.page).await
	}

	pub async fn enter_order_amount(&self, amount: &str) -> Result<()> {
		targets::order_amount().fill(self.page, amount).await
	}

	pub async fn order_amount_value(&self) -> Result<String> {
		targets::order_amount().input_value(self.page).await
	}

	pub async fn enter_minimum_send_amount(&self, amount: &str) -> Result<()> {
		targets::minimum_send_amount().fill(self.page, amount).await
	}

	pub async fn enter_platform_account(&self, value: &str) -> Result<()> {
		targets::platform_account().fill(self.page, value).await
	}

	pub async fn select_receiving_agent(&self, agent: &str) -> Result<()> {
		self.select(&targets::receiving_agent(), agent).await
	}

	pub async fn select_discount_tier(&self, tier: &str) -> Result<()> {
		self.select(&targets::discount_tier(), tier).await
	}

	pub async fn select_telegram_handle(&self, handle: &str) -> Result<()> {
		self.select(&targets::telegram_handle(), handle).await
	}

	pub async fn select_platform(&self, platform: &str) -> Result<()> {
		self.select(&targets::platform(), platform).await
	}

	pub async fn telegram_group_id(&self) -> Result<String> {
		targets::telegram_group_id().input_value(self.page).await
	}

	/// Opens a select-style dropdown and reports whether options appeared.
	pub async fn dropdown_has_options(&self, dropdown: &Target, timeout: Duration) -> Result<bool> {
		dropdown.click(self.page).await?;
		let options = Strategy::any_role("option");
		let found = poll_until(timeout, "dropdown options", move || {
			let options = options.clone();
			async move { Ok((self.page.count(&options).await? > 0).then_some(())) }
		})
		.await;
		Ok(found.is_ok())
	}

	/// Opens the dropdown and clicks the option called `option`.
	async fn select(&self, dropdown: &Target, option: &str) -> Result<()> {
		dropdown.click(self.page).await?;
		Target::new(format!("{} option {option}", dropdown.name()))
			.or(Strategy::role("option", TextMatch::exact(option)))
			.or(Strategy::role("option", pat(&regex::escape(option))))
			.click(self.page)
			.await?;
		debug!(target = "ew", dropdown = dropdown.name(), option, "selected option");
		Ok(())
	}

	pub async fn total_amount(&self) -> Result<String> {
		targets::total_amount().text(self.page).await
	}

	pub async fn recalculate(&self) -> Result<()> {
		targets::recalculate().click(self.page).await
	}

	pub async fn wallet_platform_count(&self) -> Result<usize> {
		self.page.count(&targets::wallet_platform_rows()).await
	}

	pub async fn add_wallet_platform(&self) -> Result<()> {
		targets::add_wallet_platform().click(self.page).await
	}

	pub async fn create(&self) -> Result<()> {
		targets::create().click(self.page).await
	}

	/// Fills every provided field, then submits.
	pub async fn submit(&self, order: &NewOrder) -> Result<()> {
		self.enter_order_name(&order.name).await?;
		if let Some(agent) = &order.receiving_agent {
			self.select_receiving_agent(agent).await?;
		}
		if let Some(tier) = &order.discount_tier {
			self.select_discount_tier(tier).await?;
		}
		if let Some(handle) = &order.telegram_handle {
			self.select_telegram_handle(handle).await?;
		}
		if let Some(amount) = &order.amount {
			self.enter_order_amount(amount).await?;
		}
		if let Some(amount) = &order.minimum_send_amount {
			self.enter_minimum_send_amount(amount).await?;
		}
		if let Some(platform) = &order.platform {
			self.select_platform(platform).await?;
		}
		if let Some(account) = &order.platform_account {
			self.enter_platform_account(account).await?;
		}
		self.create().await
	}

	/// First validation message on the form, if any.
	pub async fn validation_error(&self) -> Result<Option<String>> {
		let target = targets::validation_error();
		match target.find(self.page).await? {
			Some(strategy) => Ok(self.page.text_content(strategy).await?.map(|t| t.trim().to_string())),
			None => Ok(None),
		}
	}

	/// Waits for a validation message to show up.
	pub async fn wait_validation_error(&self, timeout: Duration) -> Result<String> {
		let target = targets::validation_error();
		target.wait_visible(self.page, timeout).await?;
		target.text(self.page).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{FakePage, Screen};

	const CREATE: &str = "https://e.test/admin/orders/create";

	fn config() -> Config {
		Config {
			base_url: "https://e.test".into(),
			..Config::default()
		}
	}

	fn first(target: Target) -> Strategy {
		target.candidates()[0].clone()
	}

	#[tokio::test(start_paused = true)]
	async fn submit_fills_fields_and_picks_options() {
		let agent_option = Strategy::role("option", TextMatch::exact("Test Agent"));
		let page = FakePage::new();
		page.add_screen(
			CREATE,
			Screen::new()
				.show(first(targets::heading()))
				.show(first(targets::order_name()))
				.show(first(targets::order_amount()))
				.show(first(targets::create()))
				.on_click(first(targets::receiving_agent()), {
					let agent_option = agent_option.clone();
					move |state| state.reveal(agent_option.clone())
				}),
		);
		let config = config();
		let orders = OrderPage::new(&page, &config);
		orders.open().await.unwrap();
		orders.wait_loaded(Duration::from_secs(1)).await.unwrap();

		orders
			.submit(&NewOrder {
				name: "Valid Test Order".into(),
				receiving_agent: Some("Test Agent".into()),
				amount: Some("100".into()),
				..NewOrder::default()
			})
			.await
			.unwrap();

		assert_eq!(orders.order_name_value().await.unwrap(), "Valid Test Order");
		assert_eq!(orders.order_amount_value().await.unwrap(), "100");
		assert_eq!(
			page.clicks(),
			vec![
				first(targets::receiving_agent()).to_string(),
				agent_option.to_string(),
				first(targets::create()).to_string(),
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn empty_submit_surfaces_validation_error() {
		let error = first(targets::validation_error());
		let page = FakePage::new();
		page.add_screen(
			CREATE,
			Screen::new()
				.show(first(targets::order_name()))
				.hidden_text(error.clone(), "  The Order Name field is required. ")
				.on_click(first(targets::create()), move |state| state.reveal(error.clone())),
		);
		let config = config();
		let orders = OrderPage::new(&page, &config);
		orders.open().await.unwrap();

		assert_eq!(orders.validation_error().await.unwrap(), None);
		orders.create().await.unwrap();
		let message = orders.wait_validation_error(Duration::from_secs(1)).await.unwrap();
		assert_eq!(message, "The Order Name field is required.");
	}

	#[tokio::test(start_paused = true)]
	async fn missing_elements_lists_absent_controls() {
		let page = FakePage::new();
		page.add_screen(CREATE, Screen::new().show(first(targets::order_name())));
		let config = config();
		let orders = OrderPage::new(&page, &config);
		orders.open().await.unwrap();

		let missing = orders.missing_elements().await.unwrap();
		assert!(!missing.contains(&"order name".to_string()));
		assert!(missing.contains(&"create".to_string()));
		assert_eq!(missing.len(), 18);
	}
}
