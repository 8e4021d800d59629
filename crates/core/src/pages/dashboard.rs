use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use ew_protocol::Strategy;
use regex::Regex;
use tracing::{debug, info, warn};

use super::paths;
use crate::config::Config;
use crate::error::Result;
use crate::locator::{Target, pat};
use crate::page::Page;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?|-?\.\d+").unwrap());

/// Summary cards shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatCard {
	TotalOrders,
	TotalVolumeSent,
	NetProfit,
	PendingOrders,
	UnmatchedSendRequests,
	DelayedOrders,
	MismatchTransactions,
}

impl StatCard {
	pub const ALL: [StatCard; 7] = [
		StatCard::TotalOrders,
		StatCard::TotalVolumeSent,
		StatCard::NetProfit,
		StatCard::PendingOrders,
		StatCard::UnmatchedSendRequests,
		StatCard::DelayedOrders,
		StatCard::MismatchTransactions,
	];

	pub fn title(self) -> &'static str {
		match self {
			StatCard::TotalOrders => "Total Orders",
			StatCard::TotalVolumeSent => "Total Volume Sent",
			StatCard::NetProfit => "Net Profit",
			StatCard::PendingOrders => "Pending Orders",
			StatCard::UnmatchedSendRequests => "Unmatched Send Requests",
			StatCard::DelayedOrders => "Delayed Orders",
			StatCard::MismatchTransactions => "Mismatch Transactions",
		}
	}
}

impl fmt::Display for StatCard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.title())
	}
}

pub mod targets {
	use ew_protocol::Strategy;

	use super::StatCard;
	use crate::locator::{Target, pat};

	pub fn heading() -> Target {
		Target::new("dashboard heading")
			.or(Strategy::role("heading", pat("dashboard")))
			.or(Strategy::has_text("h1", pat("dashboard")))
	}

	/// Card container; the widget renders the title and the figure together.
	pub fn card(card: StatCard) -> Target {
		let title = pat(&card.title().to_lowercase());
		Target::new(format!("{card} card"))
			.or(Strategy::role("region", title.clone()))
			.or(Strategy::has_text("[class*=card]", title.clone()).nth(0))
			.or(Strategy::has_text(".fi-wi-stats-overview-stat", title.clone()).nth(0))
			.or(Strategy::text(title))
	}

	pub fn breakdown() -> Target {
		Target::new("breakdown link")
			.or(Strategy::role("button", pat("click to see breakdown")))
			.or(Strategy::text(pat("click to see breakdown")))
			.or(Strategy::has_text("a", pat("click to see breakdown")))
	}

	pub fn manage_delayed_orders() -> Target {
		Target::new("manage delayed orders")
			.or(Strategy::role("button", pat("manage delayed orders")))
			.or(Strategy::has_text("a", pat("manage delayed orders")))
			.or(Strategy::text(pat("manage delayed orders")))
	}

	pub fn over_under_sends() -> Target {
		Target::new("view over/under sends")
			.or(Strategy::role("link", pat("view over/under sends")))
			.or(Strategy::has_text("a", pat("over/under sends")))
			.or(Strategy::text(pat("view over/under sends")))
	}

	/// Modal or slide-over opened by the breakdown link.
	pub fn breakdown_details() -> Target {
		Target::new("breakdown details")
			.or(Strategy::any_role("dialog"))
			.or(Strategy::css(".fi-modal-window"))
	}

	pub fn add_new_order() -> Target {
		Target::new("add new order")
			.or(Strategy::has_text("button.fi-btn", pat("add new order")).nth(0))
			.or(Strategy::role("button", pat("add new order")))
			.or(Strategy::role("link", pat("add new order")))
	}

	pub fn user_menu() -> Target {
		Target::new("user menu")
			.or(Strategy::role("button", pat("user menu")))
			.or(Strategy::css(".fi-user-menu button"))
	}

	pub fn logout_button() -> Target {
		Target::new("logout button")
			.or(Strategy::role("button", pat("log ?out|sign out")))
			.or(Strategy::css("form[action*=logout] button"))
	}

	pub fn logout_link() -> Target {
		Target::new("logout link").or(Strategy::role("link", pat("log ?out|sign out")))
	}

	pub fn user_avatar() -> Target {
		Target::new("user avatar")
			.or(Strategy::role("button", pat("profile|account|avatar")))
			.or(Strategy::role("img", pat("avatar|user")))
			.or(Strategy::css(".fi-avatar"))
	}
}

/// First number in a card's text once its title is removed.
///
/// Thousands separators are dropped: `"Total Volume Sent\n$12,450.50"`
/// yields `12450.5`.
pub fn parse_card_value(text: &str, title: &str) -> Option<f64> {
	let body = match Regex::new(&format!("(?i){}", regex::escape(title))) {
		Ok(title) => title.replace_all(text, " ").into_owned(),
		Err(_) => text.to_string(),
	};
	let found = NUMBER.find(&body)?;
	found.as_str().replace(',', "").parse().ok()
}

/// The authenticated landing page.
pub struct DashboardPage<'a, P: Page + ?Sized> {
	page: &'a P,
	config: &'a Config,
	heading: Target,
	breakdown: Target,
	manage_delayed_orders: Target,
	add_new_order: Target,
	user_menu: Target,
	logout_button: Target,
	logout_link: Target,
	user_avatar: Target,
}

impl<'a, P: Page + ?Sized> DashboardPage<'a, P> {
	pub fn new(page: &'a P, config: &'a Config) -> Self {
		Self {
			page,
			config,
			heading: targets::heading(),
			breakdown: targets::breakdown(),
			manage_delayed_orders: targets::manage_delayed_orders(),
			add_new_order: targets::add_new_order(),
			user_menu: targets::user_menu(),
			logout_button: targets::logout_button(),
			logout_link: targets::logout_link(),
			user_avatar: targets::user_avatar(),
		}
	}

	pub async fn open(&self) -> Result<()> {
		self.page.goto(&self.config.url(paths::ADMIN)).await
	}

	/// Waits for the dashboard heading.
	pub async fn wait_loaded(&self, timeout: Duration) -> Result<()> {
		self.heading.wait_visible(self.page, timeout).await?;
		Ok(())
	}

	pub async fn is_loaded(&self) -> Result<bool> {
		self.heading.is_visible(self.page).await
	}

	pub async fn is_card_visible(&self, card: StatCard) -> Result<bool> {
		targets::card(card).is_visible(self.page).await
	}

	/// Raw text of a card, title included.
	pub async fn card_text(&self, card: StatCard) -> Result<String> {
		targets::card(card).text(self.page).await
	}

	/// Figure shown on a card; `None` when the card has no number yet.
	pub async fn card_value(&self, card: StatCard) -> Result<Option<f64>> {
		let text = self.card_text(card).await?;
		let value = parse_card_value(&text, card.title());
		debug!(target = "ew", %card, ?value, "read dashboard card");
		Ok(value)
	}

	/// Cards that are not currently visible.
	pub async fn missing_cards(&self) -> Result<Vec<StatCard>> {
		let mut missing = Vec::new();
		for card in StatCard::ALL {
			if !self.is_card_visible(card).await? {
				missing.push(card);
			}
		}
		Ok(missing)
	}

	/// Clicks the card itself, which links to its detail list.
	pub async fn open_card(&self, card: StatCard) -> Result<()> {
		let title = pat(&card.title().to_lowercase());
		Target::new(format!("{card} link"))
			.or(Strategy::role("link", title.clone()))
			.or(Strategy::has_text("a", title))
			.click(self.page)
			.await
	}

	pub async fn open_breakdown(&self) -> Result<()> {
		self.breakdown.click(self.page).await
	}

	/// Whether the breakdown opened in place; `false` also when it navigated away.
	pub async fn is_breakdown_open(&self, timeout: Duration) -> Result<bool> {
		Ok(targets::breakdown_details().wait_visible(self.page, timeout).await.is_ok())
	}

	pub async fn manage_delayed_orders(&self) -> Result<()> {
		self.manage_delayed_orders.click(self.page).await
	}

	pub async fn view_over_under_sends(&self) -> Result<()> {
		targets::over_under_sends().click(self.page).await
	}

	pub async fn is_add_new_order_visible(&self) -> Result<bool> {
		self.add_new_order.is_visible(self.page).await
	}

	pub async fn click_add_new_order(&self) -> Result<()> {
		self.add_new_order.click(self.page).await
	}

	pub async fn is_user_avatar_visible(&self) -> Result<bool> {
		self.user_avatar.is_visible(self.page).await
	}

	/// Logs out through the user menu, a logout link, or the logout route.
	pub async fn logout(&self) -> Result<()> {
		match self.logout_via_ui().await {
			Ok(true) => {}
			Ok(false) => {
				debug!(target = "ew", "no logout control visible, using logout route");
				self.page.goto(&self.config.url(paths::LOGOUT)).await?;
			}
			Err(err) => {
				warn!(target = "ew", error = %err, "logout through the menu failed, using logout route");
				self.page.goto(&self.config.url(paths::LOGOUT)).await?;
			}
		}
		info!(target = "ew", "logged out");
		Ok(())
	}

	async fn logout_via_ui(&self) -> Result<bool> {
		if self.user_menu.is_visible(self.page).await? {
			self.user_menu.click(self.page).await?;
			self.logout_button.click(self.page).await?;
			return Ok(true);
		}
		if let Some(link) = self.logout_link.find(self.page).await? {
			self.page.click(link).await?;
			return Ok(true);
		}
		Ok(false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{FakePage, Screen};

	const ADMIN: &str = "https://e.test/admin";

	fn config() -> Config {
		Config {
			base_url: "https://e.test".into(),
			..Config::default()
		}
	}

	#[test]
	fn parses_card_figures() {
		assert_eq!(parse_card_value("Total Orders\n1,204", "Total Orders"), Some(1204.0));
		assert_eq!(
			parse_card_value("Total Volume Sent $12,450.50 last 30 days", "Total Volume Sent"),
			Some(12450.5)
		);
		assert_eq!(parse_card_value("NET PROFIT -320.75", "Net Profit"), Some(-320.75));
		assert_eq!(parse_card_value("Pending Orders", "Pending Orders"), None);
	}

	#[test]
	fn card_title_digits_are_not_values() {
		assert_eq!(parse_card_value("Orders in 24h\n17", "Orders in 24h"), Some(17.0));
	}

	#[tokio::test(start_paused = true)]
	async fn reads_cards_and_reports_missing() {
		let page = FakePage::new();
		page.add_screen(
			ADMIN,
			Screen::new()
				.show(targets::heading().candidates()[0].clone())
				.text(targets::card(StatCard::TotalOrders).candidates()[1].clone(), "Total Orders 42")
				.text(targets::card(StatCard::NetProfit).candidates()[0].clone(), "Net Profit $1,000.25"),
		);
		let config = config();
		let dashboard = DashboardPage::new(&page, &config);
		dashboard.open().await.unwrap();

		assert!(dashboard.is_loaded().await.unwrap());
		assert_eq!(dashboard.card_value(StatCard::TotalOrders).await.unwrap(), Some(42.0));
		assert_eq!(dashboard.card_value(StatCard::NetProfit).await.unwrap(), Some(1000.25));

		let missing = dashboard.missing_cards().await.unwrap();
		assert_eq!(missing.len(), 5);
		assert!(!missing.contains(&StatCard::TotalOrders));
	}

	#[tokio::test(start_paused = true)]
	async fn breakdown_opens_in_a_dialog() {
		let page = FakePage::new();
		let dialog = targets::breakdown_details().candidates()[0].clone();
		page.add_screen(
			ADMIN,
			Screen::new()
				.show(targets::heading().candidates()[0].clone())
				.on_click(targets::breakdown().candidates()[0].clone(), move |state| {
					state.reveal(dialog.clone())
				}),
		);
		let config = config();
		let dashboard = DashboardPage::new(&page, &config);
		dashboard.open().await.unwrap();

		assert!(!dashboard.is_breakdown_open(Duration::ZERO).await.unwrap());
		dashboard.open_breakdown().await.unwrap();
		assert!(dashboard.is_breakdown_open(Duration::from_secs(1)).await.unwrap());
	}

	#[tokio::test(start_paused = true)]
	async fn logout_falls_back_to_route() {
		let page = FakePage::new();
		page.add_screen(ADMIN, Screen::new().show(targets::heading().candidates()[0].clone()));
		let config = config();
		let dashboard = DashboardPage::new(&page, &config);
		dashboard.open().await.unwrap();

		dashboard.logout().await.unwrap();
		assert_eq!(page.visits().last().map(String::as_str), Some("https://e.test/admin/logout"));
	}

	#[tokio::test(start_paused = true)]
	async fn logout_uses_user_menu() {
		let page = FakePage::new();
		let menu = targets::user_menu().candidates()[0].clone();
		let logout = targets::logout_button().candidates()[0].clone();
		page.add_screen(
			ADMIN,
			Screen::new().on_click(menu.clone(), move |state| state.reveal(logout.clone())),
		);
		page.add_screen("https://e.test/admin/login", Screen::new());
		let config = config();
		let dashboard = DashboardPage::new(&page, &config);
		dashboard.open().await.unwrap();

		dashboard.logout().await.unwrap();
		assert_eq!(
			page.clicks(),
			vec![menu.to_string(), targets::logout_button().candidates()[0].to_string()]
		);
		assert!(!page.visits().iter().any(|u| u.ends_with("/admin/logout")));
	}
}
