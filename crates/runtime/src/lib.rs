//! Chromium backend for the e-wallet admin suite.
//!
//! [`BrowserSession`] launches Chrome (a local install, or Chromium fetched on
//! first use) and drives it over CDP. [`ChromiumPage`] implements
//! [`ew::Page`], resolving locator strategies with an in-page script.

pub mod chrome;
pub mod error;
pub mod page;
mod script;
pub mod session;

pub use error::{Error, Result};
pub use page::ChromiumPage;
pub use session::{BrowserSession, DEFAULT_WINDOW, LaunchOptions};
