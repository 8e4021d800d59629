//! Core of the e-wallet admin panel end-to-end suite.
//!
//! - [`totp`]: RFC 6238 one-time codes for the two-factor challenge.
//! - [`auth_store`]: the file-backed session cache (`playwright/.auth/user.json`).
//! - [`flow`]: cold and warm start of an authenticated page.
//! - [`page`], [`locator`], [`pages`]: the browser seam, fallback locator
//!   chains and page objects built on them.
//!
//! Nothing in this crate talks to a browser directly; `ew-runtime` provides
//! the Chromium implementation of [`Page`].

pub mod auth_store;
pub mod config;
pub mod error;
pub mod flow;
pub mod locator;
pub mod page;
pub mod pages;
pub mod project;
pub mod totp;

#[cfg(test)]
mod testing;

pub use auth_store::{AuthStore, Freshness, Invalidation};
pub use config::Config;
pub use error::{Error, Result};
pub use flow::{Established, SessionBootstrap, Timeouts, enroll, sign_in};
pub use locator::Target;
pub use page::Page;
pub use project::{Project, ProjectPaths};
pub use totp::Totp;
