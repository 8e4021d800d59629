//! Wire types for the e-wallet admin suite.
//!
//! Types in this crate are pure data shared between `ew-core` and a browser
//! backend such as `ew-runtime`:
//!
//! - [`StorageState`] - the authentication state snapshot, in the same JSON
//!   layout Playwright uses for `storageState` files
//! - [`Strategy`] - one candidate locator, serialized as JSON for the
//!   backend's element resolver

pub mod locator;
pub mod storage;

pub use locator::*;
pub use storage::*;
