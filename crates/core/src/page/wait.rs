use std::future::Future;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use super::Page;
use crate::error::{Error, Result};

/// Interval between condition checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polls `check` until it yields `Some`, or fails with [`Error::Timeout`].
///
/// `check` runs at least once, so a zero timeout still observes the
/// current state. Errors from `check` end the wait immediately.
pub async fn poll_until<T, F, Fut>(timeout: Duration, condition: &str, mut check: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<Option<T>>>,
{
	let deadline = Instant::now() + timeout;
	loop {
		if let Some(value) = check().await? {
			return Ok(value);
		}
		if Instant::now() >= deadline {
			return Err(Error::Timeout {
				ms: timeout.as_millis() as u64,
				condition: condition.to_string(),
			});
		}
		tokio::time::sleep(POLL_INTERVAL).await;
	}
}

/// Waits until the page URL matches `pattern` and returns it.
pub async fn wait_for_url<P: Page + ?Sized>(page: &P, pattern: &Regex, timeout: Duration) -> Result<String> {
	let condition = format!("url matching /{}/", pattern.as_str());
	poll_until(timeout, &condition, move || async move {
		let url = page.current_url().await?;
		Ok(pattern.is_match(&url).then_some(url))
	})
	.await
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;

	#[tokio::test(start_paused = true)]
	async fn poll_returns_first_some() {
		let calls = &AtomicU32::new(0);
		let value = poll_until(Duration::from_secs(5), "third call", move || async move {
			let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
			Ok((n == 3).then_some(n))
		})
		.await
		.unwrap();
		assert_eq!(value, 3);
	}

	#[tokio::test(start_paused = true)]
	async fn poll_times_out() {
		let err = poll_until::<(), _, _>(Duration::from_millis(350), "never", || async { Ok(None) })
			.await
			.unwrap_err();
		match err {
			Error::Timeout { ms, condition } => {
				assert_eq!(ms, 350);
				assert_eq!(condition, "never");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn poll_propagates_errors() {
		let err = poll_until::<(), _, _>(Duration::from_secs(1), "boom", || async { Err(Error::Driver("gone".into())) })
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Driver(_)));
	}
}
