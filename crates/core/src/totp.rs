//! Time-based one-time passwords (RFC 6238).
//!
//! Produces the same 6-digit code an authenticator app shows for a base32
//! shared secret: HMAC-SHA1 over `floor(unix_time / 30)`, dynamically
//! truncated and reduced modulo 10^6. The verifying server accepts the
//! current step and one step either side, so callers only need to generate
//! the code for "now".

use std::time::{SystemTime, UNIX_EPOCH};

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{Error, Result};

/// Length of one time step in seconds.
pub const STEP_SECS: u64 = 30;

/// Number of digits in a generated code.
pub const DIGITS: usize = 6;

/// Steps of clock drift the verifying side tolerates in each direction.
pub const DRIFT_STEPS: u8 = 1;

/// Generates the code for `secret` at `at` (or now).
pub fn generate(secret: &str, at: Option<SystemTime>) -> Result<String> {
	let totp = Totp::from_base32(secret)?;
	Ok(totp.generate_at(unix_secs(at.unwrap_or_else(SystemTime::now))))
}

/// A decoded shared secret ready to produce codes.
#[derive(Clone)]
pub struct Totp {
	inner: TOTP,
}

impl std::fmt::Debug for Totp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Totp").field("step", &STEP_SECS).field("digits", &DIGITS).finish_non_exhaustive()
	}
}

impl Totp {
	/// Decodes a base32 secret.
	///
	/// Whitespace, `=` padding and lowercase letters are accepted, as
	/// authenticator apps display secrets in groups and in either case.
	pub fn from_base32(secret: &str) -> Result<Self> {
		let normalized: String = secret
			.chars()
			.filter(|c| !c.is_whitespace() && *c != '=')
			.map(|c| c.to_ascii_uppercase())
			.collect();

		if normalized.is_empty() {
			return Err(Error::InvalidSecret("secret is empty".into()));
		}
		if let Some(bad) = normalized.chars().find(|c| !matches!(c, 'A'..='Z' | '2'..='7')) {
			return Err(Error::InvalidSecret(format!("'{bad}' is not a base32 character")));
		}

		let key = Secret::Encoded(normalized)
			.to_bytes()
			.map_err(|e| Error::InvalidSecret(format!("{e:?}")))?;
		if key.is_empty() {
			return Err(Error::InvalidSecret("secret decodes to no bytes".into()));
		}

		// Short legacy secrets (80 bits) are common in admin panels, so skip
		// the 128-bit minimum that `TOTP::new` enforces.
		let inner = TOTP::new_unchecked(Algorithm::SHA1, DIGITS, DRIFT_STEPS, STEP_SECS, key);
		Ok(Self { inner })
	}

	/// Code for the step containing `unix_secs`.
	pub fn generate_at(&self, unix_secs: u64) -> String {
		self.inner.generate(unix_secs)
	}

	pub fn generate_now(&self) -> String {
		self.generate_at(unix_secs(SystemTime::now()))
	}

	/// Seconds until the step containing `unix_secs` ends.
	pub fn seconds_remaining(unix_secs: u64) -> u64 {
		STEP_SECS - unix_secs % STEP_SECS
	}

	/// Step counter for `unix_secs`.
	pub fn counter(unix_secs: u64) -> u64 {
		unix_secs / STEP_SECS
	}
}

/// Extracts the shared secret from an `otpauth://totp/...` provisioning URI.
///
/// Enrollment pages embed this URI in their QR code.
pub fn secret_from_otpauth_uri(uri: &str) -> Result<String> {
	let parsed = url::Url::parse(uri.trim()).map_err(|e| Error::InvalidSecret(format!("bad otpauth uri: {e}")))?;
	if parsed.scheme() != "otpauth" {
		return Err(Error::InvalidSecret(format!("expected otpauth scheme, got {}", parsed.scheme())));
	}

	let secret = parsed
		.query_pairs()
		.find(|(k, _)| k.eq_ignore_ascii_case("secret"))
		.map(|(_, v)| v.into_owned())
		.ok_or_else(|| Error::InvalidSecret("otpauth uri has no secret parameter".into()))?;

	// Validate before handing it out.
	Totp::from_base32(&secret)?;
	Ok(secret)
}

/// Whole seconds since the Unix epoch; times before it clamp to 0.
pub fn unix_secs(at: SystemTime) -> u64 {
	at.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
