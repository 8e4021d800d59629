//! `ew totp`: the code the two-factor page expects right now.

use std::time::SystemTime;

use ew::Totp;
use ew::totp::{STEP_SECS, unix_secs};
use serde::Serialize;

use super::Context;
use crate::cli::TotpArgs;
use crate::error::Result;
use crate::output::ResultBuilder;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TotpData {
	code: String,
	seconds_remaining: u64,
	step_secs: u64,
}

pub fn totp(ctx: &Context, args: &TotpArgs) -> Result<()> {
	let config;
	let secret = match args.secret.as_deref() {
		Some(secret) => secret,
		None => {
			config = ctx.config()?;
			config.totp_secret()?
		}
	};

	let generator = Totp::from_base32(secret)?;
	let now = unix_secs(SystemTime::now());
	let data = TotpData {
		code: generator.generate_at(now),
		seconds_remaining: Totp::seconds_remaining(now),
		step_secs: STEP_SECS,
	};

	ctx.emit(
		&ResultBuilder::new("totp")
			.line(format!("{} (valid for {}s)", data.code, data.seconds_remaining))
			.data(data)
			.build(),
	);
	Ok(())
}
