//! Page-side scripts.
//!
//! Every element query is a self-contained expression: the resolver object
//! from `resolver.js` is inlined, the strategy is passed as JSON and the body
//! sees `r` (the resolver) and `els` (the matches in document order).

use ew_protocol::{OriginState, Strategy};
use serde::Deserialize;

use crate::error::Result;

const RESOLVER: &str = include_str!("resolver.js");

/// Attribute used to hand a resolved element over to CDP.
pub const TARGET_ATTR: &str = "data-ew-target";

/// Result of a probe on the first match.
#[derive(Debug, Deserialize)]
pub struct Probe<T> {
	pub found: bool,
	pub value: Option<T>,
}

fn with_matches(strategy: &Strategy, body: &str) -> Result<String> {
	let strategy = serde_json::to_string(strategy)?;
	Ok(format!(
		"(() => {{\nconst r = {RESOLVER};\nconst els = r.resolve({strategy});\n{body}\n}})()"
	))
}

fn probe(strategy: &Strategy, value: &str) -> Result<String> {
	with_matches(
		strategy,
		&format!("if (!els.length) return {{ found: false }};\nconst el = els[0];\nreturn {{ found: true, value: {value} }};"),
	)
}

pub fn count(strategy: &Strategy) -> Result<String> {
	with_matches(strategy, "return els.length;")
}

pub fn is_visible(strategy: &Strategy) -> Result<String> {
	with_matches(strategy, "return els.length > 0 && r.visible(els[0]);")
}

pub fn is_enabled(strategy: &Strategy) -> Result<String> {
	probe(strategy, "r.enabled(el)")
}

pub fn is_checked(strategy: &Strategy) -> Result<String> {
	probe(strategy, "r.checked(el)")
}

pub fn input_value(strategy: &Strategy) -> Result<String> {
	probe(strategy, "String(el.value ?? \"\")")
}

pub fn attribute(strategy: &Strategy, name: &str) -> Result<String> {
	let name = serde_json::to_string(name)?;
	probe(strategy, &format!("el.getAttribute({name})"))
}

pub fn text_content(strategy: &Strategy) -> Result<String> {
	probe(strategy, "el.textContent")
}

/// Marks the first match with [`TARGET_ATTR`] so CDP can fetch it by
/// selector. With `clear`, also empties and focuses a form field.
pub fn tag(strategy: &Strategy, token: u64, clear: bool) -> Result<String> {
	let clear = if clear {
		"el.focus();\n\
		 if (el.isContentEditable) { el.textContent = \"\"; }\n\
		 else if (\"value\" in el) { el.value = \"\"; el.dispatchEvent(new Event(\"input\", { bubbles: true })); }"
	} else {
		""
	};
	with_matches(
		strategy,
		&format!(
			"if (!els.length) return false;\n\
			 document.querySelectorAll(\"[{TARGET_ATTR}]\").forEach((e) => e.removeAttribute(\"{TARGET_ATTR}\"));\n\
			 const el = els[0];\n\
			 el.setAttribute(\"{TARGET_ATTR}\", \"{token}\");\n\
			 el.scrollIntoView({{ block: \"center\", inline: \"center\" }});\n\
			 {clear}\n\
			 return true;"
		),
	)
}

pub fn tagged_selector(token: u64) -> String {
	format!("[{TARGET_ATTR}=\"{token}\"]")
}

pub const READY_STATE: &str = "document.readyState";

/// localStorage of the current document, `found: false` on opaque origins.
pub const LOCAL_STORAGE: &str = r#"(() => {
	try {
		if (!location.origin || location.origin === "null") return { found: false };
		const entries = Object.keys(localStorage).map((name) => ({ name, value: localStorage.getItem(name) }));
		return { found: true, value: { origin: location.origin, localStorage: entries } };
	} catch (_) {
		return { found: false };
	}
})()"#;

/// Writes the entries for the current origin once per browsing session.
///
/// Registered for new documents and also evaluated in the current one.
pub fn restore_local_storage(origins: &[OriginState]) -> Result<String> {
	let origins = serde_json::to_string(origins)?;
	Ok(format!(
		r#"(() => {{
	try {{
		const origins = {origins};
		const entry = origins.find((o) => o.origin === location.origin);
		if (!entry || sessionStorage.getItem("__ew_restored")) return false;
		for (const {{ name, value }} of entry.localStorage || []) localStorage.setItem(name, value);
		sessionStorage.setItem("__ew_restored", "1");
		return true;
	}} catch (_) {{
		return false;
	}}
}})()"#
	))
}
