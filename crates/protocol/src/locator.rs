//! Locator strategies.
//!
//! A [`Strategy`] describes one way of finding an element on the page. The
//! browser backend receives it as JSON and resolves it in the page, so the
//! serialized shape is part of the contract:
//!
//! ```json
//! { "kind": "role", "role": "button", "name": { "mode": "pattern", "value": "sign in" } }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// How accessible names and text content are compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum TextMatch {
	/// Whitespace-normalized, case-sensitive equality.
	Exact(String),
	/// Case-insensitive regular expression searched within the text.
	Pattern(String),
}

impl TextMatch {
	pub fn exact(text: impl Into<String>) -> Self {
		Self::Exact(text.into())
	}

	pub fn pattern(pattern: impl Into<String>) -> Self {
		Self::Pattern(pattern.into())
	}
}

impl fmt::Display for TextMatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TextMatch::Exact(text) => write!(f, "\"{text}\""),
			TextMatch::Pattern(pattern) => write!(f, "/{pattern}/i"),
		}
	}
}

/// One candidate way of locating an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Strategy {
	/// Plain CSS selector.
	Css { selector: String },
	/// ARIA role (explicit or implicit), optionally filtered by accessible name.
	Role {
		role: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		name: Option<TextMatch>,
	},
	/// Form control whose associated label matches.
	Label { text: TextMatch },
	/// Input or textarea whose placeholder matches.
	Placeholder { text: TextMatch },
	/// Innermost element whose text content matches.
	Text { text: TextMatch },
	/// Elements matching `selector` whose text content matches.
	HasText { selector: String, text: TextMatch },
	/// The `index`-th match (zero based) of `inner`.
	Nth { inner: Box<Strategy>, index: usize },
}

impl Strategy {
	pub fn css(selector: impl Into<String>) -> Self {
		Self::Css { selector: selector.into() }
	}

	pub fn role(role: impl Into<String>, name: TextMatch) -> Self {
		Self::Role {
			role: role.into(),
			name: Some(name),
		}
	}

	/// Any element with `role`, regardless of accessible name.
	pub fn any_role(role: impl Into<String>) -> Self {
		Self::Role {
			role: role.into(),
			name: None,
		}
	}

	pub fn label(text: TextMatch) -> Self {
		Self::Label { text }
	}

	pub fn placeholder(text: TextMatch) -> Self {
		Self::Placeholder { text }
	}

	pub fn text(text: TextMatch) -> Self {
		Self::Text { text }
	}

	pub fn has_text(selector: impl Into<String>, text: TextMatch) -> Self {
		Self::HasText {
			selector: selector.into(),
			text,
		}
	}

	pub fn nth(self, index: usize) -> Self {
		Self::Nth {
			inner: Box::new(self),
			index,
		}
	}
}

impl fmt::Display for Strategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Strategy::Css { selector } => write!(f, "css={selector}"),
			Strategy::Role { role, name: Some(name) } => write!(f, "role={role}[name={name}]"),
			Strategy::Role { role, name: None } => write!(f, "role={role}"),
			Strategy::Label { text } => write!(f, "label={text}"),
			Strategy::Placeholder { text } => write!(f, "placeholder={text}"),
			Strategy::Text { text } => write!(f, "text={text}"),
			Strategy::HasText { selector, text } => write!(f, "css={selector}[has-text={text}]"),
			Strategy::Nth { inner, index } => write!(f, "{inner} >> nth={index}"),
		}
	}
}
