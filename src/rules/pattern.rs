use crate::error::{MigrateError, Result};
use regex::Regex;
use std::ops::Range;
use tracing::debug;

/// Characters that make a v2 matcher argument a template rather than a literal.
const METACHARACTERS: &[char] = &['*', '+', '?', '(', ')', '|', '{', '}', '[', ']', '\\'];

/// Characters escaped in literal template text (the RE2 `QuoteMeta` set).
const QUOTED: &[char] = &[
	'\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

/// The matcher a template belongs to.
///
/// Decides the default placeholder pattern and whether the compiled
/// expression is anchored at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
	Path,
	PathPrefix,
	Host,
	Query,
}

impl MatchKind {
	/// Pattern used for placeholders without a custom sub-pattern.
	pub fn default_pattern(self) -> &'static str {
		match self {
			MatchKind::Path | MatchKind::PathPrefix => "[^/]+",
			MatchKind::Host => "[^.]+",
			MatchKind::Query => ".*",
		}
	}

	fn anchors_end(self) -> bool {
		self != MatchKind::PathPrefix
	}
}

/// A `{name}` or `{name:pattern}` segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
	pub name: &'a str,
	pub pattern: Option<&'a str>,
	/// Byte range of the placeholder in the template, braces included.
	pub span: Range<usize>,
}

/// A template split into its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
	pub source: &'a str,
	pub placeholders: Vec<Placeholder<'a>>,
}

impl<'a> Template<'a> {
	/// Parse the placeholders of a template.
	///
	/// Fails on unbalanced braces, on a placeholder without a name and on an
	/// explicitly empty custom pattern (`{name:}`).
	pub fn parse(source: &'a str) -> Result<Self> {
		let placeholders = brace_spans(source)?
			.into_iter()
			.map(|span| {
				let inner = &source[span.start + 1..span.end - 1];
				let (name, pattern) = match inner.split_once(':') {
					Some((name, pattern)) => (name, Some(pattern)),
					None => (inner, None),
				};
				if name.is_empty() || pattern.is_some_and(str::is_empty) {
					return Err(MigrateError::MissingPlaceholderPart {
						placeholder: source[span.clone()].to_string(),
					});
				}
				Ok(Placeholder {
					name,
					pattern,
					span,
				})
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(Template {
			source,
			placeholders,
		})
	}
}

/// An anchored regular expression compiled from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
	/// The regex source, ready to be embedded in a v3 `*Regexp` matcher.
	pub source: String,

	/// Number of capture groups, equal to the number of placeholders.
	pub group_count: usize,

	pub kind: MatchKind,
}

impl CompiledPattern {
	pub fn as_str(&self) -> &str {
		&self.source
	}
}

/// Whether a matcher argument contains regex metacharacters.
pub fn has_metacharacter(value: &str) -> bool {
	value.contains(METACHARACTERS)
}

/// Compile a placeholder-bearing template into an anchored regular expression.
///
/// Literal text is escaped, every placeholder becomes one named capture group.
/// Every kind except [`MatchKind::PathPrefix`] is anchored at both ends. A
/// Query template whose value after the first `=` is empty gets the default
/// pattern appended so a bare key matches any value.
pub fn compile(template: &str, kind: MatchKind) -> Result<CompiledPattern> {
	let parsed = Template::parse(template)?;
	let default_pattern = kind.default_pattern();

	let mut pattern = String::from("^");
	let mut end = 0;
	for (index, placeholder) in parsed.placeholders.iter().enumerate() {
		pattern.push_str(&quote_meta(&template[end..placeholder.span.start]));
		end = placeholder.span.end;
		pattern.push_str(&format!(
			"(?P<{}>{})",
			group_name(index, placeholder.name),
			placeholder.pattern.unwrap_or(default_pattern)
		));
	}
	pattern.push_str(&quote_meta(&template[end..]));

	if kind == MatchKind::Query
		&& template
			.split_once('=')
			.is_some_and(|(_, value)| value.is_empty())
	{
		pattern.push_str(default_pattern);
	}

	if kind.anchors_end() {
		pattern.push('$');
	}

	let regex = Regex::new(&pattern).map_err(|source| MigrateError::InvalidPattern {
		pattern: pattern.clone(),
		source,
	})?;

	// captures_len counts the implicit whole-match group.
	let group_count = regex.captures_len() - 1;
	if group_count != parsed.placeholders.len() {
		return Err(MigrateError::CaptureGroupMismatch {
			template: template.to_string(),
			expected: parsed.placeholders.len(),
			found: group_count,
		});
	}

	debug!(template, pattern = %pattern, ?kind, "compiled template");

	Ok(CompiledPattern {
		source: pattern,
		group_count,
		kind,
	})
}

/// Byte ranges of the top-level `{...}` spans, braces included.
fn brace_spans(template: &str) -> Result<Vec<Range<usize>>> {
	let unbalanced = || MigrateError::UnbalancedBraces {
		template: template.to_string(),
	};

	let mut spans = Vec::new();
	let mut level: usize = 0;
	let mut start = 0;
	for (i, byte) in template.bytes().enumerate() {
		match byte {
			b'{' => {
				if level == 0 {
					start = i;
				}
				level += 1;
			}
			b'}' => {
				level = level.checked_sub(1).ok_or_else(unbalanced)?;
				if level == 0 {
					spans.push(start..i + 1);
				}
			}
			_ => {}
		}
	}

	if level != 0 {
		return Err(unbalanced());
	}
	Ok(spans)
}

fn group_name(index: usize, name: &str) -> String {
	if name.is_empty() {
		format!("v{index}")
	} else {
		name.replace('-', "_")
	}
}

fn quote_meta(literal: &str) -> String {
	let mut quoted = String::with_capacity(literal.len());
	for c in literal.chars() {
		if QUOTED.contains(&c) {
			quoted.push('\\');
		}
		quoted.push(c);
	}
	quoted
}
