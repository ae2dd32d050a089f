use crate::error::{MigrateError, Result};
use crate::rules::pattern::{self, MatchKind, has_metacharacter};
use crate::rules::validator::{RuleValidator, Syntax};
use regex::Regex;
use tracing::debug;

/// Shape of a v2 matcher call: a name followed by backtick-quoted, comma-separated arguments.
const CALL_PATTERN: &str = r"(\w+)\(\s*(`[^`]*`(?:\s*,\s*`[^`]*`)*)\s*\)";

const ARGUMENT_PATTERN: &str = r"`([^`]*)`";

/// The v2 matchers the rewriter knows how to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
	Path,
	PathPrefix,
	/// `Host`, `HostHeader` and `HostRegexp`.
	Host,
	ClientIp,
	Method,
	Headers,
	HeadersRegexp,
	Query,
	/// Anything else; copied verbatim.
	Opaque,
}

impl Matcher {
	pub fn from_name(name: &str) -> Self {
		match name {
			"Path" => Matcher::Path,
			"PathPrefix" => Matcher::PathPrefix,
			"Host" | "HostHeader" | "HostRegexp" => Matcher::Host,
			"ClientIP" => Matcher::ClientIp,
			"Method" => Matcher::Method,
			"Headers" => Matcher::Headers,
			"HeadersRegexp" => Matcher::HeadersRegexp,
			"Query" => Matcher::Query,
			_ => Matcher::Opaque,
		}
	}

	/// Rewrite one call with the given arguments.
	///
	/// Returns `None` when the call must be left untouched.
	pub fn rewrite(self, args: &[&str]) -> Result<Option<String>> {
		if args.is_empty() {
			return Ok(None);
		}

		let rewritten = match self {
			Matcher::Path => any_of(templated(args, "Path", MatchKind::Path)?),
			Matcher::PathPrefix => any_of(templated(args, "PathPrefix", MatchKind::PathPrefix)?),
			Matcher::Host => any_of(templated(args, "Host", MatchKind::Host)?),
			// v3 has no ClientIPRegexp; ranges are always literal.
			Matcher::ClientIp => any_of(literal(args, "ClientIP")),
			Matcher::Method => any_of(literal(args, "Method")),
			Matcher::Headers | Matcher::HeadersRegexp => {
				let [key, value, ..] = args else {
					return Ok(None);
				};
				let name = if self == Matcher::Headers {
					"Header"
				} else {
					"HeaderRegexp"
				};
				format!("{name}(`{key}`, `{value}`)")
			}
			Matcher::Query => any_of(
				args.iter()
					.map(|arg| query(arg))
					.collect::<Result<Vec<_>>>()?,
			),
			Matcher::Opaque => return Ok(None),
		};

		Ok(Some(rewritten))
	}
}

/// Rewrites v2 match rules into v3 ones.
#[derive(Debug, Clone)]
pub struct RuleRewriter {
	call: Regex,
	argument: Regex,
	validator: RuleValidator,
}

impl RuleRewriter {
	pub fn new(validator: RuleValidator) -> Result<Self> {
		Ok(RuleRewriter {
			call: compile_regex(CALL_PATTERN)?,
			argument: compile_regex(ARGUMENT_PATTERN)?,
			validator,
		})
	}

	/// Rewrite every known v2 matcher in `rule` and check the result under v3 syntax.
	///
	/// Text outside recognized calls is copied unchanged, so rules that only
	/// use v3 matchers come back as they went in.
	pub fn rewrite(&self, rule: &str, priority: i64) -> Result<String> {
		let mut rewritten = String::with_capacity(rule.len());
		let mut last = 0;

		for caps in self.call.captures_iter(rule) {
			let whole = caps.get_match();
			let name = &caps[1];
			let args: Vec<&str> = self
				.argument
				.captures_iter(&caps[2])
				.filter_map(|arg| arg.get(1))
				.map(|arg| arg.as_str())
				.collect();

			rewritten.push_str(&rule[last..whole.start()]);
			match Matcher::from_name(name).rewrite(&args)? {
				Some(call) => {
					debug!(from = whole.as_str(), to = %call, "rewrote matcher");
					rewritten.push_str(&call);
				}
				None => rewritten.push_str(whole.as_str()),
			}
			last = whole.end();
		}
		rewritten.push_str(&rule[last..]);

		self.validator
			.validate(&rewritten, Syntax::Current, priority)
			.map_err(|source| MigrateError::RuleRejected {
				rule: rewritten.clone(),
				syntax: Syntax::Current,
				source,
			})?;

		Ok(rewritten)
	}
}

fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| MigrateError::InvalidPattern {
		pattern: pattern.to_string(),
		source,
	})
}

/// Join alternatives with `||`, parenthesized when there is more than one.
fn any_of(calls: Vec<String>) -> String {
	if calls.len() > 1 {
		format!("({})", calls.join(" || "))
	} else {
		calls.join(" ")
	}
}

fn literal(args: &[&str], name: &str) -> Vec<String> {
	args.iter().map(|arg| format!("{name}(`{arg}`)")).collect()
}

/// Literal call per argument, or a `*Regexp` call when the argument is a template.
fn templated(args: &[&str], name: &str, kind: MatchKind) -> Result<Vec<String>> {
	let regexp_name = match kind {
		MatchKind::Host => "HostRegexp",
		_ => "PathRegexp",
	};

	args.iter()
		.map(|arg| {
			if has_metacharacter(arg) {
				let compiled = pattern::compile(arg, kind)?;
				Ok(format!("{regexp_name}(`{}`)", compiled.as_str()))
			} else {
				Ok(format!("{name}(`{arg}`)"))
			}
		})
		.collect()
}

fn query(arg: &str) -> Result<String> {
	let (key, value) = arg.split_once('=').unwrap_or((arg, ""));
	if value.is_empty() {
		return Ok(format!("Query(`{key}`)"));
	}

	let compiled = pattern::compile(value, MatchKind::Query)?;
	if has_metacharacter(value) {
		Ok(format!("QueryRegexp(`{key}`, `{}`)", compiled.as_str()))
	} else {
		Ok(format!("Query(`{key}`, `{value}`)"))
	}
}
