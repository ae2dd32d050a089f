use crate::error::MigrateError;
use crate::rules::grammar::{self, Call, Expr, RuleParseError};
use crate::rules::pattern::Template;
use regex::Regex;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Highest priority a route may be registered with.
pub const MAX_PRIORITY: i64 = i64::MAX - 1000;

/// Rule syntax version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
	/// Traefik v2 matchers (`Headers`, multi-value `Host`, `{name}` templates).
	Legacy,
	/// Traefik v3 matchers (single-value calls, `*Regexp` variants).
	Current,
}

impl Syntax {
	pub fn as_str(&self) -> &'static str {
		match self {
			Syntax::Legacy => "v2",
			Syntax::Current => "v3",
		}
	}
}

impl fmt::Display for Syntax {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Syntax {
	type Err = MigrateError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"v2" | "old" => Ok(Syntax::Legacy),
			"v3" | "new" => Ok(Syntax::Current),
			_ => Err(MigrateError::UnknownSyntax {
				value: value.to_string(),
			}),
		}
	}
}

/// A rule accepted by the validator, as it would be registered on a router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRoute {
	pub expr: Expr,
	pub syntax: Syntax,
	/// Effective priority; `0` on input means the rule length.
	pub priority: i64,
}

/// Full-grammar check of match rules for either syntax version.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl RuleValidator {
	pub fn new() -> Self {
		RuleValidator
	}

	/// Parse `rule` and check every matcher against the function table of `syntax`.
	pub fn validate(
		&self,
		rule: &str,
		syntax: Syntax,
		priority: i64,
	) -> Result<ValidatedRoute, RuleParseError> {
		if priority > MAX_PRIORITY {
			return Err(RuleParseError::new(
				0,
				format!("priority {priority} exceeds the maximum priority {MAX_PRIORITY}"),
			));
		}

		let expr = grammar::parse(rule)?;
		for call in expr.calls() {
			match syntax {
				Syntax::Legacy => check_legacy(call)?,
				Syntax::Current => check_current(call)?,
			}
		}

		let priority = if priority == 0 {
			i64::try_from(rule.len()).unwrap_or(MAX_PRIORITY)
		} else {
			priority
		};

		Ok(ValidatedRoute {
			expr,
			syntax,
			priority,
		})
	}
}

fn check_legacy(call: &Call) -> Result<(), RuleParseError> {
	match call.name.as_str() {
		"Host" | "HostHeader" | "Method" => {
			at_least_one(call)?;
			each_arg(call, non_empty)
		}
		"HostRegexp" | "Path" | "PathPrefix" => {
			at_least_one(call)?;
			each_arg(call, template)
		}
		"Headers" => arity(call, 2),
		"HeadersRegexp" => {
			arity(call, 2)?;
			compiles(call, &call.args[1])
		}
		"Query" => {
			at_least_one(call)?;
			each_arg(call, |call, arg| match arg.split_once('=') {
				Some((key, value)) if !key.is_empty() => template(call, value),
				_ => Err(invalid(call, format!("query {arg:?} is not a key=value pair"))),
			})
		}
		"ClientIP" => {
			at_least_one(call)?;
			each_arg(call, ip_or_cidr)
		}
		_ => Err(unknown(call)),
	}
}

fn check_current(call: &Call) -> Result<(), RuleParseError> {
	match call.name.as_str() {
		"Host" => {
			arity(call, 1)?;
			let host = &call.args[0];
			if host.is_empty() || !host.is_ascii() {
				return Err(invalid(
					call,
					format!("invalid value {host:?} for Host matcher, only non-empty ASCII is allowed"),
				));
			}
			Ok(())
		}
		"HostRegexp" | "PathRegexp" => {
			arity(call, 1)?;
			compiles(call, &call.args[0])
		}
		"Path" | "PathPrefix" => {
			arity(call, 1)?;
			let path = &call.args[0];
			if !path.starts_with('/') {
				return Err(invalid(call, format!("path {path:?} does not start with a '/'")));
			}
			Ok(())
		}
		"Method" => {
			arity(call, 1)?;
			non_empty(call, &call.args[0])
		}
		"Header" => arity(call, 2),
		"HeaderRegexp" | "QueryRegexp" => {
			arity(call, 2)?;
			compiles(call, &call.args[1])
		}
		"Query" => {
			if call.args.is_empty() || call.args.len() > 2 {
				return Err(invalid(
					call,
					format!("expected 1 or 2 arguments, got {}", call.args.len()),
				));
			}
			non_empty(call, &call.args[0])
		}
		"ClientIP" => {
			arity(call, 1)?;
			ip_or_cidr(call, &call.args[0])
		}
		_ => Err(unknown(call)),
	}
}

fn invalid(call: &Call, message: String) -> RuleParseError {
	RuleParseError::new(call.offset, format!("{}: {message}", call.name))
}

fn unknown(call: &Call) -> RuleParseError {
	RuleParseError::new(call.offset, format!("unsupported matcher {}", call.name))
}

fn arity(call: &Call, expected: usize) -> Result<(), RuleParseError> {
	if call.args.len() != expected {
		return Err(invalid(
			call,
			format!("expected {expected} argument(s), got {}", call.args.len()),
		));
	}
	Ok(())
}

fn at_least_one(call: &Call) -> Result<(), RuleParseError> {
	if call.args.is_empty() {
		return Err(invalid(call, "expected at least one argument".to_string()));
	}
	Ok(())
}

fn each_arg(
	call: &Call,
	check: impl Fn(&Call, &str) -> Result<(), RuleParseError>,
) -> Result<(), RuleParseError> {
	call.args.iter().try_for_each(|arg| check(call, arg))
}

fn non_empty(call: &Call, arg: &str) -> Result<(), RuleParseError> {
	if arg.trim().is_empty() {
		return Err(invalid(call, "empty argument".to_string()));
	}
	Ok(())
}

fn template(call: &Call, arg: &str) -> Result<(), RuleParseError> {
	Template::parse(arg)
		.map(|_| ())
		.map_err(|err| invalid(call, err.to_string()))
}

fn compiles(call: &Call, pattern: &str) -> Result<(), RuleParseError> {
	Regex::new(pattern)
		.map(|_| ())
		.map_err(|err| invalid(call, format!("invalid regexp {pattern:?}: {err}")))
}

fn ip_or_cidr(call: &Call, value: &str) -> Result<(), RuleParseError> {
	let valid = match value.split_once('/') {
		Some((addr, bits)) => match (addr.parse::<IpAddr>(), bits.parse::<u8>()) {
			(Ok(IpAddr::V4(_)), Ok(bits)) => bits <= 32,
			(Ok(IpAddr::V6(_)), Ok(bits)) => bits <= 128,
			_ => false,
		},
		None => value.parse::<IpAddr>().is_ok(),
	};
	if !valid {
		return Err(invalid(call, format!("{value:?} is not an IP address or CIDR")));
	}
	Ok(())
}
