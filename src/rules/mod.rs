//! Match-rule parsing, validation and rewriting.
//!
//! This module handles:
//! - Compiling `{name:pattern}` templates into anchored regular expressions
//! - Parsing rule expressions and checking them against v2 or v3 matcher tables
//! - Rewriting v2 rules into equivalent v3 rules

pub mod grammar;
pub mod pattern;
pub mod rewriter;
pub mod validator;

pub use grammar::{Call, Expr, RuleParseError};
pub use pattern::{CompiledPattern, MatchKind, Template, compile};
pub use rewriter::{Matcher, RuleRewriter};
pub use validator::{MAX_PRIORITY, RuleValidator, Syntax, ValidatedRoute};
