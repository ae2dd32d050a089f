//! Tokenizer and recursive descent parser for match rules.
//!
//! ```text
//! expr   := and ( "||" and )*
//! and    := unary ( "&&" unary )*
//! unary  := "!" unary | "(" expr ")" | call
//! call   := IDENT "(" [ string ( "," string )* ] ")"
//! string := "`" raw "`" | "\"" escaped "\""
//! ```

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// A rule that failed to parse, with the byte offset of the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at offset {offset})")]
pub struct RuleParseError {
	pub offset: usize,
	pub message: String,
}

impl RuleParseError {
	pub fn new(offset: usize, message: impl Into<String>) -> Self {
		RuleParseError {
			offset,
			message: message.into(),
		}
	}
}

/// A matcher call such as ``Host(`example.com`)``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
	pub name: String,
	pub args: Vec<String>,
	/// Byte offset of the matcher name in the rule.
	pub offset: usize,
}

/// Parsed rule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
	Call(Call),
	Not(Box<Expr>),
	And(Box<Expr>, Box<Expr>),
	Or(Box<Expr>, Box<Expr>),
}

impl Expr {
	/// All matcher calls of the expression, left to right.
	pub fn calls(&self) -> Vec<&Call> {
		let mut calls = Vec::new();
		self.collect_calls(&mut calls);
		calls
	}

	fn collect_calls<'a>(&'a self, calls: &mut Vec<&'a Call>) {
		match self {
			Expr::Call(call) => calls.push(call),
			Expr::Not(inner) => inner.collect_calls(calls),
			Expr::And(left, right) | Expr::Or(left, right) => {
				left.collect_calls(calls);
				right.collect_calls(calls);
			}
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	Ident(String),
	Str(String),
	LParen,
	RParen,
	Comma,
	And,
	Or,
	Not,
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::Ident(name) => write!(f, "identifier `{name}`"),
			Token::Str(value) => write!(f, "string {value:?}"),
			Token::LParen => f.write_str("'('"),
			Token::RParen => f.write_str("')'"),
			Token::Comma => f.write_str("','"),
			Token::And => f.write_str("'&&'"),
			Token::Or => f.write_str("'||'"),
			Token::Not => f.write_str("'!'"),
		}
	}
}

#[derive(Debug)]
struct Spanned {
	offset: usize,
	token: Token,
}

/// Parse a rule into an expression tree.
pub fn parse(rule: &str) -> Result<Expr, RuleParseError> {
	if rule.trim().is_empty() {
		return Err(RuleParseError::new(0, "empty rule"));
	}

	let mut parser = Parser {
		tokens: tokenize(rule)?,
		pos: 0,
		end: rule.len(),
	};
	let expr = parser.parse_or()?;
	if let Some(extra) = parser.tokens.get(parser.pos) {
		return Err(RuleParseError::new(
			extra.offset,
			format!("unexpected {}", extra.token),
		));
	}
	Ok(expr)
}

fn tokenize(rule: &str) -> Result<Vec<Spanned>, RuleParseError> {
	let mut tokens = Vec::new();
	let mut chars = rule.char_indices().peekable();

	while let Some((offset, c)) = chars.next() {
		let token = match c {
			c if c.is_whitespace() => continue,
			'(' => Token::LParen,
			')' => Token::RParen,
			',' => Token::Comma,
			'!' => Token::Not,
			'&' | '|' => {
				if chars.next_if(|&(_, next)| next == c).is_none() {
					return Err(RuleParseError::new(offset, format!("expected '{c}{c}'")));
				}
				if c == '&' { Token::And } else { Token::Or }
			}
			'`' => Token::Str(raw_string(&mut chars, offset)?),
			'"' => Token::Str(quoted_string(&mut chars, offset)?),
			c if c.is_alphabetic() || c == '_' => {
				let mut ident = String::from(c);
				while let Some((_, next)) = chars.next_if(|&(_, n)| n.is_alphanumeric() || n == '_') {
					ident.push(next);
				}
				Token::Ident(ident)
			}
			other => {
				return Err(RuleParseError::new(
					offset,
					format!("unexpected character {other:?}"),
				));
			}
		};
		tokens.push(Spanned { offset, token });
	}

	Ok(tokens)
}

fn raw_string(chars: &mut Peekable<CharIndices<'_>>, start: usize) -> Result<String, RuleParseError> {
	let mut value = String::new();
	for (_, c) in chars.by_ref() {
		if c == '`' {
			return Ok(value);
		}
		value.push(c);
	}
	Err(RuleParseError::new(start, "unterminated string"))
}

fn quoted_string(
	chars: &mut Peekable<CharIndices<'_>>,
	start: usize,
) -> Result<String, RuleParseError> {
	let mut value = String::new();
	while let Some((_, c)) = chars.next() {
		match c {
			'"' => return Ok(value),
			'\\' => match chars.next() {
				Some((_, 'n')) => value.push('\n'),
				Some((_, 't')) => value.push('\t'),
				Some((_, escaped)) => value.push(escaped),
				None => break,
			},
			c => value.push(c),
		}
	}
	Err(RuleParseError::new(start, "unterminated string"))
}

struct Parser {
	tokens: Vec<Spanned>,
	pos: usize,
	end: usize,
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos).map(|spanned| &spanned.token)
	}

	fn offset(&self) -> usize {
		self.tokens
			.get(self.pos)
			.map_or(self.end, |spanned| spanned.offset)
	}

	fn eat(&mut self, token: &Token) -> bool {
		if self.peek() == Some(token) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn expect(&mut self, token: &Token) -> Result<(), RuleParseError> {
		if self.eat(token) {
			Ok(())
		} else {
			Err(self.unexpected(&format!("expected {token}")))
		}
	}

	fn unexpected(&self, expected: &str) -> RuleParseError {
		match self.peek() {
			Some(found) => RuleParseError::new(self.offset(), format!("{expected}, found {found}")),
			None => RuleParseError::new(self.end, format!("{expected}, found end of rule")),
		}
	}

	fn parse_or(&mut self) -> Result<Expr, RuleParseError> {
		let mut left = self.parse_and()?;
		while self.eat(&Token::Or) {
			let right = self.parse_and()?;
			left = Expr::Or(Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn parse_and(&mut self) -> Result<Expr, RuleParseError> {
		let mut left = self.parse_unary()?;
		while self.eat(&Token::And) {
			let right = self.parse_unary()?;
			left = Expr::And(Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn parse_unary(&mut self) -> Result<Expr, RuleParseError> {
		let offset = self.offset();
		match self.peek().cloned() {
			Some(Token::Not) => {
				self.pos += 1;
				Ok(Expr::Not(Box::new(self.parse_unary()?)))
			}
			Some(Token::LParen) => {
				self.pos += 1;
				let inner = self.parse_or()?;
				self.expect(&Token::RParen)?;
				Ok(inner)
			}
			Some(Token::Ident(name)) => {
				self.pos += 1;
				let args = self.parse_args()?;
				Ok(Expr::Call(Call { name, args, offset }))
			}
			_ => Err(self.unexpected("expected a matcher")),
		}
	}

	fn parse_args(&mut self) -> Result<Vec<String>, RuleParseError> {
		self.expect(&Token::LParen)?;
		let mut args = Vec::new();
		if self.eat(&Token::RParen) {
			return Ok(args);
		}
		loop {
			match self.peek().cloned() {
				Some(Token::Str(value)) => {
					self.pos += 1;
					args.push(value);
				}
				_ => return Err(self.unexpected("expected a string argument")),
			}
			if self.eat(&Token::Comma) {
				continue;
			}
			self.expect(&Token::RParen)?;
			return Ok(args);
		}
	}
}
