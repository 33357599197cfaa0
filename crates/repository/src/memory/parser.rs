//! Parser for the SQL subset understood by the in-memory service.
//!
//! ```text
//! query     := SELECT [TOP n] * FROM alias [WHERE expr]
//! expr      := and (OR and)*
//! and       := unary (AND unary)*
//! unary     := NOT unary | predicate
//! predicate := operand [cmp operand | [NOT] IN '(' operand (',' operand)* ')']
//! operand   := literal | @param | path | FUNC '(' args ')' | '(' expr ')'
//! path      := alias ('.' name | '[' "name" ']')*
//! ```
//!
//! Keywords and function names are case-insensitive.

use serde_json::{Number, Value};

use common::{RepoError, RepoResult};
use domain::Comparison;

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    StartsWith,
    Contains,
    IsDefined,
}

impl Function {
    fn lookup(name: &str) -> Option<(Function, usize)> {
        match name.to_ascii_uppercase().as_str() {
            "STARTSWITH" => Some((Function::StartsWith, 2)),
            "CONTAINS" => Some((Function::Contains, 2)),
            "IS_DEFINED" => Some((Function::IsDefined, 1)),
            _ => None,
        }
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Parameter(String),
    /// Property path below the query alias
    Path(Vec<String>),
    Compare(Box<Expr>, Comparison, Box<Expr>),
    In(Box<Expr>, Vec<Expr>),
    Call(Function, Vec<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// A parsed `SELECT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub alias: String,
    pub top: Option<usize>,
    pub condition: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(Number),
    Param(String),
    Symbol(&'static str),
}

/// Parse query text.
pub fn parse(text: &str) -> RepoResult<SelectQuery> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        alias: String::new(),
    };
    parser.select()
}

fn syntax(msg: impl Into<String>) -> RepoError {
    RepoError::bad_request(format!("Syntax error: {}", msg.into()))
}

fn tokenize(text: &str) -> RepoResult<Vec<Token>> {
    const SYMBOLS: &[&str] = &[
        "!=", "<>", "<=", ">=", "=", "<", ">", "(", ")", "[", "]", ",", ".", "*",
    ];

    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            i += 1;
        } else if ch == '\'' || ch == '"' {
            let (literal, next) = string_literal(&chars, i)?;
            tokens.push(Token::Str(literal));
            i = next;
        } else if ch.is_ascii_digit() || (ch == '-' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == 'e' || chars[i] == 'E') {
                let exponent = chars[i] == 'e' || chars[i] == 'E';
                i += 1;
                if exponent && matches!(chars.get(i), Some('+' | '-')) {
                    i += 1;
                }
            }
            let raw: String = chars[start..i].iter().collect();
            tokens.push(Token::Num(number(&raw)?));
        } else if ch == '@' || ch.is_alphabetic() || ch == '_' {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if ch == '@' {
                if word.len() == 1 {
                    return Err(syntax("empty parameter name"));
                }
                tokens.push(Token::Param(word));
            } else {
                tokens.push(Token::Ident(word));
            }
        } else {
            let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
            let symbol = SYMBOLS
                .iter()
                .find(|s| rest.starts_with(**s))
                .ok_or_else(|| syntax(format!("unexpected character `{}`", ch)))?;
            tokens.push(Token::Symbol(symbol));
            i += symbol.len();
        }
    }

    Ok(tokens)
}

fn string_literal(chars: &[char], start: usize) -> RepoResult<(String, usize)> {
    let quote = chars[start];
    let mut literal = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| syntax("unterminated string"))?;
                literal.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((literal, i + 1)),
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    Err(syntax("unterminated string"))
}

fn number(raw: &str) -> RepoResult<Number> {
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Number::from(n));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| syntax(format!("invalid number `{}`", raw)))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    alias: String,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(word)) if word.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> RepoResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(syntax(format!("expected `{}`", keyword)))
        }
    }

    fn eat_symbol(&mut self, symbol: &str) -> bool {
        if matches!(self.peek(), Some(Token::Symbol(s)) if *s == symbol) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> RepoResult<()> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            Err(syntax(format!("expected `{}`", symbol)))
        }
    }

    fn select(&mut self) -> RepoResult<SelectQuery> {
        self.expect_keyword("SELECT")?;

        let top = if self.eat_keyword("TOP") {
            match self.next() {
                Some(Token::Num(n)) => Some(
                    n.as_u64()
                        .map(|n| n as usize)
                        .ok_or_else(|| syntax("TOP expects a non-negative integer"))?,
                ),
                _ => return Err(syntax("TOP expects a number")),
            }
        } else {
            None
        };

        self.expect_symbol("*")?;
        self.expect_keyword("FROM")?;
        self.alias = match self.next() {
            Some(Token::Ident(alias)) => alias,
            _ => return Err(syntax("expected collection alias after FROM")),
        };

        let condition = if self.eat_keyword("WHERE") {
            Some(self.expression()?)
        } else {
            None
        };

        if let Some(token) = self.peek() {
            return Err(syntax(format!("unexpected trailing input {:?}", token)));
        }

        Ok(SelectQuery {
            alias: self.alias.clone(),
            top,
            condition,
        })
    }

    fn expression(&mut self) -> RepoResult<Expr> {
        let mut left = self.conjunction()?;
        while self.eat_keyword("OR") {
            let right = self.conjunction()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn conjunction(&mut self) -> RepoResult<Expr> {
        let mut left = self.unary()?;
        while self.eat_keyword("AND") {
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> RepoResult<Expr> {
        if self.eat_keyword("NOT") {
            Ok(Expr::Not(Box::new(self.unary()?)))
        } else {
            self.predicate()
        }
    }

    fn predicate(&mut self) -> RepoResult<Expr> {
        let left = self.operand()?;

        let op = match self.peek() {
            Some(Token::Symbol("=")) => Some(Comparison::Eq),
            Some(Token::Symbol("!=")) | Some(Token::Symbol("<>")) => Some(Comparison::Ne),
            Some(Token::Symbol("<")) => Some(Comparison::Lt),
            Some(Token::Symbol("<=")) => Some(Comparison::Lte),
            Some(Token::Symbol(">")) => Some(Comparison::Gt),
            Some(Token::Symbol(">=")) => Some(Comparison::Gte),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let right = self.operand()?;
            return Ok(Expr::Compare(Box::new(left), op, Box::new(right)));
        }

        let negated = if self.at_keyword("NOT")
            && matches!(self.tokens.get(self.pos + 1), Some(Token::Ident(w)) if w.eq_ignore_ascii_case("IN"))
        {
            self.pos += 1;
            true
        } else {
            false
        };

        if self.eat_keyword("IN") {
            self.expect_symbol("(")?;
            let mut items = vec![self.operand()?];
            while self.eat_symbol(",") {
                items.push(self.operand()?);
            }
            self.expect_symbol(")")?;

            let membership = Expr::In(Box::new(left), items);
            return Ok(if negated {
                Expr::Not(Box::new(membership))
            } else {
                membership
            });
        }

        Ok(left)
    }

    fn operand(&mut self) -> RepoResult<Expr> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Num(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Param(name)) => Ok(Expr::Parameter(name)),
            Some(Token::Symbol("(")) => {
                let inner = self.expression()?;
                self.expect_symbol(")")?;
                Ok(inner)
            }
            Some(Token::Ident(word)) => self.identifier(word),
            Some(token) => Err(syntax(format!("unexpected token {:?}", token))),
            None => Err(syntax("unexpected end of query")),
        }
    }

    fn identifier(&mut self, word: String) -> RepoResult<Expr> {
        match word.to_ascii_lowercase().as_str() {
            "true" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" => return Ok(Expr::Literal(Value::Bool(false))),
            "null" => return Ok(Expr::Literal(Value::Null)),
            _ => {}
        }

        if matches!(self.peek(), Some(Token::Symbol("("))) {
            let (function, arity) = Function::lookup(&word)
                .ok_or_else(|| syntax(format!("unknown function `{}`", word)))?;
            self.pos += 1;
            let mut args = Vec::new();
            if !self.eat_symbol(")") {
                args.push(self.expression()?);
                while self.eat_symbol(",") {
                    args.push(self.expression()?);
                }
                self.expect_symbol(")")?;
            }
            if args.len() != arity {
                return Err(syntax(format!(
                    "{} expects {} argument(s), got {}",
                    word.to_ascii_uppercase(),
                    arity,
                    args.len()
                )));
            }
            return Ok(Expr::Call(function, args));
        }

        if word != self.alias {
            return Err(RepoError::bad_request(format!(
                "Identifier `{}` could not be resolved",
                word
            )));
        }

        let mut segments = Vec::new();
        loop {
            if self.eat_symbol(".") {
                match self.next() {
                    Some(Token::Ident(name)) => segments.push(name),
                    _ => return Err(syntax("expected property name after `.`")),
                }
            } else if self.eat_symbol("[") {
                match self.next() {
                    Some(Token::Str(name)) => segments.push(name),
                    _ => return Err(syntax("expected quoted property name inside `[]`")),
                }
                self.expect_symbol("]")?;
            } else {
                break;
            }
        }

        Ok(Expr::Path(segments))
    }
}
