//! Recursive-descent parser producing the program AST.
//!
//! One token of lookahead picks the statement form. The grammar is
//!
//! ```text
//! program := stmt*
//! stmt    := "exit" "(" expr ")" ";"
//!          | "var" ident "=" int ";"
//! expr    := int | ident
//! ```
//!
//! Parentheses only appear around the exit status; there are no compound
//! expressions. Whether identifiers are declared is checked by codegen.

use tracing::debug;

use crate::error::{CompileError, CompileResult, LiteralOutOfRangeSnafu, Location, ParseSnafu};
use crate::tokenizer::{Token, TokenKind, describe_token};

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  IntLiteral { value: u64, loc: usize },
  Identifier { name: String, loc: usize },
}

impl Expr {
  pub fn int(value: u64, loc: usize) -> Self {
    Self::IntLiteral { value, loc }
  }

  pub fn ident(name: impl Into<String>, loc: usize) -> Self {
    Self::Identifier {
      name: name.into(),
      loc,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
  /// Terminate the process with the value of `expr` as status.
  Exit { expr: Expr, loc: usize },
  /// Bind a new variable. `loc` points at the name.
  VarDeclare { name: String, expr: Expr, loc: usize },
}

/// Top-level statements in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  pub stmts: Vec<Stmt>,
}

impl Program {
  pub fn iter(&self) -> std::slice::Iter<'_, Stmt> {
    self.stmts.iter()
  }
}

/// Parse the token stream into a program. Any structural error aborts the
/// whole parse.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut stream = TokenStream::new(tokens, source);
  let mut stmts = Vec::new();

  while !stream.is_eof() {
    stmts.push(parse_stmt(&mut stream)?);
  }

  debug!(statements = stmts.len(), "parsed program");
  Ok(Program { stmts })
}

fn parse_stmt(stream: &mut TokenStream) -> CompileResult<Stmt> {
  match stream.peek().map(|token| token.kind) {
    Some(TokenKind::Exit) => parse_exit(stream),
    Some(TokenKind::VarKeyword) => parse_var(stream),
    _ => Err(stream.error_here(format!(
      "expected a statement but found {}",
      describe_token(stream.peek())
    ))),
  }
}

fn parse_exit(stream: &mut TokenStream) -> CompileResult<Stmt> {
  let loc = stream.skip(TokenKind::Exit)?;
  stream.skip(TokenKind::OpenParen)?;
  let expr = parse_expr(stream)?;
  stream.skip(TokenKind::CloseParen)?;
  stream.skip(TokenKind::Semicolon)?;
  Ok(Stmt::Exit { expr, loc })
}

fn parse_var(stream: &mut TokenStream) -> CompileResult<Stmt> {
  stream.skip(TokenKind::VarKeyword)?;
  let (name, loc) = stream.get_ident()?;
  stream.skip(TokenKind::Equals)?;
  let (value, value_loc) = stream.get_number()?;
  stream.skip(TokenKind::Semicolon)?;
  Ok(Stmt::VarDeclare {
    name,
    expr: Expr::int(value, value_loc),
    loc,
  })
}

fn parse_expr(stream: &mut TokenStream) -> CompileResult<Expr> {
  match stream.peek().map(|token| token.kind) {
    Some(TokenKind::IntLiteral) => {
      let (value, loc) = stream.get_number()?;
      Ok(Expr::int(value, loc))
    }
    Some(TokenKind::Identifier) => {
      let (name, loc) = stream.get_ident()?;
      Ok(Expr::ident(name, loc))
    }
    _ => Err(stream.error_here(format!(
      "expected an expression but found {}",
      describe_token(stream.peek())
    ))),
  }
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn is_eof(&self) -> bool {
    self.pos >= self.tokens.len()
  }

  /// Offset of the current token, or the end of the source once exhausted.
  fn here(&self) -> usize {
    self.peek().map_or(self.source.len(), |token| token.loc)
  }

  fn error_here(&self, message: String) -> CompileError {
    ParseSnafu {
      message,
      at: Location::at(self.source, self.here()),
    }
    .build()
  }

  /// Consume a token of the given kind and return its offset.
  fn skip(&mut self, kind: TokenKind) -> CompileResult<usize> {
    if let Some(token) = self.peek()
      && token.kind == kind
    {
      let loc = token.loc;
      self.pos += 1;
      return Ok(loc);
    }

    let expected = kind.spelling().unwrap_or("token");
    Err(self.error_here(format!(
      "expected \"{expected}\" but found {}",
      describe_token(self.peek())
    )))
  }

  /// Parse the current token as an integer literal returning its value and location.
  fn get_number(&mut self) -> CompileResult<(u64, usize)> {
    let Some(token) = self.peek().filter(|token| token.kind == TokenKind::IntLiteral) else {
      return Err(self.error_here(format!(
        "expected an integer literal but found {}",
        describe_token(self.peek())
      )));
    };

    let loc = token.loc;
    let text = token
      .text
      .as_deref()
      .ok_or_else(|| self.error_here("internal error: integer token missing text".to_string()))?;
    let value = text.parse::<u64>().map_err(|_| {
      LiteralOutOfRangeSnafu {
        text,
        at: Location::at(self.source, loc),
      }
      .build()
    })?;

    self.pos += 1;
    Ok((value, loc))
  }

  /// Parse the current token as an identifier.
  fn get_ident(&mut self) -> CompileResult<(String, usize)> {
    let Some(token) = self.peek().filter(|token| token.kind == TokenKind::Identifier) else {
      return Err(self.error_here(format!(
        "expected an identifier but found {}",
        describe_token(self.peek())
      )));
    };

    let loc = token.loc;
    let name = token
      .text
      .clone()
      .ok_or_else(|| self.error_here("internal error: identifier token missing text".to_string()))?;

    self.pos += 1;
    Ok((name, loc))
  }
}
