//! Lexical analysis: turns the raw source text into a vector of tokens.
//!
//! The tokenizer only knows about keywords, literals and single-character
//! punctuators. Any word that is not a keyword comes back as an identifier;
//! whether it names a declared variable is for later stages to decide.

use tracing::{debug, trace};

use crate::error::{CompileResult, LexSnafu, Location};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Exit,
  IntLiteral,
  Semicolon,
  OpenParen,
  CloseParen,
  Identifier,
  VarKeyword,
  Equals,
}

impl TokenKind {
  /// Fixed source spelling, or `None` for kinds whose text varies.
  pub fn spelling(self) -> Option<&'static str> {
    match self {
      Self::Exit => Some("exit"),
      Self::VarKeyword => Some("var"),
      Self::Semicolon => Some(";"),
      Self::OpenParen => Some("("),
      Self::CloseParen => Some(")"),
      Self::Equals => Some("="),
      Self::IntLiteral | Self::Identifier => None,
    }
  }

  /// Whether tokens of this kind carry their source text.
  pub fn has_text(self) -> bool {
    self.spelling().is_none()
  }
}

const KEYWORDS: [(&str, TokenKind); 2] = [("exit", TokenKind::Exit), ("var", TokenKind::VarKeyword)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  /// Digits of an integer literal or the name of an identifier.
  pub text: Option<String>,
  /// Byte offset of the first character.
  pub loc: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize) -> Self {
    Self {
      kind,
      text: None,
      loc,
    }
  }

  pub fn with_text(kind: TokenKind, loc: usize, text: impl Into<String>) -> Self {
    Self {
      kind,
      text: Some(text.into()),
      loc,
    }
  }
}

/// Lex the whole input. The first unrecognised character aborts with a
/// `Lex` error; no partial token stream is returned.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
      }
      let word = &input[start..i];
      let token = match KEYWORDS.iter().find(|(keyword, _)| *keyword == word) {
        Some(&(_, kind)) => Token::new(kind, start),
        None => Token::with_text(TokenKind::Identifier, start, word),
      };
      trace!(?token, "lexed word");
      tokens.push(token);
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let token = Token::with_text(TokenKind::IntLiteral, start, &input[start..i]);
      trace!(?token, "lexed literal");
      tokens.push(token);
      continue;
    }

    let punctuator = match c {
      b'(' => Some(TokenKind::OpenParen),
      b')' => Some(TokenKind::CloseParen),
      b';' => Some(TokenKind::Semicolon),
      b'=' => Some(TokenKind::Equals),
      _ => None,
    };
    if let Some(kind) = punctuator {
      trace!(?kind, loc = i, "lexed punctuator");
      tokens.push(Token::new(kind, i));
      i += 1;
      continue;
    }

    let found = input[i..].chars().next().unwrap_or('\0');
    return LexSnafu {
      found,
      at: Location::at(input, i),
    }
    .fail();
  }

  debug!(count = tokens.len(), "tokenized source");
  Ok(tokens)
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>) -> String {
  match token {
    Some(token) => match (token.kind.spelling(), token.text.as_deref()) {
      (Some(spelling), _) => format!("\"{spelling}\""),
      (None, Some(text)) if token.kind == TokenKind::IntLiteral => format!("integer literal {text}"),
      (None, Some(text)) => format!("identifier \"{text}\""),
      (None, None) => format!("{:?}", token.kind),
    },
    None => "end of input".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::CompileError;

  fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|token| token.kind).collect()
  }

  #[test]
  fn lexes_exit_statement() {
    let tokens = tokenize("exit(42);").unwrap();
    assert_eq!(
      kinds(&tokens),
      vec![
        TokenKind::Exit,
        TokenKind::OpenParen,
        TokenKind::IntLiteral,
        TokenKind::CloseParen,
        TokenKind::Semicolon,
      ]
    );
    assert_eq!(tokens[2].text.as_deref(), Some("42"));
    assert_eq!(tokens[2].loc, 5);
  }

  #[test]
  fn unknown_words_are_identifiers() {
    let tokens = tokenize("var answer2 = 7;").unwrap();
    assert_eq!(
      kinds(&tokens),
      vec![
        TokenKind::VarKeyword,
        TokenKind::Identifier,
        TokenKind::Equals,
        TokenKind::IntLiteral,
        TokenKind::Semicolon,
      ]
    );
    assert_eq!(tokens[1].text.as_deref(), Some("answer2"));
  }

  #[test]
  fn keywords_need_an_exact_match() {
    let tokens = tokenize("exits variable").unwrap();
    assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Identifier]);
  }

  #[test]
  fn text_is_present_only_for_literals_and_identifiers() {
    let tokens = tokenize("var x = 10; exit(x);").unwrap();
    for token in &tokens {
      assert_eq!(token.text.is_some(), token.kind.has_text(), "{token:?}");
    }
  }

  #[test]
  fn end_of_input_terminates_runs() {
    let tokens = tokenize("abc 123").unwrap();
    assert_eq!(tokens[0].text.as_deref(), Some("abc"));
    assert_eq!(tokens[1].text.as_deref(), Some("123"));
  }

  #[test]
  fn digits_then_letters_split_into_two_tokens() {
    let tokens = tokenize("12ab").unwrap();
    assert_eq!(kinds(&tokens), vec![TokenKind::IntLiteral, TokenKind::Identifier]);
  }

  #[test]
  fn empty_and_blank_input_produce_no_tokens() {
    assert!(tokenize("").unwrap().is_empty());
    assert!(tokenize(" \n\t\r\n").unwrap().is_empty());
  }

  #[test]
  fn rejects_unrecognized_character() {
    let err = tokenize("exit(@);").unwrap_err();
    match err {
      CompileError::Lex { found, at } => {
        assert_eq!(found, '@');
        assert_eq!(at.column, 6);
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn rejects_non_ascii_letters() {
    let err = tokenize("var é = 1;").unwrap_err();
    assert!(matches!(err, CompileError::Lex { found: 'é', .. }));
  }

  #[test]
  fn describes_tokens_for_diagnostics() {
    let tokens = tokenize("exit x 5").unwrap();
    assert_eq!(describe_token(tokens.first()), "\"exit\"");
    assert_eq!(describe_token(tokens.get(1)), "identifier \"x\"");
    assert_eq!(describe_token(tokens.get(2)), "integer literal 5");
    assert_eq!(describe_token(None), "end of input");
  }
}
