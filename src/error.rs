//! Shared error utilities used across the compilation pipeline.
//!
//! Every stage reports at most one error and stops. Pipeline diagnostics are
//! anchored at a byte offset in the source and rendered with the offending
//! line and a caret under the column, in the spirit of chibicc.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("{}:{}: unrecognized character '{found}'\n{at}", at.line, at.column))]
  Lex { found: char, at: Location },

  #[snafu(display("{}:{}: {message}\n{at}", at.line, at.column))]
  Parse { message: String, at: Location },

  #[snafu(display(
    "{}:{}: integer literal {text} does not fit in 64 bits\n{at}",
    at.line,
    at.column
  ))]
  LiteralOutOfRange { text: String, at: Location },

  #[snafu(display("{}:{}: use of undeclared identifier '{name}'\n{at}", at.line, at.column))]
  UndeclaredIdentifier { name: String, at: Location },

  #[snafu(display(
    "{}:{}: identifier '{name}' is already declared (first declared at {}:{})\n{at}",
    at.line,
    at.column,
    previous.line,
    previous.column
  ))]
  DuplicateDeclaration {
    name: String,
    at: Location,
    previous: Location,
  },

  #[snafu(display("failed to {action} '{}': {source}", path.display()))]
  Io {
    action: &'static str,
    path: PathBuf,
    source: io::Error,
  },

  #[snafu(display("failed to run {tool}: {source}"))]
  ToolSpawn { tool: &'static str, source: io::Error },

  #[snafu(display("{tool} failed ({status})\n{stderr}"))]
  Toolchain {
    tool: &'static str,
    status: ExitStatus,
    stderr: String,
  },
}

/// A byte offset resolved to a printable position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  /// 1-based line number.
  pub line: usize,
  /// 1-based column, counted in characters.
  pub column: usize,
  /// The full text of the line containing the offset.
  pub source_line: String,
}

impl Location {
  /// Resolve `loc` against `source`. Offsets past the end point just after
  /// the last character, which is where "end of input" errors belong.
  pub fn at(source: &str, loc: usize) -> Self {
    let mut safe_loc = loc.min(source.len());
    while !source.is_char_boundary(safe_loc) {
      safe_loc -= 1;
    }

    let line_start = source[..safe_loc].rfind('\n').map_or(0, |idx| idx + 1);
    let line_end = source[safe_loc..]
      .find('\n')
      .map_or(source.len(), |idx| safe_loc + idx);

    Self {
      line: source[..line_start].matches('\n').count() + 1,
      column: source[line_start..safe_loc].chars().count() + 1,
      source_line: source[line_start..line_end].trim_end_matches('\r').to_string(),
    }
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let marker = " ".repeat(self.column.saturating_sub(1));
    write!(f, "{}\n{marker}^", self.source_line)
  }
}
