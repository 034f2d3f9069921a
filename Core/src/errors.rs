use thiserror::Error;

/// A diagnostic produced by the lexer or parser, positioned in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
  pub line: usize,
  pub column: usize,
  pub lexeme_len: usize,
  pub message: String,
}

/// Everything that can go wrong while turning NS source into QB bytes.
#[derive(Debug, Error)]
pub enum CompileError {
  /// The source did not parse; the individual reports carry positions.
  #[error("source has {} syntax error(s)", .0.len())]
  Parse(Vec<ErrorReport>),

  /// An AST node violated a shape invariant. `path` is the chain of node
  /// kinds from the root down to the offender.
  #[error("invalid AST node at {path}: {reason}")]
  InvalidAst { path: String, reason: String },

  /// A branch size or offset does not fit its wire field.
  #[error("numeric overflow at {path}: {reason}")]
  Overflow { path: String, reason: String },
}

/// Everything that can go wrong while turning QB bytes back into NS source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecompileError {
  /// The classifier hit a byte no token starts with.
  #[error("unclassifiable byte 0x{byte:02X} at offset {offset}")]
  InvalidByteStream { offset: usize, byte: u8 },

  /// A multi-byte token started but the stream ended before its payload.
  #[error("truncated token at offset {offset}")]
  TruncatedToken { offset: usize },
}
