use std::ops::Index;

/// Represents the index of a Token in the TokenList.
pub type TokenIdx = usize;

/// List of Tokens found in the source code.
pub struct TokenList<'a> {
  pub tokens: &'a [Token],
  pub src: &'a [char],
}

impl<'a> Index<usize> for TokenList<'a> {
  type Output = Token;
  fn index(&self, index: usize) -> &Self::Output {
    &self.tokens[index]
  }
}

impl<'a> TokenList<'a> {
  /// Generates a new Tokens List.
  ///
  /// # Arguments
  ///
  /// * `src`: A reference to the source list of characters.
  /// * `tokens`: A reference to the source list of lexed tokens.
  ///
  /// # Returns:
  /// ```TokenList```
  pub fn new(src: &'a [char], tokens: &'a [Token]) -> Self {
    Self { src, tokens }
  }

  /// Gets the lexeme of a token based on its location information.
  ///
  /// # Arguments
  ///
  /// * `idx`: The index of the token in the list of tokens.
  ///
  /// # Returns:
  /// ```String```
  pub fn lexeme(&self, idx: TokenIdx) -> String {
    let tok = &self[idx];

    match &tok.kind {
      TokenKind::ERROR(e) => e.to_str().to_string(),
      TokenKind::EOF => "\0".to_string(),
      _ => self.src[tok.span.0..tok.span.1].iter().collect(),
    }
  }
}

// A token that represents a single unit of NS code.
#[derive(Clone)]
pub struct Token {
  /// The token's line number
  pub line_num: usize,
  /// The beginning of this token's line in the source.
  pub line_start: usize,
  /// The token's lexeme span (column start, column end)
  pub span: (usize, usize),
  /// The token's type
  pub kind: TokenKind,
}

/// The types of tokens in an NS program.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone)]
#[repr(u8)]
pub enum TokenKind {
  // Symbol-based tokens
  ALL_ARGS,        // <...>
  BANG,            // !
  COLON,           // :
  COMMA,           // ,
  DASH,            // -
  DOLLAR,          // $
  DOT,             // .
  EQUALS,          // =
  GREATER_THAN,    // >
  GREATER_THAN_EQ, // >=
  LESS_THAN,       // <
  LESS_THAN_EQ,    // <=
  LOGIC_EQ,        // ==
  L_BRACKET,       // [
  L_CURLY,         // {
  L_PAREN,         // (
  NEWLINE,         // significant line break
  PLUS,            // +
  R_BRACKET,       // ]
  R_CURLY,         // }
  R_PAREN,         // )
  SEMICOLON,       // ;
  SLASH,           // /
  STAR,            // *

  // Value Literals
  FLOAT_LIT,
  IDENTIFIER,
  INT_LIT,
  RAW_CHECKSUM,
  STR_LIT,

  // Keywords
  AND_KW,
  BREAK_KW,
  ELSEIF_KW,
  ELSE_KW,
  IF_KW,
  OR_KW,
  RANDOM_KW,
  RETURN_KW,
  SCRIPT_KW,
  WHILE_KW,

  /// Other Tokens
  EOF,
  ERROR(ErrorTokenKind),
}

impl TokenKind {
  /// Checks that this token is of a given type.
  ///
  /// # Parameters
  /// - `token_type`: The token type to be matched against this token.
  pub fn type_match(&self, token_type: &TokenKind) -> bool {
    std::mem::discriminant(self) == std::mem::discriminant(token_type)
  }
}

/// Maps a keyword string to a token type.
///
/// # Parameters
/// - `id`: The identifier's string name.
///
/// # Returns
/// `TokenKind`: The type of token matched for given identifier name.
pub fn make_identifier_kind(id: &str) -> TokenKind {
  match id {
    "and" => TokenKind::AND_KW,
    "break" => TokenKind::BREAK_KW,
    "else" => TokenKind::ELSE_KW,
    "elseif" => TokenKind::ELSEIF_KW,
    "if" => TokenKind::IF_KW,
    "or" => TokenKind::OR_KW,
    "random" => TokenKind::RANDOM_KW,
    "return" => TokenKind::RETURN_KW,
    "script" => TokenKind::SCRIPT_KW,
    "while" => TokenKind::WHILE_KW,
    _ => TokenKind::IDENTIFIER,
  }
}

#[derive(Debug, Clone)]
pub enum ErrorTokenKind {
  /// Invalid Character.
  InvalidChar,
  /// Unterminated String.
  UnterminatedStr,
  /// Unexpected extra '.' in float literal.
  ExtraDotInFloat,
  /// Raw checksum with no hexadecimal digits.
  EmptyRawChecksum,
}

impl ErrorTokenKind {
  /// Converts an error token to its string message representation.
  pub fn to_str(&self) -> &str {
    match self {
      ErrorTokenKind::InvalidChar => "Invalid Character.",
      ErrorTokenKind::UnterminatedStr => "Unterminated String.",
      ErrorTokenKind::ExtraDotInFloat => "Unexpected extra '.' in float literal.",
      ErrorTokenKind::EmptyRawChecksum => "Expected hexadecimal digits after '#'.",
    }
  }
}
