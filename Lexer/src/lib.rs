use nscore::tokens::{self, ErrorTokenKind, Token, TokenKind};

mod find_tokens;
mod lex_numbers;
mod lex_strings;

#[macro_export]
macro_rules! char_is_ident_start {
  ($ch:expr) => {{
    $ch.is_alphabetic() || $ch == '_'
  }};
}

/// Struct that represents the scanner.
pub struct Lexer<'a> {
  /// A flat list of characters from the source file.
  source: &'a [char],
  /// The list of tokens found in the source file.
  tokens: Vec<Token>,
  /// The index of the current character.
  current: usize,
  /// The current line index.
  line_num: usize,
  /// The position in the flat source vector of the first
  /// character for the current line.
  line_start: usize,
  /// The position of the first character for the current
  /// token in the flat source vector.
  token_start: usize,
}

impl<'a> Lexer<'a> {
  /// Lexes the source file into a list of tokens.
  ///
  /// # Parameters
  /// - `source` - the source file as a flat list of characters
  pub fn lex(source: &[char]) -> Vec<Token> {
    // Instantiate a new Lexer
    let mut the_lexer = Lexer {
      source,
      tokens: vec![],
      current: 0,
      line_num: 1,
      line_start: 0,
      token_start: 0,
    };

    // Find tokens in the source
    the_lexer.find_tokens();

    // Only return the tokens
    the_lexer.tokens
  }

  /// Gets the previously consumed character.
  ///
  /// # Returns
  /// - `char`: The previous character.
  pub fn get_previous(&self) -> char {
    self.source[self.current - 1]
  }

  /// Gets the current character without consuming it.
  ///
  /// # Returns
  /// - `char`: The current character.
  pub fn get_current(&self) -> char {
    if self.is_at_end() {
      '\0'
    } else {
      self.source[self.current]
    }
  }

  /// Returns the next character without consuming it.
  ///
  /// # Returns
  /// - `char`: The next character.
  pub fn get_next(&self) -> char {
    if self.current + 1 >= self.source.len() {
      return '\0';
    }

    self.source[self.current + 1]
  }

  /// Checks if the scanner is at the end of the source.
  ///
  /// # Returns
  /// - `bool`: True if the scanner is at the end of the source, false otherwise.
  pub fn is_at_end(&self) -> bool {
    self.current >= self.source.len()
  }

  /// Matches the current character against a provided character.
  ///
  /// # Returns
  /// - `bool`: True if the current character matched the provided character, false otherwise.
  pub fn matches(&mut self, expected: char) -> bool {
    if self.is_at_end() || self.get_current() != expected {
      return false;
    }
    self.current += 1;
    true
  }

  /// Advances to the next char and returns consumed char.
  ///
  /// # Returns
  /// - `char`: The consumed character.
  pub fn advance(&mut self) -> char {
    self.current += 1;
    self.get_previous()
  }

  /// Skips whitespace-like characters and comments from the source code.
  /// Line breaks are significant in NS and are *not* skipped here.
  pub fn skip_whitespace(&mut self) {
    loop {
      if self.is_at_end() {
        break;
      }

      match self.get_current() {
        ' ' | '\r' | '\t' => self.current += 1,
        '/' if self.get_next() == '/' => self.skip_single_line_comments(),
        '/' if self.get_next() == '*' => self.skip_block_comments(),
        _ => break,
      }
    }
  }

  /// Skips single-line comments from the source code.
  fn skip_single_line_comments(&mut self) {
    while !self.is_at_end() && self.get_current() != '\n' {
      self.advance();
    }

    // Reposition the start of the token to
    // be after the comment has ended
    self.token_start = self.current;
  }

  /// Skips block-comments from the source code
  fn skip_block_comments(&mut self) {
    self.advance();
    self.advance();

    while !self.is_at_end() {
      // Break if we are at the end of the comment.
      if self.get_current() == '*' && self.get_next() == '/' {
        self.advance();
        self.advance();
        break;
      }

      // Take into account new lines inside block comments
      if self.get_current() == '\n' {
        self.line_num += 1;
        self.line_start = self.current + 1;
      }

      // Skip everything inside the comment
      self.advance();
    }

    // Reposition the start of the token to
    // be after the comment has ended
    self.token_start = self.current;
  }

  /// Generates an identifier or keyword token with the current state of the scanner.
  pub fn make_identifier_token(&mut self) -> Token {
    while !self.is_at_end() {
      let c = self.get_current();

      if c.is_alphabetic() || c.is_ascii_digit() || c == '_' {
        self.advance();
      } else {
        break;
      }
    }

    let id: String = self.source[(self.token_start)..(self.current)].iter().collect();
    let tok_kind = tokens::make_identifier_kind(id.as_str());

    self.make_token(tok_kind)
  }

  /// Generates a token with the current state of the scanner.
  pub fn make_token(&self, kind: TokenKind) -> Token {
    Token {
      line_num: self.line_num,
      line_start: self.line_start,
      span: (self.token_start, self.current),
      kind,
    }
  }

  fn make_eof_token(&mut self) {
    self.tokens.push(Token {
      line_num: self.line_num,
      line_start: self.line_start,
      span: (self.current, self.current),
      kind: TokenKind::EOF,
    });
  }

  /// Generates an error token at the current character.
  ///
  /// # Parameters
  /// - `err`: The kind of lexical error found.
  /// - `advance`: Whether to consume the offending character.
  ///
  /// # Returns
  /// - `Token`: The generated error token.
  pub fn make_error_token(&mut self, err: ErrorTokenKind, advance: bool) -> Token {
    let tok = Token {
      line_num: self.line_num,
      line_start: self.line_start,
      span: (self.token_start, self.current),
      kind: TokenKind::ERROR(err),
    };

    if advance {
      self.advance();
    }

    tok
  }
}
