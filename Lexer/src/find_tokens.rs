use crate::{char_is_ident_start, Lexer};
use nscore::tokens::ErrorTokenKind;
use nscore::tokens::Token;
use nscore::tokens::TokenKind::*;

impl<'a> Lexer<'a> {
  /// Finds all the tokens in the source file, appending the EOF
  /// token once the source is exhausted.
  pub(crate) fn find_tokens(&mut self) {
    while !self.is_at_end() {
      self.skip_whitespace();
      self.token_start = self.current;

      if self.is_at_end() {
        break;
      }

      let token = self.lex_next_token();
      self.tokens.push(token);
    }

    self.make_eof_token();
  }

  /// Lexes a single token starting at the current character.
  fn lex_next_token(&mut self) -> Token {
    let c = self.advance();

    match c {
      '\n' => self.make_newline_token(),
      '!' => self.make_token(BANG),
      '#' => self.lex_raw_checksum(),
      '$' => self.make_token(DOLLAR),
      '(' => self.make_token(L_PAREN),
      ')' => self.make_token(R_PAREN),
      '*' => self.make_token(STAR),
      '+' => self.make_token(PLUS),
      ',' => self.make_token(COMMA),
      '-' => self.make_token(DASH),
      '.' => self.make_token(DOT),
      '/' => self.make_token(SLASH),
      ':' => self.make_token(COLON),
      ';' => self.make_token(SEMICOLON),
      '<' => self.lex_left_angle(),
      '=' => {
        if self.matches('=') {
          self.make_token(LOGIC_EQ)
        } else {
          self.make_token(EQUALS)
        }
      }
      '>' => {
        if self.matches('=') {
          self.make_token(GREATER_THAN_EQ)
        } else {
          self.make_token(GREATER_THAN)
        }
      }
      '[' => self.make_token(L_BRACKET),
      ']' => self.make_token(R_BRACKET),
      '{' => self.make_token(L_CURLY),
      '}' => self.make_token(R_CURLY),
      '"' => self.lex_string(),
      c if c.is_ascii_digit() => self.lex_number(),
      c if char_is_ident_start!(c) => self.make_identifier_token(),
      _ => self.make_error_token(ErrorTokenKind::InvalidChar, false),
    }
  }

  /// Generates a NEWLINE token and moves the scanner onto the next line.
  fn make_newline_token(&mut self) -> Token {
    let token = self.make_token(NEWLINE);
    self.line_num += 1;
    self.line_start = self.current;
    token
  }

  /// Lexes either the all-arguments literal `<...>` or a less-than operator.
  fn lex_left_angle(&mut self) -> Token {
    let src = self.source;

    if self.current + 3 < src.len()
      && src[self.current] == '.'
      && src[self.current + 1] == '.'
      && src[self.current + 2] == '.'
      && src[self.current + 3] == '>'
    {
      self.current += 4;
      return self.make_token(ALL_ARGS);
    }

    if self.matches('=') {
      self.make_token(LESS_THAN_EQ)
    } else {
      self.make_token(LESS_THAN)
    }
  }

  /// Lexes a `#`-prefixed raw checksum literal. The lexeme keeps the `#`.
  fn lex_raw_checksum(&mut self) -> Token {
    let mut digits = 0;

    while !self.is_at_end() && self.get_current().is_ascii_hexdigit() {
      self.advance();
      digits += 1;
    }

    if digits == 0 {
      self.make_error_token(ErrorTokenKind::EmptyRawChecksum, false)
    } else {
      self.make_token(RAW_CHECKSUM)
    }
  }
}
