use crate::Lexer;
use nscore::tokens::ErrorTokenKind;
use nscore::tokens::Token;
use nscore::tokens::TokenKind::STR_LIT;

impl<'a> Lexer<'a> {
  /// Lexes a double-quoted string literal. The lexeme keeps its quotes, and
  /// the contents pass through byte-for-byte (QB strings carry no escapes).
  pub(crate) fn lex_string(&mut self) -> Token {
    while !self.is_at_end() && self.get_current() != '"' {
      // Take into account new lines inside the string
      if self.get_current() == '\n' {
        self.line_num += 1;
        self.line_start = self.current + 1;
      }

      self.advance();
    }

    if self.is_at_end() {
      return self.make_error_token(ErrorTokenKind::UnterminatedStr, false);
    }

    // The closing quote
    self.advance();
    self.make_token(STR_LIT)
  }
}
