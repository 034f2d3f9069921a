use crate::Lexer;
use nscore::tokens::ErrorTokenKind;
use nscore::tokens::Token;
use nscore::tokens::TokenKind::*;

impl<'a> Lexer<'a> {
  /// Lexes a numeric literal.
  ///
  /// ```bnf
  /// INTEGER_LITERAL ::= DIGIT+
  /// FLOAT_LITERAL   ::= DIGIT+ "." DIGIT+
  /// ```
  pub(crate) fn lex_number(&mut self) -> Token {
    while !self.is_at_end() && self.get_current().is_ascii_digit() {
      self.advance();
    }

    // A dot followed by a digit turns the literal into a float.
    if self.get_current() == '.' && self.get_next().is_ascii_digit() {
      self.advance();

      while !self.is_at_end() && self.get_current().is_ascii_digit() {
        self.advance();
      }

      if self.get_current() == '.' && self.get_next().is_ascii_digit() {
        return self.make_error_token(ErrorTokenKind::ExtraDotInFloat, true);
      }

      return self.make_token(FLOAT_LIT);
    }

    self.make_token(INT_LIT)
  }
}
