use nscore::ast::ASTNodeKind;
use nscore::ast::{ASTArena, ASTNodeIdx};
use nscore::errors::ErrorReport;
use nscore::tokens::TokenKind::*;
use nscore::tokens::*;

mod parse_expressions;
mod parse_statements;

/// If the current token matches any of the provided tokens,
/// consume it and return true, otherwise simply return false.
#[macro_export]
macro_rules! match_tok {
   ($s:expr, $id:ident $(| $ids:ident)*) => {
      $s.matches(&$id) $(|| $s.matches(&$ids))*
   }
}

/// Return true if the current token matches any of
/// the provided tokens, otherwise simply return false.
#[macro_export]
macro_rules! check_tok {
   ($s:expr, $id:ident $(| $ids:ident)*) => {
      $s.check(&$id) $(|| $s.check(&$ids))*
   }
}

/// Get a reference to the current token's kind.
#[macro_export]
macro_rules! curr_tk {
  ($s:ident) => {
    &$s.tokens[$s.current_pos].kind
  };
}

/// Guard the parser against error tokens present in the tokens list.
#[macro_export]
macro_rules! guard_error_token {
  ($s:ident) => {
    if let ERROR(e) = curr_tk![$s] {
      return Err($s.error_at_current(e.to_str()));
    }
  };
}

/// The result of parsing a node or part of a node.
pub type NodeResult<T> = Result<T, ErrorReport>;

/// Represents the NS Parser, which converts source text into
/// an Abstract Syntax Tree representation of the program.
pub struct Parser<'a> {
  /// The lexed tokens consumed by this Parser.
  tokens: &'a TokenList<'a>,
  /// The position of the Parser in the list of tokens.
  current_pos: usize,
  /// The program's AST as an ArenaTree
  pub ast: ASTArena,
  /// A list of reported errors generated while parsing.
  errors: Vec<ErrorReport>,
}

impl<'a> Parser<'a> {
  /// Composes an ASTArena from a TokenList.
  ///
  /// # Arguments
  ///
  /// * `tokens`: The TokenList containing the lexed tokens.
  ///
  /// # Returns:
  /// ```Result<ASTArena, Vec<ErrorReport>>```
  pub fn parse(tokens: &'a TokenList) -> Result<ASTArena, Vec<ErrorReport>> {
    let mut parser = Parser {
      tokens,
      current_pos: 0,
      ast: ASTArena::default(),
      errors: vec![],
    };

    // Parse the entire list of tokens into an AST
    parser.parse_module();

    if parser.errors.is_empty() {
      Ok(parser.ast)
    } else {
      Err(parser.errors)
    }
  }

  /// Gets a reference to the previous token.
  /// NOTE: Boundaries not checked.
  fn prev_tok(&self) -> &Token {
    &self.tokens[self.current_pos - 1]
  }

  /// Gets the previous token's kind.
  /// NOTE: Boundaries not checked.
  fn get_prev_tk(&self) -> &TokenKind {
    &self.prev_tok().kind
  }

  /// Gets the current token's kind.
  fn get_curr_tk(&self) -> &TokenKind {
    &self.tokens[self.current_pos].kind
  }

  /// Gets the next token's kind, clamped to the trailing EOF token.
  fn get_next_tk(&self) -> &TokenKind {
    let last = self.tokens.tokens.len() - 1;
    &self.tokens[(self.current_pos + 1).min(last)].kind
  }

  /// Checks that the current token matches the TokenKind provided.
  ///
  /// # Parameters
  /// - `tk` The token kind we expect to match with the current token.
  ///
  /// # Returns
  /// - `bool`: True if the current token matches the given token type false otherwise.
  fn check(&mut self, tk: &TokenKind) -> bool {
    let tt = self.get_curr_tk();
    tt.type_match(tk)
  }

  /// Checks that the current token matches the TokenKind provided.
  /// If the tokens match, the current token gets consumed, and the function
  /// returns true. Otherwise, if the tokens do not match, the token is not
  /// consumed, and the function returns false.
  ///
  /// # Parameters
  /// - `tk` The token kind we expect to match with the current token.
  ///
  /// # Returns
  /// `bool`: True if the tokens match, false otherwise.
  fn matches(&mut self, tk: &TokenKind) -> bool {
    if self.check(tk) {
      self.advance()
    } else {
      false
    }
  }

  /// Advances the Parser to the next token.
  fn advance(&mut self) -> bool {
    self.current_pos += 1;
    true
  }

  /// Consumes the current token only if it is of a given type.
  /// If the token is not of the expected kind, returns an ErrorReport.
  ///
  /// # Parameters
  /// - `tk`: The kind of token we expect to consume.
  /// - `message`: The error message used in the ErrorReport if the
  /// current token is not of the given kind.
  fn consume(&mut self, tk: &TokenKind, message: &str) -> NodeResult<TokenIdx> {
    if self.check(tk) {
      self.advance();
      return Ok(self.current_pos - 1);
    }

    Err(self.error_at_current(message))
  }

  /// Emit an ASTNodeKind to the parser's ASTArena.
  ///
  /// # Arguments
  ///
  /// * `node`: The AST node to be added to the arena.
  pub fn emit(&mut self, node: ASTNodeKind) -> NodeResult<ASTNodeIdx> {
    Ok(self.ast.push(node))
  }

  /// Emits a syntax error from the current token.
  ///
  /// # Parameters
  /// - `message`: The error message to display.
  fn error_at_current(&mut self, message: &str) -> ErrorReport {
    self.error_at_tok(self.current_pos, message)
  }

  /// Emits a syntax error from the previous token.
  ///
  /// # Parameters
  /// - `message`: The error message to display.
  fn error_at_prev(&mut self, message: &str) -> ErrorReport {
    self.error_at_tok(self.current_pos - 1, message)
  }

  /// Emits a syntax error from the given token.
  ///
  /// # Parameters
  /// - `tok_idx`: The token that caused the error.
  /// - `message`: The error message to display.
  fn error_at_tok(&mut self, tok_idx: TokenIdx, message: &str) -> ErrorReport {
    let tok = &self.tokens[tok_idx];
    let column = (tok.span.0 - tok.line_start) + 1;

    ErrorReport {
      line: tok.line_num,
      column,
      lexeme_len: tok.span.1 - tok.span.0,
      message: format!("SyntaxError at [{}:{}]: {}", tok.line_num, column, message),
    }
  }

  /// Synchronizes the parser when it has found an error.
  /// This method helps minimize the number of cascading errors the parser
  /// emits when it finds a parsing error. After an error, it skips tokens
  /// until it finds a synchronization point, like the end of a line or the
  /// keyword for a statement.
  fn synchronize(&mut self) {
    while !self.get_curr_tk().type_match(&EOF) {
      self.advance();

      if let NEWLINE | SEMICOLON = self.get_prev_tk() {
        return;
      }

      if matches![
        self.get_curr_tk(),
        SCRIPT_KW | IF_KW | WHILE_KW | RANDOM_KW | RETURN_KW | BREAK_KW
      ] {
        return;
      }
    }
  }
}
