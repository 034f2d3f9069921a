use nscore::ast::ASTNodeKind::*;
use nscore::ast::*;
use nscore::tokens::TokenKind::*;

use crate::{curr_tk, guard_error_token, match_tok, NodeResult, Parser};

impl<'a> Parser<'a> {
  /// Parses a general expression. Only `and`/`or` appear bare at this level;
  /// every other binary operator lives inside parentheses, mirroring its
  /// wrapped encoding.
  ///
  /// ```bnf
  /// EXPRESSION ::= UNARY (("and" | "or") UNARY)*
  /// ```
  pub(super) fn parse_expr(&mut self) -> NodeResult<ASTNodeIdx> {
    guard_error_token![self];

    let mut left = self.parse_unary()?;

    loop {
      let kind = match curr_tk![self] {
        AND_KW => BinaryExprKind::LogicAND,
        OR_KW => BinaryExprKind::LogicOR,
        _ => break,
      };

      self.advance();
      let right = self.parse_unary()?;
      left = self.emit(BinaryExpr(ASTBinaryExprNode { left, right, kind }))?;
    }

    Ok(left)
  }

  /// Parses a unary expression.
  ///
  /// ```bnf
  /// UNARY ::= "!" UNARY | POSTFIX
  /// ```
  fn parse_unary(&mut self) -> NodeResult<ASTNodeIdx> {
    if match_tok![self, BANG] {
      let operand = self.parse_unary()?;
      return self.emit(LogicalNot(operand));
    }

    self.parse_postfix()
  }

  /// Parses a member-access chain.
  ///
  /// ```bnf
  /// POSTFIX ::= PRIMARY ("." PRIMARY)*
  /// ```
  fn parse_postfix(&mut self) -> NodeResult<ASTNodeIdx> {
    let mut left = self.parse_primary()?;

    while match_tok![self, DOT] {
      let right = self.parse_primary()?;
      left = self.emit(BinaryExpr(ASTBinaryExprNode {
        left,
        right,
        kind: BinaryExprKind::Dot,
      }))?;
    }

    Ok(left)
  }

  /// Parses a primary expression.
  ///
  /// ```bnf
  /// PRIMARY ::= INTEGER | FLOAT | STRING | IDENTIFIER | RAW_CHECKSUM
  ///         | "$" NAME_ATOM | "<...>" | ARRAY | STRUCT | PAREN | "-" NUMBER
  /// ```
  fn parse_primary(&mut self) -> NodeResult<ASTNodeIdx> {
    match curr_tk![self] {
      INT_LIT if self.advance() => {
        let lexeme = self.tokens.lexeme(self.current_pos - 1);
        self.emit(Integer(lexeme))
      }
      FLOAT_LIT if self.advance() => {
        let lexeme = self.tokens.lexeme(self.current_pos - 1);
        self.emit(Float(lexeme))
      }
      STR_LIT if self.advance() => {
        let lexeme = self.tokens.lexeme(self.current_pos - 1);
        self.emit(StringLiteral(lexeme))
      }
      DASH if self.advance() => self.parse_negative_literal(),
      IDENTIFIER | RAW_CHECKSUM | DOLLAR => self.parse_name_target(),
      ALL_ARGS if self.advance() => self.emit(AllArguments),
      L_BRACKET if self.advance() => self.parse_array_literal(),
      L_CURLY if self.advance() => self.parse_struct_literal(),
      L_PAREN if self.advance() => self.parse_paren_expr(),
      _ => Err(self.error_at_current("Expected an expression.")),
    }
  }

  /// Parses a negated numeric literal. The sign folds into the literal's
  /// text, so `-5` emits as the 32-bit integer -5 rather than an expression.
  fn parse_negative_literal(&mut self) -> NodeResult<ASTNodeIdx> {
    match curr_tk![self] {
      INT_LIT if self.advance() => {
        let lexeme = self.tokens.lexeme(self.current_pos - 1);
        self.emit(Integer(format!("-{}", lexeme)))
      }
      FLOAT_LIT if self.advance() => {
        let lexeme = self.tokens.lexeme(self.current_pos - 1);
        self.emit(Float(format!("-{}", lexeme)))
      }
      _ => Err(self.error_at_current("Expected a numeric literal after '-'.")),
    }
  }

  /// Parses a (possibly dotted, possibly `$`-prefixed) symbol reference.
  ///
  /// ```bnf
  /// NAME_TARGET ::= NAME_ATOM ("." NAME_ATOM)*
  /// NAME_ATOM   ::= "$"? (IDENTIFIER | RAW_CHECKSUM)
  /// ```
  pub(super) fn parse_name_target(&mut self) -> NodeResult<ASTNodeIdx> {
    let mut left = self.parse_name_atom()?;

    while match_tok![self, DOT] {
      let right = self.parse_name_atom()?;
      left = self.emit(BinaryExpr(ASTBinaryExprNode {
        left,
        right,
        kind: BinaryExprKind::Dot,
      }))?;
    }

    Ok(left)
  }

  /// Parses a single symbol reference, with an optional `$` prefix.
  fn parse_name_atom(&mut self) -> NodeResult<ASTNodeIdx> {
    if match_tok![self, DOLLAR] {
      let inner = self.parse_checksum_atom()?;
      return self.emit(LocalReference(inner));
    }

    self.parse_checksum_atom()
  }

  /// Parses a bare checksum: an identifier or a `#`-prefixed hex literal.
  fn parse_checksum_atom(&mut self) -> NodeResult<ASTNodeIdx> {
    match curr_tk![self] {
      IDENTIFIER if self.advance() => {
        let lexeme = self.tokens.lexeme(self.current_pos - 1);
        self.emit(Checksum(ASTChecksumNode {
          name: lexeme,
          is_raw: false,
        }))
      }
      RAW_CHECKSUM if self.advance() => {
        let lexeme = self.tokens.lexeme(self.current_pos - 1);
        self.emit(Checksum(ASTChecksumNode {
          name: lexeme,
          is_raw: true,
        }))
      }
      _ => Err(self.error_at_current("Expected a symbol name.")),
    }
  }

  /// Parses the contents of a parenthesized form: a Pair or Vector literal,
  /// a wrapped binary expression, or a plain grouping.
  ///
  /// ```bnf
  /// PAREN ::= "(" FLOAT "," FLOAT ("," FLOAT)? ")"
  ///       | "(" EXPRESSION (BIN_OP UNARY)* ")"
  /// ```
  fn parse_paren_expr(&mut self) -> NodeResult<ASTNodeIdx> {
    let first = self.parse_expr()?;

    // `(f, f)` and `(f, f, f)` are Pair and Vector literals
    if match_tok![self, COMMA] {
      let a = self.coerce_float(first)?;
      let second = self.parse_expr()?;
      let b = self.coerce_float(second)?;

      if match_tok![self, COMMA] {
        let third = self.parse_expr()?;
        let c = self.coerce_float(third)?;
        self.consume(&R_PAREN, "Expected ')' after the vector elements.")?;
        return self.emit(Vector(ASTVectorNode { a, b, c }));
      }

      self.consume(&R_PAREN, "Expected ')' after the pair elements.")?;
      return self.emit(Pair(ASTPairNode { a, b }));
    }

    // Parenthesized binary operators, folded left-to-right
    let mut wrapped = false;
    let mut left = first;

    while let Some(kind) = BinaryExprKind::try_from_token(self.get_curr_tk()) {
      self.advance();
      let right = self.parse_unary()?;
      left = self.emit(BinaryExpr(ASTBinaryExprNode { left, right, kind }))?;
      wrapped = true;
    }

    self.consume(&R_PAREN, "Expected a matching ')'.")?;

    if wrapped {
      Ok(left)
    } else {
      self.emit(UnaryExpression(left))
    }
  }

  /// Pair and Vector children are float-typed; integer literals written
  /// without a decimal point are re-tagged as floats.
  fn coerce_float(&mut self, idx: ASTNodeIdx) -> NodeResult<ASTNodeIdx> {
    match self.ast.get(&idx) {
      Float(_) => Ok(idx),
      Integer(text) => {
        let text = text.clone();
        self.emit(Float(text))
      }
      _ => Err(self.error_at_prev("Pair and vector elements must be numeric literals.")),
    }
  }

  /// Parses an array literal. Separators between elements are kept as
  /// Comma and NewLine nodes.
  ///
  /// ```bnf
  /// ARRAY ::= "[" (EXPRESSION | SEPARATOR | ",")* "]"
  /// ```
  fn parse_array_literal(&mut self) -> NodeResult<ASTNodeIdx> {
    let mut elements = vec![];

    while !match_tok![self, R_BRACKET] {
      match curr_tk![self] {
        EOF => return Err(self.error_at_current("Expected ']' to close the array.")),
        COMMA if self.advance() => elements.push(self.emit(Comma)?),
        NEWLINE | SEMICOLON if self.advance() => elements.push(self.emit(NewLine)?),
        _ => elements.push(self.parse_expr()?),
      }
    }

    self.emit(Array(elements))
  }

  /// Parses a structure literal.
  ///
  /// ```bnf
  /// STRUCT ::= "{" (ASSIGNMENT | EXPRESSION | SEPARATOR | ",")* "}"
  /// ```
  fn parse_struct_literal(&mut self) -> NodeResult<ASTNodeIdx> {
    let mut elements = vec![];

    while !match_tok![self, R_CURLY] {
      match curr_tk![self] {
        EOF => return Err(self.error_at_current("Expected '}' to close the structure.")),
        COMMA if self.advance() => elements.push(self.emit(Comma)?),
        NEWLINE | SEMICOLON if self.advance() => elements.push(self.emit(NewLine)?),
        IDENTIFIER | RAW_CHECKSUM | DOLLAR => {
          let target = self.parse_name_target()?;

          if match_tok![self, EQUALS] {
            let value = self.parse_expr()?;
            elements.push(self.emit(Assignment(ASTAssignmentNode { name: target, value }))?);
          } else {
            elements.push(target);
          }
        }
        _ => elements.push(self.parse_expr()?),
      }
    }

    self.emit(Struct(elements))
  }
}
