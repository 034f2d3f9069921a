use nscore::ast::ASTNodeKind::*;
use nscore::ast::*;
use nscore::tokens::TokenKind::*;

use crate::{check_tok, curr_tk, guard_error_token, match_tok, NodeResult, Parser};

impl<'a> Parser<'a> {
  /// Parses a module.
  ///
  /// ```bnf
  /// MODULE    ::= (STATEMENT? SEPARATOR)* STATEMENT? EOF
  /// SEPARATOR ::= NEWLINE | ";"
  /// ```
  pub(super) fn parse_module(&mut self) {
    while !match_tok![self, EOF] {
      // Every separator in statement position becomes one NewLine node, so
      // the emitted stream reproduces the line structure of the source.
      if match_tok![self, NEWLINE | SEMICOLON] {
        match self.emit(NewLine) {
          Ok(node) => self.ast.attach_to_root(node),
          Err(e) => self.errors.push(e),
        }
        continue;
      }

      match self.parse_stmt() {
        Ok(node) => self.ast.attach_to_root(node),
        Err(e) => {
          self.errors.push(e);
          self.synchronize();
        }
      }
    }
  }

  /// Parses a general statement.
  ///
  /// ```bnf
  /// STATEMENT ::= SCRIPT_DECL | IF_STMT | WHILE_STMT | RANDOM_STMT
  ///           | RETURN_STMT | "break" | ASSIGNMENT | INVOCATION
  /// ```
  pub(super) fn parse_stmt(&mut self) -> NodeResult<ASTNodeIdx> {
    guard_error_token![self];

    match curr_tk![self] {
      SCRIPT_KW if self.advance() => self.parse_script_decl(),
      IF_KW if self.advance() => self.parse_if_stmt(),
      WHILE_KW if self.advance() => self.parse_while_stmt(),
      RANDOM_KW if self.advance() => self.parse_random_stmt(),
      RETURN_KW if self.advance() => self.parse_return_stmt(),
      BREAK_KW if self.advance() => self.emit(Break),
      IDENTIFIER | RAW_CHECKSUM | DOLLAR => self.parse_assignment_or_invocation(),
      _ => Err(self.error_at_current("Expected a statement.")),
    }
  }

  /// Parses a `{ ... }` statement block into its node sequence.
  ///
  /// ```bnf
  /// BLOCK ::= "{" (STATEMENT? SEPARATOR)* STATEMENT? "}"
  /// ```
  ///
  /// Block bodies are normalized to begin and end with a NewLine node, so a
  /// block always opens and closes on a line break in the emitted stream.
  pub(super) fn parse_block_nodes(&mut self) -> NodeResult<Vec<ASTNodeIdx>> {
    let mut nodes = vec![];

    while !match_tok![self, R_CURLY] {
      if check_tok![self, EOF] {
        return Err(self.error_at_current("Expected '}' to close the block."));
      }

      if match_tok![self, NEWLINE | SEMICOLON] {
        nodes.push(self.emit(NewLine)?);
      } else {
        nodes.push(self.parse_stmt()?);
      }
    }

    if nodes.is_empty() {
      nodes.push(self.emit(NewLine)?);
      return Ok(nodes);
    }

    if !matches!(self.ast.get(&nodes[0]), NewLine) {
      let leading = self.emit(NewLine)?;
      nodes.insert(0, leading);
    }

    if !matches!(self.ast.get(&nodes[nodes.len() - 1]), NewLine) {
      nodes.push(self.emit(NewLine)?);
    }

    Ok(nodes)
  }

  /// Parses a script declaration.
  ///
  /// ```bnf
  /// SCRIPT_DECL   ::= "script" IDENTIFIER DEFAULT_PARAM* BLOCK
  /// DEFAULT_PARAM ::= IDENTIFIER ("=" EXPRESSION)?
  /// ```
  fn parse_script_decl(&mut self) -> NodeResult<ASTNodeIdx> {
    self.consume(&IDENTIFIER, "Expected a script name after 'script'.")?;
    let lexeme = self.tokens.lexeme(self.current_pos - 1);
    let name = self.emit(Checksum(ASTChecksumNode { name: lexeme, is_raw: false }))?;

    let mut default_params = vec![];
    loop {
      match curr_tk![self] {
        L_CURLY if self.advance() => break,
        // The header may wrap before the opening brace
        NEWLINE if self.advance() => {}
        IDENTIFIER if self.advance() => {
          let lexeme = self.tokens.lexeme(self.current_pos - 1);
          let param = self.emit(Checksum(ASTChecksumNode { name: lexeme, is_raw: false }))?;

          if match_tok![self, EQUALS] {
            let value = self.parse_expr()?;
            default_params.push(self.emit(Assignment(ASTAssignmentNode { name: param, value }))?);
          } else {
            default_params.push(param);
          }
        }
        _ => return Err(self.error_at_current("Expected '{' to open the script body.")),
      }
    }

    let body = self.parse_block_nodes()?;
    self.emit(Script(ASTScriptNode {
      name,
      default_params,
      body,
    }))
  }

  /// Parses an if statement.
  ///
  /// ```bnf
  /// IF_STMT ::= "if" EXPRESSION BLOCK ("elseif" EXPRESSION BLOCK)* ("else" BLOCK)?
  /// ```
  fn parse_if_stmt(&mut self) -> NodeResult<ASTNodeIdx> {
    let mut conditions = vec![self.parse_expr()?];
    self.consume(&L_CURLY, "Expected '{' after the 'if' condition.")?;
    let mut bodies = vec![self.parse_block_nodes()?];

    loop {
      if match_tok![self, ELSEIF_KW] {
        conditions.push(self.parse_expr()?);
        self.consume(&L_CURLY, "Expected '{' after the 'elseif' condition.")?;
        bodies.push(self.parse_block_nodes()?);
      } else if match_tok![self, ELSE_KW] {
        self.consume(&L_CURLY, "Expected '{' after 'else'.")?;
        bodies.push(self.parse_block_nodes()?);
        break;
      } else {
        break;
      }
    }

    self.emit(IfStatement(ASTIfStmtNode { conditions, bodies }))
  }

  /// Parses a while statement. NS while loops carry no condition; loops
  /// terminate through `break`.
  ///
  /// ```bnf
  /// WHILE_STMT ::= "while" BLOCK
  /// ```
  fn parse_while_stmt(&mut self) -> NodeResult<ASTNodeIdx> {
    self.consume(&L_CURLY, "Expected '{' after 'while'.")?;
    let body = self.parse_block_nodes()?;
    self.emit(WhileLoop(body))
  }

  /// Parses a random-branch statement.
  ///
  /// ```bnf
  /// RANDOM_STMT ::= "random" "(" BRANCH (SEPARATOR BRANCH)* ")"
  /// BRANCH      ::= INTEGER ":" (STATEMENT? SEPARATOR)* STATEMENT?
  /// ```
  fn parse_random_stmt(&mut self) -> NodeResult<ASTNodeIdx> {
    self.consume(&L_PAREN, "Expected '(' after 'random'.")?;

    let mut branches = vec![];
    let mut branch_weights = vec![];

    loop {
      while match_tok![self, NEWLINE | SEMICOLON] {}

      self.consume(&INT_LIT, "Expected an integer branch weight.")?;
      let weight = self.tokens.lexeme(self.current_pos - 1);
      branch_weights.push(self.emit(Integer(weight))?);
      self.consume(&COLON, "Expected ':' after the branch weight.")?;

      let mut branch = vec![];
      let mut closed = false;

      loop {
        if match_tok![self, R_PAREN] {
          closed = true;
          break;
        }

        if check_tok![self, EOF] {
          return Err(self.error_at_current("Expected ')' to close the random block."));
        }

        if match_tok![self, NEWLINE | SEMICOLON] {
          // A weight followed by ':' starts the next branch
          if check_tok![self, INT_LIT] && self.get_next_tk().type_match(&COLON) {
            break;
          }

          // Separators directly before ')' belong to no statement
          if !check_tok![self, R_PAREN] {
            branch.push(self.emit(NewLine)?);
          }

          continue;
        }

        branch.push(self.parse_stmt()?);
      }

      branches.push(branch);

      if closed {
        break;
      }
    }

    self.emit(Random(ASTRandomNode {
      branches,
      branch_weights,
    }))
  }

  /// Parses a return statement. The returned arguments ride on a synthetic
  /// invocation node so they flow through the same emission path as script
  /// call parameters.
  ///
  /// ```bnf
  /// RETURN_STMT ::= "return" PARAM*
  /// ```
  fn parse_return_stmt(&mut self) -> NodeResult<ASTNodeIdx> {
    let params = self.parse_params()?;
    let target = self.emit(Empty)?;
    let invocation = self.emit(Invocation(ASTInvocationNode { target, params }))?;
    self.emit(Return(invocation))
  }

  /// Parses a whitespace-separated parameter list, up to the end of the
  /// enclosing line or bracket.
  ///
  /// ```bnf
  /// PARAM ::= IDENTIFIER "=" EXPRESSION | EXPRESSION | ","
  /// ```
  pub(super) fn parse_params(&mut self) -> NodeResult<Vec<ASTNodeIdx>> {
    let mut params = vec![];

    loop {
      match curr_tk![self] {
        NEWLINE | SEMICOLON | EOF | R_PAREN | R_CURLY | R_BRACKET => break,
        COMMA if self.advance() => params.push(self.emit(Comma)?),
        IDENTIFIER if self.get_next_tk().type_match(&EQUALS) => {
          self.advance();
          let lexeme = self.tokens.lexeme(self.current_pos - 1);
          let name = self.emit(Checksum(ASTChecksumNode { name: lexeme, is_raw: false }))?;
          self.advance(); // the '='
          let value = self.parse_expr()?;
          params.push(self.emit(Assignment(ASTAssignmentNode { name, value }))?);
        }
        _ => params.push(self.parse_expr()?),
      }
    }

    Ok(params)
  }

  /// Parses either an assignment or a script invocation; both start with a
  /// (possibly dotted) symbol reference, so the `=` decides.
  ///
  /// ```bnf
  /// ASSIGNMENT ::= NAME_TARGET "=" EXPRESSION
  /// INVOCATION ::= NAME_TARGET PARAM*
  /// ```
  fn parse_assignment_or_invocation(&mut self) -> NodeResult<ASTNodeIdx> {
    let target = self.parse_name_target()?;

    if match_tok![self, EQUALS] {
      let value = self.parse_expr()?;
      self.emit(Assignment(ASTAssignmentNode { name: target, value }))
    } else {
      let params = self.parse_params()?;
      self.emit(Invocation(ASTInvocationNode { target, params }))
    }
  }
}
