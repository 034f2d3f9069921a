use hashbrown::HashMap;
use nscore::ast::{ASTArena, ASTNodeIdx};
use nscore::bytecode::OpCode;
use nscore::checksum::name_checksum;
use nscore::chunk::Chunk;
use nscore::errors::CompileError;
use nscore::tokens::TokenList;
use nslexer::Lexer;
use nsparser::Parser;

mod visitor;

/// Compiles NS source text into a QB byte stream.
///
/// # Arguments
///
/// * `source`: The NS program text.
///
/// # Returns:
/// ```Result<Vec<u8>, CompileError>```
pub fn compile(source: &str) -> Result<Vec<u8>, CompileError> {
  let src: Vec<char> = source.chars().collect();
  let tokens = Lexer::lex(&src);
  let token_list = TokenList::new(&src, &tokens);
  let ast = Parser::parse(&token_list).map_err(CompileError::Parse)?;

  Emitter::emit(&ast)
}

/// Walks an AST and produces the QB byte stream: each node kind emits a fixed
/// byte pattern, forward branch sizes and offsets are back-patched in place,
/// and the name table rides at the end of the stream.
pub struct Emitter<'a> {
  ast: &'a ASTArena,
  chunk: Chunk,
  /// Every non-raw symbol name emitted so far and its checksum.
  name_table: HashMap<String, u32>,
  /// Insertion order of `name_table`, so the serialized trailer (and with it
  /// the whole emission) is deterministic.
  name_order: Vec<String>,
  /// The chain of node kinds leading to the node being emitted, for
  /// diagnostics.
  path: Vec<&'static str>,
}

impl<'a> Emitter<'a> {
  /// Emits the QB byte stream for a whole program.
  ///
  /// # Arguments
  ///
  /// * `ast`: The program's AST arena; node zero is the root.
  ///
  /// # Returns:
  /// ```Result<Vec<u8>, CompileError>```
  pub fn emit(ast: &'a ASTArena) -> Result<Vec<u8>, CompileError> {
    let mut emitter = Emitter {
      ast,
      chunk: Chunk::default(),
      name_table: HashMap::new(),
      name_order: vec![],
      path: vec![],
    };

    emitter.emit_node(&ASTNodeIdx(0))?;
    emitter.emit_name_table();

    Ok(emitter.chunk.into_bytes())
  }

  /// Emits the `0x16` opcode and checksum for a symbol name, recording the
  /// name in this emission's name table.
  pub(crate) fn emit_name(&mut self, name: &str) {
    self.chunk.push_op_code(OpCode::Name);

    let checksum = name_checksum(name);
    if !self.name_table.contains_key(name) {
      self.name_table.insert(name.to_string(), checksum);
      self.name_order.push(name.to_string());
    }

    self.chunk.push_u32(checksum);
  }

  /// Appends the trailing name table: one `0x2B` record per recorded name,
  /// then the final terminator byte.
  fn emit_name_table(&mut self) {
    for name in &self.name_order {
      self.chunk.push_op_code(OpCode::NameTableEntry);
      self.chunk.push_u32(self.name_table[name.as_str()]);
      self.chunk.push_slice(name.as_bytes());
      self.chunk.push_byte(0x00);
    }

    self.chunk.push_op_code(OpCode::EndOfFile);
  }

  /// The chain of node kinds leading to the current node, for diagnostics.
  pub(crate) fn current_path(&self) -> String {
    if self.path.is_empty() {
      "Root".to_string()
    } else {
      self.path.join("/")
    }
  }

  pub(crate) fn invalid_ast(&self, reason: &str) -> CompileError {
    CompileError::InvalidAst {
      path: self.current_path(),
      reason: reason.to_string(),
    }
  }

  pub(crate) fn overflow(&self, reason: &str) -> CompileError {
    CompileError::Overflow {
      path: self.current_path(),
      reason: reason.to_string(),
    }
  }
}

#[cfg(test)]
mod tests;
