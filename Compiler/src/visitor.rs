use nscore::ast::ASTNodeKind::*;
use nscore::ast::*;
use nscore::bytecode::{OpCode, INFINITE_LOOP_BYPASSER};
use nscore::errors::CompileError;
use tracing::warn;

use crate::Emitter;

type EmitResult = Result<(), CompileError>;

impl<'a> Emitter<'a> {
  /// Emits the byte pattern for a single node, recursively.
  pub(crate) fn emit_node(&mut self, idx: &ASTNodeIdx) -> EmitResult {
    let node = self.ast.get(idx);
    self.path.push(kind_label(node));

    let result = match node {
      Root(children) => {
        for child in children {
          self.emit_node(child)?;
        }
        Ok(())
      }

      NewLine => {
        self.chunk.push_op_code(OpCode::NewLine);
        Ok(())
      }
      Comma => {
        self.chunk.push_op_code(OpCode::Comma);
        Ok(())
      }
      Break => {
        self.chunk.push_op_code(OpCode::Break);
        Ok(())
      }
      AllArguments => {
        self.chunk.push_op_code(OpCode::AllArguments);
        Ok(())
      }

      // Neither of these carries bytes on the compile side.
      Empty | Comment(_) => Ok(()),

      LocalReference(inner) => {
        self.chunk.push_op_code(OpCode::LocalReference);
        self.emit_node(inner)
      }
      Checksum(checksum) => self.emit_checksum(checksum),
      Integer(text) => {
        self.chunk.push_op_code(OpCode::Integer);
        let value = self.parse_i32(text)?;
        self.chunk.push_u32(value as u32);
        Ok(())
      }
      Float(text) => {
        self.chunk.push_op_code(OpCode::Float);
        let value = self.parse_f32(text)?;
        self.chunk.push_f32(value);
        Ok(())
      }
      StringLiteral(text) => self.emit_string(text),
      Pair(pair) => {
        self.chunk.push_op_code(OpCode::Pair);
        self.emit_float_bits(&pair.a)?;
        self.emit_float_bits(&pair.b)
      }
      Vector(vector) => {
        self.chunk.push_op_code(OpCode::Vector);
        self.emit_float_bits(&vector.a)?;
        self.emit_float_bits(&vector.b)?;
        self.emit_float_bits(&vector.c)
      }

      UnaryExpression(inner) => {
        self.chunk.push_op_code(OpCode::StartOfExpression);
        self.emit_node(inner)?;
        self.chunk.push_op_code(OpCode::EndOfExpression);
        Ok(())
      }
      LogicalNot(inner) => {
        self.chunk.push_op_code(OpCode::Not);
        self.emit_node(inner)
      }
      BinaryExpr(expr) => self.emit_binary_expr(expr),
      Assignment(assignment) => self.emit_assignment(assignment),

      Script(script) => {
        self.chunk.push_op_code(OpCode::StartOfScript);
        self.emit_node(&script.name)?;
        for param in &script.default_params {
          self.emit_node(param)?;
        }
        for node in &script.body {
          self.emit_node(node)?;
        }
        self.chunk.push_op_code(OpCode::EndOfScript);
        Ok(())
      }
      Invocation(invocation) => {
        self.emit_node(&invocation.target)?;
        for param in &invocation.params {
          self.emit_node(param)?;
        }
        Ok(())
      }
      Return(inner) => self.emit_return(inner),
      IfStatement(stmt) => self.emit_if_stmt(stmt),
      WhileLoop(body) => self.emit_while_loop(body),
      Random(random) => self.emit_random(random),

      Struct(elements) => {
        self.chunk.push_op_code(OpCode::StartOfStruct);
        for element in elements {
          self.emit_node(element)?;
        }
        self.chunk.push_op_code(OpCode::EndOfStruct);
        Ok(())
      }
      Array(elements) => {
        self.chunk.push_op_code(OpCode::StartOfArray);
        for element in elements {
          self.emit_node(element)?;
        }
        self.chunk.push_op_code(OpCode::EndOfArray);
        Ok(())
      }

      NameTableEntry(_) => {
        warn!("ignoring a name-table node during emission; it has no compile-side bytes");
        Ok(())
      }
    };

    self.path.pop();
    result
  }

  /// Emits a symbol checksum. Raw `#`-prefixed checksums parse as unsigned
  /// 32-bit hex and stay out of the name table; named checksums are hashed
  /// and recorded.
  fn emit_checksum(&mut self, checksum: &ASTChecksumNode) -> EmitResult {
    if checksum.is_raw {
      let digits = checksum.name.trim_start_matches('#');
      let value = u32::from_str_radix(digits, 16)
        .map_err(|_| self.invalid_ast(&format!("'{}' is not a 32-bit hex checksum", checksum.name)))?;

      self.chunk.push_op_code(OpCode::Name);
      self.chunk.push_u32(value);
    } else {
      self.emit_name(&checksum.name);
    }

    Ok(())
  }

  /// Emits a string literal: `0x1B`, the content length including the
  /// trailing NUL, the content with the quotes stripped, and the NUL.
  fn emit_string(&mut self, text: &str) -> EmitResult {
    let bytes = text.as_bytes();
    if bytes.len() < 2 {
      return Err(self.invalid_ast("string literal is missing its quotes"));
    }

    let inner = &bytes[1..bytes.len() - 1];
    let length = u32::try_from(inner.len() + 1)
      .map_err(|_| self.overflow("string length exceeds 32 bits"))?;

    self.chunk.push_op_code(OpCode::String);
    self.chunk.push_u32(length);
    self.chunk.push_slice(inner);
    self.chunk.push_byte(0x00);
    Ok(())
  }

  /// Emits the bare IEEE-754 bits of a Float child (Pair and Vector payloads
  /// carry no per-element opcode).
  fn emit_float_bits(&mut self, idx: &ASTNodeIdx) -> EmitResult {
    match self.ast.get(idx) {
      Float(text) => {
        let value = self.parse_f32(text)?;
        self.chunk.push_f32(value);
        Ok(())
      }
      _ => Err(self.invalid_ast("pair and vector children must be float literals")),
    }
  }

  /// Emits a binary expression. Arithmetic and comparison operators carry the
  /// `0x0E`/`0x0F` wrapper with the operator byte between the operands;
  /// `and`, `or`, and member access encode bare.
  fn emit_binary_expr(&mut self, expr: &ASTBinaryExprNode) -> EmitResult {
    let operator = match expr.kind {
      BinaryExprKind::Dot => {
        self.emit_node(&expr.left)?;
        self.chunk.push_op_code(OpCode::Dot);
        return self.emit_node(&expr.right);
      }
      BinaryExprKind::LogicAND => {
        self.emit_node(&expr.left)?;
        self.chunk.push_op_code(OpCode::And);
        return self.emit_node(&expr.right);
      }
      BinaryExprKind::LogicOR => {
        self.emit_node(&expr.left)?;
        self.chunk.push_op_code(OpCode::Or);
        return self.emit_node(&expr.right);
      }

      BinaryExprKind::Add => OpCode::Add,
      BinaryExprKind::Subtract => OpCode::Subtract,
      BinaryExprKind::Mult => OpCode::Multiply,
      BinaryExprKind::Div => OpCode::Divide,
      BinaryExprKind::GreaterThan => OpCode::GreaterThan,
      BinaryExprKind::LessThan => OpCode::LessThan,
      // `==` shares its byte with assignment; the wrapper disambiguates.
      BinaryExprKind::Equals => OpCode::Assignment,
      BinaryExprKind::LessThanEQ => {
        warn!("'<=' is not implemented by some target runtimes");
        OpCode::LessThanEqual
      }
      BinaryExprKind::GreaterThanEQ => {
        warn!("'>=' is not implemented by some target runtimes");
        OpCode::GreaterThanEqual
      }
    };

    self.chunk.push_op_code(OpCode::StartOfExpression);
    self.emit_node(&expr.left)?;
    self.chunk.push_op_code(operator);
    self.emit_node(&expr.right)?;
    self.chunk.push_op_code(OpCode::EndOfExpression);
    Ok(())
  }

  /// Emits an assignment: name, `0x07`, value.
  fn emit_assignment(&mut self, assignment: &ASTAssignmentNode) -> EmitResult {
    if !self.is_name_node(&assignment.name) {
      return Err(self.invalid_ast("assignment target must be a symbol name or a dotted symbol path"));
    }

    self.emit_node(&assignment.name)?;
    self.chunk.push_op_code(OpCode::Assignment);
    self.emit_node(&assignment.value)
  }

  /// Checks that a node is a Checksum or a member-access chain of Checksums.
  fn is_name_node(&self, idx: &ASTNodeIdx) -> bool {
    match self.ast.get(idx) {
      Checksum(_) => true,
      BinaryExpr(expr) if matches!(expr.kind, BinaryExprKind::Dot) => {
        self.is_name_node(&expr.left) && self.is_name_node(&expr.right)
      }
      _ => false,
    }
  }

  /// Emits a return statement: `0x29` followed by the returned arguments of
  /// the wrapped invocation.
  fn emit_return(&mut self, inner: &ASTNodeIdx) -> EmitResult {
    match self.ast.get(inner) {
      Invocation(invocation) => {
        self.chunk.push_op_code(OpCode::Return);
        for param in &invocation.params {
          self.emit_node(param)?;
        }
        Ok(())
      }
      _ => Err(self.invalid_ast("a return statement wraps an invocation node")),
    }
  }

  /// Validates the shape of an if statement and emits it.
  fn emit_if_stmt(&mut self, stmt: &ASTIfStmtNode) -> EmitResult {
    if stmt.conditions.is_empty() {
      return Err(self.invalid_ast("an if statement needs at least one condition"));
    }

    if stmt.bodies.len() != stmt.conditions.len() && stmt.bodies.len() != stmt.conditions.len() + 1 {
      return Err(self.invalid_ast("an if statement needs one body per condition, plus at most one else body"));
    }

    self.emit_if_branches(&stmt.conditions, &stmt.bodies)
  }

  /// Emits one `if`/`else` pair. Chains with more than one condition nest:
  /// everything past the first condition becomes an else body holding the
  /// rest of the chain between two line breaks.
  ///
  /// The `0x47` size counts from the opcode to the matching `0x48`/`0x28`,
  /// plus two when an else arm follows; the `0x48` size covers the else arm
  /// up to the `0x28`. Both are unsigned 16-bit.
  fn emit_if_branches(&mut self, conditions: &[ASTNodeIdx], bodies: &[Vec<ASTNodeIdx>]) -> EmitResult {
    let has_else = conditions.len() > 1 || bodies.len() > conditions.len();

    let start = self.chunk.len();
    self.chunk.push_op_code(OpCode::If);
    self.chunk.push_u16(0); // patched once the branch size is known

    self.emit_node(&conditions[0])?;
    for node in &bodies[0] {
      self.emit_node(node)?;
    }

    let mut size = self.chunk.len() - start;
    if has_else {
      size += 2;
    }
    let size = u16::try_from(size).map_err(|_| self.overflow("if branch exceeds 65535 bytes"))?;
    self.chunk.patch_u16(start + 1, size);

    if has_else {
      let else_start = self.chunk.len();
      self.chunk.push_op_code(OpCode::Else);
      self.chunk.push_u16(0); // patched once the branch size is known

      if conditions.len() > 1 {
        self.chunk.push_op_code(OpCode::NewLine);
        self.emit_if_branches(&conditions[1..], &bodies[1..])?;
        self.chunk.push_op_code(OpCode::NewLine);
      } else {
        for node in &bodies[1] {
          self.emit_node(node)?;
        }
      }

      let else_size = u16::try_from(self.chunk.len() - else_start)
        .map_err(|_| self.overflow("else branch exceeds 65535 bytes"))?;
      self.chunk.patch_u16(else_start + 1, else_size);
    }

    self.chunk.push_op_code(OpCode::EndOfIf);
    Ok(())
  }

  /// Emits a while loop. QB loops always terminate, so `while` lowers into a
  /// loop guarded by a compiler-owned local that breaks once the local is
  /// forced above zero. The sentinel name is fixed; downstream analyzers
  /// match on it.
  fn emit_while_loop(&mut self, body: &[ASTNodeIdx]) -> EmitResult {
    // __COMPILER__infinite_loop_bypasser = 0
    self.emit_name(INFINITE_LOOP_BYPASSER);
    self.chunk.push_op_code(OpCode::Assignment);
    self.chunk.push_op_code(OpCode::Integer);
    self.chunk.push_u32(0);

    self.chunk.push_op_code(OpCode::NewLine);
    self.chunk.push_op_code(OpCode::StartOfLoop);

    // if ($__COMPILER__infinite_loop_bypasser > 0) { break }
    let start = self.chunk.len();
    self.chunk.push_op_code(OpCode::If);
    self.chunk.push_u16(0);
    self.chunk.push_op_code(OpCode::StartOfExpression);
    self.chunk.push_op_code(OpCode::LocalReference);
    self.emit_name(INFINITE_LOOP_BYPASSER);
    self.chunk.push_op_code(OpCode::GreaterThan);
    self.chunk.push_op_code(OpCode::Integer);
    self.chunk.push_u32(0);
    self.chunk.push_op_code(OpCode::EndOfExpression);
    self.chunk.push_op_code(OpCode::NewLine);
    self.chunk.push_op_code(OpCode::Break);
    self.chunk.push_op_code(OpCode::NewLine);

    let guard_size = self.chunk.len() - start;
    self.chunk.patch_u16(start + 1, guard_size as u16);
    self.chunk.push_op_code(OpCode::EndOfIf);

    for node in body {
      self.emit_node(node)?;
    }

    self.chunk.push_op_code(OpCode::EndOfLoop);
    Ok(())
  }

  /// Emits a random block: the header with the branch count, the weights,
  /// and a placeholder offset table; then the branches back to back, each
  /// non-final branch tailed by a long-jump; then both tables back-patched.
  fn emit_random(&mut self, random: &ASTRandomNode) -> EmitResult {
    let branch_count = random.branches.len();

    if branch_count == 0 {
      return Err(self.invalid_ast("a random block needs at least one branch"));
    }
    if random.branch_weights.len() != branch_count {
      return Err(self.invalid_ast("a random block needs exactly one weight per branch"));
    }

    self.chunk.push_op_code(OpCode::RandomBranch);
    self.chunk.push_u32(branch_count as u32);

    for weight in &random.branch_weights {
      let value = self.branch_weight_value(weight)?;
      self.chunk.push_u16(value);
    }

    // Dummy branch offsets; patched once the branch sizes are known
    let offsets_index = self.chunk.len();
    for _ in 0..branch_count {
      self.chunk.push_u32(0);
    }

    let mut branch_sizes = vec![0usize; branch_count];
    let mut long_jumps = vec![0usize; branch_count - 1];

    for (i, branch) in random.branches.iter().enumerate() {
      let start = self.chunk.len();

      for node in branch {
        self.emit_node(node)?;
      }

      if i < branch_count - 1 {
        // Dummy long-jump offset; patched once the block end is known
        long_jumps[i] = self.chunk.len();
        self.chunk.push_op_code(OpCode::LongJump);
        self.chunk.push_u32(0);
      }

      branch_sizes[i] = self.chunk.len() - start;
    }

    let final_index = self.chunk.len();

    // Each offset slot encodes the forward distance from the end of its own
    // slot to the start of its branch: the remaining offset-table slots plus
    // the sizes of the branches before its own.
    for i in 0..branch_count {
      let offset = 4 * (branch_count - 1 - i) + branch_sizes[..i].iter().sum::<usize>();
      let offset =
        u32::try_from(offset).map_err(|_| self.overflow("random branch offset exceeds 32 bits"))?;
      self.chunk.patch_u32(offsets_index + 4 * i, offset);
    }

    // Long-jumps land on the first byte after the final branch.
    for i in 0..branch_count - 1 {
      let jump = final_index - long_jumps[i] - 5;
      let jump =
        u32::try_from(jump).map_err(|_| self.overflow("random long-jump exceeds 32 bits"))?;
      self.chunk.patch_u32(long_jumps[i] + 1, jump);
    }

    Ok(())
  }

  /// Reads a branch weight out of its Integer node.
  fn branch_weight_value(&self, idx: &ASTNodeIdx) -> Result<u16, CompileError> {
    match self.ast.get(idx) {
      Integer(text) => text
        .parse::<u16>()
        .map_err(|_| self.overflow(&format!("branch weight '{}' does not fit 16 bits", text))),
      _ => Err(self.invalid_ast("random branch weights must be integer literals")),
    }
  }

  fn parse_i32(&self, text: &str) -> Result<i32, CompileError> {
    text
      .parse::<i32>()
      .map_err(|_| self.invalid_ast(&format!("'{}' is not a 32-bit integer", text)))
  }

  fn parse_f32(&self, text: &str) -> Result<f32, CompileError> {
    text
      .parse::<f32>()
      .map_err(|_| self.invalid_ast(&format!("'{}' is not a 32-bit float", text)))
  }
}

/// A short label for a node kind, used to build diagnostic AST paths.
fn kind_label(node: &ASTNodeKind) -> &'static str {
  match node {
    Root(_) => "Root",
    AllArguments => "AllArguments",
    Array(_) => "Array",
    Assignment(_) => "Assignment",
    BinaryExpr(_) => "BinaryExpr",
    Break => "Break",
    Checksum(_) => "Checksum",
    Comma => "Comma",
    Comment(_) => "Comment",
    Empty => "Empty",
    Float(_) => "Float",
    IfStatement(_) => "IfStatement",
    Integer(_) => "Integer",
    Invocation(_) => "Invocation",
    LocalReference(_) => "LocalReference",
    LogicalNot(_) => "LogicalNot",
    NameTableEntry(_) => "NameTableEntry",
    NewLine => "NewLine",
    Pair(_) => "Pair",
    Random(_) => "Random",
    Return(_) => "Return",
    Script(_) => "Script",
    StringLiteral(_) => "StringLiteral",
    Struct(_) => "Struct",
    UnaryExpression(_) => "UnaryExpression",
    Vector(_) => "Vector",
    WhileLoop(_) => "WhileLoop",
  }
}
