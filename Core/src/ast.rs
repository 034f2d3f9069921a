use crate::tokens::TokenKind;

/// Represents the index of an AST Node in the ASTArena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ASTNodeIdx(pub usize);

impl From<usize> for ASTNodeIdx {
  fn from(x: usize) -> Self {
    ASTNodeIdx(x)
  }
}

impl Default for ASTNodeIdx {
  fn default() -> Self {
    usize::MAX.into()
  }
}

/// Abstract syntax tree in the form
/// of an Arena data structure.
pub struct ASTArena {
  arena: Vec<ASTNodeKind>,
}

impl Default for ASTArena {
  /// The default AST Arena, which comes with an empty root node.
  fn default() -> Self {
    Self {
      arena: vec![ASTNodeKind::Root(vec![])],
    }
  }
}

impl ASTArena {
  /// Pushes a new node to the arena.
  ///
  /// # Arguments
  ///
  /// * `val`: The node to insert into the arena.
  ///
  /// # Returns:
  /// ```ASTNodeIdx```
  pub fn push(&mut self, val: ASTNodeKind) -> ASTNodeIdx {
    self.arena.push(val);
    (self.arena.len() - 1).into()
  }

  /// Gets an ASTNode in the arena from its ASTNodeIdx. Can also
  /// use a `usize` and convert it to an `ASTNodeIdx` with `.into()`.
  ///
  /// # Arguments
  ///
  /// * `idx`: The ASTNodeIdx of the node.
  ///
  /// # Returns:
  /// ```&ASTNodeKind```
  pub fn get(&self, idx: &ASTNodeIdx) -> &ASTNodeKind {
    &self.arena[idx.0]
  }

  /// Attaches a node to the root node.
  ///
  /// # Arguments
  ///
  /// * `child`: The node to be attached to the root node.
  pub fn attach_to_root(&mut self, child: ASTNodeIdx) {
    match &mut self.arena[0] {
      ASTNodeKind::Root(children) => children.push(child),
      _ => unreachable!("Node zero should be the root node."),
    }
  }
}

/// The closed set of AST node kinds. The emitter dispatches on this
/// enum exhaustively, so adding a kind is a compile-time obligation.
#[derive(Debug, PartialEq)]
pub enum ASTNodeKind {
  Root(Vec<ASTNodeIdx>),

  AllArguments,
  Array(Vec<ASTNodeIdx>),
  Assignment(ASTAssignmentNode),
  BinaryExpr(ASTBinaryExprNode),
  Break,
  Checksum(ASTChecksumNode),
  Comma,
  Comment(String),
  Empty,
  Float(String),
  IfStatement(ASTIfStmtNode),
  Integer(String),
  Invocation(ASTInvocationNode),
  LocalReference(ASTNodeIdx),
  LogicalNot(ASTNodeIdx),
  NameTableEntry(ASTNameTableEntryNode),
  NewLine,
  Pair(ASTPairNode),
  Random(ASTRandomNode),
  Return(ASTNodeIdx),
  Script(ASTScriptNode),
  StringLiteral(String),
  Struct(Vec<ASTNodeIdx>),
  UnaryExpression(ASTNodeIdx),
  Vector(ASTVectorNode),
  WhileLoop(Vec<ASTNodeIdx>),
}

/// An AST Checksum (symbol name) Node. Raw checksums come from `#`-prefixed
/// hex literals and keep their source spelling in `name`.
#[derive(Debug, PartialEq)]
pub struct ASTChecksumNode {
  pub name: String,
  pub is_raw: bool,
}

/// An AST Assignment Node
#[derive(Debug, PartialEq)]
pub struct ASTAssignmentNode {
  pub name: ASTNodeIdx,
  pub value: ASTNodeIdx,
}

/// An AST Binary Expression Node
#[derive(Debug, PartialEq)]
pub struct ASTBinaryExprNode {
  pub left: ASTNodeIdx,
  pub right: ASTNodeIdx,
  pub kind: BinaryExprKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u8)]
pub enum BinaryExprKind {
  Add,           // +
  Div,           // /
  Dot,           // .
  Equals,        // ==
  GreaterThan,   // >
  GreaterThanEQ, // >=
  LessThan,      // <
  LessThanEQ,    // <=
  LogicAND,      // and
  LogicOR,       // or
  Mult,          // *
  Subtract,      // -
}

impl BinaryExprKind {
  /// Tries to create a Binary Operator from a TokenKind.
  ///
  /// # Arguments
  ///
  /// * `tk`: The TokenKind to be converted.
  ///
  /// # Returns:
  /// ```Option<BinaryExprKind>```
  pub fn try_from_token(tk: &TokenKind) -> Option<BinaryExprKind> {
    match tk {
      TokenKind::AND_KW => Some(BinaryExprKind::LogicAND),
      TokenKind::DASH => Some(BinaryExprKind::Subtract),
      TokenKind::GREATER_THAN => Some(BinaryExprKind::GreaterThan),
      TokenKind::GREATER_THAN_EQ => Some(BinaryExprKind::GreaterThanEQ),
      TokenKind::LESS_THAN => Some(BinaryExprKind::LessThan),
      TokenKind::LESS_THAN_EQ => Some(BinaryExprKind::LessThanEQ),
      TokenKind::LOGIC_EQ => Some(BinaryExprKind::Equals),
      TokenKind::OR_KW => Some(BinaryExprKind::LogicOR),
      TokenKind::PLUS => Some(BinaryExprKind::Add),
      TokenKind::SLASH => Some(BinaryExprKind::Div),
      TokenKind::STAR => Some(BinaryExprKind::Mult),
      _ => None,
    }
  }
}

/// An AST Pair Node. Both children are Float nodes.
#[derive(Debug, PartialEq)]
pub struct ASTPairNode {
  pub a: ASTNodeIdx,
  pub b: ASTNodeIdx,
}

/// An AST Vector Node. All three children are Float nodes.
#[derive(Debug, PartialEq)]
pub struct ASTVectorNode {
  pub a: ASTNodeIdx,
  pub b: ASTNodeIdx,
  pub c: ASTNodeIdx,
}

/// An AST Script Declaration Node
#[derive(Debug, PartialEq)]
pub struct ASTScriptNode {
  pub name: ASTNodeIdx,
  pub default_params: Vec<ASTNodeIdx>,
  pub body: Vec<ASTNodeIdx>,
}

/// An AST Script Invocation Node
#[derive(Debug, PartialEq)]
pub struct ASTInvocationNode {
  pub target: ASTNodeIdx,
  pub params: Vec<ASTNodeIdx>,
}

/// An AST If-ElseIf-Else Statement Node.
///
/// `bodies` runs parallel to `conditions`; a trailing body without a
/// matching condition is the `else` branch.
#[derive(Debug, PartialEq)]
pub struct ASTIfStmtNode {
  pub conditions: Vec<ASTNodeIdx>,
  pub bodies: Vec<Vec<ASTNodeIdx>>,
}

/// An AST Random-Branch Statement Node.
///
/// `branch_weights` runs parallel to `branches` and holds Integer nodes.
#[derive(Debug, PartialEq)]
pub struct ASTRandomNode {
  pub branches: Vec<Vec<ASTNodeIdx>>,
  pub branch_weights: Vec<ASTNodeIdx>,
}

/// A reverse name-table record recovered from a QB stream (decompile only).
#[derive(Debug, PartialEq)]
pub struct ASTNameTableEntryNode {
  pub checksum: [u8; 4],
  pub name: String,
}
