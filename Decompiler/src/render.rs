use hashbrown::HashMap;
use nscore::bytecode::INFINITE_LOOP_BYPASSER;

use crate::tokenizer::{Token, TokenKind};

const INDENT: &str = "    ";

/// One active `random` block: its branch weights and, once the first
/// long-jump reveals it, the byte offset where the whole block ends.
struct RandomScope {
  weights: Vec<u16>,
  next_branch: usize,
  end: Option<usize>,
}

/// Renders a classified token stream back into NS source text. Nesting depth
/// comes from the structural opcodes; names resolve through the scraped
/// name table.
pub(crate) struct Renderer<'a> {
  tokens: &'a [Token<'a>],
  pos: usize,
  names: &'a HashMap<u32, String>,
  out: String,
  indent: usize,
  needs_indent: bool,
  /// A block header (script/if/else/while) is waiting for its opening brace,
  /// which renders at the body's first line break.
  pending_open: bool,
  expr_depth: usize,
  struct_depth: usize,
  randoms: Vec<RandomScope>,
}

impl<'a> Renderer<'a> {
  pub(crate) fn render(tokens: &'a [Token<'a>], names: &'a HashMap<u32, String>) -> String {
    let mut renderer = Renderer {
      tokens,
      pos: 0,
      names,
      out: String::new(),
      indent: 0,
      needs_indent: false,
      pending_open: false,
      expr_depth: 0,
      struct_depth: 0,
      randoms: vec![],
    };

    renderer.render_all();
    renderer.out
  }

  fn render_all(&mut self) {
    while self.pos < self.tokens.len() {
      let token = self.tokens[self.pos];
      self.close_finished_randoms(token.offset);
      self.render_token(token);
      self.pos += 1;
    }

    // A single-branch random carries no long-jump, so its end is only ever
    // the end of the stream.
    while self.randoms.pop().is_some() {
      self.out.push(')');
    }
  }

  fn render_token(&mut self, token: Token<'a>) {
    match token.kind {
      TokenKind::EndOfFile | TokenKind::ChecksumTableEntry | TokenKind::Invalid => {}

      TokenKind::EndOfLine => {
        if self.pending_open {
          self.open_block();
        } else if self.inline() {
          self.write("; ");
        } else {
          self.newline();
        }
      }

      // Assignment and equality share one byte; position decides.
      TokenKind::Assignment => {
        if self.expr_depth > 0 {
          self.write(" == ");
        } else {
          self.write(" = ");
        }
      }
      TokenKind::EqualityCheck => self.write(" == "),
      TokenKind::Dot => self.write("."),
      TokenKind::Comma => self.write(", "),
      TokenKind::Addition => self.write(" + "),
      TokenKind::Subtraction => self.write(" - "),
      TokenKind::Multiplication => self.write(" * "),
      TokenKind::Division => self.write(" / "),
      TokenKind::GreaterThanCheck => self.write(" > "),
      TokenKind::LessThanCheck => self.write(" < "),
      TokenKind::GreaterThanOrEqualCheck => self.write(" >= "),
      TokenKind::LessThanOrEqualCheck => self.write(" <= "),
      TokenKind::And => self.write(" and "),
      TokenKind::Or => self.write(" or "),
      TokenKind::Not => {
        self.word_break();
        self.write("!");
      }

      TokenKind::StartOfExpression => {
        self.word_break();
        self.write("(");
        self.expr_depth += 1;
      }
      TokenKind::EndOfExpression => {
        self.write(")");
        self.expr_depth = self.expr_depth.saturating_sub(1);
      }

      TokenKind::StartOfStruct => {
        self.word_break();
        self.write("{");
        self.struct_depth += 1;
      }
      TokenKind::EndOfStruct => {
        self.word_break();
        self.write("}");
        self.struct_depth = self.struct_depth.saturating_sub(1);
      }
      TokenKind::StartOfArray => {
        self.word_break();
        self.write("[");
      }
      TokenKind::EndOfArray => self.write("]"),

      TokenKind::LocalReference => {
        self.word_break();
        self.write("$");
      }
      TokenKind::AllArguments => {
        self.word_break();
        self.write("<...>");
      }
      TokenKind::Break => {
        self.word_break();
        self.write("break");
      }
      TokenKind::Return => {
        self.word_break();
        self.write("return");
      }

      TokenKind::Integer => {
        self.word_break();
        let value = i32::from_le_bytes([token.chunk[1], token.chunk[2], token.chunk[3], token.chunk[4]]);
        let text = value.to_string();
        self.write(&text);
      }
      TokenKind::Float => {
        self.word_break();
        let value = f32::from_le_bytes([token.chunk[1], token.chunk[2], token.chunk[3], token.chunk[4]]);
        let text = format_float(value);
        self.write(&text);
      }
      TokenKind::Pair => {
        self.word_break();
        let a = f32::from_le_bytes([token.chunk[1], token.chunk[2], token.chunk[3], token.chunk[4]]);
        let b = f32::from_le_bytes([token.chunk[5], token.chunk[6], token.chunk[7], token.chunk[8]]);
        let text = format!("({}, {})", format_float(a), format_float(b));
        self.write(&text);
      }
      TokenKind::Vector => {
        self.word_break();
        let a = f32::from_le_bytes([token.chunk[1], token.chunk[2], token.chunk[3], token.chunk[4]]);
        let b = f32::from_le_bytes([token.chunk[5], token.chunk[6], token.chunk[7], token.chunk[8]]);
        let c = f32::from_le_bytes([token.chunk[9], token.chunk[10], token.chunk[11], token.chunk[12]]);
        let text = format!("({}, {}, {})", format_float(a), format_float(b), format_float(c));
        self.write(&text);
      }
      TokenKind::StringLit => {
        self.word_break();
        let inner = &token.chunk[5..token.chunk.len() - 1];
        let text = format!("\"{}\"", String::from_utf8_lossy(inner));
        self.write(&text);
      }

      TokenKind::Name => self.render_name(token),

      TokenKind::StartOfScript => {
        self.word_break();
        self.write("script");
        self.pending_open = true;
      }
      TokenKind::EndOfScript => self.close_block(),
      TokenKind::If => {
        self.word_break();
        self.write("if");
        self.pending_open = true;
      }
      TokenKind::Else => {
        self.close_block();
        self.write(" else");
        self.pending_open = true;
      }
      TokenKind::EndOfIf => self.close_block(),
      TokenKind::StartOfLoop => {
        self.word_break();
        self.write("while");
        self.pending_open = true;
      }
      TokenKind::EndOfLoop => self.close_block(),

      TokenKind::RandomBranch => self.begin_random(token),
      TokenKind::LongJump => self.next_random_branch(token),
    }
  }

  /// Resolves a checksum through the name table, falling back to the raw
  /// `#`-spelling when the table has no entry for it.
  fn render_name(&mut self, token: Token<'a>) {
    let checksum = u32::from_le_bytes([token.chunk[1], token.chunk[2], token.chunk[3], token.chunk[4]]);

    match self.names.get(&checksum) {
      Some(name) => {
        if name == INFINITE_LOOP_BYPASSER && self.try_fold_while() {
          return;
        }
        self.word_break();
        self.write(name);
      }
      None => {
        self.word_break();
        let text = format!("#{:08x}", checksum);
        self.write(&text);
      }
    }
  }

  /// Recognizes the emitter's while-loop lowering and folds it back into a
  /// `while` header: the sentinel assignment and the synthesized guard
  /// disappear, and the loop body renders as the block.
  fn try_fold_while(&mut self) -> bool {
    use TokenKind::*;

    let kinds: Vec<TokenKind> = self.tokens[self.pos..].iter().take(6).map(|t| t.kind).collect();
    if kinds != [Name, Assignment, Integer, EndOfLine, StartOfLoop, If] {
      return false;
    }

    self.word_break();
    self.write("while");
    self.pending_open = true;

    // Skip to the guard and drop it through its matching end marker.
    let mut index = self.pos + 5;
    let mut depth = 0usize;
    while index < self.tokens.len() {
      match self.tokens[index].kind {
        If => depth += 1,
        EndOfIf => {
          depth -= 1;
          if depth == 0 {
            break;
          }
        }
        _ => {}
      }
      index += 1;
    }

    // The main loop advances one past the guard terminator.
    self.pos = index;
    true
  }

  fn begin_random(&mut self, token: Token<'a>) {
    let chunk = token.chunk;
    let count = u32::from_le_bytes([chunk[1], chunk[2], chunk[3], chunk[4]]) as usize;

    let mut weights = Vec::with_capacity(count);
    for i in 0..count {
      let at = 5 + 2 * i;
      weights.push(u16::from_le_bytes([chunk[at], chunk[at + 1]]));
    }

    self.word_break();
    let first = weights.first().copied().unwrap_or(0);
    let text = format!("random({} : ", first);
    self.write(&text);

    self.randoms.push(RandomScope {
      weights,
      next_branch: 1,
      end: None,
    });
  }

  /// A long-jump separates two random branches, so it renders the next
  /// branch's `; weight :` header. Its target is the end of the block.
  fn next_random_branch(&mut self, token: Token<'a>) {
    let jump = u32::from_le_bytes([token.chunk[1], token.chunk[2], token.chunk[3], token.chunk[4]]);
    let target = token.offset + 5 + jump as usize;

    let header = match self.randoms.last_mut() {
      Some(scope) => {
        if scope.end.is_none() {
          scope.end = Some(target);
        }
        let weight = scope.weights.get(scope.next_branch).copied().unwrap_or(0);
        scope.next_branch += 1;
        Some(format!("; {} : ", weight))
      }
      None => None,
    };

    if let Some(header) = header {
      self.write(&header);
    }
  }

  fn close_finished_randoms(&mut self, offset: usize) {
    while let Some(scope) = self.randoms.last() {
      if scope.end == Some(offset) {
        self.randoms.pop();
        self.write(")");
      } else {
        break;
      }
    }
  }

  /// True while rendering inside a `random` branch or a structure literal,
  /// where line breaks render inline as `"; "`.
  fn inline(&self) -> bool {
    !self.randoms.is_empty() || self.struct_depth > 0
  }

  fn write(&mut self, text: &str) {
    if self.needs_indent {
      for _ in 0..self.indent {
        self.out.push_str(INDENT);
      }
      self.needs_indent = false;
    }
    self.out.push_str(text);
  }

  /// Separates two adjacent words or values with a space.
  fn word_break(&mut self) {
    if self.needs_indent {
      return;
    }

    match self.out.chars().last() {
      None => {}
      Some(' ' | '\n' | '(' | '[' | '$' | '!' | '.') => {}
      Some(_) => self.out.push(' '),
    }
  }

  fn newline(&mut self) {
    self.out.push('\n');
    self.needs_indent = true;
  }

  /// Opens a pending block at its first line break.
  fn open_block(&mut self) {
    self.pending_open = false;
    self.write(" {");

    if !self.inline() {
      self.newline();
      self.indent += 1;
    }
  }

  /// Closes the innermost block.
  fn close_block(&mut self) {
    if self.pending_open {
      // A body that never produced a line break still needs its brace.
      self.pending_open = false;
      self.write(" {");
    }

    if self.inline() {
      self.word_break();
      self.write("}");
      return;
    }

    if !self.needs_indent {
      self.newline();
    }
    self.indent = self.indent.saturating_sub(1);
    self.write("}");
  }
}

/// Formats an f32 so it reads back as an NS float literal.
fn format_float(value: f32) -> String {
  if !value.is_finite() {
    return format!("{:?}", value);
  }

  let text = format!("{:?}", value);
  if text.contains('.') && !text.contains('e') && !text.contains('E') {
    text
  } else {
    format!("{:.1}", value)
  }
}
