use hashbrown::HashMap;
use nscore::errors::DecompileError;

pub mod tokenizer;

mod render;

use render::Renderer;
use tokenizer::{Token, TokenKind, Tokenizer};

/// Decompiles a QB byte stream into NS source text.
///
/// Two passes over the token stream: the first scrapes the trailing name
/// table so checksums resolve back to their names; the second renders the
/// tokens as source.
pub fn decompile(bytes: &[u8]) -> Result<String, DecompileError> {
  let mut names: HashMap<u32, String> = HashMap::new();

  for token in Tokenizer::new(bytes) {
    match token.kind {
      TokenKind::ChecksumTableEntry => {
        let checksum =
          u32::from_le_bytes([token.chunk[1], token.chunk[2], token.chunk[3], token.chunk[4]]);
        let name = String::from_utf8_lossy(&token.chunk[5..token.chunk.len() - 1]).into_owned();
        names.insert(checksum, name);
      }
      TokenKind::Invalid => return Err(classify_failure(&token)),
      _ => {}
    }
  }

  let tokens: Vec<Token> = Tokenizer::new(bytes).collect();
  Ok(Renderer::render(&tokens, &names))
}

/// Splits an `Invalid` token into its two failure modes: a known multi-byte
/// opcode cut short by the end of the stream, or a byte nothing starts with.
fn classify_failure(token: &Token) -> DecompileError {
  let byte = token.chunk[0];

  if tokenizer::is_multibyte_prefix(byte) {
    DecompileError::TruncatedToken { offset: token.offset }
  } else {
    DecompileError::InvalidByteStream {
      offset: token.offset,
      byte,
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::decompile;
  use nscompiler::compile;
  use nscore::errors::DecompileError;

  /// Compiles a source, decompiles the bytes, and checks that the rendered
  /// text compiles back to the identical byte stream.
  fn assert_stable(source: &str) {
    let bytes = compile(source).expect("source should compile");
    let text = decompile(&bytes).expect("bytes should decompile");
    let recompiled = compile(&text)
      .unwrap_or_else(|e| panic!("decompiled text failed to recompile: {}\n---\n{}", e, text));

    assert_eq!(bytes, recompiled, "unstable round trip via:\n{}", text);
  }

  #[test]
  fn assignments_round_trip() {
    assert_stable("x = 1");
    assert_stable("x = 1\ny = 2.5\nz = \"hi\"\n");
    assert_stable("a.b = 5");
    assert_stable("x = $y");
    assert_stable("x = -3");
  }

  #[test]
  fn expressions_round_trip() {
    assert_stable("x = (a + b)");
    assert_stable("x = ((a + b) * c)");
    assert_stable("x = (a == b)");
    assert_stable("x = (a)");
    assert_stable("x = a and b");
    assert_stable("x = !y");
    assert_stable("p = (1.0, 2.0)\nv = (1.0, 2.0, 3.0)");
    assert_stable("y = [1, 2]\ns = { a = 1 }");
  }

  #[test]
  fn branches_round_trip() {
    assert_stable("if (a > 0) {\nb = 1\n}");
    assert_stable("if (a) {\nb = 1\n} else {\nc = 2\n}");
    assert_stable("if (a) {\nx = 1\n} elseif (b) {\ny = 1\n} else {\nz = 1\n}");
  }

  #[test]
  fn random_blocks_round_trip() {
    assert_stable("random(50 : x = 1; 50 : x = 2)");
    assert_stable("random(10 : a = 1; 20 : b = 2; 70 : c = 3)");
    assert_stable("random(50 : x = 1; y = 2; 50 : z = 3)\nafter = 1");
  }

  #[test]
  fn while_loops_round_trip_and_fold() {
    let source = "while {\nx = 1\nbreak\n}";
    assert_stable(source);

    let bytes = compile(source).expect("source should compile");
    let text = decompile(&bytes).expect("bytes should decompile");
    assert!(text.starts_with("while {"), "got:\n{}", text);
    assert!(!text.contains("__COMPILER__"), "sentinel leaked into:\n{}", text);
  }

  #[test]
  fn scripts_round_trip() {
    assert_stable("script foo {\nx = 1\n}");
    assert_stable("script foo a = 1 {\nbar x = 2 <...>\nreturn done = 1\n}\nfoo\n");
  }

  #[test]
  fn a_whole_program_round_trips() {
    assert_stable(concat!(
      "script hello name = \"world\" {\n",
      "print text = \"hi\"\n",
      "if ($count > 5) {\n",
      "x = (1.0, 2.0)\n",
      "} else {\n",
      "y = [1, 2]\n",
      "}\n",
      "random(10 : a = 1; 90 : b = 2)\n",
      "while {\n",
      "break\n",
      "}\n",
      "return done = 1\n",
      "}\n",
      "hello\n",
    ));
  }

  #[test]
  fn rendering_indents_nested_blocks() {
    let bytes = compile("script foo {\nx = 1\n}").expect("source should compile");
    let text = decompile(&bytes).expect("bytes should decompile");
    assert_eq!(text, "script foo {\n    x = 1\n}");
  }

  #[test]
  fn unknown_checksums_render_as_raw_hex() {
    let bytes = compile("#deadbeef = 1").expect("source should compile");
    let text = decompile(&bytes).expect("bytes should decompile");
    assert_eq!(text, "#deadbeef = 1");
    assert_stable("#deadbeef = 1");
  }

  #[test]
  fn empty_streams_render_empty() {
    assert_eq!(decompile(&[0x00]).expect("terminator should decompile"), "");
  }

  #[test]
  fn unknown_bytes_fail_with_their_offset() {
    assert_eq!(
      decompile(&[0x01, 0x02]),
      Err(DecompileError::InvalidByteStream { offset: 1, byte: 0x02 })
    );
  }

  #[test]
  fn truncated_payloads_fail_as_truncated() {
    assert_eq!(
      decompile(&[0x16, 0x01]),
      Err(DecompileError::TruncatedToken { offset: 0 })
    );
    assert_eq!(
      decompile(&[0x2B, 0x01, 0x02]),
      Err(DecompileError::TruncatedToken { offset: 0 })
    );
  }
}
