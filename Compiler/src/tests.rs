use nscore::ast::ASTNodeKind::*;
use nscore::ast::*;
use nscore::checksum::name_checksum;
use nscore::errors::CompileError;

use crate::{compile, Emitter};

fn crc(name: &str) -> [u8; 4] {
  name_checksum(name).to_le_bytes()
}

fn table_entry(name: &str) -> Vec<u8> {
  let mut bytes = vec![0x2B];
  bytes.extend_from_slice(&crc(name));
  bytes.extend_from_slice(name.as_bytes());
  bytes.push(0x00);
  bytes
}

fn count_subslice(haystack: &[u8], needle: &[u8]) -> usize {
  haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

#[test]
fn empty_program_is_a_single_terminator() {
  assert_eq!(compile("").unwrap(), vec![0x00]);
}

#[test]
fn assignment_emits_name_value_and_table_entry() {
  let bytes = compile("x = 1").unwrap();

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("x"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x01, 0x00, 0x00, 0x00]);
  expected.extend(table_entry("x"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn if_size_spans_opcode_to_terminator() {
  let bytes = compile("if (a > 0) {\nb = 1\n}").unwrap();

  let mut expected = vec![0x47, 29, 0x00];
  expected.push(0x0E);
  expected.push(0x16);
  expected.extend_from_slice(&crc("a"));
  expected.push(0x14);
  expected.extend_from_slice(&[0x17, 0x00, 0x00, 0x00, 0x00]);
  expected.push(0x0F);
  expected.push(0x01);
  expected.push(0x16);
  expected.extend_from_slice(&crc("b"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x01, 0x00, 0x00, 0x00]);
  expected.push(0x01);
  expected.push(0x28);
  expected.extend(table_entry("a"));
  expected.extend(table_entry("b"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn else_arm_adds_two_to_the_if_size() {
  let bytes = compile("if (a) {\nb = 1\n} else {\nc = 2\n}").unwrap();

  let mut expected = vec![0x47, 25, 0x00];
  expected.push(0x0E);
  expected.push(0x16);
  expected.extend_from_slice(&crc("a"));
  expected.push(0x0F);
  expected.push(0x01);
  expected.push(0x16);
  expected.extend_from_slice(&crc("b"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x01, 0x00, 0x00, 0x00]);
  expected.push(0x01);
  expected.extend_from_slice(&[0x48, 16, 0x00]);
  expected.push(0x01);
  expected.push(0x16);
  expected.extend_from_slice(&crc("c"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x02, 0x00, 0x00, 0x00]);
  expected.push(0x01);
  expected.push(0x28);
  expected.extend(table_entry("a"));
  expected.extend(table_entry("b"));
  expected.extend(table_entry("c"));
  expected.push(0x00);

  assert_eq!(bytes, expected);

  // The 0x47 size points at the 0x48, plus two; the 0x48 size reaches the
  // closing 0x28.
  assert_eq!(bytes[23], 0x48);
  assert_eq!(u16::from_le_bytes([bytes[1], bytes[2]]), 23 + 2);
  assert_eq!(u16::from_le_bytes([bytes[24], bytes[25]]), 39 - 23);
  assert_eq!(bytes[39], 0x28);
}

#[test]
fn elseif_lowers_to_a_nested_else_arm() {
  let sugar = compile("if (a) {\nx = 1\n} elseif (b) {\ny = 1\n}").unwrap();
  let nested = compile("if (a) {\nx = 1\n} else {\nif (b) {\ny = 1\n}\n}").unwrap();

  assert_eq!(sugar, nested);
}

#[test]
fn random_offsets_and_long_jumps_point_forward() {
  let bytes = compile("random(50 : x = 1; 50 : x = 2)").unwrap();

  let mut expected = vec![0x2F, 0x02, 0x00, 0x00, 0x00];
  expected.extend_from_slice(&[0x32, 0x00, 0x32, 0x00]);
  expected.extend_from_slice(&[0x04, 0x00, 0x00, 0x00]); // one slot left, no prior branch
  expected.extend_from_slice(&[0x10, 0x00, 0x00, 0x00]); // branch 0 spans 16 bytes
  expected.push(0x16);
  expected.extend_from_slice(&crc("x"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x01, 0x00, 0x00, 0x00]);
  expected.extend_from_slice(&[0x2E, 0x0B, 0x00, 0x00, 0x00]);
  expected.push(0x16);
  expected.extend_from_slice(&crc("x"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x02, 0x00, 0x00, 0x00]);
  expected.extend(table_entry("x"));
  expected.push(0x00);

  assert_eq!(bytes, expected);

  // Slot 0 ends at offset 13 and reads 4, skipping slot 1 to land on branch
  // 0 at offset 17. The long-jump at 28 reads 11, landing on the first byte
  // after branch 1 (offset 44).
  assert_eq!(u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]), 4);
  assert_eq!(bytes[28], 0x2E);
  let jump = u32::from_le_bytes([bytes[29], bytes[30], bytes[31], bytes[32]]) as usize;
  assert_eq!(28 + 5 + jump, 44);
  assert_eq!(bytes[44], 0x2B);
}

#[test]
fn while_lowers_to_a_guarded_loop() {
  let bytes = compile("while {\nx = 1\n}").unwrap();
  let byp = "__COMPILER__infinite_loop_bypasser";

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc(byp));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x00, 0x00, 0x00, 0x00]);
  expected.extend_from_slice(&[0x01, 0x20]);
  expected.extend_from_slice(&[0x47, 0x14, 0x00]);
  expected.extend_from_slice(&[0x0E, 0x2D, 0x16]);
  expected.extend_from_slice(&crc(byp));
  expected.push(0x14);
  expected.extend_from_slice(&[0x17, 0x00, 0x00, 0x00, 0x00]);
  expected.push(0x0F);
  expected.extend_from_slice(&[0x01, 0x22, 0x01]);
  expected.push(0x28);
  expected.push(0x01);
  expected.push(0x16);
  expected.extend_from_slice(&crc("x"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x01, 0x00, 0x00, 0x00]);
  expected.push(0x01);
  expected.push(0x21);
  expected.extend(table_entry(byp));
  expected.extend(table_entry("x"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn strings_carry_their_length_and_terminator() {
  let bytes = compile("s = \"hi\"").unwrap();

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("s"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x1B, 0x03, 0x00, 0x00, 0x00]);
  expected.extend_from_slice(b"hi");
  expected.push(0x00);
  expected.extend(table_entry("s"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn pairs_pack_two_bare_floats() {
  let bytes = compile("p = (1.0, 2.5)").unwrap();

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("p"));
  expected.push(0x07);
  expected.push(0x1F);
  expected.extend_from_slice(&1.0f32.to_le_bytes());
  expected.extend_from_slice(&2.5f32.to_le_bytes());
  expected.extend(table_entry("p"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn vectors_pack_three_bare_floats() {
  let bytes = compile("v = (1.0, 2.0, 3.0)").unwrap();

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("v"));
  expected.push(0x07);
  expected.push(0x1E);
  expected.extend_from_slice(&1.0f32.to_le_bytes());
  expected.extend_from_slice(&2.0f32.to_le_bytes());
  expected.extend_from_slice(&3.0f32.to_le_bytes());
  expected.extend(table_entry("v"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn wrapped_operators_carry_the_expression_markers() {
  let bytes = compile("x = (a + b)").unwrap();

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("x"));
  expected.push(0x07);
  expected.push(0x0E);
  expected.push(0x16);
  expected.extend_from_slice(&crc("a"));
  expected.push(0x0B);
  expected.push(0x16);
  expected.extend_from_slice(&crc("b"));
  expected.push(0x0F);
  expected.extend(table_entry("x"));
  expected.extend(table_entry("a"));
  expected.extend(table_entry("b"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn logic_and_member_operators_encode_bare() {
  // `and`, `or`, and `.` carry no 0x0E/0x0F wrapper of their own.
  let bytes = compile("a.b = (x and y)").unwrap();

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("a"));
  expected.push(0x08);
  expected.push(0x16);
  expected.extend_from_slice(&crc("b"));
  expected.push(0x07);
  expected.push(0x0E);
  expected.push(0x16);
  expected.extend_from_slice(&crc("x"));
  expected.push(0x33);
  expected.push(0x16);
  expected.extend_from_slice(&crc("y"));
  expected.push(0x0F);
  expected.extend(table_entry("a"));
  expected.extend(table_entry("b"));
  expected.extend(table_entry("x"));
  expected.extend(table_entry("y"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn relaxed_comparisons_emit_their_reserved_bytes() {
  for (source, operator) in [("if (a <= b) {\n}", 0x13u8), ("if (a >= b) {\n}", 0x15u8)] {
    let bytes = compile(source).unwrap();

    let mut expected = vec![0x47, 17, 0x00];
    expected.push(0x0E);
    expected.push(0x16);
    expected.extend_from_slice(&crc("a"));
    expected.push(operator);
    expected.push(0x16);
    expected.extend_from_slice(&crc("b"));
    expected.push(0x0F);
    expected.push(0x01);
    expected.push(0x28);
    expected.extend(table_entry("a"));
    expected.extend(table_entry("b"));
    expected.push(0x00);

    assert_eq!(bytes, expected);
  }
}

#[test]
fn raw_checksums_stay_out_of_the_name_table() {
  let bytes = compile("#deadbeef = 1").unwrap();

  // 0xDEADBEEF is above i32::MAX and must still parse.
  let expected = vec![
    0x16, 0xEF, 0xBE, 0xAD, 0xDE, 0x07, 0x17, 0x01, 0x00, 0x00, 0x00, 0x00,
  ];
  assert_eq!(bytes, expected);
}

#[test]
fn names_appear_exactly_once_in_the_table() {
  let bytes = compile("x = 1\nx = 2\ny = $x").unwrap();

  assert_eq!(count_subslice(&bytes, &table_entry("x")), 1);
  assert_eq!(count_subslice(&bytes, &table_entry("y")), 1);
}

#[test]
fn script_wraps_name_defaults_and_body() {
  let bytes = compile("script foo a = 1 {\nbar x = 2 <...>\n}").unwrap();

  let mut expected = vec![0x23];
  expected.push(0x16);
  expected.extend_from_slice(&crc("foo"));
  expected.push(0x16);
  expected.extend_from_slice(&crc("a"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x01, 0x00, 0x00, 0x00]);
  expected.push(0x01);
  expected.push(0x16);
  expected.extend_from_slice(&crc("bar"));
  expected.push(0x16);
  expected.extend_from_slice(&crc("x"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x02, 0x00, 0x00, 0x00]);
  expected.push(0x2C);
  expected.push(0x01);
  expected.push(0x24);
  expected.extend(table_entry("foo"));
  expected.extend(table_entry("a"));
  expected.extend(table_entry("bar"));
  expected.extend(table_entry("x"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn return_emits_only_its_arguments() {
  let bytes = compile("return x = 5").unwrap();

  let mut expected = vec![0x29];
  expected.push(0x16);
  expected.extend_from_slice(&crc("x"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x05, 0x00, 0x00, 0x00]);
  expected.extend(table_entry("x"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn arrays_and_structs_wrap_their_elements() {
  let bytes = compile("y = [1, 2]").unwrap();

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("y"));
  expected.push(0x07);
  expected.push(0x05);
  expected.extend_from_slice(&[0x17, 0x01, 0x00, 0x00, 0x00]);
  expected.push(0x09);
  expected.extend_from_slice(&[0x17, 0x02, 0x00, 0x00, 0x00]);
  expected.push(0x06);
  expected.extend(table_entry("y"));
  expected.push(0x00);
  assert_eq!(bytes, expected);

  let bytes = compile("s = { a = 1 }").unwrap();
  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("s"));
  expected.push(0x07);
  expected.push(0x03);
  expected.push(0x16);
  expected.extend_from_slice(&crc("a"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x17, 0x01, 0x00, 0x00, 0x00]);
  expected.push(0x04);
  expected.extend(table_entry("s"));
  expected.extend(table_entry("a"));
  expected.push(0x00);
  assert_eq!(bytes, expected);
}

#[test]
fn local_references_and_negation_prefix_their_operand() {
  let bytes = compile("x = $y\nz = !w").unwrap();

  let mut expected = vec![0x16];
  expected.extend_from_slice(&crc("x"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x2D, 0x16]);
  expected.extend_from_slice(&crc("y"));
  expected.push(0x01);
  expected.push(0x16);
  expected.extend_from_slice(&crc("z"));
  expected.push(0x07);
  expected.extend_from_slice(&[0x39, 0x16]);
  expected.extend_from_slice(&crc("w"));
  expected.extend(table_entry("x"));
  expected.extend(table_entry("y"));
  expected.extend(table_entry("z"));
  expected.extend(table_entry("w"));
  expected.push(0x00);

  assert_eq!(bytes, expected);
}

#[test]
fn oversized_if_branches_are_rejected() {
  let source = format!("if (a) {{\ns = \"{}\"\n}}", "x".repeat(70_000));
  match compile(&source) {
    Err(CompileError::Overflow { .. }) => {}
    other => panic!("expected an overflow error, got {:?}", other.map(|b| b.len())),
  }
}

#[test]
fn malformed_assignment_targets_are_rejected() {
  let mut ast = ASTArena::default();
  let name = ast.push(Integer("1".to_string()));
  let value = ast.push(Integer("2".to_string()));
  let assignment = ast.push(Assignment(ASTAssignmentNode { name, value }));
  ast.attach_to_root(assignment);

  match Emitter::emit(&ast) {
    Err(CompileError::InvalidAst { path, .. }) => assert!(path.contains("Assignment")),
    other => panic!("expected an invalid-AST error, got {:?}", other.map(|b| b.len())),
  }
}

#[test]
fn lopsided_if_statements_are_rejected() {
  let mut ast = ASTArena::default();
  let cond = ast.push(Checksum(ASTChecksumNode {
    name: "a".to_string(),
    is_raw: false,
  }));
  let stmt = ast.push(IfStatement(ASTIfStmtNode {
    conditions: vec![cond],
    bodies: vec![],
  }));
  ast.attach_to_root(stmt);

  assert!(matches!(
    Emitter::emit(&ast),
    Err(CompileError::InvalidAst { .. })
  ));
}

#[test]
fn syntax_errors_surface_with_positions() {
  match compile("x = ") {
    Err(CompileError::Parse(reports)) => {
      assert!(!reports.is_empty());
      assert_eq!(reports[0].line, 1);
    }
    other => panic!("expected a parse error, got {:?}", other.map(|b| b.len())),
  }
}
