use num_derive::FromPrimitive;

/// The name the emitter assigns to the synthetic guard local of a `while`
/// loop. Downstream analyzers treat this exact spelling as a sentinel, so it
/// must never change.
pub const INFINITE_LOOP_BYPASSER: &str = "__COMPILER__infinite_loop_bypasser";

/// The set of opcodes in the QB byte stream.
///
/// **NOTE:** The numeric values are fixed by the consuming game runtimes and
/// must never be renumbered. All multi-byte payloads are little-endian.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum OpCode {
  // Opcodes with no payload.
  EndOfFile = 0x00,
  NewLine = 0x01,
  StartOfStruct = 0x03,
  EndOfStruct = 0x04,
  StartOfArray = 0x05,
  EndOfArray = 0x06,
  // Also doubles as the `==` operator inside a 0x0E/0x0F wrapper.
  Assignment = 0x07,
  Dot = 0x08,
  Comma = 0x09,
  Subtract = 0x0A,
  Add = 0x0B,
  Divide = 0x0C,
  Multiply = 0x0D,
  StartOfExpression = 0x0E,
  EndOfExpression = 0x0F,
  EqualityCheck = 0x11,
  LessThan = 0x12,
  LessThanEqual = 0x13,
  GreaterThan = 0x14,
  GreaterThanEqual = 0x15,
  StartOfLoop = 0x20,
  EndOfLoop = 0x21,
  Break = 0x22,
  StartOfScript = 0x23,
  EndOfScript = 0x24,
  EndOfIf = 0x28,
  Return = 0x29,
  AllArguments = 0x2C,
  LocalReference = 0x2D,
  Or = 0x32,
  And = 0x33,
  Not = 0x39,

  // Opcodes with a fixed-size payload.
  Name = 0x16,           // u32 checksum
  Integer = 0x17,        // i32
  Float = 0x1A,          // f32
  Vector = 0x1E,         // 3 x f32
  Pair = 0x1F,           // 2 x f32
  LongJump = 0x2E,       // u32 forward offset
  If = 0x47,             // u16 branch size
  Else = 0x48,           // u16 branch size

  // Opcodes with a variable-size payload.
  String = 0x1B,         // u32 length (including NUL), bytes, NUL
  NameTableEntry = 0x2B, // u32 checksum, NUL-terminated name
  RandomBranch = 0x2F,   // u32 n, n x u16 weights, n x u32 offsets
}

impl OpCode {
  /// Classifies a raw byte as an opcode, if it is one.
  pub fn from_byte(byte: u8) -> Option<OpCode> {
    num_traits::FromPrimitive::from_u8(byte)
  }
}

#[cfg(test)]
mod tests {
  use super::OpCode;

  #[test]
  fn opcode_values_round_trip_through_bytes() {
    let samples = [
      OpCode::EndOfFile,
      OpCode::Assignment,
      OpCode::Name,
      OpCode::NameTableEntry,
      OpCode::RandomBranch,
      OpCode::If,
      OpCode::Else,
    ];

    for op in samples {
      assert_eq!(OpCode::from_byte(op as u8), Some(op));
    }
  }

  #[test]
  fn unknown_bytes_do_not_classify() {
    assert_eq!(OpCode::from_byte(0x02), None);
    assert_eq!(OpCode::from_byte(0x10), None);
    assert_eq!(OpCode::from_byte(0xFF), None);
  }
}
