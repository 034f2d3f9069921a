pub mod ast;
pub mod bytecode;
pub mod checksum;
pub mod chunk;
pub mod errors;
pub mod tokens;

/// The current version of the translator.
pub const VERSION: &str = "0.1.0";
