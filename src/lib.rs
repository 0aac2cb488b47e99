//! A very small Lua subset: a lexer, a single-pass compiler to 32-bit
//! register-machine instructions, and a VM that runs them.
//!
//! ```
//! use minilua::interpreter::Interpreter;
//!
//! let chunk = Interpreter::new("print \"hello world\"").compile().unwrap();
//! assert_eq!(chunk.code.len(), 3);
//! ```

pub mod compiler;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod vm;
