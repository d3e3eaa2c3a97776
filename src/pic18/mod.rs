//! PIC18 backend: instruction encoding, the hardware register table, and the
//! lowering passes for expressions and structured control flow.

pub mod instructions;
pub mod registers;

mod alu;
mod control;

pub use alu::CondCode;
pub use control::Program;
