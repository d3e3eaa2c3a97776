//! Register-transfer code generator for PIC18-class microcontrollers.
//!
//! The crate lowers an explicit operation tree ([`Expr`]) to machine words for
//! an accumulator architecture with banked 8-bit data memory, then serializes
//! the words to Intel HEX. The pipeline:
//!
//! - [`expr`] — operation trees built from literals, variables, arithmetic and
//!   comparison nodes.
//! - [`alloc`] — data-memory allocation and accumulator custody ([`Place`]).
//! - [`pic18`] — the instruction encoder, hardware register table, and the
//!   lowering passes (expressions, conditions, structured control flow).
//! - [`code`] — the ordered word buffer with per-word debug origins.
//! - [`hex`] — Intel HEX serialization of the final word stream.
//!
//! Entry point is [`Program`]: create one, declare variables, compile
//! assignments and control constructs, then call [`Program::finish`] and feed
//! the words to [`gen_hex`].

pub mod alloc;
pub mod code;
pub mod expr;
pub mod hex;
pub mod pic18;

pub use alloc::Place;
pub use code::{CodeBuffer, Origin, Word};
pub use expr::{BinOp, CmpOp, Expr};
pub use hex::gen_hex;
pub use pic18::instructions::{Designator, Dir, Instr};
pub use pic18::{CondCode, Program};

use thiserror::Error;

/// Errors reachable from well-formed API usage.
///
/// Violations of internal invariants (freeing an address that is not
/// allocated, closing a scope with outstanding temporaries, locking an
/// already-owned accumulator) are bugs in the caller's bookkeeping and
/// panic instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("literal {0} out of range (-128..=255)")]
    LiteralRange(i32),

    #[error("value {value:#x} does not fit in a {bits}-bit instruction field")]
    FieldOverflow { value: i32, bits: u32 },

    #[error("data memory pool exhausted")]
    PoolExhausted,

    #[error("{construct} body of {length} words exceeds the branch range")]
    BranchRange { construct: &'static str, length: usize },

    #[error("comparison used where a value is required")]
    ConditionAsValue,

    #[error("condition must be a comparison")]
    NotAComparison,

    #[error("comparison of two constants has no runtime condition")]
    ConstantCondition,

    #[error("close_block called with no open block")]
    NoOpenBlock,

    #[error("{0} block(s) still open at finish")]
    UnclosedBlocks(usize),
}
