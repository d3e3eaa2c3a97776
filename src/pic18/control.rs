//! Structured control-flow lowering and the compilation context.
//!
//! [`Program`] is the explicit context threading the place arena, the scope
//! stack and the word buffers through compilation. Each open block owns a
//! child allocator (addresses return to the scope that allocated them) and a
//! child word buffer, so a block body is measured before its branch is
//! chosen:
//!
//! - `if`: body length ≤ 0x7f words → one converse conditional branch over
//!   it; ≤ 0x3ff → a status-bit skip over an unconditional `BRA`; longer
//!   bodies are an error.
//! - `while`: the condition is compiled into the parent and its start
//!   recorded; thresholds shrink by one (0x7e / 0x3fe) for the extra word of
//!   the closing backward `BRA`, which must reach at most 0x400 words back.

use tracing::trace;

use crate::alloc::{Allocator, Place, Places};
use crate::code::{CodeBuffer, Word};
use crate::expr::Expr;
use crate::pic18::alu::CondCode;
use crate::pic18::instructions::{BitOp, Designator, ImmOp, Instr};
use crate::pic18::registers::{status, STATUS};
use crate::CompileError;

impl CondCode {
    /// Conditional branch taken when this condition holds.
    pub(crate) fn branch(self) -> ImmOp {
        match self {
            CondCode::Zero => ImmOp::Bz,
            CondCode::NotZero => ImmOp::Bnz,
            CondCode::Carry => ImmOp::Bc,
            CondCode::NotCarry => ImmOp::Bnc,
            CondCode::Overflow => ImmOp::Bov,
            CondCode::NotOverflow => ImmOp::Bnov,
            CondCode::Negative => ImmOp::Bn,
            CondCode::NotNegative => ImmOp::Bnn,
        }
    }

    /// Skip instruction that jumps over the next word when this condition
    /// holds, for branches beyond the conditional range.
    pub(crate) fn skip(self) -> BitOp {
        match self {
            CondCode::Zero
            | CondCode::Carry
            | CondCode::Overflow
            | CondCode::Negative => BitOp::Btfss,
            CondCode::NotZero
            | CondCode::NotCarry
            | CondCode::NotOverflow
            | CondCode::NotNegative => BitOp::Btfsc,
        }
    }

    /// STATUS bit tested by [`CondCode::skip`].
    pub(crate) fn status_bit(self) -> u8 {
        match self {
            CondCode::Zero | CondCode::NotZero => status::Z,
            CondCode::Carry | CondCode::NotCarry => status::C,
            CondCode::Overflow | CondCode::NotOverflow => status::OV,
            CondCode::Negative | CondCode::NotNegative => status::N,
        }
    }
}

// ============================================================================
// Scope frames
// ============================================================================

#[derive(Debug)]
pub(crate) enum BlockKind {
    Root,
    Plain,
    If {
        cond: CondCode,
    },
    While {
        cond: CondCode,
        /// Parent buffer length at the first word of the condition.
        start: usize,
    },
}

#[derive(Debug)]
pub(crate) struct Frame {
    pub alloc: Allocator,
    pub buf: CodeBuffer,
    /// Variables declared in this scope, freed when it closes.
    pub vars: Vec<Place>,
    pub kind: BlockKind,
}

// ============================================================================
// Program
// ============================================================================

/// The compilation context: place arena, scope stack, word buffers.
///
/// Declare variables with [`Program::var`], compile statements with
/// [`Program::assign`] and the control constructs, then [`Program::finish`]
/// to obtain the word stream.
#[derive(Debug)]
pub struct Program {
    pub(crate) places: Places,
    pub(crate) frames: Vec<Frame>,
    /// The place whose value currently owns the accumulator, if any.
    /// Program-wide: a temporary may outlive the scope it was made in.
    pub(crate) acc: Option<Place>,
}

impl Default for Program {
    fn default() -> Self {
        Program::new()
    }
}

impl Program {
    pub fn new() -> Self {
        Program {
            places: Places::default(),
            frames: vec![Frame {
                alloc: Allocator::root(),
                buf: CodeBuffer::new(),
                vars: Vec::new(),
                kind: BlockKind::Root,
            }],
            acc: None,
        }
    }

    pub(crate) fn cur(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack never empty")
    }

    /// Append an instruction to the innermost open block.
    pub fn emit(&mut self, instr: Instr) -> Result<(), CompileError> {
        self.cur().buf.emit(&instr)
    }

    // ── Declarations ────────────────────────────────────────────────────

    /// Allocate a scoped variable. Its address is freed when the enclosing
    /// block closes.
    pub fn var(&mut self) -> Result<Place, CompileError> {
        let d = self.cur().alloc.alloc()?;
        let p = self.places.addressed(d, true);
        self.cur().vars.push(p);
        Ok(p)
    }

    /// Allocate a scoped variable and assign it an initial value.
    pub fn var_init(&mut self, init: impl Into<Expr>) -> Result<Place, CompileError> {
        let p = self.var()?;
        self.assign(p, init)?;
        Ok(p)
    }

    /// Wrap a hardware register as a pinned place. Never freed.
    pub fn reg(&mut self, d: Designator) -> Place {
        self.places.addressed(d, true)
    }

    /// Free addresses left in the innermost scope's pool.
    pub fn available_addresses(&mut self) -> usize {
        self.cur().alloc.available_len()
    }

    // ── Blocks ──────────────────────────────────────────────────────────

    /// Open a plain scope: variables declared inside are freed at close,
    /// code is spliced into the parent unchanged.
    pub fn enter_block(&mut self) {
        trace!("enter block");
        self.push_frame(BlockKind::Plain);
    }

    /// Open a conditional block. The condition is compiled here, into the
    /// enclosing block; the branch over the body is chosen at close, once
    /// the body's length is known.
    pub fn enter_if(&mut self, cond: impl Into<Expr>) -> Result<(), CompileError> {
        let cond = self.compile_condition(cond)?;
        trace!(?cond, "enter if");
        self.push_frame(BlockKind::If { cond });
        Ok(())
    }

    /// Open a loop. The condition is compiled into the enclosing block and
    /// its start position recorded for the backward branch at close.
    pub fn enter_while(&mut self, cond: impl Into<Expr>) -> Result<(), CompileError> {
        let start = self.cur().buf.len();
        let cond = self.compile_condition(cond)?;
        trace!(?cond, start, "enter while");
        self.push_frame(BlockKind::While { cond, start });
        Ok(())
    }

    fn push_frame(&mut self, kind: BlockKind) {
        let alloc = self.cur().alloc.child();
        self.frames.push(Frame { alloc, buf: CodeBuffer::new(), vars: Vec::new(), kind });
    }

    /// Close the innermost block: free its variables, choose the branch
    /// form from the measured body length, splice the body into the parent.
    pub fn close_block(&mut self) -> Result<(), CompileError> {
        if self.frames.len() < 2 {
            return Err(CompileError::NoOpenBlock);
        }
        let mut frame = self.frames.pop().expect("checked above");
        for v in frame.vars.drain(..) {
            let data = self.places.get_mut(v);
            let d = data.address.take().expect("scoped variables are addressed");
            data.freed = true;
            frame.alloc.free(d);
        }
        frame.alloc.close();

        let body = frame.buf;
        let length = body.len();
        trace!(length, kind = ?frame.kind, "close block");
        let parent = self.frames.last_mut().expect("root frame below any block");
        match frame.kind {
            BlockKind::Root => unreachable!("root frame is never popped here"),
            BlockKind::Plain => parent.buf.append(body),
            BlockKind::If { cond } => {
                if length <= 0x7f {
                    parent.buf.emit(&Instr::Imm(cond.converse().branch(), length as i32))?;
                } else if length <= 0x3ff {
                    parent.buf.emit(&Instr::Bit(cond.skip(), cond.status_bit(), STATUS))?;
                    parent.buf.emit(&Instr::Imm(ImmOp::Bra, length as i32))?;
                } else {
                    return Err(CompileError::BranchRange { construct: "if", length });
                }
                parent.buf.append(body);
            }
            BlockKind::While { cond, start } => {
                // one extra word to hop: the closing backward branch
                if length <= 0x7e {
                    parent
                        .buf
                        .emit(&Instr::Imm(cond.converse().branch(), length as i32 + 1))?;
                } else if length <= 0x3fe {
                    parent.buf.emit(&Instr::Bit(cond.skip(), cond.status_bit(), STATUS))?;
                    parent.buf.emit(&Instr::Imm(ImmOp::Bra, length as i32 + 1))?;
                } else {
                    return Err(CompileError::BranchRange { construct: "while", length });
                }
                parent.buf.append(body);
                let jump = start as i64 - parent.buf.len() as i64 - 1;
                if jump < -0x400 {
                    return Err(CompileError::BranchRange {
                        construct: "while",
                        length: (-jump) as usize,
                    });
                }
                parent.buf.emit(&Instr::Imm(ImmOp::Bra, jump as i32))?;
            }
        }
        Ok(())
    }

    /// Discard the innermost block after a compilation error, leaving the
    /// context usable. Emits nothing.
    fn abandon_block(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        let frame = self.frames.pop().expect("checked above");
        for v in frame.vars {
            self.places.get_mut(v).freed = true;
        }
    }

    // ── Closure conveniences ────────────────────────────────────────────

    pub fn block(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), CompileError>,
    ) -> Result<(), CompileError> {
        self.enter_block();
        self.run_block(body)
    }

    pub fn if_(
        &mut self,
        cond: impl Into<Expr>,
        body: impl FnOnce(&mut Self) -> Result<(), CompileError>,
    ) -> Result<(), CompileError> {
        self.enter_if(cond)?;
        self.run_block(body)
    }

    pub fn while_(
        &mut self,
        cond: impl Into<Expr>,
        body: impl FnOnce(&mut Self) -> Result<(), CompileError>,
    ) -> Result<(), CompileError> {
        self.enter_while(cond)?;
        self.run_block(body)
    }

    /// Counting loop: `counter = init; while counter < limit { body; counter += 1 }`.
    pub fn for_(
        &mut self,
        counter: Place,
        init: impl Into<Expr>,
        limit: impl Into<Expr>,
        body: impl FnOnce(&mut Self) -> Result<(), CompileError>,
    ) -> Result<(), CompileError> {
        self.assign(counter, init)?;
        self.while_(counter.lt(limit), |p| {
            body(p)?;
            p.assign(counter, counter.plus(1))
        })
    }

    fn run_block(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), CompileError>,
    ) -> Result<(), CompileError> {
        match body(self) {
            Ok(()) => self.close_block(),
            Err(e) => {
                self.abandon_block();
                Err(e)
            }
        }
    }

    // ── Completion ──────────────────────────────────────────────────────

    /// Close the program and return its word stream. All blocks must be
    /// closed and all temporaries released.
    pub fn finish(mut self) -> Result<Vec<Word>, CompileError> {
        if self.frames.len() != 1 {
            return Err(CompileError::UnclosedBlocks(self.frames.len() - 1));
        }
        assert!(self.acc.is_none(), "a temporary still owns the accumulator at finish");
        let mut frame = self.frames.pop().expect("root frame");
        for v in frame.vars.drain(..) {
            let data = self.places.get_mut(v);
            let d = data.address.take().expect("scoped variables are addressed");
            data.freed = true;
            frame.alloc.free(d);
        }
        frame.alloc.close();
        trace!(words = frame.buf.len(), "finish");
        Ok(frame.buf.into_words())
    }
}
