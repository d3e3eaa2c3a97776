//! Expression and condition lowering.
//!
//! The accumulator is the only ALU port, so lowering is a custody problem as
//! much as an instruction-selection problem. The rules:
//!
//! - Operands resolve left before right. A nested left operand is computed
//!   into allocated memory (and becomes the preferred result address); a
//!   nested right operand is computed into the accumulator.
//! - Byte operations write back to the addressed file when it is also the
//!   result address (direction bit F), saving the copy-out; otherwise the
//!   result lands in the accumulator and is copied only if needed.
//! - A literal operand is normalized onto the left: commutative operators
//!   swap freely, `x - k` is restated as `(-k) + x`, and comparisons swap
//!   through the converse-operator table.
//! - Comparisons compile to a subtraction that sets STATUS, summarized as a
//!   [`CondCode`]; `>` and `<=` negate the accumulator first since only the
//!   sign and zero flags are directly testable both ways.

use tracing::trace;

use crate::alloc::Place;
use crate::expr::{BinOp, CmpOp, Expr};
use crate::pic18::control::Program;
use crate::pic18::instructions::{BitOp, ByteDirOp, ByteOp, Designator, Dir, ImmOp, Instr};
use crate::pic18::registers::{status, STATUS, WREG};
use crate::CompileError;

/// Hardware predicates testable after a STATUS-setting operation. Each code
/// at an even index pairs with its converse at the next odd one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondCode {
    Zero,
    NotZero,
    Carry,
    NotCarry,
    Overflow,
    NotOverflow,
    Negative,
    NotNegative,
}

impl CondCode {
    pub fn converse(self) -> Self {
        match self {
            CondCode::Zero => CondCode::NotZero,
            CondCode::NotZero => CondCode::Zero,
            CondCode::Carry => CondCode::NotCarry,
            CondCode::NotCarry => CondCode::Carry,
            CondCode::Overflow => CondCode::NotOverflow,
            CondCode::NotOverflow => CondCode::Overflow,
            CondCode::Negative => CondCode::NotNegative,
            CondCode::NotNegative => CondCode::Negative,
        }
    }
}

// ── Instruction selection tables ────────────────────────────────────────

/// Byte operation when the accumulator holds the left operand.
/// SUBFWB computes `f - W - !C`, hence the carry preset at its use site.
fn acc_file_op(op: BinOp) -> ByteDirOp {
    match op {
        BinOp::Add => ByteDirOp::Addwf,
        BinOp::Sub => ByteDirOp::Subfwb,
        BinOp::And => ByteDirOp::Andwf,
        BinOp::Or => ByteDirOp::Iorwf,
        BinOp::Xor => ByteDirOp::Xorwf,
    }
}

/// Byte operation when the accumulator holds the right operand.
fn file_acc_op(op: BinOp) -> ByteDirOp {
    match op {
        BinOp::Add => ByteDirOp::Addwf,
        BinOp::Sub => ByteDirOp::Subwf,
        BinOp::And => ByteDirOp::Andwf,
        BinOp::Or => ByteDirOp::Iorwf,
        BinOp::Xor => ByteDirOp::Xorwf,
    }
}

/// Immediate operation with the literal as the left operand.
/// SUBLW computes `k - W`.
fn lit_op(op: BinOp) -> ImmOp {
    match op {
        BinOp::Add => ImmOp::Addlw,
        BinOp::Sub => ImmOp::Sublw,
        BinOp::And => ImmOp::Andlw,
        BinOp::Or => ImmOp::Iorlw,
        BinOp::Xor => ImmOp::Xorlw,
    }
}

/// Literals live in one byte but are accepted signed or unsigned.
fn check_literal(v: i32) -> Result<i32, CompileError> {
    if !(-128..=255).contains(&v) {
        return Err(CompileError::LiteralRange(v));
    }
    Ok(v & 0xff)
}

fn fold(op: BinOp, a: i32, b: i32) -> i32 {
    let v = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::And => a & b,
        BinOp::Or => a | b,
        BinOp::Xor => a ^ b,
    };
    v & 0xff
}

/// Where a computed value must end up.
#[derive(Debug, Clone, Copy)]
enum Dest {
    /// Anywhere durable; reuses a nested left operand's address when one
    /// exists, otherwise allocates.
    Auto,
    /// The accumulator, as a fresh temporary.
    Acc,
    /// A specific existing place.
    Fixed(Place),
}

/// A resolved operand: either a literal or a place holding a value.
#[derive(Debug, Clone, Copy)]
enum Operand {
    Lit(i32),
    Pl(Place),
}

fn leaf_operand(e: &Expr) -> Operand {
    match e {
        Expr::Lit(v) => Operand::Lit(*v),
        Expr::Var(p) => Operand::Pl(*p),
        Expr::Bin(..) | Expr::Cmp(..) => unreachable!("leaf expected"),
    }
}

impl Program {
    // ── Place queries and lifecycle ─────────────────────────────────────

    /// Current storage of a place. Accumulator-resident temporaries report
    /// WREG; a temporary that never received a value reports `None`.
    pub fn address_of(&self, p: Place) -> Option<Designator> {
        self.places.get(p).address
    }

    /// Whether this place's value currently owns the accumulator.
    pub fn is_acc_resident(&self, p: Place) -> bool {
        self.acc == Some(p)
    }

    /// Protect a place from being consumed as an operand.
    pub fn pin(&mut self, p: Place) {
        self.places.get_mut(p).is_pinned = true;
    }

    pub fn unpin(&mut self, p: Place) {
        self.places.get_mut(p).is_pinned = false;
    }

    /// Release a place's storage. Temporaries give up the accumulator;
    /// addressed intermediates return to the innermost scope's pool.
    pub fn free(&mut self, p: Place) {
        assert!(!self.places.get(p).is_pinned, "cannot free a pinned place");
        if self.places.get(p).is_temp {
            if self.acc == Some(p) {
                self.acc = None;
            }
            self.places.get_mut(p).freed = true;
        } else {
            let data = self.places.get_mut(p);
            let d = data.address.take().expect("addressed place");
            data.freed = true;
            let frame = self.cur();
            frame.vars.retain(|&v| v != p);
            frame.alloc.free(d);
        }
    }

    fn free_if_unpinned(&mut self, p: Place) {
        if !self.places.get(p).is_pinned {
            self.free(p);
        }
    }

    // ── Accumulator custody ─────────────────────────────────────────────

    fn lock_accumulator(&mut self, p: Place) {
        assert!(self.acc.is_none(), "accumulator already owned");
        self.acc = Some(p);
        self.places.get_mut(p).address = Some(WREG);
    }

    /// Record that the value just produced belongs to `p`. Temporaries take
    /// accumulator custody.
    fn receive_value(&mut self, p: Place) {
        self.places.get_mut(p).has_value = true;
        if self.places.get(p).is_temp && self.acc != Some(p) {
            self.lock_accumulator(p);
        }
    }

    /// Move the accumulator owner out into allocated memory.
    fn park(&mut self, p: Place) -> Result<(), CompileError> {
        assert_eq!(self.acc, Some(p), "park of a place not owning the accumulator");
        let d = self.cur().alloc.alloc()?;
        trace!(%d, "park accumulator");
        self.emit(Instr::Byte(ByteOp::Movwf, d))?;
        let data = self.places.get_mut(p);
        data.address = Some(d);
        data.is_temp = false;
        self.acc = None;
        Ok(())
    }

    /// Free the accumulator for a new value, spilling any current owner.
    fn evict_accumulator(&mut self) -> Result<(), CompileError> {
        if let Some(owner) = self.acc {
            self.park(owner)?;
        }
        Ok(())
    }

    /// Load a place's value into the accumulator without taking custody.
    /// No code if it is already resident.
    fn copy_to_accumulator(&mut self, p: Place) -> Result<(), CompileError> {
        if self.acc == Some(p) {
            return Ok(());
        }
        self.evict_accumulator()?;
        let d = self.places.get(p).address.expect("operand has storage");
        if d != WREG {
            self.emit(Instr::ByteDir(ByteDirOp::Movf, d, Dir::W))?;
        }
        Ok(())
    }

    /// Register-to-register copy, choosing the cheapest encoding.
    fn copy_regs(&mut self, target: Designator, src: Designator) -> Result<(), CompileError> {
        if target == src {
            Ok(())
        } else if target == WREG {
            self.emit(Instr::ByteDir(ByteDirOp::Movf, src, Dir::W))
        } else if src == WREG {
            self.emit(Instr::Byte(ByteOp::Movwf, target))
        } else {
            self.emit(Instr::Move { src: src.absolute(), dst: target.absolute() })
        }
    }

    // ── Statements ──────────────────────────────────────────────────────

    /// Compile `target = expr`.
    pub fn assign(&mut self, target: Place, expr: impl Into<Expr>) -> Result<(), CompileError> {
        self.lower_into(Dest::Fixed(target), &expr.into())?;
        Ok(())
    }

    /// Compile an expression for its value. Variables pass through without
    /// code; literals land in an accumulator temporary; arithmetic lands in
    /// allocated memory (or reuses an operand's address). The returned place
    /// is owned by the caller: [`Program::free`] it when done.
    pub fn compile_expr(&mut self, expr: impl Into<Expr>) -> Result<Place, CompileError> {
        match expr.into() {
            Expr::Var(p) => Ok(p),
            Expr::Lit(v) => {
                let t = self.places.temp();
                self.copy_literal(t, v)?;
                Ok(t)
            }
            Expr::Bin(op, l, r) => self.lower_binary(Dest::Auto, op, &l, &r),
            Expr::Cmp(..) => Err(CompileError::ConditionAsValue),
        }
    }

    /// Compile a comparison, leaving STATUS set and returning the condition
    /// code under which it holds.
    pub fn compile_condition(&mut self, cond: impl Into<Expr>) -> Result<CondCode, CompileError> {
        match cond.into() {
            Expr::Cmp(op, lhs, rhs) => self.lower_compare(op, &lhs, &rhs),
            _ => Err(CompileError::NotAComparison),
        }
    }

    pub fn set_bit(&mut self, p: Place, bit: u8) -> Result<(), CompileError> {
        self.bit_instr(BitOp::Bsf, p, bit)
    }

    pub fn clear_bit(&mut self, p: Place, bit: u8) -> Result<(), CompileError> {
        self.bit_instr(BitOp::Bcf, p, bit)
    }

    pub fn toggle_bit(&mut self, p: Place, bit: u8) -> Result<(), CompileError> {
        self.bit_instr(BitOp::Btg, p, bit)
    }

    fn bit_instr(&mut self, op: BitOp, p: Place, bit: u8) -> Result<(), CompileError> {
        // bit instructions address memory, so a resident temporary must land first
        if self.acc == Some(p) {
            self.park(p)?;
        }
        let d = self.places.get(p).address.expect("place has storage");
        self.emit(Instr::Bit(op, bit, d))
    }

    // ── Expression lowering ─────────────────────────────────────────────

    fn lower_into(&mut self, dest: Dest, expr: &Expr) -> Result<Place, CompileError> {
        match expr {
            Expr::Lit(v) => {
                let p = match dest {
                    Dest::Fixed(t) => t,
                    Dest::Acc | Dest::Auto => self.places.temp(),
                };
                self.copy_literal(p, *v)?;
                Ok(p)
            }
            Expr::Var(p) => match dest {
                Dest::Auto => Ok(*p),
                Dest::Acc => {
                    if self.acc == Some(*p) {
                        return Ok(*p);
                    }
                    let t = self.places.temp();
                    self.copy_to_accumulator(*p)?;
                    self.receive_value(t);
                    Ok(t)
                }
                Dest::Fixed(t) => {
                    self.copy_place(t, *p)?;
                    Ok(t)
                }
            },
            Expr::Bin(op, l, r) => self.lower_binary(dest, *op, l, r),
            Expr::Cmp(..) => Err(CompileError::ConditionAsValue),
        }
    }

    fn copy_literal(&mut self, p: Place, v: i32) -> Result<(), CompileError> {
        let v = check_literal(v)?;
        if self.acc != Some(p) {
            self.evict_accumulator()?;
        }
        self.emit(Instr::Imm(ImmOp::Movlw, v))?;
        let addr = self.places.get(p).address;
        if let Some(d) = addr {
            self.copy_regs(d, WREG)?;
        }
        self.receive_value(p);
        Ok(())
    }

    fn copy_place(&mut self, target: Place, src: Place) -> Result<(), CompileError> {
        if target == src {
            return Ok(());
        }
        debug_assert!(self.places.get(src).has_value, "copy from a place with no value");
        if self.places.get(target).is_temp {
            if self.acc == Some(target) {
                self.acc = None;
            }
            if self.acc == Some(src) {
                // the value stays put; custody moves
                self.acc = None;
                let data = self.places.get_mut(src);
                data.has_value = false;
                data.address = None;
            } else {
                self.copy_to_accumulator(src)?;
            }
            self.receive_value(target);
            return Ok(());
        }
        let td = self.places.get(target).address.expect("addressed place");
        if self.acc == Some(src) {
            self.copy_regs(td, WREG)?;
        } else {
            let sd = self.places.get(src).address.expect("source has storage");
            self.copy_regs(td, sd)?;
        }
        self.places.get_mut(target).has_value = true;
        Ok(())
    }

    /// Resolve both operands of a binary or comparison node, left first.
    /// Returns the operands plus the nested-left result place, if any, which
    /// becomes the preferred result address.
    fn resolve_operands(
        &mut self,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(Operand, Operand, Option<Place>), CompileError> {
        let mut reused = None;
        let l;
        let r;
        if rhs.is_node() {
            l = if lhs.is_node() {
                let p = self.lower_into(Dest::Auto, lhs)?;
                reused = Some(p);
                Operand::Pl(p)
            } else {
                leaf_operand(lhs)
            };
            r = Operand::Pl(self.lower_into(Dest::Acc, rhs)?);
        } else {
            l = if lhs.is_node() {
                Operand::Pl(self.lower_into(Dest::Acc, lhs)?)
            } else {
                leaf_operand(lhs)
            };
            r = leaf_operand(rhs);
        }
        // a pinned temporary must survive its use as an operand
        for opnd in [l, r] {
            if let Operand::Pl(p) = opnd {
                if self.acc == Some(p) && self.places.get(p).is_pinned {
                    self.park(p)?;
                }
            }
        }
        Ok((l, r, reused))
    }

    fn lower_binary(
        &mut self,
        dest: Dest,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<Place, CompileError> {
        let (l, r, reused) = self.resolve_operands(lhs, rhs)?;

        let res = match dest {
            Dest::Fixed(t) => t,
            Dest::Acc => self.places.temp(),
            Dest::Auto => match reused {
                Some(p) => p,
                None => {
                    let d = self.cur().alloc.alloc()?;
                    self.places.addressed(d, false)
                }
            },
        };

        match (l, r) {
            (Operand::Lit(a), Operand::Lit(b)) => {
                let a = check_literal(a)?;
                let b = check_literal(b)?;
                self.copy_literal(res, fold(op, a, b))?;
                return Ok(res);
            }
            (Operand::Pl(a), Operand::Pl(b)) => self.binary_reg(res, op, a, b)?,
            (Operand::Lit(k), Operand::Pl(b)) => self.binary_literal(res, op, k, b)?,
            (Operand::Pl(a), Operand::Lit(k)) => {
                if op.is_commutative() {
                    self.binary_literal(res, op, k, a)?;
                } else {
                    // x - k  ==  (-k) + x
                    self.binary_literal(res, BinOp::Add, -k, a)?;
                }
            }
        }

        for opnd in [l, r] {
            if let Operand::Pl(p) = opnd {
                if p != res {
                    self.free_if_unpinned(p);
                }
            }
        }
        self.receive_value(res);
        Ok(res)
    }

    /// Both operands hold values. Picks the operation by which side owns the
    /// accumulator (loading the right operand when neither does) and writes
    /// straight to the source file when it is also the result address.
    fn binary_reg(&mut self, res: Place, op: BinOp, a: Place, b: Place) -> Result<(), CompileError> {
        let (src, acc_holds_lhs) = if self.acc == Some(a) {
            (b, true)
        } else if self.acc == Some(b) {
            (a, false)
        } else {
            self.copy_to_accumulator(b)?;
            (a, false)
        };
        let src_d = self.places.get(src).address.expect("operand has storage");
        let dir = if self.places.get(res).address == Some(src_d) {
            Dir::F
        } else {
            Dir::W
        };
        if acc_holds_lhs && op == BinOp::Sub {
            // SUBFWB borrows through !C
            self.emit(Instr::Bit(BitOp::Bsf, status::C, STATUS))?;
        }
        let file_op = if acc_holds_lhs { acc_file_op(op) } else { file_acc_op(op) };
        self.emit(Instr::ByteDir(file_op, src_d, dir))?;
        if dir == Dir::W {
            let res_d = self.places.get(res).address;
            if let Some(rd) = res_d {
                self.copy_regs(rd, WREG)?;
            }
        }
        Ok(())
    }

    /// Literal (left) against a place (right), through the accumulator.
    fn binary_literal(
        &mut self,
        res: Place,
        op: BinOp,
        lit: i32,
        b: Place,
    ) -> Result<(), CompileError> {
        let lit = check_literal(lit)?;
        self.copy_to_accumulator(b)?;
        self.emit(Instr::Imm(lit_op(op), lit))?;
        let res_d = self.places.get(res).address;
        if let Some(rd) = res_d {
            self.copy_regs(rd, WREG)?;
        }
        Ok(())
    }

    // ── Condition lowering ──────────────────────────────────────────────

    fn lower_compare(
        &mut self,
        op: CmpOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<CondCode, CompileError> {
        let (l, r, _) = self.resolve_operands(lhs, rhs)?;
        let cc = match (l, r) {
            (Operand::Lit(_), Operand::Lit(_)) => return Err(CompileError::ConstantCondition),
            (Operand::Pl(a), Operand::Pl(b)) => {
                if self.acc == Some(a) {
                    self.compare_with_file(op, b)?
                } else if self.acc == Some(b) {
                    self.compare_with_file(op.flip(), a)?
                } else {
                    self.copy_to_accumulator(b)?;
                    self.compare_with_file(op.flip(), a)?
                }
            }
            (Operand::Lit(k), Operand::Pl(b)) => self.compare_with_literal(op, k, b)?,
            (Operand::Pl(a), Operand::Lit(k)) => self.compare_with_literal(op.flip(), k, a)?,
        };
        for opnd in [l, r] {
            if let Operand::Pl(p) = opnd {
                self.free_if_unpinned(p);
            }
        }
        Ok(cc)
    }

    /// The accumulator holds the left operand of `op`; subtracting the file
    /// computes `f - W`, so the condition flips.
    fn compare_with_file(&mut self, op: CmpOp, f: Place) -> Result<CondCode, CompileError> {
        let fd = self.places.get(f).address.expect("operand has storage");
        self.emit(Instr::ByteDir(ByteDirOp::Subwf, fd, Dir::W))?;
        self.map_condition(op.flip())
    }

    /// Literal as the left operand of `op`. SUBLW computes `k - W`, which is
    /// already the comparison's own orientation.
    fn compare_with_literal(
        &mut self,
        op: CmpOp,
        lit: i32,
        b: Place,
    ) -> Result<CondCode, CompileError> {
        let lit = check_literal(lit)?;
        self.copy_to_accumulator(b)?;
        self.emit(Instr::Imm(ImmOp::Sublw, lit))?;
        self.map_condition(op)
    }

    /// The accumulator holds `x`; return the code for `x op 0`. Only the
    /// zero and sign flags read both ways, so `>` and `<=` negate first.
    fn map_condition(&mut self, op: CmpOp) -> Result<CondCode, CompileError> {
        Ok(match op {
            CmpOp::Eq => CondCode::Zero,
            CmpOp::Ne => CondCode::NotZero,
            CmpOp::Lt => CondCode::Negative,
            CmpOp::Ge => CondCode::NotNegative,
            CmpOp::Gt => {
                self.emit(Instr::Byte(ByteOp::Negf, WREG))?;
                CondCode::Negative
            }
            CmpOp::Le => {
                self.emit(Instr::Byte(ByteOp::Negf, WREG))?;
                CondCode::NotNegative
            }
        })
    }
}
