//! Bit-exact PIC18 instruction encoder.
//!
//! Every instruction assembles into one or two 16-bit words. This module
//! defines:
//! - [`Designator`] — an 8-bit data-memory address plus a bank-select flag,
//!   encoded as the low 9 bits of byte-oriented instructions.
//! - The operation enums, one per encoding class: [`SimpleOp`], [`ImmOp`],
//!   [`ByteOp`], [`ByteDirOp`], [`BitOp`], [`LongOp`].
//! - [`Instr`] — an instruction with operands, with [`Instr::encode`]
//!   producing the word(s) and checking every operand field width.
//!
//! Two-word instructions place `0xF` in the top nibble of the second word,
//! which the hardware executes as a NOP if jumped into.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::code::Origin;
use crate::CompileError;

/// Top nibble of the continuation word of two-word instructions.
const CONTINUATION: u16 = 0xf << 12;

// ============================================================================
// Designators
// ============================================================================

/// A data-memory operand: an 8-bit address and a bank-select flag.
///
/// With the flag clear the address selects the access bank (low RAM plus the
/// 0xF60..=0xFFF special-function registers); with it set the address is
/// offset by the bank-select register. Encodes to 9 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Designator {
    address: u8,
    banked: bool,
}

impl Designator {
    /// Access-bank designator (bank-select flag clear).
    pub const fn access(address: u8) -> Self {
        Designator { address, banked: false }
    }

    /// Banked designator (address interpreted relative to BSR).
    pub const fn banked(address: u8) -> Self {
        Designator { address, banked: true }
    }

    /// Access-bank designator for a special-function register given its
    /// absolute data-memory address.
    pub const fn sfr(absolute: u16) -> Self {
        assert!(absolute >= 0xf60 && absolute <= 0xfff);
        Designator::access((absolute & 0xff) as u8)
    }

    pub const fn address(self) -> u8 {
        self.address
    }

    pub const fn is_banked(self) -> bool {
        self.banked
    }

    /// The 9-bit operand field: bank flag in bit 8, address in bits 7..0.
    pub const fn encode(self) -> u16 {
        ((self.banked as u16) << 8) | self.address as u16
    }

    /// Inverse of [`Designator::encode`] for the low 9 bits of a word.
    pub const fn decode(bits: u16) -> Self {
        Designator {
            address: (bits & 0xff) as u8,
            banked: bits & 0x100 != 0,
        }
    }

    /// Absolute 12-bit data-memory address as used by MOVFF. Banked
    /// designators are resolved in bank 0; access-bank addresses at or above
    /// 0x60 refer to the special-function region.
    pub const fn absolute(self) -> u16 {
        if !self.banked && self.address >= 0x60 {
            0xf00 | self.address as u16
        } else {
            self.address as u16
        }
    }
}

impl fmt::Display for Designator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.banked {
            write!(f, "{:#04x} (BSR)", self.address)
        } else {
            write!(f, "{:#04x}", self.address)
        }
    }
}

// ============================================================================
// Operation enums, one per encoding class
// ============================================================================

/// Operand-free instructions occupying a full word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleOp {
    Nop,
    Sleep,
    ClrWdt,
    Push,
    Pop,
    Daw,
    Return,
    Retfie,
    Reset,
}

impl SimpleOp {
    const fn word(self) -> u16 {
        match self {
            SimpleOp::Nop => 0x0000,
            SimpleOp::Sleep => 0x0003,
            SimpleOp::ClrWdt => 0x0004,
            SimpleOp::Push => 0x0005,
            SimpleOp::Pop => 0x0006,
            SimpleOp::Daw => 0x0007,
            SimpleOp::Retfie => 0x0010,
            SimpleOp::Return => 0x0012,
            SimpleOp::Reset => 0x00ff,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            SimpleOp::Nop => "NOP",
            SimpleOp::Sleep => "SLEEP",
            SimpleOp::ClrWdt => "CLRWDT",
            SimpleOp::Push => "PUSH",
            SimpleOp::Pop => "POP",
            SimpleOp::Daw => "DAW",
            SimpleOp::Retfie => "RETFIE",
            SimpleOp::Return => "RETURN",
            SimpleOp::Reset => "RESET",
        }
    }
}

/// Instructions taking one signed immediate in the low bits of the word.
/// The argument width varies per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmOp {
    Movlb,
    Sublw,
    Iorlw,
    Xorlw,
    Andlw,
    Retlw,
    Mullw,
    Movlw,
    Addlw,
    Bra,
    Rcall,
    Bz,
    Bnz,
    Bc,
    Bnc,
    Bov,
    Bnov,
    Bn,
    Bnn,
}

impl ImmOp {
    /// Opcode value and argument field width.
    const fn layout(self) -> (u16, u32) {
        match self {
            ImmOp::Movlb => (0x010, 4),
            ImmOp::Sublw => (0x08, 8),
            ImmOp::Iorlw => (0x09, 8),
            ImmOp::Xorlw => (0x0a, 8),
            ImmOp::Andlw => (0x0b, 8),
            ImmOp::Retlw => (0x0c, 8),
            ImmOp::Mullw => (0x0d, 8),
            ImmOp::Movlw => (0x0e, 8),
            ImmOp::Addlw => (0x0f, 8),
            ImmOp::Bra => (0x1a, 11),
            ImmOp::Rcall => (0x1b, 11),
            ImmOp::Bz => (0xe0, 8),
            ImmOp::Bnz => (0xe1, 8),
            ImmOp::Bc => (0xe2, 8),
            ImmOp::Bnc => (0xe3, 8),
            ImmOp::Bov => (0xe4, 8),
            ImmOp::Bnov => (0xe5, 8),
            ImmOp::Bn => (0xe6, 8),
            ImmOp::Bnn => (0xe7, 8),
        }
    }

    pub const fn arg_bits(self) -> u32 {
        self.layout().1
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            ImmOp::Movlb => "MOVLB",
            ImmOp::Sublw => "SUBLW",
            ImmOp::Iorlw => "IORLW",
            ImmOp::Xorlw => "XORLW",
            ImmOp::Andlw => "ANDLW",
            ImmOp::Retlw => "RETLW",
            ImmOp::Mullw => "MULLW",
            ImmOp::Movlw => "MOVLW",
            ImmOp::Addlw => "ADDLW",
            ImmOp::Bra => "BRA",
            ImmOp::Rcall => "RCALL",
            ImmOp::Bz => "BZ",
            ImmOp::Bnz => "BNZ",
            ImmOp::Bc => "BC",
            ImmOp::Bnc => "BNC",
            ImmOp::Bov => "BOV",
            ImmOp::Bnov => "BNOV",
            ImmOp::Bn => "BN",
            ImmOp::Bnn => "BNN",
        }
    }
}

/// Byte-oriented instructions with a designator operand and no direction
/// bit (7-bit opcode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOp {
    Mulwf,
    Cpfslt,
    Cpfseq,
    Cpfsgt,
    Tstfsz,
    Setf,
    Clrf,
    Negf,
    Movwf,
}

impl ByteOp {
    const fn opcode(self) -> u16 {
        match self {
            ByteOp::Mulwf => 0x01,
            ByteOp::Cpfslt => 0x30,
            ByteOp::Cpfseq => 0x31,
            ByteOp::Cpfsgt => 0x32,
            ByteOp::Tstfsz => 0x33,
            ByteOp::Setf => 0x34,
            ByteOp::Clrf => 0x35,
            ByteOp::Negf => 0x36,
            ByteOp::Movwf => 0x37,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            ByteOp::Mulwf => "MULWF",
            ByteOp::Cpfslt => "CPFSLT",
            ByteOp::Cpfseq => "CPFSEQ",
            ByteOp::Cpfsgt => "CPFSGT",
            ByteOp::Tstfsz => "TSTFSZ",
            ByteOp::Setf => "SETF",
            ByteOp::Clrf => "CLRF",
            ByteOp::Negf => "NEGF",
            ByteOp::Movwf => "MOVWF",
        }
    }
}

/// Destination of a byte-oriented instruction with a direction bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    /// Result to the accumulator (direction bit clear).
    W,
    /// Result back to the addressed file (direction bit set).
    F,
}

impl Dir {
    const fn bit(self) -> u16 {
        match self {
            Dir::W => 0,
            Dir::F => 1,
        }
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Dir::W => "W",
            Dir::F => "F",
        }
    }
}

/// Byte-oriented instructions with a designator operand and a direction
/// bit (6-bit opcode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteDirOp {
    Decf,
    Iorwf,
    Andwf,
    Xorwf,
    Comf,
    Addwfc,
    Addwf,
    Incf,
    Decfsz,
    Rrcf,
    Rlcf,
    Swapf,
    Incfsz,
    Rrncf,
    Rlncf,
    Infsnz,
    Dcfsnz,
    Movf,
    Subfwb,
    Subwfb,
    Subwf,
}

impl ByteDirOp {
    const fn opcode(self) -> u16 {
        match self {
            ByteDirOp::Decf => 0x01,
            ByteDirOp::Iorwf => 0x04,
            ByteDirOp::Andwf => 0x05,
            ByteDirOp::Xorwf => 0x06,
            ByteDirOp::Comf => 0x07,
            ByteDirOp::Addwfc => 0x08,
            ByteDirOp::Addwf => 0x09,
            ByteDirOp::Incf => 0x0a,
            ByteDirOp::Decfsz => 0x0b,
            ByteDirOp::Rrcf => 0x0c,
            ByteDirOp::Rlcf => 0x0d,
            ByteDirOp::Swapf => 0x0e,
            ByteDirOp::Incfsz => 0x0f,
            ByteDirOp::Rrncf => 0x10,
            ByteDirOp::Rlncf => 0x11,
            ByteDirOp::Infsnz => 0x12,
            ByteDirOp::Dcfsnz => 0x13,
            ByteDirOp::Movf => 0x14,
            ByteDirOp::Subfwb => 0x15,
            ByteDirOp::Subwfb => 0x16,
            ByteDirOp::Subwf => 0x17,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            ByteDirOp::Decf => "DECF",
            ByteDirOp::Iorwf => "IORWF",
            ByteDirOp::Andwf => "ANDWF",
            ByteDirOp::Xorwf => "XORWF",
            ByteDirOp::Comf => "COMF",
            ByteDirOp::Addwfc => "ADDWFC",
            ByteDirOp::Addwf => "ADDWF",
            ByteDirOp::Incf => "INCF",
            ByteDirOp::Decfsz => "DECFSZ",
            ByteDirOp::Rrcf => "RRCF",
            ByteDirOp::Rlcf => "RLCF",
            ByteDirOp::Swapf => "SWAPF",
            ByteDirOp::Incfsz => "INCFSZ",
            ByteDirOp::Rrncf => "RRNCF",
            ByteDirOp::Rlncf => "RLNCF",
            ByteDirOp::Infsnz => "INFSNZ",
            ByteDirOp::Dcfsnz => "DCFSNZ",
            ByteDirOp::Movf => "MOVF",
            ByteDirOp::Subfwb => "SUBFWB",
            ByteDirOp::Subwfb => "SUBWFB",
            ByteDirOp::Subwf => "SUBWF",
        }
    }
}

/// Bit-oriented instructions: 4-bit opcode, 3-bit bit index, designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    Btg,
    Bsf,
    Bcf,
    Btfss,
    Btfsc,
}

impl BitOp {
    const fn opcode(self) -> u16 {
        match self {
            BitOp::Btg => 0x7,
            BitOp::Bsf => 0x8,
            BitOp::Bcf => 0x9,
            BitOp::Btfss => 0xa,
            BitOp::Btfsc => 0xb,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            BitOp::Btg => "BTG",
            BitOp::Bsf => "BSF",
            BitOp::Bcf => "BCF",
            BitOp::Btfss => "BTFSS",
            BitOp::Btfsc => "BTFSC",
        }
    }
}

/// Two-word absolute transfers of control (20-bit word address).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongOp {
    Call,
    Goto,
}

impl LongOp {
    const fn opcode(self) -> u16 {
        match self {
            LongOp::Call => 0xec,
            LongOp::Goto => 0xef,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            LongOp::Call => "CALL",
            LongOp::Goto => "GOTO",
        }
    }
}

// ============================================================================
// Instructions
// ============================================================================

/// A machine instruction with operands, ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Simple(SimpleOp),
    Imm(ImmOp, i32),
    Byte(ByteOp, Designator),
    ByteDir(ByteDirOp, Designator, Dir),
    /// `op bit, designator`; the bit index must be 0..=7.
    Bit(BitOp, u8, Designator),
    /// MOVFF: absolute 12-bit source and destination addresses.
    Move { src: u16, dst: u16 },
    /// CALL/GOTO with a 20-bit word address.
    LongJump(LongOp, u32),
    /// MOVSF: stack-relative source offset to an absolute destination.
    MoveIndirect { offset: u8, dst: u16 },
}

/// `value` occupies at most `bits` bits, allowing the signed and unsigned
/// interpretations to share the field: `-(2^(bits-1)) <= value < 2^bits`.
fn check_field(value: i32, bits: u32) -> Result<u16, CompileError> {
    if value < -(1 << (bits - 1)) || value >= 1 << bits {
        return Err(CompileError::FieldOverflow { value, bits });
    }
    Ok((value as u32 & ((1 << bits) - 1)) as u16)
}

impl Instr {
    /// Encode into one or two words, checking every operand field.
    pub fn encode(&self) -> Result<SmallVec<[u16; 2]>, CompileError> {
        Ok(match *self {
            Instr::Simple(op) => smallvec![op.word()],
            Instr::Imm(op, arg) => {
                let (opcode, bits) = op.layout();
                smallvec![(opcode << bits) | check_field(arg, bits)?]
            }
            Instr::Byte(op, d) => smallvec![(op.opcode() << 9) | d.encode()],
            Instr::ByteDir(op, d, dir) => {
                smallvec![(op.opcode() << 10) | (dir.bit() << 9) | d.encode()]
            }
            Instr::Bit(op, bit, d) => {
                let bit = check_field(bit as i32, 3)?;
                smallvec![(op.opcode() << 12) | (bit << 9) | d.encode()]
            }
            Instr::Move { src, dst } => {
                let src = check_field(src as i32, 12)?;
                let dst = check_field(dst as i32, 12)?;
                smallvec![(0xc << 12) | src, CONTINUATION | dst]
            }
            Instr::LongJump(op, addr) => {
                if addr >= 1 << 20 {
                    return Err(CompileError::FieldOverflow { value: addr as i32, bits: 20 });
                }
                smallvec![
                    (op.opcode() << 8) | (addr & 0xff) as u16,
                    CONTINUATION | (addr >> 8) as u16,
                ]
            }
            Instr::MoveIndirect { offset, dst } => {
                let offset = check_field(offset as i32, 7)?;
                let dst = check_field(dst as i32, 12)?;
                smallvec![(0x1d6 << 7) | offset, CONTINUATION | dst]
            }
        })
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instr::Simple(op) => op.mnemonic(),
            Instr::Imm(op, _) => op.mnemonic(),
            Instr::Byte(op, _) => op.mnemonic(),
            Instr::ByteDir(op, _, _) => op.mnemonic(),
            Instr::Bit(op, _, _) => op.mnemonic(),
            Instr::Move { .. } => "MOVFF",
            Instr::LongJump(op, _) => op.mnemonic(),
            Instr::MoveIndirect { .. } => "MOVSF",
        }
    }

    /// Debug origin attached to emitted words.
    pub fn origin(&self) -> Origin {
        let args: SmallVec<[i32; 3]> = match *self {
            Instr::Simple(_) => smallvec![],
            Instr::Imm(_, arg) => smallvec![arg],
            Instr::Byte(_, d) => smallvec![d.encode() as i32],
            Instr::ByteDir(_, d, dir) => smallvec![d.encode() as i32, dir.bit() as i32],
            Instr::Bit(_, bit, d) => smallvec![bit as i32, d.encode() as i32],
            Instr::Move { src, dst } => smallvec![src as i32, dst as i32],
            Instr::LongJump(_, addr) => smallvec![addr as i32],
            Instr::MoveIndirect { offset, dst } => smallvec![offset as i32, dst as i32],
        };
        Origin { mnemonic: self.mnemonic(), args }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instr::Simple(op) => write!(f, "{}", op.mnemonic()),
            Instr::Imm(op, arg) => write!(f, "{} {}", op.mnemonic(), arg),
            Instr::Byte(op, d) => write!(f, "{} {}", op.mnemonic(), d),
            Instr::ByteDir(op, d, dir) => {
                write!(f, "{} {}, {}", op.mnemonic(), d, dir.suffix())
            }
            Instr::Bit(op, bit, d) => write!(f, "{} {}, {}", op.mnemonic(), d, bit),
            Instr::Move { src, dst } => write!(f, "MOVFF {:#05x}, {:#05x}", src, dst),
            Instr::LongJump(op, addr) => write!(f, "{} {:#x}", op.mnemonic(), addr),
            Instr::MoveIndirect { offset, dst } => {
                write!(f, "MOVSF [{}], {:#05x}", offset, dst)
            }
        }
    }
}

// ============================================================================
// Decode helpers (tests and disassembly)
// ============================================================================

/// Split an immediate-class word into opcode and raw argument field.
pub fn split_imm(word: u16, arg_bits: u32) -> (u16, u16) {
    (word >> arg_bits, word & ((1 << arg_bits) - 1))
}

/// Split a designator-class word (7-bit opcode, no direction bit).
pub fn split_byte(word: u16) -> (u16, Designator) {
    (word >> 9, Designator::decode(word & 0x1ff))
}

/// Split a designator-plus-direction word (6-bit opcode).
pub fn split_byte_dir(word: u16) -> (u16, Dir, Designator) {
    let dir = if word & 0x200 != 0 { Dir::F } else { Dir::W };
    (word >> 10, dir, Designator::decode(word & 0x1ff))
}

/// Split a bit-oriented word into opcode, bit index, designator.
pub fn split_bit(word: u16) -> (u16, u8, Designator) {
    (word >> 12, ((word >> 9) & 0x7) as u8, Designator::decode(word & 0x1ff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pic18::registers;

    fn one(i: Instr) -> u16 {
        let words = i.encode().unwrap();
        assert_eq!(words.len(), 1);
        words[0]
    }

    fn two(i: Instr) -> [u16; 2] {
        let words = i.encode().unwrap();
        assert_eq!(words.len(), 2);
        [words[0], words[1]]
    }

    #[test]
    fn designator_nine_bit_field() {
        assert_eq!(Designator::access(0x93).encode(), 0x093);
        assert_eq!(Designator::banked(0x3f).encode(), 0x13f);
        assert_eq!(Designator::decode(0x13f), Designator::banked(0x3f));
        assert_eq!(Designator::sfr(0xf93), Designator::access(0x93));
    }

    #[test]
    fn absolute_addresses_for_movff() {
        assert_eq!(Designator::banked(0x3f).absolute(), 0x03f);
        assert_eq!(Designator::access(0x12).absolute(), 0x012);
        assert_eq!(Designator::access(0xe8).absolute(), 0xfe8);
    }

    #[test]
    fn immediate_encodings() {
        assert_eq!(one(Instr::Imm(ImmOp::Movlw, 0x02)), 0x0e02);
        assert_eq!(one(Instr::Imm(ImmOp::Addlw, 0x03)), 0x0f03);
        assert_eq!(one(Instr::Imm(ImmOp::Sublw, 0x05)), 0x0805);
        assert_eq!(one(Instr::Imm(ImmOp::Movlb, 0x5)), 0x0105);
        assert_eq!(one(Instr::Imm(ImmOp::Bz, 0x01)), 0xe001);
        assert_eq!(one(Instr::Imm(ImmOp::Bnz, 0x40)), 0xe140);
    }

    #[test]
    fn relative_branches_take_negative_displacements() {
        // 11-bit field: -8 masks to 0x7f8
        assert_eq!(one(Instr::Imm(ImmOp::Bra, -8)), 0xd7f8);
        assert_eq!(one(Instr::Imm(ImmOp::Bra, -0x400)), 0xd400);
        assert_eq!(one(Instr::Imm(ImmOp::Bnn, 4)), 0xe704);
    }

    #[test]
    fn immediate_field_limits() {
        assert!(Instr::Imm(ImmOp::Movlw, 255).encode().is_ok());
        assert!(Instr::Imm(ImmOp::Movlw, -128).encode().is_ok());
        assert_eq!(
            Instr::Imm(ImmOp::Movlw, 256).encode(),
            Err(CompileError::FieldOverflow { value: 256, bits: 8 })
        );
        assert!(Instr::Imm(ImmOp::Movlw, -129).encode().is_err());
        assert!(Instr::Imm(ImmOp::Bra, 0x7ff).encode().is_ok());
        assert!(Instr::Imm(ImmOp::Bra, 0x800).encode().is_err());
        assert!(Instr::Imm(ImmOp::Bra, -0x401).encode().is_err());
        assert!(Instr::Imm(ImmOp::Movlb, 0xf).encode().is_ok());
        assert!(Instr::Imm(ImmOp::Movlb, 0x10).encode().is_err());
    }

    #[test]
    fn byte_oriented_encodings() {
        assert_eq!(one(Instr::Byte(ByteOp::Movwf, Designator::banked(0x3f))), 0x6f3f);
        assert_eq!(one(Instr::Byte(ByteOp::Negf, registers::WREG)), 0x6ce8);
        assert_eq!(one(Instr::Byte(ByteOp::Clrf, Designator::access(0x81))), 0x6a81);
    }

    #[test]
    fn byte_dir_encodings() {
        let port = Designator::sfr(0xf81);
        assert_eq!(one(Instr::ByteDir(ByteDirOp::Movf, port, Dir::W)), 0x5081);
        assert_eq!(
            one(Instr::ByteDir(ByteDirOp::Addwf, Designator::banked(0x3f), Dir::F)),
            0x273f
        );
        assert_eq!(one(Instr::ByteDir(ByteDirOp::Subwf, Designator::banked(0x3f), Dir::W)), 0x5d3f);
        assert_eq!(one(Instr::ByteDir(ByteDirOp::Subfwb, port, Dir::W)), 0x5481);
    }

    #[test]
    fn bit_oriented_encodings() {
        let tris = Designator::sfr(0xf93);
        assert_eq!(one(Instr::Bit(BitOp::Bcf, 7, tris)), 0x9e93);
        assert_eq!(one(Instr::Bit(BitOp::Bsf, 7, Designator::sfr(0xf81))), 0x8e81);
        assert_eq!(one(Instr::Bit(BitOp::Btfss, 2, registers::STATUS)), 0xa4d8);
        assert!(Instr::Bit(BitOp::Bsf, 8, tris).encode().is_err());
    }

    #[test]
    fn two_word_encodings() {
        assert_eq!(
            two(Instr::Move { src: 0x03f, dst: 0xf81 }),
            [0xc03f, 0xff81]
        );
        assert_eq!(two(Instr::LongJump(LongOp::Goto, 0x80)), [0xef80, 0xf000]);
        assert_eq!(two(Instr::LongJump(LongOp::Goto, 0x12345)), [0xef45, 0xf123]);
        assert_eq!(
            two(Instr::MoveIndirect { offset: 0x05, dst: 0xf93 }),
            [0xeb05, 0xff93]
        );
        assert!(Instr::LongJump(LongOp::Goto, 1 << 20).encode().is_err());
        assert!(Instr::MoveIndirect { offset: 0x80, dst: 0 }.encode().is_err());
    }

    #[test]
    fn splits_invert_encodes() {
        let word = one(Instr::Imm(ImmOp::Movlw, 0xa5));
        assert_eq!(split_imm(word, 8), (0x0e, 0xa5));

        let word = one(Instr::Byte(ByteOp::Movwf, Designator::banked(0x3e)));
        assert_eq!(split_byte(word), (0x37, Designator::banked(0x3e)));

        let word = one(Instr::ByteDir(ByteDirOp::Movf, Designator::banked(0x3e), Dir::W));
        assert_eq!(split_byte_dir(word), (0x14, Dir::W, Designator::banked(0x3e)));

        let word = one(Instr::Bit(BitOp::Btg, 5, Designator::access(0x81)));
        assert_eq!(split_bit(word), (0x7, 5, Designator::access(0x81)));
    }

    #[test]
    fn continuation_words_are_nops() {
        for [_, second] in [
            two(Instr::Move { src: 0, dst: 0 }),
            two(Instr::LongJump(LongOp::Call, 0)),
            two(Instr::MoveIndirect { offset: 0, dst: 0 }),
        ] {
            assert_eq!(second >> 12, 0xf);
        }
    }
}
