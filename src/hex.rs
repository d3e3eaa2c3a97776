//! Intel HEX serialization.
//!
//! A program image is written as: one extended-linear-address record for the
//! upper 16 bits of the load offset, an entry record at address 0 holding a
//! GOTO to the image, the image itself in 16-byte data records, and the EOF
//! record. Words are split little-endian (low byte first) and records carry
//! the usual two's-complement checksum.

use crate::code::Word;
use crate::pic18::instructions::{Instr, LongOp};
use crate::CompileError;

/// One record: `:` count, 16-bit address, type, data, checksum. Lowercase.
fn record(address: u16, kind: u8, data: &[u8]) -> String {
    let mut line = format!(":{:02x}{:04x}{:02x}", data.len(), address, kind);
    let mut sum = (data.len() as u8)
        .wrapping_add((address >> 8) as u8)
        .wrapping_add(address as u8)
        .wrapping_add(kind);
    for &b in data {
        sum = sum.wrapping_add(b);
        line.push_str(&format!("{:02x}", b));
    }
    line.push_str(&format!("{:02x}", sum.wrapping_neg()));
    line
}

fn word_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|&w| [w as u8, (w >> 8) as u8]).collect()
}

/// Serialize a word stream loaded at `offset` (a byte address; the entry
/// GOTO divides it by two to obtain the word address).
pub fn gen_hex(words: &[Word], offset: u32) -> Result<String, CompileError> {
    let mut lines = Vec::new();

    let upper = (offset >> 16) as u16;
    lines.push(record(0, 4, &[(upper >> 8) as u8, upper as u8]));

    let entry = Instr::LongJump(LongOp::Goto, offset >> 1).encode()?;
    lines.push(record(0, 0, &word_bytes(&entry)));

    let bytes = word_bytes(&words.iter().map(|w| w.value).collect::<Vec<_>>());
    for (i, chunk) in bytes.chunks(16).enumerate() {
        lines.push(record(offset.wrapping_add(i as u32 * 16) as u16, 0, chunk));
    }

    lines.push(record(0, 1, &[]));
    Ok(lines.join("\n"))
}
