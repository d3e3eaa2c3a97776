//! Ordered machine-word emission.
//!
//! A [`CodeBuffer`] collects encoded 16-bit [`Word`]s in program order. Each
//! word keeps an optional [`Origin`] (mnemonic plus raw operand values) so
//! tests and traces can inspect a stream by instruction rather than by raw
//! bits. Child buffers built for block bodies are spliced into their parent
//! with [`CodeBuffer::append`].

use smallvec::SmallVec;
use tracing::trace;

use crate::pic18::instructions::Instr;
use crate::CompileError;

/// Debug provenance of an emitted word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub mnemonic: &'static str,
    pub args: SmallVec<[i32; 3]>,
}

/// One 16-bit program word. Continuation words of two-word instructions
/// share the origin of their first word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub value: u16,
    pub origin: Option<Origin>,
}

/// An ordered, append-only buffer of program words.
#[derive(Debug, Default)]
pub struct CodeBuffer {
    words: Vec<Word>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        CodeBuffer::default()
    }

    /// Encode an instruction and append its word(s).
    pub fn emit(&mut self, instr: &Instr) -> Result<(), CompileError> {
        let encoded = instr.encode()?;
        trace!(at = self.words.len(), "{}", instr);
        let origin = instr.origin();
        for value in encoded {
            self.words.push(Word { value, origin: Some(origin.clone()) });
        }
        Ok(())
    }

    /// Splice a child buffer onto the end of this one.
    pub fn append(&mut self, mut child: CodeBuffer) {
        self.words.append(&mut child.words);
    }

    /// Length in words, not instructions.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pic18::instructions::{ImmOp, Instr, LongOp, SimpleOp};

    #[test]
    fn emit_appends_in_order() {
        let mut buf = CodeBuffer::new();
        buf.emit(&Instr::Imm(ImmOp::Movlw, 2)).unwrap();
        buf.emit(&Instr::Simple(SimpleOp::Nop)).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.words()[0].value, 0x0e02);
        assert_eq!(buf.words()[1].value, 0x0000);
    }

    #[test]
    fn two_word_instructions_share_an_origin() {
        let mut buf = CodeBuffer::new();
        buf.emit(&Instr::LongJump(LongOp::Goto, 0x80)).unwrap();
        assert_eq!(buf.len(), 2);
        let [first, second] = buf.words() else { unreachable!() };
        assert_eq!(first.origin.as_ref().unwrap().mnemonic, "GOTO");
        assert_eq!(first.origin, second.origin);
    }

    #[test]
    fn append_preserves_order() {
        let mut parent = CodeBuffer::new();
        parent.emit(&Instr::Imm(ImmOp::Movlw, 1)).unwrap();
        let mut child = CodeBuffer::new();
        child.emit(&Instr::Imm(ImmOp::Movlw, 2)).unwrap();
        parent.append(child);
        assert_eq!(parent.words()[1].value, 0x0e02);
    }

    #[test]
    fn emit_rejects_oversized_fields() {
        let mut buf = CodeBuffer::new();
        assert!(buf.emit(&Instr::Imm(ImmOp::Movlw, 300)).is_err());
        assert!(buf.is_empty());
    }
}
