//! Hardware register table.
//!
//! Special-function registers of the PIC18F2550-class parts, exposed as
//! access-bank [`Designator`] constants plus a name lookup. The code
//! generator only ever consumes designators; absolute addresses appear here
//! once and nowhere else.

use super::instructions::Designator;

pub const WREG: Designator = Designator::sfr(0xfe8);
pub const STATUS: Designator = Designator::sfr(0xfd8);
pub const BSR: Designator = Designator::sfr(0xfe0);

pub const PORTA: Designator = Designator::sfr(0xf80);
pub const PORTB: Designator = Designator::sfr(0xf81);
pub const PORTC: Designator = Designator::sfr(0xf82);
pub const LATA: Designator = Designator::sfr(0xf89);
pub const LATB: Designator = Designator::sfr(0xf8a);
pub const LATC: Designator = Designator::sfr(0xf8b);
pub const TRISA: Designator = Designator::sfr(0xf92);
pub const TRISB: Designator = Designator::sfr(0xf93);
pub const TRISC: Designator = Designator::sfr(0xf94);

/// Bit indices within STATUS.
pub mod status {
    pub const C: u8 = 0;
    pub const DC: u8 = 1;
    pub const Z: u8 = 2;
    pub const OV: u8 = 3;
    pub const N: u8 = 4;
}

const TABLE: &[(&str, Designator)] = &[
    ("WREG", WREG),
    ("STATUS", STATUS),
    ("BSR", BSR),
    ("PORTA", PORTA),
    ("PORTB", PORTB),
    ("PORTC", PORTC),
    ("LATA", LATA),
    ("LATB", LATB),
    ("LATC", LATC),
    ("TRISA", TRISA),
    ("TRISB", TRISB),
    ("TRISC", TRISC),
];

/// Look a register up by its datasheet name.
pub fn lookup(name: &str) -> Option<Designator> {
    TABLE.iter().find(|(n, _)| *n == name).map(|&(_, d)| d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designators_use_access_bank_encoding() {
        assert_eq!(WREG.encode(), 0x0e8);
        assert_eq!(STATUS.encode(), 0x0d8);
        assert_eq!(TRISB.encode(), 0x093);
        assert_eq!(PORTB.encode(), 0x081);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(lookup("TRISB"), Some(TRISB));
        assert_eq!(lookup("WREG"), Some(WREG));
        assert_eq!(lookup("FSR0"), None);
    }
}
