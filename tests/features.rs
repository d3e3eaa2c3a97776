use barebits::pic18::registers::PORTB;
use barebits::{CompileError, CondCode, Expr, Program, Word};

fn mnemonics(words: &[Word]) -> Vec<&'static str> {
    words
        .iter()
        .map(|w| w.origin.as_ref().map(|o| o.mnemonic).unwrap_or("?"))
        .collect()
}

// ── Condition lowering ───────────────────────────────────────────────────

#[test]
fn comparisons_against_a_right_literal() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var()?;
    assert_eq!(p.compile_condition(x.eq(5))?, CondCode::Zero);
    assert_eq!(p.compile_condition(x.ne(5))?, CondCode::NotZero);
    assert_eq!(p.compile_condition(x.lt(5))?, CondCode::Negative);
    assert_eq!(p.compile_condition(x.ge(5))?, CondCode::NotNegative);
    assert_eq!(p.compile_condition(x.gt(5))?, CondCode::Negative);
    assert_eq!(p.compile_condition(x.le(5))?, CondCode::NotNegative);
    p.finish()?;
    Ok(())
}

#[test]
fn strict_orderings_negate_the_difference() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var()?;
    // x < 5 flips to 5 > x, and > needs the extra negation
    p.compile_condition(x.lt(5))?;
    let words = p.finish()?;
    assert_eq!(mnemonics(&words), ["MOVF", "SUBLW", "NEGF"]);
    Ok(())
}

#[test]
fn equality_needs_no_negation() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var()?;
    assert_eq!(p.compile_condition(x.eq(5))?, CondCode::Zero);
    let words = p.finish()?;
    assert_eq!(mnemonics(&words), ["MOVF", "SUBLW"]);
    Ok(())
}

#[test]
fn literal_on_the_left_compiles_directly() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var()?;
    assert_eq!(p.compile_condition(Expr::Lit(5).lt(x))?, CondCode::Negative);
    let words = p.finish()?;
    // SUBLW leaves 5 - x; negative exactly when 5 < x
    assert_eq!(mnemonics(&words), ["MOVF", "SUBLW"]);
    Ok(())
}

#[test]
fn register_comparison_loads_the_right_operand() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var()?;
    let y = p.var()?;
    assert_eq!(p.compile_condition(x.lt(y))?, CondCode::Negative);
    let words = p.finish()?;
    // y into W, then x - W sets N exactly when x < y
    assert_eq!(mnemonics(&words), ["MOVF", "SUBWF"]);
    Ok(())
}

// ── Scopes and allocation ────────────────────────────────────────────────

#[test]
fn sibling_scopes_reuse_addresses() -> Result<(), CompileError> {
    let mut p = Program::new();
    let mut first = None;
    let mut second = None;
    p.block(|p| {
        let v = p.var()?;
        first = p.address_of(v);
        Ok(())
    })?;
    p.block(|p| {
        let v = p.var()?;
        second = p.address_of(v);
        Ok(())
    })?;
    assert!(first.is_some());
    assert_eq!(first, second);
    p.finish()?;
    Ok(())
}

#[test]
fn nested_scopes_stack_their_addresses() -> Result<(), CompileError> {
    let mut p = Program::new();
    let outer_before = p.available_addresses();
    p.block(|p| {
        let a = p.var()?;
        p.block(|p| {
            let b = p.var()?;
            assert_ne!(p.address_of(a), p.address_of(b));
            Ok(())
        })
    })?;
    assert_eq!(p.available_addresses(), outer_before);
    p.finish()?;
    Ok(())
}

#[test]
fn scope_close_returns_variables_to_the_pool() -> Result<(), CompileError> {
    let mut p = Program::new();
    let before = p.available_addresses();
    p.block(|p| {
        p.var()?;
        p.var()?;
        assert_eq!(p.available_addresses(), before - 2);
        Ok(())
    })?;
    assert_eq!(p.available_addresses(), before);
    p.finish()?;
    Ok(())
}

// ── Accumulator custody ──────────────────────────────────────────────────

#[test]
fn pinned_temporary_survives_use_as_an_operand() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var_init(1)?;
    let t = p.compile_expr(5)?;
    p.pin(t);
    p.assign(x, Expr::from(t).plus(x))?;
    // the pinned value was parked into memory rather than consumed
    assert!(p.address_of(t).is_some());
    assert!(!p.is_acc_resident(t));
    p.unpin(t);
    p.free(t);
    let words = p.finish()?;
    assert_eq!(
        mnemonics(&words),
        ["MOVLW", "MOVWF", "MOVLW", "MOVWF", "MOVF", "ADDWF", "MOVWF"]
    );
    Ok(())
}

#[test]
fn unpinned_temporary_is_consumed() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var_init(1)?;
    let before = p.available_addresses();
    let t = p.compile_expr(Expr::from(x).plus(x))?;
    p.assign(x, Expr::from(t).plus(2))?;
    // t was an addressed intermediate and went back to the pool
    assert_eq!(p.available_addresses(), before);
    p.finish()?;
    Ok(())
}

// ── Copies ───────────────────────────────────────────────────────────────

#[test]
fn variable_to_variable_copy_uses_movff() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var_init(7)?;
    let y = p.var()?;
    p.assign(y, x)?;
    let words = p.finish()?;
    assert_eq!(mnemonics(&words), ["MOVLW", "MOVWF", "MOVFF", "MOVFF"]);
    // banked 0x3f to banked 0x3e, both resolved in bank 0
    assert_eq!(words[2].value, 0xc03f);
    assert_eq!(words[3].value, 0xf03e);
    Ok(())
}

#[test]
fn variable_to_register_copy_targets_the_sfr_address() -> Result<(), CompileError> {
    let mut p = Program::new();
    let port = p.reg(PORTB);
    let x = p.var_init(7)?;
    p.assign(port, x)?;
    let words = p.finish()?;
    assert_eq!(words[3].value, 0xff81);
    Ok(())
}

// ── Structured constructs ────────────────────────────────────────────────

#[test]
fn for_loop_shape() -> Result<(), CompileError> {
    let mut p = Program::new();
    let c = p.var()?;
    p.for_(c, 0, 10, |_| Ok(()))?;
    let words = p.finish()?;
    assert_eq!(
        mnemonics(&words),
        [
            "MOVLW", "MOVWF", // init
            "MOVF", "SUBLW", "NEGF", "BNN", // condition and forward branch
            "MOVF", "ADDLW", "MOVWF", // increment
            "BRA", // backward
        ]
    );
    Ok(())
}

#[test]
fn bit_operations_address_the_file_directly() -> Result<(), CompileError> {
    let mut p = Program::new();
    let x = p.var()?;
    p.set_bit(x, 0)?;
    p.clear_bit(x, 7)?;
    p.toggle_bit(x, 3)?;
    let words = p.finish()?;
    assert_eq!(mnemonics(&words), ["BSF", "BCF", "BTG"]);
    assert_eq!(words[0].value, 0x813f);
    assert_eq!(words[1].value, 0x9f3f);
    assert_eq!(words[2].value, 0x773f);
    Ok(())
}

#[test]
fn while_condition_reads_fresh_values() -> Result<(), CompileError> {
    // counting down to zero: the whole loop body must re-enter the condition
    let mut p = Program::new();
    let x = p.var_init(10)?;
    p.while_(x.ne(0), |p| p.assign(x, x.minus(1)))?;
    let words = p.finish()?;
    assert_eq!(
        mnemonics(&words),
        ["MOVLW", "MOVWF", "MOVF", "SUBLW", "BZ", "MOVF", "ADDLW", "MOVWF", "BRA"]
    );
    Ok(())
}
