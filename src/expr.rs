//! Operation trees.
//!
//! An [`Expr`] is a small explicit tree over literals, variables ([`Place`]
//! handles), binary arithmetic nodes and comparison nodes. Trees are built
//! with the fluent methods below and consumed by the lowering passes in
//! [`crate::pic18`]; they carry no types or source positions.

use crate::alloc::Place;

// ============================================================================
// Operators
// ============================================================================

/// Binary arithmetic and bitwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
}

impl BinOp {
    /// Whether operand order is irrelevant. Used to normalize a literal
    /// operand onto the left so one immediate-form table covers both sides.
    pub fn is_commutative(self) -> bool {
        !matches!(self, BinOp::Sub)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl CmpOp {
    /// The operator that holds when the operands are swapped:
    /// `a op b  ==  b op.flip() a`.
    pub fn flip(self) -> Self {
        match self {
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Ne => CmpOp::Ne,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

// ============================================================================
// Expression tree
// ============================================================================

/// One node of an operation tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Integer literal. Range is checked at lowering time, not here, so that
    /// subtraction restatement can negate a literal before the check.
    Lit(i32),
    /// Reference to an allocated or hardware place.
    Var(Place),
    /// Binary arithmetic node.
    Bin(BinOp, Box<Expr>, Box<Expr>),
    /// Comparison node. Valid only at the root of a condition.
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Whether this node requires compilation (as opposed to a leaf whose
    /// value already exists somewhere).
    pub fn is_node(&self) -> bool {
        matches!(self, Expr::Bin(..) | Expr::Cmp(..))
    }

    fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Bin(op, Box::new(lhs), Box::new(rhs))
    }

    fn cmp(op: CmpOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Cmp(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn plus(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(BinOp::Add, self, rhs.into())
    }

    pub fn minus(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(BinOp::Sub, self, rhs.into())
    }

    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(BinOp::And, self, rhs.into())
    }

    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(BinOp::Or, self, rhs.into())
    }

    pub fn xor(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(BinOp::Xor, self, rhs.into())
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::cmp(CmpOp::Lt, self, rhs.into())
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        Expr::cmp(CmpOp::Le, self, rhs.into())
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        Expr::cmp(CmpOp::Eq, self, rhs.into())
    }

    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        Expr::cmp(CmpOp::Ne, self, rhs.into())
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::cmp(CmpOp::Gt, self, rhs.into())
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        Expr::cmp(CmpOp::Ge, self, rhs.into())
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Expr {
        Expr::Lit(v)
    }
}

impl From<Place> for Expr {
    fn from(p: Place) -> Expr {
        Expr::Var(p)
    }
}

// `Place` handles are `Copy`, so trees can start from a variable directly.
impl Place {
    pub fn plus(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).plus(rhs)
    }

    pub fn minus(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).minus(rhs)
    }

    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).and(rhs)
    }

    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).or(rhs)
    }

    pub fn xor(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).xor(rhs)
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).lt(rhs)
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).le(rhs)
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).eq(rhs)
    }

    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).ne(rhs)
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).gt(rhs)
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        Expr::from(self).ge(rhs)
    }
}
