//! Expressions over ground-typed signals.
use crate::Type;
use tern_utils::Id;

/// Primitive operators. Operand and constant counts are checked by the
/// serializer's dispatch table, not by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimOp {
    /// Extending addition: the result is one bit wider than the widest
    /// operand.
    Add,
    /// Truncating addition.
    AddWrap,
    Sub,
    SubWrap,
    Mul,
    Lt,
    Leq,
    Gt,
    Geq,
    Eq,
    Neq,
    And,
    Or,
    Xor,
    Not,
    Neg,
    /// Reinterpret as unsigned; no bits change.
    AsUInt,
    /// Reinterpret as signed; no bits change.
    AsSInt,
    /// Static left shift by a constant amount.
    Shl,
    /// Static right shift by a constant amount.
    Shr,
    DynShl,
    DynShr,
    Cat,
    /// Widen to a constant target width; identity when already wide enough.
    Pad,
    /// Drop a constant number of top bits.
    Tail,
    /// Select a single bit at a constant position.
    BitSelect,
    /// Extract the bit range `[hi:lo]` given by two constants.
    BitSlice,
}

/// An expression tree. References carry their resolved type; primitive
/// applications carry their derived result type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A reference to a declared signal.
    Ref { name: Id, typ: Type },
    /// A field of a named bundle, lowered to the flat name `base_field`.
    SubField { base: Id, field: Id, typ: Type },
    /// Unsigned literal.
    UIntLit { value: u64, width: u64 },
    /// Signed literal.
    SIntLit { value: i64, width: u64 },
    /// Two-way multiplexer.
    Mux {
        cond: Box<Expr>,
        tval: Box<Expr>,
        fval: Box<Expr>,
    },
    /// Primitive application with ordered operand expressions and ordered
    /// integer constants.
    Prim {
        op: PrimOp,
        args: Vec<Expr>,
        consts: Vec<u64>,
        typ: Type,
    },
}

/// The one canonical name-flattening function. Synthesized wires, assignment
/// targets, and serialized references must all agree on it.
pub fn flatten(base: Id, field: Id) -> Id {
    Id::new(format!("{}_{}", base, field))
}

impl Expr {
    pub fn reference<N: Into<Id>>(name: N, typ: Type) -> Self {
        Expr::Ref {
            name: name.into(),
            typ,
        }
    }

    pub fn subfield<N: Into<Id>, F: Into<Id>>(
        base: N,
        field: F,
        typ: Type,
    ) -> Self {
        Expr::SubField {
            base: base.into(),
            field: field.into(),
            typ,
        }
    }

    pub fn uint_lit(value: u64, width: u64) -> Self {
        Expr::UIntLit { value, width }
    }

    pub fn sint_lit(value: i64, width: u64) -> Self {
        Expr::SIntLit { value, width }
    }

    pub fn mux(cond: Expr, tval: Expr, fval: Expr) -> Self {
        Expr::Mux {
            cond: Box::new(cond),
            tval: Box::new(tval),
            fval: Box::new(fval),
        }
    }

    pub fn prim(
        op: PrimOp,
        args: Vec<Expr>,
        consts: Vec<u64>,
        typ: Type,
    ) -> Self {
        Expr::Prim {
            op,
            args,
            consts,
            typ,
        }
    }

    /// The type of this expression. Multiplexers take the type of their true
    /// branch; the branches agree in well-formed input.
    pub fn typ(&self) -> Type {
        match self {
            Expr::Ref { typ, .. }
            | Expr::SubField { typ, .. }
            | Expr::Prim { typ, .. } => *typ,
            Expr::UIntLit { width, .. } => Type::uint(*width),
            Expr::SIntLit { width, .. } => Type::sint(*width),
            Expr::Mux { tval, .. } => tval.typ(),
        }
    }

    /// Bit width of this expression's value.
    pub fn width(&self) -> u64 {
        self.typ().width()
    }

    /// The flat name this expression refers to, if it is a reference.
    pub fn flat_name(&self) -> Option<Id> {
        match self {
            Expr::Ref { name, .. } => Some(*name),
            Expr::SubField { base, field, .. } => {
                Some(flatten(*base, *field))
            }
            _ => None,
        }
    }
}
