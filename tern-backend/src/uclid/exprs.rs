//! Renders ground types and expressions in the model's syntax.
//!
//! Rendering is parameterized by the `primed` flag: under it, every signal
//! reference denotes the post-step value (`name'`). The flag is threaded by
//! value; it is a property of the rendering position, not of the expression.
use tern_ir::{flatten, Expr, PrimOp, Type};
use tern_utils::{Error, Id, TernResult};

/// Render a ground type. The unsigned 1-bit type is a boolean in the target;
/// signedness otherwise disappears into the operators.
pub fn type_str(typ: Type) -> String {
    match typ {
        Type::UInt { width: 1 } => "boolean".to_string(),
        Type::UInt { width } | Type::SInt { width } => format!("bv{}", width),
        Type::Clock => unreachable!("clock types are never emitted"),
    }
}

fn name_str(name: Id, primed: bool) -> String {
    if primed {
        format!("{}'", name)
    } else {
        name.to_string()
    }
}

/// Render an expression. Fails on primitive applications whose shape is
/// outside the dispatch table and on dynamic shifts whose amount is wider
/// than the shifted operand.
pub fn expr_str(expr: &Expr, primed: bool) -> TernResult<String> {
    match expr {
        Expr::Ref { name, .. } => Ok(name_str(*name, primed)),
        Expr::SubField { base, field, .. } => {
            Ok(name_str(flatten(*base, *field), primed))
        }
        Expr::UIntLit { value, width: 1 } => match value {
            0 => Ok("false".to_string()),
            1 => Ok("true".to_string()),
            _ => Err(Error::unsupported_expression(format!(
                "1-bit literal with value {}",
                value
            ))),
        },
        Expr::UIntLit { value, width } => Ok(format!("{}bv{}", value, width)),
        Expr::SIntLit { value, width } => Ok(format!("{}bv{}", value, width)),
        Expr::Mux { cond, tval, fval } => Ok(format!(
            "if ({}) then ({}) else ({})",
            expr_str(cond, primed)?,
            expr_str(tval, primed)?,
            expr_str(fval, primed)?
        )),
        Expr::Prim {
            op,
            args,
            consts,
            typ,
        } => prim_str(*op, args, consts, *typ, primed),
    }
}

/// Dispatch a primitive application on its operand and constant counts.
fn prim_str(
    op: PrimOp,
    args: &[Expr],
    consts: &[u64],
    typ: Type,
    primed: bool,
) -> TernResult<String> {
    match (args, consts) {
        ([a, b], []) => binary_str(op, a, b, typ, primed),
        ([a], []) => unary_str(op, a, typ, primed),
        ([a], [k]) => binary_const_str(op, a, *k, typ, primed),
        ([a], [hi, lo]) => match op {
            PrimOp::BitSlice => {
                Ok(format!("{}[{}:{}]", operand_str(a, primed)?, hi, lo))
            }
            _ => Err(malformed(op, args.len(), consts.len())),
        },
        ([], [k]) => const_unary_str(op, *k, typ)
            .ok_or_else(|| malformed(op, args.len(), consts.len())),
        ([], [k1, k2]) => infix_sym(op, typ)
            .map(|sym| format!("{} {} {}", k1, sym, k2))
            .ok_or_else(|| malformed(op, args.len(), consts.len())),
        _ => Err(malformed(op, args.len(), consts.len())),
    }
}

fn malformed(op: PrimOp, args: usize, consts: usize) -> Error {
    Error::malformed_primitive(format!(
        "`{:?}` applied to {} operands and {} constants",
        op, args, consts
    ))
}

/// Infix symbol for an operator, selected by the result width where the
/// target distinguishes boolean and bit-vector connectives.
fn infix_sym(op: PrimOp, typ: Type) -> Option<&'static str> {
    let sym = match op {
        PrimOp::Add | PrimOp::AddWrap => "+",
        PrimOp::Sub | PrimOp::SubWrap => "-",
        PrimOp::Mul => "*",
        PrimOp::Lt => "<",
        PrimOp::Leq => "<=",
        PrimOp::Gt => ">",
        PrimOp::Geq => ">=",
        PrimOp::Eq => "==",
        PrimOp::Neq => "!=",
        PrimOp::And => {
            if typ.width() == 1 {
                "&&"
            } else {
                "&"
            }
        }
        PrimOp::Or => {
            if typ.width() == 1 {
                "||"
            } else {
                "|"
            }
        }
        PrimOp::Xor => "^",
        PrimOp::Cat => "++",
        _ => return None,
    };
    Some(sym)
}

fn binary_str(
    op: PrimOp,
    a: &Expr,
    b: &Expr,
    typ: Type,
    primed: bool,
) -> TernResult<String> {
    match op {
        // Extending arithmetic: both operands grow by one bit so the result
        // cannot overflow.
        PrimOp::Add | PrimOp::Sub => {
            let ext = extend_fn(typ.is_signed());
            let sym = if op == PrimOp::Add { "+" } else { "-" };
            Ok(format!(
                "{}(1, {}) {} {}(1, {})",
                ext,
                expr_str(a, primed)?,
                sym,
                ext,
                expr_str(b, primed)?
            ))
        }
        PrimOp::Shl | PrimOp::Shr | PrimOp::DynShl | PrimOp::DynShr => {
            dyn_shift_str(op, a, b, primed)
        }
        _ => {
            let sym = infix_sym(op, typ)
                .ok_or_else(|| malformed(op, 2, 0))?;
            Ok(format!(
                "{} {} {}",
                operand_str(a, primed)?,
                sym,
                operand_str(b, primed)?
            ))
        }
    }
}

fn unary_str(
    op: PrimOp,
    a: &Expr,
    typ: Type,
    primed: bool,
) -> TernResult<String> {
    match op {
        PrimOp::Neg => Ok(format!("-{}", operand_str(a, primed)?)),
        PrimOp::Not => {
            let bang = if typ.width() == 1 { "!" } else { "~" };
            Ok(format!("{}{}", bang, operand_str(a, primed)?))
        }
        // Reinterpretations change no bits.
        PrimOp::AsUInt | PrimOp::AsSInt => expr_str(a, primed),
        _ => Err(malformed(op, 1, 0)),
    }
}

/// Binary shape with a constant operand. Slicing, padding, and static shifts
/// consume the constant structurally; anything else renders it as a decimal
/// literal in the operand position.
fn binary_const_str(
    op: PrimOp,
    a: &Expr,
    k: u64,
    typ: Type,
    primed: bool,
) -> TernResult<String> {
    match op {
        PrimOp::BitSelect => {
            Ok(format!("{}[{}]", operand_str(a, primed)?, k))
        }
        PrimOp::Tail => {
            Ok(format!("{}[{}:0]", operand_str(a, primed)?, a.width() - k))
        }
        PrimOp::Pad => {
            let width = a.width();
            if k > width {
                Ok(format!(
                    "{}({}, {})",
                    extend_fn(a.typ().is_signed()),
                    k - width,
                    expr_str(a, primed)?
                ))
            } else {
                expr_str(a, primed)
            }
        }
        PrimOp::Shl | PrimOp::Shr => Ok(format!(
            "{}({}, {})",
            shift_fn(op, a.typ().is_signed()),
            k,
            expr_str(a, primed)?
        )),
        _ => {
            let sym = infix_sym(op, typ)
                .ok_or_else(|| malformed(op, 1, 1))?;
            Ok(format!("{} {} {}", operand_str(a, primed)?, sym, k))
        }
    }
}

fn const_unary_str(op: PrimOp, k: u64, typ: Type) -> Option<String> {
    match op {
        PrimOp::Neg => Some(format!("-{}", k)),
        PrimOp::Not => {
            let bang = if typ.width() == 1 { "!" } else { "~" };
            Some(format!("{}{}", bang, k))
        }
        PrimOp::AsUInt | PrimOp::AsSInt => Some(k.to_string()),
        _ => None,
    }
}

/// Dynamic shift: the amount is widened to the shifted operand's width; an
/// amount wider than the operand has no sound rendering.
fn dyn_shift_str(
    op: PrimOp,
    a: &Expr,
    shamt: &Expr,
    primed: bool,
) -> TernResult<String> {
    let aw = a.width();
    let sw = shamt.width();
    let amount = if aw == sw {
        expr_str(shamt, primed)?
    } else if aw > sw {
        format!("bv_zero_extend({}, {})", aw - sw, expr_str(shamt, primed)?)
    } else {
        return Err(Error::shift_width_mismatch(format!(
            "shift amount has {} bits but the shifted operand has {}",
            sw, aw
        )));
    };
    Ok(format!(
        "{}({}, {})",
        shift_fn(op, a.typ().is_signed()),
        amount,
        expr_str(a, primed)?
    ))
}

fn extend_fn(signed: bool) -> &'static str {
    if signed {
        "bv_sign_extend"
    } else {
        "bv_zero_extend"
    }
}

fn shift_fn(op: PrimOp, signed: bool) -> &'static str {
    match op {
        PrimOp::Shl | PrimOp::DynShl => "bv_left_shift",
        PrimOp::Shr | PrimOp::DynShr => {
            if signed {
                "bv_a_right_shift"
            } else {
                "bv_l_right_shift"
            }
        }
        _ => unreachable!("not a shift operator"),
    }
}

/// Render an operand, parenthesized when its own rendering is an infix,
/// prefix, or mux form.
fn operand_str(e: &Expr, primed: bool) -> TernResult<String> {
    let s = expr_str(e, primed)?;
    if is_compound(e) {
        Ok(format!("({})", s))
    } else {
        Ok(s)
    }
}

fn is_compound(e: &Expr) -> bool {
    match e {
        Expr::Mux { .. } => true,
        Expr::Prim {
            op, args, consts, ..
        } => match op {
            // Selections, slices, and shifts render as indexing or calls.
            PrimOp::BitSelect
            | PrimOp::BitSlice
            | PrimOp::Tail
            | PrimOp::Shl
            | PrimOp::Shr
            | PrimOp::DynShl
            | PrimOp::DynShr => false,
            PrimOp::AsUInt | PrimOp::AsSInt => {
                args.first().map(is_compound).unwrap_or(false)
            }
            // Identity pads disappear from the rendering.
            PrimOp::Pad => match (args.first(), consts.first()) {
                (Some(a), Some(k)) if *k <= a.width() => is_compound(a),
                _ => false,
            },
            _ => true,
        },
        _ => false,
    }
}
