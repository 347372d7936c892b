//! Statements in a module body.
use crate::{Expr, Type};
use tern_utils::{GetName, Id};

/// A memory declaration. The lowering pipeline guarantees ground data types,
/// write latency one, read latency zero, and no read-write ports; the
/// classifier re-checks those invariants before emission.
#[derive(Debug, Clone)]
pub struct MemDef {
    pub name: Id,
    pub data_type: Type,
    pub depth: u64,
    pub write_latency: u64,
    pub read_latency: u64,
    pub readers: Vec<Id>,
    pub writers: Vec<Id>,
    pub readwriters: Vec<Id>,
}

impl GetName for MemDef {
    fn name(&self) -> Id {
        self.name
    }
}

/// A statement in a module body.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Compound statement; bodies are trees of blocks over leaves.
    Block(Vec<Stmt>),
    /// A named combinational value. Its declared type is derived from the
    /// value expression.
    Node { name: Id, value: Expr },
    /// A clocked register. The reset is absent, a literal zero, or a bare
    /// reference to a reset signal that is tied to zero.
    Register {
        name: Id,
        typ: Type,
        clock: Expr,
        reset: Option<Expr>,
    },
    /// A memory with named read and write ports.
    Memory(MemDef),
    /// A connection. The left-hand side is a register, an output port, or a
    /// memory port field.
    Connect { lhs: Expr, rhs: Expr },
    /// A raw wire definition. Not accepted by the translator; wires in its
    /// input only arise from memory-port synthesis.
    Wire { name: Id, typ: Type },
    /// A nested module instance. Not accepted by the translator, which
    /// expects fully flattened input.
    Instance { name: Id, module: Id },
}
