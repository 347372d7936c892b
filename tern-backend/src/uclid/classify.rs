//! Sorts a module body into the declaration groups the emitter renders.
//!
//! Classification is a single post-order walk. Declarations are recorded
//! before any connect can target them, so left-hand sides are classified by
//! lookup against what the walk has already seen.
use linked_hash_map::LinkedHashMap;
use std::collections::{HashMap, HashSet};
use tern_ir::{flatten, Direction, Expr, MemDef, Module, Stmt, Type};
use tern_utils::{bits_needed_for, Error, Id, TernResult};

/// A module body partitioned by role. Sequences preserve source order;
/// register declarations are additionally name-keyed for lookup.
pub struct ModuleClasses<'a> {
    /// Combinational nodes.
    pub nodes: Vec<(Id, &'a Expr)>,
    /// Register declarations, insertion ordered.
    pub registers: LinkedHashMap<Id, Type>,
    /// Memory declarations.
    pub memories: Vec<&'a MemDef>,
    /// Wires synthesized for memory ports and havoc values.
    pub wires: Vec<(Id, Type)>,
    /// Connects whose left-hand side is a register.
    pub register_assigns: Vec<(&'a Expr, &'a Expr)>,
    /// Connects whose left-hand side is an output port or a memory port
    /// field.
    pub port_assigns: Vec<(&'a Expr, &'a Expr)>,
    /// Names used as reference resets; their ports are not declared.
    pub reset_names: HashSet<Id>,
    /// Distinct clock signals seen at registers and memory ports.
    clocks: HashSet<Id>,
    /// Memory ports keyed by port name, for lhs classification.
    mem_ports: HashMap<Id, Id>,
    /// Output ports of the module, for lhs classification.
    out_ports: HashSet<Id>,
}

impl<'a> ModuleClasses<'a> {
    /// Walk `module`'s body once and partition its statements.
    pub fn build(module: &'a Module) -> TernResult<Self> {
        let mut classes = ModuleClasses {
            nodes: Vec::new(),
            registers: LinkedHashMap::new(),
            memories: Vec::new(),
            wires: Vec::new(),
            register_assigns: Vec::new(),
            port_assigns: Vec::new(),
            reset_names: HashSet::new(),
            clocks: HashSet::new(),
            mem_ports: HashMap::new(),
            out_ports: module
                .ports
                .iter()
                .filter(|p| p.direction == Direction::Output)
                .map(|p| p.name)
                .collect(),
        };
        classes.stmt(&module.body)?;
        if classes.clocks.len() > 1 {
            return Err(Error::unsupported_module_shape(format!(
                "module `{}` uses {} distinct clocks",
                module.name,
                classes.clocks.len()
            )));
        }
        log::debug!(
            "classified `{}`: {} nodes, {} registers, {} memories",
            module.name,
            classes.nodes.len(),
            classes.registers.len(),
            classes.memories.len()
        );
        Ok(classes)
    }

    fn stmt(&mut self, stmt: &'a Stmt) -> TernResult<()> {
        match stmt {
            Stmt::Block(stmts) => {
                stmts.iter().try_for_each(|s| self.stmt(s))
            }
            Stmt::Node { name, value } => {
                self.nodes.push((*name, value));
                Ok(())
            }
            Stmt::Register {
                name,
                typ,
                clock,
                reset,
            } => self.register(*name, *typ, clock, reset.as_ref()),
            Stmt::Memory(mem) => self.memory(mem),
            Stmt::Connect { lhs, rhs } => self.connect(lhs, rhs),
            Stmt::Wire { name, .. } => Err(Error::illegal_statement(
                format!("raw wire definition `{}`", name),
            )),
            Stmt::Instance { name, module } => Err(Error::illegal_statement(
                format!("instance `{}` of module `{}`", name, module),
            )),
        }
    }

    fn record_clock(&mut self, clock: &Expr) -> TernResult<()> {
        match clock.flat_name() {
            Some(name) => {
                self.clocks.insert(name);
                Ok(())
            }
            None => Err(Error::unsupported_module_shape(
                "clock is not a signal reference",
            )),
        }
    }

    fn register(
        &mut self,
        name: Id,
        typ: Type,
        clock: &Expr,
        reset: Option<&'a Expr>,
    ) -> TernResult<()> {
        self.record_clock(clock)?;
        match reset {
            None | Some(Expr::UIntLit { value: 0, .. }) => {}
            Some(Expr::Ref { name: rst, .. }) => {
                self.reset_names.insert(*rst);
            }
            Some(_) => {
                return Err(Error::illegal_reset(format!(
                    "register `{}` has a reset that is neither zero nor a \
                     signal reference",
                    name
                )))
            }
        }
        self.registers.insert(name, typ);
        Ok(())
    }

    fn memory(&mut self, mem: &'a MemDef) -> TernResult<()> {
        if mem.write_latency != 1 {
            return Err(Error::invariant_violated(format!(
                "memory `{}` has write latency {}",
                mem.name, mem.write_latency
            )));
        }
        if mem.read_latency != 0 {
            return Err(Error::invariant_violated(format!(
                "memory `{}` has read latency {}",
                mem.name, mem.read_latency
            )));
        }
        if !mem.readwriters.is_empty() {
            return Err(Error::invariant_violated(format!(
                "memory `{}` has {} read-write ports",
                mem.name,
                mem.readwriters.len()
            )));
        }
        if mem.data_type.is_clock() {
            return Err(Error::invariant_violated(format!(
                "memory `{}` has a non-ground data type",
                mem.name
            )));
        }
        self.memories.push(mem);
        self.wires.push((
            Id::new(format!("havoc_{}", mem.name)),
            mem.data_type,
        ));
        let addr_type = Type::uint(bits_needed_for(mem.depth));
        for port in &mem.readers {
            self.port_wires(*port, mem, addr_type, false);
        }
        for port in &mem.writers {
            self.port_wires(*port, mem, addr_type, true);
        }
        Ok(())
    }

    /// Synthesize the flat wires that carry one memory port's signals.
    fn port_wires(
        &mut self,
        port: Id,
        mem: &MemDef,
        addr_type: Type,
        is_writer: bool,
    ) {
        self.mem_ports.insert(port, mem.name);
        self.wires.push((flatten(port, "data".into()), mem.data_type));
        self.wires.push((flatten(port, "addr".into()), addr_type));
        self.wires.push((flatten(port, "en".into()), Type::uint(1)));
        if is_writer {
            self.wires
                .push((flatten(port, "mask".into()), Type::uint(1)));
        }
    }

    fn connect(&mut self, lhs: &'a Expr, rhs: &'a Expr) -> TernResult<()> {
        match lhs {
            Expr::Ref { name, .. } if self.registers.contains_key(name) => {
                self.register_assigns.push((lhs, rhs));
                Ok(())
            }
            Expr::Ref { name, .. } if self.out_ports.contains(name) => {
                self.port_assigns.push((lhs, rhs));
                Ok(())
            }
            Expr::SubField { base, .. }
                if self.mem_ports.contains_key(base) =>
            {
                if rhs.typ().is_clock() {
                    // A clock hook on the port; nothing to emit.
                    self.record_clock(rhs)
                } else {
                    self.port_assigns.push((lhs, rhs));
                    Ok(())
                }
            }
            _ => Err(Error::illegal_statement(format!(
                "connect to `{}`, which is not a register, output port, or \
                 memory port field",
                lhs.flat_name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "<expression>".to_string())
            ))),
        }
    }
}
