//! Transition-system backend.
//!
//! Renders a classified module as a model with an `init` block, a two-phase
//! `next` block, per-memory write procedures, and optional verification
//! directives. The `next` block's first phase latches registers against the
//! pre-step snapshot (unprimed right-hand sides); the second phase settles
//! nodes, memory reads, and port connections against the post-step register
//! values (primed right-hand sides). The same expression serializer handles
//! both phases, parameterized only by the primed-mode flag.
mod classify;
mod exprs;

use crate::traits::Backend;
use itertools::Itertools;
use std::io::{self, Write};
use std::time::Instant;
use tern_ir::{self as ir, Annotation, Expr, MemDef, Module, Type};
use tern_utils::{bits_needed_for, Error, Id, OutputFile, TernResult};

use classify::ModuleClasses;
use exprs::{expr_str, type_str};

/// Backend that renders a circuit as a transition-system model.
#[derive(Default)]
pub struct UclidBackend;

impl Backend for UclidBackend {
    fn name(&self) -> &'static str {
        "uclid"
    }

    fn validate(ctx: &ir::Context) -> TernResult<()> {
        ctx.entrypoint().map(|_| ())
    }

    fn emit(ctx: &ir::Context, file: &mut OutputFile) -> TernResult<()> {
        let text = render(ctx)?;
        let fw = &mut file.get_write()?;
        fw.write_all(text.as_bytes()).map_err(|_| {
            Error::write_error(format!(
                "failed to write `{}`",
                file.as_path_string()
            ))
        })
    }
}

/// Consume the circuit's annotations: when an emission request is present,
/// translate the circuit and append the rendered text as a new annotation.
pub fn emit_circuit(ctx: &mut ir::Context) -> TernResult<()> {
    let requested = ctx
        .annotations
        .iter()
        .any(|ann| matches!(ann, Annotation::EmitCircuit));
    if !requested {
        return Ok(());
    }
    let text = render(ctx)?;
    ctx.annotations.push(Annotation::EmittedCircuit { text });
    Ok(())
}

/// Render the circuit's single module to a string. Nothing is produced on
/// failure.
fn render(ctx: &ir::Context) -> TernResult<String> {
    let module = ctx.entrypoint()?;
    let sink = AnnotationSink::collect(&ctx.annotations);
    let start = Instant::now();
    let mut buf = Vec::new();
    write_module(module, &sink, &mut buf)?;
    log::info!("Translated `{}` in {:?}", module.name, start.elapsed());
    String::from_utf8(buf)
        .map_err(|_| Error::write_error("emitted text is not valid UTF-8"))
}

/// Verification directives gathered from the circuit's annotations.
#[derive(Default)]
struct AnnotationSink {
    assumes: Vec<Id>,
    properties: Vec<Id>,
    bmc_steps: Option<u64>,
}

impl AnnotationSink {
    fn collect(annotations: &[Annotation]) -> Self {
        let mut sink = AnnotationSink::default();
        for ann in annotations {
            match ann {
                Annotation::Assume { target } => sink.assumes.push(*target),
                Annotation::Property { target } => {
                    sink.properties.push(*target)
                }
                Annotation::Bmc { steps } => {
                    // The first request wins; inputs carry at most one.
                    sink.bmc_steps.get_or_insert(*steps);
                }
                Annotation::EmitCircuit
                | Annotation::EmittedCircuit { .. } => {}
            }
        }
        sink
    }
}

/// Indented line writer. Scopes open and close in pairs, so braces stay
/// balanced by construction.
struct Emitter<'a, F: io::Write> {
    f: &'a mut F,
    indent: usize,
}

impl<'a, F: io::Write> Emitter<'a, F> {
    fn new(f: &'a mut F) -> Self {
        Emitter { f, indent: 0 }
    }

    fn line<S: AsRef<str>>(&mut self, s: S) -> TernResult<()> {
        writeln!(self.f, "{}{}", "  ".repeat(self.indent), s.as_ref())?;
        Ok(())
    }

    fn open<S: AsRef<str>>(&mut self, header: S) -> TernResult<()> {
        self.line(format!("{} {{", header.as_ref()))?;
        self.indent += 1;
        Ok(())
    }

    fn close(&mut self) -> TernResult<()> {
        self.indent -= 1;
        self.line("}")
    }
}

/// Index sort for a memory: wide enough to address every location.
fn addr_type(mem: &MemDef) -> Type {
    Type::uint(bits_needed_for(mem.depth))
}

/// The all-zeros literal of a ground type.
fn zero_of(typ: Type) -> Expr {
    if typ.is_signed() {
        Expr::sint_lit(0, typ.width())
    } else {
        Expr::uint_lit(0, typ.width())
    }
}

fn write_module<F: io::Write>(
    module: &Module,
    sink: &AnnotationSink,
    f: &mut F,
) -> TernResult<()> {
    let classes = ModuleClasses::build(module)?;
    let mut em = Emitter::new(f);
    em.open(format!("module {}", module.name))?;

    // Clock ports and reference resets have no counterpart in the model.
    for port in &module.ports {
        if port.typ.is_clock() || classes.reset_names.contains(&port.name) {
            continue;
        }
        let dir = match port.direction {
            ir::Direction::Input => "input",
            ir::Direction::Output => "output",
        };
        em.line(format!(
            "{} {} : {};",
            dir,
            port.name,
            type_str(port.typ)
        ))?;
    }

    em.line("// Registers")?;
    for (name, typ) in &classes.registers {
        em.line(format!("var {} : {};", name, type_str(*typ)))?;
    }

    em.line("// Memories")?;
    for mem in &classes.memories {
        em.line(format!(
            "var {} : [{}]{};",
            mem.name,
            type_str(addr_type(mem)),
            type_str(mem.data_type)
        ))?;
    }

    em.line("// Wires")?;
    for (name, typ) in &classes.wires {
        em.line(format!("var {} : {};", name, type_str(*typ)))?;
    }

    em.line("// Nodes")?;
    for (name, value) in &classes.nodes {
        em.line(format!("var {} : {};", name, type_str(value.typ())))?;
    }

    em.line("// Init")?;
    em.open("init")?;
    for mem in &classes.memories {
        em.line(format!(
            "assume (forall (a : {}) :: {}[a] == {});",
            type_str(addr_type(mem)),
            mem.name,
            expr_str(&zero_of(mem.data_type), false)?
        ))?;
    }
    for (name, value) in &classes.nodes {
        em.line(format!("{} = {};", name, expr_str(value, false)?))?;
    }
    for (lhs, rhs) in &classes.port_assigns {
        em.line(format!(
            "{} = {};",
            expr_str(lhs, false)?,
            expr_str(rhs, false)?
        ))?;
    }
    em.close()?;

    em.line("// Mem Writes")?;
    for mem in &classes.memories {
        write_mem_procedure(mem, &mut em)?;
    }

    em.open("next")?;
    // Clock high: memories commit, then registers latch values computed
    // from the pre-step snapshot.
    for mem in &classes.memories {
        em.line(format!("call write_mem_{}();", mem.name))?;
    }
    for (lhs, rhs) in &classes.register_assigns {
        em.line(format!(
            "{} = {};",
            expr_str(lhs, true)?,
            expr_str(rhs, false)?
        ))?;
    }
    // Clock low: nodes, memory reads, and port connections settle against
    // the post-step register values.
    for (name, value) in &classes.nodes {
        em.line(format!("{}' = {};", name, expr_str(value, true)?))?;
    }
    for mem in &classes.memories {
        for reader in &mem.readers {
            em.line(format!(
                "{}_data' = {}[{}_addr'];",
                reader, mem.name, reader
            ))?;
        }
    }
    for (lhs, rhs) in &classes.port_assigns {
        em.line(format!(
            "{} = {};",
            expr_str(lhs, true)?,
            expr_str(rhs, true)?
        ))?;
    }
    em.close()?;

    for target in &sink.assumes {
        em.line(format!("assume assert_{} : {};", target, target))?;
    }
    for target in &sink.properties {
        em.line(format!("invariant assert_{} : {};", target, target))?;
    }
    if let Some(steps) = sink.bmc_steps {
        em.open("control")?;
        em.line(format!("vobj = unroll({});", steps))?;
        em.line("check;")?;
        em.line("print_results();")?;
        em.line("vobj.print_cex();")?;
        em.close()?;
    }

    em.close()
}

/// Emit the write procedure for one memory: sequenced port commits followed
/// by pairwise collision arbitration. A collision overwrites the committed
/// value with a fresh nondeterministic one, so colliding writes stay
/// undefined in the model.
fn write_mem_procedure<F: io::Write>(
    mem: &MemDef,
    em: &mut Emitter<F>,
) -> TernResult<()> {
    em.open(format!(
        "procedure write_mem_{}() modifies {}, havoc_{};",
        mem.name, mem.name, mem.name
    ))?;
    for port in &mem.writers {
        em.line(format!(
            "if ({p}_en && {p}_mask) {{ {m}[{p}_addr] := {p}_data; }}",
            p = port,
            m = mem.name
        ))?;
    }
    for (a, b) in mem.writers.iter().tuple_combinations() {
        em.line(format!(
            "if ({a}_en && {b}_en && {a}_mask && {b}_mask && {a}_addr == \
             {b}_addr) {{ havoc havoc_{m}; {m}[{a}_addr] := havoc_{m}; }}",
            a = a,
            b = b,
            m = mem.name
        ))?;
    }
    em.close()
}
