//! End-to-end tests: build circuits in memory, translate them, and check the
//! emitted model text.
use tern_backend::{emit_circuit, Backend, UclidBackend};
use tern_ir::{
    Annotation, Context, Expr, Id, MemDef, Module, Port, PrimOp, Stmt, Type,
};
use tern_utils::OutputFile;

/// Translate a circuit through the annotation path and return the rendered
/// text.
fn emitted(mut ctx: Context) -> String {
    ctx.annotations.push(Annotation::EmitCircuit);
    emit_circuit(&mut ctx).unwrap();
    ctx.annotations
        .iter()
        .find_map(|ann| match ann {
            Annotation::EmittedCircuit { text } => Some(text.clone()),
            _ => None,
        })
        .expect("translation should append the rendered text")
}

fn clock_ref() -> Expr {
    Expr::reference("clock", Type::Clock)
}

/// The classic GCD circuit: two 16-bit registers, a swap-and-subtract
/// datapath, and valid/output ports.
fn gcd_module() -> Module {
    let u16t = Type::uint(16);
    let boolt = Type::uint(1);
    let x = Expr::reference("x", u16t);
    let y = Expr::reference("y", u16t);
    let t = Expr::reference("_T", boolt);
    let loading = Expr::reference("io_loadingValues", boolt);

    let body = Stmt::Block(vec![
        Stmt::Register {
            name: "x".into(),
            typ: u16t,
            clock: clock_ref(),
            reset: None,
        },
        Stmt::Register {
            name: "y".into(),
            typ: u16t,
            clock: clock_ref(),
            reset: None,
        },
        Stmt::Node {
            name: "_T".into(),
            value: Expr::prim(
                PrimOp::Gt,
                vec![x.clone(), y.clone()],
                vec![],
                boolt,
            ),
        },
        Stmt::Node {
            name: "_T_2".into(),
            value: Expr::prim(
                PrimOp::SubWrap,
                vec![x.clone(), y.clone()],
                vec![],
                u16t,
            ),
        },
        Stmt::Node {
            name: "_T_4".into(),
            value: Expr::prim(
                PrimOp::SubWrap,
                vec![y.clone(), x.clone()],
                vec![],
                u16t,
            ),
        },
        Stmt::Node {
            name: "_GEN_0".into(),
            value: Expr::mux(
                t.clone(),
                Expr::reference("_T_2", u16t),
                x.clone(),
            ),
        },
        Stmt::Node {
            name: "_GEN_1".into(),
            value: Expr::mux(
                t.clone(),
                y.clone(),
                Expr::reference("_T_4", u16t),
            ),
        },
        Stmt::Node {
            name: "x_next".into(),
            value: Expr::mux(
                loading.clone(),
                Expr::reference("io_value1", u16t),
                Expr::reference("_GEN_0", u16t),
            ),
        },
        Stmt::Node {
            name: "y_next".into(),
            value: Expr::mux(
                loading.clone(),
                Expr::reference("io_value2", u16t),
                Expr::reference("_GEN_1", u16t),
            ),
        },
        Stmt::Connect {
            lhs: x.clone(),
            rhs: Expr::reference("x_next", u16t),
        },
        Stmt::Connect {
            lhs: y.clone(),
            rhs: Expr::reference("y_next", u16t),
        },
        Stmt::Connect {
            lhs: Expr::reference("io_outputGCD", u16t),
            rhs: x.clone(),
        },
        Stmt::Connect {
            lhs: Expr::reference("io_outputValid", boolt),
            rhs: Expr::prim(
                PrimOp::Eq,
                vec![y.clone(), Expr::uint_lit(0, 16)],
                vec![],
                boolt,
            ),
        },
    ]);

    Module::new(
        "GCD",
        vec![
            Port::input("clock", Type::Clock),
            Port::input("io_value1", u16t),
            Port::input("io_value2", u16t),
            Port::input("io_loadingValues", boolt),
            Port::output("io_outputGCD", u16t),
            Port::output("io_outputValid", boolt),
        ],
        body,
    )
}

/// A module holding one memory with the given reader and writer ports, each
/// port driven from input ports of matching width.
fn mem_module(readers: &[&str], writers: &[&str]) -> Module {
    let data_t = Type::uint(8);
    let addr_t = Type::uint(4);
    let boolt = Type::uint(1);
    let mut body = vec![Stmt::Memory(MemDef {
        name: "mem".into(),
        data_type: data_t,
        depth: 16,
        write_latency: 1,
        read_latency: 0,
        readers: readers.iter().map(|r| Id::from(*r)).collect(),
        writers: writers.iter().map(|w| Id::from(*w)).collect(),
        readwriters: vec![],
    })];
    let mut ports = vec![
        Port::input("clock", Type::Clock),
        Port::input("io_addr", addr_t),
        Port::input("io_data", data_t),
        Port::input("io_en", boolt),
    ];
    for port in readers.iter().chain(writers.iter()) {
        // Hook the port clock; the translator drops it.
        body.push(Stmt::Connect {
            lhs: Expr::subfield(*port, "clk", Type::Clock),
            rhs: clock_ref(),
        });
        body.push(Stmt::Connect {
            lhs: Expr::subfield(*port, "addr", addr_t),
            rhs: Expr::reference("io_addr", addr_t),
        });
        body.push(Stmt::Connect {
            lhs: Expr::subfield(*port, "en", boolt),
            rhs: Expr::reference("io_en", boolt),
        });
    }
    for writer in writers {
        body.push(Stmt::Connect {
            lhs: Expr::subfield(*writer, "data", data_t),
            rhs: Expr::reference("io_data", data_t),
        });
        body.push(Stmt::Connect {
            lhs: Expr::subfield(*writer, "mask", boolt),
            rhs: Expr::uint_lit(1, 1),
        });
    }
    for reader in readers {
        ports.push(Port::output(format!("io_{}_out", reader), data_t));
        body.push(Stmt::Connect {
            lhs: Expr::reference(format!("io_{}_out", reader), data_t),
            rhs: Expr::subfield(*reader, "data", data_t),
        });
    }
    Module::new("Mem", ports, Stmt::Block(body))
}

/// True when `text` declares a raw `bv1` sort anywhere.
fn mentions_bv1(text: &str) -> bool {
    text.match_indices("bv1").any(|(i, _)| {
        text[i + 3..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_digit())
    })
}

/// Brace depth never goes negative and returns to zero.
fn braces_balanced(text: &str) -> bool {
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[test]
fn gcd_declarations() {
    let text = emitted(Context::new(gcd_module()));
    assert!(text.starts_with("module GCD {"));
    assert!(text.contains("input io_value1 : bv16;"));
    assert!(text.contains("input io_loadingValues : boolean;"));
    assert!(text.contains("output io_outputGCD : bv16;"));
    assert!(text.contains("output io_outputValid : boolean;"));
    assert!(text.contains("var x : bv16;"));
    assert!(text.contains("var y : bv16;"));
    assert!(text.contains("var _T : boolean;"));
    assert!(text.contains("var _T_2 : bv16;"));
    assert!(text.contains("var x_next : bv16;"));
    // The clock never appears as a declaration.
    assert!(!text.contains("input clock"));
    assert!(!mentions_bv1(&text));
    assert!(braces_balanced(&text));
}

#[test]
fn gcd_init_block() {
    let text = emitted(Context::new(gcd_module()));
    assert!(text.contains("_T = x > y;"));
    assert!(text.contains("_T_2 = x - y;"));
    assert!(
        text.contains("x_next = if (io_loadingValues) then (io_value1) else (_GEN_0);")
    );
    assert!(text.contains("io_outputGCD = x;"));
    assert!(text.contains("io_outputValid = y == 0bv16;"));
    // The init block reads only the pre-step snapshot.
    let start = text.find("init {").unwrap();
    let end = start + text[start..].find("\n  }").unwrap();
    assert!(!text[start..end].contains('\''));
}

#[test]
fn gcd_next_block_phases() {
    let text = emitted(Context::new(gcd_module()));
    // Clock high: primed registers from unprimed right-hand sides.
    assert!(text.contains("x' = x_next;"));
    assert!(text.contains("y' = y_next;"));
    // Clock low: recomputed nodes and ports against primed state.
    assert!(text.contains("_T' = x' > y';"));
    assert!(text.contains("_T_2' = x' - y';"));
    assert!(text.contains(
        "x_next' = if (io_loadingValues') then (io_value1') else (_GEN_0');"
    ));
    assert!(text.contains("io_outputGCD' = x';"));
    assert!(text.contains("io_outputValid' = y' == 0bv16;"));
    // Registers latch before nodes recompute.
    assert!(text.find("x' = x_next;").unwrap() < text.find("_T' =").unwrap());
}

#[test]
fn gcd_primed_assignment_count() {
    let text = emitted(Context::new(gcd_module()));
    let start = text.find("next {").unwrap();
    let end = start + text[start..].find("\n  }").unwrap();
    let next_block = &text[start..end];
    // 2 register assigns + 7 nodes + 2 port connects.
    assert_eq!(next_block.matches("' = ").count(), 11);
}

#[test]
fn single_writer_memory() {
    let text = emitted(Context::new(mem_module(&[], &["w"])));
    assert!(text.contains("var mem : [bv4]bv8;"));
    assert!(text.contains("var havoc_mem : bv8;"));
    assert!(text.contains("var w_data : bv8;"));
    assert!(text.contains("var w_addr : bv4;"));
    assert!(text.contains("var w_en : boolean;"));
    assert!(text.contains("var w_mask : boolean;"));
    assert!(text.contains("assume (forall (a : bv4) :: mem[a] == 0bv8);"));
    assert!(text
        .contains("procedure write_mem_mem() modifies mem, havoc_mem; {"));
    assert!(
        text.contains("if (w_en && w_mask) { mem[w_addr] := w_data; }")
    );
    assert!(text.contains("call write_mem_mem();"));
    // One writer: no collision arbitration.
    assert!(!text.contains("havoc havoc_mem;"));
    assert!(braces_balanced(&text));
}

#[test]
fn reader_memory_reads_in_clock_low() {
    let text = emitted(Context::new(mem_module(&["r"], &["w"])));
    assert!(text.contains("var r_data : bv8;"));
    assert!(text.contains("var r_en : boolean;"));
    // Readers carry no mask wire.
    assert!(!text.contains("r_mask"));
    assert!(text.contains("r_data' = mem[r_addr'];"));
    assert!(text.contains("io_r_out' = r_data';"));
    // The read settles after the write procedure commits.
    let call = text.find("call write_mem_mem();").unwrap();
    let read = text.find("r_data' = mem[r_addr'];").unwrap();
    assert!(call < read);
}

#[test]
fn reader_only_memory_still_declares_the_procedure() {
    let text = emitted(Context::new(mem_module(&["r"], &[])));
    assert!(text
        .contains("procedure write_mem_mem() modifies mem, havoc_mem; {"));
    assert!(text.contains("call write_mem_mem();"));
    // No writers: the procedure body is empty.
    assert!(!text.contains("if ("));
}

#[test]
fn two_writer_collision() {
    let text = emitted(Context::new(mem_module(&[], &["a", "b"])));
    assert!(text.contains(
        "if (a_en && b_en && a_mask && b_mask && a_addr == b_addr) \
         { havoc havoc_mem; mem[a_addr] := havoc_mem; }"
    ));
    assert_eq!(text.matches("havoc havoc_mem;").count(), 1);
}

#[test]
fn collision_clauses_are_pairwise() {
    let text = emitted(Context::new(mem_module(&[], &["a", "b", "c"])));
    // C(3, 2) unordered pairs.
    assert_eq!(text.matches("havoc havoc_mem;").count(), 3);
    let commits = text.find("if (a_en && a_mask)").unwrap();
    let collisions = text.find("havoc havoc_mem;").unwrap();
    assert!(commits < collisions);
}

#[test]
fn bmc_and_property_annotations() {
    let mut ctx = Context::new(gcd_module());
    ctx.annotations.push(Annotation::Property {
        target: "io_outputValid".into(),
    });
    ctx.annotations.push(Annotation::Assume {
        target: "io_loadingValues".into(),
    });
    ctx.annotations.push(Annotation::Bmc { steps: 20 });
    let text = emitted(ctx);
    assert!(text
        .contains("assume assert_io_loadingValues : io_loadingValues;"));
    assert!(text
        .contains("invariant assert_io_outputValid : io_outputValid;"));
    assert!(text.contains("control {"));
    assert!(text.contains("vobj = unroll(20);"));
    assert!(text.contains("check;"));
    assert!(text.contains("print_results();"));
    assert!(text.contains("vobj.print_cex();"));
    // Directives follow the next block; the control block closes the module.
    assert!(text.find("invariant").unwrap() > text.find("next {").unwrap());
    assert!(text.trim_end().ends_with('}'));
    assert!(braces_balanced(&text));
}

#[test]
fn no_control_block_without_bmc() {
    let text = emitted(Context::new(gcd_module()));
    assert!(!text.contains("control {"));
}

#[test]
fn emission_is_deterministic() {
    let a = emitted(Context::new(gcd_module()));
    let b = emitted(Context::new(gcd_module()));
    assert_eq!(a, b);
}

#[test]
fn declarations_are_unique() {
    let text = emitted(Context::new(mem_module(&["r"], &["w"])));
    for decl in [
        "var mem :",
        "var havoc_mem :",
        "var r_data :",
        "var w_mask :",
    ] {
        assert_eq!(text.matches(decl).count(), 1, "duplicate `{}`", decl);
    }
    assert_eq!(text.matches("procedure write_mem_mem()").count(), 1);
    assert_eq!(text.matches("call write_mem_mem();").count(), 1);
}

#[test]
fn emit_requires_an_emission_annotation() {
    let mut ctx = Context::new(gcd_module());
    emit_circuit(&mut ctx).unwrap();
    assert!(!ctx
        .annotations
        .iter()
        .any(|ann| matches!(ann, Annotation::EmittedCircuit { .. })));
}

#[test]
fn backend_runs_against_a_sink() {
    let ctx = Context::new(gcd_module());
    UclidBackend.run(&ctx, OutputFile::Null).unwrap();
}

#[test]
fn reference_reset_suppresses_the_port() {
    let u8t = Type::uint(8);
    let body = Stmt::Block(vec![
        Stmt::Register {
            name: "r".into(),
            typ: u8t,
            clock: clock_ref(),
            reset: Some(Expr::reference("reset", Type::uint(1))),
        },
        Stmt::Connect {
            lhs: Expr::reference("r", u8t),
            rhs: Expr::reference("io_in", u8t),
        },
    ]);
    let module = Module::new(
        "Reg",
        vec![
            Port::input("clock", Type::Clock),
            Port::input("reset", Type::uint(1)),
            Port::input("io_in", u8t),
        ],
        body,
    );
    let text = emitted(Context::new(module));
    assert!(!text.contains("input reset"));
    assert!(text.contains("var r : bv8;"));
    assert!(text.contains("r' = io_in;"));
}

#[test]
fn zero_reset_is_accepted() {
    let body = Stmt::Block(vec![Stmt::Register {
        name: "r".into(),
        typ: Type::uint(8),
        clock: clock_ref(),
        reset: Some(Expr::uint_lit(0, 1)),
    }]);
    let module =
        Module::new("Reg", vec![Port::input("clock", Type::Clock)], body);
    let text = emitted(Context::new(module));
    assert!(text.contains("var r : bv8;"));
}

fn emit_err(module: Module) -> String {
    let mut ctx = Context::new(module);
    ctx.annotations.push(Annotation::EmitCircuit);
    emit_circuit(&mut ctx).unwrap_err().to_string()
}

#[test]
fn raw_wires_are_rejected() {
    let body = Stmt::Block(vec![Stmt::Wire {
        name: "w".into(),
        typ: Type::uint(8),
    }]);
    let err = emit_err(Module::new("Bad", vec![], body));
    assert!(err.contains("Illegal statement"));
}

#[test]
fn instances_are_rejected() {
    let body = Stmt::Block(vec![Stmt::Instance {
        name: "sub".into(),
        module: "Child".into(),
    }]);
    let err = emit_err(Module::new("Bad", vec![], body));
    assert!(err.contains("Illegal statement"));
}

#[test]
fn connects_to_inputs_are_rejected() {
    let body = Stmt::Block(vec![Stmt::Connect {
        lhs: Expr::reference("io_in", Type::uint(8)),
        rhs: Expr::uint_lit(0, 8),
    }]);
    let module = Module::new(
        "Bad",
        vec![Port::input("io_in", Type::uint(8))],
        body,
    );
    let err = emit_err(module);
    assert!(err.contains("Illegal statement"));
}

#[test]
fn multiple_clocks_are_rejected() {
    let body = Stmt::Block(vec![
        Stmt::Register {
            name: "r0".into(),
            typ: Type::uint(8),
            clock: Expr::reference("clock_a", Type::Clock),
            reset: None,
        },
        Stmt::Register {
            name: "r1".into(),
            typ: Type::uint(8),
            clock: Expr::reference("clock_b", Type::Clock),
            reset: None,
        },
    ]);
    let module = Module::new(
        "Bad",
        vec![
            Port::input("clock_a", Type::Clock),
            Port::input("clock_b", Type::Clock),
        ],
        body,
    );
    let err = emit_err(module);
    assert!(err.contains("Unsupported module shape"));
}

#[test]
fn nonzero_reset_is_rejected() {
    let body = Stmt::Block(vec![Stmt::Register {
        name: "r".into(),
        typ: Type::uint(8),
        clock: clock_ref(),
        reset: Some(Expr::uint_lit(1, 1)),
    }]);
    let err = emit_err(Module::new("Bad", vec![], body));
    assert!(err.contains("Illegal reset"));
}

#[test]
fn memory_latency_invariants_are_enforced() {
    let mut mem = MemDef {
        name: "mem".into(),
        data_type: Type::uint(8),
        depth: 16,
        write_latency: 1,
        read_latency: 1,
        readers: vec!["r".into()],
        writers: vec![],
        readwriters: vec![],
    };
    let err = emit_err(Module::new(
        "Bad",
        vec![],
        Stmt::Block(vec![Stmt::Memory(mem.clone())]),
    ));
    assert!(err.contains("Invariant violated"));

    mem.read_latency = 0;
    mem.readwriters = vec!["rw".into()];
    let err = emit_err(Module::new(
        "Bad",
        vec![],
        Stmt::Block(vec![Stmt::Memory(mem)]),
    ));
    assert!(err.contains("Invariant violated"));
}

#[test]
fn multi_module_circuits_are_rejected() {
    let make = || gcd_module();
    let mut ctx = Context::new(make());
    ctx.modules.push(make());
    assert!(UclidBackend::validate(&ctx).is_err());
    ctx.annotations.push(Annotation::EmitCircuit);
    let err = emit_circuit(&mut ctx).unwrap_err().to_string();
    assert!(err.contains("Unsupported module shape"));
}
