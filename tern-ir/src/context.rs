//! Top-level circuit context handed to backends.
use crate::{Annotation, Stmt, Type};
use tern_utils::{Error, GetName, Id, TernResult};

/// Direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// A port on a module.
#[derive(Debug, Clone)]
pub struct Port {
    pub name: Id,
    pub direction: Direction,
    pub typ: Type,
}

impl Port {
    pub fn input<N: Into<Id>>(name: N, typ: Type) -> Self {
        Port {
            name: name.into(),
            direction: Direction::Input,
            typ,
        }
    }

    pub fn output<N: Into<Id>>(name: N, typ: Type) -> Self {
        Port {
            name: name.into(),
            direction: Direction::Output,
            typ,
        }
    }
}

/// Whether a module is defined in this circuit or externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Ordinary,
    External,
}

/// A flat module: ports plus a body tree.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: Id,
    pub kind: ModuleKind,
    pub ports: Vec<Port>,
    pub body: Stmt,
}

impl Module {
    pub fn new<N: Into<Id>>(name: N, ports: Vec<Port>, body: Stmt) -> Self {
        Module {
            name: name.into(),
            kind: ModuleKind::Ordinary,
            ports,
            body,
        }
    }
}

impl GetName for Module {
    fn name(&self) -> Id {
        self.name
    }
}

/// A circuit together with its side-channel annotations. This is the
/// top-level value a backend consumes.
#[derive(Debug, Clone)]
pub struct Context {
    pub modules: Vec<Module>,
    pub annotations: Vec<Annotation>,
}

impl Context {
    pub fn new(module: Module) -> Self {
        Context {
            modules: vec![module],
            annotations: Vec::new(),
        }
    }

    /// The single ordinary module the translator works on. Multi-module
    /// circuits and external modules are rejected.
    pub fn entrypoint(&self) -> TernResult<&Module> {
        match self.modules.as_slice() {
            [module] if module.kind == ModuleKind::Ordinary => Ok(module),
            [module] => Err(Error::unsupported_module_shape(format!(
                "module `{}` is not an ordinary module",
                module.name
            ))),
            _ => Err(Error::unsupported_module_shape(format!(
                "expected exactly one module, found {}",
                self.modules.len()
            ))),
        }
    }
}
