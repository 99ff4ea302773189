//! Message-dispatch engine of the runtime: processes, the interpreter
//! loop, sends and closure activation, exceptions and the primitive
//! library.

pub mod demo;
pub mod dispatch;
pub mod error;
pub mod exception;
pub mod interpreter;
pub mod output;
pub mod primitives;
pub mod process;
pub mod settings;
pub mod special;

use std::rc::Rc;

use bytecode::Program;
use log::debug;
use object::{Code, Scope, ScopeRef, SpecialObjects, Symbol, Value, WorldRef};

pub use error::RuntimeError;
pub use output::Output;
pub use process::{FrameKind, Process};
pub use settings::VmSettings;

/// The runtime: prototypes, primitives, the global scope and the root
/// world shared by every process.
pub struct VM {
    pub specials: SpecialObjects,
    /// Registered primitives. Internal closures index into this.
    pub primitives: Vec<primitives::PrimitiveDesc>,
    pub globals: ScopeRef,
    pub root_world: WorldRef,
    pub settings: VmSettings,
    pub output: Output,
}

impl VM {
    pub fn new(settings: VmSettings, output: Output) -> Result<Self, RuntimeError> {
        special::bootstrap(settings, output)
    }

    /// Builds the symbol-translation table and constant pool for `program`.
    pub fn load(&self, program: Program) -> Result<Rc<Code>, RuntimeError> {
        Ok(Code::load(program)?)
    }

    /// A fresh process in the root world with no frames.
    pub fn new_process(&self) -> Process {
        Process::new(self.root_world.clone(), self.settings.stack_capacity)
    }

    /// Runs a whole program in a fresh process and returns the value it
    /// ends with.
    ///
    /// The program's globals are declared (as nil) in the global scope
    /// unless they already exist, so later programs see earlier ones'
    /// globals.
    pub fn run(&mut self, code: Rc<Code>) -> Result<Value, RuntimeError> {
        for name in code.globals() {
            if !self.globals.has_local(name) {
                self.globals.declare(name, Value::Nil, &self.root_world);
            }
        }
        let mut process = self.new_process();
        let scope = Scope::new(Some(self.globals.clone()), None);
        process.push_scope(scope, code, 0, FrameKind::Program);
        debug!("running program");
        interpreter::run(self, &mut process, 0)
    }

    /// Host entry point: sends `selector` to `receiver` and runs any
    /// activated method to completion.
    pub fn send(
        &mut self,
        process: &mut Process,
        receiver: Value,
        selector: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        dispatch::send_value(self, process, receiver, Symbol::intern(selector), args)
    }

    /// Value of global `name` as seen from the root world.
    pub fn global(&self, name: &str) -> Option<Value> {
        let name = Symbol::intern(name);
        if !self.globals.has_local(name) {
            return None;
        }
        self.globals.lookup(name, &self.root_world).ok()
    }
}
