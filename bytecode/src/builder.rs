use std::collections::HashMap;

use thiserror::Error;

use crate::op::Op;
use crate::program::{BlockDesc, Constant, MethodDesc, ObjectDesc, Program};

/// Builds a bytecode byte sequence.
///
/// The builder automatically emits the [`Op::Wide`] or [`Op::ExtraWide`]
/// prefix when a small integer does not fit in a byte.
pub struct BytecodeBuilder {
    buf: Vec<u8>,
}

impl BytecodeBuilder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current byte offset in the bytecode stream.
    pub fn current_offset(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    // ── emit helpers ───────────────────────────────────────────────

    fn emit_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn emit_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn emit_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn emit_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn emit_op(&mut self, op: Op) {
        self.buf.push(op as u8);
    }

    /// `PushConstant <idx:u16>`.
    pub fn push_constant(&mut self, idx: u16) {
        self.emit_op(Op::PushConstant);
        self.emit_u16(idx);
    }

    /// `PushSmi <value>`. Uses the 8-bit, 16-bit (`Wide`) or 32-bit
    /// (`ExtraWide`) encoding based on the value.
    pub fn push_smi(&mut self, value: i32) {
        if let Ok(v) = i8::try_from(value) {
            self.emit_op(Op::PushSmi);
            self.emit_u8(v as u8);
        } else if let Ok(v) = i16::try_from(value) {
            self.emit_op(Op::Wide);
            self.emit_op(Op::PushSmi);
            self.emit_i16(v);
        } else {
            self.emit_op(Op::ExtraWide);
            self.emit_op(Op::PushSmi);
            self.emit_u32(value as u32);
        }
    }

    pub fn push_nil(&mut self) {
        self.emit_op(Op::PushNil);
    }

    pub fn push_true(&mut self) {
        self.emit_op(Op::PushTrue);
    }

    pub fn push_false(&mut self) {
        self.emit_op(Op::PushFalse);
    }

    pub fn push_self(&mut self) {
        self.emit_op(Op::PushSelf);
    }

    /// `PushVariable <symbol:u16>`.
    pub fn push_variable(&mut self, symbol: u16) {
        self.emit_op(Op::PushVariable);
        self.emit_u16(symbol);
    }

    /// `SetVariable <symbol:u16>`.
    pub fn set_variable(&mut self, symbol: u16) {
        self.emit_op(Op::SetVariable);
        self.emit_u16(symbol);
    }

    pub fn pop(&mut self) {
        self.emit_op(Op::Pop);
    }

    /// `Send <symbol:u16> <argc:u8>`. Receiver and arguments are on the stack.
    pub fn send(&mut self, symbol: u16, argc: u8) {
        self.emit_op(Op::Send);
        self.emit_u16(symbol);
        self.emit_u8(argc);
    }

    /// `NewBlock <block:u16>`.
    pub fn new_block(&mut self, block: u16) {
        self.emit_op(Op::NewBlock);
        self.emit_u16(block);
    }

    /// `NewObject <object:u16>`.
    pub fn new_object(&mut self, object: u16) {
        self.emit_op(Op::NewObject);
        self.emit_u16(object);
    }

    pub fn end_block(&mut self) {
        self.emit_op(Op::EndBlock);
    }

    pub fn end_program(&mut self) {
        self.emit_op(Op::EndProgram);
    }
}

impl Default for BytecodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("too many entries in the {table} table")]
    TableOverflow { table: &'static str },
    #[error("{open} block(s) still open at finish")]
    UnclosedBlock { open: usize },
    #[error("end_block without a matching begin_block")]
    UnbalancedEnd,
}

struct OpenBlock {
    params: Vec<u16>,
    locals: Vec<u16>,
    code: BytecodeBuilder,
}

struct ClosedBlock {
    params: Vec<u16>,
    locals: Vec<u16>,
    body: Vec<u8>,
}

/// Assembles a [`Program`]: interns symbol names, pools constants and lays
/// out nested block bodies after the top-level code.
///
/// Emission always targets the innermost open block, or the top-level code
/// when no block is open. Table overflows are recorded and reported by
/// [`finish`](Self::finish).
pub struct ProgramBuilder {
    main: BytecodeBuilder,
    open: Vec<OpenBlock>,
    closed: Vec<ClosedBlock>,
    symbols: Vec<String>,
    symbol_index: HashMap<String, u16>,
    constants: Vec<Constant>,
    objects: Vec<ObjectDesc>,
    globals: Vec<u16>,
    error: Option<BuildError>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            main: BytecodeBuilder::new(),
            open: Vec::new(),
            closed: Vec::new(),
            symbols: Vec::new(),
            symbol_index: HashMap::new(),
            constants: Vec::new(),
            objects: Vec::new(),
            globals: Vec::new(),
            error: None,
        }
    }

    fn code(&mut self) -> &mut BytecodeBuilder {
        match self.open.last_mut() {
            Some(block) => &mut block.code,
            None => &mut self.main,
        }
    }

    fn index(&mut self, len: usize, table: &'static str) -> u16 {
        match u16::try_from(len) {
            Ok(idx) => idx,
            Err(_) => {
                self.error.get_or_insert(BuildError::TableOverflow { table });
                u16::MAX
            }
        }
    }

    /// Intern `name` in the symbol translation table.
    pub fn symbol(&mut self, name: &str) -> u16 {
        if let Some(&idx) = self.symbol_index.get(name) {
            return idx;
        }
        let idx = self.index(self.symbols.len(), "symbol");
        self.symbols.push(name.to_owned());
        self.symbol_index.insert(name.to_owned(), idx);
        idx
    }

    fn symbols_of(&mut self, names: &[&str]) -> Vec<u16> {
        names.iter().map(|name| self.symbol(name)).collect()
    }

    /// Add `constant` to the pool, reusing an equal entry.
    pub fn constant(&mut self, constant: Constant) -> u16 {
        if let Some(pos) = self.constants.iter().position(|c| *c == constant) {
            return pos as u16;
        }
        let idx = self.index(self.constants.len(), "constant");
        self.constants.push(constant);
        idx
    }

    /// Declare a variable in the program's top-level scope.
    pub fn global(&mut self, name: &str) -> &mut Self {
        let sym = self.symbol(name);
        if !self.globals.contains(&sym) {
            self.globals.push(sym);
        }
        self
    }

    pub fn push_int(&mut self, value: i64) -> &mut Self {
        match i32::try_from(value) {
            Ok(small) => self.code().push_smi(small),
            Err(_) => {
                let idx = self.constant(Constant::Integer(value));
                self.code().push_constant(idx);
            }
        }
        self
    }

    pub fn push_string(&mut self, value: &str) -> &mut Self {
        let idx = self.constant(Constant::String(value.to_owned()));
        self.code().push_constant(idx);
        self
    }

    pub fn push_symbol(&mut self, name: &str) -> &mut Self {
        let sym = self.symbol(name);
        let idx = self.constant(Constant::Symbol(sym));
        self.code().push_constant(idx);
        self
    }

    pub fn push_nil(&mut self) -> &mut Self {
        self.code().push_nil();
        self
    }

    pub fn push_true(&mut self) -> &mut Self {
        self.code().push_true();
        self
    }

    pub fn push_false(&mut self) -> &mut Self {
        self.code().push_false();
        self
    }

    pub fn push_self(&mut self) -> &mut Self {
        self.code().push_self();
        self
    }

    pub fn push_variable(&mut self, name: &str) -> &mut Self {
        let sym = self.symbol(name);
        self.code().push_variable(sym);
        self
    }

    pub fn set_variable(&mut self, name: &str) -> &mut Self {
        let sym = self.symbol(name);
        self.code().set_variable(sym);
        self
    }

    pub fn pop(&mut self) -> &mut Self {
        self.code().pop();
        self
    }

    pub fn send(&mut self, selector: &str, argc: u8) -> &mut Self {
        let sym = self.symbol(selector);
        self.code().send(sym, argc);
        self
    }

    pub fn new_block(&mut self, block: u16) -> &mut Self {
        self.code().new_block(block);
        self
    }

    pub fn new_object(&mut self, object: u16) -> &mut Self {
        self.code().new_object(object);
        self
    }

    /// Open a block body. Following emissions go into it until
    /// [`end_block`](Self::end_block).
    pub fn begin_block(&mut self, params: &[&str], locals: &[&str]) -> &mut Self {
        let params = self.symbols_of(params);
        let locals = self.symbols_of(locals);
        self.open.push(OpenBlock {
            params,
            locals,
            code: BytecodeBuilder::new(),
        });
        self
    }

    /// Close the innermost block and return its index.
    pub fn end_block(&mut self) -> u16 {
        let Some(mut block) = self.open.pop() else {
            self.error.get_or_insert(BuildError::UnbalancedEnd);
            return 0;
        };
        block.code.end_block();
        let idx = self.index(self.closed.len(), "block");
        self.closed.push(ClosedBlock {
            params: block.params,
            locals: block.locals,
            body: block.code.into_bytes(),
        });
        idx
    }

    /// Build a whole block with `body` and return its index.
    pub fn block(
        &mut self,
        params: &[&str],
        locals: &[&str],
        body: impl FnOnce(&mut Self),
    ) -> u16 {
        self.begin_block(params, locals);
        body(self);
        self.end_block()
    }

    /// Register an object descriptor with instance variables `vars` and
    /// `(selector, block)` methods.
    pub fn object(&mut self, vars: &[&str], methods: &[(&str, u16)]) -> u16 {
        let vars = self.symbols_of(vars);
        let methods = methods
            .iter()
            .map(|&(selector, block)| MethodDesc {
                selector: self.symbol(selector),
                block,
            })
            .collect();
        let idx = self.index(self.objects.len(), "object");
        self.objects.push(ObjectDesc { vars, methods });
        idx
    }

    /// Terminate the top-level code and lay out all block bodies after it.
    pub fn finish(mut self) -> Result<Program, BuildError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if !self.open.is_empty() {
            return Err(BuildError::UnclosedBlock {
                open: self.open.len(),
            });
        }

        self.main.end_program();
        let mut code = self.main.into_bytes();
        let mut blocks = Vec::with_capacity(self.closed.len());
        for block in self.closed {
            let start = u32::try_from(code.len())
                .map_err(|_| BuildError::TableOverflow { table: "code" })?;
            code.extend_from_slice(&block.body);
            blocks.push(BlockDesc {
                params: block.params,
                locals: block.locals,
                start,
            });
        }

        Ok(Program {
            code,
            symbols: self.symbols,
            constants: self.constants,
            blocks,
            objects: self.objects,
            globals: self.globals,
        })
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}
