use std::fmt::Write as _;

use crate::decoder::BytecodeDecoder;
use crate::instruction::Instruction;

/// A literal in the constant pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Integer(i64),
    String(String),
    /// Index into [`Program::symbols`].
    Symbol(u16),
}

/// A block (closure body) laid out in the program's code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDesc {
    /// Parameter names, bound in order to the call arguments.
    pub params: Vec<u16>,
    /// Local variable names, initialized to nil.
    pub locals: Vec<u16>,
    /// Byte offset of the first instruction of the body.
    pub start: u32,
}

impl BlockDesc {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDesc {
    pub selector: u16,
    pub block: u16,
}

/// Shape of a prototype object built by `NewObject`.
///
/// The method count is known up front so the object's method table can be
/// sized exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDesc {
    pub vars: Vec<u16>,
    pub methods: Vec<MethodDesc>,
}

/// A complete bytecode program: code plus the tables its operands index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub code: Vec<u8>,
    /// Symbol translation table. Resolved to interned symbols when loaded.
    pub symbols: Vec<String>,
    pub constants: Vec<Constant>,
    pub blocks: Vec<BlockDesc>,
    pub objects: Vec<ObjectDesc>,
    /// Variables declared in the program's top-level scope.
    pub globals: Vec<u16>,
}

impl Program {
    pub fn symbol_name(&self, idx: u16) -> Option<&str> {
        self.symbols.get(idx as usize).map(String::as_str)
    }

    /// Check that every descriptor refers to entries that exist.
    pub fn validate(&self) -> Result<(), String> {
        let symbol_count = self.symbols.len();
        let check_symbol = |idx: u16, what: &str| {
            if (idx as usize) < symbol_count {
                Ok(())
            } else {
                Err(format!("{what} refers to missing symbol @{idx}"))
            }
        };

        for constant in &self.constants {
            if let Constant::Symbol(idx) = constant {
                check_symbol(*idx, "constant")?;
            }
        }
        for (i, block) in self.blocks.iter().enumerate() {
            for &sym in block.params.iter().chain(&block.locals) {
                check_symbol(sym, &format!("block ^{i}"))?;
            }
            if block.start as usize >= self.code.len() {
                return Err(format!(
                    "block ^{i} starts at {} past the end of the code",
                    block.start
                ));
            }
        }
        for (i, object) in self.objects.iter().enumerate() {
            for &sym in &object.vars {
                check_symbol(sym, &format!("object %{i}"))?;
            }
            for method in &object.methods {
                check_symbol(method.selector, &format!("object %{i}"))?;
                if method.block as usize >= self.blocks.len() {
                    return Err(format!(
                        "object %{i} refers to missing block ^{}",
                        method.block
                    ));
                }
            }
        }
        for &sym in &self.globals {
            check_symbol(sym, "global")?;
        }
        Ok(())
    }

    /// Render the program as annotated assembly text.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let names = |syms: &[u16]| {
            syms.iter()
                .map(|&s| self.symbol_name(s).unwrap_or("?"))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let _ = writeln!(out, "globals: {}", names(&self.globals));
        for (i, constant) in self.constants.iter().enumerate() {
            let _ = writeln!(out, "#{i:<4} {}", self.describe_constant(constant));
        }
        for (i, object) in self.objects.iter().enumerate() {
            let methods = object
                .methods
                .iter()
                .map(|m| {
                    format!("{}=^{}", self.symbol_name(m.selector).unwrap_or("?"), m.block)
                })
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(out, "%{i:<4} vars: [{}] methods: [{methods}]", names(&object.vars));
        }

        let mut decoder = BytecodeDecoder::new(&self.code);
        loop {
            let offset = decoder.offset();
            for (i, block) in self.blocks.iter().enumerate() {
                if block.start as usize == offset {
                    let _ = writeln!(
                        out,
                        "^{i}: [{} | {}]",
                        names(&block.params),
                        names(&block.locals)
                    );
                }
            }
            let Some(next) = decoder.next() else { break };
            match next {
                Ok(instruction) => {
                    let _ = write!(out, "  {offset:>5}  {instruction}");
                    if let Some(note) = self.annotate(&instruction) {
                        let _ = write!(out, "  ; {note}");
                    }
                    out.push('\n');
                }
                Err(err) => {
                    let _ = writeln!(out, "  {offset:>5}  <{err}>");
                }
            }
        }
        out
    }

    fn describe_constant(&self, constant: &Constant) -> String {
        match constant {
            Constant::Integer(value) => value.to_string(),
            Constant::String(value) => format!("{value:?}"),
            Constant::Symbol(idx) => format!("#{}", self.symbol_name(*idx).unwrap_or("?")),
        }
    }

    fn annotate(&self, instruction: &Instruction) -> Option<String> {
        match *instruction {
            Instruction::PushConstant { idx } => self
                .constants
                .get(idx as usize)
                .map(|c| self.describe_constant(c)),
            Instruction::PushVariable { symbol }
            | Instruction::SetVariable { symbol }
            | Instruction::Send { symbol, .. } => self.symbol_name(symbol).map(str::to_owned),
            _ => None,
        }
    }
}
