use std::rc::Rc;

use bytecode::{BlockDesc, Constant, ObjectDesc, Program};

use crate::{ObjectError, Symbol, Value};

/// A loaded program: the bytecode plus its symbol-translation table and
/// materialized constant pool.
pub struct Code {
    program: Program,
    symbols: Vec<Symbol>,
    constants: Vec<Value>,
}

impl Code {
    pub fn load(program: Program) -> Result<Rc<Code>, ObjectError> {
        program.validate().map_err(ObjectError::InvalidProgram)?;
        let symbols: Vec<Symbol> = program
            .symbols
            .iter()
            .map(|name| Symbol::intern(name))
            .collect();
        let constants = program
            .constants
            .iter()
            .map(|constant| match constant {
                Constant::Integer(n) => Ok(Value::Integer(*n)),
                Constant::String(s) => Ok(Value::string(s)),
                Constant::Symbol(idx) => {
                    symbols.get(*idx as usize).map(|sym| Value::Symbol(*sym)).ok_or_else(|| {
                        ObjectError::InvalidProgram(format!(
                            "constant refers to missing symbol {idx}"
                        ))
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Rc::new(Code {
            program,
            symbols,
            constants,
        }))
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.program.code
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    #[inline]
    pub fn symbol(&self, idx: u16) -> Option<Symbol> {
        self.symbols.get(idx as usize).copied()
    }

    #[inline]
    pub fn constant(&self, idx: u16) -> Option<Value> {
        self.constants.get(idx as usize).cloned()
    }

    pub fn block(&self, idx: u16) -> Option<&BlockDesc> {
        self.program.blocks.get(idx as usize)
    }

    pub fn object(&self, idx: u16) -> Option<&ObjectDesc> {
        self.program.objects.get(idx as usize)
    }

    pub fn globals(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.program.globals.iter().filter_map(|idx| self.symbol(*idx))
    }
}
