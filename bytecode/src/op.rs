/// Bytecode opcodes.
///
/// Operands are little-endian. Symbol, constant, block and object operands
/// are 16-bit indices into the owning [`Program`](crate::Program)'s tables.
///
/// The [`Wide`](Op::Wide) and [`ExtraWide`](Op::ExtraWide) prefixes promote
/// the immediate of [`PushSmi`](Op::PushSmi) to 16 and 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Op {
    /// Prefix: the next `PushSmi` carries an `i16` immediate.
    Wide = 0x00,

    /// Prefix: the next `PushSmi` carries an `i32` immediate.
    ExtraWide,

    /// Push a constant pool entry.
    /// Operands: `idx:u16`
    PushConstant,

    /// Push a small integer literal.
    /// Operands: `value:i8` (wide: `i16`, extra-wide: `i32`)
    PushSmi,

    PushNil,
    PushTrue,
    PushFalse,

    /// Push the receiver of the nearest enclosing method activation.
    PushSelf,

    /// Resolve a variable through the lexical scope chain and push its
    /// value as seen from the active world.
    /// Operands: `symbol:u16`
    PushVariable,

    /// Store the top of stack into a variable in the active world.
    /// The value stays on the stack.
    /// Operands: `symbol:u16`
    SetVariable,

    /// Discard the top of stack.
    Pop,

    /// Send a message. The receiver sits below `argc` arguments.
    /// Operands: `symbol:u16`, `argc:u8`
    Send,

    /// Create a closure over the current scope and world.
    /// Operands: `block:u16`
    NewBlock,

    /// Create a prototype object from an object descriptor. Pops the
    /// initial variable values and the parent prototype.
    /// Operands: `object:u16`
    NewObject,

    /// End of a block or method body. The top of stack is returned.
    EndBlock,

    /// End of the top-level program.
    EndProgram,
}

impl Op {
    pub const COUNT: usize = Op::EndProgram as usize + 1;

    /// Whether this opcode accepts the `Wide` or `ExtraWide` prefix.
    pub const fn has_scalable_operands(self) -> bool {
        matches!(self, Op::PushSmi)
    }
}

impl TryFrom<u8> for Op {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        if byte < Self::COUNT as u8 {
            // SAFETY: Op is repr(u8) with contiguous variants starting at 0.
            Ok(unsafe { core::mem::transmute::<u8, Op>(byte) })
        } else {
            Err(byte)
        }
    }
}
