use thiserror::Error;

use crate::instruction::Instruction;
use crate::op::Op;

/// Operand width selected by an optional prefix byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Width {
    Normal = 0,
    Wide = 1,
    ExtraWide = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode 0x{byte:02x} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },
    #[error("prefix before {op:?} at offset {offset} has no effect")]
    UnexpectedPrefix { op: Op, offset: usize },
    #[error("instruction at offset {offset} runs past the end of the code")]
    Truncated { offset: usize },
}

/// Decodes a bytecode byte slice into [`Instruction`]s.
///
/// Unlike the interpreter's fast path, every read is bounds checked so a
/// malformed stream surfaces as a [`DecodeError`] instead of undefined
/// behaviour.
pub struct BytecodeDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BytecodeDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Start decoding at byte offset `pos`.
    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    /// Current byte offset in the stream.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Whether the decoder has reached the end of the bytecode.
    #[inline(always)]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Decode the next instruction, or `None` at end-of-stream.
    pub fn decode_next(&mut self) -> Option<Result<Instruction, DecodeError>> {
        if self.is_at_end() {
            return None;
        }
        let start = self.pos;
        let result = self.decode();
        if result.is_err() {
            // Stop iteration after the first error.
            self.pos = self.bytes.len();
        }
        Some(result.map_err(|e| match e {
            DecodeError::Truncated { .. } => DecodeError::Truncated { offset: start },
            other => other,
        }))
    }

    fn decode(&mut self) -> Result<Instruction, DecodeError> {
        let offset = self.pos;
        let op = self.read_op()?;

        match op {
            Op::Wide | Op::ExtraWide => {
                let width = if op == Op::Wide {
                    Width::Wide
                } else {
                    Width::ExtraWide
                };
                let next_offset = self.pos;
                let next = self.read_op()?;
                if !next.has_scalable_operands() {
                    return Err(DecodeError::UnexpectedPrefix {
                        op: next,
                        offset: next_offset,
                    });
                }
                self.decode_op(next, width, offset)
            }
            _ => self.decode_op(op, Width::Normal, offset),
        }
    }

    fn decode_op(
        &mut self,
        op: Op,
        width: Width,
        offset: usize,
    ) -> Result<Instruction, DecodeError> {
        let instruction = match op {
            Op::Wide | Op::ExtraWide => {
                return Err(DecodeError::UnexpectedPrefix { op, offset });
            }
            Op::PushConstant => Instruction::PushConstant {
                idx: self.read_u16()?,
            },
            Op::PushSmi => {
                let value = match width {
                    Width::Normal => self.read_u8()? as i8 as i32,
                    Width::Wide => self.read_u16()? as i16 as i32,
                    Width::ExtraWide => self.read_u32()? as i32,
                };
                Instruction::PushSmi { value }
            }
            Op::PushNil => Instruction::PushNil,
            Op::PushTrue => Instruction::PushTrue,
            Op::PushFalse => Instruction::PushFalse,
            Op::PushSelf => Instruction::PushSelf,
            Op::PushVariable => Instruction::PushVariable {
                symbol: self.read_u16()?,
            },
            Op::SetVariable => Instruction::SetVariable {
                symbol: self.read_u16()?,
            },
            Op::Pop => Instruction::Pop,
            Op::Send => {
                let symbol = self.read_u16()?;
                let argc = self.read_u8()?;
                Instruction::Send { symbol, argc }
            }
            Op::NewBlock => Instruction::NewBlock {
                block: self.read_u16()?,
            },
            Op::NewObject => Instruction::NewObject {
                object: self.read_u16()?,
            },
            Op::EndBlock => Instruction::EndBlock,
            Op::EndProgram => Instruction::EndProgram,
        };
        Ok(instruction)
    }

    fn read_op(&mut self) -> Result<Op, DecodeError> {
        let offset = self.pos;
        let byte = self.read_u8()?;
        Op::try_from(byte).map_err(|byte| DecodeError::InvalidOpcode { byte, offset })
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(DecodeError::Truncated { offset: self.pos })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    #[inline(always)]
    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes::<1>()?[0])
    }

    #[inline(always)]
    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_bytes()?))
    }

    #[inline(always)]
    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_bytes()?))
    }
}

impl<'a> Iterator for BytecodeDecoder<'a> {
    type Item = Result<Instruction, DecodeError>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next()
    }
}

/// Decode the single instruction at `pc`, returning it with the offset of
/// the following instruction.
pub fn decode_at(bytes: &[u8], pc: usize) -> Result<(Instruction, usize), DecodeError> {
    let mut decoder = BytecodeDecoder::at(bytes, pc);
    match decoder.decode_next() {
        Some(result) => result.map(|instruction| (instruction, decoder.offset())),
        None => Err(DecodeError::Truncated { offset: pc }),
    }
}
