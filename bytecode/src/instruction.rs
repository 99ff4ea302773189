use core::fmt;

/// A decoded instruction with its immediate widened to `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    PushConstant { idx: u16 },
    PushSmi { value: i32 },
    PushNil,
    PushTrue,
    PushFalse,
    PushSelf,
    PushVariable { symbol: u16 },
    SetVariable { symbol: u16 },
    Pop,
    Send { symbol: u16, argc: u8 },
    NewBlock { block: u16 },
    NewObject { object: u16 },
    EndBlock,
    EndProgram,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushConstant { idx } => write!(f, "PushConstant #{idx}"),
            Self::PushSmi { value } => write!(f, "PushSmi {value}"),
            Self::PushNil => write!(f, "PushNil"),
            Self::PushTrue => write!(f, "PushTrue"),
            Self::PushFalse => write!(f, "PushFalse"),
            Self::PushSelf => write!(f, "PushSelf"),
            Self::PushVariable { symbol } => write!(f, "PushVariable @{symbol}"),
            Self::SetVariable { symbol } => write!(f, "SetVariable @{symbol}"),
            Self::Pop => write!(f, "Pop"),
            Self::Send { symbol, argc } => write!(f, "Send @{symbol} {argc}"),
            Self::NewBlock { block } => write!(f, "NewBlock ^{block}"),
            Self::NewObject { object } => write!(f, "NewObject %{object}"),
            Self::EndBlock => write!(f, "EndBlock"),
            Self::EndProgram => write!(f, "EndProgram"),
        }
    }
}
