use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::program::{BlockDesc, Constant, MethodDesc, ObjectDesc, Program};

const IMAGE_MAGIC: &[u8; 8] = b"KRTPROG\0";
const IMAGE_VERSION: u32 = 1;

const TAG_INTEGER: u8 = 0;
const TAG_STRING: u8 = 1;
const TAG_SYMBOL: u8 = 2;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("not a program image")]
    BadMagic,
    #[error("unsupported image version {0}")]
    UnsupportedVersion(u32),
    #[error("string in image is not valid utf-8")]
    InvalidUtf8,
    #[error("unknown constant tag {0}")]
    InvalidConstantTag(u8),
    #[error("inconsistent program: {0}")]
    Inconsistent(String),
}

pub fn save_program(program: &Program, path: &Path) -> Result<(), ImageError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_program(program, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn load_program(path: &Path) -> Result<Program, ImageError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_program(&mut reader)
}

pub fn write_program(program: &Program, w: &mut impl Write) -> io::Result<()> {
    w.write_all(IMAGE_MAGIC)?;
    write_u32(w, IMAGE_VERSION)?;

    write_bytes(w, &program.code)?;

    write_len(w, program.symbols.len())?;
    for symbol in &program.symbols {
        write_bytes(w, symbol.as_bytes())?;
    }

    write_len(w, program.constants.len())?;
    for constant in &program.constants {
        match constant {
            Constant::Integer(value) => {
                write_u8(w, TAG_INTEGER)?;
                w.write_all(&value.to_le_bytes())?;
            }
            Constant::String(value) => {
                write_u8(w, TAG_STRING)?;
                write_bytes(w, value.as_bytes())?;
            }
            Constant::Symbol(idx) => {
                write_u8(w, TAG_SYMBOL)?;
                write_u16(w, *idx)?;
            }
        }
    }

    write_len(w, program.blocks.len())?;
    for block in &program.blocks {
        write_u32(w, block.start)?;
        write_indices(w, &block.params)?;
        write_indices(w, &block.locals)?;
    }

    write_len(w, program.objects.len())?;
    for object in &program.objects {
        write_indices(w, &object.vars)?;
        write_len(w, object.methods.len())?;
        for method in &object.methods {
            write_u16(w, method.selector)?;
            write_u16(w, method.block)?;
        }
    }

    write_indices(w, &program.globals)
}

pub fn read_program(r: &mut impl Read) -> Result<Program, ImageError> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic)?;
    if &magic != IMAGE_MAGIC {
        return Err(ImageError::BadMagic);
    }
    let version = read_u32(r)?;
    if version != IMAGE_VERSION {
        return Err(ImageError::UnsupportedVersion(version));
    }

    let code = read_bytes(r)?;

    let symbol_count = read_u32(r)?;
    let mut symbols = Vec::with_capacity(symbol_count.min(1 << 16) as usize);
    for _ in 0..symbol_count {
        let bytes = read_bytes(r)?;
        symbols.push(String::from_utf8(bytes).map_err(|_| ImageError::InvalidUtf8)?);
    }

    let constant_count = read_u32(r)?;
    let mut constants = Vec::new();
    for _ in 0..constant_count {
        let constant = match read_u8(r)? {
            TAG_INTEGER => {
                let mut buf = [0u8; 8];
                r.read_exact(&mut buf)?;
                Constant::Integer(i64::from_le_bytes(buf))
            }
            TAG_STRING => {
                let bytes = read_bytes(r)?;
                Constant::String(String::from_utf8(bytes).map_err(|_| ImageError::InvalidUtf8)?)
            }
            TAG_SYMBOL => Constant::Symbol(read_u16(r)?),
            tag => return Err(ImageError::InvalidConstantTag(tag)),
        };
        constants.push(constant);
    }

    let block_count = read_u32(r)?;
    let mut blocks = Vec::new();
    for _ in 0..block_count {
        let start = read_u32(r)?;
        let params = read_indices(r)?;
        let locals = read_indices(r)?;
        blocks.push(BlockDesc {
            params,
            locals,
            start,
        });
    }

    let object_count = read_u32(r)?;
    let mut objects = Vec::new();
    for _ in 0..object_count {
        let vars = read_indices(r)?;
        let method_count = read_u32(r)?;
        let mut methods = Vec::new();
        for _ in 0..method_count {
            let selector = read_u16(r)?;
            let block = read_u16(r)?;
            methods.push(MethodDesc { selector, block });
        }
        objects.push(ObjectDesc { vars, methods });
    }

    let globals = read_indices(r)?;

    let program = Program {
        code,
        symbols,
        constants,
        blocks,
        objects,
        globals,
    };
    program.validate().map_err(ImageError::Inconsistent)?;
    Ok(program)
}

impl Program {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = write_program(self, &mut out);
        out
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, ImageError> {
        read_program(&mut bytes)
    }
}

fn write_u8(w: &mut impl Write, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

fn write_u16(w: &mut impl Write, v: u16) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_len(w: &mut impl Write, len: usize) -> io::Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "section too large"))?;
    write_u32(w, len)
}

fn write_bytes(w: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    write_len(w, bytes.len())?;
    w.write_all(bytes)
}

fn write_indices(w: &mut impl Write, indices: &[u16]) -> io::Result<()> {
    write_len(w, indices.len())?;
    for &idx in indices {
        write_u16(w, idx)?;
    }
    Ok(())
}

fn read_u8(r: &mut impl Read) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u16(r: &mut impl Read) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_bytes(r: &mut impl Read) -> io::Result<Vec<u8>> {
    let len = read_u32(r)? as u64;
    let mut bytes = Vec::new();
    (&mut *r).take(len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(bytes)
}

fn read_indices(r: &mut impl Read) -> io::Result<Vec<u16>> {
    let len = read_u32(r)?;
    let mut out = Vec::new();
    for _ in 0..len {
        out.push(read_u16(r)?);
    }
    Ok(out)
}
