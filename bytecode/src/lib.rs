mod op;
mod instruction;
mod builder;
mod decoder;
mod program;
mod image;

pub use op::Op;
pub use instruction::Instruction;
pub use builder::{BuildError, BytecodeBuilder, ProgramBuilder};
pub use decoder::{BytecodeDecoder, DecodeError, decode_at};
pub use program::{BlockDesc, Constant, MethodDesc, ObjectDesc, Program};
pub use image::{ImageError, load_program, read_program, save_program, write_program};

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<Instruction> {
        BytecodeDecoder::new(bytes)
            .map(|r| r.expect("decode error"))
            .collect()
    }

    #[test]
    fn round_trip_instructions() {
        let mut b = BytecodeBuilder::new();
        b.push_constant(42);
        b.push_variable(5);
        b.set_variable(10);
        b.send(100, 2);
        b.new_object(7);
        b.new_block(99);
        b.push_nil();
        b.push_true();
        b.push_false();
        b.push_self();
        b.pop();
        b.end_block();
        b.end_program();

        assert_eq!(decode_all(&b.into_bytes()), vec![
            Instruction::PushConstant { idx: 42 },
            Instruction::PushVariable { symbol: 5 },
            Instruction::SetVariable { symbol: 10 },
            Instruction::Send { symbol: 100, argc: 2 },
            Instruction::NewObject { object: 7 },
            Instruction::NewBlock { block: 99 },
            Instruction::PushNil,
            Instruction::PushTrue,
            Instruction::PushFalse,
            Instruction::PushSelf,
            Instruction::Pop,
            Instruction::EndBlock,
            Instruction::EndProgram,
        ]);
    }

    #[test]
    fn push_smi_widths() {
        let mut b = BytecodeBuilder::new();
        b.push_smi(-128);
        b.push_smi(1000);
        b.push_smi(100_000);
        let bytes = b.into_bytes();
        assert_eq!(bytes.len(), 2 + 4 + 6);
        assert_eq!(bytes[2], Op::Wide as u8);
        assert_eq!(bytes[6], Op::ExtraWide as u8);

        assert_eq!(decode_all(&bytes), vec![
            Instruction::PushSmi { value: -128 },
            Instruction::PushSmi { value: 1000 },
            Instruction::PushSmi { value: 100_000 },
        ]);
    }

    #[test]
    fn invalid_opcode_is_reported() {
        let bytes = [Op::PushNil as u8, 0xEE];
        let results: Vec<_> = BytecodeDecoder::new(&bytes).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1], Err(DecodeError::InvalidOpcode { byte: 0xEE, offset: 1 }));
    }

    #[test]
    fn truncated_operand_is_reported() {
        let bytes = [Op::Send as u8, 3];
        assert_eq!(
            decode_at(&bytes, 0),
            Err(DecodeError::Truncated { offset: 0 })
        );
    }

    #[test]
    fn wide_prefix_only_before_push_smi() {
        let bytes = [Op::Wide as u8, Op::Pop as u8];
        assert!(matches!(
            decode_at(&bytes, 0),
            Err(DecodeError::UnexpectedPrefix { op: Op::Pop, .. })
        ));
    }

    #[test]
    fn decode_at_returns_next_pc() {
        let mut b = BytecodeBuilder::new();
        b.push_nil();
        b.send(1, 0);
        let bytes = b.into_bytes();
        let (first, pc) = decode_at(&bytes, 0).unwrap();
        assert_eq!(first, Instruction::PushNil);
        assert_eq!(decode_at(&bytes, pc).unwrap(), (Instruction::Send { symbol: 1, argc: 0 }, 5));
    }

    #[test]
    fn display_instructions() {
        assert_eq!(Instruction::Send { symbol: 5, argc: 2 }.to_string(), "Send @5 2");
        assert_eq!(Instruction::PushSmi { value: -1 }.to_string(), "PushSmi -1");
        assert_eq!(Instruction::NewObject { object: 3 }.to_string(), "NewObject %3");
    }

    fn counter_program() -> Program {
        let mut p = ProgramBuilder::new();
        p.global("Counter");
        let increment = p.block(&[], &[], |p| {
            p.push_variable("n").push_int(1).send("+", 1).set_variable("n");
        });
        let counter = p.object(&["n"], &[("increment", increment)]);
        p.push_nil().push_int(0).new_object(counter).set_variable("Counter");
        p.finish().expect("build error")
    }

    #[test]
    fn program_builder_lays_blocks_after_main_code() {
        let program = counter_program();
        assert_eq!(program.blocks.len(), 1);
        let start = program.blocks[0].start as usize;

        let main: Vec<_> = decode_all(&program.code[..start]);
        assert_eq!(main.last(), Some(&Instruction::EndProgram));

        let body = decode_all(&program.code[start..]);
        assert_eq!(body.last(), Some(&Instruction::EndBlock));
        assert!(program.validate().is_ok());
    }

    #[test]
    fn program_builder_interns_symbols_and_constants() {
        let mut p = ProgramBuilder::new();
        let a = p.symbol("x");
        let b = p.symbol("x");
        assert_eq!(a, b);
        p.push_string("hi").push_string("hi").push_symbol("x");
        let program = p.finish().unwrap();
        assert_eq!(program.symbols, vec!["x".to_string()]);
        assert_eq!(program.constants, vec![
            Constant::String("hi".into()),
            Constant::Symbol(0),
        ]);
    }

    #[test]
    fn program_builder_nested_blocks() {
        let mut p = ProgramBuilder::new();
        p.begin_block(&["a"], &[]);
        let inner = p.block(&[], &["t"], |p| {
            p.push_variable("a");
        });
        p.new_block(inner);
        let outer = p.end_block();
        p.new_block(outer);
        let program = p.finish().unwrap();

        assert_eq!(inner, 0);
        assert_eq!(outer, 1);
        let a = program.symbols.iter().position(|s| s == "a").unwrap() as u16;
        assert_eq!(program.blocks[1].params, vec![a]);
        assert!(program.blocks[0].start < program.blocks[1].start);
    }

    #[test]
    fn program_builder_reports_unclosed_block() {
        let mut p = ProgramBuilder::new();
        p.begin_block(&[], &[]);
        assert_eq!(p.finish(), Err(BuildError::UnclosedBlock { open: 1 }));
    }

    #[test]
    fn program_builder_reports_unbalanced_end() {
        let mut p = ProgramBuilder::new();
        p.end_block();
        assert_eq!(p.finish(), Err(BuildError::UnbalancedEnd));
    }

    #[test]
    fn image_round_trip() {
        let program = counter_program();
        let bytes = program.to_bytes();
        let loaded = Program::from_bytes(&bytes).expect("image error");
        assert_eq!(loaded, program);
    }

    #[test]
    fn image_rejects_bad_magic() {
        let err = Program::from_bytes(b"NOTANIMAGE123").unwrap_err();
        assert!(matches!(err, ImageError::BadMagic));
    }

    #[test]
    fn image_rejects_truncation() {
        let bytes = counter_program().to_bytes();
        let err = Program::from_bytes(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, ImageError::Io(_)));
    }

    #[test]
    fn image_rejects_dangling_block_reference() {
        let mut program = counter_program();
        program.objects[0].methods[0].block = 9;
        let err = Program::from_bytes(&program.to_bytes()).unwrap_err();
        assert!(matches!(err, ImageError::Inconsistent(_)));
    }

    #[test]
    fn disassembly_names_symbols() {
        let text = counter_program().disassemble();
        assert!(text.contains("globals: Counter"));
        assert!(text.contains("Send @"));
        assert!(text.contains("; +"));
        assert!(text.contains("^0: [ | ]"));
        assert!(text.contains("methods: [increment=^0]"));
    }
}
