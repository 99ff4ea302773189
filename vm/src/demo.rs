//! Small programs exercising the runtime end to end. They double as
//! fixtures for `kernelrt demo` and `kernelrt write-demo`.

use bytecode::{BuildError, Program, ProgramBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Demo {
    /// Two instances of a counter prototype with private state.
    Counter,
    /// Branching, committing and reverting a world.
    Worlds,
    /// Catching a division by zero and a user exception.
    Exceptions,
}

impl Demo {
    pub fn program(self) -> Result<Program, BuildError> {
        match self {
            Demo::Counter => counter(),
            Demo::Worlds => worlds(),
            Demo::Exceptions => exceptions(),
        }
    }
}

/// ```text
/// Counter := Object { n := 0. increment [ n := n + 1 ]. n [ n ] }.
/// c1 := Counter new. c2 := Counter new.
/// c1 increment. c1 increment. c2 increment.
/// c1 n printNl. c2 n printNl. c1 n
/// ```
pub fn counter() -> Result<Program, BuildError> {
    let mut b = ProgramBuilder::new();
    b.global("Counter").global("c1").global("c2");

    let increment = b.block(&[], &[], |b| {
        b.push_variable("n").push_int(1).send("+", 1).set_variable("n");
    });
    let get = b.block(&[], &[], |b| {
        b.push_variable("n");
    });
    let counter = b.object(&["n"], &[("increment", increment), ("n", get)]);

    b.push_nil().push_int(0).new_object(counter).set_variable("Counter").pop();
    for name in ["c1", "c2"] {
        b.push_variable("Counter").send("new", 0).set_variable(name).pop();
    }
    for name in ["c1", "c1", "c2"] {
        b.push_variable(name).send("increment", 0).pop();
    }
    for name in ["c1", "c2"] {
        b.push_variable(name).send("n", 0).send("printNl", 0).pop();
    }
    b.push_variable("c1").send("n", 0);
    b.finish()
}

/// ```text
/// x := 1.
/// w := World sprout.
/// w eval: [ x := x + 1 ].
/// x printNl. (w eval: [ x ]) printNl.
/// w commit printNl. x printNl.
/// w2 := World sprout.
/// w2 eval: [ x := x + 10 ].
/// x := 100.
/// w2 commit printNl.
/// w2 revert. (w2 eval: [ x ]) printNl
/// ```
pub fn worlds() -> Result<Program, BuildError> {
    let mut b = ProgramBuilder::new();
    b.global("x").global("w").global("w2");

    let bump = |b: &mut ProgramBuilder, by: i64| {
        b.block(&[], &[], |b| {
            b.push_variable("x").push_int(by).send("+", 1).set_variable("x");
        })
    };
    let read_x = |b: &mut ProgramBuilder| {
        b.block(&[], &[], |b| {
            b.push_variable("x");
        })
    };

    b.push_int(1).set_variable("x").pop();
    b.push_variable("World").send("sprout", 0).set_variable("w").pop();
    let inc = bump(&mut b, 1);
    b.push_variable("w").new_block(inc).send("eval:", 1).pop();
    b.push_variable("x").send("printNl", 0).pop();
    let peek = read_x(&mut b);
    b.push_variable("w").new_block(peek).send("eval:", 1).send("printNl", 0).pop();
    b.push_variable("w").send("commit", 0).send("printNl", 0).pop();
    b.push_variable("x").send("printNl", 0).pop();

    b.push_variable("World").send("sprout", 0).set_variable("w2").pop();
    let add_ten = bump(&mut b, 10);
    b.push_variable("w2").new_block(add_ten).send("eval:", 1).pop();
    b.push_int(100).set_variable("x").pop();
    b.push_variable("w2").send("commit", 0).send("printNl", 0).pop();
    b.push_variable("w2").send("revert", 0).pop();
    let peek = read_x(&mut b);
    b.push_variable("w2").new_block(peek).send("eval:", 1).send("printNl", 0);
    b.finish()
}

/// ```text
/// r := [ 10 / 0 ] on: #DivByZero do: [:e | e printNl. -1 ].
/// r printNl.
/// ([ #Custom throw. 5 ] on: nil do: [:e | 'caught ' , e printString ]) printNl
/// ```
pub fn exceptions() -> Result<Program, BuildError> {
    let mut b = ProgramBuilder::new();
    b.global("r");

    let divide = b.block(&[], &[], |b| {
        b.push_int(10).push_int(0).send("/", 1);
    });
    let recover = b.block(&["e"], &[], |b| {
        b.push_variable("e").send("printNl", 0).pop().push_int(-1);
    });
    b.new_block(divide)
        .push_symbol("DivByZero")
        .new_block(recover)
        .send("on:do:", 2)
        .set_variable("r")
        .pop();
    b.push_variable("r").send("printNl", 0).pop();

    let raise = b.block(&[], &[], |b| {
        b.push_symbol("Custom").send("throw", 0).pop().push_int(5);
    });
    let describe = b.block(&["e"], &[], |b| {
        b.push_string("caught ")
            .push_variable("e")
            .send("printString", 0)
            .send(",", 1);
    });
    b.new_block(raise)
        .push_nil()
        .new_block(describe)
        .send("on:do:", 2)
        .send("printNl", 0);
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Output, VM, VmSettings};
    use object::Value;

    fn run(demo: Demo) -> (Value, String) {
        let output = Output::buffer();
        let mut vm = VM::new(VmSettings::default(), output.clone()).unwrap();
        let code = vm.load(demo.program().unwrap()).unwrap();
        let value = vm.run(code).unwrap();
        (value, output.contents())
    }

    #[test]
    fn counter_demo() {
        let (value, out) = run(Demo::Counter);
        assert_eq!(value, Value::Integer(2));
        assert_eq!(out, "2\n1\n");
    }

    #[test]
    fn worlds_demo() {
        let (value, out) = run(Demo::Worlds);
        assert_eq!(value, Value::Integer(100));
        assert_eq!(out, "1\n2\ntrue\n2\nfalse\n100\n");
    }

    #[test]
    fn exceptions_demo() {
        let (value, out) = run(Demo::Exceptions);
        assert_eq!(value, Value::string("caught #Custom"));
        assert_eq!(out, "#DivByZero\n-1\ncaught #Custom\n");
    }

    #[test]
    fn demos_survive_an_image_round_trip() {
        for demo in [Demo::Counter, Demo::Worlds, Demo::Exceptions] {
            let program = demo.program().unwrap();
            let bytes = program.to_bytes();
            assert_eq!(Program::from_bytes(&bytes).unwrap(), program);
        }
    }
}
