use clap::{Parser as ClapParser, Subcommand};
use std::{path::PathBuf, process};

use bytecode::{load_program, save_program};
use log::error;
use object::Value;

use vm::demo::Demo;
use vm::{Output, VM, VmSettings};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Maximum call depth before a process halts
    #[arg(long, global = true, default_value_t = 1024)]
    max_depth: usize,

    /// Maximum nesting of interpreter runs started from primitives
    #[arg(long, global = true, default_value_t = 128)]
    max_reentries: usize,

    /// Trace sends for a specific selector
    #[arg(long, global = true, help = "Log every send of this selector")]
    trace_send: Option<String>,

    /// Log scope and world activity
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute program images in order, sharing globals
    Run {
        #[arg(required = true, help = "The program images to execute")]
        images: Vec<PathBuf>,
    },
    /// Print the disassembly of a program image
    Disasm { image: PathBuf },
    /// Run a built-in demo program
    Demo {
        #[arg(value_enum)]
        name: Demo,
    },
    /// Write a built-in demo program as an image
    WriteDemo {
        #[arg(value_enum)]
        name: Demo,
        path: PathBuf,
    },
}

fn fail(message: String) -> ! {
    error!("{message}");
    process::exit(1);
}

fn new_vm(cli: &Cli) -> VM {
    let settings = VmSettings {
        max_depth: cli.max_depth,
        max_reentries: cli.max_reentries,
        trace_send: cli.trace_send.clone(),
        ..VmSettings::default()
    };
    VM::new(settings, Output::stdout())
        .unwrap_or_else(|err| fail(format!("bootstrap failed: {err}")))
}

fn print_result(value: &Value) {
    if !value.is_nil() {
        println!("=> {value:?}");
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match &cli.command {
        Command::Run { images } => {
            let mut vm = new_vm(&cli);
            for path in images {
                let program = load_program(path).unwrap_or_else(|err| {
                    fail(format!("error reading '{}': {err}", path.display()))
                });
                let result = vm.load(program).and_then(|code| vm.run(code));
                match result {
                    Ok(value) => print_result(&value),
                    Err(err) => fail(format!("error executing '{}': {err}", path.display())),
                }
            }
        }
        Command::Disasm { image } => {
            let program = load_program(image)
                .unwrap_or_else(|err| fail(format!("error reading '{}': {err}", image.display())));
            print!("{}", program.disassemble());
        }
        Command::Demo { name } => {
            let mut vm = new_vm(&cli);
            let program = name
                .program()
                .unwrap_or_else(|err| fail(format!("error building demo: {err}")));
            match vm.load(program).and_then(|code| vm.run(code)) {
                Ok(value) => print_result(&value),
                Err(err) => fail(format!("error executing demo: {err}")),
            }
        }
        Command::WriteDemo { name, path } => {
            let program = name
                .program()
                .unwrap_or_else(|err| fail(format!("error building demo: {err}")));
            if let Err(err) = save_program(&program, path) {
                fail(format!("error writing '{}': {err}", path.display()));
            }
        }
    }
}
