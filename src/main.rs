use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use minilua::diagnostic::{ansi::AnsiRenderer, json, registry, Diagnostic};
use minilua::interpreter::{Error, Interpreter};
use minilua::vm::{default_globals, Vm};

/// Run a minilua script
#[derive(Parser, Debug)]
#[command(name = "minilua", version)]
#[command(about = "Compile and run a minilua script", long_about = None)]
struct Args {
    /// Script to run
    #[arg(required_unless_present = "explain")]
    file: Option<PathBuf>,

    /// Print the constant pool and bytecode listing before running
    #[arg(long)]
    dump: bool,

    /// Print the compiled chunk as JSON and exit without running
    #[arg(long)]
    dump_json: bool,

    /// Report execution time on stderr
    #[arg(long)]
    time: bool,

    /// Emit diagnostics as JSON lines on stderr
    #[arg(long)]
    json: bool,

    /// Disable colored diagnostics
    #[arg(long)]
    no_color: bool,

    /// Explain an error code (e.g. LUA-R001) and exit; without a code, list them all
    #[arg(long, value_name = "CODE")]
    explain: Option<Option<String>>,
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    // MINILUA_LOG wins over RUST_LOG; default to warn
    let filter = EnvFilter::try_from_env("MINILUA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(args: &Args, d: Diagnostic) {
    if args.json {
        eprintln!("{}", json::render(&d));
    } else {
        let use_color = !args.no_color && std::io::stderr().is_terminal();
        eprint!("{}", AnsiRenderer { use_color }.render(&d));
    }
}

fn explain(code: Option<&str>) -> ExitCode {
    let Some(code) = code else {
        print!("{}", registry::listing());
        return ExitCode::SUCCESS;
    };
    match registry::lookup(code) {
        Some(entry) => {
            print!("{}", entry.long);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("unknown error code '{code}'");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    if let Some(code) = &args.explain {
        return explain(code.as_deref());
    }
    let Some(path) = &args.file else {
        return ExitCode::FAILURE;
    };

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            report(&args, Diagnostic::error(format!("cannot read {}: {e}", path.display())));
            return ExitCode::FAILURE;
        }
    };

    let interpreter = Interpreter::new(&source);
    let chunk = match interpreter.compile() {
        Ok(chunk) => chunk,
        Err(e) => {
            report(&args, Diagnostic::from(&e).with_source(source.as_str()));
            return ExitCode::FAILURE;
        }
    };

    if args.dump_json {
        return match serde_json::to_string_pretty(&chunk) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                report(&args, Diagnostic::error(format!("serialization error: {e}")));
                ExitCode::FAILURE
            }
        };
    }
    if args.dump {
        print!("{chunk}");
    }

    let mut vm = Vm::new(default_globals());
    let start = Instant::now();
    let result = vm.run(&chunk).map_err(Error::from);
    if args.time {
        eprintln!("executed in {:.2?}", start.elapsed());
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&args, Diagnostic::from(&e).with_source(source.as_str()));
            ExitCode::FAILURE
        }
    }
}
