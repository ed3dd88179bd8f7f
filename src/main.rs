use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use structopt::StructOpt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use brainfold_core::config::{DEFAULT_STACK_SIZE, DEFAULT_TAPE_SIZE};
use brainfold_core::{compile, CodeGenerator, Config, Error, Interpreter, OutputMode, Program};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "brainfold",
    about = "A folding Brainfuck interpreter, and Brainfuck-to-C translator"
)]
struct Opt {
    /// Size of the tape, in cells [must be at least 10000]
    #[structopt(short, long = "tape")]
    tape_size: Option<usize>,

    /// How deeply loops may nest [must be at least 1000]
    #[structopt(short, long = "stack")]
    stack_size: Option<usize>,

    /// Hold output until a newline (or input) instead of flushing every byte
    #[structopt(short, long)]
    buffered: bool,

    /// Translate the program to C instead of running it
    #[structopt(short = "c", long)]
    translate: bool,

    /// Where to write the translated C. Defaults to FILE with a .c extension; use - for stdout
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Print the compiled instructions and exit
    #[structopt(short, long)]
    disassemble: bool,

    /// Show product information and exit
    #[structopt(short, long)]
    info: bool,

    /// Brainfuck source file
    #[structopt(name = "FILE", parse(from_os_str), required_unless = "info")]
    file: Option<PathBuf>,
}

fn main() {
    init_logging();

    let opt = Opt::from_args();
    if let Err(e) = run(&opt) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Logs go to stderr, so they never mix with the program's own output. Set `RUST_LOG` to see more.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(opt: &Opt) -> Result<(), Error> {
    let file = match &opt.file {
        Some(file) if !opt.info => file,
        _ => {
            print_info();
            return Ok(());
        }
    };

    let output_mode = if opt.buffered {
        OutputMode::LineBuffered
    } else {
        OutputMode::Unbuffered
    };
    let config = Config::new(
        opt.tape_size.unwrap_or(DEFAULT_TAPE_SIZE),
        opt.stack_size.unwrap_or(DEFAULT_STACK_SIZE),
    )?
    .with_output_mode(output_mode);
    debug!(?config, "configured");

    let source_text = fs::read(file).map_err(|e| with_path(e, file))?;
    let program =
        compile(&source_text, &config).map_err(|e| e.in_file(file.display().to_string()))?;

    if opt.disassemble {
        print!("{}", program);
        return Ok(());
    }

    if opt.translate {
        translate(file, opt.output.as_deref(), &config, &program)
    } else {
        interpret(&config, &program)
    }
}

fn print_info() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("A {}", env!("CARGO_PKG_DESCRIPTION"));
    println!("by {}", env!("CARGO_PKG_AUTHORS"));
}

fn interpret(config: &Config, program: &Program) -> Result<(), Error> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    let mut interpreter = Interpreter::new(config, stdin.lock(), stdout.lock());
    interpreter.run(program)?;

    Ok(())
}

fn translate(
    file: &Path,
    output: Option<&Path>,
    config: &Config,
    program: &Program,
) -> Result<(), Error> {
    let c_source = CodeGenerator::new(config).generate(program)?;

    let destination = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| file.with_extension("c"));

    if is_same_file(&destination, file) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "refusing to overwrite the source file; choose another --output",
        )
        .into());
    }

    if destination == Path::new("-") {
        io::stdout().write_all(c_source.as_bytes())?;
        return Ok(());
    }

    fs::write(&destination, c_source).map_err(|e| with_path(e, &destination))?;
    info!("wrote C source to {}", destination.display());

    Ok(())
}

/// True when both paths name the same existing file, however they're spelled.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Says which file an I/O error was about.
fn with_path(e: io::Error, path: &Path) -> io::Error {
    io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
}
