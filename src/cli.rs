use clap::{App, Arg, ArgMatches};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use crate::compiler::Stage;

// Exit Codes for errors which happen outside of the compiler passes.  The passes
// report their own codes through `CompileError::exit_code`.
pub const ERR_IO: i32 = 2;
pub const ERR_AST_READ: i32 = 3;

pub fn print_err(msg: &str) {
    eprintln!("error: {}", msg);
}

pub fn configure_cli() -> clap::App<'static, 'static> {
    let app = App::new("SPL Compiler")
        .version("0.1.0")
        .about("Compiles an SPL syntax tree into ECO32 assembly")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .required(true)
                .help("Syntax tree to compile, as a .json, .yaml, or .yml file"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .required(false)
                .help("Name the output file that the assembly will be written to.  Defaults to stdout"),
        )
        .arg(
            Arg::with_name("tables")
                .long("tables")
                .help("Prints the local symbol table of every procedure")
        )
        .arg(
            Arg::with_name("vars")
                .long("vars")
                .help("Prints the stack layout of every procedure")
        )
        .arg(
            Arg::with_name("stop-after")
                .long("stop-after")
                .possible_values(&["tables", "semant", "vars"])
                .takes_value(true)
                .help("Stops the compiler after the given pass; no assembly is written")
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .possible_values(&["error", "warn", "info", "debug", "trace"])
                .takes_value(true)
                .help("Prints the compiler's log messages at the given level to stderr")
        );
    app
}

pub fn get_stage(args: &ArgMatches) -> Result<Stage, String> {
    match args.value_of("stop-after") {
        None => Ok(Stage::Codegen),
        Some(stage) => stage.parse(),
    }
}

pub fn get_log_level(args: &ArgMatches) -> Option<LevelFilter> {
    match args.value_of("log-level") {
        Some("error") => Some(LevelFilter::Error),
        Some("warn") => Some(LevelFilter::Warn),
        Some("info") => Some(LevelFilter::Info),
        Some("debug") => Some(LevelFilter::Debug),
        Some("trace") => Some(LevelFilter::Trace),
        _ => None,
    }
}

pub fn configure_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
}

pub fn print_tables(args: &ArgMatches) -> bool {
    args.is_present("tables")
}

pub fn print_vars(args: &ArgMatches) -> bool {
    args.is_present("vars")
}
