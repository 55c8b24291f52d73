extern crate log;
extern crate simplelog;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;

use spl_lang::compiler::ast::{AstFormat, Program};
use spl_lang::*;

fn main() {
    if let Err(code) = run() {
        std::process::exit(code);
    }
}

fn run() -> Result<(), i32> {
    let config = configure_cli().get_matches();

    if let Some(level) = get_log_level(&config) {
        if let Err(e) = configure_logging(level) {
            eprintln!("Failed to configure logger: {}", e);
        }
    }

    let stop_stage = get_stage(&config).map_err(|msg| {
        print_err(&msg);
        ERR_IO
    })?;

    // clap enforces that input is present
    let input = config.value_of("input").unwrap_or_default();
    let program = read_program(Path::new(input))?;

    let result = compile(&program, stop_stage).map_err(|e| {
        print_err(e.message());
        e.exit_code()
    })?;

    if print_tables(&config) {
        let dump = result.format_tables(&program).map_err(|e| {
            print_err(&e.to_string());
            ERR_IO
        })?;
        print!("{}", dump);
    }

    if print_vars(&config) && result.stage() >= Stage::Vars {
        print!("{}", result.format_variables(&program));
    }

    if let Some(code) = result.code() {
        let written = match config.value_of("output") {
            Some(path) => {
                info!("Writing assembly to {}", path);
                File::create(path).and_then(|mut file| {
                    code.print(&mut file)?;
                    file.flush()
                })
            }
            None => {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                code.print(&mut out)
            }
        };
        written.map_err(|e| {
            print_err(&format!("could not write assembly: {}", e));
            ERR_IO
        })?;
    }

    Ok(())
}

fn read_program(path: &Path) -> Result<Program, i32> {
    let format = AstFormat::from_path(path).ok_or_else(|| {
        print_err(&format!(
            "cannot tell the format of {}: expected a .json, .yaml, or .yml file",
            path.display()
        ));
        ERR_AST_READ
    })?;

    let file = File::open(path).map_err(|e| {
        print_err(&format!("could not open {}: {}", path.display(), e));
        ERR_IO
    })?;

    Program::read(std::io::BufReader::new(file), format).map_err(|e| {
        print_err(&e.to_string());
        ERR_AST_READ
    })
}
