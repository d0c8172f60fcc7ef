use std::{env, fs, process};

use subleqvm::assembler;
use subleqvm::logging::error;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <input.asm> <output.rom>", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];

    let rom = assembler::assemble_from_file(input_path).unwrap_or_else(|e| {
        error(e.to_string());
        process::exit(1);
    });

    fs::write(output_path, rom).unwrap_or_else(|e| {
        error(format!("failed to write to output file: {}", e));
        process::exit(1);
    });
}
