use std::{env, fs, process};

use subleqvm::logging::error;
use subleqvm::vm::bits::{OPERAND_MASK, read26, read52};
use subleqvm::vm::{INSTRUCTION_BITS, RAM_SIZE_BITS, Vm};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <input.rom> <output.asm>", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];

    let rom = fs::read(input_path).unwrap_or_else(|e| {
        error(format!("failed to read input file: {}", e));
        process::exit(1);
    });
    let asm = disassemble(&rom);

    fs::write(output_path, asm).unwrap_or_else(|e| {
        error(format!("failed to write to output file: {}", e));
        process::exit(1);
    });
}

/// Walk the image as a straight 78-bit instruction stream from bit 0.
/// SUBLEQ has no way to tell code from data, so every slot is shown as
/// an instruction; operands are the raw 26-bit fields.
fn disassemble(rom: &[u8]) -> String {
    let mut vm = Vm::new();
    vm.load_rom(rom);
    let mem = vm.ram();
    let rom_bits = (rom.len() as u64 * 8).min(RAM_SIZE_BITS);

    let mut result = String::new();
    let mut ip = 0;
    while ip + INSTRUCTION_BITS <= rom_bits {
        let v = read52(mem, ip);
        let a = v & OPERAND_MASK;
        let b = (v >> 26) & OPERAND_MASK;
        let c = read26(mem, ip + 52);
        result.push_str(&format!("{:>8}: SUBLEQ {}, {}, {}\n", ip, a, b, c));
        ip += INSTRUCTION_BITS;
    }
    result
}
