use std::process;
use std::time::Instant;

use image::RgbaImage;
use subleqvm::logging::error;
use subleqvm::vm::Vm;
use subleqvm::vm::display::{SCREEN_COUNT, SCREEN_HEIGHT, SCREEN_WIDTH};

const ROM_PATH: &str = "data/rom.dat";
const STEPS_PER_FRAME: u64 = 1_000_000;
const FRAMES: u64 = 60;

fn main() {
    let rom = std::fs::read(ROM_PATH).unwrap_or_else(|e| {
        error(format!("failed to read {}: {}", ROM_PATH, e));
        process::exit(1);
    });

    let mut vm = Vm::new();
    vm.load_rom(&rom);

    println!("Read {} bytes from {}", rom.len(), ROM_PATH);
    println!("Starting VM...");

    let start = Instant::now();
    let mut ops: u64 = 0;
    for _ in 0..FRAMES {
        vm.run(STEPS_PER_FRAME);
        ops += STEPS_PER_FRAME;
        let mhz = (ops as f64 / 1_000_000.0) / start.elapsed().as_secs_f64();
        println!("MHz: {:.3}", mhz);
    }

    for index in 0..SCREEN_COUNT {
        let path = format!("screen{}.png", index);
        let rgba = vm.screen(index).to_rgba();
        let Some(image) = RgbaImage::from_raw(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, rgba)
        else {
            error(format!("screen {} buffer has the wrong size", index));
            process::exit(1);
        };
        image.save(&path).unwrap_or_else(|e| {
            error(format!("failed to write {}: {}", path, e));
            process::exit(1);
        });
        println!("Wrote {}", path);
    }
}
