//! A SUBLEQ-52 toolchain written in Rust, featuring:
//! - assembler with labels, data words, origin padding and hygienic macros
//! - disassembler
//! - virtual machine with a bit-addressable memory and two 1bpp framebuffers

pub mod assembler;
pub mod logging;
pub mod vm;
