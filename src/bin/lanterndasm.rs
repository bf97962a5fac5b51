use lantern::header::Header;
use lantern::instruction::Instruction;
use lantern::memory::{Memory, StoryMemory};
use log::debug;
use std::env;
use std::fs::File;
use std::io::Read;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut start = None;
    let mut count = 32usize;
    let mut dump_hex = false;
    let mut filename = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--start" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or("--start requires a hex address")?;
                start = Some(u32::from_str_radix(value.trim_start_matches("0x"), 16)?);
            }
            "--count" => {
                i += 1;
                let value = args.get(i).ok_or("--count requires a number")?;
                count = value.parse()?;
            }
            "-d" => dump_hex = true,
            "-h" | "--help" => {
                eprintln!("Usage: {} [options] <story-file>", args[0]);
                eprintln!("\nOptions:");
                eprintln!("  --start <hex>  Address to decode from (default: initial PC)");
                eprintln!("  --count <n>    Number of instructions to decode (default: 32)");
                eprintln!("  -d             Dump hex bytes of each instruction");
                eprintln!("  -h             Show this help message");
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                filename = Some(arg.to_string());
                i += 1;
                continue;
            }
            other => {
                eprintln!("Unknown option: {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let filename = filename.ok_or_else(|| {
        format!("Usage: {} [options] <story-file>", args[0])
    })?;

    let mut file = File::open(&filename)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    debug!("Loaded {} bytes from {}", bytes.len(), filename);

    let header = Header::new(&bytes)?;
    println!("{header}");

    let version = header.version;
    let memory = StoryMemory::unprotected(bytes);
    let mut addr = start.unwrap_or(header.initial_pc as u32);

    for _ in 0..count {
        let inst = match Instruction::decode(&memory, addr, version) {
            Ok(inst) => inst,
            Err(e) => {
                eprintln!("{addr:05x}: decode stopped: {e}");
                break;
            }
        };
        if dump_hex {
            let mut hex = String::new();
            for offset in 0..inst.size {
                hex.push_str(&format!("{:02x} ", memory.read_byte(addr + offset as u32)?));
            }
            println!("{addr:05x}: {hex:<24} {}", inst.format_with_version(version));
        } else {
            println!("{addr:05x}: {}", inst.format_with_version(version));
        }
        addr += inst.size as u32;
    }

    Ok(())
}
