//! Linear disassembler for compiled script instruction streams.
//!
//! Walks the stream from offset 0, decoding 16-bit big-endian code-points
//! and their inline immediates. Unknown code-points are listed as raw words
//! and the walk continues at the next word, so a single bad region does not
//! hide the rest of the listing.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use byteorder::{BigEndian, ByteOrder};
use clap::Parser;
use serde::{Deserialize, Serialize};

use vaultscript_vm::handler::host_op_arity;
use vaultscript_vm::Opcode;

#[derive(Debug, Serialize, Deserialize)]
pub struct Inst {
    address: u32,
    mnemonic: String,
    operands: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Listing {
    script: String,
    code_size: u32,
    insts: Vec<Inst>,
}

struct Disassembler<'a> {
    code: &'a [u8],
    cursor: usize,
    insts: Vec<Inst>,
}

impl<'a> Disassembler<'a> {
    fn new(code: &'a [u8]) -> Self {
        Self {
            code,
            cursor: 0,
            insts: Vec::new(),
        }
    }

    fn read_u16(&mut self) -> Option<u16> {
        let v = self.code.get(self.cursor..self.cursor + 2)?;
        self.cursor += 2;
        Some(BigEndian::read_u16(v))
    }

    fn read_u32(&mut self) -> Option<u32> {
        let v = self.code.get(self.cursor..self.cursor + 4)?;
        self.cursor += 4;
        Some(BigEndian::read_u32(v))
    }

    fn disassemble(&mut self) {
        while let Some(inst) = self.next_inst() {
            self.insts.push(inst);
        }
    }

    fn next_inst(&mut self) -> Option<Inst> {
        let address = self.cursor as u32;
        let code = self.read_u16()?;

        let Some(op) = Opcode::decode(code) else {
            log::error!("unknown opcode 0x{code:04X} at 0x{address:X}");
            return Some(Inst {
                address,
                mnemonic: format!(".word 0x{code:04X}"),
                operands: Vec::new(),
            });
        };

        let operands = if op.has_immediate() {
            let Some(raw) = self.read_u32() else {
                // truncated immediate; list what we can see
                return Some(Inst {
                    address,
                    mnemonic: op.mnemonic().to_string(),
                    operands: vec!["<truncated>".to_string()],
                });
            };
            vec![match op {
                Opcode::PushInt => (raw as i32).to_string(),
                Opcode::PushFloat => f32::from_bits(raw).to_string(),
                _ => format!("${raw}"),
            }]
        } else if let Some((argc, pushes)) = host_op_arity(op) {
            // engine op: annotate the stack arity for the reader
            vec![format!("args={argc}"), format!("ret={}", pushes as u8)]
        } else {
            Vec::new()
        };

        Some(Inst {
            address,
            mnemonic: op.mnemonic().to_string(),
            operands,
        })
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "disassemble a compiled script instruction stream", long_about = None)]
struct Args {
    /// Raw instruction-stream file.
    #[arg(short, long, required = true)]
    input: PathBuf,

    /// Write a YAML listing here instead of printing text to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let code = fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let mut disasm = Disassembler::new(&code);
    disasm.disassemble();

    let listing = Listing {
        script: args
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        code_size: code.len() as u32,
        insts: disasm.insts,
    };

    match args.output {
        Some(path) => {
            let mut writer = fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            serde_yaml::to_writer(&mut writer, &listing)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for inst in &listing.insts {
                writeln!(
                    out,
                    "{:08X}  {:<16} {}",
                    inst.address,
                    inst.mnemonic,
                    inst.operands.join(", ")
                )?;
            }
        }
    }

    Ok(())
}
