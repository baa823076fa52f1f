//! Developer-facing utilities: a tiny instruction-stream assembler and a
//! scripted fake host.
//!
//! This is intentionally a module (not `src/bin/...`) so it can be reused
//! from unit tests, the integration tests and other workspace crates.

use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use byteorder::{BigEndian, ByteOrder};

use crate::host::{Host, HostOp, HostReply};
use crate::opcode::Opcode;
use crate::program::{Procedure, Program};
use crate::value::{StringId, Value};

/// Builds big-endian instruction streams the way the external compiler
/// lays them out.
#[derive(Default)]
pub struct Asm {
    buf: Vec<u8>,
    procedures: Vec<Procedure>,
    dvar_count: u16,
}

impl Asm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current byte offset; useful for jump targets.
    pub fn here(&self) -> u32 {
        self.buf.len() as u32
    }

    pub fn op(&mut self, op: Opcode) -> &mut Self {
        self.word(op.code())
    }

    /// Append a raw 16-bit code-point (for unknown-opcode tests).
    pub fn word(&mut self, code: u16) -> &mut Self {
        let mut b = [0u8; 2];
        BigEndian::write_u16(&mut b, code);
        self.buf.extend_from_slice(&b);
        self
    }

    /// Append a 32-bit immediate (follows `push_int`).
    pub fn i32(&mut self, v: i32) -> &mut Self {
        let mut b = [0u8; 4];
        BigEndian::write_i32(&mut b, v);
        self.buf.extend_from_slice(&b);
        self
    }

    /// Append a float immediate (follows `push_float`).
    pub fn f32(&mut self, v: f32) -> &mut Self {
        let mut b = [0u8; 4];
        BigEndian::write_u32(&mut b, v.to_bits());
        self.buf.extend_from_slice(&b);
        self
    }

    /// Append a string-pool index immediate (follows `push_string`).
    pub fn u32(&mut self, v: u32) -> &mut Self {
        let mut b = [0u8; 4];
        BigEndian::write_u32(&mut b, v);
        self.buf.extend_from_slice(&b);
        self
    }

    /// Shorthand: `push_int` with its immediate.
    pub fn push_int(&mut self, v: i32) -> &mut Self {
        self.op(Opcode::PushInt).i32(v)
    }

    pub fn proc(&mut self, name: &str, entry: u32, args: u8) -> &mut Self {
        self.procedures.push(Procedure {
            name: name.to_string(),
            entry,
            args,
        });
        self
    }

    pub fn dvars(&mut self, count: u16) -> &mut Self {
        self.dvar_count = count;
        self
    }

    pub fn program(&self, name: &str) -> Program {
        Program::new(
            name,
            self.buf.clone(),
            self.procedures.clone(),
            self.dvar_count,
        )
    }
}

/// A fake host that records every capability call and answers from a
/// per-op reply queue (default reply: Integer 0). Carries a small string
/// pool for the ops that need text.
#[derive(Default)]
pub struct ScriptedHost {
    pub calls: Vec<(HostOp, Vec<Value>)>,
    replies: HashMap<HostOp, VecDeque<HostReply>>,
    pub strings: Vec<String>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strings(strings: &[&str]) -> Self {
        ScriptedHost {
            strings: strings.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Queue a reply for the next call of `op`.
    pub fn reply(&mut self, op: HostOp, reply: HostReply) -> &mut Self {
        self.replies.entry(op).or_default().push_back(reply);
        self
    }

    pub fn calls_of(&self, op: HostOp) -> usize {
        self.calls.iter().filter(|(o, _)| *o == op).count()
    }
}

impl Host for ScriptedHost {
    fn call(&mut self, op: HostOp, args: &[Value]) -> Result<HostReply> {
        self.calls.push((op, args.to_vec()));
        let reply = self
            .replies
            .get_mut(&op)
            .and_then(|q| q.pop_front())
            .unwrap_or(HostReply::Value(Value::Int(0)));
        Ok(reply)
    }

    fn string_text(&mut self, id: StringId) -> Result<String> {
        self.strings
            .get(id.0 as usize)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no string with handle {}", id.0))
    }

    fn concat_strings(&mut self, a: StringId, b: StringId) -> Result<StringId> {
        let sa = self.string_text(a)?;
        let sb = self.string_text(b)?;
        self.strings.push(format!("{sa}{sb}"));
        Ok(StringId(self.strings.len() as u32 - 1))
    }

    fn strings_equal(&mut self, a: StringId, b: StringId) -> Result<bool> {
        if a == b {
            return Ok(true);
        }
        Ok(self.string_text(a)? == self.string_text(b)?)
    }
}
