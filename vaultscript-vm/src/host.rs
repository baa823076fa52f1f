use anyhow::Result;

use crate::value::{StringId, Value};

/// The world-side operations the instruction set can reach.
///
/// One variant per host-serviced opcode; the generic host-call handler maps
/// the opcode to its variant and hands over the popped arguments. Keeping
/// this an enum (rather than leaking opcodes into the host) lets host
/// implementations match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    GiveExpPoints,
    Random,
    MoveTo,
    CreateObject,
    DisplayMsg,
    ScriptOverrides,
    SelfObj,
    SourceObj,
    TargetObj,
    DudeObj,
    LocalVar,
    SetLocalVar,
    MapVar,
    SetMapVar,
    GlobalVar,
    SetGlobalVar,
    GetCritterStat,
    AddTimerEvent,
    RmTimerEvent,
    FloatMsg,
    GsayStart,
    GsayEnd,
    GsayReply,
    GsayMessage,
    GiqOption,
    ExportVar,
}

/// Outcome of a synchronous host call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostReply {
    /// The call completed; for value-producing ops this is pushed onto the
    /// data stack.
    Value(Value),
    /// The call completed but the context must suspend (dialogue wait,
    /// timer wait). Only valid for ops that do not produce a value.
    Pending,
}

/// The capability boundary between the VM and the surrounding simulation.
///
/// Calls are synchronous: they either complete or answer [`HostReply::Pending`]
/// before returning. Errors become `Fault::HostCallFailure` for the calling
/// context only. Tests substitute a scripted fake without touching VM
/// internals.
pub trait Host {
    fn call(&mut self, op: HostOp, args: &[Value]) -> Result<HostReply>;

    /// Resolve a string handle to its pool text. Used only where the
    /// instruction set itself demands text (procedure lookup by name); value
    /// semantics never dereference handles.
    fn string_text(&mut self, id: StringId) -> Result<String>;

    /// Concatenate two pool strings, returning the handle of the result.
    fn concat_strings(&mut self, a: StringId, b: StringId) -> Result<StringId>;

    /// Equality over pool strings. The default compares handles, which is
    /// correct for interned pools.
    fn strings_equal(&mut self, a: StringId, b: StringId) -> Result<bool> {
        Ok(a == b)
    }
}

/// A host that answers every call with Integer 0 and resolves no strings.
/// Useful for smoke runs and opcode-level tests.
#[derive(Debug, Default)]
pub struct NullHost;

impl Host for NullHost {
    fn call(&mut self, _op: HostOp, _args: &[Value]) -> Result<HostReply> {
        Ok(HostReply::Value(Value::Int(0)))
    }

    fn string_text(&mut self, id: StringId) -> Result<String> {
        anyhow::bail!("no string pool (handle {})", id.0)
    }

    fn concat_strings(&mut self, a: StringId, _b: StringId) -> Result<StringId> {
        Ok(a)
    }
}
