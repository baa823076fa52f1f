use std::env;

use once_cell::sync::Lazy;

/// One structured diagnostic event.
///
/// Emitted on every fault, and per dispatched opcode when opcode tracing is
/// on. The sink is external; the default forwards to the `log` macros.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    /// Script (program) name.
    pub script: String,
    /// Context id as assigned by the scheduler, or 0 for standalone runs.
    pub context: u32,
    /// Byte offset of the instruction this event refers to.
    pub pc: u32,
    /// The 16-bit code-point, 0 when not opcode-related.
    pub opcode: u16,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLevel {
    Debug,
    Error,
}

pub trait TraceSink {
    fn event(&mut self, level: TraceLevel, ev: &TraceEvent);
}

/// Default sink: forwards to `log::debug!` / `log::error!`.
#[derive(Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn event(&mut self, level: TraceLevel, ev: &TraceEvent) {
        match level {
            TraceLevel::Debug => log::debug!(
                "[{}:{}] pc=0x{:X} op=0x{:04X} {}",
                ev.script,
                ev.context,
                ev.pc,
                ev.opcode,
                ev.message
            ),
            TraceLevel::Error => log::error!(
                "[{}:{}] pc=0x{:X} op=0x{:04X} {}",
                ev.script,
                ev.context,
                ev.pc,
                ev.opcode,
                ev.message
            ),
        }
    }
}

static ENV_TRACE: Lazy<bool> = Lazy::new(|| match env::var("VAULTSCRIPT_TRACE") {
    Ok(v) => {
        let s = v.trim().to_ascii_lowercase();
        !(s.is_empty() || s == "0" || s == "false" || s == "no" || s == "off")
    }
    Err(_) => false,
});

/// Whether per-opcode tracing was requested through the environment.
/// Parsed once per process.
pub fn env_trace_enabled() -> bool {
    *ENV_TRACE
}
