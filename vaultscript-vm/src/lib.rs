//! A stack-based bytecode VM for compiled game scripts.
//!
//! The VM emulates a fixed external instruction set: 16-bit big-endian
//! opcodes, a data stack and a return stack per script, frame-base
//! bookkeeping for procedure locals, persistent per-script variables
//! (DVARs) and cooperative suspension. Script binaries are decoded
//! upstream into a [`Program`]; world effects go through the [`Host`]
//! capability trait; diagnostics leave through a [`trace::TraceSink`].
//!
//! ```
//! use vaultscript_vm::{
//!     Asm, Context, ExecState, Interp, NullHost, Opcode, Value, VmConfig,
//! };
//!
//! let mut asm = Asm::new();
//! asm.push_int(5).push_int(3).op(Opcode::Add).op(Opcode::PopReturn);
//! let config = VmConfig::default();
//! let mut ctx = Context::new(0, asm.program("demo.int"), 0, &config);
//! let mut interp = Interp::new(&config);
//! let out = interp.run(&mut ctx, &mut NullHost, 100);
//! assert_eq!(out.state, ExecState::Completed);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod host;
pub mod interp;
pub mod opcode;
pub mod program;
pub mod sched;
pub mod stack;
pub mod testing;
pub mod trace;
pub mod value;

pub use config::VmConfig;
pub use context::{Context, Dvars, ExecState};
pub use error::Fault;
pub use handler::{Flow, HandlerTable};
pub use host::{Host, HostOp, HostReply, NullHost};
pub use interp::{Interp, RunOutcome, StepOutcome};
pub use opcode::Opcode;
pub use program::{Procedure, Program};
pub use sched::Scheduler;
pub use stack::Stack;
pub use testing::{Asm, ScriptedHost};
pub use trace::{TraceEvent, TraceLevel, TraceSink};
pub use value::{ObjectId, StringId, Value};
