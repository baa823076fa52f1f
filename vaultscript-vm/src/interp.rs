//! The fetch-dispatch-execute loop.
//!
//! Each iteration processes exactly one opcode. Faults transition the
//! context to `Faulted` and are reported through the trace sink with the
//! script identity and the program counter of the faulting instruction;
//! they never propagate out of the loop, so one broken script cannot take
//! down the host or its sibling contexts.

use crate::config::VmConfig;
use crate::context::{Context, ExecState};
use crate::error::Fault;
use crate::handler::{Flow, HandlerTable};
use crate::host::Host;
use crate::trace::{env_trace_enabled, LogSink, TraceEvent, TraceLevel, TraceSink};

/// Result of a single `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One opcode executed; the context is still running.
    Running,
    Suspended,
    Completed,
    Faulted,
}

/// Result of a bounded `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub state: ExecState,
    /// Opcodes actually executed.
    pub steps: u32,
}

pub struct Interp {
    table: HandlerTable,
    sink: Box<dyn TraceSink + Send>,
    trace_ops: bool,
}

impl Interp {
    pub fn new(config: &VmConfig) -> Self {
        Self::with_sink(config, Box::new(LogSink))
    }

    pub fn with_sink(config: &VmConfig, sink: Box<dyn TraceSink + Send>) -> Self {
        Interp {
            table: HandlerTable::new(),
            sink,
            trace_ops: config.trace_ops || env_trace_enabled(),
        }
    }

    pub fn table(&self) -> &HandlerTable {
        &self.table
    }

    /// Execute at most one opcode.
    ///
    /// Suspended, faulted and completed contexts are left untouched; the
    /// scheduler skips them until an external resume or re-invocation.
    pub fn step(&mut self, ctx: &mut Context, host: &mut dyn Host) -> StepOutcome {
        match ctx.state() {
            ExecState::Suspended => return StepOutcome::Suspended,
            ExecState::Faulted => return StepOutcome::Faulted,
            ExecState::Completed => return StepOutcome::Completed,
            ExecState::Running => {}
        }

        let op_pc = ctx.pc();
        let code = match ctx.fetch_opcode() {
            Ok(code) => code,
            Err(fault) => {
                self.report_fault(ctx, op_pc, 0, fault);
                return StepOutcome::Faulted;
            }
        };

        let Some(handler) = self.table.dispatch(code) else {
            // no handler ran; the stacks are exactly as they were
            let fault = Fault::UnknownOpcode { code, pc: op_pc };
            self.report_fault(ctx, op_pc, code, fault);
            return StepOutcome::Faulted;
        };

        if self.trace_ops {
            let ev = TraceEvent {
                script: ctx.program().name().to_string(),
                context: ctx.id(),
                pc: op_pc,
                opcode: code,
                message: handler.opcode().mnemonic().to_string(),
            };
            self.sink.event(TraceLevel::Debug, &ev);
        }

        match handler.apply(ctx, host) {
            Ok(Flow::Continue) => StepOutcome::Running,
            Ok(Flow::Yield) => StepOutcome::Suspended,
            Ok(Flow::Complete) => {
                ctx.complete();
                StepOutcome::Completed
            }
            Err(fault) => {
                self.report_fault(ctx, op_pc, code, fault);
                StepOutcome::Faulted
            }
        }
    }

    /// Drive one context for up to `max_steps` opcodes or until it leaves
    /// the `Running` state. A context that is not running executes nothing
    /// and is reported as-is.
    pub fn run(&mut self, ctx: &mut Context, host: &mut dyn Host, max_steps: u32) -> RunOutcome {
        let mut steps = 0;
        while steps < max_steps && ctx.state() == ExecState::Running {
            match self.step(ctx, host) {
                // the faulting opcode did not complete
                StepOutcome::Faulted => break,
                _ => steps += 1,
            }
        }
        RunOutcome {
            state: ctx.state(),
            steps,
        }
    }

    fn report_fault(&mut self, ctx: &mut Context, pc: u32, code: u16, fault: Fault) {
        let ev = TraceEvent {
            script: ctx.program().name().to_string(),
            context: ctx.id(),
            pc,
            opcode: code,
            message: fault.to_string(),
        };
        self.sink.event(TraceLevel::Error, &ev);
        ctx.fault(fault);
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new(&VmConfig::default())
    }
}
