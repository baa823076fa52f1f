//! The opcode handler table.
//!
//! One entry per serviced code-point, built once at startup. Handlers are
//! stateless: everything they touch arrives through the context and the
//! host capability interface, and underlying stack/value faults propagate
//! unchanged.

use std::collections::HashMap;

use crate::context::Context;
use crate::error::Fault;
use crate::host::Host;
use crate::opcode::Opcode;

mod arith;
mod control;
mod host_ops;
mod stack_ops;
mod vars;

pub use host_ops::host_op_arity;

/// What the interpreter loop should do after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue with the next fetch-dispatch cycle.
    Continue,
    /// The context suspended; yield the slice back to the scheduler.
    Yield,
    /// The script finished this invocation.
    Complete,
}

type ApplyFn = dyn Fn(&mut Context, &mut dyn Host) -> Result<Flow, Fault> + Send + Sync;

pub struct Handler {
    opcode: Opcode,
    apply: Box<ApplyFn>,
}

impl Handler {
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn apply(&self, ctx: &mut Context, host: &mut dyn Host) -> Result<Flow, Fault> {
        (self.apply)(ctx, host)
    }
}

/// Sparse code-point → handler lookup, built once.
pub struct HandlerTable {
    entries: HashMap<u16, Handler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        let mut table = HandlerTable {
            entries: HashMap::new(),
        };
        stack_ops::register(&mut table);
        vars::register(&mut table);
        arith::register(&mut table);
        control::register(&mut table);
        host_ops::register(&mut table);
        table
    }

    pub(crate) fn insert<F>(&mut self, opcode: Opcode, apply: F)
    where
        F: Fn(&mut Context, &mut dyn Host) -> Result<Flow, Fault> + Send + Sync + 'static,
    {
        let prev = self.entries.insert(
            opcode.code(),
            Handler {
                opcode,
                apply: Box::new(apply),
            },
        );
        debug_assert!(prev.is_none(), "duplicate handler for {opcode}");
    }

    /// Look up the handler for a code-point. `None` means the dispatch
    /// faults as `UnknownOpcode`; no handler has run, so the stacks are
    /// untouched.
    pub fn dispatch(&self, code: u16) -> Option<&Handler> {
        self.entries.get(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_decodable_opcode_has_a_handler() {
        let table = HandlerTable::new();
        for code in 0x0000..=0xFFFFu16 {
            if let Some(op) = Opcode::decode(code) {
                let h = table
                    .dispatch(code)
                    .unwrap_or_else(|| panic!("no handler for {op}"));
                assert_eq!(h.opcode(), op);
            }
        }
    }

    #[test]
    fn unregistered_code_points_do_not_dispatch() {
        let table = HandlerTable::new();
        assert!(table.dispatch(0x8001).is_none());
        assert!(table.dispatch(0x0000).is_none());
    }
}
