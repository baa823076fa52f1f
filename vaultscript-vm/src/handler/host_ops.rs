//! The host-serviced engine opcodes.
//!
//! Each entry declares its argument count and result arity; one generic
//! handler pops the arguments in call order, forwards them through the
//! capability interface, and pushes the result (if any). A pending reply
//! suspends the context instead.

use crate::context::Context;
use crate::error::Fault;
use crate::host::{Host, HostOp, HostReply};
use crate::opcode::Opcode;

use super::{Flow, HandlerTable};

struct HostOpSpec {
    opcode: Opcode,
    op: HostOp,
    argc: usize,
    pushes: bool,
}

const HOST_OPS: &[HostOpSpec] = &[
    HostOpSpec { opcode: Opcode::GiveExpPoints, op: HostOp::GiveExpPoints, argc: 1, pushes: false },
    HostOpSpec { opcode: Opcode::Random, op: HostOp::Random, argc: 2, pushes: true },
    HostOpSpec { opcode: Opcode::MoveTo, op: HostOp::MoveTo, argc: 3, pushes: false },
    HostOpSpec { opcode: Opcode::CreateObject, op: HostOp::CreateObject, argc: 3, pushes: true },
    HostOpSpec { opcode: Opcode::DisplayMsg, op: HostOp::DisplayMsg, argc: 1, pushes: false },
    HostOpSpec { opcode: Opcode::ScriptOverrides, op: HostOp::ScriptOverrides, argc: 0, pushes: false },
    HostOpSpec { opcode: Opcode::SelfObj, op: HostOp::SelfObj, argc: 0, pushes: true },
    HostOpSpec { opcode: Opcode::SourceObj, op: HostOp::SourceObj, argc: 0, pushes: true },
    HostOpSpec { opcode: Opcode::TargetObj, op: HostOp::TargetObj, argc: 0, pushes: true },
    HostOpSpec { opcode: Opcode::DudeObj, op: HostOp::DudeObj, argc: 0, pushes: true },
    HostOpSpec { opcode: Opcode::LocalVar, op: HostOp::LocalVar, argc: 1, pushes: true },
    HostOpSpec { opcode: Opcode::SetLocalVar, op: HostOp::SetLocalVar, argc: 2, pushes: false },
    HostOpSpec { opcode: Opcode::MapVar, op: HostOp::MapVar, argc: 1, pushes: true },
    HostOpSpec { opcode: Opcode::SetMapVar, op: HostOp::SetMapVar, argc: 2, pushes: false },
    HostOpSpec { opcode: Opcode::GlobalVar, op: HostOp::GlobalVar, argc: 1, pushes: true },
    HostOpSpec { opcode: Opcode::SetGlobalVar, op: HostOp::SetGlobalVar, argc: 2, pushes: false },
    HostOpSpec { opcode: Opcode::GetCritterStat, op: HostOp::GetCritterStat, argc: 2, pushes: true },
    HostOpSpec { opcode: Opcode::AddTimerEvent, op: HostOp::AddTimerEvent, argc: 3, pushes: false },
    HostOpSpec { opcode: Opcode::RmTimerEvent, op: HostOp::RmTimerEvent, argc: 1, pushes: false },
    HostOpSpec { opcode: Opcode::FloatMsg, op: HostOp::FloatMsg, argc: 3, pushes: false },
    HostOpSpec { opcode: Opcode::GsayStart, op: HostOp::GsayStart, argc: 0, pushes: false },
    HostOpSpec { opcode: Opcode::GsayEnd, op: HostOp::GsayEnd, argc: 0, pushes: false },
    HostOpSpec { opcode: Opcode::GsayReply, op: HostOp::GsayReply, argc: 2, pushes: false },
    HostOpSpec { opcode: Opcode::GsayMessage, op: HostOp::GsayMessage, argc: 3, pushes: false },
    HostOpSpec { opcode: Opcode::GiqOption, op: HostOp::GiqOption, argc: 5, pushes: false },
    HostOpSpec { opcode: Opcode::ExportVar, op: HostOp::ExportVar, argc: 1, pushes: false },
];

pub(super) fn register(table: &mut HandlerTable) {
    for spec in HOST_OPS {
        table.insert(spec.opcode, move |ctx: &mut Context, host: &mut dyn Host| {
            host_call(ctx, host, spec)
        });
    }
}

fn host_call(ctx: &mut Context, host: &mut dyn Host, spec: &HostOpSpec) -> Result<Flow, Fault> {
    let mut args = Vec::with_capacity(spec.argc);
    for _ in 0..spec.argc {
        args.push(ctx.data_stack_mut().pop()?);
    }
    // popped in reverse push order; hand them over in call order
    args.reverse();

    let reply = host.call(spec.op, &args).map_err(|e| Fault::HostCallFailure {
        op: spec.opcode.mnemonic(),
        message: format!("{e:#}"),
    })?;

    match reply {
        HostReply::Value(v) => {
            if spec.pushes {
                ctx.data_stack_mut().push(v)?;
            }
            Ok(Flow::Continue)
        }
        HostReply::Pending => {
            if spec.pushes {
                return Err(Fault::HostCallFailure {
                    op: spec.opcode.mnemonic(),
                    message: "pending reply for a value-producing op".into(),
                });
            }
            ctx.suspend();
            Ok(Flow::Yield)
        }
    }
}

/// Exposed for the disassembler and tests: whether a code-point is part of
/// the host-serviced family and how many stack arguments it consumes.
pub fn host_op_arity(opcode: Opcode) -> Option<(usize, bool)> {
    HOST_OPS
        .iter()
        .find(|s| s.opcode == opcode)
        .map(|s| (s.argc, s.pushes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VmConfig;
    use crate::context::ExecState;
    use crate::program::Program;
    use crate::testing::ScriptedHost;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn ctx() -> Context {
        let program = Program::new("host.int", Vec::new(), Vec::new(), 0);
        Context::new(0, program, 0, &VmConfig::default())
    }

    fn spec(op: Opcode) -> &'static HostOpSpec {
        HOST_OPS.iter().find(|s| s.opcode == op).unwrap()
    }

    #[test]
    fn args_arrive_in_call_order() {
        let mut c = ctx();
        let mut h = ScriptedHost::new();
        c.data_stack_mut().push(Value::Int(1)).unwrap();
        c.data_stack_mut().push(Value::Int(100)).unwrap();
        host_call(&mut c, &mut h, spec(Opcode::Random)).unwrap();
        assert_eq!(
            h.calls,
            vec![(HostOp::Random, vec![Value::Int(1), Value::Int(100)])]
        );
        // default scripted reply is Integer 0
        assert_eq!(c.data_stack_mut().pop().unwrap(), Value::Int(0));
    }

    #[test]
    fn pending_reply_suspends() {
        let mut c = ctx();
        let mut h = ScriptedHost::new();
        h.reply(HostOp::GsayReply, HostReply::Pending);
        c.data_stack_mut().push(Value::Int(5)).unwrap();
        c.data_stack_mut().push(Value::Int(6)).unwrap();
        let flow = host_call(&mut c, &mut h, spec(Opcode::GsayReply)).unwrap();
        assert_eq!(flow, Flow::Yield);
        assert_eq!(c.state(), ExecState::Suspended);
    }

    #[test]
    fn pending_for_value_producing_op_is_a_host_failure() {
        let mut c = ctx();
        let mut h = ScriptedHost::new();
        h.reply(HostOp::Random, HostReply::Pending);
        c.data_stack_mut().push(Value::Int(1)).unwrap();
        c.data_stack_mut().push(Value::Int(2)).unwrap();
        assert!(matches!(
            host_call(&mut c, &mut h, spec(Opcode::Random)),
            Err(Fault::HostCallFailure { .. })
        ));
    }

    #[test]
    fn missing_args_underflow() {
        let mut c = ctx();
        let mut h = ScriptedHost::new();
        assert_eq!(
            host_call(&mut c, &mut h, spec(Opcode::Random)),
            Err(Fault::StackUnderflow)
        );
    }
}
