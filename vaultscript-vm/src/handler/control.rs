//! Control flow: jumps, procedure call/return, frame-base bookkeeping,
//! critical sections and program exit.
//!
//! Calling convention (dictated by the external compiler): the caller
//! pushes the arguments, then the argument count, then `push_base` saves
//! the old frame base on the return stack and sets the new base to
//! `depth - argc`; `call` pushes the return address on the return stack on
//! top of that. The callee returns with `pop_return` (return stack → pc)
//! and the caller restores the frame with `pop_base`. `pop_return` with an
//! empty return stack is the outermost return: the invocation completes.

use crate::context::Context;
use crate::error::Fault;
use crate::host::Host;
use crate::opcode::Opcode;
use crate::value::Value;

use super::{Flow, HandlerTable};

pub(super) fn register(table: &mut HandlerTable) {
    table.insert(Opcode::Jmp, jmp);
    table.insert(Opcode::Call, call);
    table.insert(Opcode::IfThen, conditional_jmp);
    table.insert(Opcode::While, conditional_jmp);
    table.insert(Opcode::PopReturn, pop_return);
    table.insert(Opcode::Exit, |_ctx, _host| Ok(Flow::Complete));
    table.insert(Opcode::CriticalStart, |ctx, _host| {
        ctx.set_critical(true);
        Ok(Flow::Continue)
    });
    table.insert(Opcode::CriticalDone, |ctx, _host| {
        ctx.set_critical(false);
        Ok(Flow::Continue)
    });
    table.insert(Opcode::PushBase, push_base);
    table.insert(Opcode::PopBase, pop_base);
    table.insert(Opcode::PopToBase, pop_to_base);
    table.insert(Opcode::CheckArgCount, check_arg_count);
    table.insert(Opcode::LookupProc, lookup_proc);
}

fn jmp(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let target = ctx.data_stack_mut().pop()?.as_int()?;
    ctx.jump(target as i64)?;
    Ok(Flow::Continue)
}

/// Call by procedure index: pushes the return address on the return stack
/// and jumps to the procedure entry.
fn call(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let index = ctx.data_stack_mut().pop()?.as_int()?;
    let entry = procedure_entry(ctx, index)?;
    let return_pc = ctx.pc();
    ctx.return_stack_mut().push(Value::Int(return_pc as i32))?;
    ctx.jump(entry as i64)?;
    Ok(Flow::Continue)
}

fn procedure_entry(ctx: &Context, index: i32) -> Result<u32, Fault> {
    let len = ctx.program().procedures().len();
    if index < 0 {
        return Err(Fault::IndexOutOfRange {
            kind: "procedure",
            index: index as i64,
            len,
        });
    }
    match ctx.program().procedure(index as usize) {
        Some(p) => Ok(p.entry),
        None => Err(Fault::IndexOutOfRange {
            kind: "procedure",
            index: index as i64,
            len,
        }),
    }
}

/// `if` and `while` compile to the same shape: pop the target address, pop
/// the condition, jump when the condition is false.
fn conditional_jmp(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let target = ctx.data_stack_mut().pop()?.as_int()?;
    let cond = ctx.data_stack_mut().pop()?;
    if !cond.truthy() {
        ctx.jump(target as i64)?;
    }
    Ok(Flow::Continue)
}

fn pop_return(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    if ctx.return_stack().is_empty() {
        // outermost return: pop past the initial frame and finish
        ctx.data_stack_mut().truncate(0);
        return Ok(Flow::Complete);
    }
    let target = ctx.return_stack_mut().pop()?.as_int()?;
    ctx.jump(target as i64)?;
    Ok(Flow::Continue)
}

/// Procedure entry: pop the argument count N, save the current frame base
/// on the return stack, and set the new base to `depth - N`.
fn push_base(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let argc = ctx.data_stack_mut().pop()?.as_int()?;
    if argc < 0 {
        return Err(Fault::IndexOutOfRange {
            kind: "argument count",
            index: argc as i64,
            len: ctx.data_stack().depth(),
        });
    }
    let depth = ctx.data_stack().depth();
    if argc as usize > depth {
        return Err(Fault::StackUnderflow);
    }
    let old_base = ctx.frame_base();
    ctx.return_stack_mut().push(Value::Int(old_base as i32))?;
    ctx.set_frame_base(depth - argc as usize)?;
    log::trace!("push_base: base={}", ctx.frame_base());
    Ok(Flow::Continue)
}

/// Procedure exit: restore the caller's frame base from the return stack.
fn pop_base(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let base = ctx.return_stack_mut().pop()?.as_int()?;
    if base < 0 {
        return Err(Fault::IndexOutOfRange {
            kind: "frame base",
            index: base as i64,
            len: ctx.data_stack().depth(),
        });
    }
    ctx.set_frame_base(base as usize)?;
    Ok(Flow::Continue)
}

fn pop_to_base(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let base = ctx.frame_base();
    ctx.data_stack_mut().truncate(base);
    Ok(Flow::Continue)
}

/// Compare the pushed argument count against the procedure's declared
/// convention. A mismatch is a compiled-script bug; fault, never infer.
fn check_arg_count(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let index = ctx.data_stack_mut().pop()?.as_int()?;
    let argc = ctx.data_stack_mut().pop()?.as_int()?;
    let entry = procedure_entry(ctx, index)?;
    let declared = ctx
        .program()
        .procedure(index as usize)
        .map(|p| p.args)
        .unwrap_or(0);
    if argc != declared as i32 {
        log::error!(
            "argument count mismatch for procedure at 0x{:X}: pushed {}, declared {}",
            entry,
            argc,
            declared
        );
        return Err(Fault::IndexOutOfRange {
            kind: "argument count",
            index: argc as i64,
            len: declared as usize,
        });
    }
    Ok(Flow::Continue)
}

/// Resolve a procedure by its pool name and push its entry address.
fn lookup_proc(ctx: &mut Context, host: &mut dyn Host) -> Result<Flow, Fault> {
    let id = ctx.data_stack_mut().pop()?.as_str()?;
    let name = host.string_text(id).map_err(|e| Fault::HostCallFailure {
        op: "lookup_proc",
        message: format!("{e:#}"),
    })?;
    let len = ctx.program().procedures().len();
    let entry = match ctx.program().procedure_by_name(&name) {
        Some(p) => p.entry,
        None => {
            return Err(Fault::IndexOutOfRange {
                kind: "procedure",
                index: -1,
                len,
            })
        }
    };
    ctx.data_stack_mut().push(Value::Int(entry as i32))?;
    Ok(Flow::Continue)
}
