//! Pure stack manipulation and literal pushes.

use crate::context::Context;
use crate::error::Fault;
use crate::host::Host;
use crate::opcode::Opcode;
use crate::value::{StringId, Value};

use super::{Flow, HandlerTable};

pub(super) fn register(table: &mut HandlerTable) {
    table.insert(Opcode::Noop, |_ctx, _host| Ok(Flow::Continue));
    table.insert(Opcode::PushInt, push_int);
    table.insert(Opcode::PushFloat, push_float);
    table.insert(Opcode::PushString, push_string);
    table.insert(Opcode::Pop, pop);
    table.insert(Opcode::Dup, dup);
    table.insert(Opcode::Swap, swap);
    table.insert(Opcode::SwapA, swap_a);
    table.insert(Opcode::AToD, a_to_d);
    table.insert(Opcode::DToA, d_to_a);
}

fn push_int(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = ctx.fetch_i32()?;
    ctx.data_stack_mut().push(Value::Int(v))?;
    Ok(Flow::Continue)
}

fn push_float(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = ctx.fetch_f32()?;
    ctx.data_stack_mut().push(Value::Float(v))?;
    Ok(Flow::Continue)
}

fn push_string(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    // string-pool index; the pool itself is host-owned
    let idx = ctx.fetch_u32()?;
    ctx.data_stack_mut().push(Value::Str(StringId(idx)))?;
    Ok(Flow::Continue)
}

fn pop(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    ctx.data_stack_mut().pop()?;
    Ok(Flow::Continue)
}

fn dup(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = *ctx.data_stack().peek(0)?;
    ctx.data_stack_mut().push(v)?;
    Ok(Flow::Continue)
}

fn swap(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    ctx.data_stack_mut().swap_top()?;
    Ok(Flow::Continue)
}

fn swap_a(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    ctx.return_stack_mut().swap_top()?;
    Ok(Flow::Continue)
}

fn a_to_d(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = ctx.return_stack_mut().pop()?;
    ctx.data_stack_mut().push(v)?;
    Ok(Flow::Continue)
}

fn d_to_a(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = ctx.data_stack_mut().pop()?;
    ctx.return_stack_mut().push(v)?;
    Ok(Flow::Continue)
}
