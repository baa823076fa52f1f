//! Variable access: frame-window locals on the data stack and the
//! persistent per-script DVAR table.

use crate::context::Context;
use crate::error::Fault;
use crate::host::Host;
use crate::opcode::Opcode;

use super::{Flow, HandlerTable};

pub(super) fn register(table: &mut HandlerTable) {
    table.insert(Opcode::FetchLocal, fetch_local);
    table.insert(Opcode::StoreLocal, store_local);
    table.insert(Opcode::FetchDvar, fetch_dvar);
    table.insert(Opcode::StoreDvar, store_dvar);
}

fn local_index(ctx: &Context, offset: i32) -> Result<usize, Fault> {
    if offset < 0 {
        return Err(Fault::IndexOutOfRange {
            kind: "local",
            index: offset as i64,
            len: ctx.data_stack().depth(),
        });
    }
    Ok(ctx.frame_base() + offset as usize)
}

/// Pop an offset, push the value at `frame_base + offset`.
fn fetch_local(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let offset = ctx.data_stack_mut().pop()?.as_int()?;
    let index = local_index(ctx, offset)?;
    let v = *ctx.data_stack().get(index)?;
    ctx.data_stack_mut().push(v)?;
    Ok(Flow::Continue)
}

/// Pop an offset, pop a value, store it at `frame_base + offset`.
fn store_local(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let offset = ctx.data_stack_mut().pop()?.as_int()?;
    let value = ctx.data_stack_mut().pop()?;
    let index = local_index(ctx, offset)?;
    ctx.data_stack_mut().set(index, value)?;
    Ok(Flow::Continue)
}

fn fetch_dvar(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let index = ctx.data_stack_mut().pop()?.as_int()?;
    let v = ctx.dvar(index)?;
    ctx.data_stack_mut().push(v)?;
    Ok(Flow::Continue)
}

fn store_dvar(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let index = ctx.data_stack_mut().pop()?.as_int()?;
    let value = ctx.data_stack_mut().pop()?;
    ctx.set_dvar(index, value)?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VmConfig;
    use crate::host::NullHost;
    use crate::program::Program;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn ctx(dvars: u16) -> Context {
        let program = Program::new("vars.int", Vec::new(), Vec::new(), dvars);
        Context::new(0, program, 0, &VmConfig::default())
    }

    #[test]
    fn locals_are_frame_relative() {
        let mut c = ctx(0);
        let mut h = NullHost;
        // frame: [_, arg0, arg1], base = 1
        for v in [99, 10, 20] {
            c.data_stack_mut().push(Value::Int(v)).unwrap();
        }
        c.set_frame_base(1).unwrap();

        c.data_stack_mut().push(Value::Int(1)).unwrap();
        fetch_local(&mut c, &mut h).unwrap();
        assert_eq!(c.data_stack_mut().pop().unwrap(), Value::Int(20));

        c.data_stack_mut().push(Value::Int(7)).unwrap();
        c.data_stack_mut().push(Value::Int(0)).unwrap();
        store_local(&mut c, &mut h).unwrap();
        assert_eq!(c.data_stack().get(1).unwrap(), &Value::Int(7));
    }

    #[test]
    fn negative_local_offset_faults() {
        let mut c = ctx(0);
        let mut h = NullHost;
        c.data_stack_mut().push(Value::Int(-1)).unwrap();
        assert!(matches!(
            fetch_local(&mut c, &mut h),
            Err(Fault::IndexOutOfRange { kind: "local", .. })
        ));
    }

    #[test]
    fn dvar_store_then_fetch() {
        let mut c = ctx(4);
        let mut h = NullHost;
        c.data_stack_mut().push(Value::Int(55)).unwrap();
        c.data_stack_mut().push(Value::Int(2)).unwrap();
        store_dvar(&mut c, &mut h).unwrap();

        c.data_stack_mut().push(Value::Int(2)).unwrap();
        fetch_dvar(&mut c, &mut h).unwrap();
        assert_eq!(c.data_stack_mut().pop().unwrap(), Value::Int(55));
    }

    #[test]
    fn bad_dvar_index_faults() {
        let mut c = ctx(1);
        let mut h = NullHost;
        c.data_stack_mut().push(Value::Int(3)).unwrap();
        assert!(matches!(
            fetch_dvar(&mut c, &mut h),
            Err(Fault::IndexOutOfRange { kind: "dvar", .. })
        ));
    }
}
