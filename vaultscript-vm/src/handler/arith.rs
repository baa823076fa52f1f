//! Arithmetic, logical, bitwise and comparison opcodes.
//!
//! Coercion ladder: Int⊗Int stays Int, any Float operand promotes to Float.
//! String and object operands are valid only for (in)equality and for the
//! concatenating `add`; everything else is a `TypeMismatch`. Division and
//! modulo by zero fault instead of yielding a silent zero.

use std::cmp::Ordering;

use crate::context::Context;
use crate::error::Fault;
use crate::host::Host;
use crate::opcode::Opcode;
use crate::value::Value;

use super::{Flow, HandlerTable};

pub(super) fn register(table: &mut HandlerTable) {
    table.insert(Opcode::Add, add);
    table.insert(Opcode::Sub, |ctx, host| binary_numeric(ctx, host, Opcode::Sub));
    table.insert(Opcode::Mul, |ctx, host| binary_numeric(ctx, host, Opcode::Mul));
    table.insert(Opcode::Div, |ctx, host| binary_numeric(ctx, host, Opcode::Div));
    table.insert(Opcode::Mod, |ctx, host| binary_numeric(ctx, host, Opcode::Mod));
    table.insert(Opcode::Eq, |ctx, host| equality(ctx, host, false));
    table.insert(Opcode::Neq, |ctx, host| equality(ctx, host, true));
    table.insert(Opcode::Lt, |ctx, host| ordering(ctx, host, Opcode::Lt));
    table.insert(Opcode::Le, |ctx, host| ordering(ctx, host, Opcode::Le));
    table.insert(Opcode::Gt, |ctx, host| ordering(ctx, host, Opcode::Gt));
    table.insert(Opcode::Ge, |ctx, host| ordering(ctx, host, Opcode::Ge));
    table.insert(Opcode::And, and);
    table.insert(Opcode::Or, or);
    table.insert(Opcode::Not, not);
    table.insert(Opcode::Negate, negate);
    table.insert(Opcode::Bwand, |ctx, host| bitwise(ctx, host, Opcode::Bwand));
    table.insert(Opcode::Bwor, |ctx, host| bitwise(ctx, host, Opcode::Bwor));
    table.insert(Opcode::Bwxor, |ctx, host| bitwise(ctx, host, Opcode::Bwxor));
    table.insert(Opcode::Bwnot, bwnot);
    table.insert(Opcode::Floor, floor);
}

fn mismatch(expected: &'static str, got: &Value) -> Fault {
    Fault::TypeMismatch {
        expected,
        got: got.kind(),
    }
}

fn pop_pair(ctx: &mut Context) -> Result<(Value, Value), Fault> {
    let b = ctx.data_stack_mut().pop()?;
    let a = ctx.data_stack_mut().pop()?;
    Ok((a, b))
}

fn push_bool(ctx: &mut Context, v: bool) -> Result<Flow, Fault> {
    ctx.data_stack_mut().push(Value::Int(v as i32))?;
    Ok(Flow::Continue)
}

/// `add` also concatenates: two string handles go through the host pool.
fn add(ctx: &mut Context, host: &mut dyn Host) -> Result<Flow, Fault> {
    let (a, b) = pop_pair(ctx)?;
    let out = match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_add(y)),
        (Value::Int(x), Value::Float(y)) => Value::Float(x as f32 + y),
        (Value::Float(x), Value::Int(y)) => Value::Float(x + y as f32),
        (Value::Float(x), Value::Float(y)) => Value::Float(x + y),
        (Value::Str(x), Value::Str(y)) => {
            let id = host.concat_strings(x, y).map_err(|e| Fault::HostCallFailure {
                op: "concat_strings",
                message: format!("{e:#}"),
            })?;
            Value::Str(id)
        }
        (Value::Str(_), other) | (other, Value::Str(_)) => {
            return Err(mismatch("string", &other))
        }
        (other, _) => return Err(mismatch("numeric", &other)),
    };
    ctx.data_stack_mut().push(out)?;
    Ok(Flow::Continue)
}

fn binary_numeric(ctx: &mut Context, _host: &mut dyn Host, op: Opcode) -> Result<Flow, Fault> {
    let (a, b) = pop_pair(ctx)?;
    let out = match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(int_op(op, x, y)?),
        (Value::Int(x), Value::Float(y)) => Value::Float(float_op(op, x as f32, y)?),
        (Value::Float(x), Value::Int(y)) => Value::Float(float_op(op, x, y as f32)?),
        (Value::Float(x), Value::Float(y)) => Value::Float(float_op(op, x, y)?),
        (Value::Int(_), other) | (Value::Float(_), other) | (other, _) => {
            return Err(mismatch("numeric", &other))
        }
    };
    ctx.data_stack_mut().push(out)?;
    Ok(Flow::Continue)
}

fn int_op(op: Opcode, x: i32, y: i32) -> Result<i32, Fault> {
    Ok(match op {
        Opcode::Sub => x.wrapping_sub(y),
        Opcode::Mul => x.wrapping_mul(y),
        Opcode::Div => {
            if y == 0 {
                return Err(Fault::DivisionByZero);
            }
            x.wrapping_div(y)
        }
        Opcode::Mod => {
            if y == 0 {
                return Err(Fault::DivisionByZero);
            }
            x.wrapping_rem(y)
        }
        _ => unreachable!("not a numeric opcode: {op}"),
    })
}

fn float_op(op: Opcode, x: f32, y: f32) -> Result<f32, Fault> {
    Ok(match op {
        Opcode::Sub => x - y,
        Opcode::Mul => x * y,
        Opcode::Div => {
            if y == 0.0 {
                return Err(Fault::DivisionByZero);
            }
            x / y
        }
        Opcode::Mod => {
            if y == 0.0 {
                return Err(Fault::DivisionByZero);
            }
            x % y
        }
        _ => unreachable!("not a numeric opcode: {op}"),
    })
}

fn equality(ctx: &mut Context, host: &mut dyn Host, negate: bool) -> Result<Flow, Fault> {
    let (a, b) = pop_pair(ctx)?;
    let eq = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Int(x), Value::Float(y)) => x as f32 == y,
        (Value::Float(x), Value::Int(y)) => x == y as f32,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => {
            host.strings_equal(x, y).map_err(|e| Fault::HostCallFailure {
                op: "strings_equal",
                message: format!("{e:#}"),
            })?
        }
        (Value::Object(x), Value::Object(y)) => x == y,
        (Value::Str(_), other) | (other, Value::Str(_)) => {
            return Err(mismatch("string", &other))
        }
        (Value::Object(_), other) | (other, Value::Object(_)) => {
            return Err(mismatch("object", &other))
        }
    };
    push_bool(ctx, eq != negate)
}

fn ordering(ctx: &mut Context, _host: &mut dyn Host, op: Opcode) -> Result<Flow, Fault> {
    let (a, b) = pop_pair(ctx)?;
    let ord = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(&y),
        (Value::Int(x), Value::Float(y)) => (x as f32).partial_cmp(&y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(y as f32)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(&y),
        (other, _) if !other.is_int() && !other.is_float() => {
            return Err(mismatch("numeric", &other))
        }
        (_, other) => return Err(mismatch("numeric", &other)),
    };
    // NaN comparisons are simply false
    let v = match ord {
        Some(Ordering::Less) => matches!(op, Opcode::Lt | Opcode::Le),
        Some(Ordering::Equal) => matches!(op, Opcode::Le | Opcode::Ge),
        Some(Ordering::Greater) => matches!(op, Opcode::Gt | Opcode::Ge),
        None => false,
    };
    push_bool(ctx, v)
}

fn and(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let (a, b) = pop_pair(ctx)?;
    push_bool(ctx, a.truthy() && b.truthy())
}

fn or(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let (a, b) = pop_pair(ctx)?;
    push_bool(ctx, a.truthy() || b.truthy())
}

fn not(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = ctx.data_stack_mut().pop()?;
    push_bool(ctx, !v.truthy())
}

fn negate(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = ctx.data_stack_mut().pop()?;
    let out = match v {
        Value::Int(x) => Value::Int(x.wrapping_neg()),
        Value::Float(x) => Value::Float(-x),
        other => return Err(mismatch("numeric", &other)),
    };
    ctx.data_stack_mut().push(out)?;
    Ok(Flow::Continue)
}

fn bitwise(ctx: &mut Context, _host: &mut dyn Host, op: Opcode) -> Result<Flow, Fault> {
    let (a, b) = pop_pair(ctx)?;
    let (x, y) = match (a, b) {
        (Value::Int(x), Value::Int(y)) => (x, y),
        (Value::Int(_), other) | (other, _) => return Err(mismatch("int", &other)),
    };
    let out = match op {
        Opcode::Bwand => x & y,
        Opcode::Bwor => x | y,
        Opcode::Bwxor => x ^ y,
        _ => unreachable!("not a bitwise opcode: {op}"),
    };
    ctx.data_stack_mut().push(Value::Int(out))?;
    Ok(Flow::Continue)
}

fn bwnot(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = ctx.data_stack_mut().pop()?;
    let x = v.as_int()?;
    ctx.data_stack_mut().push(Value::Int(!x))?;
    Ok(Flow::Continue)
}

fn floor(ctx: &mut Context, _host: &mut dyn Host) -> Result<Flow, Fault> {
    let v = ctx.data_stack_mut().pop()?;
    let out = match v {
        Value::Int(x) => Value::Int(x),
        Value::Float(x) => Value::Int(x.floor() as i32),
        other => return Err(mismatch("numeric", &other)),
    };
    ctx.data_stack_mut().push(out)?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VmConfig;
    use crate::host::NullHost;
    use crate::program::Program;
    use pretty_assertions::assert_eq;

    fn ctx() -> Context {
        let program = Program::new("arith.int", Vec::new(), Vec::new(), 0);
        Context::new(0, program, 0, &VmConfig::default())
    }

    fn run2(f: fn(&mut Context, &mut dyn Host, Opcode) -> Result<Flow, Fault>, op: Opcode, a: Value, b: Value) -> Result<Value, Fault> {
        let mut c = ctx();
        let mut h = NullHost;
        c.data_stack_mut().push(a).unwrap();
        c.data_stack_mut().push(b).unwrap();
        f(&mut c, &mut h, op)?;
        c.data_stack_mut().pop()
    }

    #[test]
    fn int_int_stays_int() {
        let mut c = ctx();
        let mut h = NullHost;
        c.data_stack_mut().push(Value::Int(5)).unwrap();
        c.data_stack_mut().push(Value::Int(3)).unwrap();
        add(&mut c, &mut h).unwrap();
        assert_eq!(c.data_stack_mut().pop().unwrap(), Value::Int(8));
    }

    #[test]
    fn float_operand_promotes() {
        assert_eq!(
            run2(binary_numeric, Opcode::Sub, Value::Int(5), Value::Float(0.5)),
            Ok(Value::Float(4.5))
        );
        assert_eq!(
            run2(binary_numeric, Opcode::Mul, Value::Float(2.0), Value::Int(3)),
            Ok(Value::Float(6.0))
        );
    }

    #[test]
    fn division_by_zero_faults() {
        assert_eq!(
            run2(binary_numeric, Opcode::Div, Value::Int(1), Value::Int(0)),
            Err(Fault::DivisionByZero)
        );
        assert_eq!(
            run2(binary_numeric, Opcode::Mod, Value::Float(1.0), Value::Int(0)),
            Err(Fault::DivisionByZero)
        );
    }

    #[test]
    fn string_ordering_is_a_type_mismatch() {
        use crate::value::StringId;
        assert!(matches!(
            run2(ordering, Opcode::Lt, Value::Str(StringId(0)), Value::Str(StringId(1))),
            Err(Fault::TypeMismatch { .. })
        ));
    }

    #[test]
    fn object_equality_compares_handles() {
        use crate::value::ObjectId;
        let mut c = ctx();
        let mut h = NullHost;
        c.data_stack_mut().push(Value::Object(ObjectId(7))).unwrap();
        c.data_stack_mut().push(Value::Object(ObjectId(7))).unwrap();
        equality(&mut c, &mut h, false).unwrap();
        assert_eq!(c.data_stack_mut().pop().unwrap(), Value::Int(1));
    }

    #[test]
    fn mixed_handle_arithmetic_faults() {
        use crate::value::ObjectId;
        assert!(matches!(
            run2(binary_numeric, Opcode::Sub, Value::Object(ObjectId(1)), Value::Int(1)),
            Err(Fault::TypeMismatch { .. })
        ));
    }
}
