use crate::error::Fault;
use crate::value::Value;

/// Bounded LIFO container of [`Value`].
///
/// Two instances live in every context: the data stack and the return
/// stack. Bound violations are compiled-script bugs and surface as faults;
/// the stack never grows past its configured limit.
#[derive(Debug, Clone)]
pub struct Stack {
    values: Vec<Value>,
    limit: usize,
}

impl Stack {
    pub fn new(limit: usize) -> Self {
        Stack {
            values: Vec::with_capacity(limit.min(64)),
            limit,
        }
    }

    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Value) -> Result<(), Fault> {
        if self.values.len() >= self.limit {
            return Err(Fault::StackOverflow { limit: self.limit });
        }
        self.values.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, Fault> {
        self.values.pop().ok_or(Fault::StackUnderflow)
    }

    /// Bounds-checked read relative to the top; offset 0 is the most
    /// recently pushed element.
    pub fn peek(&self, offset: usize) -> Result<&Value, Fault> {
        if offset >= self.values.len() {
            return Err(Fault::StackUnderflow);
        }
        Ok(&self.values[self.values.len() - 1 - offset])
    }

    /// Absolute read, used for frame-window access from the frame base.
    pub fn get(&self, index: usize) -> Result<&Value, Fault> {
        self.values.get(index).ok_or(Fault::IndexOutOfRange {
            kind: "local",
            index: index as i64,
            len: self.values.len(),
        })
    }

    /// Absolute write into the frame window.
    pub fn set(&mut self, index: usize, value: Value) -> Result<(), Fault> {
        let len = self.values.len();
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Fault::IndexOutOfRange {
                kind: "local",
                index: index as i64,
                len,
            }),
        }
    }

    pub fn swap_top(&mut self) -> Result<(), Fault> {
        let len = self.values.len();
        if len < 2 {
            return Err(Fault::StackUnderflow);
        }
        self.values.swap(len - 1, len - 2);
        Ok(())
    }

    /// Drop values down to `depth`. Used by the pop-to-base opcode and by
    /// invocation reset.
    pub fn truncate(&mut self, depth: usize) {
        self.values.truncate(depth);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lifo_order() {
        let mut s = Stack::new(8);
        for i in 0..5 {
            s.push(Value::Int(i)).unwrap();
        }
        for i in (0..5).rev() {
            assert_eq!(s.pop().unwrap(), Value::Int(i));
        }
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn underflow_and_overflow() {
        let mut s = Stack::new(2);
        assert_eq!(s.pop(), Err(Fault::StackUnderflow));
        s.push(Value::Int(1)).unwrap();
        s.push(Value::Int(2)).unwrap();
        assert_eq!(s.push(Value::Int(3)), Err(Fault::StackOverflow { limit: 2 }));
        // the failed push must not have changed the stack
        assert_eq!(s.depth(), 2);
    }

    #[test]
    fn peek_is_relative_to_top() {
        let mut s = Stack::new(8);
        s.push(Value::Int(10)).unwrap();
        s.push(Value::Int(20)).unwrap();
        assert_eq!(s.peek(0).unwrap(), &Value::Int(20));
        assert_eq!(s.peek(1).unwrap(), &Value::Int(10));
        assert_eq!(s.peek(2), Err(Fault::StackUnderflow));
    }

    #[test]
    fn swap_top_needs_two() {
        let mut s = Stack::new(8);
        s.push(Value::Int(1)).unwrap();
        assert_eq!(s.swap_top(), Err(Fault::StackUnderflow));
        s.push(Value::Int(2)).unwrap();
        s.swap_top().unwrap();
        assert_eq!(s.pop().unwrap(), Value::Int(1));
        assert_eq!(s.pop().unwrap(), Value::Int(2));
    }
}
