use byteorder::{BigEndian, ByteOrder};

use crate::config::VmConfig;
use crate::error::Fault;
use crate::program::Program;
use crate::stack::Stack;
use crate::value::Value;

/// Interpreter-loop state of one context.
///
/// `Faulted` and `Completed` are terminal for the current invocation; a
/// fresh entry-point invocation resets to `Running` while DVARs persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Running,
    Suspended,
    Faulted,
    Completed,
}

/// Per-object-lifetime variable table (DVARs).
///
/// Kept as its own structure, separate from the per-invocation stacks and
/// program counter, so re-entry is a single reset that never touches it.
#[derive(Debug, Clone)]
pub struct Dvars {
    values: Vec<Value>,
}

impl Dvars {
    pub fn new(count: u16) -> Self {
        Dvars {
            values: vec![Value::Int(0); count as usize],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: i32) -> Result<Value, Fault> {
        if index < 0 || index as usize >= self.values.len() {
            return Err(Fault::IndexOutOfRange {
                kind: "dvar",
                index: index as i64,
                len: self.values.len(),
            });
        }
        Ok(self.values[index as usize])
    }

    pub fn set(&mut self, index: i32, value: Value) -> Result<(), Fault> {
        if index < 0 || index as usize >= self.values.len() {
            return Err(Fault::IndexOutOfRange {
                kind: "dvar",
                index: index as i64,
                len: self.values.len(),
            });
        }
        self.values[index as usize] = value;
        Ok(())
    }
}

/// Per-script runtime state: the two stacks, the program counter, the frame
/// base, the persistent DVAR table and the transient flags. Opcode handlers
/// mutate exactly this.
#[derive(Debug, Clone)]
pub struct Context {
    id: u32,
    program: Program,
    pc: u32,
    data: Stack,
    ret: Stack,
    frame_base: usize,
    dvars: Dvars,
    state: ExecState,
    in_critical: bool,
    fault: Option<Fault>,
    stack_capacity: usize,
}

impl Context {
    /// Create a context for a loaded script and start it at `entry`.
    pub fn new(id: u32, program: Program, entry: u32, config: &VmConfig) -> Self {
        let dvars = Dvars::new(program.dvar_count());
        Context {
            id,
            pc: entry,
            data: Stack::new(config.stack_capacity),
            ret: Stack::new(config.stack_capacity),
            frame_base: 0,
            dvars,
            state: ExecState::Running,
            in_critical: false,
            fault: None,
            stack_capacity: config.stack_capacity,
            program,
        }
    }

    /// Fresh invocation of an entry point: stacks, frame base and flags are
    /// reset, DVARs are preserved.
    pub fn invoke(&mut self, entry: u32) {
        self.pc = entry;
        self.data.clear();
        self.ret.clear();
        self.frame_base = 0;
        self.state = ExecState::Running;
        self.in_critical = false;
        self.fault = None;
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn in_critical(&self) -> bool {
        self.in_critical
    }

    pub fn set_critical(&mut self, on: bool) {
        self.in_critical = on;
    }

    pub fn last_fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn data_stack(&self) -> &Stack {
        &self.data
    }

    pub fn data_stack_mut(&mut self) -> &mut Stack {
        &mut self.data
    }

    pub fn return_stack(&self) -> &Stack {
        &self.ret
    }

    pub fn return_stack_mut(&mut self) -> &mut Stack {
        &mut self.ret
    }

    pub fn frame_base(&self) -> usize {
        self.frame_base
    }

    /// Invariant: the frame base never exceeds the data-stack depth.
    pub fn set_frame_base(&mut self, base: usize) -> Result<(), Fault> {
        if base > self.data.depth() {
            return Err(Fault::IndexOutOfRange {
                kind: "frame base",
                index: base as i64,
                len: self.data.depth(),
            });
        }
        self.frame_base = base;
        Ok(())
    }

    pub fn dvars(&self) -> &Dvars {
        &self.dvars
    }

    pub fn dvar(&self, index: i32) -> Result<Value, Fault> {
        self.dvars.get(index)
    }

    pub fn set_dvar(&mut self, index: i32, value: Value) -> Result<(), Fault> {
        self.dvars.set(index, value)
    }

    pub fn suspend(&mut self) {
        if self.state == ExecState::Running {
            self.state = ExecState::Suspended;
        }
    }

    /// External resume (timer fired, dialogue closed). Continues at the
    /// saved program counter with stacks intact.
    pub fn resume(&mut self) {
        if self.state == ExecState::Suspended {
            self.state = ExecState::Running;
        }
    }

    pub(crate) fn complete(&mut self) {
        self.state = ExecState::Completed;
    }

    pub(crate) fn fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
        self.state = ExecState::Faulted;
        self.in_critical = false;
    }

    fn ensure(&self, need: u32) -> Result<(), Fault> {
        let len = self.program.len();
        if self.pc.saturating_add(need) > len {
            return Err(Fault::IndexOutOfRange {
                kind: "pc",
                index: self.pc as i64,
                len: len as usize,
            });
        }
        Ok(())
    }

    /// Read the 16-bit opcode code-point at the program counter and advance
    /// past it. The compiled format is big-endian throughout.
    pub fn fetch_opcode(&mut self) -> Result<u16, Fault> {
        self.ensure(2)?;
        let off = self.pc as usize;
        let v = BigEndian::read_u16(&self.program.code()[off..off + 2]);
        self.pc += 2;
        Ok(v)
    }

    pub fn fetch_i16(&mut self) -> Result<i16, Fault> {
        self.ensure(2)?;
        let off = self.pc as usize;
        let v = BigEndian::read_i16(&self.program.code()[off..off + 2]);
        self.pc += 2;
        Ok(v)
    }

    pub fn fetch_i32(&mut self) -> Result<i32, Fault> {
        self.ensure(4)?;
        let off = self.pc as usize;
        let v = BigEndian::read_i32(&self.program.code()[off..off + 4]);
        self.pc += 4;
        Ok(v)
    }

    pub fn fetch_u32(&mut self) -> Result<u32, Fault> {
        self.ensure(4)?;
        let off = self.pc as usize;
        let v = BigEndian::read_u32(&self.program.code()[off..off + 4]);
        self.pc += 4;
        Ok(v)
    }

    pub fn fetch_f32(&mut self) -> Result<f32, Fault> {
        Ok(f32::from_bits(self.fetch_u32()?))
    }

    /// Redirect the program counter. Targets are validated against the
    /// instruction stream before the counter moves.
    pub fn jump(&mut self, target: i64) -> Result<(), Fault> {
        if target < 0 || target > self.program.len() as i64 {
            return Err(Fault::IndexOutOfRange {
                kind: "jump",
                index: target,
                len: self.program.len() as usize,
            });
        }
        self.pc = target as u32;
        Ok(())
    }

    pub fn stack_capacity(&self) -> usize {
        self.stack_capacity
    }
}
