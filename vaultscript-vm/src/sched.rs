//! Round-robin tick driver over a fixed set of context slots.
//!
//! Each tick gives every runnable context a bounded slice of opcode steps,
//! so one misbehaving script cannot stall the host frame. A context inside
//! a critical section holds its slice until the critical section closes,
//! up to a configured cap of extra slices. Teardown and resume happen only
//! between slices, never mid-opcode.

use crate::config::VmConfig;
use crate::context::{Context, ExecState};
use crate::host::Host;
use crate::interp::Interp;
use crate::program::Program;

pub struct Scheduler {
    slots: Vec<Option<Context>>,
    config: VmConfig,
}

impl Scheduler {
    pub fn new(capacity: usize, config: VmConfig) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Scheduler { slots, config }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Attach a loaded program to a free slot and start it at `entry`.
    /// Returns the slot id, or `None` when all slots are taken.
    pub fn spawn(&mut self, program: Program, entry: u32) -> Option<u32> {
        let free = self.slots.iter().position(|s| s.is_none())?;
        let ctx = Context::new(free as u32, program, entry, &self.config);
        self.slots[free] = Some(ctx);
        Some(free as u32)
    }

    pub fn get(&self, id: u32) -> Option<&Context> {
        self.slots.get(id as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Context> {
        self.slots.get_mut(id as usize)?.as_mut()
    }

    /// External resume of a suspended context (timer fired, dialogue
    /// closed). No-op for any other state.
    pub fn resume(&mut self, id: u32) {
        if let Some(ctx) = self.get_mut(id) {
            ctx.resume();
        }
    }

    /// Forced teardown, e.g. the owning object was destroyed. Contexts are
    /// only ever removed between slices, so this never interrupts an
    /// opcode.
    pub fn kill(&mut self, id: u32) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            *slot = None;
        }
    }

    pub fn runnable(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|c| c.state() == ExecState::Running)
            .count()
    }

    /// One host frame: every runnable context gets up to
    /// `config.step_budget` opcodes, in slot order.
    pub fn tick(&mut self, interp: &mut Interp, host: &mut dyn Host) {
        let budget = self.config.step_budget;
        for slot in self.slots.iter_mut() {
            let Some(ctx) = slot.as_mut() else { continue };
            if ctx.state() != ExecState::Running {
                continue;
            }
            interp.run(ctx, host, budget);
            // a critical section holds the slice until it closes, up to
            // the configured cap of extra slices
            let mut extra = 0;
            while ctx.state() == ExecState::Running && ctx.in_critical() {
                if extra >= self.config.critical_slices {
                    log::warn!(
                        "context {} still in a critical section after {} extra slices, rotating",
                        ctx.id(),
                        extra
                    );
                    break;
                }
                interp.run(ctx, host, budget);
                extra += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;
    use crate::opcode::Opcode;
    use crate::testing::Asm;
    use pretty_assertions::assert_eq;

    fn counting_program(iterations: i32) -> Program {
        // dvar0 += 1, `iterations` times, then exit
        let mut asm = Asm::new();
        for _ in 0..iterations {
            asm.op(Opcode::PushInt).i32(0);
            asm.op(Opcode::FetchDvar);
            asm.op(Opcode::PushInt).i32(1);
            asm.op(Opcode::Add);
            asm.op(Opcode::PushInt).i32(0);
            asm.op(Opcode::StoreDvar);
        }
        asm.op(Opcode::Exit);
        asm.dvars(1);
        asm.program("counter.int")
    }

    #[test]
    fn budget_bounds_each_slice() {
        let config = VmConfig {
            step_budget: 4,
            ..VmConfig::default()
        };
        let mut sched = Scheduler::new(4, config.clone());
        let mut interp = Interp::new(&config);
        let mut host = NullHost;

        let a = sched.spawn(counting_program(10), 0).unwrap();
        let b = sched.spawn(counting_program(10), 0).unwrap();
        assert_eq!((a, b), (0, 1));

        sched.tick(&mut interp, &mut host);
        // neither script can have finished inside one 4-step slice
        assert_eq!(sched.get(a).unwrap().state(), ExecState::Running);
        assert_eq!(sched.get(b).unwrap().state(), ExecState::Running);

        for _ in 0..40 {
            sched.tick(&mut interp, &mut host);
        }
        assert_eq!(sched.get(a).unwrap().state(), ExecState::Completed);
        assert_eq!(sched.get(b).unwrap().state(), ExecState::Completed);
    }

    #[test]
    fn critical_section_holds_the_slice() {
        let config = VmConfig {
            step_budget: 2,
            ..VmConfig::default()
        };
        let mut sched = Scheduler::new(2, config.clone());
        let mut interp = Interp::new(&config);
        let mut host = NullHost;

        // critical_start, 8 noops, critical_done, exit
        let mut asm = Asm::new();
        asm.op(Opcode::CriticalStart);
        for _ in 0..8 {
            asm.op(Opcode::Noop);
        }
        asm.op(Opcode::CriticalDone);
        asm.op(Opcode::Exit);
        let id = sched.spawn(asm.program("crit.int"), 0).unwrap();

        sched.tick(&mut interp, &mut host);
        // the 2-step budget was held until critical_done (10 ops in)
        let ctx = sched.get(id).unwrap();
        assert_eq!(ctx.state(), ExecState::Running);
        assert_eq!(ctx.pc(), 20);

        sched.tick(&mut interp, &mut host);
        assert_eq!(sched.get(id).unwrap().state(), ExecState::Completed);
    }

    #[test]
    fn runaway_critical_section_rotates_out() {
        let config = VmConfig {
            step_budget: 4,
            critical_slices: 3,
            ..VmConfig::default()
        };
        let mut sched = Scheduler::new(1, config.clone());
        let mut interp = Interp::new(&config);
        let mut host = NullHost;

        // critical_start, then an infinite loop that never closes it
        let mut asm = Asm::new();
        asm.op(Opcode::CriticalStart);
        let top = asm.here();
        asm.push_int(top as i32);
        asm.op(Opcode::Jmp);
        let id = sched.spawn(asm.program("stuck.int"), 0).unwrap();

        // the tick must come back with the section still open
        sched.tick(&mut interp, &mut host);
        let ctx = sched.get(id).unwrap();
        assert_eq!(ctx.state(), ExecState::Running);
        assert!(ctx.in_critical());
    }

    #[test]
    fn kill_frees_the_slot() {
        let config = VmConfig::default();
        let mut sched = Scheduler::new(1, config);
        let id = sched.spawn(counting_program(1), 0).unwrap();
        assert!(sched.spawn(counting_program(1), 0).is_none());
        sched.kill(id);
        assert!(sched.spawn(counting_program(1), 0).is_some());
    }
}
