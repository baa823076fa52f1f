/// Deployment parameters.
///
/// None of these are protocol: the compiled-script format says nothing
/// about stack capacity or scheduling, so they live here instead of in
/// constants next to the opcode table.
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Capacity of each of the two per-context stacks.
    pub stack_capacity: usize,
    /// Default number of opcode steps a context may execute per scheduler
    /// tick before the slice rotates.
    pub step_budget: u32,
    /// Extra budget-sized slices a context may hold by staying inside a
    /// critical section. Past the cap the scheduler rotates anyway, so a
    /// critical section that never closes cannot stall the tick.
    pub critical_slices: u32,
    /// Emit a trace event for every dispatched opcode. Also switchable at
    /// runtime via the `VAULTSCRIPT_TRACE` environment variable.
    pub trace_ops: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            stack_capacity: 0x100,
            step_budget: 200,
            critical_slices: 16,
            trace_ops: false,
        }
    }
}
