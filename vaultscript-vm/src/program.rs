use std::sync::Arc;

/// One entry point inside a compiled script.
///
/// The procedure table is decoded upstream from the compiled binary's
/// header; the VM only reads it for the call-by-index and
/// lookup-procedure-by-name opcodes and for the argument-count check.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    /// Byte offset of the procedure body in the instruction stream.
    pub entry: u32,
    /// Declared argument count per the compiler's calling convention.
    pub args: u8,
}

/// An already-decoded compiled script: the immutable instruction stream
/// plus the metadata the interpreter needs.
///
/// Decoding the on-disk container (headers, string pool extraction) happens
/// upstream; the VM never parses the binary format itself.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    code: Arc<[u8]>,
    procedures: Vec<Procedure>,
    /// Number of persistent script variables (DVARs) declared at load.
    dvar_count: u16,
}

impl Program {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<Arc<[u8]>>,
        procedures: Vec<Procedure>,
        dvar_count: u16,
    ) -> Self {
        Program {
            name: name.into(),
            code: code.into(),
            procedures,
            dvar_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn len(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn dvar_count(&self) -> u16 {
        self.dvar_count
    }

    pub fn procedure(&self, index: usize) -> Option<&Procedure> {
        self.procedures.get(index)
    }

    pub fn procedure_by_name(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name == name)
    }

    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }
}
