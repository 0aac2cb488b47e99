use crate::compiler::{compile, CompileError};
use crate::vm::{default_globals, Chunk, Vm, VmError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("runtime error: {0}")]
    Runtime(#[from] VmError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Compiles and runs one script.
pub struct Interpreter<'a> {
    source: &'a str,
}

impl<'a> Interpreter<'a> {
    pub fn new(source: &'a str) -> Self {
        Interpreter { source }
    }

    pub fn compile(&self) -> Result<Chunk> {
        Ok(compile(self.source)?)
    }

    /// Runs on a fresh VM whose only global is `print`, writing to stdout.
    pub fn run(&self) -> Result<()> {
        self.run_with(&mut Vm::new(default_globals()))
    }

    pub fn run_with(&self, vm: &mut Vm) -> Result<()> {
        let chunk = self.compile()?;
        vm.run(&chunk)?;
        Ok(())
    }
}
