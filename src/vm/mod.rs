use std::collections::HashMap;
use std::io::{self, Write};

mod builtins;
mod bytecode;
mod value;

pub use builtins::{default_globals, print};
pub use bytecode::{ByteCode, Chunk, OpCode};
pub use value::{NativeFn, NativeFunction, Value};

#[derive(Debug, thiserror::Error)]
pub enum VmErrorKind {
    #[error("register R{slot} holds a {found}, not a function")]
    NotAFunction { slot: u8, found: &'static str },
    #[error("constant K{index} is a {found}, not a global name")]
    GlobalNameNotString { index: u8, found: &'static str },
    #[error("undefined global '{name}'")]
    UndefinedGlobal { name: String },
    #[error("constant K{index} out of range (pool holds {len})")]
    ConstantOutOfRange { index: u8, len: usize },
    #[error("register R{slot} read before it was written")]
    UnwrittenRegister { slot: usize },
    #[error("unknown opcode: {op}")]
    UnknownOpcode { op: u8 },
    #[error("invalid operand {value} for {op}")]
    InvalidOperand { op: OpCode, value: u8 },
    #[error("native function '{name}' failed with status {status}")]
    NativeFailure { name: String, status: i32 },
}

/// A failed instruction: where it sits in the code and why it failed.
#[derive(Debug, thiserror::Error)]
#[error("{pc:04} {inst}: {kind}")]
pub struct VmError {
    pub pc: usize,
    pub inst: ByteCode,
    pub kind: VmErrorKind,
}

pub type VmResult<T> = Result<T, VmErrorKind>;

/// Register machine. Globals are read-only while executing; the register
/// file is scratch state reset by every [`Vm::execute`].
pub struct Vm {
    globals: HashMap<String, Value>,
    stack: Vec<Option<Value>>,
    func_index: usize,
    output: Box<dyn Write>,
}

impl Vm {
    pub fn new(globals: HashMap<String, Value>) -> Self {
        Vm::with_output(globals, io::stdout())
    }

    pub fn with_output(globals: HashMap<String, Value>, output: impl Write + 'static) -> Self {
        Vm {
            globals,
            stack: Vec::new(),
            func_index: 0,
            output: Box::new(output),
        }
    }

    pub fn globals(&self) -> &HashMap<String, Value> {
        &self.globals
    }

    /// Register holding the callee of the most recent `Call`.
    pub fn func_index(&self) -> usize {
        self.func_index
    }

    /// The single argument of the running native call, at `func_index + 1`.
    pub fn argument(&self) -> VmResult<&Value> {
        self.register(self.func_index + 1)
    }

    pub fn register(&self, slot: usize) -> VmResult<&Value> {
        self.stack
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or(VmErrorKind::UnwrittenRegister { slot })
    }

    pub fn output(&mut self) -> &mut dyn Write {
        &mut *self.output
    }

    pub fn run(&mut self, chunk: &Chunk) -> Result<(), VmError> {
        self.execute(&chunk.constants, &chunk.code)
    }

    /// Runs `code` to its end, stopping at the first failing instruction.
    pub fn execute(&mut self, constants: &[Value], code: &[ByteCode]) -> Result<(), VmError> {
        self.stack.clear();
        self.func_index = 0;
        tracing::debug!(constants = constants.len(), instructions = code.len(), "execute");

        for (pc, &inst) in code.iter().enumerate() {
            tracing::trace!(pc, %inst, "dispatch");
            if let Err(kind) = self.step(constants, inst) {
                tracing::debug!(pc, %inst, %kind, "execution failed");
                return Err(VmError { pc, inst, kind });
            }
        }

        tracing::debug!(registers = self.stack.len(), "execution finished");
        Ok(())
    }

    fn step(&mut self, constants: &[Value], inst: ByteCode) -> VmResult<()> {
        match inst.opcode()? {
            OpCode::GetGlobal => {
                let index = inst.b();
                let name = match constant(constants, index)? {
                    Value::String(name) => name,
                    other => {
                        return Err(VmErrorKind::GlobalNameNotString { index, found: other.type_name() });
                    }
                };
                let value = self
                    .globals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| VmErrorKind::UndefinedGlobal { name: name.clone() })?;
                self.set_register(inst.a(), value);
            }
            OpCode::LoadConst => {
                let value = constant(constants, inst.b())?.clone();
                self.set_register(inst.a(), value);
            }
            OpCode::Call => {
                let slot = inst.a();
                let func = match self.register(slot as usize)? {
                    Value::Function(func) => func.clone(),
                    other => {
                        return Err(VmErrorKind::NotAFunction { slot, found: other.type_name() });
                    }
                };
                for arg in 1..=inst.b() as usize {
                    self.register(slot as usize + arg)?;
                }
                self.func_index = slot as usize;
                let status = func.call(self);
                if status != 0 {
                    return Err(VmErrorKind::NativeFailure { name: func.name().to_string(), status });
                }
            }
            OpCode::LoadNil => self.set_register(inst.a(), Value::Nil),
            OpCode::LoadBool => {
                let flag = match inst.b() {
                    0 => false,
                    1 => true,
                    value => return Err(VmErrorKind::InvalidOperand { op: OpCode::LoadBool, value }),
                };
                self.set_register(inst.a(), Value::Boolean(flag));
            }
            OpCode::LoadInt => self.set_register(inst.a(), Value::Integer(i64::from(inst.sbx()))),
            OpCode::Move => {
                let value = self.register(inst.b() as usize)?.clone();
                self.set_register(inst.a(), value);
            }
        }
        Ok(())
    }

    fn set_register(&mut self, slot: u8, value: Value) {
        let slot = slot as usize;
        if slot >= self.stack.len() {
            self.stack.resize(slot + 1, None);
        }
        self.stack[slot] = Some(value);
    }
}

fn constant(constants: &[Value], index: u8) -> VmResult<&Value> {
    constants
        .get(index as usize)
        .ok_or(VmErrorKind::ConstantOutOfRange { index, len: constants.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::SharedBuffer;
    use std::cell::Cell;
    use std::rc::Rc;

    fn vm_with_output() -> (Vm, SharedBuffer) {
        let out = SharedBuffer::default();
        (Vm::with_output(default_globals(), out.clone()), out)
    }

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn prints_constant_string() {
        let (mut vm, out) = vm_with_output();
        let constants = vec![s("print"), s("hello world")];
        let code = vec![ByteCode::get_global(0, 0), ByteCode::load_const(1, 1), ByteCode::call(0, 1)];
        vm.execute(&constants, &code).unwrap();
        assert_eq!(out.contents(), "hello world\n");
    }

    #[test]
    fn load_int_sign_extends() {
        let (mut vm, out) = vm_with_output();
        let constants = vec![s("print")];
        let code = vec![ByteCode::get_global(0, 0), ByteCode::load_int(1, -32768), ByteCode::call(0, 1)];
        vm.execute(&constants, &code).unwrap();
        assert_eq!(out.contents(), "-32768\n");
    }

    #[test]
    fn nil_bool_and_move() {
        let (mut vm, out) = vm_with_output();
        let constants = vec![s("print")];
        let code = vec![
            ByteCode::load_bool(0, true),
            ByteCode::load_nil(1),
            ByteCode::get_global(2, 0),
            ByteCode::mov(3, 0),
            ByteCode::call(2, 1),
            ByteCode::mov(3, 1),
            ByteCode::call(2, 1),
        ];
        vm.execute(&constants, &code).unwrap();
        assert_eq!(out.contents(), "true\nnil\n");
    }

    #[test]
    fn register_file_grows_to_highest_write() {
        let (mut vm, _) = vm_with_output();
        vm.execute(&[], &[ByteCode::load_int(9, 1)]).unwrap();
        assert!(matches!(vm.register(9), Ok(Value::Integer(1))));
        assert!(matches!(vm.register(4), Err(VmErrorKind::UnwrittenRegister { slot: 4 })));
        assert!(matches!(vm.register(10), Err(VmErrorKind::UnwrittenRegister { slot: 10 })));
    }

    #[test]
    fn each_execution_starts_with_fresh_registers() {
        let (mut vm, _) = vm_with_output();
        vm.execute(&[], &[ByteCode::load_int(0, 1)]).unwrap();
        let err = vm.execute(&[], &[ByteCode::mov(1, 0)]).unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::UnwrittenRegister { slot: 0 }));
    }

    #[test]
    fn undefined_global() {
        let (mut vm, _) = vm_with_output();
        let err = vm.execute(&[s("nope")], &[ByteCode::get_global(0, 0)]).unwrap_err();
        assert!(matches!(&err.kind, VmErrorKind::UndefinedGlobal { name } if name == "nope"));
        assert_eq!(err.kind.to_string(), "undefined global 'nope'");
        assert_eq!(err.to_string(), "0000 GetGlobal R0 K0: undefined global 'nope'");
    }

    #[test]
    fn global_name_must_be_string() {
        let (mut vm, _) = vm_with_output();
        let err = vm.execute(&[Value::Integer(1)], &[ByteCode::get_global(0, 0)]).unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::GlobalNameNotString { index: 0, found: "integer" }));
    }

    #[test]
    fn constant_index_is_bounds_checked() {
        let (mut vm, _) = vm_with_output();
        let err = vm.execute(&[], &[ByteCode::load_const(0, 3)]).unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::ConstantOutOfRange { index: 3, len: 0 }));
        let err = vm.execute(&[], &[ByteCode::get_global(0, 0)]).unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::ConstantOutOfRange { index: 0, len: 0 }));
    }

    #[test]
    fn calling_a_non_function() {
        let (mut vm, _) = vm_with_output();
        let code = vec![ByteCode::load_int(0, 5), ByteCode::load_nil(1), ByteCode::call(0, 1)];
        let err = vm.execute(&[], &code).unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::NotAFunction { slot: 0, found: "integer" }));
    }

    #[test]
    fn call_requires_written_argument() {
        let (mut vm, out) = vm_with_output();
        let code = vec![ByteCode::get_global(0, 0), ByteCode::call(0, 1)];
        let err = vm.execute(&[s("print")], &code).unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::UnwrittenRegister { slot: 1 }));
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn unknown_opcode_is_reported() {
        let (mut vm, out) = vm_with_output();
        let code = vec![
            ByteCode::get_global(0, 0),
            ByteCode::load_int(1, 1),
            ByteCode::from_bytes([0x7F, 0, 0, 0]),
            ByteCode::call(0, 1),
        ];
        let err = vm.execute(&[s("print")], &code).unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::UnknownOpcode { op: 0x7F }));
        assert_eq!(err.pc, 2);
        assert_eq!(err.inst, ByteCode::from_bytes([0x7F, 0, 0, 0]));
        assert_eq!(out.contents(), "", "nothing after the failure runs");
    }

    #[test]
    fn invalid_bool_operand() {
        let (mut vm, _) = vm_with_output();
        let err = vm.execute(&[], &[ByteCode::from_bytes([4, 0, 2, 0])]).unwrap_err();
        assert!(matches!(err.kind, VmErrorKind::InvalidOperand { op: OpCode::LoadBool, value: 2 }));
    }

    #[test]
    fn native_sees_func_index_and_argument() {
        let seen = Rc::new(Cell::new(None));
        let spy = {
            let seen = seen.clone();
            Value::function("spy", move |vm: &mut Vm| {
                let arg = match vm.argument() {
                    Ok(Value::Integer(n)) => *n,
                    _ => return 1,
                };
                seen.set(Some((vm.func_index(), arg)));
                0
            })
        };
        let mut vm = Vm::with_output(HashMap::from([("spy".to_string(), spy)]), io::sink());
        let code = vec![ByteCode::load_int(0, 0), ByteCode::get_global(3, 0), ByteCode::load_int(4, 77), ByteCode::call(3, 1)];
        vm.execute(&[s("spy")], &code).unwrap();
        assert_eq!(seen.get(), Some((3, 77)));
    }

    #[test]
    fn non_zero_status_fails_execution() {
        let fail = Value::function("fail", |_: &mut Vm| 2);
        let mut vm = Vm::with_output(HashMap::from([("fail".to_string(), fail)]), io::sink());
        let code = vec![ByteCode::get_global(0, 0), ByteCode::load_nil(1), ByteCode::call(0, 1)];
        let err = vm.execute(&[s("fail")], &code).unwrap_err();
        assert!(matches!(&err.kind, VmErrorKind::NativeFailure { name, status: 2 } if name == "fail"));
    }

    #[test]
    fn error_reports_failing_instruction() {
        let (mut vm, out) = vm_with_output();
        let constants = vec![s("print"), s("missing")];
        let code = vec![
            ByteCode::get_global(0, 0),
            ByteCode::load_int(1, 1),
            ByteCode::call(0, 1),
            ByteCode::get_global(0, 1),
        ];
        let err = vm.execute(&constants, &code).unwrap_err();
        assert_eq!(out.contents(), "1\n");
        assert_eq!(err.pc, 3);
        assert_eq!(err.inst, ByteCode::get_global(0, 1));
        assert!(matches!(&err.kind, VmErrorKind::UndefinedGlobal { name } if name == "missing"));
    }

    #[test]
    fn globals_are_not_modified() {
        let (mut vm, _) = vm_with_output();
        let code = vec![ByteCode::get_global(0, 0), ByteCode::load_int(1, 1), ByteCode::call(0, 1)];
        vm.execute(&[s("print")], &code).unwrap();
        assert_eq!(vm.globals().len(), 1);
        assert!(matches!(vm.globals().get("print"), Some(Value::Function(_))));
    }

    #[test]
    fn empty_program_succeeds() {
        let (mut vm, out) = vm_with_output();
        vm.run(&Chunk::default()).unwrap();
        assert_eq!(out.contents(), "");
    }
}
