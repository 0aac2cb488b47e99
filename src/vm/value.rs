use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};

use super::Vm;

/// Host callable: reads its argument through the VM and returns a status
/// code, where anything other than zero is a failure.
pub type NativeFn = dyn Fn(&mut Vm) -> i32;

/// A named native function. Equality is identity of the callable.
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new(name: &str, func: impl Fn(&mut Vm) -> i32 + 'static) -> Self {
        NativeFunction { name: Rc::from(name), func: Rc::new(func) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, vm: &mut Vm) -> i32 {
        (self.func)(vm)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Function(NativeFunction),
}

impl Value {
    pub fn function(name: &str, func: impl Fn(&mut Vm) -> i32 + 'static) -> Self {
        Value::Function(NativeFunction::new(name, func))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => fmt_float(f, *n),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => write!(f, "function: {}", func.name()),
        }
    }
}

// Integral floats keep a ".0" so they stay distinguishable from integers.
fn fmt_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        write!(f, "nan")
    } else if n.is_infinite() {
        write!(f, "{}", if n > 0.0 { "inf" } else { "-inf" })
    } else if n.fract() == 0.0 && n.abs() < 1e16 {
        write!(f, "{:.1}", n)
    } else {
        write!(f, "{}", n)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Function(func) => serializer.collect_str(&format_args!("function: {}", func.name())),
        }
    }
}
