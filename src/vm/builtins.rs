use std::collections::HashMap;

use super::{Value, Vm};

/// Writes the argument's textual form and a newline to the VM output.
pub fn print(vm: &mut Vm) -> i32 {
    let line = match vm.argument() {
        Ok(value) => value.to_string(),
        Err(err) => {
            tracing::warn!(%err, "print: no argument");
            return 1;
        }
    };
    match writeln!(vm.output(), "{}", line) {
        Ok(()) => 0,
        Err(err) => {
            tracing::warn!(%err, "print: write failed");
            1
        }
    }
}

/// The globals every script starts with.
pub fn default_globals() -> HashMap<String, Value> {
    HashMap::from([("print".to_string(), Value::function("print", print))])
}
