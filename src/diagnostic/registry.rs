/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str, // one-line summary for the `--explain` listing
    pub long: &'static str,  // full explanation for --explain
}

/// All stable error codes.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Lexer ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LUA-L001",
        short: "unknown symbol",
        long: r#"## LUA-L001: unknown symbol

A character was found that does not start any token.

**Example:**

    print "a" $

`$` is not an operator, punctuation mark, digit, letter or quote.
"#,
    },
    ErrorEntry {
        code: "LUA-L002",
        short: "cut off string",
        long: r#"## LUA-L002: cut off string

A string literal was not closed before the end of its line or the end
of the input. Strings cannot span lines and have no escape sequences.

**Example:**

    print "hello

**Fix:**

    print "hello"
"#,
    },
    ErrorEntry {
        code: "LUA-L003",
        short: "malformed number",
        long: r#"## LUA-L003: malformed number

A numeric literal could not be converted. Decimal literals are digits
with an optional fraction and exponent (`12`, `1.5`, `3e-2`);
hexadecimal literals start with `0x` (`0xff`, `0x1p4`).

**Examples that trigger this:**

    local a = 1e
    local b = 1.2.3
    local c = 0x
    local d = 99999999999999999999
"#,
    },
    ErrorEntry {
        code: "LUA-L004",
        short: "unexpected token",
        long: r#"## LUA-L004: unexpected token

A specific token was required, such as the `=` after `local name` or the
closing `)` of a call, and a different token was found.

**Example:**

    local x 5
"#,
    },
    ErrorEntry {
        code: "LUA-L005",
        short: "unexpected end of input",
        long: r#"## LUA-L005: unexpected end of input

The input ended while a specific token was still required.

**Example:**

    print(1
"#,
    },

    // ── Compiler ─────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LUA-P001",
        short: "unexpected token",
        long: r#"## LUA-P001: unexpected token

A token was found where a statement or a call argument was expected.
A statement is one of:

    local name = expr
    name "literal"
    name(expr)
"#,
    },
    ErrorEntry {
        code: "LUA-P002",
        short: "unexpected token as expression",
        long: r#"## LUA-P002: unexpected token as expression

An expression is a single `nil`, `true`, `false`, number, string or
name. A `-` may precede a number literal. Operators and nested calls
are not supported.

**Example:**

    print()
"#,
    },
    ErrorEntry {
        code: "LUA-P003",
        short: "unexpected end of input",
        long: r#"## LUA-P003: unexpected end of input

The input ended in the middle of a statement.

**Example:**

    local x =
"#,
    },
    ErrorEntry {
        code: "LUA-P004",
        short: "too many constants",
        long: r#"## LUA-P004: too many constants

A chunk holds at most 256 distinct constants: global names, strings,
floats and integers outside -32768..=32767. Repeated literals share one
slot.
"#,
    },
    ErrorEntry {
        code: "LUA-P005",
        short: "too many registers",
        long: r#"## LUA-P005: too many registers

Every `local` takes one of 256 registers for the rest of the chunk, and
a call needs two free registers above the locals.
"#,
    },

    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LUA-R001",
        short: "undefined global",
        long: r#"## LUA-R001: undefined global

A name that is not a local was looked up in the globals and not found.
Unknown names compile fine and fail only when executed.

**Example:**

    prnt "typo"
"#,
    },
    ErrorEntry {
        code: "LUA-R002",
        short: "value is not a function",
        long: r#"## LUA-R002: value is not a function

A call statement named a value that is not a function.

**Example:**

    local x = 1
    x "call me"
"#,
    },
    ErrorEntry {
        code: "LUA-R003",
        short: "register read before written",
        long: r#"## LUA-R003: register read before written

An instruction read a register that nothing had written. Compiled
programs never do this; hand-assembled bytecode can.
"#,
    },
    ErrorEntry {
        code: "LUA-R004",
        short: "native function failed",
        long: r#"## LUA-R004: native function failed

A native function returned a non-zero status, for example `print`
failing to write to its output.
"#,
    },
    ErrorEntry {
        code: "LUA-R005",
        short: "malformed bytecode",
        long: r#"## LUA-R005: malformed bytecode

The virtual machine found an instruction it cannot execute: an unknown
opcode, an out-of-range constant index, a global name that is not a
string, or an invalid operand. This indicates a compiler bug or
hand-assembled bytecode, not a script error.
"#,
    },
];

/// Look up an error entry by code (e.g. `"LUA-R001"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}

/// Every code with its one-line summary, one per line.
pub fn listing() -> String {
    REGISTRY.iter().map(|e| format!("{}  {}\n", e.code, e.short)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_code() {
        let e = lookup("LUA-R001").expect("LUA-R001 should be in registry");
        assert_eq!(e.code, "LUA-R001");
        assert_eq!(e.short, "undefined global");
        assert!(e.long.contains("LUA-R001"));
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup("LUA-XXXX").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn listing_has_one_line_per_code() {
        let text = listing();
        assert_eq!(text.lines().count(), REGISTRY.len());
        assert!(text.starts_with("LUA-L001  unknown symbol\n"), "{text}");
        assert!(text.contains("LUA-R001  undefined global\n"), "{text}");
    }

    #[test]
    fn all_codes_unique() {
        let mut codes: Vec<&str> = REGISTRY.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        let len_before = codes.len();
        codes.dedup();
        assert_eq!(codes.len(), len_before, "duplicate codes in registry");
    }

    #[test]
    fn long_text_names_its_code() {
        for entry in REGISTRY {
            assert!(!entry.short.is_empty(), "{} missing short description", entry.code);
            assert!(entry.long.starts_with(&format!("## {}: ", entry.code)), "{} heading", entry.code);
        }
    }
}
