use std::collections::HashMap;

mod constants;

pub use constants::MAX_CONSTANTS;

use crate::lexer::{Cursor, LexError, Lexer, Token, TokenType};
use crate::vm::{ByteCode, Chunk};
use constants::{ConstantPool, PoolFull};

/// Register indices are one operand byte.
pub const MAX_REGISTERS: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("{cursor}: did not expect token '{found}'")]
    UnexpectedToken { cursor: Cursor, found: TokenType },
    #[error("{cursor}: did not expect token '{found}' as expression")]
    UnexpectedExpression { cursor: Cursor, found: TokenType },
    #[error("{cursor}: unexpected end of input, expected {expected}")]
    UnexpectedEof { cursor: Cursor, expected: &'static str },
    #[error("{cursor}: too many constants (limit is {MAX_CONSTANTS})")]
    TooManyConstants { cursor: Cursor },
    #[error("{cursor}: too many registers (limit is {MAX_REGISTERS})")]
    TooManyRegisters { cursor: Cursor },
}

impl CompileError {
    pub fn cursor(&self) -> Cursor {
        match self {
            CompileError::Lex(e) => e.cursor,
            CompileError::UnexpectedToken { cursor, .. }
            | CompileError::UnexpectedExpression { cursor, .. }
            | CompileError::UnexpectedEof { cursor, .. }
            | CompileError::TooManyConstants { cursor }
            | CompileError::TooManyRegisters { cursor } => *cursor,
        }
    }
}

type Result<T> = std::result::Result<T, CompileError>;

/// Single-pass compiler: pulls tokens on demand and emits register-machine
/// bytecode straight away, with no syntax tree in between.
///
/// Locals live in registers `0..locals.len()`; a call statement places the
/// callee right above them and its argument one register higher.
pub struct Compiler<'a> {
    lexer: Lexer<'a>,
    code: Vec<ByteCode>,
    constants: ConstantPool,
    locals: Vec<String>,
    locals_index: HashMap<String, u8>,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a str) -> Self {
        Compiler {
            lexer: Lexer::new(source),
            code: Vec::new(),
            constants: ConstantPool::default(),
            locals: Vec::new(),
            locals_index: HashMap::new(),
        }
    }

    /// Compiles the whole token stream. The returned chunk is moved out of
    /// the compiler.
    pub fn parse(&mut self) -> Result<Chunk> {
        while let Some(token) = self.lexer.next_token()? {
            match token {
                Token::Identifier(name) => self.call_statement(&name)?,
                Token::Local => self.local_statement()?,
                Token::LineComment(_) => {}
                other => return Err(self.unexpected(&other)),
            }
        }

        let chunk = Chunk {
            constants: self.constants.take(),
            code: std::mem::take(&mut self.code),
        };
        tracing::debug!(
            constants = chunk.constants.len(),
            instructions = chunk.code.len(),
            locals = self.locals.len(),
            "compiled chunk"
        );
        Ok(chunk)
    }

    // name "literal" | name ( expression )
    fn call_statement(&mut self, name: &str) -> Result<()> {
        let func_pos = self.free_register()?;
        let arg_pos = func_pos
            .checked_add(1)
            .ok_or(CompileError::TooManyRegisters { cursor: self.lexer.cursor() })?;
        self.load_var(func_pos, name)?;

        match self.next_token("function argument")? {
            Token::String(text) => {
                let index = self.string_constant(&text)?;
                self.emit(ByteCode::load_const(arg_pos, index));
            }
            Token::OpenBracket => {
                self.load_expression(arg_pos)?;
                self.lexer.expect_token(TokenType::ClosedBracket)?;
            }
            other => return Err(self.unexpected(&other)),
        }

        self.emit(ByteCode::call(func_pos, 1));
        Ok(())
    }

    // local name = expression
    fn local_statement(&mut self) -> Result<()> {
        let name = self.lexer.expect_identifier()?;
        self.lexer.expect_token(TokenType::Assign)?;

        let slot = self.free_register()?;
        self.load_expression(slot)?;

        // A redeclared name moves to the new slot; the old one stays allocated.
        tracing::trace!(name = %name, slot, "local");
        self.locals.push(name.clone());
        self.locals_index.insert(name, slot);
        Ok(())
    }

    /// Consumes one expression token and emits one instruction writing `dst`.
    fn load_expression(&mut self, dst: u8) -> Result<()> {
        let inst = match self.next_token("expression")? {
            Token::Nil => ByteCode::load_nil(dst),
            Token::True => ByteCode::load_bool(dst, true),
            Token::False => ByteCode::load_bool(dst, false),
            Token::Integer(n) => self.load_integer(dst, n)?,
            Token::Float(n) => ByteCode::load_const(dst, self.float_constant(n)?),
            Token::String(text) => ByteCode::load_const(dst, self.string_constant(&text)?),
            Token::Identifier(name) => return self.load_var(dst, &name),
            Token::Minus => match self.next_token("numeric literal")? {
                Token::Integer(n) => self.load_integer(dst, n.wrapping_neg())?,
                Token::Float(n) => ByteCode::load_const(dst, self.float_constant(-n)?),
                other => return Err(self.unexpected_expression(&other)),
            },
            other => return Err(self.unexpected_expression(&other)),
        };
        self.emit(inst);
        Ok(())
    }

    /// Small integers are inlined; everything else goes through the pool.
    fn load_integer(&mut self, dst: u8, n: i64) -> Result<ByteCode> {
        Ok(match i16::try_from(n) {
            Ok(small) => ByteCode::load_int(dst, small),
            Err(_) => ByteCode::load_const(dst, self.integer_constant(n)?),
        })
    }

    /// Locals are copied out of their register; any other name is a global
    /// looked up by name at run time.
    fn load_var(&mut self, dst: u8, name: &str) -> Result<()> {
        if let Some(&slot) = self.locals_index.get(name) {
            self.emit(ByteCode::mov(dst, slot));
            return Ok(());
        }
        let index = self.string_constant(name)?;
        self.emit(ByteCode::get_global(dst, index));
        Ok(())
    }

    fn free_register(&self) -> Result<u8> {
        u8::try_from(self.locals.len()).map_err(|_| CompileError::TooManyRegisters { cursor: self.lexer.cursor() })
    }

    fn string_constant(&mut self, s: &str) -> Result<u8> {
        let added = self.constants.add_string(s);
        self.pool_index(added)
    }

    fn integer_constant(&mut self, n: i64) -> Result<u8> {
        let added = self.constants.add_integer(n);
        self.pool_index(added)
    }

    fn float_constant(&mut self, n: f64) -> Result<u8> {
        let added = self.constants.add_float(n);
        self.pool_index(added)
    }

    fn pool_index(&self, added: std::result::Result<u8, PoolFull>) -> Result<u8> {
        added.map_err(|PoolFull| CompileError::TooManyConstants { cursor: self.lexer.cursor() })
    }

    fn emit(&mut self, inst: ByteCode) {
        self.code.push(inst);
    }

    fn next_token(&mut self, expected: &'static str) -> Result<Token> {
        self.lexer
            .next_token()?
            .ok_or(CompileError::UnexpectedEof { cursor: self.lexer.cursor(), expected })
    }

    fn unexpected(&self, token: &Token) -> CompileError {
        CompileError::UnexpectedToken { cursor: self.lexer.cursor(), found: token.token_type() }
    }

    fn unexpected_expression(&self, token: &Token) -> CompileError {
        CompileError::UnexpectedExpression { cursor: self.lexer.cursor(), found: token.token_type() }
    }
}

/// Compiles `source` in one go.
pub fn compile(source: &str) -> Result<Chunk> {
    Compiler::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexErrorKind;
    use crate::vm::Value;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn hello_world() {
        let chunk = compile("print \"hello world\"").unwrap();
        assert_eq!(chunk.constants, vec![s("print"), s("hello world")]);
        assert_eq!(
            chunk.code,
            vec![ByteCode::get_global(0, 0), ByteCode::load_const(1, 1), ByteCode::call(0, 1)]
        );
    }

    #[test]
    fn bracketed_call() {
        let chunk = compile("print(nil) print(true) print(false)").unwrap();
        assert_eq!(
            chunk.code,
            vec![
                ByteCode::get_global(0, 0),
                ByteCode::load_nil(1),
                ByteCode::call(0, 1),
                ByteCode::get_global(0, 0),
                ByteCode::load_bool(1, true),
                ByteCode::call(0, 1),
                ByteCode::get_global(0, 0),
                ByteCode::load_bool(1, false),
                ByteCode::call(0, 1),
            ]
        );
        assert_eq!(chunk.constants, vec![s("print")]);
    }

    #[test]
    fn local_then_call_uses_move() {
        let chunk = compile("local x = 5\nprint(x)").unwrap();
        assert_eq!(
            chunk.code,
            vec![
                ByteCode::load_int(0, 5),
                ByteCode::get_global(1, 0),
                ByteCode::mov(2, 0),
                ByteCode::call(1, 1),
            ]
        );
    }

    #[test]
    fn repeated_literals_are_pooled_once() {
        let chunk = compile("print \"x\" print \"x\" print(1.5) print(1.5) print(99999) print(99999)").unwrap();
        assert_eq!(chunk.constants, vec![s("print"), s("x"), Value::Float(1.5), Value::Integer(99999)]);
    }

    #[test]
    fn literal_types_do_not_share_slots() {
        let chunk = compile("print \"5\" print(5.0) print(50000) print(\"50000\")").unwrap();
        assert_eq!(
            chunk.constants,
            vec![s("print"), s("5"), Value::Float(5.0), Value::Integer(50000), s("50000")]
        );
    }

    #[test]
    fn integer_inline_boundaries() {
        let chunk = compile("local a = 32767 local b = -32768 local c = 32768 local d = -32769").unwrap();
        assert_eq!(
            chunk.code,
            vec![
                ByteCode::load_int(0, 32767),
                ByteCode::load_int(1, -32768),
                ByteCode::load_const(2, 0),
                ByteCode::load_const(3, 1),
            ]
        );
        assert_eq!(chunk.constants, vec![Value::Integer(32768), Value::Integer(-32769)]);
    }

    #[test]
    fn negative_float_literal() {
        let chunk = compile("local f = -2.5").unwrap();
        assert_eq!(chunk.constants, vec![Value::Float(-2.5)]);
        assert_eq!(chunk.code, vec![ByteCode::load_const(0, 0)]);
    }

    #[test]
    fn minus_needs_a_number() {
        let err = compile("local f = -x").unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedExpression { found: TokenType::Identifier, .. }));
    }

    #[test]
    fn unknown_names_are_globals() {
        let chunk = compile("local y = undefinedThing").unwrap();
        assert_eq!(chunk.constants, vec![s("undefinedThing")]);
        assert_eq!(chunk.code, vec![ByteCode::get_global(0, 0)]);
    }

    #[test]
    fn calling_an_unknown_name_compiles() {
        let chunk = compile("nosuchfn(1)").unwrap();
        assert_eq!(chunk.code[0], ByteCode::get_global(0, 0));
    }

    #[test]
    fn local_as_callee_and_argument() {
        let chunk = compile("local p = print local v = 'hi' p(v)").unwrap();
        assert_eq!(
            chunk.code,
            vec![
                ByteCode::get_global(0, 0),
                ByteCode::load_const(1, 1),
                ByteCode::mov(2, 0),
                ByteCode::mov(3, 1),
                ByteCode::call(2, 1),
            ]
        );
    }

    #[test]
    fn redeclaration_takes_a_new_slot() {
        let chunk = compile("local x = 1 local x = x print(x)").unwrap();
        assert_eq!(
            chunk.code,
            vec![
                ByteCode::load_int(0, 1),
                ByteCode::mov(1, 0),
                ByteCode::get_global(2, 0),
                ByteCode::mov(3, 1),
                ByteCode::call(2, 1),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let chunk = compile("-- leading\nprint 'a' -- trailing\n--").unwrap();
        assert_eq!(chunk.code.len(), 3);
    }

    #[test]
    fn empty_source() {
        assert_eq!(compile("").unwrap(), Chunk::default());
    }

    #[test]
    fn unexpected_statement_token() {
        let err = compile("print 'a'\n42").unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedToken { found: TokenType::Integer, .. }));
        assert_eq!(err.cursor().line, 2);
        assert_eq!(err.to_string(), "2:3: did not expect token 'integer'");
    }

    #[test]
    fn call_needs_string_or_bracket() {
        let err = compile("print 5").unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedToken { found: TokenType::Integer, .. }));
    }

    #[test]
    fn call_needs_closing_bracket() {
        let err = compile("print(5").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Lex(LexError { kind: LexErrorKind::UnexpectedEof { expected: TokenType::ClosedBracket }, .. })
        ));
        let err = compile("print(5 6)").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Lex(LexError { kind: LexErrorKind::UnexpectedToken { found: TokenType::Integer, .. }, .. })
        ));
    }

    #[test]
    fn call_takes_exactly_one_expression() {
        let err = compile("print()").unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedExpression { found: TokenType::ClosedBracket, .. }));
        assert!(err.to_string().contains("as expression"));
    }

    #[test]
    fn local_needs_name_and_assign() {
        let err = compile("local = 5").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Lex(LexError { kind: LexErrorKind::UnexpectedToken { expected: TokenType::Identifier, .. }, .. })
        ));
        let err = compile("local x 5").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Lex(LexError { kind: LexErrorKind::UnexpectedToken { expected: TokenType::Assign, .. }, .. })
        ));
    }

    #[test]
    fn truncated_statements() {
        assert!(matches!(compile("print").unwrap_err(), CompileError::UnexpectedEof { expected: "function argument", .. }));
        assert!(matches!(compile("local x =").unwrap_err(), CompileError::UnexpectedEof { expected: "expression", .. }));
    }

    #[test]
    fn lexer_errors_propagate() {
        let err = compile("print \"oops").unwrap_err();
        assert!(matches!(err, CompileError::Lex(LexError { kind: LexErrorKind::CutOffString, .. })));
        assert!(err.to_string().contains("cut off string"));
    }

    #[test]
    fn constant_pool_overflow_fails() {
        let source: String = (0..255).map(|i| format!("print 'c{i}'\n")).collect();
        // "print" plus 255 distinct strings fill the pool exactly
        let chunk = compile(&source).unwrap();
        assert_eq!(chunk.constants.len(), MAX_CONSTANTS);

        let source = format!("{source}print 'one too many'");
        let err = compile(&source).unwrap_err();
        assert!(matches!(err, CompileError::TooManyConstants { .. }));
    }

    #[test]
    fn register_overflow_fails() {
        let locals: String = (0..255).map(|i| format!("local v{i} = {i}\n")).collect();
        // 255 locals leave room for one more, but not for a call frame
        assert!(compile(&format!("{locals}local last = 1")).is_ok());
        let err = compile(&format!("{locals}print(1)")).unwrap_err();
        assert!(matches!(err, CompileError::TooManyRegisters { .. }));
        let err = compile(&format!("{locals}local a = 1 local b = 2")).unwrap_err();
        assert!(matches!(err, CompileError::TooManyRegisters { .. }));
    }

    #[test]
    fn parse_is_single_use() {
        let mut compiler = Compiler::new("print 'a'");
        assert_eq!(compiler.parse().unwrap().code.len(), 3);
        assert_eq!(compiler.parse().unwrap(), Chunk::default());
    }
}
