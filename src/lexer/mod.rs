mod reader;
mod token;

use std::num::{IntErrorKind, ParseFloatError, ParseIntError};

pub use reader::Cursor;
pub use token::{Token, TokenType};

use reader::SourceReader;

#[derive(Debug, thiserror::Error)]
pub enum LexErrorKind {
    #[error("cut off string")]
    CutOffString,
    #[error("malformed number '{text}': {source}")]
    MalformedNumber {
        text: String,
        #[source]
        source: NumberError,
    },
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(char),
    #[error("want '{expected}' got '{found}'")]
    UnexpectedToken { expected: TokenType, found: TokenType },
    #[error("want '{expected}' got end of input")]
    UnexpectedEof { expected: TokenType },
}

/// Why a numeric literal failed to convert.
#[derive(Debug, thiserror::Error)]
pub enum NumberError {
    #[error(transparent)]
    Integer(#[from] ParseIntError),
    #[error(transparent)]
    Float(#[from] ParseFloatError),
    #[error("{0}")]
    Hex(&'static str),
}

#[derive(Debug, thiserror::Error)]
#[error("{cursor}: {kind}")]
pub struct LexError {
    pub cursor: Cursor,
    pub kind: LexErrorKind,
}

type Result<T> = std::result::Result<T, LexError>;

/// On-demand tokenizer. End of input is `Ok(None)`, never an error.
pub struct Lexer<'a> {
    input: SourceReader<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { input: SourceReader::new(source) }
    }

    pub fn cursor(&self) -> Cursor {
        self.input.cursor()
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError { cursor: self.cursor(), kind }
    }

    /// Drains the remaining input.
    pub fn all(&mut self) -> Result<Vec<Token>> {
        self.collect()
    }

    /// Consumes one token and fails unless it has type `want`.
    pub fn expect_token(&mut self, want: TokenType) -> Result<Token> {
        match self.next_token()? {
            Some(token) if token.token_type() == want => Ok(token),
            other => Err(self.mismatch(want, other)),
        }
    }

    /// [`Lexer::expect_token`] for identifiers, returning the name.
    pub fn expect_identifier(&mut self) -> Result<String> {
        match self.next_token()? {
            Some(Token::Identifier(name)) => Ok(name),
            other => Err(self.mismatch(TokenType::Identifier, other)),
        }
    }

    fn mismatch(&self, expected: TokenType, found: Option<Token>) -> LexError {
        match found {
            Some(token) => self.error(LexErrorKind::UnexpectedToken { expected, found: token.token_type() }),
            None => self.error(LexErrorKind::UnexpectedEof { expected }),
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let Some(ch) = self.skip_whitespace() else {
            return Ok(None);
        };

        let token = match ch {
            '+' => Token::Plus,
            '-' => {
                if self.read_if('-') {
                    Token::LineComment(self.read_line())
                } else {
                    Token::Minus
                }
            }
            '*' => Token::Star,
            '/' => {
                if self.read_if('/') {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '%' => Token::Percent,
            '^' => Token::Caret,
            '#' => Token::Hash,
            '&' => Token::Ampersand,
            '|' => Token::Pipe,
            '=' => {
                if self.read_if('=') {
                    Token::Equal
                } else {
                    Token::Assign
                }
            }
            '~' => {
                if self.read_if('=') {
                    Token::NotEqual
                } else {
                    Token::Tilde
                }
            }
            '<' => {
                if self.read_if('=') {
                    Token::LessEqual
                } else if self.read_if('<') {
                    Token::ShiftLeft
                } else {
                    Token::Less
                }
            }
            '>' => {
                if self.read_if('=') {
                    Token::GreaterEqual
                } else if self.read_if('>') {
                    Token::ShiftRight
                } else {
                    Token::Greater
                }
            }
            '(' => Token::OpenBracket,
            ')' => Token::ClosedBracket,
            '[' => Token::OpenSquare,
            ']' => Token::ClosedSquare,
            '{' => Token::OpenBrace,
            '}' => Token::ClosedBrace,
            ':' => {
                if self.read_if(':') {
                    Token::DoubleColon
                } else {
                    Token::Colon
                }
            }
            ';' => Token::SemiColon,
            ',' => Token::Comma,
            '.' => {
                if !self.read_if('.') {
                    Token::Dot
                } else if !self.read_if('.') {
                    Token::DoubleDot
                } else {
                    Token::TripleDot
                }
            }
            '"' | '\'' => Token::String(self.read_string(ch)?),
            '0'..='9' => self.read_number(ch)?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(c),
            other => return Err(self.error(LexErrorKind::UnknownSymbol(other))),
        };

        tracing::trace!(%token, cursor = %self.cursor(), "token");
        Ok(Some(token))
    }

    fn skip_whitespace(&mut self) -> Option<char> {
        loop {
            let ch = self.input.take()?;
            if !ch.is_whitespace() {
                return Some(ch);
            }
        }
    }

    fn read_if(&mut self, want: char) -> bool {
        self.input.take_if(|c| c == want).is_some()
    }

    /// Rest of the current line. The terminator (`\n`, `\r` or `\r\n`) is
    /// consumed but not returned.
    fn read_line(&mut self) -> String {
        let mut line = String::new();
        while let Some(ch) = self.input.take_if(|c| c != '\r' && c != '\n') {
            line.push(ch);
        }
        if self.input.take() == Some('\r') {
            self.read_if('\n');
        }
        line
    }

    fn read_string(&mut self, delimiter: char) -> Result<String> {
        let mut text = String::new();
        while let Some(ch) = self.input.take_if(|c| c != delimiter && c != '\n') {
            text.push(ch);
        }
        if !self.read_if(delimiter) {
            return Err(self.error(LexErrorKind::CutOffString));
        }
        Ok(text)
    }

    fn read_identifier(&mut self, first: char) -> Token {
        let mut word = String::from(first);
        while let Some(ch) = self.input.take_if(|c| c.is_alphanumeric() || c == '_') {
            word.push(ch);
        }
        Token::keyword(&word).unwrap_or(Token::Identifier(word))
    }

    fn read_number(&mut self, first: char) -> Result<Token> {
        if first == '0' && self.input.take_if(|c| c == 'x' || c == 'X').is_some() {
            return self.read_hex_number();
        }

        let mut text = String::from(first);
        let mut is_float = false;
        while let Some(ch) = self.input.take_if(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E')) {
            text.push(ch);
            match ch {
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    if let Some(sign) = self.input.take_if(|c| c == '+' || c == '-') {
                        text.push(sign);
                    }
                }
                _ => {}
            }
        }

        let parsed = if is_float {
            text.parse::<f64>().map(Token::Float).map_err(NumberError::from)
        } else {
            text.parse::<i64>().map(Token::Integer).map_err(NumberError::from)
        };
        parsed.map_err(|source| self.error(LexErrorKind::MalformedNumber { text, source }))
    }

    fn read_hex_number(&mut self) -> Result<Token> {
        let mut digits = String::new();
        let mut is_float = false;
        while let Some(ch) = self.input.take_if(|c| c.is_ascii_hexdigit() || matches!(c, '.' | 'p' | 'P')) {
            digits.push(ch);
            match ch {
                '.' => is_float = true,
                'p' | 'P' => {
                    is_float = true;
                    if let Some(sign) = self.input.take_if(|c| c == '+' || c == '-') {
                        digits.push(sign);
                    }
                }
                _ => {}
            }
        }

        let parsed = if is_float {
            parse_hex_float(&digits).map(Token::Float)
        } else {
            parse_hex_integer(&digits).map(Token::Integer)
        };
        parsed.map_err(|source| {
            self.error(LexErrorKind::MalformedNumber { text: format!("0x{digits}"), source })
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

fn hex_digit(ch: char) -> std::result::Result<u32, NumberError> {
    ch.to_digit(16).ok_or(NumberError::Hex("invalid hexadecimal digit"))
}

/// Hexadecimal integers wrap around on overflow, as in Lua.
fn parse_hex_integer(digits: &str) -> std::result::Result<i64, NumberError> {
    if digits.is_empty() {
        return Err(NumberError::Hex("missing hexadecimal digits"));
    }
    digits.chars().try_fold(0i64, |acc, ch| {
        Ok(acc.wrapping_mul(16).wrapping_add(i64::from(hex_digit(ch)?)))
    })
}

/// `digits` is everything after `0x`: a hex mantissa with an optional
/// fraction, then an optional `p` and a signed decimal power of two.
fn parse_hex_float(digits: &str) -> std::result::Result<f64, NumberError> {
    let (mantissa, exponent) = match digits.find(['p', 'P']) {
        Some(i) => (&digits[..i], Some(&digits[i + 1..])),
        None => (digits, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(NumberError::Hex("missing hexadecimal digits"));
    }

    let mut value = 0f64;
    for ch in whole.chars() {
        value = value * 16.0 + f64::from(hex_digit(ch)?);
    }
    let mut scale = 1.0 / 16.0;
    for ch in fraction.chars() {
        value += f64::from(hex_digit(ch)?) * scale;
        scale /= 16.0;
    }

    let power = match exponent {
        Some(exp) => match exp.parse::<i32>() {
            Ok(power) => power,
            // out-of-range exponents saturate to inf or zero
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => i32::MAX,
            Err(e) if *e.kind() == IntErrorKind::NegOverflow => i32::MIN,
            Err(e) => return Err(e.into()),
        },
        None => 0,
    };
    Ok(scale_by_power_of_two(value, power))
}

/// `value * 2^power` without the intermediate power of two leaving the
/// finite range of an f64.
fn scale_by_power_of_two(mut value: f64, mut power: i32) -> f64 {
    const STEP: i32 = 1000;
    while power > STEP && value.is_finite() && value != 0.0 {
        value *= 2f64.powi(STEP);
        power -= STEP;
    }
    while power < -STEP && value.is_finite() && value != 0.0 {
        value *= 2f64.powi(-STEP);
        power += STEP;
    }
    value * 2f64.powi(power.clamp(-STEP, STEP))
}
