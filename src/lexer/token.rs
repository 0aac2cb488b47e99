use std::fmt;

/// A lexical token. Literal kinds carry their payload inline; every other
/// variant is a bare keyword or operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    And,
    Break,
    Do,
    Else,
    ElseIf,
    End,
    False,
    For,
    Function,
    Global,
    Goto,
    If,
    In,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Caret,
    Hash,
    Ampersand,
    Tilde,
    Pipe,
    ShiftLeft,
    ShiftRight,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Assign,

    // Punctuation
    OpenBracket,
    ClosedBracket,
    OpenSquare,
    ClosedSquare,
    OpenBrace,
    ClosedBrace,
    DoubleColon,
    SemiColon,
    Colon,
    Comma,
    Dot,
    DoubleDot,
    TripleDot,

    // Literals
    Integer(i64),
    Float(f64),
    String(String),
    Identifier(String),

    LineComment(String),
}

/// Payload-free tag of a [`Token`], used for expectations and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    And,
    Break,
    Do,
    Else,
    ElseIf,
    End,
    False,
    For,
    Function,
    Global,
    Goto,
    If,
    In,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Caret,
    Hash,
    Ampersand,
    Tilde,
    Pipe,
    ShiftLeft,
    ShiftRight,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Assign,
    OpenBracket,
    ClosedBracket,
    OpenSquare,
    ClosedSquare,
    OpenBrace,
    ClosedBrace,
    DoubleColon,
    SemiColon,
    Colon,
    Comma,
    Dot,
    DoubleDot,
    TripleDot,
    Integer,
    Float,
    String,
    Identifier,
    LineComment,
}

impl Token {
    pub fn token_type(&self) -> TokenType {
        match self {
            Token::And => TokenType::And,
            Token::Break => TokenType::Break,
            Token::Do => TokenType::Do,
            Token::Else => TokenType::Else,
            Token::ElseIf => TokenType::ElseIf,
            Token::End => TokenType::End,
            Token::False => TokenType::False,
            Token::For => TokenType::For,
            Token::Function => TokenType::Function,
            Token::Global => TokenType::Global,
            Token::Goto => TokenType::Goto,
            Token::If => TokenType::If,
            Token::In => TokenType::In,
            Token::Local => TokenType::Local,
            Token::Nil => TokenType::Nil,
            Token::Not => TokenType::Not,
            Token::Or => TokenType::Or,
            Token::Repeat => TokenType::Repeat,
            Token::Return => TokenType::Return,
            Token::Then => TokenType::Then,
            Token::True => TokenType::True,
            Token::Until => TokenType::Until,
            Token::While => TokenType::While,
            Token::Plus => TokenType::Plus,
            Token::Minus => TokenType::Minus,
            Token::Star => TokenType::Star,
            Token::Slash => TokenType::Slash,
            Token::DoubleSlash => TokenType::DoubleSlash,
            Token::Percent => TokenType::Percent,
            Token::Caret => TokenType::Caret,
            Token::Hash => TokenType::Hash,
            Token::Ampersand => TokenType::Ampersand,
            Token::Tilde => TokenType::Tilde,
            Token::Pipe => TokenType::Pipe,
            Token::ShiftLeft => TokenType::ShiftLeft,
            Token::ShiftRight => TokenType::ShiftRight,
            Token::Equal => TokenType::Equal,
            Token::NotEqual => TokenType::NotEqual,
            Token::LessEqual => TokenType::LessEqual,
            Token::GreaterEqual => TokenType::GreaterEqual,
            Token::Less => TokenType::Less,
            Token::Greater => TokenType::Greater,
            Token::Assign => TokenType::Assign,
            Token::OpenBracket => TokenType::OpenBracket,
            Token::ClosedBracket => TokenType::ClosedBracket,
            Token::OpenSquare => TokenType::OpenSquare,
            Token::ClosedSquare => TokenType::ClosedSquare,
            Token::OpenBrace => TokenType::OpenBrace,
            Token::ClosedBrace => TokenType::ClosedBrace,
            Token::DoubleColon => TokenType::DoubleColon,
            Token::SemiColon => TokenType::SemiColon,
            Token::Colon => TokenType::Colon,
            Token::Comma => TokenType::Comma,
            Token::Dot => TokenType::Dot,
            Token::DoubleDot => TokenType::DoubleDot,
            Token::TripleDot => TokenType::TripleDot,
            Token::Integer(_) => TokenType::Integer,
            Token::Float(_) => TokenType::Float,
            Token::String(_) => TokenType::String,
            Token::Identifier(_) => TokenType::Identifier,
            Token::LineComment(_) => TokenType::LineComment,
        }
    }

    /// Reserved word lookup for an identifier-shaped run of characters.
    pub fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "and" => Token::And,
            "break" => Token::Break,
            "do" => Token::Do,
            "else" => Token::Else,
            "elseif" => Token::ElseIf,
            "end" => Token::End,
            "false" => Token::False,
            "for" => Token::For,
            "function" => Token::Function,
            "global" => Token::Global,
            "goto" => Token::Goto,
            "if" => Token::If,
            "in" => Token::In,
            "local" => Token::Local,
            "nil" => Token::Nil,
            "not" => Token::Not,
            "or" => Token::Or,
            "repeat" => Token::Repeat,
            "return" => Token::Return,
            "then" => Token::Then,
            "true" => Token::True,
            "until" => Token::Until,
            "while" => Token::While,
            _ => return None,
        };
        Some(token)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenType::And => "and",
            TokenType::Break => "break",
            TokenType::Do => "do",
            TokenType::Else => "else",
            TokenType::ElseIf => "elseif",
            TokenType::End => "end",
            TokenType::False => "false",
            TokenType::For => "for",
            TokenType::Function => "function",
            TokenType::Global => "global",
            TokenType::Goto => "goto",
            TokenType::If => "if",
            TokenType::In => "in",
            TokenType::Local => "local",
            TokenType::Nil => "nil",
            TokenType::Not => "not",
            TokenType::Or => "or",
            TokenType::Repeat => "repeat",
            TokenType::Return => "return",
            TokenType::Then => "then",
            TokenType::True => "true",
            TokenType::Until => "until",
            TokenType::While => "while",
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Star => "*",
            TokenType::Slash => "/",
            TokenType::DoubleSlash => "//",
            TokenType::Percent => "%",
            TokenType::Caret => "^",
            TokenType::Hash => "#",
            TokenType::Ampersand => "&",
            TokenType::Tilde => "~",
            TokenType::Pipe => "|",
            TokenType::ShiftLeft => "<<",
            TokenType::ShiftRight => ">>",
            TokenType::Equal => "==",
            TokenType::NotEqual => "~=",
            TokenType::LessEqual => "<=",
            TokenType::GreaterEqual => ">=",
            TokenType::Less => "<",
            TokenType::Greater => ">",
            TokenType::Assign => "=",
            TokenType::OpenBracket => "(",
            TokenType::ClosedBracket => ")",
            TokenType::OpenSquare => "[",
            TokenType::ClosedSquare => "]",
            TokenType::OpenBrace => "{",
            TokenType::ClosedBrace => "}",
            TokenType::DoubleColon => "::",
            TokenType::SemiColon => ";",
            TokenType::Colon => ":",
            TokenType::Comma => ",",
            TokenType::Dot => ".",
            TokenType::DoubleDot => "..",
            TokenType::TripleDot => "...",
            TokenType::Integer => "integer",
            TokenType::Float => "float",
            TokenType::String => "string",
            TokenType::Identifier => "identifier",
            TokenType::LineComment => "comment",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Float(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::LineComment(s) => write!(f, "--{}", s),
            other => write!(f, "{}", other.token_type()),
        }
    }
}
