use crate::register::Register;
use std::fmt;
use strum_macros::{AsRefStr, Display};

/// Mnemonics that start an instruction statement.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Instruction {
    #[strum(serialize = "sta")] SetVariable,
    #[strum(serialize = "lda")] LoadVariable,

    #[strum(serialize = "cmp")] Compare,
    #[strum(serialize = "bra")] BranchAlways,
    #[strum(serialize = "brg")] BranchIfGreaterThan,
    #[strum(serialize = "brl")] BranchIfLessThan,
    #[strum(serialize = "bre")] BranchIfEqualTo,
    #[strum(serialize = "bne")] BranchIfNotEqualTo,
    #[strum(serialize = "brz")] BranchIfZero,
    #[strum(serialize = "brp")] BranchIfPositive,
    #[strum(serialize = "brn")] BranchIfNegative,

    #[strum(serialize = "log")] WriteLine,
    #[strum(serialize = "out")] StandardOutput,
    #[strum(serialize = "err")] StandardError,
    #[strum(serialize = "inp")] StandardInput,
    #[strum(serialize = "rlf")] NewLine,

    #[strum(serialize = "hlt")] Exit,

    #[strum(serialize = "reg")] SetRegister,
    #[strum(serialize = "ret")] SetReturnRegister,

    #[strum(serialize = "add")] Add,
    #[strum(serialize = "sub")] Subtract,
    #[strum(serialize = "mul")] Multiply,
    #[strum(serialize = "div")] Divide,
    #[strum(serialize = "flr")] Floor,

    #[strum(serialize = "con")] Concat,
    #[strum(serialize = "_")] ConcatToCurrent,

    #[strum(serialize = "num")] ConvertToNumber,

    #[strum(serialize = "psh")] Push,
    #[strum(serialize = "pop")] Pop,
    #[strum(serialize = "sft")] Shift,
    #[strum(serialize = "uns")] Unshift,
    #[strum(serialize = "elm")] ElementAt,
    #[strum(serialize = "len")] Length,

    #[strum(serialize = "fun")] DeclareFunction,
    #[strum(serialize = "exe")] Call,

    #[strum(serialize = "exp")] Export,
    #[strum(serialize = "use")] Import,
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum ControlLabel {
    #[strum(serialize = "lbl")] Label,
    #[strum(serialize = "efn")] FunctionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Instruction(Instruction),
    Identifier(String),
    ControlLabel(ControlLabel),

    Number(f64),
    String(String),

    Register(Register),
    File(String),
    Module { module: String, member: String },
    Argument(usize),

    EndOfProcess,
}

impl TokenType {
    pub fn kind(&self) -> &'static str {
        match self {
            TokenType::Instruction(_) => "instruction",
            TokenType::Identifier(_) => "identifier",
            TokenType::ControlLabel(_) => "control label",
            TokenType::Number(_) => "numeric literal",
            TokenType::String(_) => "string literal",
            TokenType::Register(_) => "register reference",
            TokenType::File(_) => "file reference",
            TokenType::Module { .. } => "module reference",
            TokenType::Argument(_) => "argument reference",
            TokenType::EndOfProcess => "end of process",
        }
    }

    /// Whether the token resolves to a runtime value when evaluated.
    pub fn is_value_carrier(&self) -> bool {
        match self {
            TokenType::String(_)
            | TokenType::Number(_)
            | TokenType::Identifier(_)
            | TokenType::Register(_)
            | TokenType::Argument(_)
            | TokenType::Module { .. } => true,
            _ => false,
        }
    }

    pub fn is_statement(&self) -> bool {
        match self {
            TokenType::Instruction(_) | TokenType::ControlLabel(_) => true,
            _ => false,
        }
    }
}

/// Source text for the token; scanning it again yields a content-equal token.
impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Instruction(x) => write!(f, "{}", x),
            TokenType::Identifier(x) => write!(f, "{}", x),
            TokenType::ControlLabel(x) => write!(f, "{}", x),
            // positional, the scanner has no exponent syntax
            TokenType::Number(x) => write!(f, "{}", x),
            TokenType::String(x) => write!(f, "\"{}\"", escape(x)),
            TokenType::Register(x) => write!(f, ":{}", x),
            TokenType::File(x) => write!(f, "<{}>", x),
            TokenType::Module { module, member } => write!(f, "#{},{}", module, member),
            TokenType::Argument(x) => write!(f, "%{}", x),
            TokenType::EndOfProcess => Ok(()),
        }
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\0' => escaped.push_str("\\0"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tokentype: TokenType,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(tokentype: TokenType, line: usize, column: usize) -> Token {
        Token {
            tokentype,
            line,
            column,
        }
    }
    pub fn end_of_process(line: usize, column: usize) -> Token {
        Token::new(TokenType::EndOfProcess, line, column)
    }
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }
    pub fn is_end(&self) -> bool {
        match self.tokentype {
            TokenType::EndOfProcess => true,
            _ => false,
        }
    }
    /// Equality that ignores where the tokens were found.
    pub fn same_content(&self, other: &Token) -> bool {
        self.tokentype == other.tokentype
    }
    /// Kind and payload, for error messages.
    pub fn describe(&self) -> String {
        match &self.tokentype {
            TokenType::EndOfProcess => self.tokentype.kind().to_string(),
            x => format!("{} `{}`", x.kind(), x),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokentype)
    }
}

#[cfg(test)]
mod token_tests {
    use crate::register::Register;
    use crate::token::{ControlLabel, Instruction, Token, TokenType};

    #[test]
    fn mnemonics() {
        assert_eq!(Instruction::SetVariable.to_string(), "sta");
        assert_eq!(Instruction::ConcatToCurrent.as_ref(), "_");
        assert_eq!(ControlLabel::FunctionEnd.to_string(), "efn");
    }

    #[test]
    fn content_equality_ignores_position() {
        let a = Token::new(TokenType::Identifier("loop".to_string()), 1, 5);
        let b = Token::new(TokenType::Identifier("loop".to_string()), 9, 2);
        assert!(a.same_content(&b));
        assert_ne!(a, b);
        let c = Token::new(TokenType::Identifier("Loop".to_string()), 1, 5);
        assert!(!a.same_content(&c));
    }

    #[test]
    fn display_as_source() {
        let module = TokenType::Module {
            module: "util.strings".to_string(),
            member: "greet".to_string(),
        };
        assert_eq!(module.to_string(), "#util.strings,greet");
        assert_eq!(TokenType::Register(Register::Accumulator).to_string(), ":IAX");
        assert_eq!(TokenType::Argument(3).to_string(), "%3");
        assert_eq!(TokenType::Number(21.0).to_string(), "21");
        assert_eq!(TokenType::Number(0.5).to_string(), "0.5");
        assert_eq!(
            TokenType::Number(1e24).to_string(),
            "1000000000000000000000000"
        );
        assert_eq!(
            TokenType::String("say \"hi\"\n".to_string()).to_string(),
            "\"say \\\"hi\\\"\\n\""
        );
        assert_eq!(TokenType::EndOfProcess.to_string(), "");
    }

    #[test]
    fn describe() {
        let token = Token::new(TokenType::Identifier("x".to_string()), 1, 1);
        assert_eq!(token.describe(), "identifier `x`");
        assert_eq!(Token::end_of_process(1, 1).describe(), "end of process");
    }
}
