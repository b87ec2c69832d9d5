use crate::error::ScanError;
use crate::register::Register;
use crate::token::{ControlLabel, Instruction, Position, Token, TokenType};
use crate::value::as_safe_index;
use phf::phf_map;
use std::iter::Peekable;
use std::str::CharIndices;

const COMMENT_START: char = ';';
const STRING_DELIMITER: char = '"';
const ESCAPE: char = '\\';
const REGISTER_REFERENCE: char = ':';
const ARGUMENT_REFERENCE: char = '%';
const FILE_REFERENCE_START: char = '<';
const FILE_REFERENCE_END: char = '>';
const MODULE_REFERENCE_START: char = '#';
const MODULE_REFERENCE_SEPARATOR: char = ',';

// Note: current becomes self.iter.peek()?.0
struct Scanner<'a> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
    start: usize,
    line: usize,
    column: usize,
}

/// Scans `source` into tokens terminated by a single end-of-process token.
pub fn scan_tokens(source: &str) -> Result<Vec<Token>, ScanError> {
    let mut scanner = Scanner {
        source,
        iter: source.char_indices().peekable(),
        start: 0,
        line: 1,
        column: 0,
    };
    let mut tokens: Vec<Token> = Vec::new();

    while let Some((idx, _)) = scanner.iter.peek() {
        scanner.start = *idx;
        if let Some(token) = scanner.scan_token()? {
            tokens.push(token);
        }
    }
    tokens.push(Token::end_of_process(scanner.line, scanner.column));
    Ok(tokens)
}

/// Writes tokens back out as source, one statement per line.
pub fn unscan(tokens: &[Token]) -> String {
    let mut source = String::new();
    for token in tokens {
        if token.is_end() {
            break;
        }
        if token.tokentype.is_statement() {
            if !source.is_empty() {
                source.push('\n');
            }
        } else if !source.is_empty() {
            source.push(' ');
        }
        source.push_str(&token.to_string());
    }
    source.push('\n');
    source
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self) -> Result<Option<Token>, ScanError> {
        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(None),
        };
        let at = self.position();
        let tokentype = match c {
            COMMENT_START => {
                self.next_while(|c| c != '\n');
                return Ok(None);
            }
            STRING_DELIMITER => self.string(at)?,
            REGISTER_REFERENCE => self.register(at)?,
            ARGUMENT_REFERENCE => self.argument(at)?,
            FILE_REFERENCE_START => self.file(at)?,
            MODULE_REFERENCE_START => self.module(at)?,
            '0'..='9' => self.number(at)?,
            '-' if self.peek_is(|c| c.is_ascii_digit()) => self.number(at)?,
            c if is_identifier_initial(c) => self.identifier(),
            ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B' => return Ok(None),
            _ => return Err(ScanError::UnexpectedCharacter { character: c, at }),
        };
        Ok(Some(Token::new(tokentype, at.line, at.column)))
    }
    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }
    fn current(&mut self) -> usize {
        match self.iter.peek() {
            None => self.source.len(),
            Some((idx, _)) => *idx,
        }
    }
    fn lexeme(&mut self) -> &'a str {
        let current = self.current();
        let source = self.source;
        &source[self.start..current]
    }
    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.iter.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }
    fn peek_is(&mut self, predicate: impl Fn(char) -> bool) -> bool {
        self.iter.peek().map_or(false, |(_, c)| predicate(*c))
    }
    fn next_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_is(&predicate) {
            self.advance();
        }
    }
    /// Consumes up to and including `delimiter`, returning what came before it.
    fn until(&mut self, delimiter: char) -> Option<String> {
        let mut value = String::new();
        loop {
            match self.advance()? {
                c if c == delimiter => return Some(value),
                c => value.push(c),
            }
        }
    }
    fn string(&mut self, at: Position) -> Result<TokenType, ScanError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(ScanError::UnterminatedString { at }),
                Some(STRING_DELIMITER) => break,
                Some(ESCAPE) => match self.advance() {
                    None => return Err(ScanError::UnterminatedString { at }),
                    Some(c) => match unescape(c) {
                        Some(x) => value.push(x),
                        None => {
                            value.push(ESCAPE);
                            value.push(c);
                        }
                    },
                },
                Some(c) => value.push(c),
            }
        }
        Ok(TokenType::String(value))
    }
    fn register(&mut self, at: Position) -> Result<TokenType, ScanError> {
        self.next_while(is_identifier_continuation);
        let name = &self.lexeme()[1..];
        match Register::from_name(name) {
            Some(register) => Ok(TokenType::Register(register)),
            None => Err(ScanError::InvalidRegister {
                text: name.to_string(),
                at,
            }),
        }
    }
    fn argument(&mut self, at: Position) -> Result<TokenType, ScanError> {
        self.next_while(|c| c.is_ascii_digit() || c == '-');
        let text = &self.lexeme()[1..];
        match text.parse::<f64>().ok().and_then(as_safe_index) {
            Some(index) => Ok(TokenType::Argument(index)),
            None => Err(ScanError::InvalidArgument {
                text: text.to_string(),
                at,
            }),
        }
    }
    fn file(&mut self, at: Position) -> Result<TokenType, ScanError> {
        match self.until(FILE_REFERENCE_END) {
            Some(path) => Ok(TokenType::File(path)),
            None => Err(ScanError::UnterminatedFileReference { at }),
        }
    }
    fn module(&mut self, at: Position) -> Result<TokenType, ScanError> {
        let module = self
            .until(MODULE_REFERENCE_SEPARATOR)
            .ok_or(ScanError::UnterminatedModuleReference { at })?;
        let member_start = self.current();
        self.next_while(is_identifier_continuation);
        let member_end = self.current();
        let member = self.source[member_start..member_end].to_string();
        Ok(TokenType::Module { module, member })
    }
    fn number(&mut self, at: Position) -> Result<TokenType, ScanError> {
        self.next_while(|c| c.is_ascii_digit() || c == '.');
        let text = self.lexeme();
        match text.parse() {
            Ok(x) => Ok(TokenType::Number(x)),
            Err(_) => Err(ScanError::InvalidNumber {
                text: text.to_string(),
                at,
            }),
        }
    }
    fn identifier(&mut self) -> TokenType {
        self.next_while(is_identifier_continuation);
        let text = self.lexeme();
        let keyword = text.to_lowercase();
        if let Some(x) = INSTRUCTIONS.get(keyword.as_str()) {
            TokenType::Instruction(*x)
        } else if let Some(x) = CONTROL_LABELS.get(keyword.as_str()) {
            TokenType::ControlLabel(*x)
        } else {
            TokenType::Identifier(text.to_string())
        }
    }
}

fn is_identifier_initial(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continuation(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn unescape(c: char) -> Option<char> {
    match c {
        '"' => Some('"'),
        '\\' => Some('\\'),
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        _ => None,
    }
}

static INSTRUCTIONS: phf::Map<&'static str, Instruction> = phf_map! {
    "sta" => Instruction::SetVariable,
    "lda" => Instruction::LoadVariable,
    "cmp" => Instruction::Compare,
    "bra" => Instruction::BranchAlways,
    "brg" => Instruction::BranchIfGreaterThan,
    "brl" => Instruction::BranchIfLessThan,
    "bre" => Instruction::BranchIfEqualTo,
    "bne" => Instruction::BranchIfNotEqualTo,
    "brz" => Instruction::BranchIfZero,
    "brp" => Instruction::BranchIfPositive,
    "brn" => Instruction::BranchIfNegative,
    "log" => Instruction::WriteLine,
    "out" => Instruction::StandardOutput,
    "err" => Instruction::StandardError,
    "inp" => Instruction::StandardInput,
    "rlf" => Instruction::NewLine,
    "hlt" => Instruction::Exit,
    "reg" => Instruction::SetRegister,
    "ret" => Instruction::SetReturnRegister,
    "add" => Instruction::Add,
    "sub" => Instruction::Subtract,
    "mul" => Instruction::Multiply,
    "div" => Instruction::Divide,
    "flr" => Instruction::Floor,
    "con" => Instruction::Concat,
    "_" => Instruction::ConcatToCurrent,
    "num" => Instruction::ConvertToNumber,
    "psh" => Instruction::Push,
    "pop" => Instruction::Pop,
    "sft" => Instruction::Shift,
    "uns" => Instruction::Unshift,
    "elm" => Instruction::ElementAt,
    "len" => Instruction::Length,
    "fun" => Instruction::DeclareFunction,
    "exe" => Instruction::Call,
    "exp" => Instruction::Export,
    "use" => Instruction::Import,
};

static CONTROL_LABELS: phf::Map<&'static str, ControlLabel> = phf_map! {
    "lbl" => ControlLabel::Label,
    "efn" => ControlLabel::FunctionEnd,
};

#[cfg(test)]
mod scanner_tests {
    use crate::error::ScanError;
    use crate::register::Register;
    use crate::scanner::{scan_tokens, unscan};
    use crate::token::{ControlLabel, Instruction, Position, TokenType};

    fn types(source: &str) -> Vec<TokenType> {
        scan_tokens(source)
            .unwrap()
            .into_iter()
            .map(|t| t.tokentype)
            .collect()
    }

    #[test]
    fn basic_scanner_test() {
        let tokens = scan_tokens("sta x 2").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(
            tokens[0].tokentype,
            TokenType::Instruction(Instruction::SetVariable)
        );
        assert_eq!(tokens[1].tokentype, TokenType::Identifier("x".to_string()));
        assert_eq!(tokens[2].tokentype, TokenType::Number(2.0));
        assert!(tokens[3].is_end());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            types("STA Lbl EfN _ Counter"),
            vec![
                TokenType::Instruction(Instruction::SetVariable),
                TokenType::ControlLabel(ControlLabel::Label),
                TokenType::ControlLabel(ControlLabel::FunctionEnd),
                TokenType::Instruction(Instruction::ConcatToCurrent),
                TokenType::Identifier("Counter".to_string()),
                TokenType::EndOfProcess,
            ]
        );
    }

    #[test]
    fn references() {
        assert_eq!(
            types(":IAX %2 <util.strings.nfex> #util.strings,greet $NULL"),
            vec![
                TokenType::Register(Register::Accumulator),
                TokenType::Argument(2),
                TokenType::File("util.strings.nfex".to_string()),
                TokenType::Module {
                    module: "util.strings".to_string(),
                    member: "greet".to_string(),
                },
                TokenType::Identifier("$NULL".to_string()),
                TokenType::EndOfProcess,
            ]
        );
    }

    #[test]
    fn number_parsing() {
        assert_eq!(
            types("12 3.25 -4"),
            vec![
                TokenType::Number(12.0),
                TokenType::Number(3.25),
                TokenType::Number(-4.0),
                TokenType::EndOfProcess,
            ]
        );
        match scan_tokens("1.2.3") {
            Err(ScanError::InvalidNumber { text, .. }) => assert_eq!(text, "1.2.3"),
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(
            types(r#""say \"hi\"" "a\nb" "c:\d" "x;y""#),
            vec![
                TokenType::String("say \"hi\"".to_string()),
                TokenType::String("a\nb".to_string()),
                TokenType::String("c:\\d".to_string()),
                TokenType::String("x;y".to_string()),
                TokenType::EndOfProcess,
            ]
        );
        assert_eq!(
            scan_tokens("log \"open"),
            Err(ScanError::UnterminatedString {
                at: Position { line: 1, column: 5 }
            })
        );
    }

    #[test]
    fn comments_and_whitespace() {
        assert_eq!(
            types("; header\r\n\tlog 1 ; trailing\n\n"),
            vec![
                TokenType::Instruction(Instruction::WriteLine),
                TokenType::Number(1.0),
                TokenType::EndOfProcess,
            ]
        );
    }

    #[test]
    fn positions() {
        let tokens = scan_tokens("log 1\n  ret :IAX").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 7));
        assert_eq!((tokens[4].line, tokens[4].column), (2, 10));
    }

    #[test]
    fn invalid_register() {
        assert_eq!(
            scan_tokens("reg :XYZ 1"),
            Err(ScanError::InvalidRegister {
                text: "XYZ".to_string(),
                at: Position { line: 1, column: 5 }
            })
        );
        assert!(scan_tokens("ret :iax").is_err());
    }

    #[test]
    fn invalid_argument() {
        match scan_tokens("ret %-1") {
            Err(ScanError::InvalidArgument { text, .. }) => assert_eq!(text, "-1"),
            x => panic!("unexpected {:?}", x),
        }
        assert!(scan_tokens("ret %").is_err());
    }

    #[test]
    fn unexpected_character() {
        assert_eq!(
            scan_tokens("log 1\nlog @"),
            Err(ScanError::UnexpectedCharacter {
                character: '@',
                at: Position { line: 2, column: 5 }
            })
        );
        assert!(scan_tokens("log -").is_err());
    }

    #[test]
    fn unterminated_references() {
        assert!(scan_tokens("use <math.nfex").is_err());
        assert!(scan_tokens("exe #math").is_err());
    }

    #[test]
    fn single_sentinel() {
        for source in &["", "   ", "; only a comment", "rlf"] {
            let tokens = scan_tokens(source).unwrap();
            assert_eq!(tokens.iter().filter(|t| t.is_end()).count(), 1);
            assert!(tokens.last().unwrap().is_end());
        }
    }

    #[test]
    fn round_trip() {
        let source = r#"
            ; counts to three
            sta i 0
            lbl loop
            add i 1.5
            sta i :IAX
            cmp 3 i
            brl loop
            psh $ARRAY "tab\there \"quoted\" back\\slash"
            use <util.strings.nfex>
            exe #util.strings,greet %0 -2
            fun twice 1 mul %0 2 ret :IAX efn twice
        "#;
        let first = scan_tokens(source).unwrap();
        let printed = unscan(&first);
        let second = scan_tokens(&printed).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert!(a.same_content(b), "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn unscan_layout() {
        let tokens = scan_tokens("sta x 1 log x").unwrap();
        assert_eq!(unscan(&tokens), "sta x 1\nlog x\n");
    }
}
