use crate::token::Token;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// A declared function: its captured body, terminated by its own
/// end-of-process sentinel, and the number of arguments a call consumes.
#[derive(Clone, Debug)]
pub struct Function {
    body: Rc<Vec<Token>>,
    arity: usize,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn/{}>", self.arity)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && self.arity == other.arity
    }
}

impl Function {
    pub fn new(body: Vec<Token>, arity: usize) -> Function {
        Function {
            body: Rc::new(body),
            arity,
        }
    }
    pub fn arity(&self) -> usize {
        self.arity
    }
    pub fn body(&self) -> Rc<Vec<Token>> {
        Rc::clone(&self.body)
    }
}

/// Whether `value` can be the target of a call.
pub fn is_valid_function(value: &Value) -> bool {
    match value {
        Value::Function(function) => function.body.last().map_or(false, Token::is_end),
        _ => false,
    }
}

#[cfg(test)]
mod callable_tests {
    use crate::callable::{is_valid_function, Function};
    use crate::token::{Token, TokenType};
    use crate::value::Value;

    #[test]
    fn validity() {
        let body = vec![
            Token::new(TokenType::Number(1.0), 1, 1),
            Token::end_of_process(1, 2),
        ];
        assert!(is_valid_function(&Value::Function(Function::new(body, 0))));
        let unterminated = vec![Token::new(TokenType::Number(1.0), 1, 1)];
        assert!(!is_valid_function(&Value::Function(Function::new(
            unterminated,
            0
        ))));
        assert!(!is_valid_function(&Value::Number(1.0)));
        assert!(!is_valid_function(&Value::Null));
    }

    #[test]
    fn identity() {
        let f = Function::new(vec![Token::end_of_process(1, 1)], 2);
        let g = Function::new(vec![Token::end_of_process(1, 1)], 2);
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
        assert_eq!(f.to_string(), "<fn/2>");
    }
}
