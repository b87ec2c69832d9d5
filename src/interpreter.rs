use crate::callable::{is_valid_function, Function};
use crate::console::{SharedConsole, StdConsole};
use crate::environment::Environment;
use crate::error::{Error, RuntimeError};
use crate::module::{module_key, Exports, FsModuleLoader, Module, ModuleLoader, ModuleTable};
use crate::register::{Register, RegisterBank};
use crate::resolver;
use crate::scanner;
use crate::token::{ControlLabel, Instruction, Token, TokenType};
use crate::value::{as_safe_index, Value};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Executes one token array. Function calls and imports run in nested
/// instances that get their own registers, labels and exports.
pub struct Interpreter {
    tokens: Rc<Vec<Token>>,
    registers: RegisterBank,
    environment: Environment,
    modules: ModuleTable,
    exports: Exports,
    // label name -> index of the declaration that registered it
    labels: HashMap<String, usize>,
    console: SharedConsole,
    loader: Rc<dyn ModuleLoader>,
    trace_execution: bool,
}

type Result<T> = std::result::Result<T, RuntimeError>;

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter {
            tokens: Rc::new(Vec::new()),
            registers: RegisterBank::new(),
            environment: Environment::new(),
            modules: ModuleTable::new(),
            exports: Exports::new(),
            labels: HashMap::new(),
            console: Rc::new(RefCell::new(StdConsole)),
            loader: Rc::new(FsModuleLoader::default()),
            trace_execution: false,
        }
    }
    pub fn with_console(mut self, console: SharedConsole) -> Self {
        self.console = console;
        self
    }
    pub fn with_loader(mut self, loader: Rc<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
    /// Logs every executed statement and the final registers. Nested
    /// instances inherit the setting.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace_execution = trace;
        self
    }
    pub fn registers(&self) -> &RegisterBank {
        &self.registers
    }
    pub fn environment(&self) -> &Environment {
        &self.environment
    }
    pub fn exports(&self) -> &Exports {
        &self.exports
    }
    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    /// Runs `tokens` to completion and returns the final value of the
    /// process-return register.
    pub fn execute(&mut self, mut tokens: Vec<Token>) -> Result<Value> {
        if !tokens.last().map_or(false, Token::is_end) {
            let (line, column) = tokens.last().map_or((1, 0), |t| (t.line, t.column));
            tokens.push(Token::end_of_process(line, column));
        }
        self.run(Rc::new(tokens))
    }
    pub fn lex_and_execute(&mut self, source: &str) -> std::result::Result<Value, Error> {
        let tokens = scanner::scan_tokens(source)?;
        Ok(self.execute(tokens)?)
    }

    fn run(&mut self, tokens: Rc<Vec<Token>>) -> Result<Value> {
        self.tokens = tokens;
        self.labels.clear();
        self.set_position(0);
        loop {
            let index = self.position()?;
            let token = self.eat()?;
            if self.trace_execution {
                trace!(position = index, statement = %token, "executing");
            }
            match token.tokentype {
                TokenType::EndOfProcess => break,
                TokenType::Instruction(instruction) => {
                    self.execute_instruction(instruction)?
                }
                TokenType::ControlLabel(label) => self.execute_control_label(label, index)?,
                _ => {
                    return Err(RuntimeError::UnexpectedStatement {
                        found: token.describe(),
                        at: token.position(),
                    })
                }
            }
        }
        if self.trace_execution {
            for (register, value) in self.registers.iter() {
                trace!(register = %register, value = %value, "final");
            }
        }
        Ok(self.registers.get(Register::ProcessReturn).clone())
    }

    /// A nested instance sharing this one's console and loader.
    fn scope(&self, environment: Environment, arguments: Vec<Value>) -> Interpreter {
        Interpreter {
            tokens: Rc::new(Vec::new()),
            registers: RegisterBank::with_arguments(arguments),
            environment,
            modules: ModuleTable::new(),
            exports: Exports::new(),
            labels: HashMap::new(),
            console: Rc::clone(&self.console),
            loader: Rc::clone(&self.loader),
            trace_execution: self.trace_execution,
        }
    }

    fn execute_instruction(&mut self, instruction: Instruction) -> Result<()> {
        match instruction {
            Instruction::SetVariable => {
                let (name, _) = self.eat_identifier()?;
                let value = self.eat_value()?;
                self.environment.define(&name, value);
            }
            Instruction::LoadVariable => {
                self.expect_next_identifier()?;
                let value = self.eat_value()?;
                self.registers.set(Register::Data1, value);
            }
            Instruction::Compare => {
                let with = self.eat_value()?;
                let subject = self.eat_value()?;
                let result = match subject.compare(&with) {
                    Ordering::Greater => 1.0,
                    Ordering::Less => -1.0,
                    Ordering::Equal => 0.0,
                };
                self.registers.set(Register::Accumulator, Value::Number(result));
            }
            Instruction::BranchAlways => self.branch()?,
            Instruction::BranchIfGreaterThan => self.branch_if(|x| x == 1.0)?,
            Instruction::BranchIfLessThan => self.branch_if(|x| x == -1.0)?,
            Instruction::BranchIfEqualTo | Instruction::BranchIfZero => {
                self.branch_if(|x| x == 0.0)?
            }
            Instruction::BranchIfNotEqualTo => self.branch_if(|x| x != 0.0)?,
            Instruction::BranchIfPositive => self.branch_if(|x| x > 0.0)?,
            Instruction::BranchIfNegative => self.branch_if(|x| x < 0.0)?,
            Instruction::WriteLine => {
                let message = self.eat_value()?.to_string();
                self.console.borrow_mut().write_line(&message)?;
            }
            Instruction::StandardOutput => {
                let message = self.eat_value()?.to_string();
                self.console.borrow_mut().write(&message)?;
            }
            Instruction::StandardError => {
                let message = self.eat_value()?.to_string();
                self.console.borrow_mut().write_error(&message)?;
            }
            Instruction::StandardInput => {
                let prompt = self.eat_value()?.to_string();
                let line = self.console.borrow_mut().read_line(&prompt)?;
                self.registers.set(Register::Data1, Value::String(line));
            }
            Instruction::NewLine => self.console.borrow_mut().write("\n")?,
            Instruction::Exit => {
                let end = self.tokens.len().saturating_sub(1);
                self.set_position(end);
            }
            Instruction::SetRegister => {
                let token = self.eat()?;
                let register = match token.tokentype {
                    TokenType::Register(x) => x,
                    _ => return Err(unexpected("register reference", &token)),
                };
                let value = self.eat_value()?;
                self.registers.set(register, value);
            }
            Instruction::SetReturnRegister => {
                let value = self.eat_value()?;
                self.registers.set(Register::ProcessReturn, value);
            }
            Instruction::Add => self.arithmetic(|a, b| a + b)?,
            Instruction::Subtract => self.arithmetic(|a, b| a - b)?,
            Instruction::Multiply => self.arithmetic(|a, b| a * b)?,
            Instruction::Divide => self.arithmetic(|a, b| a / b)?,
            Instruction::Floor => {
                let a = self.eat_value()?.to_number();
                self.registers
                    .set(Register::Accumulator, Value::Number(a.floor()));
            }
            Instruction::Concat => {
                let a = self.eat_value()?.to_string();
                let b = self.eat_value()?.to_string();
                self.registers.set(Register::Data1, Value::String(a + &b));
            }
            Instruction::ConcatToCurrent => {
                let a = self.eat_value()?.to_string();
                let current = self.registers.get(Register::Data1).to_string();
                self.registers.set(Register::Data1, Value::String(current + &a));
            }
            Instruction::ConvertToNumber => {
                let a = self.eat_value()?.to_number();
                self.registers.set(Register::Accumulator, Value::Number(a));
            }
            Instruction::Push => {
                let mut array = self.eat_array()?;
                array.push(self.eat_value()?);
                self.registers.set(Register::Data1, Value::Array(array));
            }
            Instruction::Pop => {
                let mut array = self.eat_array()?;
                let removed = array.pop().unwrap_or(Value::Null);
                self.registers.set(Register::Data1, Value::Array(array));
                self.registers.set(Register::Data2, removed);
            }
            Instruction::Shift => {
                let mut array = self.eat_array()?;
                let removed = if array.is_empty() {
                    Value::Null
                } else {
                    array.remove(0)
                };
                self.registers.set(Register::Data1, Value::Array(array));
                self.registers.set(Register::Data2, removed);
            }
            Instruction::Unshift => {
                let mut array = self.eat_array()?;
                array.insert(0, self.eat_value()?);
                self.registers.set(Register::Data1, Value::Array(array));
            }
            Instruction::ElementAt => {
                let array = self.eat_array()?;
                let index = self.eat_value()?.to_number();
                let element = element_at(&array, index).unwrap_or(Value::Null);
                self.registers.set(Register::Data1, element);
            }
            Instruction::Length => {
                let array = self.eat_array()?;
                self.registers
                    .set(Register::Accumulator, Value::Number(array.len() as f64));
            }
            Instruction::DeclareFunction => self.declare_function()?,
            Instruction::Call => self.call()?,
            Instruction::Export => {
                let (name, token) = self.eat_identifier()?;
                if self.exports.contains_key(&name) {
                    return Err(RuntimeError::DuplicateExport {
                        name,
                        at: token.position(),
                    });
                }
                let value = self.environment.get(&name).ok_or_else(|| undefined(&token))?;
                self.exports.insert(name, value);
            }
            Instruction::Import => self.import()?,
        }
        Ok(())
    }

    fn execute_control_label(&mut self, label: ControlLabel, index: usize) -> Result<()> {
        match label {
            ControlLabel::Label => {
                let (name, token) = self.eat_identifier()?;
                match self.labels.get(&name) {
                    Some(declared) if *declared != index => {
                        return Err(RuntimeError::DuplicateLabel {
                            label: name,
                            at: token.position(),
                        })
                    }
                    Some(_) => (),
                    None => {
                        self.labels.insert(name, index);
                    }
                }
            }
            ControlLabel::FunctionEnd => {
                self.eat_identifier()?;
            }
        }
        Ok(())
    }

    // Token access

    fn position(&self) -> Result<usize> {
        let counter = self.registers.get(Register::PositionCounter);
        let index = match counter {
            Value::Number(x) => as_safe_index(*x),
            _ => None,
        };
        index.ok_or_else(|| RuntimeError::InvalidPosition {
            value: counter.to_string(),
        })
    }
    fn set_position(&mut self, index: usize) {
        self.registers
            .set(Register::PositionCounter, Value::Number(index as f64));
    }
    /// The token at `index`; anything past the end reads as the sentinel.
    fn token_at(&self, index: usize) -> Token {
        match self.tokens.get(index).or_else(|| self.tokens.last()) {
            Some(token) => token.clone(),
            None => Token::end_of_process(1, 0),
        }
    }
    fn eat(&mut self) -> Result<Token> {
        let index = self.position()?;
        let token = self.token_at(index);
        if !token.is_end() {
            self.set_position(index + 1);
        }
        Ok(token)
    }
    fn eat_identifier(&mut self) -> Result<(String, Token)> {
        let token = self.eat()?;
        match &token.tokentype {
            TokenType::Identifier(name) => Ok((name.clone(), token)),
            _ => Err(unexpected("identifier", &token)),
        }
    }
    fn expect_next_identifier(&self) -> Result<()> {
        let token = self.token_at(self.position()?);
        match token.tokentype {
            TokenType::Identifier(_) => Ok(()),
            _ => Err(unexpected("identifier", &token)),
        }
    }
    /// Eats a value-carrier token and resolves it.
    fn eat_value_token(&mut self) -> Result<(Value, Token)> {
        let token = self.eat()?;
        if !token.tokentype.is_value_carrier() {
            return Err(unexpected("a value", &token));
        }
        let value = match &token.tokentype {
            TokenType::String(x) => Some(Value::String(x.clone())),
            TokenType::Number(x) => Some(Value::Number(*x)),
            TokenType::Identifier(name) => self.environment.get(name),
            TokenType::Register(register) => Some(self.registers.get(*register).clone()),
            TokenType::Argument(index) => self.registers.argument(*index),
            TokenType::Module { module, member } => self
                .modules
                .get(module)
                .and_then(|m| m.exports.get(member).cloned()),
            _ => None,
        };
        match value {
            Some(value) => Ok((value, token)),
            None => Err(undefined(&token)),
        }
    }
    fn eat_value(&mut self) -> Result<Value> {
        Ok(self.eat_value_token()?.0)
    }
    fn eat_array(&mut self) -> Result<Vec<Value>> {
        match self.eat_value_token()? {
            (Value::Array(x), _) => Ok(x),
            (value, token) => Err(RuntimeError::ArrayOperationNotArray {
                found: format!("{} holding {}", token.describe(), value.kind()),
                at: token.position(),
            }),
        }
    }

    // Control flow

    fn accumulator(&self) -> f64 {
        match self.registers.get(Register::Accumulator) {
            Value::Number(x) => *x,
            _ => std::f64::NAN,
        }
    }
    fn branch(&mut self) -> Result<()> {
        let (label, token) = self.eat_identifier()?;
        match resolver::find_label(&self.tokens, &label) {
            Some(index) => {
                debug!(label = %label, index, "branch");
                self.set_position(index);
                Ok(())
            }
            None => Err(RuntimeError::NoLabelFound {
                label,
                at: token.position(),
            }),
        }
    }
    /// The label operand is consumed whether or not the branch is taken.
    fn branch_if(&mut self, condition: impl Fn(f64) -> bool) -> Result<()> {
        if condition(self.accumulator()) {
            self.branch()
        } else {
            self.eat_identifier().map(|_| ())
        }
    }
    fn arithmetic(&mut self, op: impl Fn(f64, f64) -> f64) -> Result<()> {
        let a = self.eat_value()?.to_number();
        let b = self.eat_value()?.to_number();
        self.registers
            .set(Register::Accumulator, Value::Number(op(a, b)));
        Ok(())
    }

    // Functions and modules

    fn declare_function(&mut self) -> Result<()> {
        let (name, name_token) = self.eat_identifier()?;
        let arity_token = self.eat()?;
        let arity = match arity_token.tokentype {
            TokenType::Number(x) => as_safe_index(x).ok_or_else(|| {
                RuntimeError::InvalidFunctionArity {
                    arity: arity_token.to_string(),
                    at: arity_token.position(),
                }
            })?,
            _ => return Err(unexpected("numeric literal", &arity_token)),
        };
        let start = self.position()?;
        let mut body = resolver::capture_function_body(&self.tokens, start, &name).ok_or_else(
            || RuntimeError::NoFunctionEndFound {
                name: name.clone(),
                at: name_token.position(),
            },
        )?;
        if self.environment.contains(&name) {
            return Err(RuntimeError::AlreadyDefined {
                name,
                at: name_token.position(),
            });
        }
        let end = start + body.len() + resolver::function_end_marker(&name).len();
        let sentinel = self.token_at(end - 1);
        body.push(Token::end_of_process(sentinel.line, sentinel.column));
        self.set_position(end);
        debug!(function = %name, arity, tokens = body.len(), "declared");
        self.environment
            .define(&name, Value::Function(Function::new(body, arity)));
        Ok(())
    }

    fn call(&mut self) -> Result<()> {
        let token = self.eat()?;
        let (function, environment) = match &token.tokentype {
            TokenType::Identifier(name) => {
                let value = self.environment.get(name).unwrap_or(Value::Null);
                (callable(&value, &token)?, self.environment.clone())
            }
            TokenType::Module { module, member } => {
                let found = self.modules.get(module).ok_or_else(|| {
                    RuntimeError::ModuleNotFound {
                        module: module.clone(),
                        at: token.position(),
                    }
                })?;
                let value = found.exports.get(member).ok_or_else(|| undefined(&token))?;
                (callable(value, &token)?, found.environment.clone())
            }
            _ => return Err(unexpected("identifier or module reference", &token)),
        };
        let mut arguments = Vec::with_capacity(function.arity());
        while arguments.len() < function.arity() {
            arguments.push(self.eat_value()?);
        }
        debug!(function = %token, arguments = arguments.len(), "call");
        let mut scope = self.scope(environment, arguments);
        let result = scope.run(function.body())?;
        self.registers.set(Register::ProcessResult, result);
        Ok(())
    }

    fn import(&mut self) -> Result<()> {
        let token = self.eat()?;
        let reference = match &token.tokentype {
            TokenType::File(x) => x.clone(),
            _ => return Err(unexpected("file reference", &token)),
        };
        let path = self.loader.resolve(&reference);
        let source = match self.loader.read(&path) {
            Some(source) => source,
            None => {
                return Err(RuntimeError::FileDoesNotExist {
                    reference,
                    path,
                    at: token.position(),
                })
            }
        };
        debug!(module = %reference, path = %path.display(), "import");
        let tokens = scanner::scan_tokens(&source).map_err(|e| RuntimeError::ModuleScan {
            reference: reference.clone(),
            source: e,
        })?;
        let mut scope = self.scope(Environment::new(), Vec::new());
        scope.execute(tokens)?;
        self.modules.insert(
            module_key(&reference),
            Module {
                exports: scope.exports,
                environment: scope.environment,
            },
        );
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

fn callable(value: &Value, token: &Token) -> Result<Function> {
    match value.as_function() {
        Some(function) if is_valid_function(value) => Ok(function.clone()),
        _ => Err(RuntimeError::ValueIsNotFunction {
            name: token.describe(),
            at: token.position(),
        }),
    }
}

/// Indexes from the end when `index` is negative.
fn element_at(array: &[Value], index: f64) -> Option<Value> {
    let index = if index.is_nan() { 0.0 } else { index.trunc() };
    let index = if index < 0.0 {
        array.len() as f64 + index
    } else {
        index
    };
    as_safe_index(index).and_then(|i| array.get(i).cloned())
}

fn unexpected(expected: &'static str, token: &Token) -> RuntimeError {
    RuntimeError::UnexpectedToken {
        expected,
        found: token.describe(),
        at: token.position(),
    }
}

fn undefined(token: &Token) -> RuntimeError {
    RuntimeError::UndefinedValue {
        name: token.describe(),
        at: token.position(),
    }
}
