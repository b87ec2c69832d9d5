use crate::value::Value;
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, Display, AsRefStr, EnumString)]
#[repr(u8)]
pub enum Register {
    #[strum(serialize = "IPX")] PositionCounter,
    #[strum(serialize = "IBX")] PositionBeforeBranch,

    #[strum(serialize = "IAX")] Accumulator,
    #[strum(serialize = "IOA")] PreviousAccumulator,

    #[strum(serialize = "XC1")] Data1,
    #[strum(serialize = "XC2")] Data2,
    #[strum(serialize = "XC3")] Data3,
    #[strum(serialize = "XC4")] Data4,
    #[strum(serialize = "XC5")] Data5,
    #[strum(serialize = "XC6")] Data6,
    #[strum(serialize = "XC7")] Data7,
    #[strum(serialize = "XC8")] Data8,
    #[strum(serialize = "XOC")] Overwritten,

    #[strum(serialize = "RET")] ProcessReturn,
    #[strum(serialize = "FUN")] ProcessResult,
    #[strum(serialize = "LFA")] ProcessArguments,
}

pub const REGISTER_COUNT: usize = 16;

impl Register {
    /// Register names are case sensitive.
    pub fn from_name(name: &str) -> Option<Register> {
        Register::from_str(name).ok()
    }
    pub fn is_data(&self) -> bool {
        match self {
            Register::Data1
            | Register::Data2
            | Register::Data3
            | Register::Data4
            | Register::Data5
            | Register::Data6
            | Register::Data7
            | Register::Data8 => true,
            _ => false,
        }
    }
}

/// The registers owned by one interpreter instance.
#[derive(Debug, Clone)]
pub struct RegisterBank {
    cells: Vec<Value>,
}

impl RegisterBank {
    pub fn new() -> RegisterBank {
        let mut cells = vec![Value::Null; REGISTER_COUNT];
        cells[Register::PositionCounter as usize] = Value::Number(0.0);
        cells[Register::PositionBeforeBranch as usize] = Value::Number(0.0);
        cells[Register::Accumulator as usize] = Value::Number(0.0);
        cells[Register::PreviousAccumulator as usize] = Value::Number(0.0);
        cells[Register::ProcessArguments as usize] = Value::Array(Vec::new());
        RegisterBank { cells }
    }
    pub fn with_arguments(arguments: Vec<Value>) -> RegisterBank {
        let mut bank = RegisterBank::new();
        bank.cells[Register::ProcessArguments as usize] = Value::Array(arguments);
        bank
    }
    pub fn get(&self, register: Register) -> &Value {
        &self.cells[register as usize]
    }
    /// Writes `value`, first copying the old value into the register that
    /// shadows `register`, if it has one.
    pub fn set(&mut self, register: Register, value: Value) {
        let old = std::mem::replace(&mut self.cells[register as usize], value);
        let shadow = match register {
            Register::PositionCounter => Register::PositionBeforeBranch,
            Register::Accumulator => Register::PreviousAccumulator,
            x if x.is_data() => Register::Overwritten,
            _ => return,
        };
        self.cells[shadow as usize] = old;
    }
    /// Positional argument of the current call.
    pub fn argument(&self, index: usize) -> Option<Value> {
        match self.get(Register::ProcessArguments) {
            Value::Array(x) => x.get(index).cloned(),
            _ => None,
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = (Register, &Value)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(idx, value)| Some((Register::try_from(idx as u8).ok()?, value)))
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        RegisterBank::new()
    }
}
