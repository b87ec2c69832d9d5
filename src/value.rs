use crate::callable::Function;
use std::cmp::Ordering;
use std::fmt;

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Function(Function),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(x) => write!(f, "{}", x),
            Value::Number(x) => write!(f, "{}", format_number(*x)),
            Value::String(x) => write!(f, "{}", x),
            Value::Array(x) => {
                for (idx, element) in x.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    match element {
                        Value::Null => (),
                        _ => write!(f, "{}", element)?,
                    }
                }
                Ok(())
            }
            Value::Function(x) => write!(f, "{}", x),
        }
    }
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
        }
    }
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Boolean(x) => {
                if *x {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(x) => *x,
            Value::String(x) => {
                let trimmed = x.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(std::f64::NAN)
                }
            }
            Value::Array(_) | Value::Function(_) => std::f64::NAN,
        }
    }
    /// Orders `self` against `other`; pairs with no meaningful order are equal.
    pub fn compare(&self, other: &Value) -> Ordering {
        let ordering = match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Number(_), Value::Number(_))
            | (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Number(_), Value::Boolean(_))
            | (Value::Boolean(_), Value::Number(_)) => {
                self.to_number().partial_cmp(&other.to_number())
            }
            _ => None,
        };
        ordering.unwrap_or(Ordering::Equal)
    }
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(x) => Some(x),
            _ => None,
        }
    }
}

/// Converts `x` to an index when it is a non-negative integer that an f64
/// represents exactly.
pub fn as_safe_index(x: f64) -> Option<usize> {
    if x.is_finite() && x >= 0.0 && x.fract() == 0.0 && x <= MAX_SAFE_INTEGER {
        Some(x as usize)
    } else {
        None
    }
}

pub fn format_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.is_infinite() {
        if x > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if x == 0.0 {
        "0".to_string()
    } else if x.abs() >= 1e21 || x.abs() < 1e-6 {
        // 1e+24, 1.5e-7
        let formatted = format!("{:e}", x);
        match formatted.find('e') {
            Some(idx) if !formatted[idx + 1..].starts_with('-') => {
                format!("{}e+{}", &formatted[..idx], &formatted[idx + 1..])
            }
            _ => formatted,
        }
    } else {
        format!("{}", x)
    }
}

#[cfg(test)]
mod value_tests {
    use crate::value::{as_safe_index, format_number, Value};
    use std::cmp::Ordering;

    #[test]
    fn display() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(-2.5).to_string(), "-2.5");
        assert_eq!(Value::Null.to_string(), "null");
        let array = Value::Array(vec![
            Value::Number(1.0),
            Value::Null,
            Value::String("a".to_string()),
        ]);
        assert_eq!(array.to_string(), "1,,a");
        assert_eq!(format_number(1.0 / 0.0), "Infinity");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn exponent_form_at_extremes() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e30), "-2.5e+30");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(Value::Number(1e24).to_string(), "1e+24");
    }

    #[test]
    fn number_coercion() {
        assert_eq!(Value::String(" 42 ".to_string()).to_number(), 42.0);
        assert_eq!(Value::String("".to_string()).to_number(), 0.0);
        assert!(Value::String("abc".to_string()).to_number().is_nan());
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::Null.to_number(), 0.0);
        assert!(Value::Array(Vec::new()).to_number().is_nan());
    }

    #[test]
    fn ordering() {
        let n = |x| Value::Number(x);
        let s = |x: &str| Value::String(x.to_string());
        assert_eq!(n(3.0).compare(&n(2.0)), Ordering::Greater);
        assert_eq!(n(2.0).compare(&n(3.0)), Ordering::Less);
        assert_eq!(s("banana").compare(&s("apple")), Ordering::Greater);
        assert_eq!(s("10").compare(&n(9.0)), Ordering::Greater);
        assert_eq!(n(std::f64::NAN).compare(&n(1.0)), Ordering::Equal);
        assert_eq!(Value::Null.compare(&n(1.0)), Ordering::Equal);
    }

    #[test]
    fn safe_index() {
        assert_eq!(as_safe_index(3.0), Some(3));
        assert_eq!(as_safe_index(0.0), Some(0));
        assert_eq!(as_safe_index(-1.0), None);
        assert_eq!(as_safe_index(1.5), None);
        assert_eq!(as_safe_index(1e300), None);
        assert_eq!(as_safe_index(std::f64::NAN), None);
    }
}
