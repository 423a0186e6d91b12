//! Comparator expressions carried in search query strings.
//!
//! Query strings cannot carry typed numbers, so numeric search fields take a
//! string such as `gte<18>`, `between<1,5>` or `in<2,4,8>`. Generated DTOs
//! validate these with a regex built from [`Comparator::ALL`], and
//! [`parse`] reads them back.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Between,
    NotBetween,
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    One,
    Two,
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparatorExpr {
    pub op: Comparator,
    pub operands: Vec<u64>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown comparator: {0}")]
    UnknownComparator(String),
    #[error("Expected {0}")]
    Expected(&'static str),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("{op} takes {expected} operand(s), got {got}")]
    Arity {
        op: &'static str,
        expected: &'static str,
        got: usize,
    },
}

impl Comparator {
    pub const ALL: [Comparator; 10] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
        Self::Between,
        Self::NotBetween,
        Self::In,
        Self::NotIn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::NotBetween => "notBetween",
            Self::In => "in",
            Self::NotIn => "notIn",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Self::Between | Self::NotBetween => Arity::Two,
            Self::In | Self::NotIn => Arity::Many,
            _ => Arity::One,
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for ComparatorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands: Vec<String> = self.operands.iter().map(u64::to_string).collect();
        write!(f, "{}<{}>", self.op.as_str(), operands.join(","))
    }
}

/// Parse `op<n>`, `op<a,b>` or `op<a,b,...>`.
pub fn parse(input: &str) -> Result<ComparatorExpr, QueryError> {
    let mut chars = input.chars().peekable();

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphabetic() {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    let op = Comparator::from_name(&name).ok_or(QueryError::UnknownComparator(name))?;

    if chars.next() != Some('<') {
        return Err(QueryError::Expected("<"));
    }

    let mut operands = vec![read_number(&mut chars)?];
    loop {
        match chars.next() {
            Some(',') => operands.push(read_number(&mut chars)?),
            Some('>') => break,
            _ => return Err(QueryError::Expected(", or >")),
        }
    }
    if chars.next().is_some() {
        return Err(QueryError::Expected("end of input"));
    }

    let (ok, expected) = match op.arity() {
        Arity::One => (operands.len() == 1, "1"),
        Arity::Two => (operands.len() == 2, "2"),
        Arity::Many => (!operands.is_empty(), "1 or more"),
    };
    if !ok {
        return Err(QueryError::Arity {
            op: op.as_str(),
            expected,
            got: operands.len(),
        });
    }

    Ok(ComparatorExpr { op, operands })
}

fn read_number(chars: &mut Peekable<Chars<'_>>) -> Result<u64, QueryError> {
    let mut s = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            s.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if s.is_empty() {
        return Err(QueryError::Expected("digit"));
    }
    s.parse().map_err(|_| QueryError::InvalidNumber(s))
}

/// JavaScript regex literal accepting exactly what [`parse`] accepts.
pub fn comparator_regex() -> String {
    let names = |arity: Arity| -> String {
        Comparator::ALL
            .into_iter()
            .filter(|c| c.arity() == arity)
            .map(Comparator::as_str)
            .collect::<Vec<_>>()
            .join("|")
    };
    format!(
        r"/(^({})<(\d+)>$|^({})<(\d+,\d+)>$|^({})<(\d+(,\d+)*)>$)/",
        names(Arity::One),
        names(Arity::Two),
        names(Arity::Many)
    )
}
