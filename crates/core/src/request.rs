//! Transaction requests and per-transaction argument contracts.
//!
//! Arguments travel to the network as strings, but callers build them from
//! typed values. A [`TransactionSignature`] documents the arity and types a
//! transaction expects so malformed requests are rejected before any round
//! trip.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// A positional transaction argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Arg {
    /// String form sent on the wire.
    pub fn to_wire(&self) -> String {
        match self {
            Arg::Str(s) => s.clone(),
            Arg::Int(n) => n.to_string(),
            Arg::Float(x) => x.to_string(),
            Arg::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => write!(f, "{:?}", s),
            other => f.write_str(&other.to_wire()),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Int(n.into())
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Arg::Int(n.into())
    }
}

impl From<f64> for Arg {
    fn from(x: f64) -> Self {
        Arg::Float(x)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

/// A named transaction with ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    name: String,
    args: Vec<Arg>,
}

impl TransactionRequest {
    /// A request for `name` with no arguments yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A request for `name` with `args` in order.
    pub fn with_args<A: Into<Arg>>(name: impl Into<String>, args: impl IntoIterator<Item = A>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Arguments in wire form.
    pub fn wire_args(&self) -> Vec<String> {
        self.args.iter().map(Arg::to_wire).collect()
    }
}

impl fmt::Display for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

/// Accepted type of a transaction parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Integer,
    /// Integer in `0..=u32::MAX`.
    Unsigned,
    /// Integer or floating point.
    Number,
    Bool,
}

impl ArgType {
    pub fn accepts(&self, arg: &Arg) -> bool {
        if let (ArgType::Unsigned, Arg::Int(n)) = (self, arg) {
            return u32::try_from(*n).is_ok();
        }
        matches!(
            (self, arg),
            (ArgType::String, Arg::Str(_))
                | (ArgType::Integer, Arg::Int(_))
                | (ArgType::Number, Arg::Int(_) | Arg::Float(_))
                | (ArgType::Bool, Arg::Bool(_))
        )
    }

    /// Interprets command-line text as a value of this type.
    pub fn parse(&self, raw: &str) -> Option<Arg> {
        match self {
            ArgType::String => Some(Arg::Str(raw.to_string())),
            ArgType::Integer => raw.parse().ok().map(Arg::Int),
            ArgType::Unsigned => raw.parse::<u32>().ok().map(|n| Arg::Int(n.into())),
            ArgType::Number => raw
                .parse()
                .ok()
                .map(Arg::Int)
                .or_else(|| raw.parse().ok().filter(|x: &f64| x.is_finite()).map(Arg::Float)),
            ArgType::Bool => raw.parse().ok().map(Arg::Bool),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgType::String => "string",
            ArgType::Integer => "integer",
            ArgType::Unsigned => "unsigned 32-bit integer",
            ArgType::Number => "number",
            ArgType::Bool => "bool",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: ArgType,
}

/// Arity and types a transaction expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    name: String,
    params: Vec<Param>,
}

impl TransactionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn param(mut self, name: impl Into<String>, ty: ArgType) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    fn reject(&self, reason: String) -> Error {
        Error::Argument {
            transaction: self.name.clone(),
            reason,
        }
    }

    /// Verifies `request` against this signature.
    pub fn check(&self, request: &TransactionRequest) -> Result<()> {
        if request.name() != self.name {
            return Err(self.reject(format!(
                "signature does not describe transaction `{}`",
                request.name()
            )));
        }
        if request.args().len() != self.params.len() {
            return Err(self.reject(format!(
                "expected {} arguments, got {}",
                self.params.len(),
                request.args().len()
            )));
        }
        for (i, (param, arg)) in self.params.iter().zip(request.args()).enumerate() {
            if !param.ty.accepts(arg) {
                return Err(self.reject(format!(
                    "argument {} (`{}`) must be {}, got {}",
                    i, param.name, param.ty, arg
                )));
            }
        }
        Ok(())
    }

    /// Builds a typed request from raw text arguments.
    pub fn parse<S: AsRef<str>>(&self, raw: &[S]) -> Result<TransactionRequest> {
        if raw.len() != self.params.len() {
            return Err(self.reject(format!(
                "expected {} arguments, got {}",
                self.params.len(),
                raw.len()
            )));
        }
        let mut request = TransactionRequest::new(&self.name);
        for (param, text) in self.params.iter().zip(raw) {
            let text = text.as_ref();
            let arg = param.ty.parse(text).ok_or_else(|| {
                self.reject(format!(
                    "`{}` must be {}, got {:?}",
                    param.name, param.ty, text
                ))
            })?;
            request = request.arg(arg);
        }
        Ok(request)
    }
}

/// Known transaction signatures of one contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractInterface {
    transactions: BTreeMap<String, TransactionSignature>,
}

impl ContractInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, signature: TransactionSignature) -> Self {
        self.transactions
            .insert(signature.name().to_string(), signature);
        self
    }

    pub fn signature(&self, transaction: &str) -> Option<&TransactionSignature> {
        self.transactions.get(transaction)
    }

    /// Checks a request when its transaction is known.
    ///
    /// Unknown transactions pass; the contract judges them.
    pub fn check(&self, request: &TransactionRequest) -> Result<()> {
        match self.signature(request.name()) {
            Some(signature) => signature.check(request),
            None => Ok(()),
        }
    }

    /// Builds a request from raw text, typing arguments when the transaction
    /// is known and passing them as strings otherwise.
    pub fn parse<S: AsRef<str>>(&self, transaction: &str, raw: &[S]) -> Result<TransactionRequest> {
        match self.signature(transaction) {
            Some(signature) => signature.parse(raw),
            None => Ok(TransactionRequest::with_args(
                transaction,
                raw.iter().map(|s| s.as_ref().to_string()),
            )),
        }
    }
}
