//! The expression-language value model.
//!
//! `Value` carries a strict total order so that values can serve as map
//! keys: variants are ranked, and values of the same variant compare
//! component-wise.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use anyhow::Result;

use crate::eval::context::Context;
use crate::eval::frame::Frame;
use crate::str_utils::bin_compare;

/// How many leading arguments a callable receives unevaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalPolicy {
    All,
    SkipN(usize),
    SkipAll,
}

impl EvalPolicy {
    pub fn skip_count(&self) -> usize {
        match self {
            EvalPolicy::All => 0,
            EvalPolicy::SkipN(n) => *n,
            EvalPolicy::SkipAll => usize::MAX,
        }
    }
}

pub type NativeFn = fn(&mut Context, &[Value], &Rc<Frame>) -> Result<Value>;

#[derive(Debug, Clone)]
pub struct Native {
    pub name: String,
    pub policy: EvalPolicy,
    pub f: NativeFn,
}

/// A user-defined procedure with its captured lexical environment.
#[derive(Debug)]
pub struct Func {
    pub params: Vec<String>,
    pub var_param: Option<String>,
    pub body: Vec<Value>,
    pub captured: Option<Rc<Frame>>,
    pub doc: Option<String>,
}

/// Like [`Func`], but arguments arrive unevaluated and the result is a form
/// evaluated in the caller's frame.
#[derive(Debug)]
pub struct MacroDef {
    pub params: Vec<String>,
    pub var_param: Option<String>,
    pub body: Vec<Value>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Interned-by-value keyword, prints as `:token`.
    Atom(String),
    Symbol {
        ns: Option<String>,
        token: String,
    },
    /// The callable form.
    List(Vec<Value>),
    /// A pure data sequence.
    Vector(Vec<Value>),
    Map(BTreeMap<Value, Value>),
    Func(Rc<Func>),
    Macro(Rc<MacroDef>),
    Native(Native),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Str(_) => 3,
            Value::Atom(_) => 4,
            Value::Symbol { .. } => 5,
            Value::List(_) => 6,
            Value::Vector(_) => 7,
            Value::Map(_) => 8,
            Value::Func(_) => 9,
            Value::Macro(_) => 10,
            Value::Native(_) => 11,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_symbol(&self) -> Option<(Option<&str>, &str)> {
        if let Value::Symbol { ns, token } = self {
            Some((ns.as_deref(), token))
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        if let Value::List(items) = self {
            Some(items)
        } else {
            None
        }
    }

    pub fn as_vector(&self) -> Option<&[Value]> {
        if let Value::Vector(items) = self {
            Some(items)
        } else {
            None
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        if let Value::Map(map) = self {
            Some(map)
        } else {
            None
        }
    }
}

fn symbol_cmp(
    a_ns: &Option<String>,
    a_token: &str,
    b_ns: &Option<String>,
    b_token: &str,
) -> Ordering {
    let ns = match (a_ns, b_ns) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => bin_compare(a, b),
    };
    ns.then_with(|| bin_compare(a_token, b_token))
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        match (self, other) {
            (Nil, Nil) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Number(a), Number(b)) => a.total_cmp(b),
            (Str(a), Str(b)) => bin_compare(a, b),
            (Atom(a), Atom(b)) => bin_compare(a, b),
            (
                Symbol { ns: a_ns, token: a },
                Symbol { ns: b_ns, token: b },
            ) => symbol_cmp(a_ns, a, b_ns, b),
            (List(a), List(b)) => a.cmp(b),
            (Vector(a), Vector(b)) => a.cmp(b),
            (Map(a), Map(b)) => a.iter().cmp(b.iter()),
            // the captured frame is not part of a function's identity
            (Func(a), Func(b)) => (&a.params, &a.var_param, &a.body, &a.doc).cmp(&(
                &b.params,
                &b.var_param,
                &b.body,
                &b.doc,
            )),
            (Macro(a), Macro(b)) => (&a.params, &a.var_param, &a.body, &a.doc).cmp(&(
                &b.params,
                &b.var_param,
                &b.body,
                &b.doc,
            )),
            (Native(a), Native(b)) => bin_compare(&a.name, &b.name),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[String], var_param: &Option<String>) -> fmt::Result {
    write!(f, "[")?;
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", param)?;
    }
    if let Some(var) = var_param {
        if !params.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "& {}", var)?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::Atom(token) => write!(f, ":{}", token),
            Value::Symbol { ns, token } => match ns {
                Some(ns) => write!(f, "{}.{}", ns, token),
                None => write!(f, "{}", token),
            },
            Value::List(items) => {
                write!(f, "(")?;
                write_joined(f, items)?;
                write!(f, ")")
            }
            Value::Vector(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{} {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Func(func) => {
                write!(f, "(__native__.fn ")?;
                write_params(f, &func.params, &func.var_param)?;
                for form in &func.body {
                    write!(f, " {}", form)?;
                }
                write!(f, ")")
            }
            Value::Macro(mac) => {
                write!(f, "(__native__.macro ")?;
                write_params(f, &mac.params, &mac.var_param)?;
                for form in &mac.body {
                    write!(f, " {}", form)?;
                }
                write!(f, ")")
            }
            Value::Native(native) => write!(f, "<NativeFunc:{}>", native.name),
        }
    }
}
