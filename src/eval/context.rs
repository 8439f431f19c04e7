//! The evaluator: a namespaced symbol table, an output buffer, and the
//! native operators seeded into the `__native__` namespace.

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use tracing::trace;

use crate::eval::frame::Frame;
use crate::eval::reader;
use crate::eval::value::{EvalPolicy, Func, MacroDef, Native, NativeFn, Value};

pub const NATIVE_NS: &str = "__native__";

pub struct Context {
    /// Two-level map: namespace -> identifier -> value.
    symbols: BTreeMap<String, BTreeMap<String, Value>>,
    /// Namespaces searched, in order, after the current one.
    fallback_ns: BTreeMap<String, Vec<String>>,
    buf: String,
}

impl Context {
    pub fn new() -> Self {
        let mut ctx = Context {
            symbols: BTreeMap::new(),
            fallback_ns: BTreeMap::new(),
            buf: String::new(),
        };
        ctx.install("buf", EvalPolicy::All, native_buf);
        ctx.install("str", EvalPolicy::All, native_str);
        ctx.install("def", EvalPolicy::SkipN(1), native_def);
        ctx.install("add", EvalPolicy::All, native_add);
        ctx.install("sub", EvalPolicy::All, native_sub);
        ctx.install("mul", EvalPolicy::All, native_mul);
        ctx.install("div", EvalPolicy::All, native_div);
        ctx.install("invert-sign", EvalPolicy::All, native_invert_sign);
        ctx.install("truthy", EvalPolicy::All, native_truthy);
        ctx.install("fn", EvalPolicy::SkipAll, native_fn);
        ctx.install("macro", EvalPolicy::SkipAll, native_macro);
        ctx
    }

    fn install(&mut self, name: &str, policy: EvalPolicy, f: NativeFn) {
        self.symbols.entry(NATIVE_NS.to_string()).or_default().insert(
            name.to_string(),
            Value::Native(Native {
                name: name.to_string(),
                policy,
                f,
            }),
        );
    }

    pub fn current_namespace(&self) -> &str {
        "core"
    }

    /// Appends `fallback` to the namespaces searched after `ns` when a bare
    /// symbol does not resolve there.
    pub fn push_fallback_ns(&mut self, ns: &str, fallback: &str) {
        self.fallback_ns
            .entry(ns.to_string())
            .or_default()
            .push(fallback.to_string());
    }

    /// Returns the accumulated output and clears it.
    pub fn pull_buffer(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }

    pub fn buffer(&self) -> &str {
        &self.buf
    }

    /// Parses `source` and evaluates each form in order within a fresh root
    /// frame, returning the last result.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        trace!("eval: {}", source);
        let forms = reader::read(source)?;
        let root = self.make_frame(None);
        let mut last = Value::Nil;
        for form in &forms {
            trace!("form: {}", form);
            last = self.eval_value(form, &root)?;
        }
        Ok(last)
    }

    /// A new frame with the local `let` operator pre-bound.
    pub fn make_frame(&self, parent: Option<Rc<Frame>>) -> Rc<Frame> {
        let frame = Frame::new(parent);
        frame.insert(
            "let",
            Value::Native(Native {
                name: "let".to_string(),
                policy: EvalPolicy::SkipAll,
                f: native_let,
            }),
        );
        frame
    }

    pub fn eval_value(&mut self, value: &Value, frame: &Rc<Frame>) -> Result<Value> {
        match value {
            Value::Symbol { ns, token } => self.resolve(ns.as_deref(), token, frame),
            Value::Vector(items) => {
                let mut res = Vec::with_capacity(items.len());
                for item in items {
                    res.push(self.eval_value(item, frame)?);
                }
                Ok(Value::Vector(res))
            }
            Value::Map(map) => {
                let mut res = BTreeMap::new();
                for (key, value) in map {
                    res.insert(self.eval_value(key, frame)?, self.eval_value(value, frame)?);
                }
                Ok(Value::Map(res))
            }
            Value::List(items) => {
                let (head, rest) = match items.split_first() {
                    Some(split) => split,
                    None => return Ok(Value::Nil),
                };
                let callable = self.eval_value(head, frame)?;
                let skip = params_to_skip_eval_for(&callable);
                let mut args = Vec::with_capacity(rest.len());
                for (i, arg) in rest.iter().enumerate() {
                    if i < skip {
                        args.push(arg.clone());
                    } else {
                        args.push(self.eval_value(arg, frame)?);
                    }
                }
                self.call(&callable, &args, frame)
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve(&self, ns: Option<&str>, token: &str, frame: &Rc<Frame>) -> Result<Value> {
        match ns {
            None => {
                if let Some(value) = frame.lookup(token) {
                    return Ok(value);
                }
                let current = self.current_namespace();
                if let Some(value) = self.symbols.get(current).and_then(|m| m.get(token)) {
                    return Ok(value.clone());
                }
                if let Some(fallbacks) = self.fallback_ns.get(current) {
                    for fallback in fallbacks {
                        if let Some(value) = self.symbols.get(fallback).and_then(|m| m.get(token)) {
                            return Ok(value.clone());
                        }
                    }
                }
                bail!("Could not find symbol {}", token)
            }
            Some(ns) => self
                .symbols
                .get(ns)
                .and_then(|m| m.get(token))
                .cloned()
                .ok_or_else(|| anyhow!("Could not find symbol {}.{}", ns, token)),
        }
    }

    pub fn call(&mut self, callable: &Value, args: &[Value], frame: &Rc<Frame>) -> Result<Value> {
        match callable {
            Value::Func(func) => {
                check_arity(func.params.len(), func.var_param.is_some(), args.len())?;
                let call_frame = self.make_frame(Some(frame.add_root_frame(func.captured.clone())));
                let positional = &args[..func.params.len()];
                for (param, value) in func.params.iter().zip(positional) {
                    call_frame.insert(param.clone(), value.clone());
                }
                if let Some(var) = &func.var_param {
                    call_frame.insert(var.clone(), Value::Vector(args[func.params.len()..].to_vec()));
                }
                let mut last = Value::Nil;
                for form in &func.body {
                    last = self.eval_value(form, &call_frame)?;
                }
                Ok(last)
            }
            Value::Macro(mac) => {
                check_arity(mac.params.len(), mac.var_param.is_some(), args.len())?;
                let expand_frame = self.make_frame(Some(frame.clone()));
                let positional = &args[..mac.params.len()];
                for (param, value) in mac.params.iter().zip(positional) {
                    expand_frame.insert(param.clone(), value.clone());
                }
                if let Some(var) = &mac.var_param {
                    expand_frame.insert(var.clone(), Value::Vector(args[mac.params.len()..].to_vec()));
                }
                let mut expansion = Value::Nil;
                for form in &mac.body {
                    expansion = self.eval_value(form, &expand_frame)?;
                }
                // the expansion is a form evaluated where the macro was called
                self.eval_value(&expansion, frame)
            }
            Value::Native(native) => (native.f)(self, args, frame),
            Value::Bool(true) => Ok(args.first().cloned().unwrap_or(Value::Nil)),
            Value::Bool(false) => Ok(args.get(1).cloned().unwrap_or(Value::Nil)),
            Value::Nil => bail!("Cannot call 'nil'!"),
            _ => bail!("Invalid callable!"),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

fn check_arity(params: usize, var_param: bool, args: usize) -> Result<()> {
    if args < params || (!var_param && args != params) {
        bail!("Expected arity {} but received {} params.", params, args);
    }
    Ok(())
}

fn params_to_skip_eval_for(callable: &Value) -> usize {
    match callable {
        Value::Native(native) => native.policy.skip_count(),
        Value::Macro(_) => usize::MAX,
        _ => 0,
    }
}

/// Strings render verbatim; everything else through the printer.
fn render_fragment(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

fn native_buf(ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    for value in args {
        let fragment = render_fragment(value);
        ctx.buf.push_str(&fragment);
    }
    Ok(Value::Nil)
}

fn native_str(_ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    Ok(Value::Str(args.iter().map(render_fragment).collect()))
}

fn native_def(ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    if args.len() != 2 {
        bail!("Invalid arity for def! Expected 2 values!");
    }
    let (ns, token) = match &args[0] {
        Value::Symbol { ns, token } => (ns.clone(), token.clone()),
        _ => bail!("Must bind to a Symbol!"),
    };
    let ns = ns.unwrap_or_else(|| ctx.current_namespace().to_string());
    if ns == NATIVE_NS {
        bail!("Cannot define symbols in native namespace");
    }
    ctx.symbols.entry(ns).or_default().insert(token, args[1].clone());
    Ok(Value::Nil)
}

fn value_to_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => bail!("Cannot cast value '{}' to number", other),
    }
}

fn numeric_args(name: &str, args: &[Value]) -> Result<Vec<f64>> {
    if args.is_empty() {
        bail!("Expected at least one argument to __native__.{}!", name);
    }
    args.iter().map(value_to_f64).collect()
}

fn native_add(_ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    let nums = numeric_args("add", args)?;
    Ok(Value::Number(nums.iter().sum()))
}

fn native_mul(_ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    let nums = numeric_args("mul", args)?;
    Ok(Value::Number(nums.iter().product()))
}

fn native_sub(_ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    let nums = numeric_args("sub", args)?;
    Ok(Value::Number(nums[1..].iter().fold(nums[0], |acc, n| acc - n)))
}

fn native_div(_ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    let nums = numeric_args("div", args)?;
    Ok(Value::Number(nums[1..].iter().fold(nums[0], |acc, n| acc / n)))
}

fn native_invert_sign(_ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    if args.len() != 1 {
        bail!("Expected arity of one argument to __native__.invert-sign!");
    }
    Ok(Value::Number(-value_to_f64(&args[0])?))
}

fn native_truthy(_ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    if args.len() != 1 {
        bail!("Expected arity of one argument to __native__.truthy!");
    }
    let truthy = match &args[0] {
        Value::Nil => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::Str(s) => !s.is_empty(),
        _ => true,
    };
    Ok(Value::Bool(truthy))
}

fn native_let(ctx: &mut Context, args: &[Value], frame: &Rc<Frame>) -> Result<Value> {
    if args.is_empty() {
        bail!("Must have arguments to 'let'");
    }
    let bindings = args[0]
        .as_vector()
        .ok_or_else(|| anyhow!("First argument to 'let' must be a vector"))?;

    let local = ctx.make_frame(Some(frame.clone()));
    let mut iter = bindings.iter();
    while let Some(key) = iter.next() {
        let token = match key {
            Value::Symbol { token, .. } => token.clone(),
            _ => bail!("'let' can only bind to symbols!"),
        };
        let form = iter
            .next()
            .ok_or_else(|| anyhow!("Missing value for {}", key))?;
        // later bindings see the earlier ones
        let value = ctx.eval_value(form, &local)?;
        local.insert(token, value);
    }

    let mut last = Value::Nil;
    for form in &args[1..] {
        last = ctx.eval_value(form, &local)?;
    }
    Ok(last)
}

/// `[p1 p2 & rest]` -> positional parameter names plus the optional
/// var-param after `&`.
fn parse_params(form: Option<&Value>) -> Result<(Vec<String>, Option<String>)> {
    let items = form
        .and_then(Value::as_vector)
        .ok_or_else(|| anyhow!("Expected a parameter vector"))?;

    let mut params = Vec::new();
    let mut var_param = None;
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        let token = match item {
            Value::Symbol { token, .. } => token,
            _ => bail!("Parameters must be symbols"),
        };
        if token != "&" {
            params.push(token.clone());
            continue;
        }
        match iter.next() {
            Some(Value::Symbol { token, .. }) => var_param = Some(token.clone()),
            _ => bail!("Expected a symbol after '&'"),
        }
        if iter.next().is_some() {
            bail!("Only one parameter may follow '&'");
        }
    }
    Ok((params, var_param))
}

/// An optional leading doc string is only taken when body forms remain.
fn split_doc(body: &[Value]) -> (Option<String>, Vec<Value>) {
    if body.len() > 1 {
        if let Value::Str(doc) = &body[0] {
            return (Some(doc.clone()), body[1..].to_vec());
        }
    }
    (None, body.to_vec())
}

fn native_fn(_ctx: &mut Context, args: &[Value], frame: &Rc<Frame>) -> Result<Value> {
    let (params, var_param) = parse_params(args.first())?;
    let (doc, body) = split_doc(&args[1..]);
    Ok(Value::Func(Rc::new(Func {
        params,
        var_param,
        body,
        captured: Some(frame.clone()),
        doc,
    })))
}

fn native_macro(_ctx: &mut Context, args: &[Value], _frame: &Rc<Frame>) -> Result<Value> {
    let (params, var_param) = parse_params(args.first())?;
    let (doc, body) = split_doc(&args[1..]);
    Ok(Value::Macro(Rc::new(MacroDef {
        params,
        var_param,
        body,
        doc,
    })))
}
