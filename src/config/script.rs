//! Restricted evaluation of Python parameter scripts
//!
//! A parameter script is Python source. It is parsed with a real Python
//! parser, then its top-level bindings are evaluated in their own namespace:
//!
//! ```text
//! """Docstrings and comments are ignored."""
//! case_id = "v2019"
//! _base = "/p/data"                  # private, not exported
//! mod_data_path = _base + "/models"
//! vars = ["pr", "tas",
//!         "psl"]
//! seasons = ("DJF", "JJA")
//! regions = {"tas": ["global", "NHEX"]}
//! save_netcdf = True
//! regrid_tool = None
//! num_workers: int = 4
//! num_workers += 1
//! ```
//!
//! Values are literals (`True`, `False`, `None`, numbers, strings, tuples,
//! lists, dicts), references to earlier bindings, `+` and unary `-`. Tuples
//! become sequences. Any other statement or expression is a syntax error
//! naming its line; the script is never executed.

use crate::domain::parameters::type_name;
use crate::error::{ResolveError, Result};
use rustpython_parser::ast::{self, Constant, Expr, Operator, Ranged, Stmt, UnaryOp};
use rustpython_parser::text_size::TextSize;
use rustpython_parser::Parse;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Evaluate a script and return every binding, private ones included.
pub fn evaluate(source: &str, path: &Path) -> Result<BTreeMap<String, Value>> {
    let suite = ast::Suite::parse(source, &path.display().to_string())
        .map_err(|err| syntax(path, line_at(source, err.offset), err.error.to_string()))?;

    let mut scope = Scope { source, path, bindings: BTreeMap::new() };
    for stmt in &suite {
        scope.statement(stmt)?;
    }
    Ok(scope.bindings)
}

/// Bindings visible to the host: every name not starting with `_`.
pub fn exported(bindings: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    bindings.into_iter().filter(|(name, _)| !name.starts_with('_')).collect()
}

fn syntax(path: &Path, line: usize, message: impl Into<String>) -> ResolveError {
    ResolveError::Syntax { path: path.to_path_buf(), line, message: message.into() }
}

/// 1-based line of a byte offset into `source`.
fn line_at(source: &str, offset: TextSize) -> usize {
    let offset = usize::from(offset).min(source.len());
    source.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}

fn target_name(target: &Expr) -> Option<&str> {
    match target {
        Expr::Name(name) => Some(name.id.as_str()),
        _ => None,
    }
}

fn statement_kind(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Import(_) | Stmt::ImportFrom(_) => "import",
        Stmt::FunctionDef(_) | Stmt::AsyncFunctionDef(_) => "function definition",
        Stmt::ClassDef(_) => "class definition",
        Stmt::If(_) => "'if' statement",
        Stmt::For(_) | Stmt::While(_) => "loop",
        Stmt::Expr(_) => "bare expression",
        Stmt::AugAssign(_) => "augmented assignment other than '+='",
        _ => "statement",
    }
}

struct Scope<'a> {
    source: &'a str,
    path: &'a Path,
    bindings: BTreeMap<String, Value>,
}

impl Scope<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> ResolveError {
        syntax(self.path, line, message)
    }

    fn bind(&mut self, target: &Expr, value: Value, line: usize) -> Result<()> {
        let name = target_name(target)
            .ok_or_else(|| self.error(line, "only plain names can be assigned"))?;
        self.bindings.insert(name.to_string(), value);
        Ok(())
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<()> {
        let line = line_at(self.source, stmt.range().start());
        match stmt {
            Stmt::Assign(assign) => {
                let value = self.expr(&assign.value, line)?;
                for target in &assign.targets {
                    self.bind(target, value.clone(), line)?;
                }
            }
            Stmt::AnnAssign(assign) => {
                // `name: T` without a value declares nothing
                if let Some(value) = &assign.value {
                    let value = self.expr(value, line)?;
                    self.bind(&assign.target, value, line)?;
                }
            }
            Stmt::AugAssign(assign) if assign.op == Operator::Add => {
                let current = self.expr(&assign.target, line)?;
                let rhs = self.expr(&assign.value, line)?;
                let sum = add(current, rhs).map_err(|msg| self.error(line, msg))?;
                self.bind(&assign.target, sum, line)?;
            }
            Stmt::Expr(expr) if matches!(expr.value.as_ref(), Expr::Constant(_)) => {}
            Stmt::Pass(_) => {}
            other => {
                return Err(self.error(
                    line,
                    format!("unsupported {} in parameter file", statement_kind(other)),
                ))
            }
        }
        Ok(())
    }

    fn expr(&self, expr: &Expr, line: usize) -> Result<Value> {
        match expr {
            Expr::Constant(constant) => self.constant(&constant.value, line),
            Expr::Name(name) => {
                let id = name.id.as_str();
                self.bindings
                    .get(id)
                    .cloned()
                    .ok_or_else(|| self.error(line, format!("name '{}' is not defined", id)))
            }
            Expr::List(list) => self.sequence(&list.elts, line),
            Expr::Tuple(tuple) => self.sequence(&tuple.elts, line),
            Expr::Dict(dict) => {
                let mut map = Map::new();
                for (key, value) in dict.keys.iter().zip(&dict.values) {
                    let key = key
                        .as_ref()
                        .ok_or_else(|| self.error(line, "'**' unpacking is not supported"))?;
                    let key = match self.expr(key, line)? {
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        other => {
                            return Err(self.error(
                                line,
                                format!("unsupported dict key type: {}", type_name(&other)),
                            ))
                        }
                    };
                    map.insert(key, self.expr(value, line)?);
                }
                Ok(Value::Object(map))
            }
            Expr::BinOp(binop) if binop.op == Operator::Add => {
                let lhs = self.expr(&binop.left, line)?;
                let rhs = self.expr(&binop.right, line)?;
                add(lhs, rhs).map_err(|msg| self.error(line, msg))
            }
            Expr::UnaryOp(unary) if matches!(unary.op, UnaryOp::USub | UnaryOp::UAdd) => {
                let value = self.expr(&unary.operand, line)?;
                let n = match value {
                    Value::Number(n) => n,
                    other => {
                        return Err(self.error(
                            line,
                            format!("bad operand type for unary operator: {}", type_name(&other)),
                        ))
                    }
                };
                if unary.op == UnaryOp::UAdd {
                    return Ok(Value::Number(n));
                }
                match n.as_i64().and_then(i64::checked_neg) {
                    Some(i) => Ok(Value::from(i)),
                    None => float(-n.as_f64().unwrap_or(f64::NAN))
                        .ok_or_else(|| self.error(line, "numeric overflow in unary '-'")),
                }
            }
            _ => Err(self.error(
                line,
                "only literals, names, '+' and unary '-' are allowed in parameter files",
            )),
        }
    }

    fn sequence(&self, elts: &[Expr], line: usize) -> Result<Value> {
        elts.iter().map(|e| self.expr(e, line)).collect::<Result<Vec<_>>>().map(Value::Array)
    }

    fn constant(&self, constant: &Constant, line: usize) -> Result<Value> {
        match constant {
            Constant::None => Ok(Value::Null),
            Constant::Bool(b) => Ok(Value::Bool(*b)),
            Constant::Str(s) => Ok(Value::String(s.clone())),
            Constant::Int(n) => n
                .to_string()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| self.error(line, format!("integer {} is out of range", n))),
            Constant::Float(f) => {
                float(*f).ok_or_else(|| self.error(line, "non-finite float literal"))
            }
            Constant::Tuple(items) => items
                .iter()
                .map(|c| self.constant(c, line))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            _ => Err(self.error(line, "bytes, complex and '...' literals are not supported")),
        }
    }
}

fn float(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

fn add(lhs: Value, rhs: Value) -> std::result::Result<Value, String> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Ok(Value::Array(a))
        }
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                if let Some(sum) = x.checked_add(y) {
                    return Ok(Value::from(sum));
                }
            }
            let sum = a.as_f64().unwrap_or(f64::NAN) + b.as_f64().unwrap_or(f64::NAN);
            float(sum).ok_or_else(|| "numeric overflow in '+'".to_string())
        }
        (a, b) => Err(format!(
            "unsupported operand types for '+': {} and {}",
            type_name(&a),
            type_name(&b)
        )),
    }
}
