//! Option specifications: flags, destination, type, arity and default

use crate::error::{ResolveError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

static SHORT_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-[A-Za-z0-9]$").expect("valid regex"));
static LONG_FLAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid regex"));

/// Declared value type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Path,
}

impl ValueKind {
    /// Resolve a type name as written in option-spec files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "str" | "string" => Some(ValueKind::Str),
            "int" | "integer" => Some(ValueKind::Int),
            "float" | "number" => Some(ValueKind::Float),
            "bool" | "boolean" => Some(ValueKind::Bool),
            "path" | "file" => Some(ValueKind::Path),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Str => "string",
            ValueKind::Int => "integer",
            ValueKind::Float => "float",
            ValueKind::Bool => "boolean",
            ValueKind::Path => "path",
        }
    }

    /// Convert one raw command-line token into a typed value.
    pub fn convert(self, option: &str, raw: &str) -> Result<Value> {
        let invalid = || ResolveError::InvalidValue {
            option: option.to_string(),
            value: raw.to_string(),
            expected: self.as_str().to_string(),
        };
        match self {
            ValueKind::Str | ValueKind::Path => Ok(Value::String(raw.to_string())),
            ValueKind::Int => raw.trim().parse::<i64>().map(Value::from).map_err(|_| invalid()),
            ValueKind::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(invalid),
            ValueKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
        }
    }
}

/// How many values an option consumes per occurrence, and how occurrences combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    /// Exactly one value; the last occurrence wins.
    #[default]
    Single,
    /// Zero or one value.
    Optional,
    /// One or more values, collected across occurrences.
    AtLeastOne,
    /// Zero or more values, collected across occurrences.
    Any,
    /// A fixed number of values per occurrence.
    Exactly(usize),
    /// One value per occurrence, collected across occurrences.
    Append,
    /// No value; presence stores the given boolean.
    Switch(bool),
}

impl Arity {
    /// Whether the parsed value is a sequence.
    pub fn is_sequence(self) -> bool {
        matches!(self, Arity::AtLeastOne | Arity::Any | Arity::Exactly(_) | Arity::Append)
    }
}

/// One recognized command-line option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub flags: Vec<String>,
    pub aliases: Vec<String>,
    pub dest: String,
    pub kind: ValueKind,
    pub arity: Arity,
    pub default: Option<Value>,
    pub help: Option<String>,
    pub required: bool,
    pub choices: Vec<String>,
}

impl OptionSpec {
    /// Create an option from its flag strings; the destination is derived from them.
    pub fn new<I, S>(flags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let flags: Vec<String> = flags.into_iter().map(Into::into).collect();
        if flags.is_empty() {
            return Err(ResolveError::InvalidFlag {
                flag: String::new(),
                reason: "an option needs at least one flag",
            });
        }
        for flag in &flags {
            validate_flag(flag)?;
        }
        Ok(Self::with_flags(flags))
    }

    /// Create an option from built-in flags without validating them.
    pub(crate) fn builtin(flags: &[&str]) -> Self {
        Self::with_flags(flags.iter().map(|f| f.to_string()).collect())
    }

    fn with_flags(flags: Vec<String>) -> Self {
        let dest = derive_dest(&flags);
        Self {
            flags,
            aliases: Vec::new(),
            dest,
            kind: ValueKind::Str,
            arity: Arity::Single,
            default: None,
            help: None,
            required: false,
            choices: Vec::new(),
        }
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = dest.into();
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        if let Arity::Switch(on) = arity {
            self.kind = ValueKind::Bool;
            self.default.get_or_insert(Value::Bool(!on));
        }
        self.arity = arity;
        self
    }

    /// Shorthand for `arity(Arity::AtLeastOne)`.
    pub fn many(self) -> Self {
        self.arity(Arity::AtLeastOne)
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alias in aliases {
            let alias = alias.into();
            validate_flag(&alias)?;
            if !self.flags.contains(&alias) && !self.aliases.contains(&alias) {
                self.aliases.push(alias);
            }
        }
        Ok(self)
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Every string that selects this option: flags first, then aliases.
    pub fn all_flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().chain(self.aliases.iter()).map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.all_flags().any(|f| f == flag)
    }

    /// Drop one flag string. Returns false when the option has no flags left.
    pub(crate) fn strip_flag(&mut self, flag: &str) -> bool {
        self.flags.retain(|f| f != flag);
        self.aliases.retain(|f| f != flag);
        if self.flags.is_empty() && !self.aliases.is_empty() {
            self.flags.push(self.aliases.remove(0));
        }
        !self.flags.is_empty()
    }

    /// The flag shown in messages: first long flag, else the first flag.
    pub fn display_flag(&self) -> &str {
        self.all_flags()
            .find(|f| f.starts_with("--"))
            .or_else(|| self.all_flags().next())
            .unwrap_or(self.dest.as_str())
    }

    /// Convert raw tokens for this option, checking choices.
    pub fn convert(&self, raw: &str) -> Result<Value> {
        if !self.choices.is_empty() && !self.choices.iter().any(|c| c == raw) {
            return Err(ResolveError::InvalidValue {
                option: self.display_flag().to_string(),
                value: raw.to_string(),
                expected: format!("one of {}", self.choices.join(", ")),
            });
        }
        self.kind.convert(self.display_flag(), raw)
    }
}

pub fn validate_flag(flag: &str) -> Result<()> {
    if SHORT_FLAG.is_match(flag) || LONG_FLAG.is_match(flag) {
        return Ok(());
    }
    let reason = if !flag.starts_with('-') {
        "flags must start with '-'"
    } else if !flag.starts_with("--") {
        "single-dash flags must be one character"
    } else {
        "long flags may only contain letters, digits, '_' and '-'"
    };
    Err(ResolveError::InvalidFlag { flag: flag.to_string(), reason })
}

fn derive_dest(flags: &[String]) -> String {
    let chosen = flags.iter().find(|f| f.starts_with("--")).unwrap_or(&flags[0]);
    chosen.trim_start_matches('-').replace('-', "_")
}
