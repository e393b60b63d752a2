//! Argument specifications and binding for library and user keywords.

use super::failure::{Failure, KwResult};
use super::value::Value;
use super::variables::split_decorated;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamKind {
    Positional,
    Varargs,
    Kwargs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ArgSpec {
    pub params: Vec<Param>,
}

/// One argument at a call site, after variable substitution.
#[derive(Debug, Clone)]
pub(crate) struct Arg {
    /// Set for `name=value` arguments matching a parameter.
    pub name: Option<String>,
    pub value: Value,
}

impl Arg {
    pub fn positional(value: Value) -> Self {
        Self { name: None, value }
    }
}

/// A bound parameter: a value from the call, or the parameter's default text.
#[derive(Debug, Clone)]
pub(crate) enum Bound {
    Value(Value),
    Default(String),
}

impl ArgSpec {
    /// `["message", "level=INFO", "*values", "**options"]`
    pub fn library(params: &[&str]) -> Self {
        let params = params
            .iter()
            .map(|raw| {
                if let Some(name) = raw.strip_prefix("**") {
                    Param {
                        name: name.to_string(),
                        kind: ParamKind::Kwargs,
                        default: None,
                    }
                } else if let Some(name) = raw.strip_prefix('*') {
                    Param {
                        name: name.to_string(),
                        kind: ParamKind::Varargs,
                        default: None,
                    }
                } else {
                    let (name, default) = match raw.split_once('=') {
                        Some((name, default)) => (name, Some(default.to_string())),
                        None => (*raw, None),
                    };
                    Param {
                        name: name.to_string(),
                        kind: ParamKind::Positional,
                        default,
                    }
                }
            })
            .collect();
        Self { params }
    }

    /// `["${name}", "${greeting}=hi", "@{rest}", "&{options}"]`
    pub fn user(keyword: &str, params: &[String]) -> KwResult<Self> {
        let mut out = Vec::with_capacity(params.len());
        for raw in params {
            let (decorated, default) = match raw.split_once('=') {
                Some((name, default)) => (name.trim_end(), Some(default.to_string())),
                None => (raw.as_str(), None),
            };
            let invalid = || {
                Failure::fail(format!(
                    "User keyword '{keyword}' has invalid argument specification: \
                     Invalid argument syntax '{raw}'."
                ))
            };
            let (sigil, name) = split_decorated(decorated).ok_or_else(invalid)?;
            let kind = match sigil {
                '$' => ParamKind::Positional,
                '@' if default.is_none() => ParamKind::Varargs,
                '&' if default.is_none() => ParamKind::Kwargs,
                _ => return Err(invalid()),
            };
            out.push(Param {
                name: name.to_string(),
                kind,
                default,
            });
        }
        Ok(Self { params: out })
    }

    fn positional(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.kind == ParamKind::Positional)
    }

    fn has(&self, kind: ParamKind) -> bool {
        self.params.iter().any(|p| p.kind == kind)
    }

    /// Whether `name=value` should bind by name rather than position.
    pub fn accepts_named(&self, name: &str) -> bool {
        self.has(ParamKind::Kwargs) || self.positional().any(|p| p.name == name)
    }

    fn count_error(&self, keyword: &str, got: usize) -> Failure {
        let min = self.positional().filter(|p| p.default.is_none()).count();
        let max = self.positional().count();
        let expected = if self.has(ParamKind::Varargs) {
            format!("at least {min} argument{}", if min == 1 { "" } else { "s" })
        } else if min == max {
            format!("{min} argument{}", if min == 1 { "" } else { "s" })
        } else {
            format!("{min} to {max} arguments")
        };
        Failure::fail(format!("Keyword '{keyword}' expected {expected}, got {got}."))
    }

    /// Bind call-site arguments to parameters, in parameter order.
    pub fn bind(&self, keyword: &str, args: Vec<Arg>) -> KwResult<Vec<Bound>> {
        let given = args.len();
        let mut positional = Vec::new();
        let mut named: Vec<(String, Value)> = Vec::new();
        for arg in args {
            match arg.name {
                Some(name) => {
                    if named.iter().any(|(existing, _)| *existing == name) {
                        return Err(Failure::fail(format!(
                            "Keyword '{keyword}' got multiple values for argument '{name}'."
                        )));
                    }
                    named.push((name, arg.value));
                }
                None if !named.is_empty() => {
                    return Err(Failure::fail(format!(
                        "Keyword '{keyword}' got positional argument after named arguments."
                    )));
                }
                None => positional.push(arg.value),
            }
        }

        let max = self.positional().count();
        if positional.len() > max && !self.has(ParamKind::Varargs) {
            return Err(self.count_error(keyword, given));
        }

        let mut positional = positional.into_iter();
        let mut out = Vec::with_capacity(self.params.len());
        for param in &self.params {
            match param.kind {
                ParamKind::Positional => {
                    let by_name = named
                        .iter()
                        .position(|(name, _)| *name == param.name)
                        .map(|ix| named.remove(ix).1);
                    let bound = match (positional.next(), by_name) {
                        (Some(_), Some(_)) => {
                            return Err(Failure::fail(format!(
                                "Keyword '{keyword}' got multiple values for argument '{}'.",
                                param.name
                            )))
                        }
                        (Some(value), None) | (None, Some(value)) => Bound::Value(value),
                        (None, None) => match &param.default {
                            Some(default) => Bound::Default(default.clone()),
                            None => return Err(self.count_error(keyword, given)),
                        },
                    };
                    out.push(bound);
                }
                ParamKind::Varargs => {
                    out.push(Bound::Value(Value::list(positional.by_ref().collect())));
                }
                ParamKind::Kwargs => {
                    out.push(Bound::Value(Value::dict(named.drain(..).collect())));
                }
            }
        }

        if let Some((name, _)) = named.first() {
            return Err(Failure::fail(format!(
                "Keyword '{keyword}' got unexpected named argument '{name}'."
            )));
        }
        Ok(out)
    }
}
