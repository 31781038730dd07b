use crate::{Error, Result};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static PARAM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("param pattern"));

/// Runtime parameters passed to a page file.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse from CLI args like "key=value".
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut params = Self::new();
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid param '{}', expected key=value", arg))
            })?;
            if key.is_empty() {
                return Err(Error::Config(format!("invalid param '{}', empty key", arg)));
            }
            params.values.insert(key.to_string(), value.to_string());
        }
        Ok(params)
    }
}

/// Parameter definition in a page file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamDef {
    #[serde(default)]
    pub required: bool,

    /// Used when the caller does not set the parameter.
    pub default: Option<String>,

    pub description: Option<String>,
}

/// Substitute `${var}` patterns in a string.
///
/// Caller values win over defaults. An optional parameter without a default
/// becomes empty; an undefined one is left untouched.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    let mut missing = None;
    let out = PARAM_PATTERN.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        if let Some(v) = params.get(name) {
            return v.to_string();
        }
        match defs.get(name) {
            Some(def) => match (&def.default, def.required) {
                (Some(default), _) => default.clone(),
                (None, true) => {
                    missing.get_or_insert_with(|| name.to_string());
                    String::new()
                }
                (None, false) => String::new(),
            },
            None => caps[0].to_string(),
        }
    });

    match missing {
        Some(name) => Err(Error::Config(format!(
            "missing required parameter: {}",
            name
        ))),
        None => Ok(out.into_owned()),
    }
}

/// Recursively substitute params in every string of a YAML value.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => {
            *s = substitute(s, params, defs)?;
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(name: &str, def: ParamDef) -> HashMap<String, ParamDef> {
        HashMap::from([(name.to_string(), def)])
    }

    #[test]
    fn test_substitute_caller_values() {
        let params = Params::new().set("a", "1").set("b", "2");
        let result = substitute("${a} + ${b} = 3", &params, &HashMap::new()).unwrap();
        assert_eq!(result, "1 + 2 = 3");
    }

    #[test]
    fn test_substitute_default() {
        let defs = defs(
            "user",
            ParamDef {
                default: Some("alice".into()),
                ..Default::default()
            },
        );
        let result = substitute("Row ${user}", &Params::new(), &defs).unwrap();
        assert_eq!(result, "Row alice");

        let params = Params::new().set("user", "bob");
        assert_eq!(substitute("Row ${user}", &params, &defs).unwrap(), "Row bob");
    }

    #[test]
    fn test_substitute_required_missing() {
        let defs = defs(
            "token",
            ParamDef {
                required: true,
                ..Default::default()
            },
        );
        let err = substitute("x ${token}", &Params::new(), &defs).unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_unknown_and_placeholder_text_untouched() {
        let result =
            substitute("${unknown} <ReplaceText> $notvar", &Params::new(), &HashMap::new())
                .unwrap();
        assert_eq!(result, "${unknown} <ReplaceText> $notvar");
    }

    #[test]
    fn test_params_from_args() {
        let args = vec!["user=alice".to_string(), "query=a=b".to_string()];
        let params = Params::from_args(&args).unwrap();
        assert_eq!(params.get("user"), Some("alice"));
        assert_eq!(params.get("query"), Some("a=b"));

        assert!(Params::from_args(&["novalue".to_string()]).is_err());
        assert!(Params::from_args(&["=x".to_string()]).is_err());
    }
}
