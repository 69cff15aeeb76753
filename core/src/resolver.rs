//! Variable resolution for configuration strings
//!
//! Configuration values may reference run parameters (`$BUILD_NUMBER`,
//! `${WORKSPACE}`) that are only known at run time. The [`Resolver`]
//! expands them in two passes: first from the run's parameter map, then
//! from the computed environment. Environment expansion is best-effort;
//! when the environment could not be computed, resolution silently falls
//! back to the parameter-substituted value.

use std::collections::HashMap;

/// Expands placeholder variables in configuration strings
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    /// Run-scoped parameters, substituted first
    run_vars: HashMap<String, String>,

    /// Computed environment, `None` when environment computation failed
    env: Option<HashMap<String, String>>,
}

impl Resolver {
    /// Create a resolver with run parameters and no environment
    pub fn new(run_vars: HashMap<String, String>) -> Self {
        Self {
            run_vars,
            env: None,
        }
    }

    /// Attach the computed environment used for the second expansion pass
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Create a resolver backed by the current process environment
    pub fn from_process_env(run_vars: HashMap<String, String>) -> Self {
        let env = std::env::vars().collect();
        Self::new(run_vars).with_env(env)
    }

    /// Resolve all variables in `text`
    ///
    /// Run parameters are substituted first, then any remaining macros are
    /// expanded from the environment. Unknown macros are left intact.
    pub fn resolve(&self, text: &str) -> String {
        let resolved = expand_macros(text, &self.run_vars);
        match &self.env {
            Some(env) => expand_macros(&resolved, env),
            // Environment unavailable, degrade to the substituted value
            None => resolved,
        }
    }

    /// Resolve an optional value; `None` passes through unchanged
    pub fn resolve_opt(&self, text: Option<&str>) -> Option<String> {
        text.map(|t| self.resolve(t))
    }
}

/// Substitute `$NAME` and `${NAME}` macros from `vars`, leaving unknown
/// macros and stray `$` characters intact.
fn expand_macros(text: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        let (name, consumed) = if let Some(inner) = tail.strip_prefix('{') {
            match inner.find('}') {
                Some(end) => (&inner[..end], end + 3),
                None => ("", 0),
            }
        } else {
            let end = tail
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .unwrap_or(tail.len());
            (&tail[..end], end + 1)
        };

        if name.is_empty() {
            out.push('$');
            rest = tail;
            continue;
        }

        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str(&rest[pos..pos + consumed]);
            }
        }
        rest = &rest[pos + consumed..];
    }

    out.push_str(rest);
    out
}
