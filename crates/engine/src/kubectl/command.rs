use std::{borrow::Cow, fmt};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Program name of every produced command.
pub const KUBECTL: &str = "kubectl";

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(?:\{(\w+)\}|(\w+))").expect("placeholder pattern is valid"));

/// A command ready for process invocation: program plus ordered arguments.
///
/// Building a command never runs it; callers decide how and whether to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubectlCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl KubectlCommand {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            program: KUBECTL.to_string(),
            args,
        }
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.program, self.args)
    }

    /// Substitutes `$VAR` and `${VAR}` placeholders in every argument.
    ///
    /// Placeholders the lookup does not know are left untouched.
    ///
    /// ```rust
    /// use kstep_engine::KubectlCommand;
    ///
    /// let command = KubectlCommand::new(vec!["get".into(), "pods".into(), "-n".into(), "$NAMESPACE".into()]);
    /// let expanded = command.expand_placeholders(|name| (name == "NAMESPACE").then(|| "team-a".to_string()));
    /// assert_eq!(expanded.args, vec!["get", "pods", "-n", "team-a"]);
    /// ```
    pub fn expand_placeholders<F>(&self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let args = self
            .args
            .iter()
            .map(|arg| {
                PLACEHOLDER_PATTERN
                    .replace_all(arg, |captures: &Captures| {
                        let name = captures
                            .get(1)
                            .or_else(|| captures.get(2))
                            .map(|matched| matched.as_str())
                            .unwrap_or_default();
                        lookup(name).unwrap_or_else(|| captures[0].to_string())
                    })
                    .into_owned()
            })
            .collect();
        Self {
            program: self.program.clone(),
            args,
        }
    }
}

impl fmt::Display for KubectlCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(formatter, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// Single-quotes arguments the shell would otherwise split or interpret. `$` is left
/// alone so placeholders stay expandable.
fn shell_quote(arg: &str) -> Cow<'_, str> {
    if arg.is_empty() {
        return Cow::Borrowed("''");
    }
    let needs_quotes = arg.chars().any(|character| {
        character.is_whitespace()
            || matches!(
                character,
                '\'' | '"' | '\\' | ';' | '&' | '|' | '*' | '?' | '(' | ')' | '<' | '>' | '`' | '{' | '}' | '[' | ']'
            )
    });
    if needs_quotes {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    } else {
        Cow::Borrowed(arg)
    }
}
