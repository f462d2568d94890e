use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

/// Expand `${VAR_NAME}` references using `lookup`. Unknown variables are left as written.
pub fn expand_env_var_in_string<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = value.to_string();

    for cap in env_var_pattern().captures_iter(value) {
        let var_name = &cap[1];
        let replacement = lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name));
        result = result.replace(&cap[0], &replacement);
    }

    result
}

/// Expand environment variables in every value of a map
pub fn expand_env_vars<F>(env: &HashMap<String, String>, lookup: &F) -> HashMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    env.iter()
        .map(|(key, value)| (key.clone(), expand_env_var_in_string(value, lookup)))
        .collect()
}
