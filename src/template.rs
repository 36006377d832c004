use std::{borrow::Cow, collections::HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(?P<escaped>\$)|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\})")
        .expect("placeholder pattern is valid")
});

/// Substitute `$name` and `${name}` from `mapping`.
///
/// `$$` becomes `$`. Placeholders without a value are left as they are.
pub fn safe_substitute<'t>(template: &'t str, mapping: &HashMap<&str, String>) -> Cow<'t, str> {
    PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        if caps.name("escaped").is_some() {
            return "$".to_string();
        }
        let name = caps
            .name("named")
            .or_else(|| caps.name("braced"))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match mapping.get(name) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn mapping() -> HashMap<&'static str, String> {
        HashMap::from([("table_json", "[1, 2]".to_string())])
    }

    #[test]
    fn test_substitute_both_forms() {
        let out = safe_substitute("var table = $table_json; var t2 = ${table_json};", &mapping());
        assert_eq!(out, "var table = [1, 2]; var t2 = [1, 2];");
    }

    #[test]
    fn test_unknown_placeholders_kept() {
        let out = safe_substitute("$other ${missing} $ 5 $table_json", &mapping());
        assert_eq!(out, "$other ${missing} $ 5 [1, 2]");
    }

    #[test]
    fn test_dollar_escape() {
        let out = safe_substitute("$$table_json costs $$5", &mapping());
        assert_eq!(out, "$table_json costs $5");
    }

    #[test]
    fn test_no_placeholder() {
        let out = safe_substitute("<html></html>", &mapping());
        assert!(matches!(out, Cow::Borrowed(_)));
    }
}
