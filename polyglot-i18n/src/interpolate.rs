//! Placeholder interpolation
//!
//! Templates reference parameters as `{{name}}`. A placeholder is replaced
//! only when `name` is a key of the parameter map; anything else is left
//! verbatim so a missing parameter shows up in the output instead of failing
//! the translation. Names are matched literally: `{{user.name}}` needs a
//! parameter called `"user.name"`.

use crate::pool::STRINGS;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write;

/// Interpolation parameters.
pub type Params = HashMap<String, Value>;

/// Build [`Params`] from name/value pairs.
///
/// ```
/// use polyglot_i18n::params;
///
/// let p = params([("name", "Ana".into()), ("age", 30.into())]);
/// assert_eq!(p.len(), 2);
/// ```
pub fn params<K, I>(pairs: I) -> Params
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Substitute every `{{name}}` whose name is present in `params`.
///
/// ```
/// use polyglot_i18n::{interpolate, params};
///
/// let p = params([("name", "Ana".into())]);
/// assert_eq!(interpolate("Hi {{name}}", &p), "Hi Ana");
/// assert_eq!(interpolate("Hi {{name}}, you are {{age}}", &p), "Hi Ana, you are {{age}}");
/// ```
pub fn interpolate(template: &str, params: &Params) -> String {
    if params.is_empty() || !template.contains("{{") {
        return template.to_owned();
    }

    let mut out = STRINGS.acquire();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        match params.get(&after[..end]) {
            Some(value) => {
                write_value(&mut out, value);
                rest = &after[end + 2..];
            }
            None => {
                // Emit one brace and rescan so `{{{{name}}` still finds `{{name}}`.
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    out.push_str(rest);
    out.as_str().to_owned()
}

/// Render a parameter value: strings as-is, everything else as compact JSON.
pub fn format_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        other => {
            let _ = write!(out, "{}", other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_substitution() {
        let p = params([("name", json!("Ana"))]);
        assert_eq!(interpolate("Hi {{name}}", &p), "Hi Ana");
    }

    #[test]
    fn test_missing_placeholder_left_verbatim() {
        let p = params([("name", json!("Ana"))]);
        assert_eq!(
            interpolate("Hi {{name}}, you are {{age}}", &p),
            "Hi Ana, you are {{age}}"
        );
    }

    #[test]
    fn test_repeated_placeholder() {
        let p = params([("x", json!(1))]);
        assert_eq!(interpolate("{{x}}+{{x}}={{y}}", &p), "1+1={{y}}");
    }

    #[test]
    fn test_non_string_values() {
        let p = params([
            ("n", json!(3.5)),
            ("b", json!(false)),
            ("z", json!(null)),
            ("l", json!(["a", 1])),
            ("m", json!({ "k": "v" })),
        ]);
        assert_eq!(
            interpolate("{{n}} {{b}} {{z}} {{l}} {{m}}", &p),
            r#"3.5 false null ["a",1] {"k":"v"}"#
        );
    }

    #[test]
    fn test_no_nested_expansion() {
        let p = params([("user", json!({ "name": "Ana" }))]);
        assert_eq!(interpolate("{{user.name}}", &p), "{{user.name}}");

        let p = params([("user.name", json!("Ana"))]);
        assert_eq!(interpolate("{{user.name}}", &p), "Ana");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let p = params([("a", json!("{{b}}")), ("b", json!("B"))]);
        assert_eq!(interpolate("{{a}}", &p), "{{b}}");
    }

    #[test]
    fn test_unterminated_and_extra_braces() {
        let p = params([("name", json!("Ana"))]);
        assert_eq!(interpolate("Hi {{name", &p), "Hi {{name");
        assert_eq!(interpolate("{{{{name}}", &p), "{{Ana");
        assert_eq!(interpolate("{{}}", &p), "{{}}");
    }

    #[test]
    fn test_empty_params_returns_template() {
        assert_eq!(interpolate("Hi {{name}}", &Params::new()), "Hi {{name}}");
    }

    #[test]
    fn test_unicode() {
        let p = params([("nome", json!("João"))]);
        assert_eq!(interpolate("Olá, {{nome}}! ✓", &p), "Olá, João! ✓");
    }
}
