//! S-expression helpers shared by config parsing and event output.

use lexpr::Value;

/// Escape a string for s-expression output.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Name of a plist key, accepting both `Value::Keyword("key")` and
/// `Value::Symbol(":key")` forms.
fn key_name(value: &Value) -> Option<&str> {
    match value {
        Value::Keyword(k) => Some(k.as_ref()),
        Value::Symbol(s) => s.strip_prefix(':'),
        _ => None,
    }
}

/// Find the raw value following `:key` in a plist.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    plist_pairs(value)
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// All `(:key value)` pairs of a plist, in order.  Non-keyword entries in
/// key position are skipped along with their value.
pub fn plist_pairs(value: &Value) -> Vec<(&str, &Value)> {
    let mut pairs = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        let Value::Cons(next) = pair.cdr() else {
            break;
        };
        if let Some(k) = key_name(pair.car()) {
            pairs.push((k, next.car()));
        }
        current = next.cdr();
    }
    pairs
}

/// Render a scalar plist value as a string.  Keywords and symbols lose
/// their leading colon, booleans become `t`/`nil`.
pub fn scalar_string(val: &Value) -> String {
    match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => (if *b { "t" } else { "nil" }).to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    }
}

/// Extract a keyword value from an s-expression plist as a string.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    get_value(value, key).map(scalar_string)
}

/// Extract an unsigned integer value from an s-expression plist.
pub fn get_uint(value: &Value, key: &str) -> Option<u64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a boolean value from an s-expression plist.
/// Treats "nil" as false, anything else as true.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

/// Extract a floating-point value from an s-expression plist.
pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Format an IPC event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Value {
        lexpr::from_str(s).unwrap()
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_get_scalars() {
        let v = parse("(:dwell-ms 250 :thumb-deadband 0.08 :enabled nil :name \"x\")");
        assert_eq!(get_uint(&v, "dwell-ms"), Some(250));
        assert_eq!(get_float(&v, "thumb-deadband"), Some(0.08));
        assert_eq!(get_bool(&v, "enabled"), Some(false));
        assert_eq!(get_keyword(&v, "name"), Some("x".to_string()));
        assert_eq!(get_keyword(&v, "missing"), None);
    }

    #[test]
    fn test_keyword_values_lose_colon() {
        let v = parse("(:sink :log)");
        assert_eq!(get_keyword(&v, "sink"), Some("log".to_string()));
    }

    #[test]
    fn test_nested_plist() {
        let v = parse("(:enabled t :keys (:next \"n\" :back \"b\"))");
        let keys = get_value(&v, "keys").unwrap();
        let pairs: Vec<(String, String)> = plist_pairs(keys)
            .into_iter()
            .map(|(k, v)| (k.to_string(), scalar_string(v)))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("next".to_string(), "n".to_string()),
                ("back".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_dangling_key_ignored() {
        let v = parse("(:a 1 :b)");
        assert_eq!(get_uint(&v, "a"), Some(1));
        assert_eq!(get_value(&v, "b"), None);
    }

    #[test]
    fn test_format_event() {
        let e = format_event("gesture-action", &[("action", ":next"), ("keys", "\"shift+n\"")]);
        assert_eq!(
            e,
            "(:type :event :event :gesture-action :action :next :keys \"shift+n\")"
        );
    }
}
