//! Raw placeholder interpolation
//!
//! `[key]` and `[?key]` inside an extra clause or an `ON` join clause are
//! replaced with the text of the matching parameter. The substitution is
//! textual: nothing is escaped or bound, so parameters feeding these
//! placeholders must never carry untrusted input.

use serde_json::Value;
use vista_core::Params;

/// Replace every `[key]` / `[?key]` in `template` with its parameter text.
///
/// Missing and `null` parameters render as the empty string. An opening
/// bracket without a closing one is kept as is.
pub fn interpolate_raw(template: &str, params: &Params) -> String {
    let mut sections = template.split('[');
    let mut out = sections.next().unwrap_or_default().to_string();

    for section in sections {
        match section.find(']') {
            Some(end) => {
                let token = &section[..end];
                let key = token.strip_prefix('?').unwrap_or(token);
                out.push_str(&param_text(params.get(key)));
                out.push_str(&section[end + 1..]);
            }
            None => {
                out.push('[');
                out.push_str(section);
            }
        }
    }

    out
}

fn param_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vista_core::params::params_from_json;

    #[test]
    fn test_fill_placeholders() {
        let params = params_from_json(json!({ "order": "fname", "n": 5 }));
        assert_eq!(
            interpolate_raw("ORDER BY [order] LIMIT [?n]", &params),
            "ORDER BY fname LIMIT 5"
        );
    }

    #[test]
    fn test_missing_renders_empty() {
        let params = params_from_json(json!({ "x": null }));
        assert_eq!(interpolate_raw("a=[missing] b=[x]", &params), "a= b=");
    }

    #[test]
    fn test_plain_text_untouched() {
        let params = Params::new();
        assert_eq!(interpolate_raw("ORDER BY psnID", &params), "ORDER BY psnID");
        assert_eq!(interpolate_raw("a [b", &params), "a [b");
    }
}
