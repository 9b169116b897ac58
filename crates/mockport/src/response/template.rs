//! Response body expressions.
//!
//! Bodies of responses with `using_expressions` set may embed expressions
//! that are expanded against the inbound request:
//!
//! - `${PATH_PARAMETER(key="id")}` - Value captured by a `{id}` URI template segment
//! - `${QUERY_STRING(query="q")}` - Query parameter value
//! - `${REQUEST_BODY}` - The raw request body
//! - `${RANDOM_UUID}` - A fresh v4 UUID
//! - `${RANDOM_INTEGER(min="1", max="9")}` - Integer in the inclusive range
//!
//! Missing parameters render as an empty string. Unknown expressions are left
//! untouched.

use rand::Rng;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

static EXPRESSION_REGEX: OnceLock<Regex> = OnceLock::new();
static ARGUMENT_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_expression_regex() -> &'static Regex {
    EXPRESSION_REGEX
        .get_or_init(|| Regex::new(r"\$\{([A-Z_]+)(?:\(([^)]*)\))?\}").unwrap())
}

fn get_argument_regex() -> &'static Regex {
    ARGUMENT_REGEX.get_or_init(|| Regex::new(r#"([A-Za-z_]+)\s*=\s*"([^"]*)""#).unwrap())
}

const DEFAULT_RANDOM_MIN: i64 = 0;
const DEFAULT_RANDOM_MAX: i64 = 100;

/// Request values available to body expressions.
#[derive(Debug, Clone, Default)]
pub struct ExpressionContext<'a> {
    pub path_parameters: Option<&'a HashMap<String, String>>,
    pub query: HashMap<String, String>,
    pub body: &'a str,
}

fn arguments(raw: Option<&str>) -> HashMap<&str, &str> {
    let Some(raw) = raw else {
        return HashMap::new();
    };
    get_argument_regex()
        .captures_iter(raw)
        .map(|caps| {
            let (_, [name, value]) = caps.extract();
            (name, value)
        })
        .collect()
}

fn evaluate(
    name: &str,
    args: &HashMap<&str, &str>,
    context: &ExpressionContext<'_>,
) -> Option<String> {
    match name {
        "PATH_PARAMETER" => {
            let key = args.get("key")?;
            Some(
                context
                    .path_parameters
                    .and_then(|params| params.get(*key))
                    .cloned()
                    .unwrap_or_default(),
            )
        }
        "QUERY_STRING" => {
            let query = args.get("query")?;
            Some(context.query.get(*query).cloned().unwrap_or_default())
        }
        "REQUEST_BODY" => Some(context.body.to_string()),
        "RANDOM_UUID" => Some(uuid::Uuid::new_v4().to_string()),
        "RANDOM_INTEGER" => {
            let min = match args.get("min") {
                Some(v) => v.trim().parse().ok()?,
                None => DEFAULT_RANDOM_MIN,
            };
            let max = match args.get("max") {
                Some(v) => v.trim().parse().ok()?,
                None => DEFAULT_RANDOM_MAX,
            };
            if min > max {
                return None;
            }
            Some(rand::thread_rng().gen_range(min..=max).to_string())
        }
        _ => None,
    }
}

/// Expand every expression in `template`.
pub fn render(template: &str, context: &ExpressionContext<'_>) -> String {
    get_expression_regex()
        .replace_all(template, |caps: &Captures| {
            let args = arguments(caps.get(2).map(|m| m.as_str()));
            evaluate(&caps[1], &args, context).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Check if a string contains body expressions.
pub fn has_expressions(s: &str) -> bool {
    get_expression_regex().is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(params: &'a HashMap<String, String>, body: &'a str) -> ExpressionContext<'a> {
        ExpressionContext {
            path_parameters: Some(params),
            query: HashMap::from([("q".to_string(), "shoes".to_string())]),
            body,
        }
    }

    #[test]
    fn test_request_values() {
        let params = HashMap::from([("id".to_string(), "42".to_string())]);
        let ctx = context(&params, "<a/>");
        let rendered = render(
            r#"{"id": "${PATH_PARAMETER(key="id")}", "q": "${QUERY_STRING(query="q")}", "body": "${REQUEST_BODY}"}"#,
            &ctx,
        );
        assert_eq!(rendered, r#"{"id": "42", "q": "shoes", "body": "<a/>"}"#);
    }

    #[test]
    fn test_missing_values_render_empty() {
        let params = HashMap::new();
        let ctx = context(&params, "");
        assert_eq!(render(r#"[${PATH_PARAMETER(key="nope")}]"#, &ctx), "[]");
        assert_eq!(render(r#"[${QUERY_STRING(query="x")}]"#, &ctx), "[]");
    }

    #[test]
    fn test_unknown_expressions_are_kept() {
        let params = HashMap::new();
        let ctx = context(&params, "");
        assert_eq!(render("${NOT_A_THING}", &ctx), "${NOT_A_THING}");
        assert_eq!(render("${PATH_PARAMETER}", &ctx), "${PATH_PARAMETER}");
        assert_eq!(render("${request.path}", &ctx), "${request.path}");
    }

    #[test]
    fn test_random_values() {
        let params = HashMap::new();
        let ctx = context(&params, "");
        for _ in 0..20 {
            let n: i64 = render(r#"${RANDOM_INTEGER(min="3", max="5")}"#, &ctx)
                .parse()
                .unwrap();
            assert!((3..=5).contains(&n));
        }
        let id = render("${RANDOM_UUID}", &ctx);
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        let bad = r#"${RANDOM_INTEGER(min="9", max="1")}"#;
        assert_eq!(render(bad, &ctx), bad);
    }

    #[test]
    fn test_has_expressions() {
        assert!(has_expressions("x ${RANDOM_UUID} y"));
        assert!(!has_expressions("plain body"));
    }
}
