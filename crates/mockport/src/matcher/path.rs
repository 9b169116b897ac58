//! Mock URL layout and REST URI templates.
//!
//! ```text
//! {context}/mock/soap/project/{projectId}/{portUri}
//! {context}/mock/rest/project/{projectId}/application/{applicationId}/{resourcePath}
//! ```

use crate::model::ProjectKind;
use std::collections::HashMap;

/// Where a mock URL points, before any store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTarget {
    Soap {
        project_id: String,
        port_uri: String,
    },
    Rest {
        project_id: String,
        application_id: String,
        resource_path: String,
    },
}

impl MockTarget {
    pub fn protocol(&self) -> ProjectKind {
        match self {
            MockTarget::Soap { .. } => ProjectKind::Soap,
            MockTarget::Rest { .. } => ProjectKind::Rest,
        }
    }
}

/// Segments of `path` between its optional leading and trailing slash.
/// `None` when an inner segment is empty, as in `/orders//42`.
fn segments(path: &str) -> Option<Vec<&str>> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Some(Vec::new());
    }
    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

/// Split a request path into its mock target. Returns `None` for paths
/// outside the mock layout and for paths with empty segments.
pub fn parse_mock_path(context_path: &str, path: &str) -> Option<MockTarget> {
    let context = context_path.trim_end_matches('/');
    let rest = if context.is_empty() {
        path
    } else {
        let stripped = path.strip_prefix(context)?;
        if !stripped.is_empty() && !stripped.starts_with('/') {
            return None;
        }
        stripped
    };

    match segments(rest)?.as_slice() {
        ["mock", "soap", "project", project_id, port @ ..] if !port.is_empty() => {
            Some(MockTarget::Soap {
                project_id: project_id.to_string(),
                port_uri: port.join("/"),
            })
        }
        ["mock", "rest", "project", project_id, "application", application_id, resource @ ..] => {
            Some(MockTarget::Rest {
                project_id: project_id.to_string(),
                application_id: application_id.to_string(),
                resource_path: format!("/{}", resource.join("/")),
            })
        }
        _ => None,
    }
}

/// Outcome of matching a path against a URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch {
    /// Number of literal (non-wildcard) segments; more means more specific.
    pub literal_segments: usize,
    pub path_parameters: HashMap<String, String>,
}

fn wildcard_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

/// Match `path` against a template such as `/orders/{id}`.
///
/// Segments compare case-sensitively; a `{name}` segment matches any single
/// non-empty segment and captures its percent-decoded value.
pub fn match_uri_template(template: &str, path: &str) -> Option<TemplateMatch> {
    let template_segments = segments(template)?;
    let path_segments = segments(path)?;
    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut literal_segments = 0;
    let mut path_parameters = HashMap::new();
    for (expected, actual) in template_segments.iter().zip(&path_segments) {
        match wildcard_name(expected) {
            Some(name) => {
                let value = urlencoding::decode(actual)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| actual.to_string());
                path_parameters.insert(name.to_string(), value);
            }
            None if expected == actual => literal_segments += 1,
            None => return None,
        }
    }

    Some(TemplateMatch {
        literal_segments,
        path_parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_soap_path() {
        assert_eq!(
            parse_mock_path("", "/mock/soap/project/p1/weather"),
            Some(MockTarget::Soap {
                project_id: "p1".to_string(),
                port_uri: "weather".to_string(),
            })
        );
        assert_eq!(parse_mock_path("", "/mock/soap/project/p1"), None);
    }

    #[test]
    fn test_parse_rest_path_with_context() {
        assert_eq!(
            parse_mock_path("/mockport/", "/mockport/mock/rest/project/p/application/a/orders/42"),
            Some(MockTarget::Rest {
                project_id: "p".to_string(),
                application_id: "a".to_string(),
                resource_path: "/orders/42".to_string(),
            })
        );
        assert_eq!(
            parse_mock_path("/mockport", "/other/mock/rest/project/p/application/a/x"),
            None
        );
        assert_eq!(
            parse_mock_path("/mockport", "/mockportx/mock/rest/project/p/application/a/x"),
            None
        );
    }

    #[test]
    fn test_parse_rest_root_resource() {
        assert_eq!(
            parse_mock_path("", "/mock/rest/project/p/application/a"),
            Some(MockTarget::Rest {
                project_id: "p".to_string(),
                application_id: "a".to_string(),
                resource_path: "/".to_string(),
            })
        );
    }

    #[test]
    fn test_template_matches_single_segment_wildcard() {
        let m = match_uri_template("/orders/{id}", "/orders/42").unwrap();
        assert_eq!(m.literal_segments, 1);
        assert_eq!(m.path_parameters.get("id").unwrap(), "42");

        assert!(match_uri_template("/orders/{id}/items", "/orders/42").is_none());
        assert!(match_uri_template("/orders/{id}", "/orders/42/items").is_none());
    }

    #[test]
    fn test_template_is_case_sensitive() {
        assert!(match_uri_template("/Orders/{id}", "/orders/42").is_none());
        assert!(match_uri_template("/orders", "/orders/").is_some());
    }

    #[test]
    fn test_empty_segments_never_match() {
        assert!(match_uri_template("/orders/{id}", "/orders//42").is_none());
        assert!(match_uri_template("/orders/{id}", "/orders//").is_none());
        assert!(match_uri_template("/orders/{id}/items", "/orders//items").is_none());
        assert!(match_uri_template("/orders/{id}", "/orders/42/").is_some());
        assert_eq!(
            parse_mock_path("", "/mock/rest/project/p/application/a/orders//42"),
            None
        );
        assert_eq!(parse_mock_path("", "/mock//soap/project/p/weather"), None);
    }

    #[test]
    fn test_template_decodes_parameters() {
        let m = match_uri_template("/users/{name}", "/users/John%20Doe").unwrap();
        assert_eq!(m.path_parameters.get("name").unwrap(), "John Doe");
    }
}
