//! SOAP envelope inspection.

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

/// Qualified name of the element an operation is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyElement {
    pub local_name: String,
    pub namespace: Option<String>,
}

fn first_child_element<'d>(element: Element<'d>) -> Option<Element<'d>> {
    element.children().into_iter().find_map(|child| match child {
        ChildOfElement::Element(e) => Some(e),
        _ => None,
    })
}

fn child_named<'d>(element: Element<'d>, local_name: &str) -> Option<Element<'d>> {
    element.children().into_iter().find_map(|child| match child {
        ChildOfElement::Element(e) if e.name().local_part() == local_name => Some(e),
        _ => None,
    })
}

/// The first element inside the SOAP `Body`.
///
/// Bodies that are not wrapped in an envelope are accepted as-is and their
/// document element is used. Returns `None` for unparsable XML or an empty body.
pub fn body_root_element(xml: &str) -> Option<BodyElement> {
    let package = parser::parse(xml).ok()?;
    let document = package.as_document();
    let root = document
        .root()
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfRoot::Element(e) => Some(e),
            _ => None,
        })?;

    let payload = if root.name().local_part() == "Envelope" {
        let body = child_named(root, "Body")?;
        first_child_element(body)?
    } else {
        root
    };

    let name = payload.name();
    Some(BodyElement {
        local_name: name.local_part().to_string(),
        namespace: name.namespace_uri().map(str::to_string),
    })
}

/// Extract the SOAP action from `SOAPAction` or, for SOAP 1.2, the
/// `action` parameter of `Content-Type`. Surrounding quotes are removed.
pub fn soap_action<'a>(
    soap_action_header: Option<&'a str>,
    content_type: Option<&'a str>,
) -> Option<&'a str> {
    let from_header = soap_action_header.map(trim_quotes);
    let from_content_type = || {
        content_type?.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("action")
                .then(|| trim_quotes(value))
        })
    };
    from_header
        .or_else(from_content_type)
        .filter(|action| !action.is_empty())
}

fn trim_quotes(value: &str) -> &str {
    value.trim().trim_matches('"')
}
