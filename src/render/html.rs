//! HTML page for the service browser.
//!
//! Layout, top to bottom: service list, method list of the selected service,
//! documentation and call form of the selected method, result of the call.

use crate::directory::ServiceDirectory;
use crate::docblock;
use crate::error::BrowserError;
use crate::model::*;
use crate::pipeline::{METHOD_NAME_KEY, NO_PARAMS_KEY, SERVICE_NAME_KEY};
use crate::query::encode_component;
use crate::render::{html_escape, Templates};
use serde_json::Value;

const UNKNOWN_TYPE: &str = "Unknown";
const INCONSISTENT_PARAM: &str =
    "Warning: Parameter description in method and comments are not consistent";
const MISSING_RETURN: &str = "Warning: Missing return object description in comments";

/// Build the full page from the request state and the call payload.
pub fn render_page(
    ctx: &RequestContext,
    payload: &Payload,
    directory: &dyn ServiceDirectory,
    templates: &Templates,
) -> String {
    let mut out = String::new();
    out.push_str(&templates.top);

    // Services
    out.push_str("<h3>Available Services</h3>\n<ul>");
    for name in directory.list_available_service_names() {
        out.push_str(&format!(
            "\n     <li><a href=\"{}\">{}</a></li>",
            html_escape(&service_link(&name)),
            html_escape(&name)
        ));
    }
    out.push_str("\n</ul>\n");

    let service = ctx.service_name.as_deref().filter(|name| !name.is_empty()).map(|name| {
        let object = directory.service_object(name);
        if let Err(ref e) = object {
            tracing::warn!(service = name, error = %e, "service lookup failed");
        }
        (name, object)
    });

    // Methods of the selected service
    if let Some((name, ref object)) = service {
        match object {
            Ok(object) => out.push_str(&render_method_list(name, object)),
            Err(e) => out.push_str(&notice(&e.to_string())),
        }
    }

    // Selected method
    if let Some(method) = ctx.method_name.as_deref().filter(|name| !name.is_empty()) {
        match service {
            Some((name, Ok(ref object))) => match object.method(method) {
                Some(info) => out.push_str(&render_method(ctx, name, info)),
                None => {
                    let e = BrowserError::UnknownMethod {
                        service: name.to_string(),
                        method: method.to_string(),
                    };
                    out.push_str(&notice(&e.to_string()));
                }
            },
            // The lookup failure was already reported above.
            Some((_, Err(_))) => {}
            None => out.push_str(&notice(&format!(
                "method {} requested without a service",
                method
            ))),
        }
    }

    // Result
    if ctx.show_result {
        out.push_str("<h3>Result</h3>\n<pre>");
        out.push_str(&render_payload(payload));
        out.push_str("</pre>\n");
    }

    out.push_str(&templates.bottom);
    out
}

fn render_method_list(service: &str, object: &ServiceObject) -> String {
    let mut out = format!(
        "<h3>Click below to use a method on the {} service</h3>\n<ul>",
        html_escape(service)
    );
    for method in &object.methods {
        out.push_str(&format!(
            "\n     <li><a href=\"{}\">{}</a></li>",
            html_escape(&method_link(service, &method.name)),
            html_escape(&method.name)
        ));
    }
    out.push_str("\n</ul>\n");
    out
}

fn render_method(ctx: &RequestContext, service: &str, method: &MethodInfo) -> String {
    let doc = method
        .doc
        .as_deref()
        .and_then(docblock::parse)
        .unwrap_or_default();
    let mut out = String::new();

    out.push_str("<h3>Method Description</h3>\n");
    for paragraph in &doc.description {
        out.push_str(&format!("<p>{}</p>\n", html_escape(paragraph)));
    }

    out.push_str("<h3>Method Return Type</h3>\n");
    match doc.return_type {
        Some(ref ty) => out.push_str(&format!("<p>Return Type: {}</p>\n", html_escape(ty))),
        None => out.push_str(&format!("<p>{}</p>\n", MISSING_RETURN)),
    }

    if method.params.is_empty() {
        out.push_str("<h3>This method has no parameters. Click to call it.</h3>\n");
        let action = format!("{}&{}", method_link(service, &method.name), NO_PARAMS_KEY);
        out.push_str(&format!(
            "<form action=\"{}\" method=\"POST\">\n",
            html_escape(&action)
        ));
        out.push_str("<input type=\"submit\" value=\"call\"></form>\n");
        return out;
    }

    out.push_str(&format!(
        "<h3>Fill in the parameters below then click to call the {} method on {} service</h3>\n",
        html_escape(&method.name),
        html_escape(service)
    ));
    out.push_str(&format!(
        "<form action=\"{}\" method=\"POST\">\n<table>",
        html_escape(&method_link(service, &method.name))
    ));
    for param in &method.params {
        out.push_str(&render_param_row(ctx, &doc, param));
    }
    out.push_str("\n</table>\n<input type=\"submit\" value=\"call\"></form>\n");
    out
}

fn render_param_row(ctx: &RequestContext, doc: &DocBlockInfo, param: &str) -> String {
    let (type_cell, status) = match doc.param_type(param) {
        Some(ParamDoc {
            type_name,
            description: Some(text),
            ..
        }) => (
            format!("<td title=\"{}\">{}</td>", html_escape(text), html_escape(type_name)),
            "",
        ),
        Some(found) => (format!("<td>{}</td>", html_escape(&found.type_name)), ""),
        None => (format!("<td>{}</td>", UNKNOWN_TYPE), INCONSISTENT_PARAM),
    };

    let value = ctx
        .raw_parameters
        .get(param)
        .map(|raw| format!(" value=\"{}\"", html_escape(raw)))
        .unwrap_or_default();

    format!(
        "\n     <tr>{}<td>{}</td><td><input name=\"{}\"{}></td><td>{}</td></tr>",
        type_cell,
        html_escape(param),
        html_escape(param),
        value,
        status
    )
}

fn render_payload(payload: &Payload) -> String {
    match payload {
        Payload::Nothing => String::new(),
        Payload::Exception(fragment) => fragment.clone(),
        Payload::Result(Value::String(text)) => html_escape(text),
        Payload::Result(value) => {
            let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            html_escape(&text)
        }
    }
}

fn notice(message: &str) -> String {
    format!("<p class=\"warning\">{}</p>\n", html_escape(message))
}

fn service_link(service: &str) -> String {
    format!("?{}={}", SERVICE_NAME_KEY, encode_component(service))
}

fn method_link(service: &str, method: &str) -> String {
    format!(
        "{}&{}={}",
        service_link(service),
        METHOD_NAME_KEY,
        encode_component(method)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use indexmap::IndexSet;
    use serde_json::json;

    struct StaticDirectory {
        services: Vec<(&'static str, ServiceObject)>,
    }

    impl ServiceDirectory for StaticDirectory {
        fn list_available_service_names(&self) -> IndexSet<String> {
            self.services.iter().map(|(n, _)| n.to_string()).collect()
        }

        fn service_object(&self, name: &str) -> Result<ServiceObject> {
            self.services
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, o)| o.clone())
                .ok_or_else(|| BrowserError::UnknownService(name.to_string()))
        }
    }

    fn directory() -> StaticDirectory {
        let math = ServiceObject {
            methods: vec![
                MethodInfo {
                    name: "add".into(),
                    params: vec!["a".into(), "b".into()],
                    doc: Some(
                        "/**\n * Adds two numbers.\n * @param int $a left side\n * @return int\n */"
                            .into(),
                    ),
                },
                MethodInfo {
                    name: "pi".into(),
                    params: Vec::new(),
                    doc: None,
                },
            ],
        };
        StaticDirectory {
            services: vec![("Math", math), ("Echo", ServiceObject::default())],
        }
    }

    fn ctx(service: Option<&str>, method: Option<&str>) -> RequestContext {
        RequestContext {
            service_name: service.map(str::to_string),
            method_name: method.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn lists_services_between_templates() {
        let templates = Templates {
            top: "<body>".into(),
            bottom: "</body>".into(),
        };
        let page = render_page(&ctx(None, None), &Payload::Nothing, &directory(), &templates);
        assert!(page.starts_with("<body><h3>Available Services</h3>"));
        assert!(page.ends_with("</body>"));
        assert!(page.contains("<li><a href=\"?serviceName=Math\">Math</a></li>"));
        assert!(page.contains("<li><a href=\"?serviceName=Echo\">Echo</a></li>"));
        assert!(!page.contains("Click below"));
        assert!(!page.contains("<h3>Result</h3>"));
    }

    #[test]
    fn lists_methods_of_selected_service() {
        let page = render_page(
            &ctx(Some("Math"), None),
            &Payload::Nothing,
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains("<h3>Click below to use a method on the Math service</h3>"));
        assert!(page.contains("<a href=\"?serviceName=Math&amp;methodName=add\">add</a>"));
        assert!(page.contains("<a href=\"?serviceName=Math&amp;methodName=pi\">pi</a>"));
        assert!(!page.contains("Method Description"));
    }

    #[test]
    fn method_form_with_doc_types() {
        let page = render_page(
            &ctx(Some("Math"), Some("add")),
            &Payload::Nothing,
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains("<p>Adds two numbers.</p>"));
        assert!(page.contains("<p>Return Type: int</p>"));
        assert!(page.contains("<form action=\"?serviceName=Math&amp;methodName=add\" method=\"POST\">"));
        assert!(page.contains("<tr><td title=\"left side\">int</td><td>a</td><td><input name=\"a\"></td><td></td></tr>"));
        // `b` has no @param tag
        assert!(page.contains(&format!(
            "<tr><td>Unknown</td><td>b</td><td><input name=\"b\"></td><td>{}</td></tr>",
            INCONSISTENT_PARAM
        )));
    }

    #[test]
    fn zero_parameter_method_gets_one_click_form() {
        let page = render_page(
            &ctx(Some("Math"), Some("pi")),
            &Payload::Nothing,
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains("This method has no parameters."));
        assert!(page.contains("action=\"?serviceName=Math&amp;methodName=pi&amp;noParams\""));
        assert!(page.contains(MISSING_RETURN));
    }

    #[test]
    fn inputs_are_refilled_after_a_call() {
        let mut context = ctx(Some("Math"), Some("add"));
        context.raw_parameters.insert("a".into(), "\"<1>\"".into());
        context.show_result = true;
        let page = render_page(
            &context,
            &Payload::Result(json!(3)),
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains("<input name=\"a\" value=\"&quot;&lt;1&gt;&quot;\">"));
        assert!(page.contains("<input name=\"b\">"));
        assert!(page.contains("<h3>Result</h3>\n<pre>3</pre>"));
    }

    #[test]
    fn structured_result_is_pretty_printed() {
        let mut context = ctx(Some("Math"), Some("pi"));
        context.show_result = true;
        let page = render_page(
            &context,
            &Payload::Result(json!({"value": 3.14})),
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains("<pre>{\n  &quot;value&quot;: 3.14\n}</pre>"));
    }

    #[test]
    fn exception_fragment_is_inserted_verbatim() {
        let mut context = ctx(Some("Math"), Some("pi"));
        context.show_result = true;
        let fragment = "Exception thrown\n<br>message : boom\n<br>".to_string();
        let page = render_page(
            &context,
            &Payload::Exception(fragment.clone()),
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains(&format!("<pre>{}</pre>", fragment)));
    }

    #[test]
    fn unknown_service_renders_notice() {
        let page = render_page(
            &ctx(Some("Nope"), Some("x")),
            &Payload::Nothing,
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains("<p class=\"warning\">unknown service: Nope</p>"));
        assert!(page.contains("<h3>Available Services</h3>"));
    }

    #[test]
    fn empty_names_render_plain_listing() {
        let page = render_page(
            &ctx(Some(""), Some("")),
            &Payload::Nothing,
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains("<h3>Available Services</h3>"));
        assert!(!page.contains("class=\"warning\""));
        assert!(!page.contains("Click below"));
        assert!(!page.contains("Method Description"));
    }

    #[test]
    fn unknown_method_renders_notice() {
        let page = render_page(
            &ctx(Some("Math"), Some("mul")),
            &Payload::Nothing,
            &directory(),
            &Templates::default(),
        );
        assert!(page.contains("<p class=\"warning\">service Math has no method mul</p>"));
    }

    #[test]
    fn names_are_escaped_and_encoded() {
        let dir = StaticDirectory {
            services: vec![("A&B <x>", ServiceObject::default())],
        };
        let page = render_page(&ctx(None, None), &Payload::Nothing, &dir, &Templates::default());
        assert!(page.contains("<a href=\"?serviceName=A%26B%20%3Cx%3E\">A&amp;B &lt;x&gt;</a>"));
    }
}
