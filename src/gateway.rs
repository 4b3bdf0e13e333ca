//! Wires the stages together for one request.
//!
//! [`Gateway`] names the handler for every stage (directory, caller and
//! templates are supplied by the embedder) and runs them in the fixed order
//! gate → deserialize → handle → exception → serialize.

use crate::caller::ServiceCaller;
use crate::directory::ServiceDirectory;
use crate::model::Payload;
use crate::pipeline::{self, Headers, PipelineController};
use crate::query;
use crate::render::Templates;

/// One inbound HTTP-style request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    pub content_type: String,
    /// Query parameters in order; flags carry an empty value.
    pub query: Vec<(String, String)>,
    /// Form fields in submission order.
    pub post: Vec<(String, String)>,
    pub raw_body: String,
}

impl InboundRequest {
    /// Build a request from a raw query string and a url-encoded body.
    pub fn from_encoded(content_type: &str, query_string: &str, body: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            query: query::parse_pairs(query_string),
            post: query::parse_pairs(body),
            raw_body: body.to_string(),
        }
    }
}

/// Response produced for a claimed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub headers: Headers,
    pub body: String,
}

pub struct Gateway {
    directory: Box<dyn ServiceDirectory>,
    caller: Box<dyn ServiceCaller>,
    templates: Templates,
}

impl Gateway {
    pub fn new(
        directory: Box<dyn ServiceDirectory>,
        caller: Box<dyn ServiceCaller>,
        templates: Templates,
    ) -> Self {
        Self {
            directory,
            caller,
            templates,
        }
    }

    /// Run every stage for `request`. Returns `None` when the content type is
    /// left to another handler.
    pub fn handle(&self, request: &InboundRequest) -> Option<Response> {
        if !pipeline::content_type_gate(&request.content_type) {
            tracing::debug!(content_type = %request.content_type, "request not claimed");
            return None;
        }

        let envelope = pipeline::deserialize(
            request.query.clone(),
            request.post.clone(),
            &request.raw_body,
        );

        let mut controller = PipelineController::new();
        let payload = match controller.handle_request(&envelope, self.caller.as_ref()) {
            Ok(Some(value)) => Payload::Result(value),
            Ok(None) => Payload::Nothing,
            Err(e) => {
                tracing::debug!(error = %e, "service call raised");
                Payload::Exception(controller.handle_exception(&e))
            }
        };

        let body = controller.serialize(&payload, self.directory.as_ref(), &self.templates);
        let mut headers = Headers::new();
        pipeline::filter_headers(&mut headers, &request.content_type);
        Some(Response { headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::CallError;
    use crate::directory::FsServiceDirectory;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    /// Sums numeric arguments; `fail` always raises.
    struct Adder;

    impl ServiceCaller for Adder {
        fn invoke(&self, _service: &str, method: &str, args: &[Value]) -> Result<Value, CallError> {
            if method == "fail" {
                return Err(CallError::new("always fails", 13).at("Adder.rs", Some(1)));
            }
            Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>()))
        }
    }

    fn gateway(dir: &TempDir) -> Gateway {
        fs::write(
            dir.path().join("Math.json"),
            r#"{"methods":[
                {"name":"add","params":["a","b"],"doc":"/**\n * @param int $a\n * @param int $b\n * @return int\n */"},
                {"name":"fail"}
            ]}"#,
        )
        .unwrap();
        let directory = FsServiceDirectory::new(vec![dir.path().to_path_buf()], "json");
        Gateway::new(Box::new(directory), Box::new(Adder), Templates::default())
    }

    #[test]
    fn unclaimed_content_type_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let request = InboundRequest::from_encoded("application/x-amf", "", "");
        assert!(gateway(&dir).handle(&request).is_none());
    }

    #[test]
    fn claimed_request_gets_html_header() {
        let dir = TempDir::new().unwrap();
        let response = gateway(&dir)
            .handle(&InboundRequest::default())
            .unwrap();
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("text/html")
        );
        assert!(response.body.contains("?serviceName=Math"));
        assert!(!response.body.contains("<h3>Result</h3>"));
    }

    #[test]
    fn form_submission_calls_and_renders_result() {
        let dir = TempDir::new().unwrap();
        let request = InboundRequest::from_encoded(
            "application/x-www-form-urlencoded",
            "serviceName=Math&methodName=add",
            "a=2&b=40",
        );
        let body = gateway(&dir).handle(&request).unwrap().body;
        assert!(body.contains("<h3>Result</h3>\n<pre>42</pre>"));
        assert!(body.contains("<input name=\"a\" value=\"2\">"));
    }

    #[test]
    fn raised_call_renders_exception() {
        let dir = TempDir::new().unwrap();
        let request =
            InboundRequest::from_encoded("", "serviceName=Math&methodName=fail&noParams", "");
        let body = gateway(&dir).handle(&request).unwrap().body;
        assert!(body.contains("<pre>Exception thrown\n<br>message : always fails\n<br>code : 13\n<br>file : Adder.rs\n<br>line : 1\n<br></pre>"));
    }
}
