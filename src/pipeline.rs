//! Request lifecycle: the five stages the gateway runs for one request.
//!
//! 1. **Gate**: claim the request by content type
//! 2. **Deserialize**: repackage GET/POST data into an [`Envelope`]
//! 3. **Handle**: resolve service, method and arguments; maybe call
//! 4. **Exception**: turn a raised call into an HTML fragment (only on error)
//! 5. **Serialize**: render the page
//!
//! Stages share nothing but the [`RequestContext`] held by the controller.

use crate::caller::{CallError, ServiceCaller};
use crate::decode;
use crate::directory::ServiceDirectory;
use crate::model::{CallOutcome, Envelope, ParamsGiven, Payload, RequestContext};
use crate::render::{self, html_escape, Templates};
use serde_json::Value;
use std::collections::BTreeMap;

/// Content type of an HTML form submission.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Content type forced onto responses of claimed requests.
pub const HTML_CONTENT_TYPE: &str = "text/html";

pub const SERVICE_NAME_KEY: &str = "serviceName";
pub const METHOD_NAME_KEY: &str = "methodName";
pub const NO_PARAMS_KEY: &str = "noParams";

/// Response headers, keyed by header name.
pub type Headers = BTreeMap<String, String>;

/// Stage 1: true if the browser handles requests of `content_type`.
pub fn content_type_gate(content_type: &str) -> bool {
    content_type.is_empty() || content_type == FORM_CONTENT_TYPE
}

/// Force an HTML content type onto `headers` when the request was claimed.
/// Returns whether the overlay was applied.
pub fn filter_headers(headers: &mut Headers, content_type: &str) -> bool {
    if !content_type_gate(content_type) {
        return false;
    }
    headers.insert("Content-Type".to_string(), HTML_CONTENT_TYPE.to_string());
    true
}

/// Stage 2: package request data without interpreting it.
pub fn deserialize(
    get: Vec<(String, String)>,
    post: Vec<(String, String)>,
    _raw_body: &str,
) -> Envelope {
    Envelope { get, post }
}

/// Owns the request state and runs stages 3–5 against it.
#[derive(Debug, Default)]
pub struct PipelineController {
    ctx: RequestContext,
}

impl PipelineController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Stage 3: resolve the call from `envelope` and perform it when service,
    /// method and an argument list are all known.
    ///
    /// Returns `Ok(None)` when no call is made. A raised call is recorded and
    /// handed back for the exception stage.
    pub fn handle_request(
        &mut self,
        envelope: &Envelope,
        caller: &dyn ServiceCaller,
    ) -> Result<Option<Value>, CallError> {
        // An empty name counts as absent.
        if let Some(service) = envelope.get_param(SERVICE_NAME_KEY).filter(|s| !s.is_empty()) {
            self.ctx.service_name = Some(service.to_string());
        }
        if let Some(method) = envelope.get_param(METHOD_NAME_KEY).filter(|m| !m.is_empty()) {
            self.ctx.method_name = Some(method.to_string());
        }

        if !envelope.post.is_empty() {
            self.ctx.raw_parameters.clear();
            self.ctx.decoded_parameters.clear();
            for (key, value) in &envelope.post {
                self.ctx.raw_parameters.insert(key.clone(), value.clone());
            }
            // Decode after collecting so a repeated field name keeps one
            // position and stays aligned with `raw_parameters`.
            self.ctx.decoded_parameters = self
                .ctx
                .raw_parameters
                .values()
                .map(|raw| decode::decode(raw))
                .collect();
            self.ctx.params_given = ParamsGiven::Fields;
        } else if envelope.has_get_flag(NO_PARAMS_KEY) {
            self.ctx.raw_parameters.clear();
            self.ctx.decoded_parameters.clear();
            self.ctx.params_given = ParamsGiven::NoArgs;
        }

        let (Some(service), Some(method)) =
            (self.ctx.service_name.clone(), self.ctx.method_name.clone())
        else {
            return Ok(self.skip_call());
        };
        if !self.ctx.params_given.is_determined() {
            return Ok(self.skip_call());
        }

        tracing::debug!(
            service = %service,
            method = %method,
            args = self.ctx.decoded_parameters.len(),
            "invoking service"
        );
        self.ctx.show_result = true;
        match caller.invoke(&service, &method, &self.ctx.decoded_parameters) {
            Ok(value) => {
                self.ctx.result_or_error = Some(CallOutcome::Returned(value.clone()));
                Ok(Some(value))
            }
            Err(err) => {
                self.ctx.result_or_error = Some(CallOutcome::Raised(err.clone()));
                Err(err)
            }
        }
    }

    fn skip_call(&mut self) -> Option<Value> {
        tracing::debug!(
            service = ?self.ctx.service_name,
            method = ?self.ctx.method_name,
            params = ?self.ctx.params_given,
            "not enough information to call"
        );
        self.ctx.show_result = false;
        self.ctx.result_or_error = None;
        None
    }

    /// Stage 4: describe `err` as an HTML fragment. Never fails.
    pub fn handle_exception(&mut self, err: &CallError) -> String {
        let mut out = String::from("Exception thrown\n<br>");
        out.push_str(&format!("message : {}\n<br>", html_escape(&err.message)));
        out.push_str(&format!("code : {}\n<br>", err.code));
        out.push_str(&format!(
            "file : {}\n<br>",
            html_escape(err.file.as_deref().unwrap_or(""))
        ));
        out.push_str(&format!(
            "line : {}\n<br>",
            err.line.map(|l| l.to_string()).unwrap_or_default()
        ));
        self.ctx.show_result = true;
        if self.ctx.result_or_error.is_none() {
            self.ctx.result_or_error = Some(CallOutcome::Raised(err.clone()));
        }
        out
    }

    /// Stage 5: render the page for everything accumulated so far.
    pub fn serialize(
        &self,
        payload: &Payload,
        directory: &dyn ServiceDirectory,
        templates: &Templates,
    ) -> String {
        render::render_page(&self.ctx, payload, directory, templates)
    }
}
