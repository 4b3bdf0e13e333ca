//! Data model shared by the pipeline stages and the page renderer.

use crate::caller::CallError;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Whether the request supplied an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamsGiven {
    /// Neither a form body nor `noParams` was seen.
    #[default]
    Undetermined,
    /// `noParams` flag: call with an empty argument list.
    NoArgs,
    /// Arguments were taken from the submitted form fields.
    Fields,
}

impl ParamsGiven {
    pub fn is_determined(self) -> bool {
        self != ParamsGiven::Undetermined
    }
}

/// What the call stage produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Returned(Value),
    Raised(CallError),
}

/// Request-scoped state threaded through the five stages.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub service_name: Option<String>,
    pub method_name: Option<String>,
    /// Submitted form values keyed by field name, in submission order.
    pub raw_parameters: IndexMap<String, String>,
    /// Decoded arguments, positionally aligned with `raw_parameters`.
    pub decoded_parameters: Vec<Value>,
    pub params_given: ParamsGiven,
    pub show_result: bool,
    pub result_or_error: Option<CallOutcome>,
}

/// GET and POST data repackaged by the deserialize stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub get: Vec<(String, String)>,
    pub post: Vec<(String, String)>,
}

impl Envelope {
    /// GET value for `key`, if present. A repeated key keeps its last value.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.get
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_get_flag(&self, key: &str) -> bool {
        self.get.iter().any(|(k, _)| k == key)
    }
}

/// Data handed to the serialize stage.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// No call was made.
    #[default]
    Nothing,
    /// Return value of a successful call.
    Result(Value),
    /// HTML fragment built by the exception stage.
    Exception(String),
}

/// Structured metadata extracted from one method doc comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlockInfo {
    /// One entry per description paragraph.
    pub description: Vec<String>,
    /// `@param` tags in source order.
    pub params: Vec<ParamDoc>,
    /// Type token of the last `@return` tag.
    pub return_type: Option<String>,
}

impl DocBlockInfo {
    /// Type documented for parameter `name`; the last matching tag wins.
    pub fn param_type(&self, name: &str) -> Option<&ParamDoc> {
        self.params
            .iter()
            .rev()
            .find(|p| p.name.as_deref() == Some(name))
    }
}

/// Parsed `@param` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDoc {
    /// Parameter name with the `$` sigil removed, when the tag names one.
    pub name: Option<String>,
    pub type_name: String,
    /// Free text following the name.
    pub description: Option<String>,
}

/// Callable surface of one service, as reported by a [`ServiceDirectory`].
///
/// [`ServiceDirectory`]: crate::directory::ServiceDirectory
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServiceObject {
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl ServiceObject {
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A public method and its raw doc comment.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    /// Declared parameter names, in call order.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
}
