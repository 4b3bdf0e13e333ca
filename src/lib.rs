//! svcbrowse: an HTML service browser for a remote-procedure gateway.
//!
//! Lists the services a gateway exposes, shows the documentation of a chosen
//! method, builds an argument form for it, calls it and renders the result or
//! the raised exception. Meant for development, not for production use.

pub mod caller;
pub mod decode;
pub mod directory;
pub mod docblock;
pub mod error;
pub mod gateway;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod render;

pub use caller::{CallError, DisabledCaller, ProcessCaller, ServiceCaller};
pub use directory::{FsServiceDirectory, ServiceDirectory};
pub use error::{BrowserError, Result};
pub use gateway::{Gateway, InboundRequest, Response};
pub use pipeline::PipelineController;
pub use render::Templates;
