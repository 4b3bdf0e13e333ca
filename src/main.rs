//! svcbrowse: render one service browser page for a single request.
//!
//! The request is described on the command line (content type, query string,
//! form body); the page is written to stdout:
//!
//! `svcbrowse -s services/ --caller ./call.sh -q 'serviceName=Math&methodName=add' -b 'a=1&b=2'`

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use svcbrowse::{
    DisabledCaller, FsServiceDirectory, Gateway, InboundRequest, ProcessCaller, ServiceCaller,
    Templates,
};

#[derive(Parser)]
#[command(
    name = "svcbrowse",
    about = "Browse, document and call gateway services from an HTML page"
)]
struct Cli {
    /// Folder scanned for service manifests (repeatable)
    #[arg(short = 's', long = "services")]
    services: Vec<PathBuf>,

    /// Register a service manifest explicitly: NAME=PATH (repeatable)
    #[arg(short = 'r', long = "register")]
    register: Vec<String>,

    /// File extension of service manifests
    #[arg(long, default_value = "json")]
    extension: String,

    /// Directory containing Top.html and Bottom.html
    #[arg(short = 't', long)]
    templates: Option<PathBuf>,

    /// Program that performs service calls: PROGRAM [ARGS..] <service> <method>,
    /// arguments as a JSON array on stdin
    #[arg(long)]
    caller: Option<PathBuf>,

    /// Extra argument passed to the caller before service and method (repeatable)
    #[arg(long = "caller-arg", allow_hyphen_values = true)]
    caller_args: Vec<String>,

    /// Seconds to wait for one service call before it is killed
    #[arg(long = "caller-timeout", default_value_t = 30)]
    caller_timeout: u64,

    /// Declared content type of the request
    #[arg(short = 'c', long = "content-type", default_value = "")]
    content_type: String,

    /// Query string, e.g. "serviceName=Math&methodName=add"
    #[arg(short = 'q', long, default_value = "")]
    query: String,

    /// URL-encoded form body holding the call arguments
    #[arg(short = 'b', long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the form body from a file
    #[arg(long = "body-file")]
    body_file: Option<PathBuf>,

    /// Print response headers before the page
    #[arg(long)]
    headers: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut directory = FsServiceDirectory::new(cli.services.clone(), cli.extension.clone());
    for entry in &cli.register {
        let (name, path) = parse_registration(entry)?;
        directory.register(name, path);
    }

    let templates = cli
        .templates
        .as_deref()
        .map(Templates::load)
        .unwrap_or_default();

    let caller: Box<dyn ServiceCaller> = match cli.caller {
        Some(ref program) => Box::new(
            ProcessCaller::new(program.clone(), cli.caller_args.clone())
                .with_timeout(Duration::from_secs(cli.caller_timeout)),
        ),
        None => Box::new(DisabledCaller),
    };

    let body = match (&cli.body, &cli.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read body file: {}", path.display()))?,
        (None, None) => String::new(),
    };
    let request = InboundRequest::from_encoded(&cli.content_type, &cli.query, &body);

    let gateway = Gateway::new(Box::new(directory), caller, templates);
    let Some(response) = gateway.handle(&request) else {
        bail!(
            "content type not handled by the service browser: {}",
            cli.content_type
        );
    };

    let mut output = String::new();
    if cli.headers {
        for (name, value) in &response.headers {
            output.push_str(&format!("{}: {}\n", name, value));
        }
        output.push('\n');
    }
    output.push_str(&response.body);
    print!("{}", output);
    Ok(())
}

/// Split a `NAME=PATH` registration.
fn parse_registration(entry: &str) -> Result<(String, PathBuf)> {
    match entry.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => bail!("invalid --register value (expected NAME=PATH): {}", entry),
    }
}
