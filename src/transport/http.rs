//! HTTP transport backed by `reqwest::blocking`.
//!
//! Every request runs on its own short-lived thread, so the deadline a
//! [`RemoteCall`](super::RemoteCall) sets when it starts covers only that
//! request's own exchange. The client (and its connection pool) is shared.

use anyhow::{Context, Result};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use super::{CallResult, Method, Request, Response, Transport};
use crate::error::TransportError;

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    debug_enabled: bool,
}

impl HttpTransport {
    /// Build the shared client.
    pub fn new(debug_enabled: bool) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("raillamp/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            debug_enabled,
        })
    }
}

impl Transport for HttpTransport {
    fn begin(&mut self, request: Request) -> Receiver<CallResult> {
        let (reply, receiver) = mpsc::channel();
        let fallback = reply.clone();
        let client = self.client.clone();
        let debug_enabled = self.debug_enabled;

        let spawned = thread::Builder::new()
            .name("raillamp-http".to_string())
            .spawn(move || {
                if debug_enabled {
                    log_debug!("HTTP {:?} {}", request.method, request.url);
                }
                let _ = reply.send(execute(&client, request));
            });

        if let Err(e) = spawned {
            let _ = fallback.send(Err(TransportError::Http(format!(
                "failed to start request thread: {e}"
            ))));
        }

        receiver
    }
}

fn execute(client: &reqwest::blocking::Client, request: Request) -> CallResult {
    let mut builder = match request.method {
        Method::Get => client.get(&request.url),
        Method::Post => client.post(&request.url),
    }
    .timeout(request.timeout);

    if let Some(token) = &request.bearer {
        builder = builder.bearer_auth(token);
    }
    if let Some(body) = request.body {
        builder = builder
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
    }

    let response = builder.send().map_err(classify)?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    let body = response.text().map_err(classify)?;
    Ok(Response {
        status: status.as_u16(),
        body,
    })
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Http(error.to_string())
    }
}
