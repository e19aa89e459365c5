//! `ureq`-backed [`Transport`].

use std::io::Read;
use std::time::Duration;

use rtc_core::transport::{Headers, Request, Response, Transport, TransportError};
use tracing::{debug, warn};

/// Upper bound on a response body we are willing to buffer.
const MAX_BODY_BYTES: u64 = 32 * 1024 * 1024;

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .user_agent("rtc-cli")
                .build(),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in request.headers.iter() {
            call = call.set(name, value);
        }
        let result = match &request.body {
            Some(body) => call.send_bytes(body),
            None => call.call(),
        };

        match result {
            Ok(response) => read_response(&request.url, response),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                warn!(method = %request.method, url = %request.url, status, "request rejected");
                Err(TransportError::Status {
                    url: request.url,
                    status,
                    body,
                })
            }
            Err(ureq::Error::Transport(err)) => Err(TransportError::Io {
                url: request.url,
                reason: err.to_string(),
            }),
        }
    }
}

fn read_response(url: &str, response: ureq::Response) -> Result<Response, TransportError> {
    let status = response.status();
    let headers: Headers = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            let value = response.header(&name)?.to_string();
            Some((name, value))
        })
        .collect();

    let body = read_body(url, response.into_reader(), MAX_BODY_BYTES)?;

    debug!(url, status, bytes = body.len(), "received response");
    Ok(Response {
        status,
        headers,
        body,
    })
}

/// Buffer at most `limit` bytes of `reader`. A longer body is an error,
/// never a silently truncated document.
fn read_body(url: &str, reader: impl Read, limit: u64) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|err| TransportError::Io {
            url: url.to_string(),
            reason: format!("failed to read response body: {err}"),
        })?;

    if u64::try_from(body.len()).unwrap_or(u64::MAX) > limit {
        warn!(url, limit, "response body too large");
        return Err(TransportError::Io {
            url: url.to_string(),
            reason: format!("response too large (over {limit} bytes)"),
        });
    }
    Ok(body)
}
