use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::time::timeout;

use crate::content::resolver::{ResolvedResource, Resolver};
use crate::gemini::mime::mime_type_for;
use crate::gemini::parser::{MAX_REQUEST_LINE, ParseError, parse_request_line};
use crate::gemini::request::{Request, RequestPath, RequestTarget};
use crate::gemini::response::Response;
use crate::gemini::writer::respond;

/// Read-only state shared by every connection.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub resolver: Resolver,
    /// Upper bound on the time a client may take to send its request line
    pub request_timeout: Duration,
    /// When set, requests for any other host are refused
    pub hostname: Option<String>,
    /// When set, requests naming any other port are refused; a URL without
    /// a port means [`DEFAULT_PORT`]
    pub port: Option<u16>,
}

/// Port implied by a `gemini://` URL without an explicit port.
pub const DEFAULT_PORT: u16 = 1965;

impl ServerContext {
    pub fn new(resolver: Resolver, request_timeout: Duration) -> Self {
        Self {
            resolver,
            request_timeout,
            hostname: None,
            port: None,
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    fn check_host(&self, target: &RequestTarget) -> Result<(), ParseError> {
        if let Some(expected) = &self.hostname {
            if !target.host.eq_ignore_ascii_case(expected) {
                return Err(ParseError::WrongHost(target.host.clone()));
            }
        }

        let requested = target.port.unwrap_or(DEFAULT_PORT);
        match self.port {
            Some(expected) if requested != expected => Err(ParseError::WrongPort(requested)),
            _ => Ok(()),
        }
    }
}

/// One request, one response, then the connection is gone.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    context: Arc<ServerContext>,
}

#[derive(Debug)]
pub enum ConnectionState {
    AwaitingRequest,
    Resolving(RequestPath),
    Responding(Response),
    Closed,
}

enum ReadOutcome {
    Request(Request),
    Rejected(ParseError),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, context: Arc<ServerContext>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(MAX_REQUEST_LINE + 2),
            state: ConnectionState::AwaitingRequest,
            context,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::AwaitingRequest => {
                    match timeout(self.context.request_timeout, self.read_request()).await {
                        Err(_) => {
                            tracing::debug!("No request line before timeout, closing");
                            ConnectionState::Closed
                        }
                        Ok(Err(e)) => {
                            tracing::debug!(error = %e, "Read failed, abandoning connection");
                            ConnectionState::Closed
                        }
                        Ok(Ok(ReadOutcome::Closed)) => ConnectionState::Closed,
                        Ok(Ok(ReadOutcome::Rejected(e))) => {
                            tracing::info!(error = ?e, "Malformed request");
                            ConnectionState::Responding(e.response())
                        }
                        Ok(Ok(ReadOutcome::Request(req))) => self.route(&req),
                    }
                }

                ConnectionState::Resolving(path) => {
                    let response = self.serve(&path).await;
                    tracing::info!(
                        path = %path,
                        status = response.status().code(),
                        bytes = response.body().len(),
                        "Request served"
                    );
                    ConnectionState::Responding(response)
                }

                ConnectionState::Responding(response) => {
                    if let Err(e) = respond(&mut self.stream, &response).await {
                        tracing::debug!(error = %e, "Client went away before the response was sent");
                    }
                    ConnectionState::Closed
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    async fn read_request(&mut self) -> std::io::Result<ReadOutcome> {
        loop {
            match parse_request_line(&self.buffer) {
                Ok((request, _consumed)) => return Ok(ReadOutcome::Request(request)),
                Err(ParseError::Incomplete) => {}
                Err(e) => return Ok(ReadOutcome::Rejected(e)),
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(ReadOutcome::Closed);
                }
                return Ok(ReadOutcome::Rejected(ParseError::Incomplete));
            }
        }
    }

    fn route(&self, request: &Request) -> ConnectionState {
        tracing::debug!(url = request.raw_url(), "Request received");

        let target = request
            .target()
            .and_then(|t| self.context.check_host(&t).map(|_| t));

        match target {
            Ok(target) => ConnectionState::Resolving(target.path),
            Err(e) => {
                tracing::info!(url = request.raw_url(), error = ?e, "Request rejected");
                ConnectionState::Responding(e.response())
            }
        }
    }

    async fn serve(&self, path: &RequestPath) -> Response {
        let resolver = &self.context.resolver;

        let relative = match resolver.resolve(path.as_str()).await {
            Ok(ResolvedResource::Found(relative)) => relative,
            Ok(ResolvedResource::Absent) => return Response::not_found("Not found"),
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Resource lookup failed");
                return e.response();
            }
        };

        match resolver.read(&relative).await {
            Ok(body) => Response::success(mime_type_for(&relative), body),
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Resource read failed");
                e.response()
            }
        }
    }
}
