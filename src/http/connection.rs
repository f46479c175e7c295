use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::http::parser::parse_request;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::write_response;
use crate::routing::dispatcher::Dispatcher;

/// One request/response exchange over one stream.
///
/// The stream is owned for the whole exchange and shut down when [`run`]
/// returns, whichever way it returns.
///
/// [`run`]: Connection::run
pub struct Connection<S> {
    stream: BufReader<S>,
    dispatcher: Dispatcher,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(Response),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, dispatcher: Dispatcher) -> Self {
        Self {
            stream: BufReader::new(stream),
            dispatcher,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.exchange().await;

        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(error = %e, "Shutdown after exchange failed");
        }

        result
    }

    async fn exchange(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = self.read_request().await?;
                }

                ConnectionState::Processing(req) => {
                    let response = match self.dispatcher.dispatch(req, Response::new()).await {
                        Ok(response) => response,
                        Err(e) => {
                            tracing::error!(error = %e, "Handler failed");
                            Response::error(StatusCode::InternalServerError)
                        }
                    };
                    self.state = ConnectionState::Writing(response);
                }

                ConnectionState::Writing(mut response) => {
                    write_response(&mut response, &mut self.stream).await?;
                    // One exchange per connection
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ConnectionState> {
        match parse_request(&mut self.stream).await {
            Ok(req) => Ok(ConnectionState::Processing(req)),

            Err(e) if e.is_empty_request() => {
                tracing::debug!("Empty request, closing");
                Ok(ConnectionState::Closed)
            }

            Err(e) => match e.status() {
                Some(status) => {
                    tracing::warn!(error = %e, status = status.as_u16(), "Malformed request");
                    Ok(ConnectionState::Writing(Response::error(status)))
                }
                None => Err(anyhow::Error::new(e).context("Failed to read request")),
            },
        }
    }
}
