//! Newline-delimited JSON-RPC over a byte stream, usually stdin and stdout.
//!
//! One request per input line, at most one response per line, written in the
//! order the requests arrived. Nothing but response lines is ever written to the
//! output; diagnostics belong on stderr.
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::{debug, error, info, trace, warn};

use super::dispatch::Dispatcher;
use super::jsonrpc::{error_codes, Request, Response};
use crate::errors::TransportError;

/// Written when a response cannot be encoded at all
const ENCODING_FAILURE_LINE: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct ServeOptions {
    /// Answer notifications too, for clients that wait on every line
    pub reply_to_notifications: bool,
}

pub struct StdioTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl StdioTransport<Stdin, Stdout> {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Next input line without its terminator, or `None` at end of input.
    /// Bytes that are not UTF-8 are replaced rather than rejected.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(TransportError::Read)?;
        if read == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&buf).trim().to_string();
        trace!(len = line.len(), "read line");
        Ok(Some(line))
    }

    pub async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(TransportError::Write)?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::Write)?;
        self.writer.flush().await.map_err(TransportError::Write)
    }

    /// Serve requests until the input closes. Only I/O failures end the loop
    /// early; every malformed line gets its error response and the loop goes on.
    pub async fn serve(
        &mut self,
        dispatcher: &Dispatcher,
        options: ServeOptions,
    ) -> Result<(), TransportError> {
        loop {
            let line = match self.read_line().await? {
                Some(line) if line.is_empty() => continue,
                Some(line) => line,
                None => {
                    info!("input closed, shutting down");
                    return Ok(());
                }
            };

            if let Some(response) = handle_line(dispatcher, &line, options).await {
                self.write_response(&response).await?;
            }
        }
    }

    async fn write_response(&mut self, response: &Response) -> Result<(), TransportError> {
        match serde_json::to_string(response) {
            Ok(encoded) => self.write_line(&encoded).await,
            Err(err) => {
                error!(error = %err, "failed to encode response");
                self.write_line(ENCODING_FAILURE_LINE).await
            }
        }
    }
}

/// Turn one input line into the response to write for it, if any
pub async fn handle_line(
    dispatcher: &Dispatcher,
    line: &str,
    options: ServeOptions,
) -> Option<Response> {
    let value = match serde_json::from_str::<Value>(line) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "unparseable input line");
            return Some(Response::error(
                None,
                error_codes::PARSE_ERROR,
                format!("Parse error: {}", err),
            ));
        }
    };

    let request = match Request::from_value(value) {
        Ok(request) => request,
        Err(response) => {
            warn!("input line is not a request");
            return Some(response);
        }
    };

    let response = dispatcher.dispatch(&request).await;
    if request.is_notification() && !options.reply_to_notifications {
        debug!(method = %request.method, "notification handled without reply");
        return None;
    }
    Some(response)
}

/// Bridge stdin to stdout until stdin closes
pub async fn run_stdio(dispatcher: &Dispatcher, options: ServeOptions) -> Result<(), TransportError> {
    info!(server_url = %dispatcher.config().server_url, "bridge listening on stdio");
    StdioTransport::stdio().serve(dispatcher, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::dispatch::BridgeConfig;
    use serde_json::json;
    use std::io::Cursor;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(BridgeConfig::default())
    }

    async fn run(input: &str, options: ServeOptions) -> Vec<Value> {
        let mut transport = StdioTransport::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        transport.serve(&dispatcher(), options).await.unwrap();

        String::from_utf8(transport.writer)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_read_line_trims_and_reports_eof() {
        let mut transport = StdioTransport::new(Cursor::new(b"  one \r\ntwo".to_vec()), Vec::new());
        assert_eq!(transport.read_line().await.unwrap(), Some("one".to_string()));
        assert_eq!(transport.read_line().await.unwrap(), Some("two".to_string()));
        assert_eq!(transport.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_line_replaces_invalid_utf8() {
        let mut transport = StdioTransport::new(Cursor::new(b"a\xffb\n".to_vec()), Vec::new());
        assert_eq!(
            transport.read_line().await.unwrap(),
            Some("a\u{fffd}b".to_string())
        );
    }

    #[tokio::test]
    async fn test_write_line_appends_newline() {
        let mut transport = StdioTransport::new(Cursor::new(Vec::new()), Vec::new());
        transport.write_line("{\"ok\":true}").await.unwrap();
        assert_eq!(transport.writer, b"{\"ok\":true}\n");
    }

    #[tokio::test]
    async fn test_parse_error_then_continues() {
        let input = "{not json\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n";
        let responses = run(input, ServeOptions::default()).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 1);
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_responses_follow_input_order() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
            "\n",
            "   \n",
            "{\"jsonrpc\":\"2.0\",\"id\":\"b\",\"method\":\"nope\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/list\"}\n",
        );
        let responses = run(input, ServeOptions::default()).await;

        let ids: Vec<Value> = responses.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!("b"), json!(3)]);
        assert_eq!(responses[1]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_float_and_large_ids_are_echoed() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1.5,\"method\":\"tools/list\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":18446744073709551615,\"method\":\"tools/list\"}\n",
        );
        let responses = run(input, ServeOptions::default()).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], json!(1.5));
        assert_eq!(responses[1]["id"], json!(u64::MAX));
        assert!(responses.iter().all(|r| r["result"]["tools"].is_array()));
    }

    #[tokio::test]
    async fn test_notifications_are_silent_by_default() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
        );

        let silent = run(input, ServeOptions::default()).await;
        assert_eq!(silent.len(), 1);
        assert_eq!(silent[0]["id"], 2);

        let chatty = run(
            input,
            ServeOptions {
                reply_to_notifications: true,
            },
        )
        .await;
        assert_eq!(chatty.len(), 2);
        assert_eq!(
            chatty[0],
            json!({"jsonrpc": "2.0", "id": null, "result": null})
        );
    }

    #[tokio::test]
    async fn test_non_request_json_is_invalid_request() {
        let responses = run("[1,2,3]\n42\n", ServeOptions::default()).await;
        assert_eq!(responses.len(), 2);
        assert!(responses
            .iter()
            .all(|r| r["error"]["code"] == -32600 && r["id"].is_null()));
    }

    #[tokio::test]
    async fn test_empty_input_exits_cleanly() {
        assert!(run("", ServeOptions::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_ends_serving() {
        let reader = tokio_test::io::Builder::new()
            .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let mut transport = StdioTransport::new(reader, Vec::new());

        let err = transport
            .serve(&dispatcher(), ServeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Read(_)));
    }
}
