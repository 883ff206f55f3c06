use crate::command::Command;
use crate::error::QmpError;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// One line from the control plane. Exactly one of the fields is set per
/// line: the greeting on connect, then a return or error per command, with
/// asynchronous events interleaved at any point.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "QMP")]
    greeting: Option<Value>,
    #[serde(rename = "return")]
    ret: Option<Value>,
    error: Option<CommandError>,
    event: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommandError {
    class: String,
    desc: String,
}

/// A connected, capabilities-negotiated control-plane session. Single use:
/// the orchestrator opens one per attach sequence and closes it right after.
#[derive(Debug)]
pub struct QmpClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl QmpClient {
    /// Connect, consume the server greeting and negotiate capabilities,
    /// leaving the session ready for commands.
    pub async fn connect(host: &str, port: u16) -> Result<Self, QmpError> {
        let stream = TcpStream::connect((host, port)).await?;
        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        };
        let first = client.read_envelope().await?;
        if first.greeting.is_none() {
            return Err(QmpError::MissingGreeting);
        }
        client.execute(&Command::QmpCapabilities).await?;
        tracing::debug!("qmp session ready on {}:{}", host, port);
        Ok(client)
    }

    /// Send one command and wait for its response, skipping event lines.
    pub async fn execute(&mut self, command: &Command) -> Result<Value, QmpError> {
        let mut line = serde_json::to_string(&command.to_wire()?)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        loop {
            let envelope = self.read_envelope().await?;
            if let Some(error) = envelope.error {
                return Err(QmpError::Command {
                    class: error.class,
                    desc: error.desc,
                });
            }
            if let Some(value) = envelope.ret {
                return Ok(value);
            }
            if let Some(event) = envelope.event {
                tracing::debug!("ignoring qmp event {}", event);
            }
        }
    }

    pub async fn close(mut self) -> Result<(), QmpError> {
        self.writer.shutdown().await?;
        Ok(())
    }

    async fn read_envelope(&mut self) -> Result<Envelope, QmpError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(QmpError::UnexpectedEof);
            }
            if line.trim().is_empty() {
                continue;
            }
            return Ok(serde_json::from_str(&line)?);
        }
    }
}

/// Prod a stalled control plane back into responsiveness: open a fresh
/// connection on the secondary endpoint, issue a no-op query, close.
pub async fn nudge(host: &str, port: u16) -> Result<(), QmpError> {
    let mut conn = QmpClient::connect(host, port).await?;
    conn.execute(&Command::QueryBlockJobs).await?;
    conn.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const GREETING: &str = "{\"QMP\": {\"version\": {}, \"capabilities\": []}}\n";

    /// Accept one connection, send `hello` on accept, then answer each
    /// received line with the next canned response. Returns the port and a
    /// handle resolving to the raw command lines the server saw.
    async fn spawn_server(
        hello: &'static str,
        responses: Vec<&'static str>,
    ) -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            write_half.write_all(hello.as_bytes()).await.unwrap();
            let mut reader = BufReader::new(read_half);
            let mut received = Vec::new();
            for response in responses {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                received.push(line.trim().to_string());
                write_half.write_all(response.as_bytes()).await.unwrap();
            }
            received
        });
        (port, handle)
    }

    #[tokio::test]
    async fn connect_negotiates_capabilities() {
        let (port, handle) = spawn_server(GREETING, vec!["{\"return\": {}}\n"]).await;
        let client = QmpClient::connect("127.0.0.1", port).await.unwrap();
        client.close().await.unwrap();
        let received = handle.await.unwrap();
        assert_eq!(received, vec!["{\"execute\":\"qmp_capabilities\"}"]);
    }

    #[tokio::test]
    async fn connect_rejects_missing_greeting() {
        let (port, _handle) = spawn_server("{\"return\": {}}\n", vec![]).await;
        let err = QmpClient::connect("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, QmpError::MissingGreeting));
    }

    #[tokio::test]
    async fn execute_returns_payload_and_skips_events() {
        let (port, _handle) = spawn_server(
            GREETING,
            vec![
                "{\"return\": {}}\n",
                "{\"event\": \"BLOCK_JOB_COMPLETED\", \"data\": {}}\n{\"return\": {\"jobs\": []}}\n",
            ],
        )
        .await;
        let mut client = QmpClient::connect("127.0.0.1", port).await.unwrap();
        let value = client.execute(&Command::QueryBlockJobs).await.unwrap();
        assert_eq!(value, serde_json::json!({"jobs": []}));
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn execute_maps_error_envelope() {
        let (port, _handle) = spawn_server(
            GREETING,
            vec![
                "{\"return\": {}}\n",
                "{\"error\": {\"class\": \"GenericError\", \"desc\": \"no such device\"}}\n",
            ],
        )
        .await;
        let mut client = QmpClient::connect("127.0.0.1", port).await.unwrap();
        let err = client.execute(&Command::QueryBlockJobs).await.unwrap_err();
        match err {
            QmpError::Command { class, desc } => {
                assert_eq!(class, "GenericError");
                assert_eq!(desc, "no such device");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn nudge_runs_the_noop_query() {
        let (port, handle) =
            spawn_server(GREETING, vec!["{\"return\": {}}\n", "{\"return\": []}\n"]).await;
        nudge("127.0.0.1", port).await.unwrap();
        let received = handle.await.unwrap();
        assert_eq!(received.len(), 2);
        assert!(received[1].contains("query-block-jobs"));
    }
}
