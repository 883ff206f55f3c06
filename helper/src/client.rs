use crate::error::HelperError;
use reqwest::Client;

pub struct HelperClient {
    client: Client,
    base_url: String,
}

impl HelperClient {
    pub fn new(host: &str, port: u16) -> Result<Self, HelperError> {
        let client = Client::builder().user_agent("gdmount/0.1.0").build()?;
        Ok(Self {
            client,
            base_url: format!("http://{}:{}", host, port),
        })
    }

    /// Register a mounted volume with the helper. `key` is the file basename
    /// in helper-only mode or the device serial in protocol mode; auxiliary
    /// mounts also carry the guest-visible mount point. Returns the full
    /// response body.
    pub async fn register(
        &self,
        key: &str,
        mount_point: Option<&str>,
    ) -> Result<String, HelperError> {
        let url = format!("{}/mount.php", self.base_url);
        let mut request = self.client.get(&url).query(&[("nonzip", key)]);
        if let Some(mount_point) = mount_point {
            request = request.query(&[("nzloc", mount_point)]);
        }
        tracing::debug!("registering {} with the mount helper", key);
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(HelperError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one request with a canned response; resolves to the request's
    /// target (the path-and-query part of the request line).
    async fn serve_once(status_line: &'static str, body: &'static str) -> (u16, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = String::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                raw.push_str(&String::from_utf8_lossy(&buf[..n]));
                if n == 0 || raw.contains("\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            raw.lines()
                .next()
                .unwrap_or("")
                .split(' ')
                .nth(1)
                .unwrap_or("")
                .to_string()
        });
        (port, handle)
    }

    #[tokio::test]
    async fn register_returns_the_response_body() {
        let (port, handle) = serve_once("HTTP/1.1 200 OK", "mounted /dev/vdb").await;
        let client = HelperClient::new("127.0.0.1", port).unwrap();
        let payload = client.register("s8W-!", None).await.unwrap();
        assert_eq!(payload, "mounted /dev/vdb");
        let target = handle.await.unwrap();
        assert!(target.starts_with("/mount.php?nonzip="));
        assert!(!target.contains("nzloc"));
    }

    #[tokio::test]
    async fn register_encodes_the_mount_point() {
        let (port, handle) = serve_once("HTTP/1.1 200 OK", "ok").await;
        let client = HelperClient::new("127.0.0.1", port).unwrap();
        client
            .register("aux.img", Some("/mnt/extra"))
            .await
            .unwrap();
        let target = handle.await.unwrap();
        assert!(target.contains("nonzip=aux.img"));
        assert!(target.contains("nzloc=%2Fmnt%2Fextra"));
    }

    #[tokio::test]
    async fn register_fails_on_error_status() {
        let (port, _handle) = serve_once("HTTP/1.1 500 Internal Server Error", "boom").await;
        let client = HelperClient::new("127.0.0.1", port).unwrap();
        let err = client.register("aux.img", None).await.unwrap_err();
        assert!(matches!(err, HelperError::Status(500)));
    }
}
