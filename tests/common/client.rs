//! Test WebSocket client.
//!
//! Sends JSON envelopes and asserts on what the server writes back.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A test chat client.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[allow(dead_code)]
impl TestClient {
    /// Open a WebSocket, presenting `token` in the `access_token` cookie.
    pub async fn connect(url: &str, token: Option<&str>) -> anyhow::Result<Self> {
        Self::connect_with(url, token, &[]).await
    }

    /// Open a WebSocket with extra request headers.
    pub async fn connect_with(
        url: &str,
        token: Option<&str>,
        headers: &[(&'static str, &str)],
    ) -> anyhow::Result<Self> {
        let mut request = url.into_client_request()?;
        if let Some(token) = token {
            request
                .headers_mut()
                .insert(COOKIE, HeaderValue::from_str(&format!("access_token={token}"))?);
        }
        for (name, value) in headers {
            request.headers_mut().insert(*name, HeaderValue::from_str(value)?);
        }

        let (ws, _response) = tokio_tungstenite::connect_async(request).await?;
        Ok(Self { ws })
    }

    /// Send a JSON envelope.
    pub async fn send_json(&mut self, value: Value) -> anyhow::Result<()> {
        self.send_text(&value.to_string()).await
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a binary frame.
    pub async fn send_binary(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.ws.send(Message::Binary(data.to_vec())).await?;
        Ok(())
    }

    /// Receive the next text frame as JSON.
    pub async fn recv_json(&mut self) -> anyhow::Result<Value> {
        self.recv_json_timeout(RECV_TIMEOUT).await
    }

    /// Receive the next text frame as JSON, waiting at most `dur`.
    pub async fn recv_json_timeout(&mut self, dur: Duration) -> anyhow::Result<Value> {
        loop {
            let msg = timeout(dur, self.ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection ended"))??;
            match msg {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(frame) => anyhow::bail!("connection closed: {frame:?}"),
                _ => continue,
            }
        }
    }

    /// Assert that no text frame arrives within `dur`.
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_json_timeout(dur).await {
            Ok(value) => anyhow::bail!("expected silence, got {value}"),
            Err(e) if e.is::<tokio::time::error::Elapsed>() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Wait for the server's close frame, skipping any text frames before it.
    pub async fn expect_close(&mut self) -> anyhow::Result<Option<CloseFrame<'static>>> {
        loop {
            let next = timeout(RECV_TIMEOUT, self.ws.next()).await?;
            match next {
                Some(Ok(Message::Close(frame))) => return Ok(frame),
                Some(Ok(_)) => continue,
                None | Some(Err(WsError::ConnectionClosed)) => {
                    anyhow::bail!("connection ended without a close frame")
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Close the connection cleanly.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.ws.close(None).await?;
        while let Some(Ok(_)) = self.ws.next().await {}
        Ok(())
    }
}
