//! HttpSyncGateway - REST implementation of `SyncGateway`.
//!
//! Talks JSON to the remote conversation store:
//! - `GET  /getChat?character_name=..`  → `{ "messages": [{role, content}] }`
//! - `POST /sendMessage`               → `{ "message": "<reply>" }`
//! - `POST /editMessage`               → ack
//! - `POST /deleteMessage`             → ack
//! - `POST /chats`                     → `{ "chat": { "<persona>": [...], "username": .. } }`
//!
//! Every request carries `Authorization: Bearer <token>`. A missing token or
//! persona short-circuits before anything is sent.

use async_trait::async_trait;
use parley_core::config::ParleyConfig;
use parley_core::conversation::ChatMessage;
use parley_core::credential::CredentialProvider;
use parley_core::error::{ParleyError, Result};
use parley_core::gateway::{RemoteMessage, SyncGateway};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Gateway implementation backed by `reqwest`.
#[derive(Clone)]
pub struct HttpSyncGateway {
    client: Client,
    base_url: String,
    timeout: Duration,
    credentials: Arc<dyn CredentialProvider>,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    messages: Vec<RemoteMessage>,
}

#[derive(Debug, Serialize)]
struct SendTurnRequest<'a> {
    character_name: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendTurnResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct EditTurnRequest<'a> {
    character_name: &'a str,
    old_message: &'a ChatMessage,
    new_content: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteTurnRequest<'a> {
    character_name: &'a str,
    message: &'a ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatsResponse {
    #[serde(default)]
    chat: serde_json::Map<String, serde_json::Value>,
}

impl HttpSyncGateway {
    /// Creates a new gateway with an explicit base URL and credential source.
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(parley_core::config::DEFAULT_TIMEOUT_SECS),
            credentials,
        }
    }

    /// Creates a gateway from a loaded configuration.
    pub fn from_config(config: &ParleyConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::new(config.api_url.clone(), credentials)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Resolves the bearer token and validates the persona, in that order.
    async fn authorize(&self, persona: Option<&str>) -> Result<String> {
        let token = self
            .credentials
            .bearer_token()
            .await
            .filter(|token| !token.trim().is_empty())
            .ok_or(ParleyError::MissingCredential)?;

        if persona.is_some_and(|p| p.trim().is_empty()) {
            return Err(ParleyError::MissingPersona);
        }

        Ok(token)
    }

    async fn dispatch(&self, request: RequestBuilder, token: &str) -> Result<Response> {
        let response = request
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ParleyError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ParleyError::server(status.as_u16(), body));
        }

        Ok(response)
    }

    async fn dispatch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &str,
    ) -> Result<T> {
        let response = self.dispatch(request, token).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ParleyError::transport(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SyncGateway for HttpSyncGateway {
    async fn fetch_transcript(&self, persona: &str) -> Result<Vec<RemoteMessage>> {
        let token = self.authorize(Some(persona)).await?;
        tracing::debug!("[HttpSyncGateway] GET getChat for '{}'", persona);

        let request = self
            .client
            .get(self.endpoint("getChat"))
            .query(&[("character_name", persona)]);
        let response: TranscriptResponse = self.dispatch_json(request, &token).await?;

        Ok(response.messages)
    }

    async fn send_turn(&self, persona: &str, content: &str) -> Result<String> {
        let token = self.authorize(Some(persona)).await?;
        tracing::debug!(
            "[HttpSyncGateway] POST sendMessage for '{}' ({} chars)",
            persona,
            content.len()
        );

        let request = self
            .client
            .post(self.endpoint("sendMessage"))
            .json(&SendTurnRequest {
                character_name: persona,
                message: content,
            });
        let response: SendTurnResponse = self.dispatch_json(request, &token).await?;

        Ok(response.message)
    }

    async fn edit_turn(
        &self,
        persona: &str,
        original: &ChatMessage,
        new_content: &str,
    ) -> Result<()> {
        let token = self.authorize(Some(persona)).await?;
        tracing::debug!(
            "[HttpSyncGateway] POST editMessage for '{}' (message id={})",
            persona,
            original.id
        );

        let request = self
            .client
            .post(self.endpoint("editMessage"))
            .json(&EditTurnRequest {
                character_name: persona,
                old_message: original,
                new_content,
            });
        self.dispatch(request, &token).await?;

        Ok(())
    }

    async fn delete_turn(&self, persona: &str, message: &ChatMessage) -> Result<()> {
        let token = self.authorize(Some(persona)).await?;
        tracing::debug!(
            "[HttpSyncGateway] POST deleteMessage for '{}' (message id={})",
            persona,
            message.id
        );

        let request = self
            .client
            .post(self.endpoint("deleteMessage"))
            .json(&DeleteTurnRequest {
                character_name: persona,
                message,
            });
        self.dispatch(request, &token).await?;

        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<String>> {
        let token = self.authorize(None).await?;
        tracing::debug!("[HttpSyncGateway] POST chats");

        let request = self
            .client
            .post(self.endpoint("chats"))
            .json(&serde_json::json!({}));
        let response: ChatsResponse = self.dispatch_json(request, &token).await?;

        Ok(persona_names(&response.chat))
    }
}

/// Keys of the per-user chat map that name personas. Bookkeeping keys such as
/// `username` all start with `user`.
fn persona_names(chat: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
    chat.keys()
        .filter(|key| !key.starts_with("user"))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;
    use parley_core::conversation::MessageRole;

    /// Nothing listens on port 1, so any request that does go out fails with
    /// a transport error.
    const UNREACHABLE: &str = "http://127.0.0.1:1";

    struct NoCredentials;

    #[async_trait]
    impl CredentialProvider for NoCredentials {
        async fn bearer_token(&self) -> Option<String> {
            None
        }
    }

    fn signed_out() -> HttpSyncGateway {
        HttpSyncGateway::new(UNREACHABLE, Arc::new(NoCredentials))
    }

    fn signed_in() -> HttpSyncGateway {
        HttpSyncGateway::new(UNREACHABLE, Arc::new(StaticCredentials::new("token")))
            .with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits_every_call() {
        let gateway = signed_out();
        let message = ChatMessage::new("0", MessageRole::User, "hi");

        assert_eq!(
            gateway.fetch_transcript("Mira").await,
            Err(ParleyError::MissingCredential)
        );
        assert_eq!(
            gateway.send_turn("Mira", "hi").await,
            Err(ParleyError::MissingCredential)
        );
        assert_eq!(
            gateway.edit_turn("Mira", &message, "hey").await,
            Err(ParleyError::MissingCredential)
        );
        assert_eq!(
            gateway.delete_turn("Mira", &message).await,
            Err(ParleyError::MissingCredential)
        );
        assert_eq!(
            gateway.list_conversations().await,
            Err(ParleyError::MissingCredential)
        );
    }

    #[tokio::test]
    async fn test_empty_token_counts_as_missing() {
        let gateway = HttpSyncGateway::new(UNREACHABLE, Arc::new(StaticCredentials::new("")));
        assert_eq!(
            gateway.fetch_transcript("Mira").await,
            Err(ParleyError::MissingCredential)
        );
    }

    #[tokio::test]
    async fn test_missing_persona_short_circuits() {
        let gateway = signed_in();
        let message = ChatMessage::new("0", MessageRole::User, "hi");

        assert_eq!(
            gateway.fetch_transcript("").await,
            Err(ParleyError::MissingPersona)
        );
        assert_eq!(
            gateway.send_turn("  ", "hi").await,
            Err(ParleyError::MissingPersona)
        );
        assert_eq!(
            gateway.edit_turn("", &message, "hey").await,
            Err(ParleyError::MissingPersona)
        );
        assert_eq!(
            gateway.delete_turn("", &message).await,
            Err(ParleyError::MissingPersona)
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let err = signed_in().send_turn("Mira", "hi").await.unwrap_err();
        assert!(matches!(err, ParleyError::Transport(_)), "got {err:?}");
        assert!(err.is_remote());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let gateway = HttpSyncGateway::new(
            "https://chat.example.com/",
            Arc::new(StaticCredentials::new("t")),
        );
        assert_eq!(gateway.endpoint("getChat"), "https://chat.example.com/getChat");
    }

    #[test]
    fn test_edit_payload_shape() {
        let original = ChatMessage::new("4", MessageRole::Assistant, "old");
        let body = serde_json::to_value(EditTurnRequest {
            character_name: "Mira",
            old_message: &original,
            new_content: "new",
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "character_name": "Mira",
                "old_message": {"id": "4", "role": "assistant", "content": "old"},
                "new_content": "new"
            })
        );
    }

    #[test]
    fn test_delete_payload_shape() {
        let message = ChatMessage::new("1700000000000", MessageRole::User, "bye");
        let body = serde_json::to_value(DeleteTurnRequest {
            character_name: "Mira",
            message: &message,
        })
        .unwrap();

        assert_eq!(body["character_name"], "Mira");
        assert_eq!(body["message"]["role"], "user");
        assert_eq!(body["message"]["content"], "bye");
    }

    #[test]
    fn test_transcript_response_tolerates_missing_fields() {
        let response: TranscriptResponse = serde_json::from_str(
            r#"{"messages": [{"role": "system", "content": "prompt"}, {"content": "orphan"}]}"#,
        )
        .unwrap();

        assert_eq!(response.messages.len(), 2);
        assert_eq!(response.messages[1].role, "");
    }

    #[test]
    fn test_persona_names_skip_user_keys() {
        let response: ChatsResponse = serde_json::from_str(
            r#"{"chat": {"username": "sam", "Mira": [], "Orin": [{"role": "user", "content": "hi"}]}}"#,
        )
        .unwrap();

        assert_eq!(persona_names(&response.chat), vec!["Mira", "Orin"]);
    }

    #[test]
    fn test_chats_response_without_chat_is_empty() {
        let response: ChatsResponse =
            serde_json::from_str(r#"{"message": "Access granted", "user_data": {"sub": "sam"}}"#)
                .unwrap();
        assert!(persona_names(&response.chat).is_empty());
    }

    // ============================================================================
    // Exchanges against a local stub server
    // ============================================================================

    mod exchange {
        use super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        const TOKEN: &str = "secret-token";

        /// Serves exactly one request with the given status line and JSON
        /// body. The handle resolves to the raw request text.
        async fn stub(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let handle = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
                request
            });
            (format!("http://{addr}"), handle)
        }

        async fn read_request(socket: &mut TcpStream) -> String {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                    let length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        }

        fn gateway(base_url: &str) -> HttpSyncGateway {
            HttpSyncGateway::new(base_url, Arc::new(StaticCredentials::new(TOKEN)))
                .with_timeout(Duration::from_secs(5))
        }

        fn request_line(request: &str) -> &str {
            request.lines().next().unwrap_or_default()
        }

        fn has_bearer(request: &str) -> bool {
            request
                .to_ascii_lowercase()
                .contains(&format!("authorization: bearer {TOKEN}"))
        }

        fn json_body(request: &str) -> serde_json::Value {
            let (_, body) = request.split_once("\r\n\r\n").unwrap();
            serde_json::from_str(body).unwrap()
        }

        #[tokio::test]
        async fn test_fetch_transcript_exchange() {
            let (url, server) = stub(
                "200 OK",
                r#"{"messages": [{"role": "system", "content": "prompt"}, {"role": "user", "content": "hello"}]}"#,
            )
            .await;

            let messages = gateway(&url).fetch_transcript("Mira").await.unwrap();
            let request = server.await.unwrap();

            assert_eq!(
                request_line(&request),
                "GET /getChat?character_name=Mira HTTP/1.1"
            );
            assert!(has_bearer(&request), "request was: {request}");
            assert_eq!(
                messages,
                vec![
                    RemoteMessage::new("system", "prompt"),
                    RemoteMessage::new("user", "hello"),
                ]
            );
        }

        #[tokio::test]
        async fn test_send_turn_exchange() {
            let (url, server) = stub("200 OK", r#"{"message": "hello back"}"#).await;

            let reply = gateway(&url).send_turn("Mira", "hi there").await.unwrap();
            let request = server.await.unwrap();

            assert_eq!(reply, "hello back");
            assert_eq!(request_line(&request), "POST /sendMessage HTTP/1.1");
            assert!(has_bearer(&request));
            assert_eq!(
                json_body(&request),
                serde_json::json!({"character_name": "Mira", "message": "hi there"})
            );
        }

        #[tokio::test]
        async fn test_edit_turn_sends_original_message() {
            let (url, server) = stub("200 OK", r#"{"message": "Message edited"}"#).await;
            let original = ChatMessage::new("3", MessageRole::User, "helo");

            gateway(&url)
                .edit_turn("Mira", &original, "hello")
                .await
                .unwrap();
            let request = server.await.unwrap();

            assert_eq!(request_line(&request), "POST /editMessage HTTP/1.1");
            assert_eq!(
                json_body(&request)["old_message"],
                serde_json::json!({"id": "3", "role": "user", "content": "helo"})
            );
        }

        #[tokio::test]
        async fn test_not_found_maps_to_server_error() {
            let (url, server) = stub("404 Not Found", r#"{"detail":"No chat history found"}"#).await;

            let err = gateway(&url).fetch_transcript("Mira").await.unwrap_err();
            server.await.unwrap();

            assert_eq!(
                err,
                ParleyError::server(404, r#"{"detail":"No chat history found"}"#)
            );
            assert!(err.is_remote());
            assert!(!err.is_unauthorized());
        }

        #[tokio::test]
        async fn test_internal_error_maps_to_server_error() {
            let (url, server) = stub("500 Internal Server Error", r#"{"detail":"boom"}"#).await;
            let message = ChatMessage::new("0", MessageRole::User, "bye");

            let err = gateway(&url)
                .delete_turn("Mira", &message)
                .await
                .unwrap_err();
            let request = server.await.unwrap();

            assert_eq!(request_line(&request), "POST /deleteMessage HTTP/1.1");
            assert!(matches!(err, ParleyError::Server { status: 500, .. }), "got {err:?}");
        }

        #[tokio::test]
        async fn test_unauthorized_reply_is_detected() {
            let (url, server) = stub("401 Unauthorized", r#"{"detail":"Invalid token"}"#).await;

            let err = gateway(&url).send_turn("Mira", "hi").await.unwrap_err();
            server.await.unwrap();

            assert!(err.is_unauthorized());
        }

        #[tokio::test]
        async fn test_malformed_success_body_is_serialization_error() {
            let (url, server) = stub("200 OK", r#"{"reply": 42}"#).await;

            let err = gateway(&url).send_turn("Mira", "hi").await.unwrap_err();
            server.await.unwrap();

            assert!(
                matches!(err, ParleyError::Serialization { ref format, .. } if format == "JSON"),
                "got {err:?}"
            );
        }

        #[tokio::test]
        async fn test_list_conversations_exchange() {
            let (url, server) = stub(
                "200 OK",
                r#"{"chat": {"username": "sam", "Mira": [], "Orin": []}}"#,
            )
            .await;

            let personas = gateway(&url).list_conversations().await.unwrap();
            let request = server.await.unwrap();

            assert_eq!(request_line(&request), "POST /chats HTTP/1.1");
            assert!(has_bearer(&request));
            assert_eq!(personas, vec!["Mira", "Orin"]);
        }
    }
}
