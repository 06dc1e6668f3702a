use async_trait::async_trait;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use sd_core::error::ApiError;
use std::fmt;
use std::pin::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
            Self::Put => f.write_str("PUT"),
            Self::Delete => f.write_str("DELETE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    /// Single-file multipart form
    File {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API prefix, e.g. `/chat/sessions`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Decoded JSON body, `Null` when the body was empty or not JSON
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` string servers put in failure bodies.
    pub fn server_error(&self) -> Option<String> {
        self.body
            .get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string)
    }
}

/// Raw `data:` payloads of a server-sent-event connection. Dropping the
/// stream closes the connection.
pub type EventDataStream =
    Pin<Box<dyn futures_core::Stream<Item = Result<String, ApiError>> + Send>>;

/// Network seam of the client. Implementations return `Err` only when no
/// response arrived; HTTP error statuses come back as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;

    async fn open_events(&self, request: ApiRequest) -> Result<EventDataStream, ApiError>;
}

pub struct HttpTransport {
    client: Client,
    api_url: String,
}

impl HttpTransport {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
        }
    }

    fn builder(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.api_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = self.builder(&request);
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::File {
                field,
                file_name,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                builder.multipart(reqwest::multipart::Form::new().part(field, part))
            }
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);

        Ok(ApiResponse { status, body })
    }

    async fn open_events(&self, request: ApiRequest) -> Result<EventDataStream, ApiError> {
        let builder = self.builder(&request).header("Accept", "text/event-stream");
        let source = EventSource::new(builder).map_err(|e| ApiError::Stream(e.to_string()))?;

        let stream = async_stream::stream! {
            use tokio_stream::StreamExt;

            let mut source = source;
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {
                        tracing::debug!("event stream opened");
                    }
                    Ok(Event::Message(message)) => {
                        yield Ok(message.data);
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(reqwest_eventsource::Error::InvalidStatusCode(status, resp)) => {
                        let text = resp.text().await.unwrap_or_default();
                        let server_error = serde_json::from_str::<serde_json::Value>(&text)
                            .ok()
                            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
                        yield Err(ApiError::from_status(status.as_u16(), server_error));
                        break;
                    }
                    Err(reqwest_eventsource::Error::Transport(e)) => {
                        yield Err(ApiError::Network(e.to_string()));
                        break;
                    }
                    Err(e) => {
                        yield Err(ApiError::Stream(e.to_string()));
                        break;
                    }
                }
            }
            // EventSource reconnects on its own; stop it so a failed turn
            // is reported once instead of replayed.
            source.close();
        };

        Ok(Box::pin(stream))
    }
}
