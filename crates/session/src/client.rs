use async_trait::async_trait;
use parley_core::types::{
    Channel, ChannelDetail, ChannelDetailResponse, ChannelListResponse, ChannelResponse,
    CreateChannelRequest, ErrorResponse, MessageEvent, MessageEventEntry,
    MessageEventListResponse, MessageEventResponse, RecordMessageEventRequest,
    RegisterUserRequest, UpdateUserRequest, UploadResponse, User, UserResponse,
};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("unexpected HTTP {status}: {message}")]
    Unexpected { status: u16, message: String },
    #[error("invalid api url {0:?}")]
    InvalidUrl(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST => ClientError::Rejected(message),
            s if s.is_server_error() => ClientError::Server(message),
            s => ClientError::Unexpected {
                status: s.as_u16(),
                message,
            },
        }
    }
}

/// The store operations the relay and sign-in flows write through.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn register_or_update(&self, user: &RegisterUserRequest) -> Result<User, ClientError>;

    async fn update_user(
        &self,
        user_id: &str,
        update: &UpdateUserRequest,
    ) -> Result<User, ClientError>;

    async fn create_channel(&self, channel: &CreateChannelRequest)
        -> Result<Channel, ClientError>;

    async fn increment_message_count(&self, channel_url: &str) -> Result<Channel, ClientError>;

    async fn record_message_event(
        &self,
        event: &RecordMessageEventRequest,
    ) -> Result<MessageEvent, ClientError>;

    async fn delete_channel(&self, channel_url: &str) -> Result<Channel, ClientError>;
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Joins path segments onto the base URL, percent-encoding each one so
    /// channel URLs survive as a single segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, ClientError> {
        let resp = self
            .client
            .get(self.endpoint(&["users", user_id]))
            .send()
            .await?;
        Ok(read::<UserResponse>(resp).await?.user)
    }

    pub async fn list_channels(&self) -> Result<Vec<ChannelDetail>, ClientError> {
        let resp = self.client.get(self.endpoint(&["channels"])).send().await?;
        Ok(read::<ChannelListResponse>(resp).await?.channels)
    }

    pub async fn get_channel(&self, channel_url: &str) -> Result<ChannelDetail, ClientError> {
        let resp = self
            .client
            .get(self.endpoint(&["channels", channel_url]))
            .send()
            .await?;
        Ok(read::<ChannelDetailResponse>(resp).await?.channel)
    }

    pub async fn recent_events(&self) -> Result<Vec<MessageEventEntry>, ClientError> {
        let resp = self
            .client
            .get(self.endpoint(&["message-events"]))
            .send()
            .await?;
        Ok(read::<MessageEventListResponse>(resp).await?.events)
    }

    /// Uploads an image and returns the relative URL the API serves it from.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        file_name: &str,
    ) -> Result<String, ClientError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(self.endpoint(&["upload"]))
            .multipart(form)
            .send()
            .await?;
        Ok(read::<UploadResponse>(resp).await?.url)
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn register_or_update(&self, user: &RegisterUserRequest) -> Result<User, ClientError> {
        let resp = self
            .client
            .post(self.endpoint(&["users"]))
            .json(user)
            .send()
            .await?;
        Ok(read::<UserResponse>(resp).await?.user)
    }

    async fn update_user(
        &self,
        user_id: &str,
        update: &UpdateUserRequest,
    ) -> Result<User, ClientError> {
        let resp = self
            .client
            .put(self.endpoint(&["users", user_id]))
            .json(update)
            .send()
            .await?;
        Ok(read::<UserResponse>(resp).await?.user)
    }

    async fn create_channel(
        &self,
        channel: &CreateChannelRequest,
    ) -> Result<Channel, ClientError> {
        let resp = self
            .client
            .post(self.endpoint(&["channels"]))
            .json(channel)
            .send()
            .await?;
        Ok(read::<ChannelResponse>(resp).await?.channel)
    }

    async fn increment_message_count(&self, channel_url: &str) -> Result<Channel, ClientError> {
        let resp = self
            .client
            .post(self.endpoint(&["channels", channel_url, "increment-message"]))
            .send()
            .await?;
        Ok(read::<ChannelResponse>(resp).await?.channel)
    }

    async fn record_message_event(
        &self,
        event: &RecordMessageEventRequest,
    ) -> Result<MessageEvent, ClientError> {
        let resp = self
            .client
            .post(self.endpoint(&["message-events"]))
            .json(event)
            .send()
            .await?;
        Ok(read::<MessageEventResponse>(resp).await?.event)
    }

    async fn delete_channel(&self, channel_url: &str) -> Result<Channel, ClientError> {
        let resp = self
            .client
            .delete(self.endpoint(&["channels", channel_url]))
            .send()
            .await?;
        Ok(read::<ChannelResponse>(resp).await?.channel)
    }
}

async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    let message = match resp.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ClientError::from_status(status, message))
}
