use parley_types::api::{MessagesResponse, SendMessageRequest};
use parley_types::{ChannelId, Message};

use crate::client::{HttpApi, decode_success};
use crate::error::ApiError;

impl HttpApi {
    /// GET `?channel_id=<id>`. Order is left as received (newest first).
    pub async fn get_messages(&self, channel_id: ChannelId) -> Result<Vec<Message>, ApiError> {
        let resp = self
            .client
            .get(&self.endpoints.messages)
            .query(&[("channel_id", channel_id.0)])
            .send()
            .await?;

        let decoded: MessagesResponse = decode_success(resp).await?;
        Ok(decoded.messages)
    }

    /// POST `{channel_id, user_id, content}`. The response body is unused.
    pub async fn post_message(&self, request: &SendMessageRequest) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(&self.endpoints.messages)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(())
    }
}
