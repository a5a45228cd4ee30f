use parley_types::api::{ContactsResponse, ServersResponse};
use parley_types::{Contact, Server, UserId};

use crate::client::{HttpApi, decode_success};
use crate::error::ApiError;

impl HttpApi {
    /// GET `?user_id=<id>` on the servers endpoint.
    pub async fn get_servers(&self, user_id: UserId) -> Result<Vec<Server>, ApiError> {
        let resp = self
            .client
            .get(&self.endpoints.servers)
            .query(&[("user_id", user_id.0)])
            .send()
            .await?;

        let decoded: ServersResponse = decode_success(resp).await?;
        Ok(decoded.servers)
    }

    /// GET `?user_id=<id>` on the contacts endpoint.
    pub async fn get_contacts(&self, user_id: UserId) -> Result<Vec<Contact>, ApiError> {
        let resp = self
            .client
            .get(&self.endpoints.contacts)
            .query(&[("user_id", user_id.0)])
            .send()
            .await?;

        let decoded: ContactsResponse = decode_success(resp).await?;
        Ok(decoded.contacts)
    }
}
