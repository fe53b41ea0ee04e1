//! HTTP implementation of the board client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use crate::board::{
    BoardClient, BoardEntry, BoardListInfo, CreatedList, Element, EntryHandle, Workspace,
};
use crate::config::ApiConfig;
use crate::error::ClientError;

/// Board service client speaking the REST API directly.
#[derive(Debug, Clone)]
pub struct HttpBoardClient {
    config: ApiConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDto {
    id: i64,
    short_id: String,
    workspace_id: i64,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryDto {
    uuid: String,
    id: i64,
    display_string: String,
    completed: bool,
}

impl HttpBoardClient {
    /// Builds a client from the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Builds a client from `TWINLIST_BOARD_*` environment variables.
    pub fn from_env(default_base: &str, default_timeout_ms: u64) -> Result<Self, ClientError> {
        Self::new(ApiConfig::from_env("BOARD", default_base, default_timeout_ms)?)
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ClientError::Config(format!("invalid request path '{path}': {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl BoardClient for HttpBoardClient {
    async fn workspace(&self) -> Result<Workspace, ClientError> {
        let url = self.url("users/me/workspaces")?;
        let workspaces: Vec<Workspace> =
            Self::decode(self.request(reqwest::Method::GET, url).send().await?).await?;
        workspaces
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::UnexpectedResponse("account has no workspace".into()))
    }

    async fn lists(&self) -> Result<BTreeMap<String, BoardListInfo>, ClientError> {
        let url = self.url("users/me/lists")?;
        let lists: Vec<ListDto> =
            Self::decode(self.request(reqwest::Method::GET, url).send().await?).await?;
        Ok(lists
            .into_iter()
            .map(|l| {
                (
                    l.name,
                    BoardListInfo {
                        id: l.id,
                        short_id: l.short_id,
                        workspace_id: l.workspace_id,
                    },
                )
            })
            .collect())
    }

    async fn elements(&self, short_id: &str) -> Result<Vec<Element>, ClientError> {
        let url = self.url(&format!("lists/{short_id}/elements"))?;
        Self::decode(self.request(reqwest::Method::GET, url).send().await?).await
    }

    async fn create_list(
        &self,
        name: &str,
        workspace_id: i64,
    ) -> Result<CreatedList, ClientError> {
        tracing::info!(name = %name, workspace_id, "creating board list");
        let url = self.url(&format!("workspaces/{workspace_id}/lists"))?;
        Self::decode(
            self.request(reqwest::Method::POST, url)
                .json(&json!({ "name": name }))
                .send()
                .await?,
        )
        .await
    }

    async fn list_entries(
        &self,
        list_id: i64,
        stage_field: &str,
    ) -> Result<Vec<BoardEntry>, ClientError> {
        let url = self.url(&format!("lists/{list_id}/entries/filter"))?;
        let entries: Vec<EntryDto> = Self::decode(
            self.request(reqwest::Method::POST, url)
                .json(&json!({ "stageFieldUuid": stage_field }))
                .send()
                .await?,
        )
        .await?;
        Ok(entries
            .into_iter()
            .map(|e| BoardEntry {
                uuid: e.uuid,
                id: e.id,
                display_text: e.display_string,
                completed: e.completed,
            })
            .collect())
    }

    async fn add_entry(
        &self,
        list_id: i64,
        title_field: &str,
        text: &str,
    ) -> Result<EntryHandle, ClientError> {
        tracing::debug!(list_id, text = %text, "adding board entry");
        let url = self.url(&format!("lists/{list_id}/entries"))?;
        Self::decode(
            self.request(reqwest::Method::POST, url)
                .json(&json!({ "fields": { title_field: text } }))
                .send()
                .await?,
        )
        .await
    }

    async fn rename_entry(
        &self,
        list_id: i64,
        entry_id: i64,
        title_field: &str,
        text: &str,
    ) -> Result<(), ClientError> {
        let url = self.url(&format!("lists/{list_id}/entries/{entry_id}"))?;
        check(
            self.request(reqwest::Method::PUT, url)
                .json(&json!({ "fields": { title_field: text } }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn set_entry_stage(
        &self,
        list_id: i64,
        entry_id: i64,
        stage_field: &str,
        category_id: i64,
    ) -> Result<(), ClientError> {
        let url = self.url(&format!("lists/{list_id}/entries/{entry_id}"))?;
        check(
            self.request(reqwest::Method::PUT, url)
                .json(&json!({ "fields": { stage_field: category_id } }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn delete_entry(&self, list_id: i64, entry_uuid: &str) -> Result<(), ClientError> {
        tracing::debug!(list_id, entry_uuid = %entry_uuid, "deleting board entry");
        let url = self.url(&format!("lists/{list_id}/entries/{entry_uuid}"))?;
        check(self.request(reqwest::Method::DELETE, url).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> HttpBoardClient {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        HttpBoardClient::new(ApiConfig::new("test-key", base, Duration::from_secs(5))).unwrap()
    }

    #[tokio::test]
    async fn lists_maps_names_to_handles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/lists"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "shortId": "abc", "workspaceId": 1, "name": "Inbox"},
                {"id": 9, "shortId": "def", "workspaceId": 1, "name": "Shopping List"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let lists = client.lists().await.unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists["Inbox"].id, 7);
        assert_eq!(lists["Shopping List"].short_id, "def");
    }

    #[tokio::test]
    async fn list_entries_maps_display_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lists/9/entries/filter"))
            .and(body_json(json!({ "stageFieldUuid": "stage-uuid" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"uuid": "u1", "id": 11, "displayString": "milk", "completed": true}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let entries = client.list_entries(9, "stage-uuid").await.unwrap();
        assert_eq!(
            entries,
            vec![BoardEntry {
                uuid: "u1".into(),
                id: 11,
                display_text: "milk".into(),
                completed: true,
            }]
        );
    }

    #[tokio::test]
    async fn add_entry_posts_title_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lists/9/entries"))
            .and(body_json(json!({ "fields": { "title-uuid": "milk" } })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"uuid": "u2", "id": 12})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let handle = client.add_entry(9, "title-uuid", "milk").await.unwrap();
        assert_eq!(handle.uuid, "u2");
        assert_eq!(handle.id, 12);
    }

    #[tokio::test]
    async fn non_success_status_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/workspaces"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.workspace().await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "forbidden");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_workspace_list_is_unexpected_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/workspaces"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.workspace().await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedResponse(_)));
    }
}
