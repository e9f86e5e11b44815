use crate::client::{ContainerPage, LogStore, StoreError, StreamSummary, WriteEntry};
use crate::config::ShipperConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// JSON-over-HTTP implementation of [`LogStore`].
///
/// Every operation is a POST of a camelCase JSON body to
/// `{endpoint}/v1/{action}` carrying the credential headers. Failures come
/// back as a JSON fault `{code, message}` whose code is mapped onto the
/// closed [`StoreError`] taxonomy.
#[derive(Debug)]
pub struct HttpLogStore {
    client: reqwest::Client,
    endpoint: String,
    access_key: String,
    secret_key: String,
    region: String,
}

impl HttpLogStore {
    pub fn new(config: &ShipperConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            region: config.region.clone(),
        })
    }

    async fn call<B, R>(&self, action: &str, body: &B) -> Result<R, StoreError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/v1/{}", self.endpoint, action))
            .header("x-log-access-key", &self.access_key)
            .header("x-log-secret-key", &self.secret_key)
            .header("x-log-region", &self.region)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(map_fault(status.as_u16(), &text))
    }
}

fn map_fault(status: u16, body: &str) -> StoreError {
    match serde_json::from_str::<ServiceFault>(body) {
        Ok(fault) => match fault.code.as_str() {
            "InvalidContinuationToken" => StoreError::InvalidToken,
            "ResourceNotFound" => StoreError::NotFound(fault.message),
            _ => StoreError::Service {
                status,
                message: format!("{}: {}", fault.code, fault.message),
            },
        },
        Err(_) => StoreError::Service {
            status,
            message: body.to_string(),
        },
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceFault {
    code: String,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListContainersRequest<'a> {
    name_prefix: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContainerRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListStreamsRequest<'a> {
    container_name: &'a str,
    name_prefix: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListStreamsResponse {
    streams: Vec<StreamSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateStreamRequest<'a> {
    container_name: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteRequest<'a> {
    container_name: &'a str,
    stream_name: &'a str,
    entries: &'a [WriteEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation_token: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteResponse {
    continuation_token: String,
}

#[derive(Deserialize)]
struct Empty {}

#[async_trait]
impl LogStore for HttpLogStore {
    async fn list_containers(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> Result<ContainerPage, StoreError> {
        self.call(
            "containers/list",
            &ListContainersRequest {
                name_prefix: prefix,
                page_token,
            },
        )
        .await
    }

    async fn create_container(&self, name: &str) -> Result<(), StoreError> {
        let _: Empty = self
            .call("containers/create", &CreateContainerRequest { name })
            .await?;
        Ok(())
    }

    async fn list_streams(
        &self,
        container: &str,
        name_prefix: &str,
    ) -> Result<Vec<StreamSummary>, StoreError> {
        let response: ListStreamsResponse = self
            .call(
                "streams/list",
                &ListStreamsRequest {
                    container_name: container,
                    name_prefix,
                },
            )
            .await?;
        Ok(response.streams)
    }

    async fn create_stream(&self, container: &str, name: &str) -> Result<(), StoreError> {
        let _: Empty = self
            .call(
                "streams/create",
                &CreateStreamRequest {
                    container_name: container,
                    name,
                },
            )
            .await?;
        Ok(())
    }

    async fn write(
        &self,
        container: &str,
        stream: &str,
        entries: &[WriteEntry],
        token: Option<&str>,
    ) -> Result<String, StoreError> {
        let response: WriteResponse = self
            .call(
                "streams/write",
                &WriteRequest {
                    container_name: container,
                    stream_name: stream,
                    entries,
                    continuation_token: token,
                },
            )
            .await?;
        Ok(response.continuation_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn make_store(endpoint: &str) -> HttpLogStore {
        let config = ShipperConfig {
            endpoint: endpoint.to_string(),
            access_key: "AK".to_string(),
            secret_key: "SK".to_string(),
            region: "eu-west-1".to_string(),
            container: "app-logs".to_string(),
            stream_prefix: "api".to_string(),
            flush_interval: std::time::Duration::from_secs(7),
            request_timeout: std::time::Duration::from_secs(5),
            metadata_url: None,
        };
        HttpLogStore::new(&config).expect("client builds")
    }

    #[tokio::test]
    async fn test_write_sends_token_and_adopts_new_one() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/streams/write")
            .match_header("x-log-access-key", "AK")
            .match_header("x-log-region", "eu-west-1")
            .match_body(Matcher::PartialJson(json!({
                "containerName": "app-logs",
                "streamName": "api_2026-03-09_h_i",
                "continuationToken": "tok-1",
            })))
            .with_status(200)
            .with_body(r#"{"continuationToken":"tok-2"}"#)
            .create_async()
            .await;

        let store = make_store(&server.url());
        let entries = vec![WriteEntry {
            timestamp: 1000,
            message: "m".to_string(),
        }];
        let token = store
            .write("app-logs", "api_2026-03-09_h_i", &entries, Some("tok-1"))
            .await
            .expect("write succeeds");

        mock.assert_async().await;
        assert_eq!(token, "tok-2");
    }

    #[tokio::test]
    async fn test_stale_token_fault_maps_to_invalid_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/streams/write")
            .with_status(400)
            .with_body(r#"{"code":"InvalidContinuationToken","message":"expected tok-9"}"#)
            .create_async()
            .await;

        let store = make_store(&server.url());
        let err = store
            .write("c", "s", &[], Some("tok-1"))
            .await
            .expect_err("fault expected");
        assert!(matches!(err, StoreError::InvalidToken));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_missing_stream_fault_maps_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/streams/write")
            .with_status(404)
            .with_body(r#"{"code":"ResourceNotFound","message":"no such stream"}"#)
            .create_async()
            .await;

        let store = make_store(&server.url());
        let err = store.write("c", "s", &[], None).await.expect_err("fault expected");
        match err {
            StoreError::NotFound(message) => assert_eq!(message, "no such stream"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_fault_maps_to_service_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/streams/write")
            .with_status(500)
            .with_body(r#"{"code":"InternalError","message":"try later"}"#)
            .create_async()
            .await;

        let store = make_store(&server.url());
        let err = store.write("c", "s", &[], None).await.expect_err("fault expected");
        match &err {
            StoreError::Service { status, message } => {
                assert_eq!(*status, 500);
                assert!(message.contains("InternalError"));
            }
            other => panic!("expected Service, got {other:?}"),
        }
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_non_json_fault_body_kept_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/containers/create")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let store = make_store(&server.url());
        let err = store.create_container("c").await.expect_err("fault expected");
        match err {
            StoreError::Service { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("expected Service, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_containers_paginates_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/containers/list")
            .match_body(Matcher::PartialJson(json!({
                "namePrefix": "app-logs",
                "pageToken": "page-2",
            })))
            .with_status(200)
            .with_body(r#"{"containers":[{"name":"app-logs"}],"nextPageToken":null}"#)
            .create_async()
            .await;

        let store = make_store(&server.url());
        let page = store
            .list_containers("app-logs", Some("page-2"))
            .await
            .expect("list succeeds");

        mock.assert_async().await;
        assert_eq!(page.containers.len(), 1);
        assert_eq!(page.containers[0].name, "app-logs");
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_list_streams_reports_absent_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/streams/list")
            .with_status(200)
            .with_body(r#"{"streams":[{"name":"api_2026-03-09_h_i","continuationToken":null}]}"#)
            .create_async()
            .await;

        let store = make_store(&server.url());
        let streams = store
            .list_streams("app-logs", "api_2026-03-09")
            .await
            .expect("list succeeds");
        assert_eq!(streams.len(), 1);
        assert!(streams[0].continuation_token.is_none());
    }
}
