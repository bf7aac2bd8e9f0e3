//! SQS JSON protocol client.
//!
//! Speaks the `application/x-amz-json-1.0` flavour of the SQS API, which
//! ElasticMQ and other SQS-compatible services accept without request
//! signing.
//!
//! ElasticMQ understands this protocol from release 1.4.0 onward. Older
//! releases only answer the Query/XML protocol and are not supported.

use std::collections::BTreeMap;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::TransportError;
use crate::config::QueueConfig;
use crate::queue::QueueService;

const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const TARGET_HEADER: &str = "X-Amz-Target";
const TARGET_PREFIX: &str = "AmazonSQS";

#[derive(Debug, Default, Deserialize)]
struct ListQueuesResponse {
    #[serde(rename = "QueueUrls", default)]
    queue_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GetQueueAttributesRequest<'a> {
    #[serde(rename = "QueueUrl")]
    queue_url: &'a str,
    #[serde(rename = "AttributeNames")]
    attribute_names: &'a [&'a str],
}

#[derive(Debug, Default, Deserialize)]
struct GetQueueAttributesResponse {
    #[serde(rename = "Attributes", default)]
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(default, alias = "Message")]
    message: String,
}

impl ErrorResponse {
    /// Error code without the `com.amazonaws.sqs#` namespace.
    fn code(&self) -> &str {
        self.kind.rsplit('#').next().unwrap_or(&self.kind)
    }
}

/// HTTP client for an SQS-compatible endpoint.
#[derive(Debug, Clone)]
pub struct SqsClient {
    client: Client,
    endpoint: Url,
}

impl SqsClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    /// Returns `TransportError::InvalidEndpoint` if the endpoint is not a URL,
    /// or `TransportError::Http` if the HTTP client cannot be built.
    pub fn new(config: &QueueConfig) -> Result<Self, TransportError> {
        let endpoint = Url::parse(&config.endpoint)?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<B, R>(&self, action: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(TARGET_HEADER, format!("{TARGET_PREFIX}.{action}"))
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                code: error.code().to_string(),
                message: error.message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl QueueService for SqsClient {
    async fn list_queues(&self) -> Result<Vec<String>, TransportError> {
        let response: ListQueuesResponse = self.call("ListQueues", &serde_json::json!({})).await?;
        Ok(response.queue_urls)
    }

    async fn get_attributes(
        &self,
        queue_url: &str,
        names: &[&str],
    ) -> Result<BTreeMap<String, String>, TransportError> {
        let request = GetQueueAttributesRequest {
            queue_url,
            attribute_names: names,
        };
        let response: GetQueueAttributesResponse =
            self.call("GetQueueAttributes", &request).await?;
        Ok(response.attributes)
    }
}
