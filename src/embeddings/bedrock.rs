// Cloud embedding backend: Amazon Bedrock InvokeModel.
//
// POST https://bedrock-runtime.{region}.amazonaws.com/model/{modelId}/invoke
// signed with AWS Signature Version 4. Titan models take `{"inputText"}` and
// answer `{"embedding": [...]}`; Cohere models take `{"texts": [...]}` and
// answer `{"embeddings": [[...]]}`. The model id picks the request shape.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::{check_status, EmbeddingProvider, ProviderError};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BEDROCK_MODEL: &str = "amazon.titan-embed-text-v2:0";

const PROVIDER: &str = "bedrock";
const SERVICE: &str = "bedrock";

type HmacSha256 = Hmac<Sha256>;

/// Static AWS credentials.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

pub struct BedrockEmbedder {
    client: Client,
    region: String,
    model_id: String,
    credentials: AwsCredentials,
    rate_limiter: RateLimiter,
}

impl BedrockEmbedder {
    pub fn new(
        region: &str,
        model_id: &str,
        credentials: AwsCredentials,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            client: Client::new(),
            region: region.to_string(),
            model_id: model_id.to_string(),
            credentials,
            rate_limiter,
        }
    }

    fn host(&self) -> String {
        format!("bedrock-runtime.{}.amazonaws.com", self.region)
    }

    /// Request path with the model id percent-encoded (`:` becomes `%3A`).
    fn request_path(&self) -> String {
        format!("/model/{}/invoke", uri_encode(&self.model_id))
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        if self.model_id.starts_with("cohere.") {
            json!({ "texts": [text], "input_type": "search_document" })
        } else {
            json!({ "inputText": text })
        }
    }
}

#[async_trait]
impl EmbeddingProvider for BedrockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
        self.rate_limiter.acquire().await;

        let host = self.host();
        let path = self.request_path();
        let payload = serde_json::to_vec(&self.request_body(text)).map_err(|e| {
            ProviderError::MalformedResponse {
                provider: PROVIDER,
                message: format!("could not encode request: {e}"),
            }
        })?;

        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let mut headers = vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("host".to_string(), host.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        // The signed path is the request path encoded a second time.
        let canonical_uri = canonical_path(&path);
        let authorization = sign_request(
            &self.credentials,
            &self.region,
            SERVICE,
            "POST",
            &canonical_uri,
            &headers,
            &payload,
            now,
        );

        let mut request = self
            .client
            .post(format!("https://{host}{path}"))
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .header("x-amz-date", &amz_date)
            .header("authorization", authorization);
        if let Some(token) = &self.credentials.session_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                provider: PROVIDER,
                source,
            })?;

        let response = check_status(PROVIDER, response).await?;

        let body: InvokeResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;

        let vector = body
            .into_vector()
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER,
                message: "response contained no embedding".to_string(),
            })?;

        debug!(
            model = %self.model_id,
            region = %self.region,
            dim = vector.len(),
            "Bedrock embedding"
        );

        Ok(vector)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    embedding: Option<Vec<f64>>,
    #[serde(default)]
    embeddings: Option<Vec<Vec<f64>>>,
}

impl InvokeResponse {
    fn into_vector(self) -> Option<Vec<f64>> {
        let vector = match (self.embedding, self.embeddings) {
            (Some(v), _) => v,
            (None, Some(mut rows)) if !rows.is_empty() => rows.swap_remove(0),
            _ => return None,
        };
        (!vector.is_empty()).then_some(vector)
    }
}

/// Build the SigV4 `Authorization` header value.
///
/// `headers` must already contain `host` and `x-amz-date`; names are
/// lowercased and sorted here, values trimmed.
#[allow(clippy::too_many_arguments)]
pub fn sign_request(
    credentials: &AwsCredentials,
    region: &str,
    service: &str,
    method: &str,
    canonical_uri: &str,
    headers: &[(String, String)],
    payload: &[u8],
    now: DateTime<Utc>,
) -> String {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut sorted: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_headers: String = sorted.iter().map(|(k, v)| format!("{k}:{v}\n")).collect();
    let signed_headers = sorted
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "{method}\n{canonical_uri}\n\n{canonical_headers}\n{signed_headers}\n{}",
        hex::encode(Sha256::digest(payload))
    );

    let scope = format!("{date}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(&credentials.secret_access_key, &date, region, service);
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    format!(
        "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    )
}

/// Derive the SigV4 signing key for one day/region/service.
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// RFC 3986 unreserved characters; everything else is percent-encoded.
const SIGV4_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn uri_encode(segment: &str) -> String {
    utf8_percent_encode(segment, SIGV4_UNRESERVED).to_string()
}

/// Encode each segment of an absolute path, keeping the `/` separators.
fn canonical_path(path: &str) -> String {
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn example_credentials() -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: None,
        }
    }

    #[test]
    fn test_signing_key_matches_aws_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_sign_get_vanilla() {
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        let headers = vec![
            ("Host".to_string(), "example.amazonaws.com".to_string()),
            ("X-Amz-Date".to_string(), "20150830T123600Z".to_string()),
        ];
        let auth = sign_request(
            &example_credentials(),
            "us-east-1",
            "service",
            "GET",
            "/",
            &headers,
            b"",
            now,
        );
        assert_eq!(
            auth,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
    }

    #[test]
    fn test_model_id_path_is_double_encoded_for_signing() {
        let embedder = BedrockEmbedder::new(
            "eu-west-1",
            "amazon.titan-embed-text-v2:0",
            example_credentials(),
            RateLimiter::unlimited(),
        );
        let path = embedder.request_path();
        assert_eq!(path, "/model/amazon.titan-embed-text-v2%3A0/invoke");
        assert_eq!(
            canonical_path(&path),
            "/model/amazon.titan-embed-text-v2%253A0/invoke"
        );
        assert_eq!(embedder.host(), "bedrock-runtime.eu-west-1.amazonaws.com");
    }

    #[test]
    fn test_uri_encode_keeps_only_unreserved() {
        assert_eq!(uri_encode("a-z_0.9~"), "a-z_0.9~");
        assert_eq!(uri_encode("a b/c:d+é"), "a%20b%2Fc%3Ad%2B%C3%A9");
        assert_eq!(canonical_path("/model/x%3A0/invoke"), "/model/x%253A0/invoke");
    }

    #[test]
    fn test_request_body_per_model_family() {
        let titan = BedrockEmbedder::new(
            DEFAULT_REGION,
            DEFAULT_BEDROCK_MODEL,
            example_credentials(),
            RateLimiter::unlimited(),
        );
        assert_eq!(titan.request_body("hi"), json!({ "inputText": "hi" }));

        let cohere = BedrockEmbedder::new(
            DEFAULT_REGION,
            "cohere.embed-english-v3",
            example_credentials(),
            RateLimiter::unlimited(),
        );
        assert_eq!(
            cohere.request_body("hi"),
            json!({ "texts": ["hi"], "input_type": "search_document" })
        );
    }

    #[test]
    fn test_parse_titan_and_cohere_responses() {
        let titan: InvokeResponse =
            serde_json::from_str(r#"{"embedding": [0.5, 0.25], "inputTextTokenCount": 2}"#)
                .unwrap();
        assert_eq!(titan.into_vector(), Some(vec![0.5, 0.25]));

        let cohere: InvokeResponse =
            serde_json::from_str(r#"{"embeddings": [[1.0, 2.0]], "id": "x"}"#).unwrap();
        assert_eq!(cohere.into_vector(), Some(vec![1.0, 2.0]));

        let neither: InvokeResponse = serde_json::from_str(r#"{"message": "nope"}"#).unwrap();
        assert_eq!(neither.into_vector(), None);
    }
}
