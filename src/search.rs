//! Signed search request
//!
//! Parameters are sorted by key and form-urlencoded into a canonical string, which is
//! signed with HMAC-SHA256 under the secret key. The hex signature travels as the
//! `sign` query parameter. The scheme is illustrative and does not target any
//! particular provider's documented algorithm.

use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info};

use crate::error::{ReportError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_ENDPOINT: &str = "https://aip.baidubce.com/rpc/2.0/antiproduct/v1/search/query";
pub const DEFAULT_RESULTS: u32 = 10;
pub const MAX_RESULTS: u32 = 100;
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Query parameters of one search, before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    /// Number of results, at most [`MAX_RESULTS`]
    pub rn: u32,
    /// Result offset
    pub pn: u32,
    pub ie: String,
    pub oe: String,
    /// Unix seconds
    pub timestamp: i64,
}

impl SearchParams {
    pub fn new(query: &str, timestamp: i64) -> Self {
        SearchParams {
            query: query.to_string(),
            rn: DEFAULT_RESULTS,
            pn: 0,
            ie: DEFAULT_ENCODING.to_string(),
            oe: DEFAULT_ENCODING.to_string(),
            timestamp,
        }
    }

    /// Parameters stamped with the current time
    pub fn now(query: &str) -> Self {
        Self::new(query, chrono::Utc::now().timestamp())
    }

    pub fn with_results(mut self, rn: u32) -> Self {
        self.rn = rn.min(MAX_RESULTS);
        self
    }

    pub fn with_offset(mut self, pn: u32) -> Self {
        self.pn = pn;
        self
    }

    /// Key/value pairs sorted by key
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("query", self.query.clone()),
            ("rn", self.rn.min(MAX_RESULTS).to_string()),
            ("pn", self.pn.to_string()),
            ("ie", self.ie.clone()),
            ("oe", self.oe.clone()),
            ("timestamp", self.timestamp.to_string()),
        ];
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }
}

/// `application/x-www-form-urlencoded` string of the key-sorted parameters
///
/// Only ASCII letters, digits and `_.-~` pass through unescaped, and a space
/// becomes `+`.
pub fn canonical_query(params: &SearchParams) -> String {
    params
        .pairs()
        .iter()
        .map(|(key, value)| format!("{}={}", quote_plus(key), quote_plus(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn quote_plus(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
        .replace("%7E", "~")
}

/// Lower-case hex HMAC-SHA256 of `canonical` under `secret`
pub fn sign(secret: &str, canonical: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 takes keys of any size"),
    };
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// HTTP settings for [`SearchClient`]
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("sheetreport/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Key pair issued by the search provider
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask(&self.api_key))
            .field("secret_key", &"***")
            .finish()
    }
}

fn mask(key: &str) -> String {
    let shown: String = key.chars().take(4).collect();
    format!("{shown}***")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "abstract", default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
    #[serde(default)]
    pub result: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn is_success(&self) -> bool {
        self.error_code == 0
    }
}

/// Blocking client for the signed search endpoint
pub struct SearchClient {
    config: SearchConfig,
    credentials: Credentials,
    client: reqwest::blocking::Client,
}

impl SearchClient {
    pub fn new(config: SearchConfig, credentials: Credentials) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(SearchClient {
            config,
            credentials,
            client,
        })
    }

    /// GET request carrying every parameter plus `sign`
    pub fn build_request(&self, params: &SearchParams) -> Result<reqwest::blocking::Request> {
        let signature = sign(&self.credentials.secret_key, &canonical_query(params));

        let mut query = params.pairs();
        query.push(("sign", signature));

        let request = self
            .client
            .get(&self.config.endpoint)
            .query(&query)
            .build()?;
        Ok(request)
    }

    /// Run one search with the default result count and the current timestamp
    pub fn search(&self, query: &str) -> Result<SearchResponse> {
        self.send(&SearchParams::now(query))
    }

    pub fn send(&self, params: &SearchParams) -> Result<SearchResponse> {
        let request = self.build_request(params)?;
        debug!(
            url = %request.url(),
            api_key = %mask(&self.credentials.api_key),
            "sending search request"
        );

        let response = self.client.execute(request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::HttpStatus(status.as_u16()));
        }

        let body = response.text()?;
        let decoded: SearchResponse = serde_json::from_str(&body)?;
        info!(
            error_code = decoded.error_code,
            hits = decoded.result.len(),
            "search completed"
        );
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn client() -> SearchClient {
        SearchClient::new(
            SearchConfig {
                endpoint: "http://127.0.0.1:9/search".to_string(),
                ..SearchConfig::default()
            },
            Credentials {
                api_key: "ak".to_string(),
                secret_key: "sk".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_sign_matches_rfc4231_case_2() {
        assert_eq!(
            sign("Jefe", "what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_canonical_query_is_sorted_and_encoded() {
        let params = SearchParams::new("Python 开发者", 1_700_000_000);
        assert_eq!(
            canonical_query(&params),
            "ie=utf-8&oe=utf-8&pn=0&query=Python+%E5%BC%80%E5%8F%91%E8%80%85&rn=10&timestamp=1700000000"
        );
    }

    #[test]
    fn test_canonical_query_reserved_characters() {
        let params = SearchParams::new("a*b ~c/d&e=f", 0);
        let canonical = canonical_query(&params);
        assert!(canonical.contains("query=a%2Ab+~c%2Fd%26e%3Df&"), "{canonical}");
        assert!(canonical.starts_with("ie=utf-8&oe=utf-8&pn=0&"));
    }

    #[test]
    fn test_results_capped() {
        let params = SearchParams::new("q", 0).with_results(500).with_offset(20);
        assert_eq!(params.rn, MAX_RESULTS);
        assert_eq!(params.pn, 20);
    }

    #[test]
    fn test_build_request_carries_signature() {
        let params = SearchParams::new("rust", 1_700_000_000);
        let request = client().build_request(&params).unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        let query: HashMap<String, String> = request.url().query_pairs().into_owned().collect();
        assert_eq!(query.len(), 7);
        assert_eq!(query["query"], "rust");
        assert_eq!(query["rn"], "10");
        assert_eq!(query["sign"], sign("sk", &canonical_query(&params)));
    }

    #[test]
    fn test_decode_response() {
        let body = r#"{"error_code":0,"result":[{"title":"T","url":"http://x","abstract":"A"}]}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_success());
        assert_eq!(response.result[0].summary, "A");
        assert_eq!(response.error_msg, "");
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = Credentials {
            api_key: "abcdefgh".to_string(),
            secret_key: "topsecret".to_string(),
        };
        let shown = format!("{creds:?}");
        assert!(!shown.contains("topsecret"));
        assert!(shown.contains("abcd***"));
    }
}
