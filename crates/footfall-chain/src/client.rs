//! `ChainGateway`: the narrow adapter over the external content-addressed
//! transaction ledger (spec.md §4.5). Every outbound request is signed
//! with this server's [`ChainSigningKey`], the way `FederationClient`
//! signs every server-to-server request with its `ServerKeyPair`.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use footfall_common::config::ChainConfig;

use crate::error::ChainError;
use crate::keys::ChainSigningKey;
use crate::types::*;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct ChainGateway {
    http: Client,
    signing_key: ChainSigningKey,
    network_id: String,
    package_handle: String,
    registry_handle: String,
    rpc_url: String,
}

impl ChainGateway {
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let signing_key = ChainSigningKey::from_hex(&config.signing_key_hex)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChainError::Other(anyhow::anyhow!("failed to build chain http client: {e}")))?;
        Ok(Self {
            http,
            signing_key,
            network_id: config.network_id.clone(),
            package_handle: config.package_handle.clone(),
            registry_handle: config.registry_handle.clone(),
            rpc_url: config.rpc_url.clone(),
        })
    }

    pub fn public_key_hex(&self) -> String {
        self.signing_key.public_key_hex()
    }

    pub async fn register_device(
        &self,
        device_id: &str,
        public_key_hex: &str,
    ) -> Result<RegisterDeviceResponse, ChainError> {
        let req = RegisterDeviceRequest { device_id, public_key_hex };
        self.signed_post("registerDevice", &req).await
    }

    pub async fn submit_step_data(
        &self,
        chain_device_handle: &str,
        total_steps: i64,
        timestamps: &[i64],
        signatures: &[String],
    ) -> Result<SubmitStepDataResponse, ChainError> {
        let req = SubmitStepDataRequest {
            chain_device_handle,
            total_steps,
            timestamps,
            signatures,
        };
        self.signed_post("submitStepData", &req).await
    }

    pub async fn create_pet(
        &self,
        name: &str,
        device_id: &str,
        color: Option<&str>,
    ) -> Result<CreatePetResponse, ChainError> {
        let req = CreatePetRequest { name, device_id, color };
        self.signed_post("createPet", &req).await
    }

    pub async fn claim_resources(
        &self,
        chain_pet_handle: &str,
        steps: i64,
    ) -> Result<ClaimResourcesResponse, ChainError> {
        let req = ClaimResourcesRequest { chain_pet_handle, steps };
        self.signed_post("claimResources", &req).await
    }

    pub async fn feed_pet(&self, chain_pet_handle: &str) -> Result<FeedPetResponse, ChainError> {
        let req = FeedPetRequest { chain_pet_handle };
        self.signed_post("feedPet", &req).await
    }

    pub async fn play_with_pet(
        &self,
        chain_pet_handle: &str,
    ) -> Result<PlayWithPetResponse, ChainError> {
        let req = PlayWithPetRequest { chain_pet_handle };
        self.signed_post("playWithPet", &req).await
    }

    pub async fn get_pet(&self, chain_pet_handle: &str) -> Result<Option<PetSnapshot>, ChainError> {
        let uri = format!("/v1/pet/{chain_pet_handle}");
        match self.signed_get(&uri).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(ChainError::Rejected(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_balance(&self) -> Result<String, ChainError> {
        let resp: BalanceResponse = self.signed_get("/v1/balance").await?;
        Ok(resp.balance)
    }

    // ── Signed request plumbing ──────────────────────────────────────────

    async fn signed_post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        operation: &str,
        body: &Req,
    ) -> Result<Resp, ChainError> {
        let uri = format!("/v1/{operation}");
        let body = serde_json::to_value(body)
            .map_err(|e| ChainError::Other(anyhow::anyhow!("failed to encode chain request: {e}")))?;
        let sig = self.sign_request("POST", &uri, Some(&body));
        let url = format!("{}{}", self.rpc_url, uri);
        debug!(operation, %url, "chain POST");
        let resp = self
            .http
            .post(&url)
            .header("Authorization", sig)
            .header("X-Footfall-Network", &self.network_id)
            .header("X-Footfall-Package", &self.package_handle)
            .header("X-Footfall-Registry", &self.registry_handle)
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn signed_get<Resp: DeserializeOwned>(&self, uri: &str) -> Result<Resp, ChainError> {
        let sig = self.sign_request("GET", uri, None);
        let url = format!("{}{}", self.rpc_url, uri);
        debug!(%url, "chain GET");
        let resp = self
            .http
            .get(&url)
            .header("Authorization", sig)
            .header("X-Footfall-Network", &self.network_id)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode<Resp: DeserializeOwned>(resp: reqwest::Response) -> Result<Resp, ChainError> {
        let status = resp.status();
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChainError::Rejected(body));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChainError::Http(format!("{status}: {body}")));
        }
        resp.json::<Resp>()
            .await
            .map_err(|e| ChainError::Protocol(e.to_string()))
    }

    /// Build the `Authorization: FootfallChain key="...",sig="..."` header,
    /// signing the canonical (sorted-key) JSON of `{method, uri, content}`.
    fn sign_request(&self, method: &str, uri: &str, content: Option<&Value>) -> String {
        let mut map = BTreeMap::new();
        map.insert("method", Value::String(method.to_owned()));
        map.insert("uri", Value::String(uri.to_owned()));
        if let Some(body) = content {
            map.insert("content", body.clone());
        }
        let canonical = serde_json::to_string(&map).expect("BTreeMap serialisation is infallible");
        let sig = self.signing_key.sign(canonical.as_bytes());
        format!(
            r#"FootfallChain key="{}",sig="{}""#,
            self.signing_key.public_key_hex(),
            hex::encode(sig),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChainConfig {
        ChainConfig {
            network_id: "devnet".into(),
            package_handle: "0xpkg".into(),
            registry_handle: "0xreg".into(),
            signing_key_hex: hex::encode(ChainSigningKey::generate().sign(b"")),
            rpc_url: "https://chain.example.invalid".into(),
        }
    }

    #[test]
    fn sign_request_is_deterministic_for_same_inputs() {
        let config = test_config();
        // sign_request derives its own key from a freshly generated gateway,
        // so build the gateway once and sign twice.
        let gateway = ChainGateway::new(&ChainConfig {
            signing_key_hex: hex::encode([7u8; 32]),
            ..config
        })
        .unwrap();
        let a = gateway.sign_request("GET", "/v1/balance", None);
        let b = gateway.sign_request("GET", "/v1/balance", None);
        assert_eq!(a, b);
        assert!(a.starts_with("FootfallChain key=\""));
    }

    #[test]
    fn sign_request_changes_with_body() {
        let gateway = ChainGateway::new(&ChainConfig {
            signing_key_hex: hex::encode([9u8; 32]),
            ..test_config()
        })
        .unwrap();
        let a = gateway.sign_request("POST", "/v1/registerDevice", Some(&serde_json::json!({"a": 1})));
        let b = gateway.sign_request("POST", "/v1/registerDevice", Some(&serde_json::json!({"a": 2})));
        assert_ne!(a, b);
    }
}
