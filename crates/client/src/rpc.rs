// Path: crates/client/src/rpc.rs
//! Tezos-style node RPC client.

use crate::encoding::{forge_protocol_data, signed_hex};
use crate::error::ClientError;
use crate::metrics::metrics;
use async_trait::async_trait;
use baker_api::chain::{BlockTemplate, ChainRpc, DelegateStatus};
use baker_types::error::BakerError;
use baker_types::{Block, BlockMetadata, RightEntry};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const HEAD: &str = "/chains/main/blocks/head";

/// Placeholder signature the node requires in a preapply request.
const ZERO_SIGNATURE: &str =
    "edsigtXomBKi5CTRf5cjATJWSyaRvhfYNHqSUGrn4SdbYRcGwQrUGjzEfQDTuqHhuA8b2d8NarZjz8TRf65WkpQmo423BtomS8Q";

#[derive(Debug, Deserialize)]
struct HeadJson {
    hash: String,
    chain_id: String,
    protocol: String,
    header: HeaderJson,
    metadata: HeadMetadataJson,
}

#[derive(Debug, Deserialize)]
struct HeaderJson {
    level: u64,
    predecessor: String,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct HeadMetadataJson {
    level_info: LevelInfoJson,
}

#[derive(Debug, Deserialize)]
struct LevelInfoJson {
    cycle: u64,
    cycle_position: u64,
}

#[derive(Debug, Deserialize)]
struct BakingRightJson {
    level: u64,
    priority: u32,
}

#[derive(Debug, Deserialize)]
struct EndorsingRightJson {
    level: u64,
}

#[derive(Debug, Deserialize)]
struct DelegateJson {
    #[serde(default)]
    deactivated: bool,
}

#[derive(Debug, Deserialize)]
struct BootstrappedJson {
    bootstrapped: bool,
}

#[derive(Debug, Deserialize)]
struct PreapplyJson {
    shell_header: Value,
}

#[derive(Debug, Deserialize)]
struct ForgedHeaderJson {
    block: String,
}

impl From<HeadJson> for Block {
    fn from(h: HeadJson) -> Self {
        Block {
            level: h.header.level,
            cycle: h.metadata.level_info.cycle,
            hash: h.hash,
            metadata: BlockMetadata {
                predecessor: h.header.predecessor,
                protocol: h.protocol,
                chain_id: h.chain_id,
                timestamp: h.header.timestamp,
                cycle_position: h.metadata.level_info.cycle_position,
            },
        }
    }
}

fn decode_hex(route: &'static str, value: &str) -> Result<Vec<u8>, ClientError> {
    hex::decode(value).map_err(|e| ClientError::Decode {
        route,
        reason: e.to_string(),
    })
}

/// Node RPC client over a list of endpoints.
///
/// Requests go to the last endpoint that answered; a transport failure moves
/// on to the next one. HTTP error statuses are returned as-is.
#[derive(Debug)]
pub struct HttpChainClient {
    endpoints: Vec<String>,
    active: AtomicUsize,
    http: reqwest::Client,
}

impl HttpChainClient {
    /// Builds a client whose requests time out after `timeout`.
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self, ClientError> {
        if endpoints.is_empty() {
            return Err(ClientError::NoEndpoint);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;
        Ok(Self {
            endpoints: endpoints
                .into_iter()
                .map(|e| e.trim_end_matches('/').to_string())
                .collect(),
            active: AtomicUsize::new(0),
            http,
        })
    }

    /// The endpoint requests currently go to.
    pub fn active_endpoint(&self) -> &str {
        let idx = self.active.load(Ordering::Relaxed) % self.endpoints.len();
        self.endpoints.get(idx).map(String::as_str).unwrap_or_default()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        route: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        let start = self.active.load(Ordering::Relaxed);
        let mut last_err = ClientError::NoEndpoint;

        for attempt in 0..self.endpoints.len() {
            let idx = (start + attempt) % self.endpoints.len();
            let Some(base) = self.endpoints.get(idx) else {
                continue;
            };
            let mut req = self.http.request(method.clone(), format!("{base}{path}"));
            if let Some(body) = body {
                req = req.json(body);
            }

            let started = Instant::now();
            let resp = match req.send().await {
                Ok(resp) => resp,
                Err(source) => {
                    metrics().inc_requests_total(route, 0);
                    tracing::warn!(target: "rpc", route, endpoint = %base, error = %source, "endpoint unreachable");
                    last_err = ClientError::Transport { route, source };
                    continue;
                }
            };
            let status = resp.status();
            metrics().observe_request_duration(route, started.elapsed().as_secs_f64());
            metrics().inc_requests_total(route, status.as_u16());

            if idx != start {
                tracing::info!(target: "rpc", endpoint = %base, "switched RPC endpoint");
                self.active.store(idx, Ordering::Relaxed);
            }

            if !status.is_success() {
                let mut body = resp.text().await.unwrap_or_default();
                body.truncate(512);
                return Err(ClientError::Status {
                    route,
                    status: status.as_u16(),
                    body,
                });
            }
            return resp.json::<T>().await.map_err(|e| ClientError::Decode {
                route,
                reason: e.to_string(),
            });
        }
        Err(last_err)
    }

    async fn get<T: DeserializeOwned>(&self, route: &'static str, path: &str) -> Result<T, ClientError> {
        self.request(route, Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        route: &'static str,
        path: &str,
        body: &Value,
    ) -> Result<T, ClientError> {
        self.request(route, Method::POST, path, Some(body)).await
    }

    async fn forge_operation(&self, branch: &str, contents: Value) -> Result<Vec<u8>, ClientError> {
        let route = "forge_operations";
        let forged: String = self
            .post(
                route,
                &format!("{HEAD}/helpers/forge/operations"),
                &json!({ "branch": branch, "contents": contents }),
            )
            .await?;
        decode_hex(route, &forged)
    }
}

#[async_trait]
impl ChainRpc for HttpChainClient {
    async fn is_healthy(&self) -> bool {
        match self
            .get::<BootstrappedJson>("is_bootstrapped", "/chains/main/is_bootstrapped")
            .await
        {
            Ok(b) => b.bootstrapped,
            Err(e) => {
                tracing::debug!(target: "rpc", error = %e, "health probe failed");
                false
            }
        }
    }

    async fn head(&self) -> Result<Block, BakerError> {
        let head: HeadJson = self.get("head", HEAD).await?;
        Ok(head.into())
    }

    async fn baking_rights(
        &self,
        cycle: u64,
        pkh: &str,
        max_priority: u32,
    ) -> Result<Vec<RightEntry>, BakerError> {
        let rights: Vec<BakingRightJson> = self
            .get(
                "baking_rights",
                &format!(
                    "{HEAD}/helpers/baking_rights?cycle={cycle}&delegate={pkh}&max_priority={max_priority}"
                ),
            )
            .await?;
        Ok(rights
            .into_iter()
            .map(|r| RightEntry::baking(r.level, r.priority))
            .collect())
    }

    async fn endorsing_rights(&self, cycle: u64, pkh: &str) -> Result<Vec<RightEntry>, BakerError> {
        let rights: Vec<EndorsingRightJson> = self
            .get(
                "endorsing_rights",
                &format!("{HEAD}/helpers/endorsing_rights?cycle={cycle}&delegate={pkh}"),
            )
            .await?;
        Ok(rights
            .into_iter()
            .map(|r| RightEntry::endorsing(r.level))
            .collect())
    }

    async fn delegate_status(&self, pkh: &str) -> Result<DelegateStatus, BakerError> {
        match self
            .get::<DelegateJson>("delegate", &format!("{HEAD}/context/delegates/{pkh}"))
            .await
        {
            Ok(d) => Ok(DelegateStatus {
                registered: true,
                deactivated: d.deactivated,
            }),
            Err(ClientError::Status { status: 404, .. }) => Ok(DelegateStatus::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn forge_endorsement(&self, head: &Block) -> Result<Vec<u8>, BakerError> {
        let contents = json!([{ "kind": "endorsement", "level": head.level }]);
        Ok(self.forge_operation(&head.hash, contents).await?)
    }

    async fn forge_nonce_revelation(
        &self,
        head: &Block,
        level: u64,
        seed: &[u8],
    ) -> Result<Vec<u8>, BakerError> {
        let contents = json!([{
            "kind": "seed_nonce_revelation",
            "level": level,
            "nonce": hex::encode(seed),
        }]);
        Ok(self.forge_operation(&head.hash, contents).await?)
    }

    async fn forge_block(
        &self,
        head: &Block,
        template: &BlockTemplate,
    ) -> Result<Vec<u8>, BakerError> {
        // Block contents are left empty: the node fills in the shell header
        // from an empty preapply, and the protocol data is forged locally.
        let mut protocol_data = json!({
            "protocol": head.metadata.protocol,
            "priority": template.priority,
            "proof_of_work_nonce": "0000000000000000",
            "liquidity_baking_escape_vote": false,
            "signature": ZERO_SIGNATURE,
        });
        if let (Some(hash), Some(obj)) = (&template.seed_nonce_hash, protocol_data.as_object_mut()) {
            obj.insert("seed_nonce_hash".into(), Value::String(hash.clone()));
        }
        let preapplied: PreapplyJson = self
            .post(
                "preapply_block",
                &format!("{HEAD}/helpers/preapply/block?sort=true"),
                &json!({
                    "protocol_data": protocol_data,
                    "operations": [[], [], [], []],
                }),
            )
            .await?;

        let route = "forge_block_header";
        let forged: ForgedHeaderJson = self
            .post(
                route,
                &format!("{HEAD}/helpers/forge_block_header"),
                &preapplied.shell_header,
            )
            .await?;
        let mut bytes = decode_hex(route, &forged.block)?;
        bytes.extend(forge_protocol_data(
            template.priority,
            template.seed_nonce_hash.as_deref(),
        )?);
        Ok(bytes)
    }

    async fn inject_operation(&self, forged: &[u8], signature: &str) -> Result<String, BakerError> {
        let signed = signed_hex(forged, signature)?;
        let hash: String = self
            .post("inject_operation", "/injection/operation", &Value::String(signed))
            .await?;
        Ok(hash)
    }

    async fn inject_block(&self, forged: &[u8], signature: &str) -> Result<String, BakerError> {
        let signed = signed_hex(forged, signature)?;
        let hash: String = self
            .post(
                "inject_block",
                "/injection/block",
                &json!({ "data": signed, "operations": [[], [], [], []] }),
            )
            .await?;
        Ok(hash)
    }
}
