// Path: crates/client/src/signer.rs
//! Client for an HTTP remote signer.

use async_trait::async_trait;
use baker_api::signer::{Signer, SigningDomain};
use baker_types::error::BakerError;
use baker_types::SignerType;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SignatureJson {
    signature: String,
}

/// Signs through `POST {url}/keys/{pkh}`, sending the watermarked payload as
/// a hex JSON string and reading back `{"signature": "..."}`.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    url: String,
    pkh: String,
    client: reqwest::Client,
}

impl RemoteSigner {
    /// Creates a signer for the key of `pkh` held at `url`.
    pub fn new(url: impl Into<String>, pkh: impl Into<String>, timeout: Duration) -> Result<Self, BakerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BakerError::Config(e.to_string()))?;
        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            pkh: pkh.into(),
            client,
        })
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    async fn sign(
        &self,
        payload: &[u8],
        domain: SigningDomain,
        signer_type: SignerType,
    ) -> Result<String, BakerError> {
        if signer_type != SignerType::Remote {
            return Err(BakerError::SignerUnavailable(signer_type.to_string()));
        }
        let resp = self
            .client
            .post(format!("{}/keys/{}", self.url, self.pkh))
            .json(&hex::encode(payload))
            .send()
            .await
            .map_err(|e| BakerError::Signer(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(target: "signer", ?domain, %status, %body, "remote signer refused");
            return Err(BakerError::Signer(format!("remote signer returned {status}: {body}")));
        }
        let sig: SignatureJson = resp
            .json()
            .await
            .map_err(|e| BakerError::Signer(e.to_string()))?;
        tracing::debug!(target: "signer", ?domain, "payload signed remotely");
        Ok(sig.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn posts_hex_payload_to_the_key_route() {
        let app = Router::new().route(
            "/keys/:pkh",
            post(|Path(pkh): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(pkh, "tz1remote");
                assert_eq!(body, Value::String("0301ff".into()));
                Json(json!({ "signature": "edsigFAKE" }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let signer = RemoteSigner::new(format!("http://{addr}/"), "tz1remote", Duration::from_secs(2)).unwrap();
        let sig = signer
            .sign(&[0x03, 0x01, 0xff], SigningDomain::Generic, SignerType::Remote)
            .await
            .unwrap();
        assert_eq!(sig, "edsigFAKE");

        assert!(matches!(
            signer.sign(&[1], SigningDomain::Block, SignerType::Ledger).await,
            Err(BakerError::SignerUnavailable(_))
        ));
    }
}
