// Path: crates/client/src/encoding.rs
//! Base58check, seed nonce commitment and signing watermark encodings.

use crate::error::ClientError;
use baker_api::signer::SigningDomain;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Prefix of a seed nonce hash (`nce...`).
const NONCE_HASH_PREFIX: [u8; 3] = [69, 220, 169];
/// Length of the chain id prefix (`Net...`).
const CHAIN_ID_PREFIX_LEN: usize = 3;
/// Length of the seed nonce hash prefix.
const NONCE_HASH_PREFIX_LEN: usize = 3;

/// Decodes a base58check string and drops its `prefix_len`-byte type prefix.
pub fn decode_b58check(value: &str, prefix_len: usize) -> Result<Vec<u8>, ClientError> {
    let raw = bs58::decode(value)
        .with_check(None)
        .into_vec()
        .map_err(|_| ClientError::Base58(value.to_string()))?;
    raw.get(prefix_len..)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| ClientError::Base58(value.to_string()))
}

/// Raw 64 bytes of a base58check signature, whatever its curve prefix.
pub fn signature_bytes(signature: &str) -> Result<Vec<u8>, ClientError> {
    let prefix_len = if signature.starts_with("edsig") || signature.starts_with("spsig1") {
        5
    } else if signature.starts_with("p2sig") {
        4
    } else if signature.starts_with("sig") {
        3
    } else {
        return Err(ClientError::Base58(signature.to_string()));
    };
    let bytes = decode_b58check(signature, prefix_len)?;
    if bytes.len() != 64 {
        return Err(ClientError::Base58(signature.to_string()));
    }
    Ok(bytes)
}

/// The commitment published in a block header for `seed`.
pub fn nonce_hash(seed: &[u8]) -> String {
    let digest = Blake2b256::digest(seed);
    let payload = [NONCE_HASH_PREFIX.as_slice(), digest.as_slice()].concat();
    bs58::encode(payload).with_check().into_string()
}

/// `forged` prefixed with the magic byte of `domain` and, for blocks and
/// endorsements, the chain id. This is what signers actually sign.
pub fn watermarked(
    domain: SigningDomain,
    chain_id: &str,
    forged: &[u8],
) -> Result<Vec<u8>, ClientError> {
    let mut out = vec![domain.magic_byte()];
    if domain != SigningDomain::Generic {
        out.extend(decode_b58check(chain_id, CHAIN_ID_PREFIX_LEN)?);
    }
    out.extend_from_slice(forged);
    Ok(out)
}

/// Binary protocol data of a block header: priority, proof-of-work nonce,
/// optional seed nonce hash and the liquidity baking escape vote.
///
/// The proof-of-work nonce is left at zero.
pub fn forge_protocol_data(
    priority: u32,
    seed_nonce_hash: Option<&str>,
) -> Result<Vec<u8>, ClientError> {
    let priority = u16::try_from(priority).map_err(|_| ClientError::Decode {
        route: "forge_protocol_data",
        reason: format!("priority {priority} out of range"),
    })?;
    let mut out = Vec::with_capacity(2 + 8 + 33 + 1);
    out.extend_from_slice(&priority.to_be_bytes());
    out.extend_from_slice(&[0u8; 8]);
    match seed_nonce_hash {
        Some(hash) => {
            out.push(0xff);
            out.extend(decode_b58check(hash, NONCE_HASH_PREFIX_LEN)?);
        }
        None => out.push(0x00),
    }
    out.push(0x00);
    Ok(out)
}

/// Hex of `forged` followed by the raw signature.
pub fn signed_hex(forged: &[u8], signature: &str) -> Result<String, ClientError> {
    let sig = signature_bytes(signature)?;
    Ok(hex::encode([forged, sig.as_slice()].concat()))
}
