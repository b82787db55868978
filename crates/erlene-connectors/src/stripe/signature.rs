//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header looks like `t=1492774577,v1=5257a8...`: a
//! unix timestamp followed by one or more hex HMAC-SHA256 digests computed
//! over `{timestamp}.{payload}` with the endpoint's signing secret.

use erlene_integration::{Error, Result};
use hmac::{Hmac, Mac};
use jiff::Timestamp;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed event, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Signature scheme Stripe currently uses for live events.
const SCHEME: &str = "v1";

fn mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| Error::config_validation("webhook_secret cannot key HMAC-SHA256"))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Signs a payload the way Stripe does.
///
/// The signature is computed over: `{timestamp}.{payload}`
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
    let result = mac(secret, timestamp, payload)?.finalize();
    Ok(hex::encode(result.into_bytes()))
}

/// Parsed `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    let parsed = value.parse::<i64>().map_err(|_| {
                        Error::invalid_signature(format!("'{value}' is not a timestamp"))
                    })?;
                    timestamp = Some(parsed);
                }
                SCHEME => {
                    // Malformed digests can never match; skip them.
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| Error::invalid_signature("signature header has no timestamp"))?;
        if signatures.is_empty() {
            return Err(Error::invalid_signature(format!(
                "signature header has no {SCHEME} signature"
            )));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verifies a webhook payload against its `Stripe-Signature` header.
///
/// Returns the signed timestamp on success.
///
/// # Errors
///
/// Returns an [`InvalidSignature`](erlene_integration::ErrorKind::InvalidSignature)
/// error when the header is malformed, no signature matches, or the event
/// is older than [`SIGNATURE_TOLERANCE_SECS`].
pub fn verify_signature(secret: &str, header: &str, payload: &[u8], now: Timestamp) -> Result<i64> {
    let header = SignatureHeader::parse(header)?;

    // Digest comparison runs in constant time.
    let matched = header
        .signatures
        .iter()
        .map(|signature| {
            mac(secret, header.timestamp, payload).map(|mac| mac.verify_slice(signature).is_ok())
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .any(|matched| matched);

    if !matched {
        return Err(Error::invalid_signature("no signature matches the payload"));
    }

    let age = now.as_second().saturating_sub(header.timestamp);
    if age > SIGNATURE_TOLERANCE_SECS {
        return Err(Error::invalid_signature(format!(
            "event was signed {age}s ago, beyond the {SIGNATURE_TOLERANCE_SECS}s tolerance"
        )));
    }

    Ok(header.timestamp)
}
