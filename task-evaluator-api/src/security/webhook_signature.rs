//! Verification of the processor's `Stripe-Signature` header.
//!
//! The header looks like `t=1700000000,v1=<hex>,v1=<hex>`; each `v1` is an
//! HMAC-SHA256 of `"<t>.<raw body>"` keyed with the endpoint secret. Any one
//! matching `v1` is enough.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed event.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is malformed")]
    Malformed,
    #[error("no signature matches the payload")]
    Mismatch,
    #[error("signature timestamp is outside the tolerance window")]
    Expired,
    #[error("webhook secret is not usable as an HMAC key")]
    InvalidSecret,
}

struct ParsedHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<ParsedHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            // Unparseable entries are skipped; other schemes (v0) are ignored.
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(ParsedHeader {
            timestamp,
            signatures,
        }),
        _ => Err(SignatureError::Malformed),
    }
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Checks `header` against the raw request body. `now` is unix seconds.
///
/// Returns the signed timestamp on success.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<i64, SignatureError> {
    let parsed = parse_header(header)?;
    let mac = mac_for(secret, parsed.timestamp, payload)?;

    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    let age = now.abs_diff(parsed.timestamp);
    if age > tolerance.as_secs() {
        return Err(SignatureError::Expired);
    }

    Ok(parsed.timestamp)
}

/// Builds a header value the way the processor signs events.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let signature = mac_for(secret, timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"type":"checkout.session.completed"}"#;
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn accepts_valid_signature() {
        let header = signature_header(BODY, SECRET, NOW).unwrap();
        assert_eq!(
            verify_signature(BODY, &header, SECRET, DEFAULT_TOLERANCE, NOW + 10),
            Ok(NOW)
        );
    }

    #[test]
    fn any_matching_v1_is_enough() {
        let valid = signature_header(BODY, SECRET, NOW).unwrap();
        let v1 = valid.split_once(",v1=").unwrap().1;
        let header = format!("t={NOW},v1={},v0=abc,v1={v1}", "00".repeat(32));
        assert!(verify_signature(BODY, &header, SECRET, DEFAULT_TOLERANCE, NOW).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let header = signature_header(BODY, SECRET, NOW).unwrap();
        assert_eq!(
            verify_signature(b"{}", &header, SECRET, DEFAULT_TOLERANCE, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = signature_header(BODY, SECRET, NOW).unwrap();
        assert_eq!(
            verify_signature(BODY, &header, SECRET, DEFAULT_TOLERANCE, NOW + 301),
            Err(SignatureError::Expired)
        );
    }

    #[rstest]
    #[case("")]
    #[case("t=abc,v1=00")]
    #[case("v1=00ff")]
    #[case("t=1700000000")]
    #[case("t=1700000000,v1=not-hex")]
    fn rejects_malformed_headers(#[case] header: &str) {
        assert_eq!(
            verify_signature(BODY, header, SECRET, DEFAULT_TOLERANCE, NOW),
            Err(SignatureError::Malformed)
        );
    }
}
