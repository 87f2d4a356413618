//! Inbound webhook signature check (`X-AgentMail-Signature`).

use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-AgentMail-Signature";

/// Verify a hex HMAC-SHA256 of `body` under `secret`. The header may carry a `sha256=` prefix.
///
/// Returns `false` on a missing header, bad hex, or mismatch. Comparison is constant-time.
pub fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return false;
    };
    let hex_sig = match header.split_once('=') {
        Some((scheme, sig)) if scheme.eq_ignore_ascii_case("sha256") => sig,
        _ => header,
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Signature value from a captured header map. Header names match case-insensitively.
pub fn header_signature(headers: &Map<String, Value>) -> Option<&str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(SIGNATURE_HEADER))
        .and_then(|(_, v)| v.as_str())
}

/// Hex HMAC-SHA256 of `body`, the value a sender puts in the signature header.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(body);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

/// Check a request against an optional secret. No secret configured => accepted.
pub fn check_request(secret: Option<&str>, body: &[u8], header: Option<&str>) -> bool {
    match secret {
        None => true,
        Some(secret) => {
            let ok = verify_signature(secret, body, header);
            if !ok {
                tracing::warn!(target: "daemon::feed", has_header = header.is_some(), "Webhook signature rejected");
            }
            ok
        }
    }
}
