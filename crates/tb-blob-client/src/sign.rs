//! Request signing.
//!
//! Every request carries an HMAC-SHA256 signature over the method and the
//! path-and-query, keyed with the bucket access key. The service knows the
//! key for each bucket and verifies the signature server-side.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded signature for one request
pub fn sign_request(access_key: &str, method: &str, path_and_query: &str) -> String {
    let canonical = format!("{}\n{}", method, path_and_query);
    let mut mac = HmacSha256::new_from_slice(access_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
