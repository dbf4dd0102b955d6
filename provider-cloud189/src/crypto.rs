//! Login form encryption.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

/// Prefix the login form expects on encrypted fields
pub const RSA_PREFIX: &str = "{RSA}";

/// Encrypts `value` with the page's `j_rsaKey` (base64 DER, SubjectPublicKeyInfo)
/// using PKCS#1 v1.5 and returns `{RSA}` followed by lower-case hex.
pub fn encrypt_field(value: &str, j_rsa_key: &str) -> Result<String, String> {
    let der = STANDARD
        .decode(j_rsa_key.trim())
        .map_err(|e| format!("invalid j_rsaKey encoding: {}", e))?;
    let key = RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| format!("invalid j_rsaKey: {}", e))?;
    let encrypted = key
        .encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, value.as_bytes())
        .map_err(|e| format!("rsa encryption failed: {}", e))?;
    Ok(format!("{}{}", RSA_PREFIX, hex::encode(encrypted)))
}

/// Cache-busting `noCache` query value: `0.` followed by 17 random digits.
pub fn no_cache() -> String {
    let n: u64 = rand::thread_rng().gen_range(0..100_000_000_000_000_000);
    format!("0.{:017}", n)
}
