// File:    app_hash.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Computes the SMS Retriever app hash that code messages must end with.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! SMS Retriever app hash.
//!
//! Automatic SMS retrieval only delivers messages that carry an 11-character
//! hash derived from the app's package name and signing certificate.

use crate::error::AppHashError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Length of the hash appended to code messages.
pub const APP_HASH_LEN: usize = 11;

const DIGEST_PREFIX_LEN: usize = 9;

/// Computes the app hash for `package_name` signed with the certificate whose
/// DER bytes are hex-encoded in `certificate_hex`.
///
/// # Errors
///
/// Returns [`AppHashError::EmptyPackage`] for a blank package name and
/// [`AppHashError::InvalidCertificate`] if `certificate_hex` is not hex.
pub fn app_hash(package_name: &str, certificate_hex: &str) -> Result<String, AppHashError> {
    let package_name = package_name.trim();
    if package_name.is_empty() {
        return Err(AppHashError::EmptyPackage);
    }
    let certificate_hex = certificate_hex.trim().to_ascii_lowercase();
    if certificate_hex.is_empty()
        || certificate_hex.len() % 2 != 0
        || !certificate_hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(AppHashError::InvalidCertificate(
            "expected an even number of hex digits".to_string(),
        ));
    }

    let digest = Sha256::digest(format!("{package_name} {certificate_hex}").as_bytes());
    let mut encoded = STANDARD.encode(&digest[..DIGEST_PREFIX_LEN]);
    encoded.truncate(APP_HASH_LEN);
    Ok(encoded)
}

/// Lowercase hex encoding of DER certificate bytes.
#[must_use]
pub fn certificate_hex(der: &[u8]) -> String {
    der.iter()
        .fold(String::with_capacity(der.len() * 2), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        })
}

/// Reads a certificate as DER bytes from either PEM text or raw DER.
///
/// # Errors
///
/// Returns [`AppHashError::InvalidCertificate`] for an empty input or a PEM
/// block whose body is not valid base64.
pub fn certificate_der(contents: &[u8]) -> Result<Vec<u8>, AppHashError> {
    if contents.is_empty() {
        return Err(AppHashError::InvalidCertificate("certificate is empty".to_string()));
    }
    let Ok(text) = std::str::from_utf8(contents) else {
        return Ok(contents.to_vec());
    };
    if !text.trim_start().starts_with("-----BEGIN") {
        return Ok(contents.to_vec());
    }

    let body: String = text
        .lines()
        .skip_while(|line| !line.starts_with("-----BEGIN"))
        .skip(1)
        .take_while(|line| !line.starts_with("-----END"))
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect();
    STANDARD
        .decode(body)
        .map_err(|e| AppHashError::InvalidCertificate(e.to_string()))
}
