use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;


type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Extract the raw signature header value from an HTTP request
///
/// Returns None when the header is absent or not valid ASCII.
pub fn extract_signature(headers: &HeaderMap) -> Option<&str> {
    headers.get(SIGNATURE_HEADER)?.to_str().ok()
}

/// Compute the signature header value for `payload`
///
/// Format: "sha256=<lower-case hex HMAC-SHA256 of payload keyed by secret>"
pub fn sign(payload: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac = new_mac(secret)?;
    mac.update(payload);
    let digest = mac.finalize().into_bytes();
    Ok(format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest)))
}

/// Verify a webhook signature header against the payload
///
/// The digest comparison is constant-time. An empty secret is a configuration
/// error and is reported as such regardless of the header.
///
/// # Errors
/// - SecretNotConfigured: secret is empty
/// - Missing: header absent or blank
/// - Malformed: no "sha256=" prefix or digest is not hex
/// - Mismatch: digest does not match the payload
pub fn verify_signature(
    payload: &[u8],
    secret: &str,
    header: Option<&str>,
) -> Result<(), SignatureError> {
    let mut mac = new_mac(secret)?;

    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::Missing)?;

    let hex_digest = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureError::Malformed)?;

    let provided = hex::decode(hex_digest).map_err(|_| SignatureError::Malformed)?;

    mac.update(payload);
    mac.verify_slice(&provided)
        .map_err(|_| SignatureError::Mismatch)
}

/// Boolean form of [`verify_signature`]
pub fn is_valid(payload: &[u8], secret: &str, header: Option<&str>) -> bool {
    verify_signature(payload, secret, header).is_ok()
}

fn new_mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::SecretNotConfigured);
    }
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::SecretNotConfigured)
}

/// Signature verification errors
#[derive(Debug, PartialEq, Clone)]
pub enum SignatureError {
    /// No shared secret configured (configuration error, not a verification failure)
    SecretNotConfigured,
    /// Signature header not present
    Missing,
    /// Header present but not "sha256=<hex>"
    Malformed,
    /// Digest does not match the payload
    Mismatch,
}

impl SignatureError {
    /// True for errors caused by server configuration rather than the request
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, SignatureError::SecretNotConfigured)
    }
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureError::SecretNotConfigured => write!(f, "Webhook secret not configured"),
            SignatureError::Missing => write!(f, "Signature header not provided"),
            SignatureError::Malformed => write!(f, "Signature header is malformed"),
            SignatureError::Mismatch => write!(f, "Signature does not match payload"),
        }
    }
}

impl std::error::Error for SignatureError {}
