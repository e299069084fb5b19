//! Web Push transport: RFC 8291 message encryption and RFC 8292 VAPID.
//!
//! Each message is encrypted for the subscription's `p256dh`/`auth` keys as
//! a single `aes128gcm` record and POSTed to the endpoint with a freshly
//! signed ES256 VAPID token.

use std::time::Duration;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes128Gcm, KeyInit};
use async_trait::async_trait;
use base64::Engine as _;
use chrono::Utc;
use hkdf::Hkdf;
use p256::ecdh::EphemeralSecret;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::rand_core::{OsRng, RngCore};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use reqwest::StatusCode;
use serde::Serialize;
use sha2::Sha256;
use url::Url;

use super::{DeliveryOutcome, PushError, PushMessage, PushTarget, PushTransport};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Contact URI sent in the VAPID `sub` claim when none is configured.
pub const DEFAULT_SUBJECT: &str = "mailto:no-reply@example.com";

const SALT_LEN: usize = 16;
const PUBLIC_KEY_LEN: usize = 65;
const PRIVATE_KEY_LEN: usize = 32;
const AUTH_SECRET_LEN: usize = 16;
const RECORD_SIZE: u32 = 4096;
const MAX_PAYLOAD_BYTES: usize = 3800;
const VAPID_TOKEN_TTL_SECS: i64 = 12 * 60 * 60;

const IKM_INFO_PREFIX: &[u8] = b"WebPush: info\0";
const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Errors raised while reading VAPID settings.
#[derive(Debug, thiserror::Error)]
pub enum WebPushConfigError {
    #[error("Both VAPID_PUBLIC_KEY and VAPID_PRIVATE_KEY must be set")]
    IncompleteKeyPair,

    #[error("Invalid {name}: {reason}")]
    InvalidKey { name: &'static str, reason: String },

    #[error("VAPID_PUBLIC_KEY does not match VAPID_PRIVATE_KEY")]
    KeyMismatch,
}

/// VAPID application server identity.
#[derive(Clone)]
pub struct WebPushConfig {
    public_key_b64: String,
    signing_key: SigningKey,
    subject: String,
}

impl std::fmt::Debug for WebPushConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebPushConfig")
            .field("public_key_b64", &self.public_key_b64)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl WebPushConfig {
    /// Read `VAPID_PUBLIC_KEY`, `VAPID_PRIVATE_KEY` and `VAPID_SUBJECT`.
    ///
    /// Returns `Ok(None)` when neither key is set (push disabled). Setting
    /// only one of them is an error.
    pub fn from_env() -> Result<Option<Self>, WebPushConfigError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        match (read("VAPID_PUBLIC_KEY"), read("VAPID_PRIVATE_KEY")) {
            (None, None) => Ok(None),
            (Some(public), Some(private)) => {
                let subject = read("VAPID_SUBJECT").unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
                Self::new(&public, &private, subject).map(Some)
            }
            _ => Err(WebPushConfigError::IncompleteKeyPair),
        }
    }

    /// Build a config from base64url-encoded keys: the uncompressed P-256
    /// public key (65 bytes) and the raw private scalar (32 bytes).
    pub fn new(
        public_key_b64: &str,
        private_key_b64: &str,
        subject: impl Into<String>,
    ) -> Result<Self, WebPushConfigError> {
        let public_raw = decode_b64url(public_key_b64).map_err(|e| {
            WebPushConfigError::InvalidKey {
                name: "VAPID_PUBLIC_KEY",
                reason: e.to_string(),
            }
        })?;
        if public_raw.len() != PUBLIC_KEY_LEN {
            return Err(WebPushConfigError::InvalidKey {
                name: "VAPID_PUBLIC_KEY",
                reason: format!("must decode to {PUBLIC_KEY_LEN} bytes"),
            });
        }

        let private_raw = decode_b64url(private_key_b64).map_err(|e| {
            WebPushConfigError::InvalidKey {
                name: "VAPID_PRIVATE_KEY",
                reason: e.to_string(),
            }
        })?;
        let private_raw: [u8; PRIVATE_KEY_LEN] =
            private_raw
                .try_into()
                .map_err(|_| WebPushConfigError::InvalidKey {
                    name: "VAPID_PRIVATE_KEY",
                    reason: format!("must decode to {PRIVATE_KEY_LEN} bytes"),
                })?;
        let signing_key = SigningKey::from_bytes((&private_raw).into()).map_err(|_| {
            WebPushConfigError::InvalidKey {
                name: "VAPID_PRIVATE_KEY",
                reason: "not a valid P-256 scalar".to_string(),
            }
        })?;

        let derived = p256::PublicKey::from(signing_key.verifying_key()).to_encoded_point(false);
        if derived.as_bytes() != public_raw.as_slice() {
            return Err(WebPushConfigError::KeyMismatch);
        }

        Ok(Self {
            public_key_b64: public_key_b64.to_string(),
            signing_key,
            subject: subject.into(),
        })
    }

    /// The application server key browsers pass to `pushManager.subscribe`.
    pub fn public_key(&self) -> &str {
        &self.public_key_b64
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// [`PushTransport`] that talks to real push services over HTTPS.
pub struct WebPushTransport {
    config: WebPushConfig,
    client: reqwest::Client,
}

impl WebPushTransport {
    pub fn new(config: WebPushConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }

    async fn try_send(
        &self,
        target: &PushTarget,
        message: &PushMessage,
    ) -> Result<StatusCode, PushError> {
        let audience = push_service_audience(&target.endpoint)?;
        let token = sign_vapid_token(&self.config, &audience)?;

        let plaintext = serde_json::to_vec(&message.payload())?;
        if plaintext.len() > MAX_PAYLOAD_BYTES {
            return Err(PushError::PayloadTooLarge {
                size: plaintext.len(),
                max: MAX_PAYLOAD_BYTES,
            });
        }

        let ua_public: [u8; PUBLIC_KEY_LEN] = decode_b64url(target.p256dh.trim())
            .map_err(|_| PushError::InvalidKey("p256dh is not base64url"))?
            .try_into()
            .map_err(|_| PushError::InvalidKey("p256dh must decode to 65 bytes"))?;
        let auth_secret: [u8; AUTH_SECRET_LEN] = decode_b64url(target.auth.trim())
            .map_err(|_| PushError::InvalidKey("auth is not base64url"))?
            .try_into()
            .map_err(|_| PushError::InvalidKey("auth must decode to 16 bytes"))?;

        let body = encrypt_aes128gcm(&plaintext, &ua_public, &auth_secret)?;

        let mut request = self
            .client
            .post(&target.endpoint)
            .header("TTL", message.ttl.to_string())
            .header("Content-Encoding", "aes128gcm")
            .header("Content-Type", "application/octet-stream")
            .header(
                "Authorization",
                format!("vapid t={token}, k={}", self.config.public_key_b64),
            );
        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.as_str());
        }
        if let Some(topic) = message.topic.as_deref().filter(|t| !t.is_empty()) {
            request = request.header("Topic", topic);
        }

        let response = request.body(body).send().await?;
        Ok(response.status())
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(&self, target: &PushTarget, message: &PushMessage) -> DeliveryOutcome {
        match self.try_send(target, message).await {
            Ok(status) => classify_status(status),
            Err(e) => DeliveryOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Map a push service response status onto a delivery outcome.
pub fn classify_status(status: StatusCode) -> DeliveryOutcome {
    if status.is_success() {
        return DeliveryOutcome::Delivered;
    }
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => DeliveryOutcome::Gone {
            status: status.as_u16(),
        },
        _ => DeliveryOutcome::Failed {
            reason: format!("push service returned HTTP {}", status.as_u16()),
        },
    }
}

// ---------------------------------------------------------------------------
// VAPID
// ---------------------------------------------------------------------------

/// The origin of a push endpoint, used as the VAPID `aud` claim.
fn push_service_audience(endpoint: &str) -> Result<String, PushError> {
    let url = Url::parse(endpoint).map_err(|e| PushError::InvalidEndpoint(e.to_string()))?;
    if url.host_str().is_none() {
        return Err(PushError::InvalidEndpoint("missing host".to_string()));
    }
    Ok(url.origin().ascii_serialization())
}

fn sign_vapid_token(config: &WebPushConfig, audience: &str) -> Result<String, PushError> {
    #[derive(Serialize)]
    struct Claims<'a> {
        aud: &'a str,
        exp: i64,
        sub: &'a str,
    }

    let header = serde_json::json!({ "typ": "JWT", "alg": "ES256" });
    let claims = Claims {
        aud: audience,
        exp: Utc::now().timestamp() + VAPID_TOKEN_TTL_SECS,
        sub: &config.subject,
    };

    let signing_input = format!(
        "{}.{}",
        encode_b64url(&serde_json::to_vec(&header)?),
        encode_b64url(&serde_json::to_vec(&claims)?)
    );
    let signature: p256::ecdsa::Signature = config
        .signing_key
        .try_sign(signing_input.as_bytes())
        .map_err(|e| PushError::Signing(e.to_string()))?;

    Ok(format!(
        "{signing_input}.{}",
        encode_b64url(signature.to_bytes().as_slice())
    ))
}

// ---------------------------------------------------------------------------
// Encryption
// ---------------------------------------------------------------------------

fn decode_b64url(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(input.trim_end_matches('='))
}

fn encode_b64url(input: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(input)
}

fn hkdf_sha256<const N: usize>(salt: &[u8], ikm: &[u8], info: &[&[u8]]) -> Result<[u8; N], PushError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; N];
    hk.expand_multi_info(info, &mut okm)
        .map_err(|_| PushError::Encryption("HKDF expand failed"))?;
    Ok(okm)
}

/// Encrypt `plaintext` as a single `aes128gcm` record.
///
/// Output layout: `salt(16) | rs(4, BE) | idlen(1) | sender public key(65) | ciphertext`.
fn encrypt_aes128gcm(
    plaintext: &[u8],
    ua_public: &[u8; PUBLIC_KEY_LEN],
    auth_secret: &[u8; AUTH_SECRET_LEN],
) -> Result<Vec<u8>, PushError> {
    let ua_key = p256::PublicKey::from_sec1_bytes(ua_public)
        .map_err(|_| PushError::InvalidKey("p256dh is not a P-256 point"))?;

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let local_secret = EphemeralSecret::random(&mut OsRng);
    let local_point = local_secret.public_key().to_encoded_point(false);
    let local_public = local_point.as_bytes();
    let shared = local_secret.diffie_hellman(&ua_key);

    let ikm: [u8; 32] = hkdf_sha256(
        auth_secret,
        shared.raw_secret_bytes().as_slice(),
        &[IKM_INFO_PREFIX, ua_public, local_public],
    )?;
    let cek: [u8; 16] = hkdf_sha256(&salt, &ikm, &[CEK_INFO])?;
    let nonce: [u8; 12] = hkdf_sha256(&salt, &ikm, &[NONCE_INFO])?;

    // A single record is terminated by the 0x02 padding delimiter.
    let mut padded = Vec::with_capacity(plaintext.len() + 1);
    padded.extend_from_slice(plaintext);
    padded.push(2);

    let cipher = Aes128Gcm::new_from_slice(&cek)
        .map_err(|_| PushError::Encryption("invalid content encryption key"))?;
    let ciphertext = cipher
        .encrypt((&nonce).into(), padded.as_slice())
        .map_err(|_| PushError::Encryption("AES-GCM encryption failed"))?;

    let mut body = Vec::with_capacity(SALT_LEN + 5 + PUBLIC_KEY_LEN + ciphertext.len());
    body.extend_from_slice(&salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(PUBLIC_KEY_LEN as u8);
    body.extend_from_slice(local_public);
    body.extend_from_slice(&ciphertext);
    Ok(body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
