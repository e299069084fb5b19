//! Push delivery channel.
//!
//! [`PushTransport`] is the seam between the dispatcher and the network:
//! production uses [`web_push::WebPushTransport`], tests substitute a
//! recording fake. A transport never returns an error; every attempt ends in
//! a [`DeliveryOutcome`] the dispatcher acts on.

pub mod web_push;

use async_trait::async_trait;
use campus_core::types::DbId;
use campus_db::models::push_subscription::PushSubscription;
use serde::{Deserialize, Serialize};

/// Default message time-to-live at the push service (12 hours).
pub const DEFAULT_TTL_SECS: u32 = 43_200;

/// Title used when a message carries an empty one.
const DEFAULT_TITLE: &str = "Уведомление";

/// Click-through URL used when a message carries none.
const DEFAULT_URL: &str = "/";

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Delivery priority hint forwarded in the `Urgency` header (RFC 8030).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    VeryLow,
    Low,
    #[default]
    Normal,
    High,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::VeryLow => "very-low",
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::High => "high",
        }
    }
}

/// One push message, identical for every target of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub tag: Option<String>,
    pub kind: Option<String>,
    pub ttl: u32,
    pub urgency: Option<Urgency>,
    pub topic: Option<String>,
}

impl PushMessage {
    /// A message with the default TTL and no urgency or topic.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            url: None,
            tag: None,
            kind: None,
            ttl: DEFAULT_TTL_SECS,
            urgency: None,
            topic: None,
        }
    }

    /// The JSON document the service worker receives.
    pub fn payload(&self) -> PushPayload<'_> {
        let title = match self.title.trim() {
            "" => DEFAULT_TITLE,
            _ => self.title.as_str(),
        };
        PushPayload {
            title,
            body: self.body.as_deref().unwrap_or_default(),
            url: self
                .url
                .as_deref()
                .filter(|u| !u.is_empty())
                .unwrap_or(DEFAULT_URL),
            tag: self.tag.as_deref(),
            kind: self.kind.as_deref(),
        }
    }
}

/// Serialized body of a push message, before encryption.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PushPayload<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Where to deliver: the endpoint plus the browser's encryption keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    pub subscription_id: DbId,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

impl From<PushSubscription> for PushTarget {
    fn from(sub: PushSubscription) -> Self {
        Self {
            subscription_id: sub.id,
            endpoint: sub.endpoint,
            p256dh: sub.p256dh,
            auth: sub.auth,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome / errors
// ---------------------------------------------------------------------------

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The push service accepted the message (2xx).
    Delivered,
    /// The endpoint no longer exists (404 or 410); the subscription should
    /// be removed.
    Gone { status: u16 },
    /// Anything else. Not retried.
    Failed { reason: String },
}

/// Errors raised while preparing or sending a Web Push request.
///
/// These never leave the transport; they are reported as
/// [`DeliveryOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Invalid push endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid subscription key: {0}")]
    InvalidKey(&'static str),

    #[error("Encryption failed: {0}")]
    Encryption(&'static str),

    #[error("VAPID signing failed: {0}")]
    Signing(String),

    #[error("Payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends one message to one subscription.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, target: &PushTarget, message: &PushMessage) -> DeliveryOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_applies_defaults() {
        let message = PushMessage::new("  ");
        let json = serde_json::to_value(message.payload()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "title": "Уведомление", "body": "", "url": "/" })
        );
    }

    #[test]
    fn payload_carries_tag_and_type() {
        let mut message = PushMessage::new("Скоро пара: Algebra");
        message.body = Some("Лекция в 301, начало в 10:00".into());
        message.url = Some("/schedule".into());
        message.tag = Some("lesson-12".into());
        message.kind = Some("lesson".into());

        let json = serde_json::to_value(message.payload()).unwrap();
        assert_eq!(json["type"], "lesson");
        assert_eq!(json["tag"], "lesson-12");
        assert_eq!(json["url"], "/schedule");
    }

    #[test]
    fn new_message_uses_default_ttl() {
        let message = PushMessage::new("t");
        assert_eq!(message.ttl, DEFAULT_TTL_SECS);
        assert_eq!(message.urgency, None);
    }

    #[test]
    fn urgency_uses_kebab_case() {
        let parsed: Urgency = serde_json::from_str("\"very-low\"").unwrap();
        assert_eq!(parsed, Urgency::VeryLow);
        assert_eq!(Urgency::default().as_str(), "normal");
    }

    #[test]
    fn payload_too_large_message() {
        let err = PushError::PayloadTooLarge { size: 5000, max: 3800 };
        assert_eq!(
            err.to_string(),
            "Payload of 5000 bytes exceeds the 3800 byte limit"
        );
    }
}
