use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::DueEvent;
use crate::domain::models::DispatchKind;

// Grace past the fire time during which queue redeliveries stay valid.
const REDELIVERY_GRACE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct CallbackSignerConfig {
    pub secret: String,
}

/// Signs due events into the queue job body and verifies them when the
/// queue calls back. The callback arrives over the open network, so nothing
/// is acted on before the signature checks out.
#[derive(Clone)]
pub struct CallbackSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

#[derive(Debug, Serialize, Deserialize)]
struct DueClaims {
    sub: Uuid,
    kind: String,
    reminder_id: Option<Uuid>,
    exp: usize,
    iat: usize,
}

impl CallbackSigner {
    pub fn new(config: CallbackSignerConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        let validation = Validation::default();

        Self {
            encoding,
            decoding,
            validation,
        }
    }

    pub fn sign(&self, event: &DueEvent, fire_at: DateTime<Utc>) -> anyhow::Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("failed to calculate current timestamp")?;
        let exp = Duration::from_secs(fire_at.timestamp().max(0) as u64) + REDELIVERY_GRACE;
        let claims = DueClaims {
            sub: event.message_id,
            kind: event.kind.as_str().to_string(),
            reminder_id: event.reminder_id,
            exp: exp.as_secs() as usize,
            iat: now.as_secs() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .context("failed to sign due callback")
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<DueEvent> {
        let claims = jsonwebtoken::decode::<DueClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .context("callback signature rejected")?;
        let kind = DispatchKind::from_str(&claims.kind)
            .with_context(|| format!("unknown callback kind {}", claims.kind))?;
        Ok(DueEvent {
            message_id: claims.sub,
            kind,
            reminder_id: claims.reminder_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &str) -> CallbackSigner {
        CallbackSigner::new(CallbackSignerConfig {
            secret: secret.to_string(),
        })
    }

    fn event() -> DueEvent {
        DueEvent {
            message_id: Uuid::new_v4(),
            kind: DispatchKind::Send,
            reminder_id: None,
        }
    }

    #[test]
    fn signed_event_round_trips() {
        let signer = signer("callback-secret");
        let event = event();
        let token = signer.sign(&event, Utc::now()).unwrap();
        let verified = signer.verify(&token).unwrap();
        assert_eq!(verified, event);
    }

    #[test]
    fn reminder_id_survives_the_round_trip() {
        let signer = signer("callback-secret");
        let event = DueEvent {
            message_id: Uuid::new_v4(),
            kind: DispatchKind::Reminder,
            reminder_id: Some(Uuid::new_v4()),
        };
        let token = signer.sign(&event, Utc::now()).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), event);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = signer("callback-secret");
        let token = signer.sign(&event(), Utc::now()).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        assert!(signer.verify(&tampered).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = signer("callback-secret").sign(&event(), Utc::now()).unwrap();
        assert!(signer("other-secret").verify(&token).is_err());
    }
}
