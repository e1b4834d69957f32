//! Payment-gateway client and charge-signature verification.
//!
//! The gateway is a trait so the API layer stays independent of transport:
//! `HttpGateway` talks to the real SaaS over HTTPS, `SandboxGateway`
//! fabricates subscriptions locally for development and tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Gateway-side subscription as returned on creation.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySubscription {
    pub id: String,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_subscription(&self, plan_id: &str) -> Result<GatewaySubscription>;
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()>;
    async fn refund_payment(&self, payment_id: &str) -> Result<()>;
}

/// reqwest-backed client authenticating with the gateway key pair.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    key: String,
    secret: String,
}

impl HttpGateway {
    pub fn new(base_url: String, key: String, secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            key,
            secret,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_subscription(&self, plan_id: &str) -> Result<GatewaySubscription> {
        let body = serde_json::json!({
            "plan_id": plan_id,
            "total_count": 12,
            "customer_notify": 1,
        });
        let sub = self
            .client
            .post(format!("{}/subscriptions", self.base_url))
            .basic_auth(&self.key, Some(&self.secret))
            .json(&body)
            .send()
            .await
            .context("create subscription")?
            .error_for_status()
            .context("gateway rejected subscription create")?
            .json::<GatewaySubscription>()
            .await
            .context("parse subscription response")?;
        Ok(sub)
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()> {
        self.client
            .post(format!("{}/subscriptions/{subscription_id}/cancel", self.base_url))
            .basic_auth(&self.key, Some(&self.secret))
            .send()
            .await
            .context("cancel subscription")?
            .error_for_status()
            .context("gateway rejected subscription cancel")?;
        Ok(())
    }

    async fn refund_payment(&self, payment_id: &str) -> Result<()> {
        self.client
            .post(format!("{}/payments/{payment_id}/refund", self.base_url))
            .basic_auth(&self.key, Some(&self.secret))
            .send()
            .await
            .context("refund payment")?
            .error_for_status()
            .context("gateway rejected refund")?;
        Ok(())
    }
}

/// Offline stand-in used when no gateway credentials are configured.
/// Subscriptions get local ids and the gateway's initial "created" status.
#[derive(Default)]
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_subscription(&self, _plan_id: &str) -> Result<GatewaySubscription> {
        Ok(GatewaySubscription {
            id: format!("sub_{}", Uuid::new_v4().simple()),
            status: "created".to_string(),
        })
    }

    async fn cancel_subscription(&self, _subscription_id: &str) -> Result<()> {
        Ok(())
    }

    async fn refund_payment(&self, _payment_id: &str) -> Result<()> {
        Ok(())
    }
}

/// Expected charge signature: hex HMAC-SHA256 of `payment_id|subscription_id`
/// under the gateway secret.
pub fn sign_charge(secret: &str, payment_id: &str, subscription_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payment_id.as_bytes());
    mac.update(b"|");
    mac.update(subscription_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison against the signature the gateway sent back.
pub fn verify_charge(secret: &str, payment_id: &str, subscription_id: &str, signature: &str) -> bool {
    let Ok(sig_bytes) = hex::decode(signature) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payment_id.as_bytes());
    mac.update(b"|");
    mac.update(subscription_id.as_bytes());
    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_roundtrip_verifies() {
        let sig = sign_charge("secret", "pay_1", "sub_1");
        assert!(verify_charge("secret", "pay_1", "sub_1", &sig));
        assert!(!verify_charge("secret", "pay_2", "sub_1", &sig));
        assert!(!verify_charge("other", "pay_1", "sub_1", &sig));
        assert!(!verify_charge("secret", "pay_1", "sub_1", "not-hex!"));
    }
}
