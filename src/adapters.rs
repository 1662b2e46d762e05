use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use time::{OffsetDateTime, UtcOffset};

use crate::config::SmsConfig;
use crate::ports;
use crate::sms;
use crate::types::push::{PushMessage, Subscription, VapidConfig};

const VAPID_CLAIM_LIFETIME: time::Duration = time::Duration::hours(12);
const SMS_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy)]
pub struct TokioTimeProvider {
    offset: UtcOffset,
}

impl TokioTimeProvider {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("web push failed: {0}")]
    WebPush(#[from] web_push::WebPushError),
    #[error("failed to encode push payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    ttl_seconds: u32,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig, ttl_seconds: u32) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            ttl_seconds,
            client: Arc::new(client),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.vapid.public_key
    }
}

impl ports::PushSender for WebPushSender {
    type Error = PushError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a Subscription,
        message: &'a PushMessage,
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let payload = serde_json::to_vec(message)?;
            let subscription_info = web_push::SubscriptionInfo::new(
                subscription.endpoint.clone(),
                subscription.keys.p256dh.clone(),
                subscription.keys.auth.clone(),
            );
            let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
            builder.set_payload(web_push::ContentEncoding::Aes128Gcm, &payload);
            builder.set_ttl(self.ttl_seconds);
            let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
                &self.vapid.private_key,
                web_push::URL_SAFE_NO_PAD,
                &subscription_info,
            )?;
            let expires_at = OffsetDateTime::now_utc() + VAPID_CLAIM_LIFETIME;
            signature_builder.add_claim("sub", self.vapid.subject.as_str());
            signature_builder.add_claim("exp", expires_at.unix_timestamp());
            builder.set_vapid_signature(signature_builder.build()?);
            self.client.send(builder.build()?).await?;
            Ok(())
        })
    }
}

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("phone number '{0}' cannot be normalized")]
    InvalidPhone(String),
    #[error("sms transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sms provider rejected the message with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Serialize)]
struct VonageMessage<'a> {
    message_type: &'static str,
    channel: &'static str,
    text: &'a str,
    to: &'a str,
    from: &'a str,
}

/// Vonage Messages API client. Accepted messages answer 201 or 202.
#[derive(Clone)]
pub struct VonageSmsSender {
    config: Arc<SmsConfig>,
    client: reqwest::Client,
}

impl VonageSmsSender {
    pub fn new(config: SmsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(SMS_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

impl ports::SmsSender for VonageSmsSender {
    type Error = SmsError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, phone: &'a str, text: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            let to = sms::normalize_phone(phone, &self.config.country_code)
                .ok_or_else(|| SmsError::InvalidPhone(phone.to_string()))?;
            let message = VonageMessage {
                message_type: "text",
                channel: "sms",
                text,
                to: &to,
                from: &self.config.from,
            };
            let response = self
                .client
                .post(&self.config.endpoint)
                .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
                .header(reqwest::header::ACCEPT, "application/json")
                .json(&message)
                .send()
                .await?;

            let status = response.status().as_u16();
            match status {
                201 | 202 => {
                    tracing::debug!(to = %to, status, "sms accepted by provider");
                    Ok(())
                }
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    Err(SmsError::Rejected { status, body })
                }
            }
        })
    }
}
