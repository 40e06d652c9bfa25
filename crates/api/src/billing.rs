//! Billing provider client and configuration.
//!
//! The provider exposes a form-encoded REST API authenticated with a secret
//! key. Only two calls are needed: create a customer, and open a checkout
//! session for that customer.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use splatforge_core::billing::validate_checkout_mode;
use splatforge_core::types::DbId;

/// Steps shown to operators when billing is not configured.
pub const BILLING_SETUP: &[&str] = &[
    "Set BILLING_SECRET_KEY to the provider's secret API key",
    "Set BILLING_PRICE_ID to the price charged at checkout",
    "Set BILLING_WEBHOOK_SECRET to the webhook endpoint's signing secret",
    "Optionally set BILLING_MODE (subscription or payment) and APP_URL",
];

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_MODE: &str = "subscription";
const DEFAULT_APP_URL: &str = "http://localhost:5173";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub secret_key: String,
    pub price_id: String,
    /// `subscription` or `payment`.
    pub mode: String,
    /// Application root; checkout returns here with `?checkout=...`.
    pub app_url: String,
    pub api_base: String,
    /// Signing secret for incoming webhooks. Webhooks are refused without it.
    pub webhook_secret: Option<String>,
}

impl BillingConfig {
    /// Load billing configuration, or `None` when billing is disabled.
    ///
    /// | Env Var                  | Required | Default                  |
    /// |--------------------------|----------|--------------------------|
    /// | `BILLING_SECRET_KEY`     | yes      | -- (billing disabled)    |
    /// | `BILLING_PRICE_ID`       | yes      | --                       |
    /// | `BILLING_MODE`           | no       | `subscription`           |
    /// | `APP_URL`                | no       | `http://localhost:5173`  |
    /// | `BILLING_API_BASE`       | no       | `https://api.stripe.com` |
    /// | `BILLING_WEBHOOK_SECRET` | no       | --                       |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secret_key = get("BILLING_SECRET_KEY")?;
        let Some(price_id) = get("BILLING_PRICE_ID") else {
            tracing::warn!("BILLING_SECRET_KEY is set but BILLING_PRICE_ID is not; billing disabled");
            return None;
        };

        let mode = get("BILLING_MODE").unwrap_or_else(|| DEFAULT_MODE.into());
        if let Err(e) = validate_checkout_mode(&mode) {
            tracing::warn!(error = %e, "Billing disabled");
            return None;
        }

        Some(Self {
            secret_key,
            price_id,
            mode,
            app_url: get("APP_URL")
                .unwrap_or_else(|| DEFAULT_APP_URL.into())
                .trim_end_matches('/')
                .to_string(),
            api_base: get("BILLING_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
            webhook_secret: get("BILLING_WEBHOOK_SECRET"),
        })
    }

    pub fn success_url(&self) -> String {
        format!("{}/?checkout=success", self.app_url)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/?checkout=cancelled", self.app_url)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Billing request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Billing provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected billing response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Customer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    url: Option<String>,
}

pub struct BillingClient {
    http: reqwest::Client,
    config: BillingConfig,
}

impl BillingClient {
    pub fn new(http: reqwest::Client, config: BillingConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Create a provider customer tagged with our user id. Returns the
    /// provider's customer id.
    pub async fn create_customer(&self, user_id: DbId, email: &str) -> Result<String, BillingError> {
        let form = [
            ("email", email.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];
        let customer: Customer = self.post_form("/v1/customers", &form).await?;
        tracing::info!(user_id, customer_id = %customer.id, "Billing customer created");
        Ok(customer.id)
    }

    /// Open a checkout session for the configured price. Returns the
    /// redirect URL.
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        user_id: DbId,
    ) -> Result<String, BillingError> {
        let form = [
            ("customer", customer_id.to_string()),
            ("mode", self.config.mode.clone()),
            ("line_items[0][price]", self.config.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", self.config.success_url()),
            ("cancel_url", self.config.cancel_url()),
            ("client_reference_id", user_id.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];
        let session: CheckoutSession = self.post_form("/v1/checkout/sessions", &form).await?;
        tracing::info!(user_id, session_id = %session.id, "Checkout session created");
        session
            .url
            .ok_or_else(|| BillingError::Decode(format!("checkout session {} has no url", session.id)))
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, BillingError> {
        let url = format!("{}{path}", self.config.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BillingError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Webhook payloads
// ---------------------------------------------------------------------------

/// The parts of a webhook event this service reads.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    /// Shape depends on the event type.
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Read the event object as a checkout session or subscription.
    pub fn object(&self) -> Result<WebhookObject, serde_json::Error> {
        WebhookObject::deserialize(&self.data.object)
    }
}

/// Fields shared by checkout sessions and subscriptions.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookObject {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl WebhookObject {
    /// Our user id, from `client_reference_id` or `metadata.user_id`.
    pub fn user_id(&self) -> Option<DbId> {
        self.client_reference_id
            .as_deref()
            .and_then(|id| id.parse().ok())
            .or_else(|| {
                self.metadata
                    .as_ref()?
                    .get("user_id")?
                    .as_str()?
                    .parse()
                    .ok()
            })
    }
}
