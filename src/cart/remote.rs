//! Remote cart store
//!
//! Signed-in customers keep their cart in a per-customer line table on the
//! managed backend platform. This module defines the store contract the
//! façade routes through, plus the REST client for the platform's row API.
//! Server-side line expiry is the platform's job; the client only reads the
//! reported `expires_at`.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::models::{CartLine, CartLineUuid, CustomerUuid},
    products::{ProductSnapshot, ProductUuid},
};

/// One row of the remote cart-line table, with the product joined in.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCartLine {
    /// Row id.
    pub uuid: CartLineUuid,

    /// The product the row holds.
    pub product: ProductSnapshot,

    /// Stored quantity.
    pub quantity: u32,

    /// When the row was inserted.
    pub created_at: Timestamp,

    /// Server-side expiry of the row, when the table carries a TTL.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

impl From<RemoteCartLine> for CartLine {
    fn from(record: RemoteCartLine) -> Self {
        let prescription_acknowledged = !record.product.requires_prescription;

        Self {
            product: record.product,
            quantity: record.quantity,
            added_at: record.created_at,
            prescription_acknowledged,
            remote_line: Some(record.uuid),
            expires_at: record.expires_at,
        }
    }
}

/// Errors that can occur when communicating with the cart store.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned a non-2xx response or unexpected body.
    #[error("unexpected response from cart store: {0}")]
    UnexpectedResponse(String),
}

/// CRUD contract over the per-customer cart-line table.
#[automock]
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// All lines for a customer, products joined in.
    async fn list_lines(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<RemoteCartLine>, RemoteStoreError>;

    /// Insert a line for the product, or increment its quantity when one
    /// already exists.
    async fn upsert_quantity(
        &self,
        customer: CustomerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), RemoteStoreError>;

    /// Overwrite the quantity of an existing line.
    async fn update_line_quantity(
        &self,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<(), RemoteStoreError>;

    /// Delete one line.
    async fn delete_line(&self, line: CartLineUuid) -> Result<(), RemoteStoreError>;

    /// Delete every line a customer holds.
    async fn delete_all_for_customer(&self, customer: CustomerUuid)
    -> Result<(), RemoteStoreError>;
}

/// Configuration for connecting to the platform's row API.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Platform base address, e.g. `"https://project.example.co"`.
    pub base_url: String,

    /// API key, sent both as the `apikey` header and as the bearer token.
    pub api_key: String,
}

/// HTTP client for the platform's cart-line row API.
#[derive(Debug, Clone)]
pub struct RestCartStore {
    config: RestConfig,
    http: Client,
}

impl RestCartStore {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create a client reusing a caller-configured `reqwest` client, e.g.
    /// one with a request timeout set.
    #[must_use]
    pub fn with_client(config: RestConfig, http: Client) -> Self {
        Self { config, http }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/cart_lines", self.config.base_url)
    }

    fn request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }
}

#[async_trait]
impl RemoteCartStore for RestCartStore {
    async fn list_lines(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<RemoteCartLine>, RemoteStoreError> {
        let response = self
            .request(self.http.get(self.table_url()))
            .query(&[
                ("customer_uuid", format!("eq.{customer}")),
                (
                    "select",
                    "uuid,quantity,created_at,expires_at,product:products(*)".to_string(),
                ),
            ])
            .send()
            .await?;

        let response = ensure_success(response, "list cart lines").await?;

        Ok(response.json().await?)
    }

    async fn upsert_quantity(
        &self,
        customer: CustomerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), RemoteStoreError> {
        // Insert-or-increment runs server-side so concurrent adds cannot
        // produce duplicate rows for one product.
        let url = format!("{}/rest/v1/rpc/upsert_cart_line", self.config.base_url);

        let body = serde_json::json!({
            "customer_uuid": customer,
            "product_uuid": product,
            "quantity": quantity,
        });

        let response = self.request(self.http.post(url)).json(&body).send().await?;

        ensure_success(response, "upsert cart line").await?;

        Ok(())
    }

    async fn update_line_quantity(
        &self,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<(), RemoteStoreError> {
        let body = serde_json::json!({ "quantity": quantity });

        let response = self
            .request(self.http.patch(self.table_url()))
            .query(&[("uuid", format!("eq.{line}"))])
            .json(&body)
            .send()
            .await?;

        ensure_success(response, "update cart line").await?;

        Ok(())
    }

    async fn delete_line(&self, line: CartLineUuid) -> Result<(), RemoteStoreError> {
        let response = self
            .request(self.http.delete(self.table_url()))
            .query(&[("uuid", format!("eq.{line}"))])
            .send()
            .await?;

        ensure_success(response, "delete cart line").await?;

        Ok(())
    }

    async fn delete_all_for_customer(
        &self,
        customer: CustomerUuid,
    ) -> Result<(), RemoteStoreError> {
        let response = self
            .request(self.http.delete(self.table_url()))
            .query(&[("customer_uuid", format!("eq.{customer}"))])
            .send()
            .await?;

        ensure_success(response, "clear cart lines").await?;

        Ok(())
    }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response, RemoteStoreError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    Err(RemoteStoreError::UnexpectedResponse(format!(
        "{action} failed with status {status}: {text}"
    )))
}
