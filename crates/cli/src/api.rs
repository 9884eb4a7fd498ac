//! Client for the storefront HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use tajine_house_core::checkout::CreateOrderRequest;
use tajine_house_core::{CategoryId, MenuItemId, OrderId};
use tajine_house_storefront::models::{MenuItem, Order, OrderItem};

use crate::error::CliError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response to a successful `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub message: String,
    pub order_id: OrderId,
}

/// Response to `GET /api/orders/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// The storefront operations the CLI needs.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// The menu, optionally restricted to one category.
    async fn menu_items(&self, category: Option<CategoryId>) -> Result<Vec<MenuItem>, CliError>;

    /// One dish, `None` if unknown.
    async fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, CliError>;

    async fn place_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder, CliError>;

    /// One order and its items, `None` if unknown.
    async fn order(&self, id: OrderId) -> Result<Option<OrderDetails>, CliError>;
}

/// [`OrderApi`] over HTTP.
pub struct HttpOrderApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpOrderApi {
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, CliError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    fn url(&self, path: &str) -> Result<Url, CliError> {
        Ok(self.base_url.join(path)?)
    }

    /// Decode a JSON body, `None` on 404, [`CliError::Api`] on other errors.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>, CliError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map_or_else(|_| status.to_string(), |body| body.message);
            return Err(CliError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn menu_items(&self, category: Option<CategoryId>) -> Result<Vec<MenuItem>, CliError> {
        let path = match category {
            Some(id) => format!("/api/menu-items/category/{id}"),
            None => "/api/menu-items".to_string(),
        };
        let response = self.client.get(self.url(&path)?).send().await?;
        Ok(Self::decode(response).await?.unwrap_or_default())
    }

    async fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, CliError> {
        let response = self
            .client
            .get(self.url(&format!("/api/menu-items/{id}"))?)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn place_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder, CliError> {
        let response = self
            .client
            .post(self.url("/api/orders")?)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        Self::decode(response).await?.ok_or(CliError::Api {
            status: status.as_u16(),
            message: "order endpoint not found".to_string(),
        })
    }

    async fn order(&self, id: OrderId) -> Result<Option<OrderDetails>, CliError> {
        let response = self
            .client
            .get(self.url(&format!("/api/orders/{id}"))?)
            .send()
            .await?;
        Self::decode(response).await
    }
}
