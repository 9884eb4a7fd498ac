//! Integration tests for Tajine House.
//!
//! Each test spawns a storefront on an ephemeral port backed by the
//! in-memory store (seeded with the sample menu) and talks to it over
//! HTTP with a cookie-keeping client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tajine-house-integration-tests
//! ```

use std::net::SocketAddr;

use reqwest::{Client, Response, redirect};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use tajine_house_storefront::config::StorefrontConfig;
use tajine_house_storefront::routes;
use tajine_house_storefront::services::auth::hash_password;
use tajine_house_storefront::state::AppState;

/// Username of the bootstrap admin.
pub const ADMIN_USERNAME: &str = "admin";

/// Password of the bootstrap admin.
pub const ADMIN_PASSWORD: &str = "couscous-on-fridays";

const SESSION_SECRET: &str = "integration-tests-session-secret-0123456789";

/// A running storefront and a client with its own cookie jar.
pub struct TestApp {
    pub base_url: Url,
    pub client: Client,
}

impl TestApp {
    /// Start a storefront with the default test configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Start a storefront, letting the caller adjust the configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let base_url = Url::parse(&format!("http://{addr}")).expect("Failed to build base URL");

        let mut config =
            StorefrontConfig::with_defaults(base_url.clone(), SecretString::from(SESSION_SECRET));
        config.admin.username = ADMIN_USERNAME.to_owned();
        config.admin.password_hash = Some(SecretString::from(
            hash_password(ADMIN_PASSWORD).expect("Failed to hash admin password"),
        ));
        configure(&mut config);

        let state = AppState::new(config).expect("Failed to build app state");
        state.bootstrap().await.expect("Failed to bootstrap store");
        let app = routes::app(state);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
        });

        Self {
            base_url,
            client: Self::client(redirect::Policy::default()),
        }
    }

    /// A client with a fresh cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(policy: redirect::Policy) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(policy)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Absolute URL for a path on the test server.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid relative URL.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("Failed to join URL")
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// Log in with a password and return the response.
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.post_json(
            "/api/auth/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Log in as the bootstrap admin.
    ///
    /// # Panics
    ///
    /// Panics if the login is refused.
    pub async fn login_admin(&self) {
        let resp = self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        assert_eq!(resp.status(), 200, "admin login failed");
    }

    /// Place an order and return the response.
    pub async fn place_order(&self, items: Value) -> Response {
        self.post_json("/api/orders", &json!({ "order": customer(), "items": items }))
            .await
    }

    /// Place an order that passes checkout and return its ID.
    ///
    /// # Panics
    ///
    /// Panics if the order is refused.
    pub async fn place_valid_order(&self) -> i64 {
        let resp = self
            .place_order(json!([
                { "id": 1, "name": "Couscous Royal", "price": "22.95", "quantity": 2 },
                { "id": 5, "name": "Seafood Tagine", "price": "26.50", "quantity": 2 },
            ]))
            .await;
        assert_eq!(resp.status(), 201, "order was refused");
        let body = json_body(resp).await;
        body["orderId"].as_i64().expect("orderId missing")
    }
}

/// A customer form that passes validation.
#[must_use]
pub fn customer() -> Value {
    json!({
        "firstName": "Amina",
        "lastName": "Benali",
        "email": "amina@example.com",
        "phone": "0612345678",
        "address": "12 Rue des Oliviers",
        "city": "Lyon",
        "zipCode": "69001",
        "deliveryOption": "delivery",
        "deliveryTime": "asap",
        "paymentMethod": "credit-card",
    })
}

/// Decode a JSON response body.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("response body is not JSON")
}

/// The `message` field of a JSON error body.
///
/// # Panics
///
/// Panics if the body has no `message`.
pub async fn error_message(resp: Response) -> String {
    json_body(resp).await["message"]
        .as_str()
        .expect("message missing")
        .to_owned()
}
