use image_relay_service::config::{
    GeminiConfig, HttpConfig, RelayServiceConfig, DEFAULT_IMAGE_MODEL,
};
use image_relay_service::services::RelayOptions;
use image_relay_service::startup::Application;
use reqwest::Client;
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-gemini-key";

/// Path the relay calls on the mock upstream.
pub fn upstream_path() -> String {
    format!("/v1beta/models/{}:generateContent", DEFAULT_IMAGE_MODEL)
}

pub struct TestApp {
    pub address: String,
    pub upstream: MockServer,
    client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn against a fresh mock upstream, letting the test adjust config first.
    pub async fn spawn_with(customize: impl FnOnce(&mut RelayServiceConfig)) -> Self {
        let upstream = MockServer::start().await;

        let mut config = RelayServiceConfig {
            common: Config {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            gemini: GeminiConfig {
                api_key: Some(Secret::new(TEST_API_KEY.to_string())),
                base_url: format!("{}/v1beta", upstream.uri()),
                ..GeminiConfig::default()
            },
            relay: RelayOptions::default(),
            http: HttpConfig::default(),
        };
        customize(&mut config);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address,
            upstream,
            client: Client::new(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.address)
    }

    pub async fn post_generate(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(self.generate_url())
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Answer every generateContent call with `response`.
    pub async fn mount_upstream(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(upstream_path()))
            .respond_with(response)
            .mount(&self.upstream)
            .await;
    }

    /// Number of requests the mock upstream has seen.
    pub async fn upstream_calls(&self) -> usize {
        self.upstream
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
