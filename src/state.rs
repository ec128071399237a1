use crate::application::client::CoordinatedClient;
use crate::domain::error::CoordError;
use crate::infrastructure::config::Config;
use crate::infrastructure::network::http::HttpTransport;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type HttpClient = CoordinatedClient<HttpTransport>;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<HttpClient>,
    pub config: Arc<RwLock<Config>>,
}

impl AppState {
    /// Build the shared client. Must run inside a Tokio runtime.
    pub fn new(config: Config) -> Result<Self, CoordError> {
        let transport = HttpTransport::from_config(&config.transport)?;
        let client = CoordinatedClient::new(transport, &config);

        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(RwLock::new(config)),
        })
    }
}
