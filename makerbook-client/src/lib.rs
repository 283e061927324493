pub mod config;
pub mod error;
pub mod http_client;
pub mod interactions;
pub mod loading;
pub mod models;
pub mod notify;
pub mod quick_create;
pub mod splitter;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http_client::HttpClient;
pub use interactions::{Action, InteractionApi, InteractionStore};
pub use loading::{LoadingGuard, LoadingSignal, LoadingTimings};
pub use notify::{Level, Notification, Notifier, TracingNotifier};
pub use quick_create::QuickCreate;
pub use splitter::{split_content, SplitContent};

use std::sync::Arc;

/// Owns all client-side state. Build one at start-up and pass it around.
#[derive(Clone)]
pub struct Makerbook {
    http: Arc<HttpClient>,
    loading: LoadingSignal,
    interactions: InteractionStore,
    notifier: Arc<dyn Notifier>,
}

impl Makerbook {
    pub fn new(config: ClientConfig, notifier: Arc<dyn Notifier>) -> Self {
        let loading = LoadingSignal::new(config.loading);
        let http = Arc::new(HttpClient::with_config(&config).with_loading(loading.clone()));
        let interactions = InteractionStore::new(http.clone(), notifier.clone());

        tracing::debug!(base_url = %config.base_url, "Makerbook client ready");

        Self {
            http,
            loading,
            interactions,
            notifier,
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn loading(&self) -> &LoadingSignal {
        &self.loading
    }

    pub fn interactions(&self) -> &InteractionStore {
        &self.interactions
    }

    /// Surfaces a failed call to the user and hands the error back.
    pub fn report_error(&self, err: ClientError) -> ClientError {
        self.notifier.notify(Notification::from(&err));
        err
    }

    pub fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }
}
