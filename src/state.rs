use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, Notifier, ResetService, SeaOrmAuthService, SeaOrmResetService, SmtpNotifier,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub notifier: Arc<dyn Notifier>,

    pub auth_service: Arc<dyn AuthService>,

    pub reset_service: Arc<dyn ResetService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let notifier = Arc::new(
            SmtpNotifier::new(&config.mail)
                .map_err(|e| anyhow::anyhow!("Failed to build SMTP notifier: {e}"))?,
        );
        Self::with_notifier(config, notifier).await
    }

    /// Build the state around an externally supplied notifier. Used by the
    /// integration tests to capture outbound mail instead of delivering it.
    pub async fn with_notifier(
        config: Config,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let reset_service = Arc::new(SeaOrmResetService::new(
            store.clone(),
            config.security.clone(),
            config.mail.clone(),
            notifier.clone(),
        )) as Arc<dyn ResetService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            notifier,
            auth_service,
            reset_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
