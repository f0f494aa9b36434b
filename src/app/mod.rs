use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    alert_client::AlertClient, config::AppConfig, database::DbManager,
    templ_manager::TemplateManager, EmailClient, Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let sender_addr = config.email_config.valid_sender()?;
        let bcc_addr = config.email_config.valid_bcc()?;

        let dm = DbManager::init(&config).await?;
        let tm = TemplateManager::init();

        let email_timeout = config.email_config.timeout();
        let email_client = EmailClient::new(
            config.email_config.api_url.as_str(),
            config.email_config.domain.as_str(),
            config.email_config.sender_name.as_str(),
            sender_addr,
            bcc_addr,
            config.email_config.api_key,
            email_timeout,
        )?;

        let alert_timeout = config.alert_config.timeout();
        let alert_client = AlertClient::new(config.alert_config.webhook_url, alert_timeout)?;

        let app_state = AppState::new(
            dm,
            tm,
            email_client,
            alert_client,
            config.net_config.base_url,
        );

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }
}

pub struct InternalState {
    pub database_mgr: DbManager,
    pub templ_mgr: TemplateManager,
    pub email_client: EmailClient,
    pub alert_client: AlertClient,
    pub base_url: String,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(
        database_mgr: DbManager,
        templ_mgr: TemplateManager,
        email_client: EmailClient,
        alert_client: AlertClient,
        base_url: String,
    ) -> Self {
        AppState(Arc::new(InternalState {
            templ_mgr,
            database_mgr,
            email_client,
            alert_client,
            base_url,
        }))
    }
}
