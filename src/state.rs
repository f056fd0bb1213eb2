use crate::api::ai::AiClient;
use crate::config::Config;
use crate::ledger::LeaveLedger;
use crate::ledger::calendar::WorkCalendar;
use crate::store::HrStore;
use std::sync::Arc;

/// Everything a handler can reach. Registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HrStore>,
    pub ledger: LeaveLedger,
    pub config: Arc<Config>,
    pub ai: AiClient,
}

impl AppState {
    pub fn new(store: Arc<dyn HrStore>, config: Config) -> anyhow::Result<Self> {
        let calendar = Arc::new(WorkCalendar::new(store.clone(), config.leave_day_count));
        let ledger = LeaveLedger::new(store.clone(), calendar);
        let ai = AiClient::new(config.ai_service_url.clone(), config.ai_timeout_secs)?;
        Ok(Self {
            store,
            ledger,
            config: Arc::new(config),
            ai,
        })
    }
}
