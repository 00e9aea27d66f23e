use std::sync::Arc;

use chrono::{Local, NaiveDate};
use server_api::ApiContext;

pub(crate) type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) today: Today,
}

impl AppState {
    pub(crate) fn new(api: ApiContext) -> Self {
        Self {
            api,
            today: Arc::new(|| Local::now().date_naive()),
        }
    }
}
