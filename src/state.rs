use std::sync::Arc;

use crate::dashboard::Dashboard;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}
