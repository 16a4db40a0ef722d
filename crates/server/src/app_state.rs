use std::sync::Arc;

use service::DispatchPortal;

#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<DispatchPortal>,
}
