use std::sync::Arc;

use kiln_db::Store;
use kiln_generate::EndpointChain;

use crate::chat::ChatOrchestrator;
use crate::provider::AuthProvider;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    /// Unscoped store; handlers narrow it to the caller with `Store::scoped`.
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn AuthProvider>,
    pub chat: ChatOrchestrator,
    pub proxy: EndpointChain,
    pub jwt_secret: String,
    pub secure_cookies: bool,
}
