use storage::Database;
use storage::services::points::PointsPolicy;

use crate::middleware::auth::ApiKeys;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub policy: PointsPolicy,
    pub legacy_template_fallback: bool,
    pub api_keys: ApiKeys,
}
