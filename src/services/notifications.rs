use tracing::warn;
use uuid::Uuid;

use crate::database::models::NewNotification;
use crate::database::Stores;

/// Posts an in-app notification. `user_id: None` addresses every user of
/// the tenant. Failures are logged, the caller carries on.
pub async fn post(
    stores: &Stores,
    tenant_id: Uuid,
    user_id: Option<Uuid>,
    kind: &str,
    title: String,
    message: String,
    link: Option<String>,
) {
    let new = NewNotification {
        tenant_id,
        user_id,
        kind: kind.to_string(),
        title,
        message,
        link,
    };
    if let Err(e) = stores.notifications.create(new).await {
        warn!("Failed to post {} notification for tenant {}: {}", kind, tenant_id, e);
    }
}
