// handlers/elevated/tenant/mod.rs - Tenant lifecycle handlers
//
// Landlord-only management of stores across the platform.

use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::error::ApiError;

pub mod create; // POST /api/admin/tenants
pub mod delete; // DELETE /api/admin/tenants/:id
pub mod list; // GET /api/admin/tenants
pub mod restore; // POST /api/admin/tenants/:id/restore
pub mod show; // GET /api/admin/tenants/:id
pub mod subscription; // POST /api/admin/tenants/:id/subscription
pub mod update; // PUT /api/admin/tenants/:id

pub use create::tenant_create;
pub use delete::tenant_delete;
pub use list::tenant_list;
pub use restore::tenant_restore;
pub use show::tenant_show;
pub use subscription::tenant_subscribe;
pub use update::tenant_update;

async fn load_tenant(state: &AppState, id: Uuid) -> Result<Tenant, ApiError> {
    state
        .stores
        .tenants
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tenant {} not found", id)))
}
