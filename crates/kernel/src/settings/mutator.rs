//! Platform-admin mutations of a service's settings.
//!
//! Each operation authorizes the caller before touching the provider, so a
//! rejected request never issues a mutation. On success it returns the
//! settings page URL the caller should be redirected to.

use tracing::{error, info, warn};
use uuid::Uuid;

use super::urls;
use crate::error::{AppError, AppResult};
use crate::models::{Permission, Service, User};
use crate::provider::ServiceRecordProvider;

/// Reject callers who are not platform admins.
pub fn authorize(caller: &User) -> AppResult<()> {
    if caller.is_platform_admin() {
        Ok(())
    } else {
        warn!(user_id = %caller.id, "non platform admin attempted a settings change");
        Err(AppError::Forbidden)
    }
}

/// Parse a permission name from a URL into a platform-admin toggle.
///
/// Unknown names and permissions that are not switchable here are a 404.
pub fn parse_toggle(permission_name: &str) -> AppResult<Permission> {
    permission_name
        .parse::<Permission>()
        .ok()
        .filter(|p| p.is_platform_admin_toggle())
        .ok_or(AppError::NotFound)
}

/// Set membership of a permission on a service.
///
/// Issues exactly one provider mutation. Setting a permission to the state it
/// already has leaves the service unchanged.
pub async fn set_permission(
    provider: &dyn ServiceRecordProvider,
    service_id: Uuid,
    permission_name: &str,
    enabled: bool,
    caller: &User,
) -> AppResult<String> {
    authorize(caller)?;
    let permission = parse_toggle(permission_name)?;

    provider
        .force_permission(service_id, permission, enabled)
        .await?;

    info!(
        %service_id,
        %permission,
        enabled,
        user_id = %caller.id,
        "service permission set"
    );
    Ok(urls::settings(service_id))
}

/// Turn document uploads on or off.
pub async fn switch_upload_document(
    provider: &dyn ServiceRecordProvider,
    service_id: Uuid,
    enabled: bool,
    caller: &User,
) -> AppResult<String> {
    authorize(caller)?;

    provider
        .force_permission(service_id, Permission::UploadDocument, enabled)
        .await?;

    info!(%service_id, enabled, user_id = %caller.id, "document uploads switched");
    Ok(urls::settings(service_id))
}

/// Move a service between trial mode and live.
pub async fn switch_live(
    provider: &dyn ServiceRecordProvider,
    service_id: Uuid,
    live: bool,
    caller: &User,
) -> AppResult<String> {
    authorize(caller)?;

    provider.set_restricted(service_id, !live).await?;

    info!(%service_id, live, user_id = %caller.id, "service live state switched");
    Ok(urls::settings(service_id))
}

async fn load(provider: &dyn ServiceRecordProvider, service_id: Uuid) -> AppResult<Service> {
    provider.get(service_id).await?.ok_or(AppError::NotFound)
}

/// Archive an active service.
pub async fn archive(
    provider: &dyn ServiceRecordProvider,
    service_id: Uuid,
    caller: &User,
) -> AppResult<String> {
    authorize(caller)?;
    if !load(provider, service_id).await?.active {
        return Err(AppError::BadRequest(
            "an inactive service cannot be archived".to_string(),
        ));
    }

    provider.archive(service_id).await?;

    info!(%service_id, user_id = %caller.id, "service archived");
    Ok(urls::settings(service_id))
}

/// Suspend an active service.
pub async fn suspend(
    provider: &dyn ServiceRecordProvider,
    service_id: Uuid,
    caller: &User,
) -> AppResult<String> {
    authorize(caller)?;
    if !load(provider, service_id).await?.active {
        return Err(AppError::BadRequest(
            "an inactive service cannot be suspended".to_string(),
        ));
    }

    provider.suspend(service_id).await?;

    info!(%service_id, user_id = %caller.id, "service suspended");
    Ok(urls::settings(service_id))
}

/// Resume a suspended service.
pub async fn resume(
    provider: &dyn ServiceRecordProvider,
    service_id: Uuid,
    caller: &User,
) -> AppResult<String> {
    authorize(caller)?;
    if load(provider, service_id).await?.active {
        return Err(AppError::BadRequest(
            "an active service cannot be resumed".to_string(),
        ));
    }

    provider.resume(service_id).await?;

    info!(%service_id, user_id = %caller.id, "service resumed");
    Ok(urls::settings(service_id))
}

/// Assign an inbound number and switch inbound SMS on.
///
/// The service must already be able to send SMS.
pub async fn assign_inbound_number(
    provider: &dyn ServiceRecordProvider,
    service_id: Uuid,
    inbound_number_id: Uuid,
    caller: &User,
) -> AppResult<String> {
    authorize(caller)?;
    let service = load(provider, service_id).await?;
    if !service.has_permission(Permission::Sms) {
        return Err(AppError::BadRequest(
            "inbound SMS needs the service to send SMS".to_string(),
        ));
    }

    let available = provider.available_inbound_numbers().await?;
    if !available.iter().any(|n| n.id == inbound_number_id) {
        return Err(AppError::BadRequest(
            "inbound number is not available".to_string(),
        ));
    }

    provider
        .assign_inbound_number(service_id, inbound_number_id)
        .await?;
    // The number is already taken at this point; a failure here leaves it
    // assigned with inbound SMS still off.
    if let Err(e) = provider
        .force_permission(service_id, Permission::InboundSms, true)
        .await
    {
        error!(
            %service_id,
            %inbound_number_id,
            error = %e,
            "inbound number assigned but inbound SMS could not be switched on"
        );
        return Err(e.into());
    }

    info!(
        %service_id,
        %inbound_number_id,
        user_id = %caller.id,
        "inbound number assigned"
    );
    Ok(urls::settings(service_id))
}
