pub mod appointments;
pub mod certificates;
pub mod directory;
pub mod index;
pub mod payments;
pub mod sacraments;
pub mod service_requests;

use parish_core::{Context, Event, records::Resource};
use serde::Deserialize;
use tracing::info;

use crate::AppError;

/// Bulk action submitted from a table: one `action` and any number of
/// checked `id` boxes.
#[derive(Debug, Deserialize)]
pub struct ActionForm {
    pub action: String,
    #[serde(default, rename = "id")]
    pub ids: Vec<String>,
}

pub async fn delete_all<R: Resource>(context: &Context, ids: &[String]) -> Result<(), AppError> {
    for id in ids {
        context.api.delete::<R>(id).await?;
        info!("deleted {} {id}", R::NAME);
        context.events.publish(Event::RecordDeleted {
            resource: R::NAME,
            id: id.clone(),
        });
    }
    Ok(())
}

/// Sets `status` on every id, calling `on_updated` after each success.
pub async fn update_all<R: Resource>(
    context: &Context,
    ids: &[String],
    status: &str,
    on_updated: impl Fn(&str) -> Option<Event>,
) -> Result<(), AppError> {
    for id in ids {
        context.api.update_status::<R>(id, status).await?;
        info!("{} {id} set to {status}", R::NAME);
        if let Some(event) = on_updated(id) {
            context.events.publish(event);
        }
    }
    Ok(())
}

pub fn unknown_action(action: &str) -> AppError {
    AppError::BadRequest(format!("Unknown action {action:?}"))
}
