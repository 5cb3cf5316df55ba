use askama::Template;
use axum::{extract::State, response::Html};
use parish_core::{Context, format::time};

use crate::{AppError, Page};

pub async fn index_page(State(context): State<Context>) -> Result<Html<String>, AppError> {
    let activity = context
        .activity
        .recent()
        .await
        .into_iter()
        .map(|entry| ActivityRow {
            at: time(&entry.at),
            message: entry.event.to_string(),
        })
        .collect();
    let template = IndexPageTemplate { activity };
    Ok(Html(template.render()?))
}

pub struct ActivityRow {
    pub at: String,
    pub message: String,
}

#[derive(Template)]
#[template(path = "pages/index.html")]
struct IndexPageTemplate {
    activity: Vec<ActivityRow>,
}

impl Page for IndexPageTemplate {
    fn section(&self) -> &'static str {
        "home"
    }
}
