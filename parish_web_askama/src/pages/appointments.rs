use askama::Template;
use axum::{
    extract::{OriginalUri, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::Form;
use parish_core::{
    Context,
    format::{Badge, date},
    records::{Appointment, AppointmentStatus, Searchable, Status, status_filter},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppError, Page,
    pages::{ActionForm, delete_all, unknown_action, update_all},
    tables::{
        Key, PAGING, PaginationControls, Params, SortOn, Sortable, paginate, status_options,
    },
};

pub async fn appointments_page(
    State(context): State<Context>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let params = Params::new(params);
    let q = params.text("q");
    let status = status_filter::<AppointmentStatus>(params.get("status"));
    let sort = params.sort::<AppointmentsPageSort>();

    let mut appointments = context
        .api
        .list::<Appointment>()
        .await?
        .into_iter()
        .filter(|a| a.matches(&q) && status.is_none_or(|s| a.status == s))
        .collect::<Vec<_>>();
    match sort.sort_by {
        Some(sort_by) => appointments.sort_by(|a, b| {
            let ord = match sort_by {
                AppointmentsPageSort::Title => a.title.cmp(&b.title),
                AppointmentsPageSort::RequestedBy => a.requested_by.cmp(&b.requested_by),
                AppointmentsPageSort::Date => a
                    .appointment_date
                    .cmp(&b.appointment_date)
                    .then_with(|| a.time.cmp(&b.time)),
                AppointmentsPageSort::Status => a.status.key().cmp(b.status.key()),
            };
            if sort.asc { ord } else { ord.reverse() }
        }),
        // upcoming first
        None => appointments.sort_by(|a, b| {
            a.appointment_date
                .cmp(&b.appointment_date)
                .then_with(|| a.time.cmp(&b.time))
        }),
    }

    let paged = paginate(
        &params,
        PAGING,
        context.config.default_page_size,
        &(&q, status.map(|s| s.key())),
        &appointments,
    );
    let template = AppointmentsPageTemplate {
        rows: paged
            .items
            .iter()
            .map(|a| AppointmentRow {
                id: a.id.clone(),
                title: a.title.clone(),
                requested_by: a.requested_by.clone(),
                date: date(&a.appointment_date),
                time: a.time.clone().unwrap_or_default(),
                priest: a.priest_name.clone().unwrap_or_default(),
                badge: Badge::of(&a.status),
            })
            .collect(),
        paging: paged.controls,
        sort,
        sort_base: params.without(&["sort_by", "asc"]),
        hidden: params.without(&["q", "status", "page", "view"]),
        status_options: status_options(status),
        q,
    };
    Ok(Html(template.render()?))
}

pub async fn appointments_page_post(
    State(context): State<Context>,
    uri: OriginalUri,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    let status = match form.action.as_str() {
        "confirm" => AppointmentStatus::Confirmed,
        "complete" => AppointmentStatus::Completed,
        "cancel" => AppointmentStatus::Cancelled,
        "delete" => {
            delete_all::<Appointment>(&context, &form.ids).await?;
            return Ok(Redirect::to(&uri.to_string()));
        }
        action => return Err(unknown_action(action)),
    };
    update_all::<Appointment>(&context, &form.ids, status.key(), |_| None).await?;

    Ok(Redirect::to(&uri.to_string()))
}

pub struct AppointmentRow {
    pub id: String,
    pub title: String,
    pub requested_by: String,
    pub date: String,
    pub time: String,
    pub priest: String,
    pub badge: Badge,
}

#[derive(Template)]
#[template(path = "pages/appointments.html")]
struct AppointmentsPageTemplate {
    sort: SortOn<AppointmentsPageSort>,
    sort_base: Vec<(String, String)>,
    q: String,
    hidden: Vec<(String, String)>,
    status_options: Vec<(&'static str, &'static str, bool)>,
    rows: Vec<AppointmentRow>,
    paging: PaginationControls,
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentsPageSort {
    Title,
    RequestedBy,
    Date,
    Status,
}

impl Key for AppointmentsPageSort {}

impl Sortable for AppointmentsPageTemplate {
    type SortKey = AppointmentsPageSort;

    fn get_current_sort(&self) -> SortOn<Self::SortKey> {
        self.sort
    }

    fn sort_base(&self) -> &[(String, String)] {
        &self.sort_base
    }
}

impl Page for AppointmentsPageTemplate {
    fn section(&self) -> &'static str {
        "appointments"
    }
}
