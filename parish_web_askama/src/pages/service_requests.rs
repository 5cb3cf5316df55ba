use askama::Template;
use axum::{
    extract::{OriginalUri, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::Form;
use parish_core::{
    Context,
    format::{Badge, date_opt},
    records::{RequestStatus, Searchable, ServiceRequest, Status, status_filter},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppError, Page,
    pages::{ActionForm, delete_all, unknown_action, update_all},
    tables::{
        Key, PAGING, PaginationControls, Params, SortOn, Sortable, paginate, status_options,
    },
};

pub async fn service_requests_page(
    State(context): State<Context>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let params = Params::new(params);
    let q = params.text("q");
    let status = status_filter::<RequestStatus>(params.get("status"));
    let sort = params.sort::<ServiceRequestsPageSort>();

    let mut requests = context
        .api
        .list::<ServiceRequest>()
        .await?
        .into_iter()
        .filter(|r| r.matches(&q) && status.is_none_or(|s| r.status == s))
        .collect::<Vec<_>>();
    if let Some(sort_by) = sort.sort_by {
        requests.sort_by(|a, b| {
            let ord = match sort_by {
                ServiceRequestsPageSort::ServiceType => a.service_type.cmp(&b.service_type),
                ServiceRequestsPageSort::RequestedBy => a.requested_by.cmp(&b.requested_by),
                ServiceRequestsPageSort::PreferredDate => a.preferred_date.cmp(&b.preferred_date),
                ServiceRequestsPageSort::Status => a.status.key().cmp(b.status.key()),
            };
            if sort.asc { ord } else { ord.reverse() }
        });
    }

    let paged = paginate(
        &params,
        PAGING,
        context.config.default_page_size,
        &(&q, status.map(|s| s.key())),
        &requests,
    );
    let template = ServiceRequestsPageTemplate {
        rows: paged
            .items
            .iter()
            .map(|r| ServiceRequestRow {
                id: r.id.clone(),
                service_type: r.service_type.clone(),
                requested_by: r.requested_by.clone(),
                preferred_date: date_opt(r.preferred_date.as_ref()),
                notes: r.notes.clone().unwrap_or_default(),
                badge: Badge::of(&r.status),
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

pub async fn service_requests_page_post(
    State(context): State<Context>,
    uri: OriginalUri,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    let status = match form.action.as_str() {
        "approve" => RequestStatus::Approved,
        "reject" => RequestStatus::Rejected,
        "complete" => RequestStatus::Completed,
        "delete" => {
            delete_all::<ServiceRequest>(&context, &form.ids).await?;
            return Ok(Redirect::to(&uri.to_string()));
        }
        action => return Err(unknown_action(action)),
    };
    update_all::<ServiceRequest>(&context, &form.ids, status.key(), |_| None).await?;

    Ok(Redirect::to(&uri.to_string()))
}

pub struct ServiceRequestRow {
    pub id: String,
    pub service_type: String,
    pub requested_by: String,
    pub preferred_date: String,
    pub notes: String,
    pub badge: Badge,
}

#[derive(Template)]
#[template(path = "pages/service_requests.html")]
struct ServiceRequestsPageTemplate {
    sort: SortOn<ServiceRequestsPageSort>,
    sort_base: Vec<(String, String)>,
    q: String,
    hidden: Vec<(String, String)>,
    status_options: Vec<(&'static str, &'static str, bool)>,
    rows: Vec<ServiceRequestRow>,
    paging: PaginationControls,
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRequestsPageSort {
    ServiceType,
    RequestedBy,
    PreferredDate,
    Status,
}

impl Key for ServiceRequestsPageSort {}

impl Sortable for ServiceRequestsPageTemplate {
    type SortKey = ServiceRequestsPageSort;

    fn get_current_sort(&self) -> SortOn<Self::SortKey> {
        self.sort
    }

    fn sort_base(&self) -> &[(String, String)] {
        &self.sort_base
    }
}

impl Page for ServiceRequestsPageTemplate {
    fn section(&self) -> &'static str {
        "service-requests"
    }
}
