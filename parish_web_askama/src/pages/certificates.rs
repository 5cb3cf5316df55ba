use askama::Template;
use axum::{
    extract::{OriginalUri, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::Form;
use parish_core::{
    Context, Event,
    format::{Badge, date},
    records::{CertificateRequest, CertificateStatus, Searchable, Status, status_filter},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppError, Page,
    pages::{ActionForm, delete_all, unknown_action, update_all},
    tables::{
        Key, PAGING, PaginationControls, Params, SortOn, Sortable, paginate, status_options,
    },
};

pub async fn certificates_page(
    State(context): State<Context>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let params = Params::new(params);
    let q = params.text("q");
    let status = status_filter::<CertificateStatus>(params.get("status"));
    let sort = params.sort::<CertificatesPageSort>();

    let mut requests = context
        .api
        .list::<CertificateRequest>()
        .await?
        .into_iter()
        .filter(|r| r.matches(&q) && status.is_none_or(|s| r.status == s))
        .collect::<Vec<_>>();
    match sort.sort_by {
        Some(sort_by) => requests.sort_by(|a, b| {
            let ord = match sort_by {
                CertificatesPageSort::Type => {
                    a.certificate_type.label().cmp(b.certificate_type.label())
                }
                CertificatesPageSort::RequestedBy => a.requested_by.cmp(&b.requested_by),
                CertificatesPageSort::RequestedOn => a.requested_on.cmp(&b.requested_on),
                CertificatesPageSort::Status => a.status.key().cmp(b.status.key()),
            };
            if sort.asc { ord } else { ord.reverse() }
        }),
        None => requests.sort_by(|a, b| b.requested_on.cmp(&a.requested_on)),
    }

    let paged = paginate(
        &params,
        PAGING,
        context.config.default_page_size,
        &(&q, status.map(|s| s.key())),
        &requests,
    );
    let template = CertificatesPageTemplate {
        rows: paged
            .items
            .iter()
            .map(|r| CertificateRow {
                id: r.id.clone(),
                certificate_type: r.certificate_type.label(),
                requested_by: r.requested_by.clone(),
                purpose: r.purpose.clone().unwrap_or_default(),
                requested_on: date(&r.requested_on),
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

pub async fn certificates_page_post(
    State(context): State<Context>,
    uri: OriginalUri,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    let status = match form.action.as_str() {
        "approve" => CertificateStatus::Approved,
        "reject" => CertificateStatus::Rejected,
        "release" => CertificateStatus::Released,
        "delete" => {
            delete_all::<CertificateRequest>(&context, &form.ids).await?;
            return Ok(Redirect::to(&uri.to_string()));
        }
        action => return Err(unknown_action(action)),
    };
    update_all::<CertificateRequest>(&context, &form.ids, status.key(), |id| {
        Some(Event::CertificateStatusChanged {
            id: id.to_owned(),
            status: status.key().to_owned(),
        })
    })
    .await?;

    Ok(Redirect::to(&uri.to_string()))
}

pub struct CertificateRow {
    pub id: String,
    pub certificate_type: &'static str,
    pub requested_by: String,
    pub purpose: String,
    pub requested_on: String,
    pub badge: Badge,
}

#[derive(Template)]
#[template(path = "pages/certificates.html")]
struct CertificatesPageTemplate {
    sort: SortOn<CertificatesPageSort>,
    sort_base: Vec<(String, String)>,
    q: String,
    hidden: Vec<(String, String)>,
    status_options: Vec<(&'static str, &'static str, bool)>,
    rows: Vec<CertificateRow>,
    paging: PaginationControls,
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificatesPageSort {
    Type,
    RequestedBy,
    RequestedOn,
    Status,
}

impl Key for CertificatesPageSort {}

impl Sortable for CertificatesPageTemplate {
    type SortKey = CertificatesPageSort;

    fn get_current_sort(&self) -> SortOn<Self::SortKey> {
        self.sort
    }

    fn sort_base(&self) -> &[(String, String)] {
        &self.sort_base
    }
}

impl Page for CertificatesPageTemplate {
    fn section(&self) -> &'static str {
        "certificates"
    }
}
