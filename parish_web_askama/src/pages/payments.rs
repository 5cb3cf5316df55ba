use askama::Template;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::Form;
use parish_core::{
    Context, Event,
    format::{Badge, currency, date_opt},
    records::{Payment, PaymentStatus, Resource, Searchable, Status, status_filter},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppError, Page,
    pages::{ActionForm, delete_all, unknown_action, update_all},
    tables::{
        Key, PAGING, PaginationControls, Params, SortOn, Sortable, paginate, status_options,
    },
};

pub async fn payments_page(
    State(context): State<Context>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let params = Params::new(params);
    let q = params.text("q");
    let status = status_filter::<PaymentStatus>(params.get("status"));
    let sort = params.sort::<PaymentsPageSort>();

    let mut payments = context
        .api
        .list::<Payment>()
        .await?
        .into_iter()
        .filter(|p| p.matches(&q) && status.is_none_or(|s| p.status == s))
        .collect::<Vec<_>>();
    if let Some(sort_by) = sort.sort_by {
        payments.sort_by(|a, b| {
            let ord = match sort_by {
                PaymentsPageSort::Payer => a.payer_name.cmp(&b.payer_name),
                PaymentsPageSort::Amount => a.amount.total_cmp(&b.amount),
                PaymentsPageSort::PaidOn => a.paid_on.cmp(&b.paid_on),
                PaymentsPageSort::Status => a.status.key().cmp(b.status.key()),
            };
            if sort.asc { ord } else { ord.reverse() }
        });
    }

    let symbol = &context.config.currency_symbol;
    let total_paid: f64 = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Paid)
        .map(|p| p.amount)
        .sum();
    let paged = paginate(
        &params,
        PAGING,
        context.config.default_page_size,
        &(&q, status.map(|s| s.key())),
        &payments,
    );

    let template = PaymentsPageTemplate {
        rows: paged.items.iter().map(|p| PaymentRow::new(p, symbol)).collect(),
        paging: paged.controls,
        total_paid: currency(total_paid, symbol),
        sort,
        sort_base: params.without(&["sort_by", "asc"]),
        hidden: params.without(&["q", "status", "page", "view"]),
        status_options: status_options(status),
        q,
    };
    Ok(Html(template.render()?))
}

pub async fn payments_page_post(
    State(context): State<Context>,
    uri: OriginalUri,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    let status = match form.action.as_str() {
        "mark-paid" => PaymentStatus::Paid,
        "refund" => PaymentStatus::Refunded,
        "delete" => {
            delete_all::<Payment>(&context, &form.ids).await?;
            return Ok(Redirect::to(&uri.to_string()));
        }
        action => return Err(unknown_action(action)),
    };
    update_all::<Payment>(&context, &form.ids, status.key(), |id| {
        Some(Event::PaymentUpdated {
            id: id.to_owned(),
            status: status.key().to_owned(),
        })
    })
    .await?;

    Ok(Redirect::to(&uri.to_string()))
}

pub async fn payment_page(
    State(context): State<Context>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let payment = context.api.get::<Payment>(&id).await?;
    context.events.publish(Event::PaymentViewed {
        id: payment.id().to_owned(),
    });
    let template = PaymentPageTemplate {
        reference: payment.reference.clone().unwrap_or_default(),
        row: PaymentRow::new(&payment, &context.config.currency_symbol),
    };
    Ok(Html(template.render()?))
}

pub struct PaymentRow {
    pub id: String,
    pub payer: String,
    pub description: String,
    pub amount: String,
    pub method: String,
    pub paid_on: String,
    pub badge: Badge,
}

impl PaymentRow {
    fn new(payment: &Payment, symbol: &str) -> Self {
        Self {
            id: payment.id.clone(),
            payer: payment.payer_name.clone(),
            description: payment.description.clone(),
            amount: currency(payment.amount, symbol),
            method: payment.method.clone().unwrap_or_default(),
            paid_on: date_opt(payment.paid_on.as_ref()),
            badge: Badge::of(&payment.status),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/payments.html")]
struct PaymentsPageTemplate {
    sort: SortOn<PaymentsPageSort>,
    sort_base: Vec<(String, String)>,
    q: String,
    hidden: Vec<(String, String)>,
    status_options: Vec<(&'static str, &'static str, bool)>,
    total_paid: String,
    rows: Vec<PaymentRow>,
    paging: PaginationControls,
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentsPageSort {
    Payer,
    Amount,
    PaidOn,
    Status,
}

impl Key for PaymentsPageSort {}

impl Sortable for PaymentsPageTemplate {
    type SortKey = PaymentsPageSort;

    fn get_current_sort(&self) -> SortOn<Self::SortKey> {
        self.sort
    }

    fn sort_base(&self) -> &[(String, String)] {
        &self.sort_base
    }
}

impl Page for PaymentsPageTemplate {
    fn section(&self) -> &'static str {
        "payments"
    }
}

#[derive(Template)]
#[template(path = "pages/payment.html")]
struct PaymentPageTemplate {
    row: PaymentRow,
    reference: String,
}

impl Page for PaymentPageTemplate {
    fn section(&self) -> &'static str {
        "payments"
    }
}
