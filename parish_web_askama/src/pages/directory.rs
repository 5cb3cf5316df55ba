use askama::Template;
use axum::{
    extract::{OriginalUri, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::Form;
use parish_core::{
    Context, Event,
    format::date_opt,
    records::{Member, NewMember, Priest, Resource, Searchable},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    AppError, Page,
    pages::{ActionForm, delete_all, unknown_action},
    tables::{Key, PAGING, PaginationControls, PagingKeys, Params, SortOn, Sortable, paginate},
};

pub const PRIEST_PAGING: PagingKeys = PagingKeys {
    page: "priests_page",
    per_page: "priests_per_page",
    view: "priests_view",
};

pub async fn directory_page(
    State(context): State<Context>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let params = Params::new(params);
    let q = params.text("q");
    let priests_q = params.text("priests_q");
    let sort = params.sort::<MembersSort>();

    let mut members = context
        .api
        .list::<Member>()
        .await?
        .into_iter()
        .filter(|m| m.matches(&q))
        .collect::<Vec<_>>();
    members.sort_by(|a, b| {
        let ord = match sort.sort_by.unwrap_or(MembersSort::Name) {
            MembersSort::Name => a
                .last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name)),
            MembersSort::Email => a.email.cmp(&b.email),
            MembersSort::JoinedOn => a.joined_on.cmp(&b.joined_on),
        };
        // names read alphabetically unless a column was picked
        if sort.asc || sort.sort_by.is_none() {
            ord
        } else {
            ord.reverse()
        }
    });

    let mut priests = context
        .api
        .list::<Priest>()
        .await?
        .into_iter()
        .filter(|p| p.matches(&priests_q))
        .collect::<Vec<_>>();
    priests.sort_by(|a, b| b.active.cmp(&a.active).then_with(|| a.name.cmp(&b.name)));

    let members_paged = paginate(
        &params,
        PAGING,
        context.config.default_page_size,
        &q,
        &members,
    );
    let priests_paged = paginate(
        &params,
        PRIEST_PAGING,
        context.config.default_page_size,
        &priests_q,
        &priests,
    );

    let template = DirectoryPageTemplate {
        members: members_paged
            .items
            .iter()
            .map(|m| MemberRow {
                id: m.id.clone(),
                name: m.full_name(),
                email: m.email.clone().unwrap_or_default(),
                phone: m.phone.clone().unwrap_or_default(),
                address: m.address.clone().unwrap_or_default(),
                joined_on: date_opt(m.joined_on.as_ref()),
            })
            .collect(),
        members_paging: members_paged.controls,
        priests: priests_paged
            .items
            .iter()
            .map(|p| PriestRow {
                id: p.id.clone(),
                name: p.name.clone(),
                position: p.position.clone().unwrap_or_default(),
                email: p.email.clone().unwrap_or_default(),
                phone: p.phone.clone().unwrap_or_default(),
                active: p.active,
            })
            .collect(),
        priests_paging: priests_paged.controls,
        sort,
        sort_base: params.without(&["sort_by", "asc"]),
        members_hidden: params.without(&["q", PAGING.page, PAGING.view]),
        priests_hidden: params.without(&["priests_q", PRIEST_PAGING.page, PRIEST_PAGING.view]),
        q,
        priests_q,
    };
    Ok(Html(template.render()?))
}

pub async fn directory_page_post(
    State(context): State<Context>,
    uri: OriginalUri,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    match form.action.as_str() {
        "delete-member" => delete_all::<Member>(&context, &form.ids).await?,
        "delete-priest" => delete_all::<Priest>(&context, &form.ids).await?,
        action => return Err(unknown_action(action)),
    }

    Ok(Redirect::to(&uri.to_string()))
}

pub async fn member_create_post(
    State(context): State<Context>,
    Form(form): Form<NewMember>,
) -> Result<Redirect, AppError> {
    let member = form.normalized().map_err(AppError::BadRequest)?;
    context.api.create::<Member>(&member).await?;
    info!("added member {} {}", member.first_name, member.last_name);
    context.events.publish(Event::RecordCreated {
        resource: Member::NAME,
    });

    Ok(Redirect::to("/directory"))
}

pub struct MemberRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub joined_on: String,
}

pub struct PriestRow {
    pub id: String,
    pub name: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "pages/directory.html")]
struct DirectoryPageTemplate {
    sort: SortOn<MembersSort>,
    sort_base: Vec<(String, String)>,
    q: String,
    priests_q: String,
    members_hidden: Vec<(String, String)>,
    priests_hidden: Vec<(String, String)>,
    members: Vec<MemberRow>,
    members_paging: PaginationControls,
    priests: Vec<PriestRow>,
    priests_paging: PaginationControls,
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembersSort {
    Name,
    Email,
    JoinedOn,
}

impl Key for MembersSort {}

impl Sortable for DirectoryPageTemplate {
    type SortKey = MembersSort;

    fn get_current_sort(&self) -> SortOn<Self::SortKey> {
        self.sort
    }

    fn sort_base(&self) -> &[(String, String)] {
        &self.sort_base
    }
}

impl Page for DirectoryPageTemplate {
    fn section(&self) -> &'static str {
        "directory"
    }
}
