use askama::Template;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::Form;
use parish_core::{
    Context,
    format::date,
    records::{Baptism, Confirmation, Marriage, Searchable, display_names},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppError, Page,
    pages::{ActionForm, delete_all, unknown_action},
    tables::{Key, PAGING, PaginationControls, Params, SortOn, Sortable, paginate},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SacramentKind {
    Baptisms,
    Marriages,
    Confirmations,
}

impl SacramentKind {
    pub const ALL: [SacramentKind; 3] = [
        SacramentKind::Baptisms,
        SacramentKind::Marriages,
        SacramentKind::Confirmations,
    ];

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path() == path)
    }

    pub fn path(&self) -> &'static str {
        match self {
            SacramentKind::Baptisms => "baptisms",
            SacramentKind::Marriages => "marriages",
            SacramentKind::Confirmations => "confirmations",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SacramentKind::Baptisms => "Baptisms",
            SacramentKind::Marriages => "Marriages",
            SacramentKind::Confirmations => "Confirmations",
        }
    }

    /// Header for the column holding the people other than the subject.
    pub fn people_label(&self) -> &'static str {
        match self {
            SacramentKind::Baptisms => "Parents & godparents",
            SacramentKind::Marriages => "Witnesses",
            SacramentKind::Confirmations => "Sponsor",
        }
    }
}

pub struct SacramentRow {
    pub id: String,
    pub name: String,
    pub on: Date,
    pub date: String,
    pub people: String,
    pub priest: String,
    pub place: String,
}

impl From<Baptism> for SacramentRow {
    fn from(b: Baptism) -> Self {
        let mut people = [b.father_name.clone(), b.mother_name.clone()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        people.extend(b.godparents.iter().cloned());
        SacramentRow {
            name: b.child_name,
            date: date(&b.baptism_date),
            on: b.baptism_date,
            people: display_names(&people),
            priest: b.priest_name.unwrap_or_default(),
            place: b.place.unwrap_or_default(),
            id: b.id,
        }
    }
}

impl From<Marriage> for SacramentRow {
    fn from(m: Marriage) -> Self {
        SacramentRow {
            name: format!("{} & {}", m.groom_name, m.bride_name),
            date: date(&m.marriage_date),
            on: m.marriage_date,
            people: display_names(&m.witnesses),
            priest: m.priest_name.unwrap_or_default(),
            place: m.place.unwrap_or_default(),
            id: m.id,
        }
    }
}

impl From<Confirmation> for SacramentRow {
    fn from(c: Confirmation) -> Self {
        SacramentRow {
            name: c.candidate_name,
            date: date(&c.confirmation_date),
            on: c.confirmation_date,
            people: c.sponsor_name.unwrap_or_default(),
            priest: c.priest_name.unwrap_or_default(),
            place: c.place.unwrap_or_default(),
            id: c.id,
        }
    }
}

async fn load<R>(context: &Context, q: &str) -> Result<Vec<SacramentRow>, AppError>
where
    R: parish_core::records::Resource + Searchable + Into<SacramentRow>,
{
    Ok(context
        .api
        .list::<R>()
        .await?
        .into_iter()
        .filter(|r| r.matches(q))
        .map(Into::into)
        .collect())
}

pub async fn sacraments_page(
    State(context): State<Context>,
    Path(kind): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let kind = SacramentKind::from_path(&kind).ok_or(AppError::NotFound)?;
    let params = Params::new(params);
    let q = params.text("q");
    let sort = params.sort::<SacramentsPageSort>();

    let mut rows = match kind {
        SacramentKind::Baptisms => load::<Baptism>(&context, &q).await?,
        SacramentKind::Marriages => load::<Marriage>(&context, &q).await?,
        SacramentKind::Confirmations => load::<Confirmation>(&context, &q).await?,
    };
    rows.sort_by(|a, b| {
        let ord = match sort.sort_by.unwrap_or(SacramentsPageSort::Date) {
            SacramentsPageSort::Name => a.name.cmp(&b.name),
            SacramentsPageSort::Date => a.on.cmp(&b.on),
            SacramentsPageSort::Priest => a.priest.cmp(&b.priest),
        };
        if sort.asc { ord } else { ord.reverse() }
    });

    let paged = paginate(
        &params,
        PAGING,
        context.config.default_page_size,
        &(kind, &q),
        &rows,
    );
    let template = SacramentsPageTemplate {
        kind,
        kinds: SacramentKind::ALL,
        paging: paged.controls,
        rows: paged.items,
        sort,
        sort_base: params.without(&["sort_by", "asc"]),
        hidden: params.without(&["q", "page", "view"]),
        q,
    };
    Ok(Html(template.render()?))
}

pub async fn sacraments_page_post(
    State(context): State<Context>,
    Path(kind): Path<String>,
    uri: OriginalUri,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    let kind = SacramentKind::from_path(&kind).ok_or(AppError::NotFound)?;
    if form.action != "delete" {
        return Err(unknown_action(&form.action));
    }
    match kind {
        SacramentKind::Baptisms => delete_all::<Baptism>(&context, &form.ids).await?,
        SacramentKind::Marriages => delete_all::<Marriage>(&context, &form.ids).await?,
        SacramentKind::Confirmations => delete_all::<Confirmation>(&context, &form.ids).await?,
    }

    Ok(Redirect::to(&uri.to_string()))
}

#[derive(Template)]
#[template(path = "pages/sacraments.html")]
struct SacramentsPageTemplate<'a> {
    kind: SacramentKind,
    kinds: [SacramentKind; 3],
    sort: SortOn<SacramentsPageSort>,
    sort_base: Vec<(String, String)>,
    q: String,
    hidden: Vec<(String, String)>,
    rows: &'a [SacramentRow],
    paging: PaginationControls,
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SacramentsPageSort {
    Name,
    Date,
    Priest,
}

impl Key for SacramentsPageSort {}

impl Sortable for SacramentsPageTemplate<'_> {
    type SortKey = SacramentsPageSort;

    fn get_current_sort(&self) -> SortOn<Self::SortKey> {
        self.sort
    }

    fn sort_base(&self) -> &[(String, String)] {
        &self.sort_base
    }
}

impl Page for SacramentsPageTemplate<'_> {
    fn section(&self) -> &'static str {
        "sacraments"
    }
}
