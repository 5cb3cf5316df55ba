use std::{fmt, hash::Hash, str::FromStr};

use askama::{Template, filters::HtmlSafe};
use parish_core::{
    pagination::{Control, PageSize, PageToken, Pagination, PaginationHandler},
    paginator::Paginator,
};
use serde::{
    Serialize,
    de::{
        DeserializeOwned,
        value::{Error as ValueError, StrDeserializer},
    },
};

/// Raw query string pairs, in request order.
#[derive(Clone, Debug, Default)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Last value for `key`, blank values count as missing.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn text(&self, key: &str) -> String {
        self.get(key).map(str::trim).unwrap_or_default().to_owned()
    }

    /// Every pair except those named in `keys`.
    pub fn without(&self, keys: &[&str]) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    pub fn paginator(&self, keys: PagingKeys, default_size: PageSize) -> Paginator {
        let page_size = self.parse(keys.per_page).unwrap_or(default_size);
        let view = self
            .get(keys.view)
            .and_then(|v| u64::from_str_radix(v, 16).ok());
        Paginator::resume(self.parse(keys.page), page_size, view)
    }

    pub fn sort<T: Key>(&self) -> SortOn<T> {
        SortOn {
            sort_by: self.get("sort_by").and_then(parse_key),
            asc: self.get("asc") == Some("true"),
        }
    }
}

fn parse_key<T: DeserializeOwned>(value: &str) -> Option<T> {
    T::deserialize(StrDeserializer::<ValueError>::new(value)).ok()
}

pub fn build_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Query parameter names used by one paginated table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagingKeys {
    pub page: &'static str,
    pub per_page: &'static str,
    pub view: &'static str,
}

impl PagingKeys {
    pub fn all(&self) -> [&'static str; 3] {
        [self.page, self.per_page, self.view]
    }
}

pub const PAGING: PagingKeys = PagingKeys {
    page: "page",
    per_page: "per_page",
    view: "view",
};

pub struct Paged<'a, T> {
    pub items: &'a [T],
    pub controls: PaginationControls,
}

/// Resumes the table state from the query, ties it to `filter` and slices
/// out the visible page.
pub fn paginate<'a, T, F: Hash + ?Sized>(
    params: &Params,
    keys: PagingKeys,
    default_size: PageSize,
    filter: &F,
    items: &'a [T],
) -> Paged<'a, T> {
    let mut paginator = params.paginator(keys, default_size);
    paginator.observe(filter);
    let slice = paginator.paginate(items);
    Paged {
        items: slice.items,
        controls: PaginationControls::new(slice.control, &paginator, keys, params.without(&keys.all())),
    }
}

pub struct TokenLink {
    pub key: String,
    pub label: String,
    pub href: Option<String>,
    pub active: bool,
}

/// ```askama
/// <div class=pagination>
///   <span class=range>{{ range_text }}</span>
///   {% if show_pages %}
///   <nav class=pages>
///     {% match prev %}
///     {% when Some(href) %}<a href="{{ href }}" class=prev>‹</a>
///     {% when None %}<span class="prev disabled">‹</span>
///     {% endmatch %}
///     {% for token in tokens %}
///       {% match token.href %}
///       {% when Some(href) %}<a href="{{ href }}" data-key="{{ token.key }}" {% if token.active %}class=active{% endif %}>{{ token.label }}</a>
///       {% when None %}<span class=ellipsis data-key="{{ token.key }}">{{ token.label }}</span>
///       {% endmatch %}
///     {% endfor %}
///     {% match next %}
///     {% when Some(href) %}<a href="{{ href }}" class=next>›</a>
///     {% when None %}<span class="next disabled">›</span>
///     {% endmatch %}
///   </nav>
///   {% endif %}
///   <form method=get class=page-size>
///     {% for (name, value) in hidden %}
///     <input type=hidden name="{{ name }}" value="{{ value }}">
///     {% endfor %}
///     <label>Show {{ selector | safe }} entries</label>
///     <noscript><button>Apply</button></noscript>
///   </form>
/// </div>
/// ```
#[derive(Template)]
#[template(ext = "html", in_doc = true)]
pub struct PaginationControls {
    pub range_text: String,
    pub show_pages: bool,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub tokens: Vec<TokenLink>,
    pub hidden: Vec<(String, String)>,
    pub selector: PageSizeSelector,
}

impl HtmlSafe for PaginationControls {}

/// Captures the page a control would request.
#[derive(Default)]
struct LinkTarget(Option<usize>);

impl PaginationHandler for LinkTarget {
    fn on_page_change(&mut self, page: usize) {
        self.0 = Some(page);
    }

    fn on_items_per_page_change(&mut self, _size: usize) {}
}

impl PaginationControls {
    pub fn new(
        control: Pagination,
        paginator: &Paginator,
        keys: PagingKeys,
        base: Vec<(String, String)>,
    ) -> Self {
        let view = paginator
            .fingerprint()
            .map(|f| format!("{f:x}"))
            .unwrap_or_default();
        let page_size = paginator.page_size();
        let link = |page: usize| {
            let mut params = base.clone();
            params.push((keys.page.to_owned(), page.to_string()));
            params.push((keys.per_page.to_owned(), page_size.to_string()));
            params.push((keys.view.to_owned(), view.clone()));
            format!("?{}", build_query_string(&params))
        };
        let href = |c: Control| {
            let mut target = LinkTarget::default();
            control.dispatch(c, &mut target);
            target.0.map(&link)
        };

        let tokens = control
            .tokens()
            .iter()
            .map(|token| {
                let mut target = LinkTarget::default();
                control.activate(token, &mut target);
                TokenLink {
                    key: token.key(),
                    label: token.to_string(),
                    href: target.0.map(&link),
                    active: matches!(token, PageToken::Page(p) if control.is_current(*p)),
                }
            })
            .collect();

        let mut hidden = base.clone();
        hidden.push((keys.page.to_owned(), control.current_page().to_string()));
        hidden.push((keys.view.to_owned(), view.clone()));

        Self {
            range_text: control.range_text(),
            show_pages: control.total_pages() > 0,
            prev: href(Control::Previous),
            next: href(Control::Next),
            tokens,
            hidden,
            selector: PageSizeSelector {
                name: keys.per_page,
                current: page_size,
            },
        }
    }
}

/// ```askama
/// <select name="{{ name }}" onchange="this.form.submit()">
/// {% for (value, selected) in options() %}
///   <option value="{{ value }}" {% if selected %}selected{% endif %}>{{ value }}</option>
/// {% endfor %}
/// </select>
/// ```
#[derive(Template)]
#[template(ext = "html", in_doc = true)]
pub struct PageSizeSelector {
    pub name: &'static str,
    pub current: PageSize,
}

impl HtmlSafe for PageSizeSelector {}

impl PageSizeSelector {
    pub fn options(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        PageSize::OPTIONS
            .into_iter()
            .map(|size| (size.get(), size == self.current))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SortOn<T: Key> {
    pub sort_by: Option<T>,
    pub asc: bool,
}

pub trait Key: Clone + Copy + PartialEq + Serialize + DeserializeOwned {}

impl<T: Key> fmt::Display for SortOn<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.sort_by {
            Some(key) => key.serialize(f),
            None => Ok(()),
        }
    }
}

pub trait Sortable {
    type SortKey: Key;

    fn get_current_sort(&self) -> SortOn<Self::SortKey>;

    /// Query pairs to keep when a header link changes the sort.
    fn sort_base(&self) -> &[(String, String)];

    fn table_header(
        &self,
        sort_key: Option<Self::SortKey>,
        label: &str,
    ) -> TableHeader<Self::SortKey> {
        let sort = self.get_current_sort();
        TableHeader {
            current_key: sort.sort_by,
            asc: sort.asc,
            key: sort_key,
            label: label.to_owned(),
            base: self.sort_base().to_vec(),
        }
    }
}

/// ```askama
/// {% match key %}
/// {% when Some(key) %}
/// <a
///   href="{{ link() }}"
///   class="header {% if Some(**key) == current_key %}sorting{% endif %}"
/// >
/// {{ label }}
/// {% if Some(**key) == current_key %}
///   {% if asc %}↑{% else %}↓{% endif %}
/// {% endif %}
/// </a>
/// {% when None %}
/// <span class="header">{{ label }}</span>
/// {% endmatch %}
/// ```
#[derive(Template)]
#[template(ext = "html", in_doc = true)]
pub struct TableHeader<T: Key> {
    current_key: Option<T>,
    asc: bool,
    key: Option<T>,
    label: String,
    base: Vec<(String, String)>,
}

impl<T: Key> HtmlSafe for TableHeader<T> {}

impl<T: Key> TableHeader<T> {
    pub fn link(&self) -> String {
        let key = SortOn {
            sort_by: self.key,
            asc: false,
        };
        let mut params = self.base.clone();
        params.push(("sort_by".to_owned(), key.to_string()));
        if self.key == self.current_key && !self.asc {
            params.push(("asc".to_owned(), "true".to_owned()));
        }
        format!("?{}", build_query_string(&params))
    }
}

/// Choices for a status `<select>`: `(key, label, selected)`.
pub fn status_options<S: parish_core::records::Status>(
    current: Option<S>,
) -> Vec<(&'static str, &'static str, bool)> {
    S::ALL
        .iter()
        .map(|s| (s.key(), s.label(), Some(*s) == current))
        .collect()
}
