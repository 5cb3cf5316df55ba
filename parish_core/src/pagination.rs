use std::{
    fmt::{self, Display},
    num::NonZeroUsize,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Numeric slots shown before the window collapses into ellipses.
pub const MAX_VISIBLE: usize = 5;

/// The page-size menu offered to users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const OPTIONS: [PageSize; 4] = [
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
        PageSize::Hundred,
    ];

    pub fn get(self) -> usize {
        match self {
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }

    pub fn non_zero(self) -> NonZeroUsize {
        NonZeroUsize::new(self.get()).unwrap_or(NonZeroUsize::MIN)
    }
}

impl From<PageSize> for usize {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        PageSize::OPTIONS
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or_else(|| format!("Unsupported page size {value}"))
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid page size {s:?}"))?;
        PageSize::try_from(value)
    }
}

impl Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

/// One entry of the page selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageToken {
    Page(usize),
    /// Non-interactive gap marker, tagged with its index in the token list.
    Ellipsis(usize),
}

impl PageToken {
    /// Render key, unique within one `tokens()` result.
    pub fn key(&self) -> String {
        match self {
            PageToken::Page(page) => format!("page-{page}"),
            PageToken::Ellipsis(position) => format!("ellipsis-{position}"),
        }
    }

    pub fn page(&self) -> Option<usize> {
        match self {
            PageToken::Page(page) => Some(*page),
            PageToken::Ellipsis(_) => None,
        }
    }
}

impl Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Page(page) => page.fmt(f),
            PageToken::Ellipsis(_) => f.write_str("..."),
        }
    }
}

/// A user interaction with the control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Previous,
    Next,
    Page(usize),
    PageSize(PageSize),
}

/// Receives the page and page-size change requests of a [`Pagination`].
pub trait PaginationHandler {
    fn on_page_change(&mut self, page: usize);
    fn on_items_per_page_change(&mut self, size: usize);
}

/// Adapts a pair of closures into a [`PaginationHandler`].
pub struct Callbacks<P, S> {
    on_page: P,
    on_size: S,
}

impl<P, S> Callbacks<P, S>
where
    P: FnMut(usize),
    S: FnMut(usize),
{
    pub fn new(on_page: P, on_size: S) -> Self {
        Self { on_page, on_size }
    }
}

impl<P, S> PaginationHandler for Callbacks<P, S>
where
    P: FnMut(usize),
    S: FnMut(usize),
{
    fn on_page_change(&mut self, page: usize) {
        (self.on_page)(page)
    }

    fn on_items_per_page_change(&mut self, size: usize) {
        (self.on_size)(size)
    }
}

/// Stateless view over the caller's paging state.
///
/// Everything is derived on demand from the three inputs. The current page is
/// not clamped against the item count, keeping it in range is up to the owner
/// of the state (see [`crate::paginator::Paginator`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    total_items: usize,
    items_per_page: NonZeroUsize,
}

impl Pagination {
    pub fn new(current_page: usize, total_items: usize, items_per_page: NonZeroUsize) -> Self {
        Self {
            current_page: current_page.max(1),
            total_items,
            items_per_page,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page.get()
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.items_per_page.get())
    }

    pub fn start_index(&self) -> usize {
        (self.current_page - 1)
            .saturating_mul(self.items_per_page.get())
            .saturating_add(1)
    }

    pub fn end_index(&self) -> usize {
        self.current_page
            .saturating_mul(self.items_per_page.get())
            .min(self.total_items)
    }

    pub fn range_text(&self) -> String {
        let start = if self.total_items == 0 {
            0
        } else {
            self.start_index()
        };
        format!(
            "Showing {} to {} of {} entries",
            start,
            self.end_index(),
            self.total_items
        )
    }

    pub fn tokens(&self) -> Vec<PageToken> {
        let total = self.total_pages();
        let current = self.current_page;
        let mut tokens = Vec::with_capacity(MAX_VISIBLE + 2);
        if total <= MAX_VISIBLE {
            tokens.extend((1..=total).map(PageToken::Page));
            return tokens;
        }
        if current <= 3 {
            tokens.extend((1..=4).map(PageToken::Page));
            tokens.push(PageToken::Ellipsis(tokens.len()));
            tokens.push(PageToken::Page(total));
        } else if current >= total - 2 {
            tokens.push(PageToken::Page(1));
            tokens.push(PageToken::Ellipsis(tokens.len()));
            tokens.extend((total - 3..=total).map(PageToken::Page));
        } else {
            tokens.push(PageToken::Page(1));
            tokens.push(PageToken::Ellipsis(tokens.len()));
            tokens.extend((current - 1..=current + 1).map(PageToken::Page));
            tokens.push(PageToken::Ellipsis(tokens.len()));
            tokens.push(PageToken::Page(total));
        }
        tokens
    }

    pub fn prev_disabled(&self) -> bool {
        self.current_page == 1
    }

    pub fn next_disabled(&self) -> bool {
        let total = self.total_pages();
        total == 0 || self.current_page >= total
    }

    pub fn is_current(&self, page: usize) -> bool {
        page == self.current_page
    }

    /// Forwards `control` to `handler` unless the matching button is disabled.
    /// Returns whether a callback fired.
    pub fn dispatch(&self, control: Control, handler: &mut impl PaginationHandler) -> bool {
        match control {
            Control::Previous => {
                if self.prev_disabled() {
                    return false;
                }
                handler.on_page_change(self.current_page - 1);
            }
            Control::Next => {
                if self.next_disabled() {
                    return false;
                }
                handler.on_page_change(self.current_page + 1);
            }
            Control::Page(page) => handler.on_page_change(page),
            Control::PageSize(size) => handler.on_items_per_page_change(size.get()),
        }
        true
    }

    /// Click on a rendered token. Ellipses do nothing.
    pub fn activate(&self, token: &PageToken, handler: &mut impl PaginationHandler) -> bool {
        match token {
            PageToken::Page(page) => self.dispatch(Control::Page(*page), handler),
            PageToken::Ellipsis(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn pages(total_pages: usize, current: usize) -> Pagination {
        Pagination::new(current, total_pages * 10, nz(10))
    }

    fn render(tokens: &[PageToken]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[derive(Default)]
    struct Recorder {
        pages: Vec<usize>,
        sizes: Vec<usize>,
    }

    impl PaginationHandler for Recorder {
        fn on_page_change(&mut self, page: usize) {
            self.pages.push(page);
        }

        fn on_items_per_page_change(&mut self, size: usize) {
            self.sizes.push(size);
        }
    }

    #[test]
    fn test_range_text_empty() {
        for size in PageSize::OPTIONS {
            let paging = Pagination::new(1, 0, size.non_zero());
            assert_eq!(paging.range_text(), "Showing 0 to 0 of 0 entries");
        }
    }

    #[test]
    fn test_range_text_partial_last_page() {
        let paging = Pagination::new(3, 23, nz(10));
        assert_eq!(paging.start_index(), 21);
        assert_eq!(paging.end_index(), 23);
        assert_eq!(paging.range_text(), "Showing 21 to 23 of 23 entries");
    }

    #[test]
    fn test_range_text_full_page() {
        let paging = Pagination::new(1, 23, nz(10));
        assert_eq!(paging.range_text(), "Showing 1 to 10 of 23 entries");
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(Pagination::new(1, 0, nz(10)).total_pages(), 0);
        assert_eq!(Pagination::new(1, 1, nz(10)).total_pages(), 1);
        assert_eq!(Pagination::new(1, 10, nz(10)).total_pages(), 1);
        assert_eq!(Pagination::new(1, 11, nz(10)).total_pages(), 2);
        assert_eq!(Pagination::new(1, 100, nz(25)).total_pages(), 4);
    }

    #[test]
    fn test_tokens_small_set() {
        for current in 1..=4 {
            assert_eq!(
                pages(4, current).tokens(),
                vec![
                    PageToken::Page(1),
                    PageToken::Page(2),
                    PageToken::Page(3),
                    PageToken::Page(4)
                ]
            );
        }
    }

    #[test]
    fn test_tokens_exactly_max_visible() {
        assert_eq!(render(&pages(5, 3).tokens()), ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_tokens_empty() {
        assert!(pages(0, 1).tokens().is_empty());
    }

    #[test]
    fn test_tokens_near_start() {
        assert_eq!(
            render(&pages(20, 1).tokens()),
            ["1", "2", "3", "4", "...", "20"]
        );
        assert_eq!(
            render(&pages(20, 3).tokens()),
            ["1", "2", "3", "4", "...", "20"]
        );
    }

    #[test]
    fn test_tokens_near_end() {
        assert_eq!(
            render(&pages(20, 19).tokens()),
            ["1", "...", "17", "18", "19", "20"]
        );
        assert_eq!(
            render(&pages(20, 18).tokens()),
            ["1", "...", "17", "18", "19", "20"]
        );
    }

    #[test]
    fn test_tokens_middle() {
        assert_eq!(
            render(&pages(20, 10).tokens()),
            ["1", "...", "9", "10", "11", "...", "20"]
        );
    }

    #[test]
    fn test_tokens_six_pages_switch_to_end_window() {
        assert_eq!(
            render(&pages(6, 4).tokens()),
            ["1", "...", "3", "4", "5", "6"]
        );
    }

    #[test]
    fn test_ellipsis_keys_are_distinct() {
        let tokens = pages(20, 10).tokens();
        let keys: Vec<_> = tokens.iter().map(PageToken::key).collect();
        assert_eq!(
            keys,
            [
                "page-1",
                "ellipsis-1",
                "page-9",
                "page-10",
                "page-11",
                "ellipsis-5",
                "page-20"
            ]
        );
    }

    #[test]
    fn test_tokens_idempotent() {
        let paging = pages(20, 7);
        assert_eq!(paging.tokens(), paging.tokens());
    }

    #[test]
    fn test_boundary_disabling() {
        let first = pages(5, 1);
        assert!(first.prev_disabled());
        assert!(!first.next_disabled());

        let last = pages(5, 5);
        assert!(!last.prev_disabled());
        assert!(last.next_disabled());

        let empty = Pagination::new(3, 0, nz(10));
        assert!(empty.next_disabled());
    }

    #[test]
    fn test_dispatch_prev_next() {
        let mut recorder = Recorder::default();
        let paging = pages(5, 3);
        assert!(paging.dispatch(Control::Previous, &mut recorder));
        assert!(paging.dispatch(Control::Next, &mut recorder));
        assert!(paging.dispatch(Control::Page(5), &mut recorder));
        assert_eq!(recorder.pages, [2, 4, 5]);
    }

    #[test]
    fn test_dispatch_disabled_buttons_do_nothing() {
        let mut recorder = Recorder::default();
        assert!(!pages(5, 1).dispatch(Control::Previous, &mut recorder));
        assert!(!pages(5, 5).dispatch(Control::Next, &mut recorder));
        assert!(!Pagination::new(1, 0, nz(10)).dispatch(Control::Next, &mut recorder));
        assert!(recorder.pages.is_empty());
    }

    #[test]
    fn test_activate_ellipsis_is_inert() {
        let mut recorder = Recorder::default();
        let paging = pages(20, 10);
        for token in paging.tokens() {
            paging.activate(&token, &mut recorder);
        }
        assert_eq!(recorder.pages, [1, 9, 10, 11, 20]);
    }

    #[test]
    fn test_page_size_selection_is_numeric() {
        let mut selected: Option<usize> = None;
        let mut callbacks = Callbacks::new(|_| {}, |size| selected = Some(size));
        let size: PageSize = "50".parse().unwrap();
        pages(3, 1).dispatch(Control::PageSize(size), &mut callbacks);
        assert_eq!(selected, Some(50));
    }

    #[test]
    fn test_page_size_parse() {
        assert_eq!("25".parse::<PageSize>(), Ok(PageSize::TwentyFive));
        assert_eq!(PageSize::try_from(100), Ok(PageSize::Hundred));
        assert!("0".parse::<PageSize>().is_err());
        assert!("abc".parse::<PageSize>().is_err());
        assert!(PageSize::try_from(30).is_err());
    }

    #[test]
    fn test_page_size_serde_is_numeric() {
        assert_eq!(serde_json::to_string(&PageSize::Fifty).unwrap(), "50");
        let size: PageSize = serde_json::from_str("25").unwrap();
        assert_eq!(size, PageSize::TwentyFive);
        assert!(serde_json::from_str::<PageSize>("7").is_err());
    }

    #[test]
    fn test_out_of_range_page_is_not_clamped() {
        let paging = Pagination::new(5, 23, nz(10));
        assert_eq!(paging.current_page(), 5);
        assert!(paging.next_disabled());
        assert_eq!(paging.range_text(), "Showing 41 to 23 of 23 entries");
    }

    #[test]
    fn test_huge_page_renders() {
        let paging = Pagination::new(usize::MAX, 23, nz(10));
        assert!(paging.next_disabled());
        assert_eq!(
            paging.range_text(),
            format!("Showing {} to 23 of 23 entries", usize::MAX)
        );

        let paging = Pagination::new(usize::MAX / 10 + 2, 23, nz(10));
        assert_eq!(paging.end_index(), 23);
        assert_eq!(paging.start_index(), usize::MAX);
        assert_eq!(paging.tokens().len(), 3);
    }
}
