pub mod backend;
pub mod config;
pub mod context;
pub mod events;
pub mod format;
pub mod pagination;
pub mod paginator;
pub mod records;

pub use crate::backend::{Api, BackendError, Method, RestClient, Transport};
pub use crate::config::Config;
pub use crate::context::Context;
pub use crate::events::{Activity, Event, EventBus, Topic};
pub use crate::pagination::{Control, PageSize, PageToken, Pagination, PaginationHandler};
pub use crate::paginator::{PageSlice, Paginator};
