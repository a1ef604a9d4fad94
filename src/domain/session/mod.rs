pub mod dto;
pub mod paginator;

pub use dto::{PaginationState, SessionDetail, SessionSummary};
pub use paginator::{LoadMoreOutcome, PaginatorPhase, SessionPaginator};
