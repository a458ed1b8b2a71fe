//! Query Model
//!
//! Version-agnostic description of an analytics query:
//!
//! - **AnalyticsRequest**: target, metrics, dimensions, dates, sort, paging
//! - **FilterRequest**: field/operator/value filters
//! - **QueryRequestDto**: the JSON body callers send, converted into a request
//!
//! # Example
//!
//! ```rust
//! use site_analytics::model::{AnalyticsRequest, FilterRequest};
//!
//! let mut request = AnalyticsRequest::new("123456789")?
//!     .with_metrics(&["sessions", "activeUsers"])
//!     .with_dimensions(&["date"])
//!     .with_date_range("2026-02-09", "2026-02-16");
//! request.add_dimension_filter(FilterRequest::exact("country", "Chile")?);
//! # Ok::<(), site_analytics::AnalyticsError>(())
//! ```

mod dto;
mod filter;
mod request;

pub use dto::{FilterDto, FiltersDto, QueryRequestDto};
pub use filter::{FilterOperator, FilterRequest, DEFAULT_OPERATOR};
pub use request::{AnalyticsRequest, DATE_FORMAT, DEFAULT_METRIC};
