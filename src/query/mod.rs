//! Query Translation
//!
//! Turns provider-agnostic requests into provider-native ones and back:
//!
//! - **Dialect**: which API generation is targeted and how it behaves
//! - **Expression**: neutral filter trees built from filter requests
//! - **Plan**: request after defaults, qualification and field policy
//! - **Translator**: plan → native request → transport → normalized rows
//!
//! # Examples
//!
//! ```rust,ignore
//! use site_analytics::query::{Dialect, FieldPolicy, QueryTranslator};
//!
//! let translator = QueryTranslator::new(Dialect::ReportingV4, FieldPolicy::Strict);
//! let native = translator.build_request(&request)?;
//!
//! // Or build, execute and flatten in one go
//! let result = translator.translate(&request, transport.as_ref()).await?;
//! for row in &result.rows {
//!     println!("{:?} {:?}", row.get("date"), row.get("sessions"));
//! }
//! ```

mod dialect;
mod expression;
mod plan;
mod result;
mod translator;

pub use dialect::{Dialect, FilterShape, PagingStyle};
pub use expression::{build_expression, FilterExpression, FilterMatch};
pub use plan::{FieldKind, FieldPolicy, OrderBy, Paging, QueryPlan};
pub use result::{NormalizedResult, ResponseMetadata, ResultRow};
pub use translator::QueryTranslator;
