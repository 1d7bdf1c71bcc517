//! Page reachability and SEO metadata checks.
//!
//! - [`normalize`]: reduce a raw address to its `scheme://host` origin
//! - [`validate`]: accept or reject raw user input with one fixed message
//! - [`PageInspector`]: fetch an [`Address`] once and extract title, first
//!   `<h1>`, and meta description into a [`PageCheck`]
//!
//! Callers validate first, normalize the same raw string, persist the
//! [`Address`], and inspect it later:
//!
//! ```no_run
//! # async fn demo() -> Result<(), analyzer_http::HttpError> {
//! use analyzer_core::{normalize, validate, InspectionResult, PageInspector};
//!
//! let raw = "https://Example.com/about";
//! if validate(raw).is_valid() {
//!     let address = normalize(raw);
//!     let inspector = PageInspector::new()?;
//!     if let InspectionResult::Success(check) = inspector.check(&address).await {
//!         println!("{} {:?}", check.status_code, check.title);
//!     }
//! }
//! # Ok(()) }
//! ```

mod address;
mod extract;
mod inspect;
mod validate;

pub use address::{Address, normalize};
pub use extract::{PageCheck, parse_page};
pub use inspect::{InspectError, InspectionResult, PageInspector, PageSource};
pub use validate::{MAX_URL_LENGTH, ValidationError, ValidationOutcome, validate};
