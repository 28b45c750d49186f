//! Small shared helpers.
//!
//! - **URL validation**: what the deck accepts as a URL
//! - **Text processing**: terminal width, truncation, control-char stripping
//! - **Timer**: a cancellable deadline on tokio's clock
//!
//! ```
//! use cuedeck::util::{display_width, truncate_to_width, validate_url};
//!
//! let url = validate_url("https://example.com/watch?v=1").unwrap();
//! assert_eq!(url.scheme(), "https");
//!
//! assert_eq!(display_width("Hello"), 5);
//! assert_eq!(truncate_to_width("Long video title", 10), "Long vi...");
//! ```

mod text;
mod timer;
mod url_validator;

pub use text::{display_width, single_line, strip_control_chars, truncate_to_width};
pub use timer::{Expired, Timer};
pub use url_validator::{validate_url, UrlValidationError};
