//! Service layer for results extraction.
//!
//! This module contains the source-independent pieces:
//! - Directional text normalization (`normalize`)
//! - Event name resolution (`EventNameResolver`)
//! - Positional record mapping (`extract`)
//!
//! and the two source adapters (`PdfResultsAdapter`, `HtmlResultsAdapter`).

pub mod event_name;
pub mod extract;
mod html;
pub mod normalize;
mod pdf;

pub use event_name::{EventNameResolver, ResolvedEvent};
pub use html::{DateWindow, HtmlResultsAdapter, ListingScan};
pub use pdf::{PdfPage, PdfResultsAdapter};
