//! obras-core – the catalog behind obras-server.
//!
//! This crate holds everything that does not depend on HTTP:
//!
//! - [`model`]: the client-facing [`CreateObra`] payload and the stored [`Obra`].
//! - [`clock`]: the time source used to stamp records.
//! - [`store`]: the process-wide, lock-guarded [`CatalogStore`].
//! - [`codec`]: CSV import/export, including the parser for the `autores` cell.

pub mod clock;
pub mod codec;
pub mod model;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CsvExportError, CsvImportError};
pub use model::{CreateObra, Obra, ObraId};
pub use store::CatalogStore;
