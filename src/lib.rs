pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod form;
pub mod models;
pub mod store;

pub use api::{CatalogApiClient, HttpApiClient, ReviewApiClient};
pub use catalog::{CatalogSnapshot, CatalogStore, ProductQuery};
pub use config::Config;
pub use error::{ApiError, CatalogError, ErrorKind, PendingOperation, ReviewSyncError};
pub use form::{FormMode, ReviewForm};
pub use models::*;
pub use store::{
    PendingFlags, ReviewChange, ReviewDeleteOutcome, ReviewPostOutcome, ReviewSnapshot,
    ReviewSyncStore,
};
