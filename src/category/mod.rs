//! Category management for the income and expense tracker.
//!
//! Categories label transactions and drive the per-category breakdown on the
//! dashboard. A transaction keeps its category ID even after the category is
//! deleted, so lookups by ID may fail for rows that still reference it.

mod create_endpoint;
mod db;
mod detail_page;
mod domain;

pub use create_endpoint::{CreateCategoryEndpointState, create_category_endpoint};
pub(crate) use create_endpoint::new_category_form;
pub use db::{create_category, create_category_table, get_all_categories, get_category};
pub use detail_page::{CategoryDetailPageState, get_category_detail_page};
pub use domain::{
    Category, CategoryFormData, CategoryId, CategoryKind, CategoryName, DONATION_CATEGORY_NAME,
};
