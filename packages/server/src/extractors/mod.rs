pub mod product_form;
pub mod query;
