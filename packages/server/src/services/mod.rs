pub mod images;
pub mod product;
