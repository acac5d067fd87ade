pub mod image;
pub mod product;
pub mod tournament;
