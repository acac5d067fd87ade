pub mod product;
pub mod shared;
pub mod tournament;
