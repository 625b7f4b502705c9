//! Catalog context: products and their committed stock.

mod product;
mod repository;

pub use product::Product;
pub use repository::ProductRepository;
