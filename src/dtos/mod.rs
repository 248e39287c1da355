pub mod auth;
pub mod employee;
pub mod order;
pub mod product;
pub mod role;
