pub mod builder;

pub use builder::{Filter, OrderTerm, SelectQuery};
