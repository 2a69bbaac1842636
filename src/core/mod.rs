pub mod error;
pub mod types;
pub mod value;

pub use error::{
    DbError, Result, SQLSTATE_DEADLOCK_DETECTED, SQLSTATE_READ_ONLY_TRANSACTION,
    SQLSTATE_SERIALIZATION_FAILURE,
};
pub use types::Row;
pub use value::Value;
