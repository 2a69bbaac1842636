use super::Value;

/// One fetched or stored row: column values in table column order.
pub type Row = Vec<Value>;
