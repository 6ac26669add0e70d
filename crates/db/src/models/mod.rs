//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Query/response types owned by the corresponding repository

pub mod alert;
pub mod attribute;
pub mod detection;
pub mod performance_metric;
pub mod search;
pub mod video;
