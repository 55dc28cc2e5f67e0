//! Convenient imports for typical `sqlmapper` usage.
//!
//! ```ignore
//! use sqlmapper::prelude::*;
//! ```

pub use crate::{
    BoundSql, Column, ConditionWrapper, Direction, FieldStrategy, Invocation, LogicDelete,
    MapperConfig, MapperError, MapperResult, MethodKind, Record, StatementDescriptor,
    StatementInjector, TableMetadata,
};

pub use crate::{MapperRegistry, RegistryBuilder, RegistrySnapshot};
