//! # sqlmapper
//!
//! CRUD statement synthesis for table-mapped entities.
//!
//! Given resolved [`TableMetadata`], the [`StatementInjector`] builds one
//! immutable [`StatementDescriptor`] per operation kind. Each call renders a
//! descriptor against an [`Invocation`] (entity payload, [`ConditionWrapper`],
//! id, expected version) into [`BoundSql`]: SQL text plus bound values.
//!
//! ## Features
//!
//! - **Two placeholder tiers**: column-derived values are always bound; only
//!   wrapper raw texts (`segment`, `first`, `comment`, `set_sql`, `select`) are
//!   spliced verbatim
//! - **Logic delete**: queries filter deleted rows, deletes become updates
//! - **Optimistic locking**: version guard bound to the caller's pre-update value
//! - **Safe defaults**: UPDATE requires SET, UPDATE/DELETE require WHERE
//!
//! ```ignore
//! use sqlmapper::prelude::*;
//!
//! let table = TableMetadata::builder("t_user")
//!     .key(Column::new("id", "id"))
//!     .column(Column::new("name", "name"))
//!     .version(Column::new("version", "version"))
//!     .logic_delete(Column::new("deleted", "deleted"), LogicDelete::new("1", "0"))
//!     .build()?;
//!
//! let statements = StatementInjector::new(MapperConfig::default()).inject(table)?;
//! let update = statements.statement(MethodKind::UpdateById)?;
//!
//! let bound = update.render(
//!     &Invocation::new()
//!         .entity(Record::new().with("id", 1).with("name", "alice"))
//!         .expected_version("version", 3),
//! )?;
//! // UPDATE t_user SET name = $1, version = $2 WHERE id = $3 AND version = $4 AND deleted = 0
//! ```

pub mod clause;
pub mod config;
pub mod error;
pub mod ident;
pub mod injector;
pub mod metadata;
pub mod node;
pub mod param;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod render;
pub mod statement;
pub mod wrapper;

pub use config::{MapperConfig, PlaceholderStyle};
pub use error::{MapperError, MapperResult};
pub use ident::Ident;
pub use injector::{MapperStatements, MethodSelection, StatementInjector};
pub use metadata::{
    Column, Direction, FieldStrategy, LogicDelete, OrderItem, TableMetadata, TableMetadataBuilder,
};
pub use param::{BoundParam, ParamMeta, ParamSource, RawSlot};
pub use record::Record;
pub use registry::{MapperRegistry, RegistryBuilder, RegistrySnapshot, TableRegistration};
pub use render::{BoundSql, BoundValue, Invocation};
pub use statement::{MethodKind, ResultType, StatementBuilder, StatementDescriptor, StatementKind};
pub use wrapper::{CompareOp, ConditionWrapper, Connective, Criterion, Segment, SegmentShape};

// Re-exported for `inventory::submit!` of table registrations
pub use inventory;
