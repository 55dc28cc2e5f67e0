//! Process-wide statement registry.
//!
//! Two ways to populate it:
//!
//! - [`RegistryBuilder`] during startup: add tables (or collect every
//!   [`TableRegistration`] submitted through `inventory`), then `build()` an
//!   immutable [`RegistrySnapshot`].
//! - [`MapperRegistry`] for first-use registration from many threads. Builds
//!   happen outside the lock; the insert per table is atomic and the first
//!   writer wins.
//!
//! ```ignore
//! fn user_table() -> sqlmapper::MapperResult<sqlmapper::TableMetadata> { ... }
//!
//! sqlmapper::inventory::submit! {
//!     sqlmapper::TableRegistration { build: user_table }
//! }
//!
//! let snapshot = RegistryBuilder::new(MapperConfig::default())
//!     .collect_registered()
//!     .build()?;
//! let stmt = snapshot.statement("t_user", MethodKind::SelectById)?;
//! ```

use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::injector::{MapperStatements, MethodSelection, StatementInjector};
use crate::metadata::TableMetadata;
use crate::statement::{MethodKind, StatementDescriptor};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, PoisonError, RwLock};

/// Registration entry for tables known at compile time.
pub struct TableRegistration {
    /// Resolves the table's metadata.
    pub build: fn() -> MapperResult<TableMetadata>,
}

inventory::collect!(TableRegistration);

type Tables = HashMap<String, Arc<MapperStatements>>;

fn lookup<'a>(
    tables: &'a Tables,
    table: &str,
    kind: MethodKind,
) -> MapperResult<&'a Arc<StatementDescriptor>> {
    tables
        .get(table)
        .ok_or_else(|| MapperError::UnknownStatement(format!("table '{table}' is not registered")))?
        .statement(kind)
}

/// Shared registry; safe for concurrent first-use registration.
#[derive(Debug, Default)]
pub struct MapperRegistry {
    injector: StatementInjector,
    tables: RwLock<Tables>,
}

impl MapperRegistry {
    pub fn new(injector: StatementInjector) -> Self {
        Self {
            injector,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn injector(&self) -> &StatementInjector {
        &self.injector
    }

    /// Inject and register `table`, or return what is already registered
    /// under its name.
    pub fn register(&self, table: TableMetadata) -> MapperResult<Arc<MapperStatements>> {
        if let Some(existing) = self.get(table.table_name()) {
            return Ok(existing);
        }

        let built = Arc::new(self.injector.inject(table)?);
        let name = built.table_name().to_string();

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        match tables.entry(name) {
            Entry::Occupied(entry) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    target: "sqlmapper.registry",
                    table = entry.key().as_str(),
                    "concurrent registration lost the race; keeping the first"
                );
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    target: "sqlmapper.registry",
                    table = entry.key().as_str(),
                    statements = built.len(),
                    "registered table"
                );
                Ok(Arc::clone(entry.insert(built)))
            }
        }
    }

    pub fn get(&self, table: &str) -> Option<Arc<MapperStatements>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.get(table).cloned()
    }

    pub fn statement(
        &self,
        table: &str,
        kind: MethodKind,
    ) -> MapperResult<Arc<StatementDescriptor>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        lookup(&tables, table, kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Immutable copy of the current contents.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        RegistrySnapshot {
            tables: Arc::new(tables.clone()),
        }
    }
}

/// Read-only registry contents; cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    tables: Arc<Tables>,
}

impl RegistrySnapshot {
    pub fn get(&self, table: &str) -> Option<&Arc<MapperStatements>> {
        self.tables.get(table)
    }

    pub fn statement(&self, table: &str, kind: MethodKind) -> MapperResult<&StatementDescriptor> {
        lookup(&self.tables, table, kind).map(|s| s.as_ref())
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Startup-phase registry construction.
#[derive(Default)]
pub struct RegistryBuilder {
    injector: StatementInjector,
    tables: Vec<TableMetadata>,
    collect_registered: bool,
}

impl RegistryBuilder {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            injector: StatementInjector::new(config),
            tables: Vec::new(),
            collect_registered: false,
        }
    }

    pub fn selection(mut self, selection: MethodSelection) -> Self {
        self.injector = self.injector.with_selection(selection);
        self
    }

    pub fn table(mut self, table: TableMetadata) -> Self {
        self.tables.push(table);
        self
    }

    pub fn tables(mut self, tables: impl IntoIterator<Item = TableMetadata>) -> Self {
        self.tables.extend(tables);
        self
    }

    /// Also register every [`TableRegistration`] linked into the binary.
    pub fn collect_registered(mut self) -> Self {
        self.collect_registered = true;
        self
    }

    /// Inject every table. Any failure, including a table name given twice,
    /// fails the whole build.
    pub fn build(self) -> MapperResult<RegistrySnapshot> {
        let mut tables = self.tables;
        if self.collect_registered {
            for reg in inventory::iter::<TableRegistration> {
                tables.push((reg.build)()?);
            }
        }

        let mut out: Tables = HashMap::with_capacity(tables.len());
        for table in tables {
            let name = table.table_name().to_string();
            if out.contains_key(&name) {
                return Err(MapperError::invalid_metadata(format!(
                    "table '{name}' registered twice"
                )));
            }
            let statements = self.injector.inject(table)?;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sqlmapper.registry",
                table = name.as_str(),
                statements = statements.len(),
                "registered table"
            );
            out.insert(name, Arc::new(statements));
        }

        Ok(RegistrySnapshot {
            tables: Arc::new(out),
        })
    }

    /// Like [`build`](Self::build) but returns a registry that accepts later
    /// registrations.
    pub fn into_registry(self) -> MapperResult<MapperRegistry> {
        let injector = self.injector.clone();
        let snapshot = self.build()?;
        Ok(MapperRegistry {
            injector,
            tables: RwLock::new(snapshot.tables.as_ref().clone()),
        })
    }
}
