//! Statement injection: one table in, one descriptor per method out.

use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::metadata::TableMetadata;
use crate::statement::{MethodKind, StatementDescriptor};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which methods to inject for a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MethodSelection {
    /// Every kind the table supports. Keyed kinds are skipped for tables
    /// without a key, and the version-guarded update for tables without a
    /// version column.
    #[default]
    Standard,
    /// Exactly these kinds. A kind the table cannot support fails injection.
    Only(Vec<MethodKind>),
}

/// The injected statements of one table.
#[derive(Debug, Clone)]
pub struct MapperStatements {
    table: Arc<TableMetadata>,
    statements: BTreeMap<MethodKind, Arc<StatementDescriptor>>,
}

impl MapperStatements {
    pub fn table(&self) -> &TableMetadata {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.table_name()
    }

    pub fn get(&self, kind: MethodKind) -> Option<&Arc<StatementDescriptor>> {
        self.statements.get(&kind)
    }

    /// Like [`get`](Self::get) but fails with `UnknownStatement`.
    pub fn statement(&self, kind: MethodKind) -> MapperResult<&Arc<StatementDescriptor>> {
        self.get(kind).ok_or_else(|| {
            MapperError::UnknownStatement(format!("{}.{}", self.table_name(), kind.name()))
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodKind> + '_ {
        self.statements.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<StatementDescriptor>> {
        self.statements.values()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Builds [`MapperStatements`] for tables.
#[derive(Debug, Clone, Default)]
pub struct StatementInjector {
    config: MapperConfig,
    selection: MethodSelection,
}

impl StatementInjector {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            selection: MethodSelection::Standard,
        }
    }

    pub fn with_selection(mut self, selection: MethodSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn selection(&self) -> &MethodSelection {
        &self.selection
    }

    fn supports(table: &TableMetadata, kind: MethodKind) -> bool {
        (!kind.requires_key() || table.key().is_some())
            && (!kind.requires_version() || table.version().is_some())
    }

    /// Build every selected statement for `table`.
    ///
    /// Fails on the first builder error; nothing is returned for a table whose
    /// injection failed.
    pub fn inject(&self, table: TableMetadata) -> MapperResult<MapperStatements> {
        let kinds: Vec<MethodKind> = match &self.selection {
            MethodSelection::Standard => MethodKind::ALL
                .into_iter()
                .filter(|kind| {
                    let supported = Self::supports(&table, *kind);
                    #[cfg(feature = "tracing")]
                    if !supported {
                        tracing::debug!(
                            target: "sqlmapper.inject",
                            table = table.table_name(),
                            method = kind.name(),
                            "skipping method unsupported by table"
                        );
                    }
                    supported
                })
                .collect(),
            MethodSelection::Only(kinds) => kinds.clone(),
        };

        let mut statements = BTreeMap::new();
        for kind in kinds {
            let descriptor = kind.builder().build(&table, &self.config)?;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sqlmapper.inject",
                statement = descriptor.id(),
                template = %descriptor.template(),
                "injected statement"
            );
            statements.insert(kind, Arc::new(descriptor));
        }

        Ok(MapperStatements {
            table: Arc::new(table),
            statements,
        })
    }
}
