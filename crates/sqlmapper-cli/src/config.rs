use heck::ToLowerCamelCase;
use serde::Deserialize;
use sqlmapper::{
    Column, Direction, FieldStrategy, LogicDelete, MapperConfig, ParamMeta, TableMetadata,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_path: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;
        let file = ConfigFile::parse(&raw, &config_path)?;
        Ok(Self { config_path, file })
    }

    /// Resolve every `[[tables]]` entry into table metadata.
    pub fn tables(&self) -> anyhow::Result<Vec<TableMetadata>> {
        self.file
            .tables
            .iter()
            .map(|t| {
                t.to_metadata(&self.file.mapper).map_err(|e| {
                    anyhow::anyhow!(
                        "invalid table '{}' in {}: {e}",
                        t.name,
                        self.config_path.display()
                    )
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    #[serde(default)]
    pub mapper: MapperConfig,

    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl ConfigFile {
    pub fn parse(raw: &str, path: &Path) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(raw)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if self.tables.is_empty() {
            anyhow::bail!("at least one [[tables]] entry is required");
        }

        let mut seen = std::collections::HashSet::<&str>::new();
        for t in &self.tables {
            if t.name.trim().is_empty() {
                anyhow::bail!("tables.name must not be empty");
            }
            if !seen.insert(t.name.as_str()) {
                anyhow::bail!("duplicate tables.name: {}", t.name);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnConfig {
    pub column: String,
    /// Defaults to the column name in lowerCamelCase.
    pub property: Option<String>,
    pub jdbc_type: Option<String>,
    pub value_type: Option<String>,
    pub type_handler: Option<String>,
    pub numeric_scale: Option<u32>,
    pub insert_strategy: Option<FieldStrategy>,
    pub update_strategy: Option<FieldStrategy>,
    pub where_strategy: Option<FieldStrategy>,
}

impl ColumnConfig {
    fn to_column(&self) -> Column {
        let property = self
            .property
            .clone()
            .unwrap_or_else(|| self.column.to_lower_camel_case());
        let mut column = Column::new(&self.column, property).with_meta(ParamMeta {
            jdbc_type: self.jdbc_type.clone(),
            value_type: self.value_type.clone(),
            type_handler: self.type_handler.clone(),
            numeric_scale: self.numeric_scale,
        });
        if let Some(s) = self.insert_strategy {
            column = column.insert_strategy(s);
        }
        if let Some(s) = self.update_strategy {
            column = column.update_strategy(s);
        }
        if let Some(s) = self.where_strategy {
            column = column.where_strategy(s);
        }
        column
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogicDeleteConfig {
    #[serde(flatten)]
    pub column: ColumnConfig,
    /// Defaults to `mapper.logic_delete_value`.
    pub delete_value: Option<String>,
    /// Defaults to `mapper.logic_not_delete_value`.
    pub not_delete_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub name: String,
    pub key: Option<ColumnConfig>,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    pub version: Option<ColumnConfig>,
    pub logic_delete: Option<LogicDeleteConfig>,
    /// Default order entries: `"column"` or `"column DESC"`.
    #[serde(default)]
    pub order_by: Vec<String>,
}

impl TableConfig {
    pub fn to_metadata(&self, mapper: &MapperConfig) -> anyhow::Result<TableMetadata> {
        let mut builder = TableMetadata::builder(&self.name);
        if let Some(key) = &self.key {
            builder = builder.key(key.to_column());
        }
        for column in &self.columns {
            builder = builder.column(column.to_column());
        }
        if let Some(version) = &self.version {
            builder = builder.version(version.to_column());
        }
        if let Some(ld) = &self.logic_delete {
            let defaults = LogicDelete::with_defaults(mapper);
            let values = LogicDelete::new(
                ld.delete_value.clone().unwrap_or(defaults.delete_value),
                ld.not_delete_value.clone().unwrap_or(defaults.not_delete_value),
            );
            builder = builder.logic_delete(ld.column.to_column(), values);
        }
        for entry in &self.order_by {
            let (column, direction) = parse_order(entry)?;
            builder = builder.order_by(column, direction);
        }
        Ok(builder.build()?)
    }
}

fn parse_order(entry: &str) -> anyhow::Result<(&str, Direction)> {
    let mut parts = entry.split_whitespace();
    let Some(column) = parts.next() else {
        anyhow::bail!("order_by entries must not be empty");
    };
    let direction = match parts.next() {
        None => Direction::Asc,
        Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
        Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
        Some(d) => anyhow::bail!("invalid order direction '{d}' in '{entry}'"),
    };
    if parts.next().is_some() {
        anyhow::bail!("invalid order_by entry: '{entry}'");
    }
    Ok((column, direction))
}
