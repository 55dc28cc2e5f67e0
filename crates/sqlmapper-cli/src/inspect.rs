use crate::cli::InspectArgs;
use crate::config::ProjectConfig;
use sqlmapper::{MethodKind, RegistrySnapshot, StatementDescriptor};
use std::fmt::Write as _;

fn describe(stmt: &StatementDescriptor, out: &mut String) {
    let _ = writeln!(
        out,
        "-- {} ({:?}, {:?})",
        stmt.id(),
        stmt.statement_kind(),
        stmt.result_type()
    );
    let _ = writeln!(out, "{}", stmt.sql_template());
    for (name, meta) in stmt.parameter_bindings() {
        if meta.is_empty() {
            let _ = writeln!(out, "--   #{{{name}}}");
        } else {
            let _ = writeln!(out, "--   #{{{name}}} {meta:?}");
        }
    }
}

/// Render the inspect report for a snapshot.
pub fn report(
    snapshot: &RegistrySnapshot,
    table: Option<&str>,
    method: Option<MethodKind>,
) -> anyhow::Result<String> {
    let names: Vec<&str> = match table {
        Some(t) => {
            if snapshot.get(t).is_none() {
                anyhow::bail!("table '{t}' is not defined");
            }
            vec![t]
        }
        None => snapshot.table_names(),
    };

    let mut out = String::new();
    for name in names {
        let Some(statements) = snapshot.get(name) else {
            continue;
        };
        match method {
            Some(kind) => describe(statements.statement(kind)?, &mut out),
            None => statements.iter().for_each(|s| describe(s, &mut out)),
        }
        out.push('\n');
    }
    Ok(out)
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(args.config)?;
    let snapshot = sqlmapper::RegistryBuilder::new(project.file.mapper.clone())
        .tables(project.tables()?)
        .build()?;
    let method = args
        .method
        .as_deref()
        .map(str::parse::<MethodKind>)
        .transpose()?;
    print!("{}", report(&snapshot, args.table.as_deref(), method)?);
    Ok(())
}
