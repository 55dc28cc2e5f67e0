use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Inspect,
    Render,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Inspect(InspectArgs),
    Render(RenderArgs),
}

#[derive(Debug, Clone)]
pub struct InspectArgs {
    pub config: PathBuf,
    pub table: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub config: PathBuf,
    pub table: String,
    pub method: String,
    pub entity: Option<String>,
    pub wrapper: Option<String>,
    pub id: Option<String>,
    pub expected_version: Option<String>,
}

const DEFAULT_CONFIG: &str = "sqlmapper.toml";

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "inspect" => parse_inspect(it.map(|s| s.as_str())),
        "render" => parse_render(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// `--name value` or `--name=value`. Returns `None` when `token` is a different flag.
fn flag_value<'a>(
    name: &str,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<&'a str>> {
    if token == name {
        let Some(v) = it.next() else {
            anyhow::bail!("{name} requires a value");
        };
        return Ok(Some(v));
    }
    Ok(token
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('=')))
}

fn parse_inspect<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut table: Option<String> = None;
    let mut method: Option<String> = None;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Inspect));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
        } else if let Some(v) = flag_value("--table", token, &mut it)? {
            table = Some(v.to_string());
        } else if let Some(v) = flag_value("--method", token, &mut it)? {
            method = Some(v.to_string());
        } else {
            anyhow::bail!("unknown argument: {token}");
        }
    }

    Ok(Command::Inspect(InspectArgs {
        config,
        table,
        method,
    }))
}

fn parse_render<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut table: Option<String> = None;
    let mut method: Option<String> = None;
    let mut entity: Option<String> = None;
    let mut wrapper: Option<String> = None;
    let mut id: Option<String> = None;
    let mut expected_version: Option<String> = None;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Render));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
        } else if let Some(v) = flag_value("--table", token, &mut it)? {
            table = Some(v.to_string());
        } else if let Some(v) = flag_value("--method", token, &mut it)? {
            method = Some(v.to_string());
        } else if let Some(v) = flag_value("--entity", token, &mut it)? {
            entity = Some(v.to_string());
        } else if let Some(v) = flag_value("--wrapper", token, &mut it)? {
            wrapper = Some(v.to_string());
        } else if let Some(v) = flag_value("--id", token, &mut it)? {
            id = Some(v.to_string());
        } else if let Some(v) = flag_value("--expected-version", token, &mut it)? {
            expected_version = Some(v.to_string());
        } else {
            anyhow::bail!("unknown argument: {token}");
        }
    }

    let Some(table) = table else {
        anyhow::bail!("render requires --table");
    };
    let Some(method) = method else {
        anyhow::bail!("render requires --method");
    };

    Ok(Command::Render(RenderArgs {
        config,
        table,
        method,
        entity,
        wrapper,
        id,
        expected_version,
    }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlmapper - inspect and render injected CRUD statements

USAGE:
  sqlmapper <COMMAND> [OPTIONS]

COMMANDS:
  inspect       Print statement templates and parameter bindings
  render        Render one statement call to SQL and bound values

Run `sqlmapper <command> --help` for more."
            );
        }
        HelpTopic::Inspect => {
            println!(
                "\
USAGE:
  sqlmapper inspect [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: sqlmapper.toml)
  --table <NAME>        Only this table
  --method <KIND>       Only this method (e.g. selectList, update_by_id)
  -h, --help            Print help"
            );
        }
        HelpTopic::Render => {
            println!(
                "\
USAGE:
  sqlmapper render --table <NAME> --method <KIND> [OPTIONS]

OPTIONS:
  --config <FILE>              Config file path (default: sqlmapper.toml)
  --entity <JSON>              Entity payload, e.g. '{{\"id\":1,\"name\":\"x\"}}'
  --wrapper <JSON>             Condition wrapper (entity, criteria, segment,
                               first, comment, set, select, order_by)
  --id <JSON>                  Id argument of by-id methods
  --expected-version <JSON>    Pre-update version for the optimistic lock
  -h, --help                   Print help"
            );
        }
    }
}
