mod cli;
mod config;
mod inspect;
mod render;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Inspect(args) => inspect::run(args),
        cli::Command::Render(args) => render::run(args),
    }
}
