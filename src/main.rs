use anyhow::{Context, Result};
use cli::Cli;
use settings::Settings;
use std::process::ExitCode;

mod browser;
mod cli;
mod debug;
mod document;
mod error;
mod markdown;
mod print;
mod settings;
mod system;
mod template;
mod theme;

fn main() -> ExitCode {
    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match &cli.command {
        cli::Commands::Print(args) => print::run(args, &settings),
        cli::Commands::Render(args) => print::render(args, &settings),
        cli::Commands::Debug(args) => debug::run(args, &settings),
        cli::Commands::Config => {
            let env = theme::Environment::from_process();
            let text = toml::to_string_pretty(&settings)
                .with_context(|| "Failed to serialise settings to TOML")?;
            println!("{text}");
            println!(
                "# themes resolve to {}",
                theme::ThemeResolver::from_template(&settings.theme_dir, &env)
                    .dir()
                    .display()
            );
            Ok(())
        }
    }
}
