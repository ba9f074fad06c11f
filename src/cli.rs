use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Markdown document to print
    pub input: PathBuf,
    /// Path of the PDF to write (defaults to the input name with a .pdf extension)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
    /// Also write the intermediate HTML next to the PDF
    #[clap(long)]
    pub html: bool,
    /// Directory to load themes from, overriding the settings file
    #[clap(long, env = "MDOC_THEME_DIR")]
    pub theme_dir: Option<String>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Markdown document to render
    pub input: PathBuf,
    /// Path of the HTML file to write (defaults to standard output)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
    /// Directory to load themes from, overriding the settings file
    #[clap(long, env = "MDOC_THEME_DIR")]
    pub theme_dir: Option<String>,
}

#[derive(Args, Debug)]
pub struct DebugArgs {
    /// Path of the PDF to write (defaults to debug-<timestamp>.pdf)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generates a PDF from a markdown document
    Print(PrintArgs),
    /// Renders a markdown document to themed HTML without printing it
    Render(RenderArgs),
    /// Prints a page of system information to check the installation
    Debug(DebugArgs),
    /// Shows the effective settings
    Config,
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// Path to the settings file (defaults to <config dir>/mdoc/config.toml)
    #[clap(short, long, global = true, env = "MDOC_CONFIG")]
    pub config: Option<PathBuf>,
    /// Log more details; repeat for even more
    #[clap(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn can_parse_print_command() {
        let cli = Cli::try_parse_from(["mdoc", "-vv", "print", "notes.md", "--html", "-o", "out.pdf"])
            .expect("can parse");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Print(args) => {
                assert_eq!(args.input, PathBuf::from("notes.md"));
                assert_eq!(args.output, Some(PathBuf::from("out.pdf")));
                assert!(args.html);
            }
            other => panic!("expected print, got {other:?}"),
        }
    }
}
