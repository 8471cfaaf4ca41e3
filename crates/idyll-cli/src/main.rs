use clap::{Args, Parser, Subcommand};
use idyll_lexer::{render_tokens, LexerOptions, Scanner};
use idyll_parser::{Declaration, Document, ParseError};
use log::{debug, info};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "idyll")]
#[command(about = "Idyll markup compiler: prose and components to a JSON AST")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    lexer: LexerArgs,

    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct LexerArgs {
    /// Only open a code fence after a blank line
    #[arg(long, global = true)]
    strict_fences: bool,

    /// Shortest backtick run that opens a code fence
    #[arg(long, value_name = "N", default_value_t = 3, global = true)]
    fence_min: usize,
}

impl LexerArgs {
    fn options(&self) -> LexerOptions {
        LexerOptions {
            fence_min_backticks: self.fence_min,
            strict_fences: self.strict_fences,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Compile an .idl file to a JSON AST next to the source
    Build {
        /// Input .idl file
        path: PathBuf,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,

        /// Print the JSON instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Check an .idl file for errors without writing output
    Check {
        /// Input .idl file
        path: PathBuf,
    },

    /// Print the token stream of an .idl file
    Tokens {
        /// Input .idl file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.lexer.options();
    debug!("lexer options: {options:?}");

    match cli.command {
        Command::Build {
            path,
            pretty,
            stdout,
        } => cmd_build(&path, &options, pretty, stdout),
        Command::Check { path } => cmd_check(&path, &options),
        Command::Tokens { path } => cmd_tokens(&path, &options),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn read_source(path: &Path) -> String {
    if !path.exists() {
        eprintln!("Error: file not found: {}", path.display());
        std::process::exit(1);
    }
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

/// Parse or exit with a located error message.
fn compile(path: &Path, source: &str, options: &LexerOptions) -> Document {
    match idyll_parser::Parser::parse_with(source, options) {
        Ok(doc) => {
            debug!("{}: {} top-level nodes", path.display(), doc.nodes.len());
            doc
        }
        Err(e) => {
            eprintln!("{}", format_error(&path.display().to_string(), source, &e));
            std::process::exit(1);
        }
    }
}

fn cmd_build(path: &Path, options: &LexerOptions, pretty: bool, stdout: bool) {
    let source = read_source(path);
    let doc = compile(path, &source, options);

    let json = if pretty {
        doc.to_json_pretty()
    } else {
        doc.to_json()
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    if stdout {
        println!("{json}");
        return;
    }

    let out_path = path.with_extension("json");
    if let Err(e) = std::fs::write(&out_path, json) {
        eprintln!("Error writing {}: {e}", out_path.display());
        std::process::exit(1);
    }

    info!("Built: {}", out_path.display());
}

fn cmd_check(path: &Path, options: &LexerOptions) {
    let source = read_source(path);
    let doc = compile(path, &source, options);

    for declaration in doc.declarations() {
        match declaration {
            Declaration::Variable { name, value } => match value {
                Some(value) => info!("var {name} = {}", describe_value(value)),
                None => info!("var {name}"),
            },
            Declaration::Dataset { name, source } => info!("data {name} <- {source}"),
        }
    }

    info!("OK: {}", path.display());
}

fn cmd_tokens(path: &Path, options: &LexerOptions) {
    let source = read_source(path);
    let tokens = Scanner::tokenize_with(&source, options);
    debug!("{}: {} tokens", path.display(), tokens.len());
    println!("{}", render_tokens(&tokens));
}

fn describe_value(value: &idyll_parser::PropertyValue) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}

/// `path:row:column: message`, then the offending line with a caret under
/// the reported column.
fn format_error(path: &str, source: &str, err: &ParseError) -> String {
    let mut out = format!("{path}:{}:{}: {}", err.row, err.column, err.message);

    let line = err
        .row
        .checked_sub(1)
        .and_then(|index| source.lines().nth(index));
    if let Some(line) = line {
        let indent: String = line
            .chars()
            .take(err.column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        out.push_str(&format!("\n  {line}\n  {indent}^"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_error_points_at_column() {
        let source = "Intro\n\n[a]x[/b]";
        let err = idyll_parser::Parser::parse(source).unwrap_err();
        assert_eq!(
            format_error("doc.idl", source, &err),
            "doc.idl:3:7: Mismatched closing tag: expected [/a], found [/b]\n  [a]x[/b]\n        ^"
        );
    }

    #[test]
    fn test_format_error_keeps_tabs_aligned() {
        let err = ParseError {
            message: "oops".into(),
            row: 1,
            column: 3,
        };
        assert_eq!(
            format_error("t.idl", "\tab", &err),
            "t.idl:1:3: oops\n  \tab\n  \t ^"
        );
    }

    #[test]
    fn test_format_error_without_source_line() {
        let err = ParseError {
            message: "Unexpected end of input inside [a]".into(),
            row: 4,
            column: 1,
        };
        assert_eq!(
            format_error("t.idl", "[a", &err),
            "t.idl:4:1: Unexpected end of input inside [a]"
        );
    }

    #[test]
    fn test_lexer_args_to_options() {
        let cli = Cli::parse_from(["idyll", "--strict-fences", "--fence-min", "4", "check", "x.idl"]);
        assert_eq!(
            cli.lexer.options(),
            LexerOptions {
                fence_min_backticks: 4,
                strict_fences: true,
            }
        );
    }

    #[test]
    fn test_describe_value() {
        let doc = idyll_parser::Parser::parse("[var name:\"x\" value:`1 + 2` /]").unwrap();
        let declarations = doc.declarations();
        let Declaration::Variable {
            value: Some(value), ..
        } = &declarations[0]
        else {
            panic!("expected a variable declaration");
        };
        assert_eq!(describe_value(value), r#"["expression","1 + 2"]"#);
    }
}
