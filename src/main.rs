use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use cardsteps::Config;

#[derive(Parser)]
#[command(name = "cardsteps")]
#[command(about = "Structure step-by-step assistant replies and render them")]
struct Cli {
    /// Config file (defaults are compiled in)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a reply and print it as JSON, Typst markup or PDF
    Render {
        /// Reply text file, or - for stdin
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output file (stdout for json/typst, <input>.pdf for pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Clean up a follow-up question completion and print the suggestions
    Suggest {
        /// Completion text file, or - for stdin
        input: PathBuf,

        /// Number of suggestions to keep
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Typst,
    Pdf,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::compiled_default(),
    };
    cardsteps::init_logging(&config.logging, cli.debug);

    let result = match cli.command {
        Command::Render {
            input,
            format,
            output,
        } => render(&input, format, output, &config),
        Command::Suggest { input, count } => {
            if let Some(count) = count {
                config.suggestions.count = count;
            }
            suggest(&input, &config)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn read_input(input: &Path) -> Result<String, String> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("reading stdin: {}", e))?;
        return Ok(text);
    }
    fs::read_to_string(input).map_err(|e| format!("reading {}: {}", input.display(), e))
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<(), String> {
    match path {
        Some(path) => {
            fs::write(path, bytes).map_err(|e| format!("writing {}: {}", path.display(), e))?;
            eprintln!("Created {}", path.display());
            Ok(())
        }
        None => {
            use std::io::Write;
            io::stdout()
                .write_all(bytes)
                .map_err(|e| format!("writing stdout: {}", e))
        }
    }
}

fn render(
    input: &Path,
    format: Format,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<(), String> {
    let reply = read_input(input)?;

    match format {
        Format::Json => {
            let parsed = cardsteps::parse_with_config(&reply, &config.parser);
            let mut json = serde_json::to_string_pretty(&parsed).map_err(|e| e.to_string())?;
            json.push('\n');
            write_output(output.as_deref(), json.as_bytes())
        }
        Format::Typst => {
            let markup = cardsteps::reply_to_typst_with_config(&reply, config);
            write_output(output.as_deref(), markup.as_bytes())
        }
        Format::Pdf => {
            let pdf_bytes =
                cardsteps::reply_to_pdf_with_config(&reply, config).map_err(|e| e.to_string())?;
            let output = output.unwrap_or_else(|| {
                if input == Path::new("-") {
                    PathBuf::from("reply.pdf")
                } else {
                    input.with_extension("pdf")
                }
            });
            write_output(Some(&output), &pdf_bytes)
        }
    }
}

fn suggest(input: &Path, config: &Config) -> Result<(), String> {
    let completion = read_input(input)?;
    let suggestions = cardsteps::parse_suggestions(&completion, &config.suggestions);
    let mut json = serde_json::to_string_pretty(&suggestions).map_err(|e| e.to_string())?;
    json.push('\n');
    write_output(None, json.as_bytes())
}
