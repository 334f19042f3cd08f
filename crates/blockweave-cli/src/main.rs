use anyhow::{Context, Result, bail};
use blockweave_config::Config;
use blockweave_engine::dom::{Element, RenderSpec};
use blockweave_engine::{Editor, PartialBlock, SchemaBuilder, StyleConfig, create_style_spec};
use std::path::{Path, PathBuf};
use std::{env, fs, process};

const USAGE: &str = "<html|internal-html|markdown|json|clipboard|from-markdown|from-html> <file>";

/// Output format, and what the input file holds.
#[derive(Debug, Clone, Copy)]
enum Command {
    ExternalHtml,
    InternalHtml,
    Markdown,
    Json,
    Clipboard,
    FromMarkdown,
    FromHtml,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "html" => Command::ExternalHtml,
            "internal-html" => Command::InternalHtml,
            "markdown" => Command::Markdown,
            "json" => Command::Json,
            "clipboard" => Command::Clipboard,
            "from-markdown" => Command::FromMarkdown,
            "from-html" => Command::FromHtml,
            _ => return None,
        })
    }

    fn extension(self) -> &'static str {
        match self {
            Command::ExternalHtml | Command::InternalHtml => "html",
            Command::Markdown => "md",
            Command::Json | Command::Clipboard | Command::FromMarkdown | Command::FromHtml => {
                "json"
            }
        }
    }
}

/// Default specs plus the `small` and `fontSize` styles, so documents using
/// them can be converted.
fn schema() -> SchemaBuilder {
    SchemaBuilder::new()
        .style(create_style_spec(StyleConfig::boolean("small"), |_| {
            RenderSpec::wrapper(Element::new("small"))
        }))
        .style(create_style_spec(StyleConfig::string("fontSize"), |value| {
            RenderSpec::wrapper(
                Element::new("span")
                    .with_attr("style", format!("font-size: {}", value.unwrap_or_default())),
            )
        }))
}

fn convert(command: Command, input: &str, config: &Config) -> Result<String> {
    let options = config.editor_options().with_schema(schema());

    let blocks: Vec<PartialBlock> = match command {
        Command::FromMarkdown => {
            let blocks = Editor::new(options)?.try_parse_markdown_to_blocks(input)?;
            return Ok(serde_json::to_string_pretty(&blocks)?);
        }
        Command::FromHtml => {
            let blocks = Editor::new(options)?.try_parse_html_to_blocks(input)?;
            return Ok(serde_json::to_string_pretty(&blocks)?);
        }
        _ => serde_json::from_str(input).context("Input is not a Block JSON array")?,
    };
    log::info!("Loaded {} top-level blocks", blocks.len());
    let editor = Editor::new(options.with_initial_content(blocks))?;

    Ok(match command {
        Command::ExternalHtml => editor.to_external_html()?,
        Command::InternalHtml => editor.to_internal_html()?,
        Command::Markdown => editor.to_markdown()?,
        Command::Clipboard => {
            let payload = editor.clipboard_payload(&editor.document()?)?;
            serde_json::to_string_pretty(&payload)?
        }
        Command::Json | Command::FromMarkdown | Command::FromHtml => {
            serde_json::to_string_pretty(&editor.document()?)?
        }
    })
}

fn export_path(export_dir: &Path, input: &Path, command: Command) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "blocks".to_string());
    export_dir.join(format!("{stem}.{}", command.extension()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let (command, input_path) = match args.as_slice() {
        [_, command, file] => match Command::parse(command) {
            Some(command) => (command, PathBuf::from(file)),
            None => {
                eprintln!("Error: Unknown command '{command}'");
                eprintln!("Usage: {} {USAGE}", args[0]);
                process::exit(1);
            }
        },
        _ => {
            let program_name = args.first().map(String::as_str).unwrap_or("blockweave-cli");
            eprintln!("Usage: {program_name} {USAGE}");
            process::exit(1);
        }
    };

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let input = fs::read_to_string(&input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;
    let output = convert(command, &input, &config)?;

    match &config.export_dir {
        Some(export_dir) => {
            if !export_dir.is_dir() {
                bail!("Export directory '{}' does not exist", export_dir.display());
            }
            let path = export_path(export_dir, &input_path, command);
            fs::write(&path, output)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{output}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: &str = r#"[
        {"type": "heading", "props": {"level": 2}, "content": "Title"},
        {"type": "paragraph", "content": [
            {"type": "text", "text": "big", "styles": {"fontSize": "30px"}},
            {"type": "text", "text": " and small", "styles": {"small": true}}
        ]}
    ]"#;

    #[test]
    fn test_markdown_export() {
        let out = convert(Command::Markdown, BLOCKS, &Config::default()).unwrap();
        assert!(out.starts_with("## Title"));
        assert!(out.contains("big and small"));
    }

    #[test]
    fn test_html_export_renders_demo_styles() {
        let out = convert(Command::ExternalHtml, BLOCKS, &Config::default()).unwrap();
        assert!(out.contains(r#"<span style="font-size: 30px""#));
        assert!(out.contains(r#"<small data-style-type="small"> and small</small>"#));
    }

    #[test]
    fn test_clipboard_payload_uses_configured_mime_type() {
        let config = Config {
            clipboard_mime_type: "application/x-notes".to_string(),
            ..Config::default()
        };
        let out = convert(Command::Clipboard, BLOCKS, &config).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(payload["parts"]["application/x-notes"].is_string());
        assert!(payload["parts"]["text/html"].is_string());
    }

    #[test]
    fn test_import_commands_emit_block_json() {
        let out = convert(Command::FromMarkdown, "- one\n- two\n", &Config::default()).unwrap();
        let blocks: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(blocks.as_array().unwrap().len(), 2);
        assert_eq!(blocks[0]["type"], "bulletListItem");

        let out = convert(Command::FromHtml, "<h3>Deep</h3>", &Config::default()).unwrap();
        let blocks: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(blocks[0]["props"]["level"], 3);
    }

    #[test]
    fn test_invalid_input_is_reported() {
        assert!(convert(Command::Json, "not json", &Config::default()).is_err());
        assert!(convert(Command::Json, r#"[{"type": "video"}]"#, &Config::default()).is_err());
    }

    #[test]
    fn test_export_path_uses_input_stem() {
        assert_eq!(
            export_path(Path::new("/out"), Path::new("notes/today.json"), Command::Markdown),
            PathBuf::from("/out/today.md")
        );
    }
}
