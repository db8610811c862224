use futures::executor::block_on;
use genesis::compare::{ComparisonSession, RecordSummary};
use genesis::model::DEFAULT_NODE_CONTENT;
use genesis::persist::{export_file_name, load_document_text, to_json_pretty};
use genesis::render::raster::{ExportOptions, ExportOutput, RasterOptions, export_image};
use genesis::render::{RenderOptions, Renderer, SvgRenderOptions, sanitize_svg_id};
use genesis::{EditorConfig, GraphStore};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Genesis(genesis::Error),
    Render(genesis::render::HeadlessError),
    Json(serde_json::Error),
    /// The document is fine but the requested edit or import was refused.
    Rejected(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Genesis(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Rejected(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<genesis::Error> for CliError {
    fn from(value: genesis::Error) -> Self {
        Self::Genesis(value)
    }
}

impl From<genesis::render::HeadlessError> for CliError {
    fn from(value: genesis::render::HeadlessError) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl CliError {
    fn exit_code(&self) -> i32 {
        let document_error = |err: &genesis::Error| {
            matches!(
                err,
                genesis::Error::Validation { .. } | genesis::Error::NotFound { .. }
            )
        };
        match self {
            CliError::Usage(_) => 2,
            CliError::Rejected(_) => 3,
            CliError::Genesis(err) if document_error(err) => 3,
            CliError::Render(genesis::render::HeadlessError::Core(err)) if document_error(err) => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    New,
    Inspect,
    Normalize,
    AddNode,
    Link,
    RemoveNode,
    Render,
}

#[derive(Debug, Clone, Copy, Default)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Option<Command>,
    inputs: Vec<String>,
    config: Option<String>,
    out: Option<String>,
    out_dir: Option<String>,
    pretty: bool,
    render_format: RenderFormat,
    render_scale: f32,
    background: Option<String>,
    diagram_id: Option<String>,
    mind_type: Option<String>,
    parent: Option<String>,
    content: Option<String>,
    source: Option<String>,
    target: Option<String>,
    label: Option<String>,
    node_id: Option<String>,
}

impl Args {
    fn input(&self) -> Option<&str> {
        self.inputs.first().map(String::as_str)
    }
}

#[derive(Serialize)]
struct InspectFailure<'a> {
    file: &'a str,
    error: String,
}

#[derive(Serialize)]
struct InspectRecord<'a> {
    name: &'a str,
    size: u64,
    size_label: String,
    summary: &'a RecordSummary,
}

#[derive(Serialize)]
struct InspectOut<'a> {
    mode: genesis::compare::Mode,
    records: Vec<InspectRecord<'a>>,
    failures: Vec<InspectFailure<'a>>,
}

fn usage() -> &'static str {
    "genesis-cli\n\
\n\
USAGE:\n\
  genesis-cli new [--type <type>] [--pretty] [--out <path>]\n\
  genesis-cli inspect [--pretty] <path>...\n\
  genesis-cli normalize [--pretty] [--out <path>|--out-dir <dir>] [<path>|-]\n\
  genesis-cli add-node --parent <id> [--content <text>] [--pretty] [--out <path>] [<path>|-]\n\
  genesis-cli link --source <id> --target <id> [--label <text>] [--pretty] [--out <path>] [<path>|-]\n\
  genesis-cli remove-node --id <id> [--pretty] [--out <path>] [<path>|-]\n\
  genesis-cli render [--format svg|png] [--scale <n>] [--background <css-color>] [--diagram-id <id>] [--out <path>] [<path>|-]\n\
\n\
OPTIONS:\n\
  --config <json-file>  merge editor settings onto the defaults\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Edit commands print the updated document; use --out to write a file.\n\
  - normalize --out-dir names the file genesis-mind.<type>.<stamp>.json.\n\
  - render prints SVG to stdout by default.\n\
  - PNG output defaults to scale 2 on white, next to the input file (or ./out.png for stdin).\n\
  - When rasterization fails an .svg file is written instead.\n\
  - Log verbosity follows GENESIS_LOG (e.g. GENESIS_LOG=debug); logs go to stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        render_format: RenderFormat::Svg,
        render_scale: 2.0,
        ..Default::default()
    };

    fn value(it: &mut impl Iterator<Item = String>) -> Result<String, CliError> {
        it.next().ok_or(CliError::Usage(usage()))
    }

    let mut it = argv.iter().skip(1).cloned();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "new" if args.command.is_none() => args.command = Some(Command::New),
            "inspect" if args.command.is_none() => args.command = Some(Command::Inspect),
            "normalize" if args.command.is_none() => args.command = Some(Command::Normalize),
            "add-node" if args.command.is_none() => args.command = Some(Command::AddNode),
            "link" if args.command.is_none() => args.command = Some(Command::Link),
            "remove-node" if args.command.is_none() => args.command = Some(Command::RemoveNode),
            "render" if args.command.is_none() => args.command = Some(Command::Render),
            "--pretty" => args.pretty = true,
            "--config" => args.config = Some(value(&mut it)?),
            "--out" => args.out = Some(value(&mut it)?),
            "--out-dir" => args.out_dir = Some(value(&mut it)?),
            "--format" => {
                args.render_format = value(&mut it)?
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                args.render_scale = value(&mut it)?
                    .parse::<f32>()
                    .map_err(|_| CliError::Usage(usage()))?;
                if !(args.render_scale.is_finite() && args.render_scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let bg = value(&mut it)?;
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--diagram-id" => args.diagram_id = Some(value(&mut it)?),
            "--type" => args.mind_type = Some(value(&mut it)?),
            "--parent" => args.parent = Some(value(&mut it)?),
            "--content" => args.content = Some(value(&mut it)?),
            "--source" => args.source = Some(value(&mut it)?),
            "--target" => args.target = Some(value(&mut it)?),
            "--label" => args.label = Some(value(&mut it)?),
            "--id" => args.node_id = Some(value(&mut it)?),
            "--" => args.inputs.extend(it.by_ref()),
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => args.inputs.push(path.to_string()),
        }
    }

    let command = args.command.ok_or(CliError::Usage(usage()))?;
    let valid = match command {
        Command::New => args.inputs.is_empty(),
        Command::Inspect => !args.inputs.is_empty(),
        Command::AddNode => args.parent.is_some() && args.inputs.len() <= 1,
        Command::Link => args.source.is_some() && args.target.is_some() && args.inputs.len() <= 1,
        Command::RemoveNode => args.node_id.is_some() && args.inputs.len() <= 1,
        Command::Normalize | Command::Render => args.inputs.len() <= 1,
    };
    let out_dir_ok = args.out_dir.is_none() || (command == Command::Normalize && args.out.is_none());
    if !valid || !out_dir_ok {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("GENESIS_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn load_config(path: Option<&str>) -> Result<EditorConfig, CliError> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    let overrides: serde_json::Value = serde_json::from_str(&text)?;
    Ok(EditorConfig::with_overrides(&overrides))
}

fn load_store(args: &Args, cfg: &EditorConfig) -> Result<GraphStore, CliError> {
    let text = read_input(args.input())?;
    let mut store = GraphStore::new().with_config(cfg);
    load_document_text(&mut store, &text)?;
    Ok(store)
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn document_text(store: &GraphStore, pretty: bool) -> Result<String, CliError> {
    let mut text = if pretty {
        to_json_pretty(store.document())?
    } else {
        serde_json::to_string(store.document())?
    };
    text.push('\n');
    Ok(text)
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> PathBuf {
    match input {
        Some(path) if path != "-" => PathBuf::from(path).with_extension(ext),
        _ => PathBuf::from(format!("out.{ext}")),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let cfg = load_config(args.config.as_deref())?;
    let command = args.command.unwrap_or_default();
    tracing::debug!(?command, inputs = args.inputs.len(), "running");

    match command {
        Command::New => {
            let mut store = GraphStore::new().with_config(&cfg);
            if let Some(mind_type) = args.mind_type.as_deref() {
                store.set_mind_type(mind_type);
            }
            write_text(&document_text(&store, args.pretty)?, args.out.as_deref())
        }
        Command::Normalize => {
            let store = load_store(&args, &cfg)?;
            if let Some(dir) = args.out_dir.as_deref() {
                let doc = store.document();
                let name = export_file_name(doc, &doc.metadata.mind_type, store.clock());
                let path = PathBuf::from(dir).join(name);
                std::fs::create_dir_all(dir)?;
                std::fs::write(&path, to_json_pretty(doc)?)?;
                println!("{}", path.display());
                return Ok(());
            }
            write_text(&document_text(&store, args.pretty)?, args.out.as_deref())
        }
        Command::AddNode => {
            let mut store = load_store(&args, &cfg)?;
            let parent = args.parent.as_deref().unwrap_or_default();
            let content = args.content.as_deref().unwrap_or(DEFAULT_NODE_CONTENT);
            let id = store.add_node(parent, content, None)?;
            tracing::info!(node_id = %id, "node added");
            write_text(&document_text(&store, args.pretty)?, args.out.as_deref())
        }
        Command::Link => {
            let mut store = load_store(&args, &cfg)?;
            let source = args.source.as_deref().unwrap_or_default();
            let target = args.target.as_deref().unwrap_or_default();
            let label = args.label.clone().unwrap_or_default();
            let Some(id) = store.add_link(source, target, label) else {
                return Err(CliError::Rejected(format!(
                    "Cannot link {source} to {target}: unknown node, self link, or already linked"
                )));
            };
            tracing::info!(link_id = %id, "link added");
            write_text(&document_text(&store, args.pretty)?, args.out.as_deref())
        }
        Command::RemoveNode => {
            let mut store = load_store(&args, &cfg)?;
            let id = args.node_id.as_deref().unwrap_or_default();
            if !store.remove_node(id) {
                return Err(CliError::Rejected(format!(
                    "Cannot remove {id}: unknown node or root node"
                )));
            }
            write_text(&document_text(&store, args.pretty)?, args.out.as_deref())
        }
        Command::Inspect => {
            let mut session = ComparisonSession::new();
            let result = block_on(session.import_paths(&args.inputs));
            let out = InspectOut {
                mode: session.mode(),
                records: session
                    .records()
                    .iter()
                    .map(|record| InspectRecord {
                        name: &record.name,
                        size: record.size,
                        size_label: record.size_label(),
                        summary: &record.summary,
                    })
                    .collect(),
                failures: result
                    .failures
                    .iter()
                    .map(|f| InspectFailure {
                        file: &f.file_name,
                        error: f.error.to_string(),
                    })
                    .collect(),
            };
            write_json(&out, args.pretty)?;
            if result.failures.is_empty() {
                Ok(())
            } else {
                Err(CliError::Rejected(format!(
                    "{} of {} files could not be imported",
                    result.failures.len(),
                    args.inputs.len()
                )))
            }
        }
        Command::Render => {
            let render_options = RenderOptions::from_config(&cfg);
            let diagram_id = sanitize_svg_id(args.diagram_id.as_deref().unwrap_or("genesis-mind"));
            match args.render_format {
                RenderFormat::Svg => {
                    let text = read_input(args.input())?;
                    let svg_options = SvgRenderOptions {
                        diagram_id: Some(diagram_id),
                        background: args.background.clone(),
                        ..SvgRenderOptions::default()
                    };
                    let svg = block_on(genesis::render::render_document_svg(
                        &text,
                        &render_options,
                        &svg_options,
                    ))?;
                    write_text(&svg, args.out.as_deref())
                }
                RenderFormat::Png => {
                    let store = load_store(&args, &cfg)?;
                    let mut renderer = Renderer::new(render_options);
                    renderer.render(store.document());
                    let options = ExportOptions {
                        raster: RasterOptions {
                            scale: args.render_scale,
                            background: Some(
                                args.background.clone().unwrap_or_else(|| "white".to_string()),
                            ),
                        },
                        diagram_id: Some(diagram_id),
                    };
                    let output = export_image(&renderer, &options);
                    let out = args.out.clone().unwrap_or_else(|| {
                        default_raster_out_path(args.input(), "png")
                            .to_string_lossy()
                            .to_string()
                    });
                    if out == "-" {
                        std::io::stdout().lock().write_all(output.as_bytes())?;
                        return Ok(());
                    }
                    let path = match &output {
                        ExportOutput::Png { .. } => PathBuf::from(out),
                        ExportOutput::Svg { .. } => PathBuf::from(out).with_extension("svg"),
                    };
                    std::fs::write(&path, output.as_bytes())?;
                    Ok(())
                }
            }
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(err.exit_code());
        }
    };
    init_tracing();

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}
