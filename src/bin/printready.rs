use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use printready::{
    Orientation, PageFormat, RenderSettings, Renderer, ReqwestFetcher, SceneDocument,
    service::{Config, config::LogFormat},
};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "printready", version)]
struct Cli {
    /// TOML config file layered over the built-in defaults.
    #[arg(long, global = true, env = "PRINTREADY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `POST /designs/pdf`.
    Serve(ServeArgs),
    /// Render a local scene JSON to a PDF file.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PDF path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = PageFormat::A4)]
    format: PageFormat,

    #[arg(long, default_value_t = Orientation::Landscape)]
    orientation: Orientation,

    #[arg(long, default_value_t = 300.0)]
    dpi: f64,

    /// Bleed in mm.
    #[arg(long, default_value_t = 3.0)]
    bleed: f64,

    /// Margin in mm.
    #[arg(long, default_value_t = 5.0)]
    margin: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("load configuration")?;
    init_tracing(config.log_format);

    match cli.cmd {
        Command::Serve(args) => {
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            printready::service::serve(config).await
        }
        Command::Render(args) => cmd_render(config, args).await,
    }
}

async fn cmd_render(config: Config, args: RenderArgs) -> anyhow::Result<()> {
    let json = tokio::fs::read_to_string(&args.in_path)
        .await
        .with_context(|| format!("read scene '{}'", args.in_path.display()))?;
    let doc = SceneDocument::from_json_str(&json)?;

    let settings = RenderSettings {
        format: args.format,
        orientation: args.orientation,
        dpi: args.dpi,
        bleed: args.bleed,
        margin: args.margin,
    };

    let fetcher = ReqwestFetcher::new(&config.fetch_options())?;
    let fontdb = tokio::task::spawn_blocking(printready::system_fontdb)
        .await
        .context("load system fonts")?;
    let renderer = Renderer::new(
        Arc::new(fetcher),
        config.fetch_options(),
        fontdb,
        config.render_options(),
    );

    let rendered = renderer.render_pdf(doc, &settings, (None, None)).await?;
    tokio::fs::write(&args.out, &rendered.bytes)
        .await
        .with_context(|| format!("write '{}'", args.out.display()))?;

    tracing::info!(
        out = %args.out.display(),
        bytes = rendered.bytes.len(),
        failed_images = rendered.failed_images,
        "wrote pdf"
    );
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,printready=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
