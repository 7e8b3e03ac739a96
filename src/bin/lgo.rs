use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use linkgraph_overlay::cli::{
    self, CliConfig, ConvertReport, InspectReport, OverlayReport, OverlayRequest, Scenario,
};
use linkgraph_overlay::codec::SaveVersion;
use linkgraph_overlay::types::{CargoMask, CompanyMask, Point};

#[derive(Parser, Debug)]
#[command(
    name = "lgo",
    version,
    about = "Inspect link graph saves and preview the link graph overlay",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for reports"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Summarize the graphs, jobs and schedule of a save file")]
    Inspect {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    #[command(about = "Re-save a file at another format version")]
    Convert(ConvertCmd),
    #[command(about = "Build the overlay cache for a JSON scenario")]
    Overlay(OverlayCmd),
}

#[derive(Args, Debug)]
struct ConvertCmd {
    #[arg(value_name = "IN")]
    input: PathBuf,

    #[arg(value_name = "OUT")]
    output: PathBuf,

    #[arg(long = "to-version", help = "Target format version (defaults to the newest)")]
    to_version: Option<u16>,

    #[arg(
        long,
        value_name = "SCENARIO",
        help = "Scenario whose stations provide node locations for legacy inputs"
    )]
    stations: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct OverlayCmd {
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    #[arg(long, env = "LGO_CONFIG", help = "Configuration file (defaults to ./lgo.toml)")]
    config: Option<PathBuf>,

    #[arg(long, value_parser = parse_mask, help = "Cargo selection bitmask, e.g. 0x5")]
    cargo_mask: Option<u64>,

    #[arg(long, value_parser = parse_mask, help = "Company selection bitmask")]
    company_mask: Option<u64>,

    #[arg(long, help = "Make links with capacity but no usage pickable")]
    inspect: bool,

    #[arg(long = "pick", value_name = "X,Y", value_parser = parse_point, help = "Pick the link under a screen point; repeatable")]
    picks: Vec<Point>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    install_tracing_subscriber();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn install_tracing_subscriber() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linkgraph_overlay=info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    match args.command {
        Command::Inspect { path } => {
            let report = cli::inspect(&path)?;
            emit(args.format, &report, print_inspect_text)?;
        }
        Command::Convert(cmd) => {
            let version = cmd.to_version.map(SaveVersion).unwrap_or(SaveVersion::CURRENT);
            let stations = cmd.stations.as_ref().map(Scenario::load).transpose()?;
            let report = cli::convert(&cmd.input, &cmd.output, version, stations.as_ref())?;
            emit(args.format, &report, print_convert_text)?;
        }
        Command::Overlay(cmd) => {
            let config = CliConfig::load(cmd.config.as_deref())?;
            let company_mask = cmd
                .company_mask
                .map(|bits| u16::try_from(bits).map(CompanyMask))
                .transpose()
                .map_err(|_| "company mask does not fit in 16 bits")?;
            let mut options = config.overlay;
            if cmd.inspect {
                options = options.inspect(true);
            }
            let request = OverlayRequest {
                options,
                cargo_mask: cmd.cargo_mask.map(CargoMask),
                company_mask,
                picks: cmd.picks,
            };
            let scenario = Scenario::load(&cmd.scenario)?;
            let report = cli::overlay(&scenario, &request)?;
            emit(args.format, &report, print_overlay_text)?;
        }
    }
    Ok(())
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(&T),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(value),
    }
    Ok(())
}

fn print_inspect_text(report: &InspectReport) {
    println!("version={} edges={}", report.version, report.edge_format);
    println!("Graphs:");
    for g in &report.graphs {
        println!(
            "  #{} cargo={} nodes={} edges={} last_compression={}",
            g.id, g.cargo, g.nodes, g.edges, g.last_compression
        );
    }
    println!("Jobs:");
    for j in &report.jobs {
        println!(
            "  #{} graph={} join_date={} nodes={} edges={}",
            j.id, j.link_graph, j.join_date, j.snapshot.nodes, j.snapshot.edges
        );
    }
    println!("Schedule: queued={:?} running={:?}", report.schedule, report.running);
}

fn print_convert_text(report: &ConvertReport) {
    println!(
        "Converted {} graphs and {} jobs from version {} to {} ({} nodes relocated)",
        report.graphs, report.jobs, report.from_version, report.to_version, report.relocated
    );
}

fn print_overlay_text(report: &OverlayReport) {
    println!("generation={}", report.generation);
    if let Some(r) = report.cached_region {
        println!(
            "cached_region=({}, {})..({}, {})",
            r.left, r.top, r.right, r.bottom
        );
    }
    println!("Stations:");
    for s in &report.stations {
        println!("  {} at ({}, {}) supply={}", s.id.0, s.pt.x, s.pt.y, s.quantity);
    }
    println!("Links:");
    for l in &report.links {
        println!(
            "  {} -> {} cargo={} capacity={} usage={} planned={} time={}{}",
            l.from.0,
            l.to.0,
            l.prop.cargo.0,
            l.prop.capacity,
            l.prop.usage,
            l.prop.planned,
            l.prop.time,
            if l.prop.shared { " shared" } else { "" }
        );
    }
    for pick in &report.picks {
        match &pick.hit {
            Some(hit) => println!(
                "Pick ({}, {}): {} -> {} saturation={}% travel_time={}",
                pick.at.x, pick.at.y, hit.from.0, hit.to.0, hit.saturation, hit.travel_time
            ),
            None => println!("Pick ({}, {}): nothing", pick.at.x, pick.at.y),
        }
    }
}

fn parse_mask(raw: &str) -> Result<u64, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|err| format!("invalid mask '{raw}': {err}"))
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{raw}'"))?;
    let x = x.trim().parse().map_err(|err| format!("invalid x '{x}': {err}"))?;
    let y = y.trim().parse().map_err(|err| format!("invalid y '{y}': {err}"))?;
    Ok(Point::new(x, y))
}
