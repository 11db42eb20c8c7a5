use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use intel_vpp::host::HostDriver;
use intel_vpp::pipeline::plan::plan_stages;
use intel_vpp::{
    FilterFlags, FilterParameter, FormatClass, Fourcc, HwContext, KernelStore, PipelineParameters,
    Rect, RtFormat, SurfaceId, VppConfig, VppEngine,
};

#[derive(Parser, Debug)]
#[command(name = "vpp-dryrun", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a JSON scenario against in-process collaborators and print what was dispatched.
    Run(RunArgs),
    /// Print the staged plan for a format pair.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory holding kernel binaries; placeholder blobs are used when omitted.
    #[arg(long)]
    kernels: Option<PathBuf>,

    /// Print every recorded GPU command.
    #[arg(long)]
    commands: bool,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Source fourcc.
    #[arg(long)]
    src: Fourcc,

    /// Destination fourcc.
    #[arg(long)]
    dst: Fourcc,

    /// Source and destination regions differ.
    #[arg(long)]
    resize: bool,

    /// At least one filter is attached.
    #[arg(long)]
    filters: bool,
}

/// One surface of a scenario. Without a fourcc the surface has no backing yet.
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SurfaceEntry {
    width: u32,
    height: u32,
    #[serde(default)]
    fourcc: Option<Fourcc>,
    #[serde(default)]
    format: RtFormat,
    #[serde(default = "default_tiled")]
    tiled: bool,
}

fn default_tiled() -> bool {
    true
}

fn default_frames() -> u32 {
    1
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default)]
    config: VppConfig,
    surfaces: Vec<SurfaceEntry>,
    /// Index into `surfaces`.
    source: usize,
    /// Index into `surfaces`.
    target: usize,
    #[serde(default)]
    filters: Vec<FilterParameter>,
    #[serde(default)]
    surface_region: Option<Rect>,
    #[serde(default)]
    output_region: Option<Rect>,
    #[serde(default)]
    filter_flags: FilterFlags,
    #[serde(default)]
    background: u32,
    /// Repeat the call this many times, e.g. to watch the deinterlace frame store rotate.
    #[serde(default = "default_frames")]
    frames: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn read_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let f = File::open(path).with_context(|| format!("open scenario '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scenario: Scenario = serde_json::from_reader(r).with_context(|| "parse scenario JSON")?;
    Ok(scenario)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let scenario = read_scenario(&args.in_path)?;
    let generation = scenario.config.generation;
    let kernels = match &args.kernels {
        Some(dir) => KernelStore::from_dir(dir, generation)?,
        None => KernelStore::synthetic(generation),
    };

    let mut host = HostDriver::new();
    let engine = VppEngine::new(scenario.config.clone(), &kernels, &mut host.memory)?;

    let mut ids: Vec<SurfaceId> = Vec::with_capacity(scenario.surfaces.len());
    for entry in &scenario.surfaces {
        let id = match entry.fourcc {
            Some(fourcc) => host
                .surfaces
                .add_allocated(fourcc, entry.width, entry.height, entry.tiled)?,
            None => host
                .surfaces
                .add_unallocated(entry.width, entry.height, entry.format),
        };
        ids.push(id);
    }
    let lookup = |index: usize, what: &str| {
        ids.get(index)
            .copied()
            .with_context(|| format!("{what} index {index} out of range"))
    };
    let source = lookup(scenario.source, "source")?;
    let target = lookup(scenario.target, "target")?;

    let filter_ids: Vec<_> = scenario
        .filters
        .iter()
        .cloned()
        .map(|f| host.buffers.insert_filter(f))
        .collect();

    let mut params = PipelineParameters::new(source)
        .with_filter_flags(scenario.filter_flags.0)
        .with_background(scenario.background);
    if !filter_ids.is_empty() {
        params = params.with_filters(filter_ids);
    }
    if let Some(rect) = scenario.surface_region {
        params = params.with_surface_region(rect);
    }
    if let Some(rect) = scenario.output_region {
        params = params.with_output_region(rect);
    }

    for frame in 0..scenario.frames.max(1) {
        let report = engine
            .process(&mut host.context(), &params, target)
            .with_context(|| format!("frame {frame}"))?;
        println!("frame {frame}: {}", serde_json::to_string(&report)?);
    }

    if args.commands {
        for (i, batch) in host.batch.batches().iter().enumerate() {
            println!("batch {i}:");
            for cmd in batch {
                println!("  {}", serde_json::to_string(cmd)?);
            }
        }
    } else {
        println!(
            "{} batches, {} commands",
            host.batch.flushes(),
            host.batch.command_names().len()
        );
    }

    engine.destroy(&mut host.context());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let plan = plan_stages(
        FormatClass::of(args.src),
        FormatClass::of(args.dst),
        !args.resize,
        args.filters,
    );
    println!(
        "{} -> {}: {}",
        args.src,
        args.dst,
        serde_json::to_string(&plan)?
    );
    Ok(())
}
