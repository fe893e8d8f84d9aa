//! Tilemap CLI - tiled heightmap generator.
//!
//! Generates fractal heightmaps tile by tile in parallel, reconciles the
//! seams between tiles and exports the reassembled result.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use glam::UVec2;
use tilemap::config::EngineConfig;
use tilemap::dispatch::TransformMode;
use tilemap::export::{export_heightmap, expected_file_size, ExportFormat, RawFormat};
use tilemap::pipeline::{NoiseStage, Pipeline, RemapStage, SeamStage, StageConfig, WarpStage};
use tilemap::HeightMap;

/// Tiled heightmap generator.
#[derive(Parser)]
#[command(name = "tilemap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Heightmap geometry flags shared by both commands.
#[derive(clap::Args, Clone)]
struct GeometryArgs {
    /// TOML configuration file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Heightmap width in samples.
    #[arg(long)]
    width: Option<u32>,

    /// Heightmap height in samples.
    #[arg(long)]
    height: Option<u32>,

    /// Number of tiles along x.
    #[arg(long)]
    tiles_x: Option<u32>,

    /// Number of tiles along y.
    #[arg(long)]
    tiles_y: Option<u32>,

    /// Buffer ratio of the base tile size, in [0, 1).
    #[arg(long)]
    overlap: Option<f32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a heightmap and export it.
    Generate {
        #[command(flatten)]
        geometry: GeometryArgs,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<i32>,

        /// Number of noise octaves (1-16).
        #[arg(long)]
        octaves: Option<u8>,

        /// Base noise frequency over the domain.
        #[arg(long)]
        frequency: Option<f32>,

        /// How tile operators are run.
        #[arg(long)]
        mode: Option<ModeArg>,

        /// Worker threads (default: global pool).
        #[arg(long)]
        threads: Option<usize>,

        /// Domain warping amplitude; warping is skipped when unset.
        #[arg(long)]
        warp: Option<f32>,

        /// Skip seam reconciliation.
        #[arg(long)]
        no_seams: bool,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "heightmap")]
        name: String,

        /// Export format.
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },

    /// Display the tile geometry of a configuration.
    Info {
        #[command(flatten)]
        geometry: GeometryArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One task per tile on the thread pool.
    Distributed,
    /// Tiles one after the other on the main thread.
    Sequential,
    /// Whole domain as a single array.
    SingleArray,
}

impl From<ModeArg> for TransformMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Distributed => TransformMode::Distributed,
            ModeArg::Sequential => TransformMode::Sequential,
            ModeArg::SingleArray => TransformMode::SingleArray,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            geometry,
            seed,
            octaves,
            frequency,
            mode,
            threads,
            warp,
            no_seams,
            output,
            name,
            format,
        } => {
            let mut config = load_config(&geometry);
            if let Some(seed) = seed {
                config.noise.seed = seed;
            }
            if let Some(octaves) = octaves {
                config.noise.octaves = octaves;
            }
            if let Some(frequency) = frequency {
                config.noise.frequency = frequency;
            }
            if let Some(mode) = mode {
                config.dispatch.mode = mode.into();
            }
            if threads.is_some() {
                config.dispatch.threads = threads;
            }
            if let Some(format) = format {
                config.export.format = format;
            }
            run_generate(config, warp, no_seams, output, name);
        }
        Commands::Info { geometry } => {
            run_info(load_config(&geometry));
        }
    }
}

/// Reads the optional config file and applies geometry overrides.
fn load_config(args: &GeometryArgs) -> EngineConfig {
    let mut config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let tiling = &mut config.tiling;
    if let Some(width) = args.width {
        tiling.shape.x = width;
    }
    if let Some(height) = args.height {
        tiling.shape.y = height;
    }
    if let Some(tiles_x) = args.tiles_x {
        tiling.tiling.x = tiles_x;
    }
    if let Some(tiles_y) = args.tiles_y {
        tiling.tiling.y = tiles_y;
    }
    if let Some(overlap) = args.overlap {
        tiling.overlap = overlap;
    }

    if let Err(e) = tiling.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    config
}

fn run_generate(
    config: EngineConfig,
    warp: Option<f32>,
    no_seams: bool,
    output: PathBuf,
    name: String,
) {
    if config.noise.octaves < 1 || config.noise.octaves > 16 {
        eprintln!("Error: Octaves must be between 1 and 16");
        std::process::exit(1);
    }

    let tiling = &config.tiling;
    println!("Tilemap - Tiled Heightmap Generator");
    println!("===================================");
    println!("Shape: {}x{}", tiling.shape.x, tiling.shape.y);
    println!("Tiling: {}x{} (overlap {})", tiling.tiling.x, tiling.tiling.y, tiling.overlap);
    println!("Mode: {}", config.dispatch.mode.name());
    println!("Seed: {}", config.noise.seed);
    println!("Output: {}", output.display());

    let start = Instant::now();

    let mut heightmap = match HeightMap::from_config(tiling) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error creating heightmap: {}", e);
            std::process::exit(1);
        }
    };

    let stage_config = StageConfig {
        noise: config.noise.clone(),
        dispatch: config.dispatch.clone(),
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(stage_config);
    pipeline.add_stage(NoiseStage);
    if let Some(amplitude) = warp {
        pipeline.add_stage(WarpStage::new(amplitude));
    }
    if !no_seams {
        pipeline.add_stage(SeamStage);
    }
    pipeline.add_stage(RemapStage::default());

    println!("\nRunning generation pipeline...");
    let result = pipeline.run_with_callbacks(
        &mut heightmap,
        |name, i, total| println!("  [{}/{}] Starting: {}", i + 1, total, name),
        |name, i, total| println!("  [{}/{}] Completed: {}", i + 1, total, name),
    );
    if let Err(e) = result {
        eprintln!("Error during generation: {}", e);
        std::process::exit(1);
    }

    let gen_time = start.elapsed();
    println!("Generation completed in {:.2?}", gen_time);
    println!("Height range: [{:.4}, {:.4}]", heightmap.min(), heightmap.max());

    println!("\nExporting heightmap...");
    let export_start = Instant::now();
    if let Err(e) = std::fs::create_dir_all(&output) {
        eprintln!("Error creating output directory: {}", e);
        std::process::exit(1);
    }

    let filename = format!("{}.{}", name, config.export.format.extension());
    let path = output.join(&filename);
    if let Err(e) = export_heightmap(&heightmap, &path, &config.export) {
        eprintln!("Error exporting heightmap: {}", e);
        std::process::exit(1);
    }
    println!("  Exported {}", path.display());

    println!("Export completed in {:.2?}", export_start.elapsed());
    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn run_info(config: EngineConfig) {
    let heightmap = match HeightMap::from_config(&config.tiling) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let shape = heightmap.shape();
    let logical = shape.x as u64 * shape.y as u64;
    let stored: u64 = heightmap.tiles().iter().map(|t| t.len() as u64).sum();

    println!("Tilemap - Heightmap Configuration Info");
    println!("======================================");
    println!();
    println!("{}", heightmap);
    println!("Base tile shape: {}", heightmap.base_tile_shape());
    println!("Buffer widths:   {}", heightmap.buffer_widths());
    println!();
    println!("Sample counts:");
    println!("  Logical:   {:>12} samples", logical);
    println!("  Stored:    {:>12} samples ({:.1}% overhead)", stored, overhead(stored, logical));
    println!();
    println!("Memory usage (in-memory, f32):");
    println!("  Tiles:     {:>12} bytes ({:.2} MB)", stored * 4, mb(stored * 4));
    println!();
    println!("Export file sizes:");
    for (label, format) in [
        ("RAW (R16)", RawFormat::R16LittleEndian),
        ("RAW (R32)", RawFormat::R32Float),
    ] {
        let bytes = expected_file_size(shape, format);
        println!("  {:<10} {:>12} bytes ({:.2} MB)", label, bytes, mb(bytes));
    }
    println!();

    println!("Tiles:");
    for tile in heightmap.tiles() {
        println!("  {}", tile);
    }

    if heightmap.buffer_widths() == UVec2::ZERO && heightmap.ntiles() > 1 {
        println!();
        println!("Note: no overlap buffers, seams will not be reconciled");
    }
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

fn overhead(stored: u64, logical: u64) -> f64 {
    if logical == 0 {
        0.0
    } else {
        (stored as f64 / logical as f64 - 1.0) * 100.0
    }
}
