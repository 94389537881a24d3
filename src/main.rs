//! rgb2gif CLI - Encode frame sequences from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rgb2gif::{
    compute::FrameQuantizer,
    encode::{encode_to_vec, estimate_document_size},
    schema::{Document, FrameBatch, PipelineConfig},
    storage::{BatchWriter, CompressionType, WriterConfig},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Quantize a frame sequence and write it as an animated GIF.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to pipeline configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: PipelineConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(e.status_code().abs());
    }
}

fn run(config: &PipelineConfig) -> rgb2gif::Result<()> {
    let start = Instant::now();
    let batch = config.source.generate()?;

    println!("rgb2gif");
    println!("=======");
    println!(
        "Input: {} frames of {}x{}",
        batch.len(),
        batch.width(),
        batch.height()
    );
    println!(
        "Output: {}x{}, {} colors ({:?}, {:?} filter)",
        config.quantize.target_side,
        config.quantize.target_side,
        config.quantize.palette_size,
        config.quantize.palette_mode,
        config.quantize.filter
    );
    println!();

    if let Some(archive) = &config.archive {
        archive_batch(&batch, archive)?;
    }

    let quantizer = FrameQuantizer::new(config.quantize.clone())?;
    let quantize_start = Instant::now();
    let frames = quantizer.quantize_batch(&batch)?;
    let quantize_time = quantize_start.elapsed();

    let mut doc = Document::new(quantizer.target_side(), frames, config.encode.delay_cs)?;
    doc.repeat = config.encode.repeat;
    doc.transparent = config.encode.transparent;

    let bound = estimate_document_size(&doc)?;
    let encode_start = Instant::now();
    let bytes = encode_to_vec(&doc)?;
    let encode_time = encode_start.elapsed();

    fs::write(&config.output, &bytes)?;

    println!("Quantized in {:.2}s", quantize_time.as_secs_f32());
    println!(
        "Encoded in {:.2}s: {} bytes (bound {}, {:.1}%)",
        encode_time.as_secs_f32(),
        bytes.len(),
        bound,
        bytes.len() as f64 / bound as f64 * 100.0
    );
    println!("Wrote {}", config.output.display());
    println!("Total time: {:.2}s", start.elapsed().as_secs_f32());
    Ok(())
}

fn archive_batch(batch: &FrameBatch, path: &Path) -> rgb2gif::Result<()> {
    let compression = if cfg!(feature = "lz4") {
        CompressionType::Lz4
    } else {
        CompressionType::None
    };
    let mut writer = BatchWriter::create(path, &batch.manifest(), WriterConfig { compression })?;
    for frame in batch {
        writer.write_frame(frame.pixels())?;
    }
    let stats = writer.close_writer()?;
    println!("Archived to {}: {}", path.display(), stats);
    Ok(())
}

fn print_example_config() {
    let config = PipelineConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example config: {}", e);
            std::process::exit(1);
        }
    }
}
