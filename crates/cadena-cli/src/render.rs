//! `cadena-render`: offline plugin-chain renderer.
//!
//! Streams an audio file block by block through the plugins declared in a
//! JSON chain manifest and writes the processed audio to a new file.

use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cadena_cli::{CliError, default_formats, effective_block_size, init_tracing};
use cadena_core::{ProcessMode, StreamContext};
use cadena_host::{ChainRenderer, build_chain};
use cadena_io::{WavBlockReader, create_writer_for_path, probe};
use cadena_manifest::load_manifest;

/// Output bit depth. Matches what downstream tooling expects from renders.
const OUTPUT_BITS: u16 = 16;

#[derive(Parser)]
#[command(
    name = "cadena-render",
    version,
    about = "Render an audio file through a plugin chain"
)]
struct Args {
    /// Input audio file (WAV)
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Output audio file; parent directories are created as needed
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Chain manifest (JSON with a "plugins" array)
    #[arg(long, short = 'c')]
    chain: PathBuf,

    /// Frames per processing block (values below 64 are raised to 64)
    #[arg(long, default_value_t = 512)]
    block: usize,
}

fn main() {
    init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = i32::from(e.use_stderr());
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let block = effective_block_size(args.block);

    if !args.input.is_file() {
        return Err(CliError::InputNotFound(args.input));
    }
    if !args.chain.is_file() {
        return Err(CliError::ManifestNotFound(args.chain));
    }

    let info = probe(&args.input).map_err(|e| CliError::InputUnreadable {
        path: args.input.clone(),
        reason: e.to_string(),
    })?;
    let ctx = StreamContext::new(
        f64::from(info.sample_rate),
        info.channels,
        block,
        info.total_frames,
    );

    let slots = load_manifest(&args.chain)?;
    let registry = default_formats();
    let chain = build_chain(&registry, &slots, &ctx, ProcessMode::Offline)?;
    println!(
        "rendering {} frames through {} plugin(s)...",
        ctx.total_frames,
        chain.len()
    );

    let mut reader = WavBlockReader::open(&args.input).map_err(|e| CliError::InputUnreadable {
        path: args.input.clone(),
        reason: e.to_string(),
    })?;
    let mut writer = create_writer_for_path(&args.output, info.sample_rate, info.channels, OUTPUT_BITS)
        .map_err(|e| CliError::Output {
            path: args.output.clone(),
            reason: e.to_string(),
        })?;

    let pb = ProgressBar::new(ctx.segment_count());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut renderer = ChainRenderer::new(chain, &ctx);
    let result = renderer.render(&mut reader, &mut writer, &ctx, |done, _| {
        pb.set_position(done);
    });
    renderer.finish();
    result?;
    pb.finish_with_message("done");

    println!("wrote {}", args.output.display());
    Ok(())
}
