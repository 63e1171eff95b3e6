//! `cadena-live`: interactive single-plugin shell.
//!
//! Hosts one plugin without any audio streaming: restore a preset, inspect
//! the instance, open its native editor, and capture its state back to disk.
//! Commands arrive on stdin; one instance lives for the whole session. State
//! is written only when the user asks via `save`, never on exit.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cadena_cli::{CliError, default_formats, effective_block_size, init_tracing};
use cadena_core::{PluginInstance, ProcessMode, StreamContext};
use cadena_host::{apply_state, instantiate, resolve_types, save_state};

#[derive(Parser)]
#[command(
    name = "cadena-live",
    version,
    about = "Host a single plugin interactively"
)]
struct Args {
    /// Plugin file to host
    #[arg(long, short = 'p')]
    plugin: PathBuf,

    /// Preset file to restore after loading
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Default target for the `save` command
    #[arg(long)]
    save: Option<PathBuf>,

    /// Frames per processing block (values below 64 are raised to 64)
    #[arg(long, default_value_t = 512)]
    block: usize,
}

fn main() {
    init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 2 } else { 0 };
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
    if !args.plugin.exists() {
        return Err(CliError::PluginNotFound(args.plugin));
    }

    let registry = default_formats();
    let ctx = StreamContext::new(44100.0, 2, effective_block_size(args.block), 0);

    let mut instance = resolve_types(&registry, &args.plugin)
        .and_then(|types| instantiate(&registry, &types[0], &ctx, ProcessMode::Realtime))
        .map_err(|e| CliError::PluginLoad {
            path: args.plugin.clone(),
            reason: e.to_string(),
        })?;

    if args.preset.is_some() {
        apply_state(instance.as_mut(), args.preset.as_deref());
    }

    println!(
        "loaded '{}' ({} in / {} out)",
        instance.name(),
        instance.input_channels(),
        instance.output_channels()
    );
    println!("commands: save [path], info, edit, quit");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        let _ = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst));
    }

    command_loop(
        instance.as_mut(),
        &mut std::io::stdin().lock(),
        args.save.as_deref(),
        &running,
    );

    instance.release();
    Ok(())
}

fn command_loop(
    instance: &mut dyn PluginInstance,
    input: &mut dyn BufRead,
    default_save: Option<&Path>,
    running: &AtomicBool,
) {
    let mut line = String::new();

    while running.load(Ordering::SeqCst) {
        // The open editor gets idle time once per command turn.
        if let Some(editor) = instance.editor() {
            editor.idle();
        }

        print!("> ");
        let _ = std::io::stdout().flush();
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            None => {}
            Some("quit" | "q") => break,
            Some("info") => {
                println!("name:     {}", instance.name());
                println!(
                    "channels: {} in / {} out",
                    instance.input_channels(),
                    instance.output_channels()
                );
                println!("state:    {} bytes", instance.state().len());
                println!(
                    "editor:   {}",
                    if instance.editor().is_some() {
                        "yes"
                    } else {
                        "no"
                    }
                );
            }
            Some("save") => {
                let target = parts
                    .next()
                    .map(PathBuf::from)
                    .or_else(|| default_save.map(Path::to_path_buf));
                match target {
                    Some(path) => match save_state(instance, &path) {
                        Ok(()) => println!("state written to {}", path.display()),
                        Err(e) => eprintln!("save failed: {e}"),
                    },
                    None => eprintln!("save needs a path (or pass --save)"),
                }
            }
            Some("edit") => match instance.editor() {
                Some(editor) => {
                    if editor.open() {
                        match editor.size() {
                            Some((w, h)) => println!("editor open ({w}x{h})"),
                            None => println!("editor open"),
                        }
                    } else {
                        eprintln!("plugin refused to open a floating editor");
                    }
                }
                None => eprintln!("plugin has no editor"),
            },
            Some(other) => eprintln!("unknown command '{other}'"),
        }
    }

    if let Some(editor) = instance.editor() {
        editor.close();
    }
}
