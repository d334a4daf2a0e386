use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use watermark_compositor::{
    default_output_path, BlendOptions, Mode, ProcessOptions, ProcessResult, WatermarkEngine,
    WatermarkSize,
};

#[derive(Parser)]
#[command(
    name = "wmark",
    about = "Add or remove semi-transparent logo watermarks via alpha compositing",
    version,
    after_help = "Simple usage: wmark <image>  (remove the watermark, write <name>_cleaned.<ext>)\n\
                  Add instead of remove with --add."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_cleaned.{ext} or {name}_marked.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Add the watermark instead of removing it
    #[arg(short, long, conflicts_with = "remove")]
    add: bool,

    /// Remove the watermark (default action)
    #[arg(short, long)]
    remove: bool,

    /// Logo brightness value at full opacity
    #[arg(long, default_value = "255.0")]
    logo_value: f32,

    /// Force 48x48 watermark size (for images <= 1024px)
    #[arg(long)]
    force_small: bool,

    /// Force 96x96 watermark size (for images > 1024px)
    #[arg(long)]
    force_large: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.force_small && cli.force_large {
        eprintln!("Error: Cannot specify both --force-small and --force-large");
        process::exit(1);
    }

    if !(0.0..=255.0).contains(&cli.logo_value) {
        eprintln!("Error: Logo value must be between 0.0 and 255.0");
        process::exit(1);
    }

    let size_override = if cli.force_small {
        Some(WatermarkSize::Small)
    } else if cli.force_large {
        Some(WatermarkSize::Large)
    } else {
        None
    };

    let mode = if cli.add { Mode::Add } else { Mode::Remove };

    let opts = ProcessOptions {
        mode,
        blend: BlendOptions {
            logo_value: cli.logo_value,
            size_override,
        },
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let engine = match WatermarkEngine::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Fatal: Failed to initialize engine: {e}");
            process::exit(1);
        }
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        match mode {
            Mode::Remove => eprintln!("Removing watermark (inverse composite)"),
            Mode::Add => eprintln!("Adding watermark (forward composite)"),
        }
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: wmark <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path, mode),
        };
        vec![engine.process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    for line in result_lines(result, opts) {
        eprintln!("{line}");
    }
}

fn result_lines(result: &ProcessResult, opts: &ProcessOptions) -> Vec<String> {
    if opts.quiet && result.success {
        return Vec::new();
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    let mut lines = Vec::new();
    if result.success {
        lines.push(format!("[OK] {filename}"));
        if opts.verbose && !result.message.is_empty() {
            lines.push(format!("  -> {}", result.message));
        }
    } else {
        // The failure line already carries the message.
        lines.push(format!("[FAIL] {filename}: {}", result.message));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(success: bool, message: &str) -> ProcessResult {
        ProcessResult {
            path: PathBuf::from("/tmp/photo.jpg"),
            success,
            message: message.to_string(),
        }
    }

    #[test]
    fn failure_message_appears_exactly_once_in_verbose_mode() {
        let opts = ProcessOptions {
            verbose: true,
            ..ProcessOptions::default()
        };
        let lines = result_lines(&result(false, "Failed to save: disk full"), &opts);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "[FAIL] photo.jpg: Failed to save: disk full");
    }

    #[test]
    fn verbose_success_echoes_status_message() {
        let opts = ProcessOptions {
            verbose: true,
            ..ProcessOptions::default()
        };
        let lines = result_lines(&result(true, "Watermark removed"), &opts);
        assert_eq!(lines, vec!["[OK] photo.jpg", "  -> Watermark removed"]);
    }

    #[test]
    fn quiet_mode_silences_successes_but_not_failures() {
        let opts = ProcessOptions {
            quiet: true,
            ..ProcessOptions::default()
        };
        assert!(result_lines(&result(true, "Watermark removed"), &opts).is_empty());
        assert_eq!(
            result_lines(&result(false, "boom"), &opts).len(),
            1,
            "failures must print even when quiet"
        );
    }
}
