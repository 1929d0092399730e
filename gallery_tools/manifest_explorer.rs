// gallery_tools/manifest_explorer.rs
use std::env;
use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

use apegal::app::manifest::load_items;
use apegal::config::load_config;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: cargo run --bin manifest_explorer [limit] [--out file]");
        return ExitCode::SUCCESS;
    }

    let limit: usize = if args.len() > 1 && !args[1].starts_with("--") {
        args[1].parse().unwrap_or(10)
    } else {
        10
    };

    let out_file: Option<String> = args
        .iter()
        .position(|a| a == "--out")
        .and_then(|i| args.get(i + 1).cloned());

    let cfg = load_config();
    println!("Images manifest:   {}", cfg.images_manifest.describe());
    println!("Metadata manifest: {}", cfg.metadata_manifest.describe());

    let items = match load_items(&cfg.images_manifest, &cfg.metadata_manifest) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Failed to load manifests: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut output = String::new();
    output.push_str(&format!("--- {} items (showing {}) ---\n", items.len(), limit.min(items.len())));
    for item in items.iter().take(limit) {
        output.push_str(&format!(
            "{:>5}  {:<12} {}\n       {}\n",
            item.id, item.name, item.image_url, item.metadata_url
        ));
    }

    if let Some(path) = out_file {
        let written = File::create(&path).and_then(|mut f| f.write_all(output.as_bytes()));
        if let Err(e) = written {
            eprintln!("Failed to write {path}: {e}");
            return ExitCode::FAILURE;
        }
        println!("Exported results to {}", path);
    } else {
        print!("{}", output);
    }

    ExitCode::SUCCESS
}
