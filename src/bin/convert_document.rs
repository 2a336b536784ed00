//! CLI that converts one document and prints the result as JSON.
//!
//! Usage: `convert_document <file.odt|file.html> [media-dir] [url-prefix]`
//!
//! `.odt` input goes through the full conversion and writes images to
//! `media-dir` (default `media`). Any other input is treated as HTML from an
//! external converter and only normalized and sanitized. Set `RUST_LOG` for
//! progress output on stderr.

use std::path::Path;
use std::process;

use docconv::{convert_html, convert_odt, DirectoryStore, Options};

fn main() {
    let _ = env_logger::builder()
        .filter_module("docconv", log::LevelFilter::Warn)
        .parse_default_env()
        .try_init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("Usage: convert_document <file.odt|file.html> [media-dir] [url-prefix]");
        process::exit(2);
    };
    let media_dir = args.next().unwrap_or_else(|| "media".to_string());
    let url_prefix = args.next().unwrap_or_else(|| "/media".to_string());

    let bytes = match std::fs::read(&input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {input}: {e}");
            process::exit(1);
        }
    };

    let options = Options::default();
    let is_odt = Path::new(&input)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("odt"));

    let result = if is_odt {
        let mut store = DirectoryStore::new(media_dir, url_prefix);
        match convert_odt(&bytes, &options, &mut store) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        convert_html(&String::from_utf8_lossy(&bytes), Vec::new(), &options)
    };

    println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
}
