use std::env;
use std::fs;
use std::path::Path;
use std::process;

use fred::{timeline_from_musicxml, MusicInfo, SyncError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage: fred timeline <score.musicxml>
       fred resolve <music-info.json|yaml> <from> <to> <seconds>";

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();

    let result = match args.get(1).map(String::as_str) {
        Some("timeline") if args.len() == 3 => print_timeline(&args[2]),
        Some("resolve") if args.len() == 6 => resolve(&args[2], &args[3], &args[4], &args[5]),
        _ => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn read_file(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn print_timeline(score_path: &str) -> Result<(), SyncError> {
    let timeline = timeline_from_musicxml(&read_file(score_path))?;
    let json = serde_json::to_string_pretty(timeline.steps())
        .map_err(|e| SyncError::MetadataError(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn load_info(path: &str) -> Result<MusicInfo, SyncError> {
    let text = read_file(path);
    let is_yaml = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        MusicInfo::from_yaml(&text)
    } else {
        MusicInfo::from_json(&text)
    }
}

fn resolve(info_path: &str, from: &str, to: &str, seconds: &str) -> Result<(), SyncError> {
    let info = load_info(info_path)?;
    let parse_index = |value: &str| {
        value
            .parse::<usize>()
            .map_err(|_| SyncError::MetadataError(format!("'{}' is not a recording index", value)))
    };
    let from = parse_index(from)?;
    let to = parse_index(to)?;
    let seconds: f64 = seconds
        .parse()
        .map_err(|_| SyncError::MetadataError(format!("'{}' is not a time in seconds", seconds)))?;

    info.check_recording(from)?;
    info.check_recording(to)?;

    let time = info.resolver().resolve(from, to, seconds)?;
    tracing::info!("{:.3}s in '{}' is {:.3}s in '{}'", seconds, info.recordings[from], time, info.recordings[to]);
    println!("{:.6}", time);
    Ok(())
}
