use chrono::DateTime;

use srgplay::{MediaFormat, MediaInfo};

pub fn print_summary(info: &MediaInfo) {
    println!("Title: {}", info.title.as_deref().unwrap_or("(untitled)"));
    println!("ID: {}", info.id);
    if let Some(ref series) = info.series {
        println!("Series: {series}{}", season_episode(info));
    }
    if let Some(ref channel) = info.channel {
        println!("Channel: {channel}");
    }
    if let Some(ts) = info.timestamp.and_then(|t| DateTime::from_timestamp(t, 0)) {
        println!("Date: {}", ts.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(dur) = info.duration {
        println!("Duration: {}", format_duration(dur));
    }
    if let Some(ref desc) = info.description {
        println!("Description: {}", truncate_text(desc, 200));
    }
    if let Some(ref thumb) = info.thumbnail {
        println!("Thumbnail: {thumb}");
    }

    println!("\nFormats ({}):", info.formats.len());
    print_formats(&info.formats);

    if !info.subtitles.is_empty() {
        println!("\nSubtitles:");
        for (lang, tracks) in &info.subtitles {
            for track in tracks {
                match track.name.as_deref().filter(|n| !n.is_empty()) {
                    Some(name) => println!("  {lang:<5} {name}: {}", track.url),
                    None => println!("  {lang:<5} {}", track.url),
                }
            }
        }
    }
}

pub fn print_formats(formats: &[MediaFormat]) {
    if formats.is_empty() {
        println!("  (none)");
        return;
    }
    for f in formats {
        let resolution = match (f.width, f.height) {
            (Some(w), Some(h)) => format!("{w}x{h}"),
            (None, Some(h)) => format!("{h}p"),
            _ => "-".to_string(),
        };
        let tbr = f.tbr.map_or_else(|| "-".to_string(), |t| format!("{t:.0}k"));
        println!(
            "  {:<28} {:<11} {:>9} {:>7}  {}",
            f.format_id,
            protocol_label(f),
            resolution,
            tbr,
            f.url
        );
    }
}

fn protocol_label(f: &MediaFormat) -> String {
    serde_json::to_value(f.protocol)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn season_episode(info: &MediaInfo) -> String {
    match (info.season_number, info.episode_number) {
        (Some(s), Some(e)) => format!(" (S{s}E{e})"),
        (Some(s), None) => format!(" (S{s})"),
        (None, Some(e)) => format!(" (E{e})"),
        (None, None) => String::new(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
