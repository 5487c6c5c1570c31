//! Check encoder availability and effective settings.

use strata_common::config::AppConfig;
use strata_render_engine::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Strata System Check");
    println!("{}", "=".repeat(50));

    let tools = [
        ("ffmpeg", config.engine.ffmpeg_bin.as_str(), true),
        ("ffprobe", config.engine.ffprobe_bin.as_str(), false),
    ];

    let mut all_required_ok = true;
    for (name, binary, required) in tools {
        if command_exists(binary) {
            println!("[OK] {name}: {binary}");
        } else {
            all_required_ok &= !required;
            println!("[WARN] {name}: '{binary}' not found");
        }
    }

    println!(
        "[OK] Interval concurrency: {}",
        config.engine.effective_concurrency()
    );
    println!("[OK] Scratch root: {}", config.scratch_dir.display());
    println!(
        "     Video: {} preset={} crf={} pix_fmt={}",
        config.engine.video.codec,
        config.engine.video.preset,
        config.engine.video.crf,
        config.engine.video.pix_fmt
    );
    println!(
        "     Audio: {} Hz, {} ch, AAC {}k",
        config.engine.audio.sample_rate,
        config.engine.audio.channels,
        config.engine.audio.bitrate_kbps
    );

    println!();
    if all_required_ok {
        println!("All required tools are available. Strata is ready.");
    } else {
        println!("ffmpeg is missing. Rendering is unavailable until it is installed.");
    }

    Ok(())
}
