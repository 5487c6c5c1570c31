//! ffmpeg-backed encoding engine.
//!
//! Each engine call spawns one ffmpeg process with a bounded timeout. The
//! child is killed if its future is dropped, so an aborted render never
//! leaves encoders running. Argument lists are built by pure functions so
//! they can be checked without ffmpeg installed.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use strata_common::config::EngineConfig;
use strata_common::error::{StrataError, StrataResult};
use strata_common::timecode::ffmpeg_secs;
use strata_project_model::plan::LayerKind;
use tokio::process::Command;

use crate::compositor::{filter_complex, OUTPUT_LABEL};
use crate::engine::{
    Artifact, AudioExtractRequest, CompositeRequest, EncodingEngine, ExcerptRequest,
};

/// Lines of ffmpeg stderr kept as diagnostic payload on failure.
const STDERR_TAIL_LINES: usize = 40;

pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn run(&self, step: &str, args: Vec<String>) -> StrataResult<()> {
        tracing::debug!(step, args = ?args, "Running ffmpeg");
        let started = Instant::now();

        let child = Command::new(&self.config.ffmpeg_bin)
            .args(["-hide_banner", "-nostdin", "-y", "-loglevel", "error"])
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| StrataError::encode(step, format!("Failed to start ffmpeg: {e}")))?;

        let limit = Duration::from_secs(self.config.timeout_secs.max(1));
        let output = tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| {
                StrataError::encode(
                    step,
                    format!("ffmpeg timed out after {}s", limit.as_secs()),
                )
            })?
            .map_err(|e| StrataError::encode(step, format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            tracing::warn!(step, status = %output.status, "ffmpeg failed");
            return Err(StrataError::encode_with_stderr(
                step,
                format!("ffmpeg exited with {}", output.status),
                stderr_tail(&stderr),
            ));
        }

        tracing::debug!(
            step,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ffmpeg finished"
        );
        Ok(())
    }
}

#[async_trait]
impl EncodingEngine for FfmpegEngine {
    async fn composite(&self, request: &CompositeRequest) -> StrataResult<Artifact> {
        let step = format!("interval {}", request.interval_index);
        self.run(&step, composite_args(request, &self.config)).await?;
        Ok(Artifact::new(&request.output, request.duration))
    }

    async fn concat(&self, clips: &[Artifact], output: &Path) -> StrataResult<Artifact> {
        if clips.is_empty() {
            return Err(StrataError::assembly("Nothing to concatenate"));
        }

        let list_path = output.with_extension("concat.txt");
        tokio::fs::write(&list_path, concat_list(clips)).await?;
        self.run("concat", concat_args(&list_path, output)).await?;

        let duration = clips.iter().map(|c| c.duration).sum();
        Ok(Artifact::new(output, duration))
    }

    async fn mux(
        &self,
        video: &Artifact,
        audio: Option<&Artifact>,
        output: &Path,
    ) -> StrataResult<Artifact> {
        self.run("mux", mux_args(video, audio, output, &self.config))
            .await?;
        Ok(Artifact::new(output, video.duration))
    }

    async fn extract_audio(&self, request: &AudioExtractRequest) -> StrataResult<Artifact> {
        let step = format!("audio segment {}", request.segment_index);
        self.run(&step, extract_audio_args(request, &self.config))
            .await?;
        Ok(Artifact::new(&request.output, request.duration))
    }

    async fn cut_excerpt(&self, request: &ExcerptRequest) -> StrataResult<Artifact> {
        self.run("excerpt", excerpt_args(request, &self.config))
            .await?;
        Ok(Artifact::new(&request.output, request.duration()))
    }

    fn is_available(&self) -> bool {
        command_exists(&self.config.ffmpeg_bin)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn video_codec_args(config: &EngineConfig) -> Vec<String> {
    let video = &config.video;
    vec![
        "-c:v".to_string(),
        video.codec.clone(),
        "-preset".to_string(),
        video.preset.clone(),
        "-crf".to_string(),
        video.crf.to_string(),
        "-pix_fmt".to_string(),
        video.pix_fmt.clone(),
    ]
}

/// Arguments for one interval clip. Input 0 is the black base canvas. The
/// output is cut by frame count, never by time, so clips stay on the grid.
pub fn composite_args(request: &CompositeRequest, config: &EngineConfig) -> Vec<String> {
    let duration = ffmpeg_secs(request.duration);
    let mut args = vec![
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!(
            "color=c=black:s={}x{}:r={}:d={duration}",
            request.width, request.height, request.fps
        ),
    ];

    for input in &request.inputs {
        match input.kind {
            LayerKind::Video => {
                args.extend([
                    "-ss".to_string(),
                    ffmpeg_secs(input.offset),
                    "-t".to_string(),
                    duration.clone(),
                ]);
            }
            LayerKind::Image => {
                args.extend([
                    "-loop".to_string(),
                    "1".to_string(),
                    "-framerate".to_string(),
                    request.fps.to_string(),
                    "-t".to_string(),
                    duration.clone(),
                ]);
            }
        }
        args.push("-i".to_string());
        args.push(path_arg(&input.path));
    }

    args.extend([
        "-filter_complex".to_string(),
        filter_complex(request),
        "-map".to_string(),
        format!("[{OUTPUT_LABEL}]"),
        "-an".to_string(),
    ]);
    args.extend(video_codec_args(config));
    args.extend([
        "-r".to_string(),
        request.fps.to_string(),
        "-frames:v".to_string(),
        request.frames.to_string(),
        path_arg(&request.output),
    ]);
    args
}

/// Concat demuxer list. Single quotes in paths are escaped the way the
/// demuxer expects.
pub fn concat_list(clips: &[Artifact]) -> String {
    clips
        .iter()
        .map(|clip| {
            let escaped = path_arg(&clip.path).replace('\'', r"'\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

pub fn concat_args(list_path: &Path, output: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        path_arg(list_path),
        "-c".to_string(),
        "copy".to_string(),
        path_arg(output),
    ]
}

pub fn mux_args(
    video: &Artifact,
    audio: Option<&Artifact>,
    output: &Path,
    config: &EngineConfig,
) -> Vec<String> {
    let mut args = vec!["-i".to_string(), path_arg(&video.path)];
    match audio {
        Some(audio) => {
            args.extend([
                "-i".to_string(),
                path_arg(&audio.path),
                "-map".to_string(),
                "0:v:0".to_string(),
                "-map".to_string(),
                "1:a:0".to_string(),
                "-c:v".to_string(),
                "copy".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", config.audio.bitrate_kbps.max(32)),
                "-t".to_string(),
                ffmpeg_secs(video.duration),
            ]);
        }
        None => {
            args.extend([
                "-map".to_string(),
                "0:v:0".to_string(),
                "-c".to_string(),
                "copy".to_string(),
            ]);
        }
    }
    args.extend([
        "-movflags".to_string(),
        "+faststart".to_string(),
        path_arg(output),
    ]);
    args
}

pub fn extract_audio_args(request: &AudioExtractRequest, config: &EngineConfig) -> Vec<String> {
    vec![
        "-ss".to_string(),
        ffmpeg_secs(request.trim_start),
        "-t".to_string(),
        ffmpeg_secs(request.duration),
        "-i".to_string(),
        path_arg(&request.source),
        "-vn".to_string(),
        "-af".to_string(),
        format!("volume={:.4}", request.volume.max(0.0)),
        "-ac".to_string(),
        config.audio.channels.to_string(),
        "-ar".to_string(),
        config.audio.sample_rate.to_string(),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
        path_arg(&request.output),
    ]
}

pub fn excerpt_args(request: &ExcerptRequest, config: &EngineConfig) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        path_arg(&request.source),
        "-ss".to_string(),
        ffmpeg_secs(request.start),
        "-to".to_string(),
        ffmpeg_secs(request.end),
    ];
    args.extend(video_codec_args(config));
    args.extend([
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", config.audio.bitrate_kbps.max(32)),
        path_arg(&request.output),
    ]);
    args
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let skip = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[skip..].join("\n")
}

/// Whether `binary` can be found on `PATH` (or exists, if given as a path).
pub fn command_exists(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(binary).is_file();
    }
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
