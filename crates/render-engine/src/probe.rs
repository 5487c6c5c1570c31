//! Media inspection via ffprobe.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_common::config::EngineConfig;
use strata_common::error::{StrataError, StrataResult};
use strata_common::timecode::round_secs;
use tokio::process::Command;

/// Timeout for one ffprobe call.
const PROBE_TIMEOUT_SECS: u64 = 30;

/// Summary of a media file's container and first video/audio streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration: f64,
    pub size: u64,
    pub format: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }

    /// Parse `ffprobe -print_format json -show_format -show_streams` output.
    pub fn from_ffprobe_json(json: &str) -> StrataResult<Self> {
        let raw: FfprobeOutput = serde_json::from_str(json)?;
        let format = raw.format.unwrap_or_default();

        let mut info = MediaInfo {
            duration: parse_number(format.duration.as_deref()),
            size: parse_number(format.size.as_deref()) as u64,
            format: format.format_name.unwrap_or_default(),
            ..MediaInfo::default()
        };

        for stream in raw.streams {
            match stream.codec_type.as_deref() {
                Some("video") if info.video_codec.is_none() => {
                    info.width = stream.width;
                    info.height = stream.height;
                    info.video_codec = Some(stream.codec_name.unwrap_or_default());
                    info.fps = Some(parse_fps(stream.r_frame_rate.as_deref().unwrap_or("0/1")));
                }
                Some("audio") if info.audio_codec.is_none() => {
                    info.audio_codec = Some(stream.codec_name.unwrap_or_default());
                    info.sample_rate = Some(parse_number(stream.sample_rate.as_deref()) as u32);
                    info.channels = stream.channels;
                }
                _ => {}
            }
        }

        Ok(info)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

fn parse_number(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// Parse an ffmpeg rate such as `30000/1001` or `25`, rounded to two
/// decimals. Unparseable rates and zero denominators give `0.0`.
pub fn parse_fps(rate: &str) -> f64 {
    let rate = rate.trim();
    match rate.split_once('/') {
        Some((num, den)) => match (num.parse::<i64>(), den.parse::<i64>()) {
            (Ok(num), Ok(den)) if den != 0 => round_secs(num as f64 / den as f64, 2),
            _ => 0.0,
        },
        None => rate.parse::<f64>().unwrap_or(0.0),
    }
}

/// Run ffprobe on `path`.
pub async fn probe_media(config: &EngineConfig, path: &Path) -> StrataResult<MediaInfo> {
    if !path.is_file() {
        return Err(StrataError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let child = Command::new(&config.ffprobe_bin)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| StrataError::encode("probe", format!("Failed to start ffprobe: {e}")))?;

    let output = tokio::time::timeout(
        Duration::from_secs(PROBE_TIMEOUT_SECS),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| StrataError::encode("probe", "ffprobe timed out"))?
    .map_err(|e| StrataError::encode("probe", format!("Failed to wait on ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(StrataError::encode_with_stderr(
            "probe",
            format!("ffprobe exited with {}", output.status),
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let info = MediaInfo::from_ffprobe_json(&String::from_utf8_lossy(&output.stdout))?;
    tracing::debug!(
        path = %path.display(),
        duration = info.duration,
        format = %info.format,
        "Probed media"
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fps() {
        assert_eq!(parse_fps("30/1"), 30.0);
        assert_eq!(parse_fps("30000/1001"), 29.97);
        assert_eq!(parse_fps("24000/1001"), 23.98);
        assert_eq!(parse_fps("25"), 25.0);
        assert_eq!(parse_fps("0/0"), 0.0);
        assert_eq!(parse_fps("abc"), 0.0);
    }

    #[test]
    fn test_from_ffprobe_json() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
                 "r_frame_rate": "30000/1001"},
                {"codec_type": "audio", "codec_name": "aac", "sample_rate": "44100", "channels": 2},
                {"codec_type": "data", "codec_name": "bin_data"}
            ],
            "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "12.480000", "size": "1048576"}
        }"#;
        let info = MediaInfo::from_ffprobe_json(json).unwrap();

        assert_eq!(info.duration, 12.48);
        assert_eq!(info.size, 1_048_576);
        assert_eq!(info.format, "mov,mp4,m4a,3gp,3g2,mj2");
        assert_eq!((info.width, info.height), (Some(1920), Some(1080)));
        assert_eq!(info.video_codec.as_deref(), Some("h264"));
        assert_eq!(info.fps, Some(29.97));
        assert_eq!(info.audio_codec.as_deref(), Some("aac"));
        assert_eq!(info.sample_rate, Some(44100));
        assert_eq!(info.channels, Some(2));
    }

    #[test]
    fn test_audio_only_file_has_no_video_fields() {
        let json = r#"{"streams":[{"codec_type":"audio","codec_name":"mp3","sample_rate":"48000","channels":1}],
                       "format":{"format_name":"mp3","duration":"3.0"}}"#;
        let info = MediaInfo::from_ffprobe_json(json).unwrap();
        assert!(!info.has_video());
        assert!(info.has_audio());
        assert_eq!(info.size, 0);

        let value = serde_json::to_value(&info).unwrap();
        assert!(value.get("width").is_none());
        assert_eq!(value["channels"], 1);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_media(&EngineConfig::default(), Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::FileNotFound { .. }));
    }
}
