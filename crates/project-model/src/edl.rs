//! Edit decision lists for single-source cut-and-concatenate exports.

use serde::{Deserialize, Serialize};

use crate::composition::TrackType;
use crate::plan::PlanError;

/// An edit decision list (`edl.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edl {
    pub tracks: Vec<EdlTrack>,
}

/// One EDL track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdlTrack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: TrackType,

    #[serde(default)]
    pub muted: bool,

    #[serde(default)]
    pub clips: Vec<EdlClip>,
}

/// A clip in source time. The kept range is
/// `[start + trimStart, end - trimEnd)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdlClip {
    #[serde(default)]
    pub start: f64,

    #[serde(default)]
    pub end: f64,

    #[serde(rename = "trimStart", default)]
    pub trim_start: f64,

    #[serde(rename = "trimEnd", default)]
    pub trim_end: f64,
}

impl EdlClip {
    /// The kept source range, or `None` when trimming leaves nothing.
    pub fn source_range(&self) -> Option<(f64, f64)> {
        let start = self.start + self.trim_start;
        let end = self.end - self.trim_end;
        (end > start).then_some((start, end))
    }
}

impl Edl {
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        serde_json::from_str(json).map_err(|e| PlanError::invalid(format!("Invalid EDL JSON: {e}")))
    }

    /// Clips of the first video track.
    pub fn video_clips(&self) -> Option<&[EdlClip]> {
        self.tracks
            .iter()
            .find(|t| t.kind == TrackType::Video)
            .map(|t| t.clips.as_slice())
    }

    /// Kept source ranges of the first video track, ordered by clip start,
    /// with empty clips removed.
    pub fn cut_list(&self) -> Result<Vec<(f64, f64)>, PlanError> {
        let clips = self
            .video_clips()
            .filter(|clips| !clips.is_empty())
            .ok_or_else(|| PlanError::invalid("No video clips in EDL"))?;

        let mut ordered: Vec<&EdlClip> = clips.iter().collect();
        ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

        let ranges: Vec<(f64, f64)> = ordered.iter().filter_map(|c| c.source_range()).collect();
        if ranges.is_empty() {
            return Err(PlanError::invalid("No valid segments to render"));
        }
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_list_sorts_trims_and_skips_empty() {
        let edl = Edl::from_json(
            r#"{"tracks":[
                {"id":"a","type":"audio","clips":[{"start":0,"end":100}]},
                {"id":"video","type":"video","muted":false,"clips":[
                    {"start":20,"end":30,"trimStart":1,"trimEnd":2},
                    {"start":0,"end":10},
                    {"start":40,"end":41,"trimStart":0.6,"trimEnd":0.6}
                ]}
            ]}"#,
        )
        .unwrap();

        let cuts = edl.cut_list().unwrap();
        assert_eq!(cuts, vec![(0.0, 10.0), (21.0, 28.0)]);
    }

    #[test]
    fn test_cut_list_requires_video_clips() {
        let edl = Edl::from_json(r#"{"tracks":[{"type":"video","clips":[]}]}"#).unwrap();
        assert!(edl.cut_list().is_err());

        let edl = Edl::from_json(r#"{"tracks":[]}"#).unwrap();
        assert!(edl.cut_list().is_err());
    }

    #[test]
    fn test_cut_list_rejects_all_empty_clips() {
        let edl =
            Edl::from_json(r#"{"tracks":[{"type":"video","clips":[{"start":5,"end":5}]}]}"#)
                .unwrap();
        let err = edl.cut_list().unwrap_err();
        assert!(err.to_string().contains("No valid segments"));
    }

    #[test]
    fn test_clip_field_names_match_editor_format() {
        let clip = EdlClip {
            start: 1.0,
            end: 2.0,
            trim_start: 0.25,
            trim_end: 0.0,
        };
        let json = serde_json::to_string(&clip).unwrap();
        assert!(json.contains("\"trimStart\":0.25"));
        assert!(json.contains("\"trimEnd\":0.0"));
    }
}
