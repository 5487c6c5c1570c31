//! Audio reconciler.
//!
//! Audio is cut independently of the visual segmentation: each segment is
//! extracted, gain-adjusted and normalised to PCM, then the parts are joined
//! in plan order. Segments that cannot contribute are skipped with a warning.

use strata_common::error::StrataResult;
use strata_project_model::asset::AssetStore;
use strata_project_model::plan::RenderPlan;

use crate::engine::{Artifact, AudioExtractRequest, EncodingEngine};
use crate::report::RenderWarning;
use crate::scratch::ScratchSpace;

/// Result of reconciling a plan's audio.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioTrack {
    /// The joined track, or `None` if no segment survived.
    pub artifact: Option<Artifact>,
    /// Number of segments that made it into the track.
    pub segments: usize,
    pub warnings: Vec<RenderWarning>,
}

/// Build extraction requests for every usable segment, in plan order.
pub fn plan_extractions(
    plan: &RenderPlan,
    assets: &dyn AssetStore,
    scratch: &ScratchSpace,
) -> StrataResult<(Vec<AudioExtractRequest>, Vec<RenderWarning>)> {
    let mut requests = Vec::new();
    let mut warnings = Vec::new();

    for (index, segment) in plan.audio.iter().enumerate() {
        let skip = |reason: &str| {
            tracing::warn!(
                segment = index,
                source = segment.source.as_deref().unwrap_or(""),
                reason,
                "Skipping audio segment"
            );
            RenderWarning::AudioSkipped {
                segment_index: index,
                source: segment.source.clone(),
                reason: reason.to_string(),
            }
        };

        if segment.duration.is_nan() || segment.duration <= 0.0 {
            warnings.push(skip("non-positive duration"));
            continue;
        }
        let Some(source_ref) = segment.source_ref() else {
            warnings.push(skip("no source"));
            continue;
        };
        let source = match assets.resolve(source_ref) {
            Ok(path) => path,
            Err(err) if err.is_recoverable() => {
                warnings.push(skip("unresolved asset"));
                continue;
            }
            Err(err) => return Err(err),
        };

        requests.push(AudioExtractRequest {
            segment_index: index,
            source,
            trim_start: segment.trim_start.max(0.0),
            duration: segment.duration,
            volume: segment.volume.max(0.0),
            output: scratch.audio_part(index),
        });
    }

    Ok((requests, warnings))
}

/// Extract and join the plan's audio segments.
pub async fn reconcile_audio(
    engine: &dyn EncodingEngine,
    plan: &RenderPlan,
    assets: &dyn AssetStore,
    scratch: &ScratchSpace,
) -> StrataResult<AudioTrack> {
    let (requests, warnings) = plan_extractions(plan, assets, scratch)?;
    if requests.is_empty() {
        if !plan.audio.is_empty() {
            tracing::warn!(segments = plan.audio.len(), "No usable audio segments");
        }
        return Ok(AudioTrack {
            artifact: None,
            segments: 0,
            warnings,
        });
    }

    let mut parts = Vec::with_capacity(requests.len());
    for request in &requests {
        parts.push(engine.extract_audio(request).await?);
    }

    let artifact = if parts.len() == 1 {
        parts.pop()
    } else {
        Some(engine.concat(&parts, &scratch.file("audio.wav")).await?)
    };

    tracing::info!(segments = requests.len(), skipped = warnings.len(), "Audio track reconciled");
    Ok(AudioTrack {
        artifact,
        segments: requests.len(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use strata_common::error::StrataError;
    use strata_project_model::plan::AudioSegment;

    struct OnlyVoice;

    impl AssetStore for OnlyVoice {
        fn resolve(&self, source_ref: &str) -> StrataResult<PathBuf> {
            match source_ref {
                "voice" => Ok(PathBuf::from("/m/voice.wav")),
                other => Err(StrataError::unresolved(other)),
            }
        }
    }

    #[test]
    fn test_unusable_segments_are_skipped_in_order() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::create(root.path()).unwrap();

        let mut plan = RenderPlan::new(640, 360, 30, 10.0);
        plan.audio.push(AudioSegment::new("voice", 0.0, 4.0).with_trim_start(1.0));
        plan.audio.push(AudioSegment::new("missing", 4.0, 2.0));
        plan.audio.push(AudioSegment::new("voice", 6.0, 0.0));
        plan.audio.push(AudioSegment::new("voice", 6.0, 3.0));

        let (requests, warnings) = plan_extractions(&plan, &OnlyVoice, &scratch).unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].segment_index, 0);
        assert_eq!(requests[0].trim_start, 1.0);
        assert_eq!(requests[1].segment_index, 3);
        assert!(requests[1].output.ends_with("audio_00003.wav"));

        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].to_string().contains("missing"));
        assert!(matches!(
            warnings[1],
            RenderWarning::AudioSkipped { segment_index: 2, .. }
        ));
    }
}
