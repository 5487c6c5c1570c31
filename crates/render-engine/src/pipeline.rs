//! Render pipeline: plan in, one output file and a report out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use strata_common::config::{bounded_concurrency, AppConfig};
use strata_common::error::{StrataError, StrataResult};
use strata_processing_core::SegmentPlan;
use strata_project_model::asset::AssetStore;
use strata_project_model::plan::RenderPlan;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::assembler::{assemble, IntervalClip};
use crate::audio::reconcile_audio;
use crate::compositor::compose_interval;
use crate::engine::{CompositeRequest, EncodingEngine};
use crate::mux::mux_to_output;
use crate::progress::{emit, ProgressCallback, RenderStage};
use crate::report::{RenderReport, RenderWarning};
use crate::scratch::ScratchSpace;

/// Renders plans with one engine and one asset store.
pub struct Renderer {
    engine: Arc<dyn EncodingEngine>,
    assets: Arc<dyn AssetStore>,
    scratch_root: PathBuf,
    concurrency: usize,
}

impl Renderer {
    pub fn new(
        engine: Arc<dyn EncodingEngine>,
        assets: Arc<dyn AssetStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            engine,
            assets,
            scratch_root: config.scratch_dir.clone(),
            concurrency: config.engine.effective_concurrency(),
        }
    }

    /// Override the number of intervals composited at once. The value is
    /// still capped at the host CPU count.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = bounded_concurrency(Some(concurrency));
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Render `plan` to `output`.
    ///
    /// The plan is validated before any work starts. Unresolvable layers and
    /// audio segments become warnings in the report; any engine failure
    /// aborts the render, cancels outstanding intervals and leaves no file at
    /// `output`.
    pub async fn render(
        &self,
        plan: &RenderPlan,
        output: &Path,
        progress: Option<ProgressCallback>,
    ) -> StrataResult<RenderReport> {
        let started = Instant::now();
        plan.validate()?;

        if !self.engine.is_available() {
            return Err(StrataError::unsupported(format!(
                "Encoding engine '{}' is not available",
                self.engine.name()
            )));
        }

        let scratch = ScratchSpace::create(&self.scratch_root)?;
        let render_id = scratch.render_id();
        tracing::info!(
            %render_id,
            engine = self.engine.name(),
            layers = plan.layers.len(),
            audio_segments = plan.audio.len(),
            output = %output.display(),
            "Starting render"
        );
        emit(progress.as_ref(), RenderStage::Preparing, 0, 0);

        let segments = SegmentPlan::build(plan);
        if segments.total_frames(plan.fps) == 0 {
            return Err(StrataError::invalid_plan(format!(
                "total_duration {}s is shorter than one frame at {} fps",
                plan.total_duration, plan.fps
            )));
        }

        let mut warnings: Vec<RenderWarning> = Vec::new();
        let mut requests = Vec::with_capacity(segments.len());
        for activation in &segments.activations {
            let interval = activation.interval;
            if interval.frame_count(plan.fps) == 0 {
                tracing::debug!(
                    interval = interval.index,
                    start = interval.start,
                    end = interval.end,
                    "Interval falls between two frames, skipping"
                );
                continue;
            }
            let (request, dropped) = compose_interval(
                plan,
                activation,
                self.assets.as_ref(),
                scratch.interval_clip(activation.interval.index),
            )?;
            warnings.extend(dropped);
            requests.push(request);
        }
        let filler_intervals = requests.iter().filter(|r| r.is_filler()).count();
        let total = requests.len();

        tracing::info!(
            %render_id,
            intervals = total,
            filler = filler_intervals,
            concurrency = self.concurrency,
            "Compositing intervals"
        );
        emit(progress.as_ref(), RenderStage::Compositing, 0, total);
        let clips = self.composite_all(requests, progress.as_ref()).await?;

        emit(progress.as_ref(), RenderStage::Assembling, total, total);
        let video = assemble(
            self.engine.as_ref(),
            &segments,
            plan.fps,
            clips,
            &scratch.file("video.mp4"),
        )
        .await?;

        emit(progress.as_ref(), RenderStage::Audio, total, total);
        let audio = reconcile_audio(self.engine.as_ref(), plan, self.assets.as_ref(), &scratch).await?;
        warnings.extend(audio.warnings);

        emit(progress.as_ref(), RenderStage::Muxing, total, total);
        let output = mux_to_output(
            self.engine.as_ref(),
            &video,
            audio.artifact.as_ref(),
            &scratch,
            output,
        )
        .await?;

        emit(progress.as_ref(), RenderStage::Complete, total, total);
        let elapsed_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            %render_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            warnings = warnings.len(),
            "Render finished"
        );

        Ok(RenderReport {
            output,
            render_id,
            engine: self.engine.name().to_string(),
            intervals: segments.len(),
            filler_intervals,
            frames: segments.total_frames(plan.fps),
            audio_segments: audio.segments,
            has_audio: audio.artifact.is_some(),
            warnings,
            elapsed_secs,
            completed_at: chrono::Utc::now(),
        })
    }

    /// Composite every interval, at most `concurrency` at a time.
    ///
    /// Clips come back tagged with their interval index; completion order is
    /// irrelevant. The first failure aborts every outstanding task.
    async fn composite_all(
        &self,
        requests: Vec<CompositeRequest>,
        progress: Option<&ProgressCallback>,
    ) -> StrataResult<Vec<IntervalClip>> {
        let total = requests.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for request in requests {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|e| {
                    StrataError::encode(
                        format!("interval {}", request.interval_index),
                        format!("Scheduler closed: {e}"),
                    )
                })?;
                let started = Instant::now();
                let artifact = engine.composite(&request).await?;
                tracing::debug!(
                    interval = request.interval_index,
                    layers = request.inputs.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Interval composited"
                );
                Ok::<_, StrataError>(IntervalClip {
                    index: request.interval_index,
                    artifact,
                })
            });
        }

        let mut clips = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| {
                StrataError::encode("composite", format!("Interval task failed: {e}"))
            });
            match outcome.and_then(|result| result) {
                Ok(clip) => {
                    clips.push(clip);
                    emit(progress, RenderStage::Compositing, clips.len(), total);
                }
                Err(err) => {
                    tracing::error!(error = %err, "Interval failed, aborting render");
                    tasks.abort_all();
                    return Err(err);
                }
            }
        }

        Ok(clips)
    }
}
