//! Whole-file re-encoding for the compress and convert commands.
//!
//! Independent of the slicing pipeline: no resize, no strips. It shares the
//! codec adapter, the directory mapper and the worker pool.

use std::path::PathBuf;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::core::{
    Progress, ProgressType, RunState, RunStatus, RunSummary, TranscodeConfig, TranscodeTask,
};
use crate::processing::codec;
use crate::processing::mapper::{map_directory, total_images};
use crate::processing::pipeline::failure_reason;
use crate::utils::{SlicerError, SlicerResult, extract_filename};
use crate::worker::{TaskOutcome, WorkerError, WorkerPool};

/// Re-encodes one file and returns the path written.
pub fn transcode_file(task: &TranscodeTask) -> SlicerResult<PathBuf> {
    let output = task.resolve_output()?;
    let target = task.output_path()?;

    let mut image = codec::decode(&task.input_path)?;
    if task.normalize_rgb {
        image = DynamicImage::ImageRgb8(image.to_rgb8());
    }
    codec::save(&image, &target, output.format, task.quality)?;

    debug!(
        "Transcoded '{}' → '{}'",
        extract_filename(&task.input_path),
        extract_filename(&target)
    );
    Ok(target)
}

/// Re-encodes one file, reporting only the output name and whether it worked.
///
/// On failure the name is the input's file name.
pub fn transcode(task: &TranscodeTask) -> (String, bool) {
    match transcode_file(task) {
        Ok(target) => (extract_filename(&target), true),
        Err(e) => {
            warn!("Failed to transcode {}: {}", task.input_path.display(), e);
            (extract_filename(&task.input_path), false)
        }
    }
}

/// A configured compress or convert run and its pool.
pub struct TranscodeService {
    config: TranscodeConfig,
    pool: WorkerPool,
}

impl TranscodeService {
    pub fn new(config: TranscodeConfig) -> SlicerResult<Self> {
        let pool = WorkerPool::new(config.workers)?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Transcodes every supported image under the source root into the
    /// mirrored destination tree.
    pub fn run(&self, state: &RunState, mut on_progress: impl FnMut(&Progress)) -> RunSummary {
        let started = Instant::now();
        let operation = self.config.mode.name();
        info!(
            "=== Running {} on {} → {} ===",
            operation,
            self.config.source_root.display(),
            self.config.dest_root.display()
        );

        let groups = map_directory(&self.config.source_root);
        let total = total_images(&groups);
        on_progress(
            &Progress::new(ProgressType::Start, 0, total, "Starting").with_percentage(0.0),
        );

        let mut status = RunStatus::Completed;
        let mut groups_completed = 0;
        for group in &groups {
            if state.is_cancelled() {
                status = RunStatus::Cancelled;
                break;
            }

            let output_dir = group.output_dir(&self.config.dest_root);
            let tasks: Vec<TranscodeTask> = group
                .files
                .iter()
                .map(|file| {
                    TranscodeTask::new(file, &output_dir, &self.config.mode, self.config.quality)
                })
                .collect();

            let outcomes = self.pool.run_indexed(tasks, state, |task| transcode_file(&task));

            let mut done = 0;
            let mut skipped = false;
            for (outcome, source) in outcomes.into_iter().zip(&group.files) {
                match outcome {
                    TaskOutcome::Completed(Ok(_)) => {
                        state.record_success(source);
                        done += 1;
                    }
                    TaskOutcome::Completed(Err(e)) => {
                        warn!("Failed to {} {}: {}", operation, source.display(), e);
                        state.record_failure(source, failure_reason(&e));
                        done += 1;
                    }
                    TaskOutcome::Panicked(message) => {
                        let e = SlicerError::from(WorkerError::TaskPanicked(message));
                        state.record_failure(source, failure_reason(&e));
                        done += 1;
                    }
                    TaskOutcome::Skipped => skipped = true,
                }
            }

            let processed = state.add_processed(done);
            if skipped {
                status = RunStatus::Cancelled;
                break;
            }
            groups_completed += 1;
            on_progress(
                &Progress::new(
                    ProgressType::Progress,
                    processed,
                    total,
                    &format!("Finished {}", group.name()),
                )
                .with_group(group.name()),
            );
        }

        let processed = state.processed_count();
        let last = match status {
            RunStatus::Completed => {
                Progress::new(ProgressType::Complete, processed, total, "Completed")
                    .with_percentage(100.0)
            }
            RunStatus::Cancelled => {
                Progress::new(ProgressType::Cancelled, processed, total, "Cancelled")
            }
        };
        on_progress(&last);

        let summary = RunSummary::from_state(
            operation,
            status,
            total,
            groups_completed,
            started.elapsed(),
            state,
        );
        summary.log();
        summary
    }
}

/// Runs a one-off compress or convert on its own pool.
pub fn run_transcode(
    config: TranscodeConfig,
    state: &RunState,
    on_progress: impl FnMut(&Progress),
) -> SlicerResult<RunSummary> {
    Ok(TranscodeService::new(config)?.run(state, on_progress))
}
