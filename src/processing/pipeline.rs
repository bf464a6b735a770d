//! Pipeline orchestrator: map → per group (resize → assemble → slice → save).
//!
//! Groups are processed strictly one after another so only one strip is ever
//! alive. Work inside a group runs on the run's single [`WorkerPool`].

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::core::{PipelineConfig, Progress, ProgressType, RunState, RunStatus, RunSummary};
use crate::processing::codec;
use crate::processing::mapper::{DirectoryGroup, map_directory, total_images};
use crate::processing::resize::{ResizeSlot, ResizedImage, resize_group};
use crate::processing::slicer::slice;
use crate::processing::strip::assemble;
use crate::utils::fs::create_dir_all;
use crate::utils::{OutputFormat, SlicerError, SlicerResult, extract_filename};
use crate::worker::{TaskOutcome, WorkerError, WorkerPool};

const OPERATION: &str = "slice";

/// How far a group got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOutcome {
    /// Saved, partly failed or skipped; counts towards progress either way
    Finished,
    /// Cancellation was seen while resizing; nothing was written
    Cancelled,
}

/// One configured slicing run and the pool it executes on.
pub struct Pipeline {
    config: PipelineConfig,
    pool: WorkerPool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> SlicerResult<Self> {
        let pool = WorkerPool::new(config.workers)?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline to completion or cancellation.
    ///
    /// `on_progress` receives a `Start` event, one `Progress` event per
    /// finished group and a final `Complete` (at 100%) or `Cancelled` event.
    /// Per-file and per-group failures are recorded in `state` and never end
    /// the run early.
    pub fn run(&self, state: &RunState, mut on_progress: impl FnMut(&Progress)) -> RunSummary {
        let started = Instant::now();
        info!(
            "=== Slicing {} → {} ===",
            self.config.source_root.display(),
            self.config.dest_root.display()
        );

        let groups = map_directory(&self.config.source_root);
        let total = total_images(&groups);
        on_progress(
            &Progress::new(ProgressType::Start, 0, total, "Starting").with_percentage(0.0),
        );
        if total == 0 {
            info!("No images found under {}", self.config.source_root.display());
        }

        let mut status = RunStatus::Completed;
        let mut groups_completed = 0;
        for (index, group) in groups.iter().enumerate() {
            if state.is_cancelled() {
                info!("Cancelled before group '{}'", group.name());
                status = RunStatus::Cancelled;
                break;
            }

            debug!("Group {}/{}: '{}'", index + 1, groups.len(), group.name());
            if self.guarded_group(group, state) == GroupOutcome::Cancelled {
                status = RunStatus::Cancelled;
                break;
            }

            groups_completed += 1;
            let processed = state.add_processed(group.files.len());
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
            OPERATION,
            status,
            total,
            groups_completed,
            started.elapsed(),
            state,
        );
        summary.log();
        summary
    }

    /// Runs one group, turning a panic anywhere inside it into failures for
    /// the group's files.
    fn guarded_group(&self, group: &DirectoryGroup, state: &RunState) -> GroupOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.process_group(group, state))) {
            Ok(outcome) => outcome,
            Err(_) => {
                let error = SlicerError::worker(format!("group '{}' aborted", group.name()));
                warn!("{}", error);
                for file in &group.files {
                    state.record_failure(file, failure_reason(&error));
                }
                GroupOutcome::Finished
            }
        }
    }

    fn process_group(&self, group: &DirectoryGroup, state: &RunState) -> GroupOutcome {
        info!("Processing '{}' ({} images)", group.name(), group.files.len());
        let slots = resize_group(&self.pool, &group.files, self.config.target_width, state);
        if state.is_cancelled() || slots.iter().any(ResizeSlot::is_skipped) {
            info!("Cancelled while resizing '{}', discarding the group", group.name());
            return GroupOutcome::Cancelled;
        }

        let resized: Vec<ResizedImage> = slots
            .into_iter()
            .filter_map(|slot| match slot {
                ResizeSlot::Resized(image) => Some(image),
                _ => None,
            })
            .collect();
        if resized.is_empty() {
            warn!("No image in '{}' could be resized, skipping it", group.name());
            return GroupOutcome::Finished;
        }

        let output_dir = group.output_dir(&self.config.dest_root);
        match self.config.slice_height {
            Some(slice_height) => {
                let sources: Vec<PathBuf> = resized.iter().map(|r| r.source.clone()).collect();
                match self.save_tiles(group, resized, slice_height, &output_dir) {
                    Ok(count) => {
                        info!("Saved {} tiles for '{}'", count, group.name());
                        for source in &sources {
                            state.record_success(source);
                        }
                    }
                    Err(e) => {
                        warn!("Group '{}' failed: {}", group.name(), e);
                        for source in &sources {
                            state.record_failure(source, failure_reason(&e));
                        }
                    }
                }
            }
            None => self.save_individually(resized, &output_dir, state),
        }
        GroupOutcome::Finished
    }

    /// Assembles, slices and writes one group's tiles. Either every tile is
    /// written or none is left behind.
    fn save_tiles(
        &self,
        group: &DirectoryGroup,
        resized: Vec<ResizedImage>,
        slice_height: u32,
        output_dir: &Path,
    ) -> SlicerResult<usize> {
        let first = group
            .files
            .first()
            .ok_or_else(|| SlicerError::io(format!("group '{}' is empty", group.name())))?;
        let format = OutputFormat::resolve(self.config.output_format.as_ref(), first)?;

        let strip = assemble(resized.iter().map(|r| &r.image), self.config.target_width)
            .ok_or_else(|| SlicerError::encode("nothing to assemble"))?;
        drop(resized);
        let tiles = slice(&strip, slice_height, &format);
        drop(strip);
        debug!("Cut '{}' into {} tiles", group.name(), tiles.len());

        let quality = self.config.quality;
        let encoded = self.pool.run_to_completion(tiles, |tile| {
            let bytes = codec::encode(&DynamicImage::ImageRgb8(tile.image), format.format, quality)?;
            Ok::<_, SlicerError>((tile.file_name, bytes))
        });

        let mut files = Vec::with_capacity(encoded.len());
        for outcome in encoded {
            match outcome {
                TaskOutcome::Completed(result) => files.push(result?),
                TaskOutcome::Panicked(message) => {
                    return Err(WorkerError::TaskPanicked(message).into());
                }
                TaskOutcome::Skipped => return Err(SlicerError::worker("tile encode skipped")),
            }
        }

        create_dir_all(output_dir)?;
        let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());
        for (file_name, bytes) in &files {
            let target = output_dir.join(file_name);
            if let Err(e) = fs::write(&target, bytes) {
                for path in &written {
                    let _ = fs::remove_file(path);
                }
                return Err(SlicerError::io(format!(
                    "Cannot write {}: {}",
                    target.display(),
                    e
                )));
            }
            written.push(target);
        }
        Ok(written.len())
    }

    /// Saves every resized image on its own, under its original name unless
    /// an output format was requested.
    fn save_individually(&self, resized: Vec<ResizedImage>, output_dir: &Path, state: &RunState) {
        let requested = self.config.output_format.as_ref();
        let quality = self.config.quality;

        let sources: Vec<PathBuf> = resized.iter().map(|r| r.source.clone()).collect();
        let outcomes = self.pool.run_to_completion(resized, |item| {
            individual_target(&item.source, requested, output_dir)
                .and_then(|(target, format)| codec::save(&item.image, &target, format.format, quality))
        });

        for (outcome, source) in outcomes.into_iter().zip(&sources) {
            let result = match outcome {
                TaskOutcome::Completed(result) => result,
                TaskOutcome::Panicked(message) => Err(WorkerError::TaskPanicked(message).into()),
                TaskOutcome::Skipped => continue,
            };
            match result {
                Ok(()) => state.record_success(source),
                Err(e) => {
                    warn!("Failed to save {}: {}", source.display(), e);
                    state.record_failure(source, failure_reason(&e));
                }
            }
        }
    }
}

/// Runs a one-off pipeline on its own pool.
pub fn run_pipeline(
    config: PipelineConfig,
    state: &RunState,
    on_progress: impl FnMut(&Progress),
) -> SlicerResult<RunSummary> {
    Ok(Pipeline::new(config)?.run(state, on_progress))
}

fn individual_target(
    source: &Path,
    requested: Option<&OutputFormat>,
    output_dir: &Path,
) -> SlicerResult<(PathBuf, OutputFormat)> {
    let format = OutputFormat::resolve(requested, source)?;
    let file_name = match requested {
        Some(format) => format.file_name(&crate::utils::fs::file_stem(source)),
        None => extract_filename(source),
    };
    Ok((output_dir.join(file_name), format))
}

pub(crate) fn failure_reason(error: &SlicerError) -> String {
    format!("{}: {}", error.kind(), error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Quality;
    use image::{Rgb, RgbImage};

    fn config(source: &Path, dest: &Path, slice_height: Option<u32>) -> PipelineConfig {
        PipelineConfig {
            source_root: source.to_path_buf(),
            dest_root: dest.to_path_buf(),
            target_width: 40,
            slice_height,
            output_format: None,
            quality: Quality::SLICE_DEFAULT,
            workers: 2,
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(width, height, Rgb([30, 90, 150]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn individual_names_keep_the_original_unless_a_format_is_requested() {
        let out = Path::new("/out");
        let (target, format) = individual_target(Path::new("/in/Photo.JPG"), None, out).unwrap();
        assert_eq!(target, PathBuf::from("/out/Photo.JPG"));
        assert_eq!(format.extension, "jpg");

        let webp = OutputFormat::requested("webp").unwrap();
        let (target, _) = individual_target(Path::new("/in/Photo.JPG"), Some(&webp), out).unwrap();
        assert_eq!(target, PathBuf::from("/out/Photo.webp"));
    }

    #[test]
    fn events_are_monotonic_and_end_at_100() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        write_png(&src.path().join("a/1.png"), 20, 10);
        write_png(&src.path().join("b/1.png"), 20, 10);
        write_png(&src.path().join("b/2.png"), 80, 40);

        let pipeline = Pipeline::new(config(src.path(), dst.path(), Some(15))).unwrap();
        let state = RunState::new();
        let mut events = Vec::new();
        let summary = pipeline.run(&state, |p| events.push(p.clone()));

        assert_eq!(events.first().unwrap().progress_type, ProgressType::Start);
        assert_eq!(events.last().unwrap().progress_type, ProgressType::Complete);
        assert_eq!(events.last().unwrap().progress_percentage, 100.0);
        assert!(events
            .windows(2)
            .all(|w| w[0].progress_percentage <= w[1].progress_percentage));
        let per_group: Vec<_> = events
            .iter()
            .filter(|e| e.progress_type == ProgressType::Progress)
            .map(|e| e.group.clone().unwrap())
            .collect();
        assert_eq!(per_group, vec!["a", "b"]);

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.groups_completed, 2);
        // a: 40×20 → 2 tiles of 15; b: 40×20 + 40×20 → 3 tiles
        assert!(dst.path().join("a/slice_1.png").exists());
        assert!(!dst.path().join("a/slice_2.png").exists());
        assert!(dst.path().join("b/slice_2.png").exists());
    }

    #[test]
    fn cancel_during_resize_discards_the_group() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        write_png(&src.path().join("g/1.png"), 40, 40);
        write_png(&src.path().join("g/2.png"), 40, 40);

        let pipeline = Pipeline::new(config(src.path(), dst.path(), Some(20))).unwrap();
        let groups = map_directory(src.path());
        assert_eq!(groups.len(), 1);

        let state = RunState::new();
        state.cancel();
        let outcome = pipeline.process_group(&groups[0], &state);

        assert_eq!(outcome, GroupOutcome::Cancelled);
        assert!(!dst.path().join("g").exists());
        assert_eq!(state.processed_count(), 0);
        assert_eq!(state.success_count(), 0);
        assert_eq!(state.failure_count(), 0);
    }

    #[test]
    fn failed_write_leaves_no_partial_group() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        write_png(&src.path().join("g/1.png"), 40, 40);
        write_png(&src.path().join("g/2.png"), 40, 40);
        // A directory where the third tile should go makes that write fail.
        fs::create_dir_all(dst.path().join("g/slice_2.png")).unwrap();

        let pipeline = Pipeline::new(config(src.path(), dst.path(), Some(20))).unwrap();
        let state = RunState::new();
        let summary = pipeline.run(&state, |_| {});

        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.failure_count, 2);
        assert!(summary.failed_images.iter().all(|f| f.reason.starts_with("io_error")));
        assert!(!dst.path().join("g/slice_0.png").exists());
        assert!(!dst.path().join("g/slice_1.png").exists());
        assert_eq!(summary.processed_images, 2);
    }
}
