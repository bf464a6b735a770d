use std::fs;
use std::path::{Path, PathBuf};

use image::{GenericImageView, Rgb, RgbImage};
use image_slicer_lib::processing::Pipeline;
use image_slicer_lib::utils::{OutputFormat, validate_slice_settings};
use image_slicer_lib::{PipelineConfig, Progress, ProgressType, RunState, RunStatus, SliceSettings};

fn write_image(path: &Path, width: u32, height: u32, seed: u8) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x as u8).wrapping_add(seed),
            (y as u8).wrapping_mul(3),
            seed.wrapping_mul(40),
        ])
    })
    .save(path)
    .unwrap();
}

fn config(source: &Path, dest: &Path, width: i64, slice_height: i64) -> PipelineConfig {
    let settings = SliceSettings {
        target_width: width,
        slice_height,
        workers: Some(4),
        ..SliceSettings::default()
    };
    validate_slice_settings(source, dest, &settings).unwrap()
}

fn run(config: PipelineConfig) -> (image_slicer_lib::RunSummary, Vec<Progress>) {
    let pipeline = Pipeline::new(config).unwrap();
    let state = RunState::new();
    let mut events = Vec::new();
    let summary = pipeline.run(&state, |p| events.push(p.clone()));
    (summary, events)
}

fn sorted_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn three_widths_become_one_sliced_strip() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    // Same 8:5 aspect ratio at three widths.
    write_image(&src.path().join("chapter/01.png"), 400, 250, 1);
    write_image(&src.path().join("chapter/02.png"), 800, 500, 2);
    write_image(&src.path().join("chapter/03.png"), 1200, 750, 3);

    let (summary, _) = run(config(src.path(), dst.path(), 800, 600));

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.total_images, 3);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failure_count, 0);

    // Strip is 800 × 1500, so ceil(1500 / 600) = 3 tiles.
    let out = dst.path().join("chapter");
    assert_eq!(
        sorted_files(&out),
        vec!["slice_0.png", "slice_1.png", "slice_2.png"]
    );
    let heights: Vec<u32> = (0..3)
        .map(|i| image::open(out.join(format!("slice_{i}.png"))).unwrap().height())
        .collect();
    assert_eq!(heights, vec![600, 600, 300]);
    assert!((0..3).all(|i| {
        image::open(out.join(format!("slice_{i}.png"))).unwrap().width() == 800
    }));
}

#[test]
fn zero_slice_height_saves_each_image_under_its_name() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_image(&src.path().join("set/a.png"), 400, 300, 1);
    write_image(&src.path().join("set/b.png"), 800, 600, 2);
    write_image(&src.path().join("set/c.png"), 1200, 900, 3);

    let (summary, _) = run(config(src.path(), dst.path(), 800, 0));

    assert_eq!(summary.success_count, 3);
    let out = dst.path().join("set");
    assert_eq!(sorted_files(&out), vec!["a.png", "b.png", "c.png"]);
    for name in ["a.png", "b.png", "c.png"] {
        assert_eq!(image::open(out.join(name)).unwrap().dimensions(), (800, 600));
    }
}

#[test]
fn one_corrupt_file_does_not_sink_the_group() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_image(&src.path().join("g/1.png"), 100, 100, 1);
    fs::write(src.path().join("g/2.png"), b"not an image at all").unwrap();
    write_image(&src.path().join("g/3.png"), 100, 100, 3);

    let (summary, _) = run(config(src.path(), dst.path(), 100, 150));

    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failed_images.len(), 1);
    assert!(summary.failed_images[0].path.ends_with("g/2.png"));
    assert!(summary.failed_images[0].reason.starts_with("decode_error"));
    // Two 100-row images → 200 rows → two tiles of 150 and 50.
    assert_eq!(sorted_files(&dst.path().join("g")), vec!["slice_0.png", "slice_1.png"]);
}

#[test]
fn cancelling_keeps_finished_groups_and_starts_no_new_one() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_image(&src.path().join("a/1.png"), 60, 60, 1);
    write_image(&src.path().join("b/1.png"), 60, 60, 2);
    write_image(&src.path().join("c/1.png"), 60, 60, 3);

    let pipeline = Pipeline::new(config(src.path(), dst.path(), 60, 50)).unwrap();
    let state = RunState::new();
    let mut events = Vec::new();
    let summary = pipeline.run(&state, |p| {
        if p.progress_type == ProgressType::Progress {
            state.cancel();
        }
        events.push(p.clone());
    });

    assert_eq!(summary.status, RunStatus::Cancelled);
    assert_eq!(summary.groups_completed, 1);
    assert_eq!(summary.processed_images, 1);
    assert_eq!(sorted_files(&dst.path().join("a")), vec!["slice_0.png", "slice_1.png"]);
    assert!(!dst.path().join("b").exists());
    assert!(!dst.path().join("c").exists());
    assert_eq!(events.last().unwrap().progress_type, ProgressType::Cancelled);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let src = tempfile::tempdir().unwrap();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    for (i, width) in [90u32, 300, 45, 210, 120, 66].iter().enumerate() {
        write_image(
            &src.path().join(format!("book/{i:02}.png")),
            *width,
            *width / 2 + 7,
            i as u8,
        );
    }

    run(config(src.path(), first.path(), 150, 64));
    run(config(src.path(), second.path(), 150, 64));

    let names = sorted_files(&first.path().join("book"));
    assert!(!names.is_empty());
    assert_eq!(names, sorted_files(&second.path().join("book")));
    for name in names {
        let a = fs::read(first.path().join("book").join(&name)).unwrap();
        let b = fs::read(second.path().join("book").join(&name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn stacking_order_follows_file_names() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    // Written out of order; uniform colours make the strip easy to read back.
    for (name, value) in [("c.png", 30u8), ("a.png", 10), ("b.png", 20)] {
        let path = src.path().join("s").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(8, 4, Rgb([value, value, value]))
            .save(&path)
            .unwrap();
    }

    run(config(src.path(), dst.path(), 8, 100));

    let strip = image::open(dst.path().join("s/slice_0.png")).unwrap().to_rgb8();
    assert_eq!(strip.dimensions(), (8, 12));
    let rows: Vec<u8> = [1, 5, 9].iter().map(|&y| strip.get_pixel(4, y)[0]).collect();
    assert_eq!(rows, vec![10, 20, 30]);
}

#[test]
fn empty_tree_completes_at_100_percent() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::write(src.path().join("notes.txt"), b"nothing to see").unwrap();

    let (summary, events) = run(config(src.path(), dst.path(), 800, 600));

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.total_images, 0);
    assert_eq!(summary.success_count, 0);
    let last = events.last().unwrap();
    assert_eq!(last.progress_type, ProgressType::Complete);
    assert_eq!(last.progress_percentage, 100.0);
    assert_eq!(fs::read_dir(dst.path()).unwrap().count(), 0);
}

#[test]
fn tile_extension_comes_from_the_first_file_or_the_request() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::create_dir_all(src.path().join("mixed")).unwrap();
    RgbImage::from_pixel(20, 20, Rgb([1, 2, 3]))
        .save(src.path().join("mixed/a.jpg"))
        .unwrap();
    write_image(&src.path().join("mixed/b.png"), 20, 20, 5);

    run(config(src.path(), dst.path(), 20, 100));
    assert_eq!(sorted_files(&dst.path().join("mixed")), vec!["slice_0.jpg"]);

    let requested = tempfile::tempdir().unwrap();
    let mut cfg = config(src.path(), requested.path(), 20, 100);
    cfg.output_format = Some(OutputFormat::requested("webp").unwrap());
    run(cfg);
    let tile = requested.path().join("mixed/slice_0.webp");
    assert_eq!(&fs::read(&tile).unwrap()[..4], b"RIFF");
}

#[test]
fn pass_through_width_keeps_original_sizes() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_image(&src.path().join("p/1.png"), 30, 10, 1);
    write_image(&src.path().join("p/2.png"), 50, 10, 2);

    run(config(src.path(), dst.path(), 0, 1000));

    let strip = image::open(dst.path().join("p/slice_0.png")).unwrap();
    assert_eq!(strip.dimensions(), (50, 20));
}

#[test]
fn nested_directories_are_mirrored() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_image(&src.path().join("top.png"), 16, 16, 1);
    write_image(&src.path().join("x/y/z.png"), 16, 16, 2);

    let (summary, _) = run(config(src.path(), dst.path(), 16, 0));

    assert_eq!(summary.groups_completed, 2);
    let expected: Vec<PathBuf> = vec![dst.path().join("top.png"), dst.path().join("x/y/z.png")];
    assert!(expected.iter().all(|p| p.exists()));
}
