mod common;

use std::fs;

use assert_cmd::Command;
use kira_segeval::construct::ConstructionPolicy;
use kira_segeval::ctx::{Ctx, SampleOptions};
use kira_segeval::deltas::load_deltas;
use kira_segeval::labels::LabelRegistry;
use kira_segeval::metrics::gauged::score_prediction;
use kira_segeval::pipeline::stage0_scaffold::Stage0Scaffold;
use kira_segeval::pipeline::stage1_discover::Stage1Discover;
use kira_segeval::pipeline::stage2_sample::Stage2Sample;
use kira_segeval::pipeline::stage4_deltas::Stage4Deltas;
use kira_segeval::pipeline::stage5_output::Stage5Output;
use kira_segeval::pipeline::{Pipeline, Stage};
use tempfile::tempdir;

fn options(num_samples: u32) -> SampleOptions {
    SampleOptions {
        num_samples,
        threads: 1,
        ..SampleOptions::default()
    }
}

#[test]
fn sample_then_deltas_then_score() {
    let dir = tempdir().unwrap();
    let case_dir = common::write_case(dir.path(), "case_00007");
    let registry = LabelRegistry::builtin().unwrap();

    let mut ctx = Ctx::new(case_dir.clone(), registry.clone(), options(6));
    ctx.delta_threads = 2;
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(Stage0Scaffold::new()),
        Box::new(Stage1Discover::new()),
        Box::new(Stage2Sample::new()),
        Box::new(Stage4Deltas::new()),
        Box::new(Stage5Output::new()),
    ];
    Pipeline::new(stages).run(&mut ctx).unwrap();

    assert_eq!(ctx.sample_paths.len(), 6);
    assert!(ctx.output.deltas_json.exists());
    assert!(ctx.output.all_pairs_json.exists());

    let report = load_deltas(&ctx.output.deltas_json, &registry).unwrap();
    assert_eq!(report.samples.len(), 6);
    assert_eq!(report.deltas.len(), 6);
    assert_eq!(report.samples[0], "sample_0000.kvol.gz");

    let score = score_prediction(&ctx.sample_paths[0], &case_dir, &registry, None, 1).unwrap();
    assert!(score.is_some_and(|s| s.is_finite()));
}

fn sample_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(Stage0Scaffold::new()),
        Box::new(Stage1Discover::new()),
        Box::new(Stage2Sample::new()),
    ]
}

#[test]
fn skip_existing_keeps_default_samples_under_other_policy() {
    let dir = tempdir().unwrap();
    let case_dir = common::write_case(dir.path(), "case_00004");
    let registry = LabelRegistry::builtin().unwrap();

    let mut first = Ctx::new(case_dir.clone(), registry.clone(), options(2));
    Pipeline::new(sample_stages()).run(&mut first).unwrap();
    let before = fs::read(&first.sample_paths[0]).unwrap();

    let hull_options = SampleOptions {
        policy: ConstructionPolicy::ConvexHull,
        skip_existing: true,
        ..options(2)
    };
    let mut second = Ctx::new(case_dir, registry, hull_options);
    Pipeline::new(sample_stages()).run(&mut second).unwrap();

    assert_eq!(fs::read(&second.sample_paths[0]).unwrap(), before);
    assert!(second.warnings.is_empty());
}

#[test]
fn deltas_need_two_samples() {
    let dir = tempdir().unwrap();
    let case_dir = common::write_case(dir.path(), "case_00002");
    let mut ctx = Ctx::new(case_dir, LabelRegistry::builtin().unwrap(), options(1));
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(Stage0Scaffold::new()),
        Box::new(Stage1Discover::new()),
        Box::new(Stage2Sample::new()),
        Box::new(Stage4Deltas::new()),
    ];
    assert!(Pipeline::new(stages).run(&mut ctx).is_err());
}

#[test]
fn missing_case_dir_fails_scaffold() {
    let dir = tempdir().unwrap();
    let mut ctx = Ctx::new(
        dir.path().join("case_00099"),
        LabelRegistry::builtin().unwrap(),
        options(2),
    );
    let stages: Vec<Box<dyn Stage>> = vec![Box::new(Stage0Scaffold::new())];
    assert!(Pipeline::new(stages).run(&mut ctx).is_err());
}

#[test]
fn cli_sample_and_deltas_write_outputs() {
    let dir = tempdir().unwrap();
    let case_dir = common::write_case(dir.path(), "case_00003");
    let data = dir.path().to_str().unwrap();

    Command::cargo_bin("kira-segeval")
        .unwrap()
        .args(["sample", "--data", data, "--num-samples", "3", "--threads", "1"])
        .assert()
        .success();
    let samples = fs::read_dir(case_dir.join("segmentation_samples"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".kvol.gz"))
        .count();
    assert_eq!(samples, 3);

    Command::cargo_bin("kira-segeval")
        .unwrap()
        .args(["deltas", "--data", data, "--case", "case_00003", "--threads", "1"])
        .assert()
        .success();
    assert!(case_dir.join("deltas.json").exists());
}
