use std::path::PathBuf;

use speedramp_processing_core::{
    project_events, rewrite_overlay_script, score_track, sequence_sounds, svg_spans,
    telemetry_tracks, RetimePlan,
};
use speedramp_project_model::{parse_script, MediaInfo, MediaTable, ParseOptions, Script};

const DEFAULT_SPEED: f64 = 1.0 / 3.0;

fn load_fixture() -> (Script, MediaTable) {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-script")
        .join("edit.txt");

    let content = std::fs::read_to_string(path).expect("fixture script should be readable");
    let script = parse_script(&content, &ParseOptions::default()).expect("fixture should parse");

    let mut media = script.media_table();
    media.record_probe("ride-1.mp4", MediaInfo::with_duration(60.0));
    media.record_probe("ride-2.mp4", MediaInfo::with_duration(30.0));
    media.record_probe("bang.wav", MediaInfo::with_duration(1.0));
    assert!(media.pending_probes().is_empty());

    (script, media)
}

fn plan(script: &Script, media: &MediaTable) -> RetimePlan {
    RetimePlan::build(script, media, DEFAULT_SPEED).expect("fixture should plan")
}

#[test]
fn sample_script_segments_are_stable() {
    let (script, media) = load_fixture();
    let plan = plan(&script, &media);

    let signature = plan
        .map
        .segments()
        .iter()
        .map(|seg| {
            format!(
                "{:.3}|{:.3}|{:.3}|{:.6}",
                seg.input_start_secs, seg.output_start_secs, seg.length_secs, seg.speed
            )
        })
        .collect::<Vec<_>>();

    assert_eq!(
        signature,
        vec![
            "0.000|0.000|5.000|0.333333",
            "5.000|1.667|6.000|1.000000",
            "11.000|7.667|21.000|0.333333",
            "32.000|14.667|4.000|0.250000",
            "36.000|15.667|24.000|0.333333",
        ]
    );
    assert!((plan.total_output_secs() - 23.666_666).abs() < 1e-5);
}

#[test]
fn sample_script_overlays_land_on_expected_frames() {
    let (script, media) = load_fixture();
    let plan = plan(&script, &media);

    let scores = score_track(&script, &plan).unwrap();
    let scores: Vec<(i64, i64)> = scores.keyframes().iter().map(|k| (k.frame, k.value)).collect();
    assert_eq!(scores, vec![(80, 1), (610, 0), (710, 0)]);

    let svgs = svg_spans(&script, &plan).unwrap();
    assert_eq!(svgs.len(), 1);
    assert_eq!((svgs[0].start_frame, svgs[0].end_frame), (170, 230));

    let raw = rewrite_overlay_script(&script.clips[0], &plan).unwrap();
    assert!(raw.contains("key_frame 110 { x 10 }"), "{raw}");
    assert!(raw.contains("key_frame 170 { x 20 }"), "{raw}");
}

#[test]
fn sample_script_sound_and_telemetry() {
    let (script, media) = load_fixture();
    let plan = plan(&script, &media);

    let sounds = sequence_sounds(&script, &plan, &media).unwrap();
    let placements = sounds.placements();
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].file, "bang.wav");
    assert!((placements[0].position_secs - 11.0 / 3.0).abs() < 1e-9);

    let tracks = telemetry_tracks(&script, &plan, &media).unwrap();
    assert_eq!(tracks.len(), 2);

    let first: Vec<(i64, i64, f64)> = tracks[0]
        .keyframes
        .keyframes()
        .iter()
        .map(|k| (k.frame, k.value.fps, k.value.timestamp))
        .collect();
    assert_eq!(
        first,
        vec![
            (0, 10, 1_654_077_605.0),
            (50, 30, 1_654_077_610.0),
            (230, 10, 1_654_077_616.0),
            (420, 10, 1_654_077_635.0),
        ]
    );

    let second_start = tracks[1].keyframes.keyframes()[0].value.timestamp;
    assert_eq!(second_start, 1_654_077_660.0);
}

#[test]
fn boundary_events_use_segment_starting_there() {
    let (script, media) = load_fixture();
    let plan = plan(&script, &media);

    // ride-1.mp4 at 10 s is where the slow section begins on the input timeline.
    let boundary = plan.timeline.to_input("ride-1.mp4", 10.0).unwrap();
    assert_eq!(boundary, 5.0);
    assert_eq!(plan.map.speed_at(boundary).unwrap(), 1.0);

    let track = project_events(&plan.map, vec![(boundary, "slow")]).unwrap();
    assert_eq!(track.keyframes()[0].frame, 50);
}
