use nalgebra::Point3;

use vtpkit_core::{
    ClassificationZ, ErrorPolicy, EvaluationError, Error, ExtrusionCalibration, ExtrusionModel,
    PrintingParameters, ProcessingOptions,
};
use vtpkit_gcode::{parse, LayerInfo, Transformer};
use vtpkit_regions::{BoxSolid, FunctionTable, RegionTable, Solid};

fn model(eval_increment: f64) -> ExtrusionModel {
    let params = PrintingParameters {
        eval_increment,
        layer_height: 0.2,
        ..PrintingParameters::default()
    };
    ExtrusionModel::new(params, ExtrusionCalibration::None).unwrap()
}

fn single_region(functions: &str) -> RegionTable {
    let solid: Box<dyn Solid> = Box::new(
        BoxSolid::new(Point3::new(-100.0, -100.0, -10.0), Point3::new(100.0, 100.0, 50.0)).unwrap(),
    );
    RegionTable::new(vec![solid], FunctionTable::parse(functions, "test").unwrap()).unwrap()
}

fn run(lines: &[&str], regions: &RegionTable, options: ProcessingOptions) -> vtpkit_gcode::TransformReport {
    let model = model(5.0);
    Transformer::new(&model, regions, options)
        .transform(lines)
        .unwrap()
}

#[test]
fn test_end_to_end_infill_expansion() {
    let lines = [
        "; layer_height = 0.2\n",
        "G1 X0 Y0 F1200 ; travel\n",
        "G1 X10 Y0 E1 F1200 ; infill\n",
    ];
    assert_eq!(LayerInfo::scan(&lines).layer_height, Some(0.2));

    let regions = single_region("0.2 ; 6\n");
    let report = run(&lines, &regions, ProcessingOptions::default());

    assert_eq!(report.lines.len(), 4);
    assert_eq!(report.lines[0], lines[0]);
    assert_eq!(report.lines[1], lines[1]);
    assert_eq!(
        report.lines[2],
        "G1 X5.000 Y0.000 Z1.700 E1.306 F957.031 ; vtp infill\n"
    );
    assert_eq!(
        report.lines[3],
        "G1 X10.000 Y0.000 Z1.700 E1.306 F957.031 ; vtp infill\n"
    );

    let first = parse(&report.lines[2]).unwrap();
    let second = parse(&report.lines[3]).unwrap();
    assert_eq!(first.f, second.f);
    assert!((first.e.unwrap() - second.e.unwrap()).abs() < 1e-3);

    assert_eq!(report.stats.infill_lines_expanded, 1);
    assert_eq!(report.stats.generated_moves, 2);
    assert!(!report.is_degraded());
}

#[test]
fn test_region_boundary_changes_feed() {
    let left: Box<dyn Solid> =
        Box::new(BoxSolid::new(Point3::new(0.0, -5.0, -5.0), Point3::new(10.0, 5.0, 5.0)).unwrap());
    let right: Box<dyn Solid> =
        Box::new(BoxSolid::new(Point3::new(10.5, -5.0, -5.0), Point3::new(20.0, 5.0, 5.0)).unwrap());
    let regions = RegionTable::new(
        vec![left, right],
        FunctionTable::parse("0.2 ; 6\n0.4 ; 3\n", "test").unwrap(),
    )
    .unwrap();

    let report = run(&["G1 X20 Y0 E2 ; infill\n"], &regions, ProcessingOptions::default());
    let moves: Vec<_> = report.lines.iter().map(|l| parse(l).unwrap()).collect();
    assert_eq!(moves.len(), 4);

    let f_left = moves[0].f.unwrap();
    let f_right = moves[3].f.unwrap();
    assert!((f_right - 2.0 * f_left).abs() < 1e-2);
    assert!((moves[0].z.unwrap() - 1.7).abs() < 1e-3);
    assert!((moves[3].z.unwrap() - 0.5).abs() < 1e-3);
}

#[test]
fn test_travel_with_z_collapses_to_target_region() {
    let lines = [
        ";Z:0.4\n",
        "G1 Z0.6 F9000 ; travel\n",
        "G1 X5 Y5 F9000 ; travel\n",
        "G1 X10 Y5 E1 ; infill\n",
    ];
    let regions = single_region("0.2 ; 6\n");
    let report = run(&lines, &regions, ProcessingOptions::default());

    assert_eq!(report.lines[0], ";Z:0.4\n");
    assert_eq!(report.lines[1], "G1 Z2.100 F15000.000 ; vtp travel z\n");
    assert_eq!(report.lines[2], lines[2]);
    assert_eq!(report.stats.travel_moves_collapsed, 1);

    // the infill starts from the travel target
    assert_eq!(report.lines.len(), 4);
    let mv = parse(&report.lines[3]).unwrap();
    assert_eq!(mv.x, Some(10.0));
    assert!((mv.e.unwrap() - 1.306).abs() < 1e-3);
}

#[test]
fn test_travel_without_later_infill_is_untouched() {
    let lines = [
        "G1 X1 Y1 E0.1 ; infill\n",
        "G1 Z0.6   F9000 ; travel \r\n",
        "M84\n",
    ];
    let regions = single_region("0.2 ; 6\n");
    let report = run(&lines, &regions, ProcessingOptions::default());

    assert_eq!(report.lines[1], lines[1]);
    assert_eq!(report.lines[2], lines[2]);
    assert_eq!(report.stats.travel_moves_collapsed, 0);
}

#[test]
fn test_travel_target_missing_axis_is_recovered() {
    let lines = [
        "G1 Z0.6 F9000 ; travel\n",
        "G1 E1 ; infill\n",
    ];
    let regions = single_region("0.2 ; 6\n");
    let report = run(&lines, &regions, ProcessingOptions::default());

    assert_eq!(report.lines, lines);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].line_number, 1);
}

#[test]
fn test_support_pinned_to_layer_z() {
    let lines = [";Z:0.4\n", "G1 X1 Y2 E0.5 F1200 ; support\n"];
    let regions = single_region("0.2 ; 6\n");
    let report = run(&lines, &regions, ProcessingOptions::default());

    assert_eq!(
        report.lines[1],
        "G1 X1.000 Y2.000 Z0.400 E0.500 F1200.000 ; vtp support\n"
    );
}

#[test]
fn test_bare_z_and_nozzle_check_dropped() {
    let lines = [
        "G1 X0 Y0 E1 ; nozzle check\n",
        "G1 Z5 F600\n",
        "G28\n",
    ];
    let regions = single_region("0.2 ; 6\n");

    let report = run(&lines, &regions, ProcessingOptions::default());
    assert_eq!(report.lines, vec!["G28\n"]);
    assert_eq!(report.stats.nozzle_checks_dropped, 1);
    assert_eq!(report.stats.bare_z_moves_dropped, 1);

    let keep = ProcessingOptions {
        remove_nozzle_check: false,
        ..ProcessingOptions::default()
    };
    let report = run(&lines, &regions, keep);
    assert_eq!(report.lines, vec![lines[0], "G28\n"]);
}

#[test]
fn test_infill_modal_axes() {
    let lines = [
        "G1 X3 Y4 F9000 ; travel\n",
        "G1 X8 E1 ; infill\n",
        "G1 E-1 F2400 ; infill\n",
    ];
    let regions = single_region("0.2 ; 6\n");
    let report = run(&lines, &regions, ProcessingOptions::default());

    let mv = parse(&report.lines[1]).unwrap();
    assert_eq!(mv.x, Some(8.0));
    assert_eq!(mv.y, Some(4.0));
    assert_eq!(report.lines[2], lines[2]);
}

#[test]
fn test_best_effort_passes_bad_lines_through() {
    let lines = [
        "G1 Xbad Y0 ; infill\n",
        ";Z:oops\n",
        "G1 X10 Y0 E1 ; infill\n",
    ];
    let regions = single_region("0.2 ; 6\n");
    let report = run(&lines, &regions, ProcessingOptions::default());

    assert!(report.is_degraded());
    assert_eq!(report.issues.len(), 2);
    assert_eq!(report.issues[0].line_number, 1);
    assert_eq!(report.issues[1].line_number, 2);
    assert_eq!(report.lines[0], lines[0]);
    assert_eq!(report.lines[1], lines[1]);
    assert_eq!(report.stats.infill_lines_expanded, 1);
}

#[test]
fn test_zero_feed_rate_recovered_or_fatal() {
    let lines = ["G1 X10 Y0 E1 ; infill\n"];
    let regions = single_region("0 ; 6\n");

    let report = run(&lines, &regions, ProcessingOptions::default());
    assert_eq!(report.lines, lines);
    assert!(matches!(
        report.issues[0].error,
        Error::Evaluation(EvaluationError::ZeroFeedRate { region: 0 })
    ));

    let strict = ProcessingOptions {
        error_policy: ErrorPolicy::Strict,
        ..ProcessingOptions::default()
    };
    let model = model(5.0);
    let err = Transformer::new(&model, &regions, strict)
        .transform(&lines)
        .unwrap_err();
    assert!(matches!(err, Error::AtLine { line_number: 1, .. }));
    assert!(err.to_string().starts_with("line 1:"));
}

#[test]
fn test_state_starts_fresh_per_pass() {
    let lines = ["G1 X5 Y0 E1 ; infill\n"];
    let regions = single_region("0.2 ; 6\n");
    let model = model(5.0);
    let transformer = Transformer::new(&model, &regions, ProcessingOptions::default());

    let first = transformer.transform(&lines).unwrap();
    let second = transformer.transform(&lines).unwrap();
    assert_eq!(first.lines, second.lines);
}

#[test]
fn test_oversized_infill_move_is_recovered() {
    let lines = ["G1 X100000000000000000000 Y0 E1 ; infill\n", "G28\n"];
    let regions = single_region("0.2 ; 6\n");
    let report = run(&lines, &regions, ProcessingOptions::default());

    assert_eq!(report.lines, lines);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].line_number, 1);
    assert!(matches!(
        report.issues[0].error,
        Error::Evaluation(EvaluationError::TooManySegments { .. })
    ));
    assert_eq!(report.stats.infill_lines_expanded, 0);
}

fn stacked_regions() -> RegionTable {
    let lower: Box<dyn Solid> = Box::new(
        BoxSolid::new(Point3::new(-50.0, -50.0, -5.0), Point3::new(50.0, 50.0, 1.9)).unwrap(),
    );
    let upper: Box<dyn Solid> = Box::new(
        BoxSolid::new(Point3::new(-50.0, -50.0, 1.95), Point3::new(50.0, 50.0, 10.0)).unwrap(),
    );
    RegionTable::new(
        vec![lower, upper],
        FunctionTable::parse("0.2 ; 6\n0.4 ; 3\n", "test").unwrap(),
    )
    .unwrap()
}

#[test]
fn test_classification_z_selects_region_layer() {
    let lines = [";Z:2.0\n", "G1 X5 Y0 E1 ; infill\n"];
    let regions = stacked_regions();

    let current = run(&lines, &regions, ProcessingOptions::default());
    let below = run(
        &lines,
        &regions,
        ProcessingOptions {
            classification_z: ClassificationZ::BelowLayer,
            ..ProcessingOptions::default()
        },
    );

    // z = 2.0 is in the upper region, 2.0 - 0.2 in the lower one
    let upper = parse(&current.lines[1]).unwrap();
    assert!((upper.z.unwrap() - 2.5).abs() < 1e-3);
    assert!((upper.f.unwrap() - 1914.0625).abs() < 1e-3);
    assert!((upper.e.unwrap() - 0.653).abs() < 1e-3);

    let lower = parse(&below.lines[1]).unwrap();
    assert!((lower.z.unwrap() - 3.7).abs() < 1e-3);
    assert!((lower.f.unwrap() - 957.031).abs() < 1e-3);
    assert!((lower.e.unwrap() - 1.306).abs() < 1e-3);
}

#[test]
fn test_empirical_calibration_scales_extrusion() {
    let lines = ["G1 X10 Y0 E1 ; infill\n"];
    let regions = single_region("0.2 ; 6\n");
    let params = PrintingParameters {
        eval_increment: 5.0,
        layer_height: 0.2,
        ..PrintingParameters::default()
    };
    let plain_model = ExtrusionModel::new(params, ExtrusionCalibration::None).unwrap();
    let empirical_model = ExtrusionModel::new(params, ExtrusionCalibration::Empirical).unwrap();

    let plain = Transformer::new(&plain_model, &regions, ProcessingOptions::default())
        .transform(&lines)
        .unwrap();
    let empirical = Transformer::new(&empirical_model, &regions, ProcessingOptions::default())
        .transform(&lines)
        .unwrap();

    let multiplier = ExtrusionCalibration::Empirical.multiplier(params.e_dot);
    assert!(multiplier > 1.0);
    assert_eq!(plain.lines.len(), empirical.lines.len());
    for (plain_line, empirical_line) in plain.lines.iter().zip(&empirical.lines) {
        let plain_move = parse(plain_line).unwrap();
        let empirical_move = parse(empirical_line).unwrap();
        assert!((empirical_move.e.unwrap() - plain_move.e.unwrap() * multiplier).abs() < 5e-3);
        assert_eq!(empirical_move.f, plain_move.f);
        assert_eq!(empirical_move.z, plain_move.z);
    }
}
