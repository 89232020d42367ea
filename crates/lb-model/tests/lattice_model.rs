use lb_core::{Tolerances, Value, nearly_equal};
use lb_engine::{EngineError, LATTICE_CALC_OFF, LATTICE_CALC_ON, MockEngine, SetElement};
use lb_model::{Facility, LatticeModel, ModelError, StationStatus, build_model, load_config};
use std::path::PathBuf;

const QE01: &str = "QUAD:IN20:511:BCTRL";
const QE02: &str = "QUAD:IN20:525:BCTRL";
const QM01: &str = "QUAD:LI21:201:BCTRL";
const K21_1_TCTL: &str = "KLYS:LI21:11:BEAMCODE1_TCTL";
const K21_3_TCTL: &str = "KLYS:LI21:31:BEAMCODE1_TCTL";
const K21_3_STAT: &str = "KLYS:LI21:31:BEAMCODE1_STAT";

fn demo_config() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("demos/cu_hxr/model.yaml")
}

fn demo_engine() -> MockEngine {
    MockEngine::builder()
        .marker("BEGINNING")
        .element("QE01", 0.108, 2.0)
        .element("QE02", 0.108, -1.5)
        .klystron("K21_1", 220.0, 10.0, true)
        .klystron("K21_2", 210.0, 0.0, true)
        .klystron("K21_3", 200.0, 0.0, true)
        .element("QM01", 0.2, 0.5)
        .marker("END")
        .build()
}

fn demo_model() -> LatticeModel<MockEngine> {
    let config = load_config(&demo_config()).unwrap_or_else(|e| panic!("demo config: {e}"));
    build_model(&config, demo_engine()).unwrap_or_else(|e| panic!("demo model: {e}"))
}

/// `set ele` commands in the engine history.
fn set_commands(model: &LatticeModel<MockEngine>) -> Vec<String> {
    model
        .engine()
        .history()
        .iter()
        .filter(|c| SetElement::parse(c).is_some())
        .cloned()
        .collect()
}

#[test]
fn demo_model_initializes_every_variable() {
    let model = demo_model();
    assert_eq!(model.transformer().facility(), Facility::Slac);
    assert_eq!(model.beam_path(), "cu_hxr");
    assert_eq!(model.supported_variables().len(), 35);

    for name in model.control_variables().keys() {
        assert!(model.state().contains_key(name), "{name} not initialized");
    }
    for name in model.output_variables().keys() {
        assert!(model.state().contains_key(name), "{name} not initialized");
    }
    assert_eq!(model.state().len(), 35);

    let bdes = model.get_scalar(QE01).unwrap();
    assert!(nearly_equal(bdes, 2.0 * 0.108 * 10.0, Tolerances::default()));
    assert_eq!(model.get_scalar(K21_1_TCTL).unwrap(), 1.0);
}

#[test]
fn magnet_setpoint_scenario() {
    let mut model = demo_model();
    model.engine_mut().clear_history();

    model.set([(QE01, 0.5)]).unwrap();

    let sets = set_commands(&model);
    assert_eq!(sets.len(), 1);
    let set = SetElement::parse(&sets[0]).unwrap();
    assert_eq!(set.element, "QE01");
    assert_eq!(set.attribute, "b1_gradient");
    let value: f64 = set.value.parse().unwrap();
    assert_eq!(value, 0.5 / (0.108 * 10.0));

    let history = model.engine().history();
    assert_eq!(history[0], LATTICE_CALC_OFF);
    assert!(history.iter().any(|c| c == LATTICE_CALC_ON));

    let got = model.get(&[QE01]).unwrap();
    let bdes = got[QE01].as_scalar().unwrap();
    assert!(nearly_equal(bdes, 0.5, Tolerances::default()));
}

#[test]
fn set_is_idempotent() {
    let mut model = demo_model();
    let values = [(QE01, 0.25), (QE02, -0.75), (QM01, 3.0)];

    model.set(values).unwrap();
    let first = model.state().clone();
    model.set(values).unwrap();
    assert_eq!(model.state(), &first);
}

#[test]
fn outputs_follow_the_lattice() {
    let mut model = demo_model();
    let beta = model.get_scalar("END_a_beta_").unwrap();
    let energy = model.get_scalar("END_e_tot_").unwrap();

    model.set([(QM01, -4.0)]).unwrap();
    assert_ne!(model.get_scalar("END_a_beta_").unwrap(), beta);

    model.set([(K21_1_TCTL, 0.0)]).unwrap();
    assert!(model.get_scalar("END_e_tot_").unwrap() < energy);
}

#[test]
fn reset_restores_initial_controls() {
    let mut model = demo_model();
    let initial = model.initial_state().clone();
    // reset re-applies K21_3's in_use, which goes through the status override
    model.set_station_status(StationStatus::from([(K21_3_STAT.to_string(), 1.0)]));

    model
        .set([(QE01, -3.0), (QM01, 1.0), ("KLYS:LI21:21:PDES", 45.0)])
        .unwrap();
    assert!(!nearly_equal(
        model.get_scalar(QE01).unwrap(),
        initial[QE01].as_scalar().unwrap(),
        Tolerances::default()
    ));

    model.reset().unwrap();

    let names: Vec<&str> = model.control_variables().keys().map(String::as_str).collect();
    let controls = model.get(names.as_slice()).unwrap();
    for (name, value) in &controls {
        let expected = initial[name].as_scalar().unwrap();
        let actual = value.as_scalar().unwrap();
        assert!(
            nearly_equal(actual, expected, Tolerances::default()),
            "{name}: {actual} != {expected}"
        );
    }
}

#[test]
fn reset_without_status_flags_leaves_cache_unchanged() {
    let mut model = demo_model();
    model.set([(QE01, -3.0)]).unwrap();
    let before = model.state().clone();

    let err = model.reset().unwrap_err();

    assert!(matches!(err, ModelError::StatusFlagMissing { ref pv } if pv == K21_3_STAT));
    assert_eq!(model.state(), &before);
    let bdes = model.get_scalar(QE01).unwrap();
    assert!(nearly_equal(bdes, -3.0, Tolerances::default()));
}

#[test]
fn unknown_variable_is_a_lookup_error() {
    let model = demo_model();
    let err = model.get(&["UNKNOWN_VAR"]).unwrap_err();
    assert!(matches!(err, ModelError::UnknownVariable { .. }));
}

#[test]
fn rejected_command_leaves_cache_unchanged() {
    let mut model = demo_model();
    let before = model.state().clone();
    model.engine_mut().reject_containing("set ele QE02");

    let err = model.set([(QE01, 1.0), (QE02, 1.0)]).unwrap_err();

    assert!(matches!(
        err,
        ModelError::Engine(EngineError::Rejected { .. })
    ));
    assert_eq!(model.state(), &before);
    assert!(model.engine().lattice_calc_on());
}

#[test]
fn rf_commands_precede_magnets_with_status_override() {
    let mut model = demo_model();
    model.set_station_status(StationStatus::from([(K21_3_STAT.to_string(), 0.0)]));
    model.engine_mut().clear_history();

    model
        .set([(QE01, 1.0), (K21_3_TCTL, 1.0), (K21_1_TCTL, 1.0)])
        .unwrap();

    let sets = set_commands(&model);
    assert_eq!(sets.len(), 3);
    // K21_3 takes its status flag; K21_1 is always enabled
    assert_eq!(sets[0], "set ele K21_3 in_use = 0");
    assert_eq!(sets[1], "set ele K21_1 in_use = 1");
    assert!(sets[2].starts_with("set ele QE01 b1_gradient = "));

    assert_eq!(model.get_scalar(K21_3_TCTL).unwrap(), 0.0);
}

#[test]
fn missing_status_flag_fails_before_evaluation() {
    let mut model = demo_model();
    let before = model.state().clone();
    model.engine_mut().clear_history();

    let err = model.set([(K21_3_TCTL, 1.0)]).unwrap_err();

    assert!(matches!(err, ModelError::StatusFlagMissing { ref pv } if pv == K21_3_STAT));
    assert!(model.engine().history().is_empty());
    assert_eq!(model.state(), &before);
}

#[test]
fn rf_ranges_are_enforced() {
    let mut model = demo_model();
    let err = model.set([("KLYS:LI21:11:ADES", 600.0)]).unwrap_err();
    assert!(matches!(err, ModelError::OutOfRange { .. }));
    let err = model.set([(K21_1_TCTL, 2.0)]).unwrap_err();
    assert!(matches!(err, ModelError::OutOfRange { .. }));
}

#[test]
fn array_outputs_are_cached_whole() {
    let model = demo_model();
    let values = model.get(&["QE02_mat6_", "END_vec0_"]).unwrap();
    assert!(matches!(&values["QE02_mat6_"], Value::Array(v) if v.len() == 36));
    assert!(matches!(&values["END_vec0_"], Value::Array(v) if v.len() == 6));
}
