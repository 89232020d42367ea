#![cfg(unix)]

use lb_core::Value;
use lb_engine::{Engine, EngineError, TaoOptions, TaoProcess, evaluate};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

/// Minimal stand-in for Tao: prints a prompt and answers a few queries.
const FAKE_TAO: &str = r#"#!/bin/sh
printf 'Tao> '
while IFS= read -r line; do
  case "$line" in
    quit) exit 0 ;;
    "python ele:gen_attribs Q1")
      printf 'L;REAL;F;   1.0800000000000000E-01\n'
      printf 'B1_GRADIENT;REAL;T;   2.0D+00\nIS_ON;LOGIC;T;T\n' ;;
    "python lat_list *|model ele.name") printf 'BEGINNING;F;END\n' ;;
    "python lat_list *|model ele.s") printf '0.0;0.108;0.108\n' ;;
    "python lat_list *|model ele.vec0") printf '0;0;0;0;0;0\n0;0;0;0;0;0\n1;0;0;0;0;0\n' ;;
    "set ele NOPE"*) printf '[ERROR | tao_set_elements]\n    No elements match: NOPE\n' ;;
    *) ;;
  esac
  printf 'Tao> '
done
"#;

fn fake_tao() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lb_engine_fake_tao_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tao");
    std::fs::write(&path, FAKE_TAO).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn drives_a_tao_process() {
    let mut options = TaoOptions::new("lattice/tao.init");
    options.executable = fake_tao();
    let mut tao = TaoProcess::spawn(&options).unwrap_or_else(|e| panic!("spawn failed: {e}"));

    let attrs = tao.ele_gen_attribs("Q1").unwrap();
    assert_eq!(attrs.scalar("L").unwrap(), 0.108);
    assert_eq!(attrs.scalar("b1_gradient").unwrap(), 2.0);
    assert_eq!(attrs.scalar("is_on").unwrap(), 1.0);

    // an element named F is a name, not a logical
    let names = tao.lat_list("*", "ele.name").unwrap();
    assert_eq!(names[1], Value::Text("F".into()));
    let s = tao.lat_list("*", "ele.s").unwrap();
    assert_eq!(s, vec![Value::Scalar(0.0), Value::Scalar(0.108), Value::Scalar(0.108)]);
    let vec0 = tao.lat_list("*", "ele.vec0").unwrap();
    assert_eq!(vec0.len(), 3);
    assert_eq!(vec0[2], Value::Array(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]));

    assert!(tao.cmd("set ele Q1 b1_gradient = 1").unwrap().is_empty());

    let err = evaluate(
        &mut tao,
        &["set ele Q1 b1_gradient = 1".to_string(), "set ele NOPE k1 = 1".to_string()],
    )
    .unwrap_err();
    match err {
        EngineError::Rejected { command, message } => {
            assert_eq!(command, "set ele NOPE k1 = 1");
            assert!(message.contains("tao_set_elements"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }

    // the process is still usable after a rejection
    assert_eq!(tao.lat_list("*", "ele.name").unwrap().len(), 3);
}
