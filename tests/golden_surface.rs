use std::fs;
use std::path::PathBuf;

use digitpad::{DrawingPad, InputEvent, PadConfig, UniformModel};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

/// A seven: top bar, then a diagonal down to the bottom left.
fn seven() -> Vec<InputEvent> {
    let raw = fs::read_to_string("tests/goldens/strokes/seven.json").expect("read fixture");
    serde_json::from_str(&raw).expect("parse fixture")
}

fn draw(events: &[InputEvent]) -> DrawingPad<UniformModel> {
    let mut pad = DrawingPad::new(PadConfig::default(), UniformModel::new()).unwrap();
    for e in events {
        pad.handle(*e);
    }
    pad
}

#[test]
fn surface_digest_is_deterministic() {
    let events = seven();
    assert_eq!(draw(&events).surface().digest(), draw(&events).surface().digest());
}

#[test]
fn golden_surface_matches_fixture() {
    let digest = draw(&seven()).surface().digest();

    let expected_path = golden_path("seven.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    let exp = fs::read_to_string(&expected_path).unwrap_or_else(|_| {
        panic!(
            "no golden at {:?}; run with UPDATE_GOLDENS=1 to create it",
            expected_path
        )
    });
    assert_eq!(digest, exp.trim());
}
