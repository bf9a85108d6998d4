use digitpad::{snap_to_grid, GridPoint, InputTensor, PadConfig, Rasterizer, TENSOR_LEN};

fn raster() -> Rasterizer {
    Rasterizer::new(&PadConfig::default()).expect("default config is valid")
}

/// Small deterministic generator so the property runs are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn coord(&mut self) -> f64 {
        self.next_f64() * 380.0 - 50.0
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 0.01, "expected ~{}, got {}", expected, actual);
}

#[test]
fn tensor_always_has_784_values_in_unit_range() {
    let mut rng = Lcg(7);
    let mut r = raster();
    for round in 0..40 {
        match (rng.next_f64() * 4.0) as u32 {
            0 => r.begin_stroke(rng.coord(), rng.coord()),
            1 => {
                r.continue_stroke(rng.coord(), rng.coord());
            }
            2 => r.end_stroke(),
            _ if round % 7 == 0 => r.clear(),
            _ => {
                r.continue_stroke(rng.coord(), rng.coord());
            }
        }
        let t = r.extract_tensor();
        assert_eq!(t.len(), TENSOR_LEN);
        assert!(t.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn clear_yields_all_zeros() {
    let mut r = raster();
    r.begin_stroke(20.0, 20.0);
    r.continue_stroke(260.0, 200.0);
    r.continue_stroke(30.0, 250.0);
    assert!(r.extract_tensor().as_slice().iter().any(|v| *v > 0.0));

    r.clear();
    assert_eq!(r.extract_tensor(), InputTensor::zeros());
    r.clear();
    assert_eq!(r.extract_tensor(), InputTensor::zeros());
}

#[test]
fn snap_is_idempotent() {
    let mut rng = Lcg(42);
    for _ in 0..500 {
        let (x, y) = (rng.coord(), rng.coord());
        let once = snap_to_grid(x, y, 10);
        let twice = snap_to_grid(once.x as f64, once.y as f64, 10);
        assert_eq!(once, twice);
        assert_eq!(once, snap_to_grid(x, y, 10));
        assert_eq!(once.x % 10, 0);
        assert_eq!(once.y % 10, 0);
    }
}

#[test]
fn diagonal_stroke_has_no_gaps() {
    let mut r = raster();
    r.draw_stroke(Some(GridPoint { x: 0, y: 0 }), GridPoint { x: 270, y: 270 });
    let t = r.extract_tensor();
    for k in 0..28 {
        assert!(t.at(k, k) > 0.0, "gap at cell ({}, {})", k, k);
    }
    // far corners stay untouched
    assert_eq!(t.at(27, 0), 0.0);
    assert_eq!(t.at(0, 27), 0.0);
}

#[test]
fn sparse_horizontal_moves_draw_a_continuous_line() {
    let mut r = raster();
    r.begin_stroke(5.0, 135.0);
    r.continue_stroke(275.0, 135.0);
    let t = r.extract_tensor();
    for gx in 0..27 {
        assert!(t.at(gx, 13) > 0.9, "cell ({}, 13) = {}", gx, t.at(gx, 13));
    }
    // the segment stops short of its end point; the next move starts there
    assert_close(t.at(27, 13), 0.7);

    r.continue_stroke(276.0, 138.0);
    assert_close(r.extract_tensor().at(27, 13), 1.0);
}

#[test]
fn isolated_click_splat_shape() {
    let mut r = raster();
    r.draw_stroke(None, GridPoint { x: 100, y: 100 });
    let t = r.extract_tensor();

    assert_close(t.at(10, 10), 1.0);
    for (gx, gy) in [(9, 10), (11, 10), (10, 9), (10, 11)] {
        assert_close(t.at(gx, gy), 0.7);
    }
    for (gx, gy) in [(9, 9), (11, 9), (9, 11), (11, 11)] {
        assert_close(t.at(gx, gy), 0.3);
    }
    let painted = t.as_slice().iter().filter(|v| **v > 0.0).count();
    assert_eq!(painted, 9);
}

#[test]
fn splats_at_the_edge_are_clipped() {
    let mut r = raster();
    r.begin_stroke(0.0, 0.0);
    let t = r.extract_tensor();
    assert_close(t.at(0, 0), 1.0);
    assert_close(t.at(1, 0), 0.7);
    assert_close(t.at(0, 1), 0.7);
    assert_close(t.at(1, 1), 0.3);
    assert_eq!(t.as_slice().iter().filter(|v| **v > 0.0).count(), 4);

    let mut r = raster();
    r.begin_stroke(279.9, 279.9);
    let t = r.extract_tensor();
    assert_close(t.at(27, 27), 1.0);
    assert_close(t.at(26, 26), 0.3);
}

#[test]
fn points_off_the_surface_only_paint_what_lands_on_it() {
    let mut r = raster();
    // snaps to (-10, -10): only its bottom-right diagonal is on the surface
    r.begin_stroke(-3.0, -3.0);
    let t = r.extract_tensor();
    assert_close(t.at(0, 0), 0.3);
    assert_eq!(t.as_slice().iter().filter(|v| **v > 0.0).count(), 1);

    let mut r = raster();
    r.begin_stroke(1000.0, 1000.0);
    assert_eq!(r.extract_tensor(), InputTensor::zeros());
}

#[test]
fn overlapping_splats_reinforce_the_core() {
    let mut r = raster();
    r.begin_stroke(100.0, 100.0);
    r.continue_stroke(110.0, 100.0);
    r.continue_stroke(120.0, 100.0);
    let t = r.extract_tensor();
    // center of an earlier step later covered by a neighbor splat stays full
    assert_close(t.at(10, 10), 1.0);
    assert_close(t.at(11, 10), 1.0);
    // an orthogonal neighbor painted again accumulates past 70%
    assert!(t.at(10, 9) > 0.75);
}
