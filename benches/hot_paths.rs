use std::collections::BTreeSet;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use popbuilder::data::demo::DemoDataset;
use popbuilder::geo::Rect;
use popbuilder::map::{MapRenderer, Viewport};
use popbuilder::state::ViewState;

const LON: f64 = -0.1251731;
const LAT: f64 = 51.4997766;

fn loaded_state(demo: &DemoDataset, codes: BTreeSet<String>) -> ViewState {
    let mut state = ViewState::new();
    for code in state.show_districts(codes) {
        if let Some(layer) = demo.district(&code) {
            state.district_loaded(layer);
        }
    }
    state
}

fn boundary_search(c: &mut Criterion) {
    let demo = DemoDataset::around(LON, LAT);
    let index = demo.boundary_index();
    let screen = Rect::from_corners((LON - 0.04, LAT - 0.015), (LON + 0.04, LAT + 0.015));
    let everything = Rect::from_corners((-1.0, 50.0), (1.0, 53.0));

    c.bench_function("districts_intersecting/screen", |b| {
        b.iter(|| index.districts_intersecting(black_box(&screen)))
    });
    c.bench_function("districts_intersecting/all", |b| {
        b.iter(|| index.districts_intersecting(black_box(&everything)))
    });
}

fn zone_hit_test(c: &mut Criterion) {
    let demo = DemoDataset::around(LON, LAT);
    let index = demo.boundary_index();
    let all = index.districts_intersecting(&Rect::from_corners((-1.0, 50.0), (1.0, 53.0)));
    let state = loaded_state(&demo, all);

    c.bench_function("zone_at/center", |b| {
        b.iter(|| state.zone_at(black_box(LON), black_box(LAT)))
    });
    c.bench_function("zone_at/miss", |b| {
        b.iter(|| state.zone_at(black_box(10.0), black_box(10.0)))
    });
}

fn render_districts(c: &mut Criterion) {
    let demo = DemoDataset::around(LON, LAT);
    let index = demo.boundary_index();
    let viewport = Viewport::new(LON, LAT, 14, 400, 200);
    let state = loaded_state(&demo, index.districts_intersecting(&viewport.bounds()));
    let renderer = MapRenderer::new();

    c.bench_function("render/z14", |b| {
        b.iter(|| renderer.render(&index, &state, black_box(&viewport), 200, 50))
    });
}

criterion_group!(benches, boundary_search, zone_hit_test, render_districts);
criterion_main!(benches);
