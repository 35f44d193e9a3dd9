use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use stemhint::{
    hint_glyph, hint_glyphs, AlignmentZone, FdDict, GlyphTask, HintOptions, Path, PathBuilder,
};

fn fd() -> FdDict {
    FdDict {
        zones: vec![
            AlignmentZone::bottom(-15.0, 0.0),
            AlignmentZone::top(500.0, 515.0),
            AlignmentZone::top(700.0, 715.0),
        ],
        h_stems: vec![70.0],
        v_stems: vec![85.0],
        ..Default::default()
    }
}

/// An 'o' with an overshooting outer contour and a counter.
fn letter_o() -> Path {
    let mut builder = PathBuilder::new();
    builder.move_to((250.0, -10.0));
    builder.curve_to((390.0, -10.0), (470.0, 100.0), (470.0, 250.0));
    builder.curve_to((470.0, 400.0), (390.0, 510.0), (250.0, 510.0));
    builder.curve_to((110.0, 510.0), (30.0, 400.0), (30.0, 250.0));
    builder.curve_to((30.0, 100.0), (110.0, -10.0), (250.0, -10.0));
    builder.close();
    builder.move_to((250.0, 60.0));
    builder.curve_to((160.0, 60.0), (115.0, 140.0), (115.0, 250.0));
    builder.curve_to((115.0, 360.0), (160.0, 440.0), (250.0, 440.0));
    builder.curve_to((340.0, 440.0), (385.0, 360.0), (385.0, 250.0));
    builder.curve_to((385.0, 140.0), (340.0, 60.0), (250.0, 60.0));
    builder.close();
    builder.finish()
}

/// A slab 'E' with a crossbar that overlaps the serifs' stems.
fn letter_e() -> Path {
    let mut builder = PathBuilder::new();
    builder.move_to((0.0, 0.0));
    for p in [
        (450.0, 0.0),
        (450.0, 70.0),
        (85.0, 70.0),
        (85.0, 320.0),
        (380.0, 320.0),
        (380.0, 390.0),
        (85.0, 390.0),
        (85.0, 630.0),
        (440.0, 630.0),
        (440.0, 700.0),
        (0.0, 700.0),
    ] {
        builder.line_to(p);
    }
    builder.close();
    builder.finish()
}

fn hint(c: &mut Criterion) {
    let fd = fd();
    let options = HintOptions::default();
    for (name, path) in [("o", letter_o()), ("E", letter_e())] {
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut path = path.clone();
                let _ = hint_glyph(name, &mut path, &fd, &options);
            })
        });
    }
    let fd = Arc::new(fd);
    let tasks = (0..256)
        .map(|ix| {
            let path = if ix % 2 == 0 { letter_o() } else { letter_e() };
            GlyphTask::new(format!("glyph{ix}"), path, fd.clone())
        })
        .collect::<Vec<_>>();
    c.bench_function("pool", |b| {
        b.iter(|| hint_glyphs(tasks.clone(), &options, None))
    });
}

criterion_group!(benches, hint);
criterion_main!(benches);
