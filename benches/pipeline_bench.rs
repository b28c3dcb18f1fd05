use criterion::{criterion_group, criterion_main, Criterion};
use visitenkarte::rendering::layout::{layout_back, layout_front, CardTemplate};
use visitenkarte::rendering::{Background, Rasterizer, RenderOptions, SoftwareRasterizer};
use visitenkarte::{vcard, ContactRecord};

fn record() -> ContactRecord {
    let mut r = ContactRecord::new();
    r.first_name = "Anna".into();
    r.last_name = "Muster".into();
    r.position = "Rezeption".into();
    r.phone = "+49 1 2".into();
    r.email = "a@x.de".into();
    r
}

fn bench_vcard(c: &mut Criterion) {
    let r = record();
    c.bench_function("vcard_encode", |b| b.iter(|| vcard::encode(&r)));
}

fn bench_rasterize(c: &mut Criterion) {
    let r = record();
    let raster = SoftwareRasterizer::new();
    let front = layout_front(&r, CardTemplate::Classic, None).expect("front layout");
    let back = layout_back(&r, 100);

    c.bench_function("rasterize_front_x5", |b| {
        let opts = RenderOptions { scale: 5.0, background: Background::Transparent };
        b.iter(|| raster.render(&front, &opts).unwrap())
    });
    c.bench_function("rasterize_back_x3", |b| {
        let opts = RenderOptions { scale: 3.0, background: Background::White };
        b.iter(|| raster.render(&back, &opts).unwrap())
    });
}

criterion_group!(benches, bench_vcard, bench_rasterize);
criterion_main!(benches);
