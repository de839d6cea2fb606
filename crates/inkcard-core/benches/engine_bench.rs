//! # Engine Benchmarks
//!
//! Performance benchmarks for resolution, print layout and contact export.
//!
//! Run with: `cargo bench -p inkcard-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use inkcard_core::{
    BusinessCard, CustomTheme, Element, ElementId, FieldKey, Geometry, PaperCardSettings,
    Template, ThemeColors, compute_print_layout, format_contact, resolve,
};
use std::hint::black_box;

/// A template with `size` text elements cycling through common fields.
fn create_template(size: usize) -> Template {
    const FIELDS: [FieldKey; 4] = [
        FieldKey::Name,
        FieldKey::JobTitle,
        FieldKey::Company,
        FieldKey::Phone,
    ];
    let mut template = Template::new("bench");
    for i in 0..size {
        let y = (i % 50) as f64;
        template.elements.push(
            Element::text(format!("e{i}"), Geometry::new(5.0, y, 40.0, 4.0))
                .bound_to(FIELDS[i % FIELDS.len()]),
        );
    }
    template
}

fn create_card(size: usize) -> BusinessCard {
    let mut card = BusinessCard::new("bench-card", "owner", "Anan Srisuk").with_template("bench");
    card.job_title = Some("CTO".into());
    card.company = Some("Acme".into());
    card.phone = Some("+66 2 123 4567".into());
    for i in (0..size).step_by(3) {
        card.field_values
            .insert(ElementId::new(format!("e{i}")), format!("override {i}"));
    }
    card.custom_theme = Some(CustomTheme {
        colors: ThemeColors {
            text: Some("#222222".into()),
            ..ThemeColors::default()
        },
        ..CustomTheme::default()
    });
    card
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for size in [10, 100, 500].iter() {
        let template = create_template(*size);
        let card = create_card(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(resolve(&template, &card)));
        });
    }

    group.finish();
}

fn bench_print_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("print_layout");
    let settings = PaperCardSettings {
        bleed: 3.0,
        safe_area: 3.0,
        ..PaperCardSettings::default()
    };

    for size in [10, 100, 500].iter() {
        let tree = resolve(&create_template(*size), &create_card(*size))
            .ok()
            .and_then(|r| r.into_tree())
            .expect("bench template resolves");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(compute_print_layout(&tree, Some(&settings))));
        });
    }

    group.finish();
}

fn bench_contact(c: &mut Criterion) {
    let card = create_card(0);
    c.bench_function("format_contact", |b| {
        b.iter(|| black_box(format_contact(&card)));
    });
}

criterion_group!(benches, bench_resolve, bench_print_layout, bench_contact);
criterion_main!(benches);
