//! Selector Operations Benchmarks
//!
//! Benchmarks for fallback-chain parsing, placeholder binding and registry
//! construction.
//!
//! Run with: `cargo bench --bench selector_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shopcheck::pages::registries;
use shopcheck::{split_fallbacks, CheckoutLayout, Selector, SelectorOverrides, SelectorSpec};

fn bench_selector_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_parsing");

    let selectors = vec![
        ("css_id", "#BillingNewAddress_FirstName"),
        ("css_attribute", r#"input[name="quantity"]"#),
        ("has_text", r#"button:has-text("Add to cart")"#),
        ("has_text_descendant", r#"h4:has-text("iPhone 6s") a"#),
        ("text", "text=There are no items in this cart"),
        ("role_named", r#"role=button[name="Log in"]"#),
        ("xpath", "xpath=//div[@class='cart']//tr"),
    ];

    for (name, selector) in selectors {
        group.bench_with_input(BenchmarkId::from_parameter(name), &selector, |bench, sel| {
            bench.iter(|| {
                let parsed = Selector::parse(black_box(sel)).unwrap();
                black_box(parsed);
            });
        });
    }

    group.finish();
}

fn bench_fallback_chains(c: &mut Criterion) {
    let mut group = c.benchmark_group("fallback_chains");

    let chains = vec![
        ("one", ".btn-add-cart"),
        (
            "three",
            r#".btn-add-cart, .add-to-cart, button:has-text("Add to cart")"#,
        ),
        (
            "commas_in_text",
            r#"a:has-text("Shipping, billing"), .checkout-link, text=Checkout, [data-testid="go"]"#,
        ),
    ];

    for (name, chain) in chains {
        group.bench_with_input(BenchmarkId::new("split", name), &chain, |bench, raw| {
            bench.iter(|| black_box(split_fallbacks(black_box(raw))));
        });
        group.bench_with_input(BenchmarkId::new("spec", name), &chain, |bench, raw| {
            bench.iter(|| {
                let spec = SelectorSpec::parse("element", black_box(raw)).unwrap();
                black_box(spec);
            });
        });
    }

    group.finish();
}

fn bench_bind(c: &mut Criterion) {
    let spec = SelectorSpec::parse(
        "row_for",
        r#"tbody tr:has-text("{name}"), .cart-item:has-text("{name}")"#,
    )
    .unwrap();

    c.bench_function("bind_placeholder", |bench| {
        bench.iter(|| black_box(spec.bind(black_box("Samsung Galaxy A5"))));
    });
}

fn bench_registry_build(c: &mut Criterion) {
    let overrides = SelectorOverrides::default();

    c.bench_function("build_all_registries", |bench| {
        bench.iter(|| {
            let built = registries(black_box(CheckoutLayout::MultiStep), &overrides).unwrap();
            black_box(built);
        });
    });
}

criterion_group!(
    benches,
    bench_selector_parsing,
    bench_fallback_chains,
    bench_bind,
    bench_registry_build
);
criterion_main!(benches);
