use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use reqparse::{from_xml_str, XmlParser};

const SIMPLE_XML: &str = "<xml><status>123</status><message>hello world</message></xml>";
const ATTR_XML: &str = "<xml name=\"root\" xmlns:ns=\"data:namespace\"><ns:item id=\"1\">a</ns:item><ns:item id=\"2\">b</ns:item></xml>";

fn repeated_xml(count: usize) -> String {
    let items: String = (0..count)
        .map(|i| format!("<Book id=\"{i}\"><Author id=\"18\">Author</Author><Title>Book {i}</Title></Book>"))
        .collect();
    format!("<Books>{items}</Books>")
}

fn bench_simple(c: &mut Criterion) {
    c.bench_function("normalize_simple", |b| {
        b.iter(|| from_xml_str(black_box(SIMPLE_XML)))
    });
}

fn bench_attr(c: &mut Criterion) {
    c.bench_function("normalize_attr_namespaced", |b| {
        b.iter(|| from_xml_str(black_box(ATTR_XML)))
    });
}

fn bench_siblings(c: &mut Criterion) {
    let input = repeated_xml(500);
    c.bench_function("parse_only_500_siblings", |b| {
        b.iter(|| XmlParser::new(black_box(input.as_bytes())).parse())
    });
    c.bench_function("normalize_500_siblings", |b| {
        b.iter(|| from_xml_str(black_box(&input)))
    });
}

criterion_group!(benches, bench_simple, bench_attr, bench_siblings);
criterion_main!(benches);
