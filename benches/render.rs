// Benchmarks for AsciiDoc rendering.

use criterion::{criterion_group, criterion_main, Criterion};
use markdown2asciidoc::tree::Node;
use markdown2asciidoc::{render, render_with, Options};

fn sample_document() -> Node {
    let mut children = vec![Node::heading(1, vec![Node::text("Benchmark Document")])];
    for section in 0..10 {
        children.push(Node::heading(2, vec![Node::text(format!("Section {section}"))]));
        children.push(Node::paragraph(vec![
            Node::text("Some body text with a "),
            Node::CodeSpan(markdown2asciidoc::tree::CodeSpan { value: "code span".to_string() }),
            Node::text(" and more prose that runs on. It has two sentences."),
        ]));
        children.push(Node::UnorderedList(markdown2asciidoc::tree::UnorderedList {
            children: vec![
                Node::list_item_text("first"),
                Node::list_item_text("second"),
                Node::list_item_text("third"),
            ],
        }));
    }
    Node::root(children)
}

fn bench_simple(c: &mut Criterion) {
    let doc = Node::root(vec![
        Node::heading(1, vec![Node::text("Hello")]),
        Node::paragraph(vec![Node::text("This is a simple document.")]),
    ]);
    c.bench_function("simple_document", |b| {
        b.iter(|| render(&doc));
    });
}

fn bench_sections(c: &mut Criterion) {
    let doc = sample_document();
    let options = Options::new().with_auto_ids(true);
    c.bench_function("sectioned_document_auto_ids", |b| {
        b.iter(|| render_with(&doc, &options).unwrap());
    });
}

criterion_group!(benches, bench_simple, bench_sections);
criterion_main!(benches);
