use anticipate_path::Path;
use anticipate_vdom::{index_path_of, reconcile, VNode};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn table(rows: usize, highlight: usize) -> VNode {
    let root = Path::root();
    let body = root.child(0).unwrap();
    let mut tbody = VNode::element(body.clone(), "tbody");
    for i in 0..rows {
        let row = body.child(i).unwrap();
        let mut tr = VNode::element(row.clone(), "tr");
        if i == highlight {
            tr = tr.with_attr("class", "selected");
        }
        for col in 0..4 {
            let cell = row.child(col).unwrap();
            tr = tr.with_child(
                VNode::element(cell.clone(), "td")
                    .with_child(VNode::text(cell.child(0).unwrap(), format!("r{}c{}", i, col))),
            );
        }
        tbody = tbody.with_child(tr);
    }
    VNode::element(root, "table").with_child(tbody)
}

fn reconcile_single_attribute_change(c: &mut Criterion) {
    let old = table(500, 0);
    let new = table(500, 250);

    c.bench_function("reconcile_500_rows_attribute_change", |b| {
        b.iter(|| reconcile(black_box(Some(&old)), black_box(&new)))
    });
}

fn reconcile_identical(c: &mut Criterion) {
    let tree = table(500, 0);

    c.bench_function("reconcile_500_rows_identical", |b| {
        b.iter(|| reconcile(black_box(Some(&tree)), black_box(&tree)))
    });
}

fn convert_deep_path(c: &mut Criterion) {
    let tree = table(500, 0);
    let target = Path::root()
        .child(0)
        .and_then(|p| p.child(499))
        .and_then(|p| p.child(3))
        .unwrap();

    c.bench_function("index_path_of_last_cell", |b| {
        b.iter(|| index_path_of(black_box(&tree), black_box(&target)))
    });
}

criterion_group!(
    benches,
    reconcile_single_attribute_change,
    reconcile_identical,
    convert_deep_path
);
criterion_main!(benches);
