use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jscrunch_core::diagnostics::CollectingDiagnosticHandler;
use jscrunch_core::lexer::Lexer;
use jscrunch_core::{minify, CodeSettings};
use std::sync::Arc;

const MODULE: &str = r#"
    function Widget(element, options) {
        var settings = options || {};
        if (!(settings.width > 0)) settings.width = 100;
        this.element = element;
        this.settings = settings;
    }
    Widget.prototype.render = function () {
        var parts = [];
        for (var i = 0; i < this.settings.width; i++) {
            if (i % 2 == 0) { parts.push("even"); } else { parts.push("odd"); }
        }
        switch (parts.length) { case 0: return "empty"; default: break; }
        return parts.join("even");
    };
"#;

fn bench_lexer(c: &mut Criterion) {
    c.bench_function("lexer_module", |b| {
        b.iter(|| Lexer::new(black_box(MODULE)).tokenize())
    });
}

fn bench_minify(c: &mut Criterion) {
    let settings = CodeSettings::default();
    c.bench_function("minify_module", |b| {
        b.iter(|| {
            let handler = Arc::new(CollectingDiagnosticHandler::new());
            minify(black_box(MODULE), &settings, handler)
        })
    });
}

fn bench_minify_size_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("minify_scaling");
    let settings = CodeSettings::default();

    for copies in [1, 10, 50].iter() {
        let source = format!("(function(){{{}}})();", MODULE.repeat(*copies));
        group.bench_with_input(BenchmarkId::from_parameter(copies), &source, |b, source| {
            b.iter(|| {
                let handler = Arc::new(CollectingDiagnosticHandler::new());
                minify(black_box(source), &settings, handler)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lexer, bench_minify, bench_minify_size_scaling);
criterion_main!(benches);
