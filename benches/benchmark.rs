//! Performance benchmarks for docconv.
//!
//! Run with: `cargo bench`
//!
//! Benchmarks include:
//! - Sanitizing a mixed HTML fragment under the default policy
//! - Page-break normalization of external converter output
//! - Full ODT conversion of an in-memory package of growing size

use std::io::{Cursor, Write};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docconv::{convert_odt, normalize_pagebreaks, sanitize, MemoryStore, Options, Policy};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SAMPLE_HTML: &str = r#"
<div class="WordSection1">
    <h1 style="text-align: center; position: absolute">Quarterly Report</h1>
    <p class="MsoNormal" onclick="track()">Revenue grew <b>12%</b> over the
    previous quarter, driven by <font face="Arial">new accounts</font>.</p>
    <p style="page-break-before: always; color: #333">Appendix A</p>
    <table border="1" bgcolor="red"><tr><td colspan="2" nowrap>Total</td></tr></table>
    <br style="page-break-after: always">
    <p></p><div><p> </p></div>
    <!-- generator comment -->
    <ul><li>One</li><li>Two <a href="/x" onmouseover="evil()">link</a></li></ul>
    <img src="chart.png" onerror="x()" width="300" style="height: 5em">
</div>
"#;

const CONTENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.3">
<office:automatic-styles>
<style:style style:name="P1" style:family="paragraph"><style:paragraph-properties fo:break-before="page"/></style:style>
<style:style style:name="T1" style:family="text"><style:text-properties fo:font-weight="bold" fo:font-style="italic"/></style:style>
</office:automatic-styles>
<office:body><office:text>"#;

const CONTENT_TAIL: &str = "</office:text></office:body></office:document-content>";

fn sample_odt(sections: usize) -> Vec<u8> {
    let mut content = String::from(CONTENT_HEAD);
    for i in 0..sections {
        content.push_str(&format!(
            r#"<text:h text:outline-level="2">Section {i}</text:h>
<text:p text:style-name="P1">Opening <text:span text:style-name="T1">emphasis</text:span> and text.<text:line-break/>Second line<text:s text:c="3"/>spaced.</text:p>
<text:list><text:list-item><text:p>First</text:p></text:list-item><text:list-item><text:p>Second</text:p></text:list-item></text:list>
<table:table><table:table-row><table:table-cell><text:p>cell &amp; value</text:p></table:table-cell></table:table-row></table:table>
<text:soft-page-break/>"#
        ));
    }
    content.push_str(CONTENT_TAIL);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let parts = [
        ("mimetype", "application/vnd.oasis.opendocument.text"),
        ("content.xml", content.as_str()),
    ];
    for (name, data) in parts {
        zip.start_file(name, stored).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn bench_sanitize_default(c: &mut Criterion) {
    let policy = Policy::default();

    c.bench_function("sanitize_default", |b| {
        b.iter(|| sanitize(black_box(SAMPLE_HTML), black_box(&policy)));
    });
}

fn bench_normalize_pagebreaks(c: &mut Criterion) {
    c.bench_function("normalize_pagebreaks", |b| {
        b.iter(|| normalize_pagebreaks(black_box(SAMPLE_HTML)));
    });
}

/// Full conversion over packages of increasing length
fn bench_convert_odt(c: &mut Criterion) {
    let options = Options::default();
    let mut group = c.benchmark_group("convert_odt");

    for sections in [1, 10, 100] {
        let odt = sample_odt(sections);
        group.throughput(Throughput::Bytes(odt.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("sections", sections),
            &odt,
            |b, odt| {
                b.iter(|| {
                    let mut store = MemoryStore::new();
                    convert_odt(black_box(odt), &options, &mut store)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sanitize_default,
    bench_normalize_pagebreaks,
    bench_convert_odt
);
criterion_main!(benches);
