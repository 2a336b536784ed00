use docconv::pagebreak::LEGACY_PAGEBREAKS;
use docconv::{convert_html, normalize_pagebreaks, Options, PAGEBREAK_MARKER};

#[test]
fn adjacent_legacy_variants_become_two_markers() {
    let html = r#"<p>a</p><hr class="pagebreak"><div class="page-break"></div><p>b</p>"#;

    let first = normalize_pagebreaks(html);
    let second = normalize_pagebreaks(html);

    assert_eq!(first, format!("<p>a</p>{PAGEBREAK_MARKER}{PAGEBREAK_MARKER}<p>b</p>"));
    assert_eq!(first, second);
    assert!(!first.contains("pagebreak\">"));
    assert!(!first.contains("page-break"));
}

#[test]
fn every_pair_of_legacy_variants_yields_two_markers() {
    for a in LEGACY_PAGEBREAKS {
        for b in LEGACY_PAGEBREAKS {
            let out = normalize_pagebreaks(&format!("{a}{b}"));
            assert_eq!(
                out,
                format!("{PAGEBREAK_MARKER}{PAGEBREAK_MARKER}"),
                "pair {a} + {b}"
            );
        }
    }
}

#[test]
fn hidden_span_variant_is_not_double_counted() {
    let html = r#"<div style="page-break-after: always"><span style="display: none">&nbsp;</span></div>"#;
    assert_eq!(normalize_pagebreaks(html), PAGEBREAK_MARKER);
}

#[test]
fn style_declared_breaks_on_content_elements() {
    let html = concat!(
        r#"<h1 style="page-break-before: always; color: #333">Chapter</h1>"#,
        r#"<p>text</p>"#,
        r#"<table style="page-break-after:always"><tr><td>t</td></tr></table>"#,
        r#"<p style="font-family: &quot;A&quot;; page-break-after: auto">no break</p>"#,
    );

    assert_eq!(
        normalize_pagebreaks(html),
        format!(
            concat!(
                r#"<h1 style="color: #333">Chapter</h1>{m}"#,
                r#"<p>text</p>"#,
                r#"<table><tr><td>t</td></tr></table>{m}"#,
                r#"<p style="font-family: &quot;A&quot;; page-break-after: auto">no break</p>"#,
            ),
            m = PAGEBREAK_MARKER
        )
    );
}

#[test]
fn normalizer_is_idempotent() {
    let inputs = [
        r#"<p style="page-break-before: always">a</p><p>b</p>"#.to_string(),
        LEGACY_PAGEBREAKS.join("<p>x</p>"),
        r#"<div class="page-break" style="page-break-after: always"></div>"#.to_string(),
        format!("<p>a</p>{PAGEBREAK_MARKER}<p>b</p>"),
        r#"<br style='page-break-before: always'/>"#.to_string(),
    ];
    for input in &inputs {
        let once = normalize_pagebreaks(input);
        assert_eq!(normalize_pagebreaks(&once), once, "input {input}");
    }
}

#[test]
fn external_converter_output_end_to_end() {
    let html = concat!(
        "<h1>Report</h1>",
        r#"<p style="page-break-before: always; text-align: right">Signed</p>"#,
        r#"<br style="page-break-after: always">"#,
        r#"<p class="MsoNormal" onclick="x()">Appendix</p>"#,
    );

    let result = convert_html(html, Vec::new(), &Options::default());

    assert_eq!(
        result.html,
        format!(
            "<h1>Report</h1><p style=\"text-align: right\">Signed</p>\n{PAGEBREAK_MARKER}\n<p class=\"MsoNormal\">Appendix</p>"
        )
    );
    assert!(result.has_pagebreaks());
}
