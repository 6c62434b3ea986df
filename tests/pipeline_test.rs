//! End-to-end tests for the processing pipeline.

mod common;

use std::path::Path;

use rationpdf::background::{BackgroundConfig, BackgroundResolver};
use rationpdf::{
    Category, CategoryClassifier, PageComposer, PageRect, Pipeline, PipelineConfig, TextExtractor,
    Warning,
};
use tempfile::TempDir;

fn pipeline_in(dir: &Path) -> Pipeline {
    let config = PipelineConfig::new()
        .with_background(BackgroundConfig::new().with_static_dir(dir.join("static")));
    Pipeline::new(config).unwrap()
}

/// A pipeline whose backgrounds were never created.
fn pipeline_without_backgrounds(dir: &Path) -> Pipeline {
    Pipeline::with_components(
        TextExtractor::new(),
        CategoryClassifier::default(),
        BackgroundResolver::new(BackgroundConfig::new().with_static_dir(dir.join("missing"))),
        PageComposer::default(),
    )
}

#[test]
fn test_antyodaya_card() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "aay.pdf",
        &common::text_pdf(&["ANTYODAYA ANNA YOJANA", "Ration Card"]),
    );
    let output = dir.path().join("aay_out.pdf");

    let result = pipeline_in(dir.path()).run(&input, &output).unwrap();

    assert_eq!(result.category, Category::Aay);
    assert_eq!(result.rule.as_deref(), Some("antyodaya"));
    assert!(result.background.ends_with("aay_card.jpg"));
    assert!(result.report.background_drawn);
    assert!(output.exists());
}

#[test]
fn test_non_priority_card() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "apl.pdf",
        &common::text_pdf(&["This household holds a Non-Priority card"]),
    );
    let output = dir.path().join("apl_out.pdf");

    let result = pipeline_in(dir.path()).run(&input, &output).unwrap();
    assert_eq!(result.category, Category::Apl);
    assert!(result.background.ends_with("apl_card.jpg"));
}

#[test]
fn test_priority_household_card() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "bpl.pdf",
        &common::text_pdf(&["PRIORITY HOUSEHOLD", "Ration entitlement"]),
    );
    let output = dir.path().join("bpl_out.pdf");

    let result = pipeline_in(dir.path()).run(&input, &output).unwrap();
    assert_eq!(result.category, Category::Bpl);
    assert!(result.background.ends_with("bpl_card.jpg"));
}

#[test]
fn test_untagged_card_uses_default() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "plain.pdf",
        &common::text_pdf(&["Ration card issued 2024"]),
    );
    let output = dir.path().join("plain_out.pdf");

    let result = pipeline_in(dir.path()).run(&input, &output).unwrap();
    assert_eq!(result.category, Category::Default);
    assert_eq!(result.rule, None);
    assert!(result.background.ends_with("default_bg.jpg"));
}

#[test]
fn test_page_without_text_uses_default() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "scan.pdf",
        &common::pdf_with(&[], common::A4, &[("Im1", "DCTDecode")]),
    );
    let output = dir.path().join("scan_out.pdf");

    let result = pipeline_in(dir.path()).run(&input, &output).unwrap();
    assert_eq!(result.category, Category::Default);
    assert_eq!(result.rule, None);
    assert_eq!(result.report.page_count, 1);
    assert!(output.exists());
}

#[test]
fn test_classify_file_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "bpl.pdf",
        &common::text_pdf(&["Priority Household"]),
    );
    let pipeline = pipeline_without_backgrounds(dir.path());

    let classification = pipeline.classify_file(&input).unwrap();
    assert_eq!(classification.category, Category::Bpl);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_zero_page_input() {
    let dir = TempDir::new().unwrap();
    let input = common::write(dir.path(), "empty.pdf", &common::empty_pdf());
    let output = dir.path().join("empty_out.pdf");

    let result = pipeline_in(dir.path()).run(&input, &output).unwrap();
    assert_eq!(result.category, Category::Default);
    assert_eq!(result.report.page_count, 0);
    assert_eq!(result.report.page_rect, None);

    let doc = lopdf::Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 0);
}

#[test]
fn test_missing_background_is_skipped() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "aay.pdf",
        &common::text_pdf(&["Antyodaya"]),
    );
    let output = dir.path().join("out.pdf");

    let result = pipeline_without_backgrounds(dir.path())
        .run(&input, &output)
        .unwrap();

    assert_eq!(result.category, Category::Aay);
    assert!(!result.report.background_drawn);
    assert!(matches!(
        result.report.warnings.as_slice(),
        [Warning::BackgroundMissing { .. }]
    ));

    let (doc, page) = common::first_page(&output);
    let xobjects = common::xobjects(&doc, &page);
    assert_eq!(xobjects.len(), 1);
    assert!(xobjects.has(b"Page"));
}

#[test]
fn test_geometry_preserved() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "odd.pdf",
        &common::pdf_with(&["Priority Household"], [0, 0, 420, 297], &[]),
    );
    let output = dir.path().join("odd_out.pdf");

    let result = pipeline_in(dir.path()).run(&input, &output).unwrap();
    assert_eq!(
        result.report.page_rect,
        Some(PageRect::from_size(420.0, 297.0))
    );

    let (_, page) = common::first_page(&output);
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(
        PageRect::from_array(media_box),
        Some(PageRect::from_size(420.0, 297.0))
    );
}

#[test]
fn test_output_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let input = common::write(
        dir.path(),
        "card.pdf",
        &common::pdf_with(
            &["Non-Priority"],
            common::A4,
            &[("Im1", "FlateDecode"), ("Im2", "DCTDecode")],
        ),
    );
    let pipeline = pipeline_in(dir.path());
    let first = dir.path().join("first.pdf");
    let second = dir.path().join("second.pdf");

    pipeline.run(&input, &first).unwrap();
    pipeline.run(&input, &second).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_corrupt_input_is_document_error() {
    let dir = TempDir::new().unwrap();
    let input = common::write(dir.path(), "broken.pdf", b"%PDF-1.4\nthis is not a pdf body");
    let output = dir.path().join("broken_out.pdf");

    let err = pipeline_in(dir.path()).run(&input, &output).err().unwrap();
    assert!(err.is_document_error(), "unexpected error: {}", err);
    assert!(!output.exists());
}

#[test]
fn test_not_a_pdf_is_document_error() {
    let dir = TempDir::new().unwrap();
    let input = common::write(dir.path(), "page.html", b"<html></html>");
    let output = dir.path().join("out.pdf");

    let err = pipeline_in(dir.path()).run(&input, &output).err().unwrap();
    assert!(err.is_document_error());
    assert!(!output.exists());
}

#[test]
fn test_shared_pipeline_across_threads() {
    let dir = TempDir::new().unwrap();
    let pipeline = std::sync::Arc::new(pipeline_in(dir.path()));
    let texts = ["Antyodaya", "Non-Priority", "Priority Household", "Ration card"];
    let expected = [Category::Aay, Category::Apl, Category::Bpl, Category::Default];

    let handles: Vec<_> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let input = common::write(
                dir.path(),
                &format!("in{}.pdf", i),
                &common::text_pdf(&[*text]),
            );
            let output = dir.path().join(format!("out{}.pdf", i));
            let pipeline = std::sync::Arc::clone(&pipeline);
            std::thread::spawn(move || pipeline.run(&input, &output).unwrap().category)
        })
        .collect();

    for (handle, expected) in handles.into_iter().zip(expected) {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
