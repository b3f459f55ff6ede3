//! Integration tests for the carousel CLI commands.

use carousel_cli::{load_deck, new_deck, run, validate, CliArgs};
use carousel_core::{CanvasSize, Element, ShapeConfig, SlideDeck, TextElementInit};
use clap::Parser;
use tempfile::TempDir;

/// A 1x1 red PNG.
const RED_PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0xFC, 0xCF, 0xC0, 0xF0,
    0x1F, 0x00, 0x05, 0x05, 0x02, 0x00, 0x5F, 0xC8, 0xF1, 0xD2, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn args(argv: &[&str]) -> CliArgs {
    CliArgs::parse_from(std::iter::once("carousel").chain(argv.iter().copied()))
}

fn write_sample_deck(dir: &TempDir) -> std::path::PathBuf {
    let mut deck = SlideDeck::new(CanvasSize::new(200.0, 250.0));
    deck.current_slide_mut().add_element(
        Element::text(TextElementInit::new("Hello carousel").at(10.0, 10.0)).expect("text"),
    );
    deck.add_slide().expect("add");
    deck.current_slide_mut()
        .add_element(Element::shape(ShapeConfig::default()).expect("rect"));
    deck.current_slide_mut()
        .add_element(Element::image("photo.png", 1.0, 1.0).expect("image"));
    std::fs::write(dir.path().join("photo.png"), RED_PIXEL_PNG).expect("write image");

    let path = dir.path().join("deck.json");
    std::fs::write(&path, deck.to_json().expect("json")).expect("write deck");
    path
}

#[tokio::test]
async fn test_new_deck_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("fresh.json");

    new_deck(&path, 3, CanvasSize::default()).await.expect("new deck");

    let deck = load_deck(&path).await.expect("load");
    assert_eq!(deck.len(), 3);
    assert_eq!(deck.current_index(), 0);
    assert!(deck.slides().iter().all(|s| s.is_empty()));
}

#[tokio::test]
async fn test_new_deck_rejects_out_of_range_slide_count() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bad.json");

    assert!(new_deck(&path, 0, CanvasSize::default()).await.is_err());
    assert!(new_deck(&path, 11, CanvasSize::default()).await.is_err());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_validate_summarizes_deck() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_sample_deck(&dir);

    let summary = validate(&path).await.expect("valid");
    assert_eq!(summary["slides"], 2);
    assert_eq!(summary["elements"], 3);
    assert_eq!(summary["images"], 1);
}

#[tokio::test]
async fn test_validate_rejects_invalid_document() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"version":1,"canvas":{"width":100,"height":100},"slides":[]}"#)
        .expect("write");

    let err = validate(&path).await.expect_err("invalid");
    assert!(format!("{err:#}").contains("broken.json"));
}

#[tokio::test]
async fn test_export_svg_pages_with_relative_image() {
    let dir = TempDir::new().expect("tempdir");
    let deck = write_sample_deck(&dir);
    let output = dir.path().join("out").join("deck.svg");

    let written = run(args(&[
        "export",
        deck.to_str().expect("utf8"),
        "-o",
        output.to_str().expect("utf8"),
        "--format",
        "svg",
    ]))
    .await
    .expect("export");

    assert_eq!(written.len(), 2);
    assert!(written[0].ends_with("deck-1.svg"));
    let second = std::fs::read_to_string(&written[1]).expect("read page");
    assert!(second.contains("href=\"data:image/png;base64,"));
    assert!(!second.contains("photo.png"));
}

#[tokio::test]
async fn test_export_missing_image_fails() {
    let dir = TempDir::new().expect("tempdir");
    let deck = write_sample_deck(&dir);
    std::fs::remove_file(dir.path().join("photo.png")).expect("remove image");
    let output = dir.path().join("deck.pdf");

    let err = run(args(&[
        "export",
        deck.to_str().expect("utf8"),
        "-o",
        output.to_str().expect("utf8"),
        "--asset-policy",
        "abort",
    ]))
    .await
    .expect_err("missing image");

    assert!(format!("{err:#}").contains("slide 2"));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_export_pdf_file() {
    let dir = TempDir::new().expect("tempdir");
    let deck = write_sample_deck(&dir);
    let output = dir.path().join("deck.pdf");

    let written = run(args(&[
        "export",
        deck.to_str().expect("utf8"),
        "-o",
        output.to_str().expect("utf8"),
        "--format",
        "pdf",
    ]))
    .await
    .expect("export");

    assert_eq!(written, vec![output.clone()]);
    let bytes = std::fs::read(&output).expect("read pdf");
    assert_eq!(&bytes[0..5], b"%PDF-");
}

#[tokio::test]
async fn test_thumbnails_written_per_slide() {
    let dir = TempDir::new().expect("tempdir");
    let deck = write_sample_deck(&dir);
    let output = dir.path().join("thumbs");

    let written = run(args(&[
        "thumbnails",
        deck.to_str().expect("utf8"),
        "-o",
        output.to_str().expect("utf8"),
    ]))
    .await
    .expect("thumbnails");

    assert_eq!(written.len(), 2);
    let first = std::fs::read_to_string(output.join("slide-1.svg")).expect("thumbnail");
    // 200 * 0.24 = 48
    assert!(first.contains("width=\"48\""));
    assert!(first.contains("Hello"));
}
