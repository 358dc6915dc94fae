//! Template processor integration tests
//!
//! End-to-end checks of block cloning, row splicing, image injection and
//! saving against in-memory DOCX fixtures.

use std::io::Cursor;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use dokplate::archive::{PackageArchive, CONTENT_TYPES_PATH, DOCUMENT_RELS_PATH, MAIN_PART_PATH};
use dokplate::test_utils::{create_template, encode_image, paragraph};
use dokplate::{
    ImageKind, ImageOptions, ProcessorConfig, Template, TemplateError, TemplateProcessor,
};

fn processor(body: &str) -> TemplateProcessor {
    let template = Template::from_bytes(&create_template(body).unwrap()).unwrap();
    TemplateProcessor::with_rng(template, ProcessorConfig::default(), StdRng::seed_from_u64(7))
        .unwrap()
}

fn snapshot(p: &TemplateProcessor) -> (String, String, String) {
    (
        p.main_part().to_string(),
        p.relationships_xml().to_string(),
        p.content_types_xml().to_string(),
    )
}

fn write_image(dir: &tempfile::TempDir, file: &str, width: u32, height: u32, kind: ImageKind) -> PathBuf {
    let path = dir.path().join(file);
    std::fs::write(&path, encode_image(width, height, kind).unwrap()).unwrap();
    path
}

fn reopen(bytes: Vec<u8>) -> PackageArchive {
    PackageArchive::from_reader(Cursor::new(bytes)).unwrap()
}

fn block_body() -> String {
    [
        r#"<w:p><w:pPr><w:pStyle w:val="TextBody"/><w:rPr></w:rPr></w:pPr><w:r><w:rPr></w:rPr><w:t>${CLONEME}</w:t></w:r></w:p>"#.to_string(),
        paragraph("Name: ${name}"),
        paragraph("Email: ${email}"),
        paragraph("${/CLONEME}"),
        paragraph("After"),
    ]
    .concat()
}

// =============================================================================
// Block cloning
// =============================================================================

#[test]
fn test_clone_block_produces_suffixed_copies() {
    let mut p = processor(&block_body());

    let body = p.clone_block("CLONEME", 3, true).unwrap().unwrap();
    assert!(body.contains("${name}"));
    assert!(body.contains("${email}"));

    let doc = p.main_part();
    for i in 1..=3 {
        assert_eq!(doc.matches(&format!("${{name#{}}}", i)).count(), 1);
        assert_eq!(doc.matches(&format!("${{email#{}}}", i)).count(), 1);
    }
    assert!(!doc.contains("${name}"));
    assert!(!doc.contains("${CLONEME}"));
    assert!(!doc.contains("${/CLONEME}"));
    assert!(doc.contains("After"));
    assert_eq!(
        p.variables(),
        vec!["name#1", "email#1", "name#2", "email#2", "name#3", "email#3"]
    );
}

#[test]
fn test_clone_block_then_fill_values() {
    let mut p = processor(&block_body());
    p.clone_block("CLONEME", 2, true).unwrap();
    assert_eq!(p.set_value("name#1", "Ada"), 1);
    assert_eq!(p.set_value("name#2", "Grace"), 1);

    let doc = p.main_part();
    let ada = doc.find("Name: Ada").unwrap();
    let grace = doc.find("Name: Grace").unwrap();
    assert!(ada < grace);
}

#[test]
fn test_clone_block_without_replace_is_byte_identical() {
    let mut p = processor(&block_body());
    let before = snapshot(&p);

    let body = p.clone_block("CLONEME", 4, false).unwrap();
    assert!(body.is_some());
    assert_eq!(snapshot(&p), before);
}

#[test]
fn test_clone_missing_block_changes_nothing() {
    let mut p = processor(&block_body());
    let before = snapshot(&p);

    assert_eq!(p.clone_block("NOPE", 2, true).unwrap(), None);
    assert_eq!(snapshot(&p), before);
}

#[test]
fn test_clone_block_marker_outside_paragraph() {
    let body = format!("{}{}", "<w:sdt><w:t>${X}</w:t></w:sdt>", paragraph("${/X}"));
    let mut p = processor(&body);
    let before = snapshot(&p);

    let err = p.clone_block("X", 2, true).unwrap_err();
    assert!(matches!(err, TemplateError::InvalidStructure(_)));
    assert_eq!(snapshot(&p), before);
}

// =============================================================================
// Row splicing
// =============================================================================

#[test]
fn test_set_value_break_line_rows_in_order() {
    let body = [paragraph("Title"), paragraph("- ${line}"), paragraph("End")].concat();
    let mut p = processor(&body);

    p.set_value_break_line("line", vec!["a", "b & c", "d"]).unwrap();

    let expected = [
        paragraph("- a"),
        paragraph("- b &amp; c"),
        paragraph("- d"),
    ]
    .concat();
    let doc = p.main_part();
    assert!(doc.contains(&format!("{}{}{}", paragraph("Title"), expected, paragraph("End"))));
}

#[test]
fn test_set_value_break_line_missing_placeholder() {
    let mut p = processor(&paragraph("nothing here"));
    let before = p.main_part().to_string();

    let err = p.set_value_break_line("line", "x").unwrap_err();
    assert!(matches!(err, TemplateError::VariableNotFound(_)));
    assert_eq!(p.main_part(), before);
}

// =============================================================================
// Image injection
// =============================================================================

#[test]
fn test_set_image_updates_all_parts() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_image(&dir, "logo.png", 40, 20, ImageKind::Png);
    let mut p = processor(&paragraph("${logo}"));

    let image = p
        .set_image("logo", &png, ImageOptions::new().with_name("Company logo"))
        .unwrap();

    assert_eq!((image.width, image.height), (40.0, 20.0));
    assert_eq!(image.mime_type, "image/png");
    assert!(p.main_part().contains(&image.shape_xml()));
    assert!(p.main_part().contains(r#"o:title="Company logo""#));
    assert!(p.main_part().contains("style=\"width:40pt;height:20pt\""));

    let rels = p.relationships().unwrap();
    let rel = rels.iter().find(|r| r.id == image.rels_id).unwrap();
    assert_eq!(rel.target, format!("media/image{}.png", image.rels_id));
    assert!(rel.is_image());

    assert_eq!(p.content_types_xml().matches(r#"Extension="png""#).count(), 1);
    assert!(p.archive().contains(&image.media_path()));
}

#[test]
fn test_set_image_scales_to_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let wide = write_image(&dir, "wide.png", 400, 200, ImageKind::Png);
    let square = write_image(&dir, "square.gif", 50, 50, ImageKind::Gif);
    let mut p = processor(&[paragraph("${a}"), paragraph("${b}")].concat());

    let a = p
        .set_image("a", &wide, ImageOptions::new().with_max_size(100, 100))
        .unwrap();
    assert_eq!((a.width, a.height), (100.0, 50.0));

    let b = p
        .set_image("b", &square, ImageOptions::new().with_max_size(100, 100))
        .unwrap();
    assert_eq!((b.width, b.height), (50.0, 50.0));
}

#[test]
fn test_content_types_one_entry_per_extension() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_image(&dir, "a.png", 4, 4, ImageKind::Png);
    let jpg = write_image(&dir, "b.jpg", 4, 4, ImageKind::Jpeg);
    let png2 = write_image(&dir, "c.png", 8, 8, ImageKind::Png);
    let mut p = processor(&[paragraph("${a}"), paragraph("${b}"), paragraph("${c}")].concat());
    let defaults_before = p.content_types_xml().matches("<Default ").count();

    p.set_image("a", &png, ImageOptions::new()).unwrap();
    p.set_image("b", &jpg, ImageOptions::new()).unwrap();
    assert_eq!(
        p.content_types_xml().matches("<Default ").count(),
        defaults_before + 2
    );
    assert!(p
        .content_types_xml()
        .contains(r#"<Default Extension="jpg" ContentType="image/jpeg"/>"#));

    p.set_image("c", &png2, ImageOptions::new()).unwrap();
    assert_eq!(
        p.content_types_xml().matches("<Default ").count(),
        defaults_before + 2
    );
    assert_eq!(p.relationships().unwrap().len(), 4);
}

#[test]
fn test_set_image_extension_and_mime_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_image(&dir, "upload.bin", 10, 10, ImageKind::Jpeg);
    let mut p = processor(&paragraph("${photo}"));

    let image = p
        .set_image(
            "photo",
            &path,
            ImageOptions::new()
                .with_extension("jpeg")
                .with_mime_type("image/pjpeg"),
        )
        .unwrap();

    assert_eq!(image.extension, "jpeg");
    assert!(image.media_path().ends_with(".jpeg"));
    assert!(p
        .content_types_xml()
        .contains(r#"<Default Extension="jpeg" ContentType="image/pjpeg"/>"#));
}

#[test]
fn test_set_image_default_name_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_image(&dir, "p.png", 2, 2, ImageKind::Png);
    let template = Template::from_bytes(&create_template(&paragraph("${p}")).unwrap()).unwrap();
    let config = ProcessorConfig::from_toml_str(r#"default_image_name = "Foto""#).unwrap();
    let mut p = TemplateProcessor::with_rng(template, config, StdRng::seed_from_u64(3)).unwrap();

    let image = p.set_image("p", &png, ImageOptions::new()).unwrap();
    assert_eq!(image.name, "Foto");
}

#[test]
fn test_set_image_unsupported_extension_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drawing.bmp");
    std::fs::write(&path, b"BM").unwrap();
    let mut p = processor(&paragraph("${img}"));
    let before = snapshot(&p);

    let err = p.set_image("img", &path, ImageOptions::new()).unwrap_err();
    assert!(matches!(err, TemplateError::UnsupportedImage { .. }));
    assert_eq!(snapshot(&p), before);
}

#[test]
fn test_set_image_undecodable_content_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();
    let mut p = processor(&paragraph("${img}"));
    let before = snapshot(&p);

    let err = p.set_image("img", &path, ImageOptions::new()).unwrap_err();
    assert!(matches!(err, TemplateError::UnsupportedImage { .. }));
    assert_eq!(snapshot(&p), before);
    assert!(!p.archive().file_list().any(|f| f.starts_with("word/media/")));
}

// =============================================================================
// Save
// =============================================================================

#[test]
fn test_save_unwraps_pict_from_text_runs() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_image(&dir, "a.png", 3, 3, ImageKind::Png);
    let mut p = processor(&[paragraph("${a}"), paragraph("${b}")].concat());
    p.set_image("a", &png, ImageOptions::new()).unwrap();
    p.set_image("b", &png, ImageOptions::new()).unwrap();
    assert_eq!(p.main_part().matches("<w:t><w:pict>").count(), 2);

    let archive = reopen(p.save().unwrap());
    let doc = archive.get_string(MAIN_PART_PATH).unwrap();
    assert!(!doc.contains("<w:t><w:pict>"));
    assert!(!doc.contains("</w:pict></w:t>"));
    assert_eq!(doc.matches("<w:r><w:pict>").count(), 2);
}

#[test]
fn test_save_flushes_manifests_and_media() {
    let dir = tempfile::tempdir().unwrap();
    let gif = write_image(&dir, "anim.gif", 6, 3, ImageKind::Gif);
    let mut p = processor(&paragraph("${g}"));
    let image = p.set_image("g", &gif, ImageOptions::new()).unwrap();

    let out = dir.path().join("out.docx");
    p.save_as(&out).unwrap();
    let archive = PackageArchive::open(&out).unwrap();

    let rels = archive.get_string(DOCUMENT_RELS_PATH).unwrap();
    assert!(rels.contains(&format!(r#"Id="{}""#, image.rels_id)));
    let types = archive.get_string(CONTENT_TYPES_PATH).unwrap();
    assert!(types.contains(r#"<Default Extension="gif" ContentType="image/gif"/>"#));
    assert_eq!(
        archive.get(&image.media_path()),
        Some(std::fs::read(&gif).unwrap().as_slice())
    );
}

#[test]
fn test_saved_package_reopens_as_template() {
    let mut p = processor(&block_body());
    p.clone_block("CLONEME", 2, true).unwrap();
    let bytes = p.save().unwrap();

    let reopened = TemplateProcessor::from_bytes(&bytes).unwrap();
    assert_eq!(reopened.main_part(), p.main_part());
    assert_eq!(reopened.relationships_xml(), p.relationships_xml());
}
