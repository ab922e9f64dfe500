//! Directory processing over real PDF files built with lopdf.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdfoutline::batch;
use pdfoutline::{extract_bytes, ExtractOptions, HeadingLevel, OutlineExtractor};
use serde_json::Value;

const BODY: [&str; 3] = [
    "The survey covered the whole region and the results are listed here.",
    "Each site was visited twice during the spring and again in the autumn.",
    "All of the samples were stored in the cold room until they were analysed.",
];

/// One line of text: content, font size, bold.
type Line = (&'static str, f32, bool);

fn page_operations(lines: &[Line]) -> Vec<Operation> {
    let mut operations = Vec::new();
    let mut y = 750.0;
    for &(text, size, bold) in lines {
        let font = if bold { "F2" } else { "F1" };
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
        operations.push(Operation::new("Td", vec![72.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        operations.push(Operation::new("ET", vec![]));
        y -= size * 1.8;
    }
    operations
}

fn build_pdf(pages: &[Vec<Line>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let content = Content {
            operations: page_operations(lines),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn section(heading: &'static str, body_lines: usize) -> Vec<Line> {
    let mut lines = vec![(heading, 14.0, true)];
    for i in 0..body_lines {
        lines.push((BODY[i % BODY.len()], 10.0, false));
    }
    lines
}

fn field_report() -> Vec<u8> {
    let mut first = vec![("Annual Field Report", 20.0, true)];
    first.extend(section("Overview", 5));
    first.extend(section("Methods", 5));
    build_pdf(&[first, section("Results", 6), section("Discussion", 6)])
}

fn write(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::write(dir.join(name), bytes).unwrap();
}

#[test]
fn test_extract_generated_pdf() {
    let outline = extract_bytes(&field_report()).unwrap();

    // The title style ranks first, so section headings sit one level below it.
    assert_eq!(outline.title, "Annual Field Report");
    let entries: Vec<(HeadingLevel, &str, usize)> = outline
        .outline
        .iter()
        .map(|e| (e.level, e.text.as_str(), e.page))
        .collect();
    assert_eq!(
        entries,
        vec![
            (HeadingLevel::H2, "Overview", 0),
            (HeadingLevel::H2, "Methods", 0),
            (HeadingLevel::H2, "Results", 1),
            (HeadingLevel::H2, "Discussion", 2),
        ]
    );
}

#[test]
fn test_max_pages_limits_outline() {
    let outline = OutlineExtractor::new()
        .with_max_pages(1)
        .extract_bytes(&field_report())
        .unwrap();
    assert!(outline.outline.iter().all(|e| e.page == 0));
}

#[test]
fn test_batch_writes_json_and_skips_bad_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let out_dir = output.path().join("json");

    write(input.path(), "report.pdf", &field_report());
    write(input.path(), "empty.pdf", &build_pdf(&[vec![]]));
    write(input.path(), "corrupt.pdf", b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog");
    write(input.path(), "readme.txt", b"not a pdf");

    let mut outcomes = Vec::new();
    let report = batch::process_directory(
        input.path(),
        &out_dir,
        &ExtractOptions::default(),
        |outcome| outcomes.push((outcome.input.clone(), outcome.is_success())),
    )
    .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(report.succeeded, vec![out_dir.join("empty.json"), out_dir.join("report.json")]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("corrupt.pdf"));
    assert!(!out_dir.join("corrupt.json").exists());
    assert!(!out_dir.join("readme.json").exists());

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["title"], "Annual Field Report");
    let outline = json["outline"].as_array().unwrap();
    assert_eq!(outline.len(), 4);
    assert_eq!(outline[0]["level"], "H2");
    assert_eq!(outline[0]["text"], "Overview");
    assert_eq!(outline[0]["page"], 0);
    assert_eq!(outline[3]["page"], 2);

    let empty: Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join("empty.json")).unwrap()).unwrap();
    assert_eq!(empty, serde_json::json!({ "title": "", "outline": [] }));
}

#[test]
fn test_parallel_and_sequential_agree() {
    let input = tempfile::tempdir().unwrap();
    for i in 0..6 {
        write(input.path(), &format!("doc{}.pdf", i), &field_report());
    }

    let parallel_out = tempfile::tempdir().unwrap();
    let sequential_out = tempfile::tempdir().unwrap();
    let options = ExtractOptions::default();
    batch::process_directory(input.path(), parallel_out.path(), &options, |_| {}).unwrap();
    batch::process_directory(input.path(), sequential_out.path(), &options.clone().sequential(), |_| {})
        .unwrap();

    for i in 0..6 {
        let name = format!("doc{}.json", i);
        let a = std::fs::read(parallel_out.path().join(&name)).unwrap();
        let b = std::fs::read(sequential_out.path().join(&name)).unwrap();
        assert_eq!(a, b);
    }
}
