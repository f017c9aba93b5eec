mod common;

use std::collections::HashMap;

use common::*;
use docfill_rs::{fill_document, fill_document_from_reader, FillRequest, DEFAULT_TABLE_TAG};

fn ordered_request(rows: &[&[&str]]) -> FillRequest {
    FillRequest {
        table_tag: None,
        rows_by_order: Some(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        ),
        ..Default::default()
    }
}

fn keyed_request(rows: Vec<HashMap<String, String>>) -> FillRequest {
    FillRequest {
        table_tag: None,
        rows_by_tag: Some(rows),
        ..Default::default()
    }
}

fn student_table_docx() -> Vec<u8> {
    let table = format!(
        "<w:tbl><w:tblPr/>{header}{template}{stale}</w:tbl>",
        header = row(&[plain_cell("Name"), plain_cell("Grade")]),
        template = row(&[cell(&control("name", "tpl-name")), cell(&control("grade", "tpl-grade"))]),
        stale = row(&[plain_cell("Old"), plain_cell("F")]),
    );
    build_docx(&document_xml(&table), &[])
}

#[test]
fn positional_fill_produces_one_row_per_input_and_drops_stale_rows() {
    let template = student_table_docx();
    let request = ordered_request(&[&["Alice", "A", "extra"], &["Bob"]]);
    let output = fill_document(&template, &request).unwrap();

    let cells = table_cell_texts(&output);
    assert_eq!(
        cells,
        vec![
            vec!["Name".to_string(), "Grade".to_string()],
            vec!["Alice".to_string(), "A".to_string()],
            vec!["Bob".to_string(), "".to_string()],
        ]
    );
}

#[test]
fn keyed_fill_matches_case_insensitively_and_keeps_unmatched_template_text() {
    let template = student_table_docx();
    let request = keyed_request(vec![HashMap::from([("GRADE".to_string(), "B".to_string())])]);
    let output = fill_document(&template, &request).unwrap();

    let cells = table_cell_texts(&output);
    assert_eq!(
        cells,
        vec![
            vec!["Name".to_string(), "Grade".to_string()],
            vec!["tpl-name".to_string(), "B".to_string()],
        ]
    );
}

#[test]
fn keyed_rows_win_when_both_modes_are_present() {
    let template = student_table_docx();
    let mut request = keyed_request(vec![HashMap::from([("name".to_string(), "Keyed".to_string())])]);
    request.rows_by_order = Some(vec![vec!["Ordered".to_string()]]);
    let output = fill_document(&template, &request).unwrap();
    assert_eq!(table_row_texts(&output)[1], "Keyedtpl-grade");
}

#[test]
fn two_row_record_is_cloned_and_removed_in_lock_step() {
    let table = format!(
        "<w:tbl>{first}{second}</w:tbl>",
        first = row(&[cell(&control("name", "tpl-name"))]),
        second = row(&[cell(&control("grade", "tpl-grade"))]),
    );
    let template = build_docx(&document_xml(&table), &[]);
    let request = ordered_request(&[&["Alice", "A"], &["Bob", "B"]]);
    let output = fill_document(&template, &request).unwrap();
    assert_eq!(table_row_texts(&output), vec!["Alice", "A", "Bob", "B"]);
}

#[test]
fn plain_following_row_is_not_part_of_the_record() {
    let table = format!(
        "<w:tbl>{template}{plain}</w:tbl>",
        template = row(&[cell(&control("name", "tpl-name"))]),
        plain = row(&[plain_cell("footer text")]),
    );
    let template = build_docx(&document_xml(&table), &[]);
    let request = ordered_request(&[&["Alice"]]);
    let output = fill_document(&template, &request).unwrap();
    // The plain row followed the record, so it counts as stale data.
    assert_eq!(table_row_texts(&output), vec!["Alice"]);
}

#[test]
fn scalar_fill_covers_body_headers_and_footers() {
    let body = format!("<w:p>{}</w:p><w:p>{}</w:p>", control("title", "tpl"), control("other", "keep"));
    let header = format!(
        r#"<?xml version="1.0"?><w:hdr xmlns:w="{W_NS}"><w:p>{}</w:p></w:hdr>"#,
        control("title", "tpl")
    );
    let footer = format!(
        r#"<?xml version="1.0"?><w:ftr xmlns:w="{W_NS}"><w:p>{}</w:p></w:ftr>"#,
        control("title", "tpl")
    );
    let template = build_docx(
        &document_xml(&body),
        &[("word/header1.xml", &header), ("word/footer1.xml", &footer)],
    );
    let request = FillRequest {
        table_tag: None,
        scalars: Some(HashMap::from([("Title".to_string(), "Report".to_string())])),
        ..Default::default()
    };
    let output = fill_document(&template, &request).unwrap();

    assert!(read_part(&output, "word/document.xml").contains("Report"));
    assert!(read_part(&output, "word/header1.xml").contains("Report"));
    assert!(read_part(&output, "word/footer1.xml").contains("Report"));
    // No "other" key in the map: template text stays.
    assert!(read_part(&output, "word/document.xml").contains("keep"));
}

#[test]
fn whitespace_in_substituted_values_is_preserved() {
    let body = format!("<w:p>{}</w:p>", control("title", "tpl"));
    let template = build_docx(&document_xml(&body), &[]);
    let request = FillRequest {
        table_tag: None,
        scalars: Some(HashMap::from([("title".to_string(), "  padded ".to_string())])),
        ..Default::default()
    };
    let output = fill_document(&template, &request).unwrap();
    let xml = read_part(&output, "word/document.xml");
    assert!(xml.contains(r#"xml:space="preserve""#), "{xml}");
    assert!(xml.contains(">  padded <"), "{xml}");
}

#[test]
fn two_tables_without_tag_fail_with_a_count() {
    let table = format!("<w:tbl>{}</w:tbl>", row(&[cell(&control("a", "x"))]));
    let template = build_docx(&document_xml(&format!("{table}{table}")), &[]);
    let request = ordered_request(&[&["v"]]);
    let err = fill_document(&template, &request).unwrap_err().to_string();
    assert!(err.contains("2 tables"), "{err}");
}

#[test]
fn wrapper_tag_selects_the_wrapped_table() {
    let loose_table = format!("<w:tbl>{}</w:tbl>", row(&[cell(&control("a", "loose"))]));
    let wrapped_table = format!(
        r#"<w:sdt><w:sdtPr><w:tag w:val="{DEFAULT_TABLE_TAG}"/></w:sdtPr><w:sdtContent><w:tbl>{}</w:tbl></w:sdtContent></w:sdt>"#,
        row(&[cell(&control("name", "wrapped"))]),
    );
    let template = build_docx(&document_xml(&format!("{loose_table}{wrapped_table}")), &[]);
    let request = FillRequest {
        rows_by_tag: Some(vec![HashMap::from([(
            "name".to_string(),
            "Target".to_string(),
        )])]),
        ..Default::default()
    };
    let output = fill_document(&template, &request).unwrap();
    let xml = read_part(&output, "word/document.xml");
    assert!(xml.contains("Target"), "{xml}");
    assert!(xml.contains("loose"), "untagged table must stay untouched: {xml}");
}

#[test]
fn missing_wrapper_for_the_default_tag_is_fatal() {
    let template = student_table_docx();
    let request = FillRequest {
        rows_by_order: Some(vec![vec!["v".to_string()]]),
        ..Default::default()
    };
    let err = fill_document(&template, &request).unwrap_err().to_string();
    assert!(err.contains(DEFAULT_TABLE_TAG), "{err}");
}

#[test]
fn request_without_table_rows_leaves_the_table_untouched() {
    let template = student_table_docx();
    let request = FillRequest {
        table_tag: None,
        scalars: Some(HashMap::from([("absent".to_string(), "x".to_string())])),
        ..Default::default()
    };
    let output = fill_document(&template, &request).unwrap();
    assert_eq!(
        table_row_texts(&output),
        vec!["NameGrade", "tpl-nametpl-grade", "OldF"]
    );
}

#[test]
fn explicit_template_row_index_overrides_detection() {
    // Row 0 carries the only control; point the request at row 1 instead.
    let table = format!(
        "<w:tbl>{detected}{explicit}</w:tbl>",
        detected = row(&[cell(&control("name", "detected"))]),
        explicit = row(&[cell(&control("other", "explicit"))]),
    );
    let template = build_docx(&document_xml(&table), &[]);
    let mut request = ordered_request(&[&["v1"]]);
    request.template_row_index = Some(1);
    let output = fill_document(&template, &request).unwrap();
    // Row 0 survives as-is; row 1 was the record and got replaced.
    assert_eq!(table_row_texts(&output), vec!["detected", "v1"]);
}

#[test]
fn formatting_of_the_first_run_is_reapplied() {
    let styled_control = r#"<w:sdt><w:sdtPr><w:tag w:val="name"/></w:sdtPr><w:sdtContent><w:r><w:rPr><w:b/><w:i/></w:rPr><w:t>tpl</w:t></w:r></w:sdtContent></w:sdt>"#;
    let table = format!("<w:tbl>{}</w:tbl>", row(&[cell(styled_control)]));
    let template = build_docx(&document_xml(&table), &[]);
    let request = ordered_request(&[&["Alice"]]);
    let output = fill_document(&template, &request).unwrap();

    let xml = read_part(&output, "word/document.xml");
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let run = doc
        .descendants()
        .find(|n| n.tag_name().name() == "r" && n.descendants().any(|t| t.text() == Some("Alice")))
        .expect("filled run missing");
    let rpr = run
        .children()
        .find(|n| n.tag_name().name() == "rPr")
        .expect("run properties dropped");
    assert!(rpr.children().any(|n| n.tag_name().name() == "b"));
    assert!(rpr.children().any(|n| n.tag_name().name() == "i"));
}

#[test]
fn a_single_fill_is_deterministic() {
    let template = student_table_docx();
    let request = ordered_request(&[&["Alice", "A"], &["Bob", "B"]]);
    let first = fill_document(&template, &request).unwrap();
    let second = fill_document(&template, &request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn the_template_bytes_are_never_mutated() {
    let template = student_table_docx();
    let pristine = template.clone();
    let request = ordered_request(&[&["Alice", "A"]]);
    let _ = fill_document(&template, &request).unwrap();
    assert_eq!(template, pristine);

    // The reader entry point copies the stream before any work happens.
    let output = fill_document_from_reader(pristine.as_slice(), &request).unwrap();
    assert!(!output.is_empty());
}

#[test]
fn garbage_bytes_fail_without_output() {
    let request = ordered_request(&[&["v"]]);
    assert!(fill_document(b"not a docx", &request).is_err());
}
