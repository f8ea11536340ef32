use super::*;
use crate::dom::{Element, parse_selector, select_all};
use crate::text::ExcludeTerms;
use scraper::Html;
use serde_json::json;
use url::Url;

/// First element of `html` matching `selector`
fn element(html: &str, selector: &str) -> Element {
    let document = Html::parse_document(html);
    select_all(&document, &parse_selector(selector).unwrap(), &[]).remove(0)
}

fn base() -> Url {
    Url::parse("https://www.example.ac.kr/Home/BBSView.mbz?schIdx=1").unwrap()
}

fn text(value: &str) -> ContentBlock {
    ContentBlock::Text(value.to_string())
}

// ---------------------------------------------------------------------------
// Block extraction
// ---------------------------------------------------------------------------

#[test]
fn br_pairs_split_paragraphs() {
    let root = element(r#"<div id="c"><p>A<br><br>B</p></div>"#, "#c");
    let blocks = extract_blocks(&root, None);
    assert_eq!(blocks, vec![text("A"), ContentBlock::Newline, text("B")]);
}

#[test]
fn single_br_stays_inside_paragraph() {
    let root = element(r#"<div id="c"><p>line one<br/>line two</p></div>"#, "#c");
    assert_eq!(extract_blocks(&root, None), vec![text("line one\nline two")]);
}

#[test]
fn no_newline_after_last_paragraph() {
    let root = element(
        r#"<div id="c"><p>A<br><br><br>B<br><br></p><p>C</p></div>"#,
        "#c",
    );
    let blocks = extract_blocks(&root, None);
    assert_eq!(
        blocks,
        vec![text("A"), ContentBlock::Newline, text("B"), text("C")]
    );
}

#[test]
fn zero_width_and_whitespace_only_containers_emit_nothing() {
    let root = element(
        "<div id=\"c\"><p>\u{200B}</p><span>   </span><div>&nbsp;</div></div>",
        "#c",
    );
    assert!(extract_blocks(&root, None).is_empty());
}

#[test]
fn inline_markup_is_stripped_and_entities_decoded() {
    let root = element(
        r#"<div id="c"><p><strong>신청</strong>   기간 &amp; <a href="/x">방법</a></p></div>"#,
        "#c",
    );
    assert_eq!(extract_blocks(&root, None), vec![text("신청 기간 & 방법")]);
}

#[test]
fn nested_images_and_tables_follow_container_text() {
    let root = element(
        r#"<div id="c"><div><img src="/a.png" alt="first"><p>caption</p><table><tr><td>x</td></tr></table><span><img src="b.png"></span></div></div>"#,
        "#c",
    );
    let base = base();
    let blocks = extract_blocks(&root, Some(&base));

    assert_eq!(blocks.len(), 4);
    assert_eq!(blocks[0], text("caption"));
    let first = blocks[1].as_image().unwrap();
    assert_eq!(first.url, "https://www.example.ac.kr/a.png");
    assert_eq!(first.origin_name, "first");
    assert_eq!(blocks[2], ContentBlock::Table(vec![vec!["x".to_string()]]));
    let second = blocks[3].as_image().unwrap();
    assert_eq!(second.url, "https://www.example.ac.kr/Home/b.png");
    assert_eq!(second.origin_name, "image2.jpg");
}

#[test]
fn image_names_prefer_title_then_alt_then_synthetic() {
    let root = element(
        r#"<div id="c"><img src="/1.jpg" title="poster.png" alt="Poster"><img src="/2.jpg" alt="map.gif"><img src="/3.jpg"><img alt="no source"></div>"#,
        "#c",
    );
    let blocks = extract_blocks(&root, Some(&base()));
    let images: Vec<_> = blocks.iter().filter_map(ContentBlock::as_image).collect();

    assert_eq!(images.len(), 3, "an image without src is skipped");
    assert_eq!(images[0].origin_name, "poster.png");
    assert_eq!(images[0].alt, "Poster");
    assert_eq!(images[1].origin_name, "map.gif");
    assert_eq!(images[1].alt, "map.gif");
    assert_eq!(images[2].origin_name, "image3.jpg");
    assert_eq!(images[2].alt, "");
    assert!(images.iter().all(|i| i.local_path.is_none() && i.file_name.is_none()));
}

#[test]
fn top_level_text_nodes_become_blocks() {
    let root = element(r#"<div id="c">  loose text  <ul><li>ignored</li></ul></div>"#, "#c");
    assert_eq!(extract_blocks(&root, None), vec![text("loose text")]);
}

#[test]
fn table_block_keeps_ragged_rows_and_empty_cells() {
    let root = element(
        r#"<div id="c"><table><tr><th> 구분 </th><th>일정</th></tr><tr><td>1차</td><td></td><td>비고</td></tr></table></div>"#,
        "#c",
    );
    assert_eq!(
        extract_blocks(&root, None),
        vec![ContentBlock::Table(vec![
            vec!["구분".to_string(), "일정".to_string()],
            vec!["1차".to_string(), "".to_string(), "비고".to_string()],
        ])]
    );
}

#[test]
fn paragraph_image_table_in_order() {
    let root = element(
        r#"<div id="c"><p>공지 본문</p><img src="/upload/a.jpg"><table><tr><td>1</td></tr><tr><td>2</td></tr></table></div>"#,
        "#c",
    );
    let blocks = extract_blocks(&root, Some(&base()));
    assert!(matches!(blocks[0], ContentBlock::Text(_)));
    assert!(matches!(blocks[1], ContentBlock::Image(_)));
    assert!(matches!(blocks[2], ContentBlock::Table(_)));
    assert_eq!(blocks.len(), 3);
}

#[test]
fn scoped_extraction_reads_each_dd() {
    let root = element(
        r#"<div id="c"><dl><dt>제목</dt><dd><p>first</p><img src="/x.jpg"></dd></dl><dl><dd><p>second</p><img src="/y.jpg"></dd></dl></div>"#,
        "#c",
    );
    let mut extractor = BlockExtractor::new(None);
    let blocks = extractor.extract_scoped(&root, Some("dd"));

    assert_eq!(blocks[0], text("first"));
    assert_eq!(blocks[2], text("second"));
    let names: Vec<_> = blocks
        .iter()
        .filter_map(ContentBlock::as_image)
        .map(|i| i.origin_name.clone())
        .collect();
    assert_eq!(names, vec!["image1.jpg", "image2.jpg"], "counter spans every scope");
}

#[test]
fn scoped_extraction_falls_back_to_root() {
    let root = element(r#"<div id="c"><p>only</p></div>"#, "#c");
    let blocks = BlockExtractor::new(None).extract_scoped(&root, Some("dd"));
    assert_eq!(blocks, vec![text("only")]);
}

#[test]
fn blocks_serialize_adjacently_tagged() {
    let blocks = vec![
        text("A"),
        ContentBlock::Newline,
        ContentBlock::Table(vec![vec!["a".to_string()]]),
        ContentBlock::Image(ImageBlock {
            url: "https://h/a.jpg".to_string(),
            alt: String::new(),
            origin_name: "image1.jpg".to_string(),
            local_path: None,
            file_name: None,
        }),
    ];
    assert_eq!(
        serde_json::to_value(&blocks).unwrap(),
        json!([
            {"type": "text", "value": "A"},
            {"type": "newline"},
            {"type": "table", "value": [["a"]]},
            {"type": "image", "value": {
                "url": "https://h/a.jpg",
                "alt": "",
                "originName": "image1.jpg",
                "localPath": null,
                "fileName": null
            }}
        ])
    );
    let back: Vec<ContentBlock> =
        serde_json::from_value(serde_json::to_value(&blocks).unwrap()).unwrap();
    assert_eq!(back, blocks);
}

#[test]
fn image_block_attaches_at_most_once() {
    let mut image = ImageBlock {
        url: "u".to_string(),
        alt: String::new(),
        origin_name: "a.jpg".to_string(),
        local_path: None,
        file_name: None,
    };
    assert!(image.attach("a.jpg", "download/1/a.jpg"));
    assert!(!image.attach("b.jpg", "download/1/b.jpg"));
    assert_eq!(image.file_name.as_deref(), Some("a.jpg"));
    assert!(image.is_materialized());
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[test]
fn two_level_list_keeps_structure() {
    let list = element(r#"<ul id="l"><li>1. X<ul><li>a</li></ul></li></ul>"#, "#l");
    let parsed = parse_list(&list, &ExcludeTerms::default());
    assert_eq!(
        serde_json::to_value(&parsed).unwrap(),
        json!({"1": {"text": "X", "children": {"1": "a"}}})
    );
}

#[test]
fn excluded_items_leave_no_gaps() {
    let list = element(
        r#"<ol id="l"><li>keep one</li><li>평균 성적산출 안내<ul><li>hidden</li></ul></li><li>2) keep two</li></ol>"#,
        "#l",
    );
    let parsed = parse_list(&list, &ExcludeTerms::new(["평균 성적산출"]));
    assert_eq!(
        serde_json::to_value(&parsed).unwrap(),
        json!({"1": "keep one", "2": "keep two"})
    );
}

#[test]
fn sibling_nested_lists_share_one_index_space() {
    let list = element(
        r#"<ul id="l"><li>parent<ul><li>a</li></ul><ol><li>b</li></ol></li></ul>"#,
        "#l",
    );
    let parsed = parse_list(&list, &ExcludeTerms::default());
    let SectionChild::Node(node) = parsed.get(1).unwrap() else {
        panic!("expected nested node");
    };
    assert_eq!(node.text, "parent");
    assert_eq!(node.children.len(), 2);
    assert_eq!(node.children.get(2).unwrap().text(), "b");
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[test]
fn header_row_is_split_from_data_rows() {
    let table = element(
        r#"<table id="t"><tr><th>a</th><th>b</th><th>c</th></tr><tr><td>1</td><td>2</td><td>3</td></tr></table>"#,
        "#t",
    );
    let data = parse_table(&table);
    assert_eq!(data.headers.len(), 3);
    assert_eq!(data.rows.len(), 1);
    assert_eq!(data.flatten(), vec!["a | b | c", "1 | 2 | 3"]);
}

#[test]
fn thead_row_is_header_even_after_tbody() {
    let table = element(
        r#"<table id="t"><tbody><tr><td>1</td></tr><tr><td> </td></tr></tbody><thead><tr><th>h</th></tr></thead></table>"#,
        "#t",
    );
    let data = parse_table(&table);
    assert_eq!(data.headers, vec!["h"]);
    assert_eq!(data.rows, vec![vec!["1".to_string()]], "blank row dropped");
}

#[test]
fn nested_table_rows_stay_with_their_table() {
    let table = element(
        r#"<table id="t"><tr><td>outer<table><tr><td>inner</td></tr></table></td></tr></table>"#,
        "#t",
    );
    assert_eq!(table_rows(&table).len(), 1);
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[test]
fn headings_own_siblings_until_same_level() {
    let root = element(
        r#"<div class="sub-step"><h3>신청 안내</h3><p>1. 기간 확인</p><h4>세부</h4><p>detail</p><h3>문의</h3><p>학생지원팀</p></div>"#,
        ".sub-step",
    );
    let sections = parse_sections(&root, &ExcludeTerms::default());
    assert_eq!(
        serde_json::to_value(&sections).unwrap(),
        json!({
            "1": {"text": "신청 안내", "children": {"1": "기간 확인", "2": "세부", "3": "detail"}},
            "2": {"text": "세부", "children": {"1": "detail"}},
            "3": {"text": "문의", "children": {"1": "학생지원팀"}}
        })
    );
}

#[test]
fn excluded_heading_drops_its_subtree_and_indices_stay_dense() {
    let root = element(
        r#"<div class="sub-step"><h2>개요</h2><p>intro</p><h2>평균 성적산출 기준</h2><p>hidden</p><h3>hidden sub</h3><p>hidden too</p><h2>일정</h2><p>평균 성적산출 참고</p><p>visible</p></div>"#,
        ".sub-step",
    );
    let sections = parse_sections(&root, &ExcludeTerms::new(["평균 성적산출"]));
    assert_eq!(
        serde_json::to_value(&sections).unwrap(),
        json!({
            "1": {"text": "개요", "children": {"1": "intro"}},
            "2": {"text": "일정", "children": {"1": "visible"}}
        })
    );
}

#[test]
fn excluded_subheading_span_stays_out_of_parent_section() {
    let root = element(
        r#"<div class="sub-step"><h2>A</h2><p>x</p><h3>평균 성적산출</h3><p>secret</p><h4>deeper</h4><p>secret too</p><h3>kept</h3><p>z</p><h2>B</h2><p>y</p></div>"#,
        ".sub-step",
    );
    let sections = parse_sections(&root, &ExcludeTerms::new(["평균 성적산출"]));
    assert_eq!(
        serde_json::to_value(&sections).unwrap(),
        json!({
            "1": {"text": "A", "children": {"1": "x", "2": "kept", "3": "z"}},
            "2": {"text": "kept", "children": {"1": "z"}},
            "3": {"text": "B", "children": {"1": "y"}}
        })
    );
}

#[test]
fn table_rows_are_excluded_whole() {
    let root = element(
        r#"<div class="sub-step"><h2>성적</h2><table><tr><th>항목</th><th>값</th></tr><tr><td>평균 성적산출</td><td>3.5</td></tr><tr><td>학점</td><td>130</td></tr></table></div>"#,
        ".sub-step",
    );
    let exclude = ExcludeTerms::new(["평균 성적산출"]);
    assert_eq!(
        serde_json::to_value(parse_sections(&root, &exclude)).unwrap(),
        json!({"1": {"text": "성적", "children": {"1": "항목 | 값", "2": "학점 | 130"}}})
    );

    let flat = element(
        r#"<div class="sub-step"><table><tr><td>평균 성적산출</td><td>3.5</td></tr><tr><td>학점</td><td>130</td></tr></table></div>"#,
        ".sub-step",
    );
    assert_eq!(
        serde_json::to_value(parse_sections(&flat, &exclude)).unwrap(),
        json!({"1": {"text": "표", "children": {"1": "학점 | 130"}}})
    );
}

#[test]
fn section_lists_and_tables_are_flattened() {
    let root = element(
        r#"<div class="sub-step"><h3>서류</h3><ul><li>1) 신청서</li><li>성적증명서</li></ul><table><tr><th>구분</th><th>기한</th></tr><tr><td>1학기</td><td>3월</td></tr></table></div>"#,
        ".sub-step",
    );
    let sections = parse_sections(&root, &ExcludeTerms::default());
    assert_eq!(
        serde_json::to_value(&sections).unwrap(),
        json!({"1": {"text": "서류", "children": {
            "1": "신청서",
            "2": "성적증명서",
            "3": "구분 | 기한",
            "4": "1학기 | 3월"
        }}})
    );
}

#[test]
fn headingless_root_falls_back_to_flat_sections() {
    let root = element(
        r#"<div class="sub-step">lead text<ul><li>a</li></ul><table><tr><td>x</td><td>y</td></tr><tr><td>1</td><td>2</td></tr></table><p>3. tail</p><p> </p></div>"#,
        ".sub-step",
    );
    let sections = parse_sections(&root, &ExcludeTerms::default());
    assert_eq!(
        serde_json::to_value(&sections).unwrap(),
        json!({
            "1": {"text": "lead text", "children": {}},
            "2": {"text": "목록 (UL)", "children": {"1": "a"}},
            "3": {"text": "표", "children": {"1": "x | y", "2": "1 | 2"}},
            "4": {"text": "tail", "children": {}}
        })
    );
}
