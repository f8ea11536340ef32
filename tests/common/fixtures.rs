//! HTML pages and asset bytes served by the mock site

/// A 1x1 transparent PNG
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Minimal PDF body
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%%EOF\n";

/// Notice page with one paragraph, one image and a two-row table
///
/// `images` are the `src` values of the images placed inside the body cell,
/// `attachments` are `(href, link text)` pairs of the file box.
pub fn notice_page(images: &[&str], attachments: &[(&str, &str)]) -> String {
    let images: String = images
        .iter()
        .enumerate()
        .map(|(i, src)| format!(r#"<img src="{}" alt="첨부 이미지 {}">"#, src, i + 1))
        .collect();
    let links: String = attachments
        .iter()
        .map(|(href, text)| format!(r#"<li><a href="{}">{}</a></li>"#, href, text))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="ko"><head><meta charset="UTF-8"><title>공지사항</title></head>
<body>
<div id="header">메뉴</div>
<dl id="board_item_list">
  <dt class="no-print"><a href="javascript:print()">인쇄</a></dt>
  <dt>2025학년도 1학기 수강신청 안내</dt>
  <dd>
    <p>수강신청 일정을&nbsp;확인하세요.</p>
    {}
    <table>
      <tr><th>학년</th><th>일정</th></tr>
      <tr><td>4학년</td><td>2월 10일</td></tr>
    </table>
  </dd>
</dl>
<div class="fileBox"><div class="fileList"><ul>{}</ul></div></div>
</body></html>"#,
        images, links
    )
}

/// Guide page in the `#body .sub-step` layout
pub const GUIDE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="ko"><body>
<div id="body"><div class="sub-step">
  <h3>1. 교육과정 편성</h3>
  <p>전공과 교양으로 구성됩니다.</p>
  <h4>전공</h4>
  <ul>
    <li>1. 전공필수
      <ul><li>캡스톤디자인</li></ul>
    </li>
    <li>2. 전공선택</li>
  </ul>
  <h3>2. 평균 성적산출 기준</h3>
  <p>제외 대상</p>
  <h3>3. 졸업요건</h3>
  <table>
    <tr><th>구분</th><th>학점</th></tr>
    <tr><td>전공</td><td>60</td></tr>
  </table>
</div></div>
</body></html>"#;
