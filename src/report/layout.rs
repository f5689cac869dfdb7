//! 报告排版
//!
//! 纯函数：相同的日志文本和生成时间得到相同的分页和坐标。
//! 坐标单位为毫米，原点在页面左上角，`baseline_mm` 为文字基线到页面顶部的距离

use chrono::NaiveDateTime;

use crate::services::session_log::NO_DATA_PLACEHOLDER;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
/// 左、上、右页边距
pub const MARGIN_MM: f32 = 10.0;
/// 自动分页的下边距
pub const BOTTOM_MARGIN_MM: f32 = 15.0;
/// 单元格内左右留白
const CELL_PADDING_MM: f32 = 1.0;

pub const TITLE: &str = "Questions / Answers";
const TITLE_SIZE_PT: f32 = 14.0;
const TITLE_ROW_MM: f32 = 10.0;
const STAMP_SIZE_PT: f32 = 10.0;
const STAMP_ROW_MM: f32 = 8.0;
const HEADER_GAP_MM: f32 = 4.0;
pub const BODY_SIZE_PT: f32 = 12.0;
pub const BODY_ROW_MM: f32 = 7.0;

/// Courier 每个字符的宽度（em 的比例）
const COURIER_ADVANCE_EM: f32 = 0.6;

const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    HelveticaBold,
    Helvetica,
    Courier,
}

impl FontFace {
    pub const ALL: [FontFace; 3] = [FontFace::HelveticaBold, FontFace::Helvetica, FontFace::Courier];

    /// PDF 资源字典中的名字
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::HelveticaBold => "F1",
            FontFace::Helvetica => "F2",
            FontFace::Courier => "F3",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::HelveticaBold => "Helvetica-Bold",
            FontFace::Helvetica => "Helvetica",
            FontFace::Courier => "Courier",
        }
    }
}

/// 已定位的一行文字
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub face: FontFace,
    pub size_pt: f32,
    pub x_mm: f32,
    pub baseline_mm: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 正文行（不含标题和时间行），按顺序
    pub fn body_lines(&self) -> impl Iterator<Item = &PlacedLine> {
        self.pages
            .iter()
            .flat_map(|page| page.lines.iter())
            .filter(|line| line.face == FontFace::Courier)
    }
}

/// 报告第二行显示的生成时间
pub fn stamp_line(generated_at: NaiveDateTime) -> String {
    format!("Generated on {}", generated_at.format("%Y-%m-%d %H:%M:%S"))
}

/// 正文每行最多容纳的字符数
pub fn body_chars_per_line() -> usize {
    let printable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM - 2.0 * CELL_PADDING_MM;
    let advance = COURIER_ADVANCE_EM * BODY_SIZE_PT * MM_PER_PT;
    (printable / advance).floor() as usize
}

/// 排版整份报告
///
/// 日志首尾空白会被去掉；为空时只输出占位行。空行保留为一行空白
pub fn layout(log_text: &str, generated_at: NaiveDateTime) -> Layout {
    let mut cursor = Cursor::new();

    cursor.place(TITLE, FontFace::HelveticaBold, TITLE_SIZE_PT, TITLE_ROW_MM);
    cursor.place(&stamp_line(generated_at), FontFace::Helvetica, STAMP_SIZE_PT, STAMP_ROW_MM);
    cursor.skip(HEADER_GAP_MM);

    let text = match log_text.trim() {
        "" => NO_DATA_PLACEHOLDER,
        trimmed => trimmed,
    };

    let max_chars = body_chars_per_line();
    for line in text.lines() {
        let line = line.replace('\t', " ");
        if line.trim().is_empty() {
            cursor.place("", FontFace::Courier, BODY_SIZE_PT, BODY_ROW_MM);
            continue;
        }
        for row in wrap_line(&line, max_chars) {
            cursor.place(&row, FontFace::Courier, BODY_SIZE_PT, BODY_ROW_MM);
        }
    }

    cursor.finish()
}

/// 按单词折行；单个单词超过一行时硬折断
pub fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if max_chars == 0 || chars.len() <= max_chars {
        return vec![line.to_string()];
    }

    let mut rows = Vec::new();
    let mut start = 0;
    while chars.len() - start > max_chars {
        // 包含行宽之后的那个字符，空格正好落在边界上时整行可用
        let window = &chars[start..=start + max_chars];
        match window.iter().rposition(|c| *c == ' ').filter(|&i| i > 0) {
            Some(i) => {
                rows.push(window[..i].iter().collect());
                start += i + 1;
            }
            None => {
                rows.push(window[..max_chars].iter().collect());
                start += max_chars;
            }
        }
    }
    if start < chars.len() {
        rows.push(chars[start..].iter().collect());
    }
    rows
}

/// 纵向游标，超出可用高度时换页
struct Cursor {
    pages: Vec<Page>,
    y_mm: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y_mm: MARGIN_MM,
        }
    }

    fn place(&mut self, text: &str, face: FontFace, size_pt: f32, row_mm: f32) {
        if self.y_mm + row_mm > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            self.pages.push(Page::default());
            self.y_mm = MARGIN_MM;
        }

        if !text.is_empty() {
            let baseline_mm = self.y_mm + row_mm / 2.0 + 0.3 * size_pt * MM_PER_PT;
            if let Some(page) = self.pages.last_mut() {
                page.lines.push(PlacedLine {
                    text: text.to_string(),
                    face,
                    size_pt,
                    x_mm: MARGIN_MM + CELL_PADDING_MM,
                    baseline_mm,
                });
            }
        }
        self.y_mm += row_mm;
    }

    fn skip(&mut self, gap_mm: f32) {
        self.y_mm += gap_mm;
    }

    fn finish(self) -> Layout {
        Layout { pages: self.pages }
    }
}
