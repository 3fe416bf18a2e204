//! OCR for image-based menu PDFs.
//!
//! Pages are rendered with `pdftoppm` and read with `tesseract`. The TSV output
//! keeps word positions, which is what the table layout detection below works
//! from: the German weekday headers give the day columns, vertical gaps inside
//! a column give the dish rows.

use crate::error::ExtractError;
use crate::model::Day;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// Uniform block of text.
pub const PSM_BLOCK: u8 = 6;
/// Sparse text, used for page layout scans.
pub const PSM_SPARSE: u8 = 11;

const FOOTER_GAP: f32 = 6.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrSettings {
    pub dpi: u32,
    pub lang: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            dpi: 300,
            lang: "deu".to_string(),
        }
    }
}

pub fn ensure_tools() -> Result<(), ExtractError> {
    for tool in ["pdftoppm", "tesseract"] {
        if which::which(tool).is_err() {
            return Err(ExtractError::OcrUnavailable(tool));
        }
    }
    Ok(())
}

/// Rendered page images. The files live as long as this value.
#[derive(Debug)]
pub struct Rasterized {
    _dir: TempDir,
    pub pages: Vec<PathBuf>,
}

pub async fn rasterize(bytes: &[u8], dpi: u32) -> Result<Rasterized, ExtractError> {
    ensure_tools()?;
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("menu.pdf");
    tokio::fs::write(&input, bytes).await?;

    let output = Command::new("pdftoppm")
        .arg("-r")
        .arg(dpi.to_string())
        .arg("-png")
        .arg(&input)
        .arg(dir.path().join("page"))
        .output()
        .await?;
    if !output.status.success() {
        return Err(ExtractError::tool_failed("pdftoppm", &output.stderr));
    }

    let mut pages = Vec::new();
    let mut entries = tokio::fs::read_dir(dir.path()).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "png") {
            pages.push(path);
        }
    }
    // pdftoppm zero-pads page numbers, so lexical order is page order.
    pages.sort();
    info!(pages = pages.len(), dpi, "rasterized PDF");

    Ok(Rasterized { _dir: dir, pages })
}

async fn run_tesseract(
    image: &Path,
    lang: &str,
    psm: u8,
    tsv: bool,
) -> Result<String, ExtractError> {
    let mut cmd = Command::new("tesseract");
    cmd.arg(image)
        .arg("stdout")
        .arg("-l")
        .arg(lang)
        .arg("--psm")
        .arg(psm.to_string());
    if tsv {
        cmd.arg("tsv");
    }
    let output = cmd.output().await?;
    if !output.status.success() {
        return Err(ExtractError::tool_failed("tesseract", &output.stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub async fn recognize_text(image: &Path, lang: &str, psm: u8) -> Result<String, ExtractError> {
    run_tesseract(image, lang, psm, false).await
}

pub async fn recognize_words(image: &Path, lang: &str, psm: u8) -> Result<OcrPage, ExtractError> {
    let tsv = run_tesseract(image, lang, psm, true).await?;
    let page = parse_tsv(&tsv);
    debug!(image = %image.display(), words = page.words.len(), "recognized words");
    Ok(page)
}

/// Rasterizes every page and reads its words for layout analysis.
pub async fn ocr_pages(bytes: &[u8], settings: &OcrSettings) -> Result<Vec<OcrPage>, ExtractError> {
    let rasterized = rasterize(bytes, settings.dpi).await?;
    let mut pages = Vec::with_capacity(rasterized.pages.len());
    for image in &rasterized.pages {
        pages.push(recognize_words(image, &settings.lang, PSM_SPARSE).await?);
    }
    Ok(pages)
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub conf: f32,
    /// Tesseract (block, paragraph, line) numbers.
    pub line: (u32, u32, u32),
}

impl OcrWord {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.left as f32 + self.width as f32 / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.top as f32 + self.height as f32 / 2.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrPage {
    pub width: u32,
    pub height: u32,
    pub words: Vec<OcrWord>,
}

impl OcrPage {
    /// Reading-order text, one tesseract line per output line.
    pub fn text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut current: Option<(u32, u32, u32)> = None;
        for word in &self.words {
            match lines.last_mut() {
                Some(line) if current == Some(word.line) => {
                    line.push(' ');
                    line.push_str(&word.text);
                }
                _ => lines.push(word.text.clone()),
            }
            current = Some(word.line);
        }
        lines.join("\n")
    }
}

/// Parses `tesseract ... tsv` output. Only word-level rows with text are kept.
pub fn parse_tsv(tsv: &str) -> OcrPage {
    let mut page = OcrPage::default();
    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 11 {
            continue;
        }
        let num = |i: usize| cols[i].trim().parse::<u32>().ok();
        // The header row fails to parse here and is skipped.
        let (Some(level), Some(left), Some(top), Some(width), Some(height)) =
            (num(0), num(6), num(7), num(8), num(9))
        else {
            continue;
        };

        if level == 1 {
            page.width = width;
            page.height = height;
            continue;
        }
        if level != 5 {
            continue;
        }

        let text = cols.get(11).map(|t| t.trim()).unwrap_or("");
        let conf = cols[10].trim().parse::<f32>().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }
        page.words.push(OcrWord {
            text: text.to_string(),
            left,
            top,
            width,
            height,
            conf,
            line: (num(2).unwrap_or(0), num(3).unwrap_or(0), num(4).unwrap_or(0)),
        });
    }

    if page.width == 0 {
        page.width = page.words.iter().map(OcrWord::right).max().unwrap_or(0);
    }
    if page.height == 0 {
        page.height = page.words.iter().map(OcrWord::bottom).max().unwrap_or(0);
    }
    page
}

/// Matches a German weekday header, tolerating one OCR error.
pub fn match_day_header(word: &str) -> Option<Day> {
    let letters: String = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect();
    if letters.chars().count() < 5 {
        return None;
    }
    Day::ALL.into_iter().find(|day| {
        let target = day.german().to_uppercase();
        letters == target || strsim::levenshtein(&letters, &target) <= 1
    })
}

/// A day's column of a menu table in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayColumn {
    pub day: Day,
    pub x_start: u32,
    pub x_end: u32,
    pub y_start: u32,
    pub y_end: u32,
}

/// Finds the weekday columns of a menu table from its header row.
pub fn detect_day_columns(page: &OcrPage) -> Option<Vec<DayColumn>> {
    let mut hits: Vec<(Day, &OcrWord)> = page
        .words
        .iter()
        .filter_map(|word| match_day_header(&word.text).map(|day| (day, word)))
        .collect();
    hits.sort_by_key(|(_, word)| word.top);

    let mut rows: Vec<Vec<(Day, &OcrWord)>> = Vec::new();
    for hit in hits {
        match rows.last_mut() {
            Some(row) if same_row(row[0].1, hit.1) => row.push(hit),
            _ => rows.push(vec![hit]),
        }
    }

    let mut best: Option<BTreeMap<Day, &OcrWord>> = None;
    for row in rows {
        let mut per_day: BTreeMap<Day, &OcrWord> = BTreeMap::new();
        for (day, word) in row {
            per_day.entry(day).or_insert(word);
        }
        if best.as_ref().is_none_or(|b| per_day.len() > b.len()) {
            best = Some(per_day);
        }
    }
    let headers = best?;
    if headers.len() < 3 {
        return None;
    }

    let mut known: Vec<(Day, f32)> = headers
        .iter()
        .map(|(day, word)| (*day, word.center_x()))
        .collect();
    known.sort_by(|a, b| a.1.total_cmp(&b.1));
    if known.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
        debug!("day headers out of week order");
        return None;
    }

    let (first_day, first_x) = known[0];
    let (last_day, last_x) = known[known.len() - 1];
    let pitch = (last_x - first_x) / (last_day.index() - first_day.index()) as f32;
    let width = page.width as f32;

    let centers: Vec<(Day, f32)> = Day::ALL
        .into_iter()
        .filter_map(|day| {
            let center = known
                .iter()
                .find(|(known_day, _)| *known_day == day)
                .map(|(_, x)| *x)
                .unwrap_or_else(|| {
                    first_x + (day.index() as f32 - first_day.index() as f32) * pitch
                });
            (center >= 0.0 && center <= width).then_some((day, center))
        })
        .collect();

    let y_start = headers.values().map(|word| word.bottom()).max().unwrap_or(0);
    let y_end = content_end(page, y_start);
    let columns = centers
        .iter()
        .enumerate()
        .map(|(i, (day, center))| {
            let x_start = if i == 0 {
                let next = centers.get(1).map(|(_, x)| *x).unwrap_or(width);
                (center - (next - center) / 2.0).max(0.0)
            } else {
                (centers[i - 1].1 + center) / 2.0
            };
            let x_end = match centers.get(i + 1) {
                Some((_, next)) => (center + next) / 2.0,
                None => width,
            };
            DayColumn {
                day: *day,
                x_start: x_start.round() as u32,
                x_end: x_end.round() as u32,
                y_start,
                y_end,
            }
        })
        .collect::<Vec<_>>();

    debug!(columns = columns.len(), y_start, y_end, "detected day columns");
    Some(columns)
}

/// Bottom of the last table row. Text below a gap of `FOOTER_GAP` median word
/// heights is page furniture, not menu.
fn content_end(page: &OcrPage, y_start: u32) -> u32 {
    let mut body: Vec<&OcrWord> = page.words.iter().filter(|w| w.top >= y_start).collect();
    if body.is_empty() {
        return page.height;
    }
    body.sort_by_key(|word| word.top);

    let mut heights: Vec<u32> = body.iter().map(|word| word.height).collect();
    heights.sort_unstable();
    let limit = heights[heights.len() / 2] as f32 * FOOTER_GAP;

    let mut bottom = body[0].bottom();
    for word in &body[1..] {
        if word.top as f32 - bottom as f32 > limit {
            return bottom;
        }
        bottom = bottom.max(word.bottom());
    }
    page.height
}

/// True when `word` sits on the same visual row as `anchor`.
pub fn same_row(anchor: &OcrWord, word: &OcrWord) -> bool {
    let tolerance = anchor.height.max(word.height) as i64;
    (word.top as i64 - anchor.top as i64).abs() <= tolerance
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub bottom: u32,
}

impl OcrLine {
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Visual lines of one column, top to bottom.
pub fn column_lines(page: &OcrPage, column: &DayColumn) -> Vec<OcrLine> {
    let mut words: Vec<&OcrWord> = page
        .words
        .iter()
        .filter(|word| {
            let x = word.center_x();
            x >= column.x_start as f32
                && x < column.x_end as f32
                && word.top >= column.y_start
                && word.bottom() <= column.y_end
        })
        .collect();
    words.sort_by_key(|word| (word.top, word.left));

    let mut grouped: Vec<Vec<&OcrWord>> = Vec::new();
    for word in words {
        let existing = grouped.iter_mut().find(|line| {
            line.iter().any(|other| {
                other.line == word.line
                    || (word.center_y() >= other.top as f32
                        && word.center_y() <= other.bottom() as f32)
            })
        });
        match existing {
            Some(line) => line.push(word),
            None => grouped.push(vec![word]),
        }
    }

    let mut lines: Vec<OcrLine> = grouped
        .into_iter()
        .map(|mut line| {
            line.sort_by_key(|word| word.left);
            OcrLine {
                text: line
                    .iter()
                    .map(|word| word.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                left: line.iter().map(|word| word.left).min().unwrap_or(0),
                top: line.iter().map(|word| word.top).min().unwrap_or(0),
                bottom: line.iter().map(|word| word.bottom()).max().unwrap_or(0),
            }
        })
        .collect();
    lines.sort_by_key(|line| line.top);
    lines
}

/// Splits a column into blocks wherever the vertical gap exceeds 1.5x the median line height.
pub fn split_rows(lines: &[OcrLine]) -> Vec<Vec<OcrLine>> {
    if lines.is_empty() {
        return Vec::new();
    }
    let mut heights: Vec<u32> = lines.iter().map(OcrLine::height).collect();
    heights.sort_unstable();
    let threshold = heights[heights.len() / 2] as f32 * 1.5;

    let mut blocks: Vec<Vec<OcrLine>> = vec![vec![lines[0].clone()]];
    for pair in lines.windows(2) {
        let gap = pair[1].top.saturating_sub(pair[0].bottom) as f32;
        if gap > threshold {
            blocks.push(Vec::new());
        }
        if let Some(block) = blocks.last_mut() {
            block.push(pair[1].clone());
        }
    }
    blocks
}

pub fn lines_text(lines: &[OcrLine]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// True when the page header is the English edition of a bilingual menu.
pub fn is_english_page(page: &OcrPage) -> bool {
    let header_limit = page.height as f32 * 0.15;
    page.words
        .iter()
        .filter(|word| (word.top as f32) < header_limit)
        .any(|word| {
            let lower = word.text.to_lowercase();
            lower.contains("monday") || lower.contains("week")
        })
}
