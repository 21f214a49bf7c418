//! Printable sheet layouts: ballot labels, placeholder pages and audit-board
//! credentials.
//!
//! A layout is a list of pages of positioned items on US Letter paper, in
//! millimetres from the top-left corner. Rendering to PDF is left to the
//! consumer of the exported JSON.

use arlo_core::audit_board_url;
use arlo_core::model::{AuditBoard, Ballot};
use serde::Serialize;

pub const PAGE_WIDTH_MM: f64 = 215.9;
pub const PAGE_HEIGHT_MM: f64 = 279.4;

const PT_TO_MM: f64 = 25.4 / 72.0;
const LINE_HEIGHT_FACTOR: f64 = 1.15;

const LABELS_PER_PAGE: usize = 30;
const LABEL_FONT: f64 = 9.0;
const LABEL_WIDTH: f64 = 60.0;
const PLACEHOLDER_FONT: f64 = 20.0;
const WIDE_TEXT: f64 = 180.0;

const SCAN_INSTRUCTIONS: &str =
    "Scan this QR code to enter the votes you see on your assigned ballots.";
const URL_INSTRUCTIONS: &str = "If you are not able to scan the QR code, you may also type the following URL into a web browser to access the data entry portal.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDocument {
    pub title: String,
    pub page_width: f64,
    pub page_height: f64,
    pub pages: Vec<SheetPage>,
}

impl SheetDocument {
    fn new(title: String) -> Self {
        Self {
            title,
            page_width: PAGE_WIDTH_MM,
            page_height: PAGE_HEIGHT_MM,
            pages: vec![SheetPage::default()],
        }
    }

    fn current_page(&mut self) -> &mut SheetPage {
        if self.pages.is_empty() {
            self.pages.push(SheetPage::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn add_page(&mut self) {
        self.pages.push(SheetPage::default());
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SheetPage {
    pub items: Vec<SheetItem>,
}

impl SheetPage {
    fn is_blank(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SheetItem {
    #[serde(rename_all = "camelCase")]
    Text {
        x: f64,
        y: f64,
        font_size: f64,
        bold: bool,
        lines: Vec<String>,
    },
    QrCode {
        x: f64,
        y: f64,
        size: f64,
        payload: String,
    },
    Link {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        url: String,
    },
}

fn text(x: f64, y: f64, font_size: f64, lines: Vec<String>) -> SheetItem {
    SheetItem::Text {
        x,
        y,
        font_size,
        bold: false,
        lines,
    }
}

/// Splits `input` into lines no wider than `width_mm` at `font_size` points,
/// assuming an average glyph width of half the font size. Words longer than
/// a line are broken.
pub fn wrap_text(input: &str, width_mm: f64, font_size: f64) -> Vec<String> {
    let glyph_mm = font_size / 2.0 * PT_TO_MM;
    let max_chars = ((width_mm / glyph_mm).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in input.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            let piece: String = piece.iter().collect();
            let needed = if current.is_empty() {
                piece.chars().count()
            } else {
                current.chars().count() + 1 + piece.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Rendered height of `lines` at `font_size`, in millimetres.
pub fn text_height(lines: &[String], font_size: f64) -> f64 {
    lines.len() as f64 * font_size * LINE_HEIGHT_FACTOR * PT_TO_MM
}

fn board_name(ballot: &Ballot) -> &str {
    ballot
        .audit_board
        .as_ref()
        .map_or("", |board| board.name.as_str())
}

fn label_x(slot: usize) -> f64 {
    let column = (slot % 3) as f64;
    column * 60.0 + 9.0 * (column + 1.0)
}

fn label_ys(slot: usize) -> [f64; 3] {
    let row = (slot / 3) as f64 * 25.5;
    [row + 20.0, row + 25.0, row + 34.0]
}

/// Sticker labels, 30 per page in three columns. `None` when there is
/// nothing to print.
pub fn labels(
    round_num: u32,
    ballots: &[Ballot],
    jurisdiction_name: &str,
    audit_name: &str,
) -> Option<SheetDocument> {
    if ballots.is_empty() {
        return None;
    }
    let mut doc = SheetDocument::new(format!(
        "Round {round_num} Labels - {jurisdiction_name} - {audit_name}"
    ));
    for (index, ballot) in ballots.iter().enumerate() {
        let slot = index % LABELS_PER_PAGE;
        if index > 0 && slot == 0 {
            doc.add_page();
        }
        let x = label_x(slot);
        let [name_y, batch_y, number_y] = label_ys(slot);
        let name = wrap_text(board_name(ballot), LABEL_WIDTH, LABEL_FONT)
            .into_iter()
            .take(1)
            .collect();
        let batch = wrap_text(
            &format!("Batch Name: {}", ballot.batch.name),
            LABEL_WIDTH,
            LABEL_FONT,
        );
        let page = doc.current_page();
        page.items.push(text(x, name_y, LABEL_FONT, name));
        page.items.push(text(x, batch_y, LABEL_FONT, batch));
        page.items.push(text(
            x,
            number_y,
            LABEL_FONT,
            vec![format!("Ballot Number: {}", ballot.position)],
        ));
    }
    Some(doc)
}

/// One full-page placeholder per ballot, left in the batch where the
/// ballot was pulled.
pub fn placeholders(
    round_num: u32,
    ballots: &[Ballot],
    jurisdiction_name: &str,
    audit_name: &str,
) -> Option<SheetDocument> {
    if ballots.is_empty() {
        return None;
    }
    let mut doc = SheetDocument::new(format!(
        "Round {round_num} Placeholders - {jurisdiction_name} - {audit_name}"
    ));
    for (index, ballot) in ballots.iter().enumerate() {
        if index > 0 {
            doc.add_page();
        }
        let name = wrap_text(board_name(ballot), WIDE_TEXT, PLACEHOLDER_FONT);
        let batch = wrap_text(
            &format!("Batch Name: {}", ballot.batch.name),
            WIDE_TEXT,
            PLACEHOLDER_FONT,
        );
        let page = doc.current_page();
        page.items.push(text(20.0, 20.0, PLACEHOLDER_FONT, name));
        page.items.push(text(20.0, 40.0, PLACEHOLDER_FONT, batch));
        page.items.push(text(
            20.0,
            100.0,
            PLACEHOLDER_FONT,
            vec![format!("Ballot Number: {}", ballot.position)],
        ));
    }
    Some(doc)
}

/// One credentials page per board with sampled ballots, then a page listing
/// the boards that have none.
pub fn credentials(
    boards: &[AuditBoard],
    origin: &str,
    jurisdiction_name: &str,
    audit_name: &str,
) -> SheetDocument {
    let mut doc = SheetDocument::new(format!(
        "Audit Board Credentials - {jurisdiction_name} - {audit_name}"
    ));
    let mut without_ballots = Vec::new();

    for board in boards {
        if board.current_round_status.num_sampled_ballots == 0 {
            without_ballots.push(board.name.as_str());
            continue;
        }
        if !doc.current_page().is_blank() {
            doc.add_page();
        }
        let url = audit_board_url(origin, &board.passphrase);
        let url_lines = wrap_text(&url, WIDE_TEXT, 14.0);
        let url_height = text_height(&url_lines, 14.0);

        let page = doc.current_page();
        page.items.push(SheetItem::Text {
            x: 20.0,
            y: 20.0,
            font_size: 22.0,
            bold: true,
            lines: vec![board.name.clone()],
        });
        page.items.push(text(20.0, 40.0, 14.0, vec![SCAN_INSTRUCTIONS.to_string()]));
        page.items.push(SheetItem::QrCode {
            x: 20.0,
            y: 50.0,
            size: 50.0,
            payload: url.clone(),
        });
        page.items.push(text(
            20.0,
            120.0,
            14.0,
            wrap_text(URL_INSTRUCTIONS, WIDE_TEXT, 14.0),
        ));
        page.items.push(text(20.0, 140.0, 14.0, url_lines));
        page.items.push(SheetItem::Link {
            x: 0.0,
            y: 130.0,
            width: 220.0,
            height: url_height + 10.0,
            url,
        });
    }

    if !without_ballots.is_empty() {
        if !doc.current_page().is_blank() {
            doc.add_page();
        }
        let page = doc.current_page();
        for (i, name) in without_ballots.iter().enumerate() {
            page.items.push(text(
                20.0,
                i as f64 * 10.0 + 20.0,
                14.0,
                vec![format!("{name}: No ballots")],
            ));
        }
    }
    doc
}
