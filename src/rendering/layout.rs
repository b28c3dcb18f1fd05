/// Card face layout: places the contact fields on an 85x55mm card.
///
/// Coordinates are in layout pixels (CSS pixels at 96 dpi); rasterizers scale
/// them to device pixels.

use crate::contact::ContactRecord;
use crate::rendering::font;
use crate::rendering::Face;
use crate::vcard;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 85mm at 96 dpi
pub const CARD_WIDTH_PX: u32 = 321;
/// 55mm at 96 dpi
pub const CARD_HEIGHT_PX: u32 = 208;
pub const CARD_PADDING_PX: u32 = 16;
pub const CARD_CORNER_RADIUS_PX: u32 = 8;

const NAME_FONT_PX: f32 = 10.0;
const DETAIL_FONT_PX: f32 = 8.0;
const LINE_SPACING: f32 = 1.5;
const LOGO_INSET_PX: u32 = 8;
const LOGO_BOX: (u32, u32) = (192, 64);

/// Visual arrangement of the front face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CardTemplate {
    /// Logo top-right, every detail line with labels, empty lines kept
    #[default]
    Classic,
    /// No logo, no labels, empty fields left out
    Minimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A positioned element on a face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Name,
    Detail,
    Logo,
    QrCode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Text { text: String, font_px: f32, bold: bool },
    /// Image file scaled to fit the node box, keeping its aspect ratio
    Image { path: PathBuf },
    /// QR code filling the node box
    QrCode { payload: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub elem_type: ElementType,
    pub content: NodeContent,
}

/// Everything a rasterizer needs to draw one face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLayout {
    pub face: Face,
    pub width: u32,
    pub height: u32,
    /// Card surface colour, painted as a rounded rectangle
    pub surface: [u8; 4],
    pub corner_radius: u32,
    pub nodes: Vec<LayoutNode>,
}

impl FaceLayout {
    fn blank(face: Face) -> Self {
        Self {
            face,
            width: CARD_WIDTH_PX,
            height: CARD_HEIGHT_PX,
            surface: [255, 255, 255, 255],
            corner_radius: CARD_CORNER_RADIUS_PX,
            nodes: Vec::new(),
        }
    }

    /// Device pixel size at `scale`
    pub fn device_size(&self, scale: f32) -> (u32, u32) {
        let w = (self.width as f32 * scale).round().max(1.0) as u32;
        let h = (self.height as f32 * scale).round().max(1.0) as u32;
        (w, h)
    }

    /// Text of every text node, top to bottom
    pub fn text_lines(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|n| match &n.content {
                NodeContent::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Front face: logo top-right, text block anchored to the bottom-left.
///
/// Returns `None` when no name has been entered; there is no card to show yet.
pub fn layout_front(
    record: &ContactRecord,
    template: CardTemplate,
    logo: Option<&PathBuf>,
) -> Option<FaceLayout> {
    if !record.has_name() {
        return None;
    }
    let mut layout = FaceLayout::blank(Face::Front);

    if template == CardTemplate::Classic {
        if let Some(path) = logo {
            layout.nodes.push(LayoutNode {
                rect: Rect {
                    x: (CARD_WIDTH_PX - LOGO_INSET_PX - LOGO_BOX.0) as i32,
                    y: LOGO_INSET_PX as i32,
                    width: LOGO_BOX.0,
                    height: LOGO_BOX.1,
                },
                elem_type: ElementType::Logo,
                content: NodeContent::Image { path: path.clone() },
            });
        }
    }

    let mut lines: Vec<(String, f32, bool, ElementType)> = vec![(
        format!("{} {}", record.first_name, record.last_name),
        NAME_FONT_PX,
        true,
        ElementType::Name,
    )];
    let details = match template {
        CardTemplate::Classic => vec![
            record.position.clone(),
            record.company.clone(),
            record.address.clone(),
            format!("Telefon: {}", record.phone),
            format!("Fax: {}", record.fax),
            record.email.clone(),
            record.website.clone(),
        ],
        CardTemplate::Minimal => [
            &record.position,
            &record.company,
            &record.address,
            &record.phone,
            &record.fax,
            &record.email,
            &record.website,
        ]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .collect(),
    };
    lines.extend(
        details
            .into_iter()
            .map(|text| (text, DETAIL_FONT_PX, false, ElementType::Detail)),
    );

    let text_w = CARD_WIDTH_PX - 2 * CARD_PADDING_PX;
    let lines: Vec<(String, f32, bool, ElementType)> = lines
        .into_iter()
        .flat_map(|(text, font_px, bold, elem_type)| {
            wrap_text(&text, font_px, text_w)
                .into_iter()
                .map(move |line| (line, font_px, bold, elem_type.clone()))
        })
        .collect();

    let heights: Vec<u32> = lines
        .iter()
        .map(|(_, font, _, _)| (font * LINE_SPACING).ceil() as u32)
        .collect();
    let block_h: u32 = heights.iter().sum();
    // Anchored at the bottom; a block taller than the card overflows at the top.
    let mut y = CARD_HEIGHT_PX as i32 - CARD_PADDING_PX as i32 - block_h as i32;

    for ((text, font_px, bold, elem_type), h) in lines.into_iter().zip(heights) {
        layout.nodes.push(LayoutNode {
            rect: Rect {
                x: CARD_PADDING_PX as i32,
                y,
                width: text_w,
                height: h,
            },
            elem_type,
            content: NodeContent::Text {
                text: text.trim().to_string(),
                font_px,
                bold,
            },
        });
        y += h as i32;
    }

    Some(layout)
}

/// Break `text` into lines no wider than `max_width` layout pixels at
/// `font_px`. Lines break between words; a word longer than a whole line is
/// split. Empty text stays one empty line.
fn wrap_text(text: &str, font_px: f32, max_width: u32) -> Vec<String> {
    let char_w = font::CELL_WIDTH as f32 * font_px / font::CELL_HEIGHT as f32;
    let per_line = ((max_width as f32 / char_w).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > per_line {
            if !cur.is_empty() {
                lines.push(std::mem::take(&mut cur));
            }
            let rest = chars.split_off(per_line);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let cur_len = cur.chars().count();
        if !cur.is_empty() && cur_len + 1 + chars.len() > per_line {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.extend(chars);
    }
    if !cur.is_empty() || lines.is_empty() {
        lines.push(cur);
    }
    lines
}

/// Back face: the vCard as a QR code of `qr_size_px`, centered on the card.
pub fn layout_back(record: &ContactRecord, qr_size_px: u32) -> FaceLayout {
    let mut layout = FaceLayout::blank(Face::Back);
    let size = qr_size_px.min(CARD_HEIGHT_PX - 2 * CARD_PADDING_PX);
    layout.nodes.push(LayoutNode {
        rect: Rect {
            x: ((CARD_WIDTH_PX - size) / 2) as i32,
            y: ((CARD_HEIGHT_PX - size) / 2) as i32,
            width: size,
            height: size,
        },
        elem_type: ElementType::QrCode,
        content: NodeContent::QrCode {
            payload: vcard::encode(record),
        },
    });
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ContactRecord {
        ContactRecord {
            first_name: "Anna".into(),
            last_name: "Muster".into(),
            position: "Rezeption".into(),
            phone: "+49 1 2".into(),
            ..ContactRecord::default()
        }
    }

    #[test]
    fn front_requires_a_name() {
        assert!(layout_front(&ContactRecord::default(), CardTemplate::Classic, None).is_none());
        let mut r = ContactRecord::default();
        r.first_name = "Anna".into();
        assert!(layout_front(&r, CardTemplate::Classic, None).is_some());
    }

    #[test]
    fn classic_front_lists_details_in_order() {
        let layout = layout_front(&record(), CardTemplate::Classic, None).unwrap();
        assert_eq!(
            layout.text_lines(),
            vec![
                "Anna Muster",
                "Rezeption",
                "Reha-Zentrum Bad Pyrmont",
                "Schulstraße 2, 31812 Bad Pyrmont, Germany",
                "Telefon: +49 1 2",
                "Fax:",
                "",
                "www.rehazentrum-badpyrmont.de",
            ]
        );
    }

    #[test]
    fn text_block_sits_on_the_bottom_padding() {
        let layout = layout_front(&record(), CardTemplate::Classic, None).unwrap();
        let last = layout.nodes.last().unwrap();
        assert_eq!(
            last.rect.y + last.rect.height as i32,
            (CARD_HEIGHT_PX - CARD_PADDING_PX) as i32
        );
        assert!(layout.nodes.iter().all(|n| n.rect.y >= 0));
    }

    #[test]
    fn minimal_template_drops_empty_lines_and_logo() {
        let logo = PathBuf::from("logo.png");
        let layout = layout_front(&record(), CardTemplate::Minimal, Some(&logo)).unwrap();
        assert!(layout.nodes.iter().all(|n| n.elem_type != ElementType::Logo));
        assert!(!layout.text_lines().contains(&""));
        assert!(layout.text_lines().contains(&"+49 1 2"));
    }

    #[test]
    fn classic_template_places_logo_top_right() {
        let logo = PathBuf::from("logo.png");
        let layout = layout_front(&record(), CardTemplate::Classic, Some(&logo)).unwrap();
        let node = &layout.nodes[0];
        assert_eq!(node.elem_type, ElementType::Logo);
        assert_eq!(node.rect.x as u32 + node.rect.width, CARD_WIDTH_PX - LOGO_INSET_PX);
    }

    #[test]
    fn long_lines_wrap_inside_the_text_block() {
        let mut r = record();
        r.address = "Klinik Weser, Schulstraße 2, 31812 Bad Pyrmont, Niedersachsen, Germany".into();
        r.email = "empfang.rezeption.klinik-weser@rehazentrum-badpyrmont.example.org".into();
        let layout = layout_front(&r, CardTemplate::Minimal, None).unwrap();
        let lines = layout.text_lines();

        let text_w = (CARD_WIDTH_PX - 2 * CARD_PADDING_PX) as usize;
        for line in &lines {
            // 8px detail font: six layout pixels per character cell
            assert!(line.chars().count() * 6 <= text_w, "{:?} is too wide", line);
        }
        assert!(lines.contains(&"Klinik Weser, Schulstraße 2, 31812 Bad Pyrmont,"));
        assert!(lines.contains(&"Niedersachsen, Germany"));
        let email: String = lines
            .iter()
            .filter(|l| l.contains("empfang") || l.ends_with(".org"))
            .copied()
            .collect();
        assert_eq!(email, r.email);

        let last = layout.nodes.last().unwrap();
        assert_eq!(
            last.rect.y + last.rect.height as i32,
            (CARD_HEIGHT_PX - CARD_PADDING_PX) as i32
        );
    }

    #[test]
    fn wrapping_keeps_short_and_empty_lines() {
        assert_eq!(wrap_text("Fax: ", 8.0, 289), vec!["Fax:"]);
        assert_eq!(wrap_text("", 8.0, 289), vec![""]);
        assert_eq!(wrap_text("abcdefgh", 8.0, 18), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("ab cd ef", 8.0, 30), vec!["ab cd", "ef"]);
    }

    #[test]
    fn back_carries_the_vcard() {
        let r = record();
        let layout = layout_back(&r, 100);
        assert_eq!(layout.face, Face::Back);
        match &layout.nodes[0].content {
            NodeContent::QrCode { payload } => assert_eq!(payload, &vcard::encode(&r)),
            other => panic!("unexpected node {:?}", other),
        }
        let rect = &layout.nodes[0].rect;
        assert_eq!(rect.width, 100);
        assert_eq!(rect.x, ((CARD_WIDTH_PX - 100) / 2) as i32);
    }

    #[test]
    fn oversized_qr_is_clamped_to_the_card() {
        let layout = layout_back(&record(), 1000);
        assert!(layout.nodes[0].rect.height <= CARD_HEIGHT_PX);
    }

    #[test]
    fn device_size_scales() {
        let layout = layout_back(&record(), 100);
        assert_eq!(layout.device_size(1.0), (321, 208));
        assert_eq!(layout.device_size(3.0), (963, 624));
    }
}
