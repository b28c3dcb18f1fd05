/// Paint commands in device pixels, produced from a face layout

use crate::rendering::font::{self, CELL_HEIGHT};
use crate::rendering::layout::{FaceLayout, NodeContent};
use crate::{Error, Result};
use std::path::PathBuf;

/// Light margin kept around the QR matrix so scanners find its edges
const QUIET_ZONE_MODULES: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    RoundedRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        radius: u32,
        rgba: (u8, u8, u8, u8),
    },
    /// Bitmap-font text; `dot` is the device size of one font dot
    Text {
        x: f32,
        y: f32,
        dot: f32,
        bold: bool,
        text: String,
    },
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        path: PathBuf,
    },
    /// Square QR matrix, `modules` row-major with `true` for dark
    QrModules {
        x: f32,
        y: f32,
        module: f32,
        size: usize,
        modules: Vec<bool>,
    },
}

/// QR matrix (without quiet zone) of `payload`
pub fn qr_modules(payload: &str) -> Result<(usize, Vec<bool>)> {
    let code = qrcode::QrCode::with_error_correction_level(payload.as_bytes(), qrcode::EcLevel::M)
        .map_err(|e| Error::Render(format!("QR encoding failed: {}", e)))?;
    let modules = code
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();
    Ok((code.width(), modules))
}

/// Flatten a layout into paint commands at `scale`.
pub fn display_list(layout: &FaceLayout, scale: f32) -> Result<Vec<PaintCommand>> {
    let (width, height) = layout.device_size(scale);
    let [r, g, b, a] = layout.surface;
    let mut cmds = vec![PaintCommand::RoundedRect {
        x: 0,
        y: 0,
        width,
        height,
        radius: (layout.corner_radius as f32 * scale).round() as u32,
        rgba: (r, g, b, a),
    }];

    for node in &layout.nodes {
        let x = node.rect.x as f32 * scale;
        let y = node.rect.y as f32 * scale;
        let w = node.rect.width as f32 * scale;
        let h = node.rect.height as f32 * scale;
        match &node.content {
            NodeContent::Text { text, font_px, bold } => {
                if text.is_empty() {
                    continue;
                }
                let dot = font_px * scale / CELL_HEIGHT as f32;
                // Vertically centre the glyph cell in the line box.
                let cell_h = CELL_HEIGHT as f32 * dot;
                cmds.push(PaintCommand::Text {
                    x,
                    y: y + (h - cell_h) / 2.0,
                    dot,
                    bold: *bold,
                    text: text.clone(),
                });
            }
            NodeContent::Image { path } => cmds.push(PaintCommand::Image {
                x: x.round() as i32,
                y: y.round() as i32,
                width: w.round() as u32,
                height: h.round() as u32,
                path: path.clone(),
            }),
            NodeContent::QrCode { payload } => {
                let (size, modules) = qr_modules(payload)?;
                let module = w.min(h) / size as f32;
                let quiet = QUIET_ZONE_MODULES * module;
                cmds.push(PaintCommand::SolidRect {
                    x: (x - quiet).round() as i32,
                    y: (y - quiet).round() as i32,
                    width: (w + 2.0 * quiet).round() as u32,
                    height: (h + 2.0 * quiet).round() as u32,
                    rgba: (255, 255, 255, 255),
                });
                cmds.push(PaintCommand::QrModules {
                    x,
                    y,
                    module,
                    size,
                    modules,
                });
            }
        }
    }
    Ok(cmds)
}

/// Device width of a text command, for overflow checks
pub fn text_extent(text: &str, dot: f32) -> f32 {
    font::text_width_dots(text) as f32 * dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ContactRecord;
    use crate::rendering::layout::{layout_back, layout_front, CardTemplate};

    fn anna() -> ContactRecord {
        ContactRecord {
            first_name: "Anna".into(),
            last_name: "Muster".into(),
            ..ContactRecord::default()
        }
    }

    #[test]
    fn surface_comes_first() {
        let layout = layout_back(&anna(), 100);
        let cmds = display_list(&layout, 2.0).unwrap();
        match &cmds[0] {
            PaintCommand::RoundedRect { width, height, radius, .. } => {
                assert_eq!((*width, *height), (642, 416));
                assert_eq!(*radius, 16);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn qr_fills_its_box() {
        let layout = layout_back(&anna(), 100);
        let cmds = display_list(&layout, 3.0).unwrap();
        let qr = cmds
            .iter()
            .find_map(|c| match c {
                PaintCommand::QrModules { module, size, modules, .. } => {
                    Some((*module, *size, modules.len()))
                }
                _ => None,
            })
            .expect("qr command");
        assert!((qr.0 * qr.1 as f32 - 300.0).abs() < 0.01);
        assert_eq!(qr.2, qr.1 * qr.1);
    }

    #[test]
    fn qr_gets_a_light_quiet_zone() {
        let layout = layout_back(&anna(), 100);
        let cmds = display_list(&layout, 1.0).unwrap();
        let pos = cmds
            .iter()
            .position(|c| matches!(c, PaintCommand::QrModules { .. }))
            .unwrap();
        match &cmds[pos - 1] {
            PaintCommand::SolidRect { width, rgba, .. } => {
                assert!(*width > 100);
                assert_eq!(*rgba, (255, 255, 255, 255));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_text_lines_paint_nothing() {
        let layout = layout_front(&anna(), CardTemplate::Classic, None).unwrap();
        let cmds = display_list(&layout, 1.0).unwrap();
        let texts: Vec<&str> = cmds
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(!texts.contains(&""));
        assert_eq!(texts[0], "Anna Muster");
    }

    #[test]
    fn detail_text_fits_the_card_width() {
        let layout = layout_front(&anna(), CardTemplate::Classic, None).unwrap();
        for cmd in display_list(&layout, 5.0).unwrap() {
            if let PaintCommand::Text { x, dot, text, .. } = cmd {
                assert!(x + text_extent(&text, dot) <= 321.0 * 5.0, "{} overflows", text);
            }
        }
    }
}
