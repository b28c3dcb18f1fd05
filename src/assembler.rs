//! Document assembly: captured faces → PDF or ZIP of PDFs.
//!
//! The container formats sit behind [`DocumentBuilder`] and [`ArchiveBuilder`]
//! so the assembly rules (page order, skipping missing faces, entry naming)
//! can be exercised without producing real files.

use crate::config::ExportMode;
use crate::rendering::{Bitmap, Face};
use crate::{Error, Result};
use log::{debug, warn};
use std::io::{Cursor, Write};

/// Physical page size in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

/// 85mm x 55mm, landscape
pub const CARD_PAGE: PageSize = PageSize {
    width_mm: 85.0,
    height_mm: 55.0,
};

/// A face as delivered by the pipeline; `bitmap` is `None` when the face
/// could not be rendered (e.g. no name entered for the front).
#[derive(Debug, Clone)]
pub struct CapturedFace {
    pub face: Face,
    pub bitmap: Option<Bitmap>,
}

/// One page of a document: a bitmap stretched over the whole page.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub bitmap: &'a Bitmap,
    pub size: PageSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub trait DocumentBuilder: Send + Sync {
    /// Build a paginated document, one page per entry in order.
    fn build(&self, title: &str, pages: &[Page<'_>]) -> Result<Vec<u8>>;
}

pub trait ArchiveBuilder: Send + Sync {
    fn build(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pdf,
    Zip,
}

/// A finished export, ready to be saved.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub kind: ArtifactKind,
    /// Faces that made it into the artifact, in page / entry order
    pub faces: Vec<Face>,
    /// Archive entry names; empty for PDFs
    pub entries: Vec<String>,
    pub bytes: Vec<u8>,
}

/// Packs captured faces into the artifact for an [`ExportMode`].
pub struct DocumentAssembler {
    documents: Box<dyn DocumentBuilder>,
    archives: Box<dyn ArchiveBuilder>,
    label: String,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(
            Box::new(PdfDocumentBuilder),
            Box::new(ZipArchiveBuilder),
            "visitenkarte",
        )
    }
}

impl DocumentAssembler {
    pub fn new(
        documents: Box<dyn DocumentBuilder>,
        archives: Box<dyn ArchiveBuilder>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            archives,
            label: label.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Archive entry name for `face`
    pub fn entry_name(&self, face: Face) -> String {
        format!("{}-{}.pdf", self.label, face.slug())
    }

    /// Assemble `faces` in the given order. Faces without a bitmap are
    /// skipped; if none is left the result is [`Error::EmptyDocument`].
    pub fn assemble(&self, faces: &[CapturedFace], mode: ExportMode) -> Result<Artifact> {
        let present: Vec<(Face, &Bitmap)> = faces
            .iter()
            .filter_map(|c| match &c.bitmap {
                Some(bmp) => Some((c.face, bmp)),
                None => {
                    warn!("{} face missing, leaving it out of the {}", c.face, mode);
                    None
                }
            })
            .collect();
        if present.is_empty() {
            return Err(Error::EmptyDocument);
        }

        match mode {
            ExportMode::SinglePdf => {
                let pages: Vec<Page<'_>> = present
                    .iter()
                    .map(|&(_, bitmap)| Page { bitmap, size: CARD_PAGE })
                    .collect();
                let bytes = self.documents.build(&self.label, &pages)?;
                debug!("assembled {} page PDF ({} bytes)", pages.len(), bytes.len());
                Ok(Artifact {
                    file_name: mode.file_name().to_string(),
                    kind: ArtifactKind::Pdf,
                    faces: present.iter().map(|(f, _)| *f).collect(),
                    entries: Vec::new(),
                    bytes,
                })
            }
            ExportMode::ZipArchive => {
                let mut entries = Vec::with_capacity(present.len());
                for &(face, bitmap) in &present {
                    let page = Page { bitmap, size: CARD_PAGE };
                    let title = format!("{} ({})", self.label, face.slug());
                    entries.push(ArchiveEntry {
                        name: self.entry_name(face),
                        bytes: self.documents.build(&title, &[page])?,
                    });
                }
                let bytes = self.archives.build(&entries)?;
                debug!("assembled archive with {} entries ({} bytes)", entries.len(), bytes.len());
                Ok(Artifact {
                    file_name: mode.file_name().to_string(),
                    kind: ArtifactKind::Zip,
                    faces: present.iter().map(|(f, _)| *f).collect(),
                    entries: entries.into_iter().map(|e| e.name).collect(),
                    bytes,
                })
            }
        }
    }
}

/// PDF output via `printpdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDocumentBuilder;

impl DocumentBuilder for PdfDocumentBuilder {
    fn build(&self, title: &str, pages: &[Page<'_>]) -> Result<Vec<u8>> {
        use printpdf::{Image, ImageTransform, Mm, PdfDocument};

        let (first, rest) = pages
            .split_first()
            .ok_or_else(|| Error::Document("a PDF needs at least one page".into()))?;

        let (doc, page_idx, layer_idx) = PdfDocument::new(
            title,
            Mm(first.size.width_mm),
            Mm(first.size.height_mm),
            "card",
        );
        let mut targets = vec![(page_idx, layer_idx, first)];
        for page in rest {
            let (p, l) = doc.add_page(Mm(page.size.width_mm), Mm(page.size.height_mm), "card");
            targets.push((p, l, page));
        }

        for (page_idx, layer_idx, page) in targets {
            let pixels = flatten_onto_white(&page.bitmap.decode()?);
            let (w_px, h_px) = (pixels.width() as f32, pixels.height() as f32);
            // Map the bitmap width onto the page width, then stretch vertically
            // so the image covers the page exactly.
            let dpi = w_px * 25.4 / page.size.width_mm;
            let natural_h_mm = h_px * 25.4 / dpi;
            let layer = doc.get_page(page_idx).get_layer(layer_idx);
            Image::from_dynamic_image(&pixels).add_to_layer(
                layer,
                ImageTransform {
                    translate_x: Some(Mm(0.0)),
                    translate_y: Some(Mm(0.0)),
                    dpi: Some(dpi),
                    scale_x: Some(1.0),
                    scale_y: Some(page.size.height_mm / natural_h_mm),
                    ..Default::default()
                },
            );
        }

        doc.save_to_bytes()
            .map_err(|e| Error::Document(e.to_string()))
    }
}

/// Composite `pixels` over white and drop the alpha channel.
///
/// printpdf emits the alpha channel of RGBA images as a soft mask declared
/// `width` x `width`, which is wrong for every non-square card, so pages are
/// always embedded as opaque RGB.
pub(crate) fn flatten_onto_white(pixels: &image::DynamicImage) -> image::DynamicImage {
    let rgba = pixels.to_rgba8();
    let rgb = image::RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u16;
        let blend = |c: u8| ((c as u16 * a + 255 * (255 - a)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    });
    image::DynamicImage::ImageRgb8(rgb)
}

/// ZIP output via `zip`, with fixed timestamps so entry metadata is stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveBuilder;

impl ArchiveBuilder for ZipArchiveBuilder {
    fn build(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
        use zip::write::FileOptions;

        let options = FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for entry in entries {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.bytes)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::{Arc, Mutex};

    fn bitmap(tag: u8) -> Bitmap {
        let img = image::RgbaImage::from_pixel(34, 22, image::Rgba([tag, tag, tag, 255]));
        Bitmap::from_rgba(&img).unwrap()
    }

    /// Records the first pixel of each page so tests can tell faces apart.
    #[derive(Clone, Default)]
    struct RecordingDocs(Arc<Mutex<Vec<Vec<u8>>>>);

    impl DocumentBuilder for RecordingDocs {
        fn build(&self, _title: &str, pages: &[Page<'_>]) -> Result<Vec<u8>> {
            let tags: Vec<u8> = pages
                .iter()
                .map(|p| p.bitmap.decode().unwrap().to_rgba8().get_pixel(0, 0).0[0])
                .collect();
            self.0.lock().unwrap().push(tags.clone());
            Ok(tags)
        }
    }

    struct ConcatArchive;

    impl ArchiveBuilder for ConcatArchive {
        fn build(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
            Ok(entries.iter().flat_map(|e| e.bytes.clone()).collect())
        }
    }

    fn faces(front: bool, back: bool) -> Vec<CapturedFace> {
        vec![
            CapturedFace { face: Face::Front, bitmap: front.then(|| bitmap(10)) },
            CapturedFace { face: Face::Back, bitmap: back.then(|| bitmap(20)) },
        ]
    }

    #[test]
    fn single_pdf_keeps_front_first() {
        let docs = RecordingDocs::default();
        let asm = DocumentAssembler::new(Box::new(docs.clone()), Box::new(ConcatArchive), "visitenkarte");
        let artifact = asm.assemble(&faces(true, true), ExportMode::SinglePdf).unwrap();
        assert_eq!(artifact.faces, vec![Face::Front, Face::Back]);
        assert_eq!(artifact.bytes, vec![10, 20]);
        assert_eq!(artifact.file_name, "visitenkarte.pdf");
        assert_eq!(docs.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn missing_front_is_skipped() {
        let asm = DocumentAssembler::new(Box::new(RecordingDocs::default()), Box::new(ConcatArchive), "x");
        let artifact = asm.assemble(&faces(false, true), ExportMode::SinglePdf).unwrap();
        assert_eq!(artifact.faces, vec![Face::Back]);
        assert_eq!(artifact.bytes, vec![20]);
    }

    #[test]
    fn nothing_to_assemble_is_an_error() {
        let asm = DocumentAssembler::default();
        let err = asm.assemble(&faces(false, false), ExportMode::SinglePdf).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }

    #[test]
    fn archive_builds_one_document_per_face() {
        let docs = RecordingDocs::default();
        let asm = DocumentAssembler::new(Box::new(docs.clone()), Box::new(ConcatArchive), "visitenkarte");
        let artifact = asm.assemble(&faces(true, true), ExportMode::ZipArchive).unwrap();
        assert_eq!(
            artifact.entries,
            vec!["visitenkarte-vorne.pdf", "visitenkarte-hinten.pdf"]
        );
        assert_eq!(artifact.file_name, "visitenkarten.zip");
        assert_eq!(artifact.kind, ArtifactKind::Zip);
        assert_eq!(*docs.0.lock().unwrap(), vec![vec![10], vec![20]]);
    }

    #[test]
    fn archive_without_front_only_holds_the_back() {
        let docs = RecordingDocs::default();
        let asm = DocumentAssembler::new(Box::new(docs.clone()), Box::new(ConcatArchive), "visitenkarte");
        let artifact = asm.assemble(&faces(false, true), ExportMode::ZipArchive).unwrap();
        assert_eq!(artifact.entries, vec!["visitenkarte-hinten.pdf"]);
        assert_eq!(artifact.faces, vec![Face::Back]);
        assert_eq!(*docs.0.lock().unwrap(), vec![vec![20]]);
    }

    #[test]
    fn flattening_composites_alpha_over_white() {
        let mut img = image::RgbaImage::new(3, 1);
        img.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(2, 0, image::Rgba([0, 0, 0, 51]));
        let flat = flatten_onto_white(&image::DynamicImage::ImageRgba8(img));
        let rgb = flat.as_rgb8().expect("rgb output");
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(2, 0).0, [204, 204, 204]);
    }

    #[test]
    fn real_pdf_has_pdf_header() {
        let bmp = bitmap(0);
        let bytes = PdfDocumentBuilder
            .build("t", &[Page { bitmap: &bmp, size: CARD_PAGE }, Page { bitmap: &bmp, size: CARD_PAGE }])
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn pdf_without_pages_is_rejected() {
        assert!(matches!(PdfDocumentBuilder.build("t", &[]), Err(Error::Document(_))));
    }

    #[test]
    fn real_zip_lists_entries_in_order() {
        let asm = DocumentAssembler::default();
        let artifact = asm.assemble(&faces(true, true), ExportMode::ZipArchive).unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        let mut names = Vec::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i).unwrap();
            names.push(file.name().to_string());
            let mut head = [0u8; 4];
            file.read_exact(&mut head).unwrap();
            assert_eq!(&head, b"%PDF");
        }
        assert_eq!(names, vec!["visitenkarte-vorne.pdf", "visitenkarte-hinten.pdf"]);
    }

    #[test]
    fn zip_container_is_stable_for_identical_entries() {
        let entries = vec![
            ArchiveEntry { name: "a.pdf".into(), bytes: b"one".to_vec() },
            ArchiveEntry { name: "b.pdf".into(), bytes: b"two".to_vec() },
        ];
        let a = ZipArchiveBuilder.build(&entries).unwrap();
        let b = ZipArchiveBuilder.build(&entries).unwrap();
        assert_eq!(a, b);
    }
}
