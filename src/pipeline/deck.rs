//! Slide deck construction: slide records → a `.pptx` file on disk.
//!
//! A `.pptx` is a zip archive of OOXML parts. No maintained crate writes
//! PresentationML, so the parts are emitted directly: the master, layout,
//! and theme are fixed documents, and each slide is rendered from a small
//! template with explicit shape geometry (no placeholder inheritance to
//! get wrong). PowerPoint and LibreOffice both accept the result.
//!
//! Rendering rules:
//! * a bare string becomes a slide titled "Slide" with one bold 24 pt run;
//! * a structured record becomes a slide with its title, an optional
//!   18 pt italic grey subtitle, one 20 pt paragraph per bullet (level 0
//!   only), and — if `image_path` points at an existing file — an inset
//!   picture at a fixed offset, 4.5 in wide, height scaled to the image.
//!
//! The target file is silently overwritten. Slide and bullet counts are
//! not validated.

use crate::error::DeckGenError;
use crate::output::{Slide, SlideContent};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── Geometry (EMU: 914 400 per inch) ─────────────────────────────────────

const EMU_PER_INCH: u64 = 914_400;

/// 10 in × 7.5 in slide, the classic 4:3 canvas.
const SLIDE_CX: u64 = 10 * EMU_PER_INCH;
const SLIDE_CY: u64 = 7_500 * EMU_PER_INCH / 1_000;

/// Picture inset: 5.5 in from the left, 1.5 in from the top, 4.5 in wide.
const PIC_X: u64 = 5_500 * EMU_PER_INCH / 1_000;
const PIC_Y: u64 = 1_500 * EMU_PER_INCH / 1_000;
const PIC_CX: u64 = 4_500 * EMU_PER_INCH / 1_000;

// ── Public API ───────────────────────────────────────────────────────────

/// Default output location: `/tmp/{topic with spaces → _}.pptx`.
pub fn default_deck_path(topic: &str) -> PathBuf {
    PathBuf::from("/tmp").join(format!("{}.pptx", topic.replace(' ', "_")))
}

/// Build a presentation file from the slide records.
///
/// Writes to `file_path` when given, otherwise to
/// [`default_deck_path`]. Returns the path actually written.
pub fn build_deck(
    topic: &str,
    slides: &[SlideContent],
    file_path: Option<&Path>,
) -> Result<PathBuf, DeckGenError> {
    let path = file_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_deck_path(topic));

    let file = std::fs::File::create(&path).map_err(|e| DeckGenError::DeckWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    write_package(file, slides).map_err(|e| DeckGenError::DeckWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    debug!("Wrote {} slides to {}", slides.len(), path.display());
    Ok(path)
}

// ── Package assembly ─────────────────────────────────────────────────────

fn write_package(file: std::fs::File, slides: &[SlideContent]) -> std::io::Result<()> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let part =
        |zip: &mut ZipWriter<std::fs::File>, name: &str, body: &[u8]| -> std::io::Result<()> {
            zip.start_file(name, options).map_err(zip_to_io)?;
            zip.write_all(body)
        };

    // Resolve each slide's picture up front: (slide index → media index,
    // bytes, scaled height). A recorded image_path whose file vanished is
    // skipped with a warning, not an error.
    let mut media: Vec<(usize, Vec<u8>, u64)> = Vec::new();
    for (i, slide) in slides.iter().enumerate() {
        if let SlideContent::Structured(s) = slide {
            if let Some(ref img_path) = s.image_path {
                match load_picture(img_path) {
                    Some((bytes, cy)) => media.push((i, bytes, cy)),
                    None => warn!("Could not insert image: {}", img_path.display()),
                }
            }
        }
    }

    part(&mut zip, "[Content_Types].xml", content_types(slides.len()).as_bytes())?;
    part(&mut zip, "_rels/.rels", ROOT_RELS.as_bytes())?;
    part(&mut zip, "ppt/presentation.xml", presentation_xml(slides.len()).as_bytes())?;
    part(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        presentation_rels(slides.len()).as_bytes(),
    )?;
    part(&mut zip, "ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER.as_bytes())?;
    part(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        MASTER_RELS.as_bytes(),
    )?;
    part(&mut zip, "ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT.as_bytes())?;
    part(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        LAYOUT_RELS.as_bytes(),
    )?;
    part(&mut zip, "ppt/theme/theme1.xml", THEME.as_bytes())?;

    for (i, slide) in slides.iter().enumerate() {
        let picture = media
            .iter()
            .enumerate()
            .find(|(_, (slide_idx, _, _))| *slide_idx == i)
            .map(|(media_idx, (_, _, cy))| (media_idx + 1, *cy));

        let n = i + 1;
        part(
            &mut zip,
            &format!("ppt/slides/slide{n}.xml"),
            slide_xml(slide, picture).as_bytes(),
        )?;
        part(
            &mut zip,
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            slide_rels(picture.map(|(media_idx, _)| media_idx)).as_bytes(),
        )?;
    }

    for (media_idx, (_, bytes, _)) in media.iter().enumerate() {
        part(
            &mut zip,
            &format!("ppt/media/image{}.jpeg", media_idx + 1),
            bytes,
        )?;
    }

    zip.finish().map_err(zip_to_io)?;
    Ok(())
}

fn zip_to_io(e: zip::result::ZipError) -> std::io::Error {
    std::io::Error::other(e)
}

/// Read a slide picture and compute its display height for a fixed
/// 4.5 in width, preserving aspect ratio. `None` when the file is
/// missing or not a decodable image.
fn load_picture(path: &Path) -> Option<(Vec<u8>, u64)> {
    if !path.exists() {
        return None;
    }
    let (w, h) = image::image_dimensions(path).ok()?;
    if w == 0 {
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    let cy = PIC_CX * u64::from(h) / u64::from(w);
    Some((bytes, cy))
}

// ── XML rendering ────────────────────────────────────────────────────────

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn content_types(slide_count: usize) -> String {
    let mut overrides = String::new();
    for n in 1..=slide_count {
        overrides.push_str(&format!(
            "<Override PartName=\"/ppt/slides/slide{n}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>{overrides}</Types>"#
    )
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#;

fn presentation_xml(slide_count: usize) -> String {
    let mut slide_ids = String::new();
    for n in 0..slide_count {
        // Slide ids start at 256 by convention; rId1 is the master.
        slide_ids.push_str(&format!(
            "<p:sldId id=\"{}\" r:id=\"rId{}\"/>",
            256 + n,
            n + 2
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{SLIDE_CX}" cy="{SLIDE_CY}"/><p:notesSz cx="{SLIDE_CY}" cy="{SLIDE_CX}"/></p:presentation>"#
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let mut rels = String::from(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
    );
    for n in 0..slide_count {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            n + 2,
            n + 1
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
    )
}

const EMPTY_SP_TREE: &str = r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree>"#;

const SLIDE_MASTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

const MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#;

const SLIDE_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="titleAndBody"><p:cSld name="Title and Content"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

const LAYOUT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#;

const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

fn slide_rels(media_idx: Option<usize>) -> String {
    let mut rels = String::from(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
    );
    if let Some(idx) = media_idx {
        rels.push_str(&format!(
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image{idx}.jpeg"/>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
    )
}

/// Render one slide part. `picture` is `(media index, display height)`
/// when the slide carries an image.
fn slide_xml(content: &SlideContent, picture: Option<(usize, u64)>) -> String {
    let (title, body) = match content {
        SlideContent::Text(text) => ("Slide".to_string(), text_body(text)),
        SlideContent::Structured(slide) => (escape_xml(&slide.title), structured_body(slide)),
    };

    let pic = picture
        .map(|(_, cy)| {
            format!(
                r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 3"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{PIC_X}" y="{PIC_Y}"/><a:ext cx="{PIC_CX}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#
            )
        })
        .unwrap_or_default();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="4000"/><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Content 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="1600200"/><a:ext cx="8229600" cy="4525963"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>{pic}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

/// Body of a bare-string slide: one bold 24 pt run.
fn text_body(text: &str) -> String {
    format!(
        r#"<a:p><a:r><a:rPr lang="en-US" sz="2400" b="1"/><a:t>{}</a:t></a:r></a:p>"#,
        escape_xml(text)
    )
}

/// Body of a structured slide: optional subtitle then flat bullets.
fn structured_body(slide: &Slide) -> String {
    let mut body = String::new();

    if let Some(ref subtitle) = slide.subtitle {
        body.push_str(&format!(
            r#"<a:p><a:r><a:rPr lang="en-US" sz="1800" i="1"><a:solidFill><a:srgbClr val="646464"/></a:solidFill></a:rPr><a:t>{}</a:t></a:r></a:p>"#,
            escape_xml(subtitle)
        ));
    }

    for point in &slide.bullet_points {
        body.push_str(&format!(
            r#"<a:p><a:pPr lvl="0"/><a:r><a:rPr lang="en-US" sz="2000"/><a:t>{}</a:t></a:r></a:p>"#,
            escape_xml(point)
        ));
    }

    // A txBody must contain at least one paragraph.
    if body.is_empty() {
        body.push_str("<a:p/>");
    }
    body
}
