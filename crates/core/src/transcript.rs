//! Subtitle-to-document rendering.
//!
//! Both renderers copy the subtitle file line by line; no cue parsing.

use std::{
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use docx_rs::{Docx, Paragraph, Run};
use encoding_rs::WINDOWS_1252;
use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::{
    error::{Result, TubeBatchError},
    types::TranscriptJob,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const FONT_SIZE_PT: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 5.0;
/// Helvetica 10pt fits roughly this many characters across A4 minus margins.
const WRAP_CHARS: usize = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    pub fn write(self, subtitle: &Path, output: &Path) -> Result<()> {
        match self {
            DocumentKind::Pdf => to_pdf(subtitle, output),
            DocumentKind::Docx => to_docx(subtitle, output),
        }
    }
}

impl TranscriptJob {
    /// Documents this job should produce, PDF first.
    pub fn documents(&self) -> Vec<(DocumentKind, PathBuf)> {
        let mut docs = Vec::new();
        if self.format.wants_pdf() {
            docs.push((DocumentKind::Pdf, self.pdf_path()));
        }
        if self.format.wants_docx() {
            docs.push((DocumentKind::Docx, self.docx_path()));
        }
        docs
    }
}

fn conversion_error(path: &Path, err: impl Display) -> TubeBatchError {
    TubeBatchError::ConversionFailed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Read a subtitle file as UTF-8, one entry per line.
pub fn read_subtitle_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| conversion_error(path, e))?;
    Ok(lines)
}

/// Reduce a line to what a single-byte Windows-1252 font can show.
/// Anything outside that repertoire becomes `?`.
pub fn to_single_byte(line: &str) -> String {
    line.chars()
        .map(|c| {
            let mut buf = [0u8; 4];
            let (_, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
            if unmappable { '?' } else { c }
        })
        .collect()
}

/// Greedy word wrap at `width` characters; overlong words are split.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            wrapped.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > width && !current.is_empty() {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

/// Render the subtitle file as a paginated A4 PDF.
pub fn to_pdf(subtitle: &Path, output: &Path) -> Result<()> {
    let lines = read_subtitle_lines(subtitle)?;

    let (doc, page, layer) = PdfDocument::new(
        "Transcript",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| conversion_error(output, e))?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    for row in lines
        .iter()
        .flat_map(|line| wrap_line(&to_single_byte(line), WRAP_CHARS))
    {
        if y < MARGIN_MM {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            current = doc.get_page(page).get_layer(layer);
            y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        if !row.is_empty() {
            current.use_text(row, FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
        }
        y -= LINE_HEIGHT_MM;
    }

    let file = File::create(output)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| conversion_error(output, e))?;

    Ok(())
}

/// Render the subtitle file as a DOCX with one paragraph per line.
pub fn to_docx(subtitle: &Path, output: &Path) -> Result<()> {
    let lines = read_subtitle_lines(subtitle)?;

    let docx = lines.into_iter().fold(Docx::new(), |docx, line| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
    });

    let file = File::create(output)?;
    docx.build()
        .pack(file)
        .map_err(|e| conversion_error(output, e))?;

    Ok(())
}
