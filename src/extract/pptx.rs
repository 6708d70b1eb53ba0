// PPTX text: slide XML read straight out of the zip container
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use zip::ZipArchive;

use crate::errors::{Result, ServiceError};

static SLIDE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

fn failure(what: &str, err: impl std::fmt::Display) -> ServiceError {
    ServiceError::ProcessingFailure(format!("{}: {}", what, err))
}

/// Text of every slide in numeric order, one line per paragraph
pub fn extract(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| failure("Failed to open slide deck", e))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = SLIDE_ENTRY.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut shapes = Vec::new();
    for (_, name) in &slides {
        let mut xml = String::new();
        archive
            .by_name(name)
            .map_err(|e| failure("Failed to read slide", e))?
            .read_to_string(&mut xml)?;
        shapes.extend(slide_shapes(&xml)?);
    }

    Ok(shapes.join("\n").trim().to_string())
}

/// Text of each top-level shape with a text body, paragraphs joined by `\n`.
/// Shapes nested inside groups are skipped.
pub fn slide_shapes(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut shapes = Vec::new();
    let mut group_depth = 0usize;
    let mut shape: Option<Vec<String>> = None;
    let mut in_text_body = false;
    let mut paragraph: Option<String> = None;
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"grpSp" => group_depth += 1,
                b"sp" if group_depth == 0 => shape = Some(Vec::new()),
                b"txBody" if shape.is_some() => in_text_body = true,
                b"p" if in_text_body => paragraph = Some(String::new()),
                b"t" if paragraph.is_some() => in_run_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" if in_text_body => {
                    if let Some(paragraphs) = shape.as_mut() {
                        paragraphs.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let text = e.unescape().map_err(|e| failure("Invalid slide text", e))?;
                if let Some(p) = paragraph.as_mut() {
                    p.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"grpSp" => group_depth = group_depth.saturating_sub(1),
                b"t" => in_run_text = false,
                b"p" => {
                    if let (Some(paragraphs), Some(p)) = (shape.as_mut(), paragraph.take()) {
                        paragraphs.push(p);
                    }
                }
                b"txBody" => in_text_body = false,
                b"sp" if group_depth == 0 => {
                    if let Some(paragraphs) = shape.take() {
                        if !paragraphs.is_empty() {
                            shapes.push(paragraphs.join("\n"));
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(failure("Invalid slide XML", e)),
            _ => {}
        }
    }

    Ok(shapes)
}
