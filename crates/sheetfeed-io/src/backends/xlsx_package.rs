//! Parts of the xlsx package umya reads but does not expose: legacy note
//! text (`xl/commentsN.xml`, reached through the workbook and worksheet
//! relationships) and the workbook's `date1904` flag.

#![cfg(feature = "umya")]

use crate::error::IoError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use sheetfeed_common::CellRef;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const BACKEND: &str = "umya";

type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Note text keyed by zero-based `(row, col)` for the sheet called `sheet`.
/// A sheet without a comments part yields an empty map.
pub(crate) fn comment_texts(
    package: &[u8],
    sheet: &str,
) -> Result<HashMap<(u32, u32), String>, IoError> {
    let mut zip =
        ZipArchive::new(Cursor::new(package)).map_err(|e| IoError::from_backend(BACKEND, e))?;

    let Some(rel_id) = sheet_rel_id(&read_part(&mut zip, "xl/workbook.xml")?, sheet)? else {
        return Ok(HashMap::new());
    };
    let workbook_rels = relationships(&read_part(&mut zip, "xl/_rels/workbook.xml.rels")?)?;
    let Some(sheet_path) = workbook_rels
        .iter()
        .find(|r| r.id == rel_id)
        .map(|r| resolve_target("xl", &r.target))
    else {
        return Ok(HashMap::new());
    };

    let (sheet_dir, sheet_file) = sheet_path
        .rsplit_once('/')
        .unwrap_or(("", sheet_path.as_str()));
    let rels_path = format!("{sheet_dir}/_rels/{sheet_file}.rels");
    if zip.by_name(&rels_path).is_err() {
        return Ok(HashMap::new());
    }
    let sheet_rels = relationships(&read_part(&mut zip, &rels_path)?)?;
    let Some(comments_path) = sheet_rels
        .iter()
        .find(|r| r.kind.ends_with("/comments"))
        .map(|r| resolve_target(sheet_dir, &r.target))
    else {
        return Ok(HashMap::new());
    };

    parse_comments(&read_part(&mut zip, &comments_path)?)
}

/// Whether `xl/workbook.xml` declares the 1904 date system.
pub(crate) fn uses_1904(package: &[u8]) -> Result<bool, IoError> {
    let mut zip =
        ZipArchive::new(Cursor::new(package)).map_err(|e| IoError::from_backend(BACKEND, e))?;
    date1904_flag(&read_part(&mut zip, "xl/workbook.xml")?)
}

fn date1904_flag(workbook: &[u8]) -> Result<bool, IoError> {
    let mut reader = Reader::from_reader(workbook);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"workbookPr" => {
                let flag = attr(&e, b"date1904")?;
                return Ok(matches!(flag.as_deref(), Some("1" | "true")));
            }
            // workbookPr precedes the sheet list
            Event::Start(e) if e.local_name().as_ref() == b"sheets" => return Ok(false),
            Event::Eof => return Ok(false),
            _ => {}
        }
        buf.clear();
    }
}

fn read_part(zip: &mut Package<'_>, name: &str) -> Result<Vec<u8>, IoError> {
    let mut part = zip.by_name(name).map_err(|e| IoError::from_backend(BACKEND, e))?;
    let mut bytes = Vec::new();
    part.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn xml_error(err: impl std::error::Error) -> IoError {
    IoError::from_backend(BACKEND, err)
}

fn attr(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, IoError> {
    for a in e.attributes() {
        let a = a.map_err(xml_error)?;
        if a.key.local_name().as_ref() == local {
            return Ok(Some(a.unescape_value().map_err(xml_error)?.into_owned()));
        }
    }
    Ok(None)
}

fn sheet_rel_id(workbook: &[u8], sheet: &str) -> Result<Option<String>, IoError> {
    let mut reader = Reader::from_reader(workbook);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if attr(&e, b"name")?.as_deref() == Some(sheet) {
                    return attr(&e, b"id");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

struct Relationship {
    id: String,
    kind: String,
    target: String,
}

fn relationships(rels: &[u8]) -> Result<Vec<Relationship>, IoError> {
    let mut reader = Reader::from_reader(rels);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                out.push(Relationship {
                    id: attr(&e, b"Id")?.unwrap_or_default(),
                    kind: attr(&e, b"Type")?.unwrap_or_default(),
                    target: attr(&e, b"Target")?.unwrap_or_default(),
                });
            }
            Event::Eof => return Ok(out),
            _ => {}
        }
        buf.clear();
    }
}

// Targets are relative to the directory of the part that owns the .rels file.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

fn parse_comments(xml: &[u8]) -> Result<HashMap<(u32, u32), String>, IoError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = HashMap::new();
    let mut current: Option<((u32, u32), String)> = None;
    // Phonetic runs (`rPh`) repeat the reading, not the note
    let mut in_phonetic = false;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"comment" => {
                    current = match attr(&e, b"ref")? {
                        Some(a1) => {
                            let cell = CellRef::parse_a1(&a1)?;
                            Some(((cell.row, cell.col), String::new()))
                        }
                        None => None,
                    };
                }
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                b"comment" => {
                    if let Some((key, text)) = current.take() {
                        out.insert(key, text);
                    }
                }
                _ => {}
            },
            Event::Eof => return Ok(out),
            _ => {}
        }
        buf.clear();
    }
}
