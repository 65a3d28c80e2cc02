//! NcML serialization for aggregation documents.
//!
//! Each catalog is one pretty-printed UTF-8 XML file: a `<netcdf>` root in
//! the NcML namespace holding a single `<aggregation>` element whose
//! `<netcdf location=… ncoords=…>` children record the member files in
//! insertion order. Every save rewrites the whole document atomically.

use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::Path;

use atomic_write_file::AtomicWriteFile;
use quick_xml::Reader as XmlReader;
use quick_xml::Writer as XmlWriter;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::constants::{NCML_NAMESPACE, SINGLE_COORD};
use crate::error::{DatacubeError, Result};
use crate::types::Product;

const INDENT: u8 = b' ';
const INDENT_WIDTH: usize = 2;

/// In-memory form of one persisted aggregation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NcmlDocument {
    pub dim_name: String,
    pub agg_type: String,
    pub products: Vec<Product>,
}

impl NcmlDocument {
    #[must_use]
    pub fn new(dim_name: impl Into<String>, agg_type: impl Into<String>) -> Self {
        Self {
            dim_name: dim_name.into(),
            agg_type: agg_type.into(),
            products: Vec::new(),
        }
    }
}

fn malformed(path: &Path, reason: impl Display) -> DatacubeError {
    DatacubeError::InvalidDocument {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Load the document at `path`.
///
/// Returns `Ok(None)` when the path does not exist, and also when the file
/// parses but carries no aggregation element — in both cases the catalog
/// has no aggregation yet and the next add bootstraps one.
pub fn load(path: &Path) -> Result<Option<NcmlDocument>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;

    let mut reader = XmlReader::from_str(&text);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut doc: Option<NcmlDocument> = None;
    let mut in_aggregation = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"aggregation" => {
                begin_aggregation(path, e, &mut doc)?;
                in_aggregation = true;
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"aggregation" => {
                begin_aggregation(path, e, &mut doc)?;
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e))
                if in_aggregation && e.name().as_ref() == b"netcdf" =>
            {
                push_entry(path, e, &mut doc)?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"aggregation" => {
                in_aggregation = false;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(malformed(path, err)),
            Ok(_) => {}
        }
        buf.clear();
    }

    Ok(doc)
}

fn begin_aggregation(
    path: &Path,
    elem: &BytesStart<'_>,
    doc: &mut Option<NcmlDocument>,
) -> Result<()> {
    if doc.is_some() {
        return Err(malformed(path, "more than one aggregation element"));
    }
    let mut dim_name = String::new();
    let mut agg_type = String::new();
    for attr in elem.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(path, err))?
            .into_owned();
        match attr.key.as_ref() {
            b"dimName" => dim_name = value,
            b"type" => agg_type = value,
            _ => {}
        }
    }
    *doc = Some(NcmlDocument::new(dim_name, agg_type));
    Ok(())
}

fn push_entry(path: &Path, elem: &BytesStart<'_>, doc: &mut Option<NcmlDocument>) -> Result<()> {
    let mut location = None;
    let mut ncoords = None;
    for attr in elem.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(path, err))?
            .into_owned();
        match attr.key.as_ref() {
            b"location" => location = Some(value),
            b"ncoords" => ncoords = Some(value),
            _ => {}
        }
    }
    let location = location.ok_or_else(|| malformed(path, "netcdf entry without location"))?;
    if let Some(doc) = doc.as_mut() {
        doc.products.push(Product {
            location,
            ncoords: ncoords.unwrap_or_else(|| SINGLE_COORD.to_string()),
        });
    }
    Ok(())
}

/// Persist `doc` to `path`, creating missing parent directories.
///
/// The document is rendered in full into a buffer, then swapped into place
/// so a crash mid-save never leaves a truncated catalog behind.
pub fn save(path: &Path, doc: &NcmlDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = XmlWriter::new_with_indent(Vec::new(), INDENT, INDENT_WIDTH);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|err| malformed(path, err))?;

    let mut root = BytesStart::new("netcdf");
    root.push_attribute(("xmlns", NCML_NAMESPACE));
    writer
        .write_event(Event::Start(root))
        .map_err(|err| malformed(path, err))?;

    let mut aggregation = BytesStart::new("aggregation");
    aggregation.push_attribute(("dimName", doc.dim_name.as_str()));
    aggregation.push_attribute(("type", doc.agg_type.as_str()));

    if doc.products.is_empty() {
        writer
            .write_event(Event::Empty(aggregation))
            .map_err(|err| malformed(path, err))?;
    } else {
        writer
            .write_event(Event::Start(aggregation))
            .map_err(|err| malformed(path, err))?;
        for product in &doc.products {
            let mut entry = BytesStart::new("netcdf");
            entry.push_attribute(("location", product.location.as_str()));
            entry.push_attribute(("ncoords", product.ncoords.as_str()));
            writer
                .write_event(Event::Empty(entry))
                .map_err(|err| malformed(path, err))?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("aggregation")))
            .map_err(|err| malformed(path, err))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("netcdf")))
        .map_err(|err| malformed(path, err))?;

    let mut xml = writer.into_inner();
    xml.push(b'\n');

    let mut atomic = AtomicWriteFile::options().open(path)?;
    atomic.as_file_mut().write_all(&xml)?;
    atomic.as_file_mut().sync_all()?;
    atomic.commit()?;

    tracing::debug!(
        ncml.path = %path.display(),
        ncml.products = doc.products.len(),
        "wrote aggregation document"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_doc() -> NcmlDocument {
        let mut doc = NcmlDocument::new("time", "joinExisting");
        doc.products.push(Product::new("/data/a.nc"));
        doc.products.push(Product::new("/data/b.nc"));
        doc
    }

    #[test]
    fn missing_path_loads_as_none() {
        let dir = TempDir::new().expect("temp dir");
        let loaded = load(&dir.path().join("absent.ncml")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("cube.ncml");
        let doc = sample_doc();

        save(&path, &doc).expect("save");
        let loaded = load(&path).expect("load").expect("document present");

        assert_eq!(loaded, doc);
    }

    #[test]
    fn empty_aggregation_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("cube.ncml");
        let doc = NcmlDocument::new("time", "joinExisting");

        save(&path, &doc).expect("save");
        let loaded = load(&path).expect("load").expect("document present");

        assert_eq!(loaded.dim_name, "time");
        assert_eq!(loaded.agg_type, "joinExisting");
        assert!(loaded.products.is_empty());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("T31UFT").join("2021").join("cube.ncml");

        save(&path, &sample_doc()).expect("save");
        assert!(path.is_file());
    }

    #[test]
    fn serialized_form_is_declared_and_namespaced() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("cube.ncml");

        save(&path, &sample_doc()).expect("save");
        let text = fs::read_to_string(&path).expect("read back");

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains(NCML_NAMESPACE));
        assert!(text.contains("dimName=\"time\""));
        assert!(text.contains("type=\"joinExisting\""));
        assert!(text.contains("location=\"/data/a.nc\""));
        assert!(text.contains("ncoords=\"1\""));
    }

    #[test]
    fn entry_order_matches_insertion_order() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("cube.ncml");
        let mut doc = NcmlDocument::new("time", "joinExisting");
        for name in ["z.nc", "a.nc", "m.nc"] {
            doc.products.push(Product::new(format!("/data/{name}")));
        }

        save(&path, &doc).expect("save");
        let loaded = load(&path).expect("load").expect("document present");
        let locations: Vec<&str> = loaded
            .products
            .iter()
            .map(|p| p.location.as_str())
            .collect();

        assert_eq!(locations, vec!["/data/z.nc", "/data/a.nc", "/data/m.nc"]);
    }

    #[test]
    fn document_without_aggregation_loads_as_none() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("bare.ncml");
        fs::write(
            &path,
            format!("<?xml version=\"1.0\"?>\n<netcdf xmlns=\"{NCML_NAMESPACE}\"/>\n"),
        )
        .expect("write bare document");

        let loaded = load(&path).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_document_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("broken.ncml");
        fs::write(
            &path,
            "<netcdf><aggregation dimName=\"time\"></netcdf>",
        )
        .expect("write");

        let err = load(&path).expect_err("must fail");
        match err {
            DatacubeError::InvalidDocument { path: seen, .. } => assert_eq!(seen, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
