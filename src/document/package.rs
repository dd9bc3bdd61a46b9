//! Package I/O and validation
//!
//! This module reads a .docx archive into memory, locates its markup parts
//! and writes the archive back with a replaced main part.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml::XmlTree;
use crate::error::{Error, Result};

const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";
const PACKAGE_RELATIONSHIPS: &str = "_rels/.rels";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// An in-memory .docx archive
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

impl DocxPackage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                is_dir: file.is_dir(),
            });
        }

        Ok(DocxPackage { entries })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| !entry.is_dir && entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    /// Name of the main markup part, resolved through the package relationships
    pub fn document_part_name(&self) -> Result<String> {
        let target = self
            .part(PACKAGE_RELATIONSHIPS)
            .and_then(office_document_target)
            .filter(|target| self.part(target).is_some());

        if let Some(target) = target {
            return Ok(target);
        }
        if self.part(DEFAULT_DOCUMENT_PART).is_some() {
            return Ok(DEFAULT_DOCUMENT_PART.to_string());
        }

        // Check if it might be an Excel file
        if self.part("xl/workbook.xml").is_some() {
            return Err(Error::InvalidFormat(
                "this appears to be a spreadsheet package (.xlsx), not a Word document".to_string(),
            ));
        }
        Err(Error::InvalidFormat(format!(
            "missing {DEFAULT_DOCUMENT_PART}; the package is not a valid Word document"
        )))
    }

    /// Main markup part as text
    pub fn document_xml(&self) -> Result<String> {
        let name = self.document_part_name()?;
        self.part_text(&name)
            .ok_or_else(|| Error::InvalidFormat(format!("missing {name}")))?
    }

    /// Style definitions, stored next to the main part
    pub fn styles_xml(&self) -> Result<Option<String>> {
        let document = self.document_part_name()?;
        let name = match document.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/styles.xml"),
            None => "styles.xml".to_string(),
        };
        self.part_text(&name).transpose()
    }

    fn part_text(&self, name: &str) -> Option<Result<String>> {
        self.part(name).map(|data| {
            String::from_utf8(data.to_vec())
                .map_err(|_| Error::InvalidFormat(format!("{name} is not valid UTF-8")))
        })
    }

    pub fn replace_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                is_dir: false,
            }),
        }
    }

    /// Write the archive, deflating every entry at `compression_level`
    pub fn to_bytes(&self, compression_level: i64) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level));

        for entry in &self.entries {
            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn office_document_target(rels: &[u8]) -> Option<String> {
    let xml = std::str::from_utf8(rels).ok()?;
    let tree = XmlTree::parse(xml).ok()?;
    let root = tree.root_element()?;

    tree.children_named(root, "Relationship")
        .find(|&rel| {
            tree.attr(rel, "Type")
                .is_some_and(|kind| kind.ends_with(OFFICE_DOCUMENT_REL))
        })
        .and_then(|rel| tree.attr(rel, "Target"))
        .map(|target| target.trim_start_matches('/').to_string())
}

/// Validates that the file is a legitimate .docx file
pub fn validate_docx_file(file_path: &Path) -> Result<()> {
    // Check file extension
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !extension.eq_ignore_ascii_case("docx") {
        return Err(Error::InvalidFormat(format!(
            "expected a .docx file, got .{extension} \
            (only Word .docx files are supported, not .doc, .xlsx, .zip, etc.)"
        )));
    }

    let bytes = std::fs::read(file_path)?;
    DocxPackage::from_bytes(&bytes)?.document_part_name()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_zip(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_document_part_from_relationships() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="/word/main.xml"/></Relationships>"#;
        let bytes = build_zip(&[
            ("_rels/.rels", rels),
            ("word/main.xml", "<w:document/>"),
            ("word/styles.xml", "<w:styles/>"),
        ]);

        let package = DocxPackage::from_bytes(&bytes).unwrap();
        assert_eq!(package.document_part_name().unwrap(), "word/main.xml");
        assert_eq!(package.styles_xml().unwrap().as_deref(), Some("<w:styles/>"));
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = build_zip(&[("word/styles.xml", "<w:styles/>")]);
        let package = DocxPackage::from_bytes(&bytes).unwrap();
        assert!(matches!(
            package.document_xml(),
            Err(Error::InvalidFormat(_))
        ));

        let bytes = build_zip(&[("xl/workbook.xml", "<workbook/>")]);
        let err = DocxPackage::from_bytes(&bytes)
            .unwrap()
            .document_part_name()
            .unwrap_err();
        assert!(err.to_string().contains("spreadsheet"));
    }

    #[test]
    fn test_replace_and_rewrite() {
        let bytes = build_zip(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", "<old/>"),
        ]);
        let mut package = DocxPackage::from_bytes(&bytes).unwrap();
        package.replace_part("word/document.xml", b"<new/>".to_vec());

        let rewritten = DocxPackage::from_bytes(&package.to_bytes(6).unwrap()).unwrap();
        assert_eq!(rewritten.part("word/document.xml"), Some(&b"<new/>"[..]));
        assert_eq!(rewritten.part("[Content_Types].xml"), Some(&b"<Types/>"[..]));
        assert!(rewritten.styles_xml().unwrap().is_none());
    }

    #[test]
    fn test_rewrite_deflates_entries() {
        let bytes = build_zip(&[("word/document.xml", "<w:document/>")]);
        let package = DocxPackage::from_bytes(&bytes).unwrap();

        let rewritten = package.to_bytes(6).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(rewritten)).unwrap();
        let entry = archive.by_name("word/document.xml").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
    }

    #[test]
    fn test_unsupported_compression_level() {
        let bytes = build_zip(&[("word/document.xml", "<w:document/>")]);
        let package = DocxPackage::from_bytes(&bytes).unwrap();
        assert!(matches!(package.to_bytes(-1), Err(Error::Zip(_))));
    }

    #[test]
    fn test_validate_docx_file_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        assert!(matches!(
            validate_docx_file(&path),
            Err(Error::InvalidFormat(_))
        ));

        let path = dir.path().join("report.docx");
        std::fs::write(&path, build_zip(&[("word/document.xml", "<w:document/>")])).unwrap();
        assert!(validate_docx_file(&path).is_ok());
    }
}
