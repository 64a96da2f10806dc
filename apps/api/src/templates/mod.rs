//! CV template gallery and the export stub.
//!
//! Export is deliberately a placeholder: it writes a marker file and returns
//! its path. A real rendering engine is out of scope for this service.

pub mod handlers;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_CONTENT: &str = "CV Export";

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const GALLERY: [Template; 5] = [
    Template {
        id: "modern",
        name: "Modern Professional",
        description: "Clean, contemporary design perfect for tech and creative roles",
    },
    Template {
        id: "classic",
        name: "Classic Executive",
        description: "Traditional format ideal for corporate and executive positions",
    },
    Template {
        id: "creative",
        name: "Creative Designer",
        description: "Bold layout with visual elements for creative professionals",
    },
    Template {
        id: "minimalist",
        name: "Minimalist Clean",
        description: "Simple, elegant design that focuses on content",
    },
    Template {
        id: "academic",
        name: "Academic Scholar",
        description: "Formal layout designed for academic and research positions",
    },
];

pub fn find_template(id: &str) -> Option<&'static Template> {
    GALLERY.iter().find(|t| t.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

/// Writes the placeholder export file and returns its path.
pub fn export_placeholder(
    export_dir: impl AsRef<Path>,
    format: ExportFormat,
) -> std::io::Result<PathBuf> {
    let dir = export_dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("my-cv.{}", format.extension()));
    fs::write(&path, PLACEHOLDER_CONTENT)?;
    Ok(path)
}
