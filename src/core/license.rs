//! License text for the `license` step.
//!
//! The step writes `<project_root>/LICENSE` from the text registered for the
//! selected identifier. MIT and Apache 2.0 carry copyright placeholders that
//! are filled from the `owner` variable and the current year.

use std::path::{Path, PathBuf};

use chrono::Datelike;
use thiserror::Error;

use crate::domain::RuntimeValues;

/// Variable holding the copyright owner.
pub const OWNER_VAR: &str = "owner";

/// Known license identifiers, their display names and asset file names.
pub const LICENSES: &[(&str, &str, &str)] = &[
    ("mit", "MIT", "MIT.LICENSE"),
    ("gnugpl3", "GNU GPL v3", "GPL.LICENSE"),
    ("gnuagpl3", "GNU AGPL v3", "AGPL.LICENSE"),
    ("gnulgpl3", "GNU LGPL v3", "LGPL.LICENSE"),
    ("mozillapublic", "Mozilla Public License", "MOZILLA.LICENSE"),
    ("apache2", "Apache 2.0", "APACHE.LICENSE"),
    ("boostsoftware", "Boost Software License", "BOOST.LICENSE"),
    ("unlicense", "Unlicense", "UNLICENSE.LICENSE"),
];

#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("License '{0}' is not available")]
    Unknown(String),
    #[error("License '{license}' needs a '{variable}' variable")]
    MissingVariable { license: String, variable: String },
    #[error("Cannot read license text {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub fn asset_name(id: &str) -> Option<&'static str> {
    LICENSES
        .iter()
        .find(|(known, _, _)| *known == id)
        .map(|(_, _, file)| *file)
}

/// Source of raw license texts, placeholders still in place.
pub trait LicenseProvider: Send + Sync {
    fn text(&self, id: &str) -> Result<String, LicenseError>;
}

/// Texts compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLicenses;

impl LicenseProvider for BundledLicenses {
    fn text(&self, id: &str) -> Result<String, LicenseError> {
        let text = match id {
            "mit" => include_str!("../../assets/licenses/MIT.LICENSE"),
            "gnugpl3" => include_str!("../../assets/licenses/GPL.LICENSE"),
            "gnuagpl3" => include_str!("../../assets/licenses/AGPL.LICENSE"),
            "gnulgpl3" => include_str!("../../assets/licenses/LGPL.LICENSE"),
            "mozillapublic" => include_str!("../../assets/licenses/MOZILLA.LICENSE"),
            "apache2" => include_str!("../../assets/licenses/APACHE.LICENSE"),
            "boostsoftware" => include_str!("../../assets/licenses/BOOST.LICENSE"),
            "unlicense" => include_str!("../../assets/licenses/UNLICENSE.LICENSE"),
            other => return Err(LicenseError::Unknown(other.to_string())),
        };
        Ok(text.to_string())
    }
}

/// Texts read from `<dir>/<ASSET>.LICENSE`, falling back to the bundled set.
#[derive(Debug, Clone)]
pub struct DirectoryLicenses {
    dir: PathBuf,
}

impl DirectoryLicenses {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LicenseProvider for DirectoryLicenses {
    fn text(&self, id: &str) -> Result<String, LicenseError> {
        let file = asset_name(id).ok_or_else(|| LicenseError::Unknown(id.to_string()))?;
        let path = self.dir.join(file);
        if path.is_file() {
            return std::fs::read_to_string(&path)
                .map_err(|source| LicenseError::Read { path, source });
        }
        BundledLicenses.text(id)
    }
}

/// Final license text for `id` with placeholders filled in.
pub fn render_license(
    provider: &dyn LicenseProvider,
    id: &str,
    values: &RuntimeValues,
) -> Result<String, LicenseError> {
    let text = provider.text(id)?;
    let (year_marker, name_marker) = match id {
        "mit" => ("[year]", "[fullname]"),
        "apache2" => ("[yyyy]", "[name of copyright owner]"),
        _ => return Ok(text),
    };
    let owner = values
        .get_text(OWNER_VAR)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| LicenseError::MissingVariable {
            license: id.to_string(),
            variable: OWNER_VAR.to_string(),
        })?;
    let year = chrono::Local::now().year().to_string();
    Ok(text.replace(year_marker, &year).replace(name_marker, owner))
}
