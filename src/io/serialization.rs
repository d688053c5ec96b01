// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Report export.
//!
//! Writes the reports of one slide to YAML or JSON so they can be archived
//! outside the backend.

use crate::models::report::ReportExport;
use anyhow::{Context, Result};
use std::path::Path;

/// Export reports to YAML format.
pub fn export_yaml(data: &ReportExport, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} reports to {}", data.reports.len(), path.display());
    Ok(())
}

/// Export reports to JSON format.
pub fn export_json(data: &ReportExport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} reports to {}", data.reports.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{Report, ReportId};
    use crate::models::slide::SlideId;
    use crate::models::timestamp;

    fn sample() -> ReportExport {
        let stamp = timestamp::parse("2024-01-01T00:00:00Z").unwrap();
        ReportExport {
            slide: SlideId::new("slide42"),
            exported_at: Some(stamp),
            reports: vec![Report {
                id: ReportId(1),
                title: "Initial".to_string(),
                content: "<p>First look</p>".to_string(),
                created_at: Some(stamp),
                updated_at: None,
            }],
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pathview-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_export_yaml() {
        let path = temp_path("reports.yaml");
        export_yaml(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: ReportExport = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back.slide, SlideId::new("slide42"));
        assert_eq!(back.reports, sample().reports);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_json() {
        let path = temp_path("reports.json");
        export_json(&sample(), &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["slide"], "slide42");
        assert_eq!(value["reports"][0]["id"], 1);
        assert_eq!(value["reports"][0]["title"], "Initial");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let path = temp_path("missing").join("nested").join("reports.yaml");
        assert!(export_yaml(&sample(), &path).is_err());
    }
}
