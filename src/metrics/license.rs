//! License compatibility
//!
//! License text is looked up in this order:
//!
//! 1. a `# License` / `# Licence` / `# Licensing` README section (up to the
//!    next heading)
//! 2. up to three README lines naming a specific license
//! 3. the `license:` key of the model card's YAML front matter
//! 4. the first lines of a `LICENSE*` file in the repository
//!
//! The text is then classified: permissive → 1.0, LGPL → 0.5, GPL/AGPL →
//! 0.1, anything else → 0.0.

use super::{readme_text, Analyzer, Measurement};
use crate::collaborators::{CollabResult, Collaborators};
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

static SECTION_HEADING: OnceLock<Regex> = OnceLock::new();
static MENTION: OnceLock<Regex> = OnceLock::new();
static PERMISSIVE: OnceLock<Regex> = OnceLock::new();
static LGPL: OnceLock<Regex> = OnceLock::new();
static COPYLEFT: OnceLock<Regex> = OnceLock::new();

fn section_heading() -> &'static Regex {
    SECTION_HEADING.get_or_init(|| {
        Regex::new(r"(?i)^#+\s*(license|licence|licensing)\s*$").expect("valid regex")
    })
}

fn mention() -> &'static Regex {
    MENTION.get_or_init(|| {
        Regex::new(
            r"(?i)(mit license|apache 2\.0|apache license|\bl?gpl|bsd license|bsd-[23]|\bmpl\b|eclipse public)",
        )
        .expect("valid regex")
    })
}

fn permissive() -> &'static Regex {
    PERMISSIVE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(mit|apache[ -]?(2(\.0)?|license)|bsd(-[234]-clause)?|isc|unlicense|cc0|zlib|boost|mpl(-2\.0)?|mozilla public license|eclipse public license|epl(-2\.0)?)\b",
        )
        .expect("valid regex")
    })
}

fn lgpl() -> &'static Regex {
    LGPL.get_or_init(|| {
        Regex::new(r"(?i)(\blgpl|lesser general public license)").expect("valid regex")
    })
}

fn copyleft() -> &'static Regex {
    COPYLEFT.get_or_init(|| {
        Regex::new(r"(?i)(\ba?gpl|gnu general public license|gnu affero general public license)")
            .expect("valid regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseClass {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Unknown,
}

impl LicenseClass {
    pub fn score(&self) -> f64 {
        match self {
            LicenseClass::Permissive => 1.0,
            LicenseClass::WeakCopyleft => 0.5,
            LicenseClass::StrongCopyleft => 0.1,
            LicenseClass::Unknown => 0.0,
        }
    }
}

pub fn classify_license(text: &str) -> LicenseClass {
    if permissive().is_match(text) {
        LicenseClass::Permissive
    } else if lgpl().is_match(text) {
        LicenseClass::WeakCopyleft
    } else if copyleft().is_match(text) {
        LicenseClass::StrongCopyleft
    } else {
        LicenseClass::Unknown
    }
}

/// License text named by a README, if any
pub fn extract_license_text(readme: &str) -> Option<String> {
    let lines: Vec<&str> = readme.lines().collect();

    if let Some(start) = lines.iter().position(|l| section_heading().is_match(l.trim())) {
        let section: Vec<&str> = lines[start + 1..]
            .iter()
            .map(|l| l.trim())
            .take_while(|l| !l.starts_with('#'))
            .skip_while(|l| l.is_empty())
            .collect();
        let text = section.join(" ").trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }

    let mentions: Vec<&str> = lines
        .iter()
        .filter(|l| mention().is_match(l))
        .map(|l| l.trim())
        .take(3)
        .collect();
    if !mentions.is_empty() {
        return Some(mentions.join(" "));
    }

    front_matter_license(readme)
}

/// `license:` from a leading `---` YAML block
fn front_matter_license(card: &str) -> Option<String> {
    let mut lines = card.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }
    lines
        .take_while(|l| l.trim() != "---")
        .find_map(|l| l.trim().strip_prefix("license:"))
        .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|v| !v.is_empty())
}

pub struct LicenseAnalyzer;

#[async_trait]
impl Analyzer for LicenseAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::License
    }

    async fn measure(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let mut text = readme_text(artifact, collaborators)
            .await?
            .and_then(|readme| extract_license_text(&readme));

        if text.is_none() {
            if let Some(repo) = &collaborators.repository {
                text = repo.read_license_file().await?;
            }
        }

        let Some(text) = text else {
            debug!("No license text found for {}", artifact.id);
            return Ok(Measurement::score(0.0));
        };
        Ok(Measurement::score(classify_license(&text).score()))
    }
}
