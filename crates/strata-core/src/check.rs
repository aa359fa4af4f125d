use std::collections::BTreeMap;
use std::error::Error as _;
use std::fmt;
use std::path::Path;

use crate::error::{Result, StrataError};
use crate::manifest::generate::TEMPLATE_SUFFIX;
use crate::manifest::{load_repository_manifest, parse_template_list, TEMPLATE_LIST};
use crate::render::TemplateEngine;
use crate::vfs::{walk_files, FileTree, LocalTree};

/// Part of a template repository a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckSection {
    Manifest,
    Templates,
    TemplateList,
}

impl fmt::Display for CheckSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckSection::Manifest => "manifest.yaml",
            CheckSection::Templates => "templates",
            CheckSection::TemplateList => TEMPLATE_LIST,
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub section: CheckSection,
    pub severity: Severity,
    pub message: String,
}

/// Result of validating a template repository.
#[derive(Debug, Default)]
pub struct CheckResult {
    pub repository_name: String,
    pub argument_count: usize,
    pub template_count: usize,
    pub findings: Vec<Finding>,
}

impl CheckResult {
    pub fn is_ok(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.messages(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Severity::Warning)
    }

    /// Findings grouped by section, in section order.
    pub fn by_section(&self) -> BTreeMap<CheckSection, Vec<&Finding>> {
        let mut sections: BTreeMap<CheckSection, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            sections.entry(finding.section).or_default().push(finding);
        }
        sections
    }

    fn messages(&self, severity: Severity) -> Vec<&str> {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .map(|f| f.message.as_str())
            .collect()
    }

    fn warn(&mut self, section: CheckSection, message: String) {
        self.findings.push(Finding {
            section,
            severity: Severity::Warning,
            message,
        });
    }

    fn error(&mut self, section: CheckSection, message: String) {
        self.findings.push(Finding {
            section,
            severity: Severity::Error,
            message,
        });
    }
}

/// Validate a template repository checkout without rendering anything.
pub fn check_template_repository(dir: &Path) -> Result<CheckResult> {
    let repository = LocalTree::new(dir);
    let manifest = load_repository_manifest(&repository)?;

    let mut result = CheckResult {
        repository_name: manifest.name.clone(),
        argument_count: manifest.arguments.len(),
        ..Default::default()
    };

    // Manifest
    for (index, dependency) in manifest.dependencies.iter().enumerate() {
        if dependency.git_url.trim().is_empty() {
            result.error(
                CheckSection::Manifest,
                format!("dependency #{} has an empty gitUrl", index + 1),
            );
        }
    }
    for (name, argument) in &manifest.arguments {
        if argument.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
            result.warn(CheckSection::Manifest, format!("argument '{name}' has no description"));
        }
        if argument.required && argument.values.iter().any(String::is_empty) {
            result.warn(
                CheckSection::Manifest,
                format!("argument '{name}' is required but allows an empty value"),
            );
        }
    }

    let templates: Box<dyn FileTree> = match manifest.template_dir.as_deref() {
        Some(sub) => match repository.chroot(Path::new(sub)) {
            Ok(tree) => tree,
            Err(_) => {
                result.error(
                    CheckSection::Manifest,
                    format!("templateDir '{sub}' does not exist"),
                );
                return Ok(result);
            }
        },
        None => Box::new(repository.clone()),
    };

    // Templates
    check_template_files(templates.as_ref(), &mut result)?;

    // files.yaml
    let list_path = Path::new(TEMPLATE_LIST);
    if templates.exists(list_path) {
        match parse_template_list(&templates.read(list_path)?, list_path) {
            Ok(list) => {
                for (write_path, template) in &list.templates {
                    if templates.exists(Path::new(&template.source)) {
                        continue;
                    }
                    let message = format!(
                        "'{write_path}' uses missing template '{}'",
                        template.source
                    );
                    // may be contributed by a dependency layer
                    if manifest.dependencies.is_empty() {
                        result.error(CheckSection::TemplateList, message);
                    } else {
                        result.warn(CheckSection::TemplateList, message);
                    }
                }
            }
            Err(e) => result.error(CheckSection::TemplateList, e.to_string()),
        }
    }

    Ok(result)
}

fn check_template_files(tree: &dyn FileTree, result: &mut CheckResult) -> Result<()> {
    let engine = TemplateEngine::new(BTreeMap::new());

    for path in walk_files(tree, Path::new(""))? {
        if path.starts_with(".git") || !path.to_string_lossy().ends_with(TEMPLATE_SUFFIX) {
            continue;
        }
        result.template_count += 1;

        let body = match tree.read(&path).map(String::from_utf8) {
            Ok(Ok(body)) => body,
            Ok(Err(_)) => {
                result.warn(CheckSection::Templates, format!("{} is not valid UTF-8", path.display()));
                continue;
            }
            Err(e) => {
                result.warn(CheckSection::Templates, format!("could not read {}: {e}", path.display()));
                continue;
            }
        };

        match engine.check_syntax(&path, &body) {
            Ok(()) => {}
            Err(StrataError::TemplateRender { source, .. }) => {
                let detail = source
                    .source()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| source.to_string());
                result.error(CheckSection::Templates, format!("{}: {detail}", path.display()));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
