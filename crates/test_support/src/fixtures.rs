//! TOML case manifests shared by the fixture-driven integration tests.
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const CURSOR_CASES_FORMAT_V1: &str = "typist-cursor-steps-v1";
pub const UNIT_CASES_FORMAT_V1: &str = "typist-units-v1";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct Manifest<T> {
    format: String,
    cases: Vec<T>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CursorCaseMove {
    Selector(String),
    Chars(i64),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CursorCase {
    pub id: String,
    /// Markup typed into an empty container before measuring.
    pub content: String,
    /// Absent means "absolute start/end of the whole container".
    #[serde(rename = "move", default)]
    pub move_spec: Option<CursorCaseMove>,
    pub cursor: usize,
    pub to: String,
    pub expected: i64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UnitCase {
    pub id: String,
    pub input: String,
    #[serde(default = "default_html")]
    pub html: bool,
    /// One formatted line per unit.
    pub expected: Vec<String>,
}

fn default_html() -> bool {
    true
}

fn load_manifest<T>(path: &Path, format: &str) -> Vec<T>
where
    T: for<'de> Deserialize<'de> + HasCaseId,
{
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read case manifest {path:?}: {err}"));
    let manifest: Manifest<T> = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse case manifest {path:?}: {err}"));
    assert_eq!(
        manifest.format, format,
        "unsupported case manifest format in {path:?}"
    );
    assert!(!manifest.cases.is_empty(), "no cases in {path:?}");

    let mut seen = BTreeSet::new();
    for case in &manifest.cases {
        assert!(
            seen.insert(case.case_id().to_string()),
            "duplicate case id in {path:?}: {}",
            case.case_id()
        );
    }
    manifest.cases
}

pub trait HasCaseId {
    fn case_id(&self) -> &str;
}

impl HasCaseId for CursorCase {
    fn case_id(&self) -> &str {
        &self.id
    }
}

impl HasCaseId for UnitCase {
    fn case_id(&self) -> &str {
        &self.id
    }
}

pub fn load_cursor_cases(path: &Path) -> Vec<CursorCase> {
    load_manifest(path, CURSOR_CASES_FORMAT_V1)
}

pub fn load_unit_cases(path: &Path) -> Vec<UnitCase> {
    load_manifest(path, UNIT_CASES_FORMAT_V1)
}
