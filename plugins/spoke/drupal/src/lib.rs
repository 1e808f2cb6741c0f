//! Drupal ETD spoke: theses and dissertations exported from a Drupal site.

pub mod embargo;

use metahub_api::{Describable, HubEnum};
use metahub_engine::hooks::HookRegistry;
use metahub_engine::registry::Registries;
use serde::Deserialize;

pub use embargo::{Embargo, apply_embargo};

/// A person paragraph (author, advisor, committee member).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Describable)]
#[hub(name = "drupal.Person")]
#[serde(default)]
pub struct DrupalPerson {
    pub name: String,
    pub given: String,
    pub family: String,
    pub suffix: String,
    pub orcid: String,
    pub affiliation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, HubEnum)]
#[hub(name = "drupal.ResourceKind")]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[default]
    #[hub(target = "dissertation")]
    Dissertation,
    #[hub(target = "thesis")]
    MastersThesis,
    #[hub(target = "thesis")]
    HonorsThesis,
    #[hub(target = "report")]
    CapstoneProject,
    Dataset,
    Other,
}

/// One ETD node.
#[derive(Debug, Clone, Default, Deserialize, Describable)]
#[hub(target = "Record", name = "drupal.Thesis")]
#[serde(default)]
pub struct DrupalThesis {
    pub nid: u64,
    pub status: bool,

    #[hub(target = "title", parser = "strip_html", required, max_length = 1000)]
    pub title: String,
    #[hub(target = "alt_title", parser = "strip_html")]
    pub field_alternative_title: Vec<String>,
    #[hub(target = "abstract", parser = "strip_html")]
    pub field_abstract: String,
    #[hub(target = "resource_type")]
    pub field_resource_kind: ResourceKind,
    #[hub(target = "language", parser = "lowercase")]
    pub langcode: String,

    #[hub(target = "contributors", role = "aut", required, min_count = 1)]
    pub field_author: Vec<DrupalPerson>,
    #[hub(target = "contributors", role = "ths")]
    pub field_advisor: Vec<DrupalPerson>,
    #[hub(target = "contributors", role = "dgc")]
    pub field_committee: Vec<DrupalPerson>,

    #[hub(target = "degree_info.degree_name")]
    pub field_degree_name: String,
    #[hub(target = "degree_info.degree_level")]
    pub field_degree_level: String,
    #[hub(target = "degree_info.department")]
    pub field_department: String,
    #[hub(target = "degree_info.institution")]
    pub field_institution: String,

    #[hub(target = "dates", date_type = "accepted", parser = "edtf", validators = "edtf")]
    pub field_date_accepted: String,
    #[hub(target = "dates", date_type = "issued", parser = "edtf", validators = "edtf")]
    pub field_date_issued: String,
    #[hub(
        target = "",
        min_value = 0,
        max_value = 4,
        description = "Embargo code: 0 none, 1 six months, 2 one year, 3 two years, 4 indefinite"
    )]
    pub field_embargo_code: Option<i64>,

    #[hub(target = "subjects", subject_vocabulary = "lcsh")]
    pub field_subject_lcsh: Vec<String>,
    #[hub(target = "subjects", subject_vocabulary = "keywords")]
    pub field_keywords: Vec<String>,
    #[hub(target = "genres", subject_vocabulary = "local")]
    pub field_genre: Vec<String>,
    #[hub(target = "relations", relation_type = "is_part_of")]
    pub field_series: String,
    #[hub(target = "rights")]
    pub field_rights: Vec<String>,
    #[hub(target = "notes", parser = "strip_html")]
    pub field_note: Vec<String>,

    #[hub(target = "identifiers", identifier_type = "doi", parser = "doi", validators = "doi")]
    pub field_doi: String,
    #[hub(target = "identifiers", identifier_type = "handle", parser = "trim")]
    pub field_handle: String,
    #[hub(target = "identifiers", identifier_type = "url", validators = "url")]
    pub path_alias: String,
}

/// Register the Drupal computed fields. The spoke needs no private parsers.
pub fn register(_registries: &Registries, hooks: &HookRegistry) {
    hooks.register_for::<DrupalThesis, _>(|thesis, record| {
        apply_embargo(thesis.field_embargo_code, record)
    });
    tracing::info!(spoke = "drupal", "registered spoke");
}
