//! BibTeX spoke: an annotated BibTeX entry and its private parsers.
//!
//! Reading `.bib` text is left to the caller; entries deserialize from the
//! usual JSON rendering (lowercase field names, `entry_type` + `cite_key`).

pub mod parsers;

use metahub_api::date::DatePrecision;
use metahub_api::error::HubError;
use metahub_api::record::Record;
use metahub_api::vocab::DateType;
use metahub_api::{Describable, HubEnum};
use metahub_engine::hooks::HookRegistry;
use metahub_engine::registry::Registries;
use serde::Deserialize;

pub use parsers::{bibtex_month, bibtex_names, latex, latex_to_text, month_number};

/// BibTeX entry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, HubEnum)]
#[hub(name = "bibtex.EntryType")]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[hub(target = "article")]
    Article,
    #[hub(target = "book")]
    Book,
    #[hub(target = "book")]
    Booklet,
    #[hub(target = "book_chapter")]
    InBook,
    #[hub(target = "book_chapter")]
    InCollection,
    #[hub(target = "conference_paper")]
    InProceedings,
    #[hub(target = "report")]
    Manual,
    #[hub(target = "thesis")]
    MastersThesis,
    #[default]
    #[hub(target = "other")]
    Misc,
    #[hub(target = "dissertation")]
    PhdThesis,
    #[hub(target = "proceedings")]
    Proceedings,
    #[hub(target = "report")]
    TechReport,
    #[hub(target = "manuscript")]
    Unpublished,
}

/// One BibTeX entry. `shorttitle` and `title` share the title slot; the full
/// title wins whenever it is present.
#[derive(Debug, Clone, Default, Deserialize, Describable)]
#[hub(target = "Record", name = "bibtex.Entry", preserve_unmapped)]
#[serde(default)]
pub struct BibtexEntry {
    pub cite_key: String,
    #[hub(target = "resource_type")]
    pub entry_type: EntryType,

    #[hub(target = "title", parser = "latex", priority = 2)]
    pub title: String,
    #[hub(target = "title", parser = "latex", priority = 1)]
    pub shorttitle: String,
    #[hub(target = "contributors", role = "aut", parser = "bibtex_names")]
    pub author: String,
    #[hub(target = "contributors", role = "edt", parser = "bibtex_names")]
    pub editor: String,

    #[hub(target = "dates", date_type = "issued", parser = "edtf", validators = "edtf")]
    pub year: String,
    #[hub(target = "", parser = "bibtex_month", description = "BibTeX month; folded into the issued date")]
    pub month: String,

    #[hub(target = "container_title", parser = "latex", priority = 2)]
    pub journal: String,
    #[hub(target = "container_title", parser = "latex", priority = 1)]
    pub booktitle: String,
    #[hub(target = "publisher", parser = "latex")]
    pub publisher: String,
    #[hub(target = "place_published", parser = "latex")]
    pub address: String,
    #[hub(target = "volume")]
    pub volume: String,
    #[hub(target = "issue")]
    pub number: String,
    #[hub(target = "pages", parser = "latex")]
    pub pages: String,
    #[hub(target = "edition")]
    pub edition: String,
    #[hub(target = "series", parser = "latex")]
    pub series: String,
    #[hub(target = "degree_info.institution", parser = "latex")]
    pub school: String,

    #[hub(target = "identifiers", identifier_type = "doi", parser = "doi", validators = "doi")]
    pub doi: String,
    #[hub(target = "identifiers", identifier_type = "isbn", parser = "isbn", validators = "isbn")]
    pub isbn: String,
    #[hub(target = "identifiers", identifier_type = "issn", parser = "issn", validators = "issn")]
    pub issn: String,
    #[hub(target = "identifiers", identifier_type = "url", parser = "trim", validators = "url")]
    pub url: String,

    #[hub(target = "abstract", parser = "latex")]
    pub r#abstract: String,
    #[hub(target = "subjects", subject_vocabulary = "keywords", parser = "split", delimiter = ",")]
    pub keywords: String,
    #[hub(target = "language", parser = "lowercase")]
    pub language: String,
    #[hub(target = "notes", parser = "latex")]
    pub note: String,
    #[hub(target = "", description = "BibTeX crossref key")]
    pub crossref: String,
}

/// Register the BibTeX parsers and computed fields.
pub fn register(registries: &Registries, hooks: &HookRegistry) {
    registries.register_parser("latex", parsers::latex);
    registries.register_parser("bibtex_month", parsers::bibtex_month);
    registries.register_parser("bibtex_names", parsers::bibtex_names);
    hooks.register_for::<BibtexEntry, _>(fold_month_into_issued);
    tracing::info!(spoke = "bibtex", "registered spoke");
}

/// Refine a year-only issued date with the entry's month.
fn fold_month_into_issued(entry: &BibtexEntry, record: &mut Record) -> Result<(), HubError> {
    if entry.month.trim().is_empty() {
        return Ok(());
    }
    let Some(month) = month_number(&entry.month) else {
        // The field parser already reported it.
        return Ok(());
    };
    let Some(issued) = record.date_mut(DateType::Issued) else {
        return Ok(());
    };
    if issued.is_range || issued.precision != DatePrecision::Year {
        return Ok(());
    }
    issued.month = Some(month);
    issued.precision = DatePrecision::Month;
    issued.raw = issued.to_edtf();
    Ok(())
}
