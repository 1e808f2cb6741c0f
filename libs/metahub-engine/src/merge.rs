//! Priority resolution between source fields that share a target slot.

use std::collections::HashMap;

use metahub_api::reflect::FieldAnnotation;
use metahub_api::record::{DegreeInfo, Publication, Record};

/// A canonical slot: target path plus sub-target selector.
///
/// `dates` with `date_type = "issued"` and `dates` with `date_type = "created"`
/// are different slots. Contributors are also split by contributor type, so
/// personal and corporate authors of one role do not compete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub target: &'static str,
    pub sub_type: Option<&'static str>,
    pub contributor_type: Option<&'static str>,
}

impl SlotKey {
    pub fn of(annotation: &FieldAnnotation) -> Self {
        Self {
            target: annotation.target,
            sub_type: annotation.sub_type(),
            contributor_type: annotation.contributor_type,
        }
    }
}

/// Outcome of offering a prioritized write to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The write produced a value and now owns the slot.
    Claimed,
    /// Admitted, but produced nothing; the slot stays open.
    Empty,
    /// A higher or equal priority already owns the slot.
    Rejected,
}

/// Highest priority recorded per slot during one conversion.
#[derive(Debug, Default)]
pub struct SlotPriorities {
    claimed: HashMap<SlotKey, i32>,
}

impl SlotPriorities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a write at `priority`.
    ///
    /// `write` runs only when the slot is unclaimed or held at a strictly
    /// lower priority, and must report whether it produced a value. Only a
    /// productive write records its priority.
    pub fn offer(&mut self, key: SlotKey, priority: i32, write: impl FnOnce() -> bool) -> Decision {
        if let Some(&held) = self.claimed.get(&key) {
            if priority <= held {
                tracing::debug!(slot = key.target, priority, held, "slot write rejected");
                return Decision::Rejected;
            }
        }
        if write() {
            tracing::debug!(slot = key.target, priority, "slot claimed");
            self.claimed.insert(key, priority);
            Decision::Claimed
        } else {
            Decision::Empty
        }
    }

    pub fn priority(&self, key: &SlotKey) -> Option<i32> {
        self.claimed.get(key).copied()
    }
}

/// Fold the contents of `scratch` into `record`.
///
/// Non-empty text overwrites, collections extend, optional blocks replace
/// or merge field by field.
pub fn absorb(record: &mut Record, scratch: Record) {
    let Record {
        title,
        alt_title,
        abstract_text,
        contributors,
        dates,
        identifiers,
        subjects,
        genres,
        relations,
        rights,
        resource_type,
        degree_info,
        publication,
        language,
        notes,
        extra,
    } = scratch;

    overwrite(&mut record.title, title);
    overwrite(&mut record.abstract_text, abstract_text);
    overwrite(&mut record.language, language);
    record.alt_title.extend(alt_title);
    record.contributors.extend(contributors);
    record.dates.extend(dates);
    record.identifiers.extend(identifiers);
    record.subjects.extend(subjects);
    record.genres.extend(genres);
    record.relations.extend(relations);
    record.rights.extend(rights);
    record.notes.extend(notes);
    record.extra.extend(extra);
    if resource_type.is_some() {
        record.resource_type = resource_type;
    }
    if let Some(degree) = degree_info {
        absorb_degree(record.degree_info_mut(), degree);
    }
    absorb_publication(&mut record.publication, publication);
}

fn overwrite(slot: &mut String, value: String) {
    if !value.trim().is_empty() {
        *slot = value;
    }
}

fn absorb_degree(into: &mut DegreeInfo, from: DegreeInfo) {
    overwrite(&mut into.degree_name, from.degree_name);
    overwrite(&mut into.degree_level, from.degree_level);
    overwrite(&mut into.department, from.department);
    overwrite(&mut into.institution, from.institution);
}

fn absorb_publication(into: &mut Publication, from: Publication) {
    overwrite(&mut into.publisher, from.publisher);
    overwrite(&mut into.place_published, from.place_published);
    overwrite(&mut into.container_title, from.container_title);
    overwrite(&mut into.volume, from.volume);
    overwrite(&mut into.issue, from.issue);
    overwrite(&mut into.pages, from.pages);
    overwrite(&mut into.edition, from.edition);
    overwrite(&mut into.series, from.series);
}
