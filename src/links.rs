//! Forward links and backlinks derived from the flat link list.
//!
//! Nothing is indexed or cached: every call scans the links in order and
//! resolves endpoints against the current notes. Endpoints that no longer
//! resolve to a note are skipped.
use log::trace;

use crate::{Link, Note, OrderedMap};

/// Targets of every link whose source is `note_id`, in link order.
pub fn linked_notes<'a>(
    notes: &'a OrderedMap<Note>,
    links: &[Link],
    note_id: &str,
) -> Vec<&'a Note> {
    resolve(
        notes,
        links
            .iter()
            .filter(|link| link.source_id == note_id)
            .map(|link| link.target_id.as_str()),
    )
}

/// Sources of every link whose target is `note_id`, in link order.
pub fn backlinks<'a>(notes: &'a OrderedMap<Note>, links: &[Link], note_id: &str) -> Vec<&'a Note> {
    resolve(
        notes,
        links
            .iter()
            .filter(|link| link.target_id == note_id)
            .map(|link| link.source_id.as_str()),
    )
}

fn resolve<'a, 'b>(
    notes: &'a OrderedMap<Note>,
    ids: impl Iterator<Item = &'b str>,
) -> Vec<&'a Note> {
    ids.filter_map(|id| {
        let note = notes.get(id);
        if note.is_none() {
            trace!("Skipping dangling link endpoint: {}", id);
        }
        note
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinkType, NoteDraft};

    fn add(notes: &mut OrderedMap<Note>, title: &str) -> String {
        let note = Note::new(NoteDraft {
            title: Some(title.to_string()),
            ..Default::default()
        });
        let id = note.id.clone();
        notes.insert(id.clone(), note);
        id
    }

    fn link(source: &str, target: &str) -> Link {
        Link {
            source_id: source.to_string(),
            target_id: target.to_string(),
            link_type: LinkType::Internal,
            label: None,
        }
    }

    #[test]
    fn resolves_both_directions() {
        let mut notes = OrderedMap::new();
        let a = add(&mut notes, "A");
        let b = add(&mut notes, "B");
        let c = add(&mut notes, "C");
        let links = vec![link(&a, &b), link(&c, &b), link(&a, &c)];

        let forward: Vec<&str> = linked_notes(&notes, &links, &a)
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(forward, vec!["B", "C"]);

        let back: Vec<&str> = backlinks(&notes, &links, &b)
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(back, vec!["A", "C"]);
    }

    #[test]
    fn duplicate_links_yield_duplicate_entries() {
        let mut notes = OrderedMap::new();
        let a = add(&mut notes, "A");
        let b = add(&mut notes, "B");
        let links = vec![link(&a, &b), link(&a, &b)];

        assert_eq!(linked_notes(&notes, &links, &a).len(), 2);
    }

    #[test]
    fn dangling_endpoints_are_skipped() {
        let mut notes = OrderedMap::new();
        let a = add(&mut notes, "A");
        let links = vec![link(&a, "missing"), link("gone", &a)];

        assert!(linked_notes(&notes, &links, &a).is_empty());
        assert!(backlinks(&notes, &links, &a).is_empty());
    }
}
