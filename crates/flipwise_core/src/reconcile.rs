//! crates/flipwise_core/src/reconcile.rs
//!
//! Reconciles a submitted list of flashcards against the cards already stored
//! for a study set. Planning is pure; `reconcile_flashcards` fetches the
//! current ids and applies the plan through a `DatabaseService`.
//!
//! The delete, update and insert phases are separate calls. A failure part way
//! through leaves the earlier phases applied.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::domain::{FlashcardInput, FlashcardUpdate, NewFlashcard};
use crate::ports::{DatabaseService, PortResult};

/// The writes needed to make the stored cards match a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub delete_ids: Vec<String>,
    pub updates: Vec<FlashcardUpdate>,
    pub inserts: Vec<NewFlashcard>,
}

/// Counts of what an applied plan touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub deleted: usize,
    pub updated: usize,
    pub inserted: usize,
}

/// Splits `submitted` into updates of existing cards and inserts of new ones,
/// and collects every existing id that was not kept for deletion.
///
/// A card whose id is missing, unknown, or already claimed by an earlier card
/// in the submission is treated as new.
pub fn plan(existing_ids: &[String], submitted: Vec<FlashcardInput>) -> ReconcilePlan {
    let existing: HashSet<&str> = existing_ids.iter().map(String::as_str).collect();
    let mut kept: HashSet<String> = HashSet::new();
    let mut updates = Vec::new();
    let mut inserts = Vec::new();

    for card in submitted {
        match card.id {
            Some(id) if existing.contains(id.as_str()) && !kept.contains(&id) => {
                kept.insert(id.clone());
                updates.push(FlashcardUpdate {
                    id,
                    front_text: card.front_text,
                    back_text: card.back_text,
                });
            }
            _ => inserts.push(NewFlashcard {
                front_text: card.front_text,
                back_text: card.back_text,
            }),
        }
    }

    let delete_ids = existing_ids
        .iter()
        .filter(|id| !kept.contains(id.as_str()))
        .cloned()
        .collect();

    ReconcilePlan {
        delete_ids,
        updates,
        inserts,
    }
}

/// Makes the flashcards stored for `set_id` match `submitted`.
///
/// Runs delete, then update, then insert. Phases with nothing to do issue no calls.
pub async fn reconcile_flashcards(
    db: &dyn DatabaseService,
    set_id: &str,
    submitted: Vec<FlashcardInput>,
    now: DateTime<Utc>,
) -> PortResult<ReconcileSummary> {
    let existing_ids = db.list_flashcard_ids(set_id).await?;
    let plan = plan(&existing_ids, submitted);
    debug!(
        set_id,
        deletes = plan.delete_ids.len(),
        updates = plan.updates.len(),
        inserts = plan.inserts.len(),
        "Planned flashcard reconciliation"
    );

    if !plan.delete_ids.is_empty() {
        db.delete_flashcards(&plan.delete_ids).await?;
    }
    for update in &plan.updates {
        db.update_flashcard(update, now).await?;
    }
    if !plan.inserts.is_empty() {
        db.insert_flashcards(set_id, &plan.inserts).await?;
    }

    Ok(ReconcileSummary {
        deleted: plan.delete_ids.len(),
        updated: plan.updates.len(),
        inserted: plan.inserts.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: Option<&str>, front: &str, back: &str) -> FlashcardInput {
        FlashcardInput {
            id: id.map(str::to_string),
            front_text: front.to_string(),
            back_text: back.to_string(),
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn known_ids_update_and_missing_ids_insert() {
        let plan = plan(
            &ids(&["a", "b"]),
            vec![card(Some("a"), "A", "1"), card(None, "C", "3")],
        );

        assert_eq!(
            plan.updates,
            vec![FlashcardUpdate {
                id: "a".into(),
                front_text: "A".into(),
                back_text: "1".into()
            }]
        );
        assert_eq!(
            plan.inserts,
            vec![NewFlashcard {
                front_text: "C".into(),
                back_text: "3".into()
            }]
        );
        assert_eq!(plan.delete_ids, ids(&["b"]));
    }

    #[test]
    fn unknown_id_is_inserted_not_rejected() {
        let plan = plan(&ids(&["a"]), vec![card(Some("zzz"), "Q", "A")]);

        assert!(plan.updates.is_empty());
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.delete_ids, ids(&["a"]));
    }

    #[test]
    fn empty_submission_deletes_everything() {
        let plan = plan(&ids(&["a", "b", "c"]), Vec::new());

        assert_eq!(plan.delete_ids, ids(&["a", "b", "c"]));
        assert!(plan.updates.is_empty());
        assert!(plan.inserts.is_empty());
    }

    #[test]
    fn nothing_stored_inserts_everything() {
        let plan = plan(&[], vec![card(None, "1", "1"), card(Some("x"), "2", "2")]);

        assert!(plan.delete_ids.is_empty());
        assert_eq!(plan.inserts.len(), 2);
    }

    #[test]
    fn repeated_id_updates_once_and_inserts_the_rest() {
        let plan = plan(
            &ids(&["a"]),
            vec![card(Some("a"), "first", "1"), card(Some("a"), "second", "2")],
        );

        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].front_text, "first");
        assert_eq!(plan.inserts[0].front_text, "second");
        assert!(plan.delete_ids.is_empty());
    }

    #[test]
    fn kept_and_deleted_ids_partition_existing() {
        let existing = ids(&["a", "b", "c", "d"]);
        let plan = plan(
            &existing,
            vec![card(Some("d"), "", ""), card(Some("b"), "", "")],
        );

        let mut all: Vec<&str> = plan
            .updates
            .iter()
            .map(|u| u.id.as_str())
            .chain(plan.delete_ids.iter().map(String::as_str))
            .collect();
        all.sort_unstable();
        assert_eq!(all, vec!["a", "b", "c", "d"]);
        assert_eq!(plan.delete_ids, ids(&["a", "c"]));
    }

    #[test]
    fn resubmitting_stored_cards_is_a_pure_update() {
        let plan = plan(
            &ids(&["a", "b"]),
            vec![card(Some("a"), "A", "1"), card(Some("b"), "B", "2")],
        );

        assert!(plan.delete_ids.is_empty());
        assert!(plan.inserts.is_empty());
        assert_eq!(plan.updates.len(), 2);
    }
}
