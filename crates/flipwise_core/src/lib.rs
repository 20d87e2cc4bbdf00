pub mod domain;
pub mod ports;
pub mod reconcile;

pub use domain::{
    AuthSession, AuthUser, Flashcard, FlashcardInput, FlashcardUpdate, NewFlashcard, Profile,
    StudySession, StudySet, StudySetDraft,
};
pub use ports::{AuthService, DatabaseService, PortError, PortResult, Table};
pub use reconcile::{reconcile_flashcards, ReconcilePlan, ReconcileSummary};
