pub mod course;
pub mod entity;
pub mod hole;
pub mod hole_score;
pub mod key;
pub mod layout;
pub mod player;
pub mod round;
pub mod score_card;

pub use course::Course;
pub use entity::{Entity, EntityKind, UNSAVED_ID};
pub use hole::Hole;
pub use hole_score::HoleScore;
pub use key::Key;
pub use layout::Layout;
pub use player::Player;
pub use round::Round;
pub use score_card::ScoreCard;

use crate::errors::{FrolfError, Result};

/// Reject empty or whitespace-only names
pub(crate) fn require_name(kind: EntityKind, name: String) -> Result<String> {
    if name.trim().is_empty() {
        return Err(FrolfError::InvalidName {
            kind,
            reason: "Name cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(name)
}

/// Append keys, skipping ones already present
pub(crate) fn push_unique<T>(keys: &mut Vec<Key<T>>, key: Key<T>) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}
