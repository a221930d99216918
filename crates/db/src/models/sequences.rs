//! High-water marks for integer ids, so deleting the newest record never
//! lets its id be handed out again.

use serde::{Deserialize, Serialize};

use crate::{DBService, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub collection: String,
    pub last_id: u32,
}

pub struct SequenceRepository;

impl SequenceRepository {
    /// Reserves the next id for `collection`: one past the larger of the
    /// highest live id and the highest id ever issued.
    pub async fn next_id(
        db: &DBService,
        collection: &str,
        highest_live_id: Option<u32>,
    ) -> Result<u32, StoreError> {
        let mut sequences = db.sequences.write().await?;
        let issued = sequences
            .iter()
            .find(|s| s.collection == collection)
            .map(|s| s.last_id)
            .unwrap_or(0);
        let next = issued.max(highest_live_id.unwrap_or(0)) + 1;

        match sequences.iter_mut().find(|s| s.collection == collection) {
            Some(sequence) => sequence.last_id = next,
            None => sequences.push(Sequence {
                collection: collection.to_string(),
                last_id: next,
            }),
        }
        sequences.commit().await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_id_is_one() {
        let db = DBService::in_memory();
        assert_eq!(SequenceRepository::next_id(&db, "people", None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ids_follow_live_max_and_never_step_back() {
        let db = DBService::in_memory();
        assert_eq!(SequenceRepository::next_id(&db, "people", Some(5)).await.unwrap(), 6);
        // Record 6 deleted again: the live max falls back to 5.
        assert_eq!(SequenceRepository::next_id(&db, "people", Some(5)).await.unwrap(), 7);
        assert_eq!(SequenceRepository::next_id(&db, "users", Some(3)).await.unwrap(), 4);
    }
}
