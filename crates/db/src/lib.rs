use std::{path::PathBuf, sync::Arc};

use api_types::{Invitation, Person, Project, ProjectMember, User};

pub mod models;
pub mod seed;
pub mod store;

pub use store::{Collection, CollectionStore, CollectionWrite, JsonFileStore, MemoryStore, StoreError};

use crate::models::sequences::Sequence;

/// Handle on every collection the application persists. Cheap to clone; all
/// clones share the same per-collection writer locks.
#[derive(Clone)]
pub struct DBService {
    pub users: Collection<User>,
    pub people: Collection<Person>,
    pub projects: Collection<Project>,
    pub project_members: Collection<ProjectMember>,
    pub invitations: Collection<Invitation>,
    pub(crate) sequences: Collection<Sequence>,
}

impl DBService {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self {
            users: Collection::new("users", Arc::clone(&store)),
            people: Collection::new("people", Arc::clone(&store)),
            projects: Collection::new("projects", Arc::clone(&store)),
            project_members: Collection::new("project-users", Arc::clone(&store)),
            invitations: Collection::new("invitations", Arc::clone(&store)),
            sequences: Collection::new("sequences", store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = JsonFileStore::open(data_dir).await?;
        tracing::info!(data_dir = %store.dir().display(), "opened JSON collection store");
        Ok(Self::new(Arc::new(store)))
    }
}
