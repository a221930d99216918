use api_types::{DEFAULT_PERSON_ROLE, NewPerson, Person, UpdatePersonRequest};

use super::{identity_errors::IdentityError, sequences::SequenceRepository};
use crate::{DBService, StoreError};

pub struct PersonRepository;

impl PersonRepository {
    pub async fn list(db: &DBService) -> Result<Vec<Person>, StoreError> {
        db.people.read().await
    }

    pub async fn find_by_id(db: &DBService, id: u32) -> Result<Option<Person>, StoreError> {
        Ok(db.people.read().await?.into_iter().find(|p| p.id == id))
    }

    /// Case-insensitive exact match; `Ok(None)` when nobody has the address.
    pub async fn find_by_email(db: &DBService, email: &str) -> Result<Option<Person>, StoreError> {
        let email = email.to_lowercase();
        Ok(db
            .people
            .read()
            .await?
            .into_iter()
            .find(|p| p.email.to_lowercase() == email))
    }

    pub async fn create(db: &DBService, new_person: NewPerson) -> Result<Person, IdentityError> {
        let mut people = db.people.write().await?;
        let email = new_person.email.to_lowercase();
        if people.iter().any(|p| p.email.to_lowercase() == email) {
            return Err(IdentityError::EmailTaken(new_person.email));
        }

        let highest = people.iter().map(|p| p.id).max();
        let id = SequenceRepository::next_id(db, db.people.name(), highest).await?;

        let person = Person {
            id,
            name: new_person.name,
            email: new_person.email,
            first_name: new_person.first_name,
            last_name: new_person.last_name,
            company: new_person.company,
            phone: new_person.phone,
            projects_count: 0,
            role: new_person
                .role
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PERSON_ROLE.to_string()),
            status: new_person.status.unwrap_or_default(),
            password: new_person.password,
            created_at: new_person.created_at,
        };
        people.push(person.clone());
        people.commit().await?;

        tracing::info!(person_id = person.id, "created person");
        Ok(person)
    }

    pub async fn update(
        db: &DBService,
        id: u32,
        update: UpdatePersonRequest,
    ) -> Result<Person, IdentityError> {
        let mut people = db.people.write().await?;

        if let Some(ref email) = update.email {
            let email = email.to_lowercase();
            if people
                .iter()
                .any(|p| p.id != id && p.email.to_lowercase() == email)
            {
                return Err(IdentityError::EmailTaken(email));
            }
        }

        let person = people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(IdentityError::NotFound)?;

        if let Some(name) = update.name {
            person.name = name;
        }
        if let Some(email) = update.email {
            person.email = email;
        }
        if let Some(company) = update.company {
            person.company = Some(company);
        }
        if let Some(phone) = update.phone {
            person.phone = Some(phone);
        }
        if let Some(role) = update.role {
            person.role = role;
        }
        if let Some(status) = update.status {
            person.status = status;
        }
        let updated = person.clone();

        people.commit().await?;
        Ok(updated)
    }

    /// Returns the person as it was before the change together with the updated record.
    pub async fn update_role(
        db: &DBService,
        id: u32,
        role: String,
    ) -> Result<(Person, Person), IdentityError> {
        let mut people = db.people.write().await?;
        let person = people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(IdentityError::NotFound)?;

        let before = person.clone();
        person.role = role;
        let updated = person.clone();

        people.commit().await?;
        Ok((before, updated))
    }

    pub async fn delete(db: &DBService, id: u32) -> Result<bool, StoreError> {
        let mut people = db.people.write().await?;
        let before = people.len();
        people.retain(|p| p.id != id);
        if people.len() == before {
            return Ok(false);
        }
        people.commit().await?;
        Ok(true)
    }
}
