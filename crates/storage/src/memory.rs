use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{DepartmentFilter, Person};
use tokio::sync::Mutex;

use crate::RegistrationStore;

/// In-process store; contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    people: Mutex<Vec<Person>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.people.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.people.lock().await.is_empty()
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn exists(&self, name: &str, surname: &str) -> Result<bool> {
        let people = self.people.lock().await;
        Ok(people.iter().any(|person| person.has_key(name, surname)))
    }

    async fn add(&self, name: &str, surname: &str, department: Option<&str>) -> Result<bool> {
        let mut people = self.people.lock().await;
        if people.iter().any(|person| person.has_key(name, surname)) {
            return Ok(false);
        }
        people.push(Person::new(name, surname, department.map(str::to_string)));
        Ok(true)
    }

    async fn delete(&self, name: &str, surname: &str) -> Result<bool> {
        let mut people = self.people.lock().await;
        let Some(index) = people
            .iter()
            .position(|person| person.has_key(name, surname))
        else {
            return Ok(false);
        };
        people.remove(index);
        Ok(true)
    }

    async fn list_people(&self, filter: &DepartmentFilter) -> Result<Vec<Person>> {
        let people = self.people.lock().await;
        Ok(people
            .iter()
            .filter(|person| filter.matches(person.department.as_deref()))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
