use shared::{
    domain::{default_departments, DepartmentFilter, Person, ANY_DEPARTMENT},
    error::{ApiError, ErrorCode},
    protocol::{MatchResponse, RegisterRequest, RegisterResponse},
};
use storage::SharedStore;
use tracing::{error, info};

pub mod matching;

use matching::{select_match, MatchOutcome};

#[derive(Clone)]
pub struct ApiContext {
    pub store: SharedStore,
    /// Departments accepted at registration time.
    pub departments: Vec<String>,
}

impl ApiContext {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            departments: default_departments(),
        }
    }

    pub fn with_departments(mut self, departments: Vec<String>) -> Self {
        self.departments = departments;
        self
    }
}

pub fn list_departments(ctx: &ApiContext) -> Vec<String> {
    ctx.departments.clone()
}

pub async fn register(
    ctx: &ApiContext,
    req: RegisterRequest,
) -> Result<RegisterResponse, ApiError> {
    ensure_key_present(&req.name, &req.surname)?;
    let department = req
        .department
        .as_deref()
        .filter(|department| !department.trim().is_empty());
    if let Some(department) = department {
        ensure_known_department(ctx, department)?;
    }

    let inserted = ctx
        .store
        .add(&req.name, &req.surname, department)
        .await
        .map_err(internal)?;
    if !inserted {
        return Err(ApiError::new(
            ErrorCode::Conflict,
            "name already exists in the database",
        ));
    }

    let person = Person::new(
        req.name.as_str(),
        req.surname.as_str(),
        department.map(str::to_string),
    );
    info!(person = %person, "registered");
    Ok(RegisterResponse {
        display_name: person.display_name(),
        person,
    })
}

pub async fn unregister(ctx: &ApiContext, name: &str, surname: &str) -> Result<(), ApiError> {
    ensure_key_present(name, surname)?;
    let removed = ctx.store.delete(name, surname).await.map_err(internal)?;
    if !removed {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            "name not found in the database",
        ));
    }
    info!(name, surname, "unregistered");
    Ok(())
}

pub async fn is_registered(ctx: &ApiContext, name: &str, surname: &str) -> Result<bool, ApiError> {
    ensure_key_present(name, surname)?;
    ctx.store.exists(name, surname).await.map_err(internal)
}

pub async fn list_registrants(
    ctx: &ApiContext,
    filter: &DepartmentFilter,
) -> Result<Vec<String>, ApiError> {
    ctx.store.list(filter).await.map_err(internal)
}

pub async fn find_match(
    ctx: &ApiContext,
    filter: &DepartmentFilter,
) -> Result<MatchResponse, ApiError> {
    let candidates = list_registrants(ctx, filter).await?;
    let outcome = select_match(&candidates);
    if outcome == MatchOutcome::InsufficientCandidates {
        info!(
            department = %filter,
            candidates = candidates.len(),
            "not enough people for a match"
        );
    }

    Ok(MatchResponse {
        department: match filter {
            DepartmentFilter::Any => ANY_DEPARTMENT.to_string(),
            DepartmentFilter::Only(department) => department.clone(),
        },
        candidates: candidates.len(),
        matched: outcome.into_match(),
    })
}

fn ensure_key_present(name: &str, surname: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || surname.trim().is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "name and surname are required",
        ));
    }
    Ok(())
}

fn ensure_known_department(ctx: &ApiContext, department: &str) -> Result<(), ApiError> {
    if ctx.departments.iter().any(|known| known == department) {
        return Ok(());
    }
    Err(ApiError::new(
        ErrorCode::Validation,
        format!("unknown department '{department}'"),
    ))
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "store operation failed");
    ApiError::new(ErrorCode::Internal, err.to_string())
}
