use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{JobPostingId, NewPosting};
use super::store::{ListingStore, StoreError};
use crate::forms::{FieldErrors, StepForm};

/// Steps of the posting wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStep {
    JobDetails,
    RequirementsAndSalary,
    DescriptionAndLocation,
}

impl PostingStep {
    pub const ALL: [PostingStep; 3] = [
        PostingStep::JobDetails,
        PostingStep::RequirementsAndSalary,
        PostingStep::DescriptionAndLocation,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            PostingStep::JobDetails => "Job Details",
            PostingStep::RequirementsAndSalary => "Requirements & Salary",
            PostingStep::DescriptionAndLocation => "Description & Location",
        }
    }

    /// Look up a 1-based wizard position.
    pub fn at(position: usize) -> Option<Self> {
        position
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

/// Employer-entered posting, before it reaches the listing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingDraft {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub experience_required: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default = "default_onsite")]
    pub is_onsite: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

fn default_onsite() -> bool {
    true
}

impl Default for PostingDraft {
    fn default() -> Self {
        Self {
            job_title: String::new(),
            company_name: String::new(),
            experience_required: String::new(),
            salary: String::new(),
            is_onsite: true,
            description: String::new(),
            location: String::new(),
        }
    }
}

impl PostingDraft {
    pub fn validate_step(&self, step: PostingStep) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        match step {
            PostingStep::JobDetails => {
                errors.require("job_title", &self.job_title);
                errors.require("company_name", &self.company_name);
            }
            PostingStep::RequirementsAndSalary => {
                errors.require("experience_required", &self.experience_required);
                errors.require("salary", &self.salary);
            }
            PostingStep::DescriptionAndLocation => {
                errors.require("description", &self.description);
                errors.require("location", &self.location);
            }
        }
        errors.into_result()
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for step in PostingStep::ALL {
            if let Err(step_errors) = self.validate_step(step) {
                errors.merge(step_errors);
            }
        }
        errors.into_result()
    }

    pub fn into_new_posting(self) -> NewPosting {
        NewPosting {
            title: self.job_title,
            company: self.company_name,
            location: self.location,
            experience: self.experience_required,
            description: self.description,
            salary: self.salary,
            is_remote: !self.is_onsite,
        }
    }
}

impl StepForm for PostingDraft {
    type Step = PostingStep;

    fn steps() -> &'static [PostingStep] {
        &PostingStep::ALL
    }

    fn validate_step(&self, step: PostingStep) -> Result<(), FieldErrors> {
        PostingDraft::validate_step(self, step)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("posting draft is incomplete: {0}")]
    Invalid(#[from] FieldErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validate every step and hand the posting to the store, which files it as pending.
pub async fn submit_posting<S>(store: &S, draft: PostingDraft) -> Result<JobPostingId, IntakeError>
where
    S: ListingStore + ?Sized,
{
    draft.validate()?;
    let id = store.create(draft.into_new_posting()).await?;
    info!(posting_id = %id, "job posting submitted for review");
    Ok(id)
}
