use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::forms::{is_ten_digit_phone, looks_like_email, FieldErrors, StepForm};
use crate::listings::{JobPosting, JobPostingId, ListingStore, PostingStatus, StoreError};
use crate::session::UserId;

pub const INVALID_EMAIL: &str = "Invalid email address";
pub const INVALID_PHONE: &str = "Invalid phone number";
pub const MISSING_RESUME: &str = "Please upload your resume";
pub const UNSUPPORTED_RESUME: &str = "Resume must be a PDF or Word document";

const RESUME_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStep {
    PersonalInformation,
    ProfessionalDetails,
    FinalTouches,
}

impl ApplicationStep {
    pub const ALL: [ApplicationStep; 3] = [
        ApplicationStep::PersonalInformation,
        ApplicationStep::ProfessionalDetails,
        ApplicationStep::FinalTouches,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            ApplicationStep::PersonalInformation => "Personal Information",
            ApplicationStep::ProfessionalDetails => "Professional Details",
            ApplicationStep::FinalTouches => "Final Touches",
        }
    }
}

/// Metadata for an uploaded résumé file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeAttachment {
    pub file_name: String,
    #[serde(default)]
    pub size_bytes: u64,
}

impl ResumeAttachment {
    pub fn is_supported(&self) -> bool {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                RESUME_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            })
            .unwrap_or(false)
    }

    pub fn content_type(&self) -> mime::Mime {
        mime_guess::from_path(&self.file_name).first_or_octet_stream()
    }
}

/// Candidate application, filled in over three wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationForm {
    #[serde(default)]
    pub posting_id: Option<JobPostingId>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub resume: Option<ResumeAttachment>,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub cover_letter: String,
}

impl ApplicationForm {
    pub fn validate_step(&self, step: ApplicationStep) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        match step {
            ApplicationStep::PersonalInformation => {
                errors.require("first_name", &self.first_name);
                errors.require("last_name", &self.last_name);
                if !looks_like_email(&self.email) {
                    errors.insert("email", INVALID_EMAIL);
                }
                if !is_ten_digit_phone(&self.phone) {
                    errors.insert("phone", INVALID_PHONE);
                }
            }
            ApplicationStep::ProfessionalDetails => {
                match &self.resume {
                    None => errors.insert("resume", MISSING_RESUME),
                    Some(attachment) if !attachment.is_supported() => {
                        errors.insert("resume", UNSUPPORTED_RESUME)
                    }
                    Some(_) => {}
                }
                errors.require("experience", &self.experience);
            }
            ApplicationStep::FinalTouches => {
                errors.require("cover_letter", &self.cover_letter);
            }
        }
        errors.into_result()
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for step in ApplicationStep::ALL {
            if let Err(step_errors) = self.validate_step(step) {
                errors.merge(step_errors);
            }
        }
        errors.into_result()
    }
}

impl StepForm for ApplicationForm {
    type Step = ApplicationStep;

    fn steps() -> &'static [ApplicationStep] {
        &ApplicationStep::ALL
    }

    fn validate_step(&self, step: ApplicationStep) -> Result<(), FieldErrors> {
        ApplicationForm::validate_step(self, step)
    }
}

/// Stored application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub applicant: UserId,
    pub form: ApplicationForm,
    pub submitted_at: DateTime<Utc>,
}

/// Where submitted applications are filed.
#[async_trait]
pub trait ApplicationInbox: Send + Sync {
    async fn submit(&self, record: ApplicationRecord) -> Result<ApplicationId, InboxError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum InboxError {
    #[error("application inbox unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("application is incomplete: {0}")]
    Invalid(#[from] FieldErrors),
    #[error("posting {0} is not open for applications")]
    PostingClosed(JobPostingId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Inbox(#[from] InboxError),
}

/// Validates applications and files them with the inbox.
pub struct ApplicationDesk<S: ?Sized, I: ?Sized> {
    store: Arc<S>,
    inbox: Arc<I>,
}

impl<S, I> ApplicationDesk<S, I>
where
    S: ListingStore + ?Sized,
    I: ApplicationInbox + ?Sized,
{
    pub fn new(store: Arc<S>, inbox: Arc<I>) -> Self {
        Self { store, inbox }
    }

    pub async fn submit(
        &self,
        applicant: &UserId,
        form: ApplicationForm,
    ) -> Result<ApplicationRecord, ApplicationError> {
        form.validate()?;
        if let Some(posting_id) = &form.posting_id {
            self.ensure_open(posting_id).await?;
        }

        let record = ApplicationRecord {
            id: ApplicationId::generate(),
            applicant: applicant.clone(),
            form,
            submitted_at: Utc::now(),
        };
        let id = self.inbox.submit(record.clone()).await?;
        info!(application_id = %id, applicant = %applicant, "application submitted");
        Ok(ApplicationRecord { id, ..record })
    }

    async fn ensure_open(&self, posting_id: &JobPostingId) -> Result<(), ApplicationError> {
        let catalog = self.store.fetch_catalog().await?;
        let open = catalog
            .iter()
            .flatten()
            .any(|posting: &JobPosting| {
                &posting.id == posting_id && posting.status == PostingStatus::Approved
            });
        if open {
            Ok(())
        } else {
            Err(ApplicationError::PostingClosed(posting_id.clone()))
        }
    }
}
