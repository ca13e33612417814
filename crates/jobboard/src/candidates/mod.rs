//! Candidate-facing flows: job applications and the résumé builder.

pub mod application;
pub mod resume;
pub mod router;


pub use application::{
    ApplicationDesk, ApplicationError, ApplicationForm, ApplicationId, ApplicationInbox,
    ApplicationRecord, ApplicationStep, InboxError, ResumeAttachment,
};
pub use resume::{
    ExportError, ExportedResume, PlainTextExporter, ResumeDocument, ResumeDraft, ResumeExporter,
    ResumeLayout, ResumeLine,
};
pub use router::{candidates_router, CandidatesState};
