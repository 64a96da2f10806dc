//! Application records and the status state machine.
//!
//! `ApplicationStatus::advanced` is the guarded forward table used by the
//! primary "next status" action. Direct status overwrites go through
//! `set_status` on the lifecycle manager and are intentionally unrestricted —
//! the asymmetry is part of the product behavior, not an accident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Canonical status vocabulary. Legacy labels from older clients are accepted
/// as input aliases (`pending` → `draft`, `interviewing` → `interview`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[serde(alias = "pending")]
    Draft,
    Applied,
    #[serde(alias = "interviewing")]
    Interview,
    Accepted,
    Rejected,
    /// Quick-added from another identity's public application.
    Copied,
}

impl ApplicationStatus {
    /// The forward table for the guarded advance action.
    ///
    /// `Accepted` is a fixed point here, and ONLY here: `set_status` can still
    /// move an accepted record anywhere.
    pub fn advanced(self) -> ApplicationStatus {
        match self {
            ApplicationStatus::Draft => ApplicationStatus::Applied,
            ApplicationStatus::Applied => ApplicationStatus::Interview,
            ApplicationStatus::Interview => ApplicationStatus::Accepted,
            ApplicationStatus::Accepted => ApplicationStatus::Accepted,
            ApplicationStatus::Rejected => ApplicationStatus::Applied,
            ApplicationStatus::Copied => ApplicationStatus::Applied,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Copied => "copied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Phone,
    Video,
    Onsite,
    Technical,
    Behavioral,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

/// A tracked job application, owned by exactly one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub company: String,
    pub position: String,
    pub job_description: Option<String>,
    pub cv_content: Option<String>,
    /// Opaque structured CV payload; the manager never inspects it.
    #[serde(default)]
    pub cv_data: Value,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub allow_comments: bool,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_type: Option<InterviewType>,
    pub interview_status: Option<InterviewStatus>,
    pub interview_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Creation payload. `title`, `company` and `position` must be non-empty;
/// the manager enforces this before touching any store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationDraft {
    pub title: String,
    pub company: String,
    pub position: String,
    pub job_description: Option<String>,
    pub cv_content: Option<String>,
    pub cv_data: Option<Value>,
    pub is_public: Option<bool>,
    pub allow_comments: Option<bool>,
}

impl ApplicationDraft {
    /// Returns the first missing identifying field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            Some("title")
        } else if self.company.trim().is_empty() {
            Some("company")
        } else if self.position.trim().is_empty() {
            Some("position")
        } else {
            None
        }
    }
}

/// Partial field update. `id`, `owner_id`, `created_at` and `status` are
/// deliberately absent: identity fields are immutable and status changes go
/// through `advance`/`set_status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub job_description: Option<String>,
    pub cv_content: Option<String>,
    pub cv_data: Option<Value>,
    pub is_public: Option<bool>,
    pub allow_comments: Option<bool>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_type: Option<InterviewType>,
    pub interview_status: Option<InterviewStatus>,
    pub interview_notes: Option<String>,
}

impl Application {
    /// Builds a fresh record from a creation payload. Status starts at
    /// `Draft`; both timestamps are set to now.
    pub fn from_draft(owner_id: Uuid, draft: ApplicationDraft) -> Application {
        let now = Utc::now();
        Application {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            company: draft.company,
            position: draft.position,
            job_description: draft.job_description,
            cv_content: draft.cv_content,
            cv_data: draft.cv_data.unwrap_or(Value::Null),
            status: ApplicationStatus::Draft,
            is_public: draft.is_public.unwrap_or(false),
            allow_comments: draft.allow_comments.unwrap_or(true),
            interview_date: None,
            interview_type: None,
            interview_status: None,
            interview_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges a partial patch into the record and refreshes `updated_at`.
    pub fn apply_patch(&mut self, patch: ApplicationPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(company) = patch.company {
            self.company = company;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(job_description) = patch.job_description {
            self.job_description = Some(job_description);
        }
        if let Some(cv_content) = patch.cv_content {
            self.cv_content = Some(cv_content);
        }
        if let Some(cv_data) = patch.cv_data {
            self.cv_data = cv_data;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(allow_comments) = patch.allow_comments {
            self.allow_comments = allow_comments;
        }
        if let Some(interview_date) = patch.interview_date {
            self.interview_date = Some(interview_date);
        }
        if let Some(interview_type) = patch.interview_type {
            self.interview_type = Some(interview_type);
        }
        if let Some(interview_status) = patch.interview_status {
            self.interview_status = Some(interview_status);
        }
        if let Some(interview_notes) = patch.interview_notes {
            self.interview_notes = Some(interview_notes);
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_table_forward_path() {
        assert_eq!(
            ApplicationStatus::Draft.advanced(),
            ApplicationStatus::Applied
        );
        assert_eq!(
            ApplicationStatus::Applied.advanced(),
            ApplicationStatus::Interview
        );
        assert_eq!(
            ApplicationStatus::Interview.advanced(),
            ApplicationStatus::Accepted
        );
    }

    #[test]
    fn test_accepted_is_fixed_point_for_advance() {
        assert_eq!(
            ApplicationStatus::Accepted.advanced(),
            ApplicationStatus::Accepted
        );
    }

    #[test]
    fn test_rejected_advances_to_reapply() {
        assert_eq!(
            ApplicationStatus::Rejected.advanced(),
            ApplicationStatus::Applied
        );
    }

    #[test]
    fn test_copied_advances_to_applied() {
        assert_eq!(
            ApplicationStatus::Copied.advanced(),
            ApplicationStatus::Applied
        );
    }

    #[test]
    fn test_legacy_labels_parse_as_aliases() {
        let status: ApplicationStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, ApplicationStatus::Draft);
        let status: ApplicationStatus = serde_json::from_str("\"interviewing\"").unwrap();
        assert_eq!(status, ApplicationStatus::Interview);
    }

    #[test]
    fn test_status_serializes_canonical_labels_only() {
        let json = serde_json::to_string(&ApplicationStatus::Interview).unwrap();
        assert_eq!(json, "\"interview\"");
    }

    #[test]
    fn test_draft_requires_identifying_fields() {
        let draft = ApplicationDraft {
            title: "FE Dev at Acme".to_string(),
            company: "  ".to_string(),
            position: "Frontend Developer".to_string(),
            ..Default::default()
        };
        assert_eq!(draft.missing_field(), Some("company"));
    }

    #[test]
    fn test_from_draft_starts_in_draft_with_defaults() {
        let draft = ApplicationDraft {
            title: "FE Dev at Acme".to_string(),
            company: "Acme".to_string(),
            position: "Frontend Developer".to_string(),
            ..Default::default()
        };
        let app = Application::from_draft(Uuid::new_v4(), draft);
        assert_eq!(app.status, ApplicationStatus::Draft);
        assert!(!app.is_public);
        assert!(app.allow_comments);
        assert_eq!(app.created_at, app.updated_at);
    }

    #[test]
    fn test_patch_merges_and_bumps_updated_at() {
        let draft = ApplicationDraft {
            title: "FE Dev at Acme".to_string(),
            company: "Acme".to_string(),
            position: "Frontend Developer".to_string(),
            ..Default::default()
        };
        let mut app = Application::from_draft(Uuid::new_v4(), draft);
        let created_at = app.created_at;
        let before = app.updated_at;

        app.apply_patch(ApplicationPatch {
            company: Some("Acme Corp".to_string()),
            interview_notes: Some("bring portfolio".to_string()),
            ..Default::default()
        });

        assert_eq!(app.company, "Acme Corp");
        assert_eq!(app.title, "FE Dev at Acme");
        assert_eq!(app.interview_notes.as_deref(), Some("bring portfolio"));
        assert_eq!(app.created_at, created_at);
        assert!(app.updated_at >= before);
    }
}
