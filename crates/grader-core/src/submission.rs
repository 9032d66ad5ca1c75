//! End-to-end grading of a student submission.
//!
//! Loads the model's catalogue (seeding the rule store if needed), evaluates
//! the text, then records the essay and a new version. Nothing is written
//! when the model is missing or the text is blank, and an essay created for
//! a submission whose version could not be stored is removed again.

use grader_state::{
    ContentDigest, EssayId, EssayRecord, EssayStore, EssayVersion, ModelId, ModelStore, RuleStore,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::catalogue::load_catalogue_for_model;
use crate::domain::{FeedbackReport, GraderError, Result};
use crate::evaluator::{evaluate, evaluate_scored};

/// What to grade and where to file it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub student: String,
    pub title: String,
    pub model_id: ModelId,
    pub text: String,
    /// Force a scored report even though stored catalogues are comment-only.
    #[serde(default)]
    pub scored: bool,
}

/// The filed version and its feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub essay_id: EssayId,
    pub version: u32,
    pub text_digest: ContentDigest,
    pub report: FeedbackReport,
}

/// Grade `request` against the stored catalogue for its model and persist
/// a new essay version.
#[instrument(skip(store, request), fields(student = %request.student, title = %request.title, model = %request.model_id))]
pub async fn grade_submission<S>(store: &S, request: SubmissionRequest) -> Result<SubmissionResult>
where
    S: RuleStore + ModelStore + EssayStore,
{
    if request.text.trim().is_empty() {
        return Err(GraderError::EmptySubmission);
    }

    let catalogue = load_catalogue_for_model(store, store, request.model_id).await?;
    let report = if request.scored {
        evaluate_scored(&request.text, &catalogue).into()
    } else {
        evaluate(&request.text, &catalogue)
    };

    let (essay, version) = record_version(store, &request).await?;

    info!(
        essay = %essay.id,
        version = version.version,
        digest = version.text_digest.short(),
        "submission graded"
    );

    Ok(SubmissionResult {
        essay_id: essay.id,
        version: version.version,
        text_digest: version.text_digest,
        report,
    })
}

/// Find or create the essay and append the submitted text as a new version.
async fn record_version(
    essays: &dyn EssayStore,
    request: &SubmissionRequest,
) -> Result<(EssayRecord, EssayVersion)> {
    let existing = essays
        .find_essay(&request.student, request.model_id, &request.title)
        .await?;
    let created = existing.is_none();
    let essay = match existing {
        Some(essay) => essay,
        None => {
            essays
                .find_or_create_essay(&request.student, request.model_id, &request.title)
                .await?
        }
    };

    match essays.append_version(essay.id, &request.text).await {
        Ok(version) => Ok((essay, version)),
        Err(err) => {
            if created {
                warn!(essay = %essay.id, error = %err, "version not stored, removing new essay");
                if let Err(cleanup) = essays.delete_essay(essay.id).await {
                    warn!(essay = %essay.id, error = %cleanup, "could not remove essay");
                }
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use grader_state::fakes::{MemoryEssayStore, MemoryStore};
    use grader_state::{ParameterBag, StorageError, StorageResult};

    /// Essay store whose `append_version` fails once `fail` is set.
    #[derive(Default)]
    struct FailingAppend {
        inner: MemoryEssayStore,
        fail: std::sync::atomic::AtomicBool,
    }

    impl FailingAppend {
        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl EssayStore for FailingAppend {
        async fn find_essay(
            &self,
            student: &str,
            model_id: ModelId,
            title: &str,
        ) -> StorageResult<Option<EssayRecord>> {
            self.inner.find_essay(student, model_id, title).await
        }

        async fn find_or_create_essay(
            &self,
            student: &str,
            model_id: ModelId,
            title: &str,
        ) -> StorageResult<EssayRecord> {
            self.inner.find_or_create_essay(student, model_id, title).await
        }

        async fn get_essay(&self, id: EssayId) -> StorageResult<EssayRecord> {
            self.inner.get_essay(id).await
        }

        async fn append_version(
            &self,
            essay_id: EssayId,
            text: &str,
        ) -> StorageResult<EssayVersion> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StorageError::Backend("disk full".to_string()));
            }
            self.inner.append_version(essay_id, text).await
        }

        async fn list_versions(&self, essay_id: EssayId) -> StorageResult<Vec<EssayVersion>> {
            self.inner.list_versions(essay_id).await
        }

        async fn delete_essay(&self, id: EssayId) -> StorageResult<()> {
            self.inner.delete_essay(id).await
        }
    }

    fn request(model_id: ModelId, text: &str) -> SubmissionRequest {
        SubmissionRequest {
            student: "ana".to_string(),
            title: "Mobilidade urbana".to_string(),
            model_id,
            text: text.to_string(),
            scored: false,
        }
    }

    #[tokio::test]
    async fn resubmission_creates_next_version() {
        let store = MemoryStore::new();
        let model = store
            .create_model("ENEM", "", ParameterBag::new())
            .await
            .unwrap();

        let first = grade_submission(&store, request(model, "primeira")).await.unwrap();
        let second = grade_submission(&store, request(model, "segunda")).await.unwrap();

        assert_eq!(first.essay_id, second.essay_id);
        assert_eq!((first.version, second.version), (1, 2));
        assert_ne!(first.text_digest, second.text_digest);
        assert!(matches!(first.report, FeedbackReport::CommentOnly(_)));
        assert_eq!(first.report.rule_outcomes().len(), 10);
    }

    #[tokio::test]
    async fn scored_flag_adds_summary() {
        let store = MemoryStore::new();
        let model = store
            .create_model("ENEM", "", ParameterBag::new())
            .await
            .unwrap();
        let mut req = request(model, "texto");
        req.scored = true;

        let result = grade_submission(&store, req).await.unwrap();
        let summary = result.report.summary().unwrap();
        assert_eq!(summary.total_max, 100);
    }

    #[tokio::test]
    async fn missing_model_writes_nothing() {
        let store = MemoryStore::new();
        let err = grade_submission(&store, request(ModelId(3), "texto"))
            .await
            .unwrap_err();
        assert!(matches!(err, GraderError::ModelNotFound(3)));
        assert!(store.fetch_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let store = MemoryStore::new();
        let err = grade_submission(&store, request(ModelId(1), "  \n"))
            .await
            .unwrap_err();
        assert!(matches!(err, GraderError::EmptySubmission));
    }

    #[tokio::test]
    async fn failed_append_removes_new_essay() {
        let essays = FailingAppend::default();
        essays.set_failing(true);

        let err = record_version(&essays, &request(ModelId(1), "texto"))
            .await
            .unwrap_err();

        assert!(matches!(err, GraderError::Storage(StorageError::Backend(_))));
        assert!(essays
            .find_essay("ana", ModelId(1), "Mobilidade urbana")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn failed_append_keeps_existing_essay_and_versions() {
        let essays = FailingAppend::default();
        let (essay, first) = record_version(&essays, &request(ModelId(1), "primeira"))
            .await
            .unwrap();
        assert_eq!(first.version, 1);

        essays.set_failing(true);
        assert!(record_version(&essays, &request(ModelId(1), "segunda"))
            .await
            .is_err());

        let versions = essays.list_versions(essay.id).await.unwrap();
        assert_eq!(versions.len(), 1);

        essays.set_failing(false);
        let (again, second) = record_version(&essays, &request(ModelId(1), "segunda"))
            .await
            .unwrap();
        assert_eq!(again.id, essay.id);
        assert_eq!(second.version, 2);
    }
}
