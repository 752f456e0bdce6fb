use async_trait::async_trait;
use assess_core::model::{
    ExamDescriptor, ExamId, ExamType, Question, ResultRecord, Role, SessionKind, Student,
    StudentId, VocabularyItem,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Which vocabulary entries a drill may draw from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyFilter {
    /// Learner whose private words are included alongside shared ones.
    pub viewer: Option<StudentId>,
    /// Restrict to one lesson; `None` means every lesson.
    pub lesson: Option<String>,
}

impl VocabularyFilter {
    #[must_use]
    pub fn for_viewer(viewer: Option<StudentId>) -> Self {
        Self {
            viewer,
            lesson: None,
        }
    }

    #[must_use]
    pub fn with_lesson(mut self, lesson: impl Into<String>) -> Self {
        self.lesson = Some(lesson.into());
        self
    }

    #[must_use]
    pub fn matches(&self, item: &VocabularyItem) -> bool {
        item.is_visible_to(self.viewer)
            && self
                .lesson
                .as_deref()
                .is_none_or(|lesson| item.lesson.as_deref() == Some(lesson))
    }
}

/// Which result history to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultScope {
    #[default]
    ExamsOnly,
    DrillsOnly,
    All,
}

impl ResultScope {
    #[must_use]
    pub fn includes_exams(self) -> bool {
        matches!(self, ResultScope::ExamsOnly | ResultScope::All)
    }

    #[must_use]
    pub fn includes_drills(self) -> bool {
        matches!(self, ResultScope::DrillsOnly | ResultScope::All)
    }

    #[must_use]
    pub fn includes(self, kind: SessionKind) -> bool {
        match kind {
            SessionKind::Exam(_) => self.includes_exams(),
            SessionKind::Drill(_) => self.includes_drills(),
        }
    }
}

/// Content catalog: exams and their questions.
#[async_trait]
pub trait ExamCatalog: Send + Sync {
    /// Exams of one type, newest year first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn exams_by_type(&self, exam_type: ExamType) -> Result<Vec<ExamDescriptor>, StorageError>;

    /// Every exam, newest year first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_exams(&self) -> Result<Vec<ExamDescriptor>, StorageError>;

    /// Questions of an exam in ascending order index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn exam_questions(&self, exam_id: ExamId) -> Result<Vec<Question>, StorageError>;
}

/// Content catalog: vocabulary entries.
#[async_trait]
pub trait VocabularyCatalog: Send + Sync {
    /// Entries matching `filter`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn words(&self, filter: &VocabularyFilter) -> Result<Vec<VocabularyItem>, StorageError>;
}

/// Append-only store of finished sessions.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist one result and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn append_result(&self, record: &ResultRecord) -> Result<i64, StorageError>;

    /// Full history in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_results(&self, scope: ResultScope) -> Result<Vec<ResultRecord>, StorageError>;

    /// One learner's history in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn results_for_student(
        &self,
        student: StudentId,
        scope: ResultScope,
    ) -> Result<Vec<ResultRecord>, StorageError>;
}

/// Profiles known to the portal.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Profiles with the given role, in roster order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the roster cannot be read.
    async fn students_with_role(&self, role: Role) -> Result<Vec<Student>, StorageError>;
}

/// Resolves who is taking the session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in learner, or `None` when nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the provider cannot be reached.
    async fn current_student(&self) -> Result<Option<StudentId>, StorageError>;
}

/// Identity provider with a fixed answer, for the CLI and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentity(pub Option<StudentId>);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_student(&self) -> Result<Option<StudentId>, StorageError> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct InMemoryState {
    exams: Vec<ExamDescriptor>,
    questions: HashMap<ExamId, Vec<Question>>,
    words: Vec<VocabularyItem>,
    students: Vec<Student>,
    results: Vec<ResultRecord>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut InMemoryState) -> T,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(f(&mut guard))
    }

    /// Insert or replace an exam and its questions.
    ///
    /// Question ids are scoped to their exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a question id repeats within the
    /// exam (nothing is written), `StorageError::Connection` if the lock is
    /// poisoned.
    pub fn upsert_exam(
        &self,
        exam: ExamDescriptor,
        questions: Vec<Question>,
    ) -> Result<(), StorageError> {
        let mut seen = HashSet::new();
        if !questions.iter().all(|q| seen.insert(q.id())) {
            return Err(StorageError::Conflict);
        }
        self.with_state(|state| {
            state.exams.retain(|e| e.id != exam.id);
            state.questions.insert(exam.id, questions);
            state.exams.push(exam);
        })
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_word(&self, word: VocabularyItem) -> Result<(), StorageError> {
        self.with_state(|state| {
            state.words.retain(|w| w.id != word.id);
            state.words.push(word);
        })
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_student(&self, student: Student) -> Result<(), StorageError> {
        self.with_state(|state| {
            if let Some(existing) = state.students.iter_mut().find(|s| s.id == student.id) {
                *existing = student;
            } else {
                state.students.push(student);
            }
        })
    }

    /// Number of stored results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn result_count(&self) -> Result<usize, StorageError> {
        self.with_state(|state| state.results.len())
    }
}

fn newest_first(mut exams: Vec<ExamDescriptor>) -> Vec<ExamDescriptor> {
    exams.sort_by(|a, b| b.year.cmp(&a.year));
    exams
}

#[async_trait]
impl ExamCatalog for InMemoryRepository {
    async fn exams_by_type(&self, exam_type: ExamType) -> Result<Vec<ExamDescriptor>, StorageError> {
        let exams = self.with_state(|state| {
            state
                .exams
                .iter()
                .filter(|e| e.exam_type == exam_type)
                .cloned()
                .collect()
        })?;
        Ok(newest_first(exams))
    }

    async fn list_exams(&self) -> Result<Vec<ExamDescriptor>, StorageError> {
        let exams = self.with_state(|state| state.exams.clone())?;
        Ok(newest_first(exams))
    }

    async fn exam_questions(&self, exam_id: ExamId) -> Result<Vec<Question>, StorageError> {
        let mut questions =
            self.with_state(|state| state.questions.get(&exam_id).cloned().unwrap_or_default())?;
        questions.sort_by_key(Question::order_index);
        Ok(questions)
    }
}

#[async_trait]
impl VocabularyCatalog for InMemoryRepository {
    async fn words(&self, filter: &VocabularyFilter) -> Result<Vec<VocabularyItem>, StorageError> {
        self.with_state(|state| {
            state
                .words
                .iter()
                .filter(|w| filter.matches(w))
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl ResultStore for InMemoryRepository {
    async fn append_result(&self, record: &ResultRecord) -> Result<i64, StorageError> {
        self.with_state(|state| {
            state.results.push(record.clone());
            i64::try_from(state.results.len()).unwrap_or(i64::MAX)
        })
    }

    async fn list_results(&self, scope: ResultScope) -> Result<Vec<ResultRecord>, StorageError> {
        self.with_state(|state| {
            state
                .results
                .iter()
                .filter(|r| scope.includes(r.kind()))
                .cloned()
                .collect()
        })
    }

    async fn results_for_student(
        &self,
        student: StudentId,
        scope: ResultScope,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        self.with_state(|state| {
            state
                .results
                .iter()
                .filter(|r| r.student_id() == student && scope.includes(r.kind()))
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl RosterRepository for InMemoryRepository {
    async fn students_with_role(&self, role: Role) -> Result<Vec<Student>, StorageError> {
        self.with_state(|state| {
            state
                .students
                .iter()
                .filter(|s| s.role == role)
                .cloned()
                .collect()
        })
    }
}

/// Aggregates the collaborator repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub exams: Arc<dyn ExamCatalog>,
    pub vocabulary: Arc<dyn VocabularyCatalog>,
    pub results: Arc<dyn ResultStore>,
    pub roster: Arc<dyn RosterRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repo(InMemoryRepository::new())
    }

    pub(crate) fn from_repo<R>(repo: R) -> Self
    where
        R: ExamCatalog + VocabularyCatalog + ResultStore + RosterRepository + Clone + 'static,
    {
        Self {
            exams: Arc::new(repo.clone()),
            vocabulary: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            roster: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{
        DrillKind, QuestionId, QuestionKind, ResultDetails, WordId,
    };
    use assess_core::time::fixed_now;

    fn question(id: u64, order: u32) -> Question {
        Question::new(QuestionId::new(id), format!("Q{id}"), None, QuestionKind::FreeText, "", order)
            .unwrap()
    }

    #[tokio::test]
    async fn exams_are_filtered_and_newest_first() {
        let repo = InMemoryRepository::new();
        repo.upsert_exam(ExamDescriptor::new(ExamId::new(1), "URT 2021", ExamType::Urt, 2021), vec![])
            .unwrap();
        repo.upsert_exam(ExamDescriptor::new(ExamId::new(2), "URT 2023", ExamType::Urt, 2023), vec![])
            .unwrap();
        repo.upsert_exam(ExamDescriptor::new(ExamId::new(3), "TOC 2024", ExamType::Toc, 2024), vec![])
            .unwrap();

        let urt = repo.exams_by_type(ExamType::Urt).await.unwrap();
        let years: Vec<_> = urt.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![2023, 2021]);
        assert_eq!(repo.list_exams().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn questions_come_back_in_order_index() {
        let repo = InMemoryRepository::new();
        let exam = ExamDescriptor::new(ExamId::new(1), "URT", ExamType::Urt, 2024);
        repo.upsert_exam(exam, vec![question(1, 2), question(2, 0), question(3, 1)])
            .unwrap();
        let ids: Vec<_> = repo
            .exam_questions(ExamId::new(1))
            .await
            .unwrap()
            .iter()
            .map(|q| q.id().value())
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(repo.exam_questions(ExamId::new(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn question_ids_repeat_across_exams_but_not_within_one() {
        let repo = InMemoryRepository::new();
        let urt = ExamDescriptor::new(ExamId::new(1), "URT", ExamType::Urt, 2024);
        let toc = ExamDescriptor::new(ExamId::new(2), "TOC", ExamType::Toc, 2024);
        repo.upsert_exam(urt.clone(), vec![question(1, 0)]).unwrap();
        repo.upsert_exam(toc, vec![question(1, 0)]).unwrap();
        assert_eq!(repo.exam_questions(ExamId::new(2)).await.unwrap().len(), 1);

        let err = repo
            .upsert_exam(urt, vec![question(5, 0), question(5, 1)])
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        let kept = repo.exam_questions(ExamId::new(1)).await.unwrap();
        assert_eq!(kept[0].id(), QuestionId::new(1));
    }

    #[tokio::test]
    async fn vocabulary_filter_respects_owner_and_lesson() {
        let repo = InMemoryRepository::new();
        let me = StudentId::random();
        repo.upsert_word(VocabularyItem::shared(WordId::new(1), "Haus", "بيت").with_lesson("1"))
            .unwrap();
        repo.upsert_word(VocabularyItem::shared(WordId::new(2), "Tür", "باب").with_lesson("2"))
            .unwrap();
        repo.upsert_word(
            VocabularyItem::shared(WordId::new(3), "Buch", "كتاب")
                .with_lesson("1")
                .owned_by(StudentId::random()),
        )
        .unwrap();

        let all = repo.words(&VocabularyFilter::for_viewer(Some(me))).await.unwrap();
        assert_eq!(all.len(), 2);
        let lesson_one = repo
            .words(&VocabularyFilter::for_viewer(Some(me)).with_lesson("1"))
            .await
            .unwrap();
        assert_eq!(lesson_one.len(), 1);
        assert_eq!(lesson_one[0].term, "Haus");
    }

    #[tokio::test]
    async fn results_are_append_only_and_scoped() {
        let repo = InMemoryRepository::new();
        let student = StudentId::random();
        let drill = ResultRecord::new(
            student,
            SessionKind::Drill(DrillKind::TimedVocabulary),
            3,
            10,
            ResultDetails::Drill(Vec::new()),
            fixed_now(),
        )
        .unwrap();
        let first = repo.append_result(&drill).await.unwrap();
        let second = repo.append_result(&drill).await.unwrap();
        assert!(second > first);

        assert_eq!(repo.list_results(ResultScope::All).await.unwrap().len(), 2);
        assert!(repo.list_results(ResultScope::ExamsOnly).await.unwrap().is_empty());
        assert_eq!(
            repo.results_for_student(student, ResultScope::DrillsOnly)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn roster_filters_by_role() {
        let repo = InMemoryRepository::new();
        repo.upsert_student(Student::learner(StudentId::random(), "A", "B")).unwrap();
        repo.upsert_student(Student {
            id: StudentId::random(),
            first_name: None,
            last_name: None,
            role: Role::Teacher,
        })
        .unwrap();
        assert_eq!(repo.students_with_role(Role::Student).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn static_identity_returns_configured_student() {
        let id = StudentId::random();
        assert_eq!(StaticIdentity(Some(id)).current_student().await.unwrap(), Some(id));
        assert_eq!(StaticIdentity::default().current_student().await.unwrap(), None);
    }
}
