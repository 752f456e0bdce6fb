use assess_core::model::{
    AnswerRecord, DrillKind, ExamDescriptor, ExamId, ExamType, IncorrectItem, Question,
    QuestionId, QuestionKind, ResultDetails, ResultRecord, Role, SessionKind, Student, StudentId,
    Submission, VocabularyItem, WordId,
};
use assess_core::time::fixed_now;
use chrono::Duration;
use storage::repository::{
    ExamCatalog, ResultScope, ResultStore, RosterRepository, StorageError, VocabularyCatalog,
    VocabularyFilter,
};
use storage::sqlite::SqliteRepository;

async fn repo(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn choice(id: u64, order: u32) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Frage {id}"),
        Some("Lesen Sie den Text.".into()),
        QuestionKind::MultipleChoice {
            options: vec!["a".into(), "b".into(), "c".into()],
        },
        "b",
        order,
    )
    .unwrap()
}

fn written(id: u64, order: u32) -> Question {
    Question::new(
        QuestionId::new(id),
        "Schreiben Sie eine E-Mail.",
        None,
        QuestionKind::FreeText,
        "",
        order,
    )
    .unwrap()
}

#[tokio::test]
async fn catalog_round_trip_keeps_order_and_kinds() {
    let repo = repo("memdb_catalog").await;
    let exam = ExamDescriptor::new(ExamId::new(7), "URT Modellsatz", ExamType::Urt, 2024);
    repo.upsert_exam(&exam, &[written(3, 2), choice(1, 0), choice(2, 1)])
        .await
        .unwrap();
    repo.upsert_exam(
        &ExamDescriptor::new(ExamId::new(8), "URT 2022", ExamType::Urt, 2022),
        &[],
    )
    .await
    .unwrap();

    let urt = repo.exams_by_type(ExamType::Urt).await.unwrap();
    assert_eq!(urt.iter().map(|e| e.year).collect::<Vec<_>>(), vec![2024, 2022]);
    assert!(repo.exams_by_type(ExamType::Toc).await.unwrap().is_empty());

    let questions = repo.exam_questions(exam.id).await.unwrap();
    let ids: Vec<_> = questions.iter().map(|q| q.id().value()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(questions[0].options(), ["a", "b", "c"]);
    assert_eq!(questions[0].context(), Some("Lesen Sie den Text."));
    assert!(questions[2].kind().is_free_text());
}

#[tokio::test]
async fn catalog_reads_string_encoded_options_and_section_labels() {
    let repo = repo("memdb_legacy_rows").await;
    repo.upsert_exam(
        &ExamDescriptor::new(ExamId::new(1), "TOC", ExamType::Toc, 2023),
        &[],
    )
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO exam_questions (id, exam_id, question_text, question_type, options, correct_answer, order_index)
        VALUES
            (10, 1, 'Welche Antwort?', 'Leseverstehen', '"[\"ja\",\"nein\"]"', 'ja', 0),
            (11, 1, 'Beschreiben Sie...', 'Schriftlicher Ausdruck', NULL, '', 1)
        "#,
    )
    .execute(repo.pool())
    .await
    .unwrap();

    let questions = repo.exam_questions(ExamId::new(1)).await.unwrap();
    assert_eq!(questions[0].options(), ["ja", "nein"]);
    assert!(questions[1].kind().is_free_text());
}

#[tokio::test]
async fn words_respect_visibility_and_lesson() {
    let repo = repo("memdb_words").await;
    let me = StudentId::random();
    let other = StudentId::random();
    repo.upsert_word(&VocabularyItem::shared(WordId::new(1), "Haus", "بيت").with_lesson("1"))
        .await
        .unwrap();
    repo.upsert_word(&VocabularyItem::shared(WordId::new(2), "Hund", "كلب").owned_by(me))
        .await
        .unwrap();
    repo.upsert_word(&VocabularyItem::shared(WordId::new(3), "Katze", "قطة").owned_by(other))
        .await
        .unwrap();

    let mine = repo.words(&VocabularyFilter::for_viewer(Some(me))).await.unwrap();
    assert_eq!(mine.iter().map(|w| w.id.value()).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(mine[1].owner, Some(me));

    let anonymous = repo.words(&VocabularyFilter::default()).await.unwrap();
    assert_eq!(anonymous.len(), 1);

    let lesson = repo
        .words(&VocabularyFilter::for_viewer(Some(me)).with_lesson("1"))
        .await
        .unwrap();
    assert_eq!(lesson.len(), 1);
    assert_eq!(lesson[0].term, "Haus");
}

#[tokio::test]
async fn results_append_and_read_back_per_scope() {
    let repo = repo("memdb_results").await;
    let student = StudentId::random();
    let question = choice(1, 0);
    let exam = ResultRecord::new(
        student,
        SessionKind::Exam(ExamId::new(7)),
        1,
        1,
        ResultDetails::Exam(vec![AnswerRecord::graded(
            &question,
            Submission::Answered("b".into()),
            true,
        )]),
        fixed_now(),
    )
    .unwrap();
    let missed = IncorrectItem {
        term: "Haus".into(),
        correct: "بيت".into(),
        submitted: "No Answer (Timeout)".into(),
    };
    let drill = ResultRecord::new(
        student,
        SessionKind::Drill(DrillKind::TimedVocabulary),
        9,
        10,
        ResultDetails::Drill(vec![missed]),
        fixed_now() + Duration::minutes(5),
    )
    .unwrap();

    let first = repo.append_result(&exam).await.unwrap();
    let second = repo.append_result(&exam).await.unwrap();
    assert!(second > first);
    repo.append_result(&drill).await.unwrap();

    let exams = repo.list_results(ResultScope::ExamsOnly).await.unwrap();
    assert_eq!(exams.len(), 2);
    assert_eq!(exams[0], exam);

    let all = repo
        .results_for_student(student, ResultScope::All)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2], drill);

    assert!(
        repo.results_for_student(StudentId::random(), ResultScope::All)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn roster_filters_by_role_in_insertion_order() {
    let repo = repo("memdb_roster").await;
    let a = Student::learner(StudentId::random(), "Ali", "Kaya");
    let b = Student::learner(StudentId::random(), "Bea", "Lang");
    let teacher = Student {
        id: StudentId::random(),
        first_name: Some("Frau".into()),
        last_name: Some("Schmidt".into()),
        role: Role::Teacher,
    };
    for s in [&a, &teacher, &b] {
        repo.upsert_profile(s).await.unwrap();
    }

    let learners = repo.students_with_role(Role::Student).await.unwrap();
    assert_eq!(learners, vec![a, b]);
    assert_eq!(repo.students_with_role(Role::Teacher).await.unwrap(), vec![teacher]);
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let repo = repo("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn question_ids_are_scoped_to_their_exam() {
    let repo = repo("memdb_question_scope").await;
    let first = ExamDescriptor::new(ExamId::new(1), "URT 2023", ExamType::Urt, 2023);
    let second = ExamDescriptor::new(ExamId::new(2), "TOC 2023", ExamType::Toc, 2023);
    repo.upsert_exam(&first, &[choice(1, 0), choice(2, 1)]).await.unwrap();
    repo.upsert_exam(&second, &[written(1, 0)]).await.unwrap();

    assert_eq!(repo.exam_questions(first.id).await.unwrap().len(), 2);
    let second_questions = repo.exam_questions(second.id).await.unwrap();
    assert_eq!(second_questions.len(), 1);
    assert!(second_questions[0].kind().is_free_text());
}

#[tokio::test]
async fn repeated_question_id_within_an_exam_is_a_conflict() {
    let repo = repo("memdb_question_conflict").await;
    let exam = ExamDescriptor::new(ExamId::new(5), "URT 2021", ExamType::Urt, 2021);
    repo.upsert_exam(&exam, &[choice(1, 0)]).await.unwrap();

    let renamed = ExamDescriptor::new(exam.id, "URT 2021 neu", ExamType::Urt, 2021);
    let err = repo
        .upsert_exam(&renamed, &[choice(4, 0), written(4, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let exams = repo.list_exams().await.unwrap();
    assert_eq!(exams[0].title, "URT 2021");
    let kept: Vec<_> = repo
        .exam_questions(exam.id)
        .await
        .unwrap()
        .iter()
        .map(|q| q.id().value())
        .collect();
    assert_eq!(kept, vec![1]);
}
