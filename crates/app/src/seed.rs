//! Demo catalog and roster for trying the engine locally.

use anyhow::Context;
use assess_core::model::{
    ExamDescriptor, ExamId, ExamType, Question, QuestionId, QuestionKind, Role, Student, StudentId,
    VocabularyItem, WordId,
};
use storage::sqlite::SqliteRepository;
use tracing::info;

const LEARNERS: [(&str, &str, &str); 3] = [
    ("4f1c2a9e-6b0d-4a51-9d0e-3c7b8e1f2a01", "Lena", "Vogel"),
    ("9a7e5d3c-1b2f-4e60-8a4d-5f6c7b8a9d02", "Omar", "Haddad"),
    ("c3d2e1f0-a9b8-4c7d-b6e5-f4a3b2c1d003", "Mira", "Schulz"),
];
const TEACHER: &str = "e0d1c2b3-a4f5-4e6d-9c8b-7a6f5e4d3c04";

const WORDS: [(&str, &str, &str); 12] = [
    ("das Haus", "house", "1"),
    ("der Hund", "dog", "1"),
    ("die Katze", "cat", "1"),
    ("das Buch", "book", "1"),
    ("der Tisch", "table", "1"),
    ("die Stadt", "city", "1"),
    ("lernen", "to learn", "2"),
    ("schreiben", "to write", "2"),
    ("lesen", "to read", "2"),
    ("sprechen", "to speak", "2"),
    ("verstehen", "to understand", "2"),
    ("fragen", "to ask", "2"),
];

fn choice(id: u64, prompt: &str, options: &[&str], answer: &str, order: u32) -> anyhow::Result<Question> {
    Ok(Question::new(
        QuestionId::new(id),
        prompt,
        None,
        QuestionKind::MultipleChoice {
            options: options.iter().map(|o| (*o).to_string()).collect(),
        },
        answer,
        order,
    )?)
}

fn urt() -> anyhow::Result<(ExamDescriptor, Vec<Question>)> {
    let exam = ExamDescriptor::new(ExamId::new(1), "URT Probeprüfung", ExamType::Urt, 2024);
    let questions = vec![
        choice(101, "Ich ___ jeden Tag Deutsch.", &["lerne", "lernst", "lernt"], "lerne", 0)?,
        choice(102, "Wo ___ du?", &["wohne", "wohnst", "wohnen"], "wohnst", 1)?,
        Question::new(
            QuestionId::new(103),
            "Schreiben Sie drei Sätze über Ihre Stadt.",
            Some("Mindestens drei Wörter.".to_string()),
            QuestionKind::FreeText,
            "",
            2,
        )?,
    ];
    Ok((exam, questions))
}

fn toc() -> anyhow::Result<(ExamDescriptor, Vec<Question>)> {
    let exam = ExamDescriptor::new(ExamId::new(2), "TOC Sample", ExamType::Toc, 2023);
    let questions = vec![
        choice(201, "Der Zug ___ um acht Uhr ab.", &["fährt", "fahrt", "fahren"], "fährt", 0)?,
        Question::new(
            QuestionId::new(202),
            "Lesen Sie den Text.",
            Some("Anna geht jeden Morgen in die Bibliothek.".to_string()),
            QuestionKind::MultipleChoice {
                options: vec!["in die Schule".into(), "in die Bibliothek".into()],
            },
            "in die Bibliothek",
            1,
        )?,
    ];
    Ok((exam, questions))
}

/// Create the schema and write the demo data; safe to run repeatedly.
pub async fn run(db: &str) -> anyhow::Result<()> {
    let repo = SqliteRepository::connect(db)
        .await
        .with_context(|| format!("opening {db}"))?;
    repo.migrate().await.context("migrating schema")?;

    for (exam, questions) in [urt()?, toc()?] {
        repo.upsert_exam(&exam, &questions).await?;
    }

    for (i, (term, translation, lesson)) in WORDS.into_iter().enumerate() {
        let word = VocabularyItem::shared(WordId::new(i as u64 + 1), term, translation)
            .with_lesson(lesson);
        repo.upsert_word(&word).await?;
    }

    for (id, first, last) in LEARNERS {
        let student = Student::learner(id.parse::<StudentId>()?, first, last);
        repo.upsert_profile(&student).await?;
        println!("{}  {}", student.id, student.display_name());
    }
    let teacher = Student {
        role: Role::Teacher,
        ..Student::learner(TEACHER.parse::<StudentId>()?, "Frau", "Berger")
    };
    repo.upsert_profile(&teacher).await?;

    info!(words = WORDS.len(), learners = LEARNERS.len(), "demo data seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_exams_are_valid() {
        let (exam, questions) = urt().unwrap();
        assert_eq!(exam.exam_type, ExamType::Urt);
        assert!(questions.iter().any(|q| q.kind().is_free_text()));
        assert_eq!(toc().unwrap().1.len(), 2);
    }

    #[test]
    fn roster_ids_parse() {
        for (id, _, _) in LEARNERS {
            assert!(id.parse::<StudentId>().is_ok());
        }
        assert!(TEACHER.parse::<StudentId>().is_ok());
    }
}
