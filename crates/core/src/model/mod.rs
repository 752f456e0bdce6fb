mod answer;
mod exam;
mod ids;
mod question;
mod result;
mod student;
mod vocabulary;

pub use answer::{AnswerRecord, IncorrectItem, NO_ANSWER_MARKER, Submission, TIMEOUT_MARKER};
pub use exam::{ExamDescriptor, ExamType, ParseExamTypeError};
pub use ids::{ExamId, ParseIdError, QuestionId, StudentId, WordId};
pub use question::{Question, QuestionError, QuestionKind};
pub use result::{DrillKind, ResultDetails, ResultRecord, ResultRecordError, SessionKind};
pub use student::{Role, Student};
pub use vocabulary::VocabularyItem;
