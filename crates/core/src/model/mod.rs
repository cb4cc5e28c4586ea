mod ids;
mod question;
mod question_set;
mod results;
mod selection;

pub use ids::QuestionId;
pub use question::{Question, QuestionError, QuestionKind};
pub use question_set::QuestionSet;
pub use results::ResultsSnapshot;
pub use selection::{AnswerRecord, Selection};
