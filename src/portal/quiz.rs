use scraper::Html;
use url::Url;

use crate::query::Node;

/// Path of the quiz runner
pub const QUIZ_RUNNER: &str = "test/default1.aspx";

/// Marker of the page listing a course's prerequisites
const PREREQUISITES: &str = "specifika";

/// A page with more question tables than this is a full test
const MIN_QUESTIONS: usize = 3;

/// Shape of the quiz runner page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizPage {
    /// Test with several questions, correct answers are marked in the markup
    MultiQuestion,
    /// Single step course, only needs to be confirmed
    Acknowledgement,
    Unsupported,
}

/// Where a course landed after opening it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The prerequisites have to be confirmed first
    Prerequisites,
    Quiz,
    Unexpected,
}

/// Route a page by its final URL
pub fn route(url: &Url) -> Step {
    let url = url.as_str();
    if url.contains(PREREQUISITES) {
        Step::Prerequisites
    } else if url.contains(QUIZ_RUNNER) {
        Step::Quiz
    } else {
        Step::Unexpected
    }
}

/// Pick the way to complete a quiz page
pub fn classify(document: &Html) -> QuizPage {
    let root = document.root_element();

    if root.query("table.question").len() > MIN_QUESTIONS {
        QuizPage::MultiQuestion
    } else if root.query_first("div.mainFrame input.end").is_some() {
        QuizPage::Acknowledgement
    } else {
        QuizPage::Unsupported
    }
}

/// One printed line of an answer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerLine {
    /// The line or one before it in the row is marked as right
    pub right: bool,
    pub text: String,
}

impl AnswerLine {
    pub fn prefix(&self) -> &'static str {
        if self.right {
            " * "
        } else {
            " - "
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Answer {
    /// Name and value of the row's input
    pub input: Option<(String, String)>,
    pub lines: Vec<AnswerLine>,
}

impl Answer {
    pub fn is_right(&self) -> bool {
        self.lines.iter().any(|line| line.right)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Question {
    pub text: Vec<String>,
    pub answers: Vec<Answer>,
}

impl Question {
    /// Inputs to set for the right answers
    pub fn choices(&self) -> impl Iterator<Item = &(String, String)> {
        self.answers
            .iter()
            .filter(|answer| answer.is_right())
            .filter_map(|answer| answer.input.as_ref())
    }
}

/// Read every question of a full test page
pub fn questions(document: &Html) -> Vec<Question> {
    document
        .root_element()
        .query("table.question")
        .iter()
        .map(question)
        .collect()
}

fn question<N: Node>(table: &N) -> Question {
    let text = table
        .query("table.questionText td")
        .iter()
        .map(|td| td.text_content().trim().to_owned())
        .collect();

    let answers = table
        .query("table.answers tr")
        .iter()
        .map(|tr| {
            // The last input of the row is the one answering it
            let input = tr.query("input").iter().rev().find_map(|i| {
                Some((i.attribute("name")?, i.attribute("value").unwrap_or_default()))
            });

            let mut right = false;
            let lines = tr
                .query("p")
                .iter()
                .map(|p| {
                    right |= p.class_list().iter().any(|c| c == "right");
                    AnswerLine {
                        right,
                        text: p.text_content().trim().to_owned(),
                    }
                })
                .collect();

            Answer { input, lines }
        })
        .collect();

    Question { text, answers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn question_table(n: usize) -> String {
        format!(
            r#"<table class="question">
                <tr><td><table class="questionText"><tr><td> Question {n}? </td></tr></table></td></tr>
                <tr><td><table class="answers">
                    <tr><td><input type="radio" name="q{n}" value="1"></td><td><p class="answer">Wrong</p></td></tr>
                    <tr><td><input type="radio" name="q{n}" value="2"></td><td><p class="answer right">Right</p><p>note</p></td></tr>
                </table></td></tr>
            </table>"#
        )
    }

    fn page(body: &str) -> Html {
        Html::parse_document(&format!("<html><body><form>{body}</form></body></html>"))
    }

    #[test]
    fn routes() {
        for (url, step) in [
            ("https://lms.example.com/user/test/default1.aspx?name=A1", Step::Quiz),
            ("https://lms.example.com/user/specifika.aspx?name=A1", Step::Prerequisites),
            ("https://lms.example.com/user/test/specifika/default1.aspx", Step::Prerequisites),
            ("https://lms.example.com/user/login.aspx", Step::Unexpected),
            ("https://lms.example.com/user/test/default2.aspx", Step::Unexpected),
        ] {
            assert_eq!(route(&Url::parse(url).unwrap()), step, "{url}");
        }
    }

    #[test]
    fn four_questions_is_a_test() {
        let body: String = (1..=4).map(question_table).collect();
        assert_eq!(classify(&page(&body)), QuizPage::MultiQuestion);
    }

    #[test]
    fn three_questions_is_not_enough() {
        let body: String = (1..=3).map(question_table).collect();
        assert_eq!(classify(&page(&body)), QuizPage::Unsupported);
    }

    #[test]
    fn end_button_is_an_acknowledgement() {
        let document = page(r#"<div class="mainFrame"><input class="end" type="submit" name="end" value="End"></div>"#);
        assert_eq!(classify(&document), QuizPage::Acknowledgement);
    }

    #[test]
    fn end_button_outside_main_frame() {
        let document = page(r#"<div><input class="end" type="submit"></div>"#);
        assert_eq!(classify(&document), QuizPage::Unsupported);
    }

    #[test]
    fn right_answers_are_chosen() {
        let body: String = (1..=4).map(question_table).collect();
        let questions = questions(&page(&body));

        assert_eq!(questions.len(), 4);
        let first = &questions[0];
        assert_eq!(first.text, vec!["Question 1?"]);
        assert_eq!(first.answers.len(), 2);
        assert!(!first.answers[0].is_right());
        assert_eq!(first.answers[0].lines[0].prefix(), " - ");
        assert_eq!(
            first.answers[1].lines,
            vec![
                AnswerLine {
                    right: true,
                    text: "Right".to_owned()
                },
                AnswerLine {
                    right: true,
                    text: "note".to_owned()
                },
            ]
        );
        assert_eq!(
            first.choices().cloned().collect::<Vec<_>>(),
            vec![("q1".to_owned(), "2".to_owned())]
        );
    }

    #[test]
    fn right_marker_needs_exact_class() {
        let document = page(
            r#"<table class="question"><tr><td><table class="answers">
                <tr><td><input name="q" value="1"><p class="rightish">Nope</p></td></tr>
            </table></td></tr></table>"#,
        );
        let questions = questions(&document);
        assert_eq!(questions[0].choices().count(), 0);
    }
}
