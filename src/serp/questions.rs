//! Question/answer boxes ("People also ask")

use super::{first_link_in, first_text_in};
use crate::dedup::name_key;
use crate::document::Document;
use crate::error::Result;
use crate::links::UrlResolver;
use crate::records::QuestionAnswer;
use crate::strategy::{Candidate, Strategy, StrategyChain};
use crate::validate::is_valid_title;

const QUESTION_BLOCKS: &str = ".related-question-pair, [data-q]";

const QUESTION_SELECTORS: &[&str] = &[".CSkcDe", ".JlqpRe", r#"[role="button"]"#];
const ANSWER_SELECTORS: &[&str] = &[".wDYxhc", r#"[data-attrid="wa:/description"]"#, ".hgKElc"];

const BOX_MARKER: &str = "People also ask";

/// Text nodes scanned after the box marker
const MARKER_SCAN_NODES: usize = 40;

const MIN_QUESTION_CHARS: usize = 8;

impl Candidate for QuestionAnswer {
    fn dedup_key(&self) -> String {
        name_key(&self.question)
    }

    fn is_valid(&self) -> bool {
        self.question.chars().count() >= MIN_QUESTION_CHARS && is_valid_title(&self.question)
    }
}

/// Question strategies, most structured first
pub fn questions_chain() -> StrategyChain<'static, QuestionAnswer> {
    StrategyChain::new("questions")
        .with(QuestionBlocks)
        .with(MarkedQuestions)
}

/// Expandable question containers
pub struct QuestionBlocks;

impl Strategy for QuestionBlocks {
    type Output = QuestionAnswer;

    fn name(&self) -> &'static str {
        "question_blocks"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<QuestionAnswer>> {
        let resolver = UrlResolver::new(doc.config());
        let mut questions = Vec::new();

        for block in doc.select(QUESTION_BLOCKS)? {
            let question = match block.value().attr("data-q") {
                Some(q) if !q.trim().is_empty() => crate::markup::collapse_whitespace(q),
                _ => match first_text_in(block, QUESTION_SELECTORS)? {
                    Some(q) => q,
                    None => continue,
                },
            };
            let snippet = first_text_in(block, ANSWER_SELECTORS)?.filter(|s| *s != question);

            questions.push(QuestionAnswer {
                url: first_link_in(block, &resolver)?,
                question,
                snippet,
            });
        }
        Ok(questions)
    }
}

/// Question-shaped text following the box heading
pub struct MarkedQuestions;

impl Strategy for MarkedQuestions {
    type Output = QuestionAnswer;

    fn name(&self) -> &'static str {
        "marked_questions"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<QuestionAnswer>> {
        let Some(marker) = doc.find_marker(BOX_MARKER) else {
            return Ok(Vec::new());
        };

        Ok(doc
            .text_nodes()
            .iter()
            .filter(|node| node.offset > marker)
            .take(MARKER_SCAN_NODES)
            .filter(|node| node.text.ends_with('?'))
            .map(|node| QuestionAnswer {
                question: node.text.clone(),
                snippet: None,
                url: None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    #[test]
    fn test_question_blocks_with_answers() {
        let html = r#"
            <div class="related-question-pair" data-q="Is Rust hard to learn?">
              <div role="button">Is Rust hard to learn?</div>
              <div class="wDYxhc">Rust has a steep learning curve.</div>
              <a href="https://blog.example.com/rust-learning"><h3>Learning Rust</h3></a>
            </div>
            <div class="related-question-pair">
              <div class="CSkcDe">What is Rust used for?</div>
            </div>
        "#;
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(html, &config);
        let questions = questions_chain().run(&doc, 0, |q, _| q).records;

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "Is Rust hard to learn?");
        assert_eq!(questions[0].snippet.as_deref(), Some("Rust has a steep learning curve."));
        assert_eq!(questions[0].url.as_deref(), Some("https://blog.example.com/rust-learning"));
        assert_eq!(questions[1].question, "What is Rust used for?");
        assert_eq!(questions[1].snippet, None);
    }

    #[test]
    fn test_marked_questions_after_heading() {
        let html = r#"
            <p>Is this before the box?</p>
            <h2>People also ask</h2>
            <div><span>How long does pizza dough rise?</span></div>
            <div><span>Can you freeze pizza dough?</span></div>
            <div><span>Not a question</span></div>
        "#;
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(html, &config);
        let questions: Vec<_> = MarkedQuestions
            .attempt(&doc)
            .unwrap()
            .into_iter()
            .map(|q| q.question)
            .collect();
        assert_eq!(
            questions,
            vec!["How long does pizza dough rise?", "Can you freeze pizza dough?"]
        );
    }

    #[test]
    fn test_no_marker_no_questions() {
        let config = ExtractionConfig::default();
        let doc = Document::from_markup("<p>Why?</p>", &config);
        assert!(MarkedQuestions.attempt(&doc).unwrap().is_empty());
    }
}
